pub mod device;
pub mod encoder;
pub mod pooling;

pub use device::{select_device, DeviceKind};
pub use encoder::{BertEncoder, ModelFiles};
