use std::fmt;

use candle::Device;
use tracing::{info, warn};

/// Which compute backend the encoder ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Cuda,
    Mps,
    Cpu,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeviceKind::Cuda => "cuda",
            DeviceKind::Mps => "mps",
            DeviceKind::Cpu => "cpu",
        };
        f.write_str(label)
    }
}

/// Picks CUDA, then Metal, then CPU. A requested accelerator that cannot be
/// initialized is skipped with a warning.
pub fn select_device(use_cuda: bool, use_mps: bool) -> (Device, DeviceKind) {
    info!(use_cuda, use_mps, "selecting compute device");

    if use_cuda {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("using CUDA:0");
                return (device, DeviceKind::Cuda);
            }
            Err(err) => warn!(
                "USE_CUDA is set but CUDA:0 failed to initialize ({err}); build with the `cuda` \
                 feature and make sure the CUDA libraries are available"
            ),
        }
    }

    if use_mps {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("using Metal (Apple Silicon)");
                return (device, DeviceKind::Mps);
            }
            Err(err) => warn!(
                "USE_MPS is set but the Metal device failed to initialize ({err}); build with \
                 the `metal` feature on Apple Silicon"
            ),
        }
    }

    info!("using CPU");
    (Device::Cpu, DeviceKind::Cpu)
}
