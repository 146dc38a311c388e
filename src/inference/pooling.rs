use candle::{DType, Tensor};

/// Smallest norm used as a divisor; keeps an all-zero vector finite.
pub const NORM_EPSILON: f32 = 1e-12;

/// `(batch, seq, hidden)` -> `(batch, hidden)` taking the first ([CLS]) position.
pub fn cls_pool(hidden: &Tensor) -> candle::Result<Tensor> {
    hidden.to_dtype(DType::F32)?.narrow(1, 0, 1)?.squeeze(1)
}

/// Row-wise L2 normalization of a `(batch, hidden)` tensor.
pub fn l2_normalize(rows: &Tensor) -> candle::Result<Tensor> {
    let norm = rows
        .sqr()?
        .sum_keepdim(1)?
        .sqrt()?
        .clamp(NORM_EPSILON, f32::MAX)?;
    rows.broadcast_div(&norm)
}
