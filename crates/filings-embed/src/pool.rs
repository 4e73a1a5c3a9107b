use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Mean over unmasked tokens of `[B,T,H]` hidden states, then L2-normalize → `[B,H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    ensure!(dims.len() == 3, "hidden shape must be [B,T,H], got {:?}", dims);
    let batch = dims[0];
    let hidden_dim = dims[2];

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let mask_broadcast = mask_3d.broadcast_as(hidden.shape()).unwrap_or(mask_3d.repeat((1, 1, hidden_dim))?);
    let masked = (hidden * &mask_broadcast)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(sum.dtype())?;
    let mean = sum.broadcast_div(&lengths)?;
    let mean = l2_normalize(&mean)?;
    ensure!(mean.dims() == [batch, hidden_dim], "pooled shape {:?}, expected [{batch}, {hidden_dim}]", mean.dims());
    Ok(mean)
}

/// First-token (`[CLS]`) pooling of `[B,T,H]` hidden states, L2-normalized → `[B,H]`.
pub fn cls_l2(hidden: &Tensor) -> Result<Tensor> {
    let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
    l2_normalize(&cls)
}

/// Row-wise L2 normalization of a `[B,H]` tensor.
pub fn l2_normalize(x: &Tensor) -> Result<Tensor> {
    let eps_val = match x.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], x.device())?.to_dtype(x.dtype())?.unsqueeze(0)?;
    let norm = x.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norm = norm.broadcast_add(&eps)?;
    Ok(x.broadcast_div(&norm)?)
}
