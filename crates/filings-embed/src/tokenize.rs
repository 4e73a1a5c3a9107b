use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{Encoding, Tokenizer, TruncationParams, TruncationStrategy};

/// Token ids, type ids and attention mask of a padded batch, each `[B,T]`.
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub type_ids: Tensor,
    pub attention_mask: Tensor,
}

/// Cap every encoding (single text or pair) at `max_len` tokens, trimming the
/// longest sequence of a pair first.
pub fn configure_truncation(tokenizer: &mut Tokenizer, max_len: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            strategy: TruncationStrategy::LongestFirst,
            ..TruncationParams::default()
        }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    tokenizer.with_padding(None);
    Ok(())
}

pub fn pad_id(tokenizer: &Tokenizer) -> u32 {
    tokenizer.token_to_id("[PAD]").or_else(|| tokenizer.token_to_id("<pad>")).unwrap_or(0)
}

/// Right-pad encodings to the longest one and move them onto `device`.
pub fn batch_to_tensors(encodings: &[Encoding], pad_id: u32, device: &Device) -> Result<EncodedBatch> {
    let batch = encodings.len();
    let width = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
    if batch == 0 || width == 0 {
        return Err(anyhow!("cannot build tensors from an empty batch"));
    }
    let mut ids = Vec::with_capacity(batch * width);
    let mut type_ids = Vec::with_capacity(batch * width);
    let mut mask = Vec::with_capacity(batch * width);
    for enc in encodings {
        let pad = width - enc.get_ids().len();
        ids.extend_from_slice(enc.get_ids());
        ids.extend(std::iter::repeat(pad_id).take(pad));
        type_ids.extend_from_slice(enc.get_type_ids());
        type_ids.extend(std::iter::repeat(0u32).take(pad));
        mask.extend_from_slice(enc.get_attention_mask());
        mask.extend(std::iter::repeat(0u32).take(pad));
    }
    Ok(EncodedBatch {
        input_ids: Tensor::from_vec(ids, (batch, width), device)?,
        type_ids: Tensor::from_vec(type_ids, (batch, width), device)?,
        attention_mask: Tensor::from_vec(mask, (batch, width), device)?,
    })
}
