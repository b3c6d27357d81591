use std::path::Path;

use crate::error::DecoderError;
use crate::types::FeatureFrame;

const VALUE_BYTES: usize = std::mem::size_of::<f64>();

pub fn read_features(path: &Path, dimension: usize) -> Result<Vec<FeatureFrame>, DecoderError> {
    let bytes = std::fs::read(path).map_err(|e| DecoderError::io("reading feature file", e))?;
    decode_features(&bytes, dimension)
}

/// Splits a little-endian `f64` stream into frames of `dimension` values.
/// A trailing partial frame is dropped.
pub fn decode_features(bytes: &[u8], dimension: usize) -> Result<Vec<FeatureFrame>, DecoderError> {
    if dimension == 0 {
        return Err(DecoderError::invalid_input("feature dimension must be positive"));
    }
    let frame_bytes = dimension * VALUE_BYTES;
    let mut frames = bytes.chunks_exact(frame_bytes);
    let decoded: Vec<FeatureFrame> = frames
        .by_ref()
        .map(|frame| {
            frame
                .chunks_exact(VALUE_BYTES)
                .map(|value| {
                    let mut raw = [0u8; VALUE_BYTES];
                    raw.copy_from_slice(value);
                    f64::from_le_bytes(raw)
                })
                .collect()
        })
        .collect();

    let leftover = frames.remainder().len();
    if leftover > 0 {
        tracing::warn!(
            leftover_bytes = leftover,
            frame_bytes,
            "features: dropping trailing partial frame"
        );
    }
    tracing::debug!(frames = decoded.len(), dimension, "features: decoded");
    Ok(decoded)
}
