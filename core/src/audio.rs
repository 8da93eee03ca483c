//! Sample format helpers for WAV and PCM front ends

use crate::error::{Result, RttyError};

/// Average interleaved multi-channel audio down to mono
///
/// A trailing partial frame is dropped.
pub fn downmix(samples: &[f32], channels: usize) -> Result<Vec<f32>> {
    match channels {
        0 => Err(RttyError::InvalidConfig("channel count must be at least 1".to_string())),
        1 => Ok(samples.to_vec()),
        _ => {
            let scale = 1.0 / channels as f32;
            Ok(samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() * scale)
                .collect())
        }
    }
}

/// Signed 16-bit PCM to float in [-1, 1)
pub fn pcm16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Float to signed 16-bit PCM, clipping outside [-1, 1]
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
        .collect()
}
