//! WAV export via hound
//!
//! Writes interleaved stereo f32 frames as 16-bit PCM. Available behind the
//! `export-wav` feature.

use crate::Result;
use crate::VgmError;
use std::path::Path;

/// Writes interleaved stereo samples to a 16-bit PCM WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| VgmError::AudioFileError(format!("failed to create WAV: {}", e)))?;
    for &sample in samples {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(quantized)
            .map_err(|e| VgmError::AudioFileError(format!("failed to write sample: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| VgmError::AudioFileError(format!("failed to finalize WAV: {}", e)))
}

/// Renders a loaded song to a WAV file until it finishes.
///
/// Looping is disabled for the render so the file has a definite end; a
/// song with no end command still terminates when the stream runs out.
#[cfg(feature = "player")]
pub fn render_to_wav<P: AsRef<Path>>(
    player: &mut crate::player::VgmPlayer,
    path: P,
    sample_rate: u32,
) -> Result<()> {
    use crate::player::{PlaybackController, PlaybackState};

    player.set_loop_enabled(false);
    player.play()?;
    let mut samples = Vec::new();
    let mut chunk = vec![0.0f32; 4096 * 2];
    while player.state() == PlaybackState::Playing {
        let before = player.samples_rendered();
        player.render(&mut chunk);
        let produced = (player.samples_rendered() - before) as usize * 2;
        samples.extend_from_slice(&chunk[..produced]);
    }
    write_wav(path, &samples, sample_rate)
}
