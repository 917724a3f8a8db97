//! Mock provider for offline runs and tests
//!
//! Writes small but well-formed files without any network calls: a
//! solid-color PNG, silent MPEG audio frames, and a bare `ftyp` MP4.

use crate::config::ProjectPaths;
use crate::output::{prepare_output, replace_extension};
use crate::provider::*;
use crate::providers::elevenlabs::capped_duration;
use reelsmith_core::{ReelError, Result};
use std::collections::HashMap;
use std::path::Path;

/// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, mono
const MP3_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0xC0];
const MP3_FRAME_BYTES: usize = 417;
/// 1152 samples at 44.1 kHz
const MP3_FRAME_SECS: f64 = 0.02612;
/// Shrink factor applied to the aspect ratio's full size
const PNG_SCALE: u32 = 8;
const SECS_PER_WORD: f64 = 0.4;

#[derive(Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

impl GenerationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn supported_kinds(&self) -> Vec<MediaKind> {
        MediaKind::ALL.to_vec()
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        Ok(ProviderStatus::Available)
    }

    fn generate(&self, request: &GenerateRequest, paths: &ProjectPaths) -> Result<GenerateResult> {
        let start = std::time::Instant::now();
        let prompt = self.build_prompt(request);
        let output_path = prepare_output(paths, request.kind, &request.output)?;
        let mut metadata = HashMap::new();

        let output_path = match request.kind {
            MediaKind::Image => {
                let (w, h) = request.aspect_ratio.dimensions();
                let path = replace_extension(&output_path, "png");
                write_solid_png(&path, &request.prompt, w / PNG_SCALE, h / PNG_SCALE)?;
                path
            }
            MediaKind::Narration | MediaKind::SoundEffect | MediaKind::Music => {
                let seconds = mock_audio_seconds(request);
                metadata.insert("duration_seconds".to_string(), format!("{:.2}", seconds));
                write_silent_mp3(&output_path, seconds)?;
                output_path
            }
            MediaKind::Video => {
                std::fs::write(&output_path, minimal_mp4())?;
                output_path
            }
        };

        tracing::debug!("Mock {} written to {}", request.kind, output_path.display());

        Ok(GenerateResult {
            output_path,
            prompt_used: prompt,
            provider: "mock".to_string(),
            duration_secs: start.elapsed().as_secs_f64(),
            placeholder: false,
            metadata,
        })
    }

    fn build_prompt(&self, request: &GenerateRequest) -> String {
        request.prompt.clone()
    }
}

/// Same limits as the real audio endpoints; narration length follows the text
fn mock_audio_seconds(request: &GenerateRequest) -> f64 {
    match request.kind {
        MediaKind::SoundEffect => capped_duration(request.duration.unwrap_or(3.0)),
        MediaKind::Music => capped_duration(request.duration.unwrap_or(30.0)),
        _ => request.duration.unwrap_or_else(|| {
            let words = request.prompt.split_whitespace().count().max(1);
            words as f64 * SECS_PER_WORD
        }),
    }
}

/// Color derived from the prompt so different assets are distinguishable
fn write_solid_png(path: &Path, seed: &str, width: u32, height: u32) -> Result<()> {
    let hash_val = seed
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    let pixel = image::Rgba([
        ((hash_val >> 16) & 0xFF) as u8,
        ((hash_val >> 8) & 0xFF) as u8,
        (hash_val & 0xFF) as u8,
        255,
    ]);

    let img = image::RgbaImage::from_pixel(width.max(1), height.max(1), pixel);
    img.save(path)
        .map_err(|e| ReelError::Generation(format!("Failed to save PNG: {}", e)))
}

/// Silent MPEG-1 Layer III stream of roughly `seconds`
pub fn silent_mp3(seconds: f64) -> Vec<u8> {
    let frames = (seconds.max(0.0) / MP3_FRAME_SECS).ceil().max(1.0) as usize;
    let mut data = Vec::with_capacity(frames * MP3_FRAME_BYTES);
    for _ in 0..frames {
        data.extend_from_slice(&MP3_FRAME_HEADER);
        data.resize(data.len() + MP3_FRAME_BYTES - MP3_FRAME_HEADER.len(), 0);
    }
    data
}

fn write_silent_mp3(path: &Path, seconds: f64) -> Result<()> {
    std::fs::write(path, silent_mp3(seconds))?;
    Ok(())
}

/// A lone `ftyp` box: enough for tools to recognize the container
fn minimal_mp4() -> Vec<u8> {
    let mut data = Vec::with_capacity(24);
    data.extend_from_slice(&24u32.to_be_bytes());
    data.extend_from_slice(b"ftyp");
    data.extend_from_slice(b"isom");
    data.extend_from_slice(&0x200u32.to_be_bytes());
    data.extend_from_slice(b"isom");
    data.extend_from_slice(b"mp41");
    data
}
