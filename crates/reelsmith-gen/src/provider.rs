//! Generation provider trait and request/result types

use crate::config::ProjectPaths;
use reelsmith_core::{ReelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The kind of media to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Narration,
    SoundEffect,
    Music,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 5] = [
        MediaKind::Image,
        MediaKind::Narration,
        MediaKind::SoundEffect,
        MediaKind::Music,
        MediaKind::Video,
    ];

    /// Extension every output of this kind must carry. Images take theirs
    /// from the response MIME type instead.
    pub fn fixed_extension(self) -> Option<&'static str> {
        match self {
            MediaKind::Image => None,
            MediaKind::Narration | MediaKind::SoundEffect | MediaKind::Music => Some("mp3"),
            MediaKind::Video => Some("mp4"),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Narration => write!(f, "narration"),
            MediaKind::SoundEffect => write!(f, "sfx"),
            MediaKind::Music => write!(f, "music"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Output framing for images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }

    /// Pixel size at 1080p
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AspectRatio::Landscape => (1920, 1080),
            AspectRatio::Portrait => (1080, 1920),
            AspectRatio::Square => (1080, 1080),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            "1:1" => Ok(AspectRatio::Square),
            other => Err(ReelError::Validation(format!(
                "Unsupported aspect ratio '{}'. Use 16:9, 9:16 or 1:1",
                other
            ))),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to generate one media file
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub kind: MediaKind,
    /// Prompt, or the text to speak for narration
    pub prompt: String,
    /// Output path as given by the caller (see [`ProjectPaths::resolve_output`])
    pub output: String,
    /// Seconds of audio or video; kind defaults apply when absent
    pub duration: Option<f64>,
    /// Voice alias or raw voice id for narration
    pub voice: Option<String>,
    /// Voice style exaggeration for narration (0..1)
    pub voice_style: Option<f64>,
    pub aspect_ratio: AspectRatio,
    /// Image filename (under the images directory) to animate
    pub source_image: Option<String>,
}

impl GenerateRequest {
    pub fn new(kind: MediaKind, prompt: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            output: output.into(),
            duration: None,
            voice: None,
            voice_style: None,
            aspect_ratio: AspectRatio::default(),
            source_image: None,
        }
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_voice_style(mut self, style: f64) -> Self {
        self.voice_style = Some(style);
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_source_image(mut self, source_image: Option<String>) -> Self {
        self.source_image = source_image;
        self
    }
}

/// The result of a successful generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResult {
    /// Final path on disk
    pub output_path: PathBuf,
    /// The prompt that was sent upstream
    pub prompt_used: String,
    pub provider: String,
    /// Wall-clock generation time in seconds
    pub duration_secs: f64,
    /// True when a placeholder was written instead of real media
    #[serde(default)]
    pub placeholder: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Status returned by a provider health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Available,
    Unavailable(String),
    NoApiKey,
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderStatus::Available => write!(f, "available"),
            ProviderStatus::Unavailable(reason) => write!(f, "unavailable ({})", reason),
            ProviderStatus::NoApiKey => write!(f, "no API key"),
        }
    }
}

/// Implemented by each upstream service (Gemini, ElevenLabs, Veo) and the mock
///
/// Providers are shared across the parallel narration workers, hence `Sync`.
pub trait GenerationProvider: Send + Sync {
    /// Provider name (e.g. "gemini", "elevenlabs", "veo", "mock")
    fn name(&self) -> &str;

    /// Media kinds this provider can generate
    fn supported_kinds(&self) -> Vec<MediaKind>;

    /// Check if the provider is usable (credentials present)
    fn health_check(&self) -> Result<ProviderStatus>;

    /// Generate one file, blocking until it is on disk
    fn generate(&self, request: &GenerateRequest, paths: &ProjectPaths) -> Result<GenerateResult>;

    /// The exact prompt that would be sent upstream (for inspection)
    fn build_prompt(&self, request: &GenerateRequest) -> String;
}

pub(crate) fn unsupported(provider: &str, kind: MediaKind) -> ReelError {
    ReelError::Generation(format!("Provider '{}' cannot generate {}", provider, kind))
}
