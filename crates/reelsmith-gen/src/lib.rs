//! reelsmith Gen - asset pipeline for documentary productions
//!
//! Pluggable providers generate images (Gemini), speech, sound effects and
//! music (ElevenLabs) and video (Veo) for the records of a JSON asset
//! manifest. Batch and narration runners drive them; stock footage (Pexels),
//! static maps (Mapbox), captions and narration-duration analysis round out
//! the tooling.

pub mod batch;
pub mod captions;
pub mod config;
pub mod durations;
pub mod http;
pub mod manifest;
pub mod maps;
pub mod music;
pub mod narration;
pub mod operation;
pub mod output;
pub mod provider;
pub mod providers;
pub mod stock;
pub mod style;
pub mod youtube;

pub use batch::{run_batch, BatchOptions, BatchReport, KindFilter, Selection};
pub use config::{Credential, ProjectPaths, ReelConfig};
pub use manifest::{AssetManifest, AssetStatus, Collection, ListFilter, ManifestStore};
pub use narration::{run_narration, NarrationMode};
pub use provider::{
    AspectRatio, GenerateRequest, GenerateResult, GenerationProvider, MediaKind, ProviderStatus,
};
pub use providers::{create_provider, ProviderRouter};
pub use style::PromptStyle;
