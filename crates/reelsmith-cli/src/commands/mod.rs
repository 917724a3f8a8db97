//! CLI command implementations

pub mod batch;
pub mod captions;
pub mod durations;
pub mod generate;
pub mod manifest;
pub mod map;
pub mod music;
pub mod narration;
pub mod providers;
pub mod stock;
pub mod timeline;
pub mod youtube;

use anyhow::Result;
use reelsmith_gen::{MediaKind, ProjectPaths, ProviderRouter, ReelConfig};
use std::path::PathBuf;

/// Options every command shares
pub struct Context {
    pub paths: ProjectPaths,
    /// `--provider` override
    pub provider: Option<String>,
}

impl Context {
    pub fn new(root: PathBuf, provider: Option<String>) -> Self {
        Self {
            paths: ProjectPaths::new(root),
            provider,
        }
    }

    pub fn config(&self) -> Result<ReelConfig> {
        Ok(ReelConfig::load(self.paths.root())?)
    }

    /// Providers for `kinds`; fails on missing credentials before any request
    pub fn router(&self, config: &ReelConfig, kinds: &[MediaKind]) -> Result<ProviderRouter> {
        Ok(ProviderRouter::for_kinds(config, self.provider.as_deref(), kinds)?)
    }

    pub fn is_mock(&self) -> bool {
        self.provider.as_deref() == Some("mock")
    }
}

/// Resolve a possibly relative path against the project root
pub fn in_root(ctx: &Context, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        ctx.paths.root().join(path)
    }
}
