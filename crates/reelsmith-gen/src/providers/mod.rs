//! Provider registry and per-kind routing
//!
//! Maps provider names to concrete implementations, and media kinds to the
//! provider configured for them.

pub mod elevenlabs;
pub mod gemini;
pub mod mock;
pub mod veo;

use crate::config::{Credential, ProjectPaths, ReelConfig};
use crate::provider::{GenerateRequest, GenerateResult, GenerationProvider, MediaKind};
use reelsmith_core::{ReelError, Result};
use std::collections::HashMap;

/// Create a provider by name with configuration
pub fn create_provider(name: &str, config: &ReelConfig) -> Result<Box<dyn GenerationProvider>> {
    match name {
        "mock" => Ok(Box::new(mock::MockProvider::new())),
        "gemini" => Ok(Box::new(gemini::GeminiProvider::from_config(config)?)),
        "elevenlabs" => Ok(Box::new(elevenlabs::ElevenLabsProvider::from_config(config)?)),
        "veo" => Ok(Box::new(veo::VeoProvider::from_config(config)?)),
        _ => Err(ReelError::Config(format!(
            "Unknown provider '{}'. Available: {}",
            name,
            available_providers().join(", ")
        ))),
    }
}

/// List all available provider names
pub fn available_providers() -> Vec<&'static str> {
    vec!["mock", "gemini", "elevenlabs", "veo"]
}

/// Dispatches generation requests to the provider configured for each kind
///
/// Each named provider is built once and shared by every kind routed to it.
pub struct ProviderRouter {
    providers: HashMap<String, Box<dyn GenerationProvider>>,
    routes: HashMap<MediaKind, String>,
}

impl ProviderRouter {
    /// An empty router; add providers with [`ProviderRouter::route`]
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            routes: HashMap::new(),
        }
    }

    /// Build providers for `kinds`, using `override_name` for all of them
    /// when given.
    ///
    /// Every missing credential is reported together before anything is
    /// constructed.
    pub fn for_kinds(config: &ReelConfig, override_name: Option<&str>, kinds: &[MediaKind]) -> Result<Self> {
        let names: Vec<(MediaKind, String)> = kinds
            .iter()
            .map(|kind| {
                let name = override_name.unwrap_or_else(|| config.default_provider(*kind));
                (*kind, name.to_string())
            })
            .collect();

        let credentials: Vec<Credential> = names
            .iter()
            .filter(|(_, name)| name != "mock")
            .filter_map(|(kind, _)| Credential::for_kind(*kind))
            .collect();
        config.require(&credentials)?;

        let mut router = Self::new();
        for (kind, name) in names {
            if !config.is_enabled(&name) {
                return Err(ReelError::Config(format!(
                    "Provider '{}' is disabled in config",
                    name
                )));
            }
            if !router.providers.contains_key(&name) {
                let provider = create_provider(&name, config)?;
                router.providers.insert(name.clone(), provider);
            }
            router.routes.insert(kind, name);
        }
        Ok(router)
    }

    /// Route `kind` to `provider`, replacing any previous route
    pub fn route(mut self, kind: MediaKind, provider: Box<dyn GenerationProvider>) -> Self {
        let name = format!("{}#{}", provider.name(), kind);
        self.providers.insert(name.clone(), provider);
        self.routes.insert(kind, name);
        self
    }

    pub fn provider_for(&self, kind: MediaKind) -> Result<&dyn GenerationProvider> {
        self.routes
            .get(&kind)
            .and_then(|name| self.providers.get(name))
            .map(|p| p.as_ref())
            .ok_or_else(|| ReelError::Config(format!("No provider configured for {}", kind)))
    }

    pub fn generate(&self, request: &GenerateRequest, paths: &ProjectPaths) -> Result<GenerateResult> {
        let provider = self.provider_for(request.kind)?;
        tracing::debug!(provider = provider.name(), "Generating {}", request.kind);
        provider.generate(request, paths)
    }
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new()
    }
}
