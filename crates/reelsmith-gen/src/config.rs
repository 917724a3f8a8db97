//! Layered configuration system
//!
//! Config is resolved with these layers of precedence (highest wins):
//! 1. Process environment (`GOOGLE_API_KEY`, `ELEVENLABS_API_KEY`, ...)
//! 2. `.env` in the project root
//! 3. Project-local: `.reelsmith/config.toml`
//! 4. Global: `~/.reelsmith/config.toml`
//! 5. Built-in defaults
//!
//! The resolved [`ReelConfig`] is immutable and handed to every provider and
//! runner explicitly.

use crate::provider::MediaKind;
use crate::style::PromptStyle;
use reelsmith_core::{ReelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Vertex AI project settings used by video generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            project: None,
            location: default_location(),
            access_token: None,
        }
    }
}

fn default_location() -> String {
    "us-central1".to_string()
}

/// Voice aliases for text-to-speech
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_voice")]
    pub default: String,
    #[serde(default = "default_voice_aliases")]
    pub aliases: HashMap<String, String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            default: default_voice(),
            aliases: default_voice_aliases(),
        }
    }
}

impl VoiceConfig {
    /// Map an alias to its voice id
    ///
    /// Strings longer than 15 characters are taken as raw ElevenLabs ids.
    /// Unknown short names fall back to the default voice.
    pub fn resolve(&self, voice: Option<&str>) -> String {
        let requested = voice.unwrap_or(&self.default);
        if let Some(id) = self.aliases.get(requested) {
            return id.clone();
        }
        if requested.len() > 15 {
            return requested.to_string();
        }
        self.aliases
            .get(&self.default)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

fn default_voice() -> String {
    "hindi-male".to_string()
}

fn default_voice_aliases() -> HashMap<String, String> {
    [
        ("hindi-male", "pFZP5JQG7iQjIQuC4Bku"),
        ("hindi-male-alt", "TX3LPaxmHKxFdv7VOQHJ"),
        ("hindi-narrator", "N2lVS1w4EtoT3dr4eOWO"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Upstream model identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_image_model")]
    pub image: String,
    #[serde(default = "default_tts_model")]
    pub tts: String,
    #[serde(default = "default_video_model")]
    pub video: String,
    #[serde(default = "default_stt_model")]
    pub stt: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            image: default_image_model(),
            tts: default_tts_model(),
            video: default_video_model(),
            stt: default_stt_model(),
        }
    }
}

fn default_image_model() -> String {
    "gemini-3-pro-image-preview".to_string()
}
fn default_tts_model() -> String {
    "eleven_multilingual_v2".to_string()
}
fn default_video_model() -> String {
    "veo-001".to_string()
}
fn default_stt_model() -> String {
    "scribe_v2".to_string()
}

/// Generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_image_provider")]
    pub image_provider: String,
    #[serde(default = "default_audio_provider")]
    pub audio_provider: String,
    #[serde(default = "default_video_provider")]
    pub video_provider: String,
    /// Pause between batch requests, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_sfx_duration")]
    pub sfx_duration: f64,
    #[serde(default = "default_music_duration")]
    pub music_duration: f64,
    #[serde(default = "default_video_duration")]
    pub video_duration: f64,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            image_provider: default_image_provider(),
            audio_provider: default_audio_provider(),
            video_provider: default_video_provider(),
            delay_ms: default_delay_ms(),
            sfx_duration: default_sfx_duration(),
            music_duration: default_music_duration(),
            video_duration: default_video_duration(),
            aspect_ratio: default_aspect_ratio(),
        }
    }
}

fn default_image_provider() -> String {
    "gemini".to_string()
}
fn default_audio_provider() -> String {
    "elevenlabs".to_string()
}
fn default_video_provider() -> String {
    "veo".to_string()
}
fn default_delay_ms() -> u64 {
    2000
}
fn default_sfx_duration() -> f64 {
    3.0
}
fn default_music_duration() -> f64 {
    30.0
}
fn default_video_duration() -> f64 {
    5.0
}
fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReelConfigFile {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub voices: VoiceConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub style: PromptStyle,
}

/// Credentials a command may need before it touches the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    GoogleApiKey,
    ElevenLabsApiKey,
    PexelsApiKey,
    MapboxApiKey,
}

impl Credential {
    /// Environment variable that supplies this credential
    pub fn env_var(self) -> &'static str {
        match self {
            Credential::GoogleApiKey => "GOOGLE_API_KEY",
            Credential::ElevenLabsApiKey => "ELEVENLABS_API_KEY",
            Credential::PexelsApiKey => "PEXELS_API_KEY",
            Credential::MapboxApiKey => "MAPBOX_API_KEY",
        }
    }

    /// Provider section the credential lives under in config.toml
    pub fn provider(self) -> &'static str {
        match self {
            Credential::GoogleApiKey => "gemini",
            Credential::ElevenLabsApiKey => "elevenlabs",
            Credential::PexelsApiKey => "pexels",
            Credential::MapboxApiKey => "mapbox",
        }
    }

    /// Credential needed to generate a media kind with the default providers
    pub fn for_kind(kind: MediaKind) -> Option<Credential> {
        match kind {
            MediaKind::Image => Some(Credential::GoogleApiKey),
            MediaKind::Narration | MediaKind::SoundEffect | MediaKind::Music => {
                Some(Credential::ElevenLabsApiKey)
            }
            // Vertex AI uses gcloud credentials, and falls back to a placeholder
            MediaKind::Video => None,
        }
    }
}

const CREDENTIALS: [Credential; 4] = [
    Credential::GoogleApiKey,
    Credential::ElevenLabsApiKey,
    Credential::PexelsApiKey,
    Credential::MapboxApiKey,
];

/// Resolved configuration with environment overrides applied
#[derive(Debug, Clone, Default)]
pub struct ReelConfig {
    pub providers: HashMap<String, ProviderConfig>,
    pub cloud: CloudConfig,
    pub voices: VoiceConfig,
    pub models: ModelConfig,
    pub generation: GenerationConfig,
    pub style: PromptStyle,
}

impl ReelConfig {
    /// Load config for a project root: global < project < .env < process env
    pub fn load(root: &Path) -> Result<Self> {
        let dotenv = read_dotenv(&root.join(".env"))?;
        Self::load_with(root, Self::global_config_path().as_deref(), |key| {
            std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
        })
    }

    /// Load with an explicit global config path and environment lookup
    pub fn load_with<F>(root: &Path, global: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut merged = toml::Table::new();

        if let Some(global_path) = global {
            if global_path.exists() {
                merge_tables(&mut merged, Self::load_table(global_path)?);
            }
        }

        let local_path = root.join(".reelsmith").join("config.toml");
        if local_path.exists() {
            merge_tables(&mut merged, Self::load_table(&local_path)?);
        }

        let mut file: ReelConfigFile = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ReelError::Config(format!("Invalid config: {}", e)))?;
        Self::apply_env_overrides(&mut file, lookup);

        Ok(ReelConfig {
            providers: file.providers,
            cloud: file.cloud,
            voices: file.voices,
            models: file.models,
            generation: file.generation,
            style: file.style,
        })
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut file: ReelConfigFile = toml::Value::Table(Self::load_table(path)?)
            .try_into()
            .map_err(|e: toml::de::Error| {
                ReelError::Config(format!("Failed to parse config {}: {}", path.display(), e))
            })?;
        Self::apply_env_overrides(&mut file, lookup);
        Ok(ReelConfig {
            providers: file.providers,
            cloud: file.cloud,
            voices: file.voices,
            models: file.models,
            generation: file.generation,
            style: file.style,
        })
    }

    /// Get API key for a provider
    pub fn api_key(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_key.as_deref())
            .filter(|k| !k.is_empty())
    }

    /// Get API URL override for a provider
    pub fn api_url(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_url.as_deref())
    }

    /// Check if a provider is enabled
    pub fn is_enabled(&self, provider_name: &str) -> bool {
        self.providers
            .get(provider_name)
            .map(|p| p.enabled)
            .unwrap_or(true)
    }

    /// Default provider name for a media kind
    pub fn default_provider(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Image => &self.generation.image_provider,
            MediaKind::Narration | MediaKind::SoundEffect | MediaKind::Music => {
                &self.generation.audio_provider
            }
            MediaKind::Video => &self.generation.video_provider,
        }
    }

    /// The key for a credential, if configured
    pub fn credential(&self, credential: Credential) -> Option<&str> {
        self.api_key(credential.provider())
    }

    /// Fail with every missing environment variable at once
    pub fn require(&self, credentials: &[Credential]) -> Result<()> {
        let mut missing: Vec<String> = Vec::new();
        for credential in credentials {
            let name = credential.env_var().to_string();
            if self.credential(*credential).is_none() && !missing.contains(&name) {
                missing.push(name);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReelError::MissingCredentials(missing))
        }
    }

    /// Resolve a voice alias or raw voice id
    pub fn resolve_voice(&self, voice: Option<&str>) -> String {
        self.voices.resolve(voice)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".reelsmith").join("config.toml"))
    }

    fn load_table(path: &Path) -> Result<toml::Table> {
        let content = std::fs::read_to_string(path)?;
        content.parse::<toml::Table>().map_err(|e| {
            ReelError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn apply_env_overrides<F>(config: &mut ReelConfigFile, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for credential in CREDENTIALS {
            if let Some(key) = lookup(credential.env_var()).filter(|k| !k.is_empty()) {
                let entry = config
                    .providers
                    .entry(credential.provider().to_string())
                    .or_default();
                entry.api_key = Some(key);
            }
        }

        if let Some(project) = lookup("GOOGLE_CLOUD_PROJECT").filter(|p| !p.is_empty()) {
            config.cloud.project = Some(project);
        }
        if let Some(location) = lookup("GOOGLE_CLOUD_LOCATION").filter(|l| !l.is_empty()) {
            config.cloud.location = location;
        }
        if let Some(token) = lookup("GOOGLE_CLOUD_ACCESS_TOKEN").filter(|t| !t.is_empty()) {
            config.cloud.access_token = Some(token);
        }
    }
}

/// Read `KEY=value` pairs from a dotenv file without touching the process env
fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| ReelError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    for item in iter {
        let (key, value) = item
            .map_err(|e| ReelError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        vars.insert(key, value);
    }
    tracing::debug!("Loaded {} variables from {}", vars.len(), path.display());
    Ok(vars)
}

// Tables merge recursively; any other overlay value replaces the base value.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Well-known locations inside a project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join("public")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.public_dir().join("images")
    }

    pub fn generated_images_dir(&self) -> PathBuf {
        self.images_dir().join("generated")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.public_dir().join("audio")
    }

    pub fn narration_dir(&self) -> PathBuf {
        self.audio_dir().join("narration")
    }

    pub fn sfx_dir(&self) -> PathBuf {
        self.audio_dir().join("sfx")
    }

    pub fn music_dir(&self) -> PathBuf {
        self.audio_dir().join("music")
    }

    pub fn video_dir(&self) -> PathBuf {
        self.public_dir().join("video")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("asset-manifest.json")
    }

    pub fn narration_script_path(&self) -> PathBuf {
        self.root.join("narration-script.json")
    }

    pub fn chapters_path(&self) -> PathBuf {
        self.root.join("chapters.json")
    }

    pub fn captions_path(&self) -> PathBuf {
        self.public_dir().join("captions.json")
    }

    pub fn music_plan_path(&self) -> PathBuf {
        self.root.join("music-plan.toml")
    }

    pub fn map_definitions_path(&self) -> PathBuf {
        self.root.join("maps.json")
    }

    pub fn duration_analysis_path(&self) -> PathBuf {
        self.narration_dir().join("duration-analysis.json")
    }

    /// Directory generated files of a kind land in
    pub fn kind_dir(&self, kind: MediaKind) -> PathBuf {
        match kind {
            MediaKind::Image => self.images_dir(),
            MediaKind::Narration => self.narration_dir(),
            MediaKind::SoundEffect => self.sfx_dir(),
            MediaKind::Music => self.music_dir(),
            MediaKind::Video => self.video_dir(),
        }
    }

    /// Resolve a caller-supplied output path
    ///
    /// Paths starting with `public/` are taken relative to the project root,
    /// anything else relative to the kind's directory.
    pub fn resolve_output(&self, kind: MediaKind, requested: &str) -> PathBuf {
        let requested = requested.replace('\\', "/");
        if requested.starts_with("public/") {
            self.root.join(requested)
        } else {
            self.kind_dir(kind).join(requested)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reelsmith_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_load_config_from_file() {
        let root = temp_root();
        let path = root.join("config.toml");
        write_file(
            &path,
            r#"
[providers.gemini]
api_key = "test-key-123"
api_url = "https://example.com/gemini"

[providers.pexels]
enabled = false

[generation]
delay_ms = 500
aspect_ratio = "9:16"

[style]
music_prefix = "Score: "
"#,
        );

        let config = ReelConfig::load_from_file(&path, no_env).unwrap();
        assert_eq!(config.api_key("gemini"), Some("test-key-123"));
        assert_eq!(config.api_url("gemini"), Some("https://example.com/gemini"));
        assert!(!config.is_enabled("pexels"));
        assert_eq!(config.generation.delay_ms, 500);
        assert_eq!(config.generation.aspect_ratio, "9:16");
        // untouched keys keep their defaults
        assert_eq!(config.generation.sfx_duration, 3.0);
        assert_eq!(config.style.music_prefix, "Score: ");
        assert_eq!(config.models.tts, "eleven_multilingual_v2");

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_project_overrides_global() {
        let root = temp_root();
        let global = root.join("home").join("config.toml");
        write_file(
            &global,
            r#"
[providers.elevenlabs]
api_key = "global-key"

[generation]
delay_ms = 100
music_duration = 12.0
"#,
        );
        write_file(
            &root.join(".reelsmith").join("config.toml"),
            r#"
[generation]
delay_ms = 900
"#,
        );

        let config = ReelConfig::load_with(&root, Some(&global), no_env).unwrap();
        assert_eq!(config.api_key("elevenlabs"), Some("global-key"));
        assert_eq!(config.generation.delay_ms, 900);
        assert_eq!(config.generation.music_duration, 12.0);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_env_overrides_files() {
        let root = temp_root();
        write_file(
            &root.join(".reelsmith").join("config.toml"),
            r#"
[providers.elevenlabs]
api_key = "file-key"

[cloud]
location = "europe-west4"
"#,
        );

        let env: HashMap<&str, &str> = [
            ("ELEVENLABS_API_KEY", "env-key"),
            ("GOOGLE_CLOUD_PROJECT", "my-project"),
        ]
        .into_iter()
        .collect();
        let config = ReelConfig::load_with(&root, None, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_key("elevenlabs"), Some("env-key"));
        assert_eq!(config.cloud.project.as_deref(), Some("my-project"));
        assert_eq!(config.cloud.location, "europe-west4");

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_dotenv_is_read_without_touching_env() {
        let root = temp_root();
        write_file(&root.join(".env"), "PEXELS_API_KEY=from-dotenv\n# comment\n");
        let vars = read_dotenv(&root.join(".env")).unwrap();
        assert_eq!(vars.get("PEXELS_API_KEY").map(String::as_str), Some("from-dotenv"));
        assert!(read_dotenv(&root.join("missing.env")).unwrap().is_empty());

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_require_lists_all_missing() {
        let config = ReelConfig::default();
        let err = config
            .require(&[Credential::GoogleApiKey, Credential::ElevenLabsApiKey])
            .unwrap_err();
        match err {
            ReelError::MissingCredentials(names) => {
                assert_eq!(names, vec!["GOOGLE_API_KEY", "ELEVENLABS_API_KEY"]);
            }
            other => panic!("unexpected error: {}", other),
        }

        let mut config = ReelConfig::default();
        config.providers.insert(
            "gemini".to_string(),
            ProviderConfig {
                api_key: Some("k".to_string()),
                ..Default::default()
            },
        );
        assert!(config.require(&[Credential::GoogleApiKey]).is_ok());
    }

    #[test]
    fn test_resolve_voice() {
        let config = ReelConfig::default();
        assert_eq!(config.resolve_voice(None), "pFZP5JQG7iQjIQuC4Bku");
        assert_eq!(
            config.resolve_voice(Some("hindi-narrator")),
            "N2lVS1w4EtoT3dr4eOWO"
        );
        assert_eq!(
            config.resolve_voice(Some("21m00Tcm4TlvDq8ikWAM")),
            "21m00Tcm4TlvDq8ikWAM"
        );
        // short unknown names fall back to the default voice
        assert_eq!(config.resolve_voice(Some("bob")), "pFZP5JQG7iQjIQuC4Bku");
    }

    #[test]
    fn test_resolve_output_paths() {
        let paths = ProjectPaths::new("/proj");
        assert_eq!(
            paths.resolve_output(MediaKind::Image, "ch1/station.png"),
            PathBuf::from("/proj/public/images/ch1/station.png")
        );
        assert_eq!(
            paths.resolve_output(MediaKind::Narration, "public/audio/custom/intro.mp3"),
            PathBuf::from("/proj/public/audio/custom/intro.mp3")
        );
        assert_eq!(
            paths.resolve_output(MediaKind::Music, "theme"),
            PathBuf::from("/proj/public/audio/music/theme")
        );
    }

    #[test]
    fn test_missing_provider_returns_none() {
        let config = ReelConfig::default();
        assert_eq!(config.api_key("nonexistent"), None);
        assert!(config.is_enabled("nonexistent"));
        assert_eq!(config.default_provider(MediaKind::Video), "veo");
    }
}
