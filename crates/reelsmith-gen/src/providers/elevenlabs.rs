//! ElevenLabs audio provider
//!
//! Narration (text-to-speech), sound effects and short music cues all come
//! back as MP3 bytes from a single blocking request. Long-form music goes
//! through the compose endpoint, and speech-to-text drives caption timing.

use crate::config::{ProjectPaths, ReelConfig, VoiceConfig};
use crate::http::{self, Multipart};
use crate::output::prepare_output;
use crate::provider::*;
use crate::style::PromptStyle;
use reelsmith_core::{ReelError, Result};
use reelsmith_timeline::CaptionWord;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const DEFAULT_ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1";

/// Longest clip the sound-generation endpoint accepts
pub const MAX_SOUND_DURATION_SECS: f64 = 22.0;
const SFX_PROMPT_INFLUENCE: f64 = 0.3;
const MUSIC_PROMPT_INFLUENCE: f64 = 0.5;
/// Voice style for one-off narration; the narration batch uses 0.4
pub const DEFAULT_VOICE_STYLE: f64 = 0.5;
const COMPOSE_TIMEOUT_SECS: u64 = 600;

pub struct ElevenLabsProvider {
    api_key: String,
    api_url: String,
    tts_model: String,
    stt_model: String,
    voices: VoiceConfig,
    style: PromptStyle,
    sfx_duration: f64,
    music_duration: f64,
}

impl ElevenLabsProvider {
    pub fn from_config(config: &ReelConfig) -> Result<Self> {
        let api_key = config
            .api_key("elevenlabs")
            .ok_or_else(|| {
                ReelError::MissingCredentials(vec!["ELEVENLABS_API_KEY".to_string()])
            })?
            .to_string();
        let api_url = config
            .api_url("elevenlabs")
            .unwrap_or(DEFAULT_ELEVENLABS_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            api_url,
            tts_model: config.models.tts.clone(),
            stt_model: config.models.stt.clone(),
            voices: config.voices.clone(),
            style: config.style.clone(),
            sfx_duration: config.generation.sfx_duration,
            music_duration: config.generation.music_duration,
        })
    }

    fn post_json(&self, service: &str, endpoint: &str, body: &serde_json::Value, timeout_secs: u64) -> Result<Vec<u8>> {
        let agent = http::build_agent(timeout_secs);
        let url = format!("{}{}", self.api_url, endpoint);
        let response = http::send_with_retry(service, || {
            agent
                .post(&url)
                .header("xi-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .send_json(body)
        })?;
        let response = http::check_status(service, response)?;
        http::read_bytes(response)
    }

    /// Speak `text` with a resolved voice id
    pub fn text_to_speech(&self, text: &str, voice_id: &str, voice_style: f64) -> Result<Vec<u8>> {
        let body = tts_body(text, &self.tts_model, voice_style);
        self.post_json(
            "ElevenLabs TTS",
            &format!("/text-to-speech/{}", voice_id),
            &body,
            http::REQUEST_TIMEOUT_SECS,
        )
        .map_err(readable)
    }

    pub fn sound_effect(&self, prompt: &str, duration: Option<f64>) -> Result<Vec<u8>> {
        let body = sound_effect_body(prompt, duration.unwrap_or(self.sfx_duration));
        self.post_json("ElevenLabs SFX", "/sound-generation", &body, http::REQUEST_TIMEOUT_SECS)
            .map_err(readable)
    }

    pub fn music_cue(&self, prompt: &str, duration: Option<f64>) -> Result<Vec<u8>> {
        let body = music_body(
            &self.style.music_prompt(prompt),
            duration.unwrap_or(self.music_duration),
        );
        self.post_json("ElevenLabs Music", "/sound-generation", &body, http::REQUEST_TIMEOUT_SECS)
            .map_err(readable)
    }

    /// One compose request; a rejected prompt surfaces as an upstream error
    /// with the raw body so the suggested prompt can be read from it
    pub fn compose(&self, prompt: &str, length_ms: u64) -> Result<Vec<u8>> {
        let body = compose_body(prompt, length_ms);
        self.post_json("ElevenLabs Music", "/music/compose", &body, COMPOSE_TIMEOUT_SECS)
    }

    /// Word-level transcription of an audio file
    pub fn transcribe(&self, path: &Path) -> Result<Vec<CaptionWord>> {
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());
        let (content_type, body) = Multipart::new()
            .text("model_id", &self.stt_model)
            .text("timestamps_granularity", "word")
            .file("file", &filename, "audio/mpeg", &data)
            .finish();

        let service = "ElevenLabs STT";
        let agent = http::build_agent(http::REQUEST_TIMEOUT_SECS);
        let url = format!("{}/speech-to-text", self.api_url);
        let response = http::send_with_retry(service, || {
            agent
                .post(&url)
                .header("xi-api-key", &self.api_key)
                .header("Content-Type", &content_type)
                .send(&body[..])
        })?;
        let response = http::check_status(service, response).map_err(readable)?;
        let json: serde_json::Value = http::read_json(service, response)?;
        parse_transcription(&json)
    }
}

/// Clamp a requested clip length to what sound generation accepts
pub fn capped_duration(seconds: f64) -> f64 {
    seconds.min(MAX_SOUND_DURATION_SECS)
}

pub fn tts_body(text: &str, model_id: &str, voice_style: f64) -> serde_json::Value {
    serde_json::json!({
        "text": text,
        "model_id": model_id,
        "voice_settings": {
            "stability": 0.5,
            "similarity_boost": 0.75,
            "style": voice_style,
            "use_speaker_boost": true
        }
    })
}

pub fn sound_effect_body(prompt: &str, duration: f64) -> serde_json::Value {
    serde_json::json!({
        "text": prompt,
        "duration_seconds": capped_duration(duration),
        "prompt_influence": SFX_PROMPT_INFLUENCE
    })
}

/// `prompt` already carries the music prefix
pub fn music_body(prompt: &str, duration: f64) -> serde_json::Value {
    serde_json::json!({
        "text": prompt,
        "duration_seconds": capped_duration(duration),
        "prompt_influence": MUSIC_PROMPT_INFLUENCE
    })
}

pub fn compose_body(prompt: &str, length_ms: u64) -> serde_json::Value {
    serde_json::json!({
        "prompt": prompt,
        "music_length_ms": length_ms
    })
}

/// The replacement prompt offered when compose rejects a prompt
pub fn suggested_prompt(error_body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(error_body).ok()?;
    let detail = value.get("detail")?;
    if detail.get("status").and_then(|s| s.as_str()) != Some("bad_prompt") {
        return None;
    }
    detail
        .get("suggested_prompt")
        .and_then(|p| p.as_str())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Run `attempt` with `prompt`; if it is rejected as a bad prompt with a
/// suggestion, run it exactly once more with the suggestion.
///
/// Returns the audio and the prompt that produced it.
pub fn compose_with_suggestion<F>(prompt: &str, mut attempt: F) -> Result<(Vec<u8>, String)>
where
    F: FnMut(&str) -> Result<Vec<u8>>,
{
    match attempt(prompt) {
        Ok(bytes) => Ok((bytes, prompt.to_string())),
        Err(ReelError::Upstream {
            service,
            status,
            body,
        }) => match suggested_prompt(&body) {
            Some(suggestion) => {
                tracing::info!("Prompt rejected, retrying with suggested prompt");
                let bytes = attempt(&suggestion).map_err(readable)?;
                Ok((bytes, suggestion))
            }
            None => Err(readable(ReelError::Upstream {
                service,
                status,
                body,
            })),
        },
        Err(e) => Err(e),
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    words: Vec<TranscribedToken>,
}

#[derive(Debug, Deserialize)]
struct TranscribedToken {
    text: String,
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(rename = "type", default)]
    token_type: String,
}

/// Keep only spoken words (drops spacing and audio events)
pub fn parse_transcription(json: &serde_json::Value) -> Result<Vec<CaptionWord>> {
    let response: TranscriptionResponse = serde_json::from_value(json.clone())?;
    Ok(response
        .words
        .into_iter()
        .filter(|w| w.token_type == "word")
        .map(|w| CaptionWord {
            text: w.text,
            start: w.start,
            end: w.end,
        })
        .collect())
}

/// The `detail.message` (or string `detail`) of an ElevenLabs error body
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;
    detail
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| detail.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Swap a raw upstream body for its message when one can be parsed
pub fn readable(err: ReelError) -> ReelError {
    match err {
        ReelError::Upstream {
            service,
            status,
            body,
        } => {
            let body = error_message(&body).unwrap_or(body);
            ReelError::Upstream {
                service,
                status,
                body,
            }
        }
        other => other,
    }
}

impl GenerationProvider for ElevenLabsProvider {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    fn supported_kinds(&self) -> Vec<MediaKind> {
        vec![MediaKind::Narration, MediaKind::SoundEffect, MediaKind::Music]
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        if self.api_key.is_empty() {
            return Ok(ProviderStatus::NoApiKey);
        }
        Ok(ProviderStatus::Available)
    }

    fn generate(&self, request: &GenerateRequest, paths: &ProjectPaths) -> Result<GenerateResult> {
        let start = std::time::Instant::now();
        let prompt = self.build_prompt(request);
        let output_path = prepare_output(paths, request.kind, &request.output)?;
        let mut metadata = HashMap::new();

        let bytes = match request.kind {
            MediaKind::Narration => {
                let voice_id = self.voices.resolve(request.voice.as_deref());
                tracing::debug!(voice = %voice_id, "Synthesizing {}", output_path.display());
                metadata.insert("voice_id".to_string(), voice_id.clone());
                self.text_to_speech(
                    &request.prompt,
                    &voice_id,
                    request.voice_style.unwrap_or(DEFAULT_VOICE_STYLE),
                )?
            }
            MediaKind::SoundEffect => {
                let seconds = capped_duration(request.duration.unwrap_or(self.sfx_duration));
                metadata.insert("duration_seconds".to_string(), seconds.to_string());
                self.sound_effect(&request.prompt, request.duration)?
            }
            MediaKind::Music => {
                let seconds = capped_duration(request.duration.unwrap_or(self.music_duration));
                metadata.insert("duration_seconds".to_string(), seconds.to_string());
                self.music_cue(&request.prompt, request.duration)?
            }
            other => return Err(unsupported(self.name(), other)),
        };

        std::fs::write(&output_path, &bytes)?;

        Ok(GenerateResult {
            output_path,
            prompt_used: prompt,
            provider: "elevenlabs".to_string(),
            duration_secs: start.elapsed().as_secs_f64(),
            placeholder: false,
            metadata,
        })
    }

    fn build_prompt(&self, request: &GenerateRequest) -> String {
        match request.kind {
            MediaKind::Music => self.style.music_prompt(&request.prompt),
            _ => request.prompt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_detail() {
        let body = r#"{"detail":{"status":"invalid_api_key","message":"Invalid API key"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Invalid API key"));
        assert_eq!(error_message(r#"{"detail":"Unauthorized"}"#).as_deref(), Some("Unauthorized"));
        assert_eq!(error_message(r#"{"detail":{"status":"bad_prompt"}}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[test]
    fn test_readable_upstream_error() {
        let body = r#"{"detail":{"status":"quota_exceeded","message":"Quota exceeded"}}"#;
        let err = readable(ReelError::upstream("ElevenLabs TTS", 401, body));
        match err {
            ReelError::Upstream { service, status, body } => {
                assert_eq!(service, "ElevenLabs TTS");
                assert_eq!(status, 401);
                assert_eq!(body, "Quota exceeded");
            }
            other => panic!("expected upstream, got {:?}", other),
        }

        // unparseable bodies pass through untouched
        let err = readable(ReelError::upstream("ElevenLabs STT", 502, "Bad Gateway"));
        assert!(matches!(err, ReelError::Upstream { ref body, .. } if body == "Bad Gateway"));
        assert!(matches!(readable(ReelError::Timeout("x".into())), ReelError::Timeout(_)));
    }

    #[test]
    fn test_compose_failure_carries_message() {
        let err = compose_with_suggestion("x", |_| {
            Err(ReelError::upstream(
                "ElevenLabs Music",
                422,
                r#"{"detail":{"status":"invalid_length","message":"music_length_ms too long"}}"#,
            ))
        })
        .unwrap_err();
        assert!(matches!(err, ReelError::Upstream { status: 422, ref body, .. } if body == "music_length_ms too long"));
    }

    #[test]
    fn test_music_duration_is_capped() {
        let body = music_body("Background music: sitar drone", 30.0);
        assert_eq!(body["duration_seconds"], 22.0);
        assert_eq!(body["prompt_influence"], 0.5);

        let body = music_body("Background music: sitar drone", 10.0);
        assert_eq!(body["duration_seconds"], 10.0);
    }

    #[test]
    fn test_sound_effect_body() {
        let body = sound_effect_body("Steam train whistle", 3.0);
        assert_eq!(body["text"], "Steam train whistle");
        assert_eq!(body["duration_seconds"], 3.0);
        assert_eq!(body["prompt_influence"], 0.3);
        assert_eq!(sound_effect_body("rain", 40.0)["duration_seconds"], 22.0);
    }

    #[test]
    fn test_tts_body_voice_settings() {
        let body = tts_body("नमस्ते", "eleven_multilingual_v2", 0.4);
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
        assert_eq!(body["voice_settings"]["stability"], 0.5);
        assert_eq!(body["voice_settings"]["similarity_boost"], 0.75);
        assert_eq!(body["voice_settings"]["style"], 0.4);
        assert_eq!(body["voice_settings"]["use_speaker_boost"], true);
    }

    #[test]
    fn test_suggested_prompt_only_for_bad_prompt() {
        let bad = r#"{"detail":{"status":"bad_prompt","suggested_prompt":"calm ambient strings"}}"#;
        assert_eq!(suggested_prompt(bad).as_deref(), Some("calm ambient strings"));

        let other = r#"{"detail":{"status":"quota_exceeded","suggested_prompt":"x"}}"#;
        assert_eq!(suggested_prompt(other), None);
        assert_eq!(suggested_prompt("not json"), None);
        assert_eq!(suggested_prompt(r#"{"detail":{"status":"bad_prompt"}}"#), None);
    }

    #[test]
    fn test_compose_retries_once_with_suggestion() {
        let mut prompts = Vec::new();
        let result = compose_with_suggestion("music like a famous band", |p| {
            prompts.push(p.to_string());
            if prompts.len() == 1 {
                Err(ReelError::upstream(
                    "ElevenLabs Music",
                    400,
                    r#"{"detail":{"status":"bad_prompt","suggested_prompt":"upbeat rock"}}"#,
                ))
            } else {
                Ok(vec![1, 2, 3])
            }
        })
        .unwrap();

        assert_eq!(prompts, vec!["music like a famous band", "upbeat rock"]);
        assert_eq!(result, (vec![1, 2, 3], "upbeat rock".to_string()));
    }

    #[test]
    fn test_compose_does_not_retry_other_failures() {
        let mut calls = 0;
        let err = compose_with_suggestion("x", |_| {
            calls += 1;
            Err(ReelError::upstream("ElevenLabs Music", 500, "internal"))
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(matches!(err, ReelError::Upstream { status: 500, .. }));

        // a second rejection is final
        let mut calls = 0;
        let bad = r#"{"detail":{"status":"bad_prompt","suggested_prompt":"y"}}"#;
        let err = compose_with_suggestion("x", |_| {
            calls += 1;
            Err(ReelError::upstream("ElevenLabs Music", 400, bad))
        })
        .unwrap_err();
        assert_eq!(calls, 2);
        assert!(err.is_upstream());
    }

    #[test]
    fn test_transcription_keeps_words_only() {
        let json = serde_json::json!({
            "language_code": "hin",
            "text": "भारतीय रेल",
            "words": [
                { "text": "भारतीय", "start": 0.0, "end": 0.5, "type": "word" },
                { "text": " ", "start": 0.5, "end": 0.52, "type": "spacing" },
                { "text": "(train horn)", "start": 0.52, "end": 1.0, "type": "audio_event" },
                { "text": "रेल", "start": 1.0, "end": 1.4, "type": "word" }
            ]
        });
        let words = parse_transcription(&json).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].text, "रेल");
        assert_eq!(words[1].start, 1.0);
    }
}
