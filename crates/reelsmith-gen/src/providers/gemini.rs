//! Gemini image generation provider
//!
//! One `generateContent` call per image. The image comes back inline as
//! base64 along with its MIME type, which decides the file extension.

use crate::config::{ProjectPaths, ReelConfig};
use crate::http;
use crate::output::{mime_extension, prepare_output, replace_extension};
use crate::provider::*;
use crate::style::PromptStyle;
use base64::Engine;
use reelsmith_core::{ReelError, Result};
use serde::Deserialize;
use std::collections::HashMap;

const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const SERVICE: &str = "Gemini";

pub struct GeminiProvider {
    api_key: String,
    api_url: String,
    model: String,
    style: PromptStyle,
}

impl GeminiProvider {
    pub fn from_config(config: &ReelConfig) -> Result<Self> {
        let api_key = config
            .api_key("gemini")
            .ok_or_else(|| ReelError::MissingCredentials(vec!["GOOGLE_API_KEY".to_string()]))?
            .to_string();
        let api_url = config
            .api_url("gemini")
            .unwrap_or(DEFAULT_GEMINI_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            api_url,
            model: config.models.image.clone(),
            style: config.style.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

/// JSON body for a single-prompt image request
pub fn request_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "responseModalities": ["IMAGE", "TEXT"]
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

/// An image decoded from a response
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Pull the first inline image out of a `generateContent` response
pub fn parse_image_response(response: &serde_json::Value) -> Result<InlineImage> {
    let parsed: GenerateContentResponse = serde_json::from_value(response.clone())?;
    let parts = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ReelError::Generation("No response parts received".to_string()))?;

    for part in parts {
        if let Some(InlineData {
            mime_type,
            data: Some(data),
        }) = part.inline_data
        {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data.as_bytes())
                .map_err(|e| ReelError::Generation(format!("Invalid image data: {}", e)))?;
            return Ok(InlineImage {
                mime_type: mime_type.unwrap_or_else(|| "image/png".to_string()),
                bytes,
            });
        }
    }

    Err(ReelError::Generation("No image data in response".to_string()))
}

impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn supported_kinds(&self) -> Vec<MediaKind> {
        vec![MediaKind::Image]
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        if self.api_key.is_empty() {
            return Ok(ProviderStatus::NoApiKey);
        }
        Ok(ProviderStatus::Available)
    }

    fn generate(&self, request: &GenerateRequest, paths: &ProjectPaths) -> Result<GenerateResult> {
        if request.kind != MediaKind::Image {
            return Err(unsupported(self.name(), request.kind));
        }
        let start = std::time::Instant::now();
        let prompt = self.build_prompt(request);
        let output_path = prepare_output(paths, MediaKind::Image, &request.output)?;

        tracing::debug!(model = %self.model, "Requesting image for {}", output_path.display());
        let agent = http::build_agent(http::REQUEST_TIMEOUT_SECS);
        let body = request_body(&prompt);
        let response = http::send_with_retry(SERVICE, || {
            agent
                .post(&self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .send_json(&body)
        })?;
        let response = http::check_status(SERVICE, response)?;
        let json: serde_json::Value = http::read_json(SERVICE, response)?;
        let image = parse_image_response(&json)?;

        let final_path = replace_extension(&output_path, mime_extension(&image.mime_type));
        std::fs::write(&final_path, &image.bytes)?;

        let mut metadata = HashMap::new();
        metadata.insert("mime_type".to_string(), image.mime_type);
        metadata.insert("aspect_ratio".to_string(), request.aspect_ratio.to_string());

        Ok(GenerateResult {
            output_path: final_path,
            prompt_used: prompt,
            provider: "gemini".to_string(),
            duration_secs: start.elapsed().as_secs_f64(),
            placeholder: false,
            metadata,
        })
    }

    fn build_prompt(&self, request: &GenerateRequest) -> String {
        self.style.image_prompt(&request.prompt, request.aspect_ratio)
    }
}
