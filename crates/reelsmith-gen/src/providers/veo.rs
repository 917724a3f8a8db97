//! Veo video generation through Vertex AI
//!
//! Starts a long-running `generateVideo` operation and polls it (see
//! [`crate::operation`]). Without a cloud project the request is recorded as
//! a `.pending.json` placeholder next to the intended output.

use crate::config::{CloudConfig, ProjectPaths, ReelConfig};
use crate::http;
use crate::operation::{self, PollPolicy};
use crate::output::{pending_path, prepare_output};
use crate::provider::*;
use crate::style::PromptStyle;
use base64::Engine;
use reelsmith_core::{ReelError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

const SERVICE: &str = "Veo";

pub struct VeoProvider {
    cloud: CloudConfig,
    model: String,
    style: PromptStyle,
    default_duration: f64,
    policy: PollPolicy,
}

/// Body of a `.pending.json` placeholder
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingVideo {
    pub status: String,
    pub prompt: String,
    pub duration: f64,
    pub source_image: Option<String>,
    pub created_at: String,
    pub note: String,
}

impl VeoProvider {
    /// Never fails: a missing project only means generation is deferred
    pub fn from_config(config: &ReelConfig) -> Result<Self> {
        Ok(Self {
            cloud: config.cloud.clone(),
            model: config.models.video.clone(),
            style: config.style.clone(),
            default_duration: config.generation.video_duration,
            policy: PollPolicy::default(),
        })
    }

    fn host(&self) -> String {
        format!("https://{}-aiplatform.googleapis.com/v1", self.cloud.location)
    }

    fn endpoint(&self, project: &str) -> String {
        format!(
            "{}/projects/{}/locations/{}/publishers/google/models/{}:generateVideo",
            self.host(),
            project,
            self.cloud.location,
            self.model
        )
    }

    fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cloud.access_token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(token.to_string());
        }
        let output = Command::new("gcloud")
            .args(["auth", "application-default", "print-access-token"])
            .output()
            .map_err(|e| ReelError::Config(format!("Could not run gcloud for an access token: {}", e)))?;
        if !output.status.success() {
            return Err(ReelError::Config(format!(
                "gcloud auth failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn write_placeholder(&self, output_path: &Path, request: &GenerateRequest, duration: f64) -> Result<PathBuf> {
        tracing::warn!("GOOGLE_CLOUD_PROJECT not set, recording a pending video request");
        let placeholder = PendingVideo {
            status: "pending".to_string(),
            prompt: request.prompt.clone(),
            duration,
            source_image: request.source_image.clone(),
            created_at: reelsmith_core::now_rfc3339(),
            note: "Veo API requires Vertex AI setup".to_string(),
        };
        let path = pending_path(output_path);
        std::fs::write(&path, serde_json::to_string_pretty(&placeholder)?)?;
        println!("Created pending video request: {}", path.display());
        Ok(path)
    }

    fn run_operation(&self, project: &str, body: &serde_json::Value) -> Result<Vec<u8>> {
        let token = self.access_token()?;
        let bearer = format!("Bearer {}", token);
        let agent = http::build_agent(http::REQUEST_TIMEOUT_SECS);

        let response = http::send_with_retry(SERVICE, || {
            agent
                .post(&self.endpoint(project))
                .header("Authorization", &bearer)
                .header("Content-Type", "application/json")
                .send_json(body)
        })?;
        let response = http::check_status(SERVICE, response)?;
        let started: serde_json::Value = http::read_json(SERVICE, response)?;
        let name = started
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| ReelError::Generation("Veo response has no operation name".to_string()))?
            .to_string();
        println!("Video generation started: {}", name);

        let poll_url = format!("{}/{}", self.host(), name);
        let data = operation::drive(
            self.policy,
            || {
                let response = http::send_with_retry(SERVICE, || {
                    agent.get(&poll_url).header("Authorization", &bearer).call()
                })?;
                let response = http::check_status(SERVICE, response)?;
                http::read_json(SERVICE, response)
            },
            std::thread::sleep,
        )?;

        base64::engine::general_purpose::STANDARD
            .decode(data.as_bytes())
            .map_err(|e| ReelError::Generation(format!("Invalid video data: {}", e)))
    }
}

/// Request body; `image` carries base64 bytes for image-to-video
pub fn request_body(prompt: &str, duration: f64, image: Option<&[u8]>) -> serde_json::Value {
    let mut instance = serde_json::json!({ "prompt": prompt });
    if let Some(bytes) = image {
        instance["image"] = serde_json::json!({
            "bytesBase64Encoded": base64::engine::general_purpose::STANDARD.encode(bytes)
        });
    }
    serde_json::json!({
        "instances": [instance],
        "parameters": {
            "sampleCount": 1,
            "durationSeconds": duration,
            "aspectRatio": "16:9"
        }
    })
}

/// Source image bytes, if the named file exists under the images directory
fn load_source_image(paths: &ProjectPaths, source: Option<&str>) -> Result<Option<Vec<u8>>> {
    let Some(name) = source else {
        return Ok(None);
    };
    let path = paths.images_dir().join(name);
    if !path.is_file() {
        tracing::warn!("Source image {} not found, generating from text", path.display());
        return Ok(None);
    }
    Ok(Some(std::fs::read(path)?))
}

impl GenerationProvider for VeoProvider {
    fn name(&self) -> &str {
        "veo"
    }

    fn supported_kinds(&self) -> Vec<MediaKind> {
        vec![MediaKind::Video]
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        match self.cloud.project.as_deref() {
            Some(p) if !p.is_empty() => Ok(ProviderStatus::Available),
            _ => Ok(ProviderStatus::Unavailable(
                "GOOGLE_CLOUD_PROJECT not set, requests are saved as pending".to_string(),
            )),
        }
    }

    fn generate(&self, request: &GenerateRequest, paths: &ProjectPaths) -> Result<GenerateResult> {
        if request.kind != MediaKind::Video {
            return Err(unsupported(self.name(), request.kind));
        }
        let start = std::time::Instant::now();
        let duration = request.duration.unwrap_or(self.default_duration);
        let output_path = prepare_output(paths, MediaKind::Video, &request.output)?;
        let mut metadata = HashMap::new();

        let project = match self.cloud.project.as_deref().filter(|p| !p.is_empty()) {
            Some(project) => project,
            None => {
                let path = self.write_placeholder(&output_path, request, duration)?;
                metadata.insert(
                    "note".to_string(),
                    "Set GOOGLE_CLOUD_PROJECT to generate real video".to_string(),
                );
                return Ok(GenerateResult {
                    output_path: path,
                    prompt_used: request.prompt.clone(),
                    provider: "veo".to_string(),
                    duration_secs: start.elapsed().as_secs_f64(),
                    placeholder: true,
                    metadata,
                });
            }
        };

        let image = load_source_image(paths, request.source_image.as_deref())?;
        let prompt = self.style.video_prompt(&request.prompt, image.is_some());
        let body = request_body(&prompt, duration, image.as_deref());

        let bytes = self.run_operation(project, &body)?;
        std::fs::write(&output_path, &bytes)?;
        println!("Video saved to: {}", output_path.display());

        metadata.insert("model".to_string(), self.model.clone());
        if image.is_some() {
            metadata.insert("mode".to_string(), "image-to-video".to_string());
        }

        Ok(GenerateResult {
            output_path,
            prompt_used: prompt,
            provider: "veo".to_string(),
            duration_secs: start.elapsed().as_secs_f64(),
            placeholder: false,
            metadata,
        })
    }

    fn build_prompt(&self, request: &GenerateRequest) -> String {
        self.style
            .video_prompt(&request.prompt, request.source_image.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("reelsmith_veo_test_{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_request_body_text_only() {
        let body = request_body("Cinematic documentary footage for documentary video: ghats", 5.0, None);
        assert_eq!(body["parameters"]["sampleCount"], 1);
        assert_eq!(body["parameters"]["durationSeconds"], 5.0);
        assert_eq!(body["parameters"]["aspectRatio"], "16:9");
        assert!(body["instances"][0].get("image").is_none());
    }

    #[test]
    fn test_request_body_with_image() {
        let body = request_body("Animate this image with cinematic motion: ghats", 8.0, Some(b"PNG"));
        assert_eq!(body["instances"][0]["image"]["bytesBase64Encoded"], "UE5H");
    }

    #[test]
    fn test_endpoint_uses_location() {
        let mut config = ReelConfig::default();
        config.cloud.project = Some("docu-123".to_string());
        config.cloud.location = "europe-west4".to_string();
        let veo = VeoProvider::from_config(&config).unwrap();
        assert_eq!(
            veo.endpoint("docu-123"),
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/docu-123/locations/europe-west4/publishers/google/models/veo-001:generateVideo"
        );
    }

    #[test]
    fn test_missing_project_writes_pending_placeholder() {
        let root = temp_root();
        let paths = ProjectPaths::new(&root);
        let veo = VeoProvider::from_config(&ReelConfig::default()).unwrap();

        let request = GenerateRequest::new(MediaKind::Video, "Train crossing Pamban bridge", "ch3/pamban")
            .with_duration(Some(8.0))
            .with_source_image(Some("ch3/pamban.png".to_string()));
        let result = veo.generate(&request, &paths).unwrap();

        assert!(result.placeholder);
        assert_eq!(result.output_path, root.join("public/video/ch3/pamban.pending.json"));
        assert!(!root.join("public/video/ch3/pamban.mp4").exists());

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&result.output_path).unwrap()).unwrap();
        assert_eq!(saved["status"], "pending");
        assert_eq!(saved["prompt"], "Train crossing Pamban bridge");
        assert_eq!(saved["duration"], 8.0);
        assert_eq!(saved["sourceImage"], "ch3/pamban.png");
        assert_eq!(saved["note"], "Veo API requires Vertex AI setup");
        assert!(saved["createdAt"].as_str().unwrap().ends_with('Z'));

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_placeholder_source_image_is_null_when_absent() {
        let root = temp_root();
        let paths = ProjectPaths::new(&root);
        let veo = VeoProvider::from_config(&ReelConfig::default()).unwrap();

        let request = GenerateRequest::new(MediaKind::Video, "Monsoon over Konkan", "public/video/konkan.mp4");
        let result = veo.generate(&request, &paths).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&result.output_path).unwrap()).unwrap();
        assert!(saved["sourceImage"].is_null());
        assert_eq!(saved["duration"], 5.0);

        std::fs::remove_dir_all(&root).ok();
    }
}
