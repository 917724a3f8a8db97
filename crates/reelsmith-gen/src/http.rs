//! Shared blocking HTTP helpers over ureq
//!
//! Status codes are returned as responses (not errors) so that a non-2xx
//! reply can be turned into [`ReelError::Upstream`] with its body intact.

use reelsmith_core::{ReelError, Result};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::time::Duration;
use ureq::http::Response;
use ureq::Body;

pub const REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_RETRIES: usize = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;

pub fn build_agent(timeout_secs: u64) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .http_status_as_error(false)
        .build();
    config.into()
}

/// Send a request, retrying transport failures (never HTTP statuses) with
/// exponential backoff
pub fn send_with_retry<F>(service: &str, mut send: F) -> Result<Response<Body>>
where
    F: FnMut() -> std::result::Result<Response<Body>, ureq::Error>,
{
    let mut attempt = 0;
    loop {
        match send() {
            Ok(response) => return Ok(response),
            Err(e) if attempt + 1 < MAX_RETRIES && is_retryable_error(&e) => {
                tracing::warn!("{} request failed ({}), retrying", service, e);
                sleep_backoff(attempt);
                attempt += 1;
            }
            Err(e) => return Err(transport_error(service, e)),
        }
    }
}

fn is_retryable_error(e: &ureq::Error) -> bool {
    matches!(
        e,
        ureq::Error::Timeout(_)
            | ureq::Error::Io(_)
            | ureq::Error::ConnectionFailed
            | ureq::Error::HostNotFound
    )
}

fn sleep_backoff(attempt: usize) {
    let delay_ms = RETRY_BASE_DELAY_MS.saturating_mul(1u64 << attempt);
    std::thread::sleep(Duration::from_millis(delay_ms));
}

pub fn transport_error(service: &str, e: ureq::Error) -> ReelError {
    match e {
        ureq::Error::Timeout(_) => ReelError::Timeout(format!("{} request timed out", service)),
        other => ReelError::Generation(format!("{} request failed: {}", service, other)),
    }
}

/// Pass 2xx responses through; turn anything else into an upstream error
pub fn check_status(service: &str, response: Response<Body>) -> Result<Response<Body>> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = read_text(response).unwrap_or_default();
    Err(ReelError::upstream(service, status, body))
}

pub fn read_text(response: Response<Body>) -> Result<String> {
    let mut text = String::new();
    response
        .into_body()
        .into_reader()
        .read_to_string(&mut text)?;
    Ok(text)
}

/// Read a full binary body (no size cap)
pub fn read_bytes(response: Response<Body>) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    response.into_body().into_reader().read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Deserialize a JSON body; streams so large base64 payloads are not capped
pub fn read_json<T: DeserializeOwned>(service: &str, response: Response<Body>) -> Result<T> {
    serde_json::from_reader(response.into_body().into_reader()).map_err(|e| {
        ReelError::Generation(format!("{} returned invalid JSON: {}", service, e))
    })
}

/// Hand-built `multipart/form-data` body
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self {
            boundary: format!("----reelsmith{}", uuid::Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Content-Type header value and the finished body
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}
