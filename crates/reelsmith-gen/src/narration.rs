//! Narration batch: one speech file per narration script entry
//!
//! Sequential mode waits between requests. Parallel mode issues each chunk
//! of `concurrency` requests at once on scoped threads and joins them all
//! before the next chunk starts.

use crate::config::ProjectPaths;
use crate::provider::{GenerateRequest, MediaKind};
use crate::providers::ProviderRouter;
use reelsmith_core::Result;
use reelsmith_timeline::NarrationEntry;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const SEQUENTIAL_DELAY_MS: u64 = 500;
pub const CHUNK_DELAY_MS: u64 = 1000;
pub const DEFAULT_CONCURRENCY: usize = 3;
/// Slightly calmer than one-off narration
pub const NARRATION_VOICE_STYLE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationMode {
    Sequential,
    Parallel { concurrency: usize },
}

impl Default for NarrationMode {
    fn default() -> Self {
        NarrationMode::Parallel {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrationOutcome {
    pub id: String,
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl NarrationOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// `manifest.json` written next to the narration files
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationManifest {
    pub generated_at: String,
    pub voice_id: String,
    pub total_entries: usize,
    pub successful: usize,
    pub failed: usize,
    pub files: Vec<NarrationFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NarrationFile {
    pub id: String,
    pub path: String,
}

fn request_for(entry: &NarrationEntry, voice_id: &str) -> GenerateRequest {
    GenerateRequest::new(MediaKind::Narration, &entry.text, entry.audio_filename())
        .with_voice(Some(voice_id.to_string()))
        .with_voice_style(NARRATION_VOICE_STYLE)
}

fn narrate(entry: &NarrationEntry, voice_id: &str, router: &ProviderRouter, paths: &ProjectPaths) -> NarrationOutcome {
    println!("Generating: {} (chapter {}, {})", entry.id, entry.chapter, entry.scene);
    match router.generate(&request_for(entry, voice_id), paths) {
        Ok(result) => {
            println!("  Saved: {}", result.output_path.display());
            NarrationOutcome {
                id: entry.id.clone(),
                output_path: Some(result.output_path),
                error: None,
            }
        }
        Err(e) => {
            eprintln!("  ERROR: {}: {}", entry.id, e);
            NarrationOutcome {
                id: entry.id.clone(),
                output_path: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Generate speech for `entries` in order; outcomes come back in entry order
pub fn generate_all<S>(
    entries: &[&NarrationEntry],
    mode: NarrationMode,
    voice_id: &str,
    router: &ProviderRouter,
    paths: &ProjectPaths,
    mut sleep: S,
) -> Vec<NarrationOutcome>
where
    S: FnMut(Duration),
{
    let mut outcomes = Vec::with_capacity(entries.len());
    match mode {
        NarrationMode::Sequential => {
            for (i, entry) in entries.iter().enumerate() {
                outcomes.push(narrate(entry, voice_id, router, paths));
                if i + 1 < entries.len() {
                    sleep(Duration::from_millis(SEQUENTIAL_DELAY_MS));
                }
            }
        }
        NarrationMode::Parallel { concurrency } => {
            let chunks: Vec<&[&NarrationEntry]> = entries.chunks(concurrency.max(1)).collect();
            for (i, chunk) in chunks.iter().enumerate() {
                let settled: Vec<NarrationOutcome> = std::thread::scope(|scope| {
                    let handles: Vec<_> = chunk
                        .iter()
                        .map(|entry| scope.spawn(move || narrate(entry, voice_id, router, paths)))
                        .collect();
                    handles
                        .into_iter()
                        .zip(chunk.iter())
                        .map(|(handle, entry)| {
                            handle.join().unwrap_or_else(|_| NarrationOutcome {
                                id: entry.id.clone(),
                                output_path: None,
                                error: Some("worker thread panicked".to_string()),
                            })
                        })
                        .collect()
                });
                outcomes.extend(settled);
                if i + 1 < chunks.len() {
                    sleep(Duration::from_millis(CHUNK_DELAY_MS));
                }
            }
        }
    }
    outcomes
}

pub fn build_manifest(voice_id: &str, outcomes: &[NarrationOutcome]) -> NarrationManifest {
    let files: Vec<NarrationFile> = outcomes
        .iter()
        .filter_map(|o| {
            o.output_path.as_ref().map(|p| NarrationFile {
                id: o.id.clone(),
                path: p.to_string_lossy().to_string(),
            })
        })
        .collect();
    NarrationManifest {
        generated_at: reelsmith_core::now_rfc3339(),
        voice_id: voice_id.to_string(),
        total_entries: outcomes.len(),
        successful: files.len(),
        failed: outcomes.len() - files.len(),
        files,
    }
}

pub fn write_manifest(paths: &ProjectPaths, manifest: &NarrationManifest) -> Result<PathBuf> {
    let dir = paths.narration_dir();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("manifest.json");
    std::fs::write(&path, serde_json::to_string_pretty(manifest)?)?;
    Ok(path)
}

/// Generate, report, and write the narration manifest. A dry run only lists
/// the entries.
pub fn run_narration<S>(
    entries: &[&NarrationEntry],
    mode: NarrationMode,
    dry_run: bool,
    voice_id: &str,
    router: &ProviderRouter,
    paths: &ProjectPaths,
    sleep: S,
) -> Result<Option<NarrationManifest>>
where
    S: FnMut(Duration),
{
    println!("Voice ID: {}", voice_id);
    println!("Output directory: {}", paths.narration_dir().display());
    println!("Total entries: {}", entries.len());
    match (dry_run, mode) {
        (true, _) => println!("Mode: dry run"),
        (false, NarrationMode::Sequential) => println!("Mode: sequential"),
        (false, NarrationMode::Parallel { concurrency }) => {
            println!("Mode: parallel ({} concurrent)", concurrency)
        }
    }

    if dry_run {
        for entry in entries {
            println!("  - {}: \"{}\"", entry.id, preview(&entry.text, 50));
        }
        return Ok(None);
    }

    let start = Instant::now();
    let outcomes = generate_all(entries, mode, voice_id, router, paths, sleep);
    let manifest = build_manifest(voice_id, &outcomes);

    println!();
    println!("Total time: {:.1}s", start.elapsed().as_secs_f64());
    println!("Successful: {}/{}", manifest.successful, manifest.total_entries);
    println!("Failed: {}/{}", manifest.failed, manifest.total_entries);
    for outcome in outcomes.iter().filter(|o| !o.success()) {
        println!("  - {}: {}", outcome.id, outcome.error.as_deref().unwrap_or_default());
    }

    let path = write_manifest(paths, &manifest)?;
    println!("Manifest saved: {}", path.display());
    Ok(Some(manifest))
}

/// First `max` characters, on a char boundary
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{GenerateResult, GenerationProvider, ProviderStatus};
    use reelsmith_core::ReelError;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Records start/end events; entry "slow" takes longer than the rest
    struct RecordingProvider {
        events: Arc<Mutex<Vec<String>>>,
        fail: Vec<String>,
    }

    impl GenerationProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }
        fn supported_kinds(&self) -> Vec<MediaKind> {
            vec![MediaKind::Narration]
        }
        fn health_check(&self) -> Result<ProviderStatus> {
            Ok(ProviderStatus::Available)
        }
        fn generate(&self, request: &GenerateRequest, _paths: &ProjectPaths) -> Result<GenerateResult> {
            let id = request.output.trim_end_matches(".mp3").to_string();
            self.events.lock().unwrap().push(format!("start {}", id));
            let pause = if id == "slow" { 60 } else { 5 };
            std::thread::sleep(Duration::from_millis(pause));
            self.events.lock().unwrap().push(format!("end {}", id));

            assert_eq!(request.voice_style, Some(0.4));
            if self.fail.contains(&id) {
                return Err(ReelError::upstream("ElevenLabs TTS", 429, "rate limited"));
            }
            Ok(GenerateResult {
                output_path: PathBuf::from(format!("/out/{}", request.output)),
                prompt_used: request.prompt.clone(),
                provider: "recording".to_string(),
                duration_secs: 0.0,
                placeholder: false,
                metadata: HashMap::new(),
            })
        }
        fn build_prompt(&self, request: &GenerateRequest) -> String {
            request.prompt.clone()
        }
    }

    fn router(fail: &[&str]) -> (ProviderRouter, Arc<Mutex<Vec<String>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let provider = RecordingProvider {
            events: events.clone(),
            fail: fail.iter().map(|s| s.to_string()).collect(),
        };
        let router = ProviderRouter::new().route(MediaKind::Narration, Box::new(provider));
        (router, events)
    }

    fn entry(id: &str, chapter: u32) -> NarrationEntry {
        NarrationEntry {
            id: id.to_string(),
            chapter,
            scene: "opening".to_string(),
            text: format!("Text for {}", id),
            start_frame: 0,
            duration_frames: 90,
        }
    }

    #[test]
    fn test_parallel_chunks_do_not_overlap() {
        let entries = vec![entry("slow", 1), entry("b", 1), entry("c", 2), entry("d", 2)];
        let refs: Vec<&NarrationEntry> = entries.iter().collect();
        let (router, log) = router(&[]);
        let paths = ProjectPaths::new("/unused");

        let mut sleeps = Vec::new();
        let outcomes = generate_all(
            &refs,
            NarrationMode::Parallel { concurrency: 2 },
            "pFZP5JQG7iQjIQuC4Bku",
            &router,
            &paths,
            |d| sleeps.push(d),
        );

        let events = log.lock().unwrap().clone();
        let pos = |e: &str| events.iter().position(|x| x == e).unwrap();
        let chunk2_start = pos("start c").min(pos("start d"));
        assert!(pos("end slow") < chunk2_start);
        assert!(pos("end b") < chunk2_start);

        assert_eq!(
            outcomes.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
            vec!["slow", "b", "c", "d"]
        );
        assert_eq!(sleeps, vec![Duration::from_millis(1000)]);
    }

    #[test]
    fn test_sequential_delays_between_requests() {
        let entries = vec![entry("a", 1), entry("b", 1), entry("c", 1)];
        let refs: Vec<&NarrationEntry> = entries.iter().collect();
        let (router, _) = router(&["b"]);
        let paths = ProjectPaths::new("/unused");

        let mut sleeps = Vec::new();
        let outcomes = generate_all(&refs, NarrationMode::Sequential, "v", &router, &paths, |d| {
            sleeps.push(d)
        });
        assert_eq!(sleeps, vec![Duration::from_millis(500); 2]);
        assert!(outcomes[0].success());
        assert!(!outcomes[1].success());
        assert!(outcomes[1].error.as_deref().unwrap().contains("429"));
    }

    #[test]
    fn test_manifest_counts_and_file() {
        let root = std::env::temp_dir().join(format!("reelsmith_narration_test_{}", uuid::Uuid::new_v4()));
        let paths = ProjectPaths::new(&root);
        let outcomes = vec![
            NarrationOutcome {
                id: "a".to_string(),
                output_path: Some(PathBuf::from("/out/a.mp3")),
                error: None,
            },
            NarrationOutcome {
                id: "b".to_string(),
                output_path: None,
                error: Some("boom".to_string()),
            },
        ];
        let manifest = build_manifest("voice-123", &outcomes);
        assert_eq!((manifest.total_entries, manifest.successful, manifest.failed), (2, 1, 1));

        let path = write_manifest(&paths, &manifest).unwrap();
        assert_eq!(path, root.join("public/audio/narration/manifest.json"));
        let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["voiceId"], "voice-123");
        assert_eq!(saved["totalEntries"], 2);
        assert_eq!(saved["files"][0]["path"], "/out/a.mp3");
        assert!(saved.get("generatedAt").is_some());

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let root = std::env::temp_dir().join(format!("reelsmith_narration_test_{}", uuid::Uuid::new_v4()));
        let paths = ProjectPaths::new(&root);
        let entries = vec![entry("a", 1)];
        let refs: Vec<&NarrationEntry> = entries.iter().collect();
        let (router, log) = router(&[]);

        let result = run_narration(&refs, NarrationMode::default(), true, "v", &router, &paths, |_| {}).unwrap();
        assert!(result.is_none());
        assert!(log.lock().unwrap().is_empty());
        assert!(!root.exists());
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("भारतीय रेल", 3), "भार...");
        assert_eq!(preview("short", 50), "short");
    }
}
