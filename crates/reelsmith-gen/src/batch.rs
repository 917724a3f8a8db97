//! Batch generation of pending manifest records
//!
//! Walks the selected records in manifest order (images, then audio, then
//! video), generates each one, and settles its status. A failed record is
//! counted and reported; the run always continues with the next one.

use crate::config::ProjectPaths;
use crate::manifest::{
    AssetManifest, AssetSelection, AssetStatus, AudioAsset, AudioType, Collection, ImageAsset,
    ManifestStats, ManifestStore, VideoAsset,
};
use crate::provider::{AspectRatio, GenerateRequest, MediaKind};
use crate::providers::ProviderRouter;
use reelsmith_core::{ReelError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DELAY_MS: u64 = 2000;

/// Which records a batch picks up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    AllPending,
    /// Pending records of one chapter (audio of chapter 0 included)
    Chapter(u32),
}

/// `--type` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    Images,
    Audio,
    Video,
    #[default]
    All,
}

impl KindFilter {
    pub fn includes(self, collection: Collection) -> bool {
        matches!(
            (self, collection),
            (KindFilter::All, _)
                | (KindFilter::Images, Collection::Images)
                | (KindFilter::Audio, Collection::Audio)
                | (KindFilter::Video, Collection::Video)
        )
    }

    /// Media kinds a run with this filter may generate
    pub fn media_kinds(self) -> Vec<MediaKind> {
        MediaKind::ALL
            .into_iter()
            .filter(|kind| self.includes(collection_of(*kind)))
            .collect()
    }
}

impl FromStr for KindFilter {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "images" => Ok(KindFilter::Images),
            "audio" => Ok(KindFilter::Audio),
            "video" => Ok(KindFilter::Video),
            "all" => Ok(KindFilter::All),
            other => Err(ReelError::Validation(format!(
                "Unknown type '{}'. Use images, audio, video or all",
                other
            ))),
        }
    }
}

fn collection_of(kind: MediaKind) -> Collection {
    match kind {
        MediaKind::Image => Collection::Images,
        MediaKind::Narration | MediaKind::SoundEffect | MediaKind::Music => Collection::Audio,
        MediaKind::Video => Collection::Video,
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub selection: Selection,
    pub kinds: KindFilter,
    pub delay: Duration,
    pub dry_run: bool,
    pub aspect_ratio: AspectRatio,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            selection: Selection::AllPending,
            kinds: KindFilter::All,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            dry_run: false,
            aspect_ratio: AspectRatio::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub id: String,
    pub collection: Collection,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub dry_run: bool,
    pub failures: Vec<BatchFailure>,
    /// Placeholder files written in place of real media; their records are
    /// `generated` and need `manifest reset` to be produced for real
    pub placeholders: Vec<PathBuf>,
    /// Manifest-wide counts after the run
    pub stats: ManifestStats,
}

impl BatchReport {
    pub fn print_summary(&self) {
        println!();
        println!("Generation complete");
        println!("  Completed: {}", self.completed);
        println!("  Failed:    {}", self.failed);
        println!("  Total:     {}", self.total);
        println!();
        println!("Overall progress:");
        println!("  Generated: {}/{}", self.stats.generated, self.stats.total);
        println!("  Pending:   {}", self.stats.pending);
        println!("  Failed:    {}", self.stats.failed);

        if !self.failures.is_empty() {
            println!();
            println!("Failures:");
            for failure in &self.failures {
                println!("  {} ({}): {}", failure.id, failure.collection, failure.error);
            }
        }

        if !self.placeholders.is_empty() {
            println!();
            println!("Placeholders (reset the record once real generation is configured):");
            for path in &self.placeholders {
                println!("  {}", path.display());
            }
        }
    }
}

/// One record, ready to hand to a provider
#[derive(Debug, Clone)]
struct Job {
    collection: Collection,
    id: String,
    label: String,
    filename: String,
    request: GenerateRequest,
}

pub fn image_request(asset: &ImageAsset, aspect_ratio: AspectRatio) -> GenerateRequest {
    GenerateRequest::new(MediaKind::Image, &asset.prompt, &asset.filename).with_aspect_ratio(aspect_ratio)
}

/// Audio records dispatch on their `type`
pub fn audio_request(asset: &AudioAsset) -> GenerateRequest {
    let kind = match asset.audio_type {
        AudioType::Narration => MediaKind::Narration,
        AudioType::Sfx => MediaKind::SoundEffect,
        AudioType::Music => MediaKind::Music,
    };
    GenerateRequest::new(kind, &asset.prompt, &asset.filename)
        .with_voice(asset.voice.clone())
        .with_duration(asset.duration)
}

pub fn video_request(asset: &VideoAsset) -> GenerateRequest {
    GenerateRequest::new(MediaKind::Video, &asset.prompt, &asset.filename)
        .with_duration(asset.duration)
        .with_source_image(asset.source_image.clone())
}

/// Pending records for a selection, in manifest order
pub fn select(manifest: &AssetManifest, selection: Selection) -> AssetSelection {
    match selection {
        Selection::AllPending => manifest.pending(),
        Selection::Chapter(n) => manifest.by_chapter(n).with_status(AssetStatus::Pending),
    }
}

fn plan(selected: &AssetSelection, options: &BatchOptions) -> Vec<Vec<Job>> {
    let mut groups = Vec::new();
    if options.kinds.includes(Collection::Images) {
        groups.push(
            selected
                .images
                .iter()
                .map(|a| Job {
                    collection: Collection::Images,
                    id: a.id.clone(),
                    label: a.id.clone(),
                    filename: a.filename.clone(),
                    request: image_request(a, options.aspect_ratio),
                })
                .collect(),
        );
    }
    if options.kinds.includes(Collection::Audio) {
        groups.push(
            selected
                .audio
                .iter()
                .map(|a| Job {
                    collection: Collection::Audio,
                    id: a.id.clone(),
                    label: format!("{} ({})", a.id, a.audio_type),
                    filename: a.filename.clone(),
                    request: audio_request(a),
                })
                .collect(),
        );
    }
    if options.kinds.includes(Collection::Video) {
        groups.push(
            selected
                .video
                .iter()
                .map(|a| Job {
                    collection: Collection::Video,
                    id: a.id.clone(),
                    label: a.id.clone(),
                    filename: a.filename.clone(),
                    request: video_request(a),
                })
                .collect(),
        );
    }
    groups
}

/// Run a batch. `sleep` is called for the delay between records of the same
/// group and never after the last record of a group.
pub fn run_batch<S>(
    options: &BatchOptions,
    store: &ManifestStore,
    router: &ProviderRouter,
    paths: &ProjectPaths,
    mut sleep: S,
) -> Result<BatchReport>
where
    S: FnMut(Duration),
{
    let manifest = store.load()?;
    let selected = select(&manifest, options.selection);
    let groups = plan(&selected, options);
    let total: usize = groups.iter().map(Vec::len).sum();

    match options.selection {
        Selection::AllPending => println!("Generating all pending assets"),
        Selection::Chapter(n) => println!("Generating pending assets for chapter {}", n),
    }
    println!("Assets to generate: {}", total);

    let mut report = BatchReport {
        completed: 0,
        failed: 0,
        total,
        dry_run: options.dry_run,
        failures: Vec::new(),
        placeholders: Vec::new(),
        stats: manifest.stats(),
    };

    if total == 0 {
        println!("No pending assets to generate");
        return Ok(report);
    }

    if options.dry_run {
        println!("[DRY RUN] Would generate:");
        for job in groups.iter().flatten() {
            println!("  - {}: {}", job.label, job.filename);
        }
        return Ok(report);
    }

    let mut index = 0;
    for group in &groups {
        for (position, job) in group.iter().enumerate() {
            index += 1;
            println!("[{}/{}] Generating: {}", index, total, job.label);

            match router.generate(&job.request, paths) {
                Ok(result) => {
                    store.update_status(&job.id, AssetStatus::Generated, job.collection)?;
                    report.completed += 1;
                    if result.placeholder {
                        tracing::warn!(
                            "{} marked generated but only a placeholder was written: {}",
                            job.id,
                            result.output_path.display()
                        );
                        report.placeholders.push(result.output_path.clone());
                    }
                    println!("✓ Completed: {}", result.output_path.display());
                }
                Err(e) => {
                    store.update_status(&job.id, AssetStatus::Failed, job.collection)?;
                    report.failed += 1;
                    eprintln!("✗ Failed: {} - {}", job.id, e);
                    report.failures.push(BatchFailure {
                        id: job.id.clone(),
                        collection: job.collection,
                        error: e.to_string(),
                    });
                }
            }

            if position + 1 < group.len() {
                sleep(options.delay);
            }
        }
    }

    report.stats = store.load()?.stats();
    tracing::info!(
        completed = report.completed,
        failed = report.failed,
        "Batch finished"
    );
    Ok(report)
}
