//! Asset manifest: the project's list of images, audio and video to produce
//!
//! Stored as `asset-manifest.json` at the project root. Every record starts
//! `pending` and moves to `generated` or `failed` exactly once; only an
//! explicit reset puts it back.

use crate::config::ProjectPaths;
use reelsmith_core::{ReelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const MANIFEST_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Pending,
    Generated,
    Failed,
}

impl AssetStatus {
    /// Only `pending` records may change, and only to a settled status
    pub fn can_transition_to(self, next: AssetStatus) -> bool {
        matches!(
            (self, next),
            (AssetStatus::Pending, AssetStatus::Generated) | (AssetStatus::Pending, AssetStatus::Failed)
        )
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetStatus::Pending => write!(f, "pending"),
            AssetStatus::Generated => write!(f, "generated"),
            AssetStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for AssetStatus {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(AssetStatus::Pending),
            "generated" => Ok(AssetStatus::Generated),
            "failed" => Ok(AssetStatus::Failed),
            other => Err(ReelError::Validation(format!("Unknown status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioType {
    Narration,
    Sfx,
    Music,
}

impl fmt::Display for AudioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioType::Narration => write!(f, "narration"),
            AudioType::Sfx => write!(f, "sfx"),
            AudioType::Music => write!(f, "music"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: String,
    pub chapter: u32,
    pub prompt: String,
    pub filename: String,
    pub status: AssetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub id: String,
    #[serde(rename = "type")]
    pub audio_type: AudioType,
    /// 0 means the asset belongs to every chapter
    pub chapter: u32,
    pub prompt: String,
    pub filename: String,
    pub status: AssetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAsset {
    pub id: String,
    pub chapter: u32,
    pub prompt: String,
    pub filename: String,
    pub status: AssetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Filename under the images directory; not checked against `images`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
}

/// Fields shared by every record kind
pub trait AssetRecord {
    fn id(&self) -> &str;
    fn chapter(&self) -> u32;
    fn status(&self) -> AssetStatus;
    fn set_status(&mut self, status: AssetStatus);
    fn filename(&self) -> &str;
}

macro_rules! impl_asset_record {
    ($($ty:ty),*) => {
        $(impl AssetRecord for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn chapter(&self) -> u32 {
                self.chapter
            }
            fn status(&self) -> AssetStatus {
                self.status
            }
            fn set_status(&mut self, status: AssetStatus) {
                self.status = status;
            }
            fn filename(&self) -> &str {
                &self.filename
            }
        })*
    };
}

impl_asset_record!(ImageAsset, AudioAsset, VideoAsset);

/// Which list of the manifest a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Images,
    Audio,
    Video,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Images => write!(f, "images"),
            Collection::Audio => write!(f, "audio"),
            Collection::Video => write!(f, "video"),
        }
    }
}

impl FromStr for Collection {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "images" | "image" => Ok(Collection::Images),
            "audio" => Ok(Collection::Audio),
            "video" => Ok(Collection::Video),
            other => Err(ReelError::Validation(format!(
                "Unknown collection '{}'. Use images, audio or video",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetManifest {
    pub version: String,
    pub last_updated: String,
    #[serde(default)]
    pub images: Vec<ImageAsset>,
    #[serde(default)]
    pub audio: Vec<AudioAsset>,
    #[serde(default)]
    pub video: Vec<VideoAsset>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManifestStats {
    pub total: usize,
    pub pending: usize,
    pub generated: usize,
    pub failed: usize,
}

/// A subset of records, one list per collection, in manifest order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetSelection {
    pub images: Vec<ImageAsset>,
    pub audio: Vec<AudioAsset>,
    pub video: Vec<VideoAsset>,
}

impl AssetSelection {
    pub fn len(&self) -> usize {
        self.images.len() + self.audio.len() + self.video.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only records matching `status`
    pub fn with_status(self, status: AssetStatus) -> Self {
        Self {
            images: keep(self.images, |a| a.status == status),
            audio: keep(self.audio, |a| a.status == status),
            video: keep(self.video, |a| a.status == status),
        }
    }
}

fn keep<T, F: Fn(&T) -> bool>(items: Vec<T>, f: F) -> Vec<T> {
    items.into_iter().filter(|a| f(a)).collect()
}

/// Filter accepted by `manifest list`: a status or a chapter number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    Status(AssetStatus),
    Chapter(u32),
}

impl FromStr for ListFilter {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "all" {
            return Ok(ListFilter::All);
        }
        if let Ok(status) = s.parse::<AssetStatus>() {
            return Ok(ListFilter::Status(status));
        }
        s.parse::<u32>().map(ListFilter::Chapter).map_err(|_| {
            ReelError::Validation(format!(
                "Invalid filter '{}'. Use pending, generated, failed or a chapter number",
                s
            ))
        })
    }
}

impl AssetManifest {
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            last_updated: reelsmith_core::now_rfc3339(),
            images: Vec::new(),
            audio: Vec::new(),
            video: Vec::new(),
        }
    }

    /// Images and video of chapter `n`, plus audio of chapter `n` or chapter 0
    pub fn by_chapter(&self, chapter: u32) -> AssetSelection {
        AssetSelection {
            images: select(&self.images, |a| a.chapter == chapter),
            audio: select(&self.audio, |a| a.chapter == chapter || a.chapter == 0),
            video: select(&self.video, |a| a.chapter == chapter),
        }
    }

    pub fn pending(&self) -> AssetSelection {
        self.all().with_status(AssetStatus::Pending)
    }

    pub fn all(&self) -> AssetSelection {
        AssetSelection {
            images: self.images.clone(),
            audio: self.audio.clone(),
            video: self.video.clone(),
        }
    }

    pub fn list(&self, filter: ListFilter) -> AssetSelection {
        match filter {
            ListFilter::All => self.all(),
            ListFilter::Status(status) => self.all().with_status(status),
            ListFilter::Chapter(n) => self.by_chapter(n),
        }
    }

    pub fn stats(&self) -> ManifestStats {
        let mut stats = ManifestStats::default();
        let statuses = self
            .images
            .iter()
            .map(|a| a.status)
            .chain(self.audio.iter().map(|a| a.status))
            .chain(self.video.iter().map(|a| a.status));
        for status in statuses {
            stats.total += 1;
            match status {
                AssetStatus::Pending => stats.pending += 1,
                AssetStatus::Generated => stats.generated += 1,
                AssetStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    fn record_mut(&mut self, collection: Collection, id: &str) -> Option<&mut dyn AssetRecord> {
        match collection {
            Collection::Images => find_mut(&mut self.images, id),
            Collection::Audio => find_mut(&mut self.audio, id),
            Collection::Video => find_mut(&mut self.video, id),
        }
    }

    /// Ids must be unique within each collection
    pub fn validate(&self) -> Result<()> {
        check_unique_ids(Collection::Images, &self.images)?;
        check_unique_ids(Collection::Audio, &self.audio)?;
        check_unique_ids(Collection::Video, &self.video)?;
        Ok(())
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::new()
    }
}

fn select<T: Clone, F: Fn(&T) -> bool>(items: &[T], f: F) -> Vec<T> {
    items.iter().filter(|a| f(a)).cloned().collect()
}

fn find_mut<'a, T: AssetRecord>(items: &'a mut [T], id: &str) -> Option<&'a mut dyn AssetRecord> {
    items
        .iter_mut()
        .find(|a| a.id() == id)
        .map(|a| a as &mut dyn AssetRecord)
}

fn check_unique_ids<T: AssetRecord>(collection: Collection, items: &[T]) -> Result<()> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id()) {
            return Err(ReelError::Manifest(format!(
                "Duplicate id '{}' in {}",
                item.id(),
                collection
            )));
        }
    }
    Ok(())
}

/// File-backed manifest with an advisory lock around every write
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn for_project(paths: &ProjectPaths) -> Self {
        Self::new(paths.manifest_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Hold an exclusive lock on the sibling `.lock` file while `f` runs
    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock: File = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock.lock()?;
        let result = f();
        lock.unlock()?;
        result
    }

    /// The persisted manifest, or a fresh empty one if there is no file yet
    pub fn load(&self) -> Result<AssetManifest> {
        if !self.path.exists() {
            return Ok(AssetManifest::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let manifest: AssetManifest = serde_json::from_str(&content).map_err(|e| {
            ReelError::Manifest(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        manifest.validate().map_err(|e| match e {
            ReelError::Manifest(msg) => {
                ReelError::Manifest(format!("{}: {}", self.path.display(), msg))
            }
            other => other,
        })?;
        Ok(manifest)
    }

    /// Stamp `lastUpdated` and write the whole document
    pub fn save(&self, manifest: &mut AssetManifest) -> Result<()> {
        self.with_lock(|| self.write(manifest))
    }

    fn write(&self, manifest: &mut AssetManifest) -> Result<()> {
        manifest.last_updated = reelsmith_core::now_rfc3339();
        let json = serde_json::to_string_pretty(manifest)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Write an empty manifest, replacing any existing one
    pub fn init(&self) -> Result<AssetManifest> {
        let mut manifest = AssetManifest::new();
        self.save(&mut manifest)?;
        Ok(manifest)
    }

    /// Settle a pending record. Returns `false` (and writes nothing) when no
    /// record has that id.
    pub fn update_status(&self, id: &str, status: AssetStatus, collection: Collection) -> Result<bool> {
        self.with_lock(|| {
            let mut manifest = self.load()?;
            let Some(record) = manifest.record_mut(collection, id) else {
                tracing::warn!("No {} record with id '{}'", collection, id);
                return Ok(false);
            };
            let current = record.status();
            if !current.can_transition_to(status) {
                return Err(ReelError::InvalidTransition {
                    id: id.to_string(),
                    from: current.to_string(),
                    to: status.to_string(),
                });
            }
            record.set_status(status);
            self.write(&mut manifest)?;
            Ok(true)
        })
    }

    /// Put a record back to `pending` regardless of its status
    pub fn reset_status(&self, id: &str, collection: Collection) -> Result<bool> {
        self.with_lock(|| {
            let mut manifest = self.load()?;
            let Some(record) = manifest.record_mut(collection, id) else {
                return Ok(false);
            };
            if record.status() != AssetStatus::Pending {
                tracing::info!("Resetting {} '{}' from {} to pending", collection, id, record.status());
                record.set_status(AssetStatus::Pending);
                self.write(&mut manifest)?;
            }
            Ok(true)
        })
    }
}
