//! Pexels stock photo and video search/download
//!
//! Every downloaded file gets a `<filename>.txt` attribution sidecar.

use crate::config::ReelConfig;
use crate::http;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reelsmith_core::{ReelError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_PEXELS_URL: &str = "https://api.pexels.com";
const SERVICE: &str = "Pexels";
/// Smallest video width worth downloading
const MIN_VIDEO_WIDTH: u32 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockType {
    #[default]
    Photo,
    Video,
}

impl FromStr for StockType {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "photo" => Ok(StockType::Photo),
            "video" => Ok(StockType::Video),
            other => Err(ReelError::Validation(format!(
                "Unknown media type '{}'. Use photo or video",
                other
            ))),
        }
    }
}

impl fmt::Display for StockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockType::Photo => write!(f, "photo"),
            StockType::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub query: String,
    pub count: u32,
    pub orientation: Option<String>,
    /// Photos only
    pub size: Option<String>,
    /// Photos only
    pub color: Option<String>,
    /// Videos only, seconds
    pub min_duration: Option<u32>,
    /// Videos only, seconds
    pub max_duration: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PexelsPhoto {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub url: String,
    pub photographer: String,
    #[serde(default)]
    pub avg_color: Option<String>,
    pub src: PhotoSources,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoSources {
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub large2x: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PexelsVideo {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub url: String,
    pub duration: u32,
    pub user: VideoCreator,
    #[serde(default)]
    pub video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoCreator {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoFile {
    #[serde(default)]
    pub quality: Option<String>,
    pub file_type: String,
    // null for some renditions
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    pub link: String,
}

impl VideoFile {
    fn area(&self) -> u64 {
        self.width.unwrap_or(0) as u64 * self.height.unwrap_or(0) as u64
    }
}

#[derive(Debug, Deserialize)]
struct PhotoPage {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct VideoPage {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Full search URL for a media type
pub fn search_url(base: &str, kind: StockType, options: &SearchOptions) -> String {
    let mut params = vec![
        format!("query={}", encode(&options.query)),
        format!("per_page={}", options.count),
    ];
    if let Some(o) = &options.orientation {
        params.push(format!("orientation={}", encode(o)));
    }
    if let Some(s) = &options.size {
        params.push(format!("size={}", encode(s)));
    }
    match kind {
        StockType::Photo => {
            if let Some(c) = &options.color {
                params.push(format!("color={}", encode(c)));
            }
        }
        StockType::Video => {
            if let Some(d) = options.min_duration {
                params.push(format!("min_duration={}", d));
            }
            if let Some(d) = options.max_duration {
                params.push(format!("max_duration={}", d));
            }
        }
    }
    if let Some(p) = options.page {
        params.push(format!("page={}", p));
    }
    let path = match kind {
        StockType::Photo => "/v1/search",
        StockType::Video => "/videos/search",
    };
    format!("{}{}?{}", base, path, params.join("&"))
}

/// `large2x`, falling back to `original`
pub fn photo_download_url(photo: &PexelsPhoto) -> Option<&str> {
    photo
        .src
        .large2x
        .as_deref()
        .filter(|u| !u.is_empty())
        .or(photo.src.original.as_deref())
}

/// Largest rendition at least 720 wide, else the largest of all
pub fn pick_video_file(video: &PexelsVideo) -> Option<&VideoFile> {
    video
        .video_files
        .iter()
        .filter(|f| f.width.unwrap_or(0) >= MIN_VIDEO_WIDTH)
        .max_by_key(|f| f.area())
        .or_else(|| video.video_files.iter().max_by_key(|f| f.area()))
}

/// `video/mp4` -> `mp4`
pub fn video_extension(file_type: &str) -> &str {
    file_type
        .split('/')
        .nth(1)
        .filter(|e| !e.is_empty())
        .unwrap_or("mp4")
}

/// `[prefix-]pexels-<id>.<ext>`
pub fn media_filename(prefix: &str, id: u64, ext: &str) -> String {
    if prefix.is_empty() {
        format!("pexels-{}.{}", id, ext)
    } else {
        format!("{}-pexels-{}.{}", prefix, id, ext)
    }
}

pub fn photo_attribution(photo: &PexelsPhoto, source_url: &str) -> String {
    format!(
        "Photo by {} on Pexels\n{}\nDownloaded from: {}",
        photo.photographer, photo.url, source_url
    )
}

pub fn video_attribution(video: &PexelsVideo, source_url: &str) -> String {
    format!(
        "Video by {} on Pexels\n{}\nDownloaded from: {}",
        video.user.name, video.url, source_url
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum Downloaded {
    Saved(PathBuf),
    AlreadyExists(PathBuf),
}

impl Downloaded {
    pub fn path(&self) -> &Path {
        match self {
            Downloaded::Saved(p) | Downloaded::AlreadyExists(p) => p,
        }
    }
}

fn save_with_sidecar<F>(output_dir: &Path, filename: &str, url: &str, attribution: String, fetch: F) -> Result<Downloaded>
where
    F: FnOnce(&str) -> Result<Vec<u8>>,
{
    let path = output_dir.join(filename);
    if path.exists() {
        println!("  Already exists: {}", filename);
        return Ok(Downloaded::AlreadyExists(path));
    }
    std::fs::create_dir_all(output_dir)?;
    let bytes = fetch(url)?;
    std::fs::write(&path, &bytes)?;
    std::fs::write(output_dir.join(format!("{}.txt", filename)), attribution)?;
    println!("    Saved: {} ({} KB)", path.display(), bytes.len() / 1024);
    Ok(Downloaded::Saved(path))
}

pub fn save_photo<F>(photo: &PexelsPhoto, output_dir: &Path, prefix: &str, fetch: F) -> Result<Downloaded>
where
    F: FnOnce(&str) -> Result<Vec<u8>>,
{
    let url = photo_download_url(photo)
        .ok_or_else(|| ReelError::Generation(format!("No download URL for photo {}", photo.id)))?;
    let filename = media_filename(prefix, photo.id, "jpg");
    println!("  Downloading: {}", filename);
    println!("    Photographer: {}", photo.photographer);
    save_with_sidecar(output_dir, &filename, url, photo_attribution(photo, url), fetch)
}

pub fn save_video<F>(video: &PexelsVideo, output_dir: &Path, prefix: &str, fetch: F) -> Result<Downloaded>
where
    F: FnOnce(&str) -> Result<Vec<u8>>,
{
    let file = pick_video_file(video)
        .ok_or_else(|| ReelError::Generation(format!("No video files found for video {}", video.id)))?;
    let filename = media_filename(prefix, video.id, video_extension(&file.file_type));
    println!("  Downloading: {}", filename);
    println!("    Creator: {}", video.user.name);
    println!("    Duration: {}s", video.duration);
    save_with_sidecar(
        output_dir,
        &filename,
        &file.link,
        video_attribution(video, &file.link),
        fetch,
    )
}

/// Run `save` over every item, reporting failures and carrying on.
/// Returns how many items were saved or already present.
pub fn save_all<T, F>(items: &[T], mut save: F) -> usize
where
    F: FnMut(&T) -> Result<Downloaded>,
{
    let mut ok = 0;
    for item in items {
        match save(item) {
            Ok(_) => ok += 1,
            Err(e) => eprintln!("  Error downloading: {}", e),
        }
    }
    ok
}

pub struct PexelsClient {
    api_key: String,
    base_url: String,
    agent: ureq::Agent,
}

impl PexelsClient {
    pub fn from_config(config: &ReelConfig) -> Result<Self> {
        let api_key = config
            .api_key("pexels")
            .ok_or_else(|| ReelError::MissingCredentials(vec!["PEXELS_API_KEY".to_string()]))?
            .to_string();
        let base_url = config
            .api_url("pexels")
            .unwrap_or(DEFAULT_PEXELS_URL)
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            api_key,
            base_url,
            agent: http::build_agent(http::REQUEST_TIMEOUT_SECS),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = http::send_with_retry(SERVICE, || {
            self.agent
                .get(url)
                .header("Authorization", &self.api_key)
                .call()
        })?;
        let response = http::check_status(SERVICE, response)?;
        http::read_json(SERVICE, response)
    }

    pub fn search_photos(&self, options: &SearchOptions) -> Result<Vec<PexelsPhoto>> {
        let page: PhotoPage = self.get_json(&search_url(&self.base_url, StockType::Photo, options))?;
        Ok(page.photos)
    }

    pub fn search_videos(&self, options: &SearchOptions) -> Result<Vec<PexelsVideo>> {
        let page: VideoPage = self.get_json(&search_url(&self.base_url, StockType::Video, options))?;
        Ok(page.videos)
    }

    pub fn photo(&self, id: u64) -> Result<PexelsPhoto> {
        self.get_json(&format!("{}/v1/photos/{}", self.base_url, id))
    }

    pub fn video(&self, id: u64) -> Result<PexelsVideo> {
        self.get_json(&format!("{}/videos/videos/{}", self.base_url, id))
    }

    /// Download a media file (CDN links need no auth)
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = http::send_with_retry(SERVICE, || self.agent.get(url).call())?;
        let response = http::check_status(SERVICE, response)?;
        http::read_bytes(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> PexelsPhoto {
        serde_json::from_value(serde_json::json!({
            "id": 3225529,
            "width": 4000,
            "height": 2667,
            "url": "https://www.pexels.com/photo/train-3225529/",
            "photographer": "Anand Kumar",
            "avg_color": "#6E5B4A",
            "src": {
                "original": "https://images.pexels.com/photos/3225529/original.jpeg",
                "large2x": "https://images.pexels.com/photos/3225529/large2x.jpeg",
                "medium": "https://images.pexels.com/photos/3225529/medium.jpeg"
            },
            "alt": "Train at a station"
        }))
        .unwrap()
    }

    fn video(files: serde_json::Value) -> PexelsVideo {
        serde_json::from_value(serde_json::json!({
            "id": 857251,
            "width": 1920,
            "height": 1080,
            "url": "https://www.pexels.com/video/857251/",
            "duration": 14,
            "user": { "name": "Ravi", "url": "https://www.pexels.com/@ravi" },
            "video_files": files
        }))
        .unwrap()
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("reelsmith_stock_test_{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_search_url() {
        let options = SearchOptions {
            query: "indian train".to_string(),
            count: 10,
            orientation: Some("landscape".to_string()),
            color: Some("red".to_string()),
            min_duration: Some(5),
            page: Some(2),
            ..SearchOptions::default()
        };
        assert_eq!(
            search_url("https://api.pexels.com", StockType::Photo, &options),
            "https://api.pexels.com/v1/search?query=indian%20train&per_page=10&orientation=landscape&color=red&page=2"
        );
        assert_eq!(
            search_url("https://api.pexels.com", StockType::Video, &options),
            "https://api.pexels.com/videos/search?query=indian%20train&per_page=10&orientation=landscape&min_duration=5&page=2"
        );
    }

    #[test]
    fn test_photo_url_fallback() {
        let mut p = photo();
        assert!(photo_download_url(&p).unwrap().ends_with("large2x.jpeg"));
        p.src.large2x = None;
        assert!(photo_download_url(&p).unwrap().ends_with("original.jpeg"));
    }

    #[test]
    fn test_pick_video_file() {
        let v = video(serde_json::json!([
            { "quality": "sd", "file_type": "video/mp4", "width": 640, "height": 360, "link": "sd" },
            { "quality": "hd", "file_type": "video/mp4", "width": 1280, "height": 720, "link": "hd" },
            { "quality": "hd", "file_type": "video/webm", "width": 1920, "height": 1080, "link": "fhd" },
            { "quality": null, "file_type": "video/mp4", "width": null, "height": null, "link": "hls" }
        ]));
        let best = pick_video_file(&v).unwrap();
        assert_eq!(best.link, "fhd");
        assert_eq!(video_extension(&best.file_type), "webm");

        let small = video(serde_json::json!([
            { "file_type": "video/mp4", "width": 426, "height": 240, "link": "tiny" },
            { "file_type": "video/mp4", "width": 640, "height": 360, "link": "sd" }
        ]));
        assert_eq!(pick_video_file(&small).unwrap().link, "sd");
        assert!(pick_video_file(&video(serde_json::json!([]))).is_none());
    }

    #[test]
    fn test_filenames() {
        assert_eq!(media_filename("", 42, "jpg"), "pexels-42.jpg");
        assert_eq!(media_filename("ch1", 42, "mp4"), "ch1-pexels-42.mp4");
        assert_eq!(video_extension("garbage"), "mp4");
    }

    #[test]
    fn test_save_photo_writes_sidecar_and_skips_existing() {
        let dir = temp_dir();
        let p = photo();

        let saved = save_photo(&p, &dir, "ch1", |url| {
            assert!(url.ends_with("large2x.jpeg"));
            Ok(vec![0xFF, 0xD8])
        })
        .unwrap();
        assert_eq!(saved, Downloaded::Saved(dir.join("ch1-pexels-3225529.jpg")));

        let sidecar = std::fs::read_to_string(dir.join("ch1-pexels-3225529.jpg.txt")).unwrap();
        assert!(sidecar.starts_with("Photo by Anand Kumar on Pexels\n"));
        assert!(sidecar.contains("Downloaded from: https://images.pexels.com/photos/3225529/large2x.jpeg"));

        let again = save_photo(&p, &dir, "ch1", |_| panic!("should not download twice")).unwrap();
        assert!(matches!(again, Downloaded::AlreadyExists(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_all_continues_past_failures() {
        let dir = temp_dir();
        let videos = vec![
            video(serde_json::json!([])),
            video(serde_json::json!([
                { "file_type": "video/mp4", "width": 1280, "height": 720, "link": "hd" }
            ])),
        ];
        let ok = save_all(&videos, |v| save_video(v, &dir, "", |_| Ok(vec![0])));
        assert_eq!(ok, 1);
        let sidecar = std::fs::read_to_string(dir.join("pexels-857251.mp4.txt")).unwrap();
        assert!(sidecar.starts_with("Video by Ravi on Pexels"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
