//! Static map images from the Mapbox Static Images API

use crate::config::ReelConfig;
use crate::http;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reelsmith_core::{ReelError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

const MAPBOX_URL: &str = "https://api.mapbox.com";
const SERVICE: &str = "Mapbox";
pub const DEFAULT_STYLE: &str = "dark-v11";
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_ZOOM: f64 = 4.0;
/// Longest request URL Mapbox accepts
pub const MAX_URL_LEN: usize = 8192;
/// Anything smaller is probably an error tile rather than a map
const MIN_EXPECTED_KB: usize = 100;

pub const STYLES: &[&str] = &["dark-v11", "light-v11", "streets-v12", "satellite-v9", "outdoors-v12"];

// Same unreserved set as JavaScript's encodeURIComponent
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub filename: String,
    #[serde(default)]
    pub description: String,
    pub center: Coord,
    pub zoom: f64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    /// Ready-made marker overlays, e.g. `pin-s-a+ff0000(72.87,19.07)`
    #[serde(default)]
    pub pins: Vec<String>,
    #[serde(default)]
    pub geojson: Option<Value>,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

impl MapDefinition {
    pub fn new(filename: impl Into<String>, center: Coord, zoom: f64) -> Self {
        Self {
            filename: filename.into(),
            description: String::new(),
            center,
            zoom,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            style: default_style(),
            bearing: None,
            pitch: None,
            pins: Vec::new(),
            geojson: None,
        }
    }
}

/// Read a JSON array of map definitions
pub fn load_definitions(path: &Path) -> Result<Vec<MapDefinition>> {
    if !path.exists() {
        return Err(ReelError::Config(format!("Config file not found: {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        ReelError::Config(format!("Invalid map definitions in {}: {}", path.display(), e))
    })
}

/// Pin marker overlay. A leading `#` on the color is dropped.
pub fn pin(coord: Coord, color: &str, label: &str) -> String {
    format!(
        "pin-s-{}+{}({},{})",
        label,
        color.trim_start_matches('#'),
        coord.lon,
        coord.lat
    )
}

/// Parse `lon,lat,color,label;lon,lat,color,label` into pin overlays
pub fn parse_pins(spec: &str) -> Result<Vec<String>> {
    spec.split(';')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let parts: Vec<&str> = entry.split(',').map(str::trim).collect();
            if parts.len() != 4 {
                return Err(ReelError::Validation(format!(
                    "Invalid pin '{}'. Use lon,lat,color,label",
                    entry
                )));
            }
            let coord = parse_coord(&format!("{},{}", parts[0], parts[1]))?;
            Ok(pin(coord, parts[2], parts[3]))
        })
        .collect()
}

/// Parse `lon,lat`
pub fn parse_coord(s: &str) -> Result<Coord> {
    let invalid = || ReelError::Validation(format!("Invalid coordinates '{}'. Use format: lon,lat", s));
    let (lon, lat) = s.split_once(',').ok_or_else(invalid)?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    Ok(Coord { lon, lat })
}

pub fn line_feature(points: &[Coord], color: &str, stroke_width: f64) -> Value {
    json!({
        "type": "Feature",
        "properties": {
            "stroke": color,
            "stroke-width": stroke_width,
            "stroke-opacity": 0.85,
        },
        "geometry": {
            "type": "LineString",
            "coordinates": points.iter().map(|p| [p.lon, p.lat]).collect::<Vec<_>>(),
        },
    })
}

pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({ "type": "FeatureCollection", "features": features })
}

/// Overlay path segment: encoded GeoJSON first, then pins
pub fn overlays(map: &MapDefinition) -> String {
    let mut parts = Vec::with_capacity(map.pins.len() + 1);
    if let Some(geojson) = &map.geojson {
        parts.push(format!(
            "geojson({})",
            utf8_percent_encode(&geojson.to_string(), COMPONENT)
        ));
    }
    parts.extend(map.pins.iter().cloned());
    parts.join(",")
}

pub fn static_url(base: &str, map: &MapDefinition, access_token: &str) -> String {
    let mut position = format!("{},{},{}", map.center.lon, map.center.lat, map.zoom);
    // pitch is positional, so it needs a bearing in front of it
    if map.bearing.is_some() || map.pitch.is_some() {
        position.push_str(&format!(",{}", map.bearing.unwrap_or(0.0)));
        if let Some(pitch) = map.pitch {
            position.push_str(&format!(",{}", pitch));
        }
    }
    let overlays = overlays(map);
    let overlay_segment = if overlays.is_empty() {
        String::new()
    } else {
        format!("{}/", overlays)
    };
    format!(
        "{}/styles/v1/mapbox/{}/static/{}{}/{}x{}@2x?access_token={}&logo=false&attribution=false",
        base, map.style, overlay_segment, position, map.width, map.height, access_token
    )
}

/// Render every definition, reporting failures and carrying on.
/// Returns the paths written.
pub fn render_all<F>(maps: &[MapDefinition], output_dir: &Path, mut render: F) -> Vec<PathBuf>
where
    F: FnMut(&MapDefinition, &Path) -> Result<PathBuf>,
{
    let mut written = Vec::new();
    for map in maps {
        match render(map, output_dir) {
            Ok(path) => written.push(path),
            Err(e) => eprintln!("  Error downloading {}: {}", map.filename, e),
        }
    }
    written
}

pub struct MapboxClient {
    access_token: String,
    base_url: String,
    agent: ureq::Agent,
}

impl MapboxClient {
    pub fn from_config(config: &ReelConfig) -> Result<Self> {
        let access_token = config
            .api_key("mapbox")
            .ok_or_else(|| ReelError::MissingCredentials(vec!["MAPBOX_API_KEY".to_string()]))?
            .to_string();
        let base_url = config
            .api_url("mapbox")
            .unwrap_or(MAPBOX_URL)
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            access_token,
            base_url,
            agent: http::build_agent(http::REQUEST_TIMEOUT_SECS),
        })
    }

    pub fn url_for(&self, map: &MapDefinition) -> String {
        static_url(&self.base_url, map, &self.access_token)
    }

    /// Download one map into `output_dir`
    pub fn render(&self, map: &MapDefinition, output_dir: &Path) -> Result<PathBuf> {
        let url = self.url_for(map);
        if url.len() > MAX_URL_LEN {
            tracing::warn!(
                "URL for {} is {} chars (max {}). May fail.",
                map.filename,
                url.len(),
                MAX_URL_LEN
            );
        }

        println!("Downloading: {}", map.filename);
        if !map.description.is_empty() {
            println!("  Description: {}", map.description);
        }
        println!("  URL length: {} chars", url.len());

        let response = http::send_with_retry(SERVICE, || self.agent.get(&url).call())?;
        let response = http::check_status(SERVICE, response)?;
        let bytes = http::read_bytes(response)?;

        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(&map.filename);
        std::fs::write(&path, &bytes)?;

        let size_kb = bytes.len() / 1024;
        println!("  Saved: {} ({} KB)", path.display(), size_kb);
        if size_kb < MIN_EXPECTED_KB {
            tracing::warn!("File seems small ({} KB), may not be a real map image", size_kb);
        }
        Ok(path)
    }
}
