//! Static map rendering

use super::{in_root, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use reelsmith_gen::maps::{
    load_definitions, parse_coord, parse_pins, render_all, MapDefinition, MapboxClient,
    DEFAULT_HEIGHT, DEFAULT_STYLE, DEFAULT_WIDTH, DEFAULT_ZOOM, STYLES,
};
use std::path::PathBuf;

#[derive(Args)]
pub struct MapArgs {
    /// JSON file with an array of map definitions
    #[arg(long, conflicts_with = "center")]
    pub config: Option<PathBuf>,

    /// Center "lon,lat"
    #[arg(long, short = 'c')]
    pub center: Option<String>,

    /// Zoom level 0-22
    #[arg(long, short, default_value_t = DEFAULT_ZOOM)]
    pub zoom: f64,

    #[arg(long, short, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// dark-v11, light-v11, streets-v12, satellite-v9 or outdoors-v12
    #[arg(long, default_value = DEFAULT_STYLE)]
    pub style: String,

    #[arg(long)]
    pub bearing: Option<f64>,

    #[arg(long)]
    pub pitch: Option<f64>,

    /// Pins "lon,lat,color,label;..."
    #[arg(long, short)]
    pub pins: Option<String>,

    /// GeoJSON file for route overlays
    #[arg(long, short)]
    pub geojson: Option<PathBuf>,

    /// Output filename
    #[arg(long, short, default_value = "map.png")]
    pub output: String,

    /// Output directory (defaults to public/images/generated)
    #[arg(long, short = 'd')]
    pub output_dir: Option<PathBuf>,
}

pub fn run(ctx: &Context, args: MapArgs) -> Result<()> {
    let maps = match (&args.config, &args.center) {
        (Some(path), _) => {
            let maps = load_definitions(&in_root(ctx, path.clone()))?;
            println!("Generating {} maps from {}...", maps.len(), path.display());
            maps
        }
        (None, Some(center)) => vec![single_map(ctx, &args, center)?],
        (None, None) => {
            let default_config = ctx.paths.map_definitions_path();
            if !default_config.exists() {
                anyhow::bail!("Specify --config <FILE> or --center \"lon,lat\"");
            }
            load_definitions(&default_config)?
        }
    };

    let config = ctx.config()?;
    let client = MapboxClient::from_config(&config)?;
    let output_dir = args
        .output_dir
        .map(|p| in_root(ctx, p))
        .unwrap_or_else(|| ctx.paths.generated_images_dir());

    let written = render_all(&maps, &output_dir, |map, dir| client.render(map, dir));
    println!("Done: {}/{} maps", written.len(), maps.len());
    Ok(())
}

fn single_map(ctx: &Context, args: &MapArgs, center: &str) -> Result<MapDefinition> {
    let filename = if args.output.ends_with(".png") {
        args.output.clone()
    } else {
        format!("{}.png", args.output)
    };
    let mut map = MapDefinition::new(filename, parse_coord(center)?, args.zoom);
    map.width = args.width;
    map.height = args.height;
    if !STYLES.contains(&args.style.as_str()) {
        tracing::warn!("Unknown style '{}'. Known styles: {}", args.style, STYLES.join(", "));
    }
    map.style = args.style.clone();
    map.bearing = args.bearing;
    map.pitch = args.pitch;
    if let Some(pins) = &args.pins {
        map.pins = parse_pins(pins)?;
    }
    if let Some(path) = &args.geojson {
        let path = in_root(ctx, path.clone());
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("GeoJSON file not found: {}", path.display()))?;
        map.geojson = Some(serde_json::from_str(&content)?);
    }
    Ok(map)
}
