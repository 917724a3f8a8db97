//! reelsmith CLI - asset tooling for documentary productions

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    batch, captions, durations, generate, manifest, map, music, narration, providers, stock,
    timeline, youtube, Context,
};
use reelsmith_core::ReelError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reelsmith")]
#[command(about = "Generate, track and time the media of a documentary", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root (holds asset-manifest.json and public/)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Use this provider for every media kind (e.g. mock for offline runs)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Verbose diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Asset manifest operations
    #[command(subcommand)]
    Manifest(manifest::ManifestCommands),

    /// Generate a single file
    #[command(subcommand)]
    Generate(generate::GenerateCommands),

    /// Generate every pending manifest record, or one chapter's
    Batch(batch::BatchArgs),

    /// Voice the narration script
    Narration(narration::NarrationArgs),

    /// Compose long-form tracks from the music plan
    Music {
        /// Music plan (defaults to music-plan.toml in the project root)
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Only tracks whose id contains this
        #[arg(long)]
        filter: Option<String>,
    },

    /// Word-level captions from narration audio
    Captions {
        /// Audio file or directory of .mp3 files (defaults to the narration directory)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Output JSON (defaults to public/captions.json)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Pexels stock photos and videos
    #[command(subcommand)]
    Stock(stock::StockCommands),

    /// Render static maps with Mapbox
    Map(map::MapArgs),

    /// Search YouTube with yt-dlp
    #[command(subcommand)]
    Youtube(youtube::YoutubeCommands),

    /// Compare narration audio lengths with the script's frame counts
    Durations,

    /// Inspect the chapter timeline
    #[command(subcommand)]
    Timeline(timeline::TimelineCommands),

    /// List providers and their status
    Providers,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new(cli.root, cli.provider);

    match cli.command {
        Commands::Manifest(cmd) => manifest::run(&ctx, cmd),
        Commands::Generate(cmd) => generate::run(&ctx, cmd),
        Commands::Batch(args) => batch::run(&ctx, args),
        Commands::Narration(args) => narration::run(&ctx, args),
        Commands::Music { plan, filter } => music::run(&ctx, plan, filter.as_deref()),
        Commands::Captions { input, output } => captions::run(&ctx, input, output),
        Commands::Stock(cmd) => stock::run(&ctx, cmd),
        Commands::Map(args) => map::run(&ctx, args),
        Commands::Youtube(cmd) => youtube::run(cmd),
        Commands::Durations => durations::run(&ctx),
        Commands::Timeline(cmd) => timeline::run(&ctx, cmd),
        Commands::Providers => providers::run(&ctx),
    }
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<ReelError>() {
        Some(ReelError::MissingCredentials(vars)) => {
            eprintln!("Error: missing required environment variables:");
            for var in vars {
                eprintln!("  - {}", var);
            }
            eprintln!("Set them in .env or ~/.reelsmith/config.toml, or pass --provider mock.");
        }
        _ => eprintln!("Error: {:#}", error),
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
