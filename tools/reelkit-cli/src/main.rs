//! ReelKit CLI: compose vertical reels from stock footage and text.
//!
//! Usage:
//!   reelkit background [OPTIONS]          Compose and render a background video
//!   reelkit reel <BACKGROUND> <CONTENT>   Build one reel from a content item
//!   reelkit batch <BACKGROUND> <CONTENT>  Build and export reels for many items
//!   reelkit inspect <TIMELINE>            Show and validate a saved timeline
//!   reelkit preview <TIMELINE> --at <S>   Render one frame to a PNG
//!   reelkit init                          Write a default config file
//!   reelkit check                         Check external tools and fonts
//!   reelkit voices                        List narration voices

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reelkit_common::config::AppConfig;

mod commands;
mod settings;

#[derive(Parser)]
#[command(
    name = "reelkit",
    about = "Vertical reel composition from stock footage, narration, and text",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the standard location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a background timeline from the footage folder and render it
    Background {
        /// Footage folder (overrides config)
        #[arg(short, long)]
        footage: Option<PathBuf>,

        /// Output video path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Background duration in seconds
        #[arg(short, long)]
        duration: Option<f64>,

        /// Number of distinct clips
        #[arg(long)]
        clips: Option<usize>,

        /// Effect preset: subtle|cinematic|warm|cool
        #[arg(long)]
        effect: Option<String>,

        /// Transition style: crossfade|slide|zoom|cut
        #[arg(long)]
        transition: Option<String>,

        /// Random seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Only write the timeline JSON, skip rendering
        #[arg(long)]
        timeline_only: bool,
    },

    /// Build one reel over a background timeline (.json) or video
    Reel {
        /// Background timeline JSON or rendered background video
        background: PathBuf,

        /// Content file (.json or .jsonl)
        content: PathBuf,

        /// Zero-based content item index
        #[arg(short, long, default_value = "0")]
        index: usize,

        /// Output video path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text style preset: modern|elegant|bold|minimal|vibrant
        #[arg(long)]
        style: Option<String>,

        /// Text animation: fade|slide|zoom
        #[arg(long)]
        animation: Option<String>,

        /// Skip narration and time the reel by reading speed
        #[arg(long)]
        no_narration: bool,

        /// Random seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Build and export reels for many content items
    Batch {
        /// Background timeline JSON or rendered background video
        background: PathBuf,

        /// Content file (.json or .jsonl)
        content: PathBuf,

        /// Number of items to process (all if omitted)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Skip narration and time reels by reading speed
        #[arg(long)]
        no_narration: bool,

        /// Base random seed; item i uses seed + i
        #[arg(long)]
        seed: Option<u64>,

        /// Shortest reading time to keep, in seconds (overrides config)
        #[arg(long)]
        min_time: Option<f64>,

        /// Longest reading time to keep, in seconds (overrides config)
        #[arg(long)]
        max_time: Option<f64>,

        /// Use every item in file order, skipping reading-time selection
        #[arg(long)]
        all: bool,
    },

    /// Show and validate a saved timeline
    Inspect {
        /// Path to a timeline JSON file
        path: PathBuf,
    },

    /// Render one frame of a saved timeline to a PNG
    Preview {
        /// Path to a timeline JSON file
        timeline: PathBuf,

        /// Time in seconds
        #[arg(long, default_value = "0")]
        at: f64,

        /// Output image path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Where to write it (defaults to the standard location)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check external tools and fonts
    Check,

    /// List available narration voices
    Voices,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reelkit_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Background {
            footage,
            output,
            duration,
            clips,
            effect,
            transition,
            seed,
            timeline_only,
        } => {
            commands::background::run(
                &config,
                commands::background::BackgroundArgs {
                    footage,
                    output,
                    duration,
                    clips,
                    effect,
                    transition,
                    seed,
                    timeline_only,
                },
            )
            .await
        }
        Commands::Reel {
            background,
            content,
            index,
            output,
            style,
            animation,
            no_narration,
            seed,
        } => {
            commands::reel::run(
                &config,
                commands::reel::ReelArgs {
                    background,
                    content,
                    index,
                    output,
                    style,
                    animation,
                    no_narration,
                    seed,
                },
            )
            .await
        }
        Commands::Batch {
            background,
            content,
            count,
            output_dir,
            no_narration,
            seed,
            min_time,
            max_time,
            all,
        } => {
            commands::batch::run(
                &config,
                commands::batch::BatchArgs {
                    background,
                    content,
                    count,
                    output_dir,
                    no_narration,
                    seed,
                    min_reading_secs: min_time,
                    max_reading_secs: max_time,
                    all,
                },
            )
            .await
        }
        Commands::Inspect { path } => commands::inspect::run(&path),
        Commands::Preview {
            timeline,
            at,
            output,
        } => {
            commands::preview::run(
                &config,
                commands::preview::PreviewArgs {
                    timeline,
                    at_secs: at,
                    output,
                },
            )
            .await
        }
        Commands::Init { path, force } => commands::init::run(path, force),
        Commands::Check => commands::check::run(&config),
        Commands::Voices => commands::voices::run(&config),
    }
}
