//! Longform CLI: render narrated segment clips and assemble chaptered videos.
//!
//! Usage:
//!   longform render <PATH>      Render every segment clip of a project
//!   longform single             Render one image/narration pair
//!   longform assemble <PATH>    Concatenate clips into the final video
//!   longform build <PATH>       Render, then assemble
//!   longform status <PATH>      Show which artifacts exist per segment
//!   longform effects            List motion effects and preview plans
//!   longform check              Check encoder availability and config

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use longform_common::config::AppConfig;

mod commands;

use commands::{ProjectArgs, RenderOverrides};

#[derive(Parser)]
#[command(
    name = "longform",
    about = "Narrated long-form video from stills, narration, and music",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/longform/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every segment clip of a project
    Render {
        #[command(flatten)]
        project: ProjectArgs,

        #[command(flatten)]
        overrides: RenderOverrides,
    },

    /// Render a single image/narration pair to a clip
    Single {
        /// Still image
        #[arg(long)]
        image: PathBuf,

        /// Narration audio
        #[arg(long)]
        audio: PathBuf,

        /// Output clip path
        #[arg(short, long)]
        output: PathBuf,

        /// Motion effect, repeat for a sequence (e.g. -e zoom_in -e pan_left)
        #[arg(short, long = "effect")]
        effects: Vec<String>,

        /// Background music track
        #[arg(long)]
        music: Option<PathBuf>,

        /// Music volume (defaults to the configured music volume)
        #[arg(long)]
        music_volume: Option<f64>,

        #[command(flatten)]
        overrides: RenderOverrides,
    },

    /// Concatenate rendered clips into the final video
    Assemble {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output file path (defaults to <PATH>/final_video.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Order clips by file name instead of the segments document
        #[arg(long)]
        lexicographic: bool,

        /// Skip the stream layout check before concatenation
        #[arg(long)]
        no_verify: bool,
    },

    /// Render all segments, then assemble the final video
    Build {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output file path (defaults to <PATH>/final_video.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: RenderOverrides,
    },

    /// Show which artifacts exist for each segment
    Status {
        #[command(flatten)]
        project: ProjectArgs,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// List motion effects, or preview a sequence
    Effects {
        /// Effect ids to preview as one sequence (e.g. zoom_in pan_left)
        sequence: Vec<String>,

        /// Preview duration in seconds
        #[arg(long, default_value = "10.0")]
        duration: f64,

        /// Print the resolved plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check encoder availability and configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    longform_common::logging::init_logging(&config.logging);

    let mut defaults = config.render;
    tracing::debug!(?defaults, "Loaded render settings");

    match cli.command {
        Commands::Render { project, overrides } => {
            overrides.apply(&mut defaults)?;
            commands::render::run(project, defaults).await
        }
        Commands::Single {
            image,
            audio,
            output,
            effects,
            music,
            music_volume,
            overrides,
        } => {
            overrides.apply(&mut defaults)?;
            commands::single::run(
                image,
                audio,
                output,
                effects,
                music,
                music_volume,
                defaults,
            )
            .await
        }
        Commands::Assemble {
            project,
            output,
            lexicographic,
            no_verify,
        } => {
            if no_verify {
                defaults.verify_uniform_streams = false;
            }
            commands::assemble::run(project, output, lexicographic, defaults).await
        }
        Commands::Build {
            project,
            output,
            overrides,
        } => {
            overrides.apply(&mut defaults)?;
            commands::build::run(project, output, defaults).await
        }
        Commands::Status { project, json } => commands::status::run(project, json),
        Commands::Effects {
            sequence,
            duration,
            json,
        } => commands::effects::run(sequence, duration, json),
        Commands::Check => commands::check::run(cli.config, defaults),
    }
}
