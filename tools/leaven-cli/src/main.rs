//! Leaven CLI: watch a sourdough starter and alert at peak activity.
//!
//! Usage:
//!   leaven capture [OPTIONS]   Capture one webcam still per interval
//!   leaven watch [OPTIONS]     Poll the stills folder until peak activity
//!   leaven analyze             Run detection once and print the series
//!   leaven gif                 Render the growth GIF from the stills
//!   leaven init [OPTIONS]      Write a configuration file
//!   leaven check               Check ffmpeg, config, credentials, and worker

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use leaven_common::config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH};

mod commands;

#[derive(Parser)]
#[command(
    name = "leaven",
    about = "Sourdough starter monitoring: detect peak activity from webcam stills",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the stills folder until peak activity is detected
    Watch {
        /// Log the alert instead of sending email
        #[arg(long)]
        no_email: bool,

        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },

    /// Build the growth series once and print the detection result
    Analyze {
        /// Print the series and outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Capture webcam stills into a folder
    Capture {
        /// Output directory
        #[arg(short, long, default_value = "stills")]
        output: PathBuf,

        /// Camera index or name ("auto" picks one)
        #[arg(short, long, default_value = "0")]
        device: String,

        /// Seconds between stills
        #[arg(long, default_value = "60")]
        interval: u64,

        /// Delete existing stills without asking
        #[arg(long, conflicts_with = "resume")]
        restart: bool,

        /// Keep existing stills without asking
        #[arg(long)]
        resume: bool,
    },

    /// Render the growth GIF from the current stills
    Gif {
        /// Output file (defaults to the configured gif_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a configuration file with point prompts
    Init {
        /// Point prompt as "x,y" (repeat for several points)
        #[arg(long = "point", required = true, value_parser = commands::init::parse_point)]
        points: Vec<[f64; 2]>,

        /// Label per point: 1 = starter, 0 = background
        #[arg(long = "label", required = true)]
        labels: Vec<i32>,

        /// Stills folder to watch
        #[arg(long, default_value = "stills")]
        folder: PathBuf,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let mut logging = AppConfig::load(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_else(|_| LoggingConfig::default());
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    leaven_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Watch { no_email, once } => commands::watch::run(&cli.config, no_email, once).await,
        Commands::Analyze { json } => commands::analyze::run(&cli.config, json),
        Commands::Capture {
            output,
            device,
            interval,
            restart,
            resume,
        } => commands::capture::run(output, device, interval, restart, resume).await,
        Commands::Gif { output } => commands::gif::run(&cli.config, output),
        Commands::Init {
            points,
            labels,
            folder,
            force,
        } => commands::init::run(&cli.config, points, labels, folder, force),
        Commands::Check => commands::check::run(&cli.config),
    }
}
