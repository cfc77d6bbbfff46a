mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "schedex",
    version,
    about = "Extract electrical panel schedules from scanned drawings"
)]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate panel schedules on each page and save the crops for review
    Detect(commands::detect::DetectArgs),
    /// Extract panel schedules into CSV files and a workbook
    Extract(commands::extract::ExtractArgs),
    /// Crop an image with a fixed fractional layout
    Crop {
        /// Drawing image to crop
        image: PathBuf,

        /// JSON file with named boxes as page fractions
        #[arg(short, long, value_name = "FILE")]
        layout: PathBuf,

        /// Directory for the crops (default: current directory)
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },
    /// Check that the API key and model are usable
    Ping {
        /// Model name override
        #[arg(short, long)]
        model: Option<String>,

        /// JSON config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON
    Config {
        /// JSON config file to merge over the defaults
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Crop {
            image,
            layout,
            out_dir,
        } => commands::crop::run(&image, &layout, &out_dir),
        Commands::Ping { model, config } => commands::ping::run(model, config.as_deref()),
        Commands::Config { config } => commands::config::run(config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
