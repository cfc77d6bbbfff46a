use clap::Args;
use schedex_core::config::validate_config;
use schedex_core::error::SchedexError;
use schedex_core::extraction::gemini::GeminiClient;
use schedex_core::pipeline::{clear_previous_outputs, Pipeline, RegionStrategy};
use schedex_core::render::pdftoppm::PdftoppmRenderer;
use std::path::PathBuf;
use tracing::info;

use super::{base_config, resolve_inputs};
use crate::output;

#[derive(Args)]
pub struct ExtractArgs {
    /// Images, PDFs or directories (default: the configured input directory)
    inputs: Vec<PathBuf>,

    /// What to send to the model: whole, contour (default) or model
    #[arg(short, long, default_value = "contour")]
    regions: String,

    /// Directory for the CSV files and workbook
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Model name override
    #[arg(short, long)]
    model: Option<String>,

    /// Resolution for rendering PDF pages
    #[arg(long)]
    dpi: Option<u32>,

    /// Remove outputs of a previous run instead of appending to them
    #[arg(long)]
    fresh: bool,

    /// JSON config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: table (default) or json
    #[arg(short, long, default_value = "table")]
    output: String,
}

pub fn run(args: ExtractArgs) -> Result<(), SchedexError> {
    let mut config = base_config(args.config.as_deref())?;
    if let Some(dir) = args.output_dir {
        config.paths.output_dir = dir;
    }
    if let Some(model) = args.model {
        config.model.name = model;
    }
    if let Some(dpi) = args.dpi {
        config.render.dpi = dpi;
    }
    validate_config(&config)?;

    let strategy: RegionStrategy = args.regions.parse()?;
    let inputs = resolve_inputs(&args.inputs, &config);
    if inputs.is_empty() {
        eprintln!("No images or PDFs found");
        return Ok(());
    }

    if args.fresh {
        let output_dir = config.paths.ensure_output_dir()?;
        for path in clear_previous_outputs(output_dir)? {
            info!(path = %path.display(), "removed previous output");
        }
    }

    let client = GeminiClient::from_env(config.model.clone())?;
    let renderer = PdftoppmRenderer::new();
    let summary = Pipeline::new(&config, &renderer)
        .with_model(&client)
        .with_strategy(strategy)
        .run_extraction(&inputs)?;

    match args.output.as_str() {
        "json" => output::json::print(&summary)?,
        _ => output::table::print_run(&summary),
    }
    Ok(())
}
