use clap::Args;
use schedex_core::config::validate_config;
use schedex_core::error::SchedexError;
use schedex_core::extraction::gemini::GeminiClient;
use schedex_core::pipeline::{Pipeline, RegionStrategy};
use schedex_core::render::pdftoppm::PdftoppmRenderer;
use std::path::PathBuf;

use super::{base_config, resolve_inputs};
use crate::output;

#[derive(Args)]
pub struct DetectArgs {
    /// Images, PDFs or directories (default: the configured input directory)
    inputs: Vec<PathBuf>,

    /// How to locate panels: contour (default) or model
    #[arg(short, long, default_value = "contour")]
    locator: String,

    /// Where to write the crops
    #[arg(long, value_name = "DIR")]
    debug_dir: Option<PathBuf>,

    #[arg(long)]
    min_width_percent: Option<f64>,

    #[arg(long)]
    min_height_percent: Option<f64>,

    #[arg(long)]
    max_width_percent: Option<f64>,

    #[arg(long)]
    max_height_percent: Option<f64>,

    /// Pixels added around each detected box
    #[arg(long)]
    padding: Option<u32>,

    /// Resolution for rendering PDF pages
    #[arg(long)]
    dpi: Option<u32>,

    /// JSON config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: table (default) or json
    #[arg(short, long, default_value = "table")]
    output: String,
}

pub fn run(args: DetectArgs) -> Result<(), SchedexError> {
    let mut config = base_config(args.config.as_deref())?;
    if let Some(dir) = args.debug_dir {
        config.paths.debug_dir = dir;
    }
    let detector = &mut config.detector;
    if let Some(v) = args.min_width_percent {
        detector.min_width_percent = v;
    }
    if let Some(v) = args.min_height_percent {
        detector.min_height_percent = v;
    }
    if let Some(v) = args.max_width_percent {
        detector.max_width_percent = v;
    }
    if let Some(v) = args.max_height_percent {
        detector.max_height_percent = v;
    }
    if let Some(v) = args.padding {
        detector.padding = v;
    }
    if let Some(dpi) = args.dpi {
        config.render.dpi = dpi;
    }
    validate_config(&config)?;

    let strategy: RegionStrategy = args.locator.parse()?;
    if strategy == RegionStrategy::Whole {
        return Err(SchedexError::ConfigInvalid(
            "locator must be contour or model".into(),
        ));
    }

    let inputs = resolve_inputs(&args.inputs, &config);
    if inputs.is_empty() {
        eprintln!("No images or PDFs found");
        return Ok(());
    }

    let client = match strategy {
        RegionStrategy::Model => Some(GeminiClient::from_env(config.model.clone())?),
        _ => None,
    };
    let renderer = PdftoppmRenderer::new();
    let mut pipeline = Pipeline::new(&config, &renderer).with_strategy(strategy);
    if let Some(client) = &client {
        pipeline = pipeline.with_model(client);
    }

    let summary = pipeline.run_detection(&inputs)?;

    match args.output.as_str() {
        "json" => output::json::print(&summary)?,
        _ => output::table::print_detection(&summary),
    }
    Ok(())
}
