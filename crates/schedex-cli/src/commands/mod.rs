pub mod config;
pub mod crop;
pub mod detect;
pub mod extract;
pub mod ping;

use schedex_core::config::{load_config, Config};
use schedex_core::error::SchedexError;
use schedex_core::pipeline::{discover_inputs, InputFile};
use std::path::{Path, PathBuf};

/// Defaults, or the given file merged over them.
pub fn base_config(path: Option<&Path>) -> Result<Config, SchedexError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}

/// Inputs from the command line, falling back to the configured input directory.
pub fn resolve_inputs(args: &[PathBuf], config: &Config) -> Vec<InputFile> {
    if args.is_empty() {
        discover_inputs(std::slice::from_ref(&config.paths.input_dir))
    } else {
        discover_inputs(args)
    }
}
