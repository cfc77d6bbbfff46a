use schedex_core::error::SchedexError;
use std::path::Path;

use super::base_config;

pub fn run(config: Option<&Path>) -> Result<(), SchedexError> {
    let config = base_config(config)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
