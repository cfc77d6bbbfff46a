use schedex_core::config::validate_config;
use schedex_core::error::SchedexError;
use schedex_core::extraction::gemini::GeminiClient;
use std::path::Path;

use super::base_config;

pub fn run(model: Option<String>, config: Option<&Path>) -> Result<(), SchedexError> {
    let mut config = base_config(config)?;
    if let Some(model) = model {
        config.model.name = model;
    }
    validate_config(&config)?;

    let client = GeminiClient::from_env(config.model)?;
    let reply = client.ping()?;
    println!("{}: {}", client.model(), reply.trim());
    Ok(())
}
