use schedex_core::error::SchedexError;
use serde_json::to_string_pretty;

pub fn print<T: serde::Serialize>(result: &T) -> Result<(), SchedexError> {
    let json = to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}
