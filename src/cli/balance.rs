//! Balance command implementation.

use super::{BalanceFormat, CliError, read_config};
use std::path::Path;

/// Execute the balance command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be read or parsed.
pub(crate) fn execute(path: &Path, format: BalanceFormat) -> Result<(), CliError> {
    let config = read_config(path)?.balance();
    match format {
        BalanceFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        BalanceFormat::Wire => {
            let hex: Vec<String> = config.to_wire().iter().map(|b| format!("{b:02x}")).collect();
            println!("{}", hex.join(" "));
        }
    }
    Ok(())
}
