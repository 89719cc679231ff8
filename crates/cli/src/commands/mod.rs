//! Subcommand implementations.
//!
//! Commands write their results to stdout; diagnostics go through `tracing`
//! to stderr.

pub mod account;
pub mod chat;
pub mod sandbox;
pub mod shop;

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

/// Print `label` and read one line from stdin, without the line ending.
///
/// Returns `None` at end of input.
#[allow(clippy::print_stdout)]
pub async fn prompt(label: &str) -> std::io::Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
