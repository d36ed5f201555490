pub mod config;
pub mod prompt;
pub mod view;

use std::io::Read;

use anyhow::{Context, Result};
use tracing::debug;

/// Read calendar text from a path, or from stdin for "-".
pub fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Could not read calendar from stdin")?;
        debug!("Read {} bytes from stdin", content.len());
        return Ok(content);
    }

    let content = std::fs::read_to_string(file).with_context(|| format!("Could not read {}", file))?;
    debug!("Read {} bytes from {}", content.len(), file);
    Ok(content)
}
