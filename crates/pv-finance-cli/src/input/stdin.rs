use serde_json::Value;
use std::io::{self, Read};

/// Read a JSON document piped on stdin.
///
/// Returns None when stdin is an interactive terminal or the pipe is empty,
/// so the caller can report which input is missing.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse JSON from stdin: {}", e))?;
    tracing::debug!(bytes = trimmed.len(), "read JSON input from stdin");
    Ok(Some(value))
}
