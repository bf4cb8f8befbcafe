//! Reading pre-tokenized keyword input.

use std::path::Path;

use tracing::info;

use crate::error::Result;

/// Split text into whitespace-separated tokens, in order.
pub fn parse_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Load tokens from a UTF-8 file; any whitespace separates tokens.
pub fn read_tokens(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let tokens = parse_tokens(&text);
    info!(path = %path.display(), tokens = tokens.len(), "loaded tokens");
    Ok(tokens)
}
