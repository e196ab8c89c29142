//! Recipient parsing
//!
//! Host runtimes hand over recipients as a single newline-delimited string,
//! since the binding layer cannot marshal arrays. This module turns that
//! string into an ordered list of X25519 recipients; everything past this
//! point works with the parsed list.
//!
//! Lines follow the age recipients-file convention: blank lines and lines
//! starting with `#` are skipped, and a trailing `\r` is ignored.

use crate::error::{AgeSinkError, ErrorCategory, ErrorKind, Result};
use age::x25519;

/// Marks a comment line in a recipients list.
const COMMENT_PREFIX: char = '#';

/// Parse a newline-delimited list of X25519 public keys.
///
/// Fails with [`ErrorKind::InvalidRecipient`] if any non-blank line is not
/// a valid key, or if the text contains no keys at all.
pub fn parse_recipients(text: &str) -> Result<Vec<x25519::Recipient>> {
    let mut recipients = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }

        let recipient = line.parse::<x25519::Recipient>().map_err(|e| {
            AgeSinkError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidRecipient,
                format!("malformed recipient at line {}: {}", index + 1, e),
            )
        })?;
        recipients.push(recipient);
    }

    if recipients.is_empty() {
        return Err(AgeSinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidRecipient,
            "no recipients found",
        ));
    }

    tracing::debug!(count = recipients.len(), "parsed recipients");
    Ok(recipients)
}

/// Reports whether `key` is a syntactically valid X25519 public key.
///
/// Pure validation: never fails, malformed input yields `false`.
pub fn is_x25519_public_key(key: &str) -> bool {
    key.parse::<x25519::Recipient>().is_ok()
}
