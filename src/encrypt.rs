//! Construction of encrypting writers
//!
//! Every constructor here is all-or-nothing: it either returns a writer
//! whose header has already reached the sink, or an error and no writer.

use crate::error::{AgeSinkError, ErrorCategory, ErrorKind, Result};
use crate::sink::Sink;
use crate::writer::EncryptedWriter;
use age::secrecy::{ExposeSecret, SecretString};
use age::{scrypt, x25519};
use std::iter;

/// Options shared by all writer constructors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncryptOptions {
    /// Emit PEM-style ASCII armor instead of the binary age format.
    pub armor: bool,
    /// log2 of the scrypt cost parameter for passphrase recipients.
    /// `None` keeps the age default.
    pub scrypt_work_factor: Option<u8>,
}

/// Build a passphrase recipient.
///
/// The passphrase must be non-empty and the work factor, if given, must lie
/// in `1..=63`.
pub fn scrypt_recipient(
    passphrase: SecretString,
    options: &EncryptOptions,
) -> Result<scrypt::Recipient> {
    if passphrase.expose_secret().is_empty() {
        return Err(AgeSinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::RecipientDerivation,
            "passphrase must not be empty",
        ));
    }

    let mut recipient = scrypt::Recipient::new(passphrase);
    if let Some(log_n) = options.scrypt_work_factor {
        if !(1..64).contains(&log_n) {
            return Err(AgeSinkError::with_kind(
                ErrorCategory::User,
                ErrorKind::RecipientDerivation,
                format!("scrypt work factor {} out of range (1-63)", log_n),
            ));
        }
        recipient.set_work_factor(log_n);
    }
    Ok(recipient)
}

/// Create a writer encrypting to every recipient in `recipients`.
///
/// The header is written to `sink` before this returns. An empty slice
/// fails with [`ErrorKind::EngineInit`].
pub fn with_x25519_recipients<S: Sink>(
    sink: S,
    recipients: &[x25519::Recipient],
    options: &EncryptOptions,
) -> Result<EncryptedWriter<S>> {
    let encryptor =
        age::Encryptor::with_recipients(recipients.iter().map(|r| r as &dyn age::Recipient))
            .map_err(|e| {
                AgeSinkError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::EngineInit,
                    format!("failed to set up encryption to {} recipients", recipients.len()),
                    e,
                )
            })?;
    tracing::debug!(recipients = recipients.len(), "encrypting to public keys");
    EncryptedWriter::start(encryptor, sink, options.armor)
}

/// Create a writer encrypting to a single passphrase recipient.
pub fn with_scrypt_recipient<S: Sink>(
    sink: S,
    recipient: &scrypt::Recipient,
    options: &EncryptOptions,
) -> Result<EncryptedWriter<S>> {
    let encryptor = age::Encryptor::with_recipients(iter::once(recipient as &dyn age::Recipient))
        .map_err(|e| {
            AgeSinkError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::EngineInit,
                "failed to set up passphrase encryption",
                e,
            )
        })?;
    tracing::debug!(work_factor = ?options.scrypt_work_factor, "encrypting to passphrase");
    EncryptedWriter::start(encryptor, sink, options.armor)
}
