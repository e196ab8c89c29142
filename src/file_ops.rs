//! File encryption operations
//!
//! Streams a plaintext file through an [`EncryptedWriter`](crate::writer::EncryptedWriter)
//! into a temporary file next to the destination, then atomically renames
//! it into place. Either the complete ciphertext ends up at the output path
//! or nothing does.

use crate::encrypt::{self, EncryptOptions};
use crate::error::{AgeSinkError, ErrorCategory, ErrorKind, Result};
use crate::passphrase::PassphraseReader;
use crate::recipients;
use age::x25519;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Who the output is encrypted to.
pub enum Target<'a> {
    /// One or more X25519 public keys.
    Recipients(Vec<x25519::Recipient>),
    /// A passphrase obtained from the reader.
    Passphrase(&'a mut dyn PassphraseReader),
}

/// Read a recipients file: one public key per line, blank lines and `#`
/// comments ignored.
pub fn read_recipients_file(path: &Path) -> Result<Vec<x25519::Recipient>> {
    let text = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
    recipients::parse_recipients(&text)
        .map_err(|e| e.with_context(format!("invalid recipients file {}", path.display())))
}

/// Encrypt `input_path` to `target`, writing the ciphertext to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    target: Target<'_>,
    options: &EncryptOptions,
) -> Result<()> {
    let mut input = File::open(input_path).map_err(|e| read_error(input_path, e))?;

    let output_dir = match output_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        Some(_) => Path::new("."),
        None => {
            return Err(AgeSinkError::with_kind(
                ErrorCategory::User,
                ErrorKind::Io,
                "output path has no parent directory",
            ));
        }
    };

    // Resolve the passphrase before creating anything on disk.
    let resolved = match target {
        Target::Recipients(recipients) => Resolved::Keys(recipients),
        Target::Passphrase(reader) => {
            let passphrase = reader.read_passphrase()?;
            Resolved::Passphrase(encrypt::scrypt_recipient(passphrase, options)?)
        }
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(output_dir).map_err(|e| {
        AgeSinkError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to create tempfile",
            e,
        )
    })?;

    let copied = {
        let mut writer = match &resolved {
            Resolved::Keys(recipients) => {
                encrypt::with_x25519_recipients(temp_file.as_file_mut(), recipients, options)?
            }
            Resolved::Passphrase(recipient) => {
                encrypt::with_scrypt_recipient(temp_file.as_file_mut(), recipient, options)?
            }
        };
        let copied = io::copy(&mut input, &mut writer).map_err(|e| copy_error(input_path, e))?;
        writer.close()?;
        copied
    };
    tracing::debug!(bytes = copied, input = %input_path.display(), "encrypted file");

    temp_file.flush().map_err(|e| {
        AgeSinkError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    // Sync before the rename so that, if the rename succeeds, the output
    // path always points to complete ciphertext.
    temp_file.as_file().sync_all().map_err(|e| {
        AgeSinkError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| {
                AgeSinkError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to get tempfile metadata",
                    e,
                )
            })?
            .permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms).map_err(|e| {
            AgeSinkError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to set tempfile permissions",
                e,
            )
        })?;
    }
    temp_file.persist(output_path).map_err(|e| {
        AgeSinkError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", output_path.display()),
            e,
        )
    })?;
    Ok(())
}

enum Resolved {
    Keys(Vec<x25519::Recipient>),
    Passphrase(age::scrypt::Recipient),
}

fn copy_error(input_path: &Path, err: io::Error) -> AgeSinkError {
    // Errors raised by the encrypting writer travel through io::copy wrapped
    // in io::Error; anything else came from reading the input.
    let kind = if err.get_ref().is_some_and(|inner| inner.is::<AgeSinkError>()) {
        ErrorKind::Write
    } else {
        ErrorKind::Io
    };
    AgeSinkError::with_kind_and_source(
        ErrorCategory::Internal,
        kind,
        format!("failed to encrypt {}", input_path.display()),
        err,
    )
}

fn read_error(path: &Path, err: io::Error) -> AgeSinkError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    AgeSinkError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
