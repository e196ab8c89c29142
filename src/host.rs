//! Entry points for the host runtime binding
//!
//! These mirror what the mobile application calls: a raw descriptor for the
//! destination, recipients flattened into one newline-delimited string, and
//! a passphrase as plain text. Validation order is fixed: recipients are
//! parsed (or derived) first, then the descriptor is adopted, then the age
//! header is written. A descriptor is never touched when the recipients are
//! bad.

use crate::encrypt::{self, EncryptOptions};
use crate::error::Result;
use crate::fd::open_fd;
use crate::recipients;
use crate::writer::EncryptedWriter;
use age::secrecy::SecretString;
use std::fs::File;
use std::os::fd::RawFd;

/// Writer bound to an adopted file descriptor.
pub type FdWriter = EncryptedWriter<File>;

/// Encrypt to every public key in the newline-delimited `recipients`,
/// writing to `fd`.
pub fn create_writer_with_x25519_recipients(fd: RawFd, recipients: &str) -> Result<FdWriter> {
    let recipients = recipients::parse_recipients(recipients)?;
    let file = open_fd(fd)?;
    encrypt::with_x25519_recipients(file, &recipients, &EncryptOptions::default())
}

/// Encrypt to `passphrase`, writing to `fd`.
pub fn create_writer_with_scrypt_recipient(fd: RawFd, passphrase: &str) -> Result<FdWriter> {
    let options = EncryptOptions::default();
    let recipient = encrypt::scrypt_recipient(SecretString::from(passphrase.to_owned()), &options)?;
    let file = open_fd(fd)?;
    encrypt::with_scrypt_recipient(file, &recipient, &options)
}

/// Whether `key` is a well-formed X25519 public key.
pub fn check_is_x25519_pub_key(key: &str) -> bool {
    recipients::is_x25519_public_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{decrypt_scrypt, decrypt_x25519};
    use age::x25519::Identity;
    use std::fs::{self, OpenOptions};
    use std::os::fd::IntoRawFd;
    use std::path::Path;
    use tempfile::TempDir;

    fn writable_fd(path: &Path) -> RawFd {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .unwrap()
            .into_raw_fd()
    }

    #[test]
    fn test_hello_world_in_two_chunks() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("video.mp4.age");
        let identity = Identity::generate();

        let mut writer = create_writer_with_x25519_recipients(
            writable_fd(&path),
            &identity.to_public().to_string(),
        )
        .unwrap();
        assert_eq!(writer.write(b"hello ").unwrap(), 6);
        assert_eq!(writer.write(b"world").unwrap(), 5);
        writer.close().unwrap();

        let ciphertext = fs::read(&path).unwrap();
        assert_eq!(decrypt_x25519(&ciphertext, &identity).unwrap(), b"hello world");
    }

    #[test]
    fn test_multiple_recipients() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg.age");
        let identities: Vec<Identity> = (0..3).map(|_| Identity::generate()).collect();
        let text = identities
            .iter()
            .map(|i| i.to_public().to_string())
            .collect::<Vec<_>>()
            .join("\n");

        let mut writer = create_writer_with_x25519_recipients(writable_fd(&path), &text).unwrap();
        writer.write(b"jpeg bytes").unwrap();
        writer.close().unwrap();

        let ciphertext = fs::read(&path).unwrap();
        for identity in &identities {
            assert_eq!(decrypt_x25519(&ciphertext, identity).unwrap(), b"jpeg bytes");
        }
    }

    #[test]
    fn test_empty_recipients() {
        let err = create_writer_with_x25519_recipients(-1, "").err().unwrap();
        assert_eq!(err.kind, Some(ErrorKind::InvalidRecipient));
    }

    #[test]
    fn test_recipient_error_wins_over_bad_fd() {
        let err = create_writer_with_x25519_recipients(-1, "not-a-key\n")
            .err()
            .unwrap();
        assert_eq!(err.kind, Some(ErrorKind::InvalidRecipient));
    }

    #[test]
    fn test_bad_recipients_leave_fd_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("video.mp4.age");
        let fd = writable_fd(&path);

        let err = create_writer_with_x25519_recipients(fd, "\n\n").err().unwrap();
        assert_eq!(err.kind, Some(ErrorKind::InvalidRecipient));

        assert!(fs::read(&path).unwrap().is_empty());
        // The descriptor was never adopted, so closing it is still our job.
        nix::unistd::close(fd).unwrap();
    }

    #[test]
    fn test_invalid_fd() {
        let key = Identity::generate().to_public().to_string();
        let err = create_writer_with_x25519_recipients(-1, &key).err().unwrap();
        assert_eq!(err.kind, Some(ErrorKind::SinkUnavailable));
    }

    #[test]
    fn test_passphrase_writer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("video.mp4.age");

        let mut writer =
            create_writer_with_scrypt_recipient(writable_fd(&path), "hunter2").unwrap();
        writer.write(b"scrypt protected").unwrap();
        writer.close().unwrap();

        let ciphertext = fs::read(&path).unwrap();
        assert_eq!(decrypt_scrypt(&ciphertext, "hunter2").unwrap(), b"scrypt protected");
        assert!(decrypt_scrypt(&ciphertext, "hunter3").is_err());
    }

    #[test]
    fn test_empty_passphrase_wins_over_bad_fd() {
        let err = create_writer_with_scrypt_recipient(-1, "").err().unwrap();
        assert_eq!(err.kind, Some(ErrorKind::RecipientDerivation));
    }

    #[test]
    fn test_passphrase_invalid_fd() {
        let err = create_writer_with_scrypt_recipient(-1, "hunter2").err().unwrap();
        assert_eq!(err.kind, Some(ErrorKind::SinkUnavailable));
    }

    #[test]
    fn test_check_is_x25519_pub_key() {
        assert!(check_is_x25519_pub_key(
            "age1qyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqszqgpqyqs3290gq"
        ));
        assert!(!check_is_x25519_pub_key(""));
        assert!(!check_is_x25519_pub_key(
            "AGE-SECRET-KEY-15S3H2AA7WW8THHE29YT4KFRMEYM2D0HT5WUAJ6ZD9EMJC5R47FUQNK9L9W"
        ));
    }
}
