//! Decryption counterparts and faulty sinks for unit tests

use crate::sink::Sink;
use age::secrecy::SecretString;
use age::x25519::Identity;
use std::io::{self, Read, Write};
use std::iter;

pub fn decrypt_x25519(
    ciphertext: &[u8],
    identity: &Identity,
) -> Result<Vec<u8>, age::DecryptError> {
    decrypt_with(ciphertext, identity)
}

pub fn decrypt_x25519_armored(
    ciphertext: &[u8],
    identity: &Identity,
) -> Result<Vec<u8>, age::DecryptError> {
    decrypt_with(age::armor::ArmoredReader::new(ciphertext), identity)
}

pub fn decrypt_scrypt(ciphertext: &[u8], passphrase: &str) -> Result<Vec<u8>, age::DecryptError> {
    let identity = age::scrypt::Identity::new(SecretString::from(passphrase.to_owned()));
    decrypt_with(ciphertext, &identity)
}

fn decrypt_with<R: Read>(
    input: R,
    identity: &dyn age::Identity,
) -> Result<Vec<u8>, age::DecryptError> {
    let decryptor = age::Decryptor::new(input)?;
    let mut reader = decryptor.decrypt(iter::once(identity))?;
    let mut plaintext = Vec::new();
    reader.read_to_end(&mut plaintext)?;
    Ok(plaintext)
}

/// Accepts up to `limit` bytes, then fails every write.
pub struct FailingSink {
    written: usize,
    limit: usize,
}

impl FailingSink {
    pub fn new(limit: usize) -> Self {
        Self { written: 0, limit }
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written + buf.len() > self.limit {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "sink is full"));
        }
        self.written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for FailingSink {}
