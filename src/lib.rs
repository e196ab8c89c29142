//! agesink - streaming age encryption onto caller-owned destinations
//!
//! The age crate does all of the cryptography. This crate adapts it to a
//! host runtime that can only hand over a raw file descriptor and a
//! newline-delimited string of recipients, and exposes the result as a
//! write/close writer.

#![deny(unsafe_code)]

pub mod encrypt;
pub mod error;
#[cfg(unix)]
pub mod fd;
pub mod file_ops;
#[cfg(unix)]
pub mod host;
pub mod passphrase;
pub mod recipients;
pub mod sink;
pub mod writer;

#[cfg(test)]
mod test_support;

pub use encrypt::EncryptOptions;
pub use error::{AgeSinkError, ErrorCategory, ErrorKind, Result};
pub use sink::Sink;
pub use writer::EncryptedWriter;
