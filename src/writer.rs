//! The encrypting writer handed to callers
//!
//! An [`EncryptedWriter`] is bound to exactly one sink for its whole life.
//! It moves through Open -> [Write]* -> Closed; there is no way back to
//! Open. Closing finalizes the age stream (last chunk plus authentication
//! tag), finishes the armor layer, and closes the sink.

use crate::error::{AgeSinkError, ErrorCategory, ErrorKind, Result};
use crate::sink::Sink;
use age::armor::{ArmoredWriter, Format};
use age::stream::StreamWriter;
use std::io::{self, Write};

/// Writer that encrypts everything written to it before forwarding to its sink.
///
/// Not safe for concurrent use; every method takes `&mut self`.
pub struct EncryptedWriter<S: Sink> {
    stream: Option<StreamWriter<ArmoredWriter<S>>>,
}

impl<S: Sink> EncryptedWriter<S> {
    /// Bind `encryptor` to `sink`, writing the age header synchronously.
    pub(crate) fn start(encryptor: age::Encryptor, sink: S, armor: bool) -> Result<Self> {
        let format = if armor {
            Format::AsciiArmor
        } else {
            Format::Binary
        };
        let armored = ArmoredWriter::wrap_output(sink, format)
            .map_err(|e| engine_init_error("failed to prepare output armor", e))?;
        let stream = encryptor
            .wrap_output(armored)
            .map_err(|e| engine_init_error("failed to write age header", e))?;
        tracing::debug!(armor, "encrypting stream initialized");
        Ok(Self {
            stream: Some(stream),
        })
    }

    /// Encrypt `buf` and forward it to the sink.
    ///
    /// The whole buffer is accepted or the call fails; on success the
    /// returned count is always `buf.len()`.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or_else(|| {
            AgeSinkError::with_kind(ErrorCategory::User, ErrorKind::Write, "stream closed")
        })?;
        stream.write_all(buf).map_err(|e| {
            AgeSinkError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Write,
                format!("failed to write {} bytes to encrypted stream", buf.len()),
                e,
            )
        })?;
        Ok(buf.len())
    }

    /// Finalize the ciphertext and close the sink.
    ///
    /// Calling this a second time fails with [`ErrorKind::Close`] and has no
    /// other effect.
    pub fn close(&mut self) -> Result<()> {
        let sink = self.finalize()?;
        sink.close().map_err(|e| {
            AgeSinkError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Close,
                "failed to close destination",
                e,
            )
        })?;
        tracing::debug!("encrypted stream closed");
        Ok(())
    }

    /// Finalize the ciphertext and hand the sink back without closing it.
    pub fn finish(mut self) -> Result<S> {
        self.finalize()
    }

    /// Whether the stream has been finalized.
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    fn finalize(&mut self) -> Result<S> {
        let stream = self.stream.take().ok_or_else(|| {
            AgeSinkError::with_kind(
                ErrorCategory::User,
                ErrorKind::Close,
                "stream already closed",
            )
        })?;
        let armored = stream.finish().map_err(|e| close_error("failed to finalize stream", e))?;
        armored
            .finish()
            .map_err(|e| close_error("failed to finish output armor", e))
    }
}

impl<S: Sink> Write for EncryptedWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        EncryptedWriter::write(self, buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Err(io::Error::other("stream closed")),
        }
    }
}

impl<S: Sink> Drop for EncryptedWriter<S> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            tracing::warn!("encrypted writer dropped without close; ciphertext is truncated");
        }
    }
}

fn engine_init_error(msg: &str, err: io::Error) -> AgeSinkError {
    AgeSinkError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::EngineInit, msg, err)
}

fn close_error(msg: &str, err: io::Error) -> AgeSinkError {
    AgeSinkError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Close, msg, err)
}
