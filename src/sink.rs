//! Destinations for ciphertext
//!
//! A [`Sink`] is anything that accepts bytes and can be finalized. The
//! encrypting writer owns its sink and closes it when the stream is closed;
//! how the sink was obtained (a raw descriptor from a host runtime, a temp
//! file, an in-memory buffer) is none of its business.

use std::fs::File;
use std::io::{self, BufWriter, Write};

/// A byte destination that can be closed once writing is done.
pub trait Sink: Write {
    /// Flush anything buffered and release the destination.
    ///
    /// The default only flushes, which is right for in-memory sinks and
    /// for borrowed sinks whose owner closes them.
    fn close(mut self) -> io::Result<()>
    where
        Self: Sized,
    {
        self.flush()
    }
}

impl Sink for Vec<u8> {}

impl<S: Sink + ?Sized> Sink for &mut S {}

impl<S: Sink> Sink for BufWriter<S> {
    fn close(self) -> io::Result<()> {
        let inner = self.into_inner().map_err(|e| e.into_error())?;
        inner.close()
    }
}

#[cfg(unix)]
impl Sink for File {
    /// Closes the descriptor explicitly so that errors reported by close(2)
    /// (deferred write errors on some filesystems) reach the caller instead
    /// of being swallowed by `Drop`.
    fn close(mut self) -> io::Result<()> {
        use std::os::fd::IntoRawFd;

        self.flush()?;
        nix::unistd::close(self.into_raw_fd()).map_err(io::Error::from)
    }
}

#[cfg(not(unix))]
impl Sink for File {
    fn close(mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}
