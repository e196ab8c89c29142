//! Raw file descriptor adoption
//!
//! Host runtimes can only pass an integer descriptor across the binding
//! layer. [`open_fd`] checks that the descriptor is open and writable and
//! only then takes ownership of it, without duplicating it.

use crate::error::{AgeSinkError, ErrorCategory, ErrorKind, Result};
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use std::fs::File;
use std::os::fd::{FromRawFd, RawFd};

/// Take ownership of `fd` as a writable [`File`].
///
/// On failure the descriptor is left untouched and still belongs to the
/// caller. On success it belongs to the returned `File` and must not be
/// used or closed through `fd` again.
pub fn open_fd(fd: RawFd) -> Result<File> {
    if fd < 0 {
        return Err(AgeSinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::SinkUnavailable,
            format!("invalid file descriptor {}", fd),
        ));
    }

    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|e| {
        AgeSinkError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::SinkUnavailable,
            format!("file descriptor {} is not open", fd),
            e,
        )
    })?;
    let access_mode = OFlag::from_bits_truncate(flags) & OFlag::O_ACCMODE;
    if access_mode == OFlag::O_RDONLY {
        return Err(AgeSinkError::with_kind(
            ErrorCategory::User,
            ErrorKind::SinkUnavailable,
            format!("file descriptor {} is not open for writing", fd),
        ));
    }

    tracing::debug!(fd, "adopted destination file descriptor");
    // SAFETY: the descriptor is open (F_GETFL succeeded) and the caller
    // hands over ownership; nothing else closes it from here on.
    #[allow(unsafe_code)]
    let file = unsafe { File::from_raw_fd(fd) };
    Ok(file)
}
