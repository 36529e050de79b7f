//! Error types for the notification pipeline.

use std::path::PathBuf;

use crate::mask::Mask;

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while acquiring, registering, or consuming events.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The inotify instance could not be created. Fatal to the handle;
    /// never retried internally.
    #[error("Failed to create inotify instance: {source}")]
    Init {
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A watch registration failed. Local to the offending call; existing
    /// watches and the event stream are unaffected.
    #[error("Failed to watch {path}: {source}")]
    Watch {
        /// Path whose registration failed.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The registration mask selects no filesystem events.
    #[error("Watch mask {mask:?} contains no event bits")]
    InvalidMask {
        /// The rejected mask.
        mask: Mask,
    },

    /// The kernel byte stream was truncated mid-record. Aborts the whole
    /// batch: skipping would desynchronize every later record boundary.
    #[error("Truncated inotify record at offset {offset} ({remaining} bytes remaining)")]
    Decode {
        /// Byte offset into the read buffer where decoding stopped.
        offset: usize,
        /// Bytes left in the buffer at that point.
        remaining: usize,
    },

    /// Operation attempted after the handle was closed.
    #[error("Inotify handle is closed")]
    Closed,

    /// I/O error while waiting for or reading from the inotify fd.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_display() {
        let err = Error::Init {
            source: std::io::Error::new(std::io::ErrorKind::Other, "EMFILE"),
        };
        assert_eq!(err.to_string(), "Failed to create inotify instance: EMFILE");
    }

    #[test]
    fn test_watch_display_includes_path() {
        let err = Error::Watch {
            path: PathBuf::from("/no/such/dir"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "ENOENT"),
        };
        assert_eq!(err.to_string(), "Failed to watch /no/such/dir: ENOENT");
    }

    #[test]
    fn test_decode_display() {
        let err = Error::Decode {
            offset: 32,
            remaining: 7,
        };
        assert_eq!(
            err.to_string(),
            "Truncated inotify record at offset 32 (7 bytes remaining)"
        );
    }

    #[test]
    fn test_closed_display() {
        assert_eq!(Error::Closed.to_string(), "Inotify handle is closed");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Interrupted, "EINTR");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }
}
