//! Delivery error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a file response did not complete.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Opening or reading the file failed before anything was sent.
    /// The client has been answered with 503.
    #[error("failed to read `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the response failed (client went away, or a read failed
    /// mid-stream). The status line is already out; the stream is abandoned.
    #[error("response aborted")]
    Aborted(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_source() {
        use std::error::Error;

        let read = DeliveryError::Read {
            path: PathBuf::from("/srv/a.css"),
            source: io::ErrorKind::PermissionDenied.into(),
        };
        assert_eq!(read.to_string(), "failed to read `/srv/a.css`");
        assert!(read.source().is_some());

        let aborted = DeliveryError::Aborted(io::ErrorKind::BrokenPipe.into());
        assert_eq!(aborted.to_string(), "response aborted");
    }
}
