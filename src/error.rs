//! Error types used throughout the library.

use std::time::Duration;

/// Errors that can occur while reading, resolving or assembling variants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file handle (variant file or index) could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Header, data line or amino acid change string is malformed.
    #[error("format error: {0}")]
    Format(String),
    /// Invalid batch size, limit, species or other setting.
    #[error("configuration error: {0}")]
    Config(String),
    /// A remote service answered with a non-success status or an unexpected payload.
    #[error("remote service error: {0}")]
    Remote(String),
    /// Waiting for a remote job took longer than allowed.
    #[error("timed out after {elapsed:?} waiting for {what}")]
    Timeout { what: String, elapsed: Duration },
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn remote(msg: impl Into<String>) -> Self {
        Error::Remote(msg.into())
    }

    /// Classify an error from reading the variant file or its index.
    ///
    /// Undecodable content is a `Format` error, everything else stays `Io`.
    pub(crate) fn from_read(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::InvalidData => Error::Format(e.to_string()),
            _ => Error::Io(e),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Remote(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Remote(format!("malformed response: {}", e))
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::Error;

    #[test]
    fn display() {
        assert_eq!(
            Error::format("bad line").to_string(),
            "format error: bad line"
        );
        assert_eq!(
            Error::Timeout {
                what: String::from("job 42"),
                elapsed: std::time::Duration::from_secs(3),
            }
            .to_string(),
            "timed out after 3s waiting for job 42"
        );
    }

    #[test]
    fn from_io() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[rstest::rstest]
    #[case(std::io::ErrorKind::InvalidData, true)]
    #[case(std::io::ErrorKind::UnexpectedEof, false)]
    fn from_read(#[case] kind: std::io::ErrorKind, #[case] is_format: bool) {
        let err = Error::from_read(std::io::Error::new(kind, "unexpected EOL"));
        assert_eq!(matches!(err, Error::Format(_)), is_format);
    }
}
