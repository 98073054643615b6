//! Error taxonomy for the correlation engine.
//!
//! Only categories (a)-(c) from the error handling design are represented
//! here: configuration, authentication, and transport errors are fatal for a
//! run and bubble up to the driver. Malformed individual records, metadata
//! 404s, and store backend failures are logged and swallowed at the
//! component boundary — they never construct an [`Error`].

/// Result type alias used throughout the correlation engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error categories a pipeline run can fail with.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing config file, malformed JSON/TOML/YAML, or a missing required field.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication against the upstream platform failed.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Listing activities from an `ActivitySource` failed (network, HTTP status, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// Anything else; maps to exit code 4.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Map an error category to the process exit code defined for the CLI driver.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            Error::Auth(_) => 3,
            Error::Transport(_) => 3,
            Error::Unexpected(_) => 4,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_spec() {
        assert_eq!(Error::Config("x".into()).exit_code(), 2);
        assert_eq!(Error::Auth("x".into()).exit_code(), 3);
        assert_eq!(Error::Transport("x".into()).exit_code(), 3);
        assert_eq!(Error::Unexpected("x".into()).exit_code(), 4);
    }
}
