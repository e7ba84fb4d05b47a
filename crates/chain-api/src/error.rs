//! Error types for Chain API operations.

/// Errors that can occur when talking to the Chain API or the raw
/// transaction service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to serialize or deserialize data.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Server returned a non-2xx response.
    #[error("server error ({status_code}): {message}")]
    Server {
        /// HTTP status code.
        status_code: u16,
        /// Response body.
        message: String,
    },

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Connection kept failing after every retry.
    #[error("connection failed after {attempts} attempts: {message}")]
    Connection {
        /// Number of attempts made.
        attempts: u32,
        /// Last transport error.
        message: String,
    },

    /// A raw transaction could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_server_error() {
        let err = ApiError::Server {
            status_code: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "server error (502): bad gateway");
    }

    #[test]
    fn display_connection_error() {
        let err = ApiError::Connection {
            attempts: 5,
            message: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "connection failed after 5 attempts: connection refused"
        );
    }

    #[test]
    fn display_not_found() {
        let err = ApiError::NotFound("transaction abc".into());
        assert_eq!(err.to_string(), "not found: transaction abc");
    }

    #[test]
    fn serde_errors_convert() {
        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ApiError = source.into();
        assert!(matches!(err, ApiError::Serialization(_)));
    }
}
