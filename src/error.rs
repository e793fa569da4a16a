use thiserror::Error;

/// Every failure the client can report.
///
/// Match on the enum as a whole for a catch-all, or on a single variant for a
/// specific kind. [`TlqError::is_retryable`] tells which failures the
/// dispatcher treats as transient.
#[derive(Error, Debug)]
pub enum TlqError {
    /// The connection could not be established or completed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request failed below the HTTP layer for a reason that is not a
    /// connection or timeout problem. Never retried.
    #[error("Request failed: {0}")]
    Request(String),

    /// A single attempt exceeded the configured timeout (in milliseconds).
    #[error("Timeout error after {0}ms")]
    Timeout(u64),

    /// The server answered with a non-ok status.
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// A local precondition failed before anything was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max: 65536)")]
    MessageTooLarge { size: usize },
}

impl TlqError {
    /// Connection failures, timeouts and 5xx responses are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            TlqError::Connection(_) | TlqError::Timeout(_) => true,
            TlqError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, TlqError::Connection(_) | TlqError::Request(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TlqError::Validation(_) | TlqError::MessageTooLarge { .. }
        )
    }

    /// The HTTP status carried by a [`TlqError::Server`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            TlqError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TlqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_retryable() {
        let error = TlqError::Connection("Connection refused".to_string());
        assert!(error.is_retryable());
        assert!(error.is_connection());

        let error_msg = format!("{}", error);
        assert_eq!(error_msg, "Connection error: Connection refused");
    }

    #[test]
    fn test_request_error_not_retryable() {
        let error = TlqError::Request("builder error".to_string());
        assert!(!error.is_retryable());
        assert!(error.is_connection());
        assert_eq!(format!("{}", error), "Request failed: builder error");
    }

    #[test]
    fn test_timeout_error_retryable() {
        let error = TlqError::Timeout(5000);
        assert!(error.is_retryable());
        assert!(!error.is_connection());

        let error_msg = format!("{}", error);
        assert_eq!(error_msg, "Timeout error after 5000ms");
    }

    #[test]
    fn test_server_error_status_codes() {
        let test_cases = vec![
            (400, "Bad Request", false),
            (401, "Unauthorized", false),
            (404, "Not Found", false),
            (499, "Client Closed Request", false),
            (500, "Internal Server Error", true),
            (502, "Bad Gateway", true),
            (503, "Service Unavailable", true),
            (504, "Gateway Timeout", true),
        ];

        for (status, message, retryable) in test_cases {
            let error = TlqError::Server {
                status,
                message: message.to_string(),
            };

            assert_eq!(error.is_retryable(), retryable, "status {}", status);
            assert_eq!(error.status(), Some(status));

            let error_msg = format!("{}", error);
            assert!(error_msg.contains(&status.to_string()));
            assert!(error_msg.contains(message));
        }
    }

    #[test]
    fn test_validation_errors() {
        let error = TlqError::Validation("Invalid input".to_string());
        assert!(!error.is_retryable());
        assert!(error.is_validation());
        assert_eq!(format!("{}", error), "Validation error: Invalid input");

        let error = TlqError::MessageTooLarge { size: 70000 };
        assert!(!error.is_retryable());
        assert!(error.is_validation());
        assert_eq!(
            format!("{}", error),
            "Message too large: 70000 bytes (max: 65536)"
        );
    }

    #[test]
    fn test_error_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let tlq_error: TlqError = json_error.into();

        assert!(!tlq_error.is_retryable());
        assert!(matches!(tlq_error, TlqError::Serialization(_)));
        assert!(format!("{}", tlq_error).contains("Serialization error:"));
    }

    #[test]
    fn test_status_absent_for_non_server_errors() {
        assert_eq!(TlqError::Timeout(10).status(), None);
        assert_eq!(TlqError::Connection("x".to_string()).status(), None);
        assert_eq!(TlqError::MessageTooLarge { size: 1 }.status(), None);
    }

    #[test]
    fn test_empty_error_messages() {
        let connection_error = TlqError::Connection("".to_string());
        assert_eq!(format!("{}", connection_error), "Connection error: ");

        let server_error = TlqError::Server {
            status: 500,
            message: "".to_string(),
        };
        assert_eq!(format!("{}", server_error), "Server error: 500 - ");
    }
}
