use thiserror::Error;

/// Top-level error type for the `crudbridge-api` crate.
///
/// Covers every failure mode of a single HTTP round-trip: transport,
/// TLS and header setup, and non-2xx responses. `crudbridge-core`
/// passes these through to its callers untouched.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A default header from the transport config is not a valid header.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    // ── Response ────────────────────────────────────────────────────
    /// The server answered with a status outside 200..=299.
    ///
    /// `message` is the `message` field of the JSON body when present,
    /// otherwise the canonical reason phrase for `status`.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },
}

impl Error {
    /// HTTP status carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// The provider itself never retries; this is for callers that do.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> Error {
        Error::Http {
            status,
            message: "boom".into(),
            body: String::new(),
        }
    }

    #[test]
    fn not_found_is_detected_from_status() {
        assert!(http(404).is_not_found());
        assert!(!http(500).is_not_found());
    }

    #[test]
    fn gateway_errors_are_transient() {
        assert!(http(503).is_transient());
        assert!(http(429).is_transient());
        assert!(!http(400).is_transient());
        assert!(!Error::Tls("bad".into()).is_transient());
    }

    #[test]
    fn display_includes_status_and_message() {
        assert_eq!(http(422).to_string(), "HTTP 422: boom");
    }
}
