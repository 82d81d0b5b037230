// ── Core error types ──
//
// Errors raised by the translation layer itself (unknown action kinds,
// malformed params, invalid query conditions) plus a transparent
// passthrough for transport failures. HTTP errors are never reworded.

use thiserror::Error;

use crate::action::ActionKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Routing errors ───────────────────────────────────────────────
    /// The action kind is not one the request builder can translate.
    #[error("Unsupported fetch action type {action}")]
    UnsupportedAction { action: String },

    /// Params did not match the shape the action kind requires.
    #[error("Invalid params for {action}: {message}")]
    InvalidParams { action: ActionKind, message: String },

    // ── Query errors ─────────────────────────────────────────────────
    /// A filter or sort condition the backend grammar cannot express.
    #[error("{message}")]
    InvalidQuery { message: String },

    // ── Setup errors ─────────────────────────────────────────────────
    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(#[from] url::ParseError),

    // ── Transport errors (passed through untouched) ──────────────────
    #[error(transparent)]
    Http(#[from] crudbridge_api::Error),
}

impl CoreError {
    pub(crate) fn unsupported(action: impl Into<String>) -> Self {
        Self::UnsupportedAction {
            action: action.into(),
        }
    }

    pub(crate) fn invalid_params(action: ActionKind, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            action,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Returns `true` if the request never reached the network.
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Http(_))
    }

    /// The underlying transport error, if this came from the HTTP client.
    pub fn as_http(&self) -> Option<&crudbridge_api::Error> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}
