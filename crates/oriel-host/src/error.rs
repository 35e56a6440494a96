//! Host-API error types.

use thiserror::Error;

/// Errors returned by [`crate::WidgetHost`] operations.
///
/// These cover misuse of the host API by the embedder; protocol-level
/// failures (materialization, proxying, checkout collisions) are surfaced
/// through session state and response messages instead, and never stop the
/// host.
#[derive(Debug, Error)]
pub enum HostError {
    /// No widget session exists for the tool-call id.
    #[error("unknown widget session: {tool_id}")]
    UnknownSession {
        /// The tool-call id that was addressed.
        tool_id: String,
    },

    /// A checkout resolution was attempted with nothing pending.
    #[error("no checkout is pending for session {tool_id}")]
    NoPendingCheckout {
        /// The tool-call id that was addressed.
        tool_id: String,
    },
}

impl HostError {
    pub(crate) fn unknown_session(tool_id: impl Into<String>) -> Self {
        HostError::UnknownSession {
            tool_id: tool_id.into(),
        }
    }
}
