//! Widget-initiated tool calls proxied through the host's tool-execution
//! path, including authorization-challenge detection on responses.
//!
//! Calls are spawned off the dispatch path so the router stays free to
//! process other messages while a call is in flight. There is no
//! cancellation primitive: a torn-down session simply orphans the pending
//! `callId` and the response is dropped.

use crate::session::SurfaceChannel;
use oriel_contract::{
    HostDelegate, HostMessage, HostNotification, ToolExecutor, WWW_AUTHENTICATE_META_KEY,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Error message for tool calls arriving without a usable execution path.
pub const CALL_TOOL_UNSUPPORTED: &str = "callTool is not supported in this context";

/// Parsed RFC-7235-style authorization challenge from tool response
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthChallenge {
    /// Challenge scheme, e.g. `Bearer`.
    pub scheme: String,
    pub realm: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl AuthChallenge {
    /// Render the challenge as a non-fatal notification. Absence of both
    /// `error` and `error_description` still produces the generic one.
    pub fn notification(&self) -> HostNotification {
        let detail = self
            .error_description
            .clone()
            .or_else(|| self.error.clone());
        HostNotification::oauth_required(detail)
    }
}

/// Parse a `Bearer realm="...", error="..."` challenge string into its
/// `key="value"` pairs.
pub fn parse_challenge(raw: &str) -> AuthChallenge {
    let raw = raw.trim();
    let (scheme, params) = match raw.split_once(char::is_whitespace) {
        Some((scheme, rest)) => (scheme, rest),
        None => (raw, ""),
    };

    let mut challenge = AuthChallenge {
        scheme: scheme.to_string(),
        ..AuthChallenge::default()
    };

    let mut rest = params;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq]
            .trim_matches(|c: char| c == ',' || c.is_whitespace())
            .to_string();
        let after = &rest[eq + 1..];

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (quoted[..end].to_string(), &quoted[end + 1..]),
                // Unterminated quote: take the rest verbatim.
                None => (quoted.to_string(), ""),
            }
        } else {
            match after.find(',') {
                Some(end) => (after[..end].trim().to_string(), &after[end..]),
                None => (after.trim().to_string(), ""),
            }
        };

        match key.as_str() {
            "realm" => challenge.realm = Some(value),
            "error" => challenge.error = Some(value),
            "error_description" => challenge.error_description = Some(value),
            _ => {}
        }
        rest = remainder;
    }
    challenge
}

/// Extract an authorization challenge from tool response metadata, if the
/// well-known key is present.
pub(crate) fn challenge_from_meta(meta: &serde_json::Map<String, Value>) -> Option<AuthChallenge> {
    meta.get(WWW_AUTHENTICATE_META_KEY)
        .and_then(Value::as_str)
        .map(parse_challenge)
}

/// Forward a widget-initiated tool call to the execution collaborator.
///
/// Responds synchronously with an explicit "unsupported" error when no
/// executor is configured or no runtime is available to spawn on; otherwise
/// the call runs to completion off the dispatch path.
pub(crate) fn dispatch_call(
    executor: Option<Arc<dyn ToolExecutor>>,
    delegate: Arc<dyn HostDelegate>,
    channel: Arc<SurfaceChannel>,
    call_id: String,
    tool_name: String,
    args: Value,
    meta: Value,
) {
    if !channel.begin_call(&call_id) {
        debug!(call_id = %call_id, "duplicate callTool for outstanding callId ignored");
        return;
    }

    let Some(executor) = executor else {
        if channel.finish_call(&call_id) {
            channel.send(&HostMessage::call_tool_error(call_id, CALL_TOOL_UNSUPPORTED));
        }
        return;
    };

    let Ok(handle) = Handle::try_current() else {
        warn!(tool_name = %tool_name, "no tokio runtime available for proxied tool call");
        if channel.finish_call(&call_id) {
            channel.send(&HostMessage::call_tool_error(call_id, CALL_TOOL_UNSUPPORTED));
        }
        return;
    };

    handle.spawn(async move {
        let outcome = executor.call_tool(&tool_name, args, meta).await;
        if !channel.finish_call(&call_id) {
            debug!(call_id = %call_id, "dropping orphaned proxied tool response");
            return;
        }
        match outcome {
            Ok(outcome) => {
                if let Some(challenge) = challenge_from_meta(&outcome.meta) {
                    // Side-channel diagnostic; the result below is still
                    // delivered to the widget unmodified.
                    delegate.notify(challenge.notification());
                }
                channel.send(&HostMessage::call_tool_result(call_id, outcome.result));
            }
            Err(err) => {
                channel.send(&HostMessage::call_tool_error(call_id, err.to_string()));
            }
        }
    });
}
