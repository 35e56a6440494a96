//! Wire protocol between a rendering surface and the host.
//!
//! Two closed tagged unions: [`WidgetMessage`] (surface → host) and
//! [`HostMessage`] (host → surface). Wire tags and field names follow the
//! widget bridge protocol; unknown inbound kinds decode to `None` so newer
//! widgets stay compatible with older hosts.

use crate::model::{DisplayMode, Globals, NavigationDirection};
use crate::security::CspViolation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Messages a rendering surface sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WidgetMessage {
    /// The widget reports its content height.
    #[serde(rename = "resize")]
    Resize { height: f64 },

    /// The widget declares its persistent state value.
    #[serde(rename = "setWidgetState")]
    SetWidgetState {
        #[serde(rename = "toolId")]
        tool_id: String,
        state: Value,
    },

    /// The widget asks the host to invoke a tool on its behalf.
    #[serde(rename = "callTool")]
    CallTool {
        #[serde(rename = "callId")]
        call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        /// Tool arguments; older widgets send this field as `params`.
        #[serde(alias = "params", default)]
        args: Value,
        #[serde(default)]
        meta: Value,
    },

    /// The widget inserts a follow-up message into the conversation.
    #[serde(rename = "sendFollowup")]
    SendFollowup { message: String },

    /// Advisory request to change presentation mode; the host applies
    /// device-class policy before committing.
    #[serde(rename = "requestDisplayMode")]
    RequestDisplayMode {
        mode: DisplayMode,
        #[serde(rename = "maxHeight", default, skip_serializing_if = "Option::is_none")]
        max_height: Option<u32>,
    },

    /// The widget asks to be closed.
    #[serde(rename = "requestClose")]
    RequestClose,

    /// A blocked resource reported by the surface's enforcement layer.
    #[serde(rename = "csp-violation")]
    CspViolation {
        #[serde(flatten)]
        violation: CspViolation,
    },

    /// The widget asks the host to open a link externally.
    #[serde(rename = "openExternal")]
    OpenExternal { href: String },

    /// The widget starts a checkout negotiation.
    #[serde(rename = "requestCheckout")]
    RequestCheckout {
        #[serde(rename = "callId")]
        call_id: String,
        /// Opaque checkout session payload.
        session: Value,
    },

    /// The widget asks the host to present a modal surface.
    #[serde(rename = "requestModal")]
    RequestModal {
        title: String,
        #[serde(default)]
        params: Value,
    },

    /// Navigation-capability update from a fullscreen breakout surface.
    #[serde(rename = "navigationStateChanged")]
    NavigationStateChanged {
        #[serde(rename = "toolId")]
        tool_id: String,
        #[serde(rename = "canGoBack")]
        can_go_back: bool,
        #[serde(rename = "canGoForward")]
        can_go_forward: bool,
    },
}

impl WidgetMessage {
    /// Decode an inbound message. Unknown or malformed kinds yield `None`;
    /// the router treats those as a forward-compatible no-op.
    pub fn decode(value: Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(message) => Some(message),
            Err(err) => {
                debug!(error = %err, "ignoring unrecognized widget message");
                None
            }
        }
    }

    /// Wire tag, for direction-tagged message logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::SetWidgetState { .. } => "setWidgetState",
            Self::CallTool { .. } => "callTool",
            Self::SendFollowup { .. } => "sendFollowup",
            Self::RequestDisplayMode { .. } => "requestDisplayMode",
            Self::RequestClose => "requestClose",
            Self::CspViolation { .. } => "csp-violation",
            Self::OpenExternal { .. } => "openExternal",
            Self::RequestCheckout { .. } => "requestCheckout",
            Self::RequestModal { .. } => "requestModal",
            Self::NavigationStateChanged { .. } => "navigationStateChanged",
        }
    }
}

/// Messages the host pushes to a rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    /// Fan-out of widget-declared state to other surfaces of the session.
    #[serde(rename = "pushWidgetState")]
    PushWidgetState {
        #[serde(rename = "toolId")]
        tool_id: String,
        state: Value,
    },

    /// Environment push (theme, display mode, locale, sizing, user agent).
    #[serde(rename = "set_globals")]
    SetGlobals { globals: Globals },

    /// Host-mediated navigation command for fullscreen breakout.
    #[serde(rename = "navigate")]
    Navigate {
        direction: NavigationDirection,
        #[serde(rename = "toolId")]
        tool_id: String,
    },

    /// Ask the surface to re-measure and re-report its content height.
    #[serde(rename = "requestResize")]
    RequestResize,

    /// Response to a proxied `callTool`.
    #[serde(rename = "callTool:response")]
    CallToolResponse {
        #[serde(rename = "callId")]
        call_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Response to a `requestCheckout`.
    #[serde(rename = "requestCheckout:response")]
    RequestCheckoutResponse {
        #[serde(rename = "callId")]
        call_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl HostMessage {
    /// Create a widget-state push.
    pub fn push_widget_state(tool_id: impl Into<String>, state: Value) -> Self {
        Self::PushWidgetState {
            tool_id: tool_id.into(),
            state,
        }
    }

    /// Create a globals push.
    pub fn set_globals(globals: Globals) -> Self {
        Self::SetGlobals { globals }
    }

    /// Create a navigation command.
    pub fn navigate(direction: NavigationDirection, tool_id: impl Into<String>) -> Self {
        Self::Navigate {
            direction,
            tool_id: tool_id.into(),
        }
    }

    /// Create a successful `callTool` response.
    pub fn call_tool_result(call_id: impl Into<String>, result: Value) -> Self {
        Self::CallToolResponse {
            call_id: call_id.into(),
            result: Some(result),
            error: None,
        }
    }

    /// Create a failed `callTool` response carrying a message, never a raw
    /// error object.
    pub fn call_tool_error(call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CallToolResponse {
            call_id: call_id.into(),
            result: None,
            error: Some(message.into()),
        }
    }

    /// Create a successful checkout response.
    pub fn checkout_result(call_id: impl Into<String>, result: Value) -> Self {
        Self::RequestCheckoutResponse {
            call_id: call_id.into(),
            result: Some(result),
            error: None,
        }
    }

    /// Create a failed checkout response.
    pub fn checkout_error(call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequestCheckoutResponse {
            call_id: call_id.into(),
            result: None,
            error: Some(message.into()),
        }
    }

    /// Wire tag, for direction-tagged message logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PushWidgetState { .. } => "pushWidgetState",
            Self::SetGlobals { .. } => "set_globals",
            Self::Navigate { .. } => "navigate",
            Self::RequestResize => "requestResize",
            Self::CallToolResponse { .. } => "callTool:response",
            Self::RequestCheckoutResponse { .. } => "requestCheckout:response",
        }
    }
}
