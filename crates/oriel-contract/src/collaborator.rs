//! Collaborator seams the host runtime calls out through: the backend that
//! materializes widget content, the tool-execution path proxied calls are
//! forwarded to, and the embedding UI's delegate.

use crate::model::{DeviceClass, DisplayMode, NavigationState, SafeAreaInsets, Theme};
use crate::security::{CspMode, WidgetCsp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Request to the content store to materialize a widget's renderable
/// content from a tool output template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializeRequest {
    pub server_id: String,
    /// Content template reference declared by the tool.
    pub uri: String,
    pub tool_input: Value,
    pub tool_output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_response_metadata: Option<Value>,
    pub tool_id: String,
    pub tool_name: String,
    pub theme: Theme,
    pub locale: String,
    pub device_type: DeviceClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<Value>,
    pub csp_mode: CspMode,
    pub capabilities: Vec<String>,
    pub safe_area_insets: SafeAreaInsets,
}

/// Renderable content materialized for one widget session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetContent {
    /// Content address the rendering surface is loaded from.
    pub url: String,
    /// Whether the widget asked to start closed.
    #[serde(default)]
    pub close_widget: bool,
    /// Whether the host should draw a border around the surface.
    #[serde(default)]
    pub prefers_border: bool,
    /// CSP report for the materialized content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csp: Option<WidgetCsp>,
}

/// Content-store failure. Surfaced on the session as a user-visible error
/// state; never fatal to the host.
#[derive(Debug, Error)]
pub enum ContentStoreError {
    #[error("{0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backend collaborator that materializes widget content.
#[async_trait]
pub trait WidgetContentStore: Send + Sync {
    async fn materialize(&self, request: MaterializeRequest)
        -> Result<WidgetContent, ContentStoreError>;
}

/// Outcome of a proxied tool call.
#[derive(Debug, Clone, Default)]
pub struct ToolCallOutcome {
    /// Tool result delivered to the widget unmodified; `isError` semantics,
    /// if any, are the widget's to interpret.
    pub result: Value,
    /// Response metadata, inspected for authorization challenges.
    pub meta: Map<String, Value>,
}

/// Tool-execution failure, converted to a typed error response for the
/// widget.
#[derive(Debug, Error)]
pub enum ToolExecutorError {
    #[error("{0}")]
    Failed(String),
}

/// External tool-execution collaborator widget-initiated calls are
/// forwarded to.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Value,
        meta: Value,
    ) -> Result<ToolCallOutcome, ToolExecutorError>;
}

/// Non-fatal, user-visible notification raised beside the normal message
/// flow (e.g. an authorization challenge found in a tool response).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostNotification {
    pub title: String,
    pub detail: Option<String>,
}

impl HostNotification {
    /// Create an authorization-required notification.
    pub fn oauth_required(detail: Option<String>) -> Self {
        Self {
            title: "OAuth Required".to_string(),
            detail,
        }
    }

    /// Render as a single display string.
    pub fn message(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {}", self.title, detail),
            None => self.title.clone(),
        }
    }
}

/// Where a checkout negotiation should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutTarget {
    Inline,
    Modal,
}

/// A checkout negotiation handed to the host checkout UI.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    /// Correlation id assigned by the widget; the eventual response is
    /// tagged with it.
    pub call_id: String,
    /// Opaque checkout session payload.
    pub payload: Value,
    pub target: CheckoutTarget,
}

/// Host-UI delegate for side effects that leave the widget subsystem.
///
/// Default implementations are no-ops so embedders only wire the surfaces
/// they present.
pub trait HostDelegate: Send + Sync {
    /// Raise a non-fatal, user-visible notification.
    fn notify(&self, _notification: HostNotification) {}

    /// Insert a widget-authored follow-up message into the conversation.
    fn followup_message(&self, _message: &str) {}

    /// Open a link outside the host (loopback-local hrefs never reach
    /// this).
    fn open_external(&self, _href: &str) {}

    /// Present a modal surface for the widget.
    fn request_modal(&self, _tool_id: &str, _title: &str, _params: &Value) {}

    /// Start the host-side checkout UI for a pending negotiation.
    fn begin_checkout(&self, _tool_id: &str, _request: &CheckoutRequest) {}

    /// A session's committed display mode changed.
    fn display_mode_changed(&self, _tool_id: &str, _mode: DisplayMode) {}

    /// A fullscreen breakout surface updated its navigation capabilities.
    fn navigation_state_changed(&self, _tool_id: &str, _nav: NavigationState) {}

    /// The widget asked to be closed.
    fn close_requested(&self, _tool_id: &str) {}

    /// A security-policy flip invalidated the session's surfaces; the
    /// embedder must construct fresh ones for this content.
    fn recreate_surface(&self, _tool_id: &str, _content: &WidgetContent) {}
}
