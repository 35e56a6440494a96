//! Per-tool-call widget sessions and their surface channels.
//!
//! A session is created when a finished tool call carries a content
//! template and is owned exclusively by the host; rendering surfaces never
//! mutate it directly, only through protocol messages routed by the host.

use crate::checkout::CheckoutCoordinator;
use crate::height::HeightNegotiator;
use oriel_contract::{
    CspViolation, DisplayMode, HostMessage, NavigationState, RenderSurface, SecurityPolicy,
    SurfaceRole, WidgetContent,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

/// Tool-call result bundle handed to the session manager once tool state
/// reaches "output available".
#[derive(Debug, Clone)]
pub struct ToolCallBundle {
    /// Tool-call id; doubles as the session id.
    pub tool_id: String,
    /// Server the tool belongs to.
    pub server_id: String,
    pub tool_name: String,
    pub input: Value,
    pub output: Value,
    pub response_metadata: Option<Value>,
    /// Content template declared by the tool's metadata, if any. Absent
    /// means the session stays in the terminal no-widget state.
    pub template: Option<String>,
}

/// Lifecycle phase of a widget session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// The tool declared no content template; nothing will be rendered.
    NoWidget,
    /// Content is materialized and a surface can be created and loaded.
    Ready(WidgetContent),
    /// The backend could not produce renderable content. User visible,
    /// never fatal to the host.
    Failed(String),
}

/// Fan-out channel from the host to every rendering surface registered for
/// one session, plus the bookkeeping shared with spawned proxy tasks.
///
/// The channel outlives session teardown in the hands of in-flight proxied
/// calls; the `alive` flag makes their eventual responses drop instead of
/// reaching a dead surface.
pub(crate) struct SurfaceChannel {
    tool_id: String,
    alive: AtomicBool,
    surfaces: RwLock<Vec<(SurfaceRole, Arc<dyn RenderSurface>)>>,
    pending_calls: Mutex<HashSet<String>>,
}

impl SurfaceChannel {
    pub(crate) fn new(tool_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            tool_id: tool_id.into(),
            alive: AtomicBool::new(true),
            surfaces: RwLock::new(Vec::new()),
            pending_calls: Mutex::new(HashSet::new()),
        })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Tear the channel down: late proxied responses are orphaned from here
    /// on.
    pub(crate) fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.surfaces.write().unwrap().clear();
    }

    /// Attach a surface handle, replacing any existing handle in the role.
    pub(crate) fn attach(&self, role: SurfaceRole, surface: Arc<dyn RenderSurface>) {
        let mut surfaces = self.surfaces.write().unwrap();
        surfaces.retain(|(existing, _)| *existing != role);
        surfaces.push((role, surface));
    }

    pub(crate) fn detach(&self, role: SurfaceRole) {
        self.surfaces.write().unwrap().retain(|(existing, _)| *existing != role);
    }

    /// Drop every registered handle without killing the channel. Used when
    /// a policy flip invalidates the loaded content.
    pub(crate) fn clear_surfaces(&self) {
        self.surfaces.write().unwrap().clear();
    }

    pub(crate) fn has_surfaces(&self) -> bool {
        !self.surfaces.read().unwrap().is_empty()
    }

    fn encode(&self, message: &HostMessage) -> Option<Value> {
        match serde_json::to_value(message) {
            Ok(encoded) => Some(encoded),
            Err(err) => {
                warn!(error = %err, kind = message.kind(), "failed to encode host message");
                None
            }
        }
    }

    /// Post a message to every registered surface.
    pub(crate) fn send(&self, message: &HostMessage) {
        self.send_filtered(message, |_| true);
    }

    /// Post a message to every registered surface except `excluded`, so a
    /// state echo never loops back to its originating surface.
    pub(crate) fn send_excluding(&self, message: &HostMessage, excluded: SurfaceRole) {
        self.send_filtered(message, |role| role != excluded);
    }

    /// Post a message to the surface in one role only.
    pub(crate) fn send_to(&self, role: SurfaceRole, message: &HostMessage) {
        self.send_filtered(message, |candidate| candidate == role);
    }

    fn send_filtered(&self, message: &HostMessage, keep: impl Fn(SurfaceRole) -> bool) {
        if !self.is_alive() {
            debug!(
                tool_id = %self.tool_id,
                kind = message.kind(),
                "dropping message for torn-down session"
            );
            return;
        }
        let Some(encoded) = self.encode(message) else {
            return;
        };
        debug!(
            direction = "host->widget",
            tool_id = %self.tool_id,
            kind = message.kind(),
            "sending host message"
        );
        for (role, surface) in self.surfaces.read().unwrap().iter() {
            if keep(*role) {
                surface.post_message(&encoded);
            }
        }
    }

    /// Apply a container height to every registered surface.
    pub(crate) fn set_height(&self, px: u32) {
        for (_, surface) in self.surfaces.read().unwrap().iter() {
            surface.set_height(px);
        }
    }

    /// Track an outstanding proxied call. Returns `false` when the `callId`
    /// is already in flight; the router sends at most one response per id.
    pub(crate) fn begin_call(&self, call_id: &str) -> bool {
        self.pending_calls.lock().unwrap().insert(call_id.to_string())
    }

    /// Settle an outstanding call. Returns `true` when a response may be
    /// sent: the id was pending and the session is still alive.
    pub(crate) fn finish_call(&self, call_id: &str) -> bool {
        let was_pending = self.pending_calls.lock().unwrap().remove(call_id);
        was_pending && self.is_alive()
    }
}

/// One widget session per tool-call identifier.
pub struct WidgetSession {
    pub(crate) tool_id: String,
    pub(crate) server_id: String,
    pub(crate) tool_name: String,
    pub(crate) tool_input: Value,
    pub(crate) tool_output: Value,
    pub(crate) response_metadata: Option<Value>,
    pub(crate) template: Option<String>,
    pub(crate) phase: SessionPhase,
    pub(crate) display_mode: DisplayMode,
    pub(crate) policy: SecurityPolicy,
    pub(crate) violations: Vec<CspViolation>,
    pub(crate) widget_state: Option<Value>,
    pub(crate) navigation: NavigationState,
    /// Per-session maximum height requested alongside a display mode.
    pub(crate) max_height: Option<u32>,
    pub(crate) height: HeightNegotiator,
    pub(crate) checkout: CheckoutCoordinator,
    pub(crate) channel: Arc<SurfaceChannel>,
}

impl WidgetSession {
    pub(crate) fn new(bundle: &ToolCallBundle) -> Self {
        Self {
            tool_id: bundle.tool_id.clone(),
            server_id: bundle.server_id.clone(),
            tool_name: bundle.tool_name.clone(),
            tool_input: bundle.input.clone(),
            tool_output: bundle.output.clone(),
            response_metadata: bundle.response_metadata.clone(),
            template: bundle.template.clone(),
            phase: SessionPhase::NoWidget,
            display_mode: DisplayMode::Inline,
            policy: SecurityPolicy::default(),
            violations: Vec::new(),
            widget_state: None,
            navigation: NavigationState::default(),
            max_height: None,
            height: HeightNegotiator::default(),
            checkout: CheckoutCoordinator::default(),
            channel: SurfaceChannel::new(&bundle.tool_id),
        }
    }

    /// Tool-call id, which is also the session id.
    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// Materialized content, when the session is ready.
    pub fn content(&self) -> Option<&WidgetContent> {
        match &self.phase {
            SessionPhase::Ready(content) => Some(content),
            _ => None,
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn security_policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Security violations accumulated for diagnostics display.
    pub fn violations(&self) -> &[CspViolation] {
        &self.violations
    }

    /// Widget-declared state value, if any.
    pub fn widget_state(&self) -> Option<&Value> {
        self.widget_state.as_ref()
    }

    pub fn navigation(&self) -> NavigationState {
        self.navigation
    }

    /// Last applied container height.
    pub fn applied_height(&self) -> Option<u32> {
        self.height.applied()
    }

    /// Last raw height measurement accepted from the widget.
    pub fn measured_height(&self) -> Option<f64> {
        self.height.last_measured()
    }

    /// Whether a checkout negotiation is pending.
    pub fn checkout_pending(&self) -> bool {
        self.checkout.pending().is_some()
    }

    /// Rebuild the materialization request under a new policy mode, for
    /// the surface-invalidating reload after a mode flip.
    pub(crate) fn materialize_request_for(
        &self,
        config: &crate::host::HostConfig,
        csp_mode: oriel_contract::CspMode,
    ) -> Option<oriel_contract::MaterializeRequest> {
        let template = self.template.as_ref()?;
        Some(oriel_contract::MaterializeRequest {
            server_id: self.server_id.clone(),
            uri: template.clone(),
            tool_input: self.tool_input.clone(),
            tool_output: self.tool_output.clone(),
            tool_response_metadata: self.response_metadata.clone(),
            tool_id: self.tool_id.clone(),
            tool_name: self.tool_name.clone(),
            theme: config.theme,
            locale: config.locale.clone(),
            device_type: config.device,
            user_location: config.user_location.clone(),
            csp_mode,
            capabilities: config.capabilities.clone(),
            safe_area_insets: config.safe_area,
        })
    }

    /// Store a widget-declared state value. Returns `false` when the value
    /// equals the current one (dedupe by value equality, preventing
    /// feedback loops across surfaces).
    pub(crate) fn store_widget_state(&mut self, state: Value) -> bool {
        if self.widget_state.as_ref() == Some(&state) {
            return false;
        }
        self.widget_state = Some(state);
        true
    }
}
