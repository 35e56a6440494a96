//! The widget host: session lifecycle, surface registration, display-mode
//! commits, globals pushes, and security-policy reloads.

use crate::display::{effective_mode, FocusSlot};
use crate::error::HostError;
use crate::security::resolve_policy;
use crate::session::{SessionPhase, ToolCallBundle, WidgetSession};
use oriel_contract::{
    CspMode, DeviceClass, DisplayMode, Globals, HostDelegate, HostMessage, NavigationDirection,
    RenderSurface, SafeAreaInsets, SurfaceRole, Theme, ToolExecutor, UserAgent, WidgetContentStore,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Host-side configuration forwarded to widgets and used for display-mode
/// and security-policy decisions.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub theme: Theme,
    pub locale: String,
    pub device: DeviceClass,
    /// Capability flags advertised to widgets (e.g. `hover`, `touch`).
    pub capabilities: Vec<String>,
    pub safe_area: SafeAreaInsets,
    /// Host-wide maximum container height, when one is in force.
    pub max_height: Option<u32>,
    /// Approximate user location forwarded to the content store.
    pub user_location: Option<Value>,
    /// Global content-origin policy toggle.
    pub csp_mode: CspMode,
    /// Diagnostics/playground override for the global toggle.
    pub csp_mode_override: Option<CspMode>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            locale: "en-US".to_string(),
            device: DeviceClass::Desktop,
            capabilities: Vec::new(),
            safe_area: SafeAreaInsets::default(),
            max_height: None,
            user_location: None,
            csp_mode: CspMode::Permissive,
            csp_mode_override: None,
        }
    }
}

impl HostConfig {
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: DeviceClass) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    #[must_use]
    pub fn with_max_height(mut self, max_height: u32) -> Self {
        self.max_height = Some(max_height);
        self
    }

    #[must_use]
    pub fn with_csp_mode(mut self, mode: CspMode) -> Self {
        self.csp_mode = mode;
        self
    }

    /// The policy mode in force: the playground override when set,
    /// otherwise the global toggle.
    pub fn effective_csp_mode(&self) -> CspMode {
        self.csp_mode_override.unwrap_or(self.csp_mode)
    }
}

/// Host-side bridge owning every widget session and the shared focus slot.
///
/// Single-threaded and event-driven: the embedder calls
/// [`handle_message`](WidgetHost::handle_message) for each protocol message
/// in its channel's emission order. Handlers never block; proxied tool
/// calls are spawned off the dispatch path.
pub struct WidgetHost {
    pub(crate) config: HostConfig,
    pub(crate) store: Arc<dyn WidgetContentStore>,
    pub(crate) executor: Option<Arc<dyn ToolExecutor>>,
    pub(crate) delegate: Arc<dyn HostDelegate>,
    pub(crate) sessions: HashMap<String, WidgetSession>,
    pub(crate) focus: FocusSlot,
}

impl WidgetHost {
    pub fn new(store: Arc<dyn WidgetContentStore>, delegate: Arc<dyn HostDelegate>) -> Self {
        Self {
            config: HostConfig::default(),
            store,
            executor: None,
            delegate,
            sessions: HashMap::new(),
            focus: FocusSlot::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Wire the tool-execution collaborator. Without one, widget-initiated
    /// tool calls receive an explicit "unsupported" error response.
    #[must_use]
    pub fn with_tool_executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn session(&self, tool_id: &str) -> Option<&WidgetSession> {
        self.sessions.get(tool_id)
    }

    /// Whether fullscreen is contained within the layout frame on this
    /// device class instead of breaking out to the full display.
    pub fn fullscreen_is_contained(&self) -> bool {
        self.config.device.contains_fullscreen()
    }

    /// Current owner of the pip or fullscreen slot.
    pub fn focus_holder(&self, slot: DisplayMode) -> Option<&str> {
        self.focus.holder(slot)
    }

    /// Create (or return) the session for a finished tool call and
    /// materialize its content. Idempotent per tool-call id: a session is
    /// materialized at most once.
    pub async fn ensure_session(&mut self, bundle: ToolCallBundle) -> &WidgetSession {
        if self.sessions.contains_key(&bundle.tool_id) {
            return &self.sessions[&bundle.tool_id];
        }

        let tool_id = bundle.tool_id.clone();
        let mut session = WidgetSession::new(&bundle);

        match session.materialize_request_for(&self.config, self.config.effective_csp_mode()) {
            None => {
                debug!(tool_id = %tool_id, "tool declared no content template");
                session.phase = SessionPhase::NoWidget;
            }
            Some(request) => match self.store.materialize(request).await {
                Ok(content) => {
                    session.policy =
                        resolve_policy(self.config.effective_csp_mode(), content.csp.as_ref());
                    if content.close_widget {
                        self.delegate.close_requested(&tool_id);
                    }
                    session.phase = SessionPhase::Ready(content);
                }
                Err(err) => {
                    warn!(tool_id = %tool_id, error = %err, "widget materialization failed");
                    session.phase = SessionPhase::Failed(err.to_string());
                }
            },
        }

        self.sessions.entry(tool_id).or_insert(session)
    }

    /// Register a rendering surface for a session. The same logical widget
    /// may hold an inline and a modal handle at once; pushes fan out to
    /// both, deduped by value equality.
    pub fn register_surface(
        &mut self,
        tool_id: &str,
        role: SurfaceRole,
        surface: Arc<dyn RenderSurface>,
    ) -> Result<(), HostError> {
        let config = self.config.clone();
        let session = self
            .sessions
            .get_mut(tool_id)
            .ok_or_else(|| HostError::unknown_session(tool_id))?;

        session.channel.attach(role, Arc::clone(&surface));
        if let SessionPhase::Ready(content) = &session.phase {
            // Loading and catch-up pushes go to the new handle only; any
            // other surface is already current.
            surface.load(&content.url);
            let globals = globals_for(&config, session);
            session.channel.send_to(role, &HostMessage::set_globals(globals));
            if let Some(state) = session.widget_state.clone() {
                session
                    .channel
                    .send_to(role, &HostMessage::push_widget_state(tool_id, state));
            }
            if let Some(px) = session.height.applied() {
                surface.set_height(px);
            }
        }
        Ok(())
    }

    /// Detach one surface handle without tearing the session down.
    pub fn remove_surface(&mut self, tool_id: &str, role: SurfaceRole) -> Result<(), HostError> {
        let session = self
            .sessions
            .get_mut(tool_id)
            .ok_or_else(|| HostError::unknown_session(tool_id))?;
        session.channel.detach(role);
        Ok(())
    }

    /// Tear down a session (owning conversation turn discarded or reset).
    /// In-flight proxied responses for it are orphaned and dropped.
    pub fn discard_session(&mut self, tool_id: &str) {
        if let Some(session) = self.sessions.remove(tool_id) {
            session.channel.close();
            self.focus.release(tool_id);
        }
    }

    /// Host-initiated widget-state push, fanned out to every registered
    /// handle of the session.
    pub fn push_widget_state(&mut self, tool_id: &str, state: Value) -> Result<(), HostError> {
        let session = self
            .sessions
            .get_mut(tool_id)
            .ok_or_else(|| HostError::unknown_session(tool_id))?;
        if session.store_widget_state(state.clone()) {
            session
                .channel
                .send(&HostMessage::push_widget_state(tool_id, state));
        }
        Ok(())
    }

    /// Forward a chrome navigation command to a fullscreen breakout
    /// surface.
    pub fn navigate(
        &mut self,
        tool_id: &str,
        direction: NavigationDirection,
    ) -> Result<(), HostError> {
        let session = self
            .sessions
            .get(tool_id)
            .ok_or_else(|| HostError::unknown_session(tool_id))?;
        session
            .channel
            .send(&HostMessage::navigate(direction, tool_id));
        Ok(())
    }

    /// Settle the pending checkout negotiation with the host checkout UI's
    /// outcome. Exactly one response is sent, tagged with the original
    /// `callId`; the session becomes eligible for a new request.
    pub fn resolve_checkout(
        &mut self,
        tool_id: &str,
        outcome: Result<Value, String>,
    ) -> Result<(), HostError> {
        let session = self
            .sessions
            .get_mut(tool_id)
            .ok_or_else(|| HostError::unknown_session(tool_id))?;
        let call_id = session
            .checkout
            .resolve()
            .ok_or_else(|| HostError::NoPendingCheckout {
                tool_id: tool_id.to_string(),
            })?;
        let response = match outcome {
            Ok(result) => HostMessage::checkout_result(call_id, result),
            Err(message) => HostMessage::checkout_error(call_id, message),
        };
        session.channel.send(&response);
        Ok(())
    }

    /// Commit a display mode for a session: apply device policy upstream,
    /// evict the previous slot owner first, then push the new environment.
    pub(crate) fn apply_display_mode(&mut self, tool_id: &str, mode: DisplayMode) {
        let evictions = match mode {
            DisplayMode::Inline => {
                self.focus.release(tool_id);
                Vec::new()
            }
            expanded => self.focus.claim(expanded, tool_id),
        };
        // Exit is signaled to evicted owners before the new owner commits.
        for eviction in evictions {
            self.commit_mode(&eviction.tool_id, DisplayMode::Inline);
        }
        self.commit_mode(tool_id, mode);
    }

    fn commit_mode(&mut self, tool_id: &str, mode: DisplayMode) {
        let config = self.config.clone();
        let delegate = Arc::clone(&self.delegate);
        let Some(session) = self.sessions.get_mut(tool_id) else {
            return;
        };
        let previous = session.display_mode;
        session.display_mode = mode;

        // A request for the already-committed mode is still answered with a
        // globals push; only the transition work is skipped.
        let globals = globals_for(&config, session);
        session.channel.send(&HostMessage::set_globals(globals));
        if previous == mode {
            return;
        }

        if previous.is_expanded() && mode == DisplayMode::Inline {
            // Correct transient sizing immediately, then ask the surface to
            // re-measure.
            let max = session.max_height.or(config.max_height);
            if let Some(px) = session.height.reapply(mode, max) {
                session.channel.set_height(px);
            }
            session.channel.send(&HostMessage::RequestResize);
        }
        delegate.display_mode_changed(tool_id, mode);
    }

    /// Resolve the requested mode against device policy and commit it.
    pub fn request_display_mode(
        &mut self,
        tool_id: &str,
        requested: DisplayMode,
        max_height: Option<u32>,
    ) -> Result<DisplayMode, HostError> {
        let session = self
            .sessions
            .get_mut(tool_id)
            .ok_or_else(|| HostError::unknown_session(tool_id))?;
        if let Some(max) = max_height {
            session.max_height = Some(max);
        }
        let mode = effective_mode(requested, self.config.device);
        self.apply_display_mode(tool_id, mode);
        Ok(mode)
    }

    /// Change the host theme and re-push globals to every session.
    pub fn set_theme(&mut self, theme: Theme) {
        if self.config.theme == theme {
            return;
        }
        self.config.theme = theme;
        self.push_globals_to_all();
    }

    /// Change the host locale and re-push globals to every session.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        let locale = locale.into();
        if self.config.locale == locale {
            return;
        }
        self.config.locale = locale;
        self.push_globals_to_all();
    }

    /// Change the host-wide maximum height and re-push globals.
    pub fn set_max_height(&mut self, max_height: Option<u32>) {
        if self.config.max_height == max_height {
            return;
        }
        self.config.max_height = max_height;
        self.push_globals_to_all();
    }

    fn push_globals_to_all(&mut self) {
        let config = self.config.clone();
        for session in self.sessions.values_mut() {
            let globals = globals_for(&config, session);
            session.channel.send(&HostMessage::set_globals(globals));
        }
    }

    /// Flip the global content-origin policy toggle. A changed effective
    /// mode invalidates every ready session's surfaces: content is
    /// re-materialized under the new mode and the embedder is asked to
    /// recreate surfaces, because a policy is bound at load time.
    pub async fn set_csp_mode(&mut self, mode: CspMode) {
        let before = self.config.effective_csp_mode();
        self.config.csp_mode = mode;
        if self.config.effective_csp_mode() != before {
            self.reload_for_policy_change().await;
        }
    }

    /// Set or clear the diagnostics/playground override of the global
    /// toggle.
    pub async fn set_csp_mode_override(&mut self, mode: Option<CspMode>) {
        let before = self.config.effective_csp_mode();
        self.config.csp_mode_override = mode;
        if self.config.effective_csp_mode() != before {
            self.reload_for_policy_change().await;
        }
    }

    async fn reload_for_policy_change(&mut self) {
        let mode = self.config.effective_csp_mode();
        let store = Arc::clone(&self.store);
        let delegate = Arc::clone(&self.delegate);
        let ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| matches!(session.phase, SessionPhase::Ready(_)))
            .map(|(id, _)| id.clone())
            .collect();

        for tool_id in ids {
            let request = {
                let Some(session) = self.sessions.get_mut(&tool_id) else {
                    continue;
                };
                // Stale content must never keep running under a policy it
                // was not loaded under.
                session.channel.clear_surfaces();
                session.materialize_request_for(&self.config, mode)
            };
            let Some(request) = request else { continue };
            let outcome = store.materialize(request).await;
            let Some(session) = self.sessions.get_mut(&tool_id) else {
                continue;
            };
            match outcome {
                Ok(content) => {
                    session.policy = resolve_policy(mode, content.csp.as_ref());
                    session.phase = SessionPhase::Ready(content.clone());
                    delegate.recreate_surface(&tool_id, &content);
                }
                Err(err) => {
                    warn!(tool_id = %tool_id, error = %err, "re-materialization after policy flip failed");
                    session.phase = SessionPhase::Failed(err.to_string());
                }
            }
        }
    }
}

/// Build the globals block for one session from host configuration.
pub(crate) fn globals_for(config: &HostConfig, session: &WidgetSession) -> Globals {
    Globals {
        theme: config.theme,
        display_mode: session.display_mode,
        locale: config.locale.clone(),
        max_height: session.max_height.or(config.max_height),
        safe_area: config.safe_area,
        user_agent: UserAgent {
            device: config.device,
            capabilities: config
                .capabilities
                .iter()
                .map(|capability| (capability.clone(), true))
                .collect(),
        },
    }
}
