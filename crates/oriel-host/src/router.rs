//! Inbound message routing: the security chokepoint between untrusted
//! surfaces and host capabilities.
//!
//! Every variant has exactly one handler arm; unknown kinds are dropped at
//! decode time. Messages from one session's channel are handled in the
//! order the embedder delivers them; there is no ordering guarantee across
//! sessions.

use crate::error::HostError;
use crate::host::WidgetHost;
use crate::proxy;
use oriel_contract::{
    CheckoutRequest, CheckoutTarget, HostMessage, SurfaceRole, WidgetMessage,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Whether an `openExternal` href points at the local host and must be
/// ignored.
fn is_loopback_href(href: &str) -> bool {
    match Url::parse(href) {
        Ok(url) => match url.host() {
            Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(url::Host::Ipv4(ip)) => ip.is_loopback() || ip.is_unspecified(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
            None => false,
        },
        // Unparseable hrefs are delegated; the host UI does its own vetting.
        Err(_) => false,
    }
}

impl WidgetHost {
    /// Decode and route a raw message from a surface's channel. Unknown or
    /// malformed payloads are a forward-compatible no-op.
    pub fn handle_raw_message(
        &mut self,
        tool_id: &str,
        origin: SurfaceRole,
        payload: Value,
    ) -> Result<(), HostError> {
        match WidgetMessage::decode(payload) {
            Some(message) => self.handle_message(tool_id, origin, message),
            None => Ok(()),
        }
    }

    /// Route one inbound protocol message from the surface identified by
    /// (`tool_id`, `origin`).
    pub fn handle_message(
        &mut self,
        tool_id: &str,
        origin: SurfaceRole,
        message: WidgetMessage,
    ) -> Result<(), HostError> {
        debug!(
            direction = "widget->host",
            tool_id = %tool_id,
            kind = message.kind(),
            "received widget message"
        );
        if !self.sessions.contains_key(tool_id) {
            return Err(HostError::unknown_session(tool_id));
        }

        match message {
            WidgetMessage::Resize { height } => self.on_resize(tool_id, height),
            WidgetMessage::SetWidgetState {
                tool_id: target,
                state,
            } => self.on_set_widget_state(tool_id, origin, &target, state),
            WidgetMessage::CallTool {
                call_id,
                tool_name,
                args,
                meta,
            } => self.on_call_tool(tool_id, call_id, tool_name, args, meta),
            WidgetMessage::SendFollowup { message } => {
                self.delegate.followup_message(&message);
            }
            WidgetMessage::RequestDisplayMode { mode, max_height } => {
                // Advisory; device policy is applied before committing.
                self.request_display_mode(tool_id, mode, max_height)?;
            }
            WidgetMessage::RequestClose => {
                self.delegate.close_requested(tool_id);
            }
            WidgetMessage::CspViolation { violation } => {
                warn!(
                    tool_id = %tool_id,
                    directive = %violation.directive,
                    blocked_uri = violation.blocked_uri.as_deref().unwrap_or(""),
                    "security-policy violation reported by surface"
                );
                if let Some(session) = self.sessions.get_mut(tool_id) {
                    session.violations.push(violation);
                }
            }
            WidgetMessage::OpenExternal { href } => {
                if is_loopback_href(&href) {
                    debug!(tool_id = %tool_id, href = %href, "ignoring loopback-local openExternal");
                } else {
                    self.delegate.open_external(&href);
                }
            }
            WidgetMessage::RequestCheckout { call_id, session } => {
                self.on_request_checkout(tool_id, origin, call_id, session);
            }
            WidgetMessage::RequestModal { title, params } => {
                self.delegate.request_modal(tool_id, &title, &params);
            }
            WidgetMessage::NavigationStateChanged {
                tool_id: target,
                can_go_back,
                can_go_forward,
            } => self.on_navigation_state_changed(&target, can_go_back, can_go_forward),
        }
        Ok(())
    }

    fn on_resize(&mut self, tool_id: &str, height: f64) {
        let host_max = self.config.max_height;
        let Some(session) = self.sessions.get_mut(tool_id) else {
            return;
        };
        let max = session.max_height.or(host_max);
        if let Some(px) = session.height.negotiate(height, session.display_mode, max) {
            session.channel.set_height(px);
        }
    }

    fn on_set_widget_state(
        &mut self,
        channel_id: &str,
        origin: SurfaceRole,
        target: &str,
        state: Value,
    ) {
        // The toolId field routes state to its logical session; the same
        // widget rendered inline and in a modal shares one session.
        let Some(session) = self.sessions.get_mut(target) else {
            debug!(target = %target, "setWidgetState for unknown session dropped");
            return;
        };
        if !session.store_widget_state(state.clone()) {
            return;
        }
        let push = HostMessage::push_widget_state(target, state);
        if target == channel_id {
            session.channel.send_excluding(&push, origin);
        } else {
            session.channel.send(&push);
        }
    }

    fn on_call_tool(
        &mut self,
        tool_id: &str,
        call_id: String,
        tool_name: String,
        args: Value,
        meta: Value,
    ) {
        let Some(session) = self.sessions.get(tool_id) else {
            return;
        };
        proxy::dispatch_call(
            self.executor.clone(),
            Arc::clone(&self.delegate),
            Arc::clone(&session.channel),
            call_id,
            tool_name,
            args,
            meta,
        );
    }

    fn on_request_checkout(
        &mut self,
        tool_id: &str,
        origin: SurfaceRole,
        call_id: String,
        payload: Value,
    ) {
        let delegate = Arc::clone(&self.delegate);
        let Some(session) = self.sessions.get_mut(tool_id) else {
            return;
        };
        if session.checkout.begin(&call_id).is_err() {
            // Synchronous rejection; never queued, never retried.
            session
                .channel
                .send(&HostMessage::checkout_error(call_id, "checkout already in progress"));
            return;
        }
        let target = match origin {
            SurfaceRole::Inline => CheckoutTarget::Inline,
            SurfaceRole::Modal => CheckoutTarget::Modal,
        };
        delegate.begin_checkout(
            tool_id,
            &CheckoutRequest {
                call_id,
                payload,
                target,
            },
        );
    }

    fn on_navigation_state_changed(
        &mut self,
        target: &str,
        can_go_back: bool,
        can_go_forward: bool,
    ) {
        let delegate = Arc::clone(&self.delegate);
        // Widget-supplied target ids get the same tolerance as
        // setWidgetState: an unknown target is dropped, not an error.
        let Some(session) = self.sessions.get_mut(target) else {
            debug!(target = %target, "navigationStateChanged for unknown session dropped");
            return;
        };
        session.navigation.can_go_back = can_go_back;
        session.navigation.can_go_forward = can_go_forward;
        delegate.navigation_state_changed(target, session.navigation);
    }
}
