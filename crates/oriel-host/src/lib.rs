//! Host-side bridge for sandboxed, tool-call-produced widgets.
//!
//! A finished tool call carrying a content template becomes a
//! [`WidgetSession`]; the host materializes renderable content through the
//! [`oriel_contract::WidgetContentStore`] collaborator, loads it into one
//! or more isolated rendering surfaces, and mediates every interaction
//! between that untrusted content and host capabilities through the
//! [`oriel_contract::WidgetMessage`] protocol:
//!
//! - display-mode requests pass through device-class policy and a shared
//!   single-owner focus slot,
//! - content heights are negotiated, buffered, clamped, and deduped,
//! - the content-origin security policy is resolved per session and a
//!   global mode flip discards and recreates surfaces,
//! - widget-initiated tool calls are proxied to the host's tool-execution
//!   path with authorization-challenge detection on responses,
//! - checkout negotiations are single-flight per session.
//!
//! No failure in this subsystem stops the rest of the host UI.

pub mod checkout;
pub mod display;
pub mod error;
pub mod height;
pub mod host;
pub mod proxy;
pub mod router;
pub mod security;
pub mod session;

pub use checkout::{CheckoutCollision, CheckoutCoordinator};
pub use display::{effective_mode, Eviction, FocusSlot};
pub use error::HostError;
pub use height::HeightNegotiator;
pub use host::{HostConfig, WidgetHost};
pub use proxy::{parse_challenge, AuthChallenge, CALL_TOOL_UNSUPPORTED};
pub use security::resolve_policy;
pub use session::{SessionPhase, ToolCallBundle, WidgetSession};
