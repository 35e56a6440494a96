//! Imperative handle to an isolated rendering surface.
//!
//! The host owns and lifecycle-manages surface handles; a handle never
//! references back into the session that owns it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which host slot a surface occupies. The same logical widget may be
/// rendered inline and in a modal at the same time; both handles belong to
/// one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceRole {
    Inline,
    Modal,
}

/// Imperative handle to an isolated execution context hosting a widget.
///
/// All methods are fire-and-forget: the surface communicates back to the
/// host exclusively through its message channel, never through return
/// values.
pub trait RenderSurface: Send + Sync {
    /// Navigate the surface to a content address.
    fn load(&self, url: &str);

    /// Post an encoded host message into the surface.
    fn post_message(&self, message: &Value);

    /// Apply a container height, in pixels.
    fn set_height(&self, px: u32);
}
