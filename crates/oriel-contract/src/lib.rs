//! Shared contracts for the Oriel widget host bridge: wire protocol message
//! unions, the widget data model, the rendering-surface handle, and the
//! collaborator seams the host runtime calls out through.

pub mod collaborator;
pub mod message;
pub mod model;
pub mod security;
pub mod surface;

pub use collaborator::{
    CheckoutRequest, CheckoutTarget, ContentStoreError, HostDelegate, HostNotification,
    MaterializeRequest, ToolCallOutcome, ToolExecutor, ToolExecutorError, WidgetContent,
    WidgetContentStore,
};
pub use message::{HostMessage, WidgetMessage};
pub use model::{
    DeviceClass, DisplayMode, Globals, NavigationDirection, NavigationState, SafeAreaInsets,
    Theme, UserAgent,
};
pub use security::{CspMode, CspViolation, DeclaredDomains, SecurityPolicy, WidgetCsp};
pub use surface::{RenderSurface, SurfaceRole};

/// Response-metadata key carrying an RFC-7235 authorization challenge.
pub const WWW_AUTHENTICATE_META_KEY: &str = "mcp/www_authenticate";
