//! Widget presentation model shared between the host runtime and the wire
//! protocol: display modes, device classes, and the globals block pushed to
//! rendering surfaces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Presentation state of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Embedded in the surrounding conversation flow.
    #[default]
    Inline,
    /// Floating picture-in-picture preview.
    Pip,
    /// Full-screen takeover (contained or breakout, per device class).
    Fullscreen,
}

impl DisplayMode {
    /// Whether the mode occupies the shared focus slot.
    pub fn is_expanded(self) -> bool {
        matches!(self, DisplayMode::Pip | DisplayMode::Fullscreen)
    }

    /// Whether the widget may drive its own container height in this mode.
    pub fn auto_resizes(self) -> bool {
        matches!(self, DisplayMode::Inline)
    }
}

/// Device class of the hosting viewport, used to apply containment and
/// coercion rules to display-mode requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Narrow viewport: no floating affordance, fullscreen stays contained.
    Phone,
    /// Constrained viewport: fullscreen stays contained within the layout.
    Tablet,
    /// Spacious viewport: fullscreen may break out to the full display.
    #[default]
    Desktop,
}

impl DeviceClass {
    /// Whether a requested pip must be coerced to fullscreen.
    pub fn coerces_pip(self) -> bool {
        matches!(self, DeviceClass::Phone)
    }

    /// Whether fullscreen is contained within the existing layout frame
    /// rather than breaking out to the full display.
    pub fn contains_fullscreen(self) -> bool {
        matches!(self, DeviceClass::Phone | DeviceClass::Tablet)
    }
}

/// Host color scheme forwarded to widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Safe-area insets of the hosting viewport, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SafeAreaInsets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// User-agent block inside [`Globals`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserAgent {
    /// Device class of the hosting viewport.
    pub device: DeviceClass,
    /// Host capability flags (e.g. `hover`, `touch`).
    pub capabilities: BTreeMap<String, bool>,
}

/// Environment block pushed to a surface via `set_globals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Globals {
    pub theme: Theme,
    pub display_mode: DisplayMode,
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u32>,
    pub safe_area: SafeAreaInsets,
    pub user_agent: UserAgent,
}

/// Host-mediated navigation direction for fullscreen breakout chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationDirection {
    Back,
    Forward,
}

/// Navigation capabilities reported by a surface, host-owned so chrome
/// buttons have a defined state before the surface finishes loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pip_coercion_only_on_phone() {
        assert!(DeviceClass::Phone.coerces_pip());
        assert!(!DeviceClass::Tablet.coerces_pip());
        assert!(!DeviceClass::Desktop.coerces_pip());
    }

    #[test]
    fn fullscreen_containment_by_device() {
        assert!(DeviceClass::Phone.contains_fullscreen());
        assert!(DeviceClass::Tablet.contains_fullscreen());
        assert!(!DeviceClass::Desktop.contains_fullscreen());
    }

    #[test]
    fn only_inline_auto_resizes() {
        assert!(DisplayMode::Inline.auto_resizes());
        assert!(!DisplayMode::Pip.auto_resizes());
        assert!(!DisplayMode::Fullscreen.auto_resizes());
    }
}
