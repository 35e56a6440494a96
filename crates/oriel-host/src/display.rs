//! Display-mode policy and the shared focus slot.
//!
//! Transition requests from a widget are advisory; the host applies
//! device-class policy before committing. Pip and fullscreen share one
//! host-wide slot, tracked here as an explicit registry rather than
//! ambient global state.

use oriel_contract::{DeviceClass, DisplayMode};

/// Apply device-class policy to a requested mode.
///
/// On a phone-class viewport there is no floating affordance, so a
/// requested pip is coerced to fullscreen.
pub fn effective_mode(requested: DisplayMode, device: DeviceClass) -> DisplayMode {
    match requested {
        DisplayMode::Pip if device.coerces_pip() => DisplayMode::Fullscreen,
        other => other,
    }
}

/// A session that lost the focus slot to a new owner. Its exit is signaled
/// before the new owner acquires the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    /// Session that held the slot.
    pub tool_id: String,
    /// The expanded mode it held (`Pip` or `Fullscreen`).
    pub slot: DisplayMode,
}

/// Host-wide ownership registry for the shared expanded-mode slot.
///
/// Single writer: only the display-mode commit path mutates it. Exactly
/// one session across the whole host may hold pip or fullscreen at a time;
/// claiming either expanded mode evicts the current owner regardless of
/// which expanded mode it holds.
#[derive(Debug, Default)]
pub struct FocusSlot {
    owner: Option<(String, DisplayMode)>,
}

impl FocusSlot {
    /// Current owner of the slot, when it holds the given expanded mode.
    /// `Inline` has no slot.
    pub fn holder(&self, slot: DisplayMode) -> Option<&str> {
        match &self.owner {
            Some((tool_id, held)) if *held == slot => Some(tool_id),
            _ => None,
        }
    }

    /// Claim the slot for `tool_id` in an expanded mode, returning the
    /// previous owner when a different session must exit as a result. A
    /// session moving between pip and fullscreen keeps the slot without an
    /// eviction.
    pub fn claim(&mut self, slot: DisplayMode, tool_id: &str) -> Vec<Eviction> {
        if !slot.is_expanded() {
            return Vec::new();
        }
        let mut evicted = Vec::new();
        if let Some((previous, held)) = self.owner.take() {
            if previous != tool_id {
                evicted.push(Eviction {
                    tool_id: previous,
                    slot: held,
                });
            }
        }
        self.owner = Some((tool_id.to_string(), slot));
        evicted
    }

    /// Release the slot if `tool_id` holds it. Releasing from a session
    /// that holds nothing is a no-op.
    pub fn release(&mut self, tool_id: &str) {
        if self.owner.as_ref().is_some_and(|(owner, _)| owner == tool_id) {
            self.owner = None;
        }
    }
}
