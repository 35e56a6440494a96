//! Single-flight checkout negotiation per widget session.

use thiserror::Error;

/// A second checkout was requested while one is pending. Rejected
/// synchronously; never queued, never retried.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("checkout already in progress")]
pub struct CheckoutCollision;

/// Tracks the at-most-one pending checkout negotiation for a session.
#[derive(Debug, Default)]
pub struct CheckoutCoordinator {
    pending: Option<String>,
}

impl CheckoutCoordinator {
    /// Record a new pending negotiation keyed by the widget's `callId`.
    pub fn begin(&mut self, call_id: impl Into<String>) -> Result<(), CheckoutCollision> {
        if self.pending.is_some() {
            return Err(CheckoutCollision);
        }
        self.pending = Some(call_id.into());
        Ok(())
    }

    /// Take the pending `callId` for the exactly-once response. The session
    /// becomes eligible for a new checkout request afterwards.
    pub fn resolve(&mut self) -> Option<String> {
        self.pending.take()
    }

    /// The `callId` of the pending negotiation, if any.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}
