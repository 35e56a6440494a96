//! Security-policy resolution.
//!
//! The effective policy is computed from the host's global mode (with an
//! optional diagnostics/playground override) and the widget's own declared
//! allow-lists. It is resolved once per session creation and again on every
//! mode flip; a flip always discards and recreates the rendering surface,
//! because the policy is bound at load time.

use oriel_contract::{CspMode, SecurityPolicy, WidgetCsp};
use std::collections::BTreeSet;

/// Compute the effective policy for a session.
///
/// `Permissive` places no host-side domain restriction (any secure origin);
/// `WidgetDeclared` restricts to exactly the widget's self-declared
/// domains, which is the empty set when the widget declared nothing.
pub fn resolve_policy(mode: CspMode, csp: Option<&WidgetCsp>) -> SecurityPolicy {
    let declared = csp.and_then(|report| report.widget_declared.clone());
    let (connect, resource) = match (mode, &declared) {
        (CspMode::Permissive, _) => (BTreeSet::new(), BTreeSet::new()),
        (CspMode::WidgetDeclared, Some(domains)) => (
            domains.connect.iter().cloned().collect(),
            domains.resource.iter().cloned().collect(),
        ),
        (CspMode::WidgetDeclared, None) => (BTreeSet::new(), BTreeSet::new()),
    };
    SecurityPolicy {
        mode,
        allowed_connect_domains: connect,
        allowed_resource_domains: resource,
        declared_by_widget: declared,
    }
}
