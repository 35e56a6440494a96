//! Content-origin security policy types.
//!
//! A policy is bound to a rendering surface at load time; the host never
//! mutates a live surface's policy, it discards and recreates the surface.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Content-origin policy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CspMode {
    /// Any secure-origin resource or connection is allowed.
    #[default]
    Permissive,
    /// Only the widget's self-declared domains are allowed.
    WidgetDeclared,
}

/// Allow-lists a widget declares for itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeclaredDomains {
    #[serde(default)]
    pub connect: Vec<String>,
    #[serde(default)]
    pub resource: Vec<String>,
}

/// CSP report returned by the content store alongside materialized content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetCsp {
    pub mode: CspMode,
    #[serde(default)]
    pub connect_domains: Vec<String>,
    #[serde(default)]
    pub resource_domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_declared: Option<DeclaredDomains>,
}

/// Effective allowed-origin policy for one widget session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityPolicy {
    pub mode: CspMode,
    pub allowed_connect_domains: BTreeSet<String>,
    pub allowed_resource_domains: BTreeSet<String>,
    pub declared_by_widget: Option<DeclaredDomains>,
}

/// A blocked-resource report from a surface's enforcement layer. Recorded
/// for diagnostics only; the enforcement already blocked the action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CspViolation {
    pub directive: String,
    #[serde(default)]
    pub effective_directive: Option<String>,
    #[serde(default)]
    pub blocked_uri: Option<String>,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub line_number: Option<u32>,
    #[serde(default)]
    pub column_number: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}
