mod common;

use common::{bundle, widget_content, MockDelegate, MockStore, MockSurface};
use oriel_contract::{CspMode, DeclaredDomains, SurfaceRole, WidgetCsp};
use oriel_host::{HostConfig, SessionPhase, WidgetHost};
use serde_json::json;

fn declared_content(url: &str) -> oriel_contract::WidgetContent {
    let mut content = widget_content(url);
    content.csp = Some(WidgetCsp {
        mode: CspMode::WidgetDeclared,
        connect_domains: vec!["api.example.com".to_string()],
        resource_domains: vec!["cdn.example.com".to_string()],
        header_string: None,
        widget_declared: Some(DeclaredDomains {
            connect: vec!["api.example.com".to_string()],
            resource: vec!["cdn.example.com".to_string()],
        }),
    });
    content
}

#[tokio::test]
async fn policy_is_resolved_at_session_creation() {
    let store = MockStore::ok("https://sandbox.example/widget");
    store.set_result(Ok(declared_content("https://sandbox.example/widget")));
    let mut host = WidgetHost::new(store, MockDelegate::new()).with_config(
        HostConfig::default().with_csp_mode(CspMode::WidgetDeclared),
    );

    host.ensure_session(bundle("call_1", Some("ui://widget/chart.html")))
        .await;

    let policy = host.session("call_1").unwrap().security_policy();
    assert_eq!(policy.mode, CspMode::WidgetDeclared);
    assert!(policy.allowed_connect_domains.contains("api.example.com"));
    assert!(policy.allowed_resource_domains.contains("cdn.example.com"));
}

#[tokio::test]
async fn mode_flip_rematerializes_and_recreates_surfaces() {
    let store = MockStore::ok("https://sandbox.example/widget");
    store.set_result(Ok(declared_content("https://sandbox.example/widget")));
    let delegate = MockDelegate::new();
    let (mut host, old_surface) = common::ready_host("call_1", store.clone(), delegate.clone()).await;
    assert_eq!(store.request_count(), 1);

    host.set_csp_mode(CspMode::WidgetDeclared).await;

    assert_eq!(store.request_count(), 2);
    assert_eq!(
        store.requests.lock().unwrap()[1].csp_mode,
        CspMode::WidgetDeclared
    );
    let recreated = delegate.recreated.lock().unwrap();
    assert_eq!(recreated.len(), 1);
    assert_eq!(recreated[0].0, "call_1");
    drop(recreated);
    assert_eq!(
        host.session("call_1").unwrap().security_policy().mode,
        CspMode::WidgetDeclared
    );

    // The stale surface was detached; pushes no longer reach it.
    let before = old_surface.message_count();
    host.push_widget_state("call_1", json!({"v": 1})).unwrap();
    assert_eq!(old_surface.message_count(), before);

    // A recreated surface loads the re-materialized content.
    let fresh = MockSurface::new();
    host.register_surface("call_1", SurfaceRole::Inline, fresh.clone())
        .unwrap();
    assert_eq!(fresh.loads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn flip_to_the_same_effective_mode_is_a_no_op() {
    let store = MockStore::ok("https://sandbox.example/widget");
    let delegate = MockDelegate::new();
    let (mut host, _surface) = common::ready_host("call_1", store.clone(), delegate.clone()).await;

    host.set_csp_mode(CspMode::Permissive).await;

    assert_eq!(store.request_count(), 1);
    assert!(delegate.recreated.lock().unwrap().is_empty());
}

#[tokio::test]
async fn override_takes_precedence_and_clears_back() {
    let store = MockStore::ok("https://sandbox.example/widget");
    let delegate = MockDelegate::new();
    let (mut host, _surface) = common::ready_host("call_1", store.clone(), delegate.clone()).await;

    host.set_csp_mode_override(Some(CspMode::WidgetDeclared)).await;
    assert_eq!(host.config().effective_csp_mode(), CspMode::WidgetDeclared);
    assert_eq!(store.request_count(), 2);

    // Flipping the global toggle under an override changes nothing.
    host.set_csp_mode(CspMode::WidgetDeclared).await;
    assert_eq!(store.request_count(), 2);

    // Clearing the override now leaves the same effective mode in force.
    host.set_csp_mode_override(None).await;
    assert_eq!(host.config().effective_csp_mode(), CspMode::WidgetDeclared);
    assert_eq!(store.request_count(), 2);
}

#[tokio::test]
async fn failed_rematerialization_fails_the_session() {
    let store = MockStore::ok("https://sandbox.example/widget");
    let delegate = MockDelegate::new();
    let (mut host, _surface) = common::ready_host("call_1", store.clone(), delegate.clone()).await;

    store.set_result(Err("store offline".to_string()));
    host.set_csp_mode(CspMode::WidgetDeclared).await;

    assert_eq!(
        *host.session("call_1").unwrap().phase(),
        SessionPhase::Failed("store offline".to_string())
    );
    assert!(delegate.recreated.lock().unwrap().is_empty());
}
