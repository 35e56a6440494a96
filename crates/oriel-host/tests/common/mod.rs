#![allow(dead_code)]

use async_trait::async_trait;
use oriel_host::{ToolCallBundle, WidgetHost};
use oriel_contract::{
    CheckoutRequest, ContentStoreError, DisplayMode, HostDelegate, HostNotification,
    MaterializeRequest, NavigationState, RenderSurface, SurfaceRole, ToolCallOutcome,
    ToolExecutor, ToolExecutorError, WidgetContent, WidgetContentStore,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Recording surface handle.
#[derive(Default)]
pub struct MockSurface {
    pub loads: Mutex<Vec<String>>,
    pub messages: Mutex<Vec<Value>>,
    pub heights: Mutex<Vec<u32>>,
}

impl MockSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages_of_kind(&self, kind: &str) -> Vec<Value> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|message| message["type"] == kind)
            .cloned()
            .collect()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn last_height(&self) -> Option<u32> {
        self.heights.lock().unwrap().last().copied()
    }
}

impl RenderSurface for MockSurface {
    fn load(&self, url: &str) {
        self.loads.lock().unwrap().push(url.to_string());
    }

    fn post_message(&self, message: &Value) {
        self.messages.lock().unwrap().push(message.clone());
    }

    fn set_height(&self, px: u32) {
        self.heights.lock().unwrap().push(px);
    }
}

/// Content store with a switchable canned result.
pub struct MockStore {
    pub result: Mutex<Result<WidgetContent, String>>,
    pub requests: Mutex<Vec<MaterializeRequest>>,
}

impl MockStore {
    pub fn ok(url: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Ok(widget_content(url))),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Err(message.to_string())),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn set_result(&self, result: Result<WidgetContent, String>) {
        *self.result.lock().unwrap() = result;
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl WidgetContentStore for MockStore {
    async fn materialize(
        &self,
        request: MaterializeRequest,
    ) -> Result<WidgetContent, ContentStoreError> {
        self.requests.lock().unwrap().push(request);
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(ContentStoreError::Unavailable)
    }
}

/// Tool executor with a canned outcome and an optional gate so tests can
/// hold a call in flight.
pub struct MockExecutor {
    pub outcome: Mutex<Result<ToolCallOutcome, String>>,
    pub gate: Option<Arc<Notify>>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl MockExecutor {
    pub fn ok(result: Value) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(Ok(ToolCallOutcome {
                result,
                meta: serde_json::Map::new(),
            })),
            gate: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn with_outcome(outcome: Result<ToolCallOutcome, String>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            gate: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn gated(result: Value, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(Ok(ToolCallOutcome {
                result,
                meta: serde_json::Map::new(),
            })),
            gate: Some(gate),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ToolExecutor for MockExecutor {
    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Value,
        _meta: Value,
    ) -> Result<ToolCallOutcome, ToolExecutorError> {
        self.calls
            .lock()
            .unwrap()
            .push((tool_name.to_string(), arguments));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcome
            .lock()
            .unwrap()
            .clone()
            .map_err(ToolExecutorError::Failed)
    }
}

/// Recording host delegate.
#[derive(Default)]
pub struct MockDelegate {
    pub notifications: Mutex<Vec<HostNotification>>,
    pub followups: Mutex<Vec<String>>,
    pub opened: Mutex<Vec<String>>,
    pub modals: Mutex<Vec<(String, String, Value)>>,
    pub checkouts: Mutex<Vec<(String, CheckoutRequest)>>,
    pub mode_changes: Mutex<Vec<(String, DisplayMode)>>,
    pub nav_updates: Mutex<Vec<(String, NavigationState)>>,
    pub closes: Mutex<Vec<String>>,
    pub recreated: Mutex<Vec<(String, WidgetContent)>>,
}

impl MockDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl HostDelegate for MockDelegate {
    fn notify(&self, notification: HostNotification) {
        self.notifications.lock().unwrap().push(notification);
    }

    fn followup_message(&self, message: &str) {
        self.followups.lock().unwrap().push(message.to_string());
    }

    fn open_external(&self, href: &str) {
        self.opened.lock().unwrap().push(href.to_string());
    }

    fn request_modal(&self, tool_id: &str, title: &str, params: &Value) {
        self.modals
            .lock()
            .unwrap()
            .push((tool_id.to_string(), title.to_string(), params.clone()));
    }

    fn begin_checkout(&self, tool_id: &str, request: &CheckoutRequest) {
        self.checkouts
            .lock()
            .unwrap()
            .push((tool_id.to_string(), request.clone()));
    }

    fn display_mode_changed(&self, tool_id: &str, mode: DisplayMode) {
        self.mode_changes
            .lock()
            .unwrap()
            .push((tool_id.to_string(), mode));
    }

    fn navigation_state_changed(&self, tool_id: &str, nav: NavigationState) {
        self.nav_updates
            .lock()
            .unwrap()
            .push((tool_id.to_string(), nav));
    }

    fn close_requested(&self, tool_id: &str) {
        self.closes.lock().unwrap().push(tool_id.to_string());
    }

    fn recreate_surface(&self, tool_id: &str, content: &WidgetContent) {
        self.recreated
            .lock()
            .unwrap()
            .push((tool_id.to_string(), content.clone()));
    }
}

pub fn widget_content(url: &str) -> WidgetContent {
    WidgetContent {
        url: url.to_string(),
        close_widget: false,
        prefers_border: false,
        csp: None,
    }
}

pub fn bundle(tool_id: &str, template: Option<&str>) -> ToolCallBundle {
    ToolCallBundle {
        tool_id: tool_id.to_string(),
        server_id: "srv_1".to_string(),
        tool_name: "render_chart".to_string(),
        input: json!({"rows": 3}),
        output: json!({"points": [1, 2, 3]}),
        response_metadata: None,
        template: template.map(str::to_string),
    }
}

/// Build a host with a ready session `tool_id` and an inline mock surface
/// registered for it.
pub async fn ready_host(
    tool_id: &str,
    store: Arc<MockStore>,
    delegate: Arc<MockDelegate>,
) -> (WidgetHost, Arc<MockSurface>) {
    let mut host = WidgetHost::new(store, delegate);
    host.ensure_session(bundle(tool_id, Some("ui://widget/chart.html"))).await;
    let surface = MockSurface::new();
    host.register_surface(tool_id, SurfaceRole::Inline, surface.clone())
        .unwrap();
    (host, surface)
}

/// Poll until `cond` holds; panics after a bounded wait.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within bounded wait");
}
