//! List screen scenarios against the live mock server.
//!
//! # Design
//! Each test starts the mock server on an ephemeral port inside the test's
//! runtime and drives `TodoListController` over real HTTP. `Switchable`
//! wraps the real transport so a test can take the network away after the
//! list has loaded. `HeldFirst` lets the first request reach the server but
//! holds its response back, so a mutation can land while it is in flight.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use todo_graphql::operations::{CreateTodoVariables, GetTodosVariables};
use todo_graphql::view::{render_list, Panel};
use todo_graphql::{
    ApiError, ClientConfig, CreateTodo, GetTodos, HttpRequest, HttpResponse, MutationOutcome, OperationResult,
    QueryClient, QueryOptions, Todo, TodoListController, Transport, UreqTransport,
};

struct Switchable {
    inner: UreqTransport,
    offline: Arc<AtomicBool>,
}

impl Transport for Switchable {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("network unreachable".to_string()));
        }
        self.inner.execute(request)
    }
}

struct HeldFirst {
    inner: UreqTransport,
    calls: Arc<AtomicUsize>,
    hold: Duration,
}

impl Transport for HeldFirst {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let first = self.calls.fetch_add(1, Ordering::SeqCst) == 0;
        let response = self.inner.execute(request);
        if first {
            std::thread::sleep(self.hold);
        }
        response
    }
}

fn seed() -> Vec<mock_server::Todo> {
    ["Write report", "Water plants", "Call mom"]
        .iter()
        .enumerate()
        .map(|(i, title)| mock_server::Todo {
            id: (i + 1).to_string(),
            title: title.to_string(),
            completed: i == 1,
        })
        .collect()
}

async fn start_server(seed: Vec<mock_server::Todo>) -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run_with(listener, seed));
    ClientConfig::with_endpoint(&format!("http://{addr}/api"))
}

async fn mounted(config: &ClientConfig) -> (TodoListController, Arc<AtomicBool>) {
    let offline = Arc::new(AtomicBool::new(false));
    let transport = Switchable {
        inner: UreqTransport::new(config.timeout()),
        offline: Arc::clone(&offline),
    };
    let client = QueryClient::with_transport(&config.endpoint, transport);
    let mut controller = TodoListController::mount(client);
    let initial = controller.list_settled().await;
    assert!(initial.resolved().is_some(), "initial load failed: {initial:?}");
    (controller, offline)
}

fn titles(todos: &[Todo]) -> Vec<&str> {
    todos.iter().map(|t| t.title.as_str()).collect()
}

#[tokio::test]
async fn initial_render_keeps_server_order() {
    let config = start_server(seed()).await;
    let (controller, _) = mounted(&config).await;

    let items = controller.items().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(titles(&items), ["Write report", "Water plants", "Call mom"]);
}

#[tokio::test]
async fn create_item_appears_after_refresh() {
    let config = start_server(seed()).await;
    let (mut controller, _) = mounted(&config).await;

    controller.set_pending_title("Buy milk");
    assert_eq!(controller.submit().await, MutationOutcome::Applied);
    assert_eq!(controller.pending_title(), "");

    let items = controller.items().unwrap();
    assert_eq!(items.len(), 4);
    let created = items.last().unwrap();
    assert_eq!(created.title, "Buy milk");
    assert!(!created.completed);
    assert_eq!(items.iter().filter(|t| t.title == "Buy milk").count(), 1);
}

#[tokio::test]
async fn create_during_initial_load_is_not_lost() {
    let config = start_server(seed()).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = HeldFirst {
        inner: UreqTransport::new(config.timeout()),
        calls: Arc::clone(&calls),
        hold: Duration::from_millis(400),
    };
    let client = QueryClient::with_transport(&config.endpoint, transport);
    let mut controller = TodoListController::mount(client.clone());
    while calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(controller.create_item("Buy milk").await, MutationOutcome::Applied);
    assert_eq!(controller.items().unwrap().len(), 4);

    // The held three-item response arrives after the refresh.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(controller.items().unwrap().len(), 4);
    let cached = client
        .query_once::<GetTodos>(GetTodosVariables::default(), QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(cached.items().len(), 4);
}

#[tokio::test]
async fn blank_titles_are_skipped() {
    let config = start_server(seed()).await;
    let (mut controller, offline) = mounted(&config).await;
    // Any request would now fail, so Skipped proves nothing was sent.
    offline.store(true, Ordering::SeqCst);

    assert_eq!(controller.create_item("").await, MutationOutcome::Skipped);
    assert_eq!(controller.create_item("   ").await, MutationOutcome::Skipped);
    assert_eq!(controller.items().unwrap().len(), 3);
}

#[tokio::test]
async fn toggle_twice_restores_completed() {
    let config = start_server(seed()).await;
    let (mut controller, _) = mounted(&config).await;
    let original = controller.items().unwrap()[0].clone();

    assert_eq!(controller.toggle_item(&original).await, MutationOutcome::Applied);
    let toggled = controller.items().unwrap()[0].clone();
    assert_eq!(toggled.completed, !original.completed);

    assert_eq!(controller.toggle_item(&toggled).await, MutationOutcome::Applied);
    assert_eq!(controller.items().unwrap()[0], original);
}

#[tokio::test]
async fn delete_item_removes_exactly_one() {
    let config = start_server(seed()).await;
    let (mut controller, _) = mounted(&config).await;

    assert_eq!(controller.delete_item("2").await, MutationOutcome::Applied);
    let items = controller.items().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|t| t.id != "2"));
}

#[tokio::test]
async fn delete_of_unknown_id_fails_without_changes() {
    let config = start_server(seed()).await;
    let (mut controller, _) = mounted(&config).await;

    assert_eq!(controller.delete_item("42").await, MutationOutcome::Failed);
    assert_eq!(controller.items().unwrap().len(), 3);
}

#[tokio::test]
async fn load_once_always_hits_the_network() {
    let config = start_server(seed()).await;
    let (mut controller, _) = mounted(&config).await;
    let other = QueryClient::new(&config);

    let first = controller.load_once().await.clone();
    other
        .mutate::<CreateTodo>(CreateTodoVariables {
            title: "Added elsewhere".to_string(),
            completed: true,
        })
        .await
        .unwrap();
    let second = controller.load_once().await.clone();

    assert_eq!(first.resolved().unwrap().items().len(), 3);
    assert_eq!(second.resolved().unwrap().items().len(), 4);
    assert_ne!(first, second);
    // The subscription saw none of this.
    assert_eq!(controller.items().unwrap().len(), 3);
}

#[tokio::test]
async fn cached_query_once_does_not_see_server_changes() {
    let config = start_server(seed()).await;
    let client = QueryClient::new(&config);
    let other = QueryClient::new(&config);

    let first = client
        .query_once::<GetTodos>(GetTodosVariables::default(), QueryOptions::default())
        .await
        .unwrap();
    other
        .mutate::<CreateTodo>(CreateTodoVariables {
            title: "Unseen".to_string(),
            completed: false,
        })
        .await
        .unwrap();
    let cached = client
        .query_once::<GetTodos>(GetTodosVariables::default(), QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(first, cached);
}

#[tokio::test]
async fn load_once_failure_leaves_subscription_alone() {
    let config = start_server(seed()).await;
    let (mut controller, offline) = mounted(&config).await;
    offline.store(true, Ordering::SeqCst);

    let result = controller.load_once().await;
    let message = result.error().unwrap();
    assert!(!message.is_empty());
    let panel = Panel::new("one-shot", controller.one_shot());
    assert!(panel.body().starts_with("error: "));
    assert_eq!(controller.items().unwrap().len(), 3);
    assert_eq!(render_list(&controller.items().unwrap()), "[ ] Write report\n[x] Water plants\n[ ] Call mom");
}

#[tokio::test]
async fn failed_create_keeps_pending_title() {
    let config = start_server(seed()).await;
    let (mut controller, offline) = mounted(&config).await;
    offline.store(true, Ordering::SeqCst);

    controller.set_pending_title("Buy milk");
    assert_eq!(controller.submit().await, MutationOutcome::Failed);
    assert_eq!(controller.pending_title(), "Buy milk");
    assert_eq!(controller.items().unwrap().len(), 3);
}

#[tokio::test]
async fn deferred_list_loads_on_demand_and_follows_mutations() {
    let config = start_server(seed()).await;
    let (mut controller, _) = mounted(&config).await;
    assert!(controller.deferred().is_none());

    let loaded = controller.load_via_deferred().await;
    assert_eq!(loaded.resolved().unwrap().items().len(), 3);

    controller.create_item("Buy milk").await;
    let deferred = controller.deferred().unwrap();
    assert_eq!(titles(deferred.resolved().unwrap().items()).last(), Some(&"Buy milk"));
}

#[tokio::test]
async fn reload_picks_up_external_changes() {
    let config = start_server(seed()).await;
    let (mut controller, _) = mounted(&config).await;
    let other = QueryClient::new(&config);
    other
        .mutate::<CreateTodo>(CreateTodoVariables {
            title: "From another tab".to_string(),
            completed: false,
        })
        .await
        .unwrap();
    assert_eq!(controller.items().unwrap().len(), 3);

    let reloaded = controller.reload_via_subscription().await;
    assert_eq!(reloaded.resolved().unwrap().items().len(), 4);
}

#[tokio::test]
async fn unreachable_endpoint_fails_the_subscription() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let config = ClientConfig::with_endpoint(&format!("http://{addr}/api"));

    let mut controller = TodoListController::mount(QueryClient::new(&config));
    let result = controller.list_settled().await;
    assert!(matches!(result, OperationResult::Failed(ref message) if !message.is_empty()));
    assert!(controller.items().is_none());
}

#[tokio::test]
async fn dropping_the_controller_releases_subscriptions() {
    let config = start_server(seed()).await;
    let client = QueryClient::new(&config);
    let mut controller = TodoListController::mount(client.clone());
    controller.list_settled().await;
    controller.load_via_deferred().await;
    assert_eq!(client.active_watches(), 2);

    drop(controller);
    assert_eq!(client.active_watches(), 0);
    assert_eq!(client.invalidate("GetTodos").await, 0);
}
