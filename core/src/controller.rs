//! Orchestration behind the todo list screen.
//!
//! # Design
//! The controller owns three independent views of the list query: the live
//! subscription armed on mount, a lazy subscription armed by the user, and
//! the result of the last one-shot query. Mutations never touch any of them
//! directly. On success they invalidate `GetTodos`, and the refreshed
//! subscriptions are the only way new server state reaches the screen.
//!
//! Mutation failures are logged and reported through `MutationOutcome`; they
//! are never propagated as errors and never change controller state.

use crate::operations::{
    CreateTodo, CreateTodoVariables, DeleteTodo, DeleteTodoVariables, GetTodos, GetTodosVariables, Operation,
    UpdateTodo, UpdateTodoVariables,
};
use crate::query_client::{LazyQuery, QueryClient, QueryOptions, Subscription};
use crate::result::OperationResult;
use crate::types::{Todo, TodosData};

/// What a mutation handler did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server confirmed the change and the list was refreshed.
    Applied,
    /// Input was rejected locally; nothing was sent.
    Skipped,
    /// The request failed. The error has been logged.
    Failed,
}

pub struct TodoListController {
    client: QueryClient,
    variables: GetTodosVariables,
    list: Subscription<GetTodos>,
    deferred: LazyQuery<GetTodos>,
    one_shot: Option<OperationResult<TodosData>>,
    pending_title: String,
}

impl TodoListController {
    /// Build the controller and start the list subscription. The list is
    /// always the first `DEFAULT_PAGE_LIMIT` todos.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(client: QueryClient) -> Self {
        let variables = GetTodosVariables::default();
        let list = Self::load_via_subscription(&client, &variables);
        let deferred = client.watch_lazy::<GetTodos>(variables.clone());
        Self {
            client,
            variables,
            list,
            deferred,
            one_shot: None,
            pending_title: String::new(),
        }
    }

    fn load_via_subscription(client: &QueryClient, variables: &GetTodosVariables) -> Subscription<GetTodos> {
        client.watch::<GetTodos>(variables.clone())
    }

    /// Current state of the mounted subscription.
    pub fn list(&self) -> OperationResult<TodosData> {
        self.list.current()
    }

    /// The todos of the mounted subscription, if it has resolved.
    pub fn items(&self) -> Option<Vec<Todo>> {
        self.list.current().resolved().map(|data| data.items().to_vec())
    }

    /// Wait for the mounted subscription's current fetch to settle.
    pub async fn list_settled(&mut self) -> OperationResult<TodosData> {
        self.list.resolved().await
    }

    pub async fn reload_via_subscription(&mut self) -> OperationResult<TodosData> {
        self.list.refetch().await
    }

    /// One network round trip that skips the cache. The result is kept apart
    /// from the subscription. Failures are logged and recorded, never
    /// returned as errors.
    pub async fn load_once(&mut self) -> &OperationResult<TodosData> {
        let result = self
            .client
            .query_once::<GetTodos>(self.variables.clone(), QueryOptions::network_only())
            .await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "one-shot todo fetch failed");
        }
        self.one_shot.insert(result.into())
    }

    /// Result of the last `load_once`, if any.
    pub fn one_shot(&self) -> Option<&OperationResult<TodosData>> {
        self.one_shot.as_ref()
    }

    pub async fn load_via_deferred(&mut self) -> OperationResult<TodosData> {
        self.deferred.trigger().await
    }

    /// `None` until `load_via_deferred` has been called once.
    pub fn deferred(&self) -> Option<OperationResult<TodosData>> {
        self.deferred.current()
    }

    pub fn pending_title(&self) -> &str {
        &self.pending_title
    }

    pub fn set_pending_title(&mut self, title: &str) {
        self.pending_title = title.to_string();
    }

    /// Create a todo from the pending title.
    pub async fn submit(&mut self) -> MutationOutcome {
        let title = self.pending_title.clone();
        self.create_item(&title).await
    }

    pub async fn create_item(&mut self, title: &str) -> MutationOutcome {
        if title.trim().is_empty() {
            return MutationOutcome::Skipped;
        }
        let variables = CreateTodoVariables {
            title: title.to_string(),
            completed: false,
        };
        match self.client.mutate::<CreateTodo>(variables).await {
            Ok(data) => {
                tracing::debug!(id = %data.create_todo.id, "todo created");
                self.pending_title.clear();
                self.refresh_list().await;
                MutationOutcome::Applied
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to create todo");
                MutationOutcome::Failed
            }
        }
    }

    pub async fn toggle_item(&mut self, item: &Todo) -> MutationOutcome {
        let variables = UpdateTodoVariables {
            id: item.id.clone(),
            completed: !item.completed,
        };
        match self.client.mutate::<UpdateTodo>(variables).await {
            Ok(data) => {
                tracing::debug!(id = %data.update_todo.id, completed = data.update_todo.completed, "todo updated");
                self.refresh_list().await;
                MutationOutcome::Applied
            }
            Err(e) => {
                tracing::error!(error = %e, id = %item.id, "failed to update todo");
                MutationOutcome::Failed
            }
        }
    }

    pub async fn delete_item(&mut self, id: &str) -> MutationOutcome {
        let variables = DeleteTodoVariables { id: id.to_string() };
        match self.client.mutate::<DeleteTodo>(variables).await {
            Ok(_) => {
                tracing::debug!(id, "todo deleted");
                self.refresh_list().await;
                MutationOutcome::Applied
            }
            Err(e) => {
                tracing::error!(error = %e, id, "failed to delete todo");
                MutationOutcome::Failed
            }
        }
    }

    async fn refresh_list(&self) {
        self.client.invalidate(GetTodos::NAME).await;
    }
}
