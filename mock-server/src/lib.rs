use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// Incoming GraphQL envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Value,
    #[serde(default)]
    pub operation_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphQlResponse {
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GetTodosVariables {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
struct CreateTodoVariables {
    title: String,
    #[serde(default)]
    completed: bool,
}

#[derive(Deserialize)]
struct UpdateTodoVariables {
    id: String,
    completed: bool,
}

#[derive(Deserialize)]
struct DeleteTodoVariables {
    id: String,
}

/// Insertion-ordered todo storage. Ids are assigned from a counter and never
/// reused.
#[derive(Debug, Default)]
pub struct Store {
    todos: Vec<Todo>,
    next_id: u64,
}

impl Store {
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        let next_id = todos
            .iter()
            .filter_map(|t| t.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self { todos, next_id }
    }

    fn position(&self, id: &str) -> Result<usize, String> {
        self.todos
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| format!("todo {id} not found"))
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Vec::new())
}

pub fn app_with(seed: Vec<Todo>) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::with_todos(seed)));
    Router::new().route("/api", post(graphql)).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, seed: Vec<Todo>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(seed)).await
}

async fn graphql(State(db): State<Db>, Json(request): Json<GraphQlRequest>) -> Json<GraphQlResponse> {
    let name = operation_name(&request).unwrap_or_default();
    tracing::debug!(operation = %name, "graphql request");

    let result = match name.as_str() {
        "GetTodos" => get_todos(&db, request.variables).await,
        "CreateTodo" => create_todo(&db, request.variables).await,
        "UpdateTodo" => update_todo(&db, request.variables).await,
        "DeleteTodo" => delete_todo(&db, request.variables).await,
        "" => Err("operation name is required".to_string()),
        other => Err(format!("unknown operation {other}")),
    };

    Json(match result {
        Ok(data) => GraphQlResponse {
            data: Some(data),
            errors: Vec::new(),
        },
        Err(message) => {
            tracing::warn!(operation = %name, %message, "graphql error");
            GraphQlResponse {
                data: None,
                errors: vec![GraphQlError { message }],
            }
        }
    })
}

/// The explicit `operationName`, or the name declared by the document itself
/// (`query GetTodos(...)`).
pub fn operation_name(request: &GraphQlRequest) -> Option<String> {
    if let Some(name) = &request.operation_name {
        return Some(name.clone());
    }
    let mut words = request.query.split_whitespace();
    match words.next()? {
        "query" | "mutation" => {}
        _ => return None,
    }
    let name: String = words
        .next()?
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

fn variables<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, String> {
    let value = if value.is_null() { json!({}) } else { value };
    serde_json::from_value(value).map_err(|e| format!("invalid variables: {e}"))
}

async fn get_todos(db: &Db, vars: Value) -> Result<Value, String> {
    let vars: GetTodosVariables = variables(vars)?;
    let store = db.read().await;
    let page: Vec<Todo> = store.todos.iter().take(vars.limit).cloned().collect();
    Ok(json!({ "todos": { "data": page } }))
}

async fn create_todo(db: &Db, vars: Value) -> Result<Value, String> {
    let vars: CreateTodoVariables = variables(vars)?;
    let mut store = db.write().await;
    let todo = Todo {
        id: store.next_id.to_string(),
        title: vars.title,
        completed: vars.completed,
    };
    store.next_id += 1;
    store.todos.push(todo.clone());
    Ok(json!({ "createTodo": todo }))
}

async fn update_todo(db: &Db, vars: Value) -> Result<Value, String> {
    let vars: UpdateTodoVariables = variables(vars)?;
    let mut store = db.write().await;
    let index = store.position(&vars.id)?;
    let todo = &mut store.todos[index];
    todo.completed = vars.completed;
    Ok(json!({ "updateTodo": { "id": todo.id, "completed": todo.completed } }))
}

async fn delete_todo(db: &Db, vars: Value) -> Result<Value, String> {
    let vars: DeleteTodoVariables = variables(vars)?;
    let mut store = db.write().await;
    let index = store.position(&vars.id)?;
    store.todos.remove(index);
    Ok(json!({ "deleteTodo": true }))
}
