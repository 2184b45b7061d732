//! Domain DTOs and the GraphQL wire envelope.
//!
//! # Design
//! These types mirror the remote schema but are defined independently from
//! the mock-server crate. Integration tests catch drift between the two.
//! Field names follow the schema's camelCase through serde renames.

use serde::{Deserialize, Serialize};

/// A single todo item. `id` is assigned by the server and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// The subset of a todo returned by `updateTodo`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoPatch {
    pub id: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoPage {
    pub data: Vec<Todo>,
}

/// Response of `GetTodos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodosData {
    pub todos: TodoPage,
}

impl TodosData {
    pub fn items(&self) -> &[Todo] {
        &self.todos.data
    }
}

/// Response of `CreateTodo`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoData {
    pub create_todo: Todo,
}

/// Response of `UpdateTodo`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoData {
    pub update_todo: TodoPatch,
}

/// Response of `DeleteTodo`. The flag is whatever the server acknowledges
/// with; it carries no further meaning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTodoData {
    pub delete_todo: bool,
}

/// Request body sent to the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: serde_json::Value,
    pub operation_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlErrorEntry {
    pub message: String,
}

/// Standard GraphQL response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlErrorEntry>>,
}
