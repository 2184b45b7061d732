//! The four GraphQL operations the todo service understands.
//!
//! Each operation is a unit struct tying a document to its variable and
//! response types, in the style of `graphql_client`'s derived queries. The
//! structs carry no data; binding variables and dispatching is left to
//! `GraphQlClient` and `QueryClient`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{CreateTodoData, DeleteTodoData, TodosData, UpdateTodoData};

/// Page size used by the list query.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read-only; results may be cached.
    Query,
    /// Changes server state; never cached.
    Mutation,
}

/// A named GraphQL document with typed variables and response.
pub trait Operation: Send + Sync + 'static {
    type Variables: Serialize + Clone + Send + Sync + 'static;
    type Response: DeserializeOwned + Clone + Send + Sync + 'static;

    const NAME: &'static str;
    const KIND: OperationKind;
    const DOCUMENT: &'static str;
}

/// Fetch the first page of todos.
pub struct GetTodos;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTodosVariables {
    pub limit: u32,
}

impl Default for GetTodosVariables {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Operation for GetTodos {
    type Variables = GetTodosVariables;
    type Response = TodosData;

    const NAME: &'static str = "GetTodos";
    const KIND: OperationKind = OperationKind::Query;
    const DOCUMENT: &'static str = "query GetTodos($limit: Int!) {
  todos(options: { paginate: { limit: $limit } }) {
    data {
      id
      title
      completed
    }
  }
}";
}

/// Create a todo; the server assigns its id.
pub struct CreateTodo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoVariables {
    pub title: String,
    pub completed: bool,
}

impl Operation for CreateTodo {
    type Variables = CreateTodoVariables;
    type Response = CreateTodoData;

    const NAME: &'static str = "CreateTodo";
    const KIND: OperationKind = OperationKind::Mutation;
    const DOCUMENT: &'static str = "mutation CreateTodo($title: String!, $completed: Boolean!) {
  createTodo(input: { title: $title, completed: $completed }) {
    id
    title
    completed
  }
}";
}

/// Set the completion flag of a todo.
pub struct UpdateTodo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodoVariables {
    pub id: String,
    pub completed: bool,
}

impl Operation for UpdateTodo {
    type Variables = UpdateTodoVariables;
    type Response = UpdateTodoData;

    const NAME: &'static str = "UpdateTodo";
    const KIND: OperationKind = OperationKind::Mutation;
    const DOCUMENT: &'static str = "mutation UpdateTodo($id: ID!, $completed: Boolean!) {
  updateTodo(id: $id, input: { completed: $completed }) {
    id
    completed
  }
}";
}

pub struct DeleteTodo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTodoVariables {
    pub id: String,
}

impl Operation for DeleteTodo {
    type Variables = DeleteTodoVariables;
    type Response = DeleteTodoData;

    const NAME: &'static str = "DeleteTodo";
    const KIND: OperationKind = OperationKind::Mutation;
    const DOCUMENT: &'static str = "mutation DeleteTodo($id: ID!) {
  deleteTodo(id: $id)
}";
}
