//! GraphQL data-access layer for the todo service.
//!
//! # Overview
//! Four fixed operations (list, create, update, delete) are sent to a single
//! GraphQL endpoint. Results are observed three ways: a live subscription
//! that re-emits whenever it is refreshed, a lazy subscription that waits for
//! an explicit trigger, and a one-shot query that can bypass the cache.
//!
//! # Design
//! - `GraphQlClient` is stateless: it builds `HttpRequest` values and parses
//!   `HttpResponse` values without touching the network.
//! - A `Transport` performs the blocking round trip; `QueryClient` runs it on
//!   the blocking pool so callers stay asynchronous.
//! - `QueryClient` owns the response cache and the subscription registry and
//!   is passed explicitly to whoever needs it.
//! - `TodoListController` wires the three fetch modes and the mutations
//!   together. Every successful mutation invalidates the list query; there
//!   is no optimistic local merge.

pub mod cache;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod operations;
pub mod query_client;
pub mod result;
pub mod transport;
pub mod types;
pub mod view;

pub use cache::ResponseCache;
pub use client::GraphQlClient;
pub use config::ClientConfig;
pub use controller::{MutationOutcome, TodoListController};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use operations::{CreateTodo, DeleteTodo, GetTodos, Operation, OperationKind, UpdateTodo};
pub use query_client::{LazyQuery, QueryClient, QueryOptions, Subscription};
pub use result::OperationResult;
pub use transport::{Transport, UreqTransport};
pub use types::{Todo, TodoPatch};
