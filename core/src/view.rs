//! Text rendering of the list screen's result panels.

use serde::Serialize;

use crate::result::OperationResult;
use crate::types::Todo;

pub const LOADING_TEXT: &str = "loading...";
pub const IDLE_TEXT: &str = "press the button to fetch data";

/// One result panel. `None` means the panel's fetch has never been
/// requested.
pub struct Panel<'a, T> {
    pub title: &'a str,
    pub result: Option<&'a OperationResult<T>>,
}

impl<'a, T: Serialize> Panel<'a, T> {
    pub fn new(title: &'a str, result: Option<&'a OperationResult<T>>) -> Self {
        Self { title, result }
    }

    pub fn body(&self) -> String {
        match self.result {
            None => IDLE_TEXT.to_string(),
            Some(OperationResult::Pending) => LOADING_TEXT.to_string(),
            Some(OperationResult::Failed(message)) => format!("error: {message}"),
            Some(OperationResult::Resolved(payload)) => serde_json::to_string_pretty(payload)
                .unwrap_or_else(|e| format!("error: {e}")),
        }
    }

    pub fn render(&self) -> String {
        format!("{}\n{}", self.title, self.body())
    }
}

/// Checkbox-style lines, one per todo, in list order.
pub fn render_list(todos: &[Todo]) -> String {
    todos
        .iter()
        .map(|todo| {
            let mark = if todo.completed { 'x' } else { ' ' };
            format!("[{mark}] {}", todo.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
