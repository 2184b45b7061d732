//! Error types for the GraphQL client.
//!
//! # Design
//! GraphQL servers usually answer `200 OK` even when an operation fails, so
//! resolver errors get their own `GraphQl` variant, separate from
//! `HttpError` which covers unexpected statuses. `Transport` covers
//! everything that prevented a response from arriving at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The endpoint returned 404.
    #[error("endpoint not found")]
    NotFound,

    /// The endpoint returned a status other than 200 and 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response carried one or more GraphQL errors.
    #[error("graphql error: {0}")]
    GraphQl(String),

    /// The response had neither errors nor data.
    #[error("response contained no data")]
    MissingData,

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The request never produced a response (connection refused, DNS,
    /// timeout).
    #[error("transport failed: {0}")]
    Transport(String),
}
