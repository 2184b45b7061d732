//! Stateless GraphQL request builder and response parser.
//!
//! # Design
//! `GraphQlClient` holds only the endpoint URL and carries no mutable state
//! between calls. `build` turns an operation plus bound variables into an
//! `HttpRequest`; `parse_data` and `decode` consume the `HttpResponse`. The
//! caller executes the round trip in between, so this module stays
//! deterministic and free of I/O.
//!
//! Parsing is split in two because the response cache stores the raw `data`
//! object and decodes it into the typed response on every read.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::operations::Operation;
use crate::types::{GraphQlRequest, GraphQlResponse};

#[derive(Debug, Clone)]
pub struct GraphQlClient {
    endpoint: String,
}

impl GraphQlClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build<O: Operation>(&self, variables: &O::Variables) -> Result<HttpRequest, ApiError> {
        let variables = serde_json::to_value(variables).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let envelope = GraphQlRequest {
            query: O::DOCUMENT.to_string(),
            variables,
            operation_name: O::NAME.to_string(),
        };
        let body = serde_json::to_string(&envelope).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.endpoint.clone(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    /// Extract the `data` object from a GraphQL response.
    pub fn parse_data(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response, 200)?;
        let envelope: GraphQlResponse =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(ApiError::GraphQl(messages.join("; ")));
        }
        match envelope.data {
            Some(Value::Null) | None => Err(ApiError::MissingData),
            Some(data) => Ok(data),
        }
    }

    pub fn decode<O: Operation>(&self, data: Value) -> Result<O::Response, ApiError> {
        serde_json::from_value(data).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse<O: Operation>(&self, response: HttpResponse) -> Result<O::Response, ApiError> {
        let data = self.parse_data(response)?;
        self.decode::<O>(data)
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
