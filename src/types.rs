//! Type definitions for GraphQL operations and responses

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An outgoing GraphQL operation
///
/// Carries the query document, optional operation name, variables, and a
/// per-operation header map that middleware links may modify before the
/// connection link dispatches the request. The header map is request
/// context only and is never part of the wire body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// GraphQL query document
    pub query: String,

    /// Operation name (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    /// Variables for the operation
    pub variables: HashMap<String, serde_json::Value>,

    /// Per-operation request headers, set by middleware links
    #[serde(skip)]
    pub headers: http::HeaderMap,
}

impl Operation {
    /// Create a new operation from a query document
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
            variables: HashMap::new(),
            headers: http::HeaderMap::new(),
        }
    }

    /// Set the operation name
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Add a single variable
    pub fn variable(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Replace all variables
    pub fn variables(mut self, variables: HashMap<String, serde_json::Value>) -> Self {
        self.variables = variables;
        self
    }
}

/// GraphQL response from a transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLResponse {
    /// Response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Errors if any
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<crate::error::GraphQLError>,
}

impl GraphQLResponse {
    /// Create a successful response
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Create an error response
    pub fn error(error: crate::error::GraphQLError) -> Self {
        Self {
            data: None,
            errors: vec![error],
        }
    }

    /// Create an error response from multiple errors
    pub fn errors(errors: Vec<crate::error::GraphQLError>) -> Self {
        Self { data: None, errors }
    }

    /// Whether the response carries any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operation_serializes_wire_body() {
        let mut operation = Operation::new("query Viewer($id: ID!) { viewer(id: $id) { id } }")
            .operation_name("Viewer")
            .variable("id", json!("42"));
        operation
            .headers
            .insert(http::header::AUTHORIZATION, "Bearer t".parse().unwrap());

        let body = serde_json::to_value(&operation).expect("serializes");

        assert_eq!(body["operationName"], json!("Viewer"));
        assert_eq!(body["variables"], json!({"id": "42"}));
        // Headers are request context, never part of the body.
        assert!(body.get("headers").is_none());
    }

    #[test]
    fn anonymous_operation_omits_name() {
        let body = serde_json::to_value(Operation::new("{ viewer { id } }")).expect("serializes");

        assert!(body.get("operationName").is_none());
        assert_eq!(body["variables"], json!({}));
    }

    #[test]
    fn response_deserializes_standard_shape() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": {"viewer": {"id": "1"}},
            "errors": [{"message": "partial failure"}]
        }))
        .expect("deserializes");

        assert_eq!(response.data.as_ref().unwrap()["viewer"]["id"], json!("1"));
        assert!(response.has_errors());
    }
}
