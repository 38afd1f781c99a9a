//! Error types for the GraphQL link client

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the client
///
/// This enum covers all possible errors that can occur while building a
/// client or dispatching an operation through its link chain.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors surfaced when building a factory
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// graphql-transport-ws protocol errors
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error
    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Convert error to GraphQL error format
    pub fn to_graphql_error(&self) -> GraphQLError {
        GraphQLError {
            message: self.to_string(),
            extensions: self.extensions(),
        }
    }

    /// Get error code for extensions
    fn extensions(&self) -> std::collections::HashMap<String, serde_json::Value> {
        let mut map = std::collections::HashMap::new();
        let code = match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::InvalidRequest(_) => "INVALID_REQUEST",
            Error::Http(_) => "HTTP_ERROR",
            Error::WebSocket(_) => "WEBSOCKET_ERROR",
            Error::Subscription(_) => "SUBSCRIPTION_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Other(_) => "UNKNOWN_ERROR",
        };
        map.insert("code".to_string(), serde_json::json!(code));
        map
    }
}

/// GraphQL error response format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty", default)]
    pub extensions: std::collections::HashMap<String, serde_json::Value>,
}

impl From<Error> for GraphQLError {
    fn from(err: Error) -> Self {
        err.to_graphql_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_maps_to_code() {
        let err = Error::Config("endpoint is required".to_string());
        let gql = err.to_graphql_error();

        assert!(gql.message.contains("endpoint is required"));
        assert_eq!(gql.extensions["code"], serde_json::json!("CONFIG_ERROR"));
    }

    #[test]
    fn wire_shape_round_trips() {
        let gql = GraphQLError {
            message: "boom".to_string(),
            extensions: std::collections::HashMap::new(),
        };
        let json = serde_json::to_value(&gql).expect("serializes");

        assert_eq!(json, serde_json::json!({"message": "boom"}));
    }
}
