//! In-process schema execution link
//!
//! When the factory is configured with an executable schema and invoked on
//! the server, operations resolve against the local schema instead of going
//! over the wire. The resolved context value is exposed to resolvers as
//! request data.

use crate::cookies::RequestContext;
use crate::error::Result;
use crate::link::{one_shot, Link, ResponseStream};
use crate::types::{GraphQLResponse, Operation};
use async_graphql::dynamic::Schema;
use async_graphql::Variables;
use std::collections::HashMap;
use std::sync::Arc;

/// Context for in-process execution: a fixed value, or a function of the
/// per-request execution context producing one
#[derive(Clone)]
pub enum ContextResolver {
    /// Use this value for every invocation
    Value(serde_json::Value),
    /// Derive the value from the (optional) request context
    Resolver(Arc<dyn Fn(Option<&RequestContext>) -> serde_json::Value + Send + Sync>),
}

impl ContextResolver {
    /// Wrap a function of the request context
    pub fn from_fn(
        f: impl Fn(Option<&RequestContext>) -> serde_json::Value + Send + Sync + 'static,
    ) -> Self {
        Self::Resolver(Arc::new(f))
    }

    /// Resolve against a request context, once per factory invocation
    pub fn resolve(&self, ctx: Option<&RequestContext>) -> serde_json::Value {
        match self {
            ContextResolver::Value(value) => value.clone(),
            ContextResolver::Resolver(f) => f(ctx),
        }
    }
}

impl From<serde_json::Value> for ContextResolver {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl std::fmt::Debug for ContextResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextResolver::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ContextResolver::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Resolved context value, available to resolvers via request data
#[derive(Debug, Clone)]
pub struct OperationContext(pub serde_json::Value);

/// Terminating link that executes operations against a local schema
pub struct SchemaLink {
    schema: Schema,
    context: Option<serde_json::Value>,
}

impl SchemaLink {
    /// Create a schema link with an optional resolved context value
    pub fn new(schema: Schema, context: Option<serde_json::Value>) -> Self {
        Self { schema, context }
    }

    /// The resolved context value, if any
    pub fn context(&self) -> Option<&serde_json::Value> {
        self.context.as_ref()
    }
}

#[async_trait::async_trait]
impl Link for SchemaLink {
    async fn request(&self, operation: Operation) -> Result<ResponseStream> {
        let variables = serde_json::Value::Object(operation.variables.into_iter().collect());
        let mut request =
            async_graphql::Request::new(operation.query).variables(Variables::from_json(variables));
        request.operation_name = operation.operation_name;
        if let Some(context) = &self.context {
            request = request.data(OperationContext(context.clone()));
        }

        let response = self.schema.execute(request).await;
        Ok(one_shot(convert_response(response)?))
    }
}

fn convert_response(response: async_graphql::Response) -> Result<GraphQLResponse> {
    let data = match response.data {
        async_graphql::Value::Null => None,
        value => Some(serde_json::to_value(value)?),
    };
    let errors = response
        .errors
        .into_iter()
        .map(|err| crate::error::GraphQLError {
            message: err.message,
            extensions: err
                .extensions
                .as_ref()
                .and_then(|ext| serde_json::to_value(ext).ok())
                .and_then(|value| {
                    serde_json::from_value::<HashMap<String, serde_json::Value>>(value).ok()
                })
                .unwrap_or_default(),
        })
        .collect();
    Ok(GraphQLResponse { data, errors })
}
