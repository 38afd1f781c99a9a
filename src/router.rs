//! Operation routing between links
//!
//! A [`SplitLink`] dispatches each outgoing operation to one of two child
//! links based on a predicate over the operation. The factory uses it to
//! send subscription operations to the WebSocket link and everything else
//! to the base connection link.

use crate::error::Result;
use crate::link::{Link, ResponseStream, SharedLink};
use crate::types::Operation;
use async_graphql::parser::parse_query;
use async_graphql::parser::types::OperationType;
use std::sync::Arc;

/// Predicate over an outgoing operation
pub type RoutePredicate = Arc<dyn Fn(&Operation) -> bool + Send + Sync>;

/// Link that routes operations between two child links
pub struct SplitLink {
    predicate: RoutePredicate,
    matched: SharedLink,
    fallback: SharedLink,
}

impl SplitLink {
    /// Create a split link
    ///
    /// Operations for which `predicate` returns true go to `matched`, all
    /// others to `fallback`. Routing is deterministic: the predicate is the
    /// only input.
    pub fn new(
        predicate: impl Fn(&Operation) -> bool + Send + Sync + 'static,
        matched: SharedLink,
        fallback: SharedLink,
    ) -> Self {
        Self {
            predicate: Arc::new(predicate),
            matched,
            fallback,
        }
    }
}

#[async_trait::async_trait]
impl Link for SplitLink {
    async fn request(&self, operation: Operation) -> Result<ResponseStream> {
        if (self.predicate)(&operation) {
            self.matched.request(operation).await
        } else {
            self.fallback.request(operation).await
        }
    }
}

/// Whether the operation's query document declares a subscription
///
/// True iff any top-level operation definition has kind `subscription`.
/// Total over all inputs: an unparseable document or one with no operation
/// definitions is "not a subscription", never an error.
pub fn has_subscription_operation(operation: &Operation) -> bool {
    let Ok(document) = parse_query(&operation.query) else {
        return false;
    };
    document
        .operations
        .iter()
        .any(|(_, definition)| definition.node.ty == OperationType::Subscription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::one_shot;
    use crate::types::GraphQLResponse;
    use futures::StreamExt;
    use serde_json::json;

    /// Terminating link that answers with a fixed tag
    struct Tagged(&'static str);

    #[async_trait::async_trait]
    impl Link for Tagged {
        async fn request(&self, _operation: Operation) -> Result<ResponseStream> {
            Ok(one_shot(GraphQLResponse::success(json!(self.0))))
        }
    }

    async fn route(query: &str) -> serde_json::Value {
        let split = SplitLink::new(
            has_subscription_operation,
            Arc::new(Tagged("ws")),
            Arc::new(Tagged("http")),
        );
        let mut stream = split.request(Operation::new(query)).await.unwrap();
        stream.next().await.unwrap().unwrap().data.unwrap()
    }

    #[test]
    fn detects_subscription_definitions() {
        let subscription = Operation::new("subscription OnTick { tick }");
        let query = Operation::new("query Viewer { viewer { id } }");
        let mutation = Operation::new("mutation Save { save { id } }");

        assert!(has_subscription_operation(&subscription));
        assert!(!has_subscription_operation(&query));
        assert!(!has_subscription_operation(&mutation));
    }

    #[test]
    fn shorthand_and_malformed_documents_are_not_subscriptions() {
        assert!(!has_subscription_operation(&Operation::new(
            "{ viewer { id } }"
        )));
        assert!(!has_subscription_operation(&Operation::new(
            "fragment F on Query { viewer }"
        )));
        assert!(!has_subscription_operation(&Operation::new("not graphql")));
        assert!(!has_subscription_operation(&Operation::new("")));
    }

    #[test]
    fn mixed_documents_route_to_subscription_link() {
        let mixed = Operation::new("query Q { viewer { id } } subscription S { tick }");

        assert!(has_subscription_operation(&mixed));
    }

    #[tokio::test]
    async fn split_routes_by_operation_kind() {
        assert_eq!(route("subscription OnTick { tick }").await, json!("ws"));
        assert_eq!(route("query Viewer { viewer { id } }").await, json!("http"));
        assert_eq!(route("{ viewer { id } }").await, json!("http"));
    }
}
