//! The link seam: composable request-handling units
//!
//! A [`Link`] is one unit in a client's request pipeline. Middleware links
//! wrap a next link and forward operations to it; terminating links perform
//! the actual transport work. Every link yields a response stream so that
//! one-shot transports (HTTP, in-process execution) and subscriptions share
//! a single seam: one-shot links produce a single-item stream, subscription
//! links produce one item per server event.

use crate::error::Result;
use crate::types::{GraphQLResponse, Operation};
use futures::{future, stream, Stream};
use std::pin::Pin;
use std::sync::Arc;

/// Stream of responses produced by a link
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<GraphQLResponse>> + Send + 'static>>;

/// Shared handle to a link, as stored in a chain
pub type SharedLink = Arc<dyn Link>;

/// A composable request-handling unit
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use graphql_link_client::{Link, Operation, ResponseStream, Result};
///
/// struct Passthrough {
///     next: graphql_link_client::SharedLink,
/// }
///
/// #[async_trait]
/// impl Link for Passthrough {
///     async fn request(&self, operation: Operation) -> Result<ResponseStream> {
///         self.next.request(operation).await
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Link: Send + Sync {
    /// Dispatch an operation, returning its response stream
    async fn request(&self, operation: Operation) -> Result<ResponseStream>;
}

/// Wrap a single response as a one-item stream
pub fn one_shot(response: GraphQLResponse) -> ResponseStream {
    Box::pin(stream::once(future::ready(Ok(response))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn one_shot_yields_exactly_once() {
        let mut stream = one_shot(GraphQLResponse::success(json!({"ok": true})));

        let first = stream.next().await.expect("one item").expect("no error");
        assert_eq!(first.data, Some(json!({"ok": true})));
        assert!(stream.next().await.is_none());
    }
}
