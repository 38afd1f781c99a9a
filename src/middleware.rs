//! Middleware links for the request pipeline

use crate::error::{Error, Result};
use crate::link::{Link, ResponseStream, SharedLink};
use crate::types::Operation;
use http::header::AUTHORIZATION;
use http::HeaderValue;

/// Bearer-token injection middleware
///
/// Holds the token captured when the client was constructed. For every
/// outgoing operation, including subscriptions, sets
/// `authorization: Bearer <token>` on the operation's headers before
/// forwarding it unchanged to the next link; with no token the operation
/// passes through unmodified. Must sit ahead of the connection link in the
/// chain.
pub struct BearerAuth {
    token: Option<String>,
    next: SharedLink,
}

impl BearerAuth {
    /// Create the middleware around a next link
    pub fn new(token: Option<String>, next: SharedLink) -> Self {
        Self { token, next }
    }

    /// The captured token, if any
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[async_trait::async_trait]
impl Link for BearerAuth {
    async fn request(&self, mut operation: Operation) -> Result<ResponseStream> {
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                Error::InvalidRequest("auth token is not a valid header value".to_string())
            })?;
            operation.headers.insert(AUTHORIZATION, value);
        }
        self.next.request(operation).await
    }
}

/// Per-operation debug logging
///
/// Logs each dispatched operation using the `tracing` crate.
pub struct RequestLogging {
    next: SharedLink,
}

impl RequestLogging {
    /// Wrap a next link with logging
    pub fn new(next: SharedLink) -> Self {
        Self { next }
    }
}

#[async_trait::async_trait]
impl Link for RequestLogging {
    async fn request(&self, operation: Operation) -> Result<ResponseStream> {
        tracing::debug!(
            operation = operation.operation_name.as_deref().unwrap_or("<anonymous>"),
            "dispatching GraphQL operation"
        );
        self.next.request(operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::one_shot;
    use crate::types::GraphQLResponse;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Terminating link that records the operation it receives
    struct Capture {
        seen: Arc<Mutex<Option<Operation>>>,
    }

    #[async_trait::async_trait]
    impl Link for Capture {
        async fn request(&self, operation: Operation) -> Result<ResponseStream> {
            *self.seen.lock().unwrap() = Some(operation);
            Ok(one_shot(GraphQLResponse::success(json!(null))))
        }
    }

    fn capture() -> (Arc<Mutex<Option<Operation>>>, SharedLink) {
        let seen = Arc::new(Mutex::new(None));
        let link: SharedLink = Arc::new(Capture { seen: seen.clone() });
        (seen, link)
    }

    #[tokio::test]
    async fn token_sets_bearer_header() {
        let (seen, next) = capture();
        let auth = BearerAuth::new(Some("sesame".to_string()), next);

        auth.request(Operation::new("{ viewer { id } }"))
            .await
            .expect("forwards");

        let forwarded = seen.lock().unwrap().take().expect("operation forwarded");
        assert_eq!(
            forwarded.headers.get(AUTHORIZATION).unwrap(),
            "Bearer sesame"
        );
    }

    #[tokio::test]
    async fn missing_token_leaves_operation_untouched() {
        let (seen, next) = capture();
        let auth = BearerAuth::new(None, next);

        auth.request(Operation::new("{ viewer { id } }"))
            .await
            .expect("forwards");

        let forwarded = seen.lock().unwrap().take().expect("operation forwarded");
        assert!(forwarded.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn invalid_token_is_a_request_error() {
        let (_, next) = capture();
        let auth = BearerAuth::new(Some("bad\ntoken".to_string()), next);

        let result = auth.request(Operation::new("{ viewer { id } }")).await;

        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }
}
