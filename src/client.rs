//! Client factory and constructed client instances
//!
//! [`ClientFactory`] is configured once at application startup and invoked
//! per incoming request on the server or once per bootstrap in the client
//! environment. Each invocation captures the auth token, assembles the
//! link chain for the environment, hydrates the cache, and returns an
//! independent [`GraphQLClient`].

use crate::cache::{CacheSnapshot, InMemoryCache};
use crate::cookies::{CookieStore, MemoryCookies, RequestContext};
use crate::error::{Error, Result};
use crate::http_link::{CredentialsMode, HttpLink};
use crate::link::{ResponseStream, SharedLink};
use crate::middleware::BearerAuth;
use crate::router::{has_subscription_operation, SplitLink};
use crate::schema_link::{ContextResolver, SchemaLink};
use crate::subscription::{SubscriptionClient, WebSocketLink};
use crate::types::{GraphQLResponse, Operation};
use async_graphql::dynamic::Schema;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;

/// Where a client is being constructed
///
/// An explicit flag rather than a build-time constant, so both branches are
/// testable in one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionEnvironment {
    /// Server-rendered request handling
    Server,
    /// Client-side runtime (browser-equivalent)
    Browser,
}

/// Factory producing ready-to-use GraphQL clients
///
/// Immutable for the process lifetime; every [`create`](Self::create) call
/// is independent and reentrant.
pub struct ClientFactory {
    endpoint: String,
    subscription_endpoint: String,
    http_client: reqwest::Client,
    credentials: CredentialsMode,
    auth_cookie: String,
    schema: Option<Schema>,
    context: Option<ContextResolver>,
    document_cookies: Arc<dyn CookieStore>,
}

impl ClientFactory {
    /// Create a new factory builder
    pub fn builder() -> ClientFactoryBuilder {
        ClientFactoryBuilder::new()
    }

    /// The HTTP GraphQL endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The WebSocket subscription endpoint
    pub fn subscription_endpoint(&self) -> &str {
        &self.subscription_endpoint
    }

    /// Construct a client for one request (server) or one bootstrap
    /// (browser environment)
    ///
    /// The construction sequence is synchronous and performs no network
    /// I/O; transports dial lazily per operation.
    ///
    /// 1. Capture the auth token: from the request context's cookies on the
    ///    server, from the ambient document store in the browser branch.
    /// 2. Pick the base connection link: in-process schema execution when a
    ///    schema is configured and this is the server, HTTP otherwise.
    /// 3. Browser only: wrap the base link in a split router that sends
    ///    subscription operations to a WebSocket link whose connection
    ///    params re-send the captured token on every (re)connect.
    /// 4. Put the bearer middleware ahead of the connection link and attach
    ///    a cache hydrated from `initial_state`.
    pub fn create(
        &self,
        environment: ExecutionEnvironment,
        ctx: Option<&RequestContext>,
        initial_state: Option<CacheSnapshot>,
    ) -> GraphQLClient {
        let token = match environment {
            ExecutionEnvironment::Server => ctx.and_then(|ctx| ctx.cookie(&self.auth_cookie)),
            ExecutionEnvironment::Browser => self.document_cookies.get(&self.auth_cookie),
        };

        let connection: SharedLink = match (&self.schema, environment) {
            (Some(schema), ExecutionEnvironment::Server) => {
                let context = self.context.as_ref().map(|resolver| resolver.resolve(ctx));
                Arc::new(SchemaLink::new(schema.clone(), context))
            }
            _ => Arc::new(HttpLink::new(
                &self.endpoint,
                self.credentials,
                self.http_client.clone(),
            )),
        };

        let connection: SharedLink = match environment {
            ExecutionEnvironment::Browser => {
                let captured = token.clone();
                let subscription = SubscriptionClient::new(&self.subscription_endpoint)
                    .connection_params(move || match &captured {
                        Some(token) => json!({"authorization": format!("Bearer {token}")}),
                        None => json!({}),
                    });
                let ws: SharedLink = Arc::new(WebSocketLink::new(subscription));
                Arc::new(SplitLink::new(has_subscription_operation, ws, connection))
            }
            ExecutionEnvironment::Server => connection,
        };

        let link: SharedLink = Arc::new(BearerAuth::new(token, connection));
        let cache = InMemoryCache::new().restore(initial_state.unwrap_or_default());

        GraphQLClient { link, cache }
    }
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("endpoint", &self.endpoint)
            .field("subscription_endpoint", &self.subscription_endpoint)
            .field("credentials", &self.credentials)
            .field("auth_cookie", &self.auth_cookie)
            .field("schema", &self.schema.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`ClientFactory`]
pub struct ClientFactoryBuilder {
    endpoint: Option<String>,
    subscription_endpoint: Option<String>,
    http_client: Option<reqwest::Client>,
    credentials: CredentialsMode,
    auth_cookie: String,
    schema: Option<Schema>,
    context: Option<ContextResolver>,
    document_cookies: Option<Arc<dyn CookieStore>>,
}

impl ClientFactoryBuilder {
    /// Create a builder with the default credentials mode and auth cookie
    pub fn new() -> Self {
        Self {
            endpoint: None,
            subscription_endpoint: None,
            http_client: None,
            credentials: CredentialsMode::default(),
            auth_cookie: "token".to_string(),
            schema: None,
            context: None,
            document_cookies: None,
        }
    }

    /// HTTP GraphQL endpoint URL (required)
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// WebSocket subscription endpoint URL (required)
    pub fn subscription_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.subscription_endpoint = Some(endpoint.into());
        self
    }

    /// Host-supplied HTTP client used by the HTTP link
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Credentials mode passed to the HTTP transport
    pub fn credentials(mut self, credentials: CredentialsMode) -> Self {
        self.credentials = credentials;
        self
    }

    /// Name of the cookie holding the bearer token
    pub fn auth_cookie(mut self, name: impl Into<String>) -> Self {
        self.auth_cookie = name.into();
        self
    }

    /// Executable schema enabling in-process server-side execution
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Context for in-process execution
    pub fn context(mut self, context: impl Into<ContextResolver>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Ambient cookie store for the browser branch
    pub fn document_cookies(mut self, cookies: Arc<dyn CookieStore>) -> Self {
        self.document_cookies = Some(cookies);
        self
    }

    /// Build the factory
    ///
    /// Fails fast with a configuration error when either endpoint is
    /// missing or empty; no client object exists at that point.
    pub fn build(self) -> Result<ClientFactory> {
        let endpoint = match self.endpoint {
            Some(endpoint) if !endpoint.is_empty() => endpoint,
            _ => return Err(Error::Config("endpoint is required".to_string())),
        };
        let subscription_endpoint = match self.subscription_endpoint {
            Some(endpoint) if !endpoint.is_empty() => endpoint,
            _ => {
                return Err(Error::Config(
                    "subscription endpoint is required".to_string(),
                ))
            }
        };

        Ok(ClientFactory {
            endpoint,
            subscription_endpoint,
            http_client: self.http_client.unwrap_or_default(),
            credentials: self.credentials,
            auth_cookie: self.auth_cookie,
            schema: self.schema,
            context: self.context,
            document_cookies: self
                .document_cookies
                .unwrap_or_else(|| Arc::new(MemoryCookies::new())),
        })
    }
}

impl Default for ClientFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A constructed GraphQL client
///
/// Holds the link chain and the cache for one factory invocation. The auth
/// token is captured at construction and never refreshed: if the token
/// changes mid-session, construct a new client to pick it up.
pub struct GraphQLClient {
    link: SharedLink,
    cache: InMemoryCache,
}

impl GraphQLClient {
    /// Execute a one-shot operation (query or mutation)
    pub async fn execute(&self, operation: Operation) -> Result<GraphQLResponse> {
        let mut stream = self.link.request(operation).await?;
        match stream.next().await {
            Some(result) => result,
            None => Err(Error::InvalidRequest(
                "transport returned no response".to_string(),
            )),
        }
    }

    /// Start a subscription, returning its event stream
    pub async fn subscribe(&self, operation: Operation) -> Result<ResponseStream> {
        self.link.request(operation).await
    }

    /// The client's cache
    pub fn cache(&self) -> &InMemoryCache {
        &self.cache
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_without_endpoint_fails_fast() {
        let result = ClientFactory::builder()
            .subscription_endpoint("ws://localhost:4000/graphql/ws")
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn build_without_subscription_endpoint_fails_fast() {
        let result = ClientFactory::builder()
            .endpoint("http://localhost:4000/graphql")
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn build_with_empty_endpoint_fails_fast() {
        let result = ClientFactory::builder()
            .endpoint("")
            .subscription_endpoint("ws://localhost:4000/graphql/ws")
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn create_hydrates_cache_from_initial_state() {
        let factory = ClientFactory::builder()
            .endpoint("http://localhost:4000/graphql")
            .subscription_endpoint("ws://localhost:4000/graphql/ws")
            .build()
            .expect("valid configuration");

        let mut initial_state = CacheSnapshot::new();
        initial_state.insert("Query".to_string(), json!({"field": "value"}));

        let client = factory.create(ExecutionEnvironment::Browser, None, Some(initial_state));

        assert_eq!(client.cache().read("Query"), Some(json!({"field": "value"})));
    }

    #[test]
    fn create_without_initial_state_yields_empty_cache() {
        let factory = ClientFactory::builder()
            .endpoint("http://localhost:4000/graphql")
            .subscription_endpoint("ws://localhost:4000/graphql/ws")
            .build()
            .expect("valid configuration");

        let client = factory.create(ExecutionEnvironment::Server, None, None);

        assert!(client.cache().is_empty());
    }

    #[test]
    fn factory_records_endpoints() {
        let factory = ClientFactory::builder()
            .endpoint("http://localhost:4000/graphql")
            .subscription_endpoint("ws://localhost:4000/graphql/ws")
            .auth_cookie("session")
            .build()
            .expect("valid configuration");

        assert_eq!(factory.endpoint(), "http://localhost:4000/graphql");
        assert_eq!(
            factory.subscription_endpoint(),
            "ws://localhost:4000/graphql/ws"
        );
    }
}
