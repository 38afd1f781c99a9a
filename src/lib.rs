//! # graphql-link-client
//!
//! A composable GraphQL client for server-rendered web applications, built
//! from transport links.
//!
//! ## Features
//!
//! - **Link chain**: operations flow through composable [`Link`]s - auth
//!   middleware ahead of a terminating connection link
//! - **Transport selection**: in-process schema execution on the server,
//!   HTTP otherwise, with subscriptions split off to WebSocket in the
//!   client environment
//! - **Bearer auth from cookies**: the token is read once per client
//!   construction and injected into every outgoing operation, including
//!   WebSocket `connection_init` payloads
//! - **Cache hydration**: server-rendered state seeds the client cache so
//!   rendered data is not re-fetched
//! - **Reconnecting subscriptions**: graphql-transport-ws with capped
//!   exponential backoff
//!
//! ## Main Components
//!
//! - [`ClientFactory`]: configured once, invoked per request/bootstrap.
//! - [`GraphQLClient`]: the constructed client instance.
//! - [`HttpLink`], [`SchemaLink`], [`WebSocketLink`]: terminating links.
//! - [`BearerAuth`], [`SplitLink`]: middleware and routing links.
//!
//! ## Example
//!
//! ```rust,no_run
//! use graphql_link_client::{
//!     ClientFactory, ExecutionEnvironment, Operation, RequestContext,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = ClientFactory::builder()
//!         .endpoint("http://localhost:4000/graphql")
//!         .subscription_endpoint("ws://localhost:4000/graphql/ws")
//!         .build()?;
//!
//!     let ctx = RequestContext::from_cookie_header("token=sesame");
//!     let client = factory.create(ExecutionEnvironment::Server, Some(&ctx), None);
//!
//!     let response = client
//!         .execute(Operation::new("query Viewer { viewer { id } }"))
//!         .await?;
//!     println!("{:?}", response.data);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod cookies;
pub mod error;
pub mod http_link;
pub mod link;
pub mod middleware;
pub mod router;
pub mod schema_link;
pub mod subscription;
pub mod types;

pub use cache::{CacheSnapshot, InMemoryCache};
pub use client::{ClientFactory, ClientFactoryBuilder, ExecutionEnvironment, GraphQLClient};
pub use cookies::{CookieStore, HeaderCookies, MemoryCookies, RequestContext};
pub use error::{Error, GraphQLError, Result};
pub use http_link::{CredentialsMode, HttpLink};
pub use link::{Link, ResponseStream, SharedLink};
pub use middleware::{BearerAuth, RequestLogging};
pub use router::{has_subscription_operation, RoutePredicate, SplitLink};
pub use schema_link::{ContextResolver, OperationContext, SchemaLink};
pub use subscription::{ConnectionParams, SubscriptionClient, WebSocketLink};
pub use types::{GraphQLResponse, Operation};
