//! HTTP connection link

use crate::error::Result;
use crate::link::{one_shot, Link, ResponseStream};
use crate::types::{GraphQLResponse, Operation};
use http::header::COOKIE;

/// Credentials-inclusion policy for the HTTP transport
///
/// Carried verbatim from configuration, matching the fetch `credentials`
/// modes. Whether `SameOrigin`/`Include` actually attach ambient cookies is
/// decided by the injected [`reqwest::Client`] (cookie store on or off);
/// `Omit` additionally strips any `cookie` header from the outgoing
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    /// Never send ambient credentials
    Omit,
    /// Send credentials for same-origin requests (default)
    #[default]
    SameOrigin,
    /// Always send credentials
    Include,
}

impl CredentialsMode {
    /// Wire name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialsMode::Omit => "omit",
            CredentialsMode::SameOrigin => "same-origin",
            CredentialsMode::Include => "include",
        }
    }
}

impl std::fmt::Display for CredentialsMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminating link that POSTs operations to a GraphQL endpoint
///
/// Sends the standard `{query, variables, operationName}` JSON body with
/// the operation's headers. Transport and decode failures surface on the
/// per-operation channel; constructing the link performs no I/O.
pub struct HttpLink {
    endpoint: String,
    credentials: CredentialsMode,
    client: reqwest::Client,
}

impl HttpLink {
    /// Create an HTTP link over a host-supplied client
    pub fn new(
        endpoint: impl Into<String>,
        credentials: CredentialsMode,
        client: reqwest::Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials,
            client,
        }
    }

    /// The endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The configured credentials mode
    pub fn credentials(&self) -> CredentialsMode {
        self.credentials
    }
}

#[async_trait::async_trait]
impl Link for HttpLink {
    async fn request(&self, mut operation: Operation) -> Result<ResponseStream> {
        if self.credentials == CredentialsMode::Omit {
            operation.headers.remove(COOKIE);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            operation = operation.operation_name.as_deref().unwrap_or("<anonymous>"),
            "posting GraphQL operation"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(operation.headers.clone())
            .json(&operation)
            .send()
            .await?
            .error_for_status()?
            .json::<GraphQLResponse>()
            .await?;

        Ok(one_shot(response))
    }
}

impl std::fmt::Debug for HttpLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLink")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_mode_defaults_to_same_origin() {
        assert_eq!(CredentialsMode::default(), CredentialsMode::SameOrigin);
        assert_eq!(CredentialsMode::default().as_str(), "same-origin");
    }

    #[test]
    fn link_records_configuration() {
        let link = HttpLink::new(
            "http://localhost:4000/graphql",
            CredentialsMode::Include,
            reqwest::Client::new(),
        );

        assert_eq!(link.endpoint(), "http://localhost:4000/graphql");
        assert_eq!(link.credentials(), CredentialsMode::Include);
    }
}
