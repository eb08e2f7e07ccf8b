//! GraphQL client construction
//!
//! [`ClientFactory`] builds a [`Client`] for one of two render contexts:
//!
//! - [`RenderContext::Server`]: single-pass rendering, one-shot HTTP link,
//!   empty cache. This pass produces the state handed to the browser.
//! - [`RenderContext::Browser`]: reconnecting WebSocket subscription link,
//!   cache hydrated from the server pass.
//!
//! Both use [`data_id_from_object`] so entities keep their identity across
//! the handoff.

use super::cache::{NormalizedCache, data_id_from_object};
use crate::core::config::GraphqlConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised by the GraphQL client
#[derive(Error, Debug)]
pub enum GraphqlError {
    #[error("Initial cache state must be an object of entity objects")]
    InvalidCacheState,

    #[error("{0} transport cannot execute one-shot requests")]
    UnsupportedTransport(&'static str),

    #[error("GraphQL request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GraphQL errors: {}", .0.join("; "))]
    Response(Vec<String>),
}

/// Where the client runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
    /// Server-side rendering pass
    Server,
    /// Interactive browser session
    Browser,
}

/// A GraphQL operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlResponseError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponseError {
    message: String,
}

/// One-shot request/response link
#[derive(Debug, Clone)]
pub struct HttpLink {
    uri: String,
    http: reqwest::Client,
}

impl HttpLink {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError> {
        let response: GraphqlResponse = self
            .http
            .post(&self.uri)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.errors.is_empty() {
            return Err(GraphqlError::Response(
                response.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        Ok(response.data.unwrap_or(Value::Null))
    }
}

/// Options of the subscription socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Reconnect automatically when the socket drops
    pub reconnect: bool,
}

/// Persistent subscription link over a WebSocket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketLink {
    uri: String,
    options: SubscriptionOptions,
}

impl WebSocketLink {
    pub fn new(uri: &str, options: SubscriptionOptions) -> Self {
        Self {
            uri: uri.to_string(),
            options,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn options(&self) -> SubscriptionOptions {
        self.options
    }
}

/// Transport of a client
#[derive(Debug, Clone)]
pub enum Link {
    Http(HttpLink),
    WebSocket(WebSocketLink),
}

/// A configured GraphQL client
#[derive(Debug, Clone)]
pub struct Client {
    link: Link,
    cache: NormalizedCache,
    ssr_mode: bool,
}

impl Client {
    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn cache(&self) -> &NormalizedCache {
        &self.cache
    }

    /// Set for clients doing a single non-interactive rendering pass
    pub fn ssr_mode(&self) -> bool {
        self.ssr_mode
    }

    /// Execute a one-shot operation and write its result into the cache
    ///
    /// # Errors
    ///
    /// [`GraphqlError::UnsupportedTransport`] on a WebSocket link, which only
    /// carries subscriptions driven by the browser runtime.
    pub async fn execute(&mut self, request: &GraphqlRequest) -> Result<Value, GraphqlError> {
        let data = match &self.link {
            Link::Http(link) => link.execute(request).await?,
            Link::WebSocket(_) => return Err(GraphqlError::UnsupportedTransport("WebSocket")),
        };

        self.cache.write_result(&data);
        Ok(data)
    }
}

/// Builds clients against configured endpoints
#[derive(Debug, Clone)]
pub struct ClientFactory {
    config: GraphqlConfig,
}

impl ClientFactory {
    pub fn new(config: GraphqlConfig) -> Self {
        Self { config }
    }

    /// Build a client for `context`
    ///
    /// `initial_state` hydrates the browser cache; the server client always
    /// starts empty.
    ///
    /// # Errors
    ///
    /// [`GraphqlError::InvalidCacheState`] when browser state is malformed.
    pub fn create(
        &self,
        initial_state: Option<Value>,
        context: RenderContext,
    ) -> Result<Client, GraphqlError> {
        let cache = NormalizedCache::new(data_id_from_object);

        match context {
            RenderContext::Browser => {
                let cache = match initial_state {
                    Some(state) => cache.restore(state).ok_or(GraphqlError::InvalidCacheState)?,
                    None => cache,
                };

                Ok(Client {
                    link: Link::WebSocket(WebSocketLink::new(
                        &self.config.ws_url,
                        SubscriptionOptions { reconnect: true },
                    )),
                    cache,
                    ssr_mode: false,
                })
            }
            RenderContext::Server => {
                if initial_state.is_some() {
                    tracing::debug!("ignoring initial state for server-side client");
                }

                Ok(Client {
                    link: Link::Http(HttpLink::new(&self.config.http_url)),
                    cache,
                    ssr_mode: true,
                })
            }
        }
    }
}
