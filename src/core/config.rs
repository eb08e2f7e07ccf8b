//! Configuration structures and types for ota-publisher
//!
//! This module provides type-safe configuration management with serde support.

use serde::{Deserialize, Serialize};

/// Default toolkit API endpoint (the local development toolkit service)
pub const DEFAULT_TOOLKIT_URL: &str = "http://localhost:19001/api";

/// Default GraphQL HTTP endpoint used for server-side rendering
pub const DEFAULT_GRAPHQL_HTTP_URL: &str = "http://localhost:19000/graphql";

/// Default GraphQL WebSocket endpoint used by the browser
pub const DEFAULT_GRAPHQL_WS_URL: &str = "ws://localhost:19000/graphql";

/// Default release channel
pub const DEFAULT_RELEASE_CHANNEL: &str = "default";

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublisherConfig {
    /// Schema version
    pub version: String,

    /// Extend from base configuration file (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Toolkit service settings (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolkit: Option<ToolkitConfig>,

    /// GraphQL endpoints (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphql: Option<GraphqlConfig>,

    /// Publish defaults (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishDefaultsConfig>,

    /// Notification settings (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationsConfig>,
}

/// Toolkit service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolkitConfig {
    /// Base URL of the toolkit API
    #[serde(rename = "apiUrl")]
    pub api_url: String,
}

/// GraphQL endpoints for the dev-tools client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphqlConfig {
    #[serde(rename = "httpUrl")]
    pub http_url: String,

    #[serde(rename = "wsUrl")]
    pub ws_url: String,
}

/// Defaults applied to `publish` when the CLI does not override them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PublishDefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none", rename = "releaseChannel")]
    pub release_channel: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "maxWorkers")]
    pub max_workers: Option<u32>,
}

/// Notification settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NotificationsConfig {
    /// Recipient used when `--send-to` is given without a value
    #[serde(skip_serializing_if = "Option::is_none", rename = "sendTo")]
    pub send_to: Option<String>,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_TOOLKIT_URL.to_string(),
        }
    }
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            http_url: DEFAULT_GRAPHQL_HTTP_URL.to_string(),
            ws_url: DEFAULT_GRAPHQL_WS_URL.to_string(),
        }
    }
}

/// Default configuration values
impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            extends: None,
            toolkit: Some(ToolkitConfig::default()),
            graphql: Some(GraphqlConfig::default()),
            publish: Some(PublishDefaultsConfig::default()),
            notifications: None,
        }
    }
}

impl PublisherConfig {
    /// A layer that sets nothing, to be filled in by an override source
    pub fn empty() -> Self {
        Self {
            version: String::new(),
            extends: None,
            toolkit: None,
            graphql: None,
            publish: None,
            notifications: None,
        }
    }

    /// Override layer built from command line flags, `None` when no flag is set
    pub fn publish_overrides(
        release_channel: Option<String>,
        max_workers: Option<u32>,
    ) -> Option<Self> {
        if release_channel.is_none() && max_workers.is_none() {
            return None;
        }

        Some(Self {
            publish: Some(PublishDefaultsConfig {
                release_channel,
                max_workers,
            }),
            ..Self::empty()
        })
    }

    /// Effective toolkit settings
    pub fn toolkit(&self) -> ToolkitConfig {
        self.toolkit.clone().unwrap_or_default()
    }

    /// Effective GraphQL endpoints
    pub fn graphql(&self) -> GraphqlConfig {
        self.graphql.clone().unwrap_or_default()
    }

    /// Effective bundler worker limit
    pub fn max_workers(&self) -> Option<u32> {
        self.publish.as_ref().and_then(|p| p.max_workers)
    }

    /// Effective release channel
    pub fn release_channel(&self) -> &str {
        self.publish
            .as_ref()
            .and_then(|p| p.release_channel.as_deref())
            .unwrap_or(DEFAULT_RELEASE_CHANNEL)
    }
}
