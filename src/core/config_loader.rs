//! Configuration file loader for ota-publisher
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::PublishError;
use crate::validation::channel_validator::is_valid_release_channel;
use reqwest::Url;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;

/// Configuration file name
const CONFIG_FILENAME: &str = ".ota-publisher.yaml";

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// CLI arguments (highest priority)
    pub cli_args: Option<PublisherConfig>,

    /// Environment variables (`HOME` locates the global config)
    pub env: HashMap<String, String>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "graphql.wsUrl")
    pub field: String,

    /// Error message
    pub message: String,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Project config (./.ota-publisher.yaml)
    /// 4. Global config (~/.ota-publisher.yaml)
    /// 5. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublisherConfig, PublishError> {
        let mut configs: Vec<PublisherConfig> = vec![PublisherConfig::default()];

        if let Some(home) = options.env.get("HOME") {
            let global_path = PathBuf::from(home).join(CONFIG_FILENAME);
            if let Some(global_config) =
                Self::load_config_file(&global_path, &mut HashSet::new()).await?
            {
                configs.push(global_config);
            }
        }

        let project_path = options.project_path.join(CONFIG_FILENAME);
        if let Some(project_config) =
            Self::load_config_file(&project_path, &mut HashSet::new()).await?
        {
            configs.push(project_config);
        }

        if let Some(env_config) = Self::load_env_config(&options.env) {
            configs.push(env_config);
        }

        if let Some(cli_config) = options.cli_args {
            configs.push(cli_config);
        }

        let merged = Self::merge_configs(configs);

        let errors = Self::validate(&merged);
        if let Some(first) = errors.first() {
            return Err(PublishError::Config(format!(
                "{}: {}",
                first.field, first.message
            )));
        }

        tracing::debug!(?merged, "configuration loaded");
        Ok(merged)
    }

    /// Load configuration from YAML file, following `extends`
    ///
    /// `chain` holds the canonical paths already on the current `extends` chain.
    fn load_config_file<'a>(
        file_path: &'a Path,
        chain: &'a mut HashSet<PathBuf>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<PublisherConfig>, PublishError>> + Send + 'a>>
    {
        Box::pin(async move {
            if !file_path.exists() {
                return Ok(None);
            }

            let canonical = fs::canonicalize(file_path).await.map_err(|e| {
                PublishError::Config(format!(
                    "Failed to resolve {}: {}",
                    file_path.display(),
                    e
                ))
            })?;
            if !chain.insert(canonical) {
                return Err(PublishError::Config(format!(
                    "circular extends: {} is already part of the chain",
                    file_path.display()
                )));
            }

            let content = fs::read_to_string(file_path).await.map_err(|e| {
                PublishError::Config(format!(
                    "Failed to read {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            let config: PublisherConfig = serde_yaml::from_str(&content).map_err(|e| {
                PublishError::Config(format!(
                    "Failed to parse {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            if let Some(extends_path) = &config.extends {
                let base_path = file_path
                    .parent()
                    .ok_or_else(|| PublishError::Config("Invalid config file path".to_string()))?
                    .join(extends_path);

                if let Some(base_config) = Self::load_config_file(&base_path, chain).await? {
                    return Ok(Some(Self::merge_configs(vec![base_config, config])));
                }
            }

            Ok(Some(config))
        })
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<PublisherConfig> {
        let mut config = PublisherConfig::empty();
        let mut has_changes = false;

        if let Some(url) = env.get("OTA_TOOLKIT_URL") {
            config.toolkit = Some(ToolkitConfig {
                api_url: url.clone(),
            });
            has_changes = true;
        }

        let http_url = env.get("OTA_GRAPHQL_HTTP_URL");
        let ws_url = env.get("OTA_GRAPHQL_WS_URL");
        if http_url.is_some() || ws_url.is_some() {
            let defaults = GraphqlConfig::default();
            config.graphql = Some(GraphqlConfig {
                http_url: http_url.cloned().unwrap_or(defaults.http_url),
                ws_url: ws_url.cloned().unwrap_or(defaults.ws_url),
            });
            has_changes = true;
        }

        if let Some(channel) = env.get("OTA_RELEASE_CHANNEL") {
            config.publish = Some(PublishDefaultsConfig {
                release_channel: Some(channel.clone()),
                ..Default::default()
            });
            has_changes = true;
        }

        if has_changes { Some(config) } else { None }
    }

    /// Merge multiple configurations with priority
    fn merge_configs(configs: Vec<PublisherConfig>) -> PublisherConfig {
        let mut result = PublisherConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target
    fn merge_into(target: &mut PublisherConfig, source: PublisherConfig) {
        if !source.version.is_empty() {
            target.version = source.version;
        }

        if source.extends.is_some() {
            target.extends = source.extends;
        }

        if source.toolkit.is_some() {
            target.toolkit = source.toolkit;
        }

        if source.graphql.is_some() {
            target.graphql = source.graphql;
        }

        // Publish defaults merge field by field
        if let Some(source_publish) = source.publish {
            let target_publish = target.publish.get_or_insert_with(Default::default);

            if source_publish.release_channel.is_some() {
                target_publish.release_channel = source_publish.release_channel;
            }
            if source_publish.max_workers.is_some() {
                target_publish.max_workers = source_publish.max_workers;
            }
        }

        if let Some(source_notifications) = source.notifications {
            let target_notifications = target.notifications.get_or_insert_with(Default::default);

            if source_notifications.send_to.is_some() {
                target_notifications.send_to = source_notifications.send_to;
            }
        }
    }

    /// Validate a merged configuration
    pub fn validate(config: &PublisherConfig) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if let Some(toolkit) = &config.toolkit {
            Self::validate_url("toolkit.apiUrl", &toolkit.api_url, &["http", "https"], &mut errors);
        }

        if let Some(graphql) = &config.graphql {
            Self::validate_url("graphql.httpUrl", &graphql.http_url, &["http", "https"], &mut errors);
            Self::validate_url("graphql.wsUrl", &graphql.ws_url, &["ws", "wss"], &mut errors);
        }

        if let Some(publish) = &config.publish {
            if let Some(channel) = &publish.release_channel {
                if !is_valid_release_channel(channel) {
                    errors.push(ConfigValidationError {
                        field: "publish.releaseChannel".to_string(),
                        message: format!("'{}' is not a valid release channel name", channel),
                    });
                }
            }
            if publish.max_workers == Some(0) {
                errors.push(ConfigValidationError {
                    field: "publish.maxWorkers".to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }

        errors
    }

    fn validate_url(
        field: &str,
        value: &str,
        schemes: &[&str],
        errors: &mut Vec<ConfigValidationError>,
    ) {
        match Url::parse(value) {
            Ok(url) if schemes.contains(&url.scheme()) => {}
            Ok(url) => errors.push(ConfigValidationError {
                field: field.to_string(),
                message: format!(
                    "unsupported scheme '{}', expected one of {}",
                    url.scheme(),
                    schemes.join(", ")
                ),
            }),
            Err(e) => errors.push(ConfigValidationError {
                field: field.to_string(),
                message: format!("invalid URL '{}': {}", value, e),
            }),
        }
    }
}
