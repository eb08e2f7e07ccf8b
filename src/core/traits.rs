//! Core traits and types for publishing
//!
//! This module defines the contract of the development toolkit the publish
//! flow drives: the per-project server, the publish service and the
//! notification sender. Concrete adapters live in `toolkit` and `notify`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

// ============================================================================
// Project server
// ============================================================================

/// Observed state of the project server for a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerStatus {
    Running,
    NotRunning,
}

/// Options for starting a project server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    /// Reset the bundler cache
    pub reset: bool,
    /// Server is torn down once the caller is done with it
    pub non_persistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<u32>,
}

// ============================================================================
// Publishing
// ============================================================================

/// Publish metadata of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishInfo {
    pub sdk_version: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Build mode requested from the toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Report status only, no artifact is built
    Status,
    Build,
}

/// Target platform of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPlatform {
    All,
    Android,
    Ios,
}

/// Build status query for a release channel / SDK combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatusRequest {
    pub mode: BuildMode,
    pub platform: BuildPlatform,
    pub current: bool,
    pub release_channel: String,
    pub sdk_version: String,
}

impl BuildStatusRequest {
    /// Status-only query for the current project on every platform
    pub fn status_only(release_channel: &str, sdk_version: &str) -> Self {
        Self {
            mode: BuildMode::Status,
            platform: BuildPlatform::All,
            current: true,
            release_channel: release_channel.to_string(),
            sdk_version: sdk_version.to_string(),
        }
    }
}

/// Result of a build status query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatus {
    #[serde(default)]
    pub user_has_built_app_before: bool,
}

/// Options for the publish call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub release_channel: String,
}

/// Bundle published by the toolkit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedBundle {
    pub url: String,
}

// ============================================================================
// Notifications
// ============================================================================

/// Where the published link should be sent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SendTo {
    /// Do not send the link
    #[default]
    None,
    /// Use the recipient saved in user settings, prompting if there is none
    Saved,
    /// Send to this phone number or e-mail address
    Explicit(String),
}

impl SendTo {
    /// Build from the optional-value `--send-to [dest]` flag
    pub fn from_flag(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None => Self::None,
            Some("") => Self::Saved,
            Some(dest) => Self::Explicit(dest.to_string()),
        }
    }
}

/// A resolved phone number or e-mail address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(pub String);

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Lifecycle of the long-lived project server for a directory
#[async_trait]
pub trait ProjectServer: Send + Sync {
    /// Query whether a server is running for `project_dir`
    async fn current_status(&self, project_dir: &Path) -> anyhow::Result<ServerStatus>;

    /// Start a server for `project_dir`
    async fn start(
        &self,
        project_dir: &Path,
        options: &StartOptions,
        verbose: bool,
    ) -> anyhow::Result<()>;

    /// Stop the server for `project_dir`
    async fn stop(&self, project_dir: &Path) -> anyhow::Result<()>;
}

/// Build and publish operations of the toolkit
#[async_trait]
pub trait PublishService: Send + Sync {
    /// Fetch publish metadata (SDK version) for the project
    async fn publish_info(&self, project_dir: &Path) -> anyhow::Result<PublishInfo>;

    /// Query standalone build status without building anything
    async fn build_status(
        &self,
        project_dir: &Path,
        request: &BuildStatusRequest,
    ) -> anyhow::Result<BuildStatus>;

    /// Publish the project bundle
    async fn publish(
        &self,
        project_dir: &Path,
        request: &PublishRequest,
    ) -> anyhow::Result<PublishedBundle>;
}

/// Delivery of the published link to a person
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Resolve a recipient, possibly prompting the user
    async fn recipient(&self, hint: &SendTo) -> anyhow::Result<Option<Recipient>>;

    /// Send `url` to `recipient`
    async fn send_url(&self, url: &str, recipient: &Recipient) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_to_from_flag() {
        assert_eq!(SendTo::from_flag(None), SendTo::None);
        assert_eq!(SendTo::from_flag(Some("")), SendTo::Saved);
        assert_eq!(
            SendTo::from_flag(Some(" dev@example.com ")),
            SendTo::Explicit("dev@example.com".to_string())
        );
    }

    #[test]
    fn test_build_status_request_serialization() {
        let request = BuildStatusRequest::status_only("beta-1", "31.0.0");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["mode"], "status");
        assert_eq!(json["platform"], "all");
        assert_eq!(json["current"], true);
        assert_eq!(json["releaseChannel"], "beta-1");
        assert_eq!(json["sdkVersion"], "31.0.0");
    }

    #[test]
    fn test_start_options_omit_max_workers() {
        let options = StartOptions {
            reset: true,
            non_persistent: true,
            max_workers: None,
        };
        let json = serde_json::to_string(&options).unwrap();

        assert!(json.contains("\"nonPersistent\":true"));
        assert!(!json.contains("maxWorkers"));
    }

    #[test]
    fn test_publish_info_keeps_extra_fields() {
        let info: PublishInfo =
            serde_json::from_str(r#"{"sdkVersion":"31.0.0","slug":"my-app"}"#).unwrap();

        assert_eq!(info.sdk_version, "31.0.0");
        assert_eq!(info.extra["slug"], "my-app");
    }

    #[test]
    fn test_build_status_defaults_to_not_built() {
        let status: BuildStatus = serde_json::from_str("{}").unwrap();
        assert!(!status.user_has_built_app_before);
    }

    #[test]
    fn test_server_status_serialization() {
        let json = serde_json::to_string(&ServerStatus::NotRunning).unwrap();
        assert_eq!(json, r#""not-running""#);
    }
}
