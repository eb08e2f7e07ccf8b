//! Error handling for the publish flow
//!
//! Every failure the orchestrator can surface is a [`PublishError`]. Each
//! variant carries a stable code and recovery hints for the CLI.

use thiserror::Error;

/// Main error type for publish operations
#[derive(Error, Debug)]
pub enum PublishError {
    /// Release channel name rejected before any side effect
    #[error(
        "Release channel name can only contain lowercase letters, numbers and special characters . _ and - (got '{channel}')"
    )]
    InvalidReleaseChannel { channel: String },

    /// A call into the toolkit (server, build status, publish...) failed
    #[error("{operation} failed: {message}")]
    Upstream {
        operation: &'static str,
        message: String,
    },

    /// The link could not be delivered to the recipient
    #[error("Failed to send the link to {recipient}: {message}")]
    NotificationDelivery { recipient: String, message: String },

    /// The invoking process was interrupted mid-flow
    #[error("Publish interrupted")]
    Interrupted,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PublishError {
    /// Wrap a collaborator failure for the named operation
    pub fn upstream(operation: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Upstream {
            operation,
            message: error.to_string(),
        }
    }

    /// Check if this error is recoverable by re-running the command
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidReleaseChannel { .. } | Self::Config(_))
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidReleaseChannel { .. } => vec![
                "Use lowercase letters, digits, '.', '_' or '-' only",
                "Start the channel name with a letter or digit",
            ],
            Self::Upstream { .. } => vec![
                "Check the output above for the toolkit error",
                "Check your network connection and try again",
            ],
            Self::NotificationDelivery { .. } => vec![
                "Check the phone number or e-mail address",
                "Share the printed URL manually",
            ],
            Self::Interrupted => vec!["Run the command again"],
            Self::Config(_) => vec![
                "Check .ota-publisher.yaml in the project and home directory",
                "Check the OTA_* environment variables",
            ],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidReleaseChannel { .. } => "INVALID_RELEASE_CHANNEL",
            Self::Upstream { .. } => "UPSTREAM_OPERATION_FAILED",
            Self::NotificationDelivery { .. } => "NOTIFICATION_DELIVERY_FAILED",
            Self::Interrupted => "INTERRUPTED",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_release_channel_error() {
        let error = PublishError::InvalidReleaseChannel {
            channel: "Invalid Channel!".to_string(),
        };

        assert!(!error.is_recoverable());
        assert_eq!(error.code(), "INVALID_RELEASE_CHANNEL");
        assert!(error.to_string().contains("lowercase letters"));
        assert!(error.to_string().contains("Invalid Channel!"));
    }

    #[test]
    fn test_upstream_error_with_message() {
        let error = PublishError::upstream("publish", "Connection refused");

        assert!(error.is_recoverable());
        assert_eq!(error.code(), "UPSTREAM_OPERATION_FAILED");
        assert_eq!(error.to_string(), "publish failed: Connection refused");
    }

    #[test]
    fn test_notification_delivery_error() {
        let error = PublishError::NotificationDelivery {
            recipient: "dev@example.com".to_string(),
            message: "mailbox full".to_string(),
        };

        assert!(error.is_recoverable());
        let actions = error.suggested_actions();
        assert!(actions.iter().any(|a| a.contains("URL manually")));
    }

    #[test]
    fn test_config_error_not_recoverable() {
        let error = PublishError::Config("bad yaml".to_string());

        assert!(!error.is_recoverable());
        assert_eq!(error.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_every_error_has_suggestions() {
        let errors = [
            PublishError::InvalidReleaseChannel {
                channel: "X".to_string(),
            },
            PublishError::upstream("stop server", "boom"),
            PublishError::Interrupted,
            PublishError::Config("x".to_string()),
        ];

        for error in errors {
            assert!(!error.suggested_actions().is_empty(), "{}", error.code());
        }
    }
}
