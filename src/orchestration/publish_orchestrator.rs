//! Publish Orchestrator - Main driver of the publish command
//!
//! Manages the complete publish workflow:
//! - Release channel validation
//! - Reusing or starting the project server
//! - Recipient resolution and standalone build compatibility check
//! - Publishing, reporting the URL and sending it to the recipient
//! - Stopping a server this invocation started, on every exit path

use crate::core::error::PublishError;
use crate::core::traits::{
    BuildStatusRequest, NotificationSender, ProjectServer, PublishRequest, PublishService,
    SendTo, ServerStatus, StartOptions,
};
use crate::core::config::DEFAULT_RELEASE_CHANNEL;
use crate::ui::reporter::PublishReporter;
use crate::validation::channel_validator::validate_release_channel;
use crate::validation::sdk_version::sdk_label;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;

const PUBLISHING_LIMITATIONS_URL: &str =
    "https://docs.expo.io/versions/latest/guides/publishing.html#limitations";

/// Publishing options passed from CLI or config
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Reset the bundler cache when starting a server
    pub clear: bool,

    /// Who to send the published link to
    pub send_to: SendTo,

    /// Replace verbose packager output with a spinner
    pub quiet: bool,

    /// Release channel to publish to
    pub release_channel: String,

    /// Maximum number of bundler workers for a server we start
    pub max_workers: Option<u32>,

    /// Set when called from a standalone build pipeline
    pub during_build: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            clear: false,
            send_to: SendTo::None,
            quiet: false,
            release_channel: DEFAULT_RELEASE_CHANNEL.to_string(),
            max_workers: None,
            during_build: false,
        }
    }
}

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub url: String,
    pub user_has_built_app_before: bool,
    pub release_channel: String,
    pub published_at: DateTime<Utc>,
}

/// Obligation to stop a project server this invocation started
struct OwnedServer {
    server: Arc<dyn ProjectServer>,
    project_dir: PathBuf,
}

impl OwnedServer {
    /// Stop the server and combine the stop outcome with the flow outcome
    ///
    /// A flow error always wins over a stop error.
    async fn release<T>(self, outcome: Result<T, PublishError>) -> Result<T, PublishError> {
        tracing::debug!(project_dir = %self.project_dir.display(), "stopping project server we started");
        let stopped = self.server.stop(&self.project_dir).await;

        match (outcome, stopped) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(PublishError::upstream("stop project server", e)),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(e)) => {
                tracing::warn!(error = %e, "failed to stop project server");
                Err(error)
            }
        }
    }
}

/// Stops the quiet-mode progress indicator when dropped
struct QuietProgress<'a> {
    reporter: &'a dyn PublishReporter,
}

impl<'a> QuietProgress<'a> {
    fn start(reporter: &'a dyn PublishReporter) -> Self {
        reporter.progress_started();
        Self { reporter }
    }
}

impl Drop for QuietProgress<'_> {
    fn drop(&mut self) {
        self.reporter.progress_finished();
    }
}

/// Main publish orchestrator
pub struct PublishOrchestrator {
    server: Arc<dyn ProjectServer>,
    service: Arc<dyn PublishService>,
    notifier: Arc<dyn NotificationSender>,
    reporter: Arc<dyn PublishReporter>,
}

impl PublishOrchestrator {
    /// Create a new PublishOrchestrator
    pub fn new(
        server: Arc<dyn ProjectServer>,
        service: Arc<dyn PublishService>,
        notifier: Arc<dyn NotificationSender>,
        reporter: Arc<dyn PublishReporter>,
    ) -> Self {
        Self {
            server,
            service,
            notifier,
            reporter,
        }
    }

    /// Publish the project in `project_dir`
    ///
    /// # Errors
    ///
    /// - [`PublishError::InvalidReleaseChannel`] before any side effect
    /// - [`PublishError::Upstream`] when a toolkit call fails
    pub async fn publish(
        &self,
        project_dir: &Path,
        options: &PublishOptions,
    ) -> Result<PublishResult, PublishError> {
        self.publish_until(project_dir, options, std::future::pending())
            .await
    }

    /// Publish, abandoning the flow when `shutdown` completes first
    ///
    /// A server started by this call is stopped whether the flow succeeds,
    /// fails or is interrupted.
    pub async fn publish_until<F>(
        &self,
        project_dir: &Path,
        options: &PublishOptions,
        shutdown: F,
    ) -> Result<PublishResult, PublishError>
    where
        F: Future<Output = ()>,
    {
        validate_release_channel(&options.release_channel)?;

        let span = tracing::info_span!(
            "publish",
            invocation = %uuid::Uuid::new_v4(),
            project_dir = %project_dir.display(),
            channel = %options.release_channel,
        );

        async move {
            let mut owned: Option<OwnedServer> = None;

            let outcome = tokio::select! {
                result = self.run(project_dir, options, &mut owned) => result,
                _ = shutdown => {
                    tracing::warn!("interrupted, abandoning publish");
                    Err(PublishError::Interrupted)
                }
            };

            match owned {
                Some(server) => server.release(outcome).await,
                None => outcome,
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        project_dir: &Path,
        options: &PublishOptions,
        owned: &mut Option<OwnedServer>,
    ) -> Result<PublishResult, PublishError> {
        let channel = options.release_channel.as_str();

        // 1. Reuse a running server or start our own
        let status = self
            .server
            .current_status(project_dir)
            .await
            .map_err(|e| PublishError::upstream("check project server status", e))?;

        if status == ServerStatus::NotRunning {
            self.reporter.info(
                "Unable to find an existing project server for this directory, starting a new one...",
            );

            // Obligation is taken before starting so a half-started server is cleaned up too
            *owned = Some(OwnedServer {
                server: Arc::clone(&self.server),
                project_dir: project_dir.to_path_buf(),
            });

            let start_options = StartOptions {
                reset: options.clear,
                non_persistent: true,
                max_workers: options.max_workers,
            };
            self.server
                .start(project_dir, &start_options, !options.quiet)
                .await
                .map_err(|e| PublishError::upstream("start project server", e))?;
        } else {
            tracing::debug!("reusing running project server");
        }

        // 2. Recipient
        let recipient = self
            .notifier
            .recipient(&options.send_to)
            .await
            .map_err(|e| PublishError::upstream("resolve recipient", e))?;

        self.reporter
            .info(&format!("Publishing to channel '{}'...", channel));

        // 3. Standalone build compatibility
        let info = self
            .service
            .publish_info(project_dir)
            .await
            .map_err(|e| PublishError::upstream("fetch publish info", e))?;

        let build_status = self
            .service
            .build_status(
                project_dir,
                &BuildStatusRequest::status_only(channel, &info.sdk_version),
            )
            .await
            .map_err(|e| PublishError::upstream("check build status", e))?;

        if !build_status.user_has_built_app_before && !options.during_build {
            self.reporter
                .warn(&compatibility_warning(&info.sdk_version, channel));
        }

        // 4. Publish
        let bundle = {
            let _progress = options
                .quiet
                .then(|| QuietProgress::start(self.reporter.as_ref()));

            self.service
                .publish(
                    project_dir,
                    &PublishRequest {
                        release_channel: channel.to_string(),
                    },
                )
                .await
                .map_err(|e| PublishError::upstream("publish", e))?
        };

        self.reporter.published(&bundle.url);

        // 5. Best-effort notification
        if let Some(recipient) = recipient {
            match self.notifier.send_url(&bundle.url, &recipient).await {
                Ok(()) => self.reporter.info(&format!("Sent link to {}", recipient)),
                Err(e) => {
                    let error = PublishError::NotificationDelivery {
                        recipient: recipient.to_string(),
                        message: e.to_string(),
                    };
                    self.reporter.warn(&error.to_string());
                }
            }
        }

        Ok(PublishResult {
            url: bundle.url,
            user_has_built_app_before: build_status.user_has_built_app_before,
            release_channel: channel.to_string(),
            published_at: Utc::now(),
        })
    }
}

fn compatibility_warning(sdk_version: &str, channel: &str) -> String {
    format!(
        "We noticed you did not build a standalone app with {} and release channel '{}' before. \
         Remember that OTA updates will not work with an app built with a different SDK version and/or release channel. \
         Read more: {}",
        sdk_label(sdk_version),
        channel,
        PUBLISHING_LIMITATIONS_URL
    )
}
