//! Toolkit Client - JSON API client for the development toolkit service
//!
//! The toolkit owns the project server, the bundler and the publishing
//! backend. This client speaks its HTTP API and implements the
//! [`ProjectServer`] and [`PublishService`] contracts on top of it, plus
//! the raw link-sending call used by the notifier.

use crate::core::traits::{
    BuildStatus, BuildStatusRequest, ProjectServer, PublishInfo, PublishRequest, PublishService,
    PublishedBundle, Recipient, ServerStatus, StartOptions,
};
use crate::security::token_manager::SecureTokenManager;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: ServerStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartBody<'a> {
    project_dir: &'a Path,
    options: &'a StartOptions,
    verbose: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectBody<'a, T: Serialize> {
    project_dir: &'a Path,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    recipient: &'a Recipient,
    url: &'a str,
}

/// HTTP client for the toolkit API
pub struct ToolkitClient {
    http: Client,
    base_url: String,
    tokens: SecureTokenManager,
}

impl ToolkitClient {
    /// Create a new ToolkitClient
    ///
    /// # Arguments
    ///
    /// * `base_url` - Toolkit API base URL (e.g. `http://localhost:19001/api`)
    /// * `tokens` - Access token used for authenticated calls
    pub fn new(base_url: &str, tokens: SecureTokenManager) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.token() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request, turning non-success statuses into errors
    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "toolkit returned HTTP {}: {}",
                status,
                self.tokens.mask_tokens_in_string(body.trim())
            );
        }

        Ok(response)
    }

    /// Send a request and decode a JSON response
    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<T> {
        Ok(self.send(request).await?.json::<T>().await?)
    }

    /// Send a request whose response body is ignored
    async fn call_unit(&self, request: RequestBuilder) -> anyhow::Result<()> {
        self.send(request).await?;
        Ok(())
    }

    /// Ask the toolkit to deliver `url` by SMS or e-mail
    pub async fn send_link(&self, url: &str, recipient: &Recipient) -> anyhow::Result<()> {
        tracing::debug!(%recipient, "sending link");
        self.call_unit(
            self.http
                .post(self.endpoint("send"))
                .json(&SendBody { recipient, url }),
        )
        .await
    }
}

#[async_trait]
impl ProjectServer for ToolkitClient {
    async fn current_status(&self, project_dir: &Path) -> anyhow::Result<ServerStatus> {
        let response: StatusResponse = self
            .call(
                self.http
                    .get(self.endpoint("projects/status"))
                    .query(&[("projectDir", project_dir)]),
            )
            .await?;
        Ok(response.status)
    }

    async fn start(
        &self,
        project_dir: &Path,
        options: &StartOptions,
        verbose: bool,
    ) -> anyhow::Result<()> {
        tracing::debug!(?options, verbose, "starting project server");
        self.call_unit(self.http.post(self.endpoint("projects/start")).json(&StartBody {
            project_dir,
            options,
            verbose,
        }))
        .await
    }

    async fn stop(&self, project_dir: &Path) -> anyhow::Result<()> {
        self.call_unit(self.http.post(self.endpoint("projects/stop")).json(&ProjectBody {
            project_dir,
            body: serde_json::Map::new(),
        }))
        .await
    }
}

#[async_trait]
impl PublishService for ToolkitClient {
    async fn publish_info(&self, project_dir: &Path) -> anyhow::Result<PublishInfo> {
        self.call(
            self.http
                .get(self.endpoint("projects/publish-info"))
                .query(&[("projectDir", project_dir)]),
        )
        .await
    }

    async fn build_status(
        &self,
        project_dir: &Path,
        request: &BuildStatusRequest,
    ) -> anyhow::Result<BuildStatus> {
        self.call(self.http.post(self.endpoint("projects/build")).json(&ProjectBody {
            project_dir,
            body: request,
        }))
        .await
    }

    async fn publish(
        &self,
        project_dir: &Path,
        request: &PublishRequest,
    ) -> anyhow::Result<PublishedBundle> {
        self.call(self.http.post(self.endpoint("projects/publish")).json(&ProjectBody {
            project_dir,
            body: request,
        }))
        .await
    }
}
