//! Buildbot API client.

use async_trait::async_trait;
use forcetest_core::{BuildScheduler, ForceRequest, Result, Secret};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::{SchedulerError, SchedulerResult};

/// Response of `GET /api/v2/workers`.
#[derive(Debug, Deserialize)]
struct WorkersResponse {
    #[serde(default)]
    workers: Vec<WorkerRecord>,
}

#[derive(Debug, Deserialize)]
struct WorkerRecord {
    name: String,
}

/// Error member of a JSON-RPC response.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Buildbot client holding one cookie session for the whole run.
pub struct BuildbotClient {
    client: reqwest::Client,
    base: Url,
}

impl BuildbotClient {
    pub fn new(base: Url) -> SchedulerResult<Self> {
        if base.cannot_be_a_base() {
            return Err(SchedulerError::InvalidUrl(base.to_string()));
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(concat!("forcetest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> SchedulerResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SchedulerError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn login_session(&self, user: &str, secret: &Secret) -> SchedulerResult<()> {
        let url = self.endpoint(&["auth", "login"])?;
        info!(url = %url, user = %user, "Logging in");

        let response = self
            .client
            .get(url)
            .basic_auth(user, Some(secret.expose()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SchedulerError::LoginRejected(response.status().as_u16()));
        }

        Ok(())
    }

    async fn fetch_workers(&self) -> SchedulerResult<Vec<String>> {
        let url = self.endpoint(&["api", "v2", "workers"])?;
        debug!(url = %url, "Fetching workers");

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SchedulerError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        let workers: WorkersResponse = response.json().await?;
        Ok(workers.workers.into_iter().map(|w| w.name).collect())
    }

    async fn post_force(&self, request: &ForceRequest) -> SchedulerResult<()> {
        let scheduler = request.scheduler_name();
        let url = self.endpoint(&["api", "v2", "forceschedulers", &scheduler])?;
        debug!(url = %url, revision = %request.params.revision, "Posting force request");

        let response = self
            .client
            .post(url.clone())
            .json(&request.envelope())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(SchedulerError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        // Buildbot reports JSON-RPC failures with a 200 status.
        if let Ok(RpcResponse { error: Some(error) }) =
            serde_json::from_str::<RpcResponse>(&body)
        {
            return Err(SchedulerError::Rpc(format!(
                "{} ({})",
                error.message, error.code
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl BuildScheduler for BuildbotClient {
    async fn login(&self, user: &str, secret: &Secret) -> Result<()> {
        Ok(self.login_session(user, secret).await?)
    }

    async fn list_workers(&self) -> Result<Vec<String>> {
        Ok(self.fetch_workers().await?)
    }

    async fn force(&self, request: &ForceRequest) -> Result<()> {
        Ok(self.post_force(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> BuildbotClient {
        BuildbotClient::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_from_root() {
        let url = client("http://147.75.56.225:8010")
            .endpoint(&["api", "v2", "workers"])
            .unwrap();
        assert_eq!(url.as_str(), "http://147.75.56.225:8010/api/v2/workers");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client("https://ci.example.org/buildbot/")
            .endpoint(&["auth", "login"])
            .unwrap();
        assert_eq!(url.as_str(), "https://ci.example.org/buildbot/auth/login");
    }

    #[test]
    fn test_endpoint_encodes_worker_name() {
        let url = client("http://localhost:8010")
            .endpoint(&["api", "v2", "forceschedulers", "run-dbt2-rack 1/a"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8010/api/v2/forceschedulers/run-dbt2-rack%201%2Fa"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = BuildbotClient::new(Url::parse("mailto:ops@example.org").unwrap());
        assert!(matches!(result, Err(SchedulerError::InvalidUrl(_))));
    }

    #[test]
    fn test_login_rejection_maps_to_unauthorized() {
        let err: forcetest_core::Error = SchedulerError::LoginRejected(401).into();
        assert!(matches!(err, forcetest_core::Error::Unauthorized(_)));
    }
}
