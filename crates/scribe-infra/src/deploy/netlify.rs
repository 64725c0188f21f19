//! Netlify build hooks over its REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use scribe_core::domain::DeployTarget;
use scribe_core::ports::{DeployError, DeployProvider, DeployState};

#[derive(Debug, Clone)]
pub struct NetlifyConfig {
    pub api_url: String,
    /// Used when a blog's deploy target carries no token of its own.
    pub fallback_token: Option<String>,
}

impl Default for NetlifyConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.netlify.com/api/v1".to_string(),
            fallback_token: None,
        }
    }
}

impl NetlifyConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("NETLIFY_API_URL").unwrap_or(defaults.api_url),
            fallback_token: std::env::var("NETLIFY_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuildResponse {
    deploy_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeployResponse {
    state: String,
}

pub struct NetlifyDeployProvider {
    client: Client,
    config: NetlifyConfig,
}

impl NetlifyDeployProvider {
    pub fn new(config: NetlifyConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder, target: &DeployTarget) -> RequestBuilder {
        let token = if target.token.is_empty() {
            self.config.fallback_token.as_deref().unwrap_or_default()
        } else {
            target.token.as_str()
        };
        request.bearer_auth(token)
    }

    async fn send(request: RequestBuilder) -> Result<Response, DeployError> {
        let response = request
            .send()
            .await
            .map_err(|e| DeployError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeployError::Rejected(format!("{status}: {body}")));
        }
        Ok(response)
    }
}

/// Map a Netlify deploy state; anything short of `ready` or `error` is still in flight.
fn deploy_state(state: &str) -> DeployState {
    match state {
        "ready" => DeployState::Ready,
        "error" => DeployState::Error,
        _ => DeployState::Pending,
    }
}

#[async_trait]
impl DeployProvider for NetlifyDeployProvider {
    async fn trigger_build(&self, target: &DeployTarget) -> Result<String, DeployError> {
        let request = self
            .client
            .post(self.url(&format!("sites/{}/builds", target.site_id)))
            .json(&serde_json::json!({}));
        let response = Self::send(self.authorize(request, target)).await?;

        let build: BuildResponse = response
            .json()
            .await
            .map_err(|e| DeployError::Request(e.to_string()))?;

        let deploy_id = build.deploy_id.ok_or_else(|| {
            DeployError::Rejected("Netlify build did not return a deploy_id".to_string())
        })?;
        tracing::info!(site_id = %target.site_id, %deploy_id, "Netlify build triggered");
        Ok(deploy_id)
    }

    async fn deploy_status(
        &self,
        target: &DeployTarget,
        deploy_id: &str,
    ) -> Result<DeployState, DeployError> {
        let request = self.client.get(self.url(&format!("deploys/{deploy_id}")));
        let response = Self::send(self.authorize(request, target)).await?;

        let deploy: DeployResponse = response
            .json()
            .await
            .map_err(|e| DeployError::Request(e.to_string()))?;
        tracing::debug!(%deploy_id, state = %deploy.state, "Netlify deploy status");
        Ok(deploy_state(&deploy.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_state_mapping() {
        assert_eq!(deploy_state("ready"), DeployState::Ready);
        assert_eq!(deploy_state("error"), DeployState::Error);
        assert_eq!(deploy_state("building"), DeployState::Pending);
        assert_eq!(deploy_state("enqueued"), DeployState::Pending);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let provider = NetlifyDeployProvider::new(NetlifyConfig {
            api_url: "http://localhost:9999/api/v1/".to_string(),
            fallback_token: None,
        });

        assert_eq!(
            provider.url("sites/abc/builds"),
            "http://localhost:9999/api/v1/sites/abc/builds"
        );
    }

    #[tokio::test]
    async fn test_unreachable_api_is_a_request_error() {
        let provider = NetlifyDeployProvider::new(NetlifyConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            fallback_token: Some("token".to_string()),
        });
        let target = DeployTarget {
            site_id: "site".to_string(),
            token: String::new(),
        };

        let result = provider.trigger_build(&target).await;

        assert!(matches!(result, Err(DeployError::Request(_))));
    }
}
