//! Static-site deploy provider port.

use async_trait::async_trait;

use crate::domain::DeployTarget;

/// Status reported by the deploy provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployState {
    Pending,
    Ready,
    Error,
}

/// Triggers static-site rebuilds and reports their progress.
#[async_trait]
pub trait DeployProvider: Send + Sync {
    /// Start a build and return the provider's deploy identifier.
    async fn trigger_build(&self, target: &DeployTarget) -> Result<String, DeployError>;

    /// Current state of a previously triggered deploy.
    async fn deploy_status(
        &self,
        target: &DeployTarget,
        deploy_id: &str,
    ) -> Result<DeployState, DeployError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DeployError {
    #[error("Deploy request failed: {0}")]
    Request(String),

    #[error("Deploy provider rejected the request: {0}")]
    Rejected(String),

    #[error("Deploy failed: {0}")]
    BuildFailed(String),

    #[error("Deploy {deploy_id} still pending after {polls} status checks")]
    PollTimeout { deploy_id: String, polls: u32 },
}
