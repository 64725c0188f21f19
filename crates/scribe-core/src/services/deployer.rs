//! Site rebuild with bounded status polling and retry.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::DeployTarget;
use crate::ports::{DeployError, DeployProvider, DeployState};
use crate::retry::RetryPolicy;

/// Retry and polling limits for site deploys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployPolicy {
    /// Whole trigger-and-wait cycles.
    pub retry: RetryPolicy,
    /// Wait between status checks of one deploy.
    pub poll_interval: Duration,
    /// Status checks before a single deploy counts as failed.
    pub max_polls: u32,
}

impl Default for DeployPolicy {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::new(3, Duration::from_secs(10)),
            poll_interval: Duration::from_secs(5),
            max_polls: 120,
        }
    }
}

pub struct Deployer {
    provider: Arc<dyn DeployProvider>,
    policy: DeployPolicy,
}

impl Deployer {
    pub fn new(provider: Arc<dyn DeployProvider>, policy: DeployPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> DeployPolicy {
        self.policy
    }

    /// Trigger a rebuild and wait until it is live. Returns the deploy id.
    pub async fn deploy(&self, target: &DeployTarget) -> Result<String, DeployError> {
        self.policy
            .retry
            .run("site_deploy", |attempt| self.deploy_once(target, attempt))
            .await
    }

    async fn deploy_once(&self, target: &DeployTarget, attempt: u32) -> Result<String, DeployError> {
        let deploy_id = self.provider.trigger_build(target).await?;
        tracing::info!(site_id = %target.site_id, deploy_id = %deploy_id, attempt, "Site build triggered");

        for poll in 1..=self.policy.max_polls {
            match self.provider.deploy_status(target, &deploy_id).await? {
                DeployState::Ready => {
                    tracing::info!(site_id = %target.site_id, deploy_id = %deploy_id, polls = poll, "Site deploy ready");
                    return Ok(deploy_id);
                }
                DeployState::Error => return Err(DeployError::BuildFailed(deploy_id)),
                DeployState::Pending => {
                    if poll < self.policy.max_polls {
                        tokio::time::sleep(self.policy.poll_interval).await;
                    }
                }
            }
        }

        Err(DeployError::PollTimeout {
            deploy_id,
            polls: self.policy.max_polls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted trigger results and status sequences.
    #[derive(Default)]
    struct ScriptedProvider {
        triggers: Mutex<VecDeque<Result<String, DeployError>>>,
        statuses: Mutex<VecDeque<DeployState>>,
        trigger_calls: Mutex<u32>,
        status_calls: Mutex<u32>,
    }

    impl ScriptedProvider {
        fn new(
            triggers: Vec<Result<String, DeployError>>,
            statuses: Vec<DeployState>,
        ) -> Self {
            Self {
                triggers: Mutex::new(triggers.into()),
                statuses: Mutex::new(statuses.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl DeployProvider for ScriptedProvider {
        async fn trigger_build(&self, _target: &DeployTarget) -> Result<String, DeployError> {
            *self.trigger_calls.lock().unwrap() += 1;
            self.triggers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("deploy".into()))
        }

        async fn deploy_status(
            &self,
            _target: &DeployTarget,
            _deploy_id: &str,
        ) -> Result<DeployState, DeployError> {
            *self.status_calls.lock().unwrap() += 1;
            Ok(self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(DeployState::Pending))
        }
    }

    fn target() -> DeployTarget {
        DeployTarget {
            site_id: "site-1".into(),
            token: "token".into(),
        }
    }

    fn fast_policy(max_attempts: u32, max_polls: u32) -> DeployPolicy {
        DeployPolicy {
            retry: RetryPolicy::new(max_attempts, Duration::ZERO),
            poll_interval: Duration::ZERO,
            max_polls,
        }
    }

    #[tokio::test]
    async fn test_waits_until_ready() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Ok("d-1".into())],
            vec![DeployState::Pending, DeployState::Pending, DeployState::Ready],
        ));
        let deployer = Deployer::new(provider.clone(), fast_policy(3, 10));

        assert_eq!(deployer.deploy(&target()).await.unwrap(), "d-1");
        assert_eq!(*provider.trigger_calls.lock().unwrap(), 1);
        assert_eq!(*provider.status_calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retries_after_failed_build() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Ok("d-1".into()), Ok("d-2".into())],
            vec![DeployState::Error, DeployState::Ready],
        ));
        let deployer = Deployer::new(provider.clone(), fast_policy(3, 10));

        assert_eq!(deployer.deploy(&target()).await.unwrap(), "d-2");
        assert_eq!(*provider.trigger_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_polling_is_bounded() {
        let provider = Arc::new(ScriptedProvider::new(vec![], vec![]));
        let deployer = Deployer::new(provider.clone(), fast_policy(2, 4));

        let err = deployer.deploy(&target()).await.unwrap_err();

        assert!(matches!(err, DeployError::PollTimeout { polls: 4, .. }));
        assert_eq!(*provider.trigger_calls.lock().unwrap(), 2);
        assert_eq!(*provider.status_calls.lock().unwrap(), 8);
    }

    #[tokio::test]
    async fn test_trigger_errors_exhaust_attempts() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![
                Err(DeployError::Request("down".into())),
                Err(DeployError::Request("down".into())),
                Err(DeployError::Request("still down".into())),
            ],
            vec![],
        ));
        let deployer = Deployer::new(provider.clone(), fast_policy(3, 4));

        let err = deployer.deploy(&target()).await.unwrap_err();

        assert!(matches!(err, DeployError::Request(msg) if msg == "still down"));
        assert_eq!(*provider.status_calls.lock().unwrap(), 0);
    }
}
