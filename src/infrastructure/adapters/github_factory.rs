//! GitHub 게이트웨이 팩토리 어댑터.

use crate::application::ports::{GitHubFactory, GitHubGateway};
use crate::domain::target::ReviewTarget;
use crate::infrastructure::config::HostConfig;
use crate::infrastructure::github::GitHubClient;

pub struct GitHubFactoryAdapter;

impl GitHubFactory for GitHubFactoryAdapter {
    fn build(
        &self,
        target: &ReviewTarget,
        host_cfg: Option<&HostConfig>,
        token: Option<String>,
    ) -> Box<dyn GitHubGateway> {
        Box::new(GitHubClient::new(
            target.host.clone(),
            target.owner.clone(),
            target.repo.clone(),
            token,
            host_cfg.and_then(|h| h.api_base.clone()),
        ))
    }
}
