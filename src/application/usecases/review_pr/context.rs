//! 리뷰 실행 컨텍스트(설정/대상/게이트웨이/에이전트) 준비 단계.

use anyhow::{Context, Result};

use crate::application::ports::{ChatAgent, GitHubGateway};
use crate::application::usecases::review_pr::{IGNORE_KEYWORD, ReviewPrUseCase};
use crate::domain::limits::TokenLimits;
use crate::domain::policy::PathFilter;
use crate::domain::review::{PullRequestInfo, RunOptions};
use crate::domain::target::ReviewTarget;
use crate::infrastructure::config::Config;

/// 리뷰 유스케이스 전 구간에서 공유되는 실행 상태.
pub(super) struct ExecutionContext {
    pub config: Config,
    pub target: ReviewTarget,
    pub gh: Box<dyn GitHubGateway>,
    pub light_agent: Box<dyn ChatAgent>,
    pub heavy_agent: Box<dyn ChatAgent>,
    pub light_limits: TokenLimits,
    pub heavy_limits: TokenLimits,
    pub pull: PullRequestInfo,
    pub path_filter: PathFilter,
}

/// 설정 로딩, 대상 파싱, PR 메타데이터 조회, 에이전트 구성까지 선행한다.
/// PR 설명에 무시 키워드가 있으면 None을 돌려 실행을 중단한다.
pub(super) async fn load_execution_context(
    use_case: &ReviewPrUseCase<'_>,
    options: &RunOptions,
) -> Result<Option<ExecutionContext>> {
    use_case.reporter.section("Load Config");
    let config = use_case
        .config_repo
        .load()
        .context("failed to load reviewpilot config")?;

    let target = use_case
        .target_resolver
        .parse(&options.url)
        .context("failed to parse target URL")?;

    let host_cfg = config.host_config(&target.host);
    let token = host_cfg.and_then(|h| h.resolve_token());
    if token.is_none() {
        tracing::warn!(host = %target.host, "no VCS token configured; requests may be rejected");
    }

    let gh = use_case.github_factory.build(&target, host_cfg, token);

    use_case.reporter.section("Fetch Target");
    use_case.reporter.kv("Host", &target.host);
    use_case.reporter.status("GitHub", "fetching PR metadata");
    let pull = gh.fetch_pull(target.number).await?;
    use_case.reporter.kv("Head SHA", &pull.head_sha);

    if pull.body.contains(IGNORE_KEYWORD) {
        use_case
            .reporter
            .status("Skip", "ignore keyword found in PR description");
        return Ok(None);
    }

    let light_model = config.light_model();
    let heavy_model = config.heavy_model();
    let light_limits = TokenLimits::for_model(&light_model);
    let heavy_limits = TokenLimits::for_model(&heavy_model);
    use_case.reporter.kv("Light Model", &light_model);
    use_case.reporter.kv("Light Limits", &light_limits.describe());
    use_case.reporter.kv("Heavy Model", &heavy_model);
    use_case.reporter.kv("Heavy Limits", &heavy_limits.describe());

    // 시스템 메시지에 모델의 지식 컷오프를 명시해 과신을 줄인다.
    let system_message = format!(
        "{}\nKnowledge cutoff: {}",
        config.system_message(),
        light_limits.knowledge_cut_off
    );

    // API 키 부재는 더 진행할 수 없는 구성 오류이므로 하드 실패다.
    let light_agent = use_case
        .chat_factory
        .build(&config, &light_model, &system_message)
        .context("failed to initialize the chat agent")?;
    let heavy_agent = use_case
        .chat_factory
        .build(&config, &heavy_model, &system_message)
        .context("failed to initialize the chat agent")?;

    let path_filter =
        PathFilter::new(&config.path_filters()).context("failed to compile path filters")?;

    Ok(Some(ExecutionContext {
        config,
        target,
        gh,
        light_agent,
        heavy_agent,
        light_limits,
        heavy_limits,
        pull,
        path_filter,
    }))
}
