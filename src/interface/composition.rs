//! 애플리케이션 조립(composition root) 모듈.

use anyhow::Result;

use crate::application::usecases::respond_comment::RespondCommentUseCase;
use crate::application::usecases::review_pr::ReviewPrUseCase;
use crate::infrastructure::adapters::{
    ChatFactoryAdapter, ConsoleReporter, GitHubFactoryAdapter, JsonConfigRepository,
    TiktokenCounter, UrlTargetResolver,
};

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
pub struct AppComposition {
    config_repo: JsonConfigRepository,
    target_resolver: UrlTargetResolver,
    github_factory: GitHubFactoryAdapter,
    chat_factory: ChatFactoryAdapter,
    tokenizer: TiktokenCounter,
    reporter: ConsoleReporter,
}

impl AppComposition {
    /// 토크나이저 로딩까지 포함해 실행 조합을 생성한다.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_repo: JsonConfigRepository,
            target_resolver: UrlTargetResolver,
            github_factory: GitHubFactoryAdapter,
            chat_factory: ChatFactoryAdapter,
            tokenizer: TiktokenCounter::new()?,
            reporter: ConsoleReporter,
        })
    }

    /// 리뷰 실행 유스케이스를 생성한다.
    pub fn review_usecase(&self) -> ReviewPrUseCase<'_> {
        ReviewPrUseCase {
            config_repo: &self.config_repo,
            target_resolver: &self.target_resolver,
            github_factory: &self.github_factory,
            chat_factory: &self.chat_factory,
            tokenizer: &self.tokenizer,
            reporter: &self.reporter,
        }
    }

    /// 스레드 답글 유스케이스를 생성한다.
    pub fn respond_usecase(&self) -> RespondCommentUseCase<'_> {
        RespondCommentUseCase {
            config_repo: &self.config_repo,
            target_resolver: &self.target_resolver,
            github_factory: &self.github_factory,
            chat_factory: &self.chat_factory,
            tokenizer: &self.tokenizer,
            reporter: &self.reporter,
        }
    }

    /// 설정 점검 JSON을 만든다.
    pub fn inspect_config(&self) -> Result<String> {
        use crate::application::ports::ConfigRepository;
        self.config_repo.inspect_pretty_json()
    }
}
