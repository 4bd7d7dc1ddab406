//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::review::{
    ChatIds, ChatReply, DraftReviewComment, FileDiff, IssueComment, PullComment, PullRequestInfo,
    ReviewSummary,
};
use crate::domain::target::ReviewTarget;
use crate::infrastructure::config::{Config, HostConfig};

/// 설정 로딩/점검을 담당하는 저장소 포트.
pub trait ConfigRepository: Send + Sync {
    fn load(&self) -> Result<Config>;
    fn inspect_pretty_json(&self) -> Result<String>;
}

/// URL 입력값을 도메인 대상 식별자로 변환하는 포트.
pub trait TargetResolver: Send + Sync {
    fn parse(&self, input: &str) -> Result<ReviewTarget>;
}

/// 코멘트/커밋/리뷰 API 연동 추상화 포트.
/// 페이지 단위 목록 호출을 그대로 노출하고, 투명한 페이지네이션과
/// 실행 단위 캐시는 상위의 Commenter가 책임진다.
#[async_trait]
pub trait GitHubGateway: Send + Sync {
    // issue comments
    async fn list_issue_comments_page(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<IssueComment>>;
    async fn create_issue_comment(&self, number: u64, body: &str) -> Result<IssueComment>;
    async fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<IssueComment>;

    // pull request metadata
    async fn fetch_pull(&self, number: u64) -> Result<PullRequestInfo>;
    async fn update_pull_body(&self, number: u64, body: &str) -> Result<()>;
    async fn list_commit_ids_page(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<String>>;
    async fn compare_file_diffs(&self, base: &str, head: &str) -> Result<Vec<FileDiff>>;
    async fn fetch_file_content(&self, path: &str, ref_name: &str) -> Result<String>;

    // reviews
    async fn list_review_comments_page(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PullComment>>;
    async fn create_review(
        &self,
        number: u64,
        commit_id: &str,
        event: Option<&str>,
        body: Option<&str>,
        comments: &[DraftReviewComment],
    ) -> Result<u64>;
    async fn submit_review(
        &self,
        number: u64,
        review_id: u64,
        event: &str,
        body: &str,
    ) -> Result<()>;
    async fn list_reviews(&self, number: u64) -> Result<Vec<ReviewSummary>>;
    async fn delete_pending_review(&self, number: u64, review_id: u64) -> Result<()>;
    async fn create_review_comment_reply(
        &self,
        number: u64,
        comment_id: u64,
        body: &str,
    ) -> Result<()>;
    async fn update_review_comment(&self, comment_id: u64, body: &str) -> Result<()>;
    async fn delete_review_comment(&self, comment_id: u64) -> Result<()>;
}

/// 대상/호스트 설정에 맞는 GitHub 게이트웨이를 생성하는 팩토리 포트.
pub trait GitHubFactory: Send + Sync {
    fn build(
        &self,
        target: &ReviewTarget,
        host_cfg: Option<&HostConfig>,
        token: Option<String>,
    ) -> Box<dyn GitHubGateway>;
}

/// 챗 완성 서비스 실행 포트.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    async fn send_message(&self, prompt: &str, ids: &ChatIds) -> Result<ChatReply>;
}

/// 모델/시스템 메시지별 챗 에이전트를 구성하는 팩토리 포트.
pub trait ChatFactory: Send + Sync {
    fn build(
        &self,
        config: &Config,
        model: &str,
        system_message: &str,
    ) -> Result<Box<dyn ChatAgent>>;
}

/// 토큰 계수 포트. 코어는 정수 결과만 소비한다.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// 콘솔/로그 출력 추상화 포트.
pub trait Reporter: Send + Sync {
    fn section(&self, name: &str);
    fn kv(&self, key: &str, value: &str);
    fn status(&self, scope: &str, message: &str);
    fn raw(&self, line: &str);
}
