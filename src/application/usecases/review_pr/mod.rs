//! PR 리뷰 실행의 전체 오케스트레이션 유스케이스.
//! 푸시마다 재실행되므로 모든 단계가 재호출에 안전해야 한다:
//! 커밋 추적으로 증분 범위를 정하고, 태그 교체로 코멘트를 멱등하게
//! 유지하며, 리뷰는 버퍼를 모아 한 번에 제출한다.

mod context;
pub(super) mod prompts;
mod review;
mod summarize;

use anyhow::Result;
use tracing::warn;

use crate::application::commenter::{CommentMode, Commenter};
use crate::application::ports::{
    ChatFactory, ConfigRepository, GitHubFactory, Reporter, TargetResolver, TokenCounter,
};
use crate::domain::markers::{self, CommentTag};
use crate::domain::review::RunOptions;

use context::load_execution_context;
use review::review_stage;
use summarize::{SummarizeOutcome, summarize_stage};

/// PR 설명에 이 키워드가 있으면 실행하지 않는다.
pub const IGNORE_KEYWORD: &str = "@reviewpilot: ignore";

/// URL 입력부터 요약/리뷰/제출/커밋 기록까지 전체 흐름을 조율한다.
pub struct ReviewPrUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub target_resolver: &'a dyn TargetResolver,
    pub github_factory: &'a dyn GitHubFactory,
    pub chat_factory: &'a dyn ChatFactory,
    pub tokenizer: &'a dyn TokenCounter,
    pub reporter: &'a dyn Reporter,
}

impl ReviewPrUseCase<'_> {
    /// 리뷰 본 실행 진입점.
    pub async fn execute(&self, options: RunOptions) -> Result<()> {
        self.reporter.section("Session");
        self.reporter.kv("Target", &options.url);
        self.reporter.kv(
            "Mode",
            if options.dry_run { "dry-run" } else { "post-review" },
        );

        let Some(ctx) = load_execution_context(self, &options).await? else {
            return Ok(());
        };
        let number = ctx.target.number;
        let mut commenter = Commenter::new(ctx.gh.as_ref());

        let outcome = summarize_stage(self, &options, &ctx, &mut commenter).await?;
        let SummarizeOutcome::Proceed { files, summarize_body, status } = outcome else {
            return Ok(());
        };

        let findings = review_stage(self, &ctx, &files).await;

        if options.dry_run {
            self.reporter.section("Dry Run: Summary Comment");
            self.reporter.raw(&summarize_body);
            self.reporter.section("Dry Run: Findings");
            for (path, finding) in &findings {
                self.reporter.raw(&format!(
                    "{path} {}-{}: {}",
                    finding.start_line, finding.end_line, finding.comment
                ));
            }
            return Ok(());
        }

        for (path, finding) in &findings {
            commenter.buffer_review_comment(
                path,
                finding.start_line,
                finding.end_line,
                &finding.comment,
            );
        }

        // 이전 실행이 남긴 PENDING 리뷰를 치운 뒤 한 번에 제출한다.
        commenter.delete_pending_review(number).await;
        commenter
            .submit_review(number, &ctx.pull.head_sha, &status)
            .await?;

        // 제출이 끝난 커밋을 추적 블록에 기록하고 진행중 배너를 거둔다.
        // 리뷰 제출 실패는 위에서 경고로 끝나므로 기록은 항상 진행된다.
        let final_body = markers::remove_in_progress_status(&markers::add_reviewed_commit_id(
            &summarize_body,
            &ctx.pull.head_sha,
        ));
        if let Err(err) = commenter
            .comment(&final_body, CommentTag::Summarize, CommentMode::Replace, number)
            .await
        {
            warn!("failed to post the summarize comment: {err:#}");
        }

        self.reporter.section("Done");
        self.reporter
            .status("Review", &format!("reviewed up to {}", ctx.pull.head_sha));
        Ok(())
    }
}
