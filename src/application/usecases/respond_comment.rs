//! 리뷰 스레드 답글 유스케이스.
//! 봇 리뷰 코멘트에 달린 사용자 코멘트를 읽고, 대화 사본과 diff를
//! 예산에 맞춰 프롬프트에 실어 스레드 답글을 게시한다.

use anyhow::{Context, Result};
use tracing::warn;

use crate::application::budget::{BlockCandidate, pack_prompt};
use crate::application::commenter::Commenter;
use crate::application::ports::{
    ChatFactory, ConfigRepository, GitHubFactory, Reporter, TargetResolver, TokenCounter,
};
use crate::domain::inputs::PromptInputs;
use crate::domain::limits::TokenLimits;
use crate::domain::markers::{self, COMMENT_REPLY_TAG, COMMENT_TAG, SUMMARIZE_TAG};
use crate::domain::review::ChatIds;

use super::review_pr::prompts::COMMENT_RESPONSE;

/// 답글 실행 옵션.
#[derive(Debug, Clone)]
pub struct ReplyOptions {
    pub url: String,
    pub comment_id: u64,
}

/// 스레드 답글 실행을 조율한다.
pub struct RespondCommentUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub target_resolver: &'a dyn TargetResolver,
    pub github_factory: &'a dyn GitHubFactory,
    pub chat_factory: &'a dyn ChatFactory,
    pub tokenizer: &'a dyn TokenCounter,
    pub reporter: &'a dyn Reporter,
}

impl RespondCommentUseCase<'_> {
    pub async fn execute(&self, options: ReplyOptions) -> Result<()> {
        self.reporter.section("Respond");
        self.reporter.kv("Target", &options.url);

        let config = self
            .config_repo
            .load()
            .context("failed to load reviewpilot config")?;
        let target = self
            .target_resolver
            .parse(&options.url)
            .context("failed to parse target URL")?;
        let host_cfg = config.host_config(&target.host);
        let token = host_cfg.and_then(|h| h.resolve_token());
        let gh = self.github_factory.build(&target, host_cfg, token);

        let model = config.heavy_model();
        let limits = TokenLimits::for_model(&model);
        let system_message = format!(
            "{}\nKnowledge cutoff: {}",
            config.system_message(),
            limits.knowledge_cut_off
        );
        let agent = self
            .chat_factory
            .build(&config, &model, &system_message)
            .context("failed to initialize the chat agent")?;

        let pull = gh.fetch_pull(target.number).await?;
        let mut commenter = Commenter::new(gh.as_ref());

        let comment = commenter
            .list_review_comments(target.number)
            .await?
            .iter()
            .find(|c| c.id == options.comment_id)
            .cloned();
        let Some(comment) = comment else {
            self.reporter.status("Skip", "comment not found on this PR");
            return Ok(());
        };

        // 봇 자신의 코멘트에는 답하지 않는다(자기 응답 루프 방지).
        if comment.body.contains(COMMENT_TAG) || comment.body.contains(COMMENT_REPLY_TAG) {
            self.reporter.status("Skip", "comment was posted by this bot");
            return Ok(());
        }

        let (top_level, chain) = commenter.conversation_chain(target.number, &comment).await?;
        let Some(top_level) = top_level else {
            self.reporter.status("Skip", "no top-level comment for this thread");
            return Ok(());
        };

        let short_summary = commenter
            .find_comment_with_tag(SUMMARIZE_TAG, target.number)
            .await
            .ok()
            .flatten()
            .map(|c| markers::short_summary(&c.body))
            .unwrap_or_default();

        let inputs = PromptInputs {
            title: pull.title.clone(),
            description: markers::description_without_release_notes(&pull.body),
            short_summary,
            filename: comment.path.clone(),
            comment: comment.body.clone(),
            comment_chain: if chain.is_empty() {
                PromptInputs::default().comment_chain
            } else {
                chain
            },
            ..Default::default()
        };
        let base = inputs.render(COMMENT_RESPONSE);

        // 선택 블록: 파일 diff 먼저, 그 다음 대화 사본.
        let file_diff = match gh
            .compare_file_diffs(&pull.base_sha, &pull.head_sha)
            .await
        {
            Ok(diffs) => diffs
                .into_iter()
                .find(|d| d.filename == comment.path)
                .map(|d| format!("\n## File diff\n\n```diff\n{}\n```\n", d.patch))
                .unwrap_or_default(),
            Err(err) => {
                warn!("failed to fetch the file diff: {err:#}");
                String::new()
            }
        };
        let chain_block = format!("\n## Conversation so far\n\n{}\n", inputs.comment_chain);

        let packed = match pack_prompt(
            self.tokenizer,
            limits.request_tokens(),
            &base,
            vec![
                BlockCandidate { name: "file_diff", content: file_diff },
                BlockCandidate { name: "comment_chain", content: chain_block },
            ],
        ) {
            Ok(packed) => packed,
            Err(err) => {
                // 예산 초과는 재시도 대상이 아니다. 스레드에 사유를 남긴다.
                warn!("reply prompt over budget: {err:#}");
                commenter
                    .review_comment_reply(
                        target.number,
                        &top_level,
                        "I cannot reply to this comment: the conversation does not fit the model's token budget.",
                    )
                    .await;
                return Ok(());
            }
        };

        let reply = match agent.send_message(&packed.text, &ChatIds::default()).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!("chat request failed: {err:#}");
                return Ok(());
            }
        };

        commenter
            .review_comment_reply(target.number, &top_level, &reply.text)
            .await;
        self.reporter.status("Respond", "reply posted");
        Ok(())
    }
}
