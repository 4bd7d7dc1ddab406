//! 파일별 리뷰 단계: 예산에 맞춘 프롬프트 조립과 발견 항목 수집.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tracing::warn;

use crate::application::budget::{BlockCandidate, pack_prompt};
use crate::application::usecases::review_pr::{
    ReviewPrUseCase, context::ExecutionContext, prompts, summarize::SummarizedFile,
};
use crate::domain::inputs::PromptInputs;
use crate::domain::markers;
use crate::domain::patch::{self, Finding, PatchHunk};
use crate::domain::review::ChatIds;

/// 리뷰 단계를 실행해 (파일 경로, 발견 항목) 목록을 돌려준다.
/// 파일 단위로 실패를 가두며, 한 파일의 오류가 다른 파일 리뷰를 막지 않는다.
pub(super) async fn review_stage(
    use_case: &ReviewPrUseCase<'_>,
    ctx: &ExecutionContext,
    files: &[SummarizedFile],
) -> Vec<(String, Finding)> {
    if files.is_empty() {
        return Vec::new();
    }
    use_case.reporter.section("Review");
    use_case.reporter.kv("Files", &files.len().to_string());

    // GitHub 호출과 챗 호출은 서로 독립된 풀에서 상한을 갖는다.
    let gh_pool = Arc::new(Semaphore::new(ctx.config.github_concurrency()));

    let mut findings: Vec<(String, Finding)> = stream::iter(files.iter().map(|file| {
        let gh_pool = Arc::clone(&gh_pool);
        async move { review_file(use_case, ctx, file, gh_pool).await }
    }))
    .buffer_unordered(ctx.config.openai_concurrency())
    .collect::<Vec<Vec<(String, Finding)>>>()
    .await
    .into_iter()
    .flatten()
    .collect();

    findings.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.start_line.cmp(&b.1.start_line)));
    use_case.reporter.kv("Findings", &findings.len().to_string());
    findings
}

/// 파일 하나를 리뷰한다. 필수 본문 뒤에 파일 전문과 diff 헝크를
/// 우선순위 순서로 예산이 허락하는 만큼만 붙인다.
async fn review_file(
    use_case: &ReviewPrUseCase<'_>,
    ctx: &ExecutionContext,
    file: &SummarizedFile,
    gh_pool: Arc<Semaphore>,
) -> Vec<(String, Finding)> {
    let hunks = patch::split_patch(&file.patch);
    if hunks.is_empty() {
        return Vec::new();
    }

    let inputs = PromptInputs {
        title: ctx.pull.title.clone(),
        description: markers::description_without_release_notes(&ctx.pull.body),
        short_summary: file.summary.clone(),
        filename: file.filename.clone(),
        ..Default::default()
    };
    let base = inputs.render(prompts::REVIEW_FILE_DIFF);

    // 선택 블록 0번: 파일 전문(맥락). 1..: 헝크 diff.
    let mut blocks = Vec::with_capacity(hunks.len() + 1);
    blocks.push(BlockCandidate {
        name: "file_content",
        content: fetch_file_context(ctx, &file.filename, gh_pool).await,
    });
    for hunk in &hunks {
        blocks.push(BlockCandidate {
            name: "patch",
            content: format!(
                "\n## Diff hunk, new side lines {}-{}\n\n```diff\n{}```\n",
                hunk.start_line, hunk.end_line, hunk.content
            ),
        });
    }

    let packed = match pack_prompt(
        use_case.tokenizer,
        ctx.heavy_limits.request_tokens(),
        &base,
        blocks,
    ) {
        Ok(packed) => packed,
        Err(err) => {
            warn!(filename = %file.filename, "review prompt over budget: {err:#}");
            return Vec::new();
        }
    };

    // 프롬프트에 실린 헝크만 리뷰 대상 범위로 인정한다.
    let included_hunks: Vec<PatchHunk> = packed
        .included_indices
        .iter()
        .filter(|&&idx| idx >= 1)
        .map(|&idx| hunks[idx - 1].clone())
        .collect();
    if included_hunks.is_empty() {
        warn!(filename = %file.filename, "no diff hunk fits the review budget; file skipped");
        return Vec::new();
    }

    let reply = match ctx.heavy_agent.send_message(&packed.text, &ChatIds::default()).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(filename = %file.filename, "failed to review file: {err:#}");
            return Vec::new();
        }
    };

    patch::fit_findings_to_hunks(patch::parse_review(&reply.text), &included_hunks)
        .into_iter()
        .map(|finding| (file.filename.clone(), finding))
        .collect()
}

/// 파일 전문을 맥락 블록으로 가져온다. 실패는 빈 블록으로 강등된다.
async fn fetch_file_context(
    ctx: &ExecutionContext,
    filename: &str,
    gh_pool: Arc<Semaphore>,
) -> String {
    let Ok(_permit) = gh_pool.acquire().await else {
        return String::new();
    };

    match ctx.gh.fetch_file_content(filename, &ctx.pull.head_sha).await {
        Ok(content) if !content.is_empty() => {
            format!("\n## Full file content\n\n```\n{content}\n```\n")
        }
        Ok(_) => String::new(),
        Err(err) => {
            warn!(filename, "failed to fetch file content: {err:#}");
            String::new()
        }
    }
}
