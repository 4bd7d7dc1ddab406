//! 증분 범위 계산과 파일별 요약/트리아지 단계.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::application::commenter::{CommentMode, Commenter, COMMENT_GREETING};
use crate::application::usecases::review_pr::{ReviewPrUseCase, context::ExecutionContext, prompts};
use crate::domain::inputs::PromptInputs;
use crate::domain::markers::{self, CommentTag, MarkerBlock, SUMMARIZE_TAG};
use crate::domain::review::{ChatIds, FileDiff, RunOptions};

/// 요약 단계가 리뷰 단계로 넘기는 파일 하나.
pub(super) struct SummarizedFile {
    pub filename: String,
    pub patch: String,
    pub summary: String,
    pub needs_review: bool,
}

/// 요약 단계의 판단 결과.
pub(super) enum SummarizeOutcome {
    /// 리뷰할 것이 없어 실행을 끝낸다.
    Skip,
    /// 리뷰 단계로 진행한다. files가 비어 있어도 상태 전용 리뷰는 제출된다.
    Proceed {
        files: Vec<SummarizedFile>,
        summarize_body: String,
        status: String,
    },
}

/// 커밋 추적 블록을 읽어 증분 범위를 정하고, 변경 파일을 요약/트리아지한다.
pub(super) async fn summarize_stage(
    use_case: &ReviewPrUseCase<'_>,
    options: &RunOptions,
    ctx: &ExecutionContext,
    commenter: &mut Commenter<'_>,
) -> Result<SummarizeOutcome> {
    let number = ctx.target.number;
    use_case.reporter.section("Summarize");

    let existing = commenter
        .find_comment_with_tag(SUMMARIZE_TAG, number)
        .await?
        .map(|c| c.body)
        .unwrap_or_default();
    let existing_message = strip_envelope(&existing);
    let existing_commit_block = markers::reviewed_commit_ids_block(&existing);
    let reviewed_ids = markers::reviewed_commit_ids(&existing);

    let all_commit_ids = commenter.all_commit_ids(number).await?;
    let highest_reviewed = markers::highest_reviewed_commit_id(&all_commit_ids, &reviewed_ids);

    if highest_reviewed == ctx.pull.head_sha {
        use_case
            .reporter
            .status("Dedup", "head commit already reviewed; skipping");
        return Ok(SummarizeOutcome::Skip);
    }

    let base_ref = if highest_reviewed.is_empty() {
        ctx.pull.base_sha.clone()
    } else {
        highest_reviewed.clone()
    };

    let status = format!(
        "Reviewing commits between {base_ref} and {}.",
        ctx.pull.head_sha
    );

    // 진행중 배너를 단 요약 코멘트를 먼저 올려 재실행 경합을 줄인다.
    if !options.dry_run {
        let in_progress = markers::add_in_progress_status(&existing_message, &status);
        if let Err(err) = commenter
            .comment(&in_progress, CommentTag::Summarize, CommentMode::Replace, number)
            .await
        {
            warn!("failed to post the in-progress status: {err:#}");
        }
    }

    use_case.reporter.kv("Base", &base_ref);
    use_case.reporter.status("GitHub", "fetching incremental diff");
    let diffs = match ctx.gh.compare_file_diffs(&base_ref, &ctx.pull.head_sha).await {
        Ok(diffs) => diffs,
        // diff를 못 가져오면 이번 실행을 접는다. 배너는 걷어낸다.
        Err(err) => {
            warn!("failed to fetch the incremental diff: {err:#}");
            restore_without_banner(options, commenter, &existing_message, number).await;
            return Ok(SummarizeOutcome::Skip);
        }
    };

    let mut files: Vec<FileDiff> = diffs
        .into_iter()
        .filter(|f| !f.patch.is_empty())
        .filter(|f| ctx.path_filter.check(&f.filename))
        .collect();

    if files.is_empty() {
        use_case.reporter.status("Summarize", "no diff to review");
        restore_without_banner(options, commenter, &existing_message, number).await;
        return Ok(SummarizeOutcome::Skip);
    }

    let max_files = ctx.config.max_files();
    if files.len() > max_files {
        use_case.reporter.status(
            "Summarize",
            &format!("{} files exceed max_files={max_files}; extra files skipped", files.len()),
        );
        files.truncate(max_files);
    }
    use_case.reporter.kv("Files", &files.len().to_string());

    // 파일별 요약은 챗 풀 너비만큼 병렬로 돌린다.
    let review_simple_changes = ctx.config.review_simple_changes();
    let mut summarized: Vec<SummarizedFile> = stream::iter(files.into_iter().map(|file| {
        let ctx = &*ctx;
        let use_case = &*use_case;
        async move { summarize_file(use_case, ctx, file, review_simple_changes).await }
    }))
    .buffer_unordered(ctx.config.openai_concurrency())
    .collect()
    .await;
    summarized.sort_by(|a, b| a.filename.cmp(&b.filename));

    // 요약 본문 체이닝: 같은 대화 맥락에서 정리 → 요약 → 짧은 요약 순서.
    let mut ids = ChatIds::default();
    let changesets: Vec<String> = summarized
        .iter()
        .map(|f| format!("{}: {}", f.filename, f.summary))
        .collect();
    let mut raw_summary = changesets.join("\n---\n");
    if !markers::raw_summary(&existing).is_empty() {
        raw_summary = format!("{}\n---\n{raw_summary}", markers::raw_summary(&existing).trim());
        let inputs = PromptInputs { raw_summary: raw_summary.clone(), ..Default::default() };
        match send_within_budget(use_case, ctx, &inputs, prompts::SUMMARIZE_CHANGESETS, &ids).await {
            Some(reply) => {
                raw_summary = reply.text;
                ids.parent_message_id = Some(reply.id);
            }
            None => warn!("changeset consolidation skipped"),
        }
    }

    let inputs = PromptInputs { raw_summary: raw_summary.clone(), ..Default::default() };

    let summary = match send_within_budget(use_case, ctx, &inputs, prompts::SUMMARIZE, &ids).await {
        Some(reply) => {
            ids.parent_message_id = Some(reply.id);
            reply.text
        }
        None => "No summary could be generated for these changes.".to_string(),
    };

    let short_summary =
        match send_within_budget(use_case, ctx, &inputs, prompts::SUMMARIZE_SHORT, &ids).await {
            Some(reply) => {
                ids.parent_message_id = Some(reply.id);
                reply.text
            }
            None => String::new(),
        };

    if !ctx.config.disable_release_notes() {
        if let Some(reply) =
            send_within_budget(use_case, ctx, &inputs, prompts::SUMMARIZE_RELEASE_NOTES, &ids).await
        {
            if options.dry_run {
                use_case.reporter.section("Dry Run: Release Notes");
                use_case.reporter.raw(&reply.text);
            } else if let Err(err) = commenter.update_description(number, &reply.text).await {
                warn!("failed to update the PR description: {err:#}");
            }
        }
    }

    // 요약 코멘트 본문: 요약 + raw/short 블록 + 기존 커밋 추적 블록.
    // 새 head sha는 리뷰 제출이 끝난 뒤에 기록된다.
    let mut summarize_body = summary;
    summarize_body = markers::set_block_content(
        &summarize_body,
        MarkerBlock::RawSummary,
        raw_summary.trim(),
    );
    summarize_body = markers::set_block_content(
        &summarize_body,
        MarkerBlock::ShortSummary,
        short_summary.trim(),
    );
    if !existing_commit_block.is_empty() {
        summarize_body.push('\n');
        summarize_body.push_str(&existing_commit_block);
    }

    let files: Vec<SummarizedFile> = if ctx.config.disable_review() {
        Vec::new()
    } else {
        summarized.into_iter().filter(|f| f.needs_review).collect()
    };

    Ok(SummarizeOutcome::Proceed { files, summarize_body, status })
}

/// 파일 하나를 요약하고 트리아지한다. 예산 초과/오류 시에도 리뷰
/// 단계에서 다뤄지도록 보수적으로 NEEDS_REVIEW를 유지한다.
async fn summarize_file(
    use_case: &ReviewPrUseCase<'_>,
    ctx: &ExecutionContext,
    file: FileDiff,
    review_simple_changes: bool,
) -> SummarizedFile {
    let inputs = PromptInputs {
        title: ctx.pull.title.clone(),
        description: markers::description_without_release_notes(&ctx.pull.body),
        filename: file.filename.clone(),
        file_diff: file.patch.clone(),
        ..Default::default()
    };
    let rendered = inputs.render(prompts::SUMMARIZE_FILE_DIFF);

    let tokens = use_case.tokenizer.count(&rendered);
    if tokens > ctx.light_limits.request_tokens() {
        warn!(
            filename = %file.filename,
            tokens,
            "file diff exceeds the summarize budget; skipping summary"
        );
        return SummarizedFile {
            filename: file.filename,
            patch: file.patch,
            summary: "diff too large to summarize".to_string(),
            needs_review: true,
        };
    }

    match ctx.light_agent.send_message(&rendered, &ChatIds::default()).await {
        Ok(reply) => {
            let (summary, approved) = split_triage(&reply.text);
            SummarizedFile {
                filename: file.filename,
                patch: file.patch,
                summary,
                needs_review: review_simple_changes || !approved,
            }
        }
        Err(err) => {
            warn!(filename = %file.filename, "failed to summarize file: {err:#}");
            SummarizedFile {
                filename: file.filename,
                patch: file.patch,
                summary: "summary not available".to_string(),
                needs_review: true,
            }
        }
    }
}

/// 응답에서 `[TRIAGE]:` 줄을 떼어 (요약, APPROVED 여부)를 돌려준다.
fn split_triage(response: &str) -> (String, bool) {
    let mut approved = false;
    let summary: Vec<&str> = response
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if let Some(verdict) = trimmed.strip_prefix("[TRIAGE]:") {
                approved = verdict.trim() == "APPROVED";
                return false;
            }
            true
        })
        .collect();
    (summary.join("\n").trim().to_string(), approved)
}

/// 예산을 확인하고 챗 호출을 보낸다. 초과/실패 시 None.
async fn send_within_budget(
    use_case: &ReviewPrUseCase<'_>,
    ctx: &ExecutionContext,
    inputs: &PromptInputs,
    template: &str,
    ids: &ChatIds,
) -> Option<crate::domain::review::ChatReply> {
    let rendered = inputs.render(template);
    let tokens = use_case.tokenizer.count(&rendered);
    if tokens > ctx.light_limits.request_tokens() {
        warn!(tokens, budget = ctx.light_limits.request_tokens(), "prompt over budget; skipped");
        return None;
    }

    match ctx.light_agent.send_message(&rendered, ids).await {
        Ok(reply) => Some(reply),
        Err(err) => {
            warn!("chat request failed: {err:#}");
            None
        }
    }
}

/// 배너가 올라간 뒤 조기 종료할 때, 요약 코멘트를 배너 없는 상태로 되돌린다.
async fn restore_without_banner(
    options: &RunOptions,
    commenter: &mut Commenter<'_>,
    existing_message: &str,
    number: u64,
) {
    if options.dry_run {
        return;
    }
    let message = if existing_message.is_empty() {
        "No reviewable changes were found in this pull request."
    } else {
        existing_message
    };
    if let Err(err) = commenter
        .comment(message, CommentTag::Summarize, CommentMode::Replace, number)
        .await
    {
        warn!("failed to restore the summarize comment: {err:#}");
    }
}

/// 저장된 코멘트 본문에서 인사말/요약 태그 겉포장을 벗겨 메시지만 남긴다.
fn strip_envelope(body: &str) -> String {
    let body = body.strip_prefix(COMMENT_GREETING).unwrap_or(body);
    let body = body.trim();
    let body = body.strip_suffix(SUMMARIZE_TAG).unwrap_or(body);
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_triage_reads_verdict_and_strips_line() {
        let (summary, approved) = split_triage("A summary line.\n[TRIAGE]: APPROVED");
        assert_eq!(summary, "A summary line.");
        assert!(approved);

        let (summary, approved) = split_triage("Changed logic.\n[TRIAGE]: NEEDS_REVIEW");
        assert_eq!(summary, "Changed logic.");
        assert!(!approved);

        let (summary, approved) = split_triage("No verdict at all.");
        assert_eq!(summary, "No verdict at all.");
        assert!(!approved);
    }

    #[test]
    fn strip_envelope_removes_greeting_and_tag() {
        let body = format!("{COMMENT_GREETING}\n\nthe message\n\n{SUMMARIZE_TAG}");
        assert_eq!(strip_envelope(&body), "the message");
        assert_eq!(strip_envelope("bare message"), "bare message");
    }
}
