//! 태그 기반 코멘트 저장/커밋 추적/리뷰 버퍼 제출 서비스.
//! 외부 코멘트 저장소에는 트랜잭션이 없으므로, 본문에 심은 마커 태그를
//! 기본 키 삼아 찾기/교체로 멱등성을 만든다. 캐시는 한 번의 실행 동안만
//! 유효하며 디스크에 남기지 않는다.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::ports::GitHubGateway;
use crate::domain::markers::{COMMENT_REPLY_TAG, COMMENT_TAG, CommentTag};
use crate::domain::review::{DraftReviewComment, IssueComment, PullComment, ReviewBufferEntry};

/// 목록 API 페이지 크기. 이보다 짧은 페이지가 마지막 페이지다.
pub const PAGE_SIZE: u32 = 100;

/// 봇 코멘트 앞머리에 붙는 인사말.
pub const COMMENT_GREETING: &str = ":robot: reviewpilot";

/// 코멘트 게시 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentMode {
    /// 무조건 새 코멘트를 만든다.
    Create,
    /// 같은 태그의 기존 코멘트를 찾아 본문 전체를 덮어쓴다. 없으면 생성.
    Replace,
}

/// 한 번의 실행을 담당하는 코멘트 서비스.
/// 리뷰 버퍼는 Empty → Buffering → Submitted로만 전이하며
/// 제출 후에는 다시 버퍼링할 수 없다.
pub struct Commenter<'a> {
    gh: &'a dyn GitHubGateway,
    issue_comments_cache: HashMap<u64, Vec<IssueComment>>,
    review_comments_cache: HashMap<u64, Vec<PullComment>>,
    buffer: Vec<ReviewBufferEntry>,
    submitted: bool,
}

impl<'a> Commenter<'a> {
    pub fn new(gh: &'a dyn GitHubGateway) -> Self {
        Self {
            gh,
            issue_comments_cache: HashMap::new(),
            review_comments_cache: HashMap::new(),
            buffer: Vec::new(),
            submitted: false,
        }
    }

    /// 인사말과 태그를 붙인 본문으로 코멘트를 게시한다.
    pub async fn comment(
        &mut self,
        message: &str,
        tag: CommentTag,
        mode: CommentMode,
        number: u64,
    ) -> Result<()> {
        let tag = tag.literal();
        let body = format!("{COMMENT_GREETING}\n\n{message}\n\n{tag}");
        match mode {
            CommentMode::Create => self.create(&body, number).await,
            CommentMode::Replace => self.replace(&body, tag, number).await,
        }
    }

    /// 새 코멘트를 만들고 캐시를 갱신한다.
    pub async fn create(&mut self, body: &str, number: u64) -> Result<()> {
        let created = self
            .gh
            .create_issue_comment(number, body)
            .await
            .with_context(|| format!("failed to create comment on #{number}"))?;
        self.upsert_issue_cache(number, created);
        Ok(())
    }

    /// 태그가 들어있는 첫 코멘트를 찾아 본문을 통째로 바꾼다. 없으면 생성.
    pub async fn replace(&mut self, body: &str, tag: &str, number: u64) -> Result<()> {
        match self.find_comment_with_tag(tag, number).await? {
            Some(existing) => {
                let updated = self
                    .gh
                    .update_issue_comment(existing.id, body)
                    .await
                    .with_context(|| format!("failed to update comment {}", existing.id))?;
                self.upsert_issue_cache(number, updated);
            }
            None => self.create(body, number).await?,
        }
        Ok(())
    }

    /// 본문에 태그를 포함한 첫 코멘트를 반환한다(목록 순서 기준 첫 매치).
    pub async fn find_comment_with_tag(
        &mut self,
        tag: &str,
        number: u64,
    ) -> Result<Option<IssueComment>> {
        let comments = self.list_comments(number).await?;
        Ok(comments.iter().find(|c| c.body.contains(tag)).cloned())
    }

    /// 대상의 코멘트 전체를 페이지네이션으로 수집한다.
    /// 결과는 실행이 끝날 때까지 캐시되어 반복 조회가 네트워크를 타지 않는다.
    pub async fn list_comments(&mut self, number: u64) -> Result<&[IssueComment]> {
        if !self.issue_comments_cache.contains_key(&number) {
            let mut all = Vec::new();
            let mut page = 1;
            loop {
                let batch = self
                    .gh
                    .list_issue_comments_page(number, page, PAGE_SIZE)
                    .await
                    .with_context(|| format!("failed to list comments on #{number}"))?;
                let batch_len = batch.len() as u32;
                all.extend(batch);
                if batch_len < PAGE_SIZE {
                    break;
                }
                page += 1;
            }
            self.issue_comments_cache.insert(number, all);
        }

        Ok(self
            .issue_comments_cache
            .get(&number)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    fn upsert_issue_cache(&mut self, number: u64, comment: IssueComment) {
        let cache = self.issue_comments_cache.entry(number).or_default();
        if let Some(idx) = cache.iter().position(|c| c.id == comment.id) {
            cache[idx] = comment;
        } else {
            cache.push(comment);
        }
    }

    /// PR 커밋 sha 목록을 시간순 그대로 수집한다.
    pub async fn all_commit_ids(&self, number: u64) -> Result<Vec<String>> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let batch = self
                .gh
                .list_commit_ids_page(number, page, PAGE_SIZE)
                .await
                .with_context(|| format!("failed to list commits on #{number}"))?;
            let batch_len = batch.len() as u32;
            all.extend(batch);
            if batch_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    /// 발견 항목을 리뷰 버퍼에 쌓는다. 네트워크를 건드리지 않는다.
    pub fn buffer_review_comment(
        &mut self,
        path: &str,
        start_line: u64,
        end_line: u64,
        message: &str,
    ) {
        if self.submitted {
            warn!(path, "review already submitted; dropping late buffered comment");
            return;
        }

        self.buffer.push(ReviewBufferEntry {
            path: path.to_string(),
            start_line,
            end_line,
            message: format!("{COMMENT_GREETING}\n\n{message}\n\n{COMMENT_TAG}"),
        });
    }

    pub fn buffered_count(&self) -> usize {
        self.buffer.len()
    }

    /// 버퍼 전체를 단일 리뷰 객체로 제출한다. 버퍼는 정확히 한 번 소비된다.
    /// 비어 있으면 상태 메시지만 담은 COMMENT 리뷰를 만든다.
    /// 생성/제출 실패는 경고로 남기고 실행은 계속된다 — 실패한 리뷰가
    /// 커밋 추적 갱신을 막아서는 안 된다.
    pub async fn submit_review(
        &mut self,
        number: u64,
        commit_id: &str,
        status_msg: &str,
    ) -> Result<()> {
        self.submitted = true;
        let body = format!("{COMMENT_GREETING}\n\n{status_msg}\n");
        let entries = std::mem::take(&mut self.buffer);

        if entries.is_empty() {
            info!("submitting empty review for PR #{number}");
            if let Err(err) = self
                .gh
                .create_review(number, commit_id, Some("COMMENT"), Some(&body), &[])
                .await
            {
                warn!("failed to submit empty review: {err:#}");
            }
            return Ok(());
        }

        // 같은 (path, 범위)에 남아 있는 봇 코멘트는 지우고 새로 게시한다.
        // 증분 재실행에서 같은 범위 코멘트가 중복으로 쌓이는 것을 막는다.
        for entry in &entries {
            let existing = match self
                .comments_at_range(number, &entry.path, entry.start_line, entry.end_line)
                .await
            {
                Ok(found) => found,
                Err(err) => {
                    warn!("failed to list review comments: {err:#}");
                    continue;
                }
            };

            for stale in existing.iter().filter(|c| c.body.contains(COMMENT_TAG)) {
                if let Err(err) = self.gh.delete_review_comment(stale.id).await {
                    warn!("failed to delete stale review comment {}: {err:#}", stale.id);
                }
            }
        }

        let drafts: Vec<DraftReviewComment> =
            entries.iter().map(ReviewBufferEntry::to_draft).collect();

        let review_id = match self
            .gh
            .create_review(number, commit_id, None, None, &drafts)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                warn!("failed to create review for commit {commit_id}: {err:#}");
                return Ok(());
            }
        };

        if let Err(err) = self.gh.submit_review(number, review_id, "COMMENT", &body).await {
            warn!("failed to submit review for commit {commit_id}: {err:#}");
        }
        Ok(())
    }

    /// 이전 실행이 남긴 PENDING 리뷰를 정리한다. 남아 있으면 새 리뷰
    /// 제출이 막히므로 시작 전에 지운다. 전 단계 모두 best-effort.
    pub async fn delete_pending_review(&mut self, number: u64) {
        let reviews = match self.gh.list_reviews(number).await {
            Ok(reviews) => reviews,
            Err(err) => {
                warn!("failed to list reviews on #{number}: {err:#}");
                return;
            }
        };

        let Some(pending) = reviews.iter().find(|r| r.state == "PENDING") else {
            return;
        };

        info!("deleting pending review {} for PR #{number}", pending.id);
        if let Err(err) = self.gh.delete_pending_review(number, pending.id).await {
            warn!("failed to delete pending review {}: {err:#}", pending.id);
        }
    }

    /// PR의 리뷰(라인) 코멘트 전체를 페이지네이션으로 수집해 캐시한다.
    pub async fn list_review_comments(&mut self, number: u64) -> Result<&[PullComment]> {
        if !self.review_comments_cache.contains_key(&number) {
            let mut all = Vec::new();
            let mut page = 1;
            loop {
                let batch = self
                    .gh
                    .list_review_comments_page(number, page, PAGE_SIZE)
                    .await
                    .with_context(|| format!("failed to list review comments on #{number}"))?;
                let batch_len = batch.len() as u32;
                all.extend(batch);
                if batch_len < PAGE_SIZE {
                    break;
                }
                page += 1;
            }
            self.review_comments_cache.insert(number, all);
        }

        Ok(self
            .review_comments_cache
            .get(&number)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// 요청 범위 안에 들어오는 비어있지 않은 리뷰 코멘트를 고른다.
    /// 단일 라인 코멘트는 단일 라인 질의에서만 매치된다.
    pub async fn comments_within_range(
        &mut self,
        number: u64,
        path: &str,
        start_line: u64,
        end_line: u64,
    ) -> Result<Vec<PullComment>> {
        let comments = self.list_review_comments(number).await?;
        Ok(comments
            .iter()
            .filter(|c| c.path == path && !c.body.is_empty())
            .filter(|c| match (c.start_line, c.line) {
                (Some(s), Some(l)) => s >= start_line && l <= end_line,
                (None, Some(l)) => start_line == end_line && l == end_line,
                _ => false,
            })
            .cloned()
            .collect())
    }

    /// 요청 범위와 정확히 일치하는 리뷰 코멘트만 고른다.
    pub async fn comments_at_range(
        &mut self,
        number: u64,
        path: &str,
        start_line: u64,
        end_line: u64,
    ) -> Result<Vec<PullComment>> {
        let comments = self.list_review_comments(number).await?;
        Ok(comments
            .iter()
            .filter(|c| c.path == path && !c.body.is_empty())
            .filter(|c| match (c.start_line, c.line) {
                (Some(s), Some(l)) => s == start_line && l == end_line,
                (None, Some(l)) => start_line == end_line && l == end_line,
                _ => false,
            })
            .cloned()
            .collect())
    }

    /// 최상위 코멘트 밑에 스레드 답글을 단다.
    /// 답글 게시에 실패하면 실패 사유를 설명하는 메시지로 한 번 더
    /// 시도하고, 성공 여부와 무관하게 최상위 코멘트의 태그를 답글됨
    /// 태그로 바꿔 다음 실행이 이 스레드를 다시 건드리지 않게 한다.
    pub async fn review_comment_reply(
        &mut self,
        number: u64,
        top_level: &PullComment,
        message: &str,
    ) {
        let reply = format!("{COMMENT_GREETING}\n\n{message}\n\n{COMMENT_REPLY_TAG}");
        if let Err(err) = self
            .gh
            .create_review_comment_reply(number, top_level.id, &reply)
            .await
        {
            warn!("failed to reply to the top-level comment: {err:#}");
            let fallback = format!(
                "Could not post the reply to the top-level comment due to the following error: {err}"
            );
            if let Err(err) = self
                .gh
                .create_review_comment_reply(number, top_level.id, &fallback)
                .await
            {
                warn!("failed to post the fallback reply: {err:#}");
            }
        }

        if top_level.body.contains(COMMENT_TAG) {
            let retagged = top_level.body.replace(COMMENT_TAG, COMMENT_REPLY_TAG);
            if let Err(err) = self.gh.update_review_comment(top_level.id, &retagged).await {
                warn!("failed to re-tag the top-level comment: {err:#}");
            }
        }
    }

    /// 코멘트가 속한 스레드의 최상위 코멘트와 대화 사본을 만든다.
    pub async fn conversation_chain(
        &mut self,
        number: u64,
        comment: &PullComment,
    ) -> Result<(Option<PullComment>, String)> {
        let comments = self.list_review_comments(number).await?;
        let top_id = comment.in_reply_to_id.unwrap_or(comment.id);
        let top_level = comments.iter().find(|c| c.id == top_id).cloned();

        let Some(top_level) = top_level else {
            return Ok((None, String::new()));
        };

        let replies: Vec<PullComment> = comments
            .iter()
            .filter(|c| c.in_reply_to_id == Some(top_level.id))
            .cloned()
            .collect();

        let chain = compose_comment_chain(&top_level, &replies);
        Ok((Some(top_level), chain))
    }
}

/// 대화를 `작성자: 본문` 줄의 선형 사본으로 만든다.
/// 최상위 코멘트가 먼저, 답글은 주어진 순서대로.
pub fn compose_comment_chain(top_level: &PullComment, replies: &[PullComment]) -> String {
    let mut lines = vec![format!("{}: {}", top_level.user.login, top_level.body)];
    lines.extend(
        replies
            .iter()
            .map(|reply| format!("{}: {}", reply.user.login, reply.body)),
    );
    lines.join("\n---\n")
}
