//! GitHub REST API 연동 구현.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::application::ports::GitHubGateway;
use crate::domain::review::{
    DraftReviewComment, FileDiff, IssueComment, PullComment, PullRequestInfo, ReviewSummary,
};

use super::retry::send_with_retry;

pub struct GitHubClient {
    client: Client,
    host: String,
    owner: String,
    repo: String,
    token: Option<String>,
    api_base: Option<String>,
}

impl GitHubClient {
    /// GitHub 대상 클라이언트를 생성한다.
    pub fn new(
        host: String,
        owner: String,
        repo: String,
        token: Option<String>,
        api_base: Option<String>,
    ) -> Self {
        // 모든 호출에 타임아웃을 건다. 빌더 실패 시 기본 클라이언트로 폴백.
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            host,
            owner,
            repo,
            token,
            api_base,
        }
    }

    fn api_base(&self) -> String {
        // github.com은 공개 API, 그 외는 Enterprise 기본 경로를 사용한다.
        if let Some(base) = &self.api_base {
            return base.trim_end_matches('/').to_string();
        }
        if self.host == "github.com" {
            "https://api.github.com".to_string()
        } else {
            format!("https://{}/api/v3", self.host)
        }
    }

    fn repo_path(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, self.repo, suffix)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        // 공통 헤더/인증 적용.
        let req = self
            .client
            .request(method, format!("{}{}", self.api_base(), path))
            .header("User-Agent", "reviewpilot")
            .header("Accept", "application/vnd.github+json");

        if let Some(token) = &self.token {
            req.bearer_auth(token)
        } else {
            req
        }
    }

    /// 재시도 전송 후 성공 본문만 돌려준다.
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<String> {
        let method_name = method.as_str().to_string();
        let mut req = self.request(method, path);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let (status, text) = send_with_retry(req, &method_name, path).await?;
        if !status.is_success() {
            anyhow::bail!("github: {method_name} {path} failed ({status}): {text}");
        }
        Ok(text)
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let text = self.send(method, path, body).await?;
        serde_json::from_str(&text).with_context(|| format!("github: invalid JSON from {path}"))
    }
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    base: PullRef,
    head: PullRef,
}

#[derive(Debug, Deserialize)]
struct PullRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CompareResponse {
    #[serde(default)]
    files: Vec<CompareFile>,
}

#[derive(Debug, Deserialize)]
struct CompareFile {
    filename: String,
    #[serde(default)]
    patch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedReview {
    id: u64,
}

#[async_trait]
impl GitHubGateway for GitHubClient {
    async fn list_issue_comments_page(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<IssueComment>> {
        let path = self.repo_path(&format!(
            "/issues/{number}/comments?per_page={per_page}&page={page}"
        ));
        self.send_json(Method::GET, &path, None)
            .await
            .context("github: failed to list comments")
    }

    async fn create_issue_comment(&self, number: u64, body: &str) -> Result<IssueComment> {
        let path = self.repo_path(&format!("/issues/{number}/comments"));
        self.send_json(Method::POST, &path, Some(json!({ "body": body })))
            .await
            .context("github: failed to create comment")
    }

    async fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<IssueComment> {
        let path = self.repo_path(&format!("/issues/comments/{comment_id}"));
        self.send_json(Method::PATCH, &path, Some(json!({ "body": body })))
            .await
            .context("github: failed to update comment")
    }

    async fn fetch_pull(&self, number: u64) -> Result<PullRequestInfo> {
        let path = self.repo_path(&format!("/pulls/{number}"));
        let pull: PullResponse = self
            .send_json(Method::GET, &path, None)
            .await
            .context("github: failed to fetch PR")?;

        Ok(PullRequestInfo {
            number: pull.number,
            title: pull.title,
            body: pull.body.unwrap_or_default(),
            base_sha: pull.base.sha,
            head_sha: pull.head.sha,
        })
    }

    async fn update_pull_body(&self, number: u64, body: &str) -> Result<()> {
        let path = self.repo_path(&format!("/pulls/{number}"));
        self.send(Method::PATCH, &path, Some(json!({ "body": body })))
            .await
            .context("github: failed to update PR body")?;
        Ok(())
    }

    async fn list_commit_ids_page(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<String>> {
        let path = self.repo_path(&format!(
            "/pulls/{number}/commits?per_page={per_page}&page={page}"
        ));
        let commits: Vec<CommitEntry> = self
            .send_json(Method::GET, &path, None)
            .await
            .context("github: failed to list PR commits")?;
        Ok(commits.into_iter().map(|c| c.sha).collect())
    }

    async fn compare_file_diffs(&self, base: &str, head: &str) -> Result<Vec<FileDiff>> {
        let path = self.repo_path(&format!("/compare/{base}...{head}"));
        let compared: CompareResponse = self
            .send_json(Method::GET, &path, None)
            .await
            .context("github: failed to compare commits")?;

        Ok(compared
            .files
            .into_iter()
            .map(|f| FileDiff {
                filename: f.filename,
                patch: f.patch.unwrap_or_default(),
            })
            .collect())
    }

    async fn fetch_file_content(&self, path: &str, ref_name: &str) -> Result<String> {
        // raw 미디어 타입으로 받아 디코딩 없이 본문을 그대로 쓴다.
        let api_path = self.repo_path(&format!("/contents/{path}?ref={ref_name}"));
        let req = self
            .client
            .get(format!("{}{}", self.api_base(), api_path))
            .header("User-Agent", "reviewpilot")
            .header("Accept", "application/vnd.github.raw");
        let req = if let Some(token) = &self.token {
            req.bearer_auth(token)
        } else {
            req
        };

        let (status, text) = send_with_retry(req, "GET", &api_path).await?;
        if status.as_u16() == 404 {
            // 삭제/이동된 파일은 맥락 없이 진행한다.
            return Ok(String::new());
        }
        if !status.is_success() {
            anyhow::bail!("github: failed to fetch file content ({status}): {text}");
        }
        Ok(text)
    }

    async fn list_review_comments_page(
        &self,
        number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PullComment>> {
        let path = self.repo_path(&format!(
            "/pulls/{number}/comments?per_page={per_page}&page={page}"
        ));
        self.send_json(Method::GET, &path, None)
            .await
            .context("github: failed to list review comments")
    }

    async fn create_review(
        &self,
        number: u64,
        commit_id: &str,
        event: Option<&str>,
        body: Option<&str>,
        comments: &[DraftReviewComment],
    ) -> Result<u64> {
        let path = self.repo_path(&format!("/pulls/{number}/reviews"));

        let mut payload = json!({ "commit_id": commit_id });
        if let Some(event) = event {
            payload["event"] = json!(event);
        }
        if let Some(body) = body {
            payload["body"] = json!(body);
        }
        if !comments.is_empty() {
            payload["comments"] = serde_json::to_value(comments)?;
        }

        let review: CreatedReview = self
            .send_json(Method::POST, &path, Some(payload))
            .await
            .context("github: failed to create review")?;
        Ok(review.id)
    }

    async fn submit_review(
        &self,
        number: u64,
        review_id: u64,
        event: &str,
        body: &str,
    ) -> Result<()> {
        let path = self.repo_path(&format!("/pulls/{number}/reviews/{review_id}/events"));
        self.send(Method::POST, &path, Some(json!({ "event": event, "body": body })))
            .await
            .context("github: failed to submit review")?;
        Ok(())
    }

    async fn list_reviews(&self, number: u64) -> Result<Vec<ReviewSummary>> {
        let path = self.repo_path(&format!("/pulls/{number}/reviews"));
        self.send_json(Method::GET, &path, None)
            .await
            .context("github: failed to list reviews")
    }

    async fn delete_pending_review(&self, number: u64, review_id: u64) -> Result<()> {
        let path = self.repo_path(&format!("/pulls/{number}/reviews/{review_id}"));
        self.send(Method::DELETE, &path, None)
            .await
            .context("github: failed to delete pending review")?;
        Ok(())
    }

    async fn create_review_comment_reply(
        &self,
        number: u64,
        comment_id: u64,
        body: &str,
    ) -> Result<()> {
        let path = self.repo_path(&format!("/pulls/{number}/comments/{comment_id}/replies"));
        self.send(Method::POST, &path, Some(json!({ "body": body })))
            .await
            .context("github: failed to reply to review comment")?;
        Ok(())
    }

    async fn update_review_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let path = self.repo_path(&format!("/pulls/comments/{comment_id}"));
        self.send(Method::PATCH, &path, Some(json!({ "body": body })))
            .await
            .context("github: failed to update review comment")?;
        Ok(())
    }

    async fn delete_review_comment(&self, comment_id: u64) -> Result<()> {
        let path = self.repo_path(&format!("/pulls/comments/{comment_id}"));
        self.send(Method::DELETE, &path, None)
            .await
            .context("github: failed to delete review comment")?;
        Ok(())
    }
}
