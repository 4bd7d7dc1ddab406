//! rate limit 정책을 반영한 요청 전송기.
//! 재시도 여부 판단은 도메인 정책에 위임하고, 여기서는 분류와 백오프만 한다.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::time::sleep;
use tracing::warn;

use crate::domain::policy;

/// 백오프 상한. GitHub의 Retry-After가 이보다 길면 그 값을 따른다.
const MAX_BACKOFF_SECS: u64 = 60;

/// 요청을 전송하고 (상태, 본문)을 돌려준다.
/// rate limit/5xx 응답은 정책이 허락하는 한 지수 백오프로 재시도한다.
pub(super) async fn send_with_retry(
    request: RequestBuilder,
    method: &str,
    path: &str,
) -> Result<(StatusCode, String)> {
    let mut retry_count: u32 = 0;

    loop {
        let attempt = match request.try_clone() {
            Some(cloned) => cloned,
            // 복제 불가능한 요청은 재시도 없이 단발로 보낸다.
            None => {
                let response = request
                    .send()
                    .await
                    .with_context(|| format!("github: request failed: {method} {path}"))?;
                return read_response(response).await;
            }
        };

        let response = attempt
            .send()
            .await
            .with_context(|| format!("github: request failed: {method} {path}"))?;
        let status = response.status();

        if !matches!(status.as_u16(), 403 | 429) && !status.is_server_error() {
            return read_response(response).await;
        }

        retry_count += 1;
        let retry_after = retry_after_secs(&response);
        let (_, body) = read_response(response).await?;

        if status.is_server_error() {
            if retry_count > policy::MAX_PRIMARY_RETRIES {
                bail!("github: {method} {path} failed after retries ({status}): {body}");
            }
        } else if is_secondary_rate_limit(&body) {
            if !policy::should_retry_secondary(method, path) {
                // 리뷰 제출은 재시도하면 중복 리뷰가 생길 수 있다.
                bail!("github: secondary rate limit on {method} {path}; not retried");
            }
            if retry_count > policy::MAX_PRIMARY_RETRIES {
                bail!("github: secondary rate limit persisted on {method} {path}");
            }
            warn!("secondary rate limit detected for {method} {path}; retrying");
        } else if is_primary_rate_limit(status, &body) {
            if !policy::should_retry_primary(retry_count) {
                bail!("github: request quota exhausted for {method} {path}");
            }
            warn!("request quota exhausted for {method} {path}; retry count {retry_count}");
        } else {
            // rate limit이 아닌 403은 인증/권한 문제다.
            return Ok((status, body));
        }

        let delay = retry_after.unwrap_or_else(|| backoff_secs(retry_count));
        sleep(Duration::from_secs(delay)).await;
    }
}

async fn read_response(response: Response) -> Result<(StatusCode, String)> {
    let status = response.status();
    let body = response
        .text()
        .await
        .context("github: failed to read response body")?;
    Ok((status, body))
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn is_secondary_rate_limit(body: &str) -> bool {
    body.contains("secondary rate limit")
}

fn is_primary_rate_limit(status: StatusCode, body: &str) -> bool {
    status.as_u16() == 429 || body.contains("rate limit exceeded") || body.contains("API rate limit")
}

fn backoff_secs(retry_count: u32) -> u64 {
    (1u64 << retry_count.min(6)).min(MAX_BACKOFF_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        assert_eq!(backoff_secs(1), 2);
        assert_eq!(backoff_secs(2), 4);
        assert_eq!(backoff_secs(3), 8);
        assert_eq!(backoff_secs(10), 60);
    }

    #[test]
    fn secondary_rate_limit_is_detected_from_body() {
        assert!(is_secondary_rate_limit("You have exceeded a secondary rate limit."));
        assert!(!is_secondary_rate_limit("Not Found"));
    }
}
