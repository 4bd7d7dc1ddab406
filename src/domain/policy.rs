//! 도메인 정책(재시도 판단 규칙, 경로 필터).

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};

/// primary rate limit 재시도 허용 상한(결정 시점의 재시도 횟수 기준, 포함).
pub const MAX_PRIMARY_RETRIES: u32 = 3;

/// primary rate limit에 걸린 요청을 다시 시도할지 판단한다.
pub fn should_retry_primary(retry_count: u32) -> bool {
    retry_count <= MAX_PRIMARY_RETRIES
}

/// secondary rate limit에 걸린 요청을 다시 시도할지 판단한다.
/// 리뷰 제출 쓰기는 절대 재시도하지 않는다 — 재시도된 제출이 중복
/// 리뷰를 만들면 사후에 탐지할 방법이 없다.
pub fn should_retry_secondary(method: &str, path: &str) -> bool {
    !is_review_submission(method, path)
}

/// 특정 PR의 reviews 하위 리소스를 향한 쓰기 요청인지 구조적으로 검사한다.
pub fn is_review_submission(method: &str, path: &str) -> bool {
    let is_write = matches!(method, "POST" | "PUT" | "PATCH");
    if !is_write {
        return false;
    }

    // /repos/{owner}/{repo}/pulls/{number}/reviews[/{id}] 형태만 매칭.
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.len() >= 6
        && segments[0] == "repos"
        && segments[3] == "pulls"
        && segments[5] == "reviews"
}

/// 변경 파일 경로 포함/제외 규칙. `!` 접두어는 제외 규칙이고 제외가 우선한다.
pub struct PathFilter {
    rules: Vec<(GlobMatcher, bool)>,
}

impl PathFilter {
    /// 규칙 문자열 목록을 컴파일한다. 공백/빈 항목은 무시한다.
    pub fn new(rules: &[String]) -> Result<Self> {
        let mut compiled = Vec::new();
        for raw in rules {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let (pattern, exclude) = match trimmed.strip_prefix('!') {
                Some(rest) => (rest.trim(), true),
                None => (trimmed, false),
            };

            let matcher = Glob::new(pattern)
                .with_context(|| format!("invalid path filter glob '{pattern}'"))?
                .compile_matcher();
            compiled.push((matcher, exclude));
        }

        Ok(Self { rules: compiled })
    }

    /// 경로를 리뷰 대상에 포함할지 판단한다. 규칙이 없으면 모두 포함.
    pub fn check(&self, path: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }

        let mut included = false;
        let mut excluded = false;
        let mut inclusion_rule_exists = false;

        for (matcher, exclude) in &self.rules {
            if *exclude {
                if matcher.is_match(path) {
                    excluded = true;
                }
            } else {
                inclusion_rule_exists = true;
                if matcher.is_match(path) {
                    included = true;
                }
            }
        }

        (!inclusion_rule_exists || included) && !excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_retry_bounded_at_three() {
        assert!(should_retry_primary(1));
        assert!(should_retry_primary(3));
        assert!(!should_retry_primary(4));
    }

    #[test]
    fn secondary_never_retries_review_submission_writes() {
        for path in [
            "/repos/owner/repo/pulls/123/reviews",
            "/repos/owner/repo/pulls/456/reviews",
            "/repos/org-name/repo-name/pulls/789/reviews",
            "/repos/owner/repo/pulls/123/reviews/456",
        ] {
            assert!(!should_retry_secondary("POST", path), "{path}");
        }
    }

    #[test]
    fn secondary_retries_other_writes_and_reads() {
        for path in [
            "/repos/owner/repo/issues/comments",
            "/repos/owner/repo/pulls/123/comments",
            "/repos/owner/repo/pulls/123",
            "/repos/owner/repo/reviews",
            "/other/path/reviews",
        ] {
            assert!(should_retry_secondary("POST", path), "{path}");
        }
        assert!(should_retry_secondary("GET", "/repos/owner/repo/pulls/123/reviews"));
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = PathFilter::new(&[]).unwrap();
        assert!(filter.check("any/path.js"));
    }

    #[test]
    fn inclusion_rules_limit_matches() {
        let filter = PathFilter::new(&["*.js".to_string()]).unwrap();
        assert!(filter.check("test.js"));
        assert!(!filter.check("src/app.js"));
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        let filter =
            PathFilter::new(&["src/**/*.js".to_string(), "!**/*.test.js".to_string()]).unwrap();
        assert!(filter.check("src/app.js"));
        assert!(filter.check("src/components/button.js"));
        assert!(!filter.check("src/app.test.js"));
        assert!(!filter.check("lib/util.js"));
    }

    #[test]
    fn exclusion_only_rules_accept_the_rest() {
        let filter =
            PathFilter::new(&["!*.test.js".to_string(), "!dist/**".to_string()]).unwrap();
        assert!(filter.check("app.js"));
        assert!(!filter.check("app.test.js"));
        assert!(!filter.check("dist/app.js"));
    }

    #[test]
    fn blank_rules_are_ignored_and_invalid_globs_error() {
        let filter = PathFilter::new(&["  ".to_string(), "valid.js".to_string()]).unwrap();
        assert!(filter.check("valid.js"));
        assert!(PathFilter::new(&["a{".to_string()]).is_err());
    }
}
