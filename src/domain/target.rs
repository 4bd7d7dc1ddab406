//! 입력 URL을 GitHub PR 대상으로 해석하는 모듈.

use anyhow::{Result, bail};
use url::Url;

#[derive(Debug, Clone)]
pub struct ReviewTarget {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub url: String,
}

impl ReviewTarget {
    /// `https://<host>/<owner>/<repo>/pull/<number>` 형태를 파싱한다.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("URL host is missing"))?
            .to_string();

        let segments: Vec<String> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).map(ToString::to_string).collect())
            .unwrap_or_default();

        if segments.len() < 4 || segments[2] != "pull" {
            bail!("unsupported URL format: {input}");
        }

        let Ok(number) = segments[3].parse() else {
            bail!("invalid PR number in URL: {input}");
        };

        Ok(Self {
            host,
            owner: segments[0].clone(),
            repo: segments[1].clone(),
            number,
            url: input.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_pull_url() {
        let target = ReviewTarget::parse("https://github.com/acme/widgets/pull/42").unwrap();
        assert_eq!(target.host, "github.com");
        assert_eq!(target.owner, "acme");
        assert_eq!(target.repo, "widgets");
        assert_eq!(target.number, 42);
    }

    #[test]
    fn parses_enterprise_host() {
        let target = ReviewTarget::parse("https://git.corp.example/acme/widgets/pull/7").unwrap();
        assert_eq!(target.host, "git.corp.example");
        assert_eq!(target.number, 7);
    }

    #[test]
    fn rejects_non_pull_urls() {
        assert!(ReviewTarget::parse("https://github.com/acme/widgets").is_err());
        assert!(ReviewTarget::parse("https://github.com/acme/widgets/issues/3").is_err());
        assert!(ReviewTarget::parse("https://github.com/acme/widgets/pull/abc").is_err());
    }
}
