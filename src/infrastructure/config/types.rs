//! 설정 스키마와 병합/해석 규칙.

use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are `reviewpilot`, a language model trained to review pull requests. Your purpose is to act as a highly experienced software engineer and provide a thorough review of code hunks, focusing on substantive problems over style.";
pub const DEFAULT_LIGHT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_HEAVY_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_FILES: usize = 150;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_CONCURRENCY: usize = 6;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// 전역 기본값
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// VCS 호스트별 인증/엔드포인트 설정
    #[serde(default)]
    pub hosts: HashMap<String, HostConfig>,
    /// 챗 서비스(OpenAI) 설정
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DefaultsConfig {
    /// 리뷰 시스템 메시지
    pub system_message: Option<String>,
    /// 요약 단계 모델
    pub light_model: Option<String>,
    /// 리뷰 단계 모델
    pub heavy_model: Option<String>,
    /// 샘플링 온도
    pub temperature: Option<f32>,
    /// 챗 요청 타임아웃(ms)
    pub request_timeout_ms: Option<u64>,
    /// 챗 요청 재시도 횟수
    pub retries: Option<u32>,
    /// 챗 호출 동시 실행 상한
    pub openai_concurrency: Option<usize>,
    /// GitHub 호출 동시 실행 상한
    pub github_concurrency: Option<usize>,
    /// 한 실행에서 다루는 최대 파일 수
    pub max_files: Option<usize>,
    /// APPROVED 트리아지 파일도 리뷰할지 여부
    pub review_simple_changes: Option<bool>,
    /// 라인 리뷰 비활성화(요약만)
    pub disable_review: Option<bool>,
    /// 릴리스 노트 비활성화
    pub disable_release_notes: Option<bool>,
    /// 변경 파일 경로 필터(`!` 접두어는 제외)
    pub path_filters: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HostConfig {
    pub token: Option<String>,
    pub token_env: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub api_base: Option<String>,
}

impl Config {
    pub fn system_message(&self) -> String {
        self.defaults
            .system_message
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string())
    }

    pub fn light_model(&self) -> String {
        self.defaults
            .light_model
            .clone()
            .unwrap_or_else(|| DEFAULT_LIGHT_MODEL.to_string())
    }

    pub fn heavy_model(&self) -> String {
        self.defaults
            .heavy_model
            .clone()
            .unwrap_or_else(|| DEFAULT_HEAVY_MODEL.to_string())
    }

    pub fn temperature(&self) -> f32 {
        self.defaults.temperature.unwrap_or(0.0)
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.defaults.request_timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub fn retries(&self) -> u32 {
        self.defaults.retries.unwrap_or(DEFAULT_RETRIES)
    }

    pub fn openai_concurrency(&self) -> usize {
        self.defaults
            .openai_concurrency
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn github_concurrency(&self) -> usize {
        self.defaults
            .github_concurrency
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn max_files(&self) -> usize {
        self.defaults.max_files.filter(|&n| n > 0).unwrap_or(DEFAULT_MAX_FILES)
    }

    pub fn review_simple_changes(&self) -> bool {
        self.defaults.review_simple_changes.unwrap_or(false)
    }

    pub fn disable_review(&self) -> bool {
        self.defaults.disable_review.unwrap_or(false)
    }

    pub fn disable_release_notes(&self) -> bool {
        self.defaults.disable_release_notes.unwrap_or(false)
    }

    pub fn path_filters(&self) -> Vec<String> {
        self.defaults.path_filters.clone().unwrap_or_default()
    }

    pub fn host_config(&self, host: &str) -> Option<&HostConfig> {
        self.hosts.get(host)
    }

    /// 후순위(나중 파일) 값으로 덮어쓰는 병합 규칙.
    pub(crate) fn merge_from(&mut self, other: Config) {
        self.defaults.merge_from(other.defaults);

        for (host, incoming) in other.hosts {
            if let Some(existing) = self.hosts.get_mut(&host) {
                existing.merge_from(incoming);
            } else {
                self.hosts.insert(host, incoming);
            }
        }

        self.openai.merge_from(other.openai);
    }
}

impl DefaultsConfig {
    pub(crate) fn merge_from(&mut self, other: DefaultsConfig) {
        if other.system_message.is_some() {
            self.system_message = other.system_message;
        }
        if other.light_model.is_some() {
            self.light_model = other.light_model;
        }
        if other.heavy_model.is_some() {
            self.heavy_model = other.heavy_model;
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        if other.request_timeout_ms.is_some() {
            self.request_timeout_ms = other.request_timeout_ms;
        }
        if other.retries.is_some() {
            self.retries = other.retries;
        }
        if other.openai_concurrency.is_some() {
            self.openai_concurrency = other.openai_concurrency;
        }
        if other.github_concurrency.is_some() {
            self.github_concurrency = other.github_concurrency;
        }
        if other.max_files.is_some() {
            self.max_files = other.max_files;
        }
        if other.review_simple_changes.is_some() {
            self.review_simple_changes = other.review_simple_changes;
        }
        if other.disable_review.is_some() {
            self.disable_review = other.disable_review;
        }
        if other.disable_release_notes.is_some() {
            self.disable_release_notes = other.disable_release_notes;
        }
        if other.path_filters.is_some() {
            self.path_filters = other.path_filters;
        }
    }
}

impl HostConfig {
    /// host 토큰은 `token` 우선, 없으면 `token_env`를 조회한다.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(token) = &self.token {
            return Some(token.clone());
        }
        let env_name = self.token_env.as_ref()?;
        env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }

    pub(crate) fn merge_from(&mut self, other: HostConfig) {
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.token_env.is_some() {
            self.token_env = other.token_env;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
    }
}

impl OpenAiConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }
        let env_name = self
            .api_key_env
            .clone()
            .unwrap_or_else(|| "OPENAI_API_KEY".to_string());
        env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }

    pub(crate) fn merge_from(&mut self, other: OpenAiConfig) {
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.api_key_env.is_some() {
            self.api_key_env = other.api_key_env;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_absent() {
        let config = Config::default();
        assert_eq!(config.light_model(), "gpt-3.5-turbo");
        assert_eq!(config.heavy_model(), "gpt-4");
        assert_eq!(config.retries(), 3);
        assert_eq!(config.openai_concurrency(), 6);
        assert_eq!(config.github_concurrency(), 6);
        assert_eq!(config.max_files(), 150);
        assert!(!config.disable_review());
    }

    #[test]
    fn merge_prefers_later_values() {
        let mut base: Config = serde_json::from_str(
            r#"{"defaults": {"light_model": "gpt-3.5-turbo", "retries": 2}}"#,
        )
        .unwrap();
        let overlay: Config =
            serde_json::from_str(r#"{"defaults": {"light_model": "gpt-4o"}}"#).unwrap();

        base.merge_from(overlay);
        assert_eq!(base.light_model(), "gpt-4o");
        assert_eq!(base.retries(), 2);
    }

    #[test]
    fn host_token_prefers_inline_over_env() {
        let host = HostConfig {
            token: Some("inline".to_string()),
            token_env: Some("DOES_NOT_EXIST_FOR_TEST".to_string()),
            api_base: None,
        };
        assert_eq!(host.resolve_token().as_deref(), Some("inline"));

        let host = HostConfig {
            token: None,
            token_env: Some("DOES_NOT_EXIST_FOR_TEST".to_string()),
            api_base: None,
        };
        assert_eq!(host.resolve_token(), None);
    }
}
