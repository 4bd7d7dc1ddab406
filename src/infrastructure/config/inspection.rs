//! 유효 설정 점검 출력(JSON).

use anyhow::Result;
use serde_json::json;

use super::loader::load_merged_config;

/// 비밀값을 가린 유효 설정 요약을 pretty JSON으로 만든다.
pub(crate) fn inspect_pretty_json() -> Result<String> {
    let loaded = load_merged_config()?;
    let config = &loaded.config;

    let hosts: serde_json::Map<String, serde_json::Value> = config
        .hosts
        .iter()
        .map(|(host, cfg)| {
            let token_source = if cfg.token.is_some() {
                "inline".to_string()
            } else if let Some(env_name) = &cfg.token_env {
                if cfg.resolve_token().is_some() {
                    format!("env:{env_name}")
                } else {
                    format!("env:{env_name} (missing)")
                }
            } else {
                "none".to_string()
            };
            (
                host.clone(),
                json!({
                    "token_source": token_source,
                    "api_base": cfg.api_base,
                }),
            )
        })
        .collect();

    let inspection = json!({
        "defaults": {
            "light_model": config.light_model(),
            "heavy_model": config.heavy_model(),
            "temperature": config.temperature(),
            "request_timeout_ms": config.request_timeout_ms(),
            "retries": config.retries(),
            "openai_concurrency": config.openai_concurrency(),
            "github_concurrency": config.github_concurrency(),
            "max_files": config.max_files(),
            "review_simple_changes": config.review_simple_changes(),
            "disable_review": config.disable_review(),
            "disable_release_notes": config.disable_release_notes(),
            "path_filters": config.path_filters(),
        },
        "hosts": hosts,
        "openai": {
            "api_key_configured": config.openai.resolve_api_key().is_some(),
            "api_base": config.openai.api_base,
        },
        "searched_paths": loaded
            .searched_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>(),
        "loaded_paths": loaded
            .loaded_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>(),
    });

    Ok(serde_json::to_string_pretty(&inspection)?)
}
