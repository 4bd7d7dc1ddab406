//! 챗 에이전트 팩토리 어댑터.

use anyhow::{Context, Result};

use crate::application::ports::{ChatAgent, ChatFactory};
use crate::infrastructure::config::Config;
use crate::infrastructure::providers::OpenAiChatClient;

pub struct ChatFactoryAdapter;

impl ChatFactory for ChatFactoryAdapter {
    fn build(
        &self,
        config: &Config,
        model: &str,
        system_message: &str,
    ) -> Result<Box<dyn ChatAgent>> {
        // API 키가 없으면 리뷰를 진행할 수 없다.
        let api_key = config.openai.resolve_api_key().context(
            "missing OpenAI API key. Configure openai.api_key or openai.api_key_env (default OPENAI_API_KEY)",
        )?;

        Ok(Box::new(OpenAiChatClient::new(
            config.openai.api_base.clone(),
            api_key,
            model.to_string(),
            config.temperature(),
            system_message.to_string(),
            config.request_timeout_ms(),
            config.retries(),
        )))
    }
}
