//! 설정 저장소 포트 구현 어댑터.

use anyhow::Result;

use crate::application::ports::ConfigRepository;
use crate::infrastructure::config::{Config, inspect_pretty_json, load_merged_config};

pub struct JsonConfigRepository;

impl ConfigRepository for JsonConfigRepository {
    fn load(&self) -> Result<Config> {
        Ok(load_merged_config()?.config)
    }

    fn inspect_pretty_json(&self) -> Result<String> {
        inspect_pretty_json()
    }
}
