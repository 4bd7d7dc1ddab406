//! 설정 로딩/병합/점검 모듈.

mod inspection;
mod loader;
mod types;

pub use types::{Config, DefaultsConfig, HostConfig, OpenAiConfig};

pub(crate) use inspection::inspect_pretty_json;
pub(crate) use loader::load_merged_config;
