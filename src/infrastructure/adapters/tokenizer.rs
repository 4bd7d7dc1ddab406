//! cl100k BPE 기반 토큰 계수 어댑터.

use anyhow::{Context, Result};
use tiktoken_rs::CoreBPE;

use crate::application::ports::TokenCounter;

/// GPT-4 계열이 쓰는 cl100k_base 인코딩으로 토큰을 센다.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().context("failed to load the cl100k_base tokenizer")?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}
