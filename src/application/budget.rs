//! 토큰 예산 내 프롬프트 조립.
//! 필수 본문을 먼저 확정하고, 선택 블록을 우선순위 순서로 예산이
//! 허락할 때만 통째로 넣는다(자르지 않는다). 네트워크와 무관한 순수
//! 로직이라 단독으로 검증할 수 있다.

use anyhow::{Result, bail};

use crate::application::ports::TokenCounter;

/// 선택적으로 끼워 넣을 후보 블록.
pub struct BlockCandidate {
    pub name: &'static str,
    pub content: String,
}

/// 조립이 끝난 프롬프트와 소비한 토큰 수.
pub struct PackedPrompt {
    pub text: String,
    pub tokens: usize,
    pub included: Vec<&'static str>,
    /// 포함된 후보의 원래 인덱스(후보 목록 기준).
    pub included_indices: Vec<usize>,
    pub omitted: Vec<&'static str>,
}

/// 필수 본문 + 선택 블록을 요청 예산에 맞춰 조립한다.
/// 필수 본문조차 예산을 넘으면 실패를 돌려주고, 선택 블록은 맞지
/// 않으면 건너뛰고 다음 후보로 진행한다.
pub fn pack_prompt(
    counter: &dyn TokenCounter,
    request_tokens: usize,
    base: &str,
    blocks: Vec<BlockCandidate>,
) -> Result<PackedPrompt> {
    let base_tokens = counter.count(base);
    if base_tokens > request_tokens {
        bail!("prompt exceeds the token budget: {base_tokens} > {request_tokens}");
    }

    let mut packed = PackedPrompt {
        text: base.to_string(),
        tokens: base_tokens,
        included: Vec::new(),
        included_indices: Vec::new(),
        omitted: Vec::new(),
    };

    for (index, block) in blocks.into_iter().enumerate() {
        let block_tokens = counter.count(&block.content);
        if packed.tokens + block_tokens <= request_tokens {
            packed.text.push_str(&block.content);
            packed.tokens += block_tokens;
            packed.included.push(block.name);
            packed.included_indices.push(index);
        } else {
            packed.omitted.push(block.name);
        }
    }

    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 공백 구분 단어 수를 토큰으로 치는 계수기 대역.
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn block(name: &'static str, content: &str) -> BlockCandidate {
        BlockCandidate { name, content: content.to_string() }
    }

    #[test]
    fn base_over_budget_fails() {
        let result = pack_prompt(&WordCounter, 2, "one two three", Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn blocks_fit_greedily_in_priority_order() {
        let packed = pack_prompt(
            &WordCounter,
            6,
            "base prompt",
            vec![
                block("diff", " three word block"),
                block("summary", " short"),
                block("chain", " another pair"),
            ],
        )
        .unwrap();

        // base(2) + diff(3) = 5, summary(1) = 6, chain(2)은 예산 초과로 제외.
        assert_eq!(packed.tokens, 6);
        assert_eq!(packed.included, vec!["diff", "summary"]);
        assert_eq!(packed.included_indices, vec![0, 1]);
        assert_eq!(packed.omitted, vec!["chain"]);
        assert_eq!(packed.text, "base prompt three word block short");
    }

    #[test]
    fn oversized_block_is_skipped_not_truncated() {
        let packed = pack_prompt(
            &WordCounter,
            4,
            "base prompt",
            vec![
                block("huge", " a b c d e f g"),
                block("tiny", " fits"),
            ],
        )
        .unwrap();

        assert_eq!(packed.included, vec!["tiny"]);
        assert_eq!(packed.omitted, vec!["huge"]);
        assert!(!packed.text.contains("a b c"));
        assert!(packed.text.ends_with(" fits"));
    }

    #[test]
    fn exact_fit_is_included() {
        let packed = pack_prompt(
            &WordCounter,
            4,
            "base prompt",
            vec![block("pair", " exactly two")],
        )
        .unwrap();
        assert_eq!(packed.tokens, 4);
        assert_eq!(packed.included, vec!["pair"]);
    }
}
