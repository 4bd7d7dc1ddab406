//! 모델별 토큰 한도 테이블.

/// 요청 예산 계산 시 항상 남겨두는 안전 여유분.
pub const TOKEN_MARGIN: usize = 100;

/// 모델 하나의 토큰 예산 프로필.
/// 요청 가능 토큰은 저장하지 않고 매번 유도한다(stale 캐시 방지).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLimits {
    pub max_tokens: usize,
    pub response_tokens: usize,
    pub knowledge_cut_off: &'static str,
}

impl TokenLimits {
    /// 알려진 모델 이름을 프로필로 변환한다.
    /// 모르는 이름(대소문자 불일치 포함)은 최소 기본 프로필로 폴백한다.
    pub fn for_model(model: &str) -> Self {
        let (max_tokens, response_tokens) = match model {
            "gpt-3.5-turbo-16k" => (16_300, 3_000),
            "gpt-4" => (8_000, 2_000),
            "gpt-4-32k" => (32_600, 4_000),
            "gpt-4o" => (128_000, 4_096),
            // "gpt-3.5-turbo" 포함 기본 프로필
            _ => (4_000, 1_000),
        };

        Self {
            max_tokens,
            response_tokens,
            knowledge_cut_off: "2021-09-01",
        }
    }

    /// 프롬프트에 쓸 수 있는 토큰 수. max에서 응답 예약분과 여유분을 뺀 값.
    pub fn request_tokens(&self) -> usize {
        self.max_tokens - self.response_tokens - TOKEN_MARGIN
    }

    /// 로그 출력용 요약 문자열.
    pub fn describe(&self) -> String {
        format!(
            "max_tokens={}, request_tokens={}, response_tokens={}",
            self.max_tokens,
            self.request_tokens(),
            self.response_tokens
        )
    }
}

impl Default for TokenLimits {
    fn default() -> Self {
        Self::for_model("gpt-3.5-turbo")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_profiles() {
        let limits = TokenLimits::for_model("gpt-3.5-turbo");
        assert_eq!(limits.max_tokens, 4_000);
        assert_eq!(limits.response_tokens, 1_000);
        assert_eq!(limits.request_tokens(), 2_900);
        assert_eq!(limits.knowledge_cut_off, "2021-09-01");

        let limits = TokenLimits::for_model("gpt-3.5-turbo-16k");
        assert_eq!(limits.max_tokens, 16_300);
        assert_eq!(limits.response_tokens, 3_000);
        assert_eq!(limits.request_tokens(), 13_200);

        let limits = TokenLimits::for_model("gpt-4");
        assert_eq!(limits.max_tokens, 8_000);
        assert_eq!(limits.response_tokens, 2_000);
        assert_eq!(limits.request_tokens(), 5_900);

        let limits = TokenLimits::for_model("gpt-4-32k");
        assert_eq!(limits.max_tokens, 32_600);
        assert_eq!(limits.response_tokens, 4_000);
        assert_eq!(limits.request_tokens(), 28_500);

        let limits = TokenLimits::for_model("gpt-4o");
        assert_eq!(limits.max_tokens, 128_000);
        assert_eq!(limits.response_tokens, 4_096);
        assert_eq!(limits.request_tokens(), 123_804);
    }

    #[test]
    fn unknown_or_malformed_model_falls_back_to_default() {
        for name in ["unknown-model", "", "GPT-4", "gpt-6"] {
            let limits = TokenLimits::for_model(name);
            assert_eq!(limits.max_tokens, 4_000);
            assert_eq!(limits.response_tokens, 1_000);
            assert_eq!(limits.request_tokens(), 2_900);
        }
    }

    #[test]
    fn budget_identity_holds_for_every_profile() {
        for name in ["gpt-3.5-turbo", "gpt-3.5-turbo-16k", "gpt-4", "gpt-4-32k", "gpt-4o"] {
            let limits = TokenLimits::for_model(name);
            assert_eq!(
                limits.request_tokens() + limits.response_tokens + TOKEN_MARGIN,
                limits.max_tokens
            );
        }
    }

    #[test]
    fn describe_formats_all_limits() {
        assert_eq!(
            TokenLimits::for_model("gpt-4").describe(),
            "max_tokens=8000, request_tokens=5900, response_tokens=2000"
        );
        assert_eq!(
            TokenLimits::for_model("gpt-4o").describe(),
            "max_tokens=128000, request_tokens=123804, response_tokens=4096"
        );
    }
}
