//! Provider HTTP API 호출 공용 유틸리티.

use std::time::Duration;

use reqwest::Client;

/// Provider API 호출용 기본 HTTP 클라이언트를 생성한다.
pub fn build_api_client(timeout_ms: u64) -> Client {
    // TLS 설정 실패 등 예외 상황에서는 기본 클라이언트로 폴백한다.
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// 상태 코드가 재시도할 가치가 있는 일시 오류인지 판단한다.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_are_transient_only() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(401));
        assert!(!is_retryable_status(404));
    }
}
