//! 리뷰 도메인 엔티티/값 객체.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub url: String,
    pub dry_run: bool,
}

/// 이슈/PR 스레드의 일반 코멘트. 식별자는 외부 저장소 소유.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user: CommentAuthor,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentAuthor {
    #[serde(default)]
    pub login: String,
}

/// diff 라인에 달리는 리뷰 코멘트.
#[derive(Debug, Clone, Deserialize)]
pub struct PullComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub user: CommentAuthor,
    pub line: Option<u64>,
    pub start_line: Option<u64>,
    pub in_reply_to_id: Option<u64>,
}

impl PullComment {
    /// 이 코멘트가 덮는 [시작, 끝] 라인 범위. 단일 라인 코멘트는 양끝이 같다.
    pub fn line_range(&self) -> Option<(u64, u64)> {
        let end = self.line?;
        Some((self.start_line.unwrap_or(end), end))
    }
}

/// 리뷰 생성 요청에 실리는 라인 코멘트 레코드(와이어 형식).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DraftReviewComment {
    pub path: String,
    pub body: String,
    pub line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_side: Option<&'static str>,
}

/// 한 번의 실행 동안 메모리에 쌓이는 리뷰 발견 항목.
/// 버퍼는 제출 시점에 정확히 한 번 소비되고 버려진다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewBufferEntry {
    pub path: String,
    pub start_line: u64,
    pub end_line: u64,
    pub message: String,
}

impl ReviewBufferEntry {
    /// 제출용 와이어 레코드로 변환한다.
    /// 범위가 여러 줄이면 start_line/start_side(RIGHT)를 함께 싣는다.
    pub fn to_draft(&self) -> DraftReviewComment {
        let multi_line = self.start_line != self.end_line;
        DraftReviewComment {
            path: self.path.clone(),
            body: self.message.clone(),
            line: self.end_line,
            start_line: multi_line.then_some(self.start_line),
            start_side: multi_line.then_some("RIGHT"),
        }
    }
}

/// PR 리뷰 객체 요약(pending 정리용).
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSummary {
    pub id: u64,
    #[serde(default)]
    pub state: String,
}

/// 리뷰 대상 PR의 메타데이터.
#[derive(Debug, Clone)]
pub struct PullRequestInfo {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub base_sha: String,
    pub head_sha: String,
}

/// 변경 파일 하나의 diff.
#[derive(Debug, Clone)]
pub struct FileDiff {
    pub filename: String,
    pub patch: String,
}

/// 챗 서비스 응답. id는 후속 메시지 체이닝에 쓰인다.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub id: String,
}

/// 대화 연속성을 위한 메시지 체인 식별자.
#[derive(Debug, Clone, Default)]
pub struct ChatIds {
    pub parent_message_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_entry_has_no_start_fields() {
        let entry = ReviewBufferEntry {
            path: "file.js".to_string(),
            start_line: 5,
            end_line: 5,
            message: "note".to_string(),
        };
        let draft = entry.to_draft();
        assert_eq!(draft.line, 5);
        assert_eq!(draft.start_line, None);
        assert_eq!(draft.start_side, None);
    }

    #[test]
    fn multi_line_entry_carries_start_side_right() {
        let entry = ReviewBufferEntry {
            path: "file.js".to_string(),
            start_line: 1,
            end_line: 3,
            message: "note".to_string(),
        };
        let draft = entry.to_draft();
        assert_eq!(draft.line, 3);
        assert_eq!(draft.start_line, Some(1));
        assert_eq!(draft.start_side, Some("RIGHT"));
    }

    #[test]
    fn pull_comment_range_defaults_start_to_line() {
        let comment = PullComment {
            id: 1,
            body: "b".to_string(),
            path: "f".to_string(),
            user: CommentAuthor::default(),
            line: Some(7),
            start_line: None,
            in_reply_to_id: None,
        };
        assert_eq!(comment.line_range(), Some((7, 7)));
    }
}
