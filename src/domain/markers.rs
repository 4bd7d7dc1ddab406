//! 코멘트 본문에 심는 마커 태그/블록 정의와 순수 문자열 변환.
//! 마커 문자열은 저장된 코멘트를 재파싱하는 와이어 포맷이므로 바이트 단위로 고정이다.

pub const COMMENT_TAG: &str = "<!-- auto-generated comment -->";
pub const COMMENT_REPLY_TAG: &str = "<!-- auto-generated reply -->";
pub const SUMMARIZE_TAG: &str = "<!-- summarize -->";

pub const IN_PROGRESS_START_TAG: &str = "<!-- summarize:in-progress:start -->";
pub const IN_PROGRESS_END_TAG: &str = "<!-- summarize:in-progress:end -->";
pub const DESCRIPTION_START_TAG: &str = "<!-- release-notes:start -->";
pub const DESCRIPTION_END_TAG: &str = "<!-- release-notes:end -->";
pub const RAW_SUMMARY_START_TAG: &str = "<!-- raw-summary:start -->";
pub const RAW_SUMMARY_END_TAG: &str = "<!-- raw-summary:end -->";
pub const SHORT_SUMMARY_START_TAG: &str = "<!-- short-summary:start -->";
pub const SHORT_SUMMARY_END_TAG: &str = "<!-- short-summary:end -->";
pub const COMMIT_ID_START_TAG: &str = "<!-- commit_ids_reviewed_start -->";
pub const COMMIT_ID_END_TAG: &str = "<!-- commit_ids_reviewed_end -->";

const IN_PROGRESS_BANNER: &str = "Currently reviewing new changes in this PR...";

/// 본문에서 "이 코멘트는 무엇인가"를 식별하는 단일 태그 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTag {
    /// 리뷰 라인 코멘트
    Comment,
    /// 봇이 이미 답글을 단 스레드의 최상위 코멘트
    Reply,
    /// PR당 하나뿐인 요약 코멘트
    Summarize,
}

impl CommentTag {
    pub const fn literal(self) -> &'static str {
        match self {
            Self::Comment => COMMENT_TAG,
            Self::Reply => COMMENT_REPLY_TAG,
            Self::Summarize => SUMMARIZE_TAG,
        }
    }
}

/// start/end 구분자 쌍을 갖는 블록 종류.
/// 구분자 상수를 한 곳에 모아 쓰는 쪽/읽는 쪽의 드리프트를 막는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerBlock {
    InProgress,
    ReleaseNotes,
    RawSummary,
    ShortSummary,
    CommitIds,
}

impl MarkerBlock {
    pub const fn start(self) -> &'static str {
        match self {
            Self::InProgress => IN_PROGRESS_START_TAG,
            Self::ReleaseNotes => DESCRIPTION_START_TAG,
            Self::RawSummary => RAW_SUMMARY_START_TAG,
            Self::ShortSummary => SHORT_SUMMARY_START_TAG,
            Self::CommitIds => COMMIT_ID_START_TAG,
        }
    }

    pub const fn end(self) -> &'static str {
        match self {
            Self::InProgress => IN_PROGRESS_END_TAG,
            Self::ReleaseNotes => DESCRIPTION_END_TAG,
            Self::RawSummary => RAW_SUMMARY_END_TAG,
            Self::ShortSummary => SHORT_SUMMARY_END_TAG,
            Self::CommitIds => COMMIT_ID_END_TAG,
        }
    }
}

/// 첫 start 태그와 그 뒤 첫 end 태그 사이의 내용을 반환한다.
/// 태그가 없으면 빈 문자열(오류 아님).
pub fn content_within(body: &str, block: MarkerBlock) -> String {
    let start_tag = block.start();
    let Some(start) = body.find(start_tag) else {
        return String::new();
    };
    let content_start = start + start_tag.len();
    let Some(end) = body[content_start..].find(block.end()) else {
        return String::new();
    };
    body[content_start..content_start + end].to_string()
}

/// 첫 start 태그부터 마지막 end 태그까지(태그 포함)를 제거한다.
/// end가 start보다 앞서는 비정상 본문에서도 예외 없이 같은 슬라이스 규칙을
/// 적용한다(기존 코멘트 본문과의 와이어 호환 유지).
pub fn remove_block(body: &str, block: MarkerBlock) -> String {
    let end_tag = block.end();
    match (body.find(block.start()), body.rfind(end_tag)) {
        (Some(start), Some(end)) => {
            format!("{}{}", &body[..start], &body[end + end_tag.len()..])
        }
        _ => body.to_string(),
    }
}

/// release-notes 블록을 제거한 사람이 쓴 PR 설명만 반환한다.
pub fn description_without_release_notes(body: &str) -> String {
    remove_block(body, MarkerBlock::ReleaseNotes)
}

/// release-notes 블록을 떼어낸 내용에서 인용줄(`>`)을 제거해 반환한다.
pub fn release_notes(body: &str) -> String {
    let content = content_within(body, MarkerBlock::ReleaseNotes);
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// 요약 코멘트 본문에서 raw summary 블록 내용을 꺼낸다.
pub fn raw_summary(body: &str) -> String {
    content_within(body, MarkerBlock::RawSummary)
}

pub fn short_summary(body: &str) -> String {
    content_within(body, MarkerBlock::ShortSummary)
}

/// 블록 내용을 새 값으로 바꾼 본문을 만든다. 블록이 없으면 끝에 덧붙인다.
pub fn set_block_content(body: &str, block: MarkerBlock, content: &str) -> String {
    let wrapped = format!("{}\n{}\n{}", block.start(), content, block.end());
    let start_tag = block.start();
    let end_tag = block.end();

    if let (Some(start), Some(end)) = (body.find(start_tag), body.rfind(end_tag)) {
        if start < end {
            return format!("{}{}{}", &body[..start], wrapped, &body[end + end_tag.len()..]);
        }
    }
    format!("{body}\n{wrapped}")
}

/// 진행중 배너 블록을 본문 맨 앞에 붙인다.
/// 이미 start 태그가 있으면 본문을 그대로 돌려준다(멱등).
/// 구분선까지 블록 안에 들어가므로 remove와 합성하면 원본이 정확히 복원된다.
pub fn add_in_progress_status(body: &str, status_msg: &str) -> String {
    if body.contains(IN_PROGRESS_START_TAG) {
        return body.to_string();
    }
    format!(
        "{IN_PROGRESS_START_TAG}\n\n{IN_PROGRESS_BANNER}\n\n{status_msg}\n\n---\n\n{IN_PROGRESS_END_TAG}{body}"
    )
}

/// 진행중 배너 블록(start..=end)을 제거한다. 없으면 원본 그대로.
pub fn remove_in_progress_status(body: &str) -> String {
    let Some(start) = body.find(IN_PROGRESS_START_TAG) else {
        return body.to_string();
    };
    let Some(end) = body.find(IN_PROGRESS_END_TAG) else {
        return body.to_string();
    };
    format!("{}{}", &body[..start], &body[end + IN_PROGRESS_END_TAG.len()..])
}

/// commit id 블록에서 리뷰 완료된 sha 목록을 삽입 순서대로 꺼낸다.
pub fn reviewed_commit_ids(body: &str) -> Vec<String> {
    let Some(start) = body.find(COMMIT_ID_START_TAG) else {
        return Vec::new();
    };
    let Some(end) = body.find(COMMIT_ID_END_TAG) else {
        return Vec::new();
    };
    let content_start = start + COMMIT_ID_START_TAG.len();
    if content_start > end {
        return Vec::new();
    }

    body[content_start..end]
        .split("<!--")
        .map(|token| token.replace("-->", "").trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

/// commit id 블록을 태그 포함 통째로 반환한다. 없으면 빈 문자열.
/// end 태그가 start보다 앞서는 비정상 본문도 빈 블록으로 취급한다.
pub fn reviewed_commit_ids_block(body: &str) -> String {
    let Some(start) = body.find(COMMIT_ID_START_TAG) else {
        return String::new();
    };
    let Some(end) = body.find(COMMIT_ID_END_TAG) else {
        return String::new();
    };
    if end < start {
        return String::new();
    }
    body[start..end + COMMIT_ID_END_TAG.len()].to_string()
}

/// commit id 블록의 end 태그 직전에 새 sha 토큰을 끼워 넣는다.
/// 블록이 없으면 본문 끝에 블록을 새로 만든다.
pub fn add_reviewed_commit_id(body: &str, commit_id: &str) -> String {
    // sha는 16진수 문자열이라 닫는 마커 시퀀스를 포함할 수 없다.
    debug_assert!(
        !commit_id.contains("-->"),
        "commit id must not contain the closing marker sequence"
    );

    let (Some(start), Some(end)) = (body.find(COMMIT_ID_START_TAG), body.find(COMMIT_ID_END_TAG))
    else {
        return format!(
            "{body}\n{COMMIT_ID_START_TAG}\n<!-- {commit_id} -->\n{COMMIT_ID_END_TAG}"
        );
    };

    let content_start = start + COMMIT_ID_START_TAG.len();
    // end 태그가 start보다 앞서는 비정상 블록은 새 블록으로 대체하지 않고
    // 본문 끝에 올바른 블록을 덧붙인다.
    if content_start > end {
        return format!(
            "{body}\n{COMMIT_ID_START_TAG}\n<!-- {commit_id} -->\n{COMMIT_ID_END_TAG}"
        );
    }
    let existing = &body[content_start..end];
    format!(
        "{}{existing}<!-- {commit_id} -->\n{}",
        &body[..content_start],
        &body[end..]
    )
}

/// 전체 커밋 목록을 최신(뒤)에서 과거(앞)로 훑어 리뷰 완료 집합에 속한
/// 첫 sha를 반환한다. 커밋 목록이 시간순이므로 이것이 최근 리뷰 지점이다.
pub fn highest_reviewed_commit_id(all_commit_ids: &[String], reviewed: &[String]) -> String {
    for id in all_commit_ids.iter().rev() {
        if reviewed.iter().any(|r| r == id) {
            return id.clone();
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_within_extracts_between_tags() {
        let body = format!("before{RAW_SUMMARY_START_TAG}extracted{RAW_SUMMARY_END_TAG}after");
        assert_eq!(content_within(&body, MarkerBlock::RawSummary), "extracted");
    }

    #[test]
    fn content_within_missing_tags_is_empty() {
        assert_eq!(content_within("no tags here", MarkerBlock::RawSummary), "");
    }

    #[test]
    fn remove_block_removes_tags_and_content() {
        let body = format!("before{DESCRIPTION_START_TAG}remove this{DESCRIPTION_END_TAG}after");
        assert_eq!(remove_block(&body, MarkerBlock::ReleaseNotes), "beforeafter");
    }

    #[test]
    fn remove_block_without_tags_returns_original() {
        assert_eq!(remove_block("no tags", MarkerBlock::ReleaseNotes), "no tags");
    }

    #[test]
    fn remove_block_keeps_slice_rule_when_end_precedes_start() {
        // 비정상 순서에서는 first-start/last-end 슬라이스 규칙이 그대로 적용되어
        // 태그 사이 텍스트가 중복된다. 기존 코멘트 본문과의 호환을 위해 고정.
        let body = format!("before{DESCRIPTION_END_TAG}middle{DESCRIPTION_START_TAG}after");
        let expected =
            format!("before{DESCRIPTION_END_TAG}middlemiddle{DESCRIPTION_START_TAG}after");
        assert_eq!(remove_block(&body, MarkerBlock::ReleaseNotes), expected);
    }

    #[test]
    fn release_notes_drops_quoted_lines() {
        let body = format!(
            "{DESCRIPTION_START_TAG}Line 1\n> Quote 1\nLine 2\n> Quote 2\nLine 3{DESCRIPTION_END_TAG}"
        );
        assert_eq!(release_notes(&body), "Line 1\nLine 2\nLine 3");
    }

    #[test]
    fn set_block_content_replaces_existing_block() {
        let body = format!("head\n{SHORT_SUMMARY_START_TAG}\nold\n{SHORT_SUMMARY_END_TAG}\ntail");
        let updated = set_block_content(&body, MarkerBlock::ShortSummary, "new");
        assert!(updated.contains("new"));
        assert!(!updated.contains("old"));
        assert!(updated.starts_with("head"));
        assert!(updated.ends_with("tail"));
    }

    #[test]
    fn set_block_content_appends_when_missing() {
        let updated = set_block_content("body", MarkerBlock::ShortSummary, "content");
        assert!(updated.starts_with("body"));
        assert!(updated.contains(SHORT_SUMMARY_START_TAG));
        assert!(updated.ends_with(SHORT_SUMMARY_END_TAG));
    }

    #[test]
    fn add_in_progress_is_idempotent() {
        let body = format!("{IN_PROGRESS_START_TAG}existing{IN_PROGRESS_END_TAG}content");
        assert_eq!(add_in_progress_status(&body, "new status"), body);
    }

    #[test]
    fn add_then_remove_in_progress_restores_body_exactly() {
        let body = "existing content";
        let with_status = add_in_progress_status(body, "Status message");
        assert!(with_status.contains(IN_PROGRESS_START_TAG));
        assert!(with_status.contains("Currently reviewing new changes"));
        assert!(with_status.contains("Status message"));
        assert!(with_status.contains(IN_PROGRESS_END_TAG));

        assert_eq!(remove_in_progress_status(&with_status), body);
    }

    #[test]
    fn remove_in_progress_without_block_returns_original() {
        assert_eq!(remove_in_progress_status("plain body"), "plain body");
    }

    #[test]
    fn reviewed_commit_ids_parses_tokens_in_order() {
        let body = format!(
            "content {COMMIT_ID_START_TAG}<!-- abc123 --><!-- def456 -->{COMMIT_ID_END_TAG} more"
        );
        assert_eq!(reviewed_commit_ids(&body), vec!["abc123", "def456"]);
    }

    #[test]
    fn reviewed_commit_ids_empty_block_and_missing_block() {
        let body = format!("content {COMMIT_ID_START_TAG}{COMMIT_ID_END_TAG} more");
        assert!(reviewed_commit_ids(&body).is_empty());
        assert!(reviewed_commit_ids("no markers here").is_empty());
    }

    #[test]
    fn reviewed_commit_ids_block_includes_tags() {
        let block = format!("{COMMIT_ID_START_TAG}<!-- abc123 -->{COMMIT_ID_END_TAG}");
        let body = format!("content {block} more");
        assert_eq!(reviewed_commit_ids_block(&body), block);
        assert_eq!(reviewed_commit_ids_block("no markers"), "");
    }

    #[test]
    fn add_reviewed_commit_id_preserves_existing_tokens() {
        let body = format!(
            "content {COMMIT_ID_START_TAG}<!-- abc123 -->\n{COMMIT_ID_END_TAG} more"
        );
        let updated = add_reviewed_commit_id(&body, "def456");
        assert!(updated.contains("<!-- abc123 -->"));
        assert!(updated.contains("<!-- def456 -->"));
        assert!(updated.contains(COMMIT_ID_END_TAG));

        let ids = reviewed_commit_ids(&updated);
        assert_eq!(ids, vec!["abc123", "def456"]);
    }

    #[test]
    fn add_reviewed_commit_id_creates_block_when_missing() {
        let updated = add_reviewed_commit_id("content without markers", "abc123");
        assert!(updated.contains(COMMIT_ID_START_TAG));
        assert!(updated.contains("<!-- abc123 -->"));
        assert!(updated.contains(COMMIT_ID_END_TAG));
        assert_eq!(reviewed_commit_ids(&updated), vec!["abc123"]);
    }

    #[test]
    fn malformed_commit_block_never_panics() {
        // end 태그가 start보다 앞서는 본문도 결정적으로(빈 블록) 처리된다.
        let body = format!("x{COMMIT_ID_END_TAG}y{COMMIT_ID_START_TAG}z");
        assert!(reviewed_commit_ids(&body).is_empty());
        assert_eq!(reviewed_commit_ids_block(&body), "");

        let updated = add_reviewed_commit_id(&body, "abc123");
        assert!(updated.contains("<!-- abc123 -->"));
    }

    #[test]
    fn highest_reviewed_commit_picks_latest_in_chronological_order() {
        let all: Vec<String> = ["commit1", "commit2", "commit3", "commit4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let reviewed: Vec<String> = ["commit1", "commit3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(highest_reviewed_commit_id(&all, &reviewed), "commit3");
    }

    #[test]
    fn highest_reviewed_commit_empty_when_nothing_reviewed() {
        let all: Vec<String> = ["commit1", "commit2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(highest_reviewed_commit_id(&all, &[]), "");
    }
}
