//! unified diff 헝크 분해와 모델 리뷰 응답 파싱.

/// 패치 헝크 하나. 라인 번호는 새(RIGHT) 쪽 기준이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchHunk {
    pub start_line: u64,
    pub end_line: u64,
    pub content: String,
}

/// 모델 응답에서 뽑아낸 라인 범위 발견 항목.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub start_line: u64,
    pub end_line: u64,
    pub comment: String,
}

/// 파일 패치를 헝크 단위로 나눈다. 새 쪽 라인이 없는(삭제 전용) 헝크는
/// 코멘트를 달 자리가 없으므로 건너뛴다.
pub fn split_patch(patch: &str) -> Vec<PatchHunk> {
    let mut hunks: Vec<PatchHunk> = Vec::new();

    for line in patch.lines() {
        if let Some((start, count)) = parse_hunk_header(line) {
            if count == 0 {
                hunks.push(PatchHunk {
                    start_line: 0,
                    end_line: 0,
                    content: String::new(),
                });
                continue;
            }
            hunks.push(PatchHunk {
                start_line: start,
                end_line: start + count - 1,
                content: format!("{line}\n"),
            });
            continue;
        }

        if let Some(hunk) = hunks.last_mut() {
            if hunk.end_line > 0 {
                hunk.content.push_str(line);
                hunk.content.push('\n');
            }
        }
    }

    hunks.retain(|h| h.end_line > 0);
    hunks
}

/// `@@ -a,b +c,d @@` 헤더에서 새 쪽 (시작, 개수)를 읽는다. 개수 생략은 1.
fn parse_hunk_header(line: &str) -> Option<(u64, u64)> {
    let rest = line.strip_prefix("@@ ")?;
    let end = rest.find(" @@")?;
    let ranges = &rest[..end];
    let new_side = ranges.split_whitespace().find(|part| part.starts_with('+'))?;
    let new_side = new_side.strip_prefix('+')?;

    match new_side.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((new_side.parse().ok()?, 1)),
    }
}

/// 모델 리뷰 응답을 파싱한다. 형식:
/// `시작-끝:` 라인 뒤에 코멘트 본문이 오고 `---` 구분선으로 닫힌다.
/// "LGTM" 판정 항목은 게시할 내용이 없으므로 버린다.
pub fn parse_review(response: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut current: Option<(u64, u64, Vec<String>)> = None;

    for line in response.lines() {
        if let Some((start, end)) = parse_range_line(line) {
            flush(&mut findings, current.take());
            current = Some((start, end, Vec::new()));
            continue;
        }

        if line.trim() == "---" {
            flush(&mut findings, current.take());
            continue;
        }

        if let Some((_, _, body)) = current.as_mut() {
            // 모델이 코멘트를 코드펜스로 감싸는 경우 펜스 라인만 걷어낸다.
            if body.is_empty() && line.trim() == "```" {
                continue;
            }
            body.push(line.to_string());
        }
    }

    flush(&mut findings, current.take());
    findings
}

fn parse_range_line(line: &str) -> Option<(u64, u64)> {
    let trimmed = line.trim().strip_suffix(':')?;
    let (start, end) = trimmed.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;
    let end: u64 = end.trim().parse().ok()?;
    (start <= end).then_some((start, end))
}

fn flush(findings: &mut Vec<Finding>, current: Option<(u64, u64, Vec<String>)>) {
    let Some((start, end, body)) = current else {
        return;
    };

    let mut lines: Vec<&str> = body.iter().map(String::as_str).collect();
    while lines.last().is_some_and(|l| l.trim().is_empty() || l.trim() == "```") {
        lines.pop();
    }

    let comment = lines.join("\n").trim().to_string();
    if comment.is_empty() || comment.starts_with("LGTM") {
        return;
    }

    findings.push(Finding {
        start_line: start,
        end_line: end,
        comment,
    });
}

/// 발견 항목을 헝크 경계에 맞춘다. 겹치는 헝크가 있으면 그 경계로
/// 잘라내고, 어느 헝크와도 겹치지 않으면 버린다(잘못된 라인 번호에
/// 리뷰를 달 수 없다).
pub fn fit_findings_to_hunks(findings: Vec<Finding>, hunks: &[PatchHunk]) -> Vec<Finding> {
    findings
        .into_iter()
        .filter_map(|finding| {
            let hunk = hunks.iter().find(|h| {
                finding.start_line <= h.end_line && finding.end_line >= h.start_line
            })?;
            Some(Finding {
                start_line: finding.start_line.max(hunk.start_line),
                end_line: finding.end_line.min(hunk.end_line),
                comment: finding.comment,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATCH: &str = "@@ -1,3 +1,4 @@\n context\n+added line\n context2\n context3\n@@ -10,2 +11,3 @@\n context\n+another added\n context\n";

    #[test]
    fn split_patch_extracts_new_side_ranges() {
        let hunks = split_patch(PATCH);
        assert_eq!(hunks.len(), 2);
        assert_eq!((hunks[0].start_line, hunks[0].end_line), (1, 4));
        assert_eq!((hunks[1].start_line, hunks[1].end_line), (11, 13));
        assert!(hunks[0].content.starts_with("@@ -1,3 +1,4 @@"));
        assert!(hunks[0].content.contains("+added line"));
    }

    #[test]
    fn split_patch_skips_deletion_only_hunks() {
        let patch = "@@ -5,2 +4,0 @@\n-gone\n-also gone\n@@ -10,1 +8,2 @@\n old\n+new\n";
        let hunks = split_patch(patch);
        assert_eq!(hunks.len(), 1);
        assert_eq!((hunks[0].start_line, hunks[0].end_line), (8, 9));
    }

    #[test]
    fn hunk_header_without_count_defaults_to_one() {
        assert_eq!(parse_hunk_header("@@ -3 +7 @@"), Some((7, 1)));
        assert_eq!(parse_hunk_header("@@ -1,2 +3,4 @@ fn main()"), Some((3, 4)));
        assert_eq!(parse_hunk_header("not a header"), None);
    }

    #[test]
    fn parse_review_reads_ranges_and_comments() {
        let response = "1-3:\nThis loop leaks the handle.\n---\n5-5:\nTypo in constant name.\n---\n";
        let findings = parse_review(response);
        assert_eq!(findings.len(), 2);
        assert_eq!((findings[0].start_line, findings[0].end_line), (1, 3));
        assert_eq!(findings[0].comment, "This loop leaks the handle.");
        assert_eq!((findings[1].start_line, findings[1].end_line), (5, 5));
    }

    #[test]
    fn parse_review_drops_lgtm_and_empty_findings() {
        let response = "1-2:\nLGTM!\n---\n4-6:\n\n---\n8-9:\nReal issue here.\n---\n";
        let findings = parse_review(response);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].comment, "Real issue here.");
    }

    #[test]
    fn parse_review_ignores_malformed_range_lines() {
        let response = "9-3:\nbackwards range\n---\nabc-def:\nnot numbers\n---\n";
        assert!(parse_review(response).is_empty());
    }

    #[test]
    fn fit_findings_clamps_to_overlapping_hunk() {
        let hunks = split_patch(PATCH);
        let findings = vec![
            Finding { start_line: 2, end_line: 8, comment: "a".to_string() },
            Finding { start_line: 100, end_line: 110, comment: "b".to_string() },
        ];
        let fitted = fit_findings_to_hunks(findings, &hunks);
        assert_eq!(fitted.len(), 1);
        assert_eq!((fitted[0].start_line, fitted[0].end_line), (2, 4));
    }
}
