//! 리뷰/요약 단계 프롬프트 템플릿.
//! `$이름` 자리표시자는 `PromptInputs::render`로 치환된다.

/// 파일 하나의 diff 요약 + 트리아지 요청.
pub const SUMMARIZE_FILE_DIFF: &str = r#"## GitHub PR Title

$title

## Description

$description

## Diff

```diff
$file_diff
```

## Instructions

I would like you to succinctly summarize the diff within 100 words.
If applicable, your summary should include a note about alterations to the
signatures of exported functions, global data structures and variables, and
any changes that might affect the external interface or behavior of the code.

Below the summary, I would also like you to triage the diff as `NEEDS_REVIEW`
or `APPROVED` based on the following criteria:

- If the diff involves any modifications to the logic or functionality, even
  if they seem minor, triage it as `NEEDS_REVIEW`.
- If the diff only contains very minor changes that don't affect the code
  logic, such as fixing typos, formatting, or renaming variables for clarity,
  triage it as `APPROVED`.

You must strictly follow the format below for triaging the diff:
[TRIAGE]: <NEEDS_REVIEW or APPROVED>
"#;

/// 파일별 요약 모음을 중복 제거/그룹핑해 다듬는 요청.
pub const SUMMARIZE_CHANGESETS: &str = r#"Provided below are changesets in this pull request. Changesets are in chronological order and new changesets are appended to the end of the list. The format consists of filename(s) and the summary of changes for those files. There is a separator between each changeset.
Your task is to deduplicate and group together files with related/similar changes into a single changeset. Respond with the updated changesets using the same format as the input.

$raw_summary
"#;

/// 최종 요약 코멘트 본문 생성 요청.
pub const SUMMARIZE: &str = r#"Here is the summary of changes you have generated for files:

```
$raw_summary
```

Provide your final response in markdown with a walkthrough of the changes: a high-level summary of the overall change instead of specific files within 80 words, followed by a table of files and their summaries. Group files with similar changes together into a single row to save space.
"#;

/// 대화/설명용 짧은 요약 생성 요청.
pub const SUMMARIZE_SHORT: &str = r#"Here is the summary of changes you have generated for files:

```
$raw_summary
```

Your task is to provide a concise summary of the changes. This summary will be used as a prompt while reviewing each file and must be very clear for the AI bot to understand. Instructions:

- Focus on summarizing only the changes in the PR and stick to the facts.
- Do not provide any instructions to the bot in this summary.
- Do not mention that files need a through review or caution about potential issues.
- Do not mention that these changes affect the logic or functionality of the code.
- The summary should not exceed 500 words.
"#;

/// PR 설명에 붙일 릴리스 노트 생성 요청.
pub const SUMMARIZE_RELEASE_NOTES: &str = r#"Here is the summary of changes you have generated for files:

```
$raw_summary
```

Create concise release notes in `Markdown` format for this pull request, focusing on its purpose and user story. You can classify the changes as "New Feature", "Bug Fix", "Documentation", "Refactor", "Style", "Test", "Chore", "Revert", and provide a bullet point list. For example: "New Feature: An integrations page was added to the UI". Keep your response within 50-100 words. Avoid making reference to specific files, repositories, or organizations.
"#;

/// 파일 리뷰 요청의 필수 앞부분. diff 헝크 블록이 예산에 맞춰 뒤에 붙는다.
pub const REVIEW_FILE_DIFF: &str = r#"## GitHub PR Title

$title

## Description

$description

## Summary of changes

$short_summary

## File being reviewed

$filename

## Instructions

Review the new hunks of the diff below for substantive issues: logic errors, security problems, data loss, race conditions, and broken behavior. Do not comment on style, formatting, or trivia. Line numbers in your response must refer to the new side of the diff and stay within a single hunk's line range.

Respond only in the following format, one finding per block, closed by a `---` separator line:

<start_line>-<end_line>:
<review comment>
---

If a hunk has no substantive issues, respond for it with:

<start_line>-<end_line>:
LGTM!
---
"#;

/// 리뷰 스레드 답글 요청의 필수 앞부분.
pub const COMMENT_RESPONSE: &str = r#"A comment was made on a GitHub PR review for a diff hunk on a file - `$filename`. I would like you to follow the instructions in that comment.

## GitHub PR Title

$title

## Description

$description

## Summary of changes

$short_summary

## Comment to respond to

$comment

Reply directly to the comment above. Keep the reply short and to the point; do not repeat the surrounding context back.
"#;
