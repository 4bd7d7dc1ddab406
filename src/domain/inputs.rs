//! 프롬프트 템플릿 자리표시자 값 모음과 치환 규칙.

/// 템플릿에 들어갈 이름붙은 값들. 상류 데이터가 없어도 프롬프트가
/// 비거나 깨지지 않도록 필드마다 문서화된 기본 문구를 갖는다.
#[derive(Debug, Clone)]
pub struct PromptInputs {
    pub system_message: String,
    pub title: String,
    pub description: String,
    pub raw_summary: String,
    pub short_summary: String,
    pub filename: String,
    pub file_content: String,
    pub file_diff: String,
    pub patches: String,
    pub diff: String,
    pub comment_chain: String,
    pub comment: String,
}

impl Default for PromptInputs {
    fn default() -> Self {
        Self {
            system_message: String::new(),
            title: "no title provided".to_string(),
            description: "no description provided".to_string(),
            raw_summary: String::new(),
            short_summary: String::new(),
            filename: String::new(),
            file_content: "file contents cannot be provided".to_string(),
            file_diff: "file diff cannot be provided".to_string(),
            patches: String::new(),
            diff: "no diff".to_string(),
            comment_chain: "no other comments on this patch".to_string(),
            comment: "no comment provided".to_string(),
        }
    }
}

impl PromptInputs {
    /// `$이름` 자리표시자를 현재 값으로 치환한다.
    /// 값이 빈 문자열인 자리표시자는 문자 그대로 남긴다 — 값이 없는데
    /// 템플릿 구획이 조용히 비어버리는 것을 막고, 호출자가 잔여
    /// 자리표시자를 탐지해 대응할 수 있게 하는 의도된 정책이다.
    pub fn render(&self, template: &str) -> String {
        if template.is_empty() {
            return String::new();
        }

        // 긴 이름을 먼저 치환해 접두어가 겹치는 자리표시자를 보호한다.
        let substitutions: [(&str, &str); 12] = [
            ("$system_message", &self.system_message),
            ("$comment_chain", &self.comment_chain),
            ("$short_summary", &self.short_summary),
            ("$file_content", &self.file_content),
            ("$raw_summary", &self.raw_summary),
            ("$description", &self.description),
            ("$file_diff", &self.file_diff),
            ("$filename", &self.filename),
            ("$patches", &self.patches),
            ("$comment", &self.comment),
            ("$title", &self.title),
            ("$diff", &self.diff),
        ];

        let mut rendered = template.to_string();
        for (placeholder, value) in substitutions {
            if !value.is_empty() {
                rendered = rendered.replace(placeholder, value);
            }
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_document_missing_data() {
        let inputs = PromptInputs::default();
        assert_eq!(inputs.system_message, "");
        assert_eq!(inputs.title, "no title provided");
        assert_eq!(inputs.description, "no description provided");
        assert_eq!(inputs.file_content, "file contents cannot be provided");
        assert_eq!(inputs.file_diff, "file diff cannot be provided");
        assert_eq!(inputs.diff, "no diff");
        assert_eq!(inputs.comment_chain, "no other comments on this patch");
        assert_eq!(inputs.comment, "no comment provided");
    }

    #[test]
    fn render_replaces_multiple_placeholders() {
        let inputs = PromptInputs {
            title: "Test PR Title".to_string(),
            filename: "test-file.js".to_string(),
            comment: "user comment here".to_string(),
            ..Default::default()
        };
        let rendered = inputs.render("Title: $title, File: $filename, Comment: $comment");
        assert_eq!(
            rendered,
            "Title: Test PR Title, File: test-file.js, Comment: user comment here"
        );
    }

    #[test]
    fn render_keeps_placeholder_when_value_is_empty() {
        let inputs = PromptInputs::default();
        let rendered =
            inputs.render("Title: $title, Description: $description, System: $system_message");
        assert_eq!(
            rendered,
            "Title: no title provided, Description: no description provided, System: $system_message"
        );
    }

    #[test]
    fn render_does_not_touch_unknown_placeholders() {
        let inputs = PromptInputs::default();
        let template = "This has $unknown_placeholder and $another_unknown";
        assert_eq!(inputs.render(template), template);
    }

    #[test]
    fn render_empty_template_is_empty() {
        assert_eq!(PromptInputs::default().render(""), "");
    }

    #[test]
    fn overlapping_placeholder_names_do_not_clobber_each_other() {
        let inputs = PromptInputs {
            comment: "C".to_string(),
            comment_chain: "CHAIN".to_string(),
            diff: "D".to_string(),
            file_diff: "FD".to_string(),
            ..Default::default()
        };
        assert_eq!(
            inputs.render("$comment_chain|$comment|$file_diff|$diff"),
            "CHAIN|C|FD|D"
        );
    }
}
