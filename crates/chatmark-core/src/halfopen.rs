//! Half-open code detection for the gaps between closed tags.
//!
//! While a code block is still streaming, the buffer ends with an opened
//! `<code>` tag and fence but no closers. That tail lives in the final gap of
//! the scan; this module turns it into a leading Text segment plus a loading
//! Code segment instead of letting raw markup leak into prose.

use regex::Regex;
use std::sync::OnceLock;

use crate::segment::Segment;
use crate::tokenizer::command_for_type;

/// An opened code tag plus fence and language, with no closing fence before
/// the end of the span. Greedy body: everything streamed so far belongs to it.
const HALF_OPEN_PATTERN: &str = r#"<code\s+filename="(?P<file>[^"]+)"(?:\s+type="(?P<ty>test|ai_map|type_creator)")?>\s*```(?P<lang>\w+)\s*(?P<body>(?s:.*))"#;

const SUGGESTION_OPEN: &str = "<prompt_suggestion>";
const SUGGESTION_CLOSE: &str = "</prompt_suggestion>";

fn half_open_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(HALF_OPEN_PATTERN).unwrap())
}

/// Drop a trailing prompt suggestion that has not closed yet, so an in-flight
/// suggestion tag never renders as text. Also drops a trailing partial prefix
/// of the opener (`<prompt_sug`) still streaming in.
pub fn strip_open_suggestion(text: &str) -> &str {
    if let Some(idx) = text.rfind(SUGGESTION_OPEN) {
        if !text[idx..].contains(SUGGESTION_CLOSE) {
            return &text[..idx];
        }
    }
    // partial opener at the tail; two chars minimum so a lone '<' in prose survives
    for len in (2..SUGGESTION_OPEN.len()).rev() {
        if text.ends_with(&SUGGESTION_OPEN[..len]) {
            return &text[..text.len() - len];
        }
    }
    text
}

/// Split one gap's text into segments, detecting a half-open code block.
///
/// The leading text carries the code tag's command so the UI can label the
/// block before it closes. Unbalanced fences never panic; the worst case is
/// the whole span staying plain text.
pub fn split_gap(text: &str, out: &mut Vec<Segment>) {
    let text = strip_open_suggestion(text);
    if text.is_empty() {
        return;
    }

    let Some(caps) = half_open_pattern().captures(text) else {
        out.push(Segment::text(text));
        return;
    };
    let Some(whole) = caps.get(0) else {
        out.push(Segment::text(text));
        return;
    };

    let command = command_for_type(caps.name("ty").map(|m| m.as_str()));
    let leading = &text[..whole.start()];
    if !leading.is_empty() {
        out.push(Segment::Text {
            text: leading.to_string(),
            command: Some(command.clone()),
        });
    }

    let file_name = caps.name("file").map(|m| m.as_str()).unwrap_or_default();
    let language = caps.name("lang").map(|m| m.as_str()).unwrap_or_default();
    let body = caps.name("body").map(|m| m.as_str()).unwrap_or_default();
    out.push(Segment::Code {
        file_name: file_name.to_string(),
        language: language.to_string(),
        command,
        text: body.to_string(),
        loading: true,
    });
}
