//! Segment assembly.
//!
//! `parse` is the entry point callers re-invoke on the entire buffer after
//! every streamed chunk. It is total (malformed input degrades to text) and
//! holds no state between calls, so a caller can restart at any time.

use regex::Regex;
use std::sync::OnceLock;

use crate::halfopen;
use crate::segment::{ActionButton, Segment};
use crate::tokenizer::{self, ScanItem, TagToken};

const ACTION_BUTTON_PATTERN: &str =
    r#"<action_button\s+type="(?P<type>[^"]+)">(?P<content>(?s:.*?))</action_button>"#;

fn action_button_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(ACTION_BUTTON_PATTERN).unwrap())
}

/// Parse the full buffer into ordered segments.
pub fn parse(buffer: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for item in tokenizer::scan(buffer) {
        match item {
            ScanItem::Gap { start, end } => {
                close_pending(&mut segments, false);
                halfopen::split_gap(&buffer[start..end], &mut segments);
            }
            ScanItem::Tag { token, .. } => {
                let failed = matches!(
                    token,
                    TagToken::Scenario { .. } | TagToken::Button { .. }
                );
                close_pending(&mut segments, failed);
                push_token(&mut segments, token);
            }
        }
    }
    segments
}

/// Close the most recently emitted still-loading Progress or ToolCall.
///
/// At most one segment can be loading when a new one begins (anything earlier
/// was closed when its successor started), so the first hit from the back is
/// the only one. `failed` only ever lands on Progress.
fn close_pending(segments: &mut [Segment], failed: bool) {
    for segment in segments.iter_mut().rev() {
        match segment {
            Segment::Progress {
                loading,
                failed: f,
                ..
            } if *loading => {
                *loading = false;
                *f = failed;
                return;
            }
            Segment::ToolCall { loading, .. } if *loading => {
                *loading = false;
                return;
            }
            _ => {}
        }
    }
}

fn push_token(segments: &mut Vec<Segment>, token: TagToken) {
    match token {
        TagToken::Code {
            file_name,
            language,
            command,
            body,
        } => segments.push(Segment::Code {
            file_name,
            language,
            command,
            text: body.trim().to_string(),
            loading: false,
        }),
        TagToken::Progress { body } => segments.push(Segment::Progress {
            text: body,
            loading: true,
            failed: false,
        }),
        TagToken::ToolCall { body } => {
            let (text, action_buttons) = extract_action_buttons(&body);
            segments.push(Segment::ToolCall {
                text,
                loading: true,
                action_buttons,
            });
        }
        TagToken::ToolResult { body } => {
            let (text, action_buttons) = extract_action_buttons(&body);
            segments.push(Segment::ToolResult {
                text,
                loading: false,
                action_buttons,
            });
        }
        TagToken::Todo { body } => match serde_json::from_str(&body) {
            Ok(payload) => segments.push(Segment::Todo {
                text: body.trim().to_string(),
                payload,
            }),
            Err(err) => tracing::debug!(%err, "dropping todo with invalid payload"),
        },
        TagToken::Attachment { body } => {
            let name = body.trim();
            let existing = segments
                .iter_mut()
                .find(|s| matches!(s, Segment::Attachment { .. }));
            match existing {
                Some(Segment::Attachment { text }) => {
                    text.push_str(", ");
                    text.push_str(name);
                }
                _ => segments.push(Segment::Attachment {
                    text: name.to_string(),
                }),
            }
        }
        TagToken::Scenario { body } => segments.push(Segment::TestScenario {
            text: body.trim().to_string(),
        }),
        TagToken::Button { button_type, body } => segments.push(Segment::Button {
            button_type,
            text: body.trim().to_string(),
        }),
        TagToken::InlineCode { body } => segments.push(Segment::InlineCode {
            text: body.trim().to_string(),
        }),
        TagToken::References { body } => segments.push(Segment::References {
            text: body.trim().to_string(),
        }),
        TagToken::ConnectorGenerator { body } => match serde_json::from_str(&body) {
            Ok(payload) => segments.push(Segment::SpecFetcher {
                text: body.trim().to_string(),
                payload,
            }),
            Err(err) => {
                tracing::debug!(%err, "dropping connector generator with invalid payload")
            }
        },
        TagToken::ReviewActions { body } => segments.push(Segment::ReviewActions {
            text: body.trim().to_string(),
        }),
        TagToken::ConfigurationCollector { body } => match serde_json::from_str(&body) {
            Ok(payload) => segments.push(Segment::ConfigurationCollector {
                text: body.trim().to_string(),
                payload,
            }),
            Err(err) => {
                tracing::debug!(%err, "dropping configuration collector with invalid payload")
            }
        },
    }
}

/// Pull `<action_button>` spans out of a tool call/result body; the remainder
/// becomes the segment text.
fn extract_action_buttons(body: &str) -> (String, Vec<ActionButton>) {
    let mut buttons = Vec::new();
    let mut text = String::with_capacity(body.len());
    let mut last = 0;
    for caps in action_button_pattern().captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        let (Some(ty), Some(content)) = (caps.name("type"), caps.name("content")) else {
            continue;
        };
        text.push_str(&body[last..whole.start()]);
        buttons.push(ActionButton::new(ty.as_str(), content.as_str().trim()));
        last = whole.end();
    }
    text.push_str(&body[last..]);
    (text.trim().to_string(), buttons)
}
