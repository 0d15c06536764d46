//! Closed-tag tokenizer.
//!
//! A single alternation pattern is run over the whole buffer on every parse.
//! Matching is leftmost-first and non-overlapping; anything the pattern does
//! not recognize (truncated tags, bad quoting, unknown attrs) falls into the
//! gaps between matches and is handled downstream as plain text.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Every closed tag form the assistant can emit, one alternation branch each.
/// The code branch comes first so a code block containing other tag text is
/// consumed whole. `<inlineCode>` and `<references>` are closed by a second
/// opener-shaped token; that is the wire format, not a typo.
const TAG_PATTERN: &str = concat!(
    r#"<code\s+filename="(?P<code_file>[^"]+)"(?:\s+type="(?P<code_type>test|ai_map|type_creator)")?>\s*```(?P<code_lang>\w+)\s*(?P<code_body>(?s:.*?))```\s*</code>"#,
    r#"|<progress>(?P<progress>(?s:.*?))</progress>"#,
    r#"|<toolcall(?:\s[^>]*)?>(?P<toolcall>(?s:.*?))</toolcall>"#,
    r#"|<toolresult(?:\s[^>]*)?>(?P<toolresult>(?s:.*?))</toolresult>"#,
    r#"|<todo>(?P<todo>(?s:.*?))</todo>"#,
    r#"|<attachment>(?P<attachment>(?s:.*?))</attachment>"#,
    r#"|<scenario>(?P<scenario>(?s:.*?))</scenario>"#,
    r#"|<button\s+type="(?P<button_type>[^"]+)">(?P<button>(?s:.*?))</button>"#,
    r#"|<inlineCode>(?P<inline_code>(?s:.*?))<inlineCode>"#,
    r#"|<references>(?P<references>(?s:.*?))<references>"#,
    r#"|<connectorgenerator>(?P<connector>(?s:.*?))</connectorgenerator>"#,
    r#"|<reviewactions>(?P<reviewactions>(?s:.*?))</reviewactions>"#,
    r#"|<configurationcollector>(?P<collector>(?s:.*?))</configurationcollector>"#,
);

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(TAG_PATTERN).unwrap())
}

/// A recognized closed tag, with tag-specific fields already pulled out.
#[derive(Debug, Clone, PartialEq)]
pub enum TagToken {
    Code {
        file_name: String,
        language: String,
        command: String,
        body: String,
    },
    Progress {
        body: String,
    },
    ToolCall {
        body: String,
    },
    ToolResult {
        body: String,
    },
    Todo {
        body: String,
    },
    Attachment {
        body: String,
    },
    Scenario {
        body: String,
    },
    Button {
        button_type: String,
        body: String,
    },
    InlineCode {
        body: String,
    },
    References {
        body: String,
    },
    ConnectorGenerator {
        body: String,
    },
    ReviewActions {
        body: String,
    },
    ConfigurationCollector {
        body: String,
    },
}

impl TagToken {
    fn from_captures(caps: &Captures) -> Option<Self> {
        if let Some(file) = caps.name("code_file") {
            let language = caps.name("code_lang")?.as_str().to_string();
            let body = caps.name("code_body")?.as_str().to_string();
            return Some(TagToken::Code {
                file_name: file.as_str().to_string(),
                language,
                command: command_for_type(caps.name("code_type").map(|m| m.as_str())),
                body,
            });
        }
        if let Some(m) = caps.name("progress") {
            return Some(TagToken::Progress {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("toolcall") {
            return Some(TagToken::ToolCall {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("toolresult") {
            return Some(TagToken::ToolResult {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("todo") {
            return Some(TagToken::Todo {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("attachment") {
            return Some(TagToken::Attachment {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("scenario") {
            return Some(TagToken::Scenario {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("button") {
            let button_type = caps.name("button_type")?.as_str().to_string();
            return Some(TagToken::Button {
                button_type,
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("inline_code") {
            return Some(TagToken::InlineCode {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("references") {
            return Some(TagToken::References {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("connector") {
            return Some(TagToken::ConnectorGenerator {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("reviewactions") {
            return Some(TagToken::ReviewActions {
                body: m.as_str().to_string(),
            });
        }
        if let Some(m) = caps.name("collector") {
            return Some(TagToken::ConfigurationCollector {
                body: m.as_str().to_string(),
            });
        }
        None
    }
}

/// The code tag's type attr doubles as the command name; absent means "code".
pub fn command_for_type(type_attr: Option<&str>) -> String {
    match type_attr {
        Some(t) if !t.is_empty() => t.trim_matches('"').to_string(),
        _ => "code".to_string(),
    }
}

/// One item of a scan: either unmatched text or a recognized tag, both with
/// their byte span in the buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanItem {
    Gap { start: usize, end: usize },
    Tag { start: usize, end: usize, token: TagToken },
}

impl ScanItem {
    pub fn start(&self) -> usize {
        match self {
            ScanItem::Gap { start, .. } | ScanItem::Tag { start, .. } => *start,
        }
    }
}

/// Scan the whole buffer into an ordered list of tags and the gaps around
/// them. Pure function of the buffer: the compiled pattern is process-wide
/// and no position survives between calls.
pub fn scan(buffer: &str) -> Vec<ScanItem> {
    let mut items = Vec::new();
    let mut last = 0;
    for caps in tag_pattern().captures_iter(buffer) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            items.push(ScanItem::Gap {
                start: last,
                end: whole.start(),
            });
        }
        if let Some(token) = TagToken::from_captures(&caps) {
            items.push(ScanItem::Tag {
                start: whole.start(),
                end: whole.end(),
                token,
            });
        }
        last = whole.end();
    }
    if last < buffer.len() {
        items.push(ScanItem::Gap {
            start: last,
            end: buffer.len(),
        });
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_empty_buffer() {
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_scan_plain_text_is_one_gap() {
        let items = scan("no tags here");
        assert_eq!(
            items,
            vec![ScanItem::Gap {
                start: 0,
                end: "no tags here".len()
            }]
        );
    }

    #[test]
    fn test_scan_closed_code_block() {
        let buffer = "<code filename=\"a.bal\">\n```ballerina\nfoo()\n```\n</code>";
        let items = scan(buffer);
        assert_eq!(items.len(), 1);
        match &items[0] {
            ScanItem::Tag {
                start,
                end,
                token:
                    TagToken::Code {
                        file_name,
                        language,
                        command,
                        body,
                    },
            } => {
                assert_eq!(*start, 0);
                assert_eq!(*end, buffer.len());
                assert_eq!(file_name, "a.bal");
                assert_eq!(language, "ballerina");
                assert_eq!(command, "code");
                assert_eq!(body, "foo()\n");
            }
            other => panic!("expected code tag, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_code_type_attr_sets_command() {
        let buffer = "<code filename=\"t.bal\" type=\"test\">\n```ballerina\nx\n```\n</code>";
        match &scan(buffer)[0] {
            ScanItem::Tag {
                token: TagToken::Code { command, .. },
                ..
            } => assert_eq!(command, "test"),
            other => panic!("expected code tag, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_gaps_surround_matches() {
        let buffer = "before <progress>p</progress> after";
        let items = scan(buffer);
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], ScanItem::Gap { start: 0, .. }));
        assert!(matches!(
            items[1],
            ScanItem::Tag {
                token: TagToken::Progress { .. },
                ..
            }
        ));
        assert!(matches!(items[2], ScanItem::Gap { .. }));
    }

    #[test]
    fn test_scan_toolcall_attrs_ignored() {
        let items = scan("<toolcall name=\"run\" id=\"1\">body</toolcall>");
        match &items[0] {
            ScanItem::Tag {
                token: TagToken::ToolCall { body },
                ..
            } => assert_eq!(body, "body"),
            other => panic!("expected toolcall, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_pseudo_closer_tags() {
        let items = scan("<inlineCode>x + y<inlineCode> and <references>[1]<references>");
        assert!(matches!(
            items[0],
            ScanItem::Tag {
                token: TagToken::InlineCode { .. },
                ..
            }
        ));
        assert!(matches!(
            items[2],
            ScanItem::Tag {
                token: TagToken::References { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_scan_malformed_tag_falls_into_gap() {
        // missing quote around the filename: not a recognized tag
        let buffer = "<code filename=a.bal>\n```ballerina\nfoo()\n```\n</code>";
        let items = scan(buffer);
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], ScanItem::Gap { .. }));
    }

    #[test]
    fn test_scan_button_with_type() {
        match &scan("<button type=\"primary\">Run</button>")[0] {
            ScanItem::Tag {
                token: TagToken::Button { button_type, body },
                ..
            } => {
                assert_eq!(button_type, "primary");
                assert_eq!(body, "Run");
            }
            other => panic!("expected button, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_is_deterministic() {
        let buffer = "a <progress>p</progress> b <todo>{}</todo> c";
        assert_eq!(scan(buffer), scan(buffer));
    }

    #[test]
    fn test_scan_order_is_ascending_by_start() {
        let buffer = "x<progress>1</progress>y<scenario>2</scenario>z";
        let items = scan(buffer);
        let starts: Vec<usize> = items.iter().map(|i| i.start()).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }
}
