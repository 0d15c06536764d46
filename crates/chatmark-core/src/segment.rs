use serde::{Deserialize, Serialize};

/// One typed span of an assistant response.
///
/// A parse of the full buffer yields segments in ascending order of their
/// source span start; renderers consume them as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Plain prose between tags. `command` is set when the text fronts a
    /// half-open code block and names the code tag's type attr.
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },

    /// A fenced code block addressed to a file. `loading` while the closing
    /// fence has not streamed in yet.
    Code {
        file_name: String,
        language: String,
        command: String,
        text: String,
        loading: bool,
    },

    /// A progress note. The only variant that can end up failed.
    Progress {
        text: String,
        loading: bool,
        failed: bool,
    },

    /// A tool invocation. Starts loading; closed when the next segment begins.
    ToolCall {
        text: String,
        loading: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        action_buttons: Vec<ActionButton>,
    },

    /// A tool outcome. Emitted already closed.
    ToolResult {
        text: String,
        loading: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        action_buttons: Vec<ActionButton>,
    },

    /// A structured todo list carried as JSON.
    Todo {
        text: String,
        payload: serde_json::Value,
    },

    /// Referenced attachment names, comma-joined into a single segment.
    Attachment { text: String },

    /// A generated test scenario.
    TestScenario { text: String },

    /// A clickable button with a product-defined type.
    Button { button_type: String, text: String },

    /// Inline code rendered within prose.
    InlineCode { text: String },

    /// A reference list block.
    References { text: String },

    /// Connector-generation payload handed to the spec fetcher.
    SpecFetcher {
        text: String,
        payload: serde_json::Value,
    },

    /// Review action block.
    ReviewActions { text: String },

    /// Configuration values to collect from the user, carried as JSON.
    ConfigurationCollector {
        text: String,
        payload: serde_json::Value,
    },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text {
            text: text.into(),
            command: None,
        }
    }

    /// The raw text carried by the segment, whatever its kind.
    pub fn body(&self) -> &str {
        match self {
            Segment::Text { text, .. }
            | Segment::Code { text, .. }
            | Segment::Progress { text, .. }
            | Segment::ToolCall { text, .. }
            | Segment::ToolResult { text, .. }
            | Segment::Todo { text, .. }
            | Segment::Attachment { text }
            | Segment::TestScenario { text }
            | Segment::Button { text, .. }
            | Segment::InlineCode { text }
            | Segment::References { text }
            | Segment::SpecFetcher { text, .. }
            | Segment::ReviewActions { text }
            | Segment::ConfigurationCollector { text, .. } => text,
        }
    }

    /// Whether the segment is still streaming in.
    pub fn is_loading(&self) -> bool {
        match self {
            Segment::Code { loading, .. }
            | Segment::Progress { loading, .. }
            | Segment::ToolCall { loading, .. }
            | Segment::ToolResult { loading, .. } => *loading,
            _ => false,
        }
    }
}

/// A button extracted from a tool call or tool result body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionButton {
    pub button_type: String,
    pub content: String,
}

impl ActionButton {
    pub fn new(button_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            button_type: button_type.into(),
            content: content.into(),
        }
    }
}
