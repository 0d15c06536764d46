//! Code-block helpers over raw responses.
//!
//! Repair flows run the assistant twice: the second response carries fixed
//! code blocks that have to be spliced back into the first response by
//! filename, leaving the surrounding prose untouched.

use serde::Serialize;

use crate::builder::parse;
use crate::segment::Segment;
use crate::tokenizer::{scan, ScanItem, TagToken};

/// A code block addressed to a project file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

/// Collect the closed code blocks of a parsed response as project files.
pub fn source_files(segments: &[Segment]) -> Vec<SourceFile> {
    segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Code {
                file_name,
                text,
                loading: false,
                ..
            } => Some(SourceFile {
                path: file_name.clone(),
                content: text.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Whether the buffer contains at least one fully closed code block.
pub fn has_code_blocks(buffer: &str) -> bool {
    parse(buffer)
        .iter()
        .any(|s| matches!(s, Segment::Code { loading: false, .. }))
}

struct CodeBlock {
    file_name: String,
    language: String,
    command: String,
    body: String,
}

impl CodeBlock {
    fn render(&self) -> String {
        let type_attr = if self.command == "code" {
            String::new()
        } else {
            format!(" type=\"{}\"", self.command)
        };
        format!(
            "<code filename=\"{}\"{}>\n```{}\n{}\n```\n</code>",
            self.file_name, type_attr, self.language, self.body
        )
    }
}

fn code_blocks(buffer: &str) -> Vec<CodeBlock> {
    scan(buffer)
        .into_iter()
        .filter_map(|item| match item {
            ScanItem::Tag {
                token:
                    TagToken::Code {
                        file_name,
                        language,
                        command,
                        body,
                    },
                ..
            } => Some(CodeBlock {
                file_name,
                language,
                command,
                body: body.trim().to_string(),
            }),
            _ => None,
        })
        .collect()
}

/// Replace the original response's code blocks with same-named blocks from
/// the repaired response. Blocks without a repaired counterpart are kept;
/// repaired blocks for new filenames are appended in repaired order.
pub fn replace_code_blocks(original: &str, repaired: &str) -> String {
    let replacements = code_blocks(repaired);
    let mut used = vec![false; replacements.len()];

    let mut out = String::with_capacity(original.len());
    for item in scan(original) {
        match item {
            ScanItem::Gap { start, end } => out.push_str(&original[start..end]),
            ScanItem::Tag { start, end, token } => {
                let replacement = match &token {
                    TagToken::Code { file_name, .. } => replacements
                        .iter()
                        .position(|b| &b.file_name == file_name),
                    _ => None,
                };
                match replacement {
                    Some(index) => {
                        used[index] = true;
                        out.push_str(&replacements[index].render());
                    }
                    None => out.push_str(&original[start..end]),
                }
            }
        }
    }

    for (index, block) in replacements.iter().enumerate() {
        if !used[index] {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&block.render());
        }
    }
    out
}
