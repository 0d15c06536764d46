//! Command templates: compilation, matching, and filling.
//!
//! A template is human-readable text with placeholder markers
//! (`generate tests for <servicename> service`). Compilation escapes the
//! whole text and swaps each marker for a named capture, so markers full of
//! regex metacharacters still match literally.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::Result;

/// A named slot inside a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    pub id: String,
    /// The literal text standing in for the slot, e.g. `<servicename>`.
    pub marker: String,
    /// Multiline slots capture greedily across newlines; single-line slots
    /// stop at the first newline and capture non-greedily.
    #[serde(default)]
    pub multiline: bool,
}

impl Placeholder {
    pub fn new(id: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            marker: marker.into(),
            multiline: false,
        }
    }

    pub fn multiline(id: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            marker: marker.into(),
            multiline: true,
        }
    }
}

/// A command template. Markers absent from the text are simply inert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
}

impl Template {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            placeholders: Vec::new(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholders.push(placeholder);
        self
    }
}

/// Placeholder id → captured value.
pub type Bindings = HashMap<String, String>;

/// A template compiled to an anchored pattern.
///
/// Capture groups carry synthetic names (`p0`, `p1`, ...) mapped back to
/// placeholder ids, so ids never have to be valid group names.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pattern: Regex,
    groups: Vec<(String, String)>,
}

impl CompiledTemplate {
    /// Match the entire input; on success return placeholder bindings.
    pub fn bindings(&self, text: &str) -> Option<Bindings> {
        let caps = self.pattern.captures(text)?;
        let mut bindings = Bindings::new();
        for (group, id) in &self.groups {
            if let Some(m) = caps.name(group) {
                bindings.insert(id.clone(), m.as_str().to_string());
            }
        }
        Some(bindings)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Compile a template into an anchored whole-input pattern.
///
/// Markers are located in the escaped template text by offset, so inserted
/// capture syntax is never searched: a marker whose text happens to occur
/// inside an earlier placeholder's group cannot corrupt the pattern.
pub fn compile(template: &Template) -> Result<CompiledTemplate> {
    let escaped = regex::escape(&template.text);
    let mut substitutions: Vec<(usize, usize, String)> = Vec::new();
    let mut groups = Vec::new();
    for (index, placeholder) in template.placeholders.iter().enumerate() {
        let marker = regex::escape(&placeholder.marker);
        if marker.is_empty() {
            continue;
        }
        let Some(start) = find_unclaimed(&escaped, &marker, &substitutions) else {
            continue;
        };
        let group = format!("p{index}");
        let capture = if placeholder.multiline {
            format!("(?P<{group}>(?s:.+))")
        } else {
            format!("(?P<{group}>[^\n]+?)")
        };
        substitutions.push((start, marker.len(), capture));
        groups.push((group, placeholder.id.clone()));
    }
    substitutions.sort_by_key(|(start, _, _)| *start);

    let mut pattern = String::with_capacity(escaped.len() + 4);
    pattern.push_str(r"\A");
    let mut last = 0;
    for (start, len, capture) in &substitutions {
        pattern.push_str(&escaped[last..*start]);
        pattern.push_str(capture);
        last = start + len;
    }
    pattern.push_str(&escaped[last..]);
    pattern.push_str(r"\z");

    let pattern = Regex::new(&pattern)?;
    Ok(CompiledTemplate { pattern, groups })
}

/// First occurrence of `marker` in `text` that does not overlap a span
/// already claimed by another placeholder.
fn find_unclaimed(text: &str, marker: &str, claimed: &[(usize, usize, String)]) -> Option<usize> {
    let mut from = 0;
    while let Some(start) = text[from..].find(marker).map(|p| p + from) {
        let end = start + marker.len();
        if claimed
            .iter()
            .all(|(s, len, _)| end <= *s || start >= s + len)
        {
            return Some(start);
        }
        from = start + 1;
    }
    None
}

/// A successful match of submitted text against a catalog template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMatch<'t> {
    pub template: &'t Template,
    pub bindings: Bindings,
}

/// First template in list order whose compiled pattern matches the entire
/// text. No match is a normal outcome, not an error; templates that fail to
/// compile are skipped.
pub fn match_templates<'t>(text: &str, templates: &'t [Template]) -> Option<TemplateMatch<'t>> {
    for template in templates {
        let compiled = match compile(template) {
            Ok(compiled) => compiled,
            Err(err) => {
                tracing::debug!(template = %template.id, %err, "skipping uncompilable template");
                continue;
            }
        };
        if let Some(bindings) = compiled.bindings(text) {
            return Some(TemplateMatch { template, bindings });
        }
    }
    None
}

/// The placeholder whose marker occurs earliest in the text, i.e. the slot
/// the user still has to fill. Cursor policy stays with the caller.
pub fn first_open_placeholder<'p>(
    text: &str,
    placeholders: &'p [Placeholder],
) -> Option<&'p Placeholder> {
    placeholders
        .iter()
        .filter_map(|p| text.find(&p.marker).map(|pos| (pos, p)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, p)| p)
}

/// Substitute placeholder values into the template text. Missing values and
/// markers absent from the text are no-ops.
pub fn fill(template: &Template, values: &HashMap<String, String>) -> String {
    let mut text = template.text.clone();
    for placeholder in &template.placeholders {
        if let Some(value) = values.get(&placeholder.id) {
            text = text.replacen(&placeholder.marker, value, 1);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_template() -> Template {
        Template::new("tests-for-service", "generate tests for <servicename> service")
            .with_placeholder(Placeholder::new("servicename", "<servicename>"))
    }

    #[test]
    fn test_single_line_extraction() {
        let templates = vec![service_template()];
        let m = match_templates("generate tests for OrderService service", &templates)
            .expect("should match");
        assert_eq!(m.template.id, "tests-for-service");
        assert_eq!(m.bindings["servicename"], "OrderService");
    }

    #[test]
    fn test_single_line_slot_rejects_newline() {
        let templates = vec![service_template()];
        assert!(match_templates("generate tests for Order\nService service", &templates).is_none());
    }

    #[test]
    fn test_match_is_anchored() {
        let templates = vec![service_template()];
        assert!(match_templates("please generate tests for X service", &templates).is_none());
        assert!(match_templates("generate tests for X service now", &templates).is_none());
    }

    #[test]
    fn test_multiline_slot_spans_newlines() {
        let templates = [Template::new("usecase", "build this:\n<usecase>")
            .with_placeholder(Placeholder::multiline("usecase", "<usecase>"))];
        let m = match_templates("build this:\nstep one\nstep two", &templates)
            .expect("should match");
        assert_eq!(m.bindings["usecase"], "step one\nstep two");
    }

    #[test]
    fn test_first_template_wins() {
        let templates = vec![
            Template::new("exact", "do it"),
            Template::new("wild", "<anything>")
                .with_placeholder(Placeholder::multiline("anything", "<anything>")),
        ];
        let m = match_templates("do it", &templates).expect("should match");
        assert_eq!(m.template.id, "exact");
    }

    #[test]
    fn test_wildcard_template_catches_rest() {
        let templates = vec![
            Template::new("exact", "do it"),
            Template::new("wild", "<anything>")
                .with_placeholder(Placeholder::multiline("anything", "<anything>")),
        ];
        let m = match_templates("something\nelse entirely", &templates).expect("should match");
        assert_eq!(m.template.id, "wild");
        assert_eq!(m.bindings["anything"], "something\nelse entirely");
    }

    #[test]
    fn test_metacharacters_in_template_match_literally() {
        let templates = [Template::new("q", "what does f(x) return? <expr>")
            .with_placeholder(Placeholder::new("expr", "<expr>"))];
        let m = match_templates("what does f(x) return? x + 1", &templates)
            .expect("should match");
        assert_eq!(m.bindings["expr"], "x + 1");
    }

    #[test]
    fn test_marker_colliding_with_capture_syntax() {
        // "p0" is the synthetic group name inserted for the first placeholder;
        // as a later marker it must still substitute at its literal position
        let templates = [Template::new("collide", "run <job> with p0")
            .with_placeholder(Placeholder::new("job", "<job>"))
            .with_placeholder(Placeholder::new("zero", "p0"))];
        let m = match_templates("run nightly with batch-7", &templates).expect("should match");
        assert_eq!(m.bindings["job"], "nightly");
        assert_eq!(m.bindings["zero"], "batch-7");
    }

    #[test]
    fn test_absent_marker_is_silent_noop() {
        let template = Template::new("t", "fixed text")
            .with_placeholder(Placeholder::new("ghost", "<ghost>"));
        let compiled = compile(&template).expect("should compile");
        let bindings = compiled.bindings("fixed text").expect("should match");
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_multiple_placeholders() {
        let templates = [Template::new("map", "map <input> to <output> record")
            .with_placeholder(Placeholder::new("input", "<input>"))
            .with_placeholder(Placeholder::new("output", "<output>"))];
        let m = match_templates("map Person to Employee record", &templates)
            .expect("should match");
        assert_eq!(m.bindings["input"], "Person");
        assert_eq!(m.bindings["output"], "Employee");
    }

    #[test]
    fn test_no_match_is_none() {
        assert!(match_templates("anything", &[]).is_none());
    }

    #[test]
    fn test_first_open_placeholder_by_position() {
        let placeholders = vec![
            Placeholder::new("second", "<second>"),
            Placeholder::new("first", "<first>"),
        ];
        let found = first_open_placeholder("fill <first> then <second>", &placeholders)
            .expect("should find");
        assert_eq!(found.id, "first");
    }

    #[test]
    fn test_first_open_placeholder_none_when_filled() {
        let placeholders = vec![Placeholder::new("p", "<p>")];
        assert!(first_open_placeholder("all filled in", &placeholders).is_none());
    }

    #[test]
    fn test_fill_substitutes_values() {
        let template = service_template();
        let mut values = HashMap::new();
        values.insert("servicename".to_string(), "OrderService".to_string());
        assert_eq!(
            fill(&template, &values),
            "generate tests for OrderService service"
        );
    }

    #[test]
    fn test_fill_missing_value_keeps_marker() {
        let template = service_template();
        assert_eq!(
            fill(&template, &HashMap::new()),
            "generate tests for <servicename> service"
        );
    }
}
