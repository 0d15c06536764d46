//! Per-command template and suggestion tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::template::{match_templates, Template, TemplateMatch};
use crate::{Error, Result};

/// Ordered templates per command. Order matters: matching is first-wins, so
/// more specific templates go before catch-alls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateCatalog {
    #[serde(default)]
    commands: HashMap<String, Vec<Template>>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands with at least one template, sorted for stable listing.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains_command(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    pub fn templates_for(&self, command: &str) -> &[Template] {
        self.commands.get(command).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn template(&self, command: &str, id: &str) -> Option<&Template> {
        self.templates_for(command).iter().find(|t| t.id == id)
    }

    pub fn template_text(&self, command: &str, id: &str) -> Option<&str> {
        self.template(command, id).map(|t| t.text.as_str())
    }

    /// Replace the template with the same id, or append.
    pub fn upsert(&mut self, command: impl Into<String>, template: Template) {
        let templates = self.commands.entry(command.into()).or_default();
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => templates.push(template),
        }
    }

    /// Remove a template by id; true if it existed.
    pub fn remove(&mut self, command: &str, id: &str) -> bool {
        let Some(templates) = self.commands.get_mut(command) else {
            return false;
        };
        let before = templates.len();
        templates.retain(|t| t.id != id);
        templates.len() != before
    }

    /// Match submitted text against a command's templates. Unknown command is
    /// an error; a known command with no matching template is `Ok(None)`.
    pub fn match_text<'c>(&'c self, command: &str, text: &str) -> Result<Option<TemplateMatch<'c>>> {
        let templates = self
            .commands
            .get(command)
            .ok_or_else(|| Error::catalog(format!("unknown command: {command}")))?;
        Ok(match_templates(text, templates))
    }
}

/// Suggestion values per (command, template, placeholder), for pre-filling a
/// slot the user is about to type into. Pure lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionCatalog {
    #[serde(default)]
    commands: HashMap<String, HashMap<String, HashMap<String, Vec<String>>>>,
}

impl SuggestionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        command: impl Into<String>,
        template_id: impl Into<String>,
        placeholder_id: impl Into<String>,
        values: Vec<String>,
    ) {
        self.commands
            .entry(command.into())
            .or_default()
            .entry(template_id.into())
            .or_default()
            .insert(placeholder_id.into(), values);
    }

    pub fn suggestions_for(
        &self,
        command: &str,
        template_id: &str,
        placeholder_id: &str,
    ) -> &[String] {
        self.commands
            .get(command)
            .and_then(|templates| templates.get(template_id))
            .and_then(|placeholders| placeholders.get(placeholder_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
