//! chatmark-core: segment parsing and command templates for assistant chat
//! transcripts.
//!
//! Two engines live here. The segment parser turns the full response buffer
//! into an ordered list of typed segments; callers re-run it on the whole
//! buffer after every streamed chunk, so it keeps no state and never panics
//! on truncated input. The template engine compiles command templates with
//! named placeholders into anchored patterns, extracts submitted arguments,
//! and finds the slot the user is currently filling.

pub mod builder;
pub mod catalog;
pub mod error;
pub mod halfopen;
pub mod patch;
pub mod segment;
pub mod template;
pub mod tokenizer;

pub use builder::parse;
pub use catalog::{SuggestionCatalog, TemplateCatalog};
pub use error::Error;
pub use patch::{has_code_blocks, replace_code_blocks, source_files, SourceFile};
pub use segment::{ActionButton, Segment};
pub use template::{
    compile, fill, first_open_placeholder, match_templates, Bindings, CompiledTemplate,
    Placeholder, Template, TemplateMatch,
};
pub use tokenizer::{scan, ScanItem, TagToken};

pub type Result<T> = std::result::Result<T, Error>;
