//! # vaultmd-commonmark
//!
//! Converter for the Markdown dialect written by Obsidian-style note vaults.
//! Dialect constructs are rewritten by an ordered set of passes and whatever
//! remains is handed to a `CommonMark` renderer (comrak by default).
//!
//! ## Quick Start
//!
//! ```rust
//! use vaultmd_commonmark::{ConverterConfig, DialectConverter};
//!
//! let converter = DialectConverter::new(ConverterConfig::default());
//! let html = converter.convert("See [[My Page]] and ==this==.");
//!
//! assert!(html.contains(r#"<a href="/my-page/">My Page</a>"#));
//! assert!(html.contains("<mark>this</mark>"));
//! ```
//!
//! ## Dialect
//!
//! - **Embeds**: `![[image.png]]`, `![[image.png|100x200]]`, `![[file.pdf]]`
//! - **Wikilinks**: `[[Page]]`, `[[Page|alias]]`
//! - **Highlights**: `==text==`
//! - **Internal links**: `[text](Some Page)`
//! - **Callouts**: `> [!NOTE] Title`
//! - **Tags**: `#tag`, `#area/sub`
//! - **Math**: `$inline$`, `$$block$$`
//! - **Checkboxes**: `- [ ] todo`, `- [x] done`
//!
//! Fenced code blocks and inline code spans are protected from every dialect
//! pass.
//!
//! ## Custom renderers
//!
//! ```rust
//! use vaultmd_commonmark::{ConverterConfig, DialectConverter};
//!
//! let converter = DialectConverter::with_renderer(
//!   ConverterConfig::default(),
//!   |markdown: &str| format!("<pre>{markdown}</pre>"),
//! );
//! assert_eq!(converter.convert("plain"), "<pre>plain</pre>");
//! ```

pub mod processor;
mod types;
pub mod utils;

pub use crate::{
  processor::{
    BaseRenderer,
    ComrakRenderer,
    ConverterConfigBuilder,
    DialectConverter,
    DialectPass,
    convert_batch,
    convert_with_recovery,
  },
  types::{ConverterConfig, ExtractedCodeBlock},
};
