//! Type definitions for the dialect converter.
//!
//! Contains all the core types used by the processor, including:
//! - The converter itself (`DialectConverter`)
//! - The base renderer seam (`BaseRenderer`) and its comrak implementation
//! - The ordered list of dialect passes (`DialectPass`)
//! - A builder for `ConverterConfig`
//!
//! # Examples
//!
//! ```
//! use vaultmd_commonmark::{ConverterConfigBuilder, DialectConverter};
//!
//! let config = ConverterConfigBuilder::new()
//!   .base_url("/notes/")
//!   .media_url("/assets/")
//!   .build();
//!
//! let converter = DialectConverter::new(config);
//! ```

use crate::types::ConverterConfig;

/// Renders vanilla Markdown to HTML once every dialect construct has been
/// rewritten.
///
/// Implementations must pass raw inline and block HTML through unchanged and
/// must leave runs of ASCII letters and digits untouched, since those carry
/// the placeholders of protected content.
pub trait BaseRenderer {
  fn render(&self, markdown: &str) -> String;
}

impl<F> BaseRenderer for F
where
  F: Fn(&str) -> String,
{
  fn render(&self, markdown: &str) -> String {
    self(markdown)
  }
}

/// `CommonMark` renderer backed by comrak with the "extra" feature set:
/// tables, footnotes and description lists, with raw HTML passed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComrakRenderer;

/// Converts the vault Markdown dialect to HTML.
///
/// The converter only holds immutable configuration and its base renderer, so
/// a single instance can be shared across threads; every call to
/// [`DialectConverter::convert`] keeps its protected content in a local side
/// table.
#[derive(Debug, Clone)]
pub struct DialectConverter<R = ComrakRenderer> {
  pub(crate) config:   ConverterConfig,
  pub(crate) renderer: R,
}

/// The dialect rewrite passes, in the order they run.
///
/// Each pass relies on the ones before it:
///
/// - [`Embeds`](Self::Embeds) runs on text whose code is already protected.
/// - [`Wikilinks`](Self::Wikilinks) requires embeds to be consumed, so that
///   `![[...]]` is never read as `[[...]]`.
/// - [`Highlights`](Self::Highlights) and later passes see generated HTML
///   for links and embeds, which contains none of their markers.
/// - [`Callouts`](Self::Callouts) runs before tags so that `[!TYPE]` is gone
///   before `#` and `[` are looked at again.
/// - [`Math`](Self::Math) handles `$$` and `$` atomically in one scan.
/// - [`Checkboxes`](Self::Checkboxes) runs last so list prefixes are intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectPass {
  Embeds,
  Wikilinks,
  Highlights,
  StandardLinks,
  Callouts,
  Tags,
  Math,
  Checkboxes,
}

impl DialectPass {
  /// All passes in pipeline order.
  pub const PIPELINE: [Self; 8] = [
    Self::Embeds,
    Self::Wikilinks,
    Self::Highlights,
    Self::StandardLinks,
    Self::Callouts,
    Self::Tags,
    Self::Math,
    Self::Checkboxes,
  ];

  /// Short name used in log output.
  #[must_use]
  pub const fn name(self) -> &'static str {
    match self {
      Self::Embeds => "embeds",
      Self::Wikilinks => "wikilinks",
      Self::Highlights => "highlights",
      Self::StandardLinks => "standard-links",
      Self::Callouts => "callouts",
      Self::Tags => "tags",
      Self::Math => "math",
      Self::Checkboxes => "checkboxes",
    }
  }
}

/// Builder for constructing `ConverterConfig` with method chaining.
#[derive(Debug, Clone, Default)]
pub struct ConverterConfigBuilder {
  config: ConverterConfig,
}

impl ConverterConfigBuilder {
  /// Create a new builder with default prefixes.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the prefix for internal page links.
  #[must_use]
  pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
    self.config.base_url = base_url.into();
    self
  }

  /// Set the prefix for embedded media.
  #[must_use]
  pub fn media_url<S: Into<String>>(mut self, media_url: S) -> Self {
    self.config.media_url = media_url.into();
    self
  }

  /// Build the final `ConverterConfig`.
  #[must_use]
  pub fn build(self) -> ConverterConfig {
    self.config
  }
}
