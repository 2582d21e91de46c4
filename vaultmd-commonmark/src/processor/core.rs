//! Core implementation of the dialect converter.
//!
//! This module contains the main implementation of `DialectConverter`, focused
//! on the ordered pass pipeline and the hand-off to the base renderer.
use comrak::{markdown_to_html, options::Options};
use log::{debug, trace};

use super::{
  extensions,
  types::{BaseRenderer, ComrakRenderer, DialectConverter, DialectPass},
};
use crate::{
  types::ConverterConfig,
  utils::codeblock::{Extraction, extract_code},
};

impl DialectConverter {
  /// Create a new `DialectConverter` rendering with comrak.
  #[must_use]
  pub const fn new(config: ConverterConfig) -> Self {
    Self {
      config,
      renderer: ComrakRenderer,
    }
  }
}

impl Default for DialectConverter {
  fn default() -> Self {
    Self::new(ConverterConfig::default())
  }
}

impl<R: BaseRenderer> DialectConverter<R> {
  /// Create a converter that hands the rewritten text to `renderer`.
  #[must_use]
  pub const fn with_renderer(config: ConverterConfig, renderer: R) -> Self {
    Self { config, renderer }
  }

  /// Access the converter configuration.
  #[must_use]
  pub const fn config(&self) -> &ConverterConfig {
    &self.config
  }

  /// Convert dialect text to HTML.
  ///
  /// Never fails: malformed dialect syntax is passed through as literal text.
  #[must_use]
  pub fn convert(&self, markdown: &str) -> String {
    let (mut text, mut extraction) = extract_code(markdown);
    debug!(
      "Protected {} code block(s) before dialect passes",
      extraction.code_blocks().len()
    );

    for pass in DialectPass::PIPELINE {
      text = self.apply_pass(pass, &text, &mut extraction);
      trace!("Applied {} pass", pass.name());
    }

    let text = extraction.restore_inline_code(&text);
    let html = self.renderer.render(&text);
    extraction.restore_blocks(&html)
  }

  /// Run a single dialect pass over the working text.
  #[must_use]
  pub fn apply_pass(
    &self,
    pass: DialectPass,
    text: &str,
    extraction: &mut Extraction,
  ) -> String {
    match pass {
      DialectPass::Embeds => {
        extensions::process_embeds(text, &self.config, extraction)
      },
      DialectPass::Wikilinks => {
        extensions::process_wikilinks(text, &self.config, extraction)
      },
      DialectPass::Highlights => extensions::process_highlights(text),
      DialectPass::StandardLinks => {
        extensions::process_standard_links(text, &self.config, extraction)
      },
      DialectPass::Callouts => extensions::process_callouts(text),
      DialectPass::Tags => extensions::process_tags(text),
      DialectPass::Math => extensions::process_math(text, extraction),
      DialectPass::Checkboxes => extensions::process_checkboxes(text),
    }
  }
}

impl ComrakRenderer {
  /// Build comrak options for the "extra" feature set.
  #[must_use]
  pub fn comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.footnotes = true;
    options.extension.description_lists = true;
    options.render.r#unsafe = true;
    options
  }
}

impl BaseRenderer for ComrakRenderer {
  fn render(&self, markdown: &str) -> String {
    markdown_to_html(markdown, &Self::comrak_options())
  }
}
