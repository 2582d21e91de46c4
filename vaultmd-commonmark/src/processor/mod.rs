//! Dialect processing module.
//!
//! # Architecture
//!
//! The processor module is organized into focused submodules:
//!
//! - [`core`]: Converter implementation and the pass pipeline
//! - [`extensions`]: The individual dialect rewrite passes
//! - [`process`]: High-level conversion helpers with error recovery
//! - [`types`]: Core type definitions, the renderer seam and the pass order
pub mod core;
pub mod extensions;
pub mod process;
pub mod types;

pub use extensions::{
  EmbedSize,
  callout_class,
  internal_href,
  is_external_target,
  is_image_path,
  process_callouts,
  process_checkboxes,
  process_embeds,
  process_highlights,
  process_math,
  process_standard_links,
  process_tags,
  process_wikilinks,
};
pub use process::{convert_batch, convert_with_recovery};
pub use types::{
  BaseRenderer,
  ComrakRenderer,
  ConverterConfigBuilder,
  DialectConverter,
  DialectPass,
};

#[cfg(test)]
mod tests {
  use super::{ConverterConfigBuilder, DialectConverter, DialectPass};
  use crate::utils::codeblock::Extraction;

  #[test]
  fn test_pipeline_order() {
    assert_eq!(DialectPass::PIPELINE[0], DialectPass::Embeds);
    assert_eq!(DialectPass::PIPELINE[1], DialectPass::Wikilinks);
    assert_eq!(DialectPass::PIPELINE[7], DialectPass::Checkboxes);
  }

  #[test]
  fn test_apply_single_pass() {
    let converter = DialectConverter::new(
      ConverterConfigBuilder::new().base_url("/wiki/").build(),
    );
    let mut extraction = Extraction::for_input("");

    let text = converter.apply_pass(
      DialectPass::Wikilinks,
      "see [[Other Note]]",
      &mut extraction,
    );
    assert_eq!(text, "see <a href=\"/wiki/other-note/\">Other Note</a>");
  }

  #[test]
  fn test_config_builder() {
    let config = ConverterConfigBuilder::new()
      .base_url("/notes/")
      .media_url("/files/")
      .build();
    assert_eq!(config.base_url, "/notes/");
    assert_eq!(config.media_url, "/files/");

    let converter = DialectConverter::new(config.clone());
    assert_eq!(converter.config(), &config);
  }

  #[test]
  fn test_embed_uses_media_prefix() {
    let converter = DialectConverter::new(
      ConverterConfigBuilder::new().media_url("/files/").build(),
    );
    let html = converter.convert("![[pic.jpg|width=80]]");
    assert!(html.contains("src=\"/files/pic.jpg\""));
    assert!(html.contains("style=\"width:80px;\""));
  }
}
