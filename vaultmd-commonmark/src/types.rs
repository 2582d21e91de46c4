//! Types for vaultmd-commonmark public API and internal use.
use serde::{Deserialize, Serialize};

/// URL prefixes used when turning vault references into links.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConverterConfig {
  /// Prefix for internal page links (wikilinks and relative Markdown links).
  pub base_url:  String,
  /// Prefix for embedded media and file links.
  pub media_url: String,
}

impl Default for ConverterConfig {
  fn default() -> Self {
    Self {
      base_url:  "/".to_string(),
      media_url: "/media/".to_string(),
    }
  }
}

/// A fenced code block lifted out of the document before the dialect passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedCodeBlock {
  /// Language from the fence info string, `None` when absent.
  pub language: Option<String>,
  /// Block content with surrounding whitespace trimmed.
  pub code:     String,
}

impl ExtractedCodeBlock {
  /// Render the block as the final `<pre><code>` element.
  #[must_use]
  pub fn to_html(&self) -> String {
    let code = html_escape::encode_text(&self.code);
    match self.language.as_deref() {
      Some(language) => {
        format!(
          "<pre><code class=\"language-{}\">{code}</code></pre>",
          html_escape::encode_double_quoted_attribute(language)
        )
      },
      None => format!("<pre><code>{code}</code></pre>"),
    }
  }
}
