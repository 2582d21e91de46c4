pub mod codeblock;

use regex::Regex;

/// Error type for utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
  #[error("Regex compilation failed: {0}")]
  RegexError(#[from] regex::Error),
}

/// Result type for utility operations.
pub type UtilResult<T> = Result<T, UtilError>;

/// Compile a pattern used by one of the dialect passes.
///
/// # Errors
///
/// Returns an error if the pattern is not a valid regex.
pub fn compile_regex(pattern: &str) -> UtilResult<Regex> {
  Ok(Regex::new(pattern)?)
}

/// Compile a pass pattern, falling back to [`never_matching_regex`] so that a
/// broken pattern disables the pass instead of aborting the conversion.
#[must_use]
pub fn pass_regex(name: &str, pattern: &str) -> Regex {
  compile_regex(pattern).unwrap_or_else(|e| {
    log::error!(
      "Failed to compile {name} regex: {e}\n Falling back to never matching \
       regex."
    );
    never_matching_regex()
  })
}

/// Slug used for page links: trimmed, spaces replaced by hyphens, lowercased.
///
/// Nothing else is normalized, so punctuation, diacritics and repeated
/// hyphens pass through unchanged.
#[must_use]
pub fn page_slug(target: &str) -> String {
  target.trim().replace(' ', "-").to_lowercase()
}

/// Slugify a document name for use as its URL identifier.
///
/// Lowercases, drops characters that are not alphanumeric, whitespace,
/// hyphens or underscores, collapses runs of whitespace and hyphens into a
/// single hyphen and trims leading/trailing hyphens and underscores.
#[must_use]
pub fn slugify(text: &str) -> String {
  let mut slug = String::with_capacity(text.len());
  let mut pending_dash = false;

  for c in text.to_lowercase().chars() {
    if c.is_whitespace() || c == '-' {
      pending_dash = true;
    } else if c.is_alphanumeric() || c == '_' {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c);
    }
  }

  slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Capitalize the first letter of a string.
#[must_use]
pub fn capitalize_first(s: &str) -> String {
  let mut chars = s.chars();
  chars.next().map_or_else(String::new, |c| {
    c.to_uppercase().collect::<String>() + chars.as_str()
  })
}

/// Title-case every whitespace separated word: first letter upper, rest lower.
#[must_use]
pub fn title_case(s: &str) -> String {
  s.split_whitespace()
    .map(|word| capitalize_first(&word.to_lowercase()))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Escape text content for HTML output.
#[must_use]
pub fn html_escape(text: &str) -> String {
  html_escape::encode_text(text).into_owned()
}

/// Escape a value placed inside a double-quoted HTML attribute.
#[must_use]
pub fn attr_escape(value: &str) -> String {
  html_escape::encode_double_quoted_attribute(value).into_owned()
}

/// Create a regex that never matches anything.
///
/// This is used as a fallback pattern when a regex fails to compile.
/// It will never match any input, which is safer than using a trivial regex
/// like `^$` which would match empty strings.
///
/// # Panics
///
/// Panics if the fallback regex pattern `r"^\b$"` fails to compile, which
/// should never happen.
#[must_use]
#[allow(clippy::unwrap_used, reason = "Both patterns are known to be valid")]
pub fn never_matching_regex() -> Regex {
  Regex::new(r"[^\s\S]").unwrap_or_else(|_| Regex::new(r"^\b$").unwrap())
}
