//! High-level conversion helpers with error recovery.
use std::{
  io::Error,
  path::{Path, PathBuf},
};

use log::error;

use super::types::{BaseRenderer, DialectConverter};

/// Convert dialect text, recovering from a panicking base renderer.
///
/// The dialect passes themselves never panic, but a custom [`BaseRenderer`]
/// might. In that case the panic is logged and an error element is returned
/// in place of the document.
///
/// # Arguments
///
/// * `converter` - The configured converter
/// * `content` - The raw dialect text
///
/// # Returns
///
/// The converted HTML, or an error `<div>` if rendering panicked
#[must_use]
pub fn convert_with_recovery<R: BaseRenderer>(
  converter: &DialectConverter<R>,
  content: &str,
) -> String {
  match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    converter.convert(content)
  })) {
    Ok(html) => html,
    Err(panic_err) => {
      if let Some(msg) = panic_err.downcast_ref::<String>() {
        error!("Panic during markdown conversion: {msg}");
      } else if let Some(msg) = panic_err.downcast_ref::<&str>() {
        error!("Panic during markdown conversion: {msg}");
      } else {
        error!("Unknown panic during markdown conversion");
      }
      "<div class=\"error\">Critical error processing markdown content</div>"
        .to_string()
    },
  }
}

/// Convert a batch of documents with consistent error handling.
///
/// # Arguments
/// * `converter` - The configured converter
/// * `files` - Iterator of file paths to convert
/// * `read_file_fn` - Function to read file content from path
///
/// # Returns
/// Vector of tuples containing (`file_path`, `conversion_result`)
pub fn convert_batch<R, I, F>(
  converter: &DialectConverter<R>,
  files: I,
  read_file_fn: F,
) -> Vec<(PathBuf, Result<String, String>)>
where
  R: BaseRenderer,
  I: Iterator<Item = PathBuf>,
  F: Fn(&Path) -> Result<String, Error>,
{
  files
    .map(|path| {
      let result = match read_file_fn(&path) {
        Ok(content) => Ok(convert_with_recovery(converter, &content)),
        Err(e) => Err(format!("Failed to read file: {e}")),
      };
      (path, result)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::*;
  use crate::types::ConverterConfig;

  #[test]
  #[allow(clippy::panic, reason = "Exercises panic recovery")]
  fn test_recovers_from_renderer_panic() {
    let converter = DialectConverter::with_renderer(
      ConverterConfig::default(),
      |_: &str| -> String { panic!("renderer exploded") },
    );

    let html = convert_with_recovery(&converter, "# Title");
    assert!(html.contains("class=\"error\""));
  }

  #[test]
  fn test_convert_with_recovery_success() {
    let converter = DialectConverter::default();
    let html = convert_with_recovery(&converter, "==hi==");
    assert_eq!(html, "<p><mark>hi</mark></p>\n");
  }

  #[test]
  #[allow(clippy::panic, reason = "Fine in tests")]
  fn test_convert_batch() {
    let converter = DialectConverter::default();
    let paths = vec![Path::new("a.md"), Path::new("b.md"), Path::new("c.md")];

    let read_fn = |path: &Path| -> Result<String, std::io::Error> {
      match path.file_name().and_then(|n| n.to_str()) {
        Some("a.md") => Ok("[[Note A]]".to_string()),
        Some("b.md") => Ok("#tag".to_string()),
        _ => {
          Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
          ))
        },
      }
    };

    let results = convert_batch(
      &converter,
      paths.into_iter().map(Path::to_path_buf),
      read_fn,
    );
    assert_eq!(results.len(), 3);

    for (path, result) in results {
      match (path.to_str(), result) {
        (Some("a.md"), Ok(html)) => assert!(html.contains("/note-a/")),
        (Some("b.md"), Ok(html)) => assert!(html.contains("class=\"tag\"")),
        (Some("c.md"), Err(e)) => assert!(e.contains("File not found")),
        (path, result) => panic!("Unexpected result for {path:?}: {result:?}"),
      }
    }
  }
}
