//! Static site generation for a whole vault.
use std::{
  fmt::Write,
  fs,
  path::{Path, PathBuf},
};

use html_escape::{encode_double_quoted_attribute, encode_text};
use log::{error, info};
use rayon::prelude::*;
use vaultmd_commonmark::{
  BaseRenderer,
  DialectConverter,
  convert_with_recovery,
};

use crate::{
  error::VaultmdError,
  vault::{DocumentStore, DocumentSummary},
};

/// Outcome of a site build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
  /// Pages written, as paths under the output directory.
  pub pages:   Vec<PathBuf>,
  /// Names of documents that were not rendered: the slug, or the file stem
  /// when the name slugs to nothing.
  pub skipped: Vec<String>,
}

/// Render a single document from the store to an HTML fragment.
///
/// # Errors
///
/// Returns an error if the document cannot be fetched.
pub fn render_document<S, R>(
  store: &S,
  converter: &DialectConverter<R>,
  slug: &str,
) -> Result<String, VaultmdError>
where
  S: DocumentStore + ?Sized,
  R: BaseRenderer,
{
  let document = store.fetch(slug)?;
  Ok(convert_with_recovery(converter, &document.text))
}

/// Wrap a rendered body in a minimal HTML document.
#[must_use]
pub fn page_html(title: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</\
     title>\n</head>\n<body>\n<article>\n{body}</article>\n</body>\n</html>\n",
    encode_text(title)
  )
}

/// Build the index page listing every document.
#[must_use]
pub fn index_html(documents: &[DocumentSummary], base_url: &str) -> String {
  let mut list = String::from("<ul>\n");
  for doc in documents {
    let href = format!("{base_url}{}/", doc.slug);
    // Writing into a String cannot fail
    let _ = writeln!(
      list,
      "<li><a href=\"{}\">{}</a></li>",
      encode_double_quoted_attribute(&href),
      encode_text(&doc.title)
    );
  }
  list.push_str("</ul>\n");
  page_html("Index", &list)
}

/// Render every document of `store` into `output_dir`.
///
/// Each document is written to `<output_dir>/<slug>/index.html` and an index
/// page linking to every written page goes to `<output_dir>/index.html`.
/// Documents are converted in parallel on the current rayon pool. A document
/// that fails to load, or whose name slugs to nothing, is logged and skipped
/// and left out of the index.
///
/// # Errors
///
/// Returns an error if the store cannot be listed or the output cannot be
/// written.
pub fn build_site<S, R>(
  store: &S,
  converter: &DialectConverter<R>,
  output_dir: &Path,
) -> Result<BuildReport, VaultmdError>
where
  S: DocumentStore + Sync + ?Sized,
  R: BaseRenderer + Sync,
{
  let documents = store.list()?;
  info!("Rendering {} document(s)", documents.len());
  fs::create_dir_all(output_dir)?;

  let results: Vec<Result<PathBuf, String>> = documents
    .par_iter()
    .map(|summary| {
      if summary.slug.is_empty() {
        error!("Cannot build a page for '{}': empty slug", summary.title);
        return Err(summary.title.clone());
      }
      write_page(store, converter, output_dir, summary).map_err(|e| {
        error!("Failed to render '{}': {e}", summary.slug);
        summary.slug.clone()
      })
    })
    .collect();

  let mut report = BuildReport {
    pages:   Vec::with_capacity(results.len()),
    skipped: Vec::new(),
  };
  let mut written = Vec::with_capacity(results.len());
  for (summary, result) in documents.into_iter().zip(results) {
    match result {
      Ok(page) => {
        report.pages.push(page);
        written.push(summary);
      },
      Err(name) => report.skipped.push(name),
    }
  }

  let index = output_dir.join("index.html");
  fs::write(&index, index_html(&written, &converter.config().base_url))?;
  info!(
    "Wrote {} page(s) and {}",
    report.pages.len(),
    index.display()
  );

  Ok(report)
}

fn write_page<S, R>(
  store: &S,
  converter: &DialectConverter<R>,
  output_dir: &Path,
  summary: &DocumentSummary,
) -> Result<PathBuf, VaultmdError>
where
  S: DocumentStore + ?Sized,
  R: BaseRenderer,
{
  let document = store.load(summary)?;
  let body = convert_with_recovery(converter, &document.text);

  let page_dir = output_dir.join(&document.slug);
  fs::create_dir_all(&page_dir)?;
  let page = page_dir.join("index.html");
  fs::write(&page, page_html(&document.title, &body))?;
  Ok(page)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_index_links_every_document() {
    let documents = vec![
      DocumentSummary {
        title: "First Post".to_string(),
        slug:  "first-post".to_string(),
        path:  PathBuf::from("First Post.md"),
      },
      DocumentSummary {
        title: "Q&A".to_string(),
        slug:  "qa".to_string(),
        path:  PathBuf::from("Q&A.md"),
      },
    ];

    let html = index_html(&documents, "/notes/");
    assert!(
      html.contains("<li><a href=\"/notes/first-post/\">First Post</a></li>")
    );
    assert!(html.contains("<li><a href=\"/notes/qa/\">Q&amp;A</a></li>"));
  }

  #[test]
  fn test_page_title_is_escaped() {
    let html = page_html("A <b> title", "<p>x</p>\n");
    assert!(html.contains("<title>A &lt;b&gt; title</title>"));
    assert!(html.contains("<article>\n<p>x</p>\n</article>"));
  }
}
