//! Read-only access to the notes of a vault directory.
use std::{
  fs,
  io,
  path::{Path, PathBuf},
};

use log::{debug, warn};
use thiserror::Error;
use vaultmd_commonmark::utils::{slugify, title_case};
use walkdir::WalkDir;

/// Errors raised while listing or loading vault documents.
#[derive(Debug, Error)]
pub enum VaultError {
  #[error("Document not found: {0}")]
  NotFound(String),

  #[error("Vault unavailable at {}: {source}", .path.display())]
  Unavailable {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
}

/// A document as shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
  /// File stem, unchanged.
  pub title: String,
  pub slug:  String,
  pub path:  PathBuf,
}

/// A loaded document ready for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  /// Display title derived from the file stem.
  pub title: String,
  pub slug:  String,
  /// Raw dialect text.
  pub text:  String,
}

/// Source of the documents to convert.
pub trait DocumentStore {
  /// List every document, in a stable order.
  ///
  /// # Errors
  ///
  /// Returns an error if the store cannot be read.
  fn list(&self) -> Result<Vec<DocumentSummary>, VaultError>;

  /// Load the document with the given slug.
  ///
  /// # Errors
  ///
  /// Returns [`VaultError::NotFound`] for an unknown slug, or an I/O error if
  /// the document cannot be read.
  fn fetch(&self, slug: &str) -> Result<Document, VaultError>;

  /// Load a document already found by [`DocumentStore::list`].
  ///
  /// # Errors
  ///
  /// Returns an error if the document is gone or cannot be read.
  fn load(&self, summary: &DocumentSummary) -> Result<Document, VaultError> {
    self.fetch(&summary.slug)
  }
}

/// Document store over the top-level `*.md` files of a directory.
#[derive(Debug, Clone)]
pub struct VaultStore {
  root: PathBuf,
}

impl VaultStore {
  #[must_use]
  pub fn new<P: Into<PathBuf>>(root: P) -> Self {
    Self { root: root.into() }
  }

  #[must_use]
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn unavailable(&self, source: io::Error) -> VaultError {
    VaultError::Unavailable {
      path: self.root.clone(),
      source,
    }
  }
}

impl DocumentStore for VaultStore {
  fn list(&self) -> Result<Vec<DocumentSummary>, VaultError> {
    if !self.root.is_dir() {
      return Err(self.unavailable(io::Error::new(
        io::ErrorKind::NotFound,
        "not a directory",
      )));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(&self.root)
      .min_depth(1)
      .max_depth(1)
      .sort_by_file_name()
    {
      let entry = entry.map_err(|e| self.unavailable(e.into()))?;
      let path = entry.path();
      if !entry.file_type().is_file()
        || path.extension().is_none_or(|ext| ext != "md")
      {
        continue;
      }

      let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        warn!("Skipping note with a non UTF-8 name: {}", path.display());
        continue;
      };

      documents.push(DocumentSummary {
        title: stem.to_string(),
        slug:  slugify(stem),
        path:  path.to_path_buf(),
      });
    }

    debug!(
      "Found {} document(s) in {}",
      documents.len(),
      self.root.display()
    );
    Ok(documents)
  }

  fn fetch(&self, slug: &str) -> Result<Document, VaultError> {
    let summary = self
      .list()?
      .into_iter()
      .find(|doc| doc.slug == slug)
      .ok_or_else(|| VaultError::NotFound(slug.to_string()))?;
    self.load(&summary)
  }

  fn load(&self, summary: &DocumentSummary) -> Result<Document, VaultError> {
    let text = fs::read_to_string(&summary.path)?;
    Ok(Document {
      title: display_title(&summary.title),
      slug: summary.slug.clone(),
      text,
    })
  }
}

/// Title shown on a rendered page: hyphens become spaces, words title-cased.
#[must_use]
pub fn display_title(stem: &str) -> String {
  title_case(&stem.replace('-', " "))
}
