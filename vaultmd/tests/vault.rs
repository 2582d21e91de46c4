#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]
use std::fs;

use tempfile::TempDir;
use vaultmd::{
  build::{build_site, render_document},
  error::VaultmdError,
  vault::{DocumentStore, VaultError, VaultStore},
};
use vaultmd_commonmark::{ConverterConfigBuilder, DialectConverter};

fn sample_vault() -> TempDir {
  let dir = TempDir::new().expect("Failed to create temp dir");
  let root = dir.path();

  fs::write(
    root.join("My First Post.md"),
    "Hello [[Notes on Rust]] and ==friends==.\n",
  )
  .expect("write note");
  fs::write(root.join("notes-on-rust.md"), "- [x] ownership\n")
    .expect("write note");
  fs::write(root.join("Q&A.md"), "Ask #questions\n").expect("write note");
  fs::write(root.join("image.png"), [0u8; 4]).expect("write image");
  fs::create_dir(root.join("archive")).expect("create subdir");
  fs::write(root.join("archive").join("old.md"), "old").expect("write note");

  dir
}

#[test]
fn test_list_top_level_notes_sorted() {
  let vault = sample_vault();
  let store = VaultStore::new(vault.path());

  let docs = store.list().expect("Failed to list vault");
  let listed: Vec<(&str, &str)> = docs
    .iter()
    .map(|doc| (doc.slug.as_str(), doc.title.as_str()))
    .collect();

  assert_eq!(listed, vec![
    ("my-first-post", "My First Post"),
    ("qa", "Q&A"),
    ("notes-on-rust", "notes-on-rust"),
  ]);
}

#[test]
fn test_fetch_derives_display_title() {
  let vault = sample_vault();
  let store = VaultStore::new(vault.path());

  let doc = store.fetch("notes-on-rust").expect("Document should exist");
  assert_eq!(doc.title, "Notes On Rust");
  assert_eq!(doc.slug, "notes-on-rust");
  assert_eq!(doc.text, "- [x] ownership\n");
}

#[test]
fn test_load_listed_document() {
  let vault = sample_vault();
  let store = VaultStore::new(vault.path());

  let summary = store
    .list()
    .expect("Failed to list vault")
    .into_iter()
    .find(|doc| doc.slug == "qa")
    .expect("Q&A should be listed");
  let doc = store.load(&summary).expect("Failed to load");
  assert_eq!(doc.title, "Q&a");
  assert_eq!(doc.text, "Ask #questions\n");
}

#[test]
fn test_fetch_unknown_slug() {
  let vault = sample_vault();
  let store = VaultStore::new(vault.path());

  match store.fetch("old") {
    Err(VaultError::NotFound(slug)) => assert_eq!(slug, "old"),
    other => panic!("Expected NotFound, got {other:?}"),
  }
}

#[test]
fn test_render_document() {
  let vault = sample_vault();
  let store = VaultStore::new(vault.path());
  let converter = DialectConverter::default();

  let html = render_document(&store, &converter, "my-first-post")
    .expect("Failed to render");
  assert_eq!(
    html,
    "<p>Hello <a href=\"/notes-on-rust/\">Notes on Rust</a> and \
     <mark>friends</mark>.</p>\n"
  );

  assert!(matches!(
    render_document(&store, &converter, "missing"),
    Err(VaultmdError::Vault(VaultError::NotFound(_)))
  ));
}

#[test]
fn test_build_site() {
  let vault = sample_vault();
  let out = TempDir::new().expect("Failed to create output dir");
  let store = VaultStore::new(vault.path());
  let converter = DialectConverter::new(
    ConverterConfigBuilder::new().base_url("/notes/").build(),
  );

  let report =
    build_site(&store, &converter, out.path()).expect("Failed to build");
  assert_eq!(report.pages.len(), 3);
  assert!(report.skipped.is_empty());

  let page = fs::read_to_string(out.path().join("qa").join("index.html"))
    .expect("Page should be written");
  assert!(page.contains("<title>Q&amp;a</title>"));
  assert!(page.contains("<span class=\"tag\">#questions</span>"));

  let page =
    fs::read_to_string(out.path().join("notes-on-rust").join("index.html"))
      .expect("Page should be written");
  assert!(page.contains("<input type=\"checkbox\" disabled checked> ownership"));

  let index = fs::read_to_string(out.path().join("index.html"))
    .expect("Index should be written");
  for link in [
    "<a href=\"/notes/my-first-post/\">My First Post</a>",
    "<a href=\"/notes/qa/\">Q&amp;A</a>",
    "<a href=\"/notes/notes-on-rust/\">notes-on-rust</a>",
  ] {
    assert!(index.contains(link), "Missing {link} in:\n{index}");
  }
  assert!(!out.path().join("old").exists());
}

#[test]
fn test_build_skips_empty_slug() {
  let vault = sample_vault();
  fs::write(vault.path().join("???.md"), "no name").expect("write note");
  let out = TempDir::new().expect("Failed to create output dir");
  let store = VaultStore::new(vault.path());
  let converter = DialectConverter::default();

  let report =
    build_site(&store, &converter, out.path()).expect("Failed to build");
  assert_eq!(report.pages.len(), 3);
  assert_eq!(report.skipped, vec!["???".to_string()]);

  let index = fs::read_to_string(out.path().join("index.html"))
    .expect("Index should be written");
  assert!(index.starts_with("<!DOCTYPE html>"));
  assert!(!index.contains("href=\"//\""));
  assert!(!index.contains("???"));
}

#[test]
fn test_missing_vault() {
  let dir = TempDir::new().expect("Failed to create temp dir");
  let store = VaultStore::new(dir.path().join("nope"));

  let err = store.list().expect_err("Missing vault must fail");
  assert!(err.to_string().contains("Vault unavailable"));
}
