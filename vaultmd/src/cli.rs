use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for vaultmd
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "vaultmd: render an Obsidian-style vault to HTML"
)]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times) Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(short = 'c', long = "config-file", global = true, action = clap::ArgAction::Append)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", global = true, action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the vaultmd CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Initialize a new vaultmd configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "vaultmd.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// List the documents of the vault as `slug<TAB>title`.
  List {
    /// Path to the vault directory.
    #[arg(short, long)]
    input_dir: Option<PathBuf>,
  },

  /// Render a single document to HTML.
  Render {
    /// Slug of the document to render.
    slug: String,

    /// Path to the vault directory.
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Write the HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Render every document of the vault and an index page.
  Build {
    /// Path to the vault directory.
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Output directory for the rendered site.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of threads to use for parallel processing.
    #[arg(short = 'p', long = "jobs")]
    jobs: Option<usize>,
  },
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::panic, reason = "Fine in tests")]

  use super::*;

  #[test]
  fn test_global_flags_after_subcommand() {
    let cli = Cli::parse_from([
      "vaultmd",
      "build",
      "-i",
      "notes",
      "-p",
      "4",
      "-v",
      "--config",
      "base_url=/wiki/",
    ]);

    assert!(cli.verbose);
    assert_eq!(cli.config_overrides, vec!["base_url=/wiki/".to_string()]);
    match cli.command {
      Commands::Build {
        input_dir,
        output_dir,
        jobs,
      } => {
        assert_eq!(input_dir, Some(PathBuf::from("notes")));
        assert_eq!(output_dir, None);
        assert_eq!(jobs, Some(4));
      },
      other => panic!("Unexpected command: {other:?}"),
    }
  }

  #[test]
  fn test_render_requires_slug() {
    assert!(Cli::try_parse_from(["vaultmd", "render"]).is_err());

    let cli =
      Cli::try_parse_from(["vaultmd", "render", "my-note", "-o", "out.html"]);
    assert!(matches!(
      cli.map(|cli| cli.command),
      Ok(Commands::Render { slug, output: Some(_), .. }) if slug == "my-note"
    ));
  }
}
