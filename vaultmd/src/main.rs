use std::{
  fs,
  io::{self, Write},
  path::{Path, PathBuf},
};

use color_eyre::eyre::{Context, Result, bail};
use log::{LevelFilter, info, warn};
use vaultmd::{
  build,
  cli::{Cli, Commands},
  error::VaultmdError,
  vault::{DocumentStore, VaultError, VaultStore},
};
use vaultmd_commonmark::DialectConverter;
use vaultmd_config::Config;

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  if let Commands::Init {
    output,
    format,
    force,
  } = &cli.command
  {
    return init_config(output, format, *force);
  }

  let mut config = Config::load(&cli.config_files, &cli.config_overrides)
    .wrap_err("Failed to load configuration")?;

  match cli.command {
    Commands::Init { .. } => Ok(()),
    Commands::List { input_dir } => {
      let store = vault_store(input_dir, &config)?;
      let mut stdout = io::stdout().lock();
      for doc in store.list()? {
        writeln!(stdout, "{}\t{}", doc.slug, doc.title)?;
      }
      Ok(())
    },
    Commands::Render {
      slug,
      input_dir,
      output,
    } => {
      let store = vault_store(input_dir, &config)?;
      let converter = DialectConverter::new(config.converter_config());
      let html = match build::render_document(&store, &converter, &slug) {
        Ok(html) => html,
        Err(VaultmdError::Vault(VaultError::NotFound(slug))) => {
          bail!("Document not found: {slug}")
        },
        Err(e) => return Err(e).wrap_err("Failed to render document"),
      };

      if let Some(path) = output {
        fs::write(&path, html).wrap_err_with(|| {
          format!("Failed to write {}", path.display())
        })?;
        info!("Wrote {}", path.display());
      } else {
        io::stdout().lock().write_all(html.as_bytes())?;
      }
      Ok(())
    },
    Commands::Build {
      input_dir,
      output_dir,
      jobs,
    } => {
      if let Some(output_dir) = output_dir {
        config.output_dir = output_dir;
      }
      if jobs.is_some() {
        config.jobs = jobs;
      }
      let store = vault_store(input_dir, &config)?;
      build_vault(&store, &config)
    },
  }
}

/// Write a default configuration file, refusing to overwrite without `force`.
fn init_config(output: &Path, format: &str, force: bool) -> Result<()> {
  if output.exists() && !force {
    bail!(
      "Configuration file already exists: {}. Use --force to overwrite.",
      output.display()
    );
  }

  if let Some(parent) = output.parent()
    && !parent.as_os_str().is_empty()
    && !parent.exists()
  {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create directory: {}", parent.display())
    })?;
    info!("Created directory: {}", parent.display());
  }

  Config::generate_default_config(format, output).wrap_err_with(|| {
    format!("Failed to generate configuration file: {}", output.display())
  })?;

  info!(
    "Configuration file created successfully. Set vault_dir to point at your \
     notes."
  );
  Ok(())
}

/// Pick the vault from the command line, falling back to the configuration.
fn vault_store(
  input_dir: Option<PathBuf>,
  config: &Config,
) -> Result<VaultStore> {
  let Some(root) = input_dir.or_else(|| config.vault_dir.clone()) else {
    bail!(
      "No vault directory given. Pass --input-dir or set vault_dir in the \
       configuration."
    );
  };
  Ok(VaultStore::new(root))
}

fn build_vault(store: &VaultStore, config: &Config) -> Result<()> {
  info!(
    "Building {} into {}",
    store.root().display(),
    config.output_dir.display()
  );

  rayon::ThreadPoolBuilder::new()
    .num_threads(config.jobs())
    .build_global()?;

  let converter = DialectConverter::new(config.converter_config());
  let report = build::build_site(store, &converter, &config.output_dir)
    .wrap_err_with(|| {
      format!("Failed to build site in {}", config.output_dir.display())
    })?;

  if !report.skipped.is_empty() {
    warn!(
      "Skipped {} document(s): {}",
      report.skipped.len(),
      report.skipped.join(", ")
    );
  }

  info!(
    "Site generated successfully in {}",
    config.output_dir.display()
  );
  Ok(())
}
