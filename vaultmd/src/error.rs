use std::io;

use thiserror::Error;
use vaultmd_config::ConfigError;

use crate::vault::VaultError;

/// Top-level error type for the vaultmd crate.
#[derive(Debug, Error)]
pub enum VaultmdError {
  #[error("Vault error: {0}")]
  Vault(#[from] VaultError),

  #[error("Configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
}
