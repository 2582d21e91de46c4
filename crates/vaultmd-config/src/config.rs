use std::{
  fs,
  path::{Path, PathBuf},
  str::FromStr,
  sync::OnceLock,
};

use serde::{Deserialize, Serialize};
use vaultmd_commonmark::ConverterConfig;

use crate::error::ConfigError;

/// Configuration for the vaultmd site builder.
///
/// [`Config`] controls where notes are read from, where rendered pages are
/// written and which URL prefixes the converter emits. Fields are typically
/// loaded from a TOML or JSON config file, but can also be set via CLI
/// arguments and `--config KEY=VALUE` overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Vault directory containing markdown notes.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vault_dir: Option<PathBuf>,

  /// Output directory for rendered pages.
  pub output_dir: PathBuf,

  /// Prefix for links to other notes.
  pub base_url: String,

  /// Prefix for embedded images and files.
  pub media_url: String,

  /// Number of threads used when building. Defaults to the number of CPUs.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub jobs: Option<usize>,
}

impl Default for Config {
  fn default() -> Self {
    let converter = ConverterConfig::default();
    Self {
      vault_dir:  None,
      output_dir: PathBuf::from("build"),
      base_url:   converter.base_url,
      media_url:  converter.media_url,
      jobs:       None,
    }
  }
}

impl Config {
  /// Load configuration from a file (TOML or JSON).
  ///
  /// # Arguments
  ///
  /// * `path` - Path to the configuration file.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::Io`] if the file cannot be read,
  /// [`ConfigError::Toml`] or [`ConfigError::Serde`] if it cannot be parsed,
  /// and [`ConfigError::Config`] for an unsupported format.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
      return Err(ConfigError::Config(format!(
        "Config file has no extension: {}",
        path.display()
      )));
    };

    match ext.to_lowercase().as_str() {
      "json" => Ok(serde_json::from_str(&content)?),
      "toml" => Ok(toml::from_str(&content)?),
      _ => {
        Err(ConfigError::Config(format!(
          "Unsupported config file format: {}",
          path.display()
        )))
      },
    }
  }

  /// Load configuration from files and overrides, merging them.
  ///
  /// Explicit `config_files` are merged in order. Without any, a config file
  /// is searched for in the usual locations (see
  /// [`Config::find_config_file`]), falling back to the defaults. Overrides
  /// are applied last and the URL prefixes are normalized.
  ///
  /// # Errors
  ///
  /// Returns an error if a config file cannot be loaded or an override is
  /// invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut config = if let Some((first, rest)) = config_files.split_first() {
      let mut merged_config = Self::from_file(first).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load config from {}: {}",
          first.display(),
          e
        ))
      })?;

      for config_path in rest {
        let additional_config = Self::from_file(config_path).map_err(|e| {
          ConfigError::Config(format!(
            "Failed to load config from {}: {}",
            config_path.display(),
            e
          ))
        })?;
        merged_config.merge(additional_config);
      }

      if config_files.len() > 1 {
        log::info!("Loaded and merged {} config files", config_files.len());
      }

      merged_config
    } else if let Some(discovered_config) = Self::find_config_file() {
      log::info!(
        "Using discovered config file: {}",
        discovered_config.display()
      );
      Self::from_file(&discovered_config).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load discovered config from {}: {}",
          discovered_config.display(),
          e
        ))
      })?
    } else {
      Self::default()
    };

    if !config_overrides.is_empty() {
      config.apply_overrides(config_overrides)?;
    }

    config.normalize_prefixes();
    Ok(config)
  }

  /// Apply configuration overrides from KEY=VALUE strings.
  ///
  /// # Errors
  ///
  /// Returns an error if:
  ///
  /// - An override string is not in KEY=VALUE format
  /// - A key is not recognized
  /// - A value cannot be parsed as the expected type
  ///
  /// # Example
  ///
  /// ```rust
  /// use vaultmd_config::Config;
  ///
  /// let mut config = Config::default();
  /// config
  ///   .apply_overrides(&[
  ///     "base_url=/notes/".to_string(),
  ///     "jobs=4".to_string(),
  ///   ])
  ///   .unwrap();
  /// assert_eq!(config.base_url, "/notes/");
  /// assert_eq!(config.jobs, Some(4));
  /// ```
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  /// Apply a single override. An empty value clears optional fields.
  ///
  /// # Errors
  ///
  /// Returns an error for an unknown key or an unparsable value.
  pub fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<(), ConfigError> {
    match key {
      "vault_dir" => {
        self.vault_dir =
          (!value.is_empty()).then(|| PathBuf::from(value));
      },
      "output_dir" => self.output_dir = PathBuf::from(value),
      "base_url" => value.clone_into(&mut self.base_url),
      "media_url" => value.clone_into(&mut self.media_url),
      "jobs" => {
        self.jobs = if value.is_empty() {
          None
        } else {
          Some(parse_value(key, value)?)
        };
      },
      _ => {
        return Err(ConfigError::Config(format!(
          "Unknown configuration key: '{key}'"
        )));
      },
    }
    Ok(())
  }

  /// Merge another config into this one, with the other config's values taking
  /// precedence.
  ///
  /// # Merge Rules
  ///
  /// - [`Option<T>`] fields: Other's [`Some`] value replaces this config's
  ///   value
  /// - Plain fields: Other's value replaces this one unless it is the default
  pub fn merge(&mut self, other: Self) {
    let defaults = Self::default();

    if other.vault_dir.is_some() {
      self.vault_dir = other.vault_dir;
    }
    if other.output_dir != defaults.output_dir {
      self.output_dir = other.output_dir;
    }
    if other.base_url != defaults.base_url {
      self.base_url = other.base_url;
    }
    if other.media_url != defaults.media_url {
      self.media_url = other.media_url;
    }
    if other.jobs.is_some() {
      self.jobs = other.jobs;
    }
  }

  /// Make sure both URL prefixes end with `/`.
  pub fn normalize_prefixes(&mut self) {
    for (name, prefix) in [
      ("base_url", &mut self.base_url),
      ("media_url", &mut self.media_url),
    ] {
      if !prefix.ends_with('/') {
        log::warn!("{name} '{prefix}' does not end with '/', appending one");
        prefix.push('/');
      }
    }
  }

  /// Number of worker threads to build with.
  #[must_use]
  pub fn jobs(&self) -> usize {
    self.jobs.filter(|&jobs| jobs > 0).unwrap_or_else(num_cpus::get)
  }

  /// Converter settings derived from this configuration.
  #[must_use]
  pub fn converter_config(&self) -> ConverterConfig {
    ConverterConfig {
      base_url:  self.base_url.clone(),
      media_url: self.media_url.clone(),
    }
  }

  /// Search for config files in common locations
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let config_filenames = [
          "vaultmd.toml",
          "vaultmd.json",
          ".vaultmd.toml",
          ".vaultmd.json",
          ".config/vaultmd.toml",
        ];

        let current_dir = std::env::current_dir().ok()?;
        for filename in &config_filenames {
          let config_path = current_dir.join(filename);
          if config_path.exists() {
            return Some(config_path);
          }
        }

        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
          let config_path = PathBuf::from(xdg_config_home).join("vaultmd.toml");
          if config_path.exists() {
            return Some(config_path);
          }
        }

        None
      })
      .clone()
  }

  /// Write the default configuration in the given format (`toml` or `json`).
  ///
  /// # Errors
  ///
  /// Returns an error if the format is unknown, serialization fails, or the
  /// file cannot be written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let defaults = Self::default();
    let config_content = match format {
      "toml" => toml::to_string_pretty(&defaults)?,
      "json" => serde_json::to_string_pretty(&defaults)?,
      other => {
        return Err(ConfigError::Config(format!(
          "Unsupported config format: {other}"
        )));
      },
    };

    fs::write(path, config_content).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {}",
        path.display(),
        e
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
  T::Err: std::fmt::Display,
{
  value.parse().map_err(|e| {
    ConfigError::Config(format!("Invalid value '{value}' for '{key}': {e}"))
  })
}

#[cfg(test)]
mod tests {
  #![allow(
    clippy::unwrap_used,
    clippy::field_reassign_with_default,
    reason = "Fine in tests"
  )]

  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.vault_dir, None);
    assert_eq!(config.output_dir, PathBuf::from("build"));
    assert_eq!(config.base_url, "/");
    assert_eq!(config.media_url, "/media/");
    assert!(config.jobs() >= 1);
  }

  #[test]
  fn test_merge_option_fields() {
    let mut base = Config::default();
    base.vault_dir = Some(PathBuf::from("notes"));
    base.jobs = Some(2);

    let mut other = Config::default();
    other.jobs = Some(8);

    base.merge(other);
    assert_eq!(base.vault_dir, Some(PathBuf::from("notes")));
    assert_eq!(base.jobs, Some(8));
  }

  #[test]
  fn test_merge_plain_fields() {
    let mut base = Config::default();
    base.base_url = "/wiki/".to_string();

    let mut other = Config::default();
    other.media_url = "/assets/".to_string();

    base.merge(other);
    assert_eq!(base.base_url, "/wiki/");
    assert_eq!(base.media_url, "/assets/");
  }

  #[test]
  fn test_apply_overrides() {
    let mut config = Config::default();
    config
      .apply_overrides(&[
        "vault_dir = ./notes".to_string(),
        "output_dir=public".to_string(),
        "media_url=/files/".to_string(),
      ])
      .unwrap();

    assert_eq!(config.vault_dir, Some(PathBuf::from("./notes")));
    assert_eq!(config.output_dir, PathBuf::from("public"));
    assert_eq!(config.media_url, "/files/");

    config.apply_override("vault_dir", "").unwrap();
    assert_eq!(config.vault_dir, None);
  }

  #[test]
  fn test_invalid_overrides() {
    let mut config = Config::default();
    assert!(config.apply_overrides(&["no_equals".to_string()]).is_err());
    assert!(config.apply_override("unknown", "1").is_err());

    let err = config.apply_override("jobs", "many").unwrap_err();
    assert!(err.to_string().contains("Invalid value 'many' for 'jobs'"));
  }

  #[test]
  fn test_normalize_prefixes() {
    let mut config = Config::default();
    config.base_url = "/wiki".to_string();
    config.media_url = "https://cdn.example.com/media".to_string();
    config.normalize_prefixes();

    assert_eq!(config.base_url, "/wiki/");
    assert_eq!(config.media_url, "https://cdn.example.com/media/");
  }

  #[test]
  fn test_zero_jobs_means_all_cpus() {
    let mut config = Config::default();
    config.jobs = Some(0);
    assert_eq!(config.jobs(), num_cpus::get());
  }

  #[test]
  fn test_converter_config() {
    let mut config = Config::default();
    config.base_url = "/notes/".to_string();

    let converter = config.converter_config();
    assert_eq!(converter.base_url, "/notes/");
    assert_eq!(converter.media_url, "/media/");
  }
}
