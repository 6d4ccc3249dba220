use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Configuration file consulted when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "star-pilot.toml";

/// Settings read from the optional TOML configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    /// Format version of the file.
    pub version: u32,
    /// Tracing filter applied when `RUST_LOG` is unset.
    pub log_filter: String,
    /// File the persisted run is written to between invocations.
    pub snapshot_path: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            log_filter: "warn".to_owned(),
            snapshot_path: PathBuf::from("star-pilot.snapshot"),
        }
    }
}

impl CliConfig {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, the default file is read when
    /// present and built-in defaults are used otherwise.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse config toml")?;
        if config.version != SUPPORTED_CONFIG_VERSION {
            bail!(
                "unsupported config version {}; expected {}",
                config.version,
                SUPPORTED_CONFIG_VERSION
            );
        }
        Ok(config)
    }
}
