use std::path::{Path, PathBuf};

use anyhow::Context;
use arbor_actor::RuntimeConfig;
use arbor_directory::DirectoryConfig;
use serde::{Deserialize, Serialize};

/// Settings for one local node, read from a TOML file.
///
/// ```toml
/// data_dir = "/var/lib/arbor"
///
/// [runtime]
/// idle_timeout = { secs = 900, nanos = 0 }
///
/// [directory]
/// max_concurrent_children = 32
/// listing_failure_mode = "surface"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub runtime: RuntimeConfig,
    pub directory: DirectoryConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".arbor"),
            runtime: RuntimeConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Read `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
