//! `load_config` module: loads a static YAML config file into the core's [`Config`].
//!
//! This module is the only place where user-supplied YAML is parsed. The
//! YAML-side types below mirror the file layout and are mapped onto the
//! strongly-typed core structs, so the file schema can stay friendly
//! (`clipboard.enabled: false`) while the core keeps its own enums.
//!
//! Every section and key is optional; missing values fall back to the core
//! defaults. An empty file is the default config.
//!
//! ```yaml
//! process:
//!   recursive: true
//!   filters: "rs-toml"
//! walk:
//!   page_size: 100
//! clipboard:
//!   enabled: true
//! ```
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use folder_context_core::config::{ClipboardPolicy, Config, ProcessOptions, WalkConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    process: ProcessOptions,
    walk: WalkConfig,
    clipboard: ClipboardSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ClipboardSection {
    enabled: bool,
}

impl Default for ClipboardSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Parse config YAML from a string.
pub fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = if content.trim().is_empty() {
        RawConfig::default()
    } else {
        serde_yaml::from_str(content).map_err(|e| {
            error!(error = ?e, "Failed to parse config YAML");
            anyhow::anyhow!("Failed to parse config YAML: {e}")
        })?
    };

    if raw.walk.page_size == 0 {
        return Err(anyhow::anyhow!("walk.page_size must be at least 1"));
    }

    Ok(Config {
        process: raw.process,
        walk: raw.walk,
        clipboard: if raw.clipboard.enabled {
            ClipboardPolicy::Enabled
        } else {
            ClipboardPolicy::Disabled
        },
    })
}

/// Loads a static YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config = parse_config(&config_content)?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(config)
}
