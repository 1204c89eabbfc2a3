use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Browsers hand out directory listings in batches of this size.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Per-run processing options, as set by the user before a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessOptions {
    pub recursive: bool,
    /// Free-text extension filter, e.g. `"js-ts-md"`. Empty keeps every text file.
    pub filters: String,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            filters: String::new(),
        }
    }
}

/// How the local filesystem adapter lists directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalkConfig {
    pub page_size: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Whether a completed run writes its document to the clipboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardPolicy {
    #[default]
    Enabled,
    Disabled,
}

/// Everything a session needs to know up front.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub process: ProcessOptions,
    pub walk: WalkConfig,
    pub clipboard: ClipboardPolicy,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            recursive = self.process.recursive,
            filters = %self.process.filters,
            page_size = self.walk.page_size,
            clipboard = ?self.clipboard,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let options: ProcessOptions = serde_json::from_str(r#"{"filters": "md"}"#).unwrap();
        assert!(options.recursive);
        assert_eq!(options.filters, "md");
        let walk: WalkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(walk.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        let err = serde_json::from_str::<ProcessOptions>(r#"{"recursve": false}"#).unwrap_err();
        assert!(err.to_string().contains("recursve"), "got: {err}");
        let err = serde_json::from_str::<WalkConfig>(r#"{"pagesize": 5}"#).unwrap_err();
        assert!(err.to_string().contains("pagesize"), "got: {err}");
    }
}
