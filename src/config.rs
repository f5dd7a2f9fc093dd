//! Settings supplied by the editor at startup.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::tracker::InvalidationPolicy;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const MAX_DEBOUNCE_MS: u64 = 5000;
pub const DEFAULT_EXPORT_DIR: &str = "code-snippets";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Quiet period before a selection offers inline actions
    pub debounce_ms: u64,
    /// Folder under the project root for automatic exports
    pub export_dir: String,
    pub invalidation: InvalidationPolicy,
    /// Ask before clearing a non-empty collection
    pub confirm_clear: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            export_dir: DEFAULT_EXPORT_DIR.to_string(),
            invalidation: InvalidationPolicy::default(),
            confirm_clear: true,
        }
    }
}

impl Settings {
    /// Read settings from LSP `initializationOptions`.
    ///
    /// Malformed options fall back to defaults; out-of-range values fall back
    /// field by field.
    pub fn from_init_options(options: Option<&serde_json::Value>) -> Self {
        let Some(options) = options else {
            return Self::default();
        };
        let mut settings = match Settings::deserialize(options) {
            Ok(s) => s,
            Err(e) => {
                warn!("ignoring malformed initialization options: {e}");
                return Self::default();
            }
        };
        if settings.debounce_ms > MAX_DEBOUNCE_MS {
            warn!(
                debounce_ms = settings.debounce_ms,
                "debounceMs out of range, using {DEFAULT_DEBOUNCE_MS}"
            );
            settings.debounce_ms = DEFAULT_DEBOUNCE_MS;
        }
        let export_dir = settings.export_dir.trim();
        if export_dir.is_empty() || std::path::Path::new(export_dir).is_absolute() {
            warn!(export_dir = %settings.export_dir, "exportDir must be a relative folder name");
            settings.export_dir = DEFAULT_EXPORT_DIR.to_string();
        } else {
            settings.export_dir = export_dir.to_string();
        }
        settings
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_without_options() {
        let s = Settings::from_init_options(None);
        assert_eq!(s, Settings::default());
        assert_eq!(s.debounce(), Duration::from_millis(300));
        assert_eq!(s.export_dir, "code-snippets");
        assert!(s.confirm_clear);
    }

    #[test]
    fn partial_options_keep_other_defaults() {
        let opts = json!({ "debounceMs": 120, "invalidation": "belowEdit" });
        let s = Settings::from_init_options(Some(&opts));
        assert_eq!(s.debounce_ms, 120);
        assert_eq!(s.invalidation, InvalidationPolicy::BelowEdit);
        assert_eq!(s.export_dir, "code-snippets");
    }

    #[test]
    fn out_of_range_debounce_falls_back() {
        let opts = json!({ "debounceMs": 60000, "confirmClear": false });
        let s = Settings::from_init_options(Some(&opts));
        assert_eq!(s.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert!(!s.confirm_clear);
    }

    #[test]
    fn absolute_export_dir_rejected() {
        let opts = json!({ "exportDir": "/tmp/out" });
        let s = Settings::from_init_options(Some(&opts));
        assert_eq!(s.export_dir, DEFAULT_EXPORT_DIR);

        let opts = json!({ "exportDir": " docs/snippets " });
        let s = Settings::from_init_options(Some(&opts));
        assert_eq!(s.export_dir, "docs/snippets");
    }

    #[test]
    fn malformed_options_use_defaults() {
        let opts = json!({ "debounceMs": "fast" });
        assert_eq!(Settings::from_init_options(Some(&opts)), Settings::default());
    }
}
