//! # Runtime Configuration Module
//!
//! Environment overrides applied on top of the mapping file.
//!
//! ## Environment Variables
//!
//! ### `BRRTD_CONTEXT_PATH`
//!
//! Path prefix the application is mounted under, e.g. `/app`. Replaces the
//! mapping file's `context_path`. An empty value mounts at the root. A
//! trailing `/` is dropped and a missing leading `/` is added.
//!
//! ## Usage
//!
//! ```rust
//! use brrtdispatch::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! if let Some(path) = &config.context_path {
//!     println!("Mounted at '{path}'");
//! }
//! ```

use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Context path override, already normalised.
    pub context_path: Option<String>,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        RuntimeConfig {
            context_path: env::var("BRRTD_CONTEXT_PATH")
                .ok()
                .map(|v| normalize_context_path(&v)),
        }
    }
}

/// `""` or `/seg[/seg...]` with no trailing separator.
#[must_use]
pub fn normalize_context_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_context_path;

    #[test]
    fn test_root_context() {
        assert_eq!(normalize_context_path(""), "");
        assert_eq!(normalize_context_path("/"), "");
        assert_eq!(normalize_context_path("  "), "");
    }

    #[test]
    fn test_context_path_normalized() {
        assert_eq!(normalize_context_path("/app"), "/app");
        assert_eq!(normalize_context_path("app/"), "/app");
        assert_eq!(normalize_context_path("/shop/api//"), "/shop/api");
    }
}
