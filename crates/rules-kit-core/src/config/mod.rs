//! Stack catalog loading and lookup
//!
//! This module provides:
//! - Catalog types parsed from `kit-config.json` (stacks, version ranges, architectures)
//! - `ConfigService`, the lazily loaded read-only lookup over the catalog
//! - Lenient version parsing and manifest-based version detection

pub mod catalog;
pub mod detect;
pub mod service;
pub mod version;

use std::path::{Path, PathBuf};

pub use catalog::{Architecture, DetectRule, KitConfig, McpTool, StackDescriptor, VersionRange};
pub use service::ConfigService;

/// Catalog file name inside the templates root
pub const CONFIG_FILE_NAME: &str = "kit-config.json";

/// Environment variable overriding the catalog location
pub const CONFIG_ENV: &str = "RULES_KIT_CONFIG";

/// Environment variable overriding the templates root
pub const TEMPLATES_ENV: &str = "RULES_KIT_TEMPLATES";

/// Resolve the templates root: explicit flag, then env var, then `./templates`
pub fn resolve_templates_root(flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| std::env::var_os(TEMPLATES_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("templates"))
}

/// Resolve the catalog path: explicit flag, then env var, then inside the templates root
pub fn resolve_config_path(flag: Option<&Path>, templates_root: &Path) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| templates_root.join(CONFIG_FILE_NAME))
}
