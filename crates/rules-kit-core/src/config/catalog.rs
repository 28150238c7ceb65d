//! Stack catalog types parsed from `kit-config.json`

use crate::config::version::major_version;
use crate::error::{KitError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Root catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KitConfig {
    /// Rules applied to every stack when global rules are requested
    #[serde(default)]
    pub global: GlobalRules,

    /// Supported stacks keyed by their CLI name
    pub stacks: BTreeMap<String, StackDescriptor>,

    /// MCP tool rule sets keyed by their CLI name
    #[serde(default)]
    pub mcp_tools: BTreeMap<String, McpTool>,
}

/// Settings for the `global/` template folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalRules {
    #[serde(default)]
    pub description: Option<String>,

    /// Folder under the templates root holding the global rules
    #[serde(default = "default_global_dir")]
    pub template_root: String,
}

impl Default for GlobalRules {
    fn default() -> Self {
        Self {
            description: None,
            template_root: default_global_dir(),
        }
    }
}

fn default_global_dir() -> String {
    "global".to_string()
}

/// A supported technology stack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackDescriptor {
    /// Display name (e.g. "Laravel")
    #[serde(default)]
    pub name: Option<String>,

    /// Concrete versions offered to the user, oldest first
    #[serde(default)]
    pub versions: Vec<String>,

    #[serde(default)]
    pub default_version: Option<String>,

    /// Version-overlay folders keyed by folder name (e.g. "v11-12")
    #[serde(default)]
    pub version_ranges: BTreeMap<String, VersionRange>,

    /// Range used when no explicit range matches
    #[serde(default)]
    pub default_range: Option<String>,

    /// Structural variants, in declaration order
    #[serde(default)]
    pub architectures: Vec<Architecture>,

    #[serde(default)]
    pub default_architecture: Option<String>,

    /// Globs used for rule headers when a template declares none
    #[serde(default)]
    pub globs: Vec<String>,

    /// Folder under the templates root (defaults to the stack key)
    #[serde(default)]
    pub template_root: Option<String>,

    /// Where to look for the installed framework version
    #[serde(default)]
    pub detect: Option<DetectRule>,
}

impl StackDescriptor {
    /// Human readable name, falling back to the catalog key
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }

    /// Template folder for this stack, relative to the templates root
    pub fn template_dir<'a>(&'a self, key: &'a str) -> &'a str {
        self.template_root.as_deref().unwrap_or(key)
    }

    pub fn architecture(&self, id: &str) -> Option<&Architecture> {
        self.architectures.iter().find(|a| a.id == id)
    }

    pub fn architecture_ids(&self) -> Vec<&str> {
        self.architectures.iter().map(|a| a.id.as_str()).collect()
    }
}

/// Symbolic version bucket selecting a version-overlay folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRange {
    #[serde(default)]
    pub name: Option<String>,

    /// Inclusive major version bounds `[min, max]`
    pub range: [u64; 2],
}

impl VersionRange {
    pub fn min(&self) -> u64 {
        self.range[0]
    }

    pub fn max(&self) -> u64 {
        self.range[1]
    }

    /// Number of majors covered; narrower ranges are more specific
    pub fn width(&self) -> u64 {
        self.max().saturating_sub(self.min())
    }

    pub fn contains_major(&self, major: u64) -> bool {
        (self.min()..=self.max()).contains(&major)
    }

    fn overlaps(&self, other: &VersionRange) -> bool {
        self.min() <= other.max() && other.min() <= self.max()
    }
}

/// Structural variant of a stack (e.g. DDD, hexagonal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Architecture {
    /// Identifier used on the CLI and as the overlay folder name
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub default: bool,

    #[serde(default)]
    pub globs: Vec<String>,
}

impl Architecture {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Manifest lookup used to detect the installed framework version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRule {
    /// JSON manifest relative to the project path (e.g. "composer.json")
    pub file: String,

    /// Package whose constraint carries the framework version
    pub package: String,
}

/// MCP tool rule set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpTool {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl KitConfig {
    /// Load and validate a catalog from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| KitError::config_load(path, e))?;
        Self::from_json(&content).map_err(|e| match e {
            KitError::ConfigLoad { message, .. } => KitError::config_load(path, message),
            other => other,
        })
    }

    /// Parse and validate a catalog from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        let config: KitConfig =
            serde_json::from_str(content).map_err(|e| KitError::config_load("<inline>", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check catalog integrity: non-overlapping ranges, resolvable versions,
    /// and defaults that name declared entries
    pub fn validate(&self) -> Result<()> {
        for (key, stack) in &self.stacks {
            let ranges: Vec<(&String, &VersionRange)> = stack.version_ranges.iter().collect();

            for (name, range) in &ranges {
                if range.min() > range.max() {
                    return Err(KitError::invalid_catalog(format!(
                        "stack '{}': range '{}' has min {} above max {}",
                        key,
                        name,
                        range.min(),
                        range.max()
                    )));
                }
            }

            for (i, (a_name, a)) in ranges.iter().enumerate() {
                for (b_name, b) in &ranges[i + 1..] {
                    if a.overlaps(b) {
                        return Err(KitError::invalid_catalog(format!(
                            "stack '{}': version ranges '{}' and '{}' overlap",
                            key, a_name, b_name
                        )));
                    }
                }
            }

            if !stack.version_ranges.is_empty() {
                for version in &stack.versions {
                    let major = major_version(version).ok_or_else(|| {
                        KitError::invalid_catalog(format!(
                            "stack '{}': version '{}' is not numeric",
                            key, version
                        ))
                    })?;
                    let matches = ranges
                        .iter()
                        .filter(|(_, r)| r.contains_major(major))
                        .count();
                    if matches != 1 {
                        return Err(KitError::invalid_catalog(format!(
                            "stack '{}': version '{}' resolves to {} ranges, expected exactly one",
                            key, version, matches
                        )));
                    }
                }
            }

            if let Some(default_range) = &stack.default_range {
                if !stack.version_ranges.contains_key(default_range) {
                    return Err(KitError::invalid_catalog(format!(
                        "stack '{}': default_range '{}' is not a declared range",
                        key, default_range
                    )));
                }
            }

            if let Some(default_arch) = &stack.default_architecture {
                if stack.architecture(default_arch).is_none() {
                    return Err(KitError::invalid_catalog(format!(
                        "stack '{}': default_architecture '{}' is not a declared architecture",
                        key, default_arch
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn stack_names(&self) -> Vec<&str> {
        self.stacks.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "stacks": {
            "laravel": {
                "name": "Laravel",
                "versions": ["10", "11", "12"],
                "version_ranges": {
                    "v10": { "range": [10, 10] },
                    "v11-12": { "name": "Laravel 11-12", "range": [11, 12] }
                },
                "architectures": [
                    { "id": "standard", "default": true },
                    { "id": "ddd", "name": "Domain-Driven Design" }
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_catalog() {
        let config = KitConfig::from_json(CATALOG).unwrap();
        let laravel = &config.stacks["laravel"];

        assert_eq!(laravel.display_name("laravel"), "Laravel");
        assert_eq!(laravel.template_dir("laravel"), "laravel");
        assert_eq!(laravel.version_ranges.len(), 2);
        assert_eq!(laravel.architecture_ids(), vec!["standard", "ddd"]);
        assert_eq!(config.global.template_root, "global");
    }

    #[test]
    fn test_invalid_json_is_config_load_error() {
        let err = KitConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, KitError::ConfigLoad { .. }));
    }

    #[test]
    fn test_missing_file_is_config_load_error() {
        let err = KitConfig::load(Path::new("/nonexistent/kit-config.json")).unwrap_err();
        assert!(matches!(err, KitError::ConfigLoad { .. }));
        assert!(err.to_string().contains("/nonexistent/kit-config.json"));
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let json = r#"{ "stacks": { "x": {
            "version_ranges": { "a": { "range": [1, 3] }, "b": { "range": [3, 4] } },
            "architectures": [{ "id": "std" }]
        } } }"#;
        let err = KitConfig::from_json(json).unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_unmapped_version_rejected() {
        let json = r#"{ "stacks": { "x": {
            "versions": ["1", "5"],
            "version_ranges": { "a": { "range": [1, 3] } },
            "architectures": [{ "id": "std" }]
        } } }"#;
        let err = KitConfig::from_json(json).unwrap_err();
        assert!(err.to_string().contains("'5'"));
    }

    #[test]
    fn test_unknown_default_architecture_rejected() {
        let json = r#"{ "stacks": { "x": {
            "architectures": [{ "id": "std" }],
            "default_architecture": "ddd"
        } } }"#;
        assert!(KitConfig::from_json(json).is_err());
    }

    #[test]
    fn test_range_width_and_membership() {
        let range = VersionRange {
            name: None,
            range: [11, 12],
        };
        assert_eq!(range.width(), 1);
        assert!(range.contains_major(12));
        assert!(!range.contains_major(10));
    }
}
