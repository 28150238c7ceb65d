//! Catalog lookups: stacks, version ranges and default architectures

use crate::config::catalog::{Architecture, KitConfig, StackDescriptor, VersionRange};
use crate::config::detect;
use crate::config::version::major_version;
use crate::error::{KitError, Result};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only view over the stack catalog
///
/// The catalog is loaded on first access and cached for the lifetime of the
/// service. Construct one per process and pass it by reference.
#[derive(Debug)]
pub struct ConfigService {
    path: PathBuf,
    catalog: OnceCell<KitConfig>,
}

impl ConfigService {
    /// Create a service that lazily loads the catalog at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            catalog: OnceCell::new(),
        }
    }

    /// Create a service over an already parsed catalog
    pub fn from_config(config: KitConfig) -> Self {
        Self {
            path: PathBuf::new(),
            catalog: OnceCell::with_value(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed catalog, loading it on first call
    pub fn get_config(&self) -> Result<&KitConfig> {
        self.catalog.get_or_try_init(|| {
            debug!("Loading kit config from {}", self.path.display());
            KitConfig::load(&self.path)
        })
    }

    /// Look up a stack by its exact (case-sensitive) key
    pub fn get_stack(&self, name: &str) -> Result<&StackDescriptor> {
        let config = self.get_config()?;
        config
            .stacks
            .get(name)
            .ok_or_else(|| KitError::UnknownStack {
                name: name.to_string(),
                available: config.stack_names().join(", "),
            })
    }

    /// Map a concrete version to its version-overlay folder name
    ///
    /// Ranges are tried most specific first (narrowest, then highest lower
    /// bound). Versions outside every range, or unparseable ones, fall back to
    /// the stack's default range, then to the range reaching the highest
    /// major. Returns `None` only when the stack declares no ranges.
    pub fn map_version_to_range(&self, stack: &str, version: Option<&str>) -> Result<Option<String>> {
        let descriptor = self.get_stack(stack)?;
        Ok(resolve_range(descriptor, version).map(|(key, _)| key.to_string()))
    }

    /// Resolve the architecture to apply, validating an explicit choice
    pub fn resolve_architecture(&self, stack: &str, requested: Option<&str>) -> Result<&Architecture> {
        let descriptor = self.get_stack(stack)?;
        match requested {
            Some(id) => descriptor
                .architecture(id)
                .ok_or_else(|| KitError::UnknownArchitecture {
                    stack: stack.to_string(),
                    name: id.to_string(),
                    available: descriptor.architecture_ids().join(", "),
                }),
            None => self.get_default_architecture(stack),
        }
    }

    /// The architecture flagged as default, else the first declared one
    pub fn get_default_architecture(&self, stack: &str) -> Result<&Architecture> {
        let descriptor = self.get_stack(stack)?;

        if let Some(id) = &descriptor.default_architecture {
            if let Some(arch) = descriptor.architecture(id) {
                return Ok(arch);
            }
        }

        descriptor
            .architectures
            .iter()
            .find(|a| a.default)
            .or_else(|| descriptor.architectures.first())
            .ok_or_else(|| KitError::NoArchitecture {
                stack: stack.to_string(),
            })
    }

    /// Human readable version label, e.g. "Laravel 12.x"
    pub fn get_formatted_version_name(&self, stack: &str, version: Option<&str>) -> Result<String> {
        let descriptor = self.get_stack(stack)?;
        let display = descriptor.display_name(stack);

        if let Some(major) = version.and_then(major_version) {
            return Ok(format!("{} {}.x", display, major));
        }

        Ok(match resolve_range(descriptor, version) {
            Some((_, VersionRange { name: Some(name), .. })) => name.clone(),
            _ => display.to_string(),
        })
    }

    /// Detect the installed stack version from the project's manifest
    pub fn detect_version(&self, stack: &str, project_path: &Path) -> Result<Option<String>> {
        let descriptor = self.get_stack(stack)?;
        Ok(descriptor
            .detect
            .as_ref()
            .and_then(|rule| detect::detect_version(rule, project_path)))
    }

    /// The version to use when none was given or detected
    pub fn default_version(&self, stack: &str) -> Result<Option<String>> {
        let descriptor = self.get_stack(stack)?;
        Ok(descriptor
            .default_version
            .clone()
            .or_else(|| descriptor.versions.last().cloned()))
    }
}

fn resolve_range<'a>(
    descriptor: &'a StackDescriptor,
    version: Option<&str>,
) -> Option<(&'a str, &'a VersionRange)> {
    if descriptor.version_ranges.is_empty() {
        return None;
    }

    let mut candidates: Vec<(&str, &VersionRange)> = descriptor
        .version_ranges
        .iter()
        .map(|(k, r)| (k.as_str(), r))
        .collect();
    candidates.sort_by(|(ka, a), (kb, b)| {
        a.width()
            .cmp(&b.width())
            .then(b.min().cmp(&a.min()))
            .then(ka.cmp(kb))
    });

    if let Some(major) = version.and_then(major_version) {
        if let Some(hit) = candidates.iter().find(|(_, r)| r.contains_major(major)) {
            return Some(*hit);
        }
        debug!("Version {} matches no declared range, using default", major);
    }

    if let Some(key) = &descriptor.default_range {
        if let Some((k, r)) = descriptor.version_ranges.get_key_value(key) {
            return Some((k.as_str(), r));
        }
    }

    candidates.into_iter().max_by_key(|(_, r)| (r.max(), r.min()))
}
