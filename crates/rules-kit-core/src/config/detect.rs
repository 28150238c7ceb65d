//! Framework version detection from project manifests

use crate::config::catalog::DetectRule;
use crate::config::version::version_from_constraint;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Manifest sections that list package constraints
const DEPENDENCY_SECTIONS: &[&str] = &["require", "require-dev", "dependencies", "devDependencies"];

/// Read the installed framework version from a JSON manifest
///
/// Returns `None` when the manifest or package is missing, or the
/// constraint carries no numeric version. Detection never fails a run.
pub fn detect_version(rule: &DetectRule, project_path: &Path) -> Option<String> {
    let manifest_path = project_path.join(&rule.file);
    let content = match std::fs::read_to_string(&manifest_path) {
        Ok(content) => content,
        Err(e) => {
            debug!("No manifest at {}: {}", manifest_path.display(), e);
            return None;
        }
    };

    let manifest: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            debug!("Unparseable manifest {}: {}", manifest_path.display(), e);
            return None;
        }
    };

    let constraint = DEPENDENCY_SECTIONS
        .iter()
        .find_map(|section| manifest.get(section)?.get(&rule.package)?.as_str())?;

    let version = version_from_constraint(constraint);
    debug!(
        "Detected {} constraint '{}' -> {:?}",
        rule.package, constraint, version
    );
    version
}
