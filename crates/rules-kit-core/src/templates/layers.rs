//! Template layers and the merged rule plan
//!
//! Layers are applied in a fixed order: global, stack base, version overlay,
//! architecture overlay, then MCP tools. A later layer replaces any earlier
//! file that maps to the same output path.

use crate::error::{KitError, Result};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Template file extensions picked up from layer folders
const TEMPLATE_EXTENSIONS: &[&str] = &["md", "mdc"];

/// Classification of a template folder, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Global,
    StackBase,
    VersionOverlay,
    ArchitectureOverlay,
    McpTool,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Global => "global",
            Layer::StackBase => "stack-base",
            Layer::VersionOverlay => "version-overlay",
            Layer::ArchitectureOverlay => "architecture-overlay",
            Layer::McpTool => "mcp-tool",
        };
        write!(f, "{}", name)
    }
}

/// A template folder taking part in a generation run
#[derive(Debug, Clone)]
pub struct LayerDir {
    pub layer: Layer,

    /// Absolute (or templates-root relative) folder to scan
    pub dir: PathBuf,

    /// Folder label relative to the templates root, e.g. "laravel/v11-12"
    pub origin: String,

    /// Output subtree the layer writes into, e.g. "laravel"
    pub output_prefix: String,

    /// Globs for rule headers when a template declares none
    pub fallback_globs: Vec<String>,
}

/// A single template and where its rule ends up
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFile {
    pub source: PathBuf,
    pub layer: Layer,

    /// Source label used in section delimiters, e.g. "laravel/ddd/entities.md"
    pub origin: String,

    /// Output path without extension, '/' separated, e.g. "laravel/entities"
    pub target: String,

    pub fallback_globs: Vec<String>,
}

impl TemplateFile {
    /// File stem of the target, used for titles
    pub fn name(&self) -> &str {
        self.target.rsplit('/').next().unwrap_or(&self.target)
    }
}

impl LayerDir {
    /// List the layer's templates in alphabetical order of relative path
    ///
    /// A missing folder is an empty layer, not an error. When two files of
    /// the layer differ only by extension, the first in sort order wins.
    pub fn discover(&self) -> Result<Vec<TemplateFile>> {
        if !self.dir.is_dir() {
            debug!(
                "Layer {} has no folder at {}, skipping",
                self.layer,
                self.dir.display()
            );
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.dir).to_path_buf();
                KitError::template_read(path, e.into())
            })?;

            if !entry.file_type().is_file() || !is_template(entry.path()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.dir)
                .unwrap_or(entry.path());
            let relative = to_slash_path(relative);
            let stem = strip_template_extension(&relative);

            files.push(TemplateFile {
                source: entry.path().to_path_buf(),
                layer: self.layer,
                origin: join_slash(&self.origin, &relative),
                target: join_slash(&self.output_prefix, stem),
                fallback_globs: self.fallback_globs.clone(),
            });
        }

        files.sort_by(|a, b| a.origin.cmp(&b.origin));

        // `foo.md` and `foo.mdc` in one folder map to the same rule; keep the first
        let mut seen = HashSet::new();
        files.retain(|file| {
            if seen.insert(file.target.clone()) {
                true
            } else {
                warn!(
                    "Ignoring {}: another template in {} already produces {}",
                    file.origin, self.origin, file.target
                );
                false
            }
        });

        Ok(files)
    }
}

/// Ordered, de-duplicated list of templates to render
#[derive(Debug, Clone, Default)]
pub struct RulePlan {
    pub files: Vec<TemplateFile>,

    /// Number of files replaced by a later layer
    pub overridden: usize,
}

impl RulePlan {
    /// Apply a layer on top of the plan (last write wins)
    ///
    /// An overriding file moves to its own layer's position so that
    /// processing order stays layer-then-alphabetical.
    pub fn push_layer(&mut self, files: Vec<TemplateFile>) {
        for file in files {
            if let Some(pos) = self.files.iter().position(|f| f.target == file.target) {
                let replaced = self.files.remove(pos);
                debug!(
                    "{} overrides {} ({})",
                    file.origin, replaced.origin, file.target
                );
                self.overridden += 1;
            }
            self.files.push(file);
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of planned files contributed by each layer
    pub fn layer_counts(&self) -> HashMap<Layer, usize> {
        let mut counts = HashMap::new();
        for file in &self.files {
            *counts.entry(file.layer).or_insert(0) += 1;
        }
        counts
    }
}

fn is_template(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
}

fn strip_template_extension(relative: &str) -> &str {
    TEMPLATE_EXTENSIONS
        .iter()
        .find_map(|ext| relative.strip_suffix(&format!(".{}", ext)))
        .unwrap_or(relative)
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn join_slash(prefix: &str, rest: &str) -> String {
    if prefix.is_empty() {
        rest.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), rest)
    }
}
