//! Filesystem side effects: template reads, atomic writes, and backups

use crate::error::{KitError, Result};
use crate::ide::Ide;
use crate::templates::frontmatter::split_frontmatter;
use crate::templates::layers::TemplateFile;
use crate::templates::meta::{substitute_variables, TemplateMeta};
use crate::templates::render::{aggregate_document, RenderedRule};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Result of committing content to an output path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// File created or overwritten
    Written { backup: BackupStatus },
    /// Existing file already had identical content
    Unchanged,
}

/// What happened to the previous version of an overwritten file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStatus {
    /// No previous file, or backups were not requested
    NotNeeded,
    Created(PathBuf),
    /// The copy failed; the file was overwritten anyway
    Failed(String),
}

/// Performs all reads and writes for a generation run
///
/// Backups taken by one service share a single timestamp, so the files
/// saved by one update run form one recognizable set.
#[derive(Debug, Clone)]
pub struct FileService {
    backup_stamp: String,
}

impl Default for FileService {
    fn default() -> Self {
        Self::new()
    }
}

impl FileService {
    pub fn new() -> Self {
        Self::with_stamp(chrono::Local::now().format("%Y%m%d-%H%M%S").to_string())
    }

    /// Use a fixed backup timestamp
    pub fn with_stamp(stamp: impl Into<String>) -> Self {
        Self {
            backup_stamp: stamp.into(),
        }
    }

    pub fn backup_stamp(&self) -> &str {
        &self.backup_stamp
    }

    /// Read a template, substitute placeholders, and split off its frontmatter
    ///
    /// Substitution runs on the whole text first so frontmatter values see
    /// the same placeholders as the body.
    pub async fn render_template(&self, file: &TemplateFile, meta: &TemplateMeta) -> Result<RenderedRule> {
        let raw = fs::read_to_string(&file.source)
            .await
            .map_err(|e| KitError::template_read(&file.source, e))?;

        let substituted = substitute_variables(&raw, meta);
        let parsed = split_frontmatter(&substituted).map_err(|e| KitError::Frontmatter {
            path: file.source.clone(),
            message: e.to_string(),
        })?;

        Ok(RenderedRule::new(file, parsed.frontmatter, parsed.body))
    }

    /// Render a template with the IDE's header and write it to `dest`
    ///
    /// Returns the rendered rule alongside the outcome so callers can reuse
    /// the substituted body.
    pub async fn wrap_to_target(
        &self,
        file: &TemplateFile,
        dest: &Path,
        meta: &TemplateMeta,
        ide: Ide,
        backup: bool,
    ) -> Result<(RenderedRule, WriteOutcome)> {
        let rule = self.render_template(file, meta).await?;
        let outcome = self
            .commit(dest, &rule.to_rule_file(ide.header_style()), backup)
            .await?;
        Ok((rule, outcome))
    }

    /// Write several rendered rules into one aggregated document
    pub async fn aggregate_files(
        &self,
        rules: &[RenderedRule],
        dest: &Path,
        title: &str,
        backup: bool,
    ) -> Result<WriteOutcome> {
        let sections: Vec<String> = rules.iter().map(RenderedRule::to_section).collect();
        self.commit(dest, &aggregate_document(title, &sections), backup)
            .await
    }

    /// Write `content` to `dest`, backing up a differing previous version first
    ///
    /// Identical content is left untouched. A failed backup is reported in the
    /// outcome and does not stop the write.
    pub async fn commit(&self, dest: &Path, content: &str, backup: bool) -> Result<WriteOutcome> {
        if let Ok(existing) = fs::read(dest).await {
            if existing == content.as_bytes() {
                debug!("Unchanged: {}", dest.display());
                return Ok(WriteOutcome::Unchanged);
            }
        }

        let backup = if backup {
            match self.backup_if_exists(dest).await {
                Ok(Some(path)) => BackupStatus::Created(path),
                Ok(None) => BackupStatus::NotNeeded,
                Err(e) => {
                    warn!("{}; continuing without a backup", e);
                    BackupStatus::Failed(e.to_string())
                }
            }
        } else {
            BackupStatus::NotNeeded
        };

        write_atomic(dest, content).await?;
        Ok(WriteOutcome::Written { backup })
    }

    /// Copy an existing file to a timestamped sibling
    ///
    /// Returns `Ok(None)` when there is nothing to back up.
    pub async fn backup_if_exists(&self, dest: &Path) -> Result<Option<PathBuf>> {
        match fs::metadata(dest).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Ok(None),
        }

        let backup_path = self.backup_path(dest).await;
        fs::copy(dest, &backup_path)
            .await
            .map_err(|source| KitError::Backup {
                path: dest.to_path_buf(),
                source,
            })?;

        debug!("Backed up {} to {}", dest.display(), backup_path.display());
        Ok(Some(backup_path))
    }

    async fn backup_path(&self, dest: &Path) -> PathBuf {
        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = format!("{}.bak-{}", file_name, self.backup_stamp);

        let mut candidate = dest.with_file_name(&base);
        let mut counter = 1;
        while fs::try_exists(&candidate).await.unwrap_or(false) {
            candidate = dest.with_file_name(format!("{}-{}", base, counter));
            counter += 1;
        }
        candidate
    }
}

/// Write through a temporary sibling and rename into place
pub async fn write_atomic(dest: &Path, content: &str) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| KitError::file_write(parent, e))?;
    }

    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = dest.with_file_name(format!(".{}.rules-kit.tmp", file_name));

    if let Err(e) = fs::write(&temp_path, content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(KitError::file_write(dest, e));
    }

    if let Err(e) = fs::rename(&temp_path, dest).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(KitError::file_write(dest, e));
    }

    Ok(())
}

/// Files under `roots` with `extension` that the current run did not produce
pub fn find_stale_files(roots: &[PathBuf], extension: &str, produced: &HashSet<PathBuf>) -> Vec<PathBuf> {
    let mut stale: Vec<PathBuf> = roots
        .iter()
        .filter(|root| root.is_dir())
        .flat_map(|root| WalkDir::new(root).into_iter().filter_map(|e| e.ok()))
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
        .filter(|p| !produced.contains(p))
        .collect();
    stale.sort();
    stale.dedup();
    stale
}
