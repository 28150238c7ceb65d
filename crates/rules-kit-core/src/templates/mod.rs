//! Template discovery, transformation, and output
//!
//! This module provides:
//! - Layer discovery and the last-write-wins rule plan
//! - Template frontmatter parsing and placeholder substitution
//! - IDE-specific headers and aggregated documents
//! - `FileService`, which performs every read, write and backup

pub mod files;
pub mod frontmatter;
pub mod layers;
pub mod meta;
pub mod render;

pub use files::{BackupStatus, FileService, WriteOutcome};
pub use frontmatter::{Globs, RuleFrontmatter};
pub use layers::{Layer, LayerDir, RulePlan, TemplateFile};
pub use meta::{substitute_variables, TemplateMeta};
pub use render::RenderedRule;
