//! Rules Kit Core - Shared library for generating AI assistant rule files
//!
//! This library turns a layered tree of markdown templates into the rule files
//! each AI coding assistant expects (Cursor, Windsurf, Claude, Codex, ...).
//! It is used by the `rules-kit` binary and can be embedded by other tools.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Catalog** - `ConfigService` over `kit-config.json` (stacks, version ranges, architectures)
//! - **Layer 2: File operations** - `FileService` for template rendering, atomic writes and backups
//! - **Layer 3: Orchestration** - `StackService` resolves layers, applies precedence and writes output
//! - **Layer 4: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use rules_kit_core::{ConfigService, GenerationOptions, Selection, StackService};
//!
//! let config = ConfigService::new("templates/kit-config.json");
//! let service = StackService::new(&config, "templates");
//! let meta = service.build_meta(&Selection {
//!     stack: "laravel".to_string(),
//!     project_path: ".".into(),
//!     ..Default::default()
//! })?;
//! let report = service
//!     .generate_rules(Path::new("."), &meta, &GenerationOptions::default(), |_| {})
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod ide;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::{ConfigService, KitConfig};
pub use error::{KitError, Result};
pub use generator::{FileFailure, GenerationOptions, GenerationReport, Selection, StackService};
pub use ide::{Ide, OutputShape};
pub use templates::{FileService, TemplateMeta};

#[cfg(feature = "tui")]
pub use tui::{list, run};
