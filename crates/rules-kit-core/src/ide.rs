//! Target IDE output formats
//!
//! Each AI assistant expects its rules in a different place and shape: many
//! discrete files with a frontmatter header, or one aggregated document.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default Cursor rules folder, relative to the project path
pub const DEFAULT_CURSOR_PATH: &str = ".cursor/rules/rules-kit";

/// Supported AI coding assistants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ide {
    Cursor,
    Vscode,
    Windsurf,
    Continue,
    Zed,
    Claude,
    Gemini,
    Codex,
    Cline,
}

/// Where and how rules are materialized for an IDE
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputShape {
    /// One file per rule under `root`, mirroring the template tree
    Directory {
        root: PathBuf,
        extension: &'static str,
    },
    /// Every rule aggregated into one document
    SingleFile { path: PathBuf },
}

/// Header convention written above each rule body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    /// `description` / `globs` / `alwaysApply` frontmatter
    Cursor,
    /// `trigger` / `globs` / `description` frontmatter
    Windsurf,
    /// `name` / `description` / `globs` / `alwaysApply` frontmatter
    Continue,
    /// Delimited markdown section inside an aggregated document
    Section,
}

impl Ide {
    pub const ALL: [Ide; 9] = [
        Ide::Cursor,
        Ide::Vscode,
        Ide::Windsurf,
        Ide::Continue,
        Ide::Zed,
        Ide::Claude,
        Ide::Gemini,
        Ide::Codex,
        Ide::Cline,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Ide::Cursor => "Cursor",
            Ide::Vscode => "VS Code (GitHub Copilot)",
            Ide::Windsurf => "Windsurf",
            Ide::Continue => "Continue",
            Ide::Zed => "Zed",
            Ide::Claude => "Claude Code",
            Ide::Gemini => "Gemini CLI",
            Ide::Codex => "OpenAI Codex",
            Ide::Cline => "Cline",
        }
    }

    /// CLI identifier, matching the `--ide` value
    pub fn id(&self) -> &'static str {
        match self {
            Ide::Cursor => "cursor",
            Ide::Vscode => "vscode",
            Ide::Windsurf => "windsurf",
            Ide::Continue => "continue",
            Ide::Zed => "zed",
            Ide::Claude => "claude",
            Ide::Gemini => "gemini",
            Ide::Codex => "codex",
            Ide::Cline => "cline",
        }
    }

    /// Output location relative to the project path
    ///
    /// `cursor_path` only affects Cursor and replaces its rules folder.
    pub fn output_shape(&self, cursor_path: Option<&str>) -> OutputShape {
        match self {
            Ide::Cursor => OutputShape::Directory {
                root: PathBuf::from(cursor_path.unwrap_or(DEFAULT_CURSOR_PATH)),
                extension: "mdc",
            },
            Ide::Windsurf => OutputShape::Directory {
                root: PathBuf::from(".windsurf/rules"),
                extension: "md",
            },
            Ide::Continue => OutputShape::Directory {
                root: PathBuf::from(".continue/rules"),
                extension: "md",
            },
            Ide::Vscode => OutputShape::SingleFile {
                path: PathBuf::from(".github/copilot-instructions.md"),
            },
            Ide::Zed => OutputShape::SingleFile {
                path: PathBuf::from(".rules"),
            },
            Ide::Claude => OutputShape::SingleFile {
                path: PathBuf::from("CLAUDE.md"),
            },
            Ide::Gemini => OutputShape::SingleFile {
                path: PathBuf::from("GEMINI.md"),
            },
            Ide::Codex => OutputShape::SingleFile {
                path: PathBuf::from("AGENTS.md"),
            },
            Ide::Cline => OutputShape::SingleFile {
                path: PathBuf::from(".clinerules"),
            },
        }
    }

    pub fn header_style(&self) -> HeaderStyle {
        match self {
            Ide::Cursor => HeaderStyle::Cursor,
            Ide::Windsurf => HeaderStyle::Windsurf,
            Ide::Continue => HeaderStyle::Continue,
            _ => HeaderStyle::Section,
        }
    }

    pub fn is_single_file(&self) -> bool {
        matches!(self.output_shape(None), OutputShape::SingleFile { .. })
    }
}

impl fmt::Display for Ide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_uses_mdc_directory() {
        assert_eq!(
            Ide::Cursor.output_shape(None),
            OutputShape::Directory {
                root: PathBuf::from(".cursor/rules/rules-kit"),
                extension: "mdc",
            }
        );
    }

    #[test]
    fn test_cursor_path_override() {
        let shape = Ide::Cursor.output_shape(Some("custom/rules"));
        assert!(matches!(shape, OutputShape::Directory { root, .. } if root == PathBuf::from("custom/rules")));

        // Other IDEs ignore the cursor path
        assert_eq!(
            Ide::Claude.output_shape(Some("custom/rules")),
            OutputShape::SingleFile {
                path: PathBuf::from("CLAUDE.md")
            }
        );
    }

    #[test]
    fn test_single_file_ides() {
        let single: Vec<Ide> = Ide::ALL.into_iter().filter(Ide::is_single_file).collect();
        assert_eq!(
            single,
            vec![Ide::Vscode, Ide::Zed, Ide::Claude, Ide::Gemini, Ide::Codex, Ide::Cline]
        );
    }

    #[test]
    fn test_ids_parse_as_value_enum() {
        for ide in Ide::ALL {
            assert_eq!(Ide::from_str(ide.id(), false).unwrap(), ide);
        }
    }
}
