//! Template frontmatter parsing

use serde::{Deserialize, Serialize};

/// Metadata block at the top of a template (`---` fenced YAML)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleFrontmatter {
    /// Short description shown by the IDE
    #[serde(default)]
    pub description: Option<String>,

    /// File patterns the rule applies to
    #[serde(default)]
    pub globs: Option<Globs>,

    /// Whether the rule is always attached to the context
    #[serde(default, rename = "alwaysApply", alias = "always_apply")]
    pub always_apply: Option<bool>,
}

/// Globs may be written as a comma separated string or a YAML list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Globs {
    List(Vec<String>),
    Single(String),
}

impl Globs {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Globs::List(list) => list.clone(),
            Globs::Single(s) => s
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// A template split into its metadata and body
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    pub frontmatter: RuleFrontmatter,
    pub body: String,
}

/// Split a template into frontmatter and body
///
/// Text without a leading `---` fence is all body. A fence that is never
/// closed is treated as body as well.
pub fn split_frontmatter(content: &str) -> Result<ParsedTemplate, serde_yaml::Error> {
    let normalized = content.strip_prefix('\u{feff}').unwrap_or(content);

    let Some(rest) = normalized
        .strip_prefix("---\n")
        .or_else(|| normalized.strip_prefix("---\r\n"))
    else {
        return Ok(ParsedTemplate {
            frontmatter: RuleFrontmatter::default(),
            body: normalized.to_string(),
        });
    };

    let Some((yaml, body)) = find_closing_fence(rest) else {
        return Ok(ParsedTemplate {
            frontmatter: RuleFrontmatter::default(),
            body: normalized.to_string(),
        });
    };

    let frontmatter = if yaml.trim().is_empty() {
        RuleFrontmatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok(ParsedTemplate {
        frontmatter,
        body: body.trim_start_matches(['\r', '\n']).to_string(),
    })
}

fn find_closing_fence(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}
