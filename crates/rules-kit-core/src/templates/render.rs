//! IDE-specific rule headers and aggregated documents

use crate::ide::HeaderStyle;
use crate::templates::frontmatter::RuleFrontmatter;
use crate::templates::layers::TemplateFile;

/// Marker prefix for sections inside aggregated documents
pub const SECTION_MARKER: &str = "rules-kit";

/// A rule body after placeholder substitution, ready for wrapping
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRule {
    /// Source label, e.g. "laravel/base/controllers.md"
    pub origin: String,
    pub title: String,
    pub frontmatter: RuleFrontmatter,
    pub body: String,
    pub fallback_globs: Vec<String>,
}

impl RenderedRule {
    /// Build from a template and its substituted body
    ///
    /// The title is the body's leading `# ` heading if it has one, otherwise
    /// the humanized file name.
    pub fn new(file: &TemplateFile, frontmatter: RuleFrontmatter, body: String) -> Self {
        let title = leading_heading(&body)
            .map(str::to_string)
            .unwrap_or_else(|| humanize(file.name()));
        Self {
            origin: file.origin.clone(),
            title,
            frontmatter,
            body,
            fallback_globs: file.fallback_globs.clone(),
        }
    }

    fn globs(&self) -> Vec<String> {
        self.frontmatter
            .globs
            .as_ref()
            .map(|g| g.to_vec())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| self.fallback_globs.clone())
    }

    fn always_apply(&self, globs: &[String]) -> bool {
        self.frontmatter.always_apply.unwrap_or(globs.is_empty())
    }

    fn description(&self) -> &str {
        self.frontmatter.description.as_deref().unwrap_or(&self.title)
    }

    /// Standalone rule file content for directory-shaped IDEs
    pub fn to_rule_file(&self, style: HeaderStyle) -> String {
        let globs = self.globs();
        let always = self.always_apply(&globs);
        let description = yaml_scalar(self.description());

        let header = match style {
            HeaderStyle::Cursor => format!(
                "---\ndescription: {}\nglobs: {}\nalwaysApply: {}\n---\n",
                description,
                globs.join(","),
                always
            ),
            HeaderStyle::Windsurf => {
                let mut header = String::from("---\n");
                if always {
                    header.push_str("trigger: always_on\n");
                } else {
                    header.push_str("trigger: glob\n");
                    header.push_str(&format!("globs: {}\n", globs.join(", ")));
                }
                header.push_str(&format!("description: {}\n---\n", description));
                header
            }
            HeaderStyle::Continue => format!(
                "---\nname: {}\ndescription: {}\nglobs: {}\nalwaysApply: {}\n---\n",
                yaml_scalar(&self.title),
                description,
                serde_json::to_string(&globs).unwrap_or_else(|_| "[]".to_string()),
                always
            ),
            HeaderStyle::Section => return self.to_section(),
        };

        format!("{}\n{}", header, ensure_trailing_newline(&self.body))
    }

    /// Delimited section for aggregated documents
    pub fn to_section(&self) -> String {
        let body = strip_leading_heading(&self.body);
        format!(
            "<!-- {marker}:begin {origin} -->\n## {title}\n\n{body}<!-- {marker}:end {origin} -->\n",
            marker = SECTION_MARKER,
            origin = self.origin,
            title = self.title,
            body = ensure_trailing_newline(body.trim_start_matches('\n')),
        )
    }

    /// Plain markdown copy without IDE headers
    pub fn to_mirror(&self) -> String {
        ensure_trailing_newline(&self.body).into_owned()
    }
}

/// Join rendered sections into one document under a title heading
pub fn aggregate_document(title: &str, sections: &[String]) -> String {
    let mut doc = format!(
        "# {}\n\n> Generated by rules-kit. Sections between `{}` markers are replaced on every run.\n",
        title, SECTION_MARKER
    );
    for section in sections {
        doc.push('\n');
        doc.push_str(section);
    }
    doc
}

fn leading_heading(body: &str) -> Option<&str> {
    let first = body.lines().find(|l| !l.trim().is_empty())?;
    first
        .strip_prefix("# ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn strip_leading_heading(body: &str) -> &str {
    let trimmed = body.trim_start();
    if trimmed.starts_with("# ") {
        match trimmed.find('\n') {
            Some(end) => &trimmed[end + 1..],
            None => "",
        }
    } else {
        body
    }
}

fn humanize(name: &str) -> String {
    let words: Vec<String> = name
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    words.join(" ")
}

/// Quote a YAML scalar only when leaving it bare would change its meaning
fn yaml_scalar(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.contains(": ")
        || value.contains(" #")
        || value.contains('\n')
        || value.starts_with(|c: char| "!&*{}[]|>'\"%@`#,?-".contains(c))
        || value != value.trim();
    if needs_quotes {
        serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
    } else {
        value.to_string()
    }
}

fn ensure_trailing_newline(text: &str) -> std::borrow::Cow<'_, str> {
    if text.is_empty() || text.ends_with('\n') {
        std::borrow::Cow::Borrowed(text)
    } else {
        std::borrow::Cow::Owned(format!("{}\n", text))
    }
}
