//! Placeholder values and substitution

/// Values substituted for `{placeholder}` tokens in templates
///
/// Unset fields leave their token in the output verbatim, as do tokens that
/// name no field at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateMeta {
    pub project_path: Option<String>,
    pub app_directory: Option<String>,
    pub detected_version: Option<String>,
    pub version_range: Option<String>,
    pub stack: Option<String>,
    pub architecture: Option<String>,
    pub cursor_path: Option<String>,
    pub formatted_version_name: Option<String>,
}

impl TemplateMeta {
    /// Value for a placeholder name, if the name is known and set
    pub fn value(&self, key: &str) -> Option<&str> {
        let value = match key {
            "projectPath" => &self.project_path,
            "appDirectory" => &self.app_directory,
            "detectedVersion" => &self.detected_version,
            "versionRange" => &self.version_range,
            "stack" => &self.stack,
            "architecture" => &self.architecture,
            "cursorPath" => &self.cursor_path,
            "formattedVersionName" => &self.formatted_version_name,
            _ => return None,
        };
        value.as_deref()
    }
}

/// Replace every `{key}` token with its value from `meta`
///
/// Single left-to-right pass: substituted values are never rescanned, so a
/// value containing `{stack}` is emitted as-is.
pub fn substitute_variables(content: &str, meta: &TemplateMeta) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open + 1..];

        let replaced = candidate
            .find('}')
            .map(|close| (&candidate[..close], close))
            .filter(|(key, _)| is_placeholder_name(key))
            .and_then(|(key, close)| meta.value(key).map(|v| (v, close)));

        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &candidate[close + 1..];
            }
            None => {
                out.push('{');
                rest = candidate;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_placeholder_name(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> TemplateMeta {
        TemplateMeta {
            project_path: Some("/app".to_string()),
            detected_version: Some("12".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_substitute_known_placeholders() {
        let out = substitute_variables("Project at {projectPath}, version {detectedVersion}", &meta());
        assert_eq!(out, "Project at /app, version 12");
    }

    #[test]
    fn test_unknown_placeholder_left_verbatim() {
        let out = substitute_variables("Keep {unknownKey} here", &meta());
        assert_eq!(out, "Keep {unknownKey} here");
    }

    #[test]
    fn test_unset_placeholder_left_verbatim() {
        let out = substitute_variables("Arch: {architecture}", &meta());
        assert_eq!(out, "Arch: {architecture}");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let meta = TemplateMeta {
            project_path: Some("/srv/{stack}".to_string()),
            stack: Some("laravel".to_string()),
            ..Default::default()
        };
        let out = substitute_variables("{projectPath} {stack}", &meta);
        assert_eq!(out, "/srv/{stack} laravel");
    }

    #[test]
    fn test_code_braces_untouched() {
        let content = "fn main() { println!(\"{}\", x); }\n{ \"a\": 1 }";
        assert_eq!(substitute_variables(content, &meta()), content);
    }

    #[test]
    fn test_repeated_and_adjacent_tokens() {
        let out = substitute_variables("{detectedVersion}{detectedVersion}-{{projectPath}}", &meta());
        assert_eq!(out, "1212-{/app}");
    }
}
