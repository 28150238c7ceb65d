//! Lenient version parsing for stack versions and manifest constraints

use semver::Version;

/// Parse a version string, handling the loose formats users and manifests use
///
/// Accepts `12`, `v12`, `12.3`, `12.3.1`, and constraint prefixes such as
/// `^12.0`, `~11.2.1` or `>=10`. Missing components default to zero.
pub fn parse_version(version_str: &str) -> Option<Version> {
    let cleaned = version_str
        .trim()
        .trim_start_matches(|c: char| matches!(c, '^' | '~' | '=' | '>' | '<' | ' '));
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);

    if let Ok(version) = Version::parse(cleaned) {
        return Some(version);
    }

    // Pad "12" / "12.3" out to a full semver triple
    let numeric: String = cleaned
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let parts: Vec<&str> = numeric.split('.').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    Version::parse(&padded).ok()
}

/// Major component of a loosely formatted version
pub fn major_version(version_str: &str) -> Option<u64> {
    parse_version(version_str).map(|v| v.major)
}

/// Extract the leading numeric version from a dependency constraint
///
/// `^12.0` -> `12`, `~11.2.1` -> `11`, `>=10 <12` -> `10`, `*` -> None
pub fn version_from_constraint(constraint: &str) -> Option<String> {
    let first = constraint
        .split(['|', ',', ' '])
        .map(str::trim)
        .find(|part| part.chars().any(|c| c.is_ascii_digit()))?;
    major_version(first).map(|major| major.to_string())
}
