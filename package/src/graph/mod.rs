//! Dependency-graph analysis
//!
//! Parses a requirements manifest into a [`GraphReport`]: the ordered list of
//! `name/version` references plus any names observed with more than one
//! distinct version. Analysis is a pure function of the input text; there is
//! no shared state and no persistence, so it is safe to call concurrently
//! for independent inputs.
//!
//! Conflict detection is a grouping heuristic, not a version-range solver:
//! no transitive resolution, no compatibility scoring.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Version recorded for a token that carries no `/` separator
pub const UNKNOWN_VERSION: &str = "unknown";

/// A `name/version` package reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReference {
    pub name: String,
    pub version: String,
}

impl PackageReference {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse a `name/version` token
    ///
    /// A token without a slash is preserved with version "unknown" rather
    /// than rejected, so one bad line never discards the rest of a manifest.
    /// Trailing `@user/channel` qualifiers are dropped from the version.
    pub fn parse(token: &str) -> Self {
        match token.split_once('/') {
            Some((name, rest)) => {
                let version = rest.split('@').next().unwrap_or(rest);
                Self::new(name.trim(), version.trim())
            }
            None => Self::new(token.trim(), UNKNOWN_VERSION),
        }
    }
}

impl std::fmt::Display for PackageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// A dependency name observed with more than one distinct version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub name: String,
    /// All observed versions, sorted lexicographically
    pub versions: Vec<String>,
}

/// Summary of a requirements manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphReport {
    /// Always equals `dependencies.len()`
    pub total_deps: usize,
    /// References in manifest order
    pub dependencies: Vec<PackageReference>,
    /// Names with >= 2 distinct versions, sorted by name
    pub conflicts: Vec<Conflict>,
    /// Explanatory note when there was nothing to analyze
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GraphReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    fn empty(message: &str) -> Self {
        Self {
            total_deps: 0,
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            message: Some(message.to_string()),
        }
    }

    fn from_refs(dependencies: Vec<PackageReference>) -> Self {
        if dependencies.is_empty() {
            return Self::empty("no requirements found");
        }

        let mut by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for dep in &dependencies {
            let versions = by_name.entry(&dep.name).or_default();
            if !versions.contains(&dep.version.as_str()) {
                versions.push(&dep.version);
            }
        }

        let conflicts = by_name
            .into_iter()
            .filter(|(_, versions)| versions.len() > 1)
            .map(|(name, mut versions)| {
                versions.sort_unstable();
                Conflict {
                    name: name.to_string(),
                    versions: versions.into_iter().map(String::from).collect(),
                }
            })
            .collect();

        Self {
            total_deps: dependencies.len(),
            dependencies,
            conflicts,
            message: None,
        }
    }
}

/// Analyze a plain-text requirements manifest
///
/// One `name/version` token per line; `#` comments and blank lines are
/// ignored. When the text contains section markers, only the `[requires]`
/// block is relevant; without any marker every line is a requirement.
pub fn analyze_str(text: &str) -> GraphReport {
    let has_sections = text
        .lines()
        .map(str::trim)
        .any(|l| l.starts_with('[') && l.ends_with(']'));

    let mut refs = Vec::new();
    let mut in_requires = !has_sections;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_requires = line == "[requires]";
            continue;
        }
        if in_requires {
            refs.push(PackageReference::parse(line));
        }
    }

    GraphReport::from_refs(refs)
}

/// Analyze a JSON requirements manifest
///
/// Accepts either an array of reference strings or an object with a
/// `requires` array, matching the shapes the graph tooling emits.
pub fn analyze_json(text: &str) -> Result<GraphReport> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let items = match &value {
        serde_json::Value::Array(items) => items.as_slice(),
        serde_json::Value::Object(map) => match map.get("requires") {
            Some(serde_json::Value::Array(items)) => items.as_slice(),
            Some(other) => {
                return Err(Error::ManifestParse(format!(
                    "'requires' must be an array, got {}",
                    json_kind(other)
                )))
            }
            None => return Err(Error::ManifestParse("missing 'requires' array".to_string())),
        },
        other => {
            return Err(Error::ManifestParse(format!(
                "expected array or object, got {}",
                json_kind(other)
            )))
        }
    };

    let mut refs = Vec::with_capacity(items.len());
    for item in items {
        let token = item.as_str().ok_or_else(|| {
            Error::ManifestParse(format!("reference must be a string, got {}", json_kind(item)))
        })?;
        refs.push(PackageReference::parse(token));
    }

    Ok(GraphReport::from_refs(refs))
}

/// Analyze a manifest file, dispatching on its extension
///
/// A missing file yields an empty report with an explanatory message rather
/// than an error.
pub fn analyze_path(path: impl AsRef<Path>) -> Result<GraphReport> {
    let path = path.as_ref();
    if !path.is_file() {
        return Ok(GraphReport::empty("no requirements manifest found"));
    }

    let text = std::fs::read_to_string(path)?;
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        analyze_json(&text)
    } else {
        Ok(analyze_str(&text))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            PackageReference::parse("openssl/3.5.2"),
            PackageReference::new("openssl", "3.5.2")
        );
        assert_eq!(
            PackageReference::parse("openssl-base/1.0.1@sparesparrow/stable"),
            PackageReference::new("openssl-base", "1.0.1")
        );
        assert_eq!(
            PackageReference::parse("badtoken"),
            PackageReference::new("badtoken", UNKNOWN_VERSION)
        );
    }

    #[test]
    fn test_total_deps_matches_len() {
        let report = analyze_str("a/1.0\nb/2.0\nc/3.0\n");
        assert_eq!(report.total_deps, report.dependencies.len());
        assert_eq!(report.total_deps, 3);
    }

    #[test]
    fn test_conflict_detection() {
        let report = analyze_str("a/1.0\na/2.0\nb/1.0\n");
        assert_eq!(report.total_deps, 3);
        assert_eq!(
            report.conflicts,
            vec![Conflict {
                name: "a".to_string(),
                versions: vec!["1.0".to_string(), "2.0".to_string()],
            }]
        );
    }

    #[test]
    fn test_conflict_versions_sorted_and_deduped() {
        let report = analyze_str("z/2.0\nz/1.0\nz/2.0\n");
        assert_eq!(report.total_deps, 3);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].versions, vec!["1.0", "2.0"]);
    }

    #[test]
    fn test_empty_input_yields_message() {
        let report = analyze_str("");
        assert_eq!(report.total_deps, 0);
        assert!(report.message.is_some());
        assert!(!report.has_conflicts());
    }

    #[test]
    fn test_requires_section_delimits() {
        let manifest = "\
# build requirements for the tools package
[requires]
openssl/3.5.2
zlib/1.3

[generators]
CMakeDeps
";
        let report = analyze_str(manifest);
        assert_eq!(report.total_deps, 2);
        assert_eq!(report.dependencies[0].name, "openssl");
        assert_eq!(report.dependencies[1].name, "zlib");
    }

    #[test]
    fn test_no_section_markers_takes_all_lines() {
        let report = analyze_str("a/1.0\n# comment\nb/2.0\n");
        assert_eq!(report.total_deps, 2);
    }

    #[test]
    fn test_malformed_token_kept() {
        let report = analyze_str("[requires]\nbadtoken\n");
        assert_eq!(report.total_deps, 1);
        assert_eq!(
            report.dependencies[0],
            PackageReference::new("badtoken", UNKNOWN_VERSION)
        );
    }

    #[test]
    fn test_json_array() {
        let report = analyze_json(r#"["a/1.0", "a/2.0", "b/1.0"]"#).unwrap();
        assert_eq!(report.total_deps, 3);
        assert_eq!(report.conflicts.len(), 1);
    }

    #[test]
    fn test_json_requires_object() {
        let report = analyze_json(r#"{"requires": ["openssl/3.5.2"]}"#).unwrap();
        assert_eq!(report.total_deps, 1);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_json_wrong_shape() {
        let err = analyze_json(r#"{"nodes": []}"#).unwrap_err();
        assert!(matches!(err, Error::ManifestParse(_)));

        let err = analyze_json("42").unwrap_err();
        assert!(matches!(err, Error::ManifestParse(_)));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let report = analyze_path("/nonexistent/conanfile.txt").unwrap();
        assert_eq!(report.total_deps, 0);
        assert!(report.message.is_some());
    }
}
