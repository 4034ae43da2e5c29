// SPDX-FileCopyrightText: 2026 Leasehold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Both figment deserialization failures and plugin option problems end up
//! as [`ConfigError`] values. Unknown keys carry a Jaro-Winkler "did you
//! mean" suggestion and, when the key came from a TOML file we read, a
//! labelled span into that file.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity a known key needs before it is offered as a correction.
/// Low enough for `hsots` -> `hosts`, high enough to skip unrelated keys.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, rendered through miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section or plugin declares.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(leasehold::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted path of the offending key, or the bare key from figment.
        key: String,
        /// Closest known key, if one is similar enough.
        suggestion: Option<String>,
        /// Comma-separated keys the section accepts.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into the key's type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(leasehold::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        /// `found X, expected Y` as reported by serde.
        detail: String,
        expected: String,
    },

    /// A required key (or required plugin option) was not supplied.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(leasehold::config::missing_key),
        help("add `{key} = <value>` to your leasehold.toml")
    )]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(leasehold::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(leasehold::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match (suggestion, valid_keys.is_empty()) {
        (Some(s), _) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        (None, true) => "this section accepts no keys".to_string(),
        (None, false) => format!("valid keys: {valid_keys}"),
    }
}

impl ConfigError {
    /// An unknown key without source location, suggesting among `valid_keys`.
    pub fn unknown_key(key: impl Into<String>, unknown: &str, valid_keys: &[&str]) -> Self {
        ConfigError::UnknownKey {
            key: key.into(),
            suggestion: suggest_key(unknown, valid_keys),
            valid_keys: valid_keys.join(", "),
            span: None,
            src: None,
        }
    }
}

/// Split a figment error into one [`ConfigError`] per underlying failure.
///
/// `toml_sources` holds `(path, content)` for every file the loader read, so
/// unknown keys can point at the line they appear on.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = match locate_key(&error, field, toml_sources) {
                    Some((span, src)) => (Some(span), Some(src)),
                    None => (None, None),
                };
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(actual, expected) | Kind::InvalidValue(actual, expected) => {
                ConfigError::InvalidType {
                    key: error.path.join("."),
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.clone(),
                }
            }
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Span of `field` in the TOML file the error's metadata names, if we read it.
fn locate_key(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let path = match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => path.display().to_string(),
        _ => return None,
    };
    let (name, content) = toml_sources.iter().find(|(p, _)| *p == path)?;
    let offset = find_key_offset(content, &error.path, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(name, content.clone()),
    ))
}

/// Byte offset of `field` as a key inside the `[path]` table of `content`.
///
/// An empty `path` searches from the top of the file. Nested tables are
/// matched by their dotted header, so `["plugins", "physical_host"]` looks
/// below `[plugins.physical_host]`.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = if path.is_empty() {
        0
    } else {
        let header = format!("[{}]", path.join("."));
        content.find(&header)? + header.len()
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let is_key = line[indent..]
            .strip_prefix(field)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c == '=' || c == ' ' || c == '\t');
        if is_key {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

/// Closest entry of `valid_keys` to `unknown` by Jaro-Winkler similarity.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print each error to stderr with miette's graphical report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut report = String::new();
        match handler.render_report(&mut report, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{report}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_hsots_for_hosts() {
        let valid = &["hosts", "allow_host_selection"];
        assert_eq!(suggest_key("hsots", valid), Some("hosts".to_string()));
    }

    #[test]
    fn suggest_log_levl_for_log_level() {
        let valid = &["log_level", "plugins", "before_end_lead_minutes"];
        assert_eq!(
            suggest_key("log_levl", valid),
            Some("log_level".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["log_level", "plugins"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_nested_section() {
        let content = "[manager]\nhsots = 1\n[plugins.physical_host]\nhsots = [\"a\"]\n";
        let path = vec!["plugins".to_string(), "physical_host".to_string()];
        let offset = find_key_offset(content, &path, "hsots").unwrap();
        assert_eq!(&content[offset..offset + 5], "hsots");
        assert!(offset > content.find("[plugins").unwrap());
    }

    #[test]
    fn find_key_offset_skips_longer_keys_and_handles_indent() {
        let content = "hosts_extra = 1\n  hosts\t= 2\n";
        let offset = find_key_offset(content, &[], "hosts").unwrap();
        assert_eq!(offset, content.find("  hosts").unwrap() + 2);
        assert_eq!(find_key_offset(content, &["missing".to_string()], "hosts"), None);
    }

    #[test]
    fn unknown_key_help_mentions_suggestion() {
        let err = ConfigError::unknown_key("plugins.physical_host.hsots", "hsots", &["hosts"]);
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("did you mean `hosts`?"), "help was: {help}");
    }

    #[test]
    fn unknown_key_in_empty_section_says_so() {
        let err = ConfigError::unknown_key("plugins.volume.pool", "pool", &[]);
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert_eq!(help, "this section accepts no keys");
    }
}
