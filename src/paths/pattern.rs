use std::fmt;

use regex::Regex;

use crate::error::DispatchError;

/// How a mapping string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternStyle {
    /// Servlet-style mapping: literal, `/prefix/*` or `*.ext`.
    #[default]
    Servlet,
    /// Regular expression that must match the whole path.
    Regex,
}

/// A compiled handler path pattern.
///
/// Patterns are compiled once when the registry is built; a malformed
/// pattern is a configuration error, never a dispatch-time failure.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Matches exactly one path (`/index.html`, `/`).
    Literal(String),
    /// `/x/*`: matches `/x` and everything beneath it. Stored without the
    /// trailing `/*`, so `/*` is stored as the empty prefix.
    Prefix(String),
    /// `*.ext`: matches every path ending in `.ext`. Stored as `.ext`.
    Suffix(String),
    /// Regular expression anchored to the whole path.
    Regex { source: String, regex: Regex },
}

impl PathPattern {
    /// Compile a mapping in the given style.
    pub fn parse(pattern: &str, style: PatternStyle) -> Result<Self, DispatchError> {
        match style {
            PatternStyle::Servlet => Self::servlet(pattern),
            PatternStyle::Regex => Self::regex(pattern),
        }
    }

    /// Compile a servlet-style mapping.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] when the mapping is neither a
    /// literal path, a `/prefix/*` mapping nor a `*.ext` mapping.
    pub fn servlet(pattern: &str) -> Result<Self, DispatchError> {
        if let Some(ext) = pattern.strip_prefix('*') {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(DispatchError::configuration(
                    pattern,
                    "extension mappings must look like '*.ext'",
                ));
            }
            if ext.contains('/') || ext.contains('*') {
                return Err(DispatchError::configuration(
                    pattern,
                    "extension mappings cannot contain '/' or a second '*'",
                ));
            }
            return Ok(PathPattern::Suffix(ext.to_string()));
        }

        if let Some(prefix) = pattern.strip_suffix("/*") {
            if prefix.contains('*') {
                return Err(DispatchError::configuration(
                    pattern,
                    "'*' is only allowed as a trailing '/*'",
                ));
            }
            if !prefix.is_empty() && !prefix.starts_with('/') {
                return Err(DispatchError::configuration(
                    pattern,
                    "prefix mappings must start with '/'",
                ));
            }
            return Ok(PathPattern::Prefix(prefix.to_string()));
        }

        if pattern.contains('*') {
            return Err(DispatchError::configuration(
                pattern,
                "'*' is only allowed as '*.ext' or a trailing '/*'",
            ));
        }
        if !pattern.is_empty() && !pattern.starts_with('/') {
            return Err(DispatchError::configuration(
                pattern,
                "literal mappings must start with '/'",
            ));
        }
        Ok(PathPattern::Literal(pattern.to_string()))
    }

    /// Compile a regular-expression mapping. The expression must match the
    /// whole path, not a substring of it.
    pub fn regex(pattern: &str) -> Result<Self, DispatchError> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| DispatchError::configuration(pattern, e.to_string()))?;
        Ok(PathPattern::Regex {
            source: pattern.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn style(&self) -> PatternStyle {
        match self {
            PathPattern::Regex { .. } => PatternStyle::Regex,
            _ => PatternStyle::Servlet,
        }
    }

    /// Returns true when this pattern serves the context-relative `path`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Literal(literal) => literal == path,
            PathPattern::Prefix(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            PathPattern::Suffix(ext) => path.ends_with(ext.as_str()),
            PathPattern::Regex { regex, .. } => regex.is_match(path),
        }
    }

    /// The portion of `path` this pattern claims (the servlet path).
    ///
    /// Returns `None` for regular expressions, which have no static segment;
    /// callers then treat the whole path as matched.
    #[must_use]
    pub fn matched_path(&self, path: &str) -> Option<String> {
        match self {
            PathPattern::Prefix(prefix) => Some(prefix.clone()),
            PathPattern::Literal(_) | PathPattern::Suffix(_) => Some(path.to_string()),
            PathPattern::Regex { .. } => None,
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Literal(literal) => f.write_str(literal),
            PathPattern::Prefix(prefix) => write!(f, "{prefix}/*"),
            PathPattern::Suffix(ext) => write!(f, "*{ext}"),
            PathPattern::Regex { source, .. } => f.write_str(source),
        }
    }
}
