use once_cell::sync::Lazy;
use regex::Regex;

use super::PathPattern;

/// Runs of two or more separators, collapsed before path info is computed.
static REPEATED_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/{2,}").expect("separator regex should be valid"));

/// Path identity computed for one dispatch.
///
/// - `request_uri`: context path followed by the context-relative path
/// - `servlet_path`: the part of the path the handler's pattern owns
/// - `path_info`: whatever remains, or `None` when nothing does
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPaths {
    pub request_uri: String,
    pub servlet_path: String,
    pub path_info: Option<String>,
}

/// Strip a trailing query string (`?a=b`) from a path.
#[inline]
#[must_use]
pub fn strip_query(path: &str) -> &str {
    match path.find('?') {
        Some(pos) => &path[..pos],
        None => path,
    }
}

/// Strip path parameters (`;jsessionid=...`) and any query string.
#[must_use]
pub fn remove_path_param(path: &str) -> &str {
    let path = strip_query(path);
    match path.find(';') {
        Some(pos) => &path[..pos],
        None => path,
    }
}

/// The request URI relative to the context path.
///
/// Returns `/` when the URI names the context root itself and `None` when the
/// URI is empty or does not lie beneath the context path. `/application` is
/// not beneath `/app`.
#[must_use]
pub fn context_relative_path(request_uri: &str, context_path: &str) -> Option<String> {
    if request_uri.is_empty() {
        return None;
    }
    let relative = request_uri.strip_prefix(context_path)?;
    // The context path must end on a segment boundary.
    if !context_path.is_empty() && !relative.is_empty() && !relative.starts_with('/') {
        return None;
    }
    if relative.is_empty() {
        Some("/".to_string())
    } else {
        Some(relative.to_string())
    }
}

/// Compute the path info left over once `servlet_path` is removed.
///
/// Repeated separators in `context_relative_path` are collapsed first.
/// Returns `None` when the path does not start with `servlet_path`, or when
/// a non-empty `servlet_path` consumes the whole path. The remainder is
/// percent-decoded; malformed escapes are returned untouched.
#[must_use]
pub fn compute_path_info(context_relative_path: &str, servlet_path: &str) -> Option<String> {
    let normalized = REPEATED_SEPARATORS.replace_all(context_relative_path, "/");
    let remainder = normalized.strip_prefix(servlet_path)?;

    if remainder.is_empty() && !servlet_path.is_empty() {
        return None;
    }
    Some(decode_path(remainder))
}

/// Compute the path triple for a handler pattern and an incoming path.
///
/// `context_relative_path` must already be free of query strings.
#[must_use]
pub fn compute_paths(
    pattern: &PathPattern,
    context_relative_path: &str,
    context_path: &str,
) -> RequestPaths {
    let context_relative_path = remove_path_param(context_relative_path);
    let servlet_path = pattern
        .matched_path(context_relative_path)
        .unwrap_or_else(|| context_relative_path.to_string());
    let path_info = compute_path_info(context_relative_path, &servlet_path);

    RequestPaths {
        request_uri: format!("{context_path}{context_relative_path}"),
        servlet_path,
        path_info,
    }
}

fn decode_path(raw: &str) -> String {
    if !has_valid_escapes(raw) {
        return raw.to_string();
    }
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// True when every `%` is followed by two hex digits.
fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}
