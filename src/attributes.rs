//! Reserved request attribute keys.
//!
//! Two groups of five keys carry the path metadata a forward or include
//! exposes to the dispatch target, named as in the Servlet API. Every
//! dispatch layer isolates these ten keys; all other attribute names pass
//! straight through to the request underneath.
//!
//! One more key, [`MANAGED`], marks a request as currently being serviced by
//! a handler owned by the dispatch pipeline.

/// Attribute value stored on a request.
///
/// Path metadata is stored as strings and the managed marker as `true`.
/// Storing [`serde_json::Value::Null`] behaves like removing the attribute.
pub type AttrValue = serde_json::Value;

/// Marks requests serviced by handlers owned by the dispatch pipeline.
pub const MANAGED: &str = "com.google.inject.servlet.guice_managed";

pub const FORWARD_REQUEST_URI: &str = "javax.servlet.forward.request_uri";
pub const FORWARD_CONTEXT_PATH: &str = "javax.servlet.forward.context_path";
pub const FORWARD_SERVLET_PATH: &str = "javax.servlet.forward.servlet_path";
pub const FORWARD_PATH_INFO: &str = "javax.servlet.forward.path_info";
pub const FORWARD_QUERY_STRING: &str = "javax.servlet.forward.query_string";

pub const INCLUDE_REQUEST_URI: &str = "javax.servlet.include.request_uri";
pub const INCLUDE_CONTEXT_PATH: &str = "javax.servlet.include.context_path";
pub const INCLUDE_SERVLET_PATH: &str = "javax.servlet.include.servlet_path";
pub const INCLUDE_PATH_INFO: &str = "javax.servlet.include.path_info";
pub const INCLUDE_QUERY_STRING: &str = "javax.servlet.include.query_string";

/// The ten keys isolated per dispatch layer, forward keys first.
pub const SPECIAL_ATTRIBUTES: [&str; 10] = [
    FORWARD_REQUEST_URI,
    FORWARD_CONTEXT_PATH,
    FORWARD_PATH_INFO,
    FORWARD_QUERY_STRING,
    FORWARD_SERVLET_PATH,
    INCLUDE_REQUEST_URI,
    INCLUDE_CONTEXT_PATH,
    INCLUDE_PATH_INFO,
    INCLUDE_QUERY_STRING,
    INCLUDE_SERVLET_PATH,
];

/// Returns the interned key when `name` is one of the isolated keys.
#[inline]
#[must_use]
pub fn special_key(name: &str) -> Option<&'static str> {
    SPECIAL_ATTRIBUTES.iter().copied().find(|k| *k == name)
}

#[inline]
#[must_use]
pub fn is_special(name: &str) -> bool {
    special_key(name).is_some()
}

/// Converts an optional path component into an attribute value.
///
/// `None` maps to `Null`, which removes the attribute when stored.
#[must_use]
pub fn text(value: Option<&str>) -> AttrValue {
    match value {
        Some(v) => AttrValue::String(v.to_string()),
        None => AttrValue::Null,
    }
}

/// Reads an attribute back as a string, ignoring non-string values.
#[must_use]
pub fn as_text(value: Option<AttrValue>) -> Option<String> {
    match value {
        Some(AttrValue::String(s)) => Some(s),
        _ => None,
    }
}
