//! # Paths Module
//!
//! Pure functions that turn a handler pattern and an incoming path into the
//! path identity a handler observes.
//!
//! ## Overview
//!
//! For every dispatch three values are computed:
//!
//! - **request URI**: the context path followed by the context-relative path
//! - **servlet path**: the part of the path the handler's pattern owns
//! - **path info**: what is left beyond the servlet path, if anything
//!
//! ## Pattern Kinds
//!
//! | Mapping        | Matches                       | Servlet path      |
//! |----------------|-------------------------------|-------------------|
//! | `/index.html`  | exactly `/index.html`         | the path          |
//! | `/test/*`      | `/test`, `/test/...`          | `/test`           |
//! | `/*`           | everything                    | empty             |
//! | `*.jsp`        | every path ending in `.jsp`   | the path          |
//! | regex          | full-string regex match       | the path          |
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::paths::{compute_paths, PathPattern};
//!
//! let pattern = PathPattern::servlet("/test/*").unwrap();
//! let paths = compute_paths(&pattern, "/test/a%20b", "/app");
//! assert_eq!(paths.request_uri, "/app/test/a%20b");
//! assert_eq!(paths.servlet_path, "/test");
//! assert_eq!(paths.path_info.as_deref(), Some("/a b"));
//! ```
//!
//! None of these functions see query strings; callers strip them first with
//! [`strip_query`] or [`remove_path_param`].

mod core;
mod pattern;

pub use core::{
    compute_path_info, compute_paths, context_relative_path, remove_path_param, strip_query,
    RequestPaths,
};
pub use pattern::{PathPattern, PatternStyle};
