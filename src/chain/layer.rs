use crate::attributes::AttrValue;
use crate::paths::RequestPaths;
use crate::request::{build_request_url, AttributeNames, HttpRequest};

use super::isolation::IsolatedAttributes;

/// Path identity as seen through a request at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathIdentity {
    pub request_uri: String,
    pub context_path: String,
    pub servlet_path: String,
    pub path_info: Option<String>,
    pub query_string: Option<String>,
}

impl PathIdentity {
    #[must_use]
    pub fn of(req: &dyn HttpRequest) -> Self {
        Self {
            request_uri: req.request_uri(),
            context_path: req.context_path(),
            servlet_path: req.servlet_path(),
            path_info: req.path_info(),
            query_string: req.query_string(),
        }
    }
}

/// Replacement path identity for one layer.
///
/// The inner request's values are captured when the layer is created. As long
/// as the inner request still reports them, the replacement is returned.
/// When an inner layer changes a value, that value shows through instead.
#[derive(Debug)]
pub(crate) struct PathOverride {
    original_uri: String,
    original_servlet_path: String,
    original_path_info: Option<String>,
    replacement: RequestPaths,
}

impl PathOverride {
    pub(crate) fn capture(inner: &dyn HttpRequest, replacement: RequestPaths) -> Self {
        Self {
            original_uri: inner.request_uri(),
            original_servlet_path: inner.servlet_path(),
            original_path_info: inner.path_info(),
            replacement,
        }
    }

    /// Swap in new replacement paths, returning the old ones.
    pub(crate) fn replace(&mut self, replacement: RequestPaths) -> RequestPaths {
        std::mem::replace(&mut self.replacement, replacement)
    }

    pub(crate) fn replacement(&self) -> &RequestPaths {
        &self.replacement
    }

    pub(crate) fn request_uri(&self, inner: &dyn HttpRequest) -> String {
        let live = inner.request_uri();
        if live != self.original_uri {
            return live;
        }
        self.replacement.request_uri.clone()
    }

    pub(crate) fn servlet_path(&self, inner: &dyn HttpRequest) -> String {
        let live = inner.servlet_path();
        if live != self.original_servlet_path {
            return live;
        }
        self.replacement.servlet_path.clone()
    }

    pub(crate) fn path_info(&self, inner: &dyn HttpRequest) -> Option<String> {
        let live = inner.path_info();
        if live != self.original_path_info {
            return live;
        }
        self.replacement.path_info.clone()
    }

    pub(crate) fn request_url(&self, inner: &dyn HttpRequest) -> String {
        if inner.request_uri() != self.original_uri {
            return inner.request_url();
        }
        build_request_url(
            &inner.scheme(),
            &inner.server_name(),
            inner.server_port(),
            &self.replacement.request_uri,
        )
    }
}

/// Layer added by a forward, and by the pipeline around top-level service.
///
/// Each include level has at most one forward layer, sitting directly above
/// the base request: later forwards at that level reuse it and only swap
/// the replacement paths.
#[derive(Debug)]
pub(crate) struct ForwardLayer {
    pub(crate) attributes: IsolatedAttributes,
    pub(crate) paths: PathOverride,
}

impl ForwardLayer {
    pub(crate) fn new(inner: &dyn HttpRequest, paths: RequestPaths) -> Self {
        Self {
            attributes: IsolatedAttributes::capture(inner),
            paths: PathOverride::capture(inner, paths),
        }
    }

    pub(crate) fn reuse(&mut self, paths: RequestPaths) -> RequestPaths {
        self.paths.replace(paths)
    }
}

/// Layer added by an include. Never reused.
#[derive(Debug)]
pub(crate) struct IncludeLayer {
    pub(crate) attributes: IsolatedAttributes,
    pub(crate) paths: PathOverride,
}

impl IncludeLayer {
    pub(crate) fn new(inner: &dyn HttpRequest, paths: RequestPaths) -> Self {
        Self {
            attributes: IsolatedAttributes::capture(inner),
            paths: PathOverride::capture(inner, paths),
        }
    }

    /// Request URI of the include that created this layer.
    pub(crate) fn dispatched_uri(&self) -> &str {
        &self.paths.replacement().request_uri
    }
}

/// Application-supplied request wrapper.
///
/// Decorators sit at the head of a [`RequestChain`](super::RequestChain);
/// forward and include layers are always inserted beneath them, so what a
/// decorator adds stays in effect across nested dispatches. Every method
/// delegates to the inner request unless overridden.
pub trait RequestDecorator: Send {
    /// Short name used in logs.
    fn name(&self) -> &str {
        "decorator"
    }

    fn attribute(&self, inner: &dyn HttpRequest, name: &str) -> Option<AttrValue> {
        inner.attribute(name)
    }

    fn set_attribute(&mut self, inner: &mut dyn HttpRequest, name: &str, value: AttrValue) {
        inner.set_attribute(name, value);
    }

    fn remove_attribute(&mut self, inner: &mut dyn HttpRequest, name: &str) {
        inner.remove_attribute(name);
    }

    fn attribute_names<'a>(&'a self, inner: &'a dyn HttpRequest) -> AttributeNames<'a> {
        inner.attribute_names()
    }

    fn request_uri(&self, inner: &dyn HttpRequest) -> String {
        inner.request_uri()
    }

    fn servlet_path(&self, inner: &dyn HttpRequest) -> String {
        inner.servlet_path()
    }

    fn path_info(&self, inner: &dyn HttpRequest) -> Option<String> {
        inner.path_info()
    }

    fn query_string(&self, inner: &dyn HttpRequest) -> Option<String> {
        inner.query_string()
    }
}
