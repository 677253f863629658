use std::fmt;
use std::mem;

use http::Method;
use tracing::{debug, warn};

use super::layer::{ForwardLayer, IncludeLayer, PathIdentity, RequestDecorator};
use crate::attributes::{self, text, AttrValue};
use crate::paths::RequestPaths;
use crate::request::{build_request_url, AttributeNames, HttpRequest};

/// Kind of a wrapping layer, as reported by [`RequestChain::layers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Forward,
    Include,
    Decorator,
}

/// What [`RequestChain::wrap_forward`] did. Hand it back to
/// [`RequestChain::unwrap_forward`] to undo exactly that step.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "the outcome is needed to unwind the forward"]
pub enum ForwardOutcome {
    /// A new forward layer was inserted above the base request.
    Created,
    /// An existing forward layer took the new paths. Holds the paths it had
    /// before.
    Reused(RequestPaths),
}

enum Wrapper {
    Forward(ForwardLayer),
    Include(IncludeLayer),
    Decorator(Box<dyn RequestDecorator>),
}

impl Wrapper {
    fn kind(&self) -> LayerKind {
        match self {
            Self::Forward(_) => LayerKind::Forward,
            Self::Include(_) => LayerKind::Include,
            Self::Decorator(_) => LayerKind::Decorator,
        }
    }
}

struct Layer {
    wrapper: Wrapper,
    inner: Node,
}

enum Node {
    Base(Box<dyn HttpRequest>),
    Layer(Box<Layer>),
    /// Placeholder while a node is being relinked. Never observable between
    /// chain operations.
    Detached,
}

/// A base request plus the layers dispatch has wrapped around it.
///
/// The chain is singly linked: the head is what handlers see, each layer
/// owns exactly one inner node, and the base request sits at the bottom.
/// Unwinding a layer links its predecessor straight to its successor, so
/// the base request itself is never rewritten.
///
/// # Example
///
/// ```rust
/// use brrtdispatch::chain::{LayerKind, RequestChain};
/// use brrtdispatch::paths::RequestPaths;
/// use brrtdispatch::request::{BaseRequest, HttpRequest};
///
/// let mut chain = RequestChain::new(BaseRequest::get("/start"));
/// let outcome = chain.wrap_forward(
///     RequestPaths {
///         request_uri: "/target/x".to_string(),
///         servlet_path: "/target".to_string(),
///         path_info: Some("/x".to_string()),
///     },
///     true,
/// );
/// assert_eq!(chain.layers(), vec![LayerKind::Forward]);
/// assert_eq!(chain.request_uri(), "/target/x");
///
/// chain.unwrap_forward(outcome);
/// assert_eq!(chain.request_uri(), "/start");
/// ```
pub struct RequestChain {
    head: Node,
}

impl RequestChain {
    pub fn new(base: impl HttpRequest + 'static) -> Self {
        Self::from_boxed(Box::new(base))
    }

    #[must_use]
    pub fn from_boxed(base: Box<dyn HttpRequest>) -> Self {
        Self {
            head: Node::Base(base),
        }
    }

    /// Put an application decorator at the head of the chain.
    pub fn decorate(&mut self, decorator: impl RequestDecorator + 'static) {
        debug!(decorator = decorator.name(), "Request decorated");
        let inner = mem::replace(&mut self.head, Node::Detached);
        self.head = Node::Layer(Box::new(Layer {
            wrapper: Wrapper::Decorator(Box::new(decorator)),
            inner,
        }));
    }

    /// Layer kinds from the head down, base excluded.
    #[must_use]
    pub fn layers(&self) -> Vec<LayerKind> {
        self.iter_layers().map(|layer| layer.wrapper.kind()).collect()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.iter_layers().count()
    }

    /// The unwrapped request at the bottom of the chain.
    #[must_use]
    pub fn base(&self) -> &dyn HttpRequest {
        let mut node = &self.head;
        loop {
            match node {
                Node::Layer(layer) => node = &layer.inner,
                Node::Base(base) => return base.as_ref(),
                Node::Detached => return node,
            }
        }
    }

    fn iter_layers(&self) -> impl Iterator<Item = &Layer> {
        let mut node = &self.head;
        std::iter::from_fn(move || match node {
            Node::Layer(layer) => {
                node = &layer.inner;
                Some(layer.as_ref())
            }
            Node::Base(_) | Node::Detached => None,
        })
    }

    /// Give the chain the path identity `paths`, as seen by a forward target.
    ///
    /// A forward layer sitting directly above the base request is reused:
    /// only its replacement paths change. Otherwise, including when an
    /// include was stacked beneath the existing forward layer, a new forward
    /// layer goes directly above the base request and, when `record_origin`
    /// is set, records the five forward attributes from what the head of the
    /// chain reported before this call.
    pub fn wrap_forward(&mut self, paths: RequestPaths, record_origin: bool) -> ForwardOutcome {
        if let Some(forward) = base_forward_mut(&mut self.head) {
            debug!(
                request_uri = %paths.request_uri,
                servlet_path = %paths.servlet_path,
                "Forward layer reused"
            );
            return ForwardOutcome::Reused(forward.reuse(paths));
        }

        let origin = record_origin.then(|| PathIdentity::of(&self.head));
        debug!(
            request_uri = %paths.request_uri,
            servlet_path = %paths.servlet_path,
            record_origin,
            "Forward layer created"
        );
        insert_above_base(&mut self.head, |base| {
            let mut forward = ForwardLayer::new(&*base, paths);
            if let Some(origin) = origin {
                let recorded = [
                    (attributes::FORWARD_REQUEST_URI, Some(origin.request_uri.as_str())),
                    (attributes::FORWARD_CONTEXT_PATH, Some(origin.context_path.as_str())),
                    (attributes::FORWARD_PATH_INFO, origin.path_info.as_deref()),
                    (attributes::FORWARD_QUERY_STRING, origin.query_string.as_deref()),
                    (attributes::FORWARD_SERVLET_PATH, Some(origin.servlet_path.as_str())),
                ];
                for (key, value) in recorded {
                    forward.attributes.set(&mut *base, key, text(value));
                }
            }
            Wrapper::Forward(forward)
        });
        ForwardOutcome::Created
    }

    /// Undo one [`wrap_forward`](Self::wrap_forward).
    ///
    /// Forwards unwind in reverse order, so the layer in question is again
    /// the one directly above the base request. A created layer is removed;
    /// a reused layer gets its previous paths back. Returns `false` when no
    /// forward layer was found.
    pub fn unwrap_forward(&mut self, outcome: ForwardOutcome) -> bool {
        let found = match outcome {
            ForwardOutcome::Created => remove_deepest(&mut self.head, &|wrapper: &Wrapper| {
                matches!(wrapper, Wrapper::Forward(_))
            }),
            ForwardOutcome::Reused(previous) => match base_forward_mut(&mut self.head) {
                Some(forward) => {
                    drop(forward.reuse(previous));
                    true
                }
                None => false,
            },
        };
        if !found {
            warn!("No forward layer to unwind");
        }
        found
    }

    /// Stack a new include layer directly above the base request.
    ///
    /// The layer records the include attributes: request URI, servlet path
    /// and path info from `paths`, context path and query string from the
    /// base request.
    pub fn wrap_include(&mut self, paths: &RequestPaths) {
        debug!(
            request_uri = %paths.request_uri,
            servlet_path = %paths.servlet_path,
            "Include layer created"
        );
        insert_above_base(&mut self.head, |base| {
            let mut include = IncludeLayer::new(&*base, paths.clone());
            let context_path = base.context_path();
            let query_string = base.query_string();
            let recorded = [
                (attributes::INCLUDE_REQUEST_URI, Some(paths.request_uri.as_str())),
                (attributes::INCLUDE_CONTEXT_PATH, Some(context_path.as_str())),
                (attributes::INCLUDE_PATH_INFO, paths.path_info.as_deref()),
                (attributes::INCLUDE_QUERY_STRING, query_string.as_deref()),
                (attributes::INCLUDE_SERVLET_PATH, Some(paths.servlet_path.as_str())),
            ];
            for (key, value) in recorded {
                include.attributes.set(&mut *base, key, text(value));
            }
            Wrapper::Include(include)
        });
    }

    /// Remove the deepest include layer created for `request_uri`.
    ///
    /// Includes stack at the bottom, so the deepest match is the most
    /// recent include of that URI. Returns `false` when none matched.
    pub fn unwrap_include(&mut self, request_uri: &str) -> bool {
        let found = remove_deepest(&mut self.head, &|wrapper: &Wrapper| {
            matches!(wrapper, Wrapper::Include(include) if include.dispatched_uri() == request_uri)
        });
        if !found {
            warn!(request_uri = %request_uri, "No include layer to unwind");
        }
        found
    }
}

impl fmt::Debug for RequestChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestChain")
            .field("layers", &self.layers())
            .field("request_uri", &self.head.request_uri())
            .finish()
    }
}

/// The forward layer wrapping the base request directly, if there is one.
fn base_forward_mut(node: &mut Node) -> Option<&mut ForwardLayer> {
    let Node::Layer(layer) = node else {
        return None;
    };
    let Layer { wrapper, inner } = &mut **layer;
    match wrapper {
        Wrapper::Forward(forward) if matches!(inner, Node::Base(_)) => Some(forward),
        _ => base_forward_mut(inner),
    }
}

fn insert_above_base(node: &mut Node, build: impl FnOnce(&mut Node) -> Wrapper) {
    if let Node::Layer(layer) = node {
        return insert_above_base(&mut layer.inner, build);
    }
    let mut inner = mem::replace(node, Node::Detached);
    let wrapper = build(&mut inner);
    *node = Node::Layer(Box::new(Layer { wrapper, inner }));
}

/// Replace a layer node by its inner node.
fn unlink(node: &mut Node) {
    *node = match mem::replace(node, Node::Detached) {
        Node::Layer(layer) => layer.inner,
        other => other,
    };
}

fn remove_deepest(node: &mut Node, predicate: &dyn Fn(&Wrapper) -> bool) -> bool {
    let Node::Layer(layer) = node else {
        return false;
    };
    if remove_deepest(&mut layer.inner, predicate) {
        return true;
    }
    if !predicate(&layer.wrapper) {
        return false;
    }
    unlink(node);
    true
}

impl HttpRequest for Layer {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        match &self.wrapper {
            Wrapper::Forward(forward) => forward.attributes.get(&self.inner, name),
            Wrapper::Include(include) => include.attributes.get(&self.inner, name),
            Wrapper::Decorator(decorator) => decorator.attribute(&self.inner, name),
        }
    }

    fn set_attribute(&mut self, name: &str, value: AttrValue) {
        let Layer { wrapper, inner } = self;
        match wrapper {
            Wrapper::Forward(forward) => forward.attributes.set(inner, name, value),
            Wrapper::Include(include) => include.attributes.set(inner, name, value),
            Wrapper::Decorator(decorator) => decorator.set_attribute(inner, name, value),
        }
    }

    fn remove_attribute(&mut self, name: &str) {
        let Layer { wrapper, inner } = self;
        match wrapper {
            Wrapper::Forward(forward) => forward.attributes.remove(inner, name),
            Wrapper::Include(include) => include.attributes.remove(inner, name),
            Wrapper::Decorator(decorator) => decorator.remove_attribute(inner, name),
        }
    }

    fn attribute_names(&self) -> AttributeNames<'_> {
        match &self.wrapper {
            Wrapper::Forward(forward) => forward.attributes.names(&self.inner),
            Wrapper::Include(include) => include.attributes.names(&self.inner),
            Wrapper::Decorator(decorator) => decorator.attribute_names(&self.inner),
        }
    }

    fn method(&self) -> Method {
        self.inner.method()
    }

    fn request_uri(&self) -> String {
        match &self.wrapper {
            Wrapper::Forward(forward) => forward.paths.request_uri(&self.inner),
            Wrapper::Include(include) => include.paths.request_uri(&self.inner),
            Wrapper::Decorator(decorator) => decorator.request_uri(&self.inner),
        }
    }

    fn context_path(&self) -> String {
        self.inner.context_path()
    }

    fn servlet_path(&self) -> String {
        match &self.wrapper {
            Wrapper::Forward(forward) => forward.paths.servlet_path(&self.inner),
            Wrapper::Include(include) => include.paths.servlet_path(&self.inner),
            Wrapper::Decorator(decorator) => decorator.servlet_path(&self.inner),
        }
    }

    fn path_info(&self) -> Option<String> {
        match &self.wrapper {
            Wrapper::Forward(forward) => forward.paths.path_info(&self.inner),
            Wrapper::Include(include) => include.paths.path_info(&self.inner),
            Wrapper::Decorator(decorator) => decorator.path_info(&self.inner),
        }
    }

    fn query_string(&self) -> Option<String> {
        match &self.wrapper {
            Wrapper::Decorator(decorator) => decorator.query_string(&self.inner),
            Wrapper::Forward(_) | Wrapper::Include(_) => self.inner.query_string(),
        }
    }

    fn scheme(&self) -> String {
        self.inner.scheme()
    }

    fn server_name(&self) -> String {
        self.inner.server_name()
    }

    fn server_port(&self) -> Option<u16> {
        self.inner.server_port()
    }

    fn request_url(&self) -> String {
        match &self.wrapper {
            Wrapper::Forward(forward) => forward.paths.request_url(&self.inner),
            Wrapper::Include(include) => include.paths.request_url(&self.inner),
            Wrapper::Decorator(decorator) => build_request_url(
                &self.inner.scheme(),
                &self.inner.server_name(),
                self.inner.server_port(),
                &decorator.request_uri(&self.inner),
            ),
        }
    }
}

macro_rules! delegate_to_node {
    ($node:expr, $req:ident => $call:expr, $detached:expr) => {
        match $node {
            Node::Base($req) => $call,
            Node::Layer($req) => $call,
            Node::Detached => $detached,
        }
    };
}

impl HttpRequest for Node {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        delegate_to_node!(self, req => req.attribute(name), None)
    }

    fn set_attribute(&mut self, name: &str, value: AttrValue) {
        delegate_to_node!(self, req => req.set_attribute(name, value), ())
    }

    fn remove_attribute(&mut self, name: &str) {
        delegate_to_node!(self, req => req.remove_attribute(name), ())
    }

    fn attribute_names(&self) -> AttributeNames<'_> {
        delegate_to_node!(self, req => req.attribute_names(), Box::new(std::iter::empty()))
    }

    fn method(&self) -> Method {
        delegate_to_node!(self, req => req.method(), Method::GET)
    }

    fn request_uri(&self) -> String {
        delegate_to_node!(self, req => req.request_uri(), String::new())
    }

    fn context_path(&self) -> String {
        delegate_to_node!(self, req => req.context_path(), String::new())
    }

    fn servlet_path(&self) -> String {
        delegate_to_node!(self, req => req.servlet_path(), String::new())
    }

    fn path_info(&self) -> Option<String> {
        delegate_to_node!(self, req => req.path_info(), None)
    }

    fn query_string(&self) -> Option<String> {
        delegate_to_node!(self, req => req.query_string(), None)
    }

    fn scheme(&self) -> String {
        delegate_to_node!(self, req => req.scheme(), String::new())
    }

    fn server_name(&self) -> String {
        delegate_to_node!(self, req => req.server_name(), String::new())
    }

    fn server_port(&self) -> Option<u16> {
        delegate_to_node!(self, req => req.server_port(), None)
    }

    fn request_url(&self) -> String {
        delegate_to_node!(self, req => req.request_url(), String::new())
    }
}

impl HttpRequest for RequestChain {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.head.attribute(name)
    }

    fn set_attribute(&mut self, name: &str, value: AttrValue) {
        self.head.set_attribute(name, value);
    }

    fn remove_attribute(&mut self, name: &str) {
        self.head.remove_attribute(name);
    }

    fn attribute_names(&self) -> AttributeNames<'_> {
        self.head.attribute_names()
    }

    fn method(&self) -> Method {
        self.head.method()
    }

    fn request_uri(&self) -> String {
        self.head.request_uri()
    }

    fn context_path(&self) -> String {
        self.head.context_path()
    }

    fn servlet_path(&self) -> String {
        self.head.servlet_path()
    }

    fn path_info(&self) -> Option<String> {
        self.head.path_info()
    }

    fn query_string(&self) -> Option<String> {
        self.head.query_string()
    }

    fn scheme(&self) -> String {
        self.head.scheme()
    }

    fn server_name(&self) -> String {
        self.head.server_name()
    }

    fn server_port(&self) -> Option<u16> {
        self.head.server_port()
    }

    fn request_url(&self) -> String {
        self.head.request_url()
    }
}
