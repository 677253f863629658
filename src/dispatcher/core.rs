use std::fmt;

use tracing::{debug, info, warn};

use crate::attributes::{AttrValue, MANAGED};
use crate::chain::RequestChain;
use crate::error::DispatchError;
use crate::handler::AppContext;
use crate::paths::{context_relative_path, remove_path_param};
use crate::registry::{HandlerDefinition, HandlerRegistry};
use crate::request::{HttpRequest, HttpResponse};

/// How a handler invocation was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    /// Top-level request through [`DispatchPipeline::service`].
    Request,
    Forward,
    Include,
}

impl DispatchKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchKind::Request => "request",
            DispatchKind::Forward => "forward",
            DispatchKind::Include => "include",
        }
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Passed to every handler invocation.
///
/// Tells the handler how it was reached and gives it access to dispatchers
/// for further forwards and includes.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pipeline: &'a DispatchPipeline,
    handler_name: &'a str,
    kind: DispatchKind,
    depth: usize,
}

impl<'a> DispatchContext<'a> {
    #[must_use]
    pub fn kind(&self) -> DispatchKind {
        self.kind
    }

    /// Number of forwards and includes between the top-level request and
    /// this invocation.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn handler_name(&self) -> &str {
        self.handler_name
    }

    #[must_use]
    pub fn pipeline(&self) -> &'a DispatchPipeline {
        self.pipeline
    }

    /// Dispatcher for the context-relative `path`, if any mapping serves it.
    #[must_use]
    pub fn dispatcher_for(&self, path: &str) -> Option<RequestDispatcher<'a>> {
        self.pipeline.dispatcher_at(path, self.depth + 1)
    }

    /// True when `request` carries the managed marker.
    #[must_use]
    pub fn is_managed(&self, request: &dyn HttpRequest) -> bool {
        request.attribute(MANAGED) == Some(AttrValue::Bool(true))
    }
}

/// Entry point of the dispatch layer: matches requests against the registry
/// and invokes handlers.
#[derive(Debug)]
pub struct DispatchPipeline {
    registry: HandlerRegistry,
    context: AppContext,
}

impl DispatchPipeline {
    pub fn new(registry: HandlerRegistry, context: AppContext) -> Self {
        Self { registry, context }
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Initialise every handler instance once. A failure is fatal.
    pub fn init(&self) -> Result<usize, DispatchError> {
        self.registry.init_all(&self.context)
    }

    /// Destroy every handler instance once, returning every failure.
    pub fn destroy(&self) -> Vec<DispatchError> {
        self.registry.destroy_all()
    }

    /// Serve `request` with the first matching handler.
    ///
    /// Returns `Ok(false)` when nothing matched, leaving the request
    /// untouched. Otherwise the request is wrapped in a forward layer for
    /// the handler's path identity and marked as managed for the duration
    /// of the call. Both are undone whether or not the handler succeeds.
    pub fn service(
        &self,
        request: &mut RequestChain,
        response: &mut dyn HttpResponse,
    ) -> Result<bool, DispatchError> {
        let request_uri = request.request_uri();
        let context_path = request.context_path();
        let Some(relative) = context_relative_path(&request_uri, &context_path) else {
            debug!(
                request_uri = %request_uri,
                context_path = %context_path,
                "Request outside context path"
            );
            return Ok(false);
        };
        let path = remove_path_param(&relative);

        let Some(definition) = self.registry.find_first_match(path) else {
            return Ok(false);
        };

        let paths = definition.compute_paths(path, &context_path);
        // D1: Request wrapped for handler
        debug!(
            handler_name = %definition.name(),
            request_uri = %paths.request_uri,
            servlet_path = %paths.servlet_path,
            path_info = ?paths.path_info,
            "Request wrapped for handler"
        );
        let outcome = request.wrap_forward(paths, false);
        request.set_attribute(MANAGED, AttrValue::Bool(true));

        let result = self.invoke(definition, request, response, DispatchKind::Request, 0);

        request.remove_attribute(MANAGED);
        request.unwrap_forward(outcome);
        result.map(|()| true)
    }

    /// Dispatcher for the context-relative `path`, if any mapping serves it.
    ///
    /// Path parameters and query strings are ignored for matching.
    #[must_use]
    pub fn dispatcher_for(&self, path: &str) -> Option<RequestDispatcher<'_>> {
        self.dispatcher_at(path, 1)
    }

    fn dispatcher_at(&self, path: &str, depth: usize) -> Option<RequestDispatcher<'_>> {
        let path = remove_path_param(path);
        let definition = self.registry.find_first_match(path)?;
        Some(RequestDispatcher {
            pipeline: self,
            definition,
            path: path.to_string(),
            depth,
        })
    }

    fn invoke(
        &self,
        definition: &HandlerDefinition,
        request: &mut RequestChain,
        response: &mut dyn HttpResponse,
        kind: DispatchKind,
        depth: usize,
    ) -> Result<(), DispatchError> {
        let ctx = DispatchContext {
            pipeline: self,
            handler_name: definition.name(),
            kind,
            depth,
        };

        // D3: Request dispatched to handler
        info!(
            handler_name = %definition.name(),
            dispatch_kind = %kind,
            depth,
            method = %request.method(),
            request_uri = %request.request_uri(),
            "Request dispatched to handler"
        );
        let start = std::time::Instant::now();

        match definition.handler().service(request, response, &ctx) {
            Ok(()) => {
                // D5: Handler complete
                debug!(
                    handler_name = %definition.name(),
                    dispatch_kind = %kind,
                    duration_us = start.elapsed().as_micros(),
                    "Handler complete"
                );
                Ok(())
            }
            Err(source) => {
                // D6: Handler failed
                warn!(
                    handler_name = %definition.name(),
                    dispatch_kind = %kind,
                    error = %source,
                    "Handler failed"
                );
                Err(DispatchError::Handler {
                    handler: definition.name().to_string(),
                    source,
                })
            }
        }
    }
}

/// Forwards or includes to one resolved mapping.
#[derive(Debug, Clone)]
pub struct RequestDispatcher<'a> {
    pipeline: &'a DispatchPipeline,
    definition: &'a HandlerDefinition,
    path: String,
    depth: usize,
}

impl<'a> RequestDispatcher<'a> {
    #[must_use]
    pub fn handler_name(&self) -> &'a str {
        self.definition.name()
    }

    /// Context-relative target path, path parameters and query removed.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Hand the request over to the target handler.
    ///
    /// Fails with [`DispatchError::Precondition`] when the response is
    /// already committed; nothing is touched in that case. Otherwise the
    /// buffered output is discarded and the target sees the forward's path
    /// identity until it returns.
    pub fn forward(
        &self,
        request: &mut RequestChain,
        response: &mut dyn HttpResponse,
    ) -> Result<(), DispatchError> {
        if response.is_committed() {
            // D2: Forward rejected
            warn!(
                target_path = %self.path,
                handler_name = %self.definition.name(),
                "Forward after response committed"
            );
            return Err(DispatchError::Precondition(
                "response has been committed; forward is only allowed before committing the response"
                    .to_string(),
            ));
        }
        response.reset_buffer();

        let paths = self
            .definition
            .compute_paths(&self.path, &request.context_path());
        let outcome = request.wrap_forward(paths, true);
        let result = self.pipeline.invoke(
            self.definition,
            request,
            response,
            DispatchKind::Forward,
            self.depth,
        );
        request.unwrap_forward(outcome);
        result
    }

    /// Run the target handler with the include attributes in place, then
    /// return to the caller's view of the request.
    pub fn include(
        &self,
        request: &mut RequestChain,
        response: &mut dyn HttpResponse,
    ) -> Result<(), DispatchError> {
        let paths = self
            .definition
            .compute_paths(&self.path, &request.context_path());
        request.wrap_include(&paths);
        let result = self.pipeline.invoke(
            self.definition,
            request,
            response,
            DispatchKind::Include,
            self.depth,
        );
        request.unwrap_include(&paths.request_uri);
        result
    }
}
