//! # Handler Module
//!
//! The contract every dispatch target implements, plus the configuration a
//! handler receives when it is initialised.
//!
//! ## Lifecycle
//!
//! 1. [`Handler::init`] runs once per handler instance when the pipeline
//!    starts, even when several mappings share the instance.
//! 2. [`Handler::service`] runs for every request, forward or include that
//!    resolves to one of the handler's mappings. It may run concurrently on
//!    different requests.
//! 3. [`Handler::destroy`] runs once per instance at shutdown.
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::chain::RequestChain;
//! use brrtdispatch::dispatcher::DispatchContext;
//! use brrtdispatch::error::HandlerError;
//! use brrtdispatch::handler::Handler;
//! use brrtdispatch::request::{HttpRequest, HttpResponse};
//!
//! struct Hello;
//!
//! impl Handler for Hello {
//!     fn service(
//!         &self,
//!         request: &mut RequestChain,
//!         response: &mut dyn HttpResponse,
//!         _ctx: &DispatchContext<'_>,
//!     ) -> Result<(), HandlerError> {
//!         let body = format!("hello from {}", request.servlet_path());
//!         response.write(body.as_bytes())?;
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::chain::RequestChain;
use crate::dispatcher::DispatchContext;
use crate::error::HandlerError;
use crate::request::HttpResponse;

/// A unit of request-processing logic bound to one or more path patterns.
///
/// Handlers are shared behind `Arc` and called from whatever thread serves
/// the request, so any state they keep needs interior mutability.
pub trait Handler: Send + Sync {
    fn init(&self, _config: &HandlerConfig) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Process one request. `ctx` reports how the call was reached and
    /// hands out dispatchers for forwards and includes.
    fn service(
        &self,
        request: &mut RequestChain,
        response: &mut dyn HttpResponse,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), HandlerError>;

    fn destroy(&self) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Application-wide settings shared by every handler.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    context_path: String,
    init_params: HashMap<String, String>,
}

impl AppContext {
    pub fn new(context_path: impl Into<String>) -> Self {
        Self {
            context_path: context_path.into(),
            init_params: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_init_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.init_params.insert(name.into(), value.into());
        self
    }

    /// Path prefix the application is mounted under; empty for the root.
    #[must_use]
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    #[must_use]
    pub fn init_param(&self, name: &str) -> Option<&str> {
        self.init_params.get(name).map(String::as_str)
    }
}

/// What a handler sees during [`Handler::init`].
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    name: String,
    init_params: HashMap<String, String>,
    context: AppContext,
}

impl HandlerConfig {
    pub fn new(
        name: impl Into<String>,
        init_params: HashMap<String, String>,
        context: AppContext,
    ) -> Self {
        Self {
            name: name.into(),
            init_params,
            context,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn init_param(&self, name: &str) -> Option<&str> {
        self.init_params.get(name).map(String::as_str)
    }

    /// Parameter names in sorted order.
    #[must_use]
    pub fn init_param_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.init_params.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn context(&self) -> &AppContext {
        &self.context
    }
}

/// Handler built from a closure. Init and destroy do nothing.
pub struct FnHandler<F> {
    service: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(
            &mut RequestChain,
            &mut dyn HttpResponse,
            &DispatchContext<'_>,
        ) -> Result<(), HandlerError>
        + Send
        + Sync,
{
    fn service(
        &self,
        request: &mut RequestChain,
        response: &mut dyn HttpResponse,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), HandlerError> {
        (self.service)(request, response, ctx)
    }
}

/// Wrap a closure as a [`Handler`].
pub fn handler_fn<F>(service: F) -> FnHandler<F>
where
    F: Fn(
            &mut RequestChain,
            &mut dyn HttpResponse,
            &DispatchContext<'_>,
        ) -> Result<(), HandlerError>
        + Send
        + Sync,
{
    FnHandler { service }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_config_accessors() {
        let mut params = HashMap::new();
        params.insert("b".to_string(), "2".to_string());
        params.insert("a".to_string(), "1".to_string());
        let ctx = AppContext::new("/app").with_init_param("env", "test");
        let config = HandlerConfig::new("index", params, ctx);

        assert_eq!(config.name(), "index");
        assert_eq!(config.init_param("a"), Some("1"));
        assert_eq!(config.init_param("missing"), None);
        assert_eq!(config.init_param_names(), vec!["a", "b"]);
        assert_eq!(config.context().context_path(), "/app");
        assert_eq!(config.context().init_param("env"), Some("test"));
    }
}
