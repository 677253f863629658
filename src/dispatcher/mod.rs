//! # Dispatcher Module
//!
//! Request dispatch on top of the [`HandlerRegistry`](crate::registry::HandlerRegistry):
//! top-level service plus nested forwards and includes.
//!
//! ## Overview
//!
//! [`DispatchPipeline::service`] handles a request arriving from the hosting
//! server. It finds the first matching mapping, wraps the request so the
//! handler sees its own servlet path and path info, sets the
//! `com.google.inject.servlet.guice_managed` marker and calls the handler.
//!
//! From inside a handler, [`DispatchContext::dispatcher_for`] resolves
//! another path to a [`RequestDispatcher`]:
//!
//! - [`RequestDispatcher::forward`] hands the request over. The response
//!   must not be committed yet; buffered output is discarded first.
//! - [`RequestDispatcher::include`] runs the target and comes back, with the
//!   `javax.servlet.include.*` attributes describing the target meanwhile.
//!
//! Every wrap is undone when the handler returns, on success and on error.
//! Handler panics are not caught.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use brrtdispatch::chain::RequestChain;
//! use brrtdispatch::dispatcher::DispatchPipeline;
//! use brrtdispatch::handler::{handler_fn, AppContext};
//! use brrtdispatch::paths::PathPattern;
//! use brrtdispatch::registry::{HandlerDefinition, HandlerRegistry};
//! use brrtdispatch::request::{BaseRequest, BufferedResponse, HttpRequest, HttpResponse};
//!
//! let jsp = Arc::new(handler_fn(|req, res, _ctx| {
//!     res.write(req.servlet_path().as_bytes())?;
//!     Ok(())
//! }));
//! let front = Arc::new(handler_fn(|req, res, ctx| {
//!     if let Some(dispatcher) = ctx.dispatcher_for("/view.jsp") {
//!         dispatcher.forward(req, res)?;
//!     }
//!     Ok(())
//! }));
//!
//! let registry = HandlerRegistry::new(vec![
//!     HandlerDefinition::new(PathPattern::servlet("/").unwrap(), "front", front),
//!     HandlerDefinition::new(PathPattern::servlet("*.jsp").unwrap(), "jsp", jsp),
//! ]);
//! let pipeline = DispatchPipeline::new(registry, AppContext::default());
//! pipeline.init().unwrap();
//!
//! let mut request = RequestChain::new(BaseRequest::get("/"));
//! let mut response = BufferedResponse::new();
//! assert!(pipeline.service(&mut request, &mut response).unwrap());
//! assert_eq!(response.body_text(), "/view.jsp");
//! ```

mod core;

pub use core::{DispatchContext, DispatchKind, DispatchPipeline, RequestDispatcher};
