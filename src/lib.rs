//! # brrtdispatch
//!
//! **brrtdispatch** is a request-dispatch layer for long-lived server
//! processes. It maps incoming requests to path-addressable handlers and lets
//! those handlers re-dispatch the same request with servlet-style `forward`
//! and `include` semantics.
//!
//! ## Overview
//!
//! Three things make up the core:
//!
//! 1. **Ordered matching**: mappings are tried in registration order and the
//!    first match wins ([`registry`]).
//! 2. **Nested wrapping**: a request travels through a chain of layers; a
//!    forward reuses the single forward layer, every include stacks a new
//!    one, and each is unwound when its handler returns ([`chain`]).
//! 3. **Attribute isolation**: the ten `javax.servlet.forward.*` /
//!    `javax.servlet.include.*` attributes show each nesting level its own
//!    view without touching the underlying request.
//!
//! ## Architecture
//!
//! - **[`attributes`]** - Reserved attribute keys and the value type
//! - **[`paths`]** - Pattern parsing, servlet path and path info computation
//! - **[`request`]** - Request/response capability traits and base types
//! - **[`chain`]** - The wrapper chain with forward, include and decorator layers
//! - **[`handler`]** - The handler contract and its configuration
//! - **[`registry`]** - Ordered mappings and handler lifecycle
//! - **[`dispatcher`]** - Top-level service plus forward and include
//! - **[`config`]** / **[`runtime_config`]** - Mapping files and environment overrides
//! - **[`logging`]** - Structured `tracing` setup
//! - **[`cli`]** - Mapping inspection commands
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Hosting server
//!     participant Pipeline as DispatchPipeline
//!     participant Registry as HandlerRegistry
//!     participant Chain as RequestChain
//!     participant A as Handler A
//!     participant B as Handler B
//!
//!     Host->>Pipeline: service(chain, response)
//!     Pipeline->>Registry: find_first_match(path)
//!     Registry-->>Pipeline: definition A
//!     Pipeline->>Chain: wrap_forward(paths A), set managed marker
//!     Pipeline->>A: service
//!     A->>Pipeline: dispatcher_for("/b.jsp").include(...)
//!     Pipeline->>Chain: wrap_include(paths B)
//!     Pipeline->>B: service
//!     B-->>Pipeline: Ok
//!     Pipeline->>Chain: unwrap_include
//!     A-->>Pipeline: Ok
//!     Pipeline->>Chain: remove marker, unwrap_forward
//!     Pipeline-->>Host: Ok(true)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use brrtdispatch::chain::RequestChain;
//! use brrtdispatch::config::{HandlerCatalog, PipelineConfig};
//! use brrtdispatch::handler::handler_fn;
//! use brrtdispatch::request::{BaseRequest, BufferedResponse, HttpRequest, HttpResponse};
//!
//! let config: PipelineConfig = serde_yaml::from_str(
//!     r#"
//! mappings:
//!   - pattern: /hello/*
//!     handler: hello
//! "#,
//! )
//! .unwrap();
//! let catalog = HandlerCatalog::new().with(
//!     "hello",
//!     Arc::new(handler_fn(|req, res, _ctx| {
//!         let who = req.path_info().unwrap_or_default();
//!         res.write(format!("hello {}", who.trim_start_matches('/')).as_bytes())?;
//!         Ok(())
//!     })),
//! );
//!
//! let pipeline = config.build_pipeline(&catalog).unwrap();
//! pipeline.init().unwrap();
//!
//! let mut request = RequestChain::new(BaseRequest::get("/hello/world"));
//! let mut response = BufferedResponse::new();
//! assert!(pipeline.service(&mut request, &mut response).unwrap());
//! assert_eq!(response.body_text(), "hello world");
//!
//! assert!(pipeline.destroy().is_empty());
//! ```

pub mod attributes;
pub mod chain;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod logging;
pub mod paths;
pub mod registry;
pub mod request;
pub mod runtime_config;

pub use chain::RequestChain;
pub use config::{HandlerCatalog, PipelineConfig};
pub use dispatcher::{DispatchContext, DispatchKind, DispatchPipeline, RequestDispatcher};
pub use error::{DispatchError, HandlerError};
pub use handler::{AppContext, Handler, HandlerConfig};
pub use registry::{HandlerDefinition, HandlerRegistry};
