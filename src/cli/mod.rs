//! # CLI Module
//!
//! Command-line inspection of mapping files.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! List the mappings in match order:
//!
//! ```bash
//! brrtdispatch routes --config mappings.yaml
//! ```
//!
//! ### `resolve`
//!
//! Show which mapping serves each request URI and the servlet path and path
//! info the handler would see:
//!
//! ```bash
//! brrtdispatch resolve --config mappings.yaml /app/index.html /app/test/a%20b
//! brrtdispatch resolve --config mappings.yaml --json /app/report.jsp
//! ```
//!
//! `--config` falls back to `BRRTD_CONFIG`, and `BRRTD_CONTEXT_PATH`
//! overrides the file's context path.
//!
//! Handlers are not instantiated: every handler name is backed by a no-op
//! placeholder, which is all matching needs.

mod commands;


pub use commands::{execute, resolve, run_cli, Cli, Commands, Resolution};
