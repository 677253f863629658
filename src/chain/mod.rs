//! # Chain Module
//!
//! The wrapper chain a request travels through while it is dispatched,
//! forwarded and included.
//!
//! ## Overview
//!
//! A [`RequestChain`] owns the base request and a singly linked list of
//! layers above it. Three kinds of layer exist:
//!
//! - **Forward**: replaces request URI, servlet path and path info for the
//!   forward target. Nested forwards reuse the layer until an include is
//!   stacked beneath it; a forward from inside an include gets its own.
//! - **Include**: overlays the same values for an included target. Every
//!   include stacks a fresh layer directly above the base request.
//! - **Decorator**: application code implementing [`RequestDecorator`],
//!   always kept above the dispatch layers.
//!
//! ## Attribute Isolation
//!
//! Forward and include layers isolate the ten reserved
//! `javax.servlet.forward.*` / `javax.servlet.include.*` attributes. Each
//! layer remembers what its inner request exposed when the layer was created.
//! While the inner value is unchanged, the layer's own value is visible;
//! once something deeper changes it, the deeper value shows through. Writes
//! of those keys never reach the base request, so unwinding a layer restores
//! exactly what the enclosing level saw.
//!
//! Every other attribute passes straight through to the base request and
//! survives unwinding.
//!
//! ## Path Identity
//!
//! The same "inner change wins" rule applies to request URI, servlet path
//! and path info. `request_url` is rebuilt from the inner scheme, host and
//! port plus the effective request URI.

mod core;
mod isolation;
mod layer;

pub use core::{ForwardOutcome, LayerKind, RequestChain};
pub use layer::{PathIdentity, RequestDecorator};
