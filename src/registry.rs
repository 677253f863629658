//! # Registry Module
//!
//! Ordered, immutable list of handler mappings and the lifecycle bookkeeping
//! around them.
//!
//! ## Matching
//!
//! Mappings are tried in registration order and the first one whose pattern
//! serves the path wins. Overlapping patterns are allowed; registering the
//! more specific mapping first is up to the application.
//!
//! ## Lifecycle
//!
//! One handler instance may back several mappings. [`HandlerRegistry::init_all`]
//! and [`HandlerRegistry::destroy_all`] call each instance once, keyed on the
//! `Arc` pointer rather than on any notion of handler equality.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{DispatchError, LifecyclePhase};
use crate::handler::{AppContext, Handler, HandlerConfig};
use crate::paths::{compute_paths, PathPattern, RequestPaths};

/// Lifecycle state of a [`HandlerDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Uninitialized,
    Initialized,
    Destroyed,
}

impl HandlerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => HandlerState::Initialized,
            2 => HandlerState::Destroyed,
            _ => HandlerState::Uninitialized,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            HandlerState::Uninitialized => 0,
            HandlerState::Initialized => 1,
            HandlerState::Destroyed => 2,
        }
    }
}

/// One mapping: a pattern bound to a handler instance.
pub struct HandlerDefinition {
    pattern: PathPattern,
    name: String,
    handler: Arc<dyn Handler>,
    init_params: HashMap<String, String>,
    state: AtomicU8,
}

impl fmt::Debug for HandlerDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDefinition")
            .field("pattern", &self.pattern.to_string())
            .field("name", &self.name)
            .field("init_params", &self.init_params)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl HandlerDefinition {
    pub fn new(pattern: PathPattern, name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self {
            pattern,
            name: name.into(),
            handler,
            init_params: HashMap::new(),
            state: AtomicU8::new(HandlerState::Uninitialized.as_u8()),
        }
    }

    #[must_use]
    pub fn with_init_params(mut self, init_params: HashMap<String, String>) -> Self {
        self.init_params = init_params;
        self
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    #[must_use]
    pub fn init_params(&self) -> &HashMap<String, String> {
        &self.init_params
    }

    #[must_use]
    pub fn state(&self) -> HandlerState {
        HandlerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True when this mapping serves the context-relative `path`.
    #[must_use]
    pub fn should_serve(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }

    /// Path triple a request for `path` has when served by this mapping.
    #[must_use]
    pub fn compute_paths(&self, path: &str, context_path: &str) -> RequestPaths {
        compute_paths(&self.pattern, path, context_path)
    }

    fn set_state(&self, state: HandlerState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(&self.handler) as *const () as usize
    }

    /// Initialise the handler unless `seen` says another mapping already did.
    fn init(&self, ctx: &AppContext, seen: &mut HashSet<usize>) -> Result<bool, DispatchError> {
        if !seen.insert(self.identity()) {
            self.set_state(HandlerState::Initialized);
            return Ok(false);
        }
        let config = HandlerConfig::new(self.name.clone(), self.init_params.clone(), ctx.clone());
        self.handler
            .init(&config)
            .map_err(|source| DispatchError::Lifecycle {
                handler: self.name.clone(),
                phase: LifecyclePhase::Init,
                source,
            })?;
        self.set_state(HandlerState::Initialized);
        Ok(true)
    }

    fn destroy(&self, seen: &mut HashSet<usize>) -> Result<bool, DispatchError> {
        if !seen.insert(self.identity()) {
            self.set_state(HandlerState::Destroyed);
            return Ok(false);
        }
        let result = self.handler.destroy();
        self.set_state(HandlerState::Destroyed);
        result.map(|()| true).map_err(|source| DispatchError::Lifecycle {
            handler: self.name.clone(),
            phase: LifecyclePhase::Destroy,
            source,
        })
    }
}

/// Handler mappings in registration order.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    definitions: Vec<HandlerDefinition>,
}

impl HandlerRegistry {
    pub fn new(definitions: Vec<HandlerDefinition>) -> Self {
        if definitions.is_empty() {
            info!(mappings_count = 0, "Handler registry loaded with no mappings");
            return Self { definitions };
        }

        // RT5: Routing table loaded
        let mappings_summary: Vec<String> = definitions
            .iter()
            .take(10)
            .map(|d| format!("{} -> {}", d.pattern, d.name))
            .collect();
        info!(
            mappings_count = definitions.len(),
            mappings_summary = ?mappings_summary,
            matching = "first_match",
            "Handler registry loaded"
        );

        Self { definitions }
    }

    /// The earliest registered mapping serving `path`.
    ///
    /// `path` is context-relative and free of query strings.
    #[must_use]
    pub fn find_first_match(&self, path: &str) -> Option<&HandlerDefinition> {
        // RT1: Route match attempt
        debug!(path = %path, mappings_count = self.definitions.len(), "Route match attempt");

        let found = self.definitions.iter().find(|d| d.should_serve(path));
        match found {
            Some(definition) => {
                // RT3: Route matched
                debug!(
                    path = %path,
                    handler_name = %definition.name,
                    route_pattern = %definition.pattern,
                    "Route matched"
                );
            }
            None => {
                // RT4: No route found
                debug!(path = %path, "No route matched");
            }
        }
        found
    }

    /// Initialise every distinct handler instance in registration order.
    ///
    /// Returns the number of instances initialised. The first failure stops
    /// the walk; handlers already initialised stay initialised.
    pub fn init_all(&self, ctx: &AppContext) -> Result<usize, DispatchError> {
        let mut seen = HashSet::new();
        let mut initialized = 0;
        for definition in &self.definitions {
            match definition.init(ctx, &mut seen) {
                Ok(true) => {
                    // L1: Handler initialised
                    debug!(handler_name = %definition.name, "Handler initialized");
                    initialized += 1;
                }
                Ok(false) => {}
                Err(err) => {
                    // L2: Handler init failed
                    error!(handler_name = %definition.name, error = %err, "Handler init failed");
                    return Err(err);
                }
            }
        }
        info!(handlers_initialized = initialized, "Handlers initialized");
        Ok(initialized)
    }

    /// Destroy every distinct handler instance, continuing past failures.
    pub fn destroy_all(&self) -> Vec<DispatchError> {
        let mut seen = HashSet::new();
        let mut failures = Vec::new();
        let mut destroyed = 0usize;
        for definition in &self.definitions {
            match definition.destroy(&mut seen) {
                Ok(true) => destroyed += 1,
                Ok(false) => {}
                Err(err) => {
                    // L3: Handler destroy failed
                    warn!(handler_name = %definition.name, error = %err, "Handler destroy failed");
                    failures.push(err);
                }
            }
        }
        info!(
            handlers_destroyed = destroyed,
            failures = failures.len(),
            "Handlers destroyed"
        );
        failures
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    #[must_use]
    pub fn definitions(&self) -> &[HandlerDefinition] {
        &self.definitions
    }

    /// `(pattern, handler name)` per mapping, in match order.
    #[must_use]
    pub fn dump_routes(&self) -> Vec<(String, String)> {
        self.definitions
            .iter()
            .map(|d| (d.pattern.to_string(), d.name.clone()))
            .collect()
    }
}
