//! # Config Module
//!
//! Declarative handler mappings loaded from YAML (or JSON) and turned into
//! a [`HandlerRegistry`] against a catalog of handler instances.
//!
//! ## File Format
//!
//! ```yaml
//! context_path: /app
//! init_params:
//!   env: staging
//! mappings:
//!   - pattern: /index.html
//!     handler: index
//!   - pattern: "*.jsp"
//!     handler: jsp
//!     init_params:
//!       cache: "false"
//!   - pattern: "/reports/[0-9]+"
//!     style: regex
//!     handler: reports
//! ```
//!
//! Mappings keep file order, which is also match order. `handler` names an
//! entry of the [`HandlerCatalog`]; mappings naming the same entry share one
//! handler instance and so one init and one destroy.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dispatcher::DispatchPipeline;
use crate::error::DispatchError;
use crate::handler::{AppContext, Handler};
use crate::paths::{PathPattern, PatternStyle};
use crate::registry::{HandlerDefinition, HandlerRegistry};
use crate::runtime_config::RuntimeConfig;

/// One pattern-to-handler mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MappingConfig {
    pub pattern: String,
    #[serde(default)]
    pub style: PatternStyle,
    pub handler: String,
    #[serde(default)]
    pub init_params: HashMap<String, String>,
}

/// Top-level mapping file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub context_path: String,
    /// Application-wide parameters, visible to every handler.
    #[serde(default)]
    pub init_params: HashMap<String, String>,
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,
}

impl PipelineConfig {
    /// Load a mapping file. `.json` files are read as JSON, anything else as
    /// YAML.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mapping config: {}", path.display()))?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let config: PipelineConfig = if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse mapping config: {}", path.display()))?
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse mapping config: {}", path.display()))?
        };
        info!(
            path = %path.display(),
            mappings_count = config.mappings.len(),
            context_path = %config.context_path,
            "Mapping config loaded"
        );
        Ok(config)
    }

    /// Override file values with whatever the environment set.
    #[must_use]
    pub fn with_runtime(mut self, runtime: &RuntimeConfig) -> Self {
        if let Some(context_path) = &runtime.context_path {
            self.context_path = context_path.clone();
        }
        self
    }

    #[must_use]
    pub fn app_context(&self) -> AppContext {
        self.init_params
            .iter()
            .fold(AppContext::new(self.context_path.clone()), |ctx, (k, v)| {
                ctx.with_init_param(k.clone(), v.clone())
            })
    }

    /// Build the registry, resolving each mapping's handler in `catalog`.
    ///
    /// Fails on the first malformed pattern or unknown handler name.
    pub fn build_registry(
        &self,
        catalog: &HandlerCatalog,
    ) -> Result<HandlerRegistry, DispatchError> {
        let definitions = self
            .mappings
            .iter()
            .map(|mapping| {
                let pattern = PathPattern::parse(&mapping.pattern, mapping.style)?;
                let handler = catalog.get(&mapping.handler).ok_or_else(|| {
                    DispatchError::configuration(
                        &mapping.pattern,
                        format!("unknown handler '{}'", mapping.handler),
                    )
                })?;
                Ok(HandlerDefinition::new(pattern, mapping.handler.clone(), handler)
                    .with_init_params(mapping.init_params.clone()))
            })
            .collect::<Result<Vec<_>, DispatchError>>()?;
        Ok(HandlerRegistry::new(definitions))
    }

    pub fn build_pipeline(
        &self,
        catalog: &HandlerCatalog,
    ) -> Result<DispatchPipeline, DispatchError> {
        Ok(DispatchPipeline::new(
            self.build_registry(catalog)?,
            self.app_context(),
        ))
    }
}

/// Named handler instances that mapping files refer to.
#[derive(Default, Clone)]
pub struct HandlerCatalog {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl std::fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCatalog")
            .field("handlers", &self.names())
            .finish()
    }
}

impl HandlerCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the handler registered under `name`.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.register(name, handler);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).map(Arc::clone)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
