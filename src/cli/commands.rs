use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::{HandlerCatalog, PipelineConfig};
use crate::handler::handler_fn;
use crate::paths::{context_relative_path, remove_path_param};
use crate::registry::HandlerRegistry;
use crate::runtime_config::RuntimeConfig;

/// Command-line interface for inspecting handler mappings
#[derive(Parser)]
#[command(name = "brrtdispatch")]
#[command(about = "Inspect and resolve handler mappings", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List mappings in match order
    Routes {
        /// Mapping file (YAML or JSON)
        #[arg(short, long, env = "BRRTD_CONFIG")]
        config: PathBuf,
    },
    /// Show which mapping serves each path and the paths the handler sees
    Resolve {
        /// Mapping file (YAML or JSON)
        #[arg(short, long, env = "BRRTD_CONFIG")]
        config: PathBuf,

        /// Request URIs to resolve, context path included
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,

        /// Print one JSON object per path
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Resolution of one request URI against a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub input: String,
    pub handler: Option<String>,
    pub pattern: Option<String>,
    pub request_uri: Option<String>,
    pub servlet_path: Option<String>,
    pub path_info: Option<String>,
}

/// Resolve `request_uri` the way the pipeline would for a top-level request.
#[must_use]
pub fn resolve(registry: &HandlerRegistry, context_path: &str, request_uri: &str) -> Resolution {
    let mut resolution = Resolution {
        input: request_uri.to_string(),
        handler: None,
        pattern: None,
        request_uri: None,
        servlet_path: None,
        path_info: None,
    };
    let Some(relative) = context_relative_path(remove_path_param(request_uri), context_path)
    else {
        return resolution;
    };
    let Some(definition) = registry.find_first_match(&relative) else {
        return resolution;
    };
    let paths = definition.compute_paths(&relative, context_path);
    resolution.handler = Some(definition.name().to_string());
    resolution.pattern = Some(definition.pattern().to_string());
    resolution.request_uri = Some(paths.request_uri);
    resolution.servlet_path = Some(paths.servlet_path);
    resolution.path_info = paths.path_info;
    resolution
}

/// One no-op handler per distinct handler name, so inspection needs no
/// application code.
fn placeholder_catalog(config: &PipelineConfig) -> HandlerCatalog {
    let names: HashSet<&str> = config.mappings.iter().map(|m| m.handler.as_str()).collect();
    names.into_iter().fold(HandlerCatalog::new(), |catalog, name| {
        catalog.with(name, Arc::new(handler_fn(|_, _, _| Ok(()))))
    })
}

fn load(config: &Path) -> anyhow::Result<(PipelineConfig, HandlerRegistry)> {
    let config = PipelineConfig::from_path(config)?.with_runtime(&RuntimeConfig::from_env());
    let registry = config
        .build_registry(&placeholder_catalog(&config))
        .context("Invalid handler mapping")?;
    Ok((config, registry))
}

/// Run a parsed command, writing its report to `out`.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Routes { config } => {
            let (config, registry) = load(config)?;
            writeln!(out, "context path: '{}'", config.context_path)?;
            for (index, (pattern, handler)) in registry.dump_routes().into_iter().enumerate() {
                writeln!(out, "{:>3}  {pattern:<32} {handler}", index + 1)?;
            }
            Ok(())
        }
        Commands::Resolve {
            config,
            paths,
            json,
        } => {
            let (config, registry) = load(config)?;
            for path in paths {
                let resolution = resolve(&registry, &config.context_path, path);
                if *json {
                    writeln!(out, "{}", serde_json::to_string(&resolution)?)?;
                    continue;
                }
                match (&resolution.handler, &resolution.pattern) {
                    (Some(handler), Some(pattern)) => writeln!(
                        out,
                        "{path} -> {handler} ({pattern}) request_uri={} servlet_path={} path_info={}",
                        resolution.request_uri.as_deref().unwrap_or(""),
                        resolution.servlet_path.as_deref().unwrap_or(""),
                        resolution.path_info.as_deref().unwrap_or("-"),
                    )?,
                    _ => writeln!(out, "{path} -> no match")?,
                }
            }
            Ok(())
        }
    }
}

/// Parse the process arguments and run the command against stdout.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}
