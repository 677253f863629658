use brrtdispatch::cli::run_cli;
use brrtdispatch::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let mut config = LogConfig::from_env();
    // Quiet by default; reports are the output.
    if std::env::var_os("BRRTD_LOG_LEVEL").is_none() {
        config.log_level = "warn".to_string();
    }
    let _guard = init_logging_with_config(&config)?;
    run_cli()
}
