pub mod cli;
pub mod jq_exec;

/// Logs go to stderr so stdout stays clean JSON. `RUST_LOG` overrides the
/// default `warn` level.
fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let command_line_interface = cli::CommandLineInterface::load();
    tracing::debug!(?command_line_interface, "parsed arguments");
    command_line_interface.run()
}
