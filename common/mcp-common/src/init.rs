//! Server startup utilities
//!
//! Tracing setup and the stdio serve loop shared by every MCP server binary.
//! stdout carries protocol frames, so all diagnostics go to stderr.

use rmcp::{transport::stdio, ServerHandler, ServiceExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for an MCP server binary
///
/// - Writes to stderr without ANSI colors
/// - Honors `RUST_LOG`, defaulting `crate_name` to `info`
/// - `LOG_FORMAT=json` switches to JSON lines for log aggregation
///
/// ```rust,ignore
/// mcp_common::init_tracing("mysql_mcp")?;
/// ```
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let registry = tracing_subscriber::registry().with(filter);

    if json_logs_requested() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

fn json_logs_requested() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Serve an already constructed handler over stdin/stdout until the peer disconnects
///
/// Servers that need startup input (a connection URL, a config file) build
/// themselves in `main` and hand the result here.
pub async fn serve_stdio<S>(server: S, name: &str) -> anyhow::Result<()>
where
    S: ServerHandler,
{
    tracing::info!("Starting {} MCP server", name);

    let service = server.serve(stdio()).await?;

    tracing::info!("Server running, waiting for requests...");

    let reason = service.waiting().await?;

    tracing::info!(?reason, "Server shutting down");
    Ok(())
}
