//! DW MCP Library
//!
//! Multi-platform data warehouse gateway exposed over MCP. Queries pass
//! through a read-mostly safety layer before reaching a backend; backend
//! instances are reconstructed from a flat environment namespace at startup.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use dw_mcp::{DwMcpServer, EnvMap, ServerConfig, SqlxConnector};
//!
//! let env: EnvMap = std::env::vars().collect();
//! let server = DwMcpServer::build(&env, ServerConfig::from_env(&env), &SqlxConnector);
//! // Serve via stdio or call handlers directly
//! ```

pub mod backend;
pub mod config;
pub mod descriptor;
pub mod dialects;
pub mod env;
pub mod executor;
pub mod handlers;
pub mod params;
pub mod platform;
pub mod registry;
pub mod safety;
pub mod server;
pub mod startup;

// Re-export the main entry points
pub use config::{ParseMode, ServerConfig};
pub use env::EnvMap;
pub use executor::QueryOutcome;
pub use platform::PlatformKind;
pub use registry::{ConnectionRegistry, Connector, SqlxConnector};
pub use safety::SafetyChecker;
pub use server::DwMcpServer;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the server
///
/// Logs go to stderr (stdout is reserved for the MCP protocol). Set
/// `LOG_FORMAT=json` for structured output and `RUST_LOG` for filtering.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("dw_mcp=info".parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}
