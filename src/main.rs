//! DW MCP Server
//!
//! Protocol gateway for issuing SQL against configured data warehouse
//! instances. Read-only by default; destructive statements require explicit
//! confirmation per call.

use rmcp::ServiceExt;

use dw_mcp::DwMcpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dw_mcp::init_tracing()?;

    tracing::info!("Starting dw_mcp MCP Server");

    let server = DwMcpServer::from_process_env();
    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!("Server running, waiting for requests...");

    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}
