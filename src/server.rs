//! MCP server implementation
//!
//! Exposes the warehouse gateway as rmcp tools plus a small set of prompt
//! templates. Handler logic lives in the handlers module; this file is
//! routing only.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, GetPromptRequestParam, GetPromptResult, ListPromptsResult,
        PaginatedRequestParam, Prompt, PromptArgument, PromptMessage, PromptMessageRole,
        ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer,
};

use crate::config::ServerConfig;
use crate::env::EnvMap;
use crate::handlers;
use crate::params::*;
use crate::registry::{ConnectionRegistry, Connector, SqlxConnector};
use crate::startup;

/// The DW MCP Server
#[derive(Clone)]
pub struct DwMcpServer {
    registry: Arc<ConnectionRegistry>,
    config: ServerConfig,
    tool_router: ToolRouter<Self>,
}

impl DwMcpServer {
    /// Build a server from the process environment (with `.env` overlay)
    pub fn from_process_env() -> Self {
        let mut env = EnvMap::from_process();
        env.load_dotenv(None);

        let fixes = crate::config::auto_fix(&mut env);
        for fix in &fixes {
            tracing::info!("Config auto-fix: {fix}");
        }

        let config = ServerConfig::from_env(&env);
        Self::build(&env, config, &SqlxConnector)
    }

    /// Build a server from an explicit environment snapshot
    pub fn build(env: &EnvMap, config: ServerConfig, connector: &dyn Connector) -> Self {
        let registry = ConnectionRegistry::build(env, config.parse_mode, connector);
        startup::log_registry_summary(&registry);

        Self {
            registry: Arc::new(registry),
            config,
            tool_router: Self::tool_router(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

#[tool_router]
impl DwMcpServer {
    #[tool(description = "List all available configured data warehouse platform instances")]
    async fn list_platforms(&self) -> Result<CallToolResult, McpError> {
        handlers::list_platforms(&self.registry)
    }

    #[tool(
        description = "Get detailed information about a specific platform (features, dialect, use cases)"
    )]
    async fn get_platform_info(
        &self,
        Parameters(params): Parameters<PlatformParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_platform_info(params)
    }

    #[tool(
        description = "Execute a SQL query on the specified platform instance. Automatically adds LIMIT for SELECT queries. Destructive operations require explicit confirmation."
    )]
    async fn execute_query(
        &self,
        Parameters(params): Parameters<ExecuteQueryParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::execute_query(&self.registry, &self.config, params).await
    }

    #[tool(description = "Validate a SQL query for safety without executing it")]
    async fn validate_query(
        &self,
        Parameters(params): Parameters<ValidateQueryParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::validate_query(&self.config, params)
    }

    #[tool(description = "Get schema information (tables and columns) for a platform instance")]
    async fn get_schema_info(
        &self,
        Parameters(params): Parameters<SchemaInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_schema_info(&self.registry, &self.config, params).await
    }

    #[tool(description = "Get example queries for a specific platform")]
    async fn get_example_queries(
        &self,
        Parameters(params): Parameters<PlatformParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_example_queries(params)
    }
}

fn prompt_arg(name: &str, description: &str, required: bool) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        title: None,
        description: Some(description.to_string()),
        required: Some(required),
    }
}

fn arg<'a>(arguments: &'a Option<serde_json::Map<String, serde_json::Value>>, name: &str) -> String {
    arguments
        .as_ref()
        .and_then(|args| args.get(name))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[tool_handler]
impl rmcp::ServerHandler for DwMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Multi-platform data warehouse MCP server. Use list_platforms to see \
                 configured instances, execute_query to run SQL (read-only by default, \
                 SELECT queries are auto-limited), validate_query to check a query \
                 without running it, and get_schema_info for table structure."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            ..Default::default()
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult {
            meta: Default::default(),
            next_cursor: None,
            prompts: vec![
                Prompt::new(
                    "explain-schema",
                    Some("Explain the schema and structure of a table"),
                    Some(vec![
                        prompt_arg("platform", "Platform instance key", true),
                        prompt_arg("table", "Table name to explain", true),
                    ]),
                ),
                Prompt::new(
                    "data-lineage",
                    Some("Explain data lineage and dependencies"),
                    Some(vec![prompt_arg("table", "Table name to trace lineage", true)]),
                ),
                Prompt::new(
                    "query-optimization",
                    Some("Get suggestions for optimizing a query"),
                    Some(vec![
                        prompt_arg("platform", "Platform instance key", true),
                        prompt_arg("query", "SQL query to optimize", true),
                    ]),
                ),
            ],
        })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        match request.name.as_str() {
            "explain-schema" => {
                let platform = arg(&request.arguments, "platform");
                let table = arg(&request.arguments, "table");
                Ok(GetPromptResult {
                    description: Some(format!("Explaining schema for {table} on {platform}")),
                    messages: vec![PromptMessage::new_text(
                        PromptMessageRole::User,
                        format!(
                            "Please explain the schema and structure of table '{table}' on \
                             platform '{platform}'. Include column names, data types, and any \
                             constraints or indexes."
                        ),
                    )],
                })
            }
            "data-lineage" => {
                let table = arg(&request.arguments, "table");
                Ok(GetPromptResult {
                    description: Some(format!("Explaining data lineage for {table}")),
                    messages: vec![PromptMessage::new_text(
                        PromptMessageRole::User,
                        format!(
                            "Please explain the data lineage for table '{table}'. Show upstream \
                             sources and downstream dependencies."
                        ),
                    )],
                })
            }
            "query-optimization" => {
                let platform = arg(&request.arguments, "platform");
                let query = arg(&request.arguments, "query");
                Ok(GetPromptResult {
                    description: Some(format!("Optimizing query for {platform}")),
                    messages: vec![PromptMessage::new_text(
                        PromptMessageRole::User,
                        format!(
                            "Please analyze this query for platform '{platform}' and suggest \
                             optimizations:\n\n{query}"
                        ),
                    )],
                })
            }
            other => Err(McpError::invalid_params(
                format!("Unknown prompt: {other}"),
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, BackendError, TableData};
    use crate::config::ParseMode;
    use crate::descriptor::ConnectionDescriptor;
    use async_trait::async_trait;
    use std::time::Duration;

    struct NullBackend;

    #[async_trait]
    impl Backend for NullBackend {
        async fn query(&self, _: &str, _: Duration) -> Result<TableData, BackendError> {
            Ok(TableData::default())
        }
        async fn execute(&self, _: &str, _: Duration) -> Result<Option<u64>, BackendError> {
            Ok(None)
        }
    }

    struct NullConnector;

    impl Connector for NullConnector {
        fn open(&self, _: &ConnectionDescriptor) -> anyhow::Result<Arc<dyn Backend>> {
            Ok(Arc::new(NullBackend))
        }
    }

    #[test]
    fn test_build_from_explicit_env() {
        let env: EnvMap = [("MYSQL_CONNECTION", "mysql://u:p@h/db")]
            .into_iter()
            .collect();
        let server = DwMcpServer::build(&env, ServerConfig::default(), &NullConnector);
        assert_eq!(server.registry().available(), vec!["mysql"]);
    }

    #[test]
    fn test_strict_mode_flows_through() {
        let env: EnvMap = [
            ("DW_MCP_STRICT_PLATFORMS", "1"),
            ("ORACLE_CN_ERP_TYPE", "ORACLE"),
            ("ORACLE_CN_ERP_HOST", "h"),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::from_env(&env);
        assert_eq!(config.parse_mode, ParseMode::Strict);
        let server = DwMcpServer::build(&env, config, &NullConnector);
        assert!(server.registry().is_empty());
    }
}
