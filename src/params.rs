//! Parameter types for DW MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PlatformParams {
    #[schemars(description = "Platform instance key (see list_platforms) or platform kind name")]
    pub platform: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteQueryParams {
    #[schemars(description = "Platform instance key (see list_platforms)")]
    pub platform: String,

    #[schemars(description = "SQL query to execute")]
    pub query: String,

    #[schemars(description = "Maximum number of rows to return (default: 100)")]
    #[serde(default)]
    pub limit: Option<u32>,

    #[schemars(
        description = "Explicitly allow destructive operations (DELETE, UPDATE, DROP, ...)"
    )]
    #[serde(default)]
    pub allow_destructive: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ValidateQueryParams {
    #[schemars(description = "SQL query to validate without executing")]
    pub query: String,

    #[schemars(description = "Allow destructive operations")]
    #[serde(default)]
    pub allow_destructive: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SchemaInfoParams {
    #[schemars(description = "Platform instance key (see list_platforms)")]
    pub platform: String,

    #[schemars(description = "Optional specific schema name")]
    #[serde(default)]
    pub schema: Option<String>,
}
