//! Tool handlers
//!
//! Thin glue between the rmcp surface and the core pipeline. Query and
//! configuration failures are returned as outcome payloads, never raised as
//! protocol errors; nothing here may terminate the host process.

use std::time::Duration;

use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData as McpError;
use serde::Serialize;
use serde_json::json;

use crate::config::ServerConfig;
use crate::dialects;
use crate::executor::{self, QueryOutcome};
use crate::params::*;
use crate::registry::ConnectionRegistry;
use crate::safety::SafetyChecker;

fn json_reply<T: Serialize>(data: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

pub fn list_platforms(registry: &ConnectionRegistry) -> Result<CallToolResult, McpError> {
    if registry.is_empty() {
        return json_reply(&json!({
            "available_platforms": [],
            "message": "No platforms configured. Set environment variables for connections.",
            "env_vars": [
                "MAXCOMPUTE_CONNECTION",
                "HOLOGRES_CONNECTION",
                "MYSQL_CONNECTION",
                "POLARDB_CONNECTION",
                "REDSHIFT_CONNECTION",
                "{TYPE}_{REGION}_{PROJECT}_{PARAM} multi-instance blocks",
            ],
        }));
    }

    let details: Vec<_> = registry
        .iter()
        .map(|instance| {
            let info = dialects::platform_info(instance.kind);
            json!({
                "platform": instance.key,
                "name": info.name,
                "type": info.category,
                "description": info.description,
            })
        })
        .collect();

    json_reply(&json!({
        "available_platforms": registry.available(),
        "details": details,
    }))
}

pub fn get_platform_info(params: PlatformParams) -> Result<CallToolResult, McpError> {
    json_reply(&dialects::lookup_info(&params.platform))
}

pub async fn execute_query(
    registry: &ConnectionRegistry,
    config: &ServerConfig,
    params: ExecuteQueryParams,
) -> Result<CallToolResult, McpError> {
    let limit = params.limit.unwrap_or(config.default_limit);
    let verdict = SafetyChecker.validate(&params.query, params.allow_destructive, true, limit);

    if !verdict.accepted {
        return json_reply(&json!({
            "success": false,
            "error": verdict.message,
            "query": params.query,
        }));
    }

    let outcome = executor::run(
        registry,
        &params.platform,
        &verdict.query,
        None, // the validator already injected the row cap
        Duration::from_secs(config.timeout_secs),
    )
    .await;

    let formatted = dialects::format_outcome(&outcome);
    let raw = serde_json::to_string_pretty(&outcome)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;

    Ok(CallToolResult::success(vec![
        Content::text(formatted),
        Content::text(format!("\n\nRaw JSON:\n{raw}")),
    ]))
}

pub fn validate_query(
    config: &ServerConfig,
    params: ValidateQueryParams,
) -> Result<CallToolResult, McpError> {
    let checker = SafetyChecker;
    let verdict = checker.validate(
        &params.query,
        params.allow_destructive,
        true,
        config.default_limit,
    );

    json_reply(&json!({
        "valid": verdict.accepted,
        "message": verdict.message,
        "original_query": params.query,
        "processed_query": if verdict.accepted { Some(&verdict.query) } else { None },
        "is_select": checker.is_read_shape(&params.query),
        "is_destructive": checker.is_destructive(&params.query),
    }))
}

pub async fn get_schema_info(
    registry: &ConnectionRegistry,
    config: &ServerConfig,
    params: SchemaInfoParams,
) -> Result<CallToolResult, McpError> {
    let Some(instance) = registry.resolve(&params.platform) else {
        return json_reply(&json!({
            "success": false,
            "error": format!(
                "Platform '{}' not configured. Available: [{}]",
                params.platform,
                registry.available().join(", ")
            ),
        }));
    };

    let Some(sql) = dialects::introspection_query(instance.kind, params.schema.as_deref()) else {
        return json_reply(&json!({
            "success": false,
            "platform": params.platform,
            "error": format!(
                "Schema introspection is not supported for {} instances",
                instance.kind
            ),
        }));
    };

    let outcome = executor::run(
        registry,
        &params.platform,
        &sql,
        None,
        Duration::from_secs(config.timeout_secs),
    )
    .await;

    match outcome {
        QueryOutcome::Rows { columns, rows, .. } => json_reply(&json!({
            "success": true,
            "platform": params.platform,
            "schema": params.schema,
            "columns": columns,
            "tables": rows,
        })),
        other => json_reply(&other),
    }
}

pub fn get_example_queries(params: PlatformParams) -> Result<CallToolResult, McpError> {
    let kind = params
        .platform
        .parse()
        .or_else(|_| match params.platform.split('_').next() {
            Some(head) => head.parse(),
            None => Err(()),
        });

    let examples = match kind {
        Ok(kind) => dialects::example_queries(kind),
        Err(()) => Vec::new(),
    };

    json_reply(&json!({
        "platform": params.platform,
        "examples": examples,
    }))
}
