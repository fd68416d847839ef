//! Startup diagnostics
//!
//! Logs a grouped summary of the registry after construction. Everything
//! goes through tracing: stdout belongs to the MCP protocol.

use std::collections::BTreeMap;

use crate::registry::ConnectionRegistry;

/// Log the configured instances grouped by platform type, or a
/// configuration hint when nothing registered
pub fn log_registry_summary(registry: &ConnectionRegistry) {
    if registry.is_empty() {
        tracing::warn!(
            "No platforms configured. Set {{PLATFORM}}_CONNECTION variables or \
             {{TYPE}}_{{REGION}}_{{PROJECT}}_{{PARAM}} multi-instance blocks \
             (MAXCOMPUTE/DATAWORKS, HOLOGRES, MYSQL, POLARDB, REDSHIFT)."
        );
        return;
    }

    let mut by_type: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for instance in registry.iter() {
        by_type
            .entry(instance.kind.as_str())
            .or_default()
            .push(&instance.key);
    }

    tracing::info!("Configured platform instances: {}", registry.len());
    for (platform_type, keys) in by_type {
        tracing::info!("  {}: {}", platform_type, keys.join(", "));
    }
}
