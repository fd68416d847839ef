//! Connection registry
//!
//! Built once at startup from the union of legacy single-var entries and
//! parsed multi-instance entries, then read-only. Legacy and derived keys
//! share one flat namespace; legacy entries load first, so a colliding
//! derived key deterministically wins. A failure opening one instance is
//! logged and never aborts the rest.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::{Backend, MaxComputeBackend, MySqlBackend, PostgresBackend};
use crate::config::{self, ParseMode};
use crate::descriptor::{self, ConnectionDescriptor};
use crate::env::EnvMap;
use crate::platform::PlatformKind;

/// Opens a backend for a descriptor; injectable so the registry can be
/// exercised without live databases.
pub trait Connector: Send + Sync {
    fn open(&self, descriptor: &ConnectionDescriptor) -> anyhow::Result<Arc<dyn Backend>>;
}

/// Production connector over lazy sqlx pools. Opening performs no network
/// I/O; an error here means the descriptor itself is malformed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxConnector;

impl Connector for SqlxConnector {
    fn open(&self, descriptor: &ConnectionDescriptor) -> anyhow::Result<Arc<dyn Backend>> {
        let backend: Arc<dyn Backend> = match descriptor.kind {
            PlatformKind::Hologres | PlatformKind::Redshift => {
                Arc::new(PostgresBackend::open(&descriptor.url)?)
            }
            PlatformKind::MySql | PlatformKind::PolarDb => {
                Arc::new(MySqlBackend::open(&descriptor.url)?)
            }
            PlatformKind::MaxCompute | PlatformKind::DataWorks => {
                Arc::new(MaxComputeBackend::open(&descriptor.url))
            }
        };
        Ok(backend)
    }
}

/// One registered backend instance
pub struct Instance {
    pub key: String,
    pub kind: PlatformKind,
    pub descriptor: ConnectionDescriptor,
    pub backend: Arc<dyn Backend>,
}

/// Registry of opened instances, keyed by instance key
///
/// Effectively immutable after construction; concurrent resolve/list needs
/// no locking beyond what the backends themselves provide.
pub struct ConnectionRegistry {
    instances: BTreeMap<String, Instance>,
}

impl ConnectionRegistry {
    /// Build the registry from an environment snapshot
    pub fn build(env: &EnvMap, mode: ParseMode, connector: &dyn Connector) -> Self {
        let mut registry = Self {
            instances: BTreeMap::new(),
        };

        for (key, kind, raw) in config::legacy_connections(env) {
            let descriptor = ConnectionDescriptor::new(kind, raw);
            registry.register(key, descriptor, connector);
        }

        for (key, instance_config) in config::parse_instances(env, mode) {
            match descriptor::build(&instance_config) {
                Some(descriptor) => registry.register(key, descriptor, connector),
                None => tracing::debug!(
                    instance = key.as_str(),
                    "skipping instance with incomplete or unknown-platform config"
                ),
            }
        }

        registry
    }

    fn register(&mut self, key: String, descriptor: ConnectionDescriptor, connector: &dyn Connector) {
        match connector.open(&descriptor) {
            Ok(backend) => {
                tracing::info!(
                    instance = key.as_str(),
                    platform = %descriptor.kind,
                    descriptor = descriptor.redacted().as_str(),
                    "registered instance"
                );
                self.instances.insert(
                    key.clone(),
                    Instance {
                        key,
                        kind: descriptor.kind,
                        descriptor,
                        backend,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(
                    instance = key.as_str(),
                    platform = %descriptor.kind,
                    "failed to open backend, instance omitted: {e}"
                );
            }
        }
    }

    pub fn resolve(&self, key: &str) -> Option<&Instance> {
        self.instances.get(key)
    }

    /// Successfully-registered keys, in stable (sorted) order
    pub fn available(&self) -> Vec<&str> {
        self.instances.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, TableData};
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

    /// Connector that refuses a chosen platform, for failure-path tests
    struct FailingConnector(PlatformKind);

    impl Connector for FailingConnector {
        fn open(&self, descriptor: &ConnectionDescriptor) -> anyhow::Result<Arc<dyn Backend>> {
            if descriptor.kind == self.0 {
                anyhow::bail!("connection refused");
            }
            Ok(Arc::new(NullBackend))
        }
    }

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_mixed_legacy_and_multi_instance() {
        let env = env(&[
            ("MYSQL_CONNECTION", "mysql://u:p@h/db"),
            ("MAXCOMPUTE_HK_BDW_TYPE", "MAXCOMPUTE"),
            ("MAXCOMPUTE_HK_BDW_PROJECT", "bdw"),
            ("MAXCOMPUTE_HK_BDW_ACCESSID", "id"),
            ("MAXCOMPUTE_HK_BDW_ACCESSKEY", "key"),
            ("MAXCOMPUTE_HK_BDW_ENDPOINT", "http://e/api"),
        ]);

        let registry = ConnectionRegistry::build(&env, ParseMode::Permissive, &NullConnector);
        assert_eq!(registry.available(), vec!["maxcompute_hk_bdw", "mysql"]);
    }

    #[test]
    fn test_incomplete_instance_skipped_without_aborting_others() {
        let env = env(&[
            // Valid
            ("MYSQL_CN_APP_TYPE", "MYSQL"),
            ("MYSQL_CN_APP_HOST", "h"),
            ("MYSQL_CN_APP_USER", "u"),
            ("MYSQL_CN_APP_PASSWORD", "p"),
            ("MYSQL_CN_APP_DB", "d"),
            // Missing ACCESSKEY
            ("MAXCOMPUTE_HK_BDW_TYPE", "MAXCOMPUTE"),
            ("MAXCOMPUTE_HK_BDW_PROJECT", "bdw"),
            ("MAXCOMPUTE_HK_BDW_ACCESSID", "id"),
            ("MAXCOMPUTE_HK_BDW_ENDPOINT", "http://e/api"),
        ]);

        let registry = ConnectionRegistry::build(&env, ParseMode::Permissive, &NullConnector);
        assert_eq!(registry.available(), vec!["mysql_cn_app"]);
    }

    #[test]
    fn test_open_failure_omits_instance_only() {
        let env = env(&[
            ("MYSQL_CONNECTION", "mysql://u:p@h/db"),
            ("HOLOGRES_CONNECTION", "postgresql://u:p@h:80/db"),
        ]);

        let registry = ConnectionRegistry::build(
            &env,
            ParseMode::Permissive,
            &FailingConnector(PlatformKind::Hologres),
        );
        assert_eq!(registry.available(), vec!["mysql"]);
    }

    #[test]
    fn test_legacy_and_derived_key_collision_is_deterministic() {
        // A derived instance key can collide with a legacy platform key;
        // the multi-instance entry loads second and wins. No crash either way.
        let env = env(&[
            ("MYSQL_CONNECTION", "mysql://legacy:p@h/db"),
            ("MYSQL_CN_APP_TYPE", "MYSQL"),
            ("MYSQL_CN_APP_HOST", "h2"),
            ("MYSQL_CN_APP_USER", "derived"),
            ("MYSQL_CN_APP_PASSWORD", "p"),
            ("MYSQL_CN_APP_DB", "d"),
        ]);

        let registry = ConnectionRegistry::build(&env, ParseMode::Permissive, &NullConnector);
        assert_eq!(registry.available(), vec!["mysql", "mysql_cn_app"]);

        let derived = registry.resolve("mysql_cn_app").unwrap();
        assert!(derived.descriptor.url.contains("derived"));
    }

    #[test]
    fn test_multiple_instances_same_platform() {
        let env = env(&[
            ("MAXCOMPUTE_HK_BDW_TYPE", "MAXCOMPUTE"),
            ("MAXCOMPUTE_HK_BDW_PROJECT", "bdw"),
            ("MAXCOMPUTE_HK_BDW_ACCESSID", "id1"),
            ("MAXCOMPUTE_HK_BDW_ACCESSKEY", "key1"),
            ("MAXCOMPUTE_HK_BDW_ENDPOINT", "http://e1/api"),
            ("MAXCOMPUTE_EU_AVBU_TYPE", "MAXCOMPUTE"),
            ("MAXCOMPUTE_EU_AVBU_PROJECT", "avbu"),
            ("MAXCOMPUTE_EU_AVBU_ACCESSID", "id2"),
            ("MAXCOMPUTE_EU_AVBU_ACCESSKEY", "key2"),
            ("MAXCOMPUTE_EU_AVBU_ENDPOINT", "http://e2/api"),
        ]);

        let registry = ConnectionRegistry::build(&env, ParseMode::Permissive, &NullConnector);
        assert_eq!(
            registry.available(),
            vec!["maxcompute_eu_avbu", "maxcompute_hk_bdw"]
        );
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ConnectionRegistry::build(&EnvMap::new(), ParseMode::Permissive, &NullConnector);
        assert!(registry.is_empty());
        assert!(registry.resolve("mysql").is_none());
    }
}
