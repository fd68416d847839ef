//! MySQL-wire backend, shared by MySQL and PolarDB

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row, TypeInfo};

use super::{bounded, Backend, BackendError, TableData};

pub struct MySqlBackend {
    pool: MySqlPool,
}

impl MySqlBackend {
    /// Open a lazy pool; no connection is attempted until the first query
    pub fn open(url: &str) -> Result<Self, BackendError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect_lazy(url)?;
        Ok(Self { pool })
    }

    fn convert_row(row: &MySqlRow) -> serde_json::Map<String, Value> {
        let mut out = serde_json::Map::new();
        for column in row.columns() {
            let name = column.name();
            let value = match column.type_info().name() {
                "BOOLEAN" | "TINYINT(1)" => row
                    .try_get::<Option<bool>, _>(name)
                    .ok()
                    .flatten()
                    .map(Value::Bool),
                "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
                    .try_get::<Option<i64>, _>(name)
                    .ok()
                    .flatten()
                    .map(|v| json!(v)),
                "FLOAT" | "DOUBLE" | "DECIMAL" => row
                    .try_get::<Option<f64>, _>(name)
                    .ok()
                    .flatten()
                    .map(|v| json!(v)),
                "JSON" => row.try_get::<Option<Value>, _>(name).ok().flatten(),
                _ => row
                    .try_get::<Option<String>, _>(name)
                    .ok()
                    .flatten()
                    .map(Value::String),
            };
            out.insert(name.to_string(), value.unwrap_or(Value::Null));
        }
        out
    }
}

#[async_trait]
impl Backend for MySqlBackend {
    async fn query(&self, sql: &str, timeout: Duration) -> Result<TableData, BackendError> {
        let rows = bounded(timeout, sqlx::query(sql).fetch_all(&self.pool)).await?;

        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let rows = rows.iter().map(Self::convert_row).collect();

        Ok(TableData { columns, rows })
    }

    async fn execute(&self, sql: &str, timeout: Duration) -> Result<Option<u64>, BackendError> {
        let result = bounded(timeout, sqlx::query(sql).execute(&self.pool)).await?;
        Ok(Some(result.rows_affected()))
    }
}
