//! Postgres-wire backend, shared by Hologres and Redshift

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo};

use super::{bounded, Backend, BackendError, TableData};

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Open a lazy pool; no connection is attempted until the first query.
    /// Redshift descriptors arrive with a `redshift://` scheme and are
    /// rewritten onto the postgres wire driver here.
    pub fn open(url: &str) -> Result<Self, BackendError> {
        let url = match url.strip_prefix("redshift://") {
            Some(rest) => format!("postgresql://{rest}"),
            None => url.to_string(),
        };
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(&url)?;
        Ok(Self { pool })
    }

    fn convert_row(row: &PgRow) -> serde_json::Map<String, Value> {
        let mut out = serde_json::Map::new();
        for column in row.columns() {
            let name = column.name();
            let value = match column.type_info().name() {
                "BOOL" => row
                    .try_get::<Option<bool>, _>(name)
                    .ok()
                    .flatten()
                    .map(Value::Bool),
                "INT2" => row
                    .try_get::<Option<i16>, _>(name)
                    .ok()
                    .flatten()
                    .map(|v| json!(v)),
                "INT4" => row
                    .try_get::<Option<i32>, _>(name)
                    .ok()
                    .flatten()
                    .map(|v| json!(v)),
                "INT8" => row
                    .try_get::<Option<i64>, _>(name)
                    .ok()
                    .flatten()
                    .map(|v| json!(v)),
                "FLOAT4" => row
                    .try_get::<Option<f32>, _>(name)
                    .ok()
                    .flatten()
                    .map(|v| json!(v)),
                "FLOAT8" | "NUMERIC" => row
                    .try_get::<Option<f64>, _>(name)
                    .ok()
                    .flatten()
                    .map(|v| json!(v)),
                "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(name).ok().flatten(),
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
impl Backend for PostgresBackend {
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
