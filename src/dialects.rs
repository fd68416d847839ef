//! Platform dialect metadata and result rendering
//!
//! Static lookup tables; no decision logic lives here.

use serde::Serialize;
use serde_json::json;

use crate::executor::QueryOutcome;
use crate::platform::PlatformKind;

/// Descriptive metadata for one platform kind
#[derive(Debug, Clone, Serialize)]
pub struct PlatformInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub category: &'static str,
    pub description: &'static str,
    pub dialect: &'static str,
    pub use_cases: &'static [&'static str],
    pub features: &'static [&'static str],
    pub common_functions: &'static [&'static str],
}

const UNKNOWN: PlatformInfo = PlatformInfo {
    name: "Unknown",
    category: "Unknown",
    description: "Unknown platform",
    dialect: "SQL",
    use_cases: &[],
    features: &[],
    common_functions: &[],
};

pub fn platform_info(kind: PlatformKind) -> PlatformInfo {
    match kind {
        PlatformKind::MaxCompute | PlatformKind::DataWorks => PlatformInfo {
            name: "MaxCompute",
            category: "Offline Data Warehouse",
            description: "Alibaba Cloud MaxCompute for offline DW tables and batch processing",
            dialect: "MaxCompute SQL (similar to Hive)",
            use_cases: &["Offline analytics", "Batch processing", "Data warehouse"],
            features: &[
                "Partitioned tables",
                "Distributed processing",
                "UDF support",
                "Cost-based optimization",
            ],
            common_functions: &[
                "GET_JSON_OBJECT() - Parse JSON",
                "CONCAT_WS() - Concatenate with separator",
                "TO_DATE() - Date conversion",
                "DATEDIFF() - Date difference",
            ],
        },
        PlatformKind::Hologres => PlatformInfo {
            name: "Hologres",
            category: "Real-time Analytics",
            description: "Alibaba Cloud Hologres for real-time analytics and OLAP",
            dialect: "PostgreSQL-compatible",
            use_cases: &["Real-time analytics", "OLAP", "Interactive queries"],
            features: &[
                "PostgreSQL compatible",
                "Real-time data serving",
                "High-performance queries",
                "Row and column storage",
            ],
            common_functions: &[
                "Standard PostgreSQL functions",
                "Window functions",
                "JSON functions",
                "Array functions",
            ],
        },
        PlatformKind::MySql => PlatformInfo {
            name: "MySQL",
            category: "Source System",
            description: "MySQL database for source systems and transactional data",
            dialect: "MySQL",
            use_cases: &["OLTP", "Application databases", "Source data"],
            features: &[
                "ACID transactions",
                "Stored procedures",
                "Triggers",
                "Full-text search",
            ],
            common_functions: &[
                "NOW() - Current timestamp",
                "CONCAT() - String concatenation",
                "DATE_FORMAT() - Format dates",
                "IFNULL() - Null handling",
            ],
        },
        PlatformKind::PolarDb => PlatformInfo {
            name: "PolarDB",
            category: "Source System",
            description: "Alibaba Cloud PolarDB for MySQL-compatible source systems",
            dialect: "MySQL-compatible",
            use_cases: &["OLTP", "High-performance databases", "Source data"],
            features: &[
                "MySQL compatible",
                "High performance",
                "Distributed storage",
                "Read replicas",
            ],
            common_functions: &[
                "MySQL-compatible functions",
                "JSON functions",
                "Full-text search",
                "GIS functions",
            ],
        },
        PlatformKind::Redshift => PlatformInfo {
            name: "Redshift",
            category: "Regional Data Warehouse",
            description: "AWS Redshift for EU data and regional analytics",
            dialect: "PostgreSQL-based",
            use_cases: &["Data warehouse", "Regional analytics", "EU data"],
            features: &[
                "Columnar storage",
                "Massively parallel processing",
                "Distribution keys",
                "Sort keys",
            ],
            common_functions: &[
                "LISTAGG() - String aggregation",
                "MEDIAN() - Median calculation",
                "PERCENTILE_CONT() - Percentiles",
                "JSON_EXTRACT_PATH_TEXT() - JSON parsing",
            ],
        },
    }
}

/// Resolve a user-supplied platform argument to metadata
///
/// Accepts a kind name or an instance key, falling back to the key's
/// leading segment (so `maxcompute_hk_bdw` resolves to MaxCompute info).
pub fn lookup_info(platform: &str) -> serde_json::Value {
    let kind = platform
        .parse::<PlatformKind>()
        .or_else(|_| match platform.split('_').next() {
            Some(head) => head.parse(),
            None => Err(()),
        });

    match kind {
        Ok(kind) => json!(platform_info(kind)),
        Err(()) => {
            let mut info = json!(UNKNOWN);
            info["name"] = json!(platform);
            info
        }
    }
}

/// One example query with a short description
#[derive(Debug, Clone, Serialize)]
pub struct ExampleQuery {
    pub description: &'static str,
    pub query: &'static str,
}

pub fn example_queries(kind: PlatformKind) -> Vec<ExampleQuery> {
    let pairs: &[(&str, &str)] = match kind {
        PlatformKind::MaxCompute | PlatformKind::DataWorks => &[
            ("List all tables in a project", "SHOW TABLES;"),
            ("Describe table structure", "DESC table_name;"),
            (
                "Query with partition",
                "SELECT * FROM table_name WHERE ds='20240101' LIMIT 10;",
            ),
            (
                "Count rows in table",
                "SELECT COUNT(*) as row_count FROM table_name;",
            ),
        ],
        PlatformKind::Hologres => &[
            (
                "List all tables in schema",
                "SELECT tablename FROM pg_tables WHERE schemaname='public';",
            ),
            (
                "Describe table columns",
                "SELECT column_name, data_type FROM information_schema.columns WHERE table_name='table_name';",
            ),
            ("Sample data from table", "SELECT * FROM table_name LIMIT 10;"),
            (
                "Aggregate query",
                "SELECT category, COUNT(*) as cnt FROM table_name GROUP BY category LIMIT 100;",
            ),
        ],
        PlatformKind::MySql => &[
            ("Show all tables", "SHOW TABLES;"),
            ("Describe table structure", "DESCRIBE table_name;"),
            (
                "Sample recent data",
                "SELECT * FROM table_name ORDER BY created_at DESC LIMIT 10;",
            ),
            (
                "Count by category",
                "SELECT category, COUNT(*) as count FROM table_name GROUP BY category;",
            ),
        ],
        PlatformKind::PolarDb => &[
            ("Show databases", "SHOW DATABASES;"),
            ("Show tables", "SHOW TABLES;"),
            ("Table structure", "SHOW CREATE TABLE table_name;"),
            (
                "Recent records",
                "SELECT * FROM table_name ORDER BY id DESC LIMIT 10;",
            ),
        ],
        PlatformKind::Redshift => &[
            (
                "List tables in schema",
                "SELECT tablename FROM pg_tables WHERE schemaname='public';",
            ),
            (
                "Table column details",
                "SELECT * FROM information_schema.columns WHERE table_name='table_name' LIMIT 100;",
            ),
            (
                "Distribution and sort keys",
                "SELECT * FROM pg_table_def WHERE tablename='table_name';",
            ),
            ("Sample data", "SELECT * FROM table_name LIMIT 10;"),
        ],
    };

    pairs
        .iter()
        .map(|&(description, query)| ExampleQuery { description, query })
        .collect()
}

/// Introspection SQL for `get_schema_info`, or `None` where the dialect has
/// no information_schema passthrough
pub fn introspection_query(kind: PlatformKind, schema: Option<&str>) -> Option<String> {
    let escape = |s: &str| s.replace('\'', "''");
    match kind {
        PlatformKind::Hologres | PlatformKind::Redshift => Some(match schema {
            Some(schema) => format!(
                "SELECT table_schema, table_name, column_name, data_type, is_nullable \
                 FROM information_schema.columns WHERE table_schema = '{}' \
                 ORDER BY table_schema, table_name, ordinal_position",
                escape(schema)
            ),
            None => "SELECT table_schema, table_name, column_name, data_type, is_nullable \
                     FROM information_schema.columns \
                     WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
                     ORDER BY table_schema, table_name, ordinal_position"
                .to_string(),
        }),
        PlatformKind::MySql | PlatformKind::PolarDb => Some(match schema {
            Some(schema) => format!(
                "SELECT table_schema, table_name, column_name, data_type, is_nullable \
                 FROM information_schema.columns WHERE table_schema = '{}' \
                 ORDER BY table_schema, table_name, ordinal_position",
                escape(schema)
            ),
            None => "SELECT table_schema, table_name, column_name, data_type, is_nullable \
                     FROM information_schema.columns \
                     WHERE table_schema NOT IN ('mysql', 'sys', 'performance_schema', 'information_schema') \
                     ORDER BY table_schema, table_name, ordinal_position"
                .to_string(),
        }),
        PlatformKind::MaxCompute | PlatformKind::DataWorks => None,
    }
}

/// Render a tabular outcome as aligned plain text
pub fn format_outcome(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Failure { error, .. } => format!("Error: {error}"),
        QueryOutcome::Acknowledged { message, .. } => message.clone(),
        QueryOutcome::Rows { columns, rows, .. } => {
            if columns.is_empty() || rows.is_empty() {
                return "No data returned".to_string();
            }

            let render = |value: &serde_json::Value| match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };

            let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
            for row in rows {
                for (i, col) in columns.iter().enumerate() {
                    let len = row.get(col).map(|v| render(v).len()).unwrap_or(0);
                    widths[i] = widths[i].max(len);
                }
            }

            let header = columns
                .iter()
                .zip(widths.iter().copied())
                .map(|(c, w)| format!("{c:<w$}"))
                .collect::<Vec<_>>()
                .join(" | ");
            let separator = widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-");

            let mut lines = vec![header, separator];
            for row in rows {
                let line = columns
                    .iter()
                    .zip(widths.iter().copied())
                    .map(|(c, w)| {
                        let cell = row.get(c).map(&render).unwrap_or_default();
                        format!("{cell:<w$}")
                    })
                    .collect::<Vec<_>>()
                    .join(" | ");
                lines.push(line);
            }

            format!("{}\n\n({} rows)", lines.join("\n"), rows.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_kind_name() {
        let info = lookup_info("redshift");
        assert_eq!(info["name"], "Redshift");
    }

    #[test]
    fn test_lookup_by_instance_key() {
        let info = lookup_info("maxcompute_hk_bdw");
        assert_eq!(info["name"], "MaxCompute");
        let info = lookup_info("holo_hk_chatbi");
        assert_eq!(info["name"], "Hologres");
    }

    #[test]
    fn test_lookup_unknown_falls_back() {
        let info = lookup_info("oracle");
        assert_eq!(info["name"], "oracle");
        assert_eq!(info["type"], "Unknown");
    }

    #[test]
    fn test_dataworks_shares_maxcompute_metadata() {
        assert_eq!(platform_info(PlatformKind::DataWorks).name, "MaxCompute");
    }

    #[test]
    fn test_every_kind_has_examples() {
        for kind in PlatformKind::ALL {
            assert!(!example_queries(kind).is_empty());
        }
    }

    #[test]
    fn test_introspection_escapes_schema() {
        let sql = introspection_query(PlatformKind::Hologres, Some("pub'lic")).unwrap();
        assert!(sql.contains("pub''lic"));
        assert!(introspection_query(PlatformKind::MaxCompute, None).is_none());
    }

    #[test]
    fn test_format_table() {
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), serde_json::json!(1));
        row.insert("name".to_string(), serde_json::json!("alpha"));
        let outcome = QueryOutcome::Rows {
            success: true,
            platform: "mysql".to_string(),
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![row],
            row_count: 1,
            query: "SELECT * FROM t".to_string(),
        };

        let text = format_outcome(&outcome);
        assert!(text.starts_with("id | name"));
        assert!(text.contains("1  | alpha"));
        assert!(text.ends_with("(1 rows)"));
    }

    #[test]
    fn test_format_failure() {
        let outcome = QueryOutcome::failure("mysql", "boom", "SELECT 1");
        assert_eq!(format_outcome(&outcome), "Error: boom");
    }
}
