//! Thin PostgreSQL passthrough for project-scoped database access.
//!
//! Connects per call from the project's stored [`DatabaseConfig`]; holds no
//! state of its own. Failures are rendered as text at the tool boundary and
//! never become structural failures of the store.

use anyhow::Result;
use tokio_postgres::types::Type;
use tokio_postgres::{Client, NoTls, Row};

use crate::models::DatabaseConfig;

async fn connect(config: &DatabaseConfig) -> Result<Client> {
    let mut pg_config = tokio_postgres::Config::new();
    pg_config
        .host(&config.host)
        .port(config.port)
        .dbname(&config.database)
        .user(&config.user)
        .password(&config.password);
    let (client, connection) = pg_config.connect(NoTls).await?;

    // The connection object drives the socket; it must be polled for the
    // client to make progress.
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            tracing::error!("postgres connection error: {err}");
        }
    });

    Ok(client)
}

/// Statements that produce a row set rather than an affected-row count.
fn is_read_statement(query: &str) -> bool {
    let head = query
        .trim_start()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        head.as_str(),
        "SELECT" | "WITH" | "SHOW" | "EXPLAIN" | "VALUES" | "TABLE"
    )
}

/// Executes a raw SQL statement and renders the outcome as a text report:
/// row JSON for reads, affected-row counts for writes.
pub async fn run_query(config: &DatabaseConfig, query: &str) -> Result<String> {
    let client = connect(config).await?;
    let mut out = format!("# Query Result\n\n```sql\n{query}\n```\n\n");

    if is_read_statement(query) {
        let rows = client.query(query, &[]).await?;
        if rows.is_empty() {
            out.push_str("✓ Query executed successfully (0 rows)\n");
        } else {
            out.push_str(&format!("## Results ({} rows)\n\n```json\n", rows.len()));
            let values: Vec<serde_json::Value> = rows.iter().map(row_to_json).collect();
            out.push_str(&serde_json::to_string_pretty(&values)?);
            out.push_str("\n```\n");
        }
    } else {
        let affected = client.execute(query, &[]).await?;
        out.push_str(&format!(
            "✓ Query executed successfully\nRows affected: {affected}\n"
        ));
    }

    Ok(out)
}

/// Lists the public-schema tables of the configured database.
pub async fn list_tables(config: &DatabaseConfig) -> Result<String> {
    let client = connect(config).await?;
    let rows = client
        .query(
            "SELECT table_name::text, table_type::text
             FROM information_schema.tables
             WHERE table_schema = 'public'
             ORDER BY table_name",
            &[],
        )
        .await?;

    let mut out = format!("# Database Tables\n\nTotal: {} table(s)\n\n", rows.len());
    for row in &rows {
        let name: String = row.try_get(0)?;
        let table_type: String = row.try_get(1)?;
        out.push_str(&format!("- {name} ({table_type})\n"));
    }
    Ok(out)
}

/// Describes a table's columns as a markdown table.
pub async fn describe_table(config: &DatabaseConfig, table_name: &str) -> Result<String> {
    let client = connect(config).await?;
    let rows = client
        .query(
            "SELECT column_name::text, data_type::text,
                    character_maximum_length::int4,
                    is_nullable::text, column_default::text
             FROM information_schema.columns
             WHERE table_name = $1
             ORDER BY ordinal_position",
            &[&table_name],
        )
        .await?;

    if rows.is_empty() {
        return Ok(format!("Table \"{table_name}\" not found."));
    }

    let mut out = format!(
        "# Table Structure: {table_name}\n\n\
         | Column | Type | Length | Nullable | Default |\n\
         |--------|------|--------|----------|---------|\n"
    );
    for row in &rows {
        let column: String = row.try_get(0)?;
        let data_type: String = row.try_get(1)?;
        let length: Option<i32> = row.try_get(2)?;
        let nullable: String = row.try_get(3)?;
        let default: Option<String> = row.try_get(4)?;
        out.push_str(&format!(
            "| {column} | {data_type} | {} | {} | {} |\n",
            length.map_or_else(|| "-".to_string(), |l| l.to_string()),
            if nullable == "YES" { "Yes" } else { "No" },
            default.unwrap_or_else(|| "-".to_string())
        ));
    }
    Ok(out)
}

fn row_to_json(row: &Row) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        map.insert(
            column.name().to_string(),
            column_value(row, index, column.type_()),
        );
    }
    serde_json::Value::Object(map)
}

/// Best-effort conversion of one column to JSON. Types without a natural
/// JSON form render as a `<typename>` placeholder rather than failing the
/// whole report.
fn column_value(row: &Row, index: usize, ty: &Type) -> serde_json::Value {
    use serde_json::Value;

    fn get<'a, T: tokio_postgres::types::FromSql<'a>>(
        row: &'a Row,
        index: usize,
    ) -> Option<T> {
        row.try_get::<_, Option<T>>(index).ok().flatten()
    }

    let value = if *ty == Type::BOOL {
        get::<bool>(row, index).map(Value::Bool)
    } else if *ty == Type::INT2 {
        get::<i16>(row, index).map(Value::from)
    } else if *ty == Type::INT4 {
        get::<i32>(row, index).map(Value::from)
    } else if *ty == Type::INT8 {
        get::<i64>(row, index).map(Value::from)
    } else if *ty == Type::FLOAT4 {
        get::<f32>(row, index).map(|v| Value::from(f64::from(v)))
    } else if *ty == Type::FLOAT8 {
        get::<f64>(row, index).map(Value::from)
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
    {
        get::<String>(row, index).map(Value::String)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get::<serde_json::Value>(row, index)
    } else if *ty == Type::TIMESTAMPTZ {
        get::<chrono::DateTime<chrono::Utc>>(row, index).map(|v| Value::String(v.to_rfc3339()))
    } else if *ty == Type::TIMESTAMP {
        get::<chrono::NaiveDateTime>(row, index).map(|v| Value::String(v.to_string()))
    } else if *ty == Type::DATE {
        get::<chrono::NaiveDate>(row, index).map(|v| Value::String(v.to_string()))
    } else {
        Some(Value::String(format!("<{}>", ty.name())))
    };

    value.unwrap_or(Value::Null)
}
