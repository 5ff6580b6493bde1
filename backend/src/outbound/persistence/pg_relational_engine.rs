//! Stored-procedure execution over SQLx.
//!
//! Procedures are PostgreSQL functions taking `(ParamObj jsonb, FormObj jsonb)`
//! and returning `SETOF jsonb`. Each returned row is one record-set: an array
//! of records, a lone record, or `null` for an empty set.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use tracing::debug;

use super::pool::PgPoolConfig;
use crate::domain::ports::{RecordSets, RelationalEngine, RelationalEngineError};
use crate::domain::{DatabaseName, ProcedureCall};

/// [`RelationalEngine`] running procedures on PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgRelationalEngine {
    config: PgPoolConfig,
}

impl PgRelationalEngine {
    pub fn new(config: PgPoolConfig) -> Self {
        Self { config }
    }
}

fn quote_ident(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

/// `SELECT` statement invoking `procedure`.
///
/// `sales.GetOrders` targets schema `sales`; a bare name uses the default.
fn call_statement(default_schema: &str, procedure: &str) -> String {
    let (schema, name) = procedure
        .split_once('.')
        .filter(|(schema, name)| !schema.is_empty() && !name.is_empty())
        .unwrap_or((default_schema, procedure));
    format!(
        "SELECT result FROM {}.{}($1::jsonb, $2::jsonb) AS result",
        quote_ident(schema),
        quote_ident(name)
    )
}

fn record_set(row: Value) -> Vec<Value> {
    match row {
        Value::Array(records) => records,
        Value::Null => Vec::new(),
        record => vec![record],
    }
}

fn map_sqlx_error(error: sqlx::Error) -> RelationalEngineError {
    match error {
        sqlx::Error::Database(db) => RelationalEngineError::database(
            db.code().map(|code| code.into_owned()),
            db.message(),
        ),
        sqlx::Error::PoolTimedOut => {
            RelationalEngineError::timeout("timed out waiting for a pooled connection")
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => RelationalEngineError::connect(error.to_string()),
        other => RelationalEngineError::protocol(other.to_string()),
    }
}

#[async_trait]
impl RelationalEngine for PgRelationalEngine {
    type Pool = PgPool;

    async fn connect(&self, database: &DatabaseName) -> Result<PgPool, RelationalEngineError> {
        self.config
            .pool_options()
            .connect_with(self.config.connect_options(database.as_str()))
            .await
            .map_err(map_sqlx_error)
    }

    async fn execute(
        &self,
        pool: &PgPool,
        call: &ProcedureCall<'_>,
    ) -> Result<RecordSets, RelationalEngineError> {
        let statement = call_statement(self.config.schema(), call.procedure.as_str());
        debug!(statement = %statement, "executing procedure");

        let rows = sqlx::query(&statement)
            .bind(Value::Object(call.params().clone()))
            .bind(Value::Object(call.data().clone()))
            .fetch_all(pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                row.try_get::<Option<Value>, _>("result")
                    .map(|value| record_set(value.unwrap_or(Value::Null)))
                    .map_err(map_sqlx_error)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RecordSets)
    }

    async fn close(&self, pool: PgPool) {
        pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("GetOrders", r#"SELECT result FROM "dbo"."GetOrders"($1::jsonb, $2::jsonb) AS result"#)]
    #[case("sales.GetOrders", r#"SELECT result FROM "sales"."GetOrders"($1::jsonb, $2::jsonb) AS result"#)]
    #[case(".GetOrders", r#"SELECT result FROM "dbo".".GetOrders"($1::jsonb, $2::jsonb) AS result"#)]
    #[case("Get Orders", r#"SELECT result FROM "dbo"."Get Orders"($1::jsonb, $2::jsonb) AS result"#)]
    fn statements_quote_identifiers(#[case] procedure: &str, #[case] expected: &str) {
        assert_eq!(call_statement("dbo", procedure), expected);
    }

    #[rstest]
    fn embedded_quotes_are_doubled() {
        assert_eq!(quote_ident(r#"a"b"#), r#""a""b""#);
    }

    #[rstest]
    #[case(json!([{"id": 1}, {"id": 2}]), 2)]
    #[case(json!({"StatusCode": 200}), 1)]
    #[case(Value::Null, 0)]
    fn rows_become_record_sets(#[case] row: Value, #[case] records: usize) {
        assert_eq!(record_set(row).len(), records);
    }

    #[rstest]
    fn pool_timeouts_are_unavailability() {
        let error = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, RelationalEngineError::Timeout { .. }));
        assert!(error.is_unavailable());
    }

    #[rstest]
    fn io_failures_are_connect_errors() {
        let error = map_sqlx_error(sqlx::Error::Io(std::io::Error::other("refused")));
        assert!(matches!(error, RelationalEngineError::Connect { .. }));
    }

    #[rstest]
    fn decoding_failures_are_protocol_errors() {
        let error = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(error, RelationalEngineError::Protocol { .. }));
        assert!(!error.is_unavailable());
    }
}
