//! PgProcedureSink - invokes a stored procedure per record
//!
//! `destination` is the procedure name; each send executes
//! `SELECT * FROM <procedure>($1,$2,$3,$4,$5)` with
//! `(instrument, name, value, 0, unix-timestamp)` and commits.

use std::time::Duration;

use contracts::{BroadcastError, BroadcastSink, EmittedRecord, SignalValue};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

/// Configuration for PgProcedureSink
#[derive(Debug, Clone)]
pub struct PgSinkConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Connection attempts before giving up
    pub connect_attempts: u32,
    /// Delay between attempts
    pub connect_interval: Duration,
}

/// Sink that updates process variables through stored procedures
#[derive(Debug)]
pub struct PgProcedureSink {
    name: String,
    pool: PgPool,
}

impl PgProcedureSink {
    /// Connect to the database, retrying up to the configured attempt count
    #[instrument(
        name = "pg_sink_connect",
        skip(name, config),
        fields(host = %config.host, port = config.port, database = %config.database)
    )]
    pub async fn connect(
        name: impl Into<String>,
        config: &PgSinkConfig,
    ) -> Result<Self, BroadcastError> {
        let name = name.into();
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);
        let attempts = config.connect_attempts.max(1);

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match PgPoolOptions::new()
                .max_connections(1)
                .connect_with(options.clone())
                .await
            {
                Ok(pool) => {
                    debug!(sink = %name, "PgProcedureSink connected");
                    return Ok(Self { name, pool });
                }
                Err(e) => {
                    warn!(
                        sink = %name,
                        attempt,
                        attempts,
                        error = %e,
                        "Database connection attempt failed"
                    );
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(config.connect_interval).await;
                    }
                }
            }
        }

        Err(BroadcastError::sink_connection(
            name,
            format!("failed to connect to database after {attempts} attempts: {last_error}"),
        ))
    }
}

impl BroadcastSink for PgProcedureSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "pg_sink_send",
        skip(self, record),
        fields(sink = %self.name, procedure = %record.destination)
    )]
    async fn send(&mut self, record: &EmittedRecord) -> Result<(), BroadcastError> {
        let call = ProcedureCall::build(record, chrono::Utc::now().timestamp())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BroadcastError::sink_send(&self.name, e.to_string()))?;

        let mut query = sqlx::query(&call.sql)
            .bind(call.instrument.as_str())
            .bind(call.name.as_str());
        query = match &call.value {
            BoundValue::Number(n) => query.bind(*n),
            BoundValue::Text(s) => query.bind(s.as_str()),
        };
        query = query.bind(call.status).bind(call.timestamp);

        query
            .execute(&mut *tx)
            .await
            .map_err(|e| BroadcastError::sink_send(&self.name, e.to_string()))?;

        // One commit per invocation
        tx.commit()
            .await
            .map_err(|e| BroadcastError::sink_send(&self.name, e.to_string()))?;

        debug!(
            sink = %self.name,
            procedure = %record.destination,
            instrument = %call.instrument,
            name = %call.name,
            "Procedure invoked"
        );
        Ok(())
    }

    #[instrument(name = "pg_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), BroadcastError> {
        self.pool.close().await;
        debug!(sink = %self.name, "PgProcedureSink closed");
        Ok(())
    }
}

/// One procedure invocation, bind arguments in positional order
#[derive(Debug, PartialEq)]
struct ProcedureCall {
    sql: String,
    instrument: String,
    name: String,
    value: BoundValue,
    status: i32,
    timestamp: i64,
}

/// SQL parameter type an emitted value binds as
#[derive(Debug, PartialEq)]
enum BoundValue {
    Number(f64),
    Text(String),
}

impl ProcedureCall {
    /// `(instrument, name, value, 0, timestamp)` for `<destination>($1..$5)`
    fn build(record: &EmittedRecord, timestamp: i64) -> Result<Self, BroadcastError> {
        let sql = procedure_sql(&record.destination)?;
        let instrument = record.instrument.clone().ok_or_else(|| {
            BroadcastError::sink_send("database", "record is missing 'instrument'")
        })?;
        let name = record
            .name
            .clone()
            .ok_or_else(|| BroadcastError::sink_send("database", "record is missing 'name'"))?;
        let value = match &record.value {
            SignalValue::Number(n) => BoundValue::Number(*n),
            SignalValue::Text(s) => BoundValue::Text(s.clone()),
            SignalValue::Json(v) => BoundValue::Text(v.to_string()),
        };

        Ok(Self {
            sql,
            instrument,
            name,
            value,
            status: 0,
            timestamp,
        })
    }
}

/// Build the call statement, rejecting destinations that are not plain
/// SQL identifiers (the procedure name cannot be bound as a parameter)
fn procedure_sql(destination: &str) -> Result<String, BroadcastError> {
    let mut chars = destination.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !head_ok || !tail_ok {
        return Err(BroadcastError::sink_send(
            "database",
            format!("destination '{destination}' is not a valid procedure name"),
        ));
    }

    Ok(format!("SELECT * FROM {destination}($1, $2, $3, $4, $5)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pv_record(value: SignalValue) -> EmittedRecord {
        EmittedRecord {
            destination: "pvUpdate".to_string(),
            instrument: Some("TEST".to_string()),
            name: Some("beam_current".to_string()),
            value,
        }
    }

    #[test]
    fn test_procedure_call_binds_positional_arguments() {
        let call = ProcedureCall::build(&pv_record(SignalValue::Number(42.5)), 1_700_000_000)
            .unwrap();
        assert_eq!(call.sql, "SELECT * FROM pvUpdate($1, $2, $3, $4, $5)");
        assert_eq!(call.instrument, "TEST");
        assert_eq!(call.name, "beam_current");
        assert_eq!(call.value, BoundValue::Number(42.5));
        assert_eq!(call.status, 0);
        assert_eq!(call.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_procedure_call_value_variants() {
        let text = ProcedureCall::build(&pv_record(SignalValue::Text("up".to_string())), 0)
            .unwrap();
        assert_eq!(text.value, BoundValue::Text("up".to_string()));

        // Opaque JSON binds as its serialized text
        let json = ProcedureCall::build(
            &pv_record(SignalValue::Json(serde_json::json!({"a": 1}))),
            0,
        )
        .unwrap();
        assert_eq!(json.value, BoundValue::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn test_procedure_call_requires_addressing_fields() {
        let mut record = pv_record(SignalValue::Number(1.0));
        record.instrument = None;
        let err = ProcedureCall::build(&record, 0).unwrap_err();
        assert!(err.to_string().contains("instrument"), "{err}");

        let mut record = pv_record(SignalValue::Number(1.0));
        record.name = None;
        let err = ProcedureCall::build(&record, 0).unwrap_err();
        assert!(err.to_string().contains("name"), "{err}");
    }

    #[test]
    fn test_procedure_sql_for_valid_identifier() {
        assert_eq!(
            procedure_sql("pvUpdate").unwrap(),
            "SELECT * FROM pvUpdate($1, $2, $3, $4, $5)"
        );
        assert!(procedure_sql("_private2").is_ok());
    }

    #[test]
    fn test_procedure_sql_rejects_injection_shapes() {
        assert!(procedure_sql("").is_err());
        assert!(procedure_sql("2start").is_err());
        assert!(procedure_sql("pv;DROP TABLE runs").is_err());
        assert!(procedure_sql("pvUpdate(1); --").is_err());
    }

    #[tokio::test]
    async fn test_connect_exhausts_attempts() {
        // Port 1 on localhost refuses immediately
        let config = PgSinkConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "workflow".to_string(),
            connect_attempts: 2,
            connect_interval: Duration::from_millis(1),
        };

        let err = PgProcedureSink::connect("pv", &config).await.unwrap_err();
        assert!(err.to_string().contains("after 2 attempts"), "{err}");
    }
}
