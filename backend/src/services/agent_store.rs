//! Agent Store
//!
//! Persistence for the agent aggregate: an agent row plus the call logs it
//! owns. Metric updates and their log entry are written in one transaction,
//! and deleting an agent removes its logs in the same transaction.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use thiserror::Error;

use crate::models::{Agent, AgentMetrics, CallLog, NewCallLog, RegisterAgentRequest};

/// Errors raised by the agent store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Agent not found: {0}")]
    AgentNotFound(i64),
    #[error("Corrupt column '{column}' for agent {agent_id}: {source}")]
    Corrupt {
        agent_id: i64,
        column: &'static str,
        source: serde_json::Error,
    },
}

/// Storage interface for agents and their call history
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Insert a new agent with zeroed metrics
    async fn create(&self, request: &RegisterAgentRequest) -> Result<Agent, StoreError>;

    async fn get(&self, agent_id: i64) -> Result<Option<Agent>, StoreError>;

    /// All agents in insertion order
    async fn list(&self) -> Result<Vec<Agent>, StoreError>;

    /// Number of logs for the agent that carry a latency sample
    async fn count_latency_samples(&self, agent_id: i64) -> Result<i64, StoreError>;

    /// Persist the agent's metrics and append one log entry atomically
    async fn record_event(&self, agent: &Agent, entry: &NewCallLog) -> Result<CallLog, StoreError>;

    /// Most recent logs first
    async fn call_logs(&self, agent_id: i64, limit: i64) -> Result<Vec<CallLog>, StoreError>;

    /// Delete the agent and all of its logs. Returns false if it did not exist.
    async fn delete(&self, agent_id: i64) -> Result<bool, StoreError>;
}

/// Open a SQLite pool. Connections are kept for the pool's lifetime so an
/// in-memory database survives between queries.
pub async fn connect_pool(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

const AGENT_COLUMNS: &str = "id, name, skills, input_schema, output_schema, endpoint, \
    price_per_call, max_latency_ms, total_calls, successful_calls, failed_calls, \
    avg_latency, reputation_score, created_at";

/// SQLite-backed agent store
#[derive(Debug, Clone)]
pub struct SqliteAgentStore {
    pool: SqlitePool,
}

impl SqliteAgentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn json_column<T: serde::de::DeserializeOwned>(
    row: &SqliteRow,
    agent_id: i64,
    column: &'static str,
) -> Result<T, StoreError> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
        agent_id,
        column,
        source,
    })
}

fn agent_from_row(row: &SqliteRow) -> Result<Agent, StoreError> {
    let id: i64 = row.try_get("id")?;
    Ok(Agent {
        id,
        name: row.try_get("name")?,
        skills: json_column(row, id, "skills")?,
        input_schema: json_column(row, id, "input_schema")?,
        output_schema: json_column(row, id, "output_schema")?,
        endpoint: row.try_get("endpoint")?,
        price_per_call: row.try_get("price_per_call")?,
        max_latency_ms: row.try_get("max_latency_ms")?,
        metrics: AgentMetrics {
            total_calls: row.try_get("total_calls")?,
            successful_calls: row.try_get("successful_calls")?,
            failed_calls: row.try_get("failed_calls")?,
            avg_latency: row.try_get("avg_latency")?,
            reputation_score: row.try_get("reputation_score")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn call_log_from_row(row: &SqliteRow) -> Result<CallLog, StoreError> {
    Ok(CallLog {
        id: row.try_get("id")?,
        agent_id: row.try_get("agent_id")?,
        timestamp: row.try_get("timestamp")?,
        latency_ms: row.try_get("latency_ms")?,
        success: row.try_get("success")?,
        error_message: row.try_get("error_message")?,
    })
}

#[async_trait]
impl AgentStore for SqliteAgentStore {
    async fn create(&self, request: &RegisterAgentRequest) -> Result<Agent, StoreError> {
        let created_at = Utc::now();
        // Serializing a Vec<String> or a Value cannot fail.
        let skills = serde_json::to_string(&request.skills).unwrap_or_else(|_| "[]".to_string());
        let input_schema = request.input_schema.to_string();
        let output_schema = request.output_schema.to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO agents (name, skills, input_schema, output_schema, endpoint,
                                price_per_call, max_latency_ms, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.name)
        .bind(&skills)
        .bind(&input_schema)
        .bind(&output_schema)
        .bind(&request.endpoint)
        .bind(request.price_per_call)
        .bind(request.max_latency_ms)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Agent {
            id: result.last_insert_rowid(),
            name: request.name.clone(),
            skills: request.skills.clone(),
            input_schema: request.input_schema.clone(),
            output_schema: request.output_schema.clone(),
            endpoint: request.endpoint.clone(),
            price_per_call: request.price_per_call,
            max_latency_ms: request.max_latency_ms,
            metrics: AgentMetrics::default(),
            created_at,
        })
    }

    async fn get(&self, agent_id: i64) -> Result<Option<Agent>, StoreError> {
        let row = sqlx::query(&format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?"))
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(agent_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Agent>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(agent_from_row).collect()
    }

    async fn count_latency_samples(&self, agent_id: i64) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM call_logs WHERE agent_id = ? AND latency_ms IS NOT NULL",
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn record_event(&self, agent: &Agent, entry: &NewCallLog) -> Result<CallLog, StoreError> {
        let timestamp = Utc::now();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE agents
            SET total_calls = ?, successful_calls = ?, failed_calls = ?,
                avg_latency = ?, reputation_score = ?
            WHERE id = ?
            "#,
        )
        .bind(agent.metrics.total_calls)
        .bind(agent.metrics.successful_calls)
        .bind(agent.metrics.failed_calls)
        .bind(agent.metrics.avg_latency)
        .bind(agent.metrics.reputation_score)
        .bind(agent.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(StoreError::AgentNotFound(agent.id));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO call_logs (agent_id, timestamp, latency_ms, success, error_message)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(agent.id)
        .bind(timestamp)
        .bind(entry.latency_ms)
        .bind(entry.success)
        .bind(&entry.error_message)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CallLog {
            id: inserted.last_insert_rowid(),
            agent_id: agent.id,
            timestamp,
            latency_ms: entry.latency_ms,
            success: entry.success,
            error_message: entry.error_message.clone(),
        })
    }

    async fn call_logs(&self, agent_id: i64, limit: i64) -> Result<Vec<CallLog>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, agent_id, timestamp, latency_ms, success, error_message
            FROM call_logs
            WHERE agent_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(agent_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(call_log_from_row).collect()
    }

    async fn delete(&self, agent_id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM call_logs WHERE agent_id = ?")
            .bind(agent_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(agent_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted.rows_affected() > 0)
    }
}

/// Fresh in-memory store with the schema applied
#[cfg(test)]
pub(crate) async fn memory_store() -> SqliteAgentStore {
    let pool = connect_pool("sqlite::memory:", 1)
        .await
        .expect("in-memory pool should open");
    run_migrations(&pool).await.expect("migrations should apply");
    SqliteAgentStore::new(pool)
}
