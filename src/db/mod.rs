pub mod models;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

use self::models::Reading;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Creates `sensor_data` if it does not exist yet. Safe to call repeatedly.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_data (
            device_id   INTEGER          NOT NULL,
            "timestamp" BIGINT           NOT NULL,
            temperature DOUBLE PRECISION NOT NULL,
            humidity    DOUBLE PRECISION NOT NULL,
            luminosity  DOUBLE PRECISION NOT NULL,
            light_on    BOOLEAN          NOT NULL DEFAULT FALSE,
            PRIMARY KEY (device_id, "timestamp")
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("sensor_data schema ready");
    Ok(())
}

/// Result of writing one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// A row with the same `(device_id, timestamp)` already existed; nothing changed.
    Duplicate,
}

/// Sole owner of the `sensor_data` SQL. Cheap to clone; all clones share
/// the same connection pool.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    pool: PgPool,
}

impl ReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts `reading`. A second write for the same key is a no-op, so the
    /// first delivery wins and redelivered messages never duplicate rows.
    pub async fn upsert(&self, reading: &Reading) -> Result<UpsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO sensor_data
                (device_id, "timestamp", temperature, humidity, luminosity, light_on)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (device_id, "timestamp") DO NOTHING
            "#,
        )
        .bind(reading.device_id)
        .bind(reading.timestamp)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.luminosity)
        .bind(reading.light_on)
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() == 0 {
            UpsertOutcome::Duplicate
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Distinct device ids present in storage, ascending.
    pub async fn list_device_ids(&self) -> Result<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT device_id FROM sensor_data ORDER BY device_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// The reading with the greatest timestamp for `device_id`, if any.
    pub async fn latest_reading(&self, device_id: i32) -> Result<Option<Reading>> {
        let row = sqlx::query_as::<_, Reading>(
            r#"
            SELECT device_id, "timestamp", temperature, humidity, luminosity, light_on
            FROM sensor_data
            WHERE device_id = $1
            ORDER BY "timestamp" DESC
            LIMIT 1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Readings for `device_id` with `start <= timestamp <= end`, oldest first.
    pub async fn range_readings(&self, device_id: i32, start: i64, end: i64) -> Result<Vec<Reading>> {
        let rows = sqlx::query_as::<_, Reading>(
            r#"
            SELECT device_id, "timestamp", temperature, humidity, luminosity, light_on
            FROM sensor_data
            WHERE device_id = $1
              AND "timestamp" >= $2
              AND "timestamp" <= $3
            ORDER BY "timestamp" ASC
            "#,
        )
        .bind(device_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
