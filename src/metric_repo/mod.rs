// SQLite metric store. Timestamps are epoch milliseconds (UTC).
// Raw samples only; aggregation is computed on read by crate::aggregation.

mod list;

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::instrument;

use crate::models::{ListQuery, MetricFilter, MetricSample, Page, StoredMetric};

pub struct MetricRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl MetricRepo {
    pub async fn connect(
        path: &str,
        max_pool_size: u32,
        retention_days: u32,
    ) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        let retention_ms = (retention_days as i64) * 24 * 60 * 60 * 1000;
        Ok(Self { pool, retention_ms })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                service_id TEXT NOT NULL,
                metric_type TEXT NOT NULL,
                value REAL NOT NULL,
                recorded_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_metrics_recorded_at ON metrics(recorded_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_metrics_service_type ON metrics(service_id, metric_type, recorded_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, sample), fields(repo = "metrics", operation = "insert", service_id = %sample.service_id))]
    pub async fn insert(&self, sample: &MetricSample) -> anyhow::Result<StoredMetric> {
        sample.validate()?;
        let created_at = Utc::now();
        let r = sqlx::query(
            "INSERT INTO metrics (service_id, metric_type, value, recorded_at, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&sample.service_id)
        .bind(sample.metric_type.as_str())
        .bind(sample.value)
        .bind(sample.recorded_at.timestamp_millis())
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(StoredMetric {
            id: r.last_insert_rowid(),
            service_id: sample.service_id.clone(),
            metric_type: sample.metric_type,
            value: sample.value,
            recorded_at: millis_to_utc(sample.recorded_at.timestamp_millis())?,
            created_at: millis_to_utc(created_at.timestamp_millis())?,
        })
    }

    /// Samples with recorded_at in [from, to) matching `filter`. Order: ascending by recorded_at.
    /// Stored times are whole milliseconds, so both bounds round up to the next millisecond.
    #[instrument(skip(self, filter), fields(repo = "metrics", operation = "get_in_range"))]
    pub async fn get_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        filter: &MetricFilter,
    ) -> anyhow::Result<Vec<MetricSample>> {
        let rows = sqlx::query(
            "SELECT id, service_id, metric_type, value, recorded_at, created_at
             FROM metrics
             WHERE recorded_at >= $1 AND recorded_at < $2
               AND ($3 IS NULL OR service_id = $3)
               AND ($4 IS NULL OR metric_type = $4)
             ORDER BY recorded_at ASC, id ASC",
        )
        .bind(ceil_millis(from))
        .bind(ceil_millis(to))
        .bind(filter.service_id.as_deref())
        .bind(filter.metric_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_row(&row)?.to_sample());
        }
        Ok(out)
    }

    /// One page of stored metrics plus the total count for the same filters.
    #[instrument(skip(self, query), fields(repo = "metrics", operation = "list", limit = query.limit, offset = query.offset))]
    pub async fn list(&self, query: &ListQuery) -> anyhow::Result<Page<StoredMetric>> {
        let mut select = list::select(query);
        let rows = select.build().fetch_all(&self.pool).await?;
        let mut count = list::count(query);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            data.push(Self::parse_row(&row)?);
        }
        Ok(Page {
            data,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM metrics")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Delete samples recorded before `cutoff`. Returns rows deleted.
    #[instrument(skip(self), fields(repo = "metrics", operation = "prune_before"))]
    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let r = sqlx::query("DELETE FROM metrics WHERE recorded_at < $1")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    /// Delete samples older than the retention window.
    #[instrument(skip(self), fields(repo = "metrics", operation = "prune_old_data"))]
    pub async fn prune_old_data(&self) -> anyhow::Result<u64> {
        let cutoff = millis_to_utc(Utc::now().timestamp_millis() - self.retention_ms)?;
        self.prune_before(cutoff).await
    }

    /// Reclaim space after deletes (run periodically after pruning).
    #[instrument(skip(self), fields(repo = "metrics", operation = "vacuum"))]
    pub async fn vacuum(&self) -> anyhow::Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    fn parse_row(row: &SqliteRow) -> anyhow::Result<StoredMetric> {
        let metric_type: String = row.try_get("metric_type")?;
        let recorded_at: i64 = row.try_get("recorded_at")?;
        let created_at: i64 = row.try_get("created_at")?;
        Ok(StoredMetric {
            id: row.try_get("id")?,
            service_id: row.try_get("service_id")?,
            metric_type: metric_type.parse()?,
            value: row.try_get("value")?,
            recorded_at: millis_to_utc(recorded_at)?,
            created_at: millis_to_utc(created_at)?,
        })
    }
}

fn millis_to_utc(ms: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| anyhow::anyhow!("timestamp out of range: {}", ms))
}

fn ceil_millis(t: DateTime<Utc>) -> i64 {
    let ms = t.timestamp_millis();
    if t.timestamp_subsec_nanos() % 1_000_000 == 0 {
        ms
    } else {
        ms + 1
    }
}
