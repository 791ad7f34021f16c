//! Durable keyed persistence for observations and yearly statistics.
//!
//! SQLite via sqlx; every pipeline component receives a `Store` handle
//! rather than reaching for a global connection. The pool scopes
//! connection acquisition and release on every exit path.

pub mod pagination;

pub use pagination::PageRequest;

use crate::error::{PipelineError, Result};
use crate::models::{Observation, YearlyStat};
use chrono::NaiveDate;
use futures::stream::BoxStream;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const OBSERVATION_COLUMNS: &str = "date, station, max_temp, min_temp, precipitation";
const STAT_COLUMNS: &str =
    "year, station, avg_max_temp, avg_min_temp, avg_precipitation, sample_count";

/// Exact-match filters for the observation read contract.
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    pub date: Option<NaiveDate>,
    pub station: Option<String>,
}

/// Exact-match filters for the statistics read contract.
#[derive(Debug, Clone, Default)]
pub struct StatFilter {
    pub year: Option<i32>,
    pub station: Option<String>,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) a file-backed database and run migrations.
    ///
    /// WAL mode plus a busy timeout lets concurrent ingestion workers share
    /// the single-writer database without spurious lock failures.
    pub async fn connect(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::migrate(pool).await
    }

    /// In-memory database for tests. Single connection, so the schema
    /// outlives individual acquisitions.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Check the dedup key without writing.
    pub async fn observation_exists(&self, date: NaiveDate, station: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM observations WHERE date = ?1 AND station = ?2",
        )
        .bind(date)
        .bind(station)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Insert a new observation, failing with `DuplicateKey` if the
    /// (date, station) key is already stored. The duplicate failure is a
    /// distinct variant so callers can treat it as benign.
    pub async fn insert_observation(&self, obs: &Observation) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO observations (date, station, max_temp, min_temp, precipitation)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(obs.date)
        .bind(&obs.station)
        .bind(obs.max_temp)
        .bind(obs.min_temp)
        .bind(obs.precipitation)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(PipelineError::DuplicateKey {
                    date: obs.date,
                    station: obs.station.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic insert-if-absent on the dedup key.
    ///
    /// Returns true when a row was stored, false when the key already
    /// existed. This closes the check-then-insert race window between
    /// concurrent workers entirely; no separate existence check is needed.
    pub async fn insert_observation_if_absent(&self, obs: &Observation) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO observations (date, station, max_temp, min_temp, precipitation)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(date, station) DO NOTHING
            "#,
        )
        .bind(obs.date)
        .bind(&obs.station)
        .bind(obs.max_temp)
        .bind(obs.min_temp)
        .bind(obs.precipitation)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lazy single-pass scan of every stored observation.
    ///
    /// Valid for one aggregation run after the ingestion barrier; no
    /// snapshot isolation is promised against concurrent writers.
    pub fn scan_observations(&self) -> BoxStream<'_, sqlx::Result<Observation>> {
        sqlx::query_as::<_, Observation>(SCAN_OBSERVATIONS_SQL).fetch(&self.pool)
    }

    /// Insert-or-overwrite one yearly aggregate keyed by (year, station).
    pub async fn upsert_yearly_stat(&self, stat: &YearlyStat) -> Result<()> {
        sqlx::query(UPSERT_STAT_SQL)
            .bind(stat.year)
            .bind(&stat.station)
            .bind(stat.avg_max_temp)
            .bind(stat.avg_min_temp)
            .bind(stat.avg_precipitation)
            .bind(stat.sample_count)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Upsert a full aggregation pass in one transaction.
    ///
    /// Either every group commits or none does; partial aggregate state is
    /// never visible to readers.
    pub async fn replace_yearly_stats(&self, stats: &[YearlyStat]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for stat in stats {
            sqlx::query(UPSERT_STAT_SQL)
                .bind(stat.year)
                .bind(&stat.station)
                .bind(stat.avg_max_temp)
                .bind(stat.avg_min_temp)
                .bind(stat.avg_precipitation)
                .bind(stat.sample_count)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Read contract: filtered, ascending by (date, station), paginated.
    pub async fn query_observations(
        &self,
        filter: &ObservationFilter,
        page: &PageRequest,
    ) -> Result<Vec<Observation>> {
        let mut sql = format!("SELECT {OBSERVATION_COLUMNS} FROM observations WHERE 1=1");
        if filter.date.is_some() {
            sql.push_str(" AND date = ?");
        }
        if filter.station.is_some() {
            sql.push_str(" AND station = ?");
        }
        sql.push_str(" ORDER BY date ASC, station ASC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, Observation>(&sql);
        if let Some(date) = filter.date {
            query = query.bind(date);
        }
        if let Some(ref station) = filter.station {
            query = query.bind(station);
        }

        let rows = query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Read contract: filtered, ascending by (year, station), paginated.
    pub async fn query_stats(
        &self,
        filter: &StatFilter,
        page: &PageRequest,
    ) -> Result<Vec<YearlyStat>> {
        let mut sql = format!("SELECT {STAT_COLUMNS} FROM yearly_stats WHERE 1=1");
        if filter.year.is_some() {
            sql.push_str(" AND year = ?");
        }
        if filter.station.is_some() {
            sql.push_str(" AND station = ?");
        }
        sql.push_str(" ORDER BY year ASC, station ASC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, YearlyStat>(&sql);
        if let Some(year) = filter.year {
            query = query.bind(year);
        }
        if let Some(ref station) = filter.station {
            query = query.bind(station);
        }

        let rows = query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn count_observations(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM observations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_stats(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM yearly_stats")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

const SCAN_OBSERVATIONS_SQL: &str =
    "SELECT date, station, max_temp, min_temp, precipitation FROM observations";

const UPSERT_STAT_SQL: &str = r#"
    INSERT INTO yearly_stats (year, station, avg_max_temp, avg_min_temp, avg_precipitation, sample_count)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(year, station) DO UPDATE SET
        avg_max_temp = excluded.avg_max_temp,
        avg_min_temp = excluded.avg_min_temp,
        avg_precipitation = excluded.avg_precipitation,
        sample_count = excluded.sample_count
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;

    fn observation(date: &str, station: &str) -> Observation {
        Observation::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            station.to_string(),
            Some(20.0),
            Some(10.0),
            Some(1.5),
        )
    }

    #[tokio::test]
    async fn test_insert_and_exists() -> Result<()> {
        let store = Store::connect_in_memory().await?;
        let obs = observation("2020-01-01", "USC00110072");

        assert!(!store.observation_exists(obs.date, &obs.station).await?);
        store.insert_observation(&obs).await?;
        assert!(store.observation_exists(obs.date, &obs.station).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_duplicate_is_distinguishable() -> Result<()> {
        let store = Store::connect_in_memory().await?;
        let obs = observation("2020-01-01", "USC00110072");

        store.insert_observation(&obs).await?;
        let err = store.insert_observation(&obs).await.unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateKey { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_same_date_different_station_both_stored() -> Result<()> {
        let store = Store::connect_in_memory().await?;

        store
            .insert_observation(&observation("2020-01-01", "USC00110072"))
            .await?;
        store
            .insert_observation(&observation("2020-01-01", "USW00014842"))
            .await?;

        assert_eq!(store.count_observations().await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_if_absent() -> Result<()> {
        let store = Store::connect_in_memory().await?;
        let obs = observation("2020-01-01", "USC00110072");

        assert!(store.insert_observation_if_absent(&obs).await?);
        assert!(!store.insert_observation_if_absent(&obs).await?);
        assert_eq!(store.count_observations().await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_null_measurements_round_trip() -> Result<()> {
        let store = Store::connect_in_memory().await?;
        let obs = Observation::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            "USC00110072".to_string(),
            Some(10.0),
            None,
            None,
        );

        store.insert_observation(&obs).await?;

        let rows = store
            .query_observations(&ObservationFilter::default(), &PageRequest::default())
            .await?;
        assert_eq!(rows, vec![obs]);

        Ok(())
    }

    #[tokio::test]
    async fn test_scan_observations_streams_all_rows() -> Result<()> {
        let store = Store::connect_in_memory().await?;
        for day in 1..=5 {
            store
                .insert_observation(&observation(&format!("2020-01-{day:02}"), "X"))
                .await?;
        }

        let scanned: Vec<Observation> = store.scan_observations().try_collect().await.unwrap();
        assert_eq!(scanned.len(), 5);

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_stat_overwrites() -> Result<()> {
        let store = Store::connect_in_memory().await?;

        let first = YearlyStat::new(2020, "X".to_string(), 10.0, 5.0, 1.0, 100);
        let second = YearlyStat::new(2020, "X".to_string(), 20.0, 8.0, 2.0, 200);

        store.upsert_yearly_stat(&first).await?;
        store.upsert_yearly_stat(&second).await?;

        let stats = store
            .query_stats(&StatFilter::default(), &PageRequest::default())
            .await?;
        assert_eq!(stats, vec![second]);

        Ok(())
    }

    #[tokio::test]
    async fn test_query_observations_filters() -> Result<()> {
        let store = Store::connect_in_memory().await?;
        store
            .insert_observation(&observation("2020-01-01", "A"))
            .await?;
        store
            .insert_observation(&observation("2020-01-02", "A"))
            .await?;
        store
            .insert_observation(&observation("2020-01-01", "B"))
            .await?;

        let filter = ObservationFilter {
            date: Some(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
            station: None,
        };
        let rows = store
            .query_observations(&filter, &PageRequest::default())
            .await?;
        assert_eq!(rows.len(), 2);
        // Ascending primary-key order
        assert_eq!(rows[0].station, "A");
        assert_eq!(rows[1].station, "B");

        let filter = ObservationFilter {
            date: Some(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
            station: Some("B".to_string()),
        };
        let rows = store
            .query_observations(&filter, &PageRequest::default())
            .await?;
        assert_eq!(rows.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_pagination_boundaries() -> Result<()> {
        let store = Store::connect_in_memory().await?;
        for day in 1..=25 {
            store
                .insert_observation(&observation(&format!("2020-01-{day:02}"), "X"))
                .await?;
        }

        let filter = ObservationFilter::default();

        let page2 = store
            .query_observations(&filter, &PageRequest::new(Some(2), Some(20)))
            .await?;
        assert_eq!(page2.len(), 5);
        assert_eq!(
            page2[0].date,
            NaiveDate::from_ymd_opt(2020, 1, 21).unwrap()
        );

        // Beyond the result set: empty, not an error
        let page3 = store
            .query_observations(&filter, &PageRequest::new(Some(3), Some(20)))
            .await?;
        assert!(page3.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_query_stats_filters_and_order() -> Result<()> {
        let store = Store::connect_in_memory().await?;
        store
            .upsert_yearly_stat(&YearlyStat::new(2021, "B".to_string(), 1.0, 1.0, 1.0, 1))
            .await?;
        store
            .upsert_yearly_stat(&YearlyStat::new(2020, "A".to_string(), 1.0, 1.0, 1.0, 1))
            .await?;
        store
            .upsert_yearly_stat(&YearlyStat::new(2020, "B".to_string(), 1.0, 1.0, 1.0, 1))
            .await?;

        let all = store
            .query_stats(&StatFilter::default(), &PageRequest::default())
            .await?;
        let keys: Vec<_> = all.iter().map(|s| (s.year, s.station.clone())).collect();
        assert_eq!(
            keys,
            vec![
                (2020, "A".to_string()),
                (2020, "B".to_string()),
                (2021, "B".to_string())
            ]
        );

        let filter = StatFilter {
            year: Some(2020),
            station: Some("B".to_string()),
        };
        let rows = store.query_stats(&filter, &PageRequest::default()).await?;
        assert_eq!(rows.len(), 1);

        Ok(())
    }
}
