use sqlx::{Postgres, QueryBuilder, Row, Transaction};
use tracing::{error, info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::models::PersistedGameRow;
use crate::util::db::Db;
use crate::util::env::{db_url, env_opt, env_parse};

const INSERT_COLUMNS: &str = "item_id, name, release_date, price_original_usd, price_current_usd, \
     review_ratio, owners_estimate, days_since_release, is_free, main_genre, total_reviews, \
     genres_json, raw_data_json";

const BINDS_PER_ROW: usize = 13;
/// Postgres caps a statement at 65535 bind parameters.
const MAX_ROWS_PER_INSERT: usize = 65_535 / BINDS_PER_ROW;

/// Loader settings, resolved once at process start.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub database_url: String,
    pub table: String,
    pub max_connections: u32,
}

impl LoaderConfig {
    pub fn new(database_url: impl Into<String>, table: impl Into<String>) -> Result<Self> {
        let database_url = database_url.into();
        if database_url.trim().is_empty() {
            return Err(PipelineError::Config("database URL is empty".into()));
        }
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self {
            database_url,
            table,
            max_connections: 2,
        })
    }

    /// Env: DATABASE_URL or PG* vars, GAMES_TABLE (default `games`), DB_MAX_CONNS (default 2).
    pub fn from_env() -> Result<Self> {
        let table = env_opt("GAMES_TABLE").unwrap_or_else(|| "games".into());
        let mut cfg = Self::new(db_url()?, table.trim())?;
        cfg.max_connections = env_parse("DB_MAX_CONNS", cfg.max_connections)?;
        Ok(cfg)
    }
}

/// Table names are interpolated into SQL, so only `[A-Za-z_][A-Za-z0-9_]*`
/// (optionally schema-qualified) is accepted.
pub fn validate_table_name(table: &str) -> Result<()> {
    let ok_ident = |s: &str| {
        let mut chars = s.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| ok_ident(p)) {
        Ok(())
    } else {
        Err(PipelineError::Config(format!("invalid table name {table:?}")))
    }
}

/// Full-replace writer for the games table.
pub struct GameLoader {
    db: Db,
    table: String,
}

impl GameLoader {
    pub async fn connect(config: &LoaderConfig) -> Result<Self> {
        let db = Db::connect(&config.database_url, config.max_connections)
            .await
            .map_err(PipelineError::Database)?;
        Ok(Self::new(db, config.table.clone()))
    }

    pub fn new(db: Db, table: String) -> Self {
        Self { db, table }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the destination table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                item_id BIGINT PRIMARY KEY,
                name TEXT,
                release_date DATE,
                price_original_usd DOUBLE PRECISION,
                price_current_usd DOUBLE PRECISION,
                review_ratio DOUBLE PRECISION,
                owners_estimate BIGINT,
                days_since_release BIGINT,
                is_free BOOLEAN NOT NULL DEFAULT FALSE,
                main_genre TEXT,
                total_reviews BIGINT,
                genres_json JSONB NOT NULL DEFAULT '[]'::jsonb,
                raw_data_json JSONB NOT NULL DEFAULT '{{}}'::jsonb
            )",
            self.table
        );
        sqlx::raw_sql(&ddl)
            .execute(&self.db.pool)
            .await
            .map_err(PipelineError::Database)?;
        Ok(())
    }

    /// Replace the table contents with `rows` in one transaction.
    ///
    /// On any failure the transaction is rolled back, leaving the previous
    /// contents in place, and the error is returned.
    #[instrument(skip(self, rows), fields(table = %self.table, rows = rows.len()))]
    pub async fn replace_all(&self, rows: &[PersistedGameRow]) -> Result<u64> {
        let mut tx = self
            .db
            .pool
            .begin()
            .await
            .map_err(PipelineError::PersistenceFailure)?;

        match self.truncate_and_insert(&mut tx, rows).await {
            Ok(inserted) => {
                tx.commit().await.map_err(PipelineError::PersistenceFailure)?;
                info!(inserted, "games: load committed");
                Ok(inserted)
            }
            Err(err) => {
                error!(error = %err, "games: load failed; rolling back");
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "games: rollback reported an error");
                }
                Err(PipelineError::PersistenceFailure(err))
            }
        }
    }

    async fn truncate_and_insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rows: &[PersistedGameRow],
    ) -> std::result::Result<u64, sqlx::Error> {
        sqlx::query(&format!("TRUNCATE TABLE {}", self.table))
            .persistent(false)
            .execute(&mut **tx)
            .await?;

        let mut inserted = 0u64;
        for chunk in rows.chunks(MAX_ROWS_PER_INSERT) {
            let mut qb: QueryBuilder<'_, Postgres> =
                QueryBuilder::new(format!("INSERT INTO {} ({}) ", self.table, INSERT_COLUMNS));
            qb.push_values(chunk, |mut b, r| {
                b.push_bind(r.item_id)
                    .push_bind(r.name.as_deref())
                    .push_bind(r.release_date)
                    .push_bind(r.price_original_usd)
                    .push_bind(r.price_current_usd)
                    .push_bind(r.review_ratio)
                    .push_bind(r.owners_estimate)
                    .push_bind(r.days_since_release)
                    .push_bind(r.is_free)
                    .push_bind(r.main_genre.as_deref())
                    .push_bind(r.total_reviews)
                    .push_bind(&r.genres_json)
                    .push_bind(&r.raw_data_json);
            });
            inserted += qb
                .build()
                .persistent(false)
                .execute(&mut **tx)
                .await?
                .rows_affected();
        }
        Ok(inserted)
    }

    /// Every row, ordered by id.
    pub async fn fetch_all(&self) -> Result<Vec<PersistedGameRow>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY item_id",
            INSERT_COLUMNS, self.table
        );
        let rows = sqlx::query(&sql)
            .persistent(false)
            .fetch_all(&self.db.pool)
            .await
            .map_err(PipelineError::Database)?;
        rows.iter()
            .map(|r| -> std::result::Result<PersistedGameRow, sqlx::Error> {
                Ok(PersistedGameRow {
                    item_id: r.try_get("item_id")?,
                    name: r.try_get("name")?,
                    release_date: r.try_get("release_date")?,
                    price_original_usd: r.try_get("price_original_usd")?,
                    price_current_usd: r.try_get("price_current_usd")?,
                    review_ratio: r.try_get("review_ratio")?,
                    owners_estimate: r.try_get("owners_estimate")?,
                    days_since_release: r.try_get("days_since_release")?,
                    is_free: r.try_get("is_free")?,
                    main_genre: r.try_get("main_genre")?,
                    total_reviews: r.try_get("total_reviews")?,
                    genres_json: r.try_get("genres_json")?,
                    raw_data_json: r.try_get("raw_data_json")?,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(PipelineError::Database)
    }

    pub async fn row_count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&sql)
            .persistent(false)
            .fetch_one(&self.db.pool)
            .await
            .map_err(PipelineError::Database)?;
        Ok(count)
    }
}
