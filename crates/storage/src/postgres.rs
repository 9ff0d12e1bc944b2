//! Postgres backend over a sqlx connection pool.
//!
//! One durable write per mutation: assignment uniqueness rides on the
//! `rotations` primary key, and counter increments are single-statement
//! upserts, so per-key serialization happens at the row level and no
//! concurrent increment is lost.

use async_trait::async_trait;
use rotation_core::config::DatabaseConfig;
use rotation_core::error::{RotationError, RotationResult};
use rotation_core::store::{Catalog, Registry, StatsStore};
use rotation_core::types::{BannerStats, EngagementEvent, EngagementKind};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS banners (
        id BIGINT PRIMARY KEY,
        description TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS slots (
        id BIGINT PRIMARY KEY,
        description TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS usergroups (
        id BIGINT PRIMARY KEY,
        description TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS rotations (
        banner_id BIGINT NOT NULL REFERENCES banners (id),
        slot_id BIGINT NOT NULL REFERENCES slots (id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (banner_id, slot_id)
    )",
    "CREATE TABLE IF NOT EXISTS engagement_stats (
        banner_id BIGINT NOT NULL,
        slot_id BIGINT NOT NULL,
        usergroup_id BIGINT NOT NULL,
        impressions BIGINT NOT NULL DEFAULT 0,
        clicks BIGINT NOT NULL DEFAULT 0,
        PRIMARY KEY (banner_id, slot_id, usergroup_id)
    )",
];

/// Postgres-backed catalog, registry and statistics store.
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Connect to Postgres and build the connection pool.
    pub async fn connect(config: &DatabaseConfig) -> RotationResult<Self> {
        info!(url = %config.url, "Connecting to Postgres");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
            .connect(&config.url)
            .await
            .map_err(|e| RotationError::Storage(e.into()))?;

        Ok(Self { pool })
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> RotationResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| RotationError::Storage(e.into()))?;
        }
        info!("Postgres schema is up to date");
        Ok(())
    }

    async fn exists(&self, query: &str, id: i64) -> RotationResult<bool> {
        sqlx::query_scalar::<_, bool>(query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RotationError::Storage(e.into()))
    }

    async fn bump(
        &self,
        kind: EngagementKind,
        query: &str,
        banner_id: i64,
        slot_id: i64,
        usergroup_id: i64,
    ) -> RotationResult<EngagementEvent> {
        sqlx::query(query)
            .bind(banner_id)
            .bind(slot_id)
            .bind(usergroup_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RotationError::Storage(e.into()))?;

        Ok(EngagementEvent::new(kind, banner_id, slot_id, usergroup_id))
    }
}

#[async_trait]
impl Catalog for PgStorage {
    async fn banner_exists(&self, banner_id: i64) -> RotationResult<bool> {
        self.exists("SELECT EXISTS (SELECT 1 FROM banners WHERE id = $1)", banner_id)
            .await
    }

    async fn slot_exists(&self, slot_id: i64) -> RotationResult<bool> {
        self.exists("SELECT EXISTS (SELECT 1 FROM slots WHERE id = $1)", slot_id)
            .await
    }

    async fn usergroup_exists(&self, usergroup_id: i64) -> RotationResult<bool> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM usergroups WHERE id = $1)",
            usergroup_id,
        )
        .await
    }
}

#[async_trait]
impl Registry for PgStorage {
    async fn add_assignment(&self, banner_id: i64, slot_id: i64) -> RotationResult<()> {
        let result = sqlx::query("INSERT INTO rotations (banner_id, slot_id) VALUES ($1, $2)")
            .bind(banner_id)
            .bind(slot_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RotationError::AlreadyAssigned { banner_id, slot_id })
            }
            Err(e) => Err(RotationError::Storage(e.into())),
        }
    }

    async fn remove_assignment(&self, banner_id: i64, slot_id: i64) -> RotationResult<()> {
        let result =
            sqlx::query("DELETE FROM rotations WHERE banner_id = $1 AND slot_id = $2")
                .bind(banner_id)
                .bind(slot_id)
                .execute(&self.pool)
                .await
                .map_err(|e| RotationError::Storage(e.into()))?;

        if result.rows_affected() == 0 {
            debug!(banner_id, slot_id, "Assignment already absent on remove");
        }
        Ok(())
    }

    async fn active_banners(&self, slot_id: i64) -> RotationResult<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT banner_id FROM rotations WHERE slot_id = $1 ORDER BY banner_id",
        )
        .bind(slot_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RotationError::Storage(e.into()))
    }
}

#[async_trait]
impl StatsStore for PgStorage {
    async fn snapshot(
        &self,
        slot_id: i64,
        usergroup_id: i64,
        banner_ids: &[i64],
    ) -> RotationResult<Vec<BannerStats>> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            "SELECT banner_id, impressions, clicks
             FROM engagement_stats
             WHERE slot_id = $1 AND usergroup_id = $2 AND banner_id = ANY ($3)",
        )
        .bind(slot_id)
        .bind(usergroup_id)
        .bind(banner_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RotationError::Storage(e.into()))?;

        let recorded: HashMap<i64, (i64, i64)> = rows
            .into_iter()
            .map(|(banner_id, impressions, clicks)| (banner_id, (impressions, clicks)))
            .collect();

        Ok(banner_ids
            .iter()
            .map(|&banner_id| {
                let (impressions, clicks) = recorded.get(&banner_id).copied().unwrap_or((0, 0));
                BannerStats {
                    banner_id,
                    impressions: impressions as u64,
                    clicks: clicks as u64,
                }
            })
            .collect())
    }

    async fn increment_impression(
        &self,
        banner_id: i64,
        slot_id: i64,
        usergroup_id: i64,
    ) -> RotationResult<EngagementEvent> {
        self.bump(
            EngagementKind::Impression,
            "INSERT INTO engagement_stats (banner_id, slot_id, usergroup_id, impressions, clicks)
             VALUES ($1, $2, $3, 1, 0)
             ON CONFLICT (banner_id, slot_id, usergroup_id)
             DO UPDATE SET impressions = engagement_stats.impressions + 1",
            banner_id,
            slot_id,
            usergroup_id,
        )
        .await
    }

    async fn increment_click(
        &self,
        banner_id: i64,
        slot_id: i64,
        usergroup_id: i64,
    ) -> RotationResult<EngagementEvent> {
        self.bump(
            EngagementKind::Click,
            "INSERT INTO engagement_stats (banner_id, slot_id, usergroup_id, impressions, clicks)
             VALUES ($1, $2, $3, 0, 1)
             ON CONFLICT (banner_id, slot_id, usergroup_id)
             DO UPDATE SET clicks = engagement_stats.clicks + 1",
            banner_id,
            slot_id,
            usergroup_id,
        )
        .await
    }
}
