//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::warn;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::api::{
    Driver, DriverId, NewDriver, NewRace, NewTeam, Race, RaceId, RaceResult, ResultRecord,
    Team, TeamId,
};
use crate::db::repository::{
    DriverRepository, ErrorContext, FullRepository, RaceRepository, RepositoryError,
    RepositoryResult, ResultRepository, TeamRepository,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub total_connections: u32,
    pub max_size: u32,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times with exponential backoff when the
    /// error is retryable (connection errors, serialization failures).
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    warn!("Retrying {} (attempt {})", operation, attempt + 1);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new(operation)
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

#[async_trait]
impl TeamRepository for PostgresRepository {
    async fn insert_team(&self, team: &NewTeam) -> RepositoryResult<Team> {
        let row = TeamChanges::from(team);
        self.with_conn("insert_team", move |conn| {
            diesel::insert_into(teams::table)
                .values(&row)
                .returning(TeamRow::as_returning())
                .get_result::<TeamRow>(conn)
                .map(Team::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_teams(&self) -> RepositoryResult<Vec<Team>> {
        self.with_conn("list_teams", |conn| {
            teams::table
                .order(teams::id.asc())
                .select(TeamRow::as_select())
                .load::<TeamRow>(conn)
                .map(|rows| rows.into_iter().map(Team::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_team(&self, team_id: TeamId) -> RepositoryResult<Option<Team>> {
        self.with_conn("get_team", move |conn| {
            teams::table
                .find(team_id.0)
                .select(TeamRow::as_select())
                .first::<TeamRow>(conn)
                .optional()
                .map(|row| row.map(Team::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn find_team_by_name(&self, name: &str) -> RepositoryResult<Option<Team>> {
        let name = name.to_string();
        self.with_conn("find_team_by_name", move |conn| {
            teams::table
                .filter(teams::name.eq(&name))
                .select(TeamRow::as_select())
                .first::<TeamRow>(conn)
                .optional()
                .map(|row| row.map(Team::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn update_team(&self, team_id: TeamId, team: &NewTeam) -> RepositoryResult<Option<Team>> {
        let changes = TeamChanges::from(team);
        self.with_conn("update_team", move |conn| {
            diesel::update(teams::table.find(team_id.0))
                .set(&changes)
                .returning(TeamRow::as_returning())
                .get_result::<TeamRow>(conn)
                .optional()
                .map(|row| row.map(Team::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_team(&self, team_id: TeamId) -> RepositoryResult<Option<Team>> {
        self.with_conn("delete_team", move |conn| {
            diesel::delete(teams::table.find(team_id.0))
                .returning(TeamRow::as_returning())
                .get_result::<TeamRow>(conn)
                .optional()
                .map(|row| row.map(Team::from))
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl DriverRepository for PostgresRepository {
    async fn insert_driver(&self, driver: &NewDriver) -> RepositoryResult<Driver> {
        let row = DriverChanges::from(driver);
        self.with_conn("insert_driver", move |conn| {
            diesel::insert_into(drivers::table)
                .values(&row)
                .returning(DriverRow::as_returning())
                .get_result::<DriverRow>(conn)
                .map(Driver::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_drivers(&self) -> RepositoryResult<Vec<Driver>> {
        self.with_conn("list_drivers", |conn| {
            drivers::table
                .order(drivers::id.asc())
                .select(DriverRow::as_select())
                .load::<DriverRow>(conn)
                .map(|rows| rows.into_iter().map(Driver::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_driver(&self, driver_id: DriverId) -> RepositoryResult<Option<Driver>> {
        self.with_conn("get_driver", move |conn| {
            drivers::table
                .find(driver_id.0)
                .select(DriverRow::as_select())
                .first::<DriverRow>(conn)
                .optional()
                .map(|row| row.map(Driver::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn find_driver_by_number(&self, number: i32) -> RepositoryResult<Option<Driver>> {
        self.with_conn("find_driver_by_number", move |conn| {
            drivers::table
                .filter(drivers::number.eq(number))
                .select(DriverRow::as_select())
                .first::<DriverRow>(conn)
                .optional()
                .map(|row| row.map(Driver::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_drivers_for_team(&self, team_id: TeamId) -> RepositoryResult<Vec<Driver>> {
        self.with_conn("list_drivers_for_team", move |conn| {
            drivers::table
                .filter(drivers::team_id.eq(team_id.0))
                .order(drivers::id.asc())
                .select(DriverRow::as_select())
                .load::<DriverRow>(conn)
                .map(|rows| rows.into_iter().map(Driver::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn update_driver(
        &self,
        driver_id: DriverId,
        driver: &NewDriver,
    ) -> RepositoryResult<Option<Driver>> {
        let changes = DriverChanges::from(driver);
        self.with_conn("update_driver", move |conn| {
            diesel::update(drivers::table.find(driver_id.0))
                .set(&changes)
                .returning(DriverRow::as_returning())
                .get_result::<DriverRow>(conn)
                .optional()
                .map(|row| row.map(Driver::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_driver(&self, driver_id: DriverId) -> RepositoryResult<Option<Driver>> {
        // Results go with the driver through ON DELETE CASCADE
        self.with_conn("delete_driver", move |conn| {
            diesel::delete(drivers::table.find(driver_id.0))
                .returning(DriverRow::as_returning())
                .get_result::<DriverRow>(conn)
                .optional()
                .map(|row| row.map(Driver::from))
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl RaceRepository for PostgresRepository {
    async fn insert_race(&self, race: &NewRace) -> RepositoryResult<Race> {
        let row = NewRaceRow::from(race);
        self.with_conn("insert_race", move |conn| {
            diesel::insert_into(races::table)
                .values(&row)
                .returning(RaceRow::as_returning())
                .get_result::<RaceRow>(conn)
                .map(Race::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_races(&self) -> RepositoryResult<Vec<Race>> {
        self.with_conn("list_races", |conn| {
            races::table
                .order(races::id.asc())
                .select(RaceRow::as_select())
                .load::<RaceRow>(conn)
                .map(|rows| rows.into_iter().map(Race::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_race(&self, race_id: RaceId) -> RepositoryResult<Option<Race>> {
        self.with_conn("get_race", move |conn| {
            races::table
                .find(race_id.0)
                .select(RaceRow::as_select())
                .first::<RaceRow>(conn)
                .optional()
                .map(|row| row.map(Race::from))
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl ResultRepository for PostgresRepository {
    async fn insert_result(&self, result: &ResultRecord) -> RepositoryResult<RaceResult> {
        let row = NewResultRow::from(result);
        self.with_conn("insert_result", move |conn| {
            diesel::insert_into(results::table)
                .values(&row)
                .returning(ResultRow::as_returning())
                .get_result::<ResultRow>(conn)
                .map(RaceResult::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_results(&self) -> RepositoryResult<Vec<RaceResult>> {
        self.with_conn("list_results", |conn| {
            results::table
                .order(results::id.asc())
                .select(ResultRow::as_select())
                .load::<ResultRow>(conn)
                .map(|rows| rows.into_iter().map(RaceResult::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_results_for_race(&self, race_id: RaceId) -> RepositoryResult<Vec<RaceResult>> {
        self.with_conn("list_results_for_race", move |conn| {
            results::table
                .filter(results::race_id.eq(race_id.0))
                .order(results::position.asc())
                .select(ResultRow::as_select())
                .load::<ResultRow>(conn)
                .map(|rows| rows.into_iter().map(RaceResult::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn find_result_for_driver(
        &self,
        race_id: RaceId,
        driver_id: DriverId,
    ) -> RepositoryResult<Option<RaceResult>> {
        self.with_conn("find_result_for_driver", move |conn| {
            results::table
                .filter(results::race_id.eq(race_id.0))
                .filter(results::driver_id.eq(driver_id.0))
                .select(ResultRow::as_select())
                .first::<ResultRow>(conn)
                .optional()
                .map(|row| row.map(RaceResult::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn find_result_at_position(
        &self,
        race_id: RaceId,
        position: i32,
    ) -> RepositoryResult<Option<RaceResult>> {
        self.with_conn("find_result_at_position", move |conn| {
            results::table
                .filter(results::race_id.eq(race_id.0))
                .filter(results::position.eq(position))
                .select(ResultRow::as_select())
                .first::<ResultRow>(conn)
                .optional()
                .map(|row| row.map(RaceResult::from))
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }
}
