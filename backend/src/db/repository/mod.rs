//! Repository traits for abstracting the entity store.
//!
//! These traits define every store operation the rule engines and the
//! standings calculator need, so that the in-memory and Postgres backends can
//! be swapped via dependency injection.
//!
//! Lookups return `Ok(None)` when the entity does not exist. Deciding whether
//! a missing entity is an error is the caller's job; `Err` is reserved for
//! store failures.
//!
//! # Thread Safety
//! Implementations must be `Send + Sync` to be shared across request handlers.

use async_trait::async_trait;

use crate::api::{
    Driver, DriverId, NewDriver, NewRace, NewTeam, Race, RaceId, RaceResult, ResultRecord,
    Team, TeamId,
};

pub mod error;

pub use error::{
    ErrorContext, RepositoryError, RepositoryResult, RESULT_RACE_DRIVER_KEY,
    RESULT_RACE_POSITION_KEY,
};

/// Team ("escudería") persistence.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Insert a team and return it with its assigned ID.
    async fn insert_team(&self, team: &NewTeam) -> RepositoryResult<Team>;

    /// List all teams, ordered by ID.
    async fn list_teams(&self) -> RepositoryResult<Vec<Team>>;

    async fn get_team(&self, team_id: TeamId) -> RepositoryResult<Option<Team>>;

    /// Find a team by exact name.
    async fn find_team_by_name(&self, name: &str) -> RepositoryResult<Option<Team>>;

    /// Overwrite all mutable fields. Returns `None` if the team does not exist.
    async fn update_team(&self, team_id: TeamId, team: &NewTeam) -> RepositoryResult<Option<Team>>;

    /// Delete a team. Drivers referencing it keep existing with no team.
    /// Returns the deleted team, or `None` if it did not exist.
    async fn delete_team(&self, team_id: TeamId) -> RepositoryResult<Option<Team>>;
}

/// Driver ("piloto") persistence.
#[async_trait]
pub trait DriverRepository: Send + Sync {
    /// Insert a driver and return it with its assigned ID.
    async fn insert_driver(&self, driver: &NewDriver) -> RepositoryResult<Driver>;

    /// List all drivers, ordered by ID. Standings rely on this order being stable.
    async fn list_drivers(&self) -> RepositoryResult<Vec<Driver>>;

    async fn get_driver(&self, driver_id: DriverId) -> RepositoryResult<Option<Driver>>;

    async fn find_driver_by_number(&self, number: i32) -> RepositoryResult<Option<Driver>>;

    /// Drivers currently referencing the team, ordered by ID.
    async fn list_drivers_for_team(&self, team_id: TeamId) -> RepositoryResult<Vec<Driver>>;

    /// Overwrite all mutable fields. Returns `None` if the driver does not exist.
    async fn update_driver(
        &self,
        driver_id: DriverId,
        driver: &NewDriver,
    ) -> RepositoryResult<Option<Driver>>;

    /// Delete a driver together with its results.
    async fn delete_driver(&self, driver_id: DriverId) -> RepositoryResult<Option<Driver>>;
}

/// Race ("gran premio") persistence.
#[async_trait]
pub trait RaceRepository: Send + Sync {
    async fn insert_race(&self, race: &NewRace) -> RepositoryResult<Race>;

    /// List all races, ordered by ID.
    async fn list_races(&self) -> RepositoryResult<Vec<Race>>;

    async fn get_race(&self, race_id: RaceId) -> RepositoryResult<Option<Race>>;
}

/// Result ("resultado") persistence.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn insert_result(&self, result: &ResultRecord) -> RepositoryResult<RaceResult>;

    /// List every stored result, ordered by ID.
    async fn list_results(&self) -> RepositoryResult<Vec<RaceResult>>;

    /// Results of one race, ordered by position ascending.
    async fn list_results_for_race(&self, race_id: RaceId) -> RepositoryResult<Vec<RaceResult>>;

    /// The result a driver holds in a race, if any.
    async fn find_result_for_driver(
        &self,
        race_id: RaceId,
        driver_id: DriverId,
    ) -> RepositoryResult<Option<RaceResult>>;

    /// The result occupying a position in a race, if any.
    async fn find_result_at_position(
        &self,
        race_id: RaceId,
        position: i32,
    ) -> RepositoryResult<Option<RaceResult>>;
}

/// Combined repository used by the service layer and the HTTP state.
#[async_trait]
pub trait FullRepository:
    TeamRepository + DriverRepository + RaceRepository + ResultRepository
{
    /// Check if the store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is healthy
    /// - `Ok(false)` if it is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;
}
