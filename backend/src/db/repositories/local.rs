//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! ordered maps keyed by ID, so listings come back in ID order just like the
//! Postgres backend's `ORDER BY id`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::{
    Driver, DriverId, NewDriver, NewRace, NewTeam, Race, RaceId, RaceResult, ResultId,
    ResultRecord, Team, TeamId,
};
use crate::db::repository::*;

/// In-memory local repository.
///
/// Cloning is cheap and clones share the same underlying data.
///
/// # Example
/// ```
/// use championship::db::repositories::LocalRepository;
/// use championship::db::repository::TeamRepository;
/// use championship::api::NewTeam;
///
/// # tokio_test_block(async {
/// let repo = LocalRepository::new();
/// let team = repo
///     .insert_team(&NewTeam {
///         name: "Ferrari".into(),
///         country: "Italy".into(),
///         constructor_championships: 16,
///     })
///     .await
///     .unwrap();
/// assert_eq!(team.id.value(), 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    teams: BTreeMap<TeamId, Team>,
    drivers: BTreeMap<DriverId, Driver>,
    races: BTreeMap<RaceId, Race>,
    results: BTreeMap<ResultId, RaceResult>,

    // ID counters
    next_team_id: i64,
    next_driver_id: i64,
    next_race_id: i64,
    next_result_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            teams: BTreeMap::new(),
            drivers: BTreeMap::new(),
            races: BTreeMap::new(),
            results: BTreeMap::new(),
            next_team_id: 1,
            next_driver_id: 1,
            next_race_id: 1,
            next_result_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository. IDs restart at 1.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
    }

    pub fn team_count(&self) -> usize {
        self.data.read().teams.len()
    }

    pub fn driver_count(&self) -> usize {
        self.data.read().drivers.len()
    }

    pub fn result_count(&self) -> usize {
        self.data.read().results.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn build_team(id: TeamId, team: &NewTeam) -> Team {
    Team {
        id,
        name: team.name.clone(),
        country: team.country.clone(),
        constructor_championships: team.constructor_championships,
    }
}

fn build_driver(id: DriverId, driver: &NewDriver) -> Driver {
    Driver {
        id,
        name: driver.name.clone(),
        number: driver.number,
        nationality: driver.nationality.clone(),
        driver_championships: driver.driver_championships,
        team_id: driver.team_id,
    }
}

#[async_trait]
impl TeamRepository for LocalRepository {
    async fn insert_team(&self, team: &NewTeam) -> RepositoryResult<Team> {
        self.check_health("insert_team")?;
        let mut data = self.data.write();
        if data.teams.values().any(|t| t.name == team.name) {
            return Err(RepositoryError::unique_violation(
                format!("team name '{}' already exists", team.name),
                ErrorContext::new("insert_team").with_entity("team"),
            ));
        }
        let id = TeamId(data.next_team_id);
        data.next_team_id += 1;
        let stored = build_team(id, team);
        data.teams.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_teams(&self) -> RepositoryResult<Vec<Team>> {
        self.check_health("list_teams")?;
        Ok(self.data.read().teams.values().cloned().collect())
    }

    async fn get_team(&self, team_id: TeamId) -> RepositoryResult<Option<Team>> {
        self.check_health("get_team")?;
        Ok(self.data.read().teams.get(&team_id).cloned())
    }

    async fn find_team_by_name(&self, name: &str) -> RepositoryResult<Option<Team>> {
        self.check_health("find_team_by_name")?;
        Ok(self
            .data
            .read()
            .teams
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn update_team(&self, team_id: TeamId, team: &NewTeam) -> RepositoryResult<Option<Team>> {
        self.check_health("update_team")?;
        let mut data = self.data.write();
        if !data.teams.contains_key(&team_id) {
            return Ok(None);
        }
        if data
            .teams
            .values()
            .any(|t| t.id != team_id && t.name == team.name)
        {
            return Err(RepositoryError::unique_violation(
                format!("team name '{}' already exists", team.name),
                ErrorContext::new("update_team")
                    .with_entity("team")
                    .with_entity_id(team_id),
            ));
        }
        let stored = build_team(team_id, team);
        data.teams.insert(team_id, stored.clone());
        Ok(Some(stored))
    }

    async fn delete_team(&self, team_id: TeamId) -> RepositoryResult<Option<Team>> {
        self.check_health("delete_team")?;
        let mut data = self.data.write();
        let removed = data.teams.remove(&team_id);
        if removed.is_some() {
            // Same effect as ON DELETE SET NULL
            for driver in data.drivers.values_mut() {
                if driver.team_id == Some(team_id) {
                    driver.team_id = None;
                }
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl DriverRepository for LocalRepository {
    async fn insert_driver(&self, driver: &NewDriver) -> RepositoryResult<Driver> {
        self.check_health("insert_driver")?;
        let mut data = self.data.write();
        if data.drivers.values().any(|d| d.number == driver.number) {
            return Err(RepositoryError::unique_violation(
                format!("driver number {} already exists", driver.number),
                ErrorContext::new("insert_driver").with_entity("driver"),
            ));
        }
        let id = DriverId(data.next_driver_id);
        data.next_driver_id += 1;
        let stored = build_driver(id, driver);
        data.drivers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_drivers(&self) -> RepositoryResult<Vec<Driver>> {
        self.check_health("list_drivers")?;
        Ok(self.data.read().drivers.values().cloned().collect())
    }

    async fn get_driver(&self, driver_id: DriverId) -> RepositoryResult<Option<Driver>> {
        self.check_health("get_driver")?;
        Ok(self.data.read().drivers.get(&driver_id).cloned())
    }

    async fn find_driver_by_number(&self, number: i32) -> RepositoryResult<Option<Driver>> {
        self.check_health("find_driver_by_number")?;
        Ok(self
            .data
            .read()
            .drivers
            .values()
            .find(|d| d.number == number)
            .cloned())
    }

    async fn list_drivers_for_team(&self, team_id: TeamId) -> RepositoryResult<Vec<Driver>> {
        self.check_health("list_drivers_for_team")?;
        Ok(self
            .data
            .read()
            .drivers
            .values()
            .filter(|d| d.team_id == Some(team_id))
            .cloned()
            .collect())
    }

    async fn update_driver(
        &self,
        driver_id: DriverId,
        driver: &NewDriver,
    ) -> RepositoryResult<Option<Driver>> {
        self.check_health("update_driver")?;
        let mut data = self.data.write();
        if !data.drivers.contains_key(&driver_id) {
            return Ok(None);
        }
        if data
            .drivers
            .values()
            .any(|d| d.id != driver_id && d.number == driver.number)
        {
            return Err(RepositoryError::unique_violation(
                format!("driver number {} already exists", driver.number),
                ErrorContext::new("update_driver")
                    .with_entity("driver")
                    .with_entity_id(driver_id),
            ));
        }
        let stored = build_driver(driver_id, driver);
        data.drivers.insert(driver_id, stored.clone());
        Ok(Some(stored))
    }

    async fn delete_driver(&self, driver_id: DriverId) -> RepositoryResult<Option<Driver>> {
        self.check_health("delete_driver")?;
        let mut data = self.data.write();
        let removed = data.drivers.remove(&driver_id);
        if removed.is_some() {
            data.results.retain(|_, r| r.driver_id != driver_id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl RaceRepository for LocalRepository {
    async fn insert_race(&self, race: &NewRace) -> RepositoryResult<Race> {
        self.check_health("insert_race")?;
        let mut data = self.data.write();
        let id = RaceId(data.next_race_id);
        data.next_race_id += 1;
        let stored = Race {
            id,
            name: race.name.clone(),
            country: race.country.clone(),
            date: race.date,
        };
        data.races.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_races(&self) -> RepositoryResult<Vec<Race>> {
        self.check_health("list_races")?;
        Ok(self.data.read().races.values().cloned().collect())
    }

    async fn get_race(&self, race_id: RaceId) -> RepositoryResult<Option<Race>> {
        self.check_health("get_race")?;
        Ok(self.data.read().races.get(&race_id).cloned())
    }
}

#[async_trait]
impl ResultRepository for LocalRepository {
    async fn insert_result(&self, result: &ResultRecord) -> RepositoryResult<RaceResult> {
        self.check_health("insert_result")?;
        let mut data = self.data.write();
        let (mut driver_taken, mut position_taken) = (false, false);
        for existing in data.results.values().filter(|r| r.race_id == result.race_id) {
            driver_taken |= existing.driver_id == result.driver_id;
            position_taken |= existing.position == result.position;
        }
        if driver_taken {
            return Err(RepositoryError::unique_violation(
                format!(
                    "driver {} already has a result in race {}",
                    result.driver_id, result.race_id
                ),
                ErrorContext::new("insert_result")
                    .with_entity("result")
                    .with_constraint(RESULT_RACE_DRIVER_KEY),
            ));
        }
        if position_taken {
            return Err(RepositoryError::unique_violation(
                format!(
                    "position {} already taken in race {}",
                    result.position, result.race_id
                ),
                ErrorContext::new("insert_result")
                    .with_entity("result")
                    .with_constraint(RESULT_RACE_POSITION_KEY),
            ));
        }
        let id = ResultId(data.next_result_id);
        data.next_result_id += 1;
        let stored = RaceResult {
            id,
            driver_id: result.driver_id,
            race_id: result.race_id,
            position: result.position,
        };
        data.results.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_results(&self) -> RepositoryResult<Vec<RaceResult>> {
        self.check_health("list_results")?;
        Ok(self.data.read().results.values().cloned().collect())
    }

    async fn list_results_for_race(&self, race_id: RaceId) -> RepositoryResult<Vec<RaceResult>> {
        self.check_health("list_results_for_race")?;
        let mut results: Vec<RaceResult> = self
            .data
            .read()
            .results
            .values()
            .filter(|r| r.race_id == race_id)
            .cloned()
            .collect();
        results.sort_by_key(|r| r.position);
        Ok(results)
    }

    async fn find_result_for_driver(
        &self,
        race_id: RaceId,
        driver_id: DriverId,
    ) -> RepositoryResult<Option<RaceResult>> {
        self.check_health("find_result_for_driver")?;
        Ok(self
            .data
            .read()
            .results
            .values()
            .find(|r| r.race_id == race_id && r.driver_id == driver_id)
            .cloned())
    }

    async fn find_result_at_position(
        &self,
        race_id: RaceId,
        position: i32,
    ) -> RepositoryResult<Option<RaceResult>> {
        self.check_health("find_result_at_position")?;
        Ok(self
            .data
            .read()
            .results
            .values()
            .find(|r| r.race_id == race_id && r.position == position)
            .cloned())
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }
}
