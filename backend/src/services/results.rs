//! Result rules and the per-race classification read model.
//!
//! A race's classification stays internally consistent: each driver appears
//! at most once and each position is held by at most one driver. There is no
//! upper bound on the position value.

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::error::{ChampionshipError, ChampionshipResult, ConflictKind};
use super::standings::points_for_position;
use crate::api::{DriverId, NewRaceResult, RaceId, RaceResult, ResultId, ResultRecord};
use crate::db::repository::{FullRepository, RESULT_RACE_DRIVER_KEY};

/// One classified line of a race, enriched for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceResultRow {
    pub id: ResultId,
    pub position: i32,
    pub points: u32,
    pub driver_id: DriverId,
    pub driver: String,
    pub number: i32,
    pub team: Option<String>,
}

/// Record a driver's finishing position in a race.
///
/// Order of checks:
/// 1. position, race reference and driver number present and positive (`Validation`);
/// 2. a driver holds the number (`NotFound`);
/// 3. the race exists (`NotFound`);
/// 4. the driver has no result in this race yet (`Conflict(DriverAlreadyClassified)`);
/// 5. the position is free in this race (`Conflict(PositionOccupied)`).
pub async fn record_result<R: FullRepository + ?Sized>(
    repo: &R,
    candidate: &NewRaceResult,
) -> ChampionshipResult<RaceResult> {
    let (Some(position), Some(race_id), Some(number)) = (
        candidate.position.filter(|p| *p > 0),
        candidate.race_id.filter(|id| id.value() > 0),
        candidate.driver_number.filter(|n| *n > 0),
    ) else {
        return Err(ChampionshipError::validation(
            "All fields (position, driver number and race) are required.",
        ));
    };

    let driver = repo
        .find_driver_by_number(number)
        .await?
        .ok_or_else(|| ChampionshipError::not_found(format!("Driver #{} not found.", number)))?;

    let race = repo
        .get_race(race_id)
        .await?
        .ok_or_else(|| ChampionshipError::not_found(format!("Race {} not found.", race_id)))?;

    if repo
        .find_result_for_driver(race.id, driver.id)
        .await?
        .is_some()
    {
        debug!("Driver {} already classified in race {}", driver.id, race.id);
        return Err(already_classified(number, &race.name));
    }

    if repo
        .find_result_at_position(race.id, position)
        .await?
        .is_some()
    {
        debug!("Position {} already taken in race {}", position, race.id);
        return Err(position_occupied(position, &race.name));
    }

    let record = ResultRecord {
        driver_id: driver.id,
        race_id: race.id,
        position,
    };
    // A concurrent insert can still collide; name the key that was hit.
    let result = repo.insert_result(&record).await.map_err(|e| {
        let (kind, message) = if e.violated_constraint() == Some(RESULT_RACE_DRIVER_KEY) {
            (
                ConflictKind::DriverAlreadyClassified,
                already_classified(number, &race.name).to_string(),
            )
        } else {
            (
                ConflictKind::PositionOccupied,
                position_occupied(position, &race.name).to_string(),
            )
        };
        ChampionshipError::from_store(e, kind, message)
    })?;

    info!(
        "Recorded P{} for driver #{} in '{}'",
        result.position, driver.number, race.name
    );
    Ok(result)
}

fn already_classified(number: i32, race_name: &str) -> ChampionshipError {
    ChampionshipError::conflict(
        ConflictKind::DriverAlreadyClassified,
        format!("Driver #{} already has a result in '{}'.", number, race_name),
    )
}

fn position_occupied(position: i32, race_name: &str) -> ChampionshipError {
    ChampionshipError::conflict(
        ConflictKind::PositionOccupied,
        format!("Position {} is already taken in '{}'.", position, race_name),
    )
}

/// Classification of a race, ordered by position ascending.
///
/// Each row carries the driver's name and number and the name of the team
/// the driver currently belongs to.
pub async fn list_race_results<R: FullRepository + ?Sized>(
    repo: &R,
    race_id: RaceId,
) -> ChampionshipResult<Vec<RaceResultRow>> {
    if repo.get_race(race_id).await?.is_none() {
        return Err(ChampionshipError::not_found(format!(
            "Race {} not found.",
            race_id
        )));
    }

    let mut results = repo.list_results_for_race(race_id).await?;
    results.sort_by_key(|r| r.position);

    let drivers: HashMap<_, _> = repo
        .list_drivers()
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();
    let teams: HashMap<_, _> = repo
        .list_teams()
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();

    Ok(results
        .into_iter()
        .filter_map(|r| {
            let driver = drivers.get(&r.driver_id)?;
            Some(RaceResultRow {
                id: r.id,
                position: r.position,
                points: points_for_position(r.position),
                driver_id: driver.id,
                driver: driver.name.clone(),
                number: driver.number,
                team: driver.team_id.and_then(|id| teams.get(&id).cloned()),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Driver, NewDriver, NewRace, NewTeam, Race, Team, TeamId};
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{
        DriverRepository, RaceRepository, RepositoryResult, ResultRepository, TeamRepository,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;

    /// Store that yields to the scheduler before every call, so concurrent
    /// requests interleave between their checks and their insert. With
    /// `blind_results` set, result lookups never see an existing row.
    struct Interleaved {
        inner: LocalRepository,
        blind_results: bool,
    }

    #[async_trait]
    impl TeamRepository for Interleaved {
        async fn insert_team(&self, team: &NewTeam) -> RepositoryResult<Team> {
            tokio::task::yield_now().await;
            self.inner.insert_team(team).await
        }
        async fn list_teams(&self) -> RepositoryResult<Vec<Team>> {
            tokio::task::yield_now().await;
            self.inner.list_teams().await
        }
        async fn get_team(&self, team_id: TeamId) -> RepositoryResult<Option<Team>> {
            tokio::task::yield_now().await;
            self.inner.get_team(team_id).await
        }
        async fn find_team_by_name(&self, name: &str) -> RepositoryResult<Option<Team>> {
            tokio::task::yield_now().await;
            self.inner.find_team_by_name(name).await
        }
        async fn update_team(
            &self,
            team_id: TeamId,
            team: &NewTeam,
        ) -> RepositoryResult<Option<Team>> {
            tokio::task::yield_now().await;
            self.inner.update_team(team_id, team).await
        }
        async fn delete_team(&self, team_id: TeamId) -> RepositoryResult<Option<Team>> {
            tokio::task::yield_now().await;
            self.inner.delete_team(team_id).await
        }
    }

    #[async_trait]
    impl DriverRepository for Interleaved {
        async fn insert_driver(&self, driver: &NewDriver) -> RepositoryResult<Driver> {
            tokio::task::yield_now().await;
            self.inner.insert_driver(driver).await
        }
        async fn list_drivers(&self) -> RepositoryResult<Vec<Driver>> {
            tokio::task::yield_now().await;
            self.inner.list_drivers().await
        }
        async fn get_driver(&self, driver_id: DriverId) -> RepositoryResult<Option<Driver>> {
            tokio::task::yield_now().await;
            self.inner.get_driver(driver_id).await
        }
        async fn find_driver_by_number(&self, number: i32) -> RepositoryResult<Option<Driver>> {
            tokio::task::yield_now().await;
            self.inner.find_driver_by_number(number).await
        }
        async fn list_drivers_for_team(&self, team_id: TeamId) -> RepositoryResult<Vec<Driver>> {
            tokio::task::yield_now().await;
            self.inner.list_drivers_for_team(team_id).await
        }
        async fn update_driver(
            &self,
            driver_id: DriverId,
            driver: &NewDriver,
        ) -> RepositoryResult<Option<Driver>> {
            tokio::task::yield_now().await;
            self.inner.update_driver(driver_id, driver).await
        }
        async fn delete_driver(&self, driver_id: DriverId) -> RepositoryResult<Option<Driver>> {
            tokio::task::yield_now().await;
            self.inner.delete_driver(driver_id).await
        }
    }

    #[async_trait]
    impl RaceRepository for Interleaved {
        async fn insert_race(&self, race: &NewRace) -> RepositoryResult<Race> {
            tokio::task::yield_now().await;
            self.inner.insert_race(race).await
        }
        async fn list_races(&self) -> RepositoryResult<Vec<Race>> {
            tokio::task::yield_now().await;
            self.inner.list_races().await
        }
        async fn get_race(&self, race_id: RaceId) -> RepositoryResult<Option<Race>> {
            tokio::task::yield_now().await;
            self.inner.get_race(race_id).await
        }
    }

    #[async_trait]
    impl ResultRepository for Interleaved {
        async fn insert_result(&self, result: &ResultRecord) -> RepositoryResult<RaceResult> {
            tokio::task::yield_now().await;
            self.inner.insert_result(result).await
        }
        async fn list_results(&self) -> RepositoryResult<Vec<RaceResult>> {
            tokio::task::yield_now().await;
            self.inner.list_results().await
        }
        async fn list_results_for_race(
            &self,
            race_id: RaceId,
        ) -> RepositoryResult<Vec<RaceResult>> {
            tokio::task::yield_now().await;
            self.inner.list_results_for_race(race_id).await
        }
        async fn find_result_for_driver(
            &self,
            race_id: RaceId,
            driver_id: DriverId,
        ) -> RepositoryResult<Option<RaceResult>> {
            tokio::task::yield_now().await;
            if self.blind_results {
                return Ok(None);
            }
            self.inner.find_result_for_driver(race_id, driver_id).await
        }
        async fn find_result_at_position(
            &self,
            race_id: RaceId,
            position: i32,
        ) -> RepositoryResult<Option<RaceResult>> {
            tokio::task::yield_now().await;
            if self.blind_results {
                return Ok(None);
            }
            self.inner.find_result_at_position(race_id, position).await
        }
    }

    #[async_trait]
    impl FullRepository for Interleaved {
        async fn health_check(&self) -> RepositoryResult<bool> {
            self.inner.health_check().await
        }
    }

    struct Fixture {
        repo: LocalRepository,
        race: Race,
        max: Driver,
        checo: Driver,
    }

    async fn fixture() -> Fixture {
        let repo = LocalRepository::new();
        let team = repo
            .insert_team(&NewTeam {
                name: "Red Bull".into(),
                country: "Austria".into(),
                constructor_championships: 6,
            })
            .await
            .unwrap();
        let mut drivers = Vec::new();
        for (name, number) in [("Max", 1), ("Checo", 11)] {
            drivers.push(
                repo.insert_driver(&NewDriver {
                    name: name.into(),
                    number,
                    nationality: "n/a".into(),
                    driver_championships: 0,
                    team_id: Some(team.id),
                })
                .await
                .unwrap(),
            );
        }
        let race = repo
            .insert_race(&NewRace {
                name: "Monaco GP".into(),
                country: "Monaco".into(),
                date: NaiveDate::from_ymd_opt(2024, 5, 26).unwrap(),
            })
            .await
            .unwrap();
        let checo = drivers.pop().unwrap();
        let max = drivers.pop().unwrap();
        Fixture {
            repo,
            race,
            max,
            checo,
        }
    }

    fn entry(number: i32, race_id: RaceId, position: i32) -> NewRaceResult {
        NewRaceResult {
            driver_number: Some(number),
            race_id: Some(race_id),
            position: Some(position),
        }
    }

    #[tokio::test]
    async fn test_missing_or_zero_fields_rejected() {
        let f = fixture().await;
        let cases = [
            NewRaceResult::default(),
            NewRaceResult {
                position: Some(0),
                ..entry(1, f.race.id, 1)
            },
            NewRaceResult {
                race_id: None,
                ..entry(1, f.race.id, 1)
            },
            NewRaceResult {
                driver_number: Some(0),
                ..entry(1, f.race.id, 1)
            },
            NewRaceResult {
                position: Some(-3),
                ..entry(1, f.race.id, 1)
            },
        ];
        for case in cases {
            let err = record_result(&f.repo, &case).await.unwrap_err();
            assert!(matches!(err, ChampionshipError::Validation(_)), "{case:?}");
        }
        assert_eq!(f.repo.result_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_driver_then_unknown_race() {
        let f = fixture().await;
        let err = record_result(&f.repo, &entry(99, RaceId(99), 1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Driver #99"));

        let err = record_result(&f.repo, &entry(1, RaceId(99), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ChampionshipError::NotFound(_)));
        assert!(err.to_string().contains("Race 99"));
    }

    #[tokio::test]
    async fn test_driver_cannot_be_classified_twice() {
        let f = fixture().await;
        record_result(&f.repo, &entry(1, f.race.id, 1)).await.unwrap();
        let err = record_result(&f.repo, &entry(1, f.race.id, 2))
            .await
            .unwrap_err();
        assert_eq!(
            err.conflict_kind(),
            Some(ConflictKind::DriverAlreadyClassified)
        );
    }

    #[tokio::test]
    async fn test_position_cannot_be_shared() {
        let f = fixture().await;
        record_result(&f.repo, &entry(1, f.race.id, 1)).await.unwrap();
        let err = record_result(&f.repo, &entry(11, f.race.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::PositionOccupied));
        assert!(err.to_string().contains("Position 1"));
    }

    #[tokio::test]
    async fn test_store_collision_on_driver_key_is_already_classified() {
        let f = fixture().await;
        let repo = Interleaved {
            inner: f.repo,
            blind_results: true,
        };
        record_result(&repo, &entry(1, f.race.id, 1)).await.unwrap();

        let err = record_result(&repo, &entry(1, f.race.id, 2))
            .await
            .unwrap_err();
        assert_eq!(
            err.conflict_kind(),
            Some(ConflictKind::DriverAlreadyClassified)
        );
        assert!(err.to_string().contains("Driver #1"));

        let err = record_result(&repo, &entry(11, f.race.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::PositionOccupied));
        assert_eq!(repo.inner.result_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_results_for_same_driver() {
        let f = fixture().await;
        let repo = Interleaved {
            inner: f.repo,
            blind_results: false,
        };
        let entry_a = entry(1, f.race.id, 1);
        let entry_b = entry(1, f.race.id, 2);
        let (first, second) = tokio::join!(
            record_result(&repo, &entry_a),
            record_result(&repo, &entry_b),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let err = outcomes.into_iter().find_map(|r| r.err()).unwrap();
        assert_eq!(
            err.conflict_kind(),
            Some(ConflictKind::DriverAlreadyClassified)
        );
        assert_eq!(repo.inner.result_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_results_for_same_position() {
        let f = fixture().await;
        let repo = Interleaved {
            inner: f.repo,
            blind_results: false,
        };
        let entry_a = entry(1, f.race.id, 1);
        let entry_b = entry(11, f.race.id, 1);
        let (first, second) = tokio::join!(
            record_result(&repo, &entry_a),
            record_result(&repo, &entry_b),
        );

        let err = first.err().or(second.err()).unwrap();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::PositionOccupied));
        assert_eq!(repo.inner.result_count(), 1);
    }

    #[tokio::test]
    async fn test_positions_beyond_points_are_accepted() {
        let f = fixture().await;
        let result = record_result(&f.repo, &entry(11, f.race.id, 23))
            .await
            .unwrap();
        assert_eq!(result.position, 23);
        assert_eq!(result.driver_id, f.checo.id);
    }

    #[tokio::test]
    async fn test_race_results_enriched_and_sorted() {
        let f = fixture().await;
        record_result(&f.repo, &entry(11, f.race.id, 3)).await.unwrap();
        record_result(&f.repo, &entry(1, f.race.id, 1)).await.unwrap();

        let rows = list_race_results(&f.repo, f.race.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].driver_id, f.max.id);
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[0].points, 25);
        assert_eq!(rows[0].team.as_deref(), Some("Red Bull"));
        assert_eq!(rows[1].number, 11);
        assert_eq!(rows[1].points, 15);
    }

    #[tokio::test]
    async fn test_race_results_for_unknown_race() {
        let f = fixture().await;
        let err = list_race_results(&f.repo, RaceId(7)).await.unwrap_err();
        assert!(matches!(err, ChampionshipError::NotFound(_)));
    }
}
