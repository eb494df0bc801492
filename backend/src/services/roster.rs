//! Roster rules: who may race for which team, and with which number.
//!
//! Two invariants are guarded here:
//! - a team never has more than [`TEAM_CAPACITY`] drivers;
//! - a race number belongs to at most one driver.
//!
//! Checks run in a fixed order and the first failure is reported. They are a
//! check-then-act sequence against the store with no enclosing transaction.

use log::{debug, info};

use super::error::{ChampionshipError, ChampionshipResult, ConflictKind};
use super::validation::validate_driver;
use crate::api::{Driver, DriverId, NewDriver, Team, TeamId};
use crate::db::repository::FullRepository;

/// Maximum number of drivers a team may field.
pub const TEAM_CAPACITY: usize = 2;

fn require_team_reference(candidate: &NewDriver) -> ChampionshipResult<TeamId> {
    match candidate.team_id {
        Some(team_id) if team_id.value() > 0 => Ok(team_id),
        _ => Err(ChampionshipError::validation(
            "A valid team must be selected for the driver.",
        )),
    }
}

async fn resolve_team<R: FullRepository + ?Sized>(
    repo: &R,
    team_id: TeamId,
) -> ChampionshipResult<Team> {
    repo.get_team(team_id)
        .await?
        .ok_or_else(|| ChampionshipError::not_found(format!("Team {} does not exist.", team_id)))
}

/// Fail if `team` already fields [`TEAM_CAPACITY`] drivers other than `exclude`.
async fn ensure_team_has_seat<R: FullRepository + ?Sized>(
    repo: &R,
    team: &Team,
    exclude: Option<DriverId>,
) -> ChampionshipResult<()> {
    let seated = repo
        .list_drivers_for_team(team.id)
        .await?
        .into_iter()
        .filter(|d| Some(d.id) != exclude)
        .count();

    if seated >= TEAM_CAPACITY {
        debug!(
            "Rejecting driver for team {}: {} seats taken",
            team.id, seated
        );
        return Err(ChampionshipError::conflict(
            ConflictKind::TeamAtCapacity,
            format!(
                "Team '{}' already has {} registered drivers.",
                team.name, TEAM_CAPACITY
            ),
        ));
    }
    Ok(())
}

fn duplicate_number(number: i32) -> ChampionshipError {
    ChampionshipError::conflict(
        ConflictKind::DuplicateRaceNumber,
        format!("A driver with number {} already exists.", number),
    )
}

/// Fail if a driver other than `exclude` already races with `number`.
async fn ensure_number_free<R: FullRepository + ?Sized>(
    repo: &R,
    number: i32,
    exclude: Option<DriverId>,
) -> ChampionshipResult<()> {
    match repo.find_driver_by_number(number).await? {
        Some(holder) if Some(holder.id) != exclude => {
            debug!("Rejecting number {}: held by driver {}", number, holder.id);
            Err(duplicate_number(number))
        }
        _ => Ok(()),
    }
}

/// Register a new driver.
///
/// Order of checks:
/// 1. payload fields, then a team reference must be present (`Validation`);
/// 2. the team must exist (`NotFound`);
/// 3. the team must have a free seat (`Conflict(TeamAtCapacity)`);
/// 4. the race number must be free (`Conflict(DuplicateRaceNumber)`).
pub async fn create_driver<R: FullRepository + ?Sized>(
    repo: &R,
    candidate: &NewDriver,
) -> ChampionshipResult<Driver> {
    validate_driver(candidate)?;
    let team_id = require_team_reference(candidate)?;
    let team = resolve_team(repo, team_id).await?;
    ensure_team_has_seat(repo, &team, None).await?;
    ensure_number_free(repo, candidate.number, None).await?;

    let driver = repo
        .insert_driver(candidate)
        .await
        .map_err(|e| {
            ChampionshipError::from_store(
                e,
                ConflictKind::DuplicateRaceNumber,
                duplicate_number(candidate.number).to_string(),
            )
        })?;

    info!(
        "Registered driver #{} '{}' for team '{}'",
        driver.number, driver.name, team.name
    );
    Ok(driver)
}

/// Overwrite a driver, possibly moving them to another team.
///
/// The driver must exist (`NotFound`); then the same checks as
/// [`create_driver`] apply, with the driver itself left out of the seat count
/// and of the number-holder lookup.
pub async fn update_driver<R: FullRepository + ?Sized>(
    repo: &R,
    driver_id: DriverId,
    candidate: &NewDriver,
) -> ChampionshipResult<Driver> {
    validate_driver(candidate)?;
    if repo.get_driver(driver_id).await?.is_none() {
        return Err(driver_not_found(driver_id));
    }
    let team_id = require_team_reference(candidate)?;
    let team = resolve_team(repo, team_id).await?;
    ensure_team_has_seat(repo, &team, Some(driver_id)).await?;
    ensure_number_free(repo, candidate.number, Some(driver_id)).await?;

    let driver = repo
        .update_driver(driver_id, candidate)
        .await
        .map_err(|e| {
            ChampionshipError::from_store(
                e,
                ConflictKind::DuplicateRaceNumber,
                duplicate_number(candidate.number).to_string(),
            )
        })?
        .ok_or_else(|| driver_not_found(driver_id))?;

    info!("Updated driver {} (#{})", driver.id, driver.number);
    Ok(driver)
}

fn driver_not_found(driver_id: DriverId) -> ChampionshipError {
    ChampionshipError::not_found(format!("Driver {} not found.", driver_id))
}

pub async fn list_drivers<R: FullRepository + ?Sized>(repo: &R) -> ChampionshipResult<Vec<Driver>> {
    Ok(repo.list_drivers().await?)
}

pub async fn get_driver_by_number<R: FullRepository + ?Sized>(
    repo: &R,
    number: i32,
) -> ChampionshipResult<Driver> {
    repo.find_driver_by_number(number)
        .await?
        .ok_or_else(|| ChampionshipError::not_found(format!("No driver with number {}.", number)))
}

/// Delete a driver. Their results are removed with them.
pub async fn delete_driver<R: FullRepository + ?Sized>(
    repo: &R,
    driver_id: DriverId,
) -> ChampionshipResult<Driver> {
    let driver = repo
        .delete_driver(driver_id)
        .await?
        .ok_or_else(|| driver_not_found(driver_id))?;
    info!("Deleted driver {} (#{})", driver.id, driver.number);
    Ok(driver)
}
