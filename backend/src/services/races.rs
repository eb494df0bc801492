//! Race calendar.

use log::info;

use super::error::ChampionshipResult;
use super::validation::validate_race;
use crate::api::{NewRace, Race};
use crate::db::repository::FullRepository;

pub async fn create_race<R: FullRepository + ?Sized>(
    repo: &R,
    candidate: &NewRace,
) -> ChampionshipResult<Race> {
    validate_race(candidate)?;
    let race = repo.insert_race(candidate).await?;
    info!("Created race {} '{}' on {}", race.id, race.name, race.date);
    Ok(race)
}

pub async fn list_races<R: FullRepository + ?Sized>(repo: &R) -> ChampionshipResult<Vec<Race>> {
    Ok(repo.list_races().await?)
}
