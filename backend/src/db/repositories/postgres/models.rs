use chrono::NaiveDate;
use diesel::prelude::*;

use super::schema::{drivers, races, results, teams};
use crate::api::{
    Driver, DriverId, NewDriver, NewRace, NewTeam, Race, RaceId, RaceResult, ResultId,
    ResultRecord, Team, TeamId,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub constructor_championships: i32,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = teams)]
pub struct TeamChanges {
    pub name: String,
    pub country: String,
    pub constructor_championships: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = drivers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DriverRow {
    pub id: i64,
    pub name: String,
    pub number: i32,
    pub nationality: String,
    pub driver_championships: i32,
    pub team_id: Option<i64>,
}

/// `treat_none_as_null` so that an update always overwrites `team_id`.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = drivers)]
#[diesel(treat_none_as_null = true)]
pub struct DriverChanges {
    pub name: String,
    pub number: i32,
    pub nationality: String,
    pub driver_championships: i32,
    pub team_id: Option<i64>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = races)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RaceRow {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub race_date: NaiveDate,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = races)]
pub struct NewRaceRow {
    pub name: String,
    pub country: String,
    pub race_date: NaiveDate,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ResultRow {
    pub id: i64,
    pub driver_id: i64,
    pub race_id: i64,
    pub position: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = results)]
pub struct NewResultRow {
    pub driver_id: i64,
    pub race_id: i64,
    pub position: i32,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            id: TeamId(row.id),
            name: row.name,
            country: row.country,
            constructor_championships: row.constructor_championships,
        }
    }
}

impl From<&NewTeam> for TeamChanges {
    fn from(team: &NewTeam) -> Self {
        TeamChanges {
            name: team.name.clone(),
            country: team.country.clone(),
            constructor_championships: team.constructor_championships,
        }
    }
}

impl From<DriverRow> for Driver {
    fn from(row: DriverRow) -> Self {
        Driver {
            id: DriverId(row.id),
            name: row.name,
            number: row.number,
            nationality: row.nationality,
            driver_championships: row.driver_championships,
            team_id: row.team_id.map(TeamId),
        }
    }
}

impl From<&NewDriver> for DriverChanges {
    fn from(driver: &NewDriver) -> Self {
        DriverChanges {
            name: driver.name.clone(),
            number: driver.number,
            nationality: driver.nationality.clone(),
            driver_championships: driver.driver_championships,
            team_id: driver.team_id.map(|id| id.0),
        }
    }
}

impl From<RaceRow> for Race {
    fn from(row: RaceRow) -> Self {
        Race {
            id: RaceId(row.id),
            name: row.name,
            country: row.country,
            date: row.race_date,
        }
    }
}

impl From<&NewRace> for NewRaceRow {
    fn from(race: &NewRace) -> Self {
        NewRaceRow {
            name: race.name.clone(),
            country: race.country.clone(),
            race_date: race.date,
        }
    }
}

impl From<ResultRow> for RaceResult {
    fn from(row: ResultRow) -> Self {
        RaceResult {
            id: ResultId(row.id),
            driver_id: DriverId(row.driver_id),
            race_id: RaceId(row.race_id),
            position: row.position,
        }
    }
}

impl From<&ResultRecord> for NewResultRow {
    fn from(result: &ResultRecord) -> Self {
        NewResultRow {
            driver_id: result.driver_id.0,
            race_id: result.race_id.0,
            position: result.position,
        }
    }
}
