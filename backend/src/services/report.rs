//! Championship summary export.
//!
//! The report is the driver standings extended with per-driver race
//! statistics, rendered as CSV with a header row.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{ChampionshipError, ChampionshipResult};
use super::standings::{compute_standings, StandingsRow};
use crate::api::{Driver, DriverId, RaceResult};
use crate::db::repository::FullRepository;

const HEADER: [&str; 10] = [
    "rank",
    "driver",
    "number",
    "nationality",
    "team",
    "races_classified",
    "wins",
    "podiums",
    "best_finish",
    "points",
];

/// One line of the championship report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub rank: usize,
    pub driver: String,
    pub number: i32,
    pub nationality: String,
    pub team: Option<String>,
    pub races_classified: u32,
    pub wins: u32,
    pub podiums: u32,
    /// Best finishing position, absent for drivers without results.
    pub best_finish: Option<i32>,
    pub points: u32,
}

#[derive(Default)]
struct DriverRecord {
    classified: u32,
    wins: u32,
    podiums: u32,
    best: Option<i32>,
}

/// Extend standings rows with statistics gathered from `results`.
pub fn build_report(
    standings: Vec<StandingsRow>,
    drivers: &[Driver],
    results: &[RaceResult],
) -> Vec<ReportRow> {
    let nationalities: HashMap<DriverId, &str> = drivers
        .iter()
        .map(|d| (d.id, d.nationality.as_str()))
        .collect();

    let mut records: HashMap<DriverId, DriverRecord> = HashMap::new();
    for result in results {
        let record = records.entry(result.driver_id).or_default();
        record.classified += 1;
        if result.position == 1 {
            record.wins += 1;
        }
        if result.position <= 3 {
            record.podiums += 1;
        }
        record.best = Some(record.best.map_or(result.position, |b| b.min(result.position)));
    }

    standings
        .into_iter()
        .map(|row| {
            let record = records.remove(&row.driver_id).unwrap_or_default();
            ReportRow {
                rank: row.rank,
                nationality: nationalities
                    .get(&row.driver_id)
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                driver: row.driver,
                number: row.number,
                team: row.team,
                races_classified: record.classified,
                wins: record.wins,
                podiums: record.podiums,
                best_finish: record.best,
                points: row.points,
            }
        })
        .collect()
}

/// Encode report rows as CSV bytes. The header is written even when there
/// are no rows.
pub fn write_csv(rows: &[ReportRow]) -> ChampionshipResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(HEADER)
        .map_err(ChampionshipError::report)?;
    for row in rows {
        writer.serialize(row).map_err(ChampionshipError::report)?;
    }
    writer
        .into_inner()
        .map_err(|e| ChampionshipError::report(e.error()))
}

/// Render the current championship as a CSV document.
pub async fn championship_csv<R: FullRepository + ?Sized>(repo: &R) -> ChampionshipResult<Vec<u8>> {
    let drivers = repo.list_drivers().await?;
    let teams = repo.list_teams().await?;
    let results = repo.list_results().await?;

    let standings = compute_standings(&drivers, &teams, &results);
    let rows = build_report(standings, &drivers, &results);
    log::debug!("Rendering championship report with {} rows", rows.len());
    write_csv(&rows)
}
