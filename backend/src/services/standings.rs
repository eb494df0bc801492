//! Driver championship table.
//!
//! Standings are recomputed from the stored results on every call; nothing
//! is cached between invocations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::ChampionshipResult;
use crate::api::{Driver, DriverId, RaceResult, Team};
use crate::db::repository::FullRepository;

/// Points awarded for positions 1 through 10. Any other position scores 0.
pub const POINTS_TABLE: [u32; 10] = [25, 18, 15, 12, 10, 8, 6, 4, 2, 1];

/// Points awarded for a finishing position.
pub fn points_for_position(position: i32) -> u32 {
    usize::try_from(position)
        .ok()
        .and_then(|p| p.checked_sub(1))
        .and_then(|idx| POINTS_TABLE.get(idx).copied())
        .unwrap_or(0)
}

/// One line of the driver championship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    /// 1-based position in the table.
    pub rank: usize,
    pub driver_id: DriverId,
    pub driver: String,
    pub number: i32,
    pub team: Option<String>,
    pub points: u32,
}

/// Build the championship table from plain listings.
///
/// Every driver gets a row, including drivers without results. Rows are
/// sorted by points descending with a stable sort, so equal totals keep the
/// order of `drivers`.
pub fn compute_standings(
    drivers: &[Driver],
    teams: &[Team],
    results: &[RaceResult],
) -> Vec<StandingsRow> {
    let team_names: HashMap<_, _> = teams.iter().map(|t| (t.id, t.name.as_str())).collect();

    let mut totals: HashMap<DriverId, u32> = HashMap::new();
    for result in results {
        *totals.entry(result.driver_id).or_default() += points_for_position(result.position);
    }

    let mut rows: Vec<StandingsRow> = drivers
        .iter()
        .map(|driver| StandingsRow {
            rank: 0,
            driver_id: driver.id,
            driver: driver.name.clone(),
            number: driver.number,
            team: driver
                .team_id
                .and_then(|id| team_names.get(&id))
                .map(|name| name.to_string()),
            points: totals.get(&driver.id).copied().unwrap_or(0),
        })
        .collect();

    // sort_by is stable
    rows.sort_by(|a, b| b.points.cmp(&a.points));
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx + 1;
    }
    rows
}

/// Current driver standings from the store.
pub async fn driver_standings<R: FullRepository + ?Sized>(
    repo: &R,
) -> ChampionshipResult<Vec<StandingsRow>> {
    let drivers = repo.list_drivers().await?;
    let teams = repo.list_teams().await?;
    let results = repo.list_results().await?;
    Ok(compute_standings(&drivers, &teams, &results))
}
