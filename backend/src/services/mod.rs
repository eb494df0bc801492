//! Championship rules and read models.
//!
//! Every operation takes a repository and returns a [`ChampionshipResult`].
//! This layer is the single place where roster, result and naming rules are
//! enforced; the HTTP layer only translates outcomes.

pub mod error;
pub mod races;
pub mod report;
pub mod results;
pub mod roster;
pub mod standings;
pub mod teams;
pub mod validation;

pub use error::{ChampionshipError, ChampionshipResult, ConflictKind};
pub use races::{create_race, list_races};
pub use report::championship_csv;
pub use results::{list_race_results, record_result};
pub use roster::{
    create_driver, delete_driver, get_driver_by_number, list_drivers, update_driver,
    TEAM_CAPACITY,
};
pub use standings::{driver_standings, points_for_position, POINTS_TABLE};
pub use teams::{create_team, delete_team, get_team, list_teams, update_team};
