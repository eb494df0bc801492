//! Public API surface for the championship backend.
//!
//! This file consolidates the entity types and request payloads shared by the
//! repository layer, the rule engines and the HTTP API.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::services::report::ReportRow;
pub use crate::services::results::RaceResultRow;
pub use crate::services::standings::StandingsRow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(value: i64) -> Self {
                $name(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Team identifier (database primary key).
    TeamId
);
entity_id!(
    /// Driver identifier (database primary key).
    DriverId
);
entity_id!(
    /// Race identifier (database primary key).
    RaceId
);
entity_id!(
    /// Result identifier (database primary key).
    ResultId
);

/// A constructor ("escudería").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub country: String,
    pub constructor_championships: i32,
}

/// A competitor ("piloto").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    /// Race number, unique across all drivers.
    pub number: i32,
    pub nationality: String,
    pub driver_championships: i32,
    /// Owning team. Only `None` after the owning team was deleted.
    pub team_id: Option<TeamId>,
}

/// A championship event ("gran premio").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub name: String,
    pub country: String,
    pub date: NaiveDate,
}

/// A driver's finishing position in a race ("resultado").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceResult {
    pub id: ResultId,
    pub driver_id: DriverId,
    pub race_id: RaceId,
    pub position: i32,
}

/// Payload for creating or overwriting a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub constructor_championships: i32,
}

/// Payload for creating or overwriting a driver.
///
/// `team_id` is optional on the wire so that a missing team is reported as a
/// validation failure rather than a deserialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDriver {
    pub name: String,
    pub number: i32,
    pub nationality: String,
    #[serde(default)]
    pub driver_championships: i32,
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

/// Payload for creating a race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRace {
    pub name: String,
    pub country: String,
    pub date: NaiveDate,
}

/// Payload for recording a result.
///
/// The driver is referenced by race number, the race by identity. Missing
/// fields deserialize as `None` and are rejected by the rule engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRaceResult {
    #[serde(default)]
    pub driver_number: Option<i32>,
    #[serde(default)]
    pub race_id: Option<RaceId>,
    #[serde(default)]
    pub position: Option<i32>,
}

/// Store-level insert for a result once both references are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultRecord {
    pub driver_id: DriverId,
    pub race_id: RaceId,
    pub position: i32,
}

/// A team together with the drivers currently referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub drivers: Vec<Driver>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&TeamId::new(7)).unwrap();
        assert_eq!(json, "7");
        let id: RaceId = serde_json::from_str("12").unwrap();
        assert_eq!(id.value(), 12);
        assert_eq!(DriverId(3).to_string(), "3");
    }

    #[test]
    fn test_new_result_missing_fields_are_none() {
        let req: NewRaceResult = serde_json::from_str(r#"{"position": 1}"#).unwrap();
        assert_eq!(req.position, Some(1));
        assert!(req.driver_number.is_none());
        assert!(req.race_id.is_none());
    }

    #[test]
    fn test_new_driver_without_team_deserializes() {
        let req: NewDriver = serde_json::from_str(
            r#"{"name": "Max Verstappen", "number": 1, "nationality": "Netherlands"}"#,
        )
        .unwrap();
        assert!(req.team_id.is_none());
        assert_eq!(req.driver_championships, 0);
    }

    #[test]
    fn test_team_detail_flattens_team_fields() {
        let detail = TeamDetail {
            team: Team {
                id: TeamId(1),
                name: "Red Bull".into(),
                country: "Austria".into(),
                constructor_championships: 6,
            },
            drivers: vec![],
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["name"], "Red Bull");
        assert_eq!(value["id"], 1);
        assert!(value["drivers"].as_array().unwrap().is_empty());
    }
}
