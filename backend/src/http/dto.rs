//! Data Transfer Objects for the HTTP API.
//!
//! Entity and read-model types already derive Serialize/Deserialize and are
//! re-exported from [`crate::api`]; only the HTTP-specific envelopes live here.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    Driver, NewDriver, NewRace, NewRaceResult, NewTeam, Race, RaceResult, RaceResultRow,
    StandingsRow, Team, TeamDetail,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Store connection status
    pub database: String,
}

/// Acknowledgement for delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: i64,
    pub message: String,
}
