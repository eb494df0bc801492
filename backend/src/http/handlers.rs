//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`crate::services`] for the championship rules.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use super::dto::{
    DeleteResponse, Driver, HealthResponse, NewDriver, NewRace, NewRaceResult, NewTeam, Race,
    RaceResult, RaceResultRow, StandingsRow, Team, TeamDetail,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{DriverId, RaceId, TeamId};
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verify the service is running and the store answers.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Teams
// =============================================================================

/// GET /v1/teams
///
/// All teams with their drivers embedded.
pub async fn list_teams(State(state): State<AppState>) -> HandlerResult<Vec<TeamDetail>> {
    Ok(Json(services::list_teams(state.repo()).await?))
}

/// POST /v1/teams
pub async fn create_team(
    State(state): State<AppState>,
    payload: Result<Json<NewTeam>, JsonRejection>,
) -> CreatedResult<Team> {
    let Json(request) = payload?;
    let team = services::create_team(state.repo(), &request).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// GET /v1/teams/{team_id}
pub async fn get_team(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
) -> HandlerResult<TeamDetail> {
    Ok(Json(services::get_team(state.repo(), TeamId::new(team_id)).await?))
}

/// PUT /v1/teams/{team_id}
pub async fn update_team(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
    payload: Result<Json<NewTeam>, JsonRejection>,
) -> HandlerResult<Team> {
    let Json(request) = payload?;
    Ok(Json(
        services::update_team(state.repo(), TeamId::new(team_id), &request).await?,
    ))
}

/// DELETE /v1/teams/{team_id}
///
/// The team's drivers are kept without a team.
pub async fn delete_team(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
) -> HandlerResult<DeleteResponse> {
    let team = services::delete_team(state.repo(), TeamId::new(team_id)).await?;
    Ok(Json(DeleteResponse {
        deleted: team.id.value(),
        message: format!("Team '{}' deleted.", team.name),
    }))
}

// =============================================================================
// Drivers
// =============================================================================

/// GET /v1/drivers
pub async fn list_drivers(State(state): State<AppState>) -> HandlerResult<Vec<Driver>> {
    Ok(Json(services::list_drivers(state.repo()).await?))
}

/// POST /v1/drivers
///
/// Subject to the roster rules: the team must exist and have a free seat,
/// and the race number must be unused.
pub async fn create_driver(
    State(state): State<AppState>,
    payload: Result<Json<NewDriver>, JsonRejection>,
) -> CreatedResult<Driver> {
    let Json(request) = payload?;
    let driver = services::create_driver(state.repo(), &request).await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

/// GET /v1/drivers/number/{number}
pub async fn get_driver_by_number(
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> HandlerResult<Driver> {
    Ok(Json(services::get_driver_by_number(state.repo(), number).await?))
}

/// PUT /v1/drivers/{driver_id}
pub async fn update_driver(
    State(state): State<AppState>,
    Path(driver_id): Path<i64>,
    payload: Result<Json<NewDriver>, JsonRejection>,
) -> HandlerResult<Driver> {
    let Json(request) = payload?;
    Ok(Json(
        services::update_driver(state.repo(), DriverId::new(driver_id), &request).await?,
    ))
}

/// DELETE /v1/drivers/{driver_id}
///
/// Removes the driver's results as well.
pub async fn delete_driver(
    State(state): State<AppState>,
    Path(driver_id): Path<i64>,
) -> HandlerResult<DeleteResponse> {
    let driver = services::delete_driver(state.repo(), DriverId::new(driver_id)).await?;
    Ok(Json(DeleteResponse {
        deleted: driver.id.value(),
        message: format!("Driver #{} '{}' deleted.", driver.number, driver.name),
    }))
}

// =============================================================================
// Races and results
// =============================================================================

/// GET /v1/races
pub async fn list_races(State(state): State<AppState>) -> HandlerResult<Vec<Race>> {
    Ok(Json(services::list_races(state.repo()).await?))
}

/// POST /v1/races
pub async fn create_race(
    State(state): State<AppState>,
    payload: Result<Json<NewRace>, JsonRejection>,
) -> CreatedResult<Race> {
    let Json(request) = payload?;
    let race = services::create_race(state.repo(), &request).await?;
    Ok((StatusCode::CREATED, Json(race)))
}

/// POST /v1/results
///
/// The driver is referenced by race number, the race by id.
pub async fn record_result(
    State(state): State<AppState>,
    payload: Result<Json<NewRaceResult>, JsonRejection>,
) -> CreatedResult<RaceResult> {
    let Json(request) = payload?;
    let result = services::record_result(state.repo(), &request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /v1/races/{race_id}/results
pub async fn list_race_results(
    State(state): State<AppState>,
    Path(race_id): Path<i64>,
) -> HandlerResult<Vec<RaceResultRow>> {
    Ok(Json(
        services::list_race_results(state.repo(), RaceId::new(race_id)).await?,
    ))
}

// =============================================================================
// Standings and reports
// =============================================================================

/// GET /v1/standings
pub async fn get_standings(State(state): State<AppState>) -> HandlerResult<Vec<StandingsRow>> {
    Ok(Json(services::driver_standings(state.repo()).await?))
}

/// GET /v1/reports/championship
///
/// Championship summary as a CSV attachment.
pub async fn championship_report(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let body = services::championship_csv(state.repo()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"championship.csv\"",
            ),
        ],
        body,
    ))
}
