//! Team management and the team listing with embedded drivers.

use log::{debug, info};

use super::error::{ChampionshipError, ChampionshipResult, ConflictKind};
use super::validation::validate_team;
use crate::api::{NewTeam, Team, TeamDetail, TeamId};
use crate::db::repository::FullRepository;

fn duplicate_name(name: &str) -> ChampionshipError {
    ChampionshipError::conflict(
        ConflictKind::DuplicateTeamName,
        format!("A team named '{}' already exists.", name),
    )
}

fn team_not_found(team_id: TeamId) -> ChampionshipError {
    ChampionshipError::not_found(format!("Team {} not found.", team_id))
}

/// Fail if a team other than `exclude` already uses `name`.
async fn ensure_name_free<R: FullRepository + ?Sized>(
    repo: &R,
    name: &str,
    exclude: Option<TeamId>,
) -> ChampionshipResult<()> {
    match repo.find_team_by_name(name).await? {
        Some(holder) if Some(holder.id) != exclude => {
            debug!("Rejecting team name '{}': held by team {}", name, holder.id);
            Err(duplicate_name(name))
        }
        _ => Ok(()),
    }
}

pub async fn create_team<R: FullRepository + ?Sized>(
    repo: &R,
    candidate: &NewTeam,
) -> ChampionshipResult<Team> {
    validate_team(candidate)?;
    ensure_name_free(repo, &candidate.name, None).await?;

    let team = repo.insert_team(candidate).await.map_err(|e| {
        ChampionshipError::from_store(
            e,
            ConflictKind::DuplicateTeamName,
            duplicate_name(&candidate.name).to_string(),
        )
    })?;
    info!("Created team {} '{}'", team.id, team.name);
    Ok(team)
}

/// All teams in id order, each with the drivers currently referencing it.
pub async fn list_teams<R: FullRepository + ?Sized>(
    repo: &R,
) -> ChampionshipResult<Vec<TeamDetail>> {
    let teams = repo.list_teams().await?;
    let drivers = repo.list_drivers().await?;

    Ok(teams
        .into_iter()
        .map(|team| {
            let drivers = drivers
                .iter()
                .filter(|d| d.team_id == Some(team.id))
                .cloned()
                .collect();
            TeamDetail { team, drivers }
        })
        .collect())
}

pub async fn get_team<R: FullRepository + ?Sized>(
    repo: &R,
    team_id: TeamId,
) -> ChampionshipResult<TeamDetail> {
    let team = repo
        .get_team(team_id)
        .await?
        .ok_or_else(|| team_not_found(team_id))?;
    let drivers = repo.list_drivers_for_team(team_id).await?;
    Ok(TeamDetail { team, drivers })
}

/// Overwrite a team. Renaming onto another team's name is a conflict.
pub async fn update_team<R: FullRepository + ?Sized>(
    repo: &R,
    team_id: TeamId,
    candidate: &NewTeam,
) -> ChampionshipResult<Team> {
    validate_team(candidate)?;
    if repo.get_team(team_id).await?.is_none() {
        return Err(team_not_found(team_id));
    }
    ensure_name_free(repo, &candidate.name, Some(team_id)).await?;

    let team = repo
        .update_team(team_id, candidate)
        .await
        .map_err(|e| {
            ChampionshipError::from_store(
                e,
                ConflictKind::DuplicateTeamName,
                duplicate_name(&candidate.name).to_string(),
            )
        })?
        .ok_or_else(|| team_not_found(team_id))?;
    info!("Updated team {} '{}'", team.id, team.name);
    Ok(team)
}

/// Delete a team. Its drivers are kept and lose their team reference.
pub async fn delete_team<R: FullRepository + ?Sized>(
    repo: &R,
    team_id: TeamId,
) -> ChampionshipResult<Team> {
    let team = repo
        .delete_team(team_id)
        .await?
        .ok_or_else(|| team_not_found(team_id))?;
    info!("Deleted team {} '{}'", team.id, team.name);
    Ok(team)
}
