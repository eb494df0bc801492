//! Error taxonomy of the championship rules.

use crate::db::repository::RepositoryError;

/// Result type for service operations.
pub type ChampionshipResult<T> = Result<T, ChampionshipError>;

/// Which uniqueness or capacity invariant a rejected mutation would break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The target team already has its two drivers.
    TeamAtCapacity,
    /// Another driver already races with this number.
    DuplicateRaceNumber,
    /// Another team already uses this name.
    DuplicateTeamName,
    /// The driver already has a result in this race.
    DriverAlreadyClassified,
    /// Another driver already holds this position in this race.
    PositionOccupied,
}

impl ConflictKind {
    /// Stable machine-readable code, used as the API error code.
    pub fn code(&self) -> &'static str {
        match self {
            ConflictKind::TeamAtCapacity => "TEAM_AT_CAPACITY",
            ConflictKind::DuplicateRaceNumber => "DUPLICATE_RACE_NUMBER",
            ConflictKind::DuplicateTeamName => "DUPLICATE_TEAM_NAME",
            ConflictKind::DriverAlreadyClassified => "DRIVER_ALREADY_CLASSIFIED",
            ConflictKind::PositionOccupied => "POSITION_OCCUPIED",
        }
    }
}

/// Error returned by every rule-engine and read-model operation.
///
/// `Validation`, `NotFound` and `Conflict` are client errors detected before
/// any write is issued. `Repository` wraps store failures unchanged.
/// `Report` covers output encoding failures of the CSV export.
#[derive(Debug, thiserror::Error)]
pub enum ChampionshipError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { kind: ConflictKind, message: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Failed to render report: {0}")]
    Report(String),
}

impl ChampionshipError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(kind: ConflictKind, message: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            message: message.into(),
        }
    }

    /// The conflict kind, if this is a conflict.
    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            Self::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub(crate) fn report(err: impl std::fmt::Display) -> Self {
        Self::Report(err.to_string())
    }

    /// Map a store-level unique violation to the conflict it represents.
    ///
    /// Under concurrent writers a second request can pass the rule engine and
    /// still collide with the store's unique constraints; that collision is
    /// reported as the same conflict the rule engine would have raised.
    pub(crate) fn from_store(err: RepositoryError, kind: ConflictKind, message: String) -> Self {
        match err {
            RepositoryError::UniqueViolation { .. } => Self::conflict(kind, message),
            other => Self::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::ErrorContext;

    #[test]
    fn test_conflict_display_is_the_message() {
        let err = ChampionshipError::conflict(
            ConflictKind::DuplicateRaceNumber,
            "A driver with number 44 already exists.",
        );
        assert_eq!(err.to_string(), "A driver with number 44 already exists.");
        assert_eq!(err.conflict_kind(), Some(ConflictKind::DuplicateRaceNumber));
    }

    #[test]
    fn test_from_store_maps_unique_violation_only() {
        let unique = RepositoryError::unique_violation("dup", ErrorContext::default());
        let err = ChampionshipError::from_store(
            unique,
            ConflictKind::PositionOccupied,
            "taken".into(),
        );
        assert_eq!(err.conflict_kind(), Some(ConflictKind::PositionOccupied));

        let other = RepositoryError::connection("down");
        let err = ChampionshipError::from_store(other, ConflictKind::PositionOccupied, "x".into());
        assert!(matches!(err, ChampionshipError::Repository(_)));
    }

    #[test]
    fn test_codes_are_distinct() {
        let kinds = [
            ConflictKind::TeamAtCapacity,
            ConflictKind::DuplicateRaceNumber,
            ConflictKind::DuplicateTeamName,
            ConflictKind::DriverAlreadyClassified,
            ConflictKind::PositionOccupied,
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), kinds.len());
    }
}
