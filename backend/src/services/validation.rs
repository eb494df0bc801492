//! Structural validation of incoming payloads.
//!
//! These checks run before any store access: blank text fields, non-positive
//! race numbers and negative championship counts are rejected with
//! [`ChampionshipError::Validation`].

use super::error::{ChampionshipError, ChampionshipResult};
use crate::api::{NewDriver, NewRace, NewTeam};

fn require_text(field: &str, value: &str) -> ChampionshipResult<()> {
    if value.trim().is_empty() {
        return Err(ChampionshipError::validation(format!(
            "Field '{}' must not be empty.",
            field
        )));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: i32) -> ChampionshipResult<()> {
    if value < 0 {
        return Err(ChampionshipError::validation(format!(
            "Field '{}' must be zero or greater, got {}.",
            field, value
        )));
    }
    Ok(())
}

pub fn validate_team(team: &NewTeam) -> ChampionshipResult<()> {
    require_text("name", &team.name)?;
    require_text("country", &team.country)?;
    require_non_negative("constructor_championships", team.constructor_championships)
}

/// Field checks for a driver payload. The team reference is checked by the
/// roster rules, not here.
pub fn validate_driver(driver: &NewDriver) -> ChampionshipResult<()> {
    require_text("name", &driver.name)?;
    if driver.number <= 0 {
        return Err(ChampionshipError::validation(format!(
            "Field 'number' must be a positive integer, got {}.",
            driver.number
        )));
    }
    require_text("nationality", &driver.nationality)?;
    require_non_negative("driver_championships", driver.driver_championships)
}

pub fn validate_race(race: &NewRace) -> ChampionshipResult<()> {
    require_text("name", &race.name)?;
    require_text("country", &race.country)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn driver() -> NewDriver {
        NewDriver {
            name: "Lewis Hamilton".into(),
            number: 44,
            nationality: "United Kingdom".into(),
            driver_championships: 7,
            team_id: None,
        }
    }

    #[test]
    fn test_valid_driver_passes_without_team() {
        assert!(validate_driver(&driver()).is_ok());
    }

    #[test]
    fn test_driver_number_must_be_positive() {
        for number in [0, -44] {
            let err = validate_driver(&NewDriver { number, ..driver() }).unwrap_err();
            assert!(matches!(err, ChampionshipError::Validation(_)));
            assert!(err.to_string().contains("number"));
        }
    }

    #[test]
    fn test_blank_names_rejected() {
        let err = validate_driver(&NewDriver {
            name: "   ".into(),
            ..driver()
        })
        .unwrap_err();
        assert!(err.to_string().contains("'name'"));

        let err = validate_team(&NewTeam {
            name: "McLaren".into(),
            country: "".into(),
            constructor_championships: 8,
        })
        .unwrap_err();
        assert!(err.to_string().contains("'country'"));
    }

    #[test]
    fn test_negative_championships_rejected() {
        let err = validate_team(&NewTeam {
            name: "McLaren".into(),
            country: "United Kingdom".into(),
            constructor_championships: -1,
        })
        .unwrap_err();
        assert!(matches!(err, ChampionshipError::Validation(_)));
    }

    #[test]
    fn test_race_requires_name() {
        let race = NewRace {
            name: String::new(),
            country: "Monaco".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 26).unwrap(),
        };
        assert!(validate_race(&race).is_err());
    }
}
