#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use championship::api::{NewDriver, NewRace, NewTeam, TeamId};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on drop (including unwinding) and serializes
/// access to the process-wide environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn team(name: &str, country: &str) -> NewTeam {
    NewTeam {
        name: name.to_string(),
        country: country.to_string(),
        constructor_championships: 0,
    }
}

pub fn driver(name: &str, number: i32, team_id: TeamId) -> NewDriver {
    NewDriver {
        name: name.to_string(),
        number,
        nationality: "Unknown".to_string(),
        driver_championships: 0,
        team_id: Some(team_id),
    }
}

pub fn race(name: &str, country: &str) -> NewRace {
    NewRace {
        name: name.to_string(),
        country: country.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 5, 26).unwrap(),
    }
}
