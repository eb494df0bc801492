//! Integration tests for the in-memory store.

mod support;

use championship::api::{DriverId, ResultRecord, TeamId};
use championship::db::repositories::LocalRepository;
use championship::db::repository::{
    DriverRepository, FullRepository, RaceRepository, RepositoryError, ResultRepository,
    TeamRepository, RESULT_RACE_DRIVER_KEY, RESULT_RACE_POSITION_KEY,
};
use championship::services::{self, ChampionshipError};
use support::{driver, race, team};

#[tokio::test]
async fn test_ids_are_monotonic_and_listing_is_ordered() {
    let repo = LocalRepository::new();
    let a = repo.insert_team(&team("Alpha", "A")).await.unwrap();
    let b = repo.insert_team(&team("Bravo", "B")).await.unwrap();
    repo.delete_team(a.id).await.unwrap();
    let c = repo.insert_team(&team("Charlie", "C")).await.unwrap();

    assert_eq!(a.id, TeamId(1));
    assert_eq!(b.id, TeamId(2));
    // ids are not reused after deletion
    assert_eq!(c.id, TeamId(3));

    let names: Vec<_> = repo
        .list_teams()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["Bravo", "Charlie"]);
}

#[tokio::test]
async fn test_store_rejects_duplicate_number_itself() {
    let repo = LocalRepository::new();
    let t = repo.insert_team(&team("Alpha", "A")).await.unwrap();
    repo.insert_driver(&driver("One", 7, t.id)).await.unwrap();

    let err = repo.insert_driver(&driver("Two", 7, t.id)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueViolation { .. }));
    assert_eq!(err.context().operation.as_deref(), Some("insert_driver"));
}

#[tokio::test]
async fn test_store_rejects_colliding_result() {
    let repo = LocalRepository::new();
    let t = repo.insert_team(&team("Alpha", "A")).await.unwrap();
    let one = repo.insert_driver(&driver("One", 1, t.id)).await.unwrap();
    let two = repo.insert_driver(&driver("Two", 2, t.id)).await.unwrap();
    let gp = repo.insert_race(&race("GP", "X")).await.unwrap();

    let record = |driver_id: DriverId, position: i32| ResultRecord {
        driver_id,
        race_id: gp.id,
        position,
    };
    repo.insert_result(&record(one.id, 1)).await.unwrap();

    let same_position = repo.insert_result(&record(two.id, 1)).await.unwrap_err();
    assert!(matches!(same_position, RepositoryError::UniqueViolation { .. }));
    assert_eq!(
        same_position.violated_constraint(),
        Some(RESULT_RACE_POSITION_KEY)
    );
    let same_driver = repo.insert_result(&record(one.id, 2)).await.unwrap_err();
    assert!(matches!(same_driver, RepositoryError::UniqueViolation { .. }));
    assert_eq!(same_driver.violated_constraint(), Some(RESULT_RACE_DRIVER_KEY));
    // driver key wins when both collide
    let both = repo.insert_result(&record(one.id, 1)).await.unwrap_err();
    assert_eq!(both.violated_constraint(), Some(RESULT_RACE_DRIVER_KEY));
    assert_eq!(repo.result_count(), 1);
}

#[tokio::test]
async fn test_unhealthy_store_surfaces_as_repository_error() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);

    assert!(!repo.health_check().await.unwrap());
    let err = services::create_team(&repo, &team("Alpha", "A"))
        .await
        .unwrap_err();
    match err {
        ChampionshipError::Repository(inner) => {
            assert!(inner.is_retryable());
            assert_eq!(inner.context().operation.as_deref(), Some("find_team_by_name"));
        }
        other => panic!("expected repository error, got {other:?}"),
    }

    repo.set_healthy(true);
    assert!(services::create_team(&repo, &team("Alpha", "A")).await.is_ok());
}

#[tokio::test]
async fn test_validation_runs_before_store_access() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);

    // a blank name is reported even though every store call would fail
    let err = services::create_team(&repo, &team("", "A")).await.unwrap_err();
    assert!(matches!(err, ChampionshipError::Validation(_)));
}

#[tokio::test]
async fn test_clear_resets_ids_and_data() {
    let repo = LocalRepository::new();
    let t = repo.insert_team(&team("Alpha", "A")).await.unwrap();
    repo.insert_driver(&driver("One", 1, t.id)).await.unwrap();

    repo.clear();
    assert_eq!(repo.team_count(), 0);
    assert_eq!(repo.driver_count(), 0);

    let again = repo.insert_team(&team("Alpha", "A")).await.unwrap();
    assert_eq!(again.id, TeamId(1));
}

#[tokio::test]
async fn test_results_for_race_sorted_by_position() {
    let repo = LocalRepository::new();
    let t = repo.insert_team(&team("Alpha", "A")).await.unwrap();
    let one = repo.insert_driver(&driver("One", 1, t.id)).await.unwrap();
    let two = repo.insert_driver(&driver("Two", 2, t.id)).await.unwrap();
    let gp = repo.insert_race(&race("GP", "X")).await.unwrap();
    let other = repo.insert_race(&race("Other GP", "Y")).await.unwrap();

    for (driver_id, race_id, position) in [
        (one.id, gp.id, 9),
        (two.id, gp.id, 2),
        (one.id, other.id, 1),
    ] {
        repo.insert_result(&ResultRecord {
            driver_id,
            race_id,
            position,
        })
        .await
        .unwrap();
    }

    let positions: Vec<_> = repo
        .list_results_for_race(gp.id)
        .await
        .unwrap()
        .iter()
        .map(|r| r.position)
        .collect();
    assert_eq!(positions, vec![2, 9]);
    assert!(repo
        .find_result_at_position(other.id, 1)
        .await
        .unwrap()
        .is_some());
    assert!(repo
        .find_result_for_driver(other.id, two.id)
        .await
        .unwrap()
        .is_none());
}
