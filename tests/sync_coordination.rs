mod support;

use std::sync::Arc;

use anyhow::Result;
use secrecy::SecretString;
use stockfolio::portfolio::{PortfolioStore, SharedStore};
use stockfolio::session::SessionManager;
use stockfolio::storage::{MemoryStore, PersistenceSource};
use stockfolio::sync::{CommitStatus, SyncCoordinator};
use support::{holding, RecordingRemote, UnreachableRemote};

async fn admin_session() -> Result<(SharedStore, Arc<MemoryStore>)> {
    let mem = Arc::new(MemoryStore::new());
    let store = PortfolioStore::shared();
    let manager = SessionManager::new(mem.clone(), mem.clone(), store.clone());
    manager.login("admin", SecretString::from("admin")).await?;
    Ok((store, mem))
}

#[tokio::test]
async fn failed_commits_keep_the_optimistic_change() -> Result<()> {
    let (store, _) = admin_session().await?;
    let coordinator = SyncCoordinator::new(store.clone(), Arc::new(UnreachableRemote));

    let outcome = coordinator.create_portfolio("Dividends").await?;
    assert!(!outcome.is_committed());
    assert!(matches!(outcome.commit, CommitStatus::FailedKept { .. }));
    assert!(outcome
        .commit
        .cause()
        .expect("failed commits carry a cause")
        .contains("connection refused"));

    let guard = store.lock().await;
    let user = guard.user().expect("session should remain open");
    assert_eq!(user.portfolios.len(), 3);
    assert!(user.portfolios.iter().any(|p| p.name == "Dividends"));
    Ok(())
}

#[tokio::test]
async fn rollback_mode_restores_the_prior_state() -> Result<()> {
    let (store, _) = admin_session().await?;
    let before = store.lock().await.snapshot();

    let coordinator = SyncCoordinator::new(store.clone(), Arc::new(UnreachableRemote))
        .with_rollback_on_failure(true);
    let outcome = coordinator.upsert_holding(1, holding("NVDA", 3, 700)).await?;
    assert!(matches!(outcome.commit, CommitStatus::FailedRolledBack { .. }));

    assert_eq!(store.lock().await.snapshot(), before);
    Ok(())
}

#[tokio::test]
async fn commits_arrive_in_issuance_order() -> Result<()> {
    let (store, _) = admin_session().await?;
    let remote = Arc::new(RecordingRemote::new());
    let coordinator = SyncCoordinator::new(store.clone(), remote.clone());

    coordinator.create_portfolio("Growth").await?;
    coordinator.upsert_holding(1, holding("NVDA", 3, 700)).await?;
    coordinator.upsert_holding(2, holding("V", 4, 230)).await?;
    coordinator.remove_holding(1, "NVDA").await?;
    coordinator.delete_portfolio(2).await?;

    assert_eq!(
        remote.calls(),
        vec![
            "create Growth".to_string(),
            "upsert NVDA in 1".to_string(),
            "upsert V in 2".to_string(),
            "remove NVDA from 1".to_string(),
            "delete portfolio 2".to_string(),
        ]
    );

    // The id the backend assigned replaced the locally guessed one.
    let guard = store.lock().await;
    let user = guard.user().expect("session should remain open");
    assert!(user.portfolio(101).is_some());
    assert_eq!(user.portfolios.len(), 2);
    Ok(())
}

#[tokio::test]
async fn validation_failures_never_reach_the_backend() -> Result<()> {
    let (store, _) = admin_session().await?;
    let remote = Arc::new(RecordingRemote::new());
    let coordinator = SyncCoordinator::new(store, remote.clone());

    let err = coordinator.create_portfolio("   ").await.unwrap_err();
    assert!(err.is_validation());
    assert!(remote.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn committed_mutations_update_the_persisted_snapshot() -> Result<()> {
    let (store, mem) = admin_session().await?;
    let coordinator = SyncCoordinator::new(store, mem.clone());

    coordinator.upsert_holding(1, holding("NVDA", 3, 700)).await?;

    let snapshot = mem
        .load_session()
        .await?
        .expect("snapshot should be written");
    let tech = snapshot.portfolio(1).expect("seeded portfolio");
    assert!(tech.holdings.iter().any(|h| h.symbol == "NVDA"));
    Ok(())
}
