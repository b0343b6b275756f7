use parking_lot::RwLock;
use tracing_test::traced_test;

use crate::Error;
use crate::MembershipError;
use crate::membership::ConfigReconciler;
use crate::membership::ConfigState;
use crate::storage::Journal;
use crate::storage::MemJournal;
use crate::test_utils::EntryBuilder;
use crate::test_utils::commands;

fn voters(config: &RwLock<ConfigState>) -> Vec<String> {
    config.read().voters().to_vec()
}

/// Test: truncating an uncommitted config change rolls the live config back
///
/// Scenario: journal tail [commit..max) holds a config entry; a truncation
/// is about to start below it
/// Expected: voters revert to the entry's old set
#[tokio::test]
#[traced_test]
async fn test_rollback_restores_previous_voters() {
    let journal = MemJournal::new();
    let entries = EntryBuilder::new(1)
        .command(b"a")
        .command(b"b")
        .term(2)
        .config(&["a"], &["a", "b"])
        .command(b"c")
        .build();
    journal.compare_or_append(entries, 0).await.expect("seed");
    journal.commit(1).await.expect("commit");

    let config = RwLock::new(ConfigState::new(vec!["a".to_string(), "b".to_string()]));
    let reconciler = ConfigReconciler::new();
    reconciler
        .maybe_rollback_config(2, &journal, &config)
        .expect("rollback should succeed");

    assert_eq!(voters(&config), vec!["a".to_string()]);
    assert!(logs_contain("rolling back uncommitted configuration change"));
}

#[tokio::test]
async fn test_no_rollback_when_config_entry_is_committed() {
    let journal = MemJournal::new();
    let entries = EntryBuilder::new(1)
        .config(&["a"], &["a", "b"])
        .command(b"x")
        .command(b"y")
        .build();
    journal.compare_or_append(entries, 0).await.expect("seed");
    journal.commit(2).await.expect("commit");

    let config = RwLock::new(ConfigState::new(vec!["a".to_string(), "b".to_string()]));
    let reconciler = ConfigReconciler::new();
    // Truncation starts at 1, but the config entry at 0 is committed and can
    // never be dropped.
    reconciler
        .maybe_rollback_config(1, &journal, &config)
        .expect("no-op rollback");

    assert_eq!(voters(&config), vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_no_rollback_without_config_entries() {
    let journal = MemJournal::new();
    journal.compare_or_append(commands(1, 3), 0).await.expect("seed");

    let config = RwLock::new(ConfigState::new(vec!["a".to_string()]));
    let before = config.read().epoch();
    ConfigReconciler::new()
        .maybe_rollback_config(1, &journal, &config)
        .expect("no-op rollback");

    assert_eq!(config.read().epoch(), before, "config must be untouched");
}

#[tokio::test]
async fn test_multiple_pending_changes_is_an_error() {
    let journal = MemJournal::new();
    let entries = EntryBuilder::new(2)
        .config(&["a"], &["a", "b"])
        .config(&["a", "b"], &["a", "b", "c"])
        .build();
    journal.compare_or_append(entries, 0).await.expect("seed");

    let config = RwLock::new(ConfigState::default());
    let result = ConfigReconciler::new().maybe_rollback_config(0, &journal, &config);
    assert!(matches!(
        result,
        Err(Error::Membership(MembershipError::MultiplePendingChanges))
    ));
}

#[test]
fn test_update_applies_config_entries_in_order() {
    let entries = EntryBuilder::new(2)
        .command(b"x")
        .config(&["a"], &["a", "b"])
        .config(&["a", "b"], &["a", "b", "c"])
        .build();

    let config = RwLock::new(ConfigState::new(vec!["a".to_string()]));
    ConfigReconciler::new()
        .maybe_update_non_leader_config(&entries, &config)
        .expect("update");

    assert_eq!(
        voters(&config),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
    assert_eq!(config.read().epoch(), 2);
}

#[test]
fn test_update_ignores_command_entries() {
    let config = RwLock::new(ConfigState::new(vec!["a".to_string()]));
    ConfigReconciler::new()
        .maybe_update_non_leader_config(&commands(1, 2), &config)
        .expect("update");

    assert_eq!(config.read().epoch(), 0);
}
