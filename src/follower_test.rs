use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::Error;
use crate::LifecycleError;
use crate::follower::LifecycleState;
use crate::storage::Journal;
use crate::storage::SnapshotMeta;
use crate::test_utils::EntryBuilder;
use crate::test_utils::append_entries_request;
use crate::test_utils::commands;
use crate::test_utils::heartbeat;
use crate::test_utils::mem_fixture;

async fn wait_for_wakeups(
    counter: &Arc<AtomicUsize>,
    expected: usize,
) {
    for _ in 0..200 {
        if counter.load(Ordering::SeqCst) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "applier never reached {expected} wakeups, saw {}",
        counter.load(Ordering::SeqCst)
    );
}

/// Seeds the journal with terms [1, 1, 2].
async fn seed_three_entries(fixture: &crate::test_utils::MemFixture) {
    let entries = EntryBuilder::new(1).command(b"a").command(b"b").term(2).command(b"c").build();
    fixture.journal.compare_or_append(entries, 0).await.expect("seed");
}

#[tokio::test]
async fn test_submit_before_start_is_refused() {
    let fixture = mem_fixture("node-a", 2);
    assert_eq!(fixture.follower.lifecycle_state(), LifecycleState::Created);

    let completion = fixture.follower.submit(heartbeat(2, 0, 0, 0, 1));
    let result = completion.await.expect("completion must resolve");
    assert!(matches!(
        result,
        Err(Error::Lifecycle(LifecycleError::NotRunning {
            state: LifecycleState::Created
        }))
    ));
    assert_eq!(fixture.follower.replication_queue_size(), 0);
}

#[tokio::test]
async fn test_start_is_single_shot() {
    let fixture = mem_fixture("node-a", 2);
    fixture.follower.start().expect("first start");
    assert!(matches!(
        fixture.follower.start(),
        Err(Error::Lifecycle(LifecycleError::InvalidTransition { .. }))
    ));
    fixture.follower.stop().await.expect("stop");
}

#[tokio::test]
async fn test_stop_requires_running() {
    let fixture = mem_fixture("node-a", 2);
    assert!(matches!(
        fixture.follower.stop().await,
        Err(Error::Lifecycle(LifecycleError::InvalidTransition { .. }))
    ));
}

/// Test: first batch on an empty journal
///
/// Scenario: fresh node, genesis snapshot only; the leader probes the
/// position before the first entry (`prev = -1`)
/// Expected: accepted, entries land at index 0
#[tokio::test]
async fn test_first_batch_on_empty_journal() {
    let fixture = mem_fixture("node-a", 1);
    fixture.follower.start().expect("start");

    let completion = fixture.follower.submit(append_entries_request(1, -1, 0, commands(1, 2), 0, 2));
    let response = completion.await.expect("completion").expect("accepted");
    assert!(response.success);
    assert_eq!(response.journal_index, 0);
    assert_eq!(response.entry_count, 2);
    assert_eq!(fixture.journal.max_index(), 2);

    fixture.follower.stop().await.expect("stop");
}

/// Test: heartbeat advances the commit point and wakes the applier
#[tokio::test]
async fn test_heartbeat_commits_and_wakes_applier() {
    let fixture = mem_fixture("node-a", 2);
    seed_three_entries(&fixture).await;
    fixture.journal.commit(1).await.expect("commit");
    fixture.follower.start().expect("start");

    let completion = fixture.follower.submit(heartbeat(2, 2, 2, 2, 3));
    let response = completion.await.expect("completion").expect("accepted");
    assert!(response.success);
    assert_eq!(response.journal_index, 3);
    assert_eq!(response.entry_count, 0);

    assert_eq!(fixture.journal.commit_index(), 2);
    wait_for_wakeups(&fixture.applier_wakeups, 1).await;
    assert_eq!(fixture.follower.leader_max_index(), Some(3));

    fixture.follower.stop().await.expect("stop");
}

/// Test: conflicting suffix with a config entry rolls the config back
///
/// Scenario: journal [1,1,2,2] where index 2 is an uncommitted config
/// change already installed in the live config; the leader overwrites from
/// index 2 with term-3 entries
/// Expected: journal becomes [1,1,3,3]; voters revert to the change's old
/// set
#[tokio::test]
async fn test_truncation_rolls_back_uncommitted_config() {
    let fixture = mem_fixture("node-a", 3);
    let seed = EntryBuilder::new(1)
        .command(b"a")
        .command(b"b")
        .term(2)
        .config(&["n1"], &["n1", "n2"])
        .command(b"c")
        .build();
    fixture.journal.compare_or_append(seed, 0).await.expect("seed");
    fixture.journal.commit(1).await.expect("commit");
    // The follower installed the change when it was replicated.
    fixture
        .state
        .config_state()
        .write()
        .install_voters(vec!["n1".to_string(), "n2".to_string()]);

    fixture.follower.start().expect("start");
    let completion = fixture.follower.submit(append_entries_request(3, 1, 1, commands(3, 2), 1, 4));
    let response = completion.await.expect("completion").expect("accepted");
    assert!(response.success);
    assert_eq!(response.journal_index, 2);
    assert_eq!(response.entry_count, 2);

    let terms: Vec<u64> = (0..4).map(|i| fixture.journal.term_at(i).expect("live")).collect();
    assert_eq!(terms, vec![1, 1, 3, 3]);
    assert_eq!(
        fixture.state.config_state().read().voters(),
        &["n1".to_string()]
    );

    fixture.follower.stop().await.expect("stop");
}

/// Test: a replicated config entry is installed immediately, not at commit
#[tokio::test]
async fn test_replicated_config_applies_before_commit() {
    let fixture = mem_fixture("n1", 2);
    fixture.follower.start().expect("start");

    let entries = EntryBuilder::new(2).config(&["n1"], &["n1", "n2"]).build();
    let completion = fixture.follower.submit(append_entries_request(2, -1, 0, entries, 0, 1));
    completion.await.expect("completion").expect("accepted");

    assert_eq!(fixture.journal.commit_index(), 0, "nothing committed yet");
    assert_eq!(
        fixture.state.config_state().read().voters(),
        &["n1".to_string(), "n2".to_string()]
    );

    fixture.follower.stop().await.expect("stop");
}

/// Test: resubmitting an identical batch is idempotent
#[tokio::test]
async fn test_duplicate_request_is_idempotent() {
    let fixture = mem_fixture("node-a", 2);
    seed_three_entries(&fixture).await;
    fixture.follower.start().expect("start");

    let request = append_entries_request(2, 2, 2, commands(2, 1), 0, 4);
    let first = fixture.follower.submit(request.clone());
    let first = first.await.expect("completion").expect("accepted");
    let second = fixture.follower.submit(request);
    let second = second.await.expect("completion").expect("accepted");

    assert!(first.success && second.success);
    assert_eq!(first.journal_index, 3);
    assert_eq!(second.journal_index, 3);
    assert_eq!(fixture.journal.max_index(), 4, "second batch must be a no-op");

    fixture.follower.stop().await.expect("stop");
}

/// Test: probing into the compacted prefix through the head snapshot
#[tokio::test]
async fn test_snapshot_boundary_probe_end_to_end() {
    let fixture = mem_fixture("node-a", 5);
    fixture.journal.compare_or_append(commands(4, 10), 0).await.expect("seed");
    fixture.journal.commit(10).await.expect("commit");
    fixture.journal.purge_up_to(10).expect("purge");
    fixture.snapshots.insert(10, SnapshotMeta {
        last_included_term: 4,
    });
    fixture.snapshots.remove_below(10);

    fixture.follower.start().expect("start");
    let completion = fixture.follower.submit(append_entries_request(5, 9, 4, commands(5, 1), 10, 11));
    let response = completion.await.expect("completion").expect("accepted");
    assert!(response.success);
    assert_eq!(response.journal_index, 10);
    assert_eq!(fixture.journal.term_at(10).expect("live"), 5);

    fixture.follower.stop().await.expect("stop");
}

/// Test: stop drains accepted requests, then refuses new ones
///
/// Scenario: two requests pending when stop() is called
/// Expected: both completions fire before stop returns; the handler worker
/// is deregistered; a later submit resolves with a lifecycle error
#[tokio::test]
async fn test_stop_drains_pending_requests() {
    let fixture = mem_fixture("node-a", 2);
    seed_three_entries(&fixture).await;
    fixture.follower.start().expect("start");

    let first = fixture.follower.submit(heartbeat(2, 1, 1, 0, 3));
    let second = fixture.follower.submit(heartbeat(2, 2, 2, 0, 3));
    fixture.follower.stop().await.expect("stop");
    assert_eq!(fixture.follower.lifecycle_state(), LifecycleState::Stopped);

    let first = first.await.expect("first completion").expect("accepted");
    let second = second.await.expect("second completion").expect("accepted");
    assert!(first.success && second.success);
    assert!(!fixture.workers.contains("node-a-voter-replication-handler"));

    let refused = fixture.follower.submit(heartbeat(2, 2, 2, 0, 3));
    assert!(matches!(
        refused.await.expect("completion"),
        Err(Error::Lifecycle(LifecycleError::NotRunning {
            state: LifecycleState::Stopped
        }))
    ));
}

#[tokio::test]
async fn test_preferred_leader_election_latch() {
    let fixture = mem_fixture("node-a", 2);
    assert!(!fixture.follower.is_ready_for_preferred_leader_election());
    fixture.follower.set_ready_for_preferred_leader_election(true);
    assert!(fixture.follower.is_ready_for_preferred_leader_election());
}
