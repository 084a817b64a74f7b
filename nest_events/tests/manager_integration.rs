//! Integration tests for the transactional event manager.
//!
//! Covers per-guild serialization under concurrent commands, prize
//! disbursement through the ledger, and persistence through the JSON file
//! store.

use async_trait::async_trait;
use nest_events::{
    event::{EventConfig, EventError, EventManager, GuildId, ParticipantId},
    ledger::{CurrencyLedger, LedgerError, LedgerResult, MemoryLedger},
    store::{EventStore, JsonFileEventStore, MemoryEventStore},
};
use std::collections::HashSet;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tempfile::TempDir;

fn memory_manager() -> (Arc<EventManager>, Arc<MemoryEventStore>, Arc<MemoryLedger>) {
    let store = Arc::new(MemoryEventStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    let manager = Arc::new(EventManager::new(store.clone(), ledger.clone()));
    (manager, store, ledger)
}

/// Ledger that fails every credit to one participant
struct FlakyLedger {
    refuse: ParticipantId,
    inner: MemoryLedger,
    attempts: AtomicUsize,
}

#[async_trait]
impl CurrencyLedger for FlakyLedger {
    async fn credit(
        &self,
        guild_id: GuildId,
        participant: ParticipantId,
        amount: i64,
    ) -> LedgerResult<i64> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if participant == self.refuse {
            return Err(LedgerError::Unavailable("account frozen".to_string()));
        }
        self.inner.credit(guild_id, participant, amount).await
    }
}

#[tokio::test]
async fn test_concurrent_joins_respect_limit() {
    let (manager, _, _) = memory_manager();
    let event = manager
        .create_event(1, EventConfig::elimination("Rush", 0).with_limit(8), 1)
        .await
        .unwrap();
    let event_id = event.id;

    let mut handles = Vec::new();
    for participant in 100..132 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.join(1, event_id, participant).await
        }));
    }

    let mut joined = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => joined += 1,
            Err(EventError::Full { limit: 8 }) => full += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(joined, 8);
    assert_eq!(full, 24);
    let stored = manager.get_event(1, event_id).await.unwrap();
    assert_eq!(stored.participants.len(), 8);
}

#[tokio::test]
async fn test_concurrent_duplicate_join_registers_once() {
    let (manager, _, _) = memory_manager();
    let event = manager
        .create_event(1, EventConfig::swiss("League", 0, 3), 1)
        .await
        .unwrap();
    let event_id = event.id;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.join(1, event_id, 77).await })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => assert!(matches!(e, EventError::AlreadyRegistered(77))),
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_pairings_and_results_keep_rounds_well_formed() {
    let (manager, _, _) = memory_manager();
    let event = manager
        .create_event(3, EventConfig::elimination("Bracket Race", 0), 1)
        .await
        .unwrap();
    let event_id = event.id;
    for member in 1..=8 {
        manager.join(3, event_id, member).await.unwrap();
    }
    manager.generate_pairings(3, event_id).await.unwrap();

    for _ in 0..50 {
        let bracket = manager.bracket(3, event_id).await.unwrap();
        if !bracket.active {
            break;
        }

        let mut wins = Vec::new();
        for m in bracket.matches.iter().filter(|m| !m.is_decided()) {
            let manager = Arc::clone(&manager);
            let winner = m.player1;
            wins.push(tokio::spawn(async move {
                manager.declare_winner(3, event_id, winner).await
            }));
        }
        let pairings: Vec<_> = (0..2)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.generate_pairings(3, event_id).await })
            })
            .collect();

        for handle in wins {
            handle.await.unwrap().unwrap();
        }
        for handle in pairings {
            match handle.await.unwrap() {
                Ok(_)
                | Err(EventError::RoundInProgress { .. })
                | Err(EventError::TournamentComplete { .. }) => {}
                Err(other) => panic!("unexpected pairing error: {other}"),
            }
        }
    }

    let event = manager.get_event(3, event_id).await.unwrap();
    assert!(!event.is_active());

    let mut rounds = event.round_history.clone();
    rounds.extend(event.current_round().cloned());
    let sizes: Vec<_> = rounds.iter().map(|round| round.len()).collect();
    assert_eq!(sizes, vec![4, 2, 1]);

    for round in &rounds {
        let mut seen = HashSet::new();
        for m in round.iter() {
            assert!(m.is_decided());
            assert!(seen.insert(m.player1));
            if let Some(p2) = m.player2 {
                assert!(seen.insert(p2));
            }
        }
    }
}

#[tokio::test]
async fn test_guilds_do_not_share_events() {
    let (manager, _, _) = memory_manager();
    let a = manager
        .create_event(1, EventConfig::elimination("A", 0), 1)
        .await
        .unwrap();
    let b = manager
        .create_event(2, EventConfig::elimination("B", 0), 1)
        .await
        .unwrap();

    assert_eq!(a.id, 1);
    assert_eq!(b.id, 1, "ids are sequential per guild");
    manager.join(1, a.id, 5).await.unwrap();

    let other = manager.get_event(2, b.id).await.unwrap();
    assert!(other.participants.is_empty());
}

#[tokio::test]
async fn test_completed_elimination_credits_podium() {
    let (manager, _, ledger) = memory_manager();
    let guild = 9;
    let event = manager
        .create_event(guild, EventConfig::elimination("Cup", 400), 1)
        .await
        .unwrap();
    for member in [1, 2, 3, 4] {
        manager.join(guild, event.id, member).await.unwrap();
    }

    let semis = manager.generate_pairings(guild, event.id).await.unwrap();
    let mut finalists = Vec::new();
    for m in semis.round.iter() {
        manager.declare_winner(guild, event.id, m.player1).await.unwrap();
        finalists.push(m.player1);
    }

    manager.generate_pairings(guild, event.id).await.unwrap();
    let report = manager
        .declare_winner(guild, event.id, finalists[1])
        .await
        .unwrap();

    assert!(report.outcome.completion.is_some());
    assert_eq!(report.payouts.credited.len(), 4);
    assert!(!report.payouts.has_failures());
    assert_eq!(ledger.balance(guild, finalists[1]).await, 400);
    assert_eq!(ledger.balance(guild, finalists[0]).await, 200);
    assert_eq!(ledger.total(guild).await, 800);

    assert!(manager.list_events(guild).await.unwrap().is_empty());
    let standings = manager.standings(guild, event.id).await.unwrap();
    assert!(!standings.active);
    let bracket = manager.bracket(guild, event.id).await.unwrap();
    assert_eq!(bracket.round_number, 2);
    assert!(!bracket.active);
}

#[tokio::test]
async fn test_partial_payout_failure_is_reported() {
    let store = Arc::new(MemoryEventStore::new());
    let ledger = Arc::new(FlakyLedger {
        refuse: 2,
        inner: MemoryLedger::new(),
        attempts: AtomicUsize::new(0),
    });
    let manager = EventManager::new(store, ledger.clone());

    let event = manager
        .create_event(1, EventConfig::swiss("League", 100, 1), 1)
        .await
        .unwrap();
    for member in [1, 2, 3, 4] {
        manager.join(1, event.id, member).await.unwrap();
    }
    manager.generate_pairings(1, event.id).await.unwrap();
    manager.declare_winner(1, event.id, 1).await.unwrap();
    let report = manager.declare_winner(1, event.id, 3).await.unwrap();

    // Every placed participant is attempted exactly once
    assert_eq!(ledger.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(report.payouts.credited.len(), 2);
    assert_eq!(report.payouts.failed.len(), 1);
    assert_eq!(report.payouts.failed[0].payout.participant, 2);
    assert!(!manager.get_event(1, event.id).await.unwrap().is_active());
}

#[tokio::test]
async fn test_rejected_command_leaves_store_untouched() {
    let (manager, store, _) = memory_manager();
    let event = manager
        .create_event(1, EventConfig::swiss("League", 0, 3), 1)
        .await
        .unwrap();
    for member in [1, 2, 3, 4] {
        manager.join(1, event.id, member).await.unwrap();
    }
    manager.generate_pairings(1, event.id).await.unwrap();
    let before = store.load_events(1).await.unwrap();

    assert!(matches!(
        manager.generate_pairings(1, event.id).await,
        Err(EventError::RoundInProgress { pending: 2 })
    ));
    assert!(matches!(
        manager.declare_winner(1, event.id, 50).await,
        Err(EventError::NotPlaying(50))
    ));
    assert_eq!(store.load_events(1).await.unwrap(), before);
}

#[tokio::test]
async fn test_json_store_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.json");

    let event_id = {
        let store = Arc::new(JsonFileEventStore::new(&path));
        let manager = EventManager::new(store, Arc::new(MemoryLedger::new()));
        let event = manager
            .create_event(5, EventConfig::swiss("League", 10, 2).with_schedule("Friday"), 1)
            .await
            .unwrap();
        manager.join(5, event.id, 20).await.unwrap();
        manager.join(5, event.id, 21).await.unwrap();
        manager.generate_pairings(5, event.id).await.unwrap();
        event.id
    };

    let store = Arc::new(JsonFileEventStore::new(&path));
    let manager = EventManager::new(store, Arc::new(MemoryLedger::new()));
    let event = manager.get_event(5, event_id).await.unwrap();

    assert_eq!(event.scheduled_label, "Friday");
    assert_eq!(event.participants, vec![20, 21]);
    assert_eq!(event.current_round().unwrap().len(), 1);

    manager.declare_winner(5, event_id, 21).await.unwrap();
    let standings = manager.standings(5, event_id).await.unwrap();
    assert_eq!(standings.standings[0].participant, 21);
}
