//! Tests for the online list parser and its background worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use manalink::prelude::*;
use manalink::{FetchStatus, OnlinePlayer};

const PAGE: &str = "\
Online Players:
  Bob
Alice (GM)
carol

Dave
4 users are online.
";

// =========================================================================
// Parsing and grouping
// =========================================================================

#[test]
fn test_online_list_parse_skips_header_footer_and_blanks() {
    let list = OnlineList::parse(PAGE);
    assert_eq!(
        list.players,
        vec![
            OnlinePlayer {
                nick: "Bob".into(),
                is_gm: false
            },
            OnlinePlayer {
                nick: "Alice".into(),
                is_gm: true
            },
            OnlinePlayer {
                nick: "carol".into(),
                is_gm: false
            },
            OnlinePlayer {
                nick: "Dave".into(),
                is_gm: false
            },
        ]
    );
    assert!(list.contains("carol"));
    assert!(!list.contains("Carol"));
}

#[test]
fn test_online_list_parse_empty_page() {
    assert!(OnlineList::parse("").is_empty());
    assert!(OnlineList::parse("Online Players:\n0 users are online.\n").is_empty());
}

#[test]
fn test_online_list_groups_by_relation_sorted() {
    let relations = PlayerRelations::default();
    relations.set_relation("Dave", Relation::Friend).unwrap();
    relations.set_relation("Bob", Relation::Friend).unwrap();
    relations.set_relation("carol", Relation::Ignored).unwrap();
    relations.set_relation("Eve", Relation::Enemy).unwrap();
    relations.set_relation("Mallory", Relation::Erased).unwrap();

    let list = OnlineList::parse("Dave\nEve\nBob\ncarol\nZed\nMallory\nAlice\n");
    let grouped = list.group_by_relation(&relations);

    assert_eq!(grouped.friends, vec!["Bob", "Dave"]);
    assert_eq!(grouped.neutral, vec!["Alice", "Zed"]);
    assert_eq!(grouped.disregarded, vec!["carol"]);
    assert_eq!(grouped.enemies, vec!["Eve"]);
}

// =========================================================================
// Worker
// =========================================================================

async fn wait_for<T>(mut check: impl FnMut() -> Option<T>) -> T {
    for _ in 0..200 {
        if let Some(value) = check() {
            return value;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_worker_publishes_list_once_per_fetch() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = fetches.clone();
    let worker = OnlineListWorker::spawn(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ManalinkError>(PAGE.to_string()) }
        },
        OnlineListConfig::default(),
    );

    let list = wait_for(|| worker.poll()).await;
    assert_eq!(list.len(), 4);
    assert_eq!(worker.status(), FetchStatus::Complete);
    // Polled already; nothing new until the next fetch.
    assert!(worker.poll().is_none());
    assert_eq!(worker.latest().map(|l| l.len()), Some(4));

    worker.refresh();
    wait_for(|| worker.poll()).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 2);

    worker.shutdown().await;
}

#[tokio::test]
async fn test_worker_reports_fetch_error() {
    let worker = OnlineListWorker::spawn(
        || async { Err::<String, _>(ManalinkError::OnlineList("503 Service Unavailable".into())) },
        OnlineListConfig::default(),
    );

    wait_for(|| (worker.status() == FetchStatus::Error).then_some(())).await;
    assert!(worker.poll().is_none());
    assert!(worker.latest().is_none());

    worker.shutdown().await;
}

#[tokio::test]
async fn test_worker_times_out_slow_source() {
    let config = OnlineListConfig {
        refresh_secs: 5,
        fetch_timeout_secs: 1,
    };
    let worker = OnlineListWorker::spawn(
        || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, ManalinkError>(String::new())
        },
        config,
    );

    for _ in 0..300 {
        if worker.status() == FetchStatus::Error {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(worker.status(), FetchStatus::Error);
    worker.shutdown().await;
}
