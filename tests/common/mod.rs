#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use philosophers::{
    Config, Coordinator, Event, EventKind, Journal, MAX_ACTIVE, Outcome, RuntimeError, TieBreak,
};

/// Runs one table with a journal attached, using the default bus and journal sizes.
pub async fn run_recorded(
    actors: usize,
    work_units: u32,
    tie_break: TieBreak,
) -> (Result<Outcome, RuntimeError>, Arc<Journal>) {
    let cfg = Config::new(actors, work_units)
        .with_timeout(Duration::from_secs(10))
        .with_tie_break(tie_break);

    let journal = Arc::new(Journal::new());
    let outcome = Coordinator::builder(cfg)
        .with_subscriber(journal.clone())
        .build()
        .run()
        .await;
    (outcome, journal)
}

fn actor(ev: &Event) -> usize {
    ev.actor
        .unwrap_or_else(|| panic!("{:?} event without actor (seq {})", ev.kind, ev.seq))
}

fn resource(ev: &Event) -> usize {
    ev.resource
        .unwrap_or_else(|| panic!("{:?} event without resource (seq {})", ev.kind, ev.seq))
}

/// No resource is ever held by two actors, and leases are returned by their holder.
pub fn assert_mutual_exclusion(events: &[Event]) {
    let mut holder: HashMap<usize, usize> = HashMap::new();
    for ev in events {
        match ev.kind {
            EventKind::ResourceAcquired => {
                let (a, r) = (actor(ev), resource(ev));
                if let Some(other) = holder.insert(r, a) {
                    panic!("resource {r} acquired by {a} while held by {other} (seq {})", ev.seq);
                }
            }
            EventKind::ResourceReleased => {
                let (a, r) = (actor(ev), resource(ev));
                assert_eq!(
                    holder.remove(&r),
                    Some(a),
                    "resource {r} released by {a} without holding it (seq {})",
                    ev.seq
                );
            }
            _ => {}
        }
    }
    assert!(holder.is_empty(), "resources still held at the end: {holder:?}");
}

/// At most [`MAX_ACTIVE`] actors hold a grant or any resource at once.
pub fn assert_bounded_concurrency(events: &[Event]) {
    let mut granted: i64 = 0;
    let mut holding: HashMap<usize, u32> = HashMap::new();

    for ev in events {
        match ev.kind {
            EventKind::GrantIssued => {
                granted += 1;
                let active = ev.active.expect("grant without active count");
                assert!(active <= MAX_ACTIVE, "grant reports {active} active (seq {})", ev.seq);
                assert_eq!(active as i64, granted, "grant active count drifted (seq {})", ev.seq);
            }
            EventKind::SlotReleased => {
                granted -= 1;
                assert!(granted >= 0, "release without a grant (seq {})", ev.seq);
            }
            EventKind::ResourceAcquired => {
                *holding.entry(actor(ev)).or_default() += 1;
                assert!(
                    holding.len() <= MAX_ACTIVE,
                    "{} actors hold resources at seq {}",
                    holding.len(),
                    ev.seq
                );
            }
            EventKind::ResourceReleased => {
                let a = actor(ev);
                let n = holding.get_mut(&a).expect("release by a non-holder");
                *n -= 1;
                if *n == 0 {
                    holding.remove(&a);
                }
            }
            _ => {}
        }
    }
}

/// Queued requests are granted in exactly the order they were queued.
pub fn assert_fifo(events: &[Event]) {
    let mut waiting: VecDeque<usize> = VecDeque::new();
    for ev in events {
        match ev.kind {
            EventKind::RequestQueued => waiting.push_back(actor(ev)),
            EventKind::GrantIssued if ev.from_queue == Some(true) => {
                let head = waiting.pop_front();
                assert_eq!(
                    head,
                    Some(actor(ev)),
                    "promotion of {} skipped the queue head (seq {})",
                    actor(ev),
                    ev.seq
                );
            }
            _ => {}
        }
    }
    assert!(waiting.is_empty(), "requests never granted: {waiting:?}");
}

/// Every actor performs exactly `work_units` units, each under a grant and both
/// resources, and reports finished once, after its last unit.
pub fn assert_conservation(events: &[Event], actors: usize, work_units: u32) {
    let mut grants: HashMap<usize, u32> = HashMap::new();
    let mut work: HashMap<usize, Vec<u32>> = HashMap::new();
    let mut held: HashMap<usize, HashSet<usize>> = HashMap::new();
    let mut finished: HashSet<usize> = HashSet::new();

    for ev in events {
        match ev.kind {
            EventKind::GrantIssued => *grants.entry(actor(ev)).or_default() += 1,
            EventKind::ResourceAcquired => {
                held.entry(actor(ev)).or_default().insert(resource(ev));
            }
            EventKind::ResourceReleased => {
                held.entry(actor(ev)).or_default().remove(&resource(ev));
            }
            EventKind::WorkPerformed => {
                let a = actor(ev);
                assert!(!finished.contains(&a), "actor {a} worked after finishing");
                let left = a;
                let right = (a + 1) % actors;
                let h = held.get(&a).cloned().unwrap_or_default();
                assert!(
                    h.contains(&left) && h.contains(&right),
                    "actor {a} worked without both resources (seq {}): {h:?}",
                    ev.seq
                );
                work.entry(a)
                    .or_default()
                    .push(ev.remaining.expect("work without remaining"));
            }
            EventKind::ActorFinished => {
                let a = actor(ev);
                assert!(finished.insert(a), "actor {a} finished twice");
            }
            _ => {}
        }
    }

    assert_eq!(finished.len(), actors, "not every actor finished");
    for a in 0..actors {
        let expected: Vec<u32> = (0..work_units).rev().collect();
        assert_eq!(work.get(&a), Some(&expected), "actor {a} work sequence");
        assert_eq!(grants.get(&a).copied(), Some(work_units), "actor {a} grants");
    }
}

/// Runs every trace check on a completed run.
pub fn assert_well_formed(events: &[Event], actors: usize, work_units: u32) {
    assert_eq!(events.first().map(|e| e.kind), Some(EventKind::RunStarting));
    assert_eq!(
        events.iter().filter(|e| e.kind == EventKind::ArbiterDrained).count(),
        1
    );
    assert!(
        events.iter().all(|e| e.kind != EventKind::ProtocolViolation),
        "protocol violation in a normal run"
    );
    assert_mutual_exclusion(events);
    assert_bounded_concurrency(events);
    assert_fifo(events);
    assert_conservation(events, actors, work_units);
}
