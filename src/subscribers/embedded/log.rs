//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout, one line each.
//! Actors are numbered from 1, as philosophers are at the table.
//!
//! ## Example output
//! ```text
//! [run-starting] actors=5 work_units=3 timeout=10000ms
//! [grant] philosopher=1 active=1
//! [queued] philosopher=3 queue=1
//! [acquired] philosopher=1 resource=1
//! [work] philosopher=1 remaining=2
//! [dropped] philosopher=1 resource=1
//! [released] philosopher=1 active=1
//! [grant] philosopher=3 active=2 from_queue
//! [finished] philosopher=1 finished=1
//! [arbiter-drained] finished=5
//! [arbiter-timed-out] timeout=10000ms finished=2
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter {
    resources: bool,
}

impl LogWriter {
    /// Construct a new [`LogWriter`] that skips per-resource lines.
    #[must_use]
    pub fn new() -> Self {
        Self { resources: false }
    }

    /// Also print `acquired`/`dropped` lines for every resource lease.
    #[must_use]
    pub fn with_resources(mut self) -> Self {
        self.resources = true;
        self
    }

    /// Formats one event as a log line; `None` for events this writer skips.
    pub fn format(&self, e: &Event) -> Option<String> {
        let label = e.kind.as_label();
        let who = e.actor_number().unwrap_or_default();
        let line = match e.kind {
            EventKind::RunStarting => format!(
                "[{label}] actors={} work_units={} timeout={}ms",
                e.actor_count.unwrap_or_default(),
                e.remaining.unwrap_or_default(),
                e.timeout_ms.unwrap_or_default()
            ),
            EventKind::ArbiterStarted => format!("[{label}]"),
            EventKind::GrantIssued => {
                let queued = if e.from_queue == Some(true) { " from_queue" } else { "" };
                format!(
                    "[{label}] philosopher={who} active={}{queued}",
                    e.active.unwrap_or_default()
                )
            }
            EventKind::RequestQueued => format!(
                "[{label}] philosopher={who} queue={}",
                e.position.unwrap_or_default()
            ),
            EventKind::SlotReleased => format!(
                "[{label}] philosopher={who} active={}",
                e.active.unwrap_or_default()
            ),
            EventKind::ResourceAcquired | EventKind::ResourceReleased => {
                if !self.resources {
                    return None;
                }
                format!(
                    "[{label}] philosopher={who} resource={}",
                    e.resource.map(|r| r + 1).unwrap_or_default()
                )
            }
            EventKind::WorkPerformed => format!(
                "[{label}] philosopher={who} remaining={}",
                e.remaining.unwrap_or_default()
            ),
            EventKind::ActorFinished => format!(
                "[{label}] philosopher={who} finished={}",
                e.finished.unwrap_or_default()
            ),
            EventKind::ArbiterDrained => {
                format!("[{label}] finished={}", e.finished.unwrap_or_default())
            }
            EventKind::ArbiterTimedOut => format!(
                "[{label}] timeout={}ms finished={}",
                e.timeout_ms.unwrap_or_default(),
                e.finished.unwrap_or_default()
            ),
            EventKind::ProtocolViolation => format!(
                "[{label}] philosopher={who} reason={}",
                e.reason.as_deref().unwrap_or("unknown")
            ),
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => format!(
                "[{label}] {}",
                e.reason.as_deref().unwrap_or("unknown")
            ),
        };
        Some(line)
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        if let Some(line) = self.format(e) {
            println!("{line}");
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_line_uses_one_based_numbers() {
        let ev = Event::new(EventKind::GrantIssued)
            .with_actor(2)
            .with_active(2)
            .with_from_queue(true);
        assert_eq!(
            LogWriter::new().format(&ev).as_deref(),
            Some("[grant] philosopher=3 active=2 from_queue")
        );
    }

    #[test]
    fn resource_lines_are_opt_in() {
        let ev = Event::new(EventKind::ResourceAcquired)
            .with_actor(0)
            .with_resource(4);
        assert_eq!(LogWriter::new().format(&ev), None);
        assert_eq!(
            LogWriter::new().with_resources().format(&ev).as_deref(),
            Some("[acquired] philosopher=1 resource=5")
        );
    }

    #[test]
    fn timeout_line_reports_interval() {
        let ev = Event::new(EventKind::ArbiterTimedOut)
            .with_timeout(std::time::Duration::from_secs(10))
            .with_finished(2);
        assert_eq!(
            LogWriter::new().format(&ev).as_deref(),
            Some("[arbiter-timed-out] timeout=10000ms finished=2")
        );
    }

    #[test]
    fn queue_and_table_lines_read_their_own_counters() {
        let queued = Event::new(EventKind::RequestQueued)
            .with_actor(2)
            .with_position(1)
            .with_active(2);
        assert_eq!(
            LogWriter::new().format(&queued).as_deref(),
            Some("[queued] philosopher=3 queue=1")
        );

        let start = Event::new(EventKind::RunStarting)
            .with_actor_count(5)
            .with_remaining(3)
            .with_timeout(std::time::Duration::from_secs(10));
        assert_eq!(
            LogWriter::new().format(&start).as_deref(),
            Some("[run-starting] actors=5 work_units=3 timeout=10000ms")
        );
    }
}
