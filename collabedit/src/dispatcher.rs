//! Inbound receive loop: host bridge → codec → edit queue.
//!
//! ```text
//! Listening ──event──► Filtering ──dict w/ tag──► Decoding ──ok──► Enqueuing
//!     ▲                    │                          │                │
//!     │                    └── NotAnEdit (trace) ─────┤                │
//!     │                                  UnknownKind / MissingField /  │
//!     │                                  InvalidField (warn + notify)  │
//!     └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bad input is always skipped, never fatal. The loop ends only when the
//! bridge closes or a shutdown request is observed after an event.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::bridge::EventClass;
use crate::context::CollabContext;
use crate::error::DecodeOutcome;
use crate::protocol::{EditKind, WireValue};
use crate::queue::EditSink;

/// Result of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Enqueued(EditKind),
    Skipped(DecodeOutcome),
}

/// Dispatcher counters snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Application messages received
    pub received: u64,
    /// Edits pushed to the sink
    pub enqueued: u64,
    /// Messages that were not edits
    pub ignored: u64,
    /// Edit messages that failed to decode
    pub rejected: u64,
}

/// Lock-free counters updated on the dispatcher thread.
#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
    received: AtomicU64,
    enqueued: AtomicU64,
    ignored: AtomicU64,
    rejected: AtomicU64,
}

impl DispatchCounters {
    pub(crate) fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            received: self.received.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

pub struct InboundDispatcher {
    ctx: Arc<CollabContext>,
    sink: Arc<dyn EditSink>,
    counters: Arc<DispatchCounters>,
    shutdown: Arc<AtomicBool>,
}

impl InboundDispatcher {
    pub fn new(ctx: Arc<CollabContext>, sink: Arc<dyn EditSink>) -> Self {
        Self {
            ctx,
            sink,
            counters: Arc::new(DispatchCounters::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn counters(&self) -> Arc<DispatchCounters> {
        self.counters.clone()
    }

    pub(crate) fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// Receive and dispatch until the bridge closes or shutdown is requested.
    pub fn run(&self) {
        log::info!(
            "Inbound dispatcher listening for {:?} events on document {}",
            EventClass::HandleMessage,
            self.ctx.document()
        );

        while !self.shutdown.load(Ordering::Acquire) {
            let Some(event) = self.ctx.bridge().wait_event(EventClass::HandleMessage) else {
                log::info!("Host bridge closed, inbound dispatcher stopping");
                break;
            };
            if event.class != EventClass::HandleMessage {
                log::trace!("Ignoring {:?} event", event.class);
                continue;
            }
            self.handle(&event.payload);
        }

        let stats = self.stats();
        log::info!(
            "Inbound dispatcher stopped: {} received, {} enqueued, {} ignored, {} rejected",
            stats.received,
            stats.enqueued,
            stats.ignored,
            stats.rejected
        );
    }

    /// Filter, decode, and enqueue a single inbound message.
    pub fn handle(&self, payload: &WireValue) -> Dispatch {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        match self.ctx.codec().decode(payload) {
            Ok(op) => {
                let kind = op.kind();
                log::debug!("Enqueuing {kind} at line {}", op.edit.line());
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                self.sink.enqueue_for_application(op);
                Dispatch::Enqueued(kind)
            }
            Err(outcome) if outcome.is_diagnostic() => {
                log::warn!("Skipping collabedit: {outcome}");
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                self.ctx.notify(&format!("msgloop {outcome}"));
                Dispatch::Skipped(outcome)
            }
            Err(outcome) => {
                log::trace!("Skipping non-collabedit {}", payload.type_name());
                self.counters.ignored.fetch_add(1, Ordering::Relaxed);
                Dispatch::Skipped(outcome)
            }
        }
    }
}
