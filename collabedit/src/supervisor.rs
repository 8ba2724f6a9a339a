//! Lifecycle owner for the dispatcher thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::config::ShutdownPolicy;
use crate::dispatcher::{DispatchCounters, DispatchStats, InboundDispatcher};
use crate::error::CollabError;

/// Runs an [`InboundDispatcher`] on a dedicated named thread.
///
/// With [`ShutdownPolicy::Detach`] the thread outlives the supervisor and
/// ends with the process. With [`ShutdownPolicy::Join`] dropping the
/// supervisor requests shutdown and waits for the thread.
pub struct Supervisor {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<DispatchCounters>,
    policy: ShutdownPolicy,
}

impl Supervisor {
    pub fn spawn(
        dispatcher: InboundDispatcher,
        thread_name: &str,
        policy: ShutdownPolicy,
    ) -> Result<Self, CollabError> {
        let shutdown = dispatcher.shutdown_flag();
        let counters = dispatcher.counters();

        let handle = std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || dispatcher.run())
            .map_err(|e| CollabError::Spawn(e.to_string()))?;
        log::debug!("Spawned dispatcher thread '{thread_name}' ({policy:?})");

        Ok(Self {
            handle: Some(handle),
            shutdown,
            counters,
            policy,
        })
    }

    /// Ask the dispatcher to stop. Observed after the next inbound event or
    /// when the bridge closes.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Whether the dispatcher thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// Wait for the dispatcher thread to exit.
    pub fn join(mut self) -> Result<(), CollabError> {
        self.join_inner()
    }

    /// Let the dispatcher run for the rest of the process.
    pub fn detach(mut self) {
        self.handle.take();
    }

    fn join_inner(&mut self) -> Result<(), CollabError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| CollabError::DispatcherPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if self.policy == ShutdownPolicy::Join && self.handle.is_some() {
            self.request_shutdown();
            if let Err(e) = self.join_inner() {
                log::warn!("{e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ChannelBridge;
    use crate::config::CollabConfig;
    use crate::context::CollabContext;
    use crate::edit::DocumentRef;
    use crate::protocol::{WireMessage, LINE_KEY, TYPE_KEY};
    use crate::queue::EditQueue;

    fn dispatcher() -> (InboundDispatcher, Arc<EditQueue>, crate::bridge::BridgeHandle) {
        let (bridge, handle) = ChannelBridge::new();
        let ctx = Arc::new(
            CollabContext::new(Arc::new(bridge), DocumentRef::new(), CollabConfig::default()).unwrap(),
        );
        let queue = Arc::new(EditQueue::new());
        (InboundDispatcher::new(ctx, queue.clone()), queue, handle)
    }

    #[test]
    fn test_join_after_bridge_close() {
        let (dispatcher, queue, handle) = dispatcher();
        let supervisor = Supervisor::spawn(dispatcher, "test-dispatcher", ShutdownPolicy::Detach).unwrap();

        handle
            .deliver(WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, 2))
            .unwrap();
        drop(handle);

        let stats_before_join = supervisor.counters.clone();
        supervisor.join().unwrap();
        assert_eq!(stats_before_join.snapshot().enqueued, 1);
        assert_eq!(queue.len(), 1);
    }

    fn wait_until(mut done: impl FnMut() -> bool) {
        for _ in 0..400 {
            if done() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    #[test]
    fn test_shutdown_before_start_leaves_pending_events() {
        let (dispatcher, queue, handle) = dispatcher();
        dispatcher.shutdown_flag().store(true, std::sync::atomic::Ordering::Release);
        handle
            .deliver(WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, 2))
            .unwrap();

        let supervisor = Supervisor::spawn(dispatcher, "test-dispatcher", ShutdownPolicy::Join).unwrap();
        assert!(supervisor.is_shutdown_requested());
        let counters = supervisor.counters.clone();
        supervisor.join().unwrap();

        assert_eq!(counters.snapshot().received, 0);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_shutdown_observed_after_next_event() {
        let (dispatcher, queue, handle) = dispatcher();
        let supervisor = Supervisor::spawn(dispatcher, "test-dispatcher", ShutdownPolicy::Join).unwrap();

        handle
            .deliver(WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, 1))
            .unwrap();
        wait_until(|| supervisor.stats().enqueued == 1);
        assert_eq!(supervisor.stats().enqueued, 1);

        supervisor.request_shutdown();
        handle
            .deliver(WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, 2))
            .unwrap();

        // The bridge stays open, so only the flag can end the loop.
        wait_until(|| supervisor.is_finished());
        assert!(supervisor.is_finished());
        assert_eq!(queue.len() as u64, supervisor.stats().enqueued);
        assert_eq!(queue.try_pop().map(|op| op.edit.line().get()), Some(1));
        drop(handle);
    }

    #[test]
    fn test_detach_leaves_thread_running() {
        let (dispatcher, queue, handle) = dispatcher();
        let supervisor = Supervisor::spawn(dispatcher, "test-dispatcher", ShutdownPolicy::Detach).unwrap();
        assert!(!supervisor.is_finished());
        supervisor.detach();

        handle
            .deliver(WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, 9))
            .unwrap();
        let op = queue.pop_blocking();
        assert_eq!(op.edit.line().get(), 9);
    }
}
