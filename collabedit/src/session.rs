//! One-call startup wiring for the protocol layer.

use std::sync::Arc;

use crate::bridge::HostBridge;
use crate::config::CollabConfig;
use crate::context::CollabContext;
use crate::dispatcher::{DispatchStats, InboundDispatcher};
use crate::edit::DocumentRef;
use crate::error::CollabError;
use crate::publisher::OutboundPublisher;
use crate::queue::EditQueue;
use crate::supervisor::Supervisor;

/// A running protocol layer: context, queue, publisher, and the supervised
/// dispatcher thread.
///
/// The editor core drains [`queue`](Self::queue) on its own schedule and
/// calls [`publisher`](Self::publisher) for local edits.
pub struct CollabSession {
    context: Arc<CollabContext>,
    queue: Arc<EditQueue>,
    publisher: OutboundPublisher,
    supervisor: Supervisor,
}

impl CollabSession {
    /// Check capabilities, build the context, and start the dispatcher.
    pub fn start(
        bridge: Arc<dyn HostBridge>,
        document: DocumentRef,
        config: CollabConfig,
    ) -> Result<Self, CollabError> {
        let queue = Arc::new(EditQueue::with_high_water(config.queue_high_water));
        let thread_name = config.dispatcher_thread_name.clone();
        let policy = config.shutdown_policy;

        let context = Arc::new(CollabContext::new(bridge, document, config)?);
        let dispatcher = InboundDispatcher::new(context.clone(), queue.clone());
        let supervisor = Supervisor::spawn(dispatcher, &thread_name, policy)?;
        let publisher = OutboundPublisher::new(context.clone());

        log::info!("Collab session started for document {document}");
        Ok(Self {
            context,
            queue,
            publisher,
            supervisor,
        })
    }

    pub fn context(&self) -> &CollabContext {
        &self.context
    }

    pub fn document(&self) -> DocumentRef {
        self.context.document()
    }

    /// Shared handle to the inbound edit queue.
    pub fn queue(&self) -> Arc<EditQueue> {
        self.queue.clone()
    }

    pub fn publisher(&self) -> &OutboundPublisher {
        &self.publisher
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn stats(&self) -> DispatchStats {
        self.supervisor.stats()
    }

    /// Request shutdown and wait for the dispatcher to exit.
    pub fn shutdown(self) -> Result<(), CollabError> {
        self.supervisor.request_shutdown();
        self.supervisor.join()
    }
}
