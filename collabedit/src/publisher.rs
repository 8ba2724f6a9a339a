//! Outbound path: local edits → codec → host bridge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::context::CollabContext;
use crate::edit::EditOperation;
use crate::error::CollabError;

/// Sends local edits to the remote document.
///
/// No retries and no buffering: a failed send goes straight back to the
/// editor core.
pub struct OutboundPublisher {
    ctx: Arc<CollabContext>,
    published: AtomicU64,
}

impl OutboundPublisher {
    pub fn new(ctx: Arc<CollabContext>) -> Self {
        Self {
            ctx,
            published: AtomicU64::new(0),
        }
    }

    /// Encode `op` and post it to the host.
    pub fn publish(&self, op: &EditOperation) -> Result<(), CollabError> {
        let msg = self.ctx.codec().encode(op);
        log::debug!("Publishing {} at line {}", op.kind(), op.edit.line());

        self.ctx.bridge().post_message(msg).map_err(|e| {
            log::warn!("Failed to publish {}: {e}", op.kind());
            e
        })?;

        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Edits successfully handed to the bridge.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
