//! Startup context shared by the codec, dispatcher, and publisher.
//!
//! Built once after the host reports its capabilities, then only read.

use std::sync::Arc;

use crate::bridge::HostBridge;
use crate::codec::Codec;
use crate::config::CollabConfig;
use crate::edit::DocumentRef;
use crate::error::CollabError;

pub struct CollabContext {
    bridge: Arc<dyn HostBridge>,
    codec: Codec,
    config: CollabConfig,
}

impl CollabContext {
    /// Check the bridge's capabilities and build the context.
    ///
    /// Fails with [`CollabError::BridgeUnavailable`] if any required
    /// capability is missing; callers should treat that as fatal.
    pub fn new(
        bridge: Arc<dyn HostBridge>,
        document: DocumentRef,
        config: CollabConfig,
    ) -> Result<Self, CollabError> {
        let missing = bridge.capabilities().missing();
        if !missing.is_empty() {
            let err = CollabError::BridgeUnavailable(missing);
            log::error!("{err}");
            return Err(err);
        }
        log::info!("Host bridge ready for document {document}");

        Ok(Self {
            bridge,
            codec: Codec::new(document),
            config,
        })
    }

    pub fn bridge(&self) -> &dyn HostBridge {
        self.bridge.as_ref()
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn document(&self) -> DocumentRef {
        self.codec.target()
    }

    /// Echo a diagnostic to the host console if configured to.
    ///
    /// Diagnostics are best effort: a failed post is logged, not returned.
    pub fn notify(&self, text: &str) {
        if !self.config.echo_diagnostics {
            return;
        }
        let line = format!("{}{}", self.config.diagnostic_prefix, text);
        if let Err(e) = self.bridge.post_text(&line) {
            log::debug!("Diagnostic not delivered: {e}");
        }
    }
}
