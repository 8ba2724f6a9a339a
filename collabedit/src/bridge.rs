//! Host bridge seam and an in-process channel implementation.
//!
//! The host delivers discrete events in order and accepts outbound
//! dictionaries or plain console strings. The protocol layer only relies on
//! the [`HostBridge`] trait; [`ChannelBridge`] backs it with tokio unbounded
//! channels so tests and the stdio host can drive a full session.

use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::error::CollabError;
use crate::protocol::{WireMessage, WireValue};

/// Host capabilities the protocol layer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// UTF-8 ⇄ host string conversion
    Var,
    /// Dictionary construction and key access
    Dictionary,
    /// Posting outbound messages
    Messaging,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Var => write!(f, "var"),
            Capability::Dictionary => write!(f, "dictionary"),
            Capability::Messaging => write!(f, "messaging"),
        }
    }
}

/// Which capabilities a bridge reports at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub var: bool,
    pub dictionary: bool,
    pub messaging: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        var: true,
        dictionary: true,
        messaging: true,
    };

    pub fn missing(&self) -> Vec<Capability> {
        let mut missing = Vec::new();
        if !self.var {
            missing.push(Capability::Var);
        }
        if !self.dictionary {
            missing.push(Capability::Dictionary);
        }
        if !self.messaging {
            missing.push(Capability::Messaging);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.var && self.dictionary && self.messaging
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}

/// Classes of host events. Only `HandleMessage` carries application data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    HandleMessage,
    DidChangeView,
    DidChangeFocus,
    HandleInputEvent,
    MouseLock,
}

/// One event delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    pub class: EventClass,
    pub payload: WireValue,
}

impl HostEvent {
    /// An inbound application message.
    pub fn message(payload: impl Into<WireValue>) -> Self {
        Self {
            class: EventClass::HandleMessage,
            payload: payload.into(),
        }
    }
}

/// Something the protocol layer hands to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// An encoded edit
    Message(WireMessage),
    /// A plain string, printed by the host console
    Text(String),
}

impl Outbound {
    /// JSON form, one document per message.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Outbound::Message(msg) => msg.to_json(),
            Outbound::Text(text) => serde_json::to_string(text),
        }
    }
}

/// What the protocol layer requires of the host.
pub trait HostBridge: Send + Sync {
    /// Capabilities available to this process.
    fn capabilities(&self) -> Capabilities;

    /// Block until the next event of `class` arrives. Events of other classes
    /// are not returned. `None` means the host will deliver nothing more.
    fn wait_event(&self, class: EventClass) -> Option<HostEvent>;

    /// Send a message to the host without waiting for it to be consumed.
    fn post(&self, message: Outbound) -> Result<(), CollabError>;

    fn post_message(&self, message: WireMessage) -> Result<(), CollabError> {
        self.post(Outbound::Message(message))
    }

    fn post_text(&self, text: &str) -> Result<(), CollabError> {
        self.post(Outbound::Text(text.to_owned()))
    }
}

/// In-process bridge over tokio unbounded channels.
pub struct ChannelBridge {
    inbound: Mutex<mpsc::UnboundedReceiver<HostEvent>>,
    outbound: mpsc::UnboundedSender<Outbound>,
    capabilities: Capabilities,
}

/// Host side of a [`ChannelBridge`]: injects events, observes output.
///
/// Dropping it closes the bridge, which ends the dispatcher loop.
pub struct BridgeHandle {
    inbound: mpsc::UnboundedSender<HostEvent>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl ChannelBridge {
    /// Create a connected bridge/handle pair reporting every capability.
    pub fn new() -> (Self, BridgeHandle) {
        Self::with_capabilities(Capabilities::ALL)
    }

    pub fn with_capabilities(capabilities: Capabilities) -> (Self, BridgeHandle) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let bridge = Self {
            inbound: Mutex::new(in_rx),
            outbound: out_tx,
            capabilities,
        };
        let handle = BridgeHandle {
            inbound: in_tx,
            outbound: out_rx,
        };
        (bridge, handle)
    }
}

impl HostBridge for ChannelBridge {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn wait_event(&self, class: EventClass) -> Option<HostEvent> {
        let mut inbound = self
            .inbound
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        loop {
            let event = inbound.blocking_recv()?;
            if event.class == class {
                return Some(event);
            }
            log::trace!("Bridge dropping {:?} event while waiting for {class:?}", event.class);
        }
    }

    fn post(&self, message: Outbound) -> Result<(), CollabError> {
        self.outbound
            .send(message)
            .map_err(|_| CollabError::SendFailure("host receiver closed".to_string()))
    }
}

impl BridgeHandle {
    /// Deliver an application message to the protocol layer.
    pub fn deliver(&self, payload: impl Into<WireValue>) -> Result<(), CollabError> {
        self.deliver_event(HostEvent::message(payload))
    }

    /// Deliver an event of any class.
    pub fn deliver_event(&self, event: HostEvent) -> Result<(), CollabError> {
        self.inbound.send(event).map_err(|_| CollabError::BridgeClosed)
    }

    /// Next outbound message, waiting for one. Not for use inside an async context.
    pub fn blocking_recv(&mut self) -> Option<Outbound> {
        self.outbound.blocking_recv()
    }

    /// Next outbound message, waiting asynchronously.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.outbound.recv().await
    }

    /// Next outbound message if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Outbound> {
        self.outbound.try_recv().ok()
    }

    /// Split into the inbound sender and outbound receiver.
    pub fn into_parts(self) -> (mpsc::UnboundedSender<HostEvent>, mpsc::UnboundedReceiver<Outbound>) {
        (self.inbound, self.outbound)
    }
}
