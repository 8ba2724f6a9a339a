//! # collabedit: collaborative edit protocol layer
//!
//! Carries line-oriented edits between a local editor core and a remote
//! shared document, through a host bridge that moves discrete dictionary
//! messages.
//!
//! ## Architecture
//!
//! ```text
//!            receive path (dispatcher thread)
//! ┌─────────────┐  HandleMessage  ┌──────────────────┐  decode  ┌───────────┐
//! │ Host bridge │ ──────────────► │ InboundDispatcher│ ───────► │ EditQueue │
//! │             │                 └──────────────────┘          └─────┬─────┘
//! │             │                                                     │ pop
//! │             │  encode  ┌──────────────────┐  local edit   ┌───────▼─────┐
//! │             │ ◄─────── │ OutboundPublisher│ ◄──────────── │ Editor core │
//! └─────────────┘          └──────────────────┘               └─────────────┘
//!            send path (main thread)
//! ```
//!
//! ## Modules
//!
//! - [`edit`] - `EditOperation` and its validated fields
//! - [`protocol`] - wire keys, discriminators, host value model
//! - [`codec`] - `EditOperation` ⇄ `WireMessage`
//! - [`queue`] - blocking FIFO between the two threads
//! - [`bridge`] - host bridge trait and in-process channel bridge
//! - [`dispatcher`] - inbound receive loop
//! - [`publisher`] - outbound send path
//! - [`supervisor`] - dispatcher thread lifecycle
//! - [`session`] - startup wiring

pub mod bridge;
pub mod codec;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod edit;
pub mod error;
pub mod protocol;
pub mod publisher;
pub mod queue;
pub mod session;
pub mod supervisor;

// Re-exports for convenience
pub use bridge::{
    BridgeHandle, Capabilities, Capability, ChannelBridge, EventClass, HostBridge, HostEvent,
    Outbound,
};
pub use codec::Codec;
pub use config::{CollabConfig, ShutdownPolicy};
pub use context::CollabContext;
pub use dispatcher::{Dispatch, DispatchStats, InboundDispatcher};
pub use edit::{DocumentRef, Edit, EditOperation, InvalidField, Position};
pub use error::{CollabError, DecodeOutcome};
pub use protocol::{EditKind, WireMessage, WireValue};
pub use publisher::OutboundPublisher;
pub use queue::{EditQueue, EditSink};
pub use session::CollabSession;
pub use supervisor::Supervisor;
