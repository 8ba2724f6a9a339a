//! Error types for the edit protocol layer.

use crate::bridge::Capability;
use crate::edit::InvalidField;
use crate::protocol::EditKind;

/// Why an inbound message did not decode to an edit.
///
/// Every variant is recoverable: the dispatcher skips the message and keeps
/// listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Not a dictionary, or no string `collabedit_type`. Not an error.
    NotAnEdit,
    /// Discriminator present but not one of the known kinds
    UnknownKind(String),
    /// Required field absent or of the wrong host type
    MissingField { kind: EditKind, field: &'static str },
    /// Numeric field negative or outside the `int32` range
    InvalidField { kind: EditKind, field: &'static str, value: i64 },
}

impl DecodeOutcome {
    pub(crate) fn invalid(kind: EditKind, err: InvalidField) -> Self {
        DecodeOutcome::InvalidField {
            kind,
            field: err.field,
            value: err.value,
        }
    }

    /// Whether the operator should hear about this outcome.
    pub fn is_diagnostic(&self) -> bool {
        !matches!(self, DecodeOutcome::NotAnEdit)
    }
}

impl std::fmt::Display for DecodeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnEdit => write!(f, "Not a collabedit message"),
            Self::UnknownKind(tag) => write!(f, "Unknown collabedit type '{tag}'"),
            Self::MissingField { kind, field } => {
                write!(f, "Missing or mistyped field '{field}' in {kind}")
            }
            Self::InvalidField { kind, field, value } => {
                write!(f, "Invalid value {value} for field '{field}' in {kind}")
            }
        }
    }
}

impl std::error::Error for DecodeOutcome {}

/// Failures surfaced to callers of the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollabError {
    /// Required host capabilities missing at startup
    BridgeUnavailable(Vec<Capability>),
    /// The bridge refused an outbound message
    SendFailure(String),
    /// The bridge stopped delivering inbound events
    BridgeClosed,
    /// The dispatcher thread could not be started
    Spawn(String),
    /// The dispatcher thread panicked
    DispatcherPanicked,
}

impl CollabError {
    /// Process exit status for fatal startup errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::BridgeUnavailable(_) => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for CollabError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BridgeUnavailable(missing) => {
                write!(f, "Host bridge unavailable, missing:")?;
                for cap in missing {
                    write!(f, " {cap}")?;
                }
                Ok(())
            }
            Self::SendFailure(e) => write!(f, "Send failure: {e}"),
            Self::BridgeClosed => write!(f, "Host bridge closed"),
            Self::Spawn(e) => write!(f, "Failed to spawn dispatcher: {e}"),
            Self::DispatcherPanicked => write!(f, "Dispatcher thread panicked"),
        }
    }
}

impl std::error::Error for CollabError {}
