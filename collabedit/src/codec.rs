//! Translation between [`EditOperation`] and the wire dictionary.
//!
//! `encode` is total. `decode` never panics on untrusted input: every
//! failure is a [`DecodeOutcome`]. Unrecognized extra keys on an inbound
//! message are ignored.

use crate::edit::{DocumentRef, Edit, EditOperation, Position};
use crate::error::DecodeOutcome;
use crate::protocol::{
    EditKind, WireMessage, WireValue, INDEX_KEY, LENGTH_KEY, LINE_KEY, TEXT_KEY, TYPE_KEY,
};

/// Stateless apart from the document decoded edits are addressed to.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    target: DocumentRef,
}

impl Codec {
    pub fn new(target: DocumentRef) -> Self {
        Self { target }
    }

    /// Document assigned to every decoded edit.
    pub fn target(&self) -> DocumentRef {
        self.target
    }

    /// Turn an edit into its wire dictionary.
    pub fn encode(&self, op: &EditOperation) -> WireMessage {
        let kind = op.kind();
        let msg = WireMessage::new().with(TYPE_KEY, kind.as_str());
        match &op.edit {
            Edit::AppendLine { line, text } | Edit::ReplaceLine { line, text } => msg
                .with(LINE_KEY, line.to_i32())
                .with(TEXT_KEY, text.as_str()),
            Edit::InsertText { line, index, text } => msg
                .with(LINE_KEY, line.to_i32())
                .with(INDEX_KEY, index.to_i32())
                .with(TEXT_KEY, text.as_str()),
            Edit::RemoveLine { line } => msg.with(LINE_KEY, line.to_i32()),
            Edit::DeleteText { line, index, length } => msg
                .with(LINE_KEY, line.to_i32())
                .with(INDEX_KEY, index.to_i32())
                .with(LENGTH_KEY, length.to_i32()),
        }
    }

    /// Decode any host value into an edit for this codec's document.
    pub fn decode(&self, value: &WireValue) -> Result<EditOperation, DecodeOutcome> {
        let Some(msg) = value.as_dictionary() else {
            return Err(DecodeOutcome::NotAnEdit);
        };
        self.decode_message(msg)
    }

    /// Decode a dictionary into an edit for this codec's document.
    pub fn decode_message(&self, msg: &WireMessage) -> Result<EditOperation, DecodeOutcome> {
        let tag = match msg.get(TYPE_KEY) {
            Some(WireValue::Str(tag)) => tag,
            _ => return Err(DecodeOutcome::NotAnEdit),
        };
        let kind = EditKind::from_tag(tag).ok_or_else(|| DecodeOutcome::UnknownKind(tag.clone()))?;

        let edit = match kind {
            EditKind::AppendLine => Edit::AppendLine {
                line: position(msg, kind, LINE_KEY)?,
                text: text(msg, kind)?,
            },
            EditKind::InsertText => Edit::InsertText {
                line: position(msg, kind, LINE_KEY)?,
                index: position(msg, kind, INDEX_KEY)?,
                text: text(msg, kind)?,
            },
            EditKind::RemoveLine => Edit::RemoveLine {
                line: position(msg, kind, LINE_KEY)?,
            },
            EditKind::DeleteText => Edit::DeleteText {
                line: position(msg, kind, LINE_KEY)?,
                index: position(msg, kind, INDEX_KEY)?,
                length: position(msg, kind, LENGTH_KEY)?,
            },
            EditKind::ReplaceLine => Edit::ReplaceLine {
                line: position(msg, kind, LINE_KEY)?,
                text: text(msg, kind)?,
            },
        };

        Ok(EditOperation::new(self.target, edit))
    }
}

fn position(msg: &WireMessage, kind: EditKind, field: &'static str) -> Result<Position, DecodeOutcome> {
    match msg.get(field) {
        Some(WireValue::Int(raw)) => {
            Position::new(field, *raw).map_err(|e| DecodeOutcome::invalid(kind, e))
        }
        // An integral double outside int32 is an integer the host could not fit.
        Some(WireValue::Double(raw))
            if raw.is_finite() && raw.fract() == 0.0 && (*raw < 0.0 || *raw > i32::MAX as f64) =>
        {
            Err(DecodeOutcome::InvalidField { kind, field, value: *raw as i64 })
        }
        _ => Err(DecodeOutcome::MissingField { kind, field }),
    }
}

fn text(msg: &WireMessage, kind: EditKind) -> Result<String, DecodeOutcome> {
    match msg.get(TEXT_KEY) {
        Some(WireValue::Str(text)) => Ok(text.clone()),
        _ => Err(DecodeOutcome::MissingField { kind, field: TEXT_KEY }),
    }
}
