//! In-process representation of a single collaborative edit.
//!
//! An [`EditOperation`] pairs the target document with exactly one [`Edit`]
//! variant. Numeric fields are [`Position`]s, which can only hold values that
//! are valid both as document coordinates and as wire `int32`s, so encoding an
//! edit can never fail or truncate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::EditKind;

/// Non-negative line number, column index, or length carried by an edit.
///
/// Always within `0..=i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Position(i32);

impl Position {
    pub const ZERO: Position = Position(0);
    pub const MAX: Position = Position(i32::MAX);

    /// Build from a raw host integer, rejecting negatives.
    pub fn new(field: &'static str, raw: i32) -> Result<Self, InvalidField> {
        if raw < 0 {
            return Err(InvalidField { field, value: i64::from(raw) });
        }
        Ok(Position(raw))
    }

    /// Build from any integer, rejecting negatives and values past `i32::MAX`.
    pub fn from_i64(field: &'static str, raw: i64) -> Result<Self, InvalidField> {
        match i32::try_from(raw) {
            Ok(v) if v >= 0 => Ok(Position(v)),
            _ => Err(InvalidField { field, value: raw }),
        }
    }

    pub const fn get(self) -> u32 {
        self.0 as u32
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Wire representation.
    pub const fn to_i32(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Position {
    type Error = InvalidField;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Position::from_i64("position", raw)
    }
}

impl TryFrom<u32> for Position {
    type Error = InvalidField;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Position::from_i64("position", i64::from(raw))
    }
}

impl From<Position> for i32 {
    fn from(pos: Position) -> i32 {
        pos.0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A numeric edit field held a value that cannot name a document position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidField {
    pub field: &'static str,
    pub value: i64,
}

impl std::fmt::Display for InvalidField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid value {} for field '{}'", self.value, self.field)
    }
}

impl std::error::Error for InvalidField {}

/// Routing handle for the document an edit targets.
///
/// This is only an identifier; the editor core owns the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef(Uuid);

impl DocumentRef {
    pub fn new() -> Self {
        DocumentRef(Uuid::new_v4())
    }

    pub const fn from_uuid(id: Uuid) -> Self {
        DocumentRef(id)
    }

    pub const fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for DocumentRef {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The five edit kinds and their payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edit {
    /// Insert a new line after `line`
    AppendLine { line: Position, text: String },
    /// Insert `text` at column `index` of `line`
    InsertText { line: Position, index: Position, text: String },
    /// Remove `line` entirely
    RemoveLine { line: Position },
    /// Delete `length` characters starting at column `index` of `line`
    DeleteText { line: Position, index: Position, length: Position },
    /// Replace the contents of `line`
    ReplaceLine { line: Position, text: String },
}

impl Edit {
    pub fn kind(&self) -> EditKind {
        match self {
            Edit::AppendLine { .. } => EditKind::AppendLine,
            Edit::InsertText { .. } => EditKind::InsertText,
            Edit::RemoveLine { .. } => EditKind::RemoveLine,
            Edit::DeleteText { .. } => EditKind::DeleteText,
            Edit::ReplaceLine { .. } => EditKind::ReplaceLine,
        }
    }

    /// Line every edit kind targets.
    pub fn line(&self) -> Position {
        match self {
            Edit::AppendLine { line, .. }
            | Edit::InsertText { line, .. }
            | Edit::RemoveLine { line }
            | Edit::DeleteText { line, .. }
            | Edit::ReplaceLine { line, .. } => *line,
        }
    }

    /// Text payload, for the kinds that carry one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Edit::AppendLine { text, .. }
            | Edit::InsertText { text, .. }
            | Edit::ReplaceLine { text, .. } => Some(text),
            Edit::RemoveLine { .. } | Edit::DeleteText { .. } => None,
        }
    }
}

/// One collaborative edit addressed to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    pub document: DocumentRef,
    pub edit: Edit,
}

impl EditOperation {
    pub fn new(document: DocumentRef, edit: Edit) -> Self {
        Self { document, edit }
    }

    pub fn append_line(document: DocumentRef, line: i32, text: impl Into<String>) -> Result<Self, InvalidField> {
        Ok(Self::new(
            document,
            Edit::AppendLine {
                line: Position::new("line", line)?,
                text: text.into(),
            },
        ))
    }

    pub fn insert_text(
        document: DocumentRef,
        line: i32,
        index: i32,
        text: impl Into<String>,
    ) -> Result<Self, InvalidField> {
        Ok(Self::new(
            document,
            Edit::InsertText {
                line: Position::new("line", line)?,
                index: Position::new("index", index)?,
                text: text.into(),
            },
        ))
    }

    pub fn remove_line(document: DocumentRef, line: i32) -> Result<Self, InvalidField> {
        Ok(Self::new(
            document,
            Edit::RemoveLine {
                line: Position::new("line", line)?,
            },
        ))
    }

    pub fn delete_text(document: DocumentRef, line: i32, index: i32, length: i32) -> Result<Self, InvalidField> {
        Ok(Self::new(
            document,
            Edit::DeleteText {
                line: Position::new("line", line)?,
                index: Position::new("index", index)?,
                length: Position::new("length", length)?,
            },
        ))
    }

    pub fn replace_line(document: DocumentRef, line: i32, text: impl Into<String>) -> Result<Self, InvalidField> {
        Ok(Self::new(
            document,
            Edit::ReplaceLine {
                line: Position::new("line", line)?,
                text: text.into(),
            },
        ))
    }

    pub fn kind(&self) -> EditKind {
        self.edit.kind()
    }
}
