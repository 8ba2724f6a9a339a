//! Wire format for collaborative edits exchanged with the host bridge.
//!
//! Every edit travels as a dictionary keyed by ASCII strings:
//! ```text
//! ┌──────────────────┬──────────┬──────────┬──────────┬──────────┐
//! │ collabedit_type  │ line     │ index    │ length   │ text     │
//! │ string (tag)     │ int32    │ int32    │ int32    │ utf-8    │
//! └──────────────────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Only the keys relevant to the tagged kind are present. Anything the host
//! delivers that is not a dictionary carrying `collabedit_type` is not an edit.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Discriminator key naming the edit kind.
pub const TYPE_KEY: &str = "collabedit_type";
pub const LINE_KEY: &str = "line";
pub const INDEX_KEY: &str = "index";
pub const LENGTH_KEY: &str = "length";
pub const TEXT_KEY: &str = "text";

/// Edit kinds understood on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    AppendLine,
    InsertText,
    RemoveLine,
    DeleteText,
    ReplaceLine,
}

impl EditKind {
    pub const ALL: [EditKind; 5] = [
        EditKind::AppendLine,
        EditKind::InsertText,
        EditKind::RemoveLine,
        EditKind::DeleteText,
        EditKind::ReplaceLine,
    ];

    /// Discriminator string carried in `collabedit_type`.
    pub const fn as_str(self) -> &'static str {
        match self {
            EditKind::AppendLine => "append_line",
            EditKind::InsertText => "insert_text",
            EditKind::RemoveLine => "remove_line",
            EditKind::DeleteText => "delete_text",
            EditKind::ReplaceLine => "replace_line",
        }
    }

    /// Resolve a discriminator string. Matching is exact and case-sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Keys a well-formed message of this kind carries, discriminator first.
    pub const fn keys(self) -> &'static [&'static str] {
        match self {
            EditKind::AppendLine | EditKind::ReplaceLine => &[TYPE_KEY, LINE_KEY, TEXT_KEY],
            EditKind::InsertText => &[TYPE_KEY, LINE_KEY, INDEX_KEY, TEXT_KEY],
            EditKind::RemoveLine => &[TYPE_KEY, LINE_KEY],
            EditKind::DeleteText => &[TYPE_KEY, LINE_KEY, INDEX_KEY, LENGTH_KEY],
        }
    }
}

impl std::fmt::Display for EditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value as the host bridge hands it over.
///
/// Edits only ever contain `Str` and `Int`, but inbound traffic is untrusted
/// and may carry any host type. Serialized untagged so a JSON document maps
/// directly onto it; integers outside the `i32` range fall through to
/// `Double`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Null,
    Bool(bool),
    Int(i32),
    Double(f64),
    Str(String),
    Array(Vec<WireValue>),
    Dictionary(WireMessage),
}

impl WireValue {
    pub fn as_dictionary(&self) -> Option<&WireMessage> {
        match self {
            WireValue::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            WireValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Short host type name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "bool",
            WireValue::Int(_) => "int32",
            WireValue::Double(_) => "double",
            WireValue::Str(_) => "string",
            WireValue::Array(_) => "array",
            WireValue::Dictionary(_) => "dictionary",
        }
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        WireValue::Str(s.to_owned())
    }
}

impl From<String> for WireValue {
    fn from(s: String) -> Self {
        WireValue::Str(s)
    }
}

impl From<i32> for WireValue {
    fn from(i: i32) -> Self {
        WireValue::Int(i)
    }
}

impl From<WireMessage> for WireValue {
    fn from(dict: WireMessage) -> Self {
        WireValue::Dictionary(dict)
    }
}

/// Ordered dictionary of host values. Insertion order is preserved, and
/// setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireMessage {
    entries: IndexMap<String, WireValue>,
}

impl WireMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, returning the previous value if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<WireValue>) -> Option<WireValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder form of [`WireMessage::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<WireValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to a single-line JSON document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl FromIterator<(String, WireValue)> for WireMessage {
    fn from_iter<I: IntoIterator<Item = (String, WireValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parse any JSON document into a host value.
pub fn value_from_json(json: &str) -> Result<WireValue, serde_json::Error> {
    serde_json::from_str(json)
}
