//! Stand-in editor core: an in-memory line buffer that applies edits.
//!
//! Lines are zero-based. Column indices and lengths count `char`s, so
//! multi-byte text never splits inside a code point.

use collabedit::Edit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    LineOutOfRange { line: usize, lines: usize },
    IndexOutOfRange { line: usize, index: usize, len: usize },
}

impl std::fmt::Display for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineOutOfRange { line, lines } => {
                write!(f, "Line {line} out of range ({lines} lines)")
            }
            Self::IndexOutOfRange { line, index, len } => {
                write!(f, "Index {index} out of range on line {line} ({len} chars)")
            }
        }
    }
}

impl std::error::Error for ApplyError {}

#[derive(Debug, Default)]
pub struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn apply(&mut self, edit: &Edit) -> Result<(), ApplyError> {
        match edit {
            Edit::AppendLine { line, text } => {
                let line = line.as_usize();
                if line > self.lines.len() {
                    return Err(self.line_error(line));
                }
                self.lines.insert(line, text.clone());
            }
            Edit::InsertText { line, index, text } => {
                let (line, index) = (line.as_usize(), index.as_usize());
                let target = self.line_mut(line)?;
                let at = byte_offset(target, index).ok_or(ApplyError::IndexOutOfRange {
                    line,
                    index,
                    len: target.chars().count(),
                })?;
                target.insert_str(at, text);
            }
            Edit::RemoveLine { line } => {
                let line = line.as_usize();
                if line >= self.lines.len() {
                    return Err(self.line_error(line));
                }
                self.lines.remove(line);
            }
            Edit::DeleteText { line, index, length } => {
                let (line, index, length) = (line.as_usize(), index.as_usize(), length.as_usize());
                let target = self.line_mut(line)?;
                let len = target.chars().count();
                let end = index.saturating_add(length);
                let (Some(start), Some(stop)) = (byte_offset(target, index), byte_offset(target, end)) else {
                    return Err(ApplyError::IndexOutOfRange { line, index: end, len });
                };
                target.replace_range(start..stop, "");
            }
            Edit::ReplaceLine { line, text } => {
                let target = self.line_mut(line.as_usize())?;
                *target = text.clone();
            }
        }
        Ok(())
    }

    fn line_mut(&mut self, line: usize) -> Result<&mut String, ApplyError> {
        let lines = self.lines.len();
        self.lines
            .get_mut(line)
            .ok_or(ApplyError::LineOutOfRange { line, lines })
    }

    fn line_error(&self, line: usize) -> ApplyError {
        ApplyError::LineOutOfRange {
            line,
            lines: self.lines.len(),
        }
    }
}

/// Byte offset of char `index`, allowing one past the end.
fn byte_offset(s: &str, index: usize) -> Option<usize> {
    if index == 0 {
        return Some(0);
    }
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(index)
}
