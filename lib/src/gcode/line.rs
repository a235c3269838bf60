//! Line classification.
//!
//! Every raw line of a sliced file is split into an optional command and an
//! optional comment. Classification only looks at the position of the `;`
//! comment marker; nothing else in the line is interpreted here apart from
//! recognising tool-change commands.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::ops::Range;

/// Comment marker byte.
pub const COMMENT_MARKER: u8 = b';';

/// `T<n>` as the first word of a command.
static TOOL_CHANGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^T(\d+)(?:\s|$)").unwrap());

/// One classified input line.
///
/// The raw bytes are kept verbatim (minus the `\n` terminator) so the line can
/// be written back unchanged; command and comment are ranges into them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GCodeLine {
    raw: Vec<u8>,
    command: Option<Range<usize>>,
    comment: Option<Range<usize>>,
}

impl GCodeLine {
    /// Classify a line. A trailing `\r` or `\n` belongs to neither part.
    pub fn parse(raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        let mut end = raw.len();
        while end > 0 && matches!(raw[end - 1], b'\n' | b'\r') {
            end -= 1;
        }

        if raw.first() == Some(&COMMENT_MARKER) {
            return Self {
                command: None,
                comment: Some(1..end.max(1)),
                raw,
            };
        }

        let (code_end, comment) = match raw[..end].iter().position(|&b| b == COMMENT_MARKER) {
            Some(pos) => (pos, Some(pos + 1..end)),
            None => (end, None),
        };
        let command = trim_range(&raw, 0..code_end);

        Self {
            raw,
            command,
            comment,
        }
    }

    /// The command part, whitespace trimmed.
    pub fn command(&self) -> Option<&[u8]> {
        self.command.clone().map(|r| &self.raw[r])
    }

    /// The comment text after the marker, untrimmed.
    pub fn comment(&self) -> Option<&[u8]> {
        self.comment.clone().map(|r| &self.raw[r])
    }

    /// The original bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Neither command nor comment.
    pub fn is_blank(&self) -> bool {
        self.command.is_none() && self.comment.is_none()
    }

    /// A line that carries a comment and no command.
    pub fn is_comment_only(&self) -> bool {
        self.command.is_none() && self.comment.is_some()
    }

    /// Tool index if the command is a tool change.
    pub fn tool_change(&self) -> Option<usize> {
        self.command().and_then(tool_change)
    }
}

/// Tool index selected by `cmd`, if it is a `T<n>` command.
pub fn tool_change(cmd: &[u8]) -> Option<usize> {
    let caps = TOOL_CHANGE_RE.captures(cmd)?;
    std::str::from_utf8(&caps[1]).ok()?.parse().ok()
}

fn trim_range(raw: &[u8], range: Range<usize>) -> Option<Range<usize>> {
    let slice = &raw[range.clone()];
    let start = slice.iter().position(|b| !b.is_ascii_whitespace())?;
    let end = slice.iter().rposition(|b| !b.is_ascii_whitespace())? + 1;
    Some(range.start + start..range.start + end)
}

/// Stateful classifier that remembers the last tool selected.
#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    last_tool: Option<usize>,
}

impl LineClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `raw`, updating [`last_tool`](Self::last_tool) when it is a
    /// tool change.
    pub fn classify(&mut self, raw: impl Into<Vec<u8>>) -> GCodeLine {
        let line = GCodeLine::parse(raw);
        if let Some(tool) = line.tool_change() {
            self.last_tool = Some(tool);
        }
        line
    }

    /// Tool selected by the most recent tool-change command.
    pub fn last_tool(&self) -> Option<usize> {
        self.last_tool
    }
}

/// Split a file buffer into lines on `\n`.
///
/// A terminating newline does not produce an extra empty line.
pub fn split_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let data = data.strip_suffix(b"\n").unwrap_or(data);
    let empty = data.is_empty();
    data.split(|&b| b == b'\n').filter(move |_| !empty)
}
