//! Line extraction from text files
//!
//! Invalid UTF-8 sequences are dropped rather than failing the file. Lines
//! are trimmed; blank lines and lines at or above the length bound are
//! skipped (not truncated) but still advance the line counter, so stored
//! line numbers always match the file on disk.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Default number of lines considered per file
pub const DEFAULT_MAX_LINES: usize = 10_000;

/// Default exclusive bound on retained line length, in characters
pub const DEFAULT_MAX_LINE_CHARS: usize = 1_000;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One retained line of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// 1-based line number in the original file
    pub line_number: i64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    /// Lines after this one are not read
    pub max_lines: usize,
    /// Lines with this many characters or more are dropped
    pub max_line_chars: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            max_line_chars: DEFAULT_MAX_LINE_CHARS,
        }
    }
}

/// Read and filter the lines of a file
pub fn read_lines(path: &Path, limits: &ExtractLimits) -> io::Result<Vec<ContentLine>> {
    let file = File::open(path)?;
    extract_lines(BufReader::new(file), limits)
}

/// Filter the lines produced by `reader`
pub fn extract_lines<R: BufRead>(mut reader: R, limits: &ExtractLimits) -> io::Result<Vec<ContentLine>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    let mut line_number = 0usize;

    while line_number < limits.max_lines {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;

        let mut bytes = buf.as_slice();
        if line_number == 1 {
            bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        }

        let decoded = decode_dropping_invalid(bytes);
        let text = decoded.trim();
        if text.is_empty() || text.chars().count() >= limits.max_line_chars {
            continue;
        }

        lines.push(ContentLine {
            line_number: line_number as i64,
            text: text.to_string(),
        });
    }

    Ok(lines)
}

fn decode_dropping_invalid(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()),
    }
}
