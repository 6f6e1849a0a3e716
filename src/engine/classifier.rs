//! Per-file content classification: turns file bytes into line counts.

use thiserror::Error;

use crate::LineCounts;
use crate::engine::languages::{CommentSyntax, comment_syntax};
use crate::utils::config::BINARY_SNIFF_LEN;

/// Why a classifier refused a file.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("binary content (NUL byte in the first {0} bytes)")]
    Binary(usize),
    #[error("unsupported content: {0}")]
    Unsupported(String),
}

/// Content analysis invoked by the classifier pool. Must be pure: same content and language in,
/// same counts out, regardless of which worker runs it.
pub trait Classifier: Send + Sync {
    fn classify(&self, content: &[u8], language: &str) -> Result<LineCounts, ClassifyError>;
}

/// Default classifier: counts blank, comment and code lines using the language's comment syntax.
///
/// A line is blank if it is only whitespace, comment if it is inside a block comment or starts
/// with a comment marker, and code otherwise. A line that closes a block comment and then has
/// code after it counts as code. String literals are not tracked.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineClassifier;

impl Classifier for LineClassifier {
    fn classify(&self, content: &[u8], language: &str) -> Result<LineCounts, ClassifyError> {
        if looks_binary(content) {
            return Err(ClassifyError::Binary(BINARY_SNIFF_LEN));
        }
        Ok(count_lines(content, comment_syntax(language)))
    }
}

/// NUL byte within the first [`BINARY_SNIFF_LEN`] bytes.
pub fn looks_binary(content: &[u8]) -> bool {
    let head = &content[..content.len().min(BINARY_SNIFF_LEN)];
    head.contains(&0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineKind {
    Blank,
    Comment,
    Code,
}

/// Count lines of `content` under `syntax`. A trailing newline does not start an extra line.
pub fn count_lines(content: &[u8], syntax: CommentSyntax) -> LineCounts {
    let mut counts = LineCounts::default();
    if content.is_empty() {
        return counts;
    }
    let body = content.strip_suffix(b"\n").unwrap_or(content);
    let mut open_block: Option<&'static str> = None;

    for raw in body.split(|&b| b == b'\n') {
        let (kind, still_open) = classify_line(raw.trim_ascii(), syntax, open_block);
        open_block = still_open;
        counts.lines += 1;
        match kind {
            LineKind::Blank => counts.blank += 1,
            LineKind::Comment => counts.comment += 1,
            LineKind::Code => counts.code += 1,
        }
    }
    counts
}

/// Classify one trimmed line. `open_block` is the end delimiter of a block comment still open
/// from a previous line; the returned delimiter is the one still open after this line.
fn classify_line(
    line: &[u8],
    syntax: CommentSyntax,
    open_block: Option<&'static str>,
) -> (LineKind, Option<&'static str>) {
    if let Some(end) = open_block {
        return match find(line, end.as_bytes()) {
            None => (LineKind::Comment, Some(end)),
            Some(pos) => {
                let rest = line[pos + end.len()..].trim_ascii();
                match classify_line(rest, syntax, None) {
                    (LineKind::Code, still_open) => (LineKind::Code, still_open),
                    (_, still_open) => (LineKind::Comment, still_open),
                }
            }
        };
    }

    if line.is_empty() {
        return (LineKind::Blank, None);
    }

    for &(start, end) in syntax.block {
        if let Some(after_start) = line.strip_prefix(start.as_bytes()) {
            return match find(after_start, end.as_bytes()) {
                None => (LineKind::Comment, Some(end)),
                Some(pos) => {
                    let rest = after_start[pos + end.len()..].trim_ascii();
                    match classify_line(rest, syntax, None) {
                        (LineKind::Code, still_open) => (LineKind::Code, still_open),
                        (_, still_open) => (LineKind::Comment, still_open),
                    }
                }
            };
        }
    }

    if syntax
        .line
        .iter()
        .any(|prefix| line.starts_with(prefix.as_bytes()))
    {
        return (LineKind::Comment, None);
    }

    (LineKind::Code, trailing_open_block(line, syntax))
}

/// For a code line: the end delimiter of a block comment opened on it and left unclosed.
fn trailing_open_block(line: &[u8], syntax: CommentSyntax) -> Option<&'static str> {
    let mut rest = line;
    loop {
        let (pos, start, end) = syntax
            .block
            .iter()
            .filter_map(|&(start, end)| find(rest, start.as_bytes()).map(|pos| (pos, start, end)))
            .min_by_key(|&(pos, _, _)| pos)?;
        let after_start = &rest[pos + start.len()..];
        match find(after_start, end.as_bytes()) {
            None => return Some(end),
            Some(close) => rest = &after_start[close + end.len()..],
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
