//! Replace-or-append of a badge inside a text document.

use tracing::{debug, warn};

use crate::badge::{LineScan, find_badge};

/// Result of patching a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub text: String,
    /// False when the document already contained exactly this badge.
    pub changed: bool,
    /// The badge text that was superseded, if one was found.
    pub previous: Option<String>,
}

/// Put `snippet` into `document`.
///
/// The first well-formed badge (of any label, color or style) or placeholder
/// seed is replaced in place; only its byte range changes, so the rest of the line, the line
/// terminator, and every other line stay byte-identical. Without a badge the
/// snippet is appended as a new last line, terminated in the document's line
/// ending style. Lines that mention the badge URL in a shape we do not produce
/// are left alone.
pub fn patch(document: &str, snippet: &str) -> Patch {
    let mut offset = 0;
    for (idx, line) in document.split_inclusive('\n').enumerate() {
        let content = strip_line_ending(line);
        match find_badge(content) {
            LineScan::Badge(found) => {
                let start = offset + found.range.start;
                let end = offset + found.range.end;
                let existing = &document[start..end];
                let changed = existing != snippet;
                debug!(line = idx + 1, changed, "found existing badge");
                let mut text = String::with_capacity(document.len() - existing.len() + snippet.len());
                text.push_str(&document[..start]);
                text.push_str(snippet);
                text.push_str(&document[end..]);
                return Patch {
                    text,
                    changed,
                    previous: Some(existing.to_string()),
                };
            }
            LineScan::Placeholder(range) => {
                let start = offset + range.start;
                let end = offset + range.end;
                debug!(line = idx + 1, "replacing badge placeholder");
                let mut text = String::with_capacity(document.len() - (end - start) + snippet.len());
                text.push_str(&document[..start]);
                text.push_str(snippet);
                text.push_str(&document[end..]);
                return Patch {
                    text,
                    changed: true,
                    previous: Some(document[start..end].to_string()),
                };
            }
            LineScan::Malformed => {
                warn!(line = idx + 1, "ignoring badge line with unrecognised shape");
            }
            LineScan::Absent => {}
        }
        offset += line.len();
    }

    debug!("no badge found, appending");
    let eol = line_ending(document);
    let mut text = String::with_capacity(document.len() + snippet.len() + 2 * eol.len());
    text.push_str(document);
    if !document.is_empty() && !document.ends_with('\n') {
        text.push_str(eol);
    }
    text.push_str(snippet);
    text.push_str(eol);
    Patch {
        text,
        changed: true,
        previous: None,
    }
}

fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

fn line_ending(document: &str) -> &'static str {
    if document.contains("\r\n") { "\r\n" } else { "\n" }
}
