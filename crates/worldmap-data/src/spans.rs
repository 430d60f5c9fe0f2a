//! Structural scanner recovering the byte span of each top-level record.
//!
//! Serde drops source positions, so spans are found by a second, shallow
//! pass over the text: bracket depth, strings and comments are tracked, and
//! every element of the top-level list (or every `[[key]]` table in TOML)
//! becomes one span. Callers discard the result when its length does not
//! match the number of deserialized records.

use worldmap_core::id::SourceSpan;

use crate::loader::Format;

pub fn record_spans(text: &str, format: Format, toml_key: &str) -> Vec<SourceSpan> {
    match format {
        Format::Toml => toml_spans(text, toml_key),
        Format::Ron | Format::Json => list_spans(text.as_bytes()),
    }
}

/// Index just past the string starting at `start` (which holds the quote).
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Index just past the comment starting at `start`, or `None` if there is
/// no comment there.
fn skip_comment(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes[start] != b'/' {
        return None;
    }
    match bytes.get(start + 1) {
        Some(b'/') => Some(
            bytes[start..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| start + p + 1),
        ),
        Some(b'*') => Some(
            bytes[start + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len(), |p| start + 2 + p + 2),
        ),
        _ => None,
    }
}

fn list_spans(bytes: &[u8]) -> Vec<SourceSpan> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    // Inside a top-level `#![...]` attribute.
    let mut attribute = false;
    let mut start: Option<usize> = None;
    let mut end = 0usize;

    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_comment(bytes, i) {
            i = next;
            continue;
        }

        let b = bytes[i];
        let in_list = depth == 1 && !attribute;

        if b == b'"' {
            let next = skip_string(bytes, i);
            if in_list && start.is_none() {
                start = Some(i);
            }
            if start.is_some() {
                end = next;
            }
            i = next;
            continue;
        }

        match b {
            b'#' if depth == 0 => attribute = true,
            b'[' | b'(' | b'{' => {
                if in_list && start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            b']' | b')' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if attribute {
                        attribute = false;
                    } else {
                        if let Some(s) = start.take() {
                            spans.push(SourceSpan::new(s, end));
                        }
                        return spans;
                    }
                } else if start.is_some() {
                    end = i + 1;
                }
            }
            b',' if in_list => {
                if let Some(s) = start.take() {
                    spans.push(SourceSpan::new(s, end));
                }
            }
            _ if b.is_ascii_whitespace() => {}
            _ => {
                if in_list && start.is_none() {
                    start = Some(i);
                }
            }
        }

        if start.is_some() && !b.is_ascii_whitespace() && depth >= 1 && b != b',' {
            end = end.max(i + 1);
        }
        i += 1;
    }
    spans
}

fn toml_spans(text: &str, key: &str) -> Vec<SourceSpan> {
    let header = format!("[[{key}]]");
    let nested_table = format!("[{key}.");
    let nested_array = format!("[[{key}.");

    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0usize;
    let mut offset = 0usize;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        let line_start = offset + (line.len() - line.trim_start().len());
        let line_end = offset + line.trim_end().len();
        offset += line.len();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.starts_with('[')
            && !compact.starts_with(&nested_table)
            && !compact.starts_with(&nested_array)
        {
            if let Some(s) = start.take() {
                spans.push(SourceSpan::new(s, end));
            }
            if compact == header {
                start = Some(line_start);
                end = line_end;
            }
        } else if start.is_some() {
            end = line_end;
        }
    }
    if let Some(s) = start {
        spans.push(SourceSpan::new(s, end));
    }
    spans
}
