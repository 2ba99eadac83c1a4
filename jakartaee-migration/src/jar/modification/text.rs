//! Qualified-name substitution over raw bytes.
//!
//! Works on anything that spells class names in ASCII: Java sources, JSPs,
//! XML descriptors, manifest values, service files and class-file `Utf8`
//! constants (both `javax.servlet.Foo` and `Ljavax/servlet/Foo;` forms).
//! Bytes outside a rewritten name are copied untouched, so encodings and line
//! endings survive.

use std::ops::Range;

use crate::mapping::MappingTable;

/// Rewrite every mapped qualified name in `input`.
///
/// Returns `None` when nothing matched, so callers can keep the original
/// buffer and report the artifact as unchanged.
pub fn rewrite_names(input: &[u8], table: &MappingTable) -> Option<Vec<u8>> {
    let mut out: Option<Vec<u8>> = None;
    let mut copied = 0;
    let mut pos = 0;

    while pos < input.len() {
        if !is_ident(input[pos]) {
            pos += 1;
            continue;
        }
        let run_end = ident_run_end(input, pos);

        if let Some(hit) = match_at(input, pos, run_end, table) {
            let buffer = out.get_or_insert_with(|| Vec::with_capacity(input.len() + 16));
            buffer.extend_from_slice(&input[copied..hit.span.start]);
            for (i, segment) in hit.target.split('.').enumerate() {
                if i > 0 {
                    buffer.push(hit.separator);
                }
                buffer.extend_from_slice(segment.as_bytes());
            }
            copied = hit.span.end;
            pos = hit.span.end;
        } else {
            pos = run_end;
        }
    }

    let mut buffer = out?;
    buffer.extend_from_slice(&input[copied..]);
    Some(buffer)
}

/// String convenience wrapper over [`rewrite_names`].
pub fn rewrite_str(input: &str, table: &MappingTable) -> Option<String> {
    let rewritten = rewrite_names(input.as_bytes(), table)?;
    // Only ASCII identifier bytes are ever replaced, so UTF-8 stays valid.
    String::from_utf8(rewritten).ok()
}

struct Hit<'t> {
    span: Range<usize>,
    target: &'t str,
    separator: u8,
}

fn match_at<'t>(
    input: &[u8],
    run_start: usize,
    run_end: usize,
    table: &'t MappingTable,
) -> Option<Hit<'t>> {
    if continues_qualified_name(input, run_start) {
        return None;
    }

    let run = &input[run_start..run_end];
    let (start, forced_separator) = if table.is_root(ascii(run)?) {
        (run_start, None)
    } else {
        // Field descriptors glue primitive codes and `L` to the class name.
        let prefix = run
            .iter()
            .position(|b| !matches!(b, b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z'))?;
        if run[prefix] != b'L' || !table.is_root(ascii(&run[prefix + 1..])?) {
            return None;
        }
        (run_start + prefix + 1, Some(b'/'))
    };

    let mut spans = vec![start..run_end];
    let mut separator = forced_separator;
    let mut cursor = run_end;
    while spans.len() < table.max_segments() {
        let Some(&next) = input.get(cursor) else {
            break;
        };
        let allowed = match separator {
            Some(sep) => next == sep,
            None => next == b'.' || next == b'/',
        };
        if !allowed || !input.get(cursor + 1).is_some_and(|b| is_ident(*b)) {
            break;
        }
        separator = Some(next);
        let segment_end = ident_run_end(input, cursor + 1);
        spans.push(cursor + 1..segment_end);
        cursor = segment_end;
    }

    let segments = spans
        .iter()
        .map(|span| ascii(&input[span.clone()]))
        .collect::<Option<Vec<&str>>>()?;
    let matched = table.match_segments(&segments)?;

    Some(Hit {
        span: start..spans[matched.segments - 1].end,
        target: matched.target,
        separator: separator.unwrap_or(b'.'),
    })
}

/// `true` when the run at `pos` is a later segment of some other name,
/// as in `com.javax.servlet` or `org/javax/Foo`.
fn continues_qualified_name(input: &[u8], pos: usize) -> bool {
    pos >= 2 && matches!(input[pos - 1], b'.' | b'/') && is_ident(input[pos - 2])
}

fn ident_run_end(input: &[u8], start: usize) -> usize {
    input[start..]
        .iter()
        .position(|b| !is_ident(*b))
        .map_or(input.len(), |offset| start + offset)
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn ascii(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes).ok()
}
