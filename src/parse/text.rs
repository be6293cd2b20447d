// src/parse/text.rs

//! Text helpers shared by the format parsers.
//!
//! Every helper works on byte offsets into the original text so that
//! positions returned to callers point into the file as it is on disk.

/// Lines of `text` with the byte offset of their first character.
///
/// Trailing `\r` is stripped from each line.
pub fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split('\n').map(move |line| {
        let start = offset;
        offset += line.len() + 1;
        (start, line.strip_suffix('\r').unwrap_or(line))
    })
}

/// Offset of `inner` inside `outer`, where `inner` is a sub-slice of `outer`.
pub fn subslice_offset(outer: &str, inner: &str) -> usize {
    (inner.as_ptr() as usize).saturating_sub(outer.as_ptr() as usize)
}

/// Blank out `//` and `/* */` comments.
///
/// `quotes` lists the characters that open a string literal; comment markers
/// inside strings are left alone. Replaced characters become spaces (newlines
/// are kept), so offsets into the result are offsets into `text`.
pub fn blank_c_comments(text: &str, quotes: &[u8]) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    let mut in_string: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(quote) = in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == quote || (b == b'\n' && quote != b'`') {
                in_string = None;
            }
            i += 1;
            continue;
        }

        match b {
            q if quotes.contains(&q) => {
                in_string = Some(q);
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    out[i] = b' ';
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out[i] = b' ';
                out[i + 1] = b' ';
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    if bytes[i] != b'\n' {
                        out[i] = b' ';
                    }
                    i += 1;
                }
                if i < bytes.len() {
                    out[i] = b' ';
                    if i + 1 < out.len() {
                        out[i + 1] = b' ';
                    }
                    i += 2;
                }
            }
            _ => i += 1,
        }
    }

    // Only ASCII bytes were replaced, so UTF-8 validity is preserved.
    String::from_utf8(out).unwrap_or_else(|_| text.to_string())
}

/// JSON-with-comments to plain JSON, keeping byte offsets intact.
///
/// Comments and trailing commas before `}` / `]` become spaces.
pub fn strip_jsonc(text: &str) -> String {
    let blanked = blank_c_comments(text, b"\"");
    let bytes = blanked.as_bytes();
    let mut out = bytes.to_vec();
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b',' if !in_string => {
                if matches!(next_significant(bytes, i + 1), Some(b'}') | Some(b']')) {
                    out[i] = b' ';
                }
            }
            _ => {}
        }
        i += 1;
    }

    String::from_utf8(out).unwrap_or(blanked)
}

/// Blank out `<!-- -->` comments in XML text, keeping offsets intact.
pub fn blank_xml_comments(text: &str) -> String {
    let mut out = text.as_bytes().to_vec();
    let mut search = 0;
    while let Some(rel) = text.get(search..).and_then(|t| t.find("<!--")) {
        let start = search + rel;
        let end = text[start..]
            .find("-->")
            .map(|e| start + e + 3)
            .unwrap_or(text.len());
        for b in out[start..end].iter_mut() {
            if *b != b'\n' {
                *b = b' ';
            }
        }
        search = end;
    }
    String::from_utf8(out).unwrap_or_else(|_| text.to_string())
}

/// First byte at or after `j` that is neither whitespace nor inside a comment.
fn next_significant(bytes: &[u8], mut j: usize) -> Option<u8> {
    loop {
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        match (bytes.get(j), bytes.get(j + 1)) {
            (Some(b'/'), Some(b'/')) => {
                while j < bytes.len() && bytes[j] != b'\n' {
                    j += 1;
                }
            }
            (Some(b'/'), Some(b'*')) => {
                j += 2;
                while j < bytes.len() && !(bytes[j] == b'*' && bytes.get(j + 1) == Some(&b'/')) {
                    j += 1;
                }
                j += 2;
            }
            (b, _) => return b.copied(),
        }
    }
}

/// Offset of the first quoted occurrence of `name` at or after `from`.
///
/// Both `'name'` and `"name"` are accepted. The returned offset points at the
/// first character of the name, not at the quote.
pub fn find_quoted(text: &str, name: &str, from: usize) -> Option<usize> {
    let hay = text.get(from..)?;
    let double = format!("\"{name}\"");
    let single = format!("'{name}'");
    let hits = [hay.find(&double), hay.find(&single)];
    hits.into_iter().flatten().min().map(|i| from + i + 1)
}

/// Offset of the JSON key `"key"` inside the object introduced by
/// `"container"`. Points at the first character of the key.
pub fn json_key_offset(text: &str, container: &str, key: &str) -> Option<usize> {
    let container_at = find_json_key(text, container, 0)?;
    find_json_key(text, key, container_at + container.len())
}

/// Offset of `"key"` followed by optional whitespace and a colon.
pub fn find_json_key(text: &str, key: &str, from: usize) -> Option<usize> {
    let needle = format!("\"{key}\"");
    let mut search = from;
    while let Some(rel) = text.get(search..)?.find(&needle) {
        let at = search + rel;
        let rest = &text[at + needle.len()..];
        if rest.trim_start().starts_with(':') {
            return Some(at + 1);
        }
        search = at + needle.len();
    }
    None
}

/// Offset of a JSON string value `"value"` that follows `"key":`.
pub fn find_json_value(text: &str, key: &str, value: &str) -> Option<usize> {
    let key_needle = format!("\"{key}\"");
    let value_needle = format!("\"{value}\"");
    let mut search = 0;
    while let Some(rel) = text.get(search..)?.find(&key_needle) {
        let at = search + rel;
        let rest = &text[at + key_needle.len()..];
        let trimmed = rest.trim_start();
        if let Some(after_colon) = trimmed.strip_prefix(':') {
            let value_part = after_colon.trim_start();
            if value_part.starts_with(&value_needle) {
                return Some(subslice_offset(text, value_part) + 1);
            }
        }
        search = at + key_needle.len();
    }
    None
}
