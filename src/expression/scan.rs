//! Placeholder scanning with brace-depth counting.

use super::Replacement;

/// Returns every balanced `${...}` placeholder in `text`, in order.
///
/// Nested braces inside the inner text do not end the match early. An
/// opening `${` without a matching close is left as literal text.
pub(crate) fn placeholders(text: &str) -> Vec<Replacement> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = text.get(cursor..).and_then(|rest| rest.find("${")) {
        let body_start = cursor + offset + 2;
        let body = text.get(body_start..).unwrap_or_default();
        let Some(len) = closing_brace(body) else {
            cursor = body_start;
            continue;
        };
        let inner = body.get(..len).unwrap_or_default();
        if !inner.is_empty() {
            found.push(Replacement::from_inner(inner));
        }
        cursor = body_start + len + 1;
    }
    found
}

fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 1_usize;
    for (index, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}
