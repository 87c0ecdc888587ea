//! Cursor-relative text helpers shared by the IDE queries.

use text_size::{TextRange, TextSize};
use unicode_ident::{is_xid_continue, is_xid_start};

fn is_ident_start(c: char) -> bool {
    c == '_' || is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || is_xid_continue(c)
}

/// The identifier containing (or ending at) `offset`, with its range.
pub fn word_at(text: &str, offset: TextSize) -> Option<(&str, TextRange)> {
    let offset = usize::from(offset).min(text.len());
    let start = text[..offset]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_continue(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(offset);
    let end = text[offset..]
        .char_indices()
        .find(|(_, c)| !is_ident_continue(*c))
        .map(|(i, _)| offset + i)
        .unwrap_or(text.len());
    if start == end {
        return None;
    }
    let word = &text[start..end];
    if !word.chars().next().is_some_and(is_ident_start) {
        return None;
    }
    Some((
        word,
        TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32)),
    ))
}

/// Identifier characters immediately before `offset` (the completion
/// prefix). Empty when the cursor does not follow identifier text.
pub fn prefix_at(text: &str, offset: TextSize) -> (&str, TextRange) {
    let offset = usize::from(offset).min(text.len());
    let start = text[..offset]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_continue(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(offset);
    (
        &text[start..offset],
        TextRange::new(TextSize::new(start as u32), TextSize::new(offset as u32)),
    )
}

/// Byte offset of the `.` directly before the completion prefix, if the
/// cursor is in attribute position (`value.<prefix>`).
pub fn attribute_dot_before(text: &str, prefix_start: TextSize) -> Option<TextSize> {
    let at = usize::from(prefix_start);
    if at > 0 && text.as_bytes().get(at - 1) == Some(&b'.') {
        Some(TextSize::new(at as u32 - 1))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_at_middle_and_edges() {
        let text = "foo = bar_baz";
        let (word, range) = word_at(text, TextSize::new(8)).unwrap();
        assert_eq!(word, "bar_baz");
        assert_eq!(range, TextRange::new(TextSize::new(6), TextSize::new(13)));
        // At the end of a word.
        let (word, _) = word_at(text, TextSize::new(3)).unwrap();
        assert_eq!(word, "foo");
        assert!(word_at(text, TextSize::new(4)).is_none());
    }

    #[test]
    fn test_word_rejects_number_start() {
        assert!(word_at("x = 123", TextSize::new(5)).is_none());
    }

    #[test]
    fn test_prefix_at() {
        let text = "value.so";
        let (prefix, range) = prefix_at(text, TextSize::new(8));
        assert_eq!(prefix, "so");
        assert_eq!(range.start(), TextSize::new(6));
        assert_eq!(
            attribute_dot_before(text, range.start()),
            Some(TextSize::new(5))
        );
        let (prefix, _) = prefix_at("x = ", TextSize::new(4));
        assert_eq!(prefix, "");
    }
}
