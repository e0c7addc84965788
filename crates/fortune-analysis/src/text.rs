//! Character-safe text helpers.

/// The first `max_chars` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorter_text_is_returned_whole() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn cuts_on_character_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("✨✨✨", 2), "✨✨");
    }

    #[test]
    fn zero_yields_empty() {
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
