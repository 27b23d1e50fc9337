//! Text-emoji aliases: fixed ASCII emoticon table mapped to pictographs.
//!
//! Ordered longest-first so greedy matching prefers `:-)` over `:-`.
//! Callers check the left word bound; the right bound is checked here.

use core_chars::is_word_bound;

/// `(alias, emoji)` pairs. The table is fixed; it is not configuration.
pub const TEXT_EMOJI: &[(&str, &str)] = &[
    (":'-(", "😢"),
    (":'(", "😢"),
    (":-)", "🙂"),
    (":-(", "🙁"),
    (":-D", "😀"),
    (":-P", "😛"),
    (":-p", "😛"),
    (":-*", "😘"),
    (":-O", "😮"),
    (":-o", "😮"),
    (";-)", "😉"),
    ("8-)", "😎"),
    ("B-)", "😎"),
    (":)", "🙂"),
    (":(", "🙁"),
    (":D", "😀"),
    (":P", "😛"),
    (":p", "😛"),
    (":*", "😘"),
    (":O", "😮"),
    (":o", "😮"),
    (";)", "😉"),
    ("<3", "❤️"),
    (":|", "😐"),
];

/// Match a text emoji at byte offset `start`. Returns the exclusive byte end
/// of the alias and the pictograph it stands for. The alias must be followed
/// by a word bound; the caller is responsible for the left bound.
pub fn match_text_emoji(s: &str, start: usize) -> Option<(usize, &'static str)> {
    let rest = s.get(start..)?;
    for &(alias, emoji) in TEXT_EMOJI {
        if let Some(after) = rest.strip_prefix(alias) {
            if is_word_bound(after.chars().next()) {
                return Some((start + alias.len(), emoji));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_at_word_bound() {
        assert_eq!(match_text_emoji(":) ok", 0), Some((2, "🙂")));
        assert_eq!(match_text_emoji(":)", 0), Some((2, "🙂")));
        assert_eq!(match_text_emoji("a :-D!", 2), Some((5, "😀")));
    }

    #[test]
    fn longest_alias_wins() {
        assert_eq!(match_text_emoji(":-) x", 0), Some((3, "🙂")));
    }

    #[test]
    fn rejects_mid_word() {
        // `:)x` — the alias runs into a word character.
        assert_eq!(match_text_emoji(":)x", 0), None);
    }
}
