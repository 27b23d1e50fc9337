//! core-chars: Unicode code-point predicates shared by the scanner layers.
//!
//! Everything here is pure and allocation-free at call time. The only state
//! is the lazily built low-plane emoji bitmap; building it costs one pass
//! over the range table on first use.
//!
//! Terminology used across the workspace:
//! * *delimiter* — a character that separates words (whitespace plus the
//!   splitting punctuation set below).
//! * *word bound* — string start/end, whitespace, or a delimiter. Entity
//!   recognizers (mention, command, hashtag, link) only fire at a left word
//!   bound.
//! * *start/end bound* — the Markdown marker legality classes: a marker
//!   opens only after a start-bound character and closes only before an
//!   end-bound character.

use once_cell::sync::Lazy;

pub mod emoji_plane;

pub use emoji_plane::is_low_plane_emoji;

/// Splitting punctuation. `_`, `-`, `+` are intentionally absent: they are
/// word characters in mention payloads, hostnames and identifiers.
const DELIMITER_PUNCT: &[char] = &[
    ',', '.', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'', '«', '»',
    '„', '“', '”', '‘', '’', '…', '*', '~', '`',
];

/// Punctuation that terminates a phrase; a Markdown marker followed by one of
/// these still closes, but a marker cannot open right after one.
const CLOSER_PUNCT: &[char] = &[')', ']', '}', '.', ',', ':', ';', '!', '?'];

/// Characters excluded from URL bodies besides whitespace and controls.
const URL_ILLEGAL: &[char] = &['<', '>', '"', '`'];

pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

/// True for characters that split words: whitespace or splitting punctuation.
pub fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || DELIMITER_PUNCT.contains(&c)
}

/// Punctuation in the classifier sense. Excludes `_`, `-`, `+`.
pub fn is_punctuation(c: char) -> bool {
    if matches!(c, '_' | '-' | '+') {
        return false;
    }
    c.is_ascii_punctuation() || DELIMITER_PUNCT.contains(&c)
}

/// A position is word-bounded on the left when there is no preceding
/// character or the preceding character is a delimiter.
pub fn is_word_bound(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => is_delimiter(c),
    }
}

/// Closer-class punctuation (see [`is_start_bound_char`]).
pub fn is_closer_punct(c: char) -> bool {
    CLOSER_PUNCT.contains(&c)
}

/// Marker opener legality: whitespace, an opening bracket, or punctuation
/// outside the closer class.
pub fn is_start_bound_char(c: char) -> bool {
    if c.is_whitespace() || matches!(c, '(' | '[' | '{') {
        return true;
    }
    is_punctuation(c) && !is_closer_punct(c)
}

/// Marker closer legality for the character *after* the marker. `None`
/// stands for end of input.
pub fn is_end_bound_char(c: Option<char>) -> bool {
    match c {
        None => true,
        Some(c) => is_delimiter(c) || is_punctuation(c),
    }
}

/// URL body characters: any non-control, non-whitespace scalar except the
/// few that terminate links in running text. Trailing punctuation and
/// bracket balancing are handled by the link recognizer, not here.
pub fn is_url_legal(c: char) -> bool {
    !c.is_whitespace() && !c.is_control() && !URL_ILLEGAL.contains(&c)
}

/// The full scalar at byte offset `at`, if `at` is a char boundary inside
/// `s`. Surrogate halves cannot occur in Rust strings, so this is a plain
/// decode.
pub fn code_point_at(s: &str, at: usize) -> Option<char> {
    s.get(at..).and_then(|rest| rest.chars().next())
}

/// The scalar ending at byte offset `at` (the one visually before the
/// position), if any.
pub fn prev_code_point(s: &str, at: usize) -> Option<char> {
    s.get(..at).and_then(|head| head.chars().next_back())
}

/// Low-plane emoji membership for any scalar (delegates to the bitmap below
/// U+10000, always false above).
pub fn is_bmp_emoji(c: char) -> bool {
    let cp = c as u32;
    cp < 0x10000 && is_low_plane_emoji(cp)
}

/// One-shot sanity check that the range table is sorted and disjoint, used
/// by the bitmap builder in debug builds.
pub(crate) static RANGES_SORTED: Lazy<bool> = Lazy::new(|| {
    emoji_plane::LOW_PLANE_RANGES
        .windows(2)
        .all(|w| w[0].1 < w[1].0)
});
