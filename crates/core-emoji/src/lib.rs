//! core-emoji: greedy recognition of emoji sequences.
//!
//! The matcher consumes the longest emoji sequence starting at a byte
//! position: a base pictograph (BMP table or the supplementary plane
//! `U+1F000..=U+1FFFF`) with optional skin-tone modifiers and variation
//! selectors, chained through zero-width joiners; regional-indicator pairs
//! (flags, pairs only); keycap sequences; and tag-sequence flags. A partial
//! sequence at end of input yields whatever prefix matched on its own; the
//! unmatched remainder falls through to plain text in the caller.

use core_chars::is_bmp_emoji;

mod alias;

pub use alias::{TEXT_EMOJI, match_text_emoji};

const ZWJ: char = '\u{200D}';
const VS15: char = '\u{FE0E}';
const VS16: char = '\u{FE0F}';
const KEYCAP: char = '\u{20E3}';

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_skin_tone(c: char) -> bool {
    ('\u{1F3FB}'..='\u{1F3FF}').contains(&c)
}

fn is_tag(c: char) -> bool {
    ('\u{E0020}'..='\u{E007E}').contains(&c)
}

const TAG_TERM: char = '\u{E007F}';

/// Base pictograph: tabulated BMP emoji or any supplementary-plane scalar in
/// `U+1F000..=U+1FFFF`. Regional indicators and skin tones are excluded here
/// and handled positionally by the matcher.
fn is_base(c: char) -> bool {
    if is_regional_indicator(c) || is_skin_tone(c) {
        return false;
    }
    is_bmp_emoji(c) || ('\u{1F000}'..='\u{1FFFF}').contains(&c)
}

/// A span recognized by [`annotate`], in code points within the scanned
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmojiHit {
    pub from: usize,
    pub to: usize,
}

/// Match an emoji sequence beginning at byte offset `start`. Returns the
/// exclusive byte end of the longest recognized sequence, or `None`.
pub fn match_emoji(s: &str, start: usize) -> Option<usize> {
    let rest = s.get(start..)?;
    match_len(rest).map(|len| start + len)
}

fn match_len(rest: &str) -> Option<usize> {
    let mut iter = rest.char_indices().peekable();
    let (_, first) = iter.next()?;
    let mut end = first.len_utf8();

    // Keycap: digit / '#' / '*' + VS16 + combining enclosing keycap.
    if first.is_ascii_digit() || first == '#' || first == '*' {
        let mut it = iter.clone();
        if let Some((_, VS16)) = it.next()
            && let Some((i, KEYCAP)) = it.next()
        {
            return Some(i + KEYCAP.len_utf8());
        }
        return None;
    }

    // Flags: regional indicators are consumed in pairs only.
    if is_regional_indicator(first) {
        return match iter.next() {
            Some((i, second)) if is_regional_indicator(second) => Some(i + second.len_utf8()),
            _ => None,
        };
    }

    if !is_base(first) {
        return None;
    }

    // Tag-sequence flags (e.g. subdivision flags): base + tag run + cancel.
    if let Some(&(_, c)) = iter.peek()
        && is_tag(c)
    {
        let mut it = iter.clone();
        let mut tag_end = None;
        for (i, c) in it.by_ref() {
            if is_tag(c) {
                continue;
            }
            if c == TAG_TERM {
                tag_end = Some(i + TAG_TERM.len_utf8());
            }
            break;
        }
        // A malformed tag run (no terminator) leaves just the base matched.
        return Some(tag_end.unwrap_or(end));
    }

    end = consume_modifiers(&mut iter, end);

    // ZWJ chain: each link must be followed by another base unit, otherwise
    // the joiner is left unconsumed.
    loop {
        let Some(&(zwj_at, ZWJ)) = iter.peek() else {
            break;
        };
        let mut it = iter.clone();
        it.next(); // the joiner
        let Some((_, next)) = it.next() else { break };
        if !(is_base(next) || is_regional_indicator(next)) {
            break;
        }
        let mut link_end = zwj_at + ZWJ.len_utf8() + next.len_utf8();
        link_end = consume_modifiers(&mut it, link_end);
        iter = it;
        end = link_end;
    }

    Some(end)
}

/// Consume optional skin tones and variation selectors after a base unit.
fn consume_modifiers(
    iter: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    mut end: usize,
) -> usize {
    while let Some(&(i, c)) = iter.peek() {
        if is_skin_tone(c) || c == VS15 || c == VS16 {
            end = i + c.len_utf8();
            iter.next();
        } else {
            break;
        }
    }
    end
}

/// Scan a whole value and report every emoji sequence as code-point spans.
/// Used when a token value is rebuilt outside the parser (custom-link edits,
/// fragment ingestion).
pub fn annotate(value: &str) -> Vec<EmojiHit> {
    let mut hits = Vec::new();
    let mut byte = 0;
    let mut cp = 0;
    while byte < value.len() {
        if let Some(end) = match_emoji(value, byte) {
            let run = &value[byte..end];
            let run_cps = run.chars().count();
            hits.push(EmojiHit {
                from: cp,
                to: cp + run_cps,
            });
            byte = end;
            cp += run_cps;
        } else {
            let c = value[byte..].chars().next().expect("in-bounds scan");
            byte += c.len_utf8();
            cp += 1;
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn matches_whole(s: &str) {
        assert_eq!(match_emoji(s, 0), Some(s.len()), "{s:?} should match fully");
    }

    #[test]
    fn simple_pictographs() {
        matches_whole("😀");
        matches_whole("🚀");
        matches_whole("☀");
        matches_whole("⚙️"); // gear + VS16
        matches_whole("☂️");
    }

    #[test]
    fn skin_tones_and_selectors() {
        matches_whole("👋🏽");
        matches_whole("👍🏿");
        matches_whole("✌🏻");
        matches_whole("☝🏼");
    }

    #[test]
    fn zwj_sequences() {
        matches_whole("👨‍👩‍👧‍👦");
        matches_whole("👩‍❤️‍💋‍👨");
        matches_whole("🧑🏿‍🦲");
        matches_whole("🏳️‍🌈");
        matches_whole("👁️‍🗨️");
    }

    #[test]
    fn flags_pair_only() {
        matches_whole("🇷🇺");
        matches_whole("🇺🇸");
        // A lone regional indicator is not an emoji.
        assert_eq!(match_emoji("🇷 x", 0), None);
    }

    #[test]
    fn keycaps() {
        matches_whole("1️⃣");
        matches_whole("#️⃣");
        matches_whole("*️⃣");
        // Bare digit is plain text.
        assert_eq!(match_emoji("7 dwarves", 0), None);
    }

    #[test]
    fn tag_sequence_flags() {
        matches_whole("🏴󠁧󠁢󠁥󠁮󠁧󠁿"); // England
    }

    #[test]
    fn partial_sequences_consume_prefix() {
        // Trailing joiner with nothing after it stays unconsumed.
        let s = "😀\u{200D}";
        assert_eq!(match_emoji(s, 0), Some("😀".len()));
        // Joiner followed by a non-emoji likewise.
        let s = "😀\u{200D}a";
        assert_eq!(match_emoji(s, 0), Some("😀".len()));
    }

    #[test]
    fn non_emoji_inputs() {
        assert_eq!(match_emoji("abc", 0), None);
        assert_eq!(match_emoji("#tag", 0), None);
        assert_eq!(match_emoji("*bold*", 0), None);
    }

    #[test]
    fn annotate_reports_code_point_spans() {
        let hits = annotate("a😀b👨‍👩‍👧‍👦");
        assert_eq!(
            hits,
            vec![EmojiHit { from: 1, to: 2 }, EmojiHit { from: 3, to: 10 }]
        );
    }
}
