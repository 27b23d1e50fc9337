//! core-algebra: pure range operations over token sequences.
//!
//! Every operation takes a sequence by reference, returns a fresh normalized
//! sequence and never panics on user input: ranges are clamped, inverted
//! ranges return the input unchanged with a diagnostic, and positions inside
//! emoji sequences snap outward. Only [`slice`] treats a bad range as a
//! caller contract violation and fails hard.
//!
//! Solid tokens (mention, command, hashtag, user sticker, auto-link) are
//! atomic: formatting and linking address them whole, and a removal forced
//! through their interior demotes the remaining parts to plain text.

use tracing::warn;

use core_parser::{ParserOptions, parse};
use core_tokens::{
    EmojiSpans, Format, RangeError, Token, TokenKind, normalize, text_len,
};

mod locate;
mod rescan;
mod split;

pub use locate::{Side, TokenPos, get_format, snap_pos, sticky_at, token_for_pos, token_start};
use rescan::{WindowEdit, expand_window, plain_opts, rescan, window_eligible};
use split::split_point;

/// Format change: a wholesale replacement or an add/remove delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatUpdate {
    Replace(Format),
    Delta { add: Format, remove: Format },
}

impl FormatUpdate {
    pub fn add(format: Format) -> Self {
        Self::Delta {
            add: format,
            remove: Format::empty(),
        }
    }

    pub fn remove(format: Format) -> Self {
        Self::Delta {
            add: Format::empty(),
            remove: format,
        }
    }

    pub fn apply(&self, to: Format) -> Format {
        match self {
            Self::Replace(f) => *f,
            Self::Delta { add, remove } => (to | *add) & !*remove,
        }
    }
}

/// Result of [`cut_text`].
#[derive(Debug, Clone, PartialEq)]
pub struct CutResult {
    pub cut: Vec<Token>,
    pub tokens: Vec<Token>,
}

/// Insert `text` at `pos`.
///
/// A sticky placeholder at `pos` absorbs the text and dissolves. When the
/// position abuts or sits inside an auto-detected neighborhood, the window
/// around it is re-parsed so entities extend or break naturally (inserting
/// after an auto-link re-parses their union). Custom links grow verbatim
/// when the position is strictly inside them.
pub fn insert_text(tokens: &[Token], pos: usize, text: &str, opts: &ParserOptions) -> Vec<Token> {
    if text.is_empty() {
        return tokens.to_vec();
    }
    if tokens.is_empty() {
        return parse(text, &plain_opts(opts));
    }
    let total = text_len(tokens);
    let pos = snap_pos(tokens, pos.min(total), Side::End);

    // Sticky placeholder absorbs the insertion and loses its flag.
    if let Some(i) = sticky_at(tokens, pos) {
        let mut seq = tokens.to_vec();
        let format = seq[i].format;
        seq[i] = Token::text(text, format);
        return rescan(seq, i, i + 1, WindowEdit::None, opts);
    }

    let end_tp = token_for_pos(tokens, pos, Side::End, false);
    let start_tp = token_for_pos(tokens, pos, Side::Start, false);

    // Sticky-link continuation: abutting insertions extend the link until a
    // delimiter or punctuation breaks it.
    for tp in [end_tp, start_tp].into_iter().flatten() {
        if tokens[tp.index].is_sticky_link() {
            if breaks_sticky(text) {
                let mut seq = tokens.to_vec();
                seq[tp.index] = seq[tp.index].demoted();
                return insert_text(&seq, pos, text, opts);
            }
            return grow_link_value(tokens, tp, text);
        }
    }

    // Strictly inside a custom link: the label grows, the URL stays.
    if let Some(tp) = end_tp
        && tokens[tp.index].is_custom_link()
        && tp.offset > 0
        && tp.offset < tokens[tp.index].char_len()
    {
        return grow_link_value(tokens, tp, text);
    }

    let host = [end_tp, start_tp]
        .into_iter()
        .flatten()
        .find(|tp| window_eligible(&tokens[tp.index]));
    let Some(host) = host else {
        // Barriers on both sides (markdown structure, custom links): splice
        // a plain text token without re-scanning.
        let format = get_format(tokens, pos);
        let mut seq = tokens.to_vec();
        let at = split_point(&mut seq, pos);
        seq.insert(at, Token::text(text, format));
        return normalize(seq);
    };

    let (lo, hi) = expand_window(tokens, host.index, host.index + 1);
    let wstart = token_start(tokens, lo);
    let format = get_format(tokens, pos);
    rescan(
        tokens.to_vec(),
        lo,
        hi,
        WindowEdit::Insert {
            at: pos - wstart,
            text: text.to_owned(),
            format,
        },
        opts,
    )
}

/// Remove `[from, to)`. Boundaries inside an emoji sequence snap outward to
/// its bounds; solids crossed by a boundary lose their cut part and the
/// remainder demotes to plain text; the seam is re-scanned.
pub fn remove_text(tokens: &[Token], from: usize, to: usize, opts: &ParserOptions) -> Vec<Token> {
    let total = text_len(tokens);
    let (from_c, to_c) = (from.min(total), to.min(total));
    if from_c >= to_c {
        if from > to {
            warn!(target: "algebra.op", from, to, "remove_text: inverted range ignored");
        }
        return tokens.to_vec();
    }
    let from = snap_pos(tokens, from_c, Side::Start);
    let to = snap_pos(tokens, to_c, Side::End);

    let mut seq = tokens.to_vec();
    let a = split_point(&mut seq, from);
    let b = split_point(&mut seq, to);
    seq.drain(a..b);
    if seq.is_empty() {
        return seq;
    }
    let (lo, hi) = expand_window(&seq, a.min(seq.len()), a.min(seq.len()));
    if lo == hi {
        return normalize(seq);
    }
    rescan(seq, lo, hi, WindowEdit::None, opts)
}

/// Replace `[from, to)` with `text`. The first inserted token inherits the
/// format of the removed start; inserted text reaching past the first
/// resulting token takes the removed end's format. With `sticky_link`
/// enabled, fully replacing a link's content keeps the link and marks it
/// sticky.
pub fn replace_text(
    tokens: &[Token],
    from: usize,
    to: usize,
    text: &str,
    opts: &ParserOptions,
) -> Vec<Token> {
    let total = text_len(tokens);
    let (from_c, to_c) = (from.min(total), to.min(total));
    if from > to {
        warn!(target: "algebra.op", from, to, "replace_text: inverted range ignored");
        return tokens.to_vec();
    }
    if from_c >= to_c {
        return insert_text(tokens, from_c, text, opts);
    }
    if text.is_empty() {
        return remove_text(tokens, from_c, to_c, opts);
    }
    let from = snap_pos(tokens, from_c, Side::Start);
    let to = snap_pos(tokens, to_c, Side::End);

    // Sticky-link mode: a replacement covering exactly one link token keeps
    // the link alive with the new value.
    if opts.sticky_link
        && let Some(tp) = token_for_pos(tokens, from, Side::Start, false)
        && tp.offset == 0
        && to == from + tokens[tp.index].char_len()
        && let TokenKind::Link { link, .. } = &tokens[tp.index].kind
    {
        let mut seq = tokens.to_vec();
        seq[tp.index] = Token {
            kind: TokenKind::Link {
                link: link.clone(),
                auto: false,
                sticky: true,
            },
            value: text.to_owned(),
            format: tokens[tp.index].format,
            emoji: annotate_value(text),
        };
        return normalize(seq);
    }

    let start_fmt = token_for_pos(tokens, from, Side::Start, false)
        .map(|tp| tokens[tp.index].format)
        .unwrap_or_default();
    let end_fmt = token_for_pos(tokens, to, Side::End, false)
        .map(|tp| tokens[tp.index].format)
        .unwrap_or(start_fmt);

    let mut seq = tokens.to_vec();
    let a = split_point(&mut seq, from);
    let b = split_point(&mut seq, to);
    seq.drain(a..b);

    let ins_len = text.chars().count();
    let out = if seq.is_empty() {
        rescan(
            vec![Token::text(text, start_fmt)],
            0,
            1,
            WindowEdit::None,
            opts,
        )
    } else {
        let (lo, hi) = expand_window(&seq, a.min(seq.len()), a.min(seq.len()));
        if lo == hi {
            let at = a.min(seq.len());
            seq.insert(at, Token::text(text, start_fmt));
            normalize(seq)
        } else {
            let wstart = token_start(&seq, lo);
            rescan(
                seq,
                lo,
                hi,
                WindowEdit::Insert {
                    at: from - wstart,
                    text: text.to_owned(),
                    format: start_fmt,
                },
                opts,
            )
        }
    };

    // End-format continuation: the part of the insertion past the first
    // resulting token picks up the removed end's format.
    if end_fmt != start_fmt
        && let Some(tp) = token_for_pos(&out, from, Side::Start, false)
    {
        let first_end = token_start(&out, tp.index) + out[tp.index].char_len();
        let ins_end = from + ins_len;
        if first_end < ins_end {
            return set_format(
                &out,
                FormatUpdate::Replace(end_fmt),
                first_end,
                ins_end - first_end,
            );
        }
    }
    out
}

/// Sub-sequence for `[from, to)`. Partially covered non-text tokens at the
/// ends are demoted to plain text. A bad range is a contract violation.
pub fn slice(tokens: &[Token], from: usize, to: usize) -> Result<Vec<Token>, RangeError> {
    let total = text_len(tokens);
    if from > to {
        return Err(RangeError::Inverted { from, to });
    }
    if to > total {
        return Err(RangeError::OutOfBounds {
            from,
            to,
            len: total,
        });
    }
    Ok(slice_clamped(tokens, from, to))
}

fn slice_clamped(tokens: &[Token], from: usize, to: usize) -> Vec<Token> {
    let from = snap_pos(tokens, from, Side::Start);
    let to = snap_pos(tokens, to, Side::End);
    if from >= to {
        return Vec::new();
    }
    let from_interior = token_for_pos(tokens, from, Side::Start, false)
        .is_some_and(|tp| tp.offset > 0 && !tokens[tp.index].is_text());
    let to_interior = token_for_pos(tokens, to, Side::End, false)
        .is_some_and(|tp| tp.offset < tokens[tp.index].char_len() && !tokens[tp.index].is_text());

    let mut seq = tokens.to_vec();
    let a = split_point(&mut seq, from);
    let b = split_point(&mut seq, to);
    let mut middle: Vec<Token> = seq[a..b].to_vec();
    if from_interior
        && let Some(first) = middle.first_mut()
    {
        *first = first.demoted();
    }
    if to_interior
        && let Some(last) = middle.last_mut()
    {
        *last = last.demoted();
    }
    normalize(middle)
}

/// Slice and remove in one call.
pub fn cut_text(tokens: &[Token], from: usize, to: usize, opts: &ParserOptions) -> CutResult {
    let total = text_len(tokens);
    let (from_c, to_c) = (from.min(total), to.min(total));
    if from_c >= to_c {
        if from > to {
            warn!(target: "algebra.op", from, to, "cut_text: inverted range ignored");
        }
        return CutResult {
            cut: Vec::new(),
            tokens: tokens.to_vec(),
        };
    }
    CutResult {
        cut: slice_clamped(tokens, from_c, to_c),
        tokens: remove_text(tokens, from_c, to_c, opts),
    }
}

/// Apply a format change over `[pos, pos + len)`. With `len == 0` a sticky
/// placeholder carrying the resulting format is inserted at `pos` (replacing
/// any placeholder already there). Non-solid tokens split at the range
/// boundaries; solid tokens take the format whole, including those the
/// boundary lands inside.
pub fn set_format(tokens: &[Token], update: FormatUpdate, pos: usize, len: usize) -> Vec<Token> {
    let total = text_len(tokens);
    let pos = pos.min(total);
    let len = len.min(total - pos);

    if len == 0 {
        let base = get_format(tokens, pos);
        let format = update.apply(base);
        let mut seq = tokens.to_vec();
        if let Some(i) = sticky_at(&seq, pos) {
            seq[i].format = format;
            return normalize(seq);
        }
        let pos = nearest_solid_edge(&seq, pos);
        let at = split_point(&mut seq, pos);
        seq.insert(at, Token::sticky(format));
        return normalize(seq);
    }

    let from = resolve_abs(tokens, pos, Side::Start);
    let to = resolve_abs(tokens, pos + len, Side::End);
    let mut seq = tokens.to_vec();
    let a = split_point(&mut seq, from);
    let b = split_point(&mut seq, to);
    for token in &mut seq[a..b] {
        token.format = update.apply(token.format);
    }
    normalize(seq)
}

/// Annotate `[pos, pos + len)` as a custom link (`url`) or unlink (`None`).
/// Non-solid tokens split at the boundaries; solid tokens (auto-links
/// included) are re-wrapped whole.
pub fn set_link(tokens: &[Token], url: Option<&str>, pos: usize, len: usize) -> Vec<Token> {
    let total = text_len(tokens);
    let pos = pos.min(total);
    let len = len.min(total - pos);
    if len == 0 {
        return tokens.to_vec();
    }
    let from = resolve_abs(tokens, pos, Side::Start);
    let to = resolve_abs(tokens, pos + len, Side::End);
    let mut seq = tokens.to_vec();
    let a = split_point(&mut seq, from);
    let b = split_point(&mut seq, to);
    for token in &mut seq[a..b] {
        match url {
            Some(u) => {
                if !(token.is_newline() || token.is_markdown() || token.is_sticky_text()) {
                    token.kind = TokenKind::Link {
                        link: u.to_owned(),
                        auto: false,
                        sticky: false,
                    };
                }
            }
            None => {
                if matches!(token.kind, TokenKind::Link { .. }) {
                    token.kind = TokenKind::Text { sticky: false };
                }
            }
        }
    }
    normalize(seq)
}

// --- internal helpers ----------------------------------------------------

/// Absolute position with emoji snapping and whole-solid expansion.
fn resolve_abs(tokens: &[Token], pos: usize, side: Side) -> usize {
    match token_for_pos(tokens, pos, side, true) {
        Some(tp) => token_start(tokens, tp.index) + tp.offset,
        None => pos,
    }
}

/// For sticky insertion inside a solid token: the nearer token edge.
fn nearest_solid_edge(tokens: &[Token], pos: usize) -> usize {
    if let Some(tp) = token_for_pos(tokens, pos, Side::Start, false) {
        let token = &tokens[tp.index];
        let len = token.char_len();
        if token.is_solid() && tp.offset > 0 && tp.offset < len {
            let start = token_start(tokens, tp.index);
            return if tp.offset * 2 <= len { start } else { start + len };
        }
    }
    pos
}

/// Sticky links break on a delimiter or punctuation at either end of the
/// inserted text.
fn breaks_sticky(text: &str) -> bool {
    let first = text.chars().next();
    let last = text.chars().next_back();
    [first, last].into_iter().flatten().any(|c| {
        core_chars::is_delimiter(c) || core_chars::is_punctuation(c)
    })
}

/// Splice `text` into a link token's value at `tp.offset`, re-deriving its
/// emoji annotations.
fn grow_link_value(tokens: &[Token], tp: TokenPos, text: &str) -> Vec<Token> {
    let mut seq = tokens.to_vec();
    let token = &mut seq[tp.index];
    let byte = token
        .value
        .char_indices()
        .nth(tp.offset)
        .map(|(i, _)| i)
        .unwrap_or(token.value.len());
    token.value.insert_str(byte, text);
    token.emoji = annotate_value(&token.value);
    normalize(seq)
}

fn annotate_value(value: &str) -> EmojiSpans {
    core_emoji::annotate(value)
        .into_iter()
        .map(|h| core_tokens::EmojiSpan::new(h.from, h.to))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_parser::MentionMode;
    use core_tokens::concat_values;
    use pretty_assertions::assert_eq;

    fn opts() -> ParserOptions {
        ParserOptions {
            link: true,
            mention: MentionMode::On,
            command: true,
            hashtag: true,
            ..ParserOptions::default()
        }
    }

    fn fmts(tokens: &[Token]) -> Vec<(&str, Format)> {
        tokens
            .iter()
            .map(|t| (t.value.as_str(), t.format))
            .collect()
    }

    #[test]
    fn insert_extends_auto_link() {
        let seq = parse("Have you seen mail.ru?", &opts());
        let out = insert_text(&seq, 21, "a", &opts());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value, "Have you seen ");
        assert_eq!(out[1].value, "mail.ru?a");
        assert_eq!(out[1].link_url(), Some("http://mail.ru?a"));
        assert!(out[1].is_auto_link());
    }

    #[test]
    fn insert_into_plain_text() {
        let seq = parse("hello world", &opts());
        let out = insert_text(&seq, 5, ",", &opts());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, "hello, world");
    }

    #[test]
    fn insert_forms_entity_live() {
        let seq = parse("say @bo now", &opts());
        let out = insert_text(&seq, 7, "b", &opts());
        let mention = out.iter().find(|t| matches!(t.kind, TokenKind::Mention { .. }));
        assert_eq!(mention.unwrap().value, "@bob");
    }

    #[test]
    fn sticky_scenario() {
        let seq = vec![Token::text("aa bb cc dd", Format::empty())];
        let with_sticky = set_format(&seq, FormatUpdate::add(Format::BOLD), 3, 0);
        assert_eq!(with_sticky.len(), 3);
        assert!(with_sticky[1].is_sticky_text());
        assert_eq!(with_sticky[1].format, Format::BOLD);

        let out = insert_text(&with_sticky, 3, "123", &opts());
        assert_eq!(
            fmts(&out),
            vec![
                ("aa ", Format::empty()),
                ("123", Format::BOLD),
                ("bb cc dd", Format::empty()),
            ]
        );
        assert!(out.iter().all(|t| !t.is_sticky_text()));
    }

    #[test]
    fn remove_snaps_to_emoji_bounds() {
        let seq = parse("a👨‍👩‍👧‍👦b", &opts());
        // Cut lands inside the family emoji: the whole sequence goes.
        let out = remove_text(&seq, 3, 4, &opts());
        assert_eq!(concat_values(&out), "ab");
    }

    #[test]
    fn remove_reforms_links_at_seam() {
        let seq = parse("maiXXl.ru", &opts());
        let out = remove_text(&seq, 3, 5, &opts());
        assert_eq!(out.len(), 1);
        assert!(out[0].is_auto_link());
        assert_eq!(out[0].link_url(), Some("http://mail.ru"));
    }

    #[test]
    fn remove_across_solid_demotes_remainder() {
        let seq = parse("hi @world x", &opts());
        // Remove "i @wo" (1..6): the mention remainder "rld" demotes.
        let out = remove_text(&seq, 1, 6, &opts());
        assert_eq!(concat_values(&out), "hrld x");
        assert!(out.iter().all(|t| t.is_text()));
    }

    #[test]
    fn remove_inverted_returns_input() {
        let seq = parse("abc", &opts());
        let out = remove_text(&seq, 3, 1, &opts());
        assert_eq!(out, seq);
    }

    #[test]
    fn replace_preserves_boundary_formats() {
        let seq = vec![
            Token::text("aaa", Format::BOLD),
            Token::text("bbb", Format::ITALIC),
        ];
        // Replace "abb" (2..5) with "XY": X continues bold, and the part in
        // former italic territory would only re-format past the first token.
        let out = replace_text(&seq, 2, 5, "XY", &opts());
        assert_eq!(concat_values(&out), "aaXYb");
        assert_eq!(out[0].value, "aaXY");
        assert_eq!(out[0].format, Format::BOLD);
        assert_eq!(out[1].format, Format::ITALIC);
    }

    #[test]
    fn replace_empty_range_inserts() {
        let seq = parse("ab", &opts());
        let out = replace_text(&seq, 1, 1, "X", &opts());
        assert_eq!(concat_values(&out), "aXb");
    }

    #[test]
    fn scenario_overlapping_formats() {
        let seq = parse("foo bar baz", &opts());
        let step1 = set_format(&seq, FormatUpdate::add(Format::BOLD), 4, 3);
        let step2 = set_format(&step1, FormatUpdate::add(Format::ITALIC), 0, 5);
        assert_eq!(
            fmts(&step2),
            vec![
                ("foo ", Format::ITALIC),
                ("b", Format::ITALIC | Format::BOLD),
                ("ar", Format::BOLD),
                (" baz", Format::empty()),
            ]
        );
        assert_eq!(concat_values(&step2), "foo bar baz");
    }

    #[test]
    fn set_format_is_idempotent() {
        let seq = parse("foo bar baz", &opts());
        let once = set_format(&seq, FormatUpdate::add(Format::BOLD), 2, 5);
        let twice = set_format(&once, FormatUpdate::add(Format::BOLD), 2, 5);
        assert_eq!(once, twice);
    }

    #[test]
    fn set_format_wraps_solids_whole() {
        let seq = parse("hi @world x", &opts());
        // Range starts inside the mention: the whole mention bolds.
        let out = set_format(&seq, FormatUpdate::add(Format::BOLD), 5, 2);
        let mention = out
            .iter()
            .find(|t| matches!(t.kind, TokenKind::Mention { .. }))
            .unwrap();
        assert_eq!(mention.value, "@world");
        assert!(mention.format.contains(Format::BOLD));
    }

    #[test]
    fn set_format_delta_removes() {
        let seq = vec![Token::text("ab", Format::BOLD | Format::ITALIC)];
        let out = set_format(&seq, FormatUpdate::remove(Format::BOLD), 0, 2);
        assert_eq!(out[0].format, Format::ITALIC);
    }

    #[test]
    fn set_link_wraps_and_unlinks() {
        let seq = parse("pick me now", &opts());
        let linked = set_link(&seq, Some("http://x"), 5, 2);
        assert_eq!(concat_values(&linked), "pick me now");
        let link = linked.iter().find(|t| t.is_custom_link()).unwrap();
        assert_eq!(link.value, "me");
        assert_eq!(link.link_url(), Some("http://x"));

        let unlinked = set_link(&linked, None, 5, 2);
        assert_eq!(unlinked.len(), 1);
        assert!(unlinked[0].is_text());
    }

    #[test]
    fn set_link_absorbs_auto_links() {
        let seq = parse("see mail.ru now", &opts());
        let out = set_link(&seq, Some("http://other"), 0, 15);
        assert!(out.iter().all(|t| t.is_custom_link()));
        assert!(out.iter().all(|t| t.link_url() == Some("http://other")));
    }

    #[test]
    fn slice_demotes_partial_entities() {
        let seq = parse("hi @world x", &opts());
        let cut = slice(&seq, 0, 6).unwrap();
        assert_eq!(concat_values(&cut), "hi @wo");
        assert!(cut.iter().all(|t| t.is_text()));
        let whole = slice(&seq, 3, 9).unwrap();
        assert_eq!(whole.len(), 1);
        assert!(matches!(whole[0].kind, TokenKind::Mention { .. }));
    }

    #[test]
    fn slice_concatenation_property() {
        let seq = parse("foo @bar baz.com tail", &opts());
        let total = text_len(&seq);
        let (a, b, c) = (0, 7, total);
        let left = slice(&seq, a, b).unwrap();
        let right = slice(&seq, b, c).unwrap();
        let joined = concat_values(&left) + &concat_values(&right);
        assert_eq!(joined, concat_values(&slice(&seq, a, c).unwrap()));
    }

    #[test]
    fn slice_hard_fails_on_bad_range() {
        let seq = parse("abc", &opts());
        assert!(matches!(
            slice(&seq, 2, 1),
            Err(RangeError::Inverted { .. })
        ));
        assert!(matches!(
            slice(&seq, 0, 9),
            Err(RangeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn cut_is_slice_plus_remove() {
        let seq = parse("hello world", &opts());
        let CutResult { cut, tokens } = cut_text(&seq, 5, 11, &opts());
        assert_eq!(concat_values(&cut), " world");
        assert_eq!(concat_values(&tokens), "hello");
    }

    #[test]
    fn sticky_link_full_replace_keeps_link() {
        let sticky_opts = ParserOptions {
            sticky_link: true,
            ..opts()
        };
        let seq = parse("see mail.ru now", &sticky_opts);
        // "mail.ru" spans 4..11.
        let out = replace_text(&seq, 4, 11, "here", &sticky_opts);
        let link = out
            .iter()
            .find(|t| matches!(t.kind, TokenKind::Link { .. }))
            .unwrap();
        assert_eq!(link.value, "here");
        assert!(link.is_sticky_link());
        assert_eq!(link.link_url(), Some("http://mail.ru"));

        // Abutting insertion keeps extending the link.
        let grown = insert_text(&out, 8, "by", &sticky_opts);
        let link = grown
            .iter()
            .find(|t| matches!(t.kind, TokenKind::Link { .. }))
            .unwrap();
        assert_eq!(link.value, "hereby");
        assert!(link.is_sticky_link());

        // A delimiter breaks stickiness and re-evaluates the text.
        let broken = insert_text(&grown, 10, " ", &sticky_opts);
        assert!(broken.iter().all(|t| !t.is_sticky_link()));
        assert_eq!(concat_values(&broken), "see hereby  now");
    }

    #[test]
    fn get_format_inherits_from_left() {
        let seq = vec![
            Token::text("ab", Format::BOLD),
            Token::text("cd", Format::empty()),
        ];
        assert_eq!(get_format(&seq, 2), Format::BOLD);
        assert_eq!(get_format(&seq, 3), Format::empty());
        assert_eq!(get_format(&seq, 0), Format::BOLD);
    }

    #[test]
    fn every_op_preserves_concat_and_invariants() {
        let seq = parse("foo @bar mail.ru 😀 #tag", &opts());
        let cases: Vec<Vec<Token>> = vec![
            insert_text(&seq, 4, "xy", &opts()),
            remove_text(&seq, 2, 10, &opts()),
            replace_text(&seq, 0, 5, "zz", &opts()),
            set_format(&seq, FormatUpdate::add(Format::BOLD), 1, 9),
            set_link(&seq, Some("http://z"), 2, 6),
            slice(&seq, 1, 12).unwrap(),
        ];
        for out in cases {
            core_tokens::check_invariants(&out).expect("invariants must hold");
        }
    }
}
