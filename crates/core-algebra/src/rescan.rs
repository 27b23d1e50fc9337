//! Neighborhood re-scan with a per-character format overlay.
//!
//! Textual edits can create or destroy auto-detected entities across token
//! boundaries (`mai` + `l.ru`, a mention typed character by character). The
//! algebra therefore re-parses a window of re-scannable tokens around the
//! edit and re-applies the characters' previous formats on top of the fresh
//! parse. Markdown structure, custom links and sticky placeholders act as
//! window barriers: they are never re-derived here — Markdown production
//! belongs to the mirror pipeline.

use core_tokens::{EmojiSpans, Format, Token, TokenKind, normalize};
use core_parser::{ParserOptions, parse};
use tracing::trace;

/// Options for window re-parses: the caller's feature set with Markdown off.
pub(crate) fn plain_opts(opts: &ParserOptions) -> ParserOptions {
    ParserOptions {
        markdown: false,
        ..opts.clone()
    }
}

/// Tokens a re-scan window may absorb: plain text, newlines and the
/// auto-detected entity kinds.
pub(crate) fn window_eligible(token: &Token) -> bool {
    match &token.kind {
        TokenKind::Text { sticky } => !sticky,
        TokenKind::Newline => true,
        TokenKind::Link { auto, sticky, .. } => *auto && !sticky,
        TokenKind::Mention { .. }
        | TokenKind::Command { .. }
        | TokenKind::HashTag { .. }
        | TokenKind::UserSticker { .. } => true,
        TokenKind::Markdown => false,
    }
}

/// Grow `[lo, hi)` outward over eligible tokens.
pub(crate) fn expand_window(tokens: &[Token], lo0: usize, hi0: usize) -> (usize, usize) {
    let mut lo = lo0;
    let mut hi = hi0;
    while lo > 0 && window_eligible(&tokens[lo - 1]) {
        lo -= 1;
    }
    while hi < tokens.len() && window_eligible(&tokens[hi]) {
        hi += 1;
    }
    (lo, hi)
}

/// Text edit applied to the window before re-parsing.
pub(crate) enum WindowEdit {
    None,
    Insert {
        /// Code-point position relative to the window start.
        at: usize,
        text: String,
        format: Format,
    },
}

/// Re-parse `tokens[lo..hi]` (after applying `edit`) and splice the overlaid
/// result back. The returned sequence is normalized.
pub(crate) fn rescan(
    mut tokens: Vec<Token>,
    lo: usize,
    hi: usize,
    edit: WindowEdit,
    opts: &ParserOptions,
) -> Vec<Token> {
    debug_assert!(lo <= hi && hi <= tokens.len());
    let mut src = String::new();
    let mut metas: Vec<Format> = Vec::new();
    for token in &tokens[lo..hi] {
        src.push_str(&token.value);
        metas.extend(std::iter::repeat_n(token.format, token.char_len()));
    }
    if let WindowEdit::Insert { at, text, format } = &edit {
        let byte = byte_of_cp(&src, *at);
        src.insert_str(byte, text);
        let added = text.chars().count();
        metas.splice(*at..*at, std::iter::repeat_n(*format, added));
    }
    trace!(target: "algebra.rescan", window = hi - lo, len = src.len(), "window_reparse");
    let parsed = parse(&src, &plain_opts(opts));
    let overlaid = apply_overlay(parsed, &metas);
    tokens.splice(lo..hi, overlaid);
    normalize(tokens)
}

fn byte_of_cp(s: &str, cp: usize) -> usize {
    s.char_indices().nth(cp).map(|(i, _)| i).unwrap_or(s.len())
}

/// Re-apply per-character formats onto freshly parsed tokens. Non-text
/// tokens (entities, newlines) take the format of their first character
/// whole; text tokens split at format boundaries, with boundaries falling
/// inside an emoji span deferred to the span end so spans stay intact.
fn apply_overlay(parsed: Vec<Token>, metas: &[Format]) -> Vec<Token> {
    let mut out = Vec::with_capacity(parsed.len());
    let mut cp = 0usize;
    for mut token in parsed {
        let len = token.char_len();
        if len == 0 {
            continue;
        }
        let region = &metas[cp..cp + len];
        cp += len;
        if !token.is_text() {
            token.format = region[0];
            out.push(token);
            continue;
        }
        let mut seg_start = 0usize;
        let mut i = 1usize;
        while i < len {
            if region[i] != region[seg_start] {
                if let Some(span) = token.emoji.iter().find(|s| i > s.from && i < s.to) {
                    i = span.to;
                    continue;
                }
                out.push(text_segment(&token, seg_start, i, region[seg_start]));
                seg_start = i;
            }
            i += 1;
        }
        if seg_start == 0 {
            token.format = region[0];
            out.push(token);
        } else {
            out.push(text_segment(&token, seg_start, len, region[seg_start]));
        }
    }
    out
}

/// Code-point slice `[a, b)` of a text token with `format`.
fn text_segment(token: &Token, a: usize, b: usize, format: Format) -> Token {
    let start = byte_of_cp(&token.value, a);
    let end = byte_of_cp(&token.value, b);
    let mut spans = EmojiSpans::new();
    for span in &token.emoji {
        if span.from >= a && span.to <= b {
            let mut s = span.clone();
            s.from -= a;
            s.to -= a;
            spans.push(s);
        }
    }
    Token {
        kind: TokenKind::Text { sticky: false },
        value: token.value[start..end].to_owned(),
        format,
        emoji: spans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn link_opts() -> ParserOptions {
        ParserOptions {
            link: true,
            ..ParserOptions::default()
        }
    }

    #[test]
    fn seam_reparse_reforms_entities() {
        // "mai" + "l.ru" previously split by a deletion.
        let seq = vec![
            Token::text("see mai", Format::empty()),
            Token::text("l.ru", Format::empty()),
        ];
        let out = rescan(seq, 0, 2, WindowEdit::None, &link_opts());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value, "see ");
        assert!(out[1].is_auto_link());
        assert_eq!(out[1].link_url(), Some("http://mail.ru"));
    }

    #[test]
    fn overlay_preserves_format_runs() {
        let seq = vec![
            Token::text("aa", Format::BOLD),
            Token::text("bb", Format::empty()),
        ];
        let out = rescan(seq, 0, 2, WindowEdit::None, &ParserOptions::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].format, Format::BOLD);
        assert_eq!(out[1].format, Format::empty());
    }

    #[test]
    fn insert_edit_lands_with_its_format() {
        let seq = vec![Token::text("ab", Format::empty())];
        let out = rescan(
            seq,
            0,
            1,
            WindowEdit::Insert {
                at: 1,
                text: "X".into(),
                format: Format::BOLD,
            },
            &ParserOptions::default(),
        );
        let values: Vec<(&str, Format)> =
            out.iter().map(|t| (t.value.as_str(), t.format)).collect();
        assert_eq!(
            values,
            vec![
                ("a", Format::empty()),
                ("X", Format::BOLD),
                ("b", Format::empty()),
            ]
        );
    }

    #[test]
    fn entity_takes_leading_format_whole() {
        let seq = vec![
            Token::text("x mail", Format::BOLD),
            Token::text(".ru", Format::empty()),
        ];
        let out = rescan(seq, 0, 2, WindowEdit::None, &link_opts());
        // The re-formed link starts in bold territory and takes it whole.
        let link = out.iter().find(|t| t.is_auto_link()).unwrap();
        assert_eq!(link.format, Format::BOLD);
    }
}
