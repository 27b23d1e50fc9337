//! In-place token splitting.
//!
//! Splitting is the one operation allowed to violate kind integrity: a solid
//! token (or a CRLF newline) forced apart is demoted to plain text on both
//! sides, per the solid-token contract. Custom links split into two link
//! tokens sharing the URL; plain text splits into plain text. Emoji spans
//! are distributed to the side that wholly contains them — callers snap
//! positions out of emoji interiors before splitting, so a span can never
//! straddle the cut.

use core_tokens::{EmojiSpans, Token, TokenKind};

/// Split `token` at code-point `offset` (strictly inside).
pub(crate) fn split_token(token: &Token, offset: usize) -> (Token, Token) {
    let len = token.char_len();
    debug_assert!(offset > 0 && offset < len, "split must be interior");
    let byte = token
        .value
        .char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(token.value.len());
    let (lv, rv) = token.value.split_at(byte);

    let mut left_spans = EmojiSpans::new();
    let mut right_spans = EmojiSpans::new();
    for span in &token.emoji {
        if span.to <= offset {
            left_spans.push(span.clone());
        } else if span.from >= offset {
            let mut s = span.clone();
            s.from -= offset;
            s.to -= offset;
            right_spans.push(s);
        } else {
            debug_assert!(false, "split inside an emoji span");
        }
    }

    let (left_kind, right_kind) = match &token.kind {
        TokenKind::Text { .. } => (
            TokenKind::Text { sticky: false },
            TokenKind::Text { sticky: false },
        ),
        TokenKind::Link {
            link,
            auto: false,
            sticky,
        } => (
            TokenKind::Link {
                link: link.clone(),
                auto: false,
                sticky: *sticky,
            },
            TokenKind::Link {
                link: link.clone(),
                auto: false,
                sticky: *sticky,
            },
        ),
        // Solid kinds and CRLF newlines demote when forced apart.
        _ => (
            TokenKind::Text { sticky: false },
            TokenKind::Text { sticky: false },
        ),
    };

    (
        Token {
            kind: left_kind,
            value: lv.to_owned(),
            format: token.format,
            emoji: left_spans,
        },
        Token {
            kind: right_kind,
            value: rv.to_owned(),
            format: token.format,
            emoji: right_spans,
        },
    )
}

/// Ensure a token boundary exists at absolute position `pos` and return the
/// index of the first token at or after it. `pos` must already be snapped
/// out of emoji interiors.
pub(crate) fn split_point(tokens: &mut Vec<Token>, pos: usize) -> usize {
    let mut cum = 0usize;
    for index in 0..tokens.len() {
        let len = tokens[index].char_len();
        if pos == cum {
            return index;
        }
        if pos < cum + len {
            let (left, right) = split_token(&tokens[index], pos - cum);
            tokens[index] = left;
            tokens.insert(index + 1, right);
            return index + 1;
        }
        cum += len;
    }
    tokens.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_tokens::Format;

    #[test]
    fn splits_text_and_distributes_spans() {
        let mut spans = EmojiSpans::new();
        spans.push(core_tokens::EmojiSpan::new(0, 1));
        spans.push(core_tokens::EmojiSpan::new(2, 3));
        let tok = Token::text_with_emoji("😀a😀b", Format::BOLD, spans);
        let (l, r) = split_token(&tok, 2);
        assert_eq!(l.value, "😀a");
        assert_eq!(r.value, "😀b");
        assert_eq!(l.emoji.len(), 1);
        assert_eq!(r.emoji[0].from, 0);
        assert_eq!(r.emoji[0].to, 1);
        assert_eq!(r.format, Format::BOLD);
    }

    #[test]
    fn solid_split_demotes_both_sides() {
        let tok = Token::mention("@user", "user", Format::empty());
        let (l, r) = split_token(&tok, 2);
        assert!(l.is_text());
        assert!(r.is_text());
        assert_eq!(l.value, "@u");
        assert_eq!(r.value, "ser");
    }

    #[test]
    fn custom_link_split_keeps_url() {
        let tok = Token::link("label", "http://x", false, Format::empty());
        let (l, r) = split_token(&tok, 2);
        assert_eq!(l.link_url(), Some("http://x"));
        assert_eq!(r.link_url(), Some("http://x"));
    }

    #[test]
    fn split_point_reuses_existing_boundaries() {
        let mut seq = vec![
            Token::text("ab", Format::empty()),
            Token::text("cd", Format::BOLD),
        ];
        assert_eq!(split_point(&mut seq, 2), 1);
        assert_eq!(seq.len(), 2);
        assert_eq!(split_point(&mut seq, 3), 2);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq[1].value, "c");
        assert_eq!(seq[2].value, "d");
        assert_eq!(split_point(&mut seq, 4), 3);
        assert_eq!(split_point(&mut seq, 0), 0);
    }
}
