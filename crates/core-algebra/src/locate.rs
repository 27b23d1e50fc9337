//! Position resolution over a token sequence.
//!
//! All positions are code-point offsets into the canonical source text. A
//! position on a token boundary belongs to the left token when resolved as a
//! range end and to the right token when resolved as a range start; the
//! same `Side` also directs snapping out of emoji interiors and (optionally)
//! out of solid tokens.

use core_tokens::{Format, Token};

/// Which end of a range a position represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Start,
    End,
}

/// A resolved position: token index plus code-point offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPos {
    pub index: usize,
    pub offset: usize,
}

/// Resolve `pos` to a token and in-token offset.
///
/// * Boundary positions prefer the right token for `Side::Start` and the
///   left token for `Side::End`.
/// * A position strictly inside an emoji span snaps to the span start
///   (`Start`) or end (`End`).
/// * With `solid_snap`, an offset strictly inside a solid token rounds to 0
///   (`Start`) or the token length (`End`), expanding outward.
///
/// Returns `None` when `pos` exceeds the text length (or the sequence is
/// empty); callers short-circuit on that.
pub fn token_for_pos(
    tokens: &[Token],
    pos: usize,
    side: Side,
    solid_snap: bool,
) -> Option<TokenPos> {
    let mut cum = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        let len = token.char_len();
        let contains = match side {
            Side::Start => pos >= cum && pos < cum + len,
            Side::End => pos > cum && pos <= cum + len,
        };
        if contains {
            let mut offset = pos - cum;
            for span in &token.emoji {
                if offset > span.from && offset < span.to {
                    offset = match side {
                        Side::Start => span.from,
                        Side::End => span.to,
                    };
                    break;
                }
            }
            if solid_snap && token.is_solid() && offset > 0 && offset < len {
                offset = match side {
                    Side::Start => 0,
                    Side::End => len,
                };
            }
            return Some(TokenPos { index, offset });
        }
        cum += len;
    }
    if tokens.is_empty() || pos > cum {
        return None;
    }
    // pos == 0 resolved as End, or pos == total resolved as Start.
    match side {
        Side::Start => {
            let index = tokens.len() - 1;
            Some(TokenPos {
                index,
                offset: tokens[index].char_len(),
            })
        }
        Side::End => Some(TokenPos { index: 0, offset: 0 }),
    }
}

/// Code-point offset of the start of `tokens[index]`.
pub fn token_start(tokens: &[Token], index: usize) -> usize {
    tokens[..index].iter().map(Token::char_len).sum()
}

/// Absolute position snapped out of emoji interiors in the `side` direction.
pub fn snap_pos(tokens: &[Token], pos: usize, side: Side) -> usize {
    match token_for_pos(tokens, pos, side, false) {
        Some(tp) => token_start(tokens, tp.index) + tp.offset,
        None => pos,
    }
}

/// Index of the sticky placeholder sitting exactly at `pos`, if any.
pub fn sticky_at(tokens: &[Token], pos: usize) -> Option<usize> {
    let mut cum = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        if cum == pos && token.is_sticky_text() {
            return Some(index);
        }
        cum += token.char_len();
        if cum > pos {
            break;
        }
    }
    None
}

/// The format a character inserted at `pos` would inherit: the sticky
/// placeholder at that position, otherwise the token the position belongs to
/// as a range end (the character on the left).
pub fn get_format(tokens: &[Token], pos: usize) -> Format {
    if let Some(i) = sticky_at(tokens, pos) {
        return tokens[i].format;
    }
    match token_for_pos(tokens, pos, Side::End, false) {
        Some(tp) => tokens[tp.index].format,
        None => Format::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_tokens::Format;

    fn seq() -> Vec<Token> {
        vec![
            Token::text("ab", Format::BOLD),
            Token::mention("@user", "user", Format::empty()),
            Token::text("cd", Format::empty()),
        ]
    }

    #[test]
    fn boundary_prefers_by_side() {
        let s = seq();
        assert_eq!(
            token_for_pos(&s, 2, Side::Start, false),
            Some(TokenPos { index: 1, offset: 0 })
        );
        assert_eq!(
            token_for_pos(&s, 2, Side::End, false),
            Some(TokenPos { index: 0, offset: 2 })
        );
    }

    #[test]
    fn document_edges() {
        let s = seq();
        assert_eq!(
            token_for_pos(&s, 0, Side::End, false),
            Some(TokenPos { index: 0, offset: 0 })
        );
        assert_eq!(
            token_for_pos(&s, 9, Side::Start, false),
            Some(TokenPos { index: 2, offset: 2 })
        );
        assert_eq!(token_for_pos(&s, 10, Side::Start, false), None);
        assert_eq!(token_for_pos(&[], 0, Side::Start, false), None);
    }

    #[test]
    fn solid_snap_rounds_outward() {
        let s = seq();
        assert_eq!(
            token_for_pos(&s, 4, Side::Start, true),
            Some(TokenPos { index: 1, offset: 0 })
        );
        assert_eq!(
            token_for_pos(&s, 4, Side::End, true),
            Some(TokenPos { index: 1, offset: 5 })
        );
    }

    #[test]
    fn emoji_snap() {
        let mut spans = core_tokens::EmojiSpans::new();
        spans.push(core_tokens::EmojiSpan::new(1, 8));
        let s = vec![Token::text_with_emoji(
            "a👨‍👩‍👧‍👦b",
            Format::empty(),
            spans,
        )];
        assert_eq!(snap_pos(&s, 4, Side::Start), 1);
        assert_eq!(snap_pos(&s, 4, Side::End), 8);
        assert_eq!(snap_pos(&s, 1, Side::Start), 1);
        assert_eq!(snap_pos(&s, 8, Side::End), 8);
    }

    #[test]
    fn sticky_and_format_lookup() {
        let s = vec![
            Token::text("aa ", Format::empty()),
            Token::sticky(Format::BOLD),
            Token::text("bb", Format::ITALIC),
        ];
        assert_eq!(sticky_at(&s, 3), Some(1));
        assert_eq!(sticky_at(&s, 2), None);
        assert_eq!(get_format(&s, 3), Format::BOLD);
        assert_eq!(get_format(&s, 5), Format::ITALIC);
        assert_eq!(get_format(&s, 1), Format::empty());
        assert_eq!(get_format(&[], 0), Format::empty());
    }
}
