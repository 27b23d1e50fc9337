//! core-tokens: the token data model of the editor core.
//!
//! A document is a `Vec<Token>`: a linear sequence of typed, formatted
//! substrings whose concatenated values equal the canonical source text.
//! Tokens are produced by the parser and the algebra and never mutated after
//! emission; every operation returns a fresh sequence.
//!
//! Core invariants (must hold after every public operation anywhere in the
//! workspace):
//! * Concatenating all `value`s equals the canonical source text.
//! * Adjacent joinable tokens are always joined (see [`normalize`]).
//! * No token has an empty `value` unless it is a sticky Text token.
//! * Emoji spans are strictly ordered, non-overlapping and contained in
//!   `[0, char_len]`.
//! * Solid tokens are never split by range operations.
//!
//! All public offsets — `TextRange`, emoji spans, operation positions — are
//! Unicode code-point offsets. Storage is UTF-8; there are no surrogate
//! semantics anywhere in this workspace.

use bitflags::bitflags;
use smallvec::SmallVec;
use thiserror::Error;

mod json;

pub use json::{tokens_from_json, tokens_to_json};

bitflags! {
    /// Inline format bitset. `LINK` and `LINK_LABEL` are virtual bits used
    /// by the Markdown custom-link structure; the rest are user-visible
    /// styles. `HEADING`, `MARKED` and `HIGHLIGHT` are set only
    /// programmatically — the parser has no rule producing them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Format: u16 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKE = 1 << 3;
        const MONOSPACE = 1 << 4;
        const HEADING = 1 << 5;
        const MARKED = 1 << 6;
        const HIGHLIGHT = 1 << 7;
        const LINK = 1 << 8;
        const LINK_LABEL = 1 << 9;
    }
}

/// An emoji occurrence inside a token value, in code points relative to the
/// value start. `alias` carries the source emoticon when the glyph came from
/// the text-emoji table (`:)` → 🙂).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiSpan {
    pub from: usize,
    pub to: usize,
    pub alias: Option<String>,
}

impl EmojiSpan {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            alias: None,
        }
    }

    pub fn aliased(from: usize, to: usize, alias: impl Into<String>) -> Self {
        Self {
            from,
            to,
            alias: Some(alias.into()),
        }
    }

    pub fn shifted(&self, by: usize) -> Self {
        Self {
            from: self.from + by,
            to: self.to + by,
            alias: self.alias.clone(),
        }
    }
}

pub type EmojiSpans = SmallVec<[EmojiSpan; 1]>;

/// Token kind with per-variant payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Plain text. `sticky = true` marks an empty format placeholder at a
    /// caret position; the next inserted character inherits its format.
    Text { sticky: bool },
    /// A link. `auto` distinguishes parser-discovered links from ones set
    /// via `set_link`; `sticky` is the sticky-link continuation flag.
    Link {
        link: String,
        auto: bool,
        sticky: bool,
    },
    Mention { mention: String },
    Command { command: String },
    HashTag { hashtag: String },
    UserSticker { sticker_id: String },
    /// A Markdown control marker (`*`, `_`, `~`, `` ` ``, `[`, `]`, `(`,
    /// `)`). Present only in Markdown-mode sequences.
    Markdown,
    /// One line break carrying its raw value (`\n`, `\r` or `\r\n`).
    Newline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub format: Format,
    pub emoji: EmojiSpans,
}

impl Token {
    pub fn text(value: impl Into<String>, format: Format) -> Self {
        Self {
            kind: TokenKind::Text { sticky: false },
            value: value.into(),
            format,
            emoji: EmojiSpans::new(),
        }
    }

    pub fn text_with_emoji(value: impl Into<String>, format: Format, emoji: EmojiSpans) -> Self {
        Self {
            kind: TokenKind::Text { sticky: false },
            value: value.into(),
            format,
            emoji,
        }
    }

    /// Empty sticky placeholder carrying `format` at a caret position.
    pub fn sticky(format: Format) -> Self {
        Self {
            kind: TokenKind::Text { sticky: true },
            value: String::new(),
            format,
            emoji: EmojiSpans::new(),
        }
    }

    pub fn link(value: impl Into<String>, link: impl Into<String>, auto: bool, format: Format) -> Self {
        Self {
            kind: TokenKind::Link {
                link: link.into(),
                auto,
                sticky: false,
            },
            value: value.into(),
            format,
            emoji: EmojiSpans::new(),
        }
    }

    pub fn mention(value: impl Into<String>, mention: impl Into<String>, format: Format) -> Self {
        Self {
            kind: TokenKind::Mention {
                mention: mention.into(),
            },
            value: value.into(),
            format,
            emoji: EmojiSpans::new(),
        }
    }

    pub fn command(value: impl Into<String>, command: impl Into<String>, format: Format) -> Self {
        Self {
            kind: TokenKind::Command {
                command: command.into(),
            },
            value: value.into(),
            format,
            emoji: EmojiSpans::new(),
        }
    }

    pub fn hashtag(value: impl Into<String>, hashtag: impl Into<String>, format: Format) -> Self {
        Self {
            kind: TokenKind::HashTag {
                hashtag: hashtag.into(),
            },
            value: value.into(),
            format,
            emoji: EmojiSpans::new(),
        }
    }

    pub fn user_sticker(value: impl Into<String>, sticker_id: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::UserSticker {
                sticker_id: sticker_id.into(),
            },
            value: value.into(),
            format: Format::empty(),
            emoji: EmojiSpans::new(),
        }
    }

    pub fn markdown(value: impl Into<String>, format: Format) -> Self {
        Self {
            kind: TokenKind::Markdown,
            value: value.into(),
            format,
            emoji: EmojiSpans::new(),
        }
    }

    pub fn newline(value: impl Into<String>, format: Format) -> Self {
        Self {
            kind: TokenKind::Newline,
            value: value.into(),
            format,
            emoji: EmojiSpans::new(),
        }
    }

    /// Value length in code points.
    pub fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, TokenKind::Text { .. })
    }

    /// Empty sticky Text placeholder.
    pub fn is_sticky_text(&self) -> bool {
        matches!(self.kind, TokenKind::Text { sticky: true })
    }

    pub fn is_auto_link(&self) -> bool {
        matches!(self.kind, TokenKind::Link { auto: true, .. })
    }

    pub fn is_custom_link(&self) -> bool {
        matches!(self.kind, TokenKind::Link { auto: false, .. })
    }

    pub fn is_sticky_link(&self) -> bool {
        matches!(self.kind, TokenKind::Link { sticky: true, .. })
    }

    pub fn is_markdown(&self) -> bool {
        matches!(self.kind, TokenKind::Markdown)
    }

    pub fn is_newline(&self) -> bool {
        matches!(self.kind, TokenKind::Newline)
    }

    /// Solid tokens are atomic for range operations: their interior is never
    /// split; forced splits demote the parts to plain text.
    pub fn is_solid(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Mention { .. }
                | TokenKind::Command { .. }
                | TokenKind::HashTag { .. }
                | TokenKind::UserSticker { .. }
                | TokenKind::Link { auto: true, .. }
        )
    }

    /// The URL payload when this token is a link of either flavor.
    pub fn link_url(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Link { link, .. } => Some(link),
            _ => None,
        }
    }

    /// A copy demoted to plain (non-sticky) text, keeping value, format and
    /// emoji annotations.
    pub fn demoted(&self) -> Token {
        Token {
            kind: TokenKind::Text { sticky: false },
            value: self.value.clone(),
            format: self.format,
            emoji: self.emoji.clone(),
        }
    }

    fn joinable_with(&self, other: &Token) -> bool {
        if self.format != other.format {
            return false;
        }
        match (&self.kind, &other.kind) {
            (TokenKind::Text { .. }, TokenKind::Text { .. }) => true,
            (
                TokenKind::Link {
                    link: a,
                    auto: false,
                    sticky: sa,
                },
                TokenKind::Link {
                    link: b,
                    auto: false,
                    sticky: sb,
                },
            ) => a == b && sa == sb,
            _ => false,
        }
    }
}

/// `[from, to]` in code-point offsets, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub from: usize,
    pub to: usize,
}

impl TextRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Collapsed range (a caret).
    pub fn caret(pos: usize) -> Self {
        Self { from: pos, to: pos }
    }

    /// `[pos, len]` form.
    pub fn at(pos: usize, len: usize) -> Self {
        Self {
            from: pos,
            to: pos + len,
        }
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    /// Swap the ends if reversed.
    pub fn normalized(&self) -> Self {
        if self.from <= self.to {
            *self
        } else {
            Self {
                from: self.to,
                to: self.from,
            }
        }
    }

    /// Merge into the covering range, used by history compaction.
    pub fn union(&self, other: &TextRange) -> TextRange {
        TextRange {
            from: self.from.min(other.from),
            to: self.to.max(other.to),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("range {from}..{to} exceeds text length {len}")]
    OutOfBounds { from: usize, to: usize, len: usize },
    #[error("range {from}..{to} is inverted")]
    Inverted { from: usize, to: usize },
}

/// Total text length in code points.
pub fn text_len(tokens: &[Token]) -> usize {
    tokens.iter().map(Token::char_len).sum()
}

/// The canonical source text.
pub fn concat_values(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.value.len()).sum());
    for t in tokens {
        out.push_str(&t.value);
    }
    out
}

/// Restore the sequence invariants: drop empty non-sticky tokens and fuse
/// joinable neighbors. Fusion concatenates values and shifts the right
/// operand's emoji spans by the left operand's length; merging any non-empty
/// text into a sticky placeholder dissolves the placeholder.
pub fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if tok.value.is_empty() && !tok.is_sticky_text() {
            continue;
        }
        if let Some(last) = out.last_mut()
            && last.joinable_with(&tok)
        {
            fuse(last, tok);
            continue;
        }
        out.push(tok);
    }
    out
}

fn fuse(left: &mut Token, right: Token) {
    let shift = left.char_len();
    for span in &right.emoji {
        left.emoji.push(span.shifted(shift));
    }
    left.value.push_str(&right.value);
    if let TokenKind::Text { sticky } = &mut left.kind {
        // A placeholder only survives while it stays empty.
        let was_sticky = *sticky
            || matches!(right.kind, TokenKind::Text { sticky: true });
        *sticky = was_sticky && left.value.is_empty();
    }
}

/// Structural invariant check used by debug assertions and the coordinator's
/// safety net. Returns a description of the first violation found.
pub fn check_invariants(tokens: &[Token]) -> Result<(), String> {
    for (i, tok) in tokens.iter().enumerate() {
        if tok.value.is_empty() && !tok.is_sticky_text() {
            return Err(format!("token {i} has an empty value and is not sticky"));
        }
        let len = tok.char_len();
        let mut prev_to = 0;
        for (j, span) in tok.emoji.iter().enumerate() {
            if span.from >= span.to {
                return Err(format!("token {i} emoji {j} is empty or inverted"));
            }
            if j > 0 && span.from < prev_to {
                return Err(format!("token {i} emoji {j} overlaps its predecessor"));
            }
            if span.to > len {
                return Err(format!("token {i} emoji {j} exceeds the value length"));
            }
            prev_to = span.to;
        }
        if i > 0 {
            let prev = &tokens[i - 1];
            if prev.joinable_with(tok) && !(prev.is_sticky_text() || tok.is_sticky_text()) {
                return Err(format!("tokens {} and {i} are joinable but unjoined", i - 1));
            }
        }
    }
    Ok(())
}
