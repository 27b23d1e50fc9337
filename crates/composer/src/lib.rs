//! composer: the rich-text message editor core.
//!
//! A pure, side-effect-free engine turning raw character sequences into
//! typed, formatted token streams with incremental editing on top:
//!
//! * [`parse`] — the tokenizing scanner (mentions, commands, hashtags,
//!   links, stickers, emoji, inline Markdown).
//! * the formatted-string algebra — [`insert_text`], [`remove_text`],
//!   [`replace_text`], [`slice`], [`cut_text`], [`set_format`],
//!   [`set_link`], [`get_format`], [`token_for_pos`].
//! * the Markdown mirror — [`md_to_text`] / [`text_to_md`] and the
//!   incremental `md_*` edit wrappers.
//! * [`History`] — compacted undo/redo.
//! * [`Editor`] — the coordinator: commands, caret, clipboard payloads,
//!   shortcuts, change notifications.
//!
//! Rendering, selection mapping, HTML ingest and clipboard transport are
//! external collaborators; the crate exposes only the data they consume.

pub use core_tokens::{
    EmojiSpan, EmojiSpans, Format, RangeError, TextRange, Token, TokenKind, check_invariants,
    concat_values, normalize, text_len, tokens_from_json, tokens_to_json,
};

pub use core_parser::{ANY_SCHEME, DEFAULT_PROTOCOLS, MentionMode, ParserOptions, parse};

pub use core_algebra::{
    CutResult, FormatUpdate, Side, TokenPos, cut_text, get_format, insert_text, remove_text,
    replace_text, set_format, set_link, slice, snap_pos, sticky_at, token_for_pos, token_start,
};

pub use core_markdown::{
    MdEdit, md_insert_text, md_remove_text, md_replace_text, md_set_format, md_set_link,
    md_to_text, text_to_md,
};

pub use core_history::{
    COMPACT_TIMEOUT, History, HistoryAction, HistoryConfig, HistoryEntry, MAX_ENTRIES,
};

pub use core_editor::{
    Editor, EditorCommand, EditorEvent, EditorOptions, FRAGMENT_MIME, FlushPolicy, HtmlImporter,
    KeyMods, PastePayload, Platform, Shortcut, ShortcutParseError, ShortcutRegistry,
    fragment_json, sanitize_plain,
};

/// Emoji recognition primitives, exposed for renderers that need to walk
/// glyph boundaries themselves.
pub mod emoji {
    pub use core_emoji::{EmojiHit, TEXT_EMOJI, annotate, match_emoji, match_text_emoji};
}

/// Character classes shared by the scanner layers.
pub mod chars {
    pub use core_chars::{
        is_delimiter, is_end_bound_char, is_punctuation, is_start_bound_char, is_whitespace,
        is_word_bound,
    };
}
