//! core-editor: the coordinator owning the model, caret, history and
//! notification fan-out.
//!
//! Core invariants (must hold after every public command):
//! * `text` equals the concatenation of all token values (the canonical
//!   source); a mismatch is an implementation bug and triggers the safety
//!   net: a full re-parse of the expected text plus an error diagnostic.
//! * `caret` stays within `[0, text length]`.
//! * Every content mutation pushes exactly one history entry.
//!
//! In Markdown mode commands route through the mirror pipeline
//! (`md_to_text → clean edit → text_to_md → re-parse`); outside it they hit
//! the algebra directly. Either way the command surface and the emitted
//! notifications are identical.

use tracing::{debug, error, trace};
use unicode_segmentation::UnicodeSegmentation;

use core_algebra::{
    CutResult, FormatUpdate, Side, TokenPos, cut_text, get_format, insert_text as alg_insert,
    remove_text as alg_remove, replace_text as alg_replace, set_format as alg_set_format,
    set_link as alg_set_link, slice as alg_slice, snap_pos, token_for_pos,
};
use core_history::{History, HistoryAction, HistoryConfig};
use core_markdown::{
    md_insert_text, md_remove_text, md_replace_text, md_set_format, md_set_link, md_to_text,
    text_to_md,
};
use core_parser::parse;
use core_tokens::{Format, RangeError, TextRange, Token, concat_values, text_len};

mod clipboard;
mod notify;
mod options;
mod shortcut;

pub use clipboard::{FRAGMENT_MIME, HtmlImporter, PastePayload, fragment_json, sanitize_plain};
pub use notify::{EditorEvent, FlushPolicy};
pub use options::EditorOptions;
pub use shortcut::{EditorCommand, KeyMods, Platform, Shortcut, ShortcutParseError, ShortcutRegistry};

use notify::EventBus;

pub struct Editor {
    tokens: Vec<Token>,
    /// Canonical source mirror, kept in lockstep with the tokens.
    text: String,
    caret: TextRange,
    opts: EditorOptions,
    history: History,
    shortcuts: ShortcutRegistry,
    bus: EventBus,
    html_importer: Option<Box<dyn HtmlImporter>>,
}

impl Editor {
    pub fn new(opts: EditorOptions) -> Self {
        Self::with_policy(opts, FlushPolicy::Immediate, Platform::current())
    }

    pub fn with_policy(opts: EditorOptions, policy: FlushPolicy, platform: Platform) -> Self {
        let tokens = parse(&opts.value, &opts.parser);
        let text = opts.value.clone();
        let caret = TextRange::caret(text_len(&tokens));
        let mut history = History::new(HistoryConfig::default());
        history.push(tokens.clone(), HistoryAction::Init, caret, Some(caret));
        Self {
            tokens,
            text,
            caret,
            opts,
            history,
            shortcuts: ShortcutRegistry::with_defaults(platform),
            bus: EventBus::new(policy),
            html_importer: None,
        }
    }

    // --- accessors --------------------------------------------------------

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        text_len(&self.tokens)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn options(&self) -> &EditorOptions {
        &self.opts
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn shortcuts_mut(&mut self) -> &mut ShortcutRegistry {
        &mut self.shortcuts
    }

    pub fn set_html_importer(&mut self, importer: Box<dyn HtmlImporter>) {
        self.html_importer = Some(importer);
    }

    /// Subscribe to coalesced change notifications.
    pub fn subscribe(&mut self) -> crossbeam_channel::Receiver<EditorEvent> {
        self.bus.subscribe()
    }

    /// Deliver pending notifications; the host's per-tick flush under
    /// [`FlushPolicy::Deferred`].
    pub fn flush_events(&mut self) {
        self.bus.flush();
    }

    // --- selection --------------------------------------------------------

    pub fn get_selection(&self) -> TextRange {
        self.caret
    }

    pub fn set_selection(&mut self, range: TextRange) {
        let len = self.len();
        let clamped = TextRange::new(range.from.min(len), range.to.min(len));
        if clamped != self.caret {
            self.caret = clamped;
            self.bus.note(EditorEvent::SelectionChanged);
            self.bus.note(EditorEvent::FormatChanged);
            self.bus.flush_batch();
        }
    }

    /// Previous grapheme boundary left of the caret, in code points.
    pub fn caret_prev(&self) -> usize {
        let pos = self.caret.normalized().from;
        let byte = cp_to_byte(&self.text, pos);
        let mut prev = 0usize;
        for (i, _) in self.text.grapheme_indices(true) {
            if i >= byte {
                break;
            }
            prev = i;
        }
        byte_to_cp(&self.text, prev)
    }

    /// Next grapheme boundary right of the caret, in code points.
    pub fn caret_next(&self) -> usize {
        let pos = self.caret.normalized().to;
        let byte = cp_to_byte(&self.text, pos);
        for (i, g) in self.text.grapheme_indices(true) {
            if i >= byte {
                return byte_to_cp(&self.text, i + g.len());
            }
        }
        self.len()
    }

    // --- queries ----------------------------------------------------------

    pub fn slice(&self, from: usize, to: usize) -> Result<Vec<Token>, RangeError> {
        alg_slice(&self.tokens, from, to)
    }

    pub fn token_for_pos(&self, pos: usize, side: Side, solid_snap: bool) -> Option<TokenPos> {
        token_for_pos(&self.tokens, pos, side, solid_snap)
    }

    /// The URL under `pos`, if any (for the link-editing UI).
    pub fn pick_link(&self, pos: usize) -> Option<String> {
        for side in [Side::End, Side::Start] {
            if let Some(tp) = token_for_pos(&self.tokens, pos, side, false)
                && let Some(url) = self.tokens[tp.index].link_url()
            {
                return Some(url.to_owned());
            }
        }
        None
    }

    /// Fragment JSON for the current selection (clipboard copy).
    pub fn selection_fragment(&self) -> anyhow::Result<String> {
        let sel = self.caret.normalized();
        let cut = alg_slice(&self.tokens, sel.from, sel.to).unwrap_or_default();
        fragment_json(&cut)
    }

    // --- commands ---------------------------------------------------------

    /// Insert at the caret, replacing any active selection.
    pub fn insert_text(&mut self, text: &str) {
        self.insert_with_action(text, HistoryAction::Insert);
    }

    fn insert_with_action(&mut self, text: &str, action: HistoryAction) {
        if text.is_empty() {
            return;
        }
        let text = self.incoming(text);
        let sel = self.selection_clamped();
        let ins_cp = text.chars().count();

        if self.markdown() {
            let (tokens, caret) = if sel.is_empty() {
                md_insert_text(&self.tokens, sel.from, &text, &self.opts.parser)
            } else {
                md_replace_text(&self.tokens, sel.from, sel.to, &text, &self.opts.parser)
            };
            self.commit(tokens, None, action, TextRange::at(sel.from, ins_cp), caret);
        } else {
            // A caret snaps as one point (after any emoji under it); a real
            // selection snaps outward on both sides.
            let (from, to) = if sel.is_empty() {
                let p = snap_pos(&self.tokens, sel.from, Side::End);
                (p, p)
            } else {
                (
                    snap_pos(&self.tokens, sel.from, Side::Start),
                    snap_pos(&self.tokens, sel.to, Side::End),
                )
            };
            let expected = splice(&self.text, from, to, &text);
            let tokens = if sel.is_empty() {
                alg_insert(&self.tokens, from, &text, &self.opts.parser)
            } else {
                alg_replace(&self.tokens, from, to, &text, &self.opts.parser)
            };
            let caret = TextRange::caret(from + ins_cp);
            self.commit(tokens, Some(expected), action, TextRange::at(from, ins_cp), caret);
            if self.opts.reset_format_on_newline && text.ends_with('\n') {
                // The next character on the new line starts unformatted.
                self.tokens = alg_set_format(
                    &self.tokens,
                    FormatUpdate::Replace(Format::empty()),
                    self.caret.from,
                    0,
                );
            }
        }
    }

    pub fn remove_text(&mut self, from: usize, to: usize) {
        if from > to {
            debug!(target: "editor.cmd", from, to, "remove_text: inverted range ignored");
            return;
        }
        let len = self.len();
        let (from, to) = (from.min(len), to.min(len));
        if from >= to {
            return;
        }

        if self.markdown() {
            let (tokens, caret) = md_remove_text(&self.tokens, from, to, &self.opts.parser);
            self.commit(tokens, None, HistoryAction::Remove, TextRange::new(from, to), caret);
        } else {
            let from = snap_pos(&self.tokens, from, Side::Start);
            let to = snap_pos(&self.tokens, to, Side::End);
            let expected = splice(&self.text, from, to, "");
            let tokens = alg_remove(&self.tokens, from, to, &self.opts.parser);
            self.commit(
                tokens,
                Some(expected),
                HistoryAction::Remove,
                TextRange::new(from, to),
                TextRange::caret(from),
            );
        }
    }

    pub fn replace_text(&mut self, from: usize, to: usize, text: &str) {
        if text.is_empty() {
            self.remove_text(from, to);
            return;
        }
        self.set_selection_silent(TextRange::new(from, to));
        self.insert_with_action(text, HistoryAction::Replace);
    }

    /// Remove the selection, returning the removed tokens.
    pub fn cut(&mut self) -> Vec<Token> {
        let sel = self.selection_clamped();
        if sel.is_empty() {
            return Vec::new();
        }
        if self.markdown() {
            let mut range = sel;
            let clean = md_to_text(&self.tokens, Some(&mut range));
            let CutResult { cut, tokens } =
                cut_text(&clean, range.from, range.to, &self.opts.parser);
            let mut caret = TextRange::caret(range.from);
            let src = text_to_md(&tokens, Some(&mut caret));
            let reparsed = parse(&src, &self.opts.parser);
            self.commit(reparsed, None, HistoryAction::Cut, sel, caret);
            cut
        } else {
            let from = snap_pos(&self.tokens, sel.from, Side::Start);
            let to = snap_pos(&self.tokens, sel.to, Side::End);
            let expected = splice(&self.text, from, to, "");
            let CutResult { cut, tokens } = cut_text(&self.tokens, from, to, &self.opts.parser);
            self.commit(
                tokens,
                Some(expected),
                HistoryAction::Cut,
                TextRange::new(from, to),
                TextRange::caret(from),
            );
            cut
        }
    }

    /// Insert a clipboard payload at the caret. Fragments re-apply their
    /// per-token formats and custom links after the textual replacement.
    pub fn paste(&mut self, payload: PastePayload) {
        match payload {
            PastePayload::Plain(text) => {
                let sanitized = sanitize_plain(&text, self.opts.nowrap);
                self.insert_with_action(&sanitized, HistoryAction::Paste);
            }
            PastePayload::Html(html) => {
                if !self.opts.html {
                    debug!(target: "editor.cmd", "html paste disabled; ignoring");
                    return;
                }
                let Some(importer) = self.html_importer.as_deref() else {
                    debug!(target: "editor.cmd", "html paste without importer; ignoring");
                    return;
                };
                let fragment = importer.import(&html, self.opts.html_links);
                self.paste(PastePayload::Fragment(fragment));
            }
            PastePayload::Fragment(fragment) => self.paste_fragment(fragment),
        }
    }

    /// Apply a format change over the selection (`len == 0` sets the sticky
    /// caret format).
    pub fn update_format(&mut self, update: FormatUpdate) {
        let sel = self.selection_clamped();
        if self.markdown() {
            let (tokens, range) =
                md_set_format(&self.tokens, update, sel.from, sel.len(), &self.opts.parser);
            self.bus.note(EditorEvent::FormatChanged);
            self.commit(tokens, None, HistoryAction::Format, sel, range);
        } else {
            let tokens = alg_set_format(&self.tokens, update, sel.from, sel.len());
            self.bus.note(EditorEvent::FormatChanged);
            self.commit(tokens, Some(self.text.clone()), HistoryAction::Format, sel, sel);
        }
    }

    /// Flip `format` based on the first token in the selection (or the
    /// caret format when the selection is empty).
    pub fn toggle_format(&mut self, format: Format) {
        let sel = self.selection_clamped();
        let current = if self.markdown() {
            let mut range = sel;
            let clean = md_to_text(&self.tokens, Some(&mut range));
            format_at(&clean, range)
        } else {
            format_at(&self.tokens, sel)
        };
        let update = if current.contains(format) {
            FormatUpdate::remove(format)
        } else {
            FormatUpdate::add(format)
        };
        trace!(target: "editor.cmd", ?update, "toggle_format");
        self.update_format(update);
    }

    /// Wrap the selection in a custom link (`None` unlinks).
    pub fn set_link(&mut self, url: Option<&str>) {
        let sel = self.selection_clamped();
        if sel.is_empty() {
            return;
        }
        if self.markdown() {
            let (tokens, range) =
                md_set_link(&self.tokens, url, sel.from, sel.len(), &self.opts.parser);
            self.commit(tokens, None, HistoryAction::Link, sel, range);
        } else {
            let tokens = alg_set_link(&self.tokens, url, sel.from, sel.len());
            self.commit(tokens, Some(self.text.clone()), HistoryAction::Link, sel, sel);
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some((state, caret)) = self
            .history
            .undo()
            .map(|e| (e.state.clone(), e.caret))
        else {
            return false;
        };
        self.restore(state, caret);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some((state, caret)) = self
            .history
            .redo()
            .map(|e| (e.state.clone(), e.caret))
        else {
            return false;
        };
        self.restore(state, caret);
        true
    }

    /// Replace the whole document.
    pub fn set_value(&mut self, value: &str) {
        let value = self.incoming(value);
        let tokens = parse(&value, &self.opts.parser);
        let caret = TextRange::caret(text_len(&tokens));
        self.commit(
            tokens,
            Some(value),
            HistoryAction::SetValue,
            TextRange::new(0, self.len()),
            caret,
        );
    }

    /// Swap the option set. Toggling Markdown mode converts the model
    /// through the mirror so the logical content is preserved; the history
    /// restarts because its snapshots would belong to the other mode.
    pub fn set_options(&mut self, opts: EditorOptions) {
        let was_md = self.markdown();
        let now_md = opts.parser.markdown;
        if was_md == now_md {
            self.opts = opts;
            return;
        }
        let mut caret = self.caret;
        if now_md {
            let src = text_to_md(&self.tokens, Some(&mut caret));
            self.opts = opts;
            self.tokens = parse(&src, &self.opts.parser);
            self.text = src;
        } else {
            self.tokens = md_to_text(&self.tokens, Some(&mut caret));
            self.opts = opts;
            self.text = concat_values(&self.tokens);
        }
        let len = self.len();
        self.caret = TextRange::new(caret.from.min(len), caret.to.min(len));
        self.history = History::new(HistoryConfig::default());
        self.history
            .push(self.tokens.clone(), HistoryAction::Init, self.caret, Some(self.caret));
        self.bus.note(EditorEvent::ContentUpdated);
        self.bus.note(EditorEvent::SelectionChanged);
        self.bus.flush_batch();
    }

    /// Dispatch a key event through the shortcut registry. Unresolved keys
    /// leave the model untouched and report `false`.
    pub fn handle_key(&mut self, key: &str, mods: KeyMods) -> bool {
        match self.shortcuts.resolve(key, mods) {
            Some(EditorCommand::ToggleFormat(f)) => {
                self.toggle_format(f);
                true
            }
            Some(EditorCommand::Undo) => self.undo(),
            Some(EditorCommand::Redo) => self.redo(),
            None => {
                debug!(target: "editor.cmd", key, ?mods, "unhandled key event");
                false
            }
        }
    }

    // --- internals --------------------------------------------------------

    fn markdown(&self) -> bool {
        self.opts.parser.markdown
    }

    fn incoming(&self, text: &str) -> String {
        if self.opts.nowrap {
            sanitize_plain(text, true)
        } else {
            text.to_owned()
        }
    }

    fn selection_clamped(&self) -> TextRange {
        let len = self.len();
        let sel = self.caret.normalized();
        TextRange::new(sel.from.min(len), sel.to.min(len))
    }

    fn set_selection_silent(&mut self, range: TextRange) {
        let len = self.len();
        let sel = range.normalized();
        self.caret = TextRange::new(sel.from.min(len), sel.to.min(len));
    }

    /// Install a mutated model, verify the text mirror, record history and
    /// queue notifications. `expected_text: None` means the tokens are the
    /// authority (Markdown paths, where marker injection may change the
    /// source).
    fn commit(
        &mut self,
        tokens: Vec<Token>,
        expected_text: Option<String>,
        action: HistoryAction,
        range: TextRange,
        caret: TextRange,
    ) {
        self.tokens = tokens;
        match expected_text {
            Some(expected) => {
                let got = concat_values(&self.tokens);
                if got != expected {
                    error!(
                        target: "editor.state",
                        ?action,
                        "token/text divergence; re-parsing as recovery"
                    );
                    self.tokens = parse(&expected, &self.opts.parser);
                }
                self.text = expected;
            }
            None => {
                self.text = concat_values(&self.tokens);
            }
        }
        let len = self.len();
        self.caret = TextRange::new(caret.from.min(len), caret.to.min(len));
        self.history
            .push(self.tokens.clone(), action, range, Some(self.caret));
        self.bus.note(EditorEvent::ContentUpdated);
        self.bus.note(EditorEvent::SelectionChanged);
        self.bus.flush_batch();
    }

    fn restore(&mut self, state: Vec<Token>, caret: Option<TextRange>) {
        self.tokens = state;
        self.text = concat_values(&self.tokens);
        let len = self.len();
        self.caret = caret
            .map(|c| TextRange::new(c.from.min(len), c.to.min(len)))
            .unwrap_or_else(|| TextRange::caret(len));
        self.bus.note(EditorEvent::ContentUpdated);
        self.bus.note(EditorEvent::SelectionChanged);
        self.bus.flush_batch();
    }

    /// Fragment paste: one textual replacement, then the fragment's formats
    /// and custom links re-applied over the inserted span, committed as a
    /// single history entry.
    fn paste_fragment(&mut self, fragment: Vec<Token>) {
        let text = concat_values(&fragment);
        if text.is_empty() {
            return;
        }
        let sel = self.selection_clamped();
        let ins_cp = text.chars().count();

        if self.markdown() {
            let mut range = sel;
            let mut clean = md_to_text(&self.tokens, Some(&mut range));
            clean = if range.is_empty() {
                alg_insert(&clean, range.from, &text, &self.opts.parser)
            } else {
                alg_replace(&clean, range.from, range.to, &text, &self.opts.parser)
            };
            clean = annotate_from_fragment(clean, &fragment, range.from);
            let mut caret = TextRange::caret(range.from + ins_cp);
            let src = text_to_md(&clean, Some(&mut caret));
            let tokens = parse(&src, &self.opts.parser);
            self.commit(tokens, None, HistoryAction::Paste, sel, caret);
        } else {
            let (from, to) = if sel.is_empty() {
                let p = snap_pos(&self.tokens, sel.from, Side::End);
                (p, p)
            } else {
                (
                    snap_pos(&self.tokens, sel.from, Side::Start),
                    snap_pos(&self.tokens, sel.to, Side::End),
                )
            };
            let expected = splice(&self.text, from, to, &text);
            let mut tokens = if sel.is_empty() {
                alg_insert(&self.tokens, from, &text, &self.opts.parser)
            } else {
                alg_replace(&self.tokens, from, to, &text, &self.opts.parser)
            };
            tokens = annotate_from_fragment(tokens, &fragment, from);
            self.commit(
                tokens,
                Some(expected),
                HistoryAction::Paste,
                TextRange::at(from, ins_cp),
                TextRange::caret(from + ins_cp),
            );
        }
    }
}

/// Re-apply a pasted fragment's per-token formats and custom links over the
/// freshly inserted span starting at `base`.
fn annotate_from_fragment(mut tokens: Vec<Token>, fragment: &[Token], base: usize) -> Vec<Token> {
    let mut offset = 0usize;
    for token in fragment {
        let len = token.char_len();
        if len > 0 {
            if token.is_custom_link()
                && let Some(url) = token.link_url()
            {
                tokens = alg_set_link(&tokens, Some(url), base + offset, len);
            }
            if !token.format.is_empty() {
                tokens = alg_set_format(
                    &tokens,
                    FormatUpdate::Replace(token.format),
                    base + offset,
                    len,
                );
            }
        }
        offset += len;
    }
    tokens
}

/// The format governing a toggle decision: first token of the range, or the
/// caret inheritance point for an empty range.
fn format_at(tokens: &[Token], sel: TextRange) -> Format {
    if sel.is_empty() {
        return get_format(tokens, sel.from);
    }
    token_for_pos(tokens, sel.from, Side::Start, false)
        .map(|tp| tokens[tp.index].format)
        .unwrap_or_default()
}

fn cp_to_byte(s: &str, cp: usize) -> usize {
    s.char_indices().nth(cp).map(|(i, _)| i).unwrap_or(s.len())
}

fn byte_to_cp(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

/// Code-point splice of the text mirror.
fn splice(text: &str, from: usize, to: usize, ins: &str) -> String {
    let a = cp_to_byte(text, from);
    let b = cp_to_byte(text, to);
    let mut out = String::with_capacity(text.len() + ins.len());
    out.push_str(&text[..a]);
    out.push_str(ins);
    out.push_str(&text[b..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_parser::{MentionMode, ParserOptions};
    use pretty_assertions::assert_eq;

    fn editor(value: &str) -> Editor {
        let opts = EditorOptions {
            parser: ParserOptions {
                link: true,
                mention: MentionMode::On,
                hashtag: true,
                command: true,
                ..ParserOptions::default()
            },
            value: value.to_owned(),
            ..EditorOptions::default()
        };
        Editor::with_policy(opts, FlushPolicy::Immediate, Platform::Other)
    }

    #[test]
    fn typing_at_caret() {
        let mut ed = editor("hello");
        ed.set_selection(TextRange::caret(5));
        ed.insert_text(" world");
        assert_eq!(ed.value(), "hello world");
        assert_eq!(ed.get_selection(), TextRange::caret(11));
    }

    #[test]
    fn selection_replacement() {
        let mut ed = editor("hello world");
        ed.set_selection(TextRange::new(0, 5));
        ed.insert_text("bye");
        assert_eq!(ed.value(), "bye world");
        assert_eq!(ed.get_selection(), TextRange::caret(3));
    }

    #[test]
    fn remove_and_caret() {
        let mut ed = editor("hello world");
        ed.remove_text(5, 11);
        assert_eq!(ed.value(), "hello");
        assert_eq!(ed.get_selection(), TextRange::caret(5));
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut ed = editor("a");
        ed.set_selection(TextRange::caret(1));
        ed.insert_text("b");
        assert_eq!(ed.value(), "ab");
        assert!(ed.undo());
        assert_eq!(ed.value(), "a");
        assert!(ed.redo());
        assert_eq!(ed.value(), "ab");
        assert!(!ed.redo());
    }

    #[test]
    fn toggle_format_flips() {
        let mut ed = editor("hello");
        ed.set_selection(TextRange::new(0, 5));
        ed.toggle_format(Format::BOLD);
        assert!(ed.tokens()[0].format.contains(Format::BOLD));
        ed.toggle_format(Format::BOLD);
        assert!(!ed.tokens()[0].format.contains(Format::BOLD));
    }

    #[test]
    fn shortcut_dispatch() {
        let mut ed = editor("hello");
        ed.set_selection(TextRange::new(0, 5));
        assert!(ed.handle_key("b", KeyMods::CTRL));
        assert!(ed.tokens()[0].format.contains(Format::BOLD));
        assert!(ed.handle_key("z", KeyMods::CTRL));
        assert!(!ed.tokens()[0].format.contains(Format::BOLD));
        assert!(!ed.handle_key("q", KeyMods::ALT));
    }

    #[test]
    fn plain_paste_is_sanitized() {
        let mut ed = editor("");
        ed.paste(PastePayload::Plain("a\0b\r\nc".into()));
        assert_eq!(ed.value(), "a b\nc");
    }

    #[test]
    fn nowrap_collapses_newlines() {
        let opts = EditorOptions {
            nowrap: true,
            ..EditorOptions::default()
        };
        let mut ed = Editor::with_policy(opts, FlushPolicy::Immediate, Platform::Other);
        ed.insert_text("one\ntwo\r\nthree");
        assert_eq!(ed.value(), "one two three");
    }

    #[test]
    fn fragment_paste_restores_formats_and_links() {
        let mut ed = editor("start ");
        ed.set_selection(TextRange::caret(6));
        let fragment = vec![
            Token::text("bold", Format::BOLD),
            Token::text(" and ", Format::empty()),
            Token::link("linked", "http://x", false, Format::empty()),
        ];
        ed.paste(PastePayload::Fragment(fragment));
        assert_eq!(ed.value(), "start bold and linked");
        let bold = ed
            .tokens()
            .iter()
            .find(|t| t.format.contains(Format::BOLD))
            .unwrap();
        assert_eq!(bold.value, "bold");
        let link = ed.tokens().iter().find(|t| t.is_custom_link()).unwrap();
        assert_eq!(link.value, "linked");
        assert_eq!(link.link_url(), Some("http://x"));
    }

    #[test]
    fn html_paste_requires_importer() {
        struct FixedImporter;
        impl HtmlImporter for FixedImporter {
            fn import(&self, _html: &str, _links: bool) -> Vec<Token> {
                vec![Token::text("imported", Format::ITALIC)]
            }
        }
        let mut ed = editor("");
        // Disabled: ignored.
        ed.paste(PastePayload::Html("<b>x</b>".into()));
        assert_eq!(ed.value(), "");

        let mut opts = ed.options().clone();
        opts.html = true;
        ed.set_options(opts);
        // Enabled but no importer: still ignored.
        ed.paste(PastePayload::Html("<b>x</b>".into()));
        assert_eq!(ed.value(), "");

        ed.set_html_importer(Box::new(FixedImporter));
        ed.paste(PastePayload::Html("<b>x</b>".into()));
        assert_eq!(ed.value(), "imported");
        assert!(ed.tokens()[0].format.contains(Format::ITALIC));
    }

    #[test]
    fn pick_link_reports_url() {
        let ed = editor("see mail.ru now");
        assert_eq!(ed.pick_link(6), Some("http://mail.ru".to_owned()));
        assert_eq!(ed.pick_link(1), None);
    }

    #[test]
    fn set_value_resets_content() {
        let mut ed = editor("old");
        ed.set_value("new text");
        assert_eq!(ed.value(), "new text");
        assert_eq!(ed.get_selection(), TextRange::caret(8));
        assert!(ed.can_undo());
        ed.undo();
        assert_eq!(ed.value(), "old");
    }

    #[test]
    fn events_coalesce_per_command() {
        let mut ed = editor("");
        let rx = ed.subscribe();
        ed.insert_text("abc");
        let got: Vec<EditorEvent> = rx.try_iter().collect();
        assert_eq!(
            got.iter()
                .filter(|e| **e == EditorEvent::ContentUpdated)
                .count(),
            1
        );
    }

    #[test]
    fn deferred_flush_coalesces_many_commands() {
        let opts = EditorOptions::default();
        let mut ed = Editor::with_policy(opts, FlushPolicy::Deferred, Platform::Other);
        let rx = ed.subscribe();
        ed.insert_text("a");
        ed.insert_text("b");
        ed.insert_text("c");
        assert_eq!(rx.try_iter().count(), 0);
        ed.flush_events();
        let got: Vec<EditorEvent> = rx.try_iter().collect();
        assert_eq!(
            got.iter()
                .filter(|e| **e == EditorEvent::ContentUpdated)
                .count(),
            1
        );
    }
}
