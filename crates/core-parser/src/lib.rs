//! core-parser: the tokenizing scanner.
//!
//! A single left-to-right pass over code points emits a normalized token
//! sequence. The scanner keeps the current format bitset, the open-Markdown
//! marker stack and a pending-text buffer that is flushed whenever a
//! non-text token is emitted. Dispatch at each position tries, in order:
//! newline, Markdown structure, mention, command, user sticker, hashtag,
//! link, Unicode emoji, text emoji, plain character. The sticker literal is
//! checked before the hashtag rule because the hashtag alphabet accepts the
//! sticker prefix and would otherwise shadow it.
//!
//! The scanner is pure: same input and options, same tokens.

use smallvec::SmallVec;
use tracing::trace;

use core_chars::{code_point_at, is_end_bound_char, is_start_bound_char, is_word_bound, prev_code_point};
use core_emoji::{match_emoji, match_text_emoji};
use core_tokens::{EmojiSpan, EmojiSpans, Format, Token, TokenKind, normalize};

mod links;
mod markdown;

pub use links::{ANY_SCHEME, DEFAULT_PROTOCOLS};

/// Mention recognition mode. `Strict` suppresses the bare-`@` zero-payload
/// mention and requires at least one payload character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MentionMode {
    #[default]
    Off,
    On,
    Strict,
}

impl MentionMode {
    pub fn enabled(self) -> bool {
        !matches!(self, MentionMode::Off)
    }

    pub fn is_strict(self) -> bool {
        matches!(self, MentionMode::Strict)
    }
}

/// Feature switches for the scanner. Everything defaults to off except the
/// protocol allow-list, which carries the standard entries (including the
/// [`ANY_SCHEME`] pseudo-entry) so that enabling `link` alone behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    pub text_emoji: bool,
    pub hashtag: bool,
    pub mention: MentionMode,
    pub command: bool,
    pub user_sticker: bool,
    pub link: bool,
    pub sticky_link: bool,
    pub markdown: bool,
    pub link_protocols: Vec<String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            text_emoji: false,
            hashtag: false,
            mention: MentionMode::Off,
            command: false,
            user_sticker: false,
            link: false,
            sticky_link: false,
            markdown: false,
            link_protocols: DEFAULT_PROTOCOLS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

/// Parse `input` into a normalized token sequence.
pub fn parse(input: &str, opts: &ParserOptions) -> Vec<Token> {
    normalize(Scanner::new(input, opts, Format::empty(), true).run_raw())
}

struct OpenMarker {
    bit: Format,
    index: usize,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    opts: &'a ParserOptions,
    /// Format contributed by the caller (custom-link labels carry
    /// `LINK_LABEL` here); marker bits are OR-ed on top.
    base_format: Format,
    format: Format,
    stack: SmallVec<[OpenMarker; 4]>,
    out: Vec<Token>,
    pending: String,
    pending_spans: EmojiSpans,
    pending_cp: usize,
    allow_custom_link: bool,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str, opts: &'a ParserOptions, base_format: Format, allow_custom_link: bool) -> Self {
        Self {
            src,
            pos: 0,
            opts,
            base_format,
            format: base_format,
            stack: SmallVec::new(),
            out: Vec::new(),
            pending: String::new(),
            pending_spans: EmojiSpans::new(),
            pending_cp: 0,
            allow_custom_link,
        }
    }

    /// Run to completion without the final normalization pass (nested label
    /// scans feed their raw output into the parent).
    fn run_raw(mut self) -> Vec<Token> {
        while let Some(c) = code_point_at(self.src, self.pos) {
            if self.try_newline(c) {
                continue;
            }
            if self.opts.markdown && self.try_markdown(c) {
                continue;
            }
            if self.opts.mention.enabled() && c == '@' && self.try_mention() {
                continue;
            }
            if self.opts.command && c == '/' && self.try_command() {
                continue;
            }
            if self.opts.user_sticker && c == '#' && self.try_user_sticker() {
                continue;
            }
            if self.opts.hashtag && c == '#' && self.try_hashtag() {
                continue;
            }
            if self.opts.link && !c.is_whitespace() && self.try_link() {
                continue;
            }
            if self.try_emoji() {
                continue;
            }
            if self.opts.text_emoji && self.try_text_emoji() {
                continue;
            }
            self.push_char(c);
        }
        self.finish()
    }

    // --- pending text -----------------------------------------------------

    fn push_char(&mut self, c: char) {
        self.pending.push(c);
        self.pending_cp += 1;
        self.pos += c.len_utf8();
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let value = std::mem::take(&mut self.pending);
        let spans = std::mem::take(&mut self.pending_spans);
        self.pending_cp = 0;
        self.out.push(Token::text_with_emoji(value, self.format, spans));
    }

    fn emit(&mut self, token: Token) {
        self.flush();
        self.out.push(token);
    }

    // --- bounds -----------------------------------------------------------

    fn at_word_bound(&self) -> bool {
        if self.pos == 0 {
            return true;
        }
        if self.pending.is_empty()
            && self.out.last().is_some_and(Token::is_markdown)
        {
            return true;
        }
        is_word_bound(prev_code_point(self.src, self.pos))
    }

    fn after_hashtag(&self) -> bool {
        self.pending.is_empty()
            && matches!(
                self.out.last().map(|t| &t.kind),
                Some(TokenKind::HashTag { .. })
            )
    }

    // --- dispatch arms ----------------------------------------------------

    fn try_newline(&mut self, c: char) -> bool {
        let value = match c {
            '\n' => "\n",
            '\r' => {
                if code_point_at(self.src, self.pos + 1) == Some('\n') {
                    "\r\n"
                } else {
                    "\r"
                }
            }
            _ => return false,
        };
        self.emit(Token::newline(value, self.format));
        self.pos += value.len();
        true
    }

    fn try_markdown(&mut self, c: char) -> bool {
        if let Some(bit) = markdown::marker_format(c) {
            return self.try_marker(c, bit);
        }
        if c == '[' && self.allow_custom_link {
            return self.try_custom_link();
        }
        false
    }

    fn try_marker(&mut self, c: char, bit: Format) -> bool {
        let after = code_point_at(self.src, self.pos + c.len_utf8());
        // Close wins over open: the topmost open marker with this format
        // closes regardless of nesting depth.
        if self.stack.iter().any(|m| m.bit == bit) && is_end_bound_char(after) {
            self.flush();
            self.out.push(Token::markdown(c.to_string(), self.format));
            let at = self
                .stack
                .iter()
                .rposition(|m| m.bit == bit)
                .expect("bit present on stack");
            self.stack.remove(at);
            self.recompute_format();
            trace!(target: "parser.scan", marker = %c, "md_close");
            self.pos += c.len_utf8();
            return true;
        }
        let opens = !self.format.contains(bit)
            && (self.pos == 0
                || self.pending.is_empty() && self.out.last().is_some_and(Token::is_markdown)
                || prev_code_point(self.src, self.pos).is_some_and(is_start_bound_char));
        if opens {
            self.flush();
            let index = self.out.len();
            self.out
                .push(Token::markdown(c.to_string(), self.format | bit));
            self.stack.push(OpenMarker { bit, index });
            self.format |= bit;
            trace!(target: "parser.scan", marker = %c, "md_open");
            self.pos += c.len_utf8();
            return true;
        }
        false
    }

    fn recompute_format(&mut self) {
        let mut f = self.base_format;
        for m in &self.stack {
            f |= m.bit;
        }
        self.format = f;
    }

    fn try_custom_link(&mut self) -> bool {
        let Some(cl) = markdown::scan_custom_link(self.src, self.pos) else {
            return false;
        };
        self.flush();
        let outer = self.format;
        let label_fmt = outer | Format::LINK_LABEL;
        let link_fmt = outer | Format::LINK;
        self.out.push(Token::markdown("[", label_fmt));
        let label = &self.src[self.pos + 1..cl.label_end];
        if !label.is_empty() {
            let nested = Scanner::new(label, self.opts, label_fmt, false);
            self.out.extend(nested.run_raw());
        }
        self.out.push(Token::markdown("]", label_fmt));
        self.out.push(Token::markdown("(", link_fmt));
        let url = &self.src[cl.url_start..cl.url_end];
        self.out.push(Token::link(url, url, false, link_fmt));
        self.out.push(Token::markdown(")", link_fmt));
        trace!(target: "parser.scan", url, "custom_link");
        self.pos = cl.end;
        true
    }

    fn try_mention(&mut self) -> bool {
        if !self.at_word_bound() {
            return false;
        }
        let name_start = self.pos + 1;
        let mut end = name_start;
        for (i, c) in self.src[name_start..].char_indices() {
            let ok = if i == 0 {
                c.is_ascii_alphabetic()
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            };
            if !ok {
                break;
            }
            end = name_start + i + c.len_utf8();
        }
        if end == name_start {
            if self.opts.mention.is_strict() {
                return false;
            }
            self.emit(with_format(
                Token::mention("@", "", Format::empty()),
                self.format,
            ));
            self.pos = name_start;
            return true;
        }
        let name = &self.src[name_start..end];
        self.emit(with_format(
            Token::mention(&self.src[self.pos..end], name, Format::empty()),
            self.format,
        ));
        self.pos = end;
        true
    }

    fn try_command(&mut self) -> bool {
        if !self.at_word_bound() {
            return false;
        }
        let body_start = self.pos + 1;
        let mut end = body_start;
        for (i, c) in self.src[body_start..].char_indices() {
            if !is_command_char(c) {
                break;
            }
            end = body_start + i + c.len_utf8();
        }
        if end == body_start {
            return false;
        }
        let body = &self.src[body_start..end];
        self.emit(with_format(
            Token::command(&self.src[self.pos..end], body, Format::empty()),
            self.format,
        ));
        self.pos = end;
        true
    }

    fn try_user_sticker(&mut self) -> bool {
        if !(self.at_word_bound() || self.after_hashtag()) {
            return false;
        }
        let rest = &self.src[self.pos..];
        let Some(hex_and_tail) = rest.strip_prefix("#u") else {
            return false;
        };
        let hex_len = hex_and_tail
            .chars()
            .take_while(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
            .count();
        if !(1..=16).contains(&hex_len) {
            return false;
        }
        if !hex_and_tail[hex_len..].starts_with("s#") {
            return false;
        }
        let value_len = 2 + hex_len + 2;
        let value = &rest[..value_len];
        let mut token = Token::user_sticker(value, &hex_and_tail[..hex_len]);
        token.format = self.format;
        self.emit(token);
        self.pos += value_len;
        true
    }

    fn try_hashtag(&mut self) -> bool {
        if !(self.at_word_bound() || self.after_hashtag()) {
            return false;
        }
        let body_start = self.pos + 1;
        let rest = &self.src[body_start..];
        let body_len = run_len(rest, |c| c.is_ascii_alphanumeric() || c == '_')
            .or_else(|| run_len(rest, is_cyrillic))
            .or_else(|| run_len(rest, |c| c.is_alphabetic() && !c.is_ascii()));
        let Some(body_len) = body_len else {
            return false;
        };
        let end = body_start + body_len;
        let body = &self.src[body_start..end];
        self.emit(with_format(
            Token::hashtag(&self.src[self.pos..end], body, Format::empty()),
            self.format,
        ));
        self.pos = end;
        true
    }

    fn try_link(&mut self) -> bool {
        if !self.at_word_bound() {
            return false;
        }
        let Some(m) = links::match_link(self.src, self.pos, self.opts) else {
            return false;
        };
        let value = &self.src[self.pos..m.end];
        self.emit(with_format(
            Token::link(value, m.url, true, Format::empty()),
            self.format,
        ));
        self.pos = m.end;
        true
    }

    fn try_emoji(&mut self) -> bool {
        let Some(end) = match_emoji(self.src, self.pos) else {
            return false;
        };
        let run = &self.src[self.pos..end];
        let cps = run.chars().count();
        self.pending_spans
            .push(EmojiSpan::new(self.pending_cp, self.pending_cp + cps));
        self.pending.push_str(run);
        self.pending_cp += cps;
        self.pos = end;
        true
    }

    fn try_text_emoji(&mut self) -> bool {
        if !self.at_word_bound() {
            return false;
        }
        let Some((end, glyph)) = match_text_emoji(self.src, self.pos) else {
            return false;
        };
        let run = &self.src[self.pos..end];
        let cps = run.chars().count();
        self.pending_spans.push(EmojiSpan::aliased(
            self.pending_cp,
            self.pending_cp + cps,
            glyph,
        ));
        self.pending.push_str(run);
        self.pending_cp += cps;
        self.pos = end;
        true
    }

    // --- termination ------------------------------------------------------

    fn finish(mut self) -> Vec<Token> {
        self.flush();
        // Unterminated openers are demoted to plain text; their inner tokens
        // keep the formats that were in effect when they were produced.
        for marker in self.stack.drain(..) {
            let token = &mut self.out[marker.index];
            token.kind = TokenKind::Text { sticky: false };
            token.format.remove(marker.bit);
            trace!(target: "parser.scan", value = %token.value, "md_demote_unterminated");
        }
        self.out
    }
}

fn with_format(mut token: Token, format: Format) -> Token {
    token.format = format;
    token
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, 'А'..='я' | 'Ё' | 'ё')
}

fn is_command_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || is_cyrillic(c)
}

/// Length in bytes of the leading run satisfying `pred`; `None` when empty.
fn run_len(s: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    let mut end = 0;
    for (i, c) in s.char_indices() {
        if !pred(c) {
            break;
        }
        end = i + c.len_utf8();
    }
    (end > 0).then_some(end)
}
