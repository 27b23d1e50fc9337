//! core-markdown: the mirror between Markdown-bearing and clean sequences.
//!
//! In Markdown mode the model keeps control characters as tokens; the user
//! logically sees the *clean* sequence with markers stripped and custom
//! links collapsed to their labels. [`md_to_text`] and [`text_to_md`] map
//! between the two, adjusting caret ranges across stripped/injected marker
//! characters. Incremental Markdown edits run as
//! `md_to_text → edit on clean → text_to_md → re-parse`; the parser is
//! linear, so the full re-parse per edit is the accepted cost.
//!
//! Composition law: for parser-produced `T`,
//! `parse(text_to_md(md_to_text(T)))` equals `T` up to normalization.
//! Literal marker characters sitting directly at a format transition can
//! defeat this (there is no escaping in this dialect); the editor never
//! produces such sequences on its own.

use tracing::trace;

use core_chars::{is_end_bound_char, is_start_bound_char};
use core_algebra::FormatUpdate;
use core_parser::{ParserOptions, parse};
use core_tokens::{Format, TextRange, Token, TokenKind, normalize};

/// Marker emission order (openers; closers mirror the open stack). `_` goes
/// last: it is the one marker that is not itself a start-bound character, so
/// no other opener may have to follow it.
const MD_ORDER: &[(Format, char)] = &[
    (Format::BOLD, '*'),
    (Format::STRIKE, '~'),
    (Format::MONOSPACE, '`'),
    (Format::ITALIC, '_'),
];

fn emittable(format: Format) -> Format {
    format & (Format::BOLD | Format::ITALIC | Format::STRIKE | Format::MONOSPACE)
}

// --- md → clean ----------------------------------------------------------

/// Strip Markdown tokens and collapse custom links to their labels. The
/// optional range is rewritten from source offsets to clean offsets; an
/// endpoint inside a stripped marker snaps to the marker's clean position.
pub fn md_to_text(tokens: &[Token], range: Option<&mut TextRange>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut label_buf: Vec<Token> = Vec::new();
    let mut strips: Vec<(usize, usize)> = Vec::new();
    let mut src_pos = 0usize;

    for token in tokens {
        let len = token.char_len();
        match &token.kind {
            TokenKind::Markdown => {
                strips.push((src_pos, len));
            }
            TokenKind::Link { link, auto: false, .. }
                if token.format.contains(Format::LINK) && !label_buf.is_empty() =>
            {
                // The URL of a custom-link structure: its characters are
                // control text; the buffered label becomes the link.
                strips.push((src_pos, len));
                for mut label in label_buf.drain(..) {
                    label.format.remove(Format::LINK_LABEL | Format::LINK);
                    if !label.is_newline() {
                        label.kind = TokenKind::Link {
                            link: link.clone(),
                            auto: false,
                            sticky: false,
                        };
                    }
                    out.push(label);
                }
            }
            _ if token.format.contains(Format::LINK_LABEL) => {
                label_buf.push(token.clone());
            }
            _ => {
                flush_labels(&mut out, &mut label_buf);
                out.push(token.clone());
            }
        }
        src_pos += len;
    }
    flush_labels(&mut out, &mut label_buf);

    if let Some(range) = range {
        range.from = strip_adjust(&strips, range.from);
        range.to = strip_adjust(&strips, range.to);
    }
    trace!(target: "markdown.mirror", stripped = strips.len(), "md_to_text");
    normalize(out)
}

/// A label without a following URL (malformed structure): keep it as plain
/// content.
fn flush_labels(out: &mut Vec<Token>, label_buf: &mut Vec<Token>) {
    for mut label in label_buf.drain(..) {
        label.format.remove(Format::LINK_LABEL | Format::LINK);
        out.push(label);
    }
}

fn strip_adjust(strips: &[(usize, usize)], pos: usize) -> usize {
    let mut shift = 0usize;
    for &(start, len) in strips {
        if pos >= start + len {
            shift += len;
        } else if pos > start {
            // Inside a stripped marker: both sides collapse to the marker's
            // clean position.
            return start - shift;
        } else {
            break;
        }
    }
    pos - shift
}

// --- clean → md ----------------------------------------------------------

/// Re-emit a Markdown source string from a clean sequence, inserting
/// canonical markers around equal-format runs and `[label](url)` around
/// custom-link runs. A space is injected where a marker would otherwise not
/// be parse-legal. The optional range is rewritten from clean offsets to
/// source offsets.
pub fn text_to_md(tokens: &[Token], range: Option<&mut TextRange>) -> String {
    let mut out = String::new();
    let mut injections: Vec<(usize, usize)> = Vec::new();
    let mut stack: Vec<Format> = Vec::new();
    let mut clean_pos = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        if token.is_sticky_text() || token.is_markdown() {
            continue;
        }
        let target = emittable(token.format);
        let injected = transition(&mut out, &mut stack, target, first_char(token));
        if injected > 0 {
            injections.push((clean_pos, injected));
        }

        if let TokenKind::Link { link, auto: false, .. } = &token.kind {
            let first_of_run = !prev_same_link(tokens, i, link);
            let last_of_run = !next_same_link(tokens, i, link);
            if first_of_run {
                out.push('[');
                injections.push((clean_pos, 1));
            }
            out.push_str(&token.value);
            clean_pos += token.char_len();
            if last_of_run {
                let tail = format!("]({link})");
                injections.push((clean_pos, tail.chars().count()));
                out.push_str(&tail);
            }
            continue;
        }

        out.push_str(&token.value);
        clean_pos += token.char_len();
    }
    // Close everything still open.
    let injected = transition(&mut out, &mut stack, Format::empty(), None);
    if injected > 0 {
        injections.push((clean_pos, injected));
    }

    if let Some(range) = range {
        let caret = range.is_empty();
        range.from = inject_adjust(&injections, range.from, true);
        range.to = inject_adjust(&injections, range.to, caret);
    }
    trace!(target: "markdown.mirror", injections = injections.len(), "text_to_md");
    out
}

fn first_char(token: &Token) -> Option<char> {
    token.value.chars().next()
}

fn prev_same_link(tokens: &[Token], i: usize, link: &str) -> bool {
    i > 0
        && matches!(&tokens[i - 1].kind,
            TokenKind::Link { link: l, auto: false, .. } if l == link)
}

fn next_same_link(tokens: &[Token], i: usize, link: &str) -> bool {
    i + 1 < tokens.len()
        && matches!(&tokens[i + 1].kind,
            TokenKind::Link { link: l, auto: false, .. } if l == link)
}

/// Emit closers/openers to move the open set to `target`. Returns the
/// number of characters written. `next` is the first content character that
/// will follow, used for marker legality.
fn transition(
    out: &mut String,
    stack: &mut Vec<Format>,
    target: Format,
    next: Option<char>,
) -> usize {
    let mut written = 0usize;

    // Closers in reverse order of the open stack, skipping bits that stay.
    let mut idx = stack.len();
    let mut closed_any = false;
    while idx > 0 {
        idx -= 1;
        let bit = stack[idx];
        if target.contains(bit) {
            continue;
        }
        out.push(marker_char(bit));
        written += 1;
        closed_any = true;
        stack.remove(idx);
    }
    // The last closer must be followed by an end-bound character to parse;
    // the follower is either the first opener about to be emitted or the
    // next content character.
    let next_opener = MD_ORDER
        .iter()
        .find(|&&(bit, _)| target.contains(bit) && !stack.contains(&bit))
        .map(|&(_, c)| c);
    if closed_any && !is_end_bound_char(next_opener.or(next)) {
        out.push(' ');
        written += 1;
    }

    // Openers in canonical order.
    let mut first_opener = true;
    for &(bit, ch) in MD_ORDER {
        if target.contains(bit) && !stack.contains(&bit) {
            if first_opener {
                let prev = out.chars().next_back();
                if let Some(p) = prev
                    && !is_start_bound_char(p)
                {
                    out.push(' ');
                    written += 1;
                }
                first_opener = false;
            }
            out.push(ch);
            written += 1;
            stack.push(bit);
        }
    }
    written
}

fn marker_char(bit: Format) -> char {
    MD_ORDER
        .iter()
        .find(|&&(b, _)| b == bit)
        .map(|&(_, c)| c)
        .expect("emittable bit")
}

/// Shift a clean endpoint past the markers injected before it.
/// `inclusive` counts injections sitting exactly at the endpoint (range
/// starts and carets land after an opener; range ends stop before a closer).
fn inject_adjust(injections: &[(usize, usize)], pos: usize, inclusive: bool) -> usize {
    let mut shift = 0usize;
    for &(at, len) in injections {
        let counts = if inclusive { at <= pos } else { at < pos };
        if counts {
            shift += len;
        }
    }
    pos + shift
}

// --- incremental edits ---------------------------------------------------

/// Result of an incremental Markdown edit: the re-parsed sequence and the
/// caret range mapped back into source offsets.
pub type MdEdit = (Vec<Token>, TextRange);

fn reemit(clean: Vec<Token>, mut caret: TextRange, opts: &ParserOptions) -> MdEdit {
    let src = text_to_md(&clean, Some(&mut caret));
    (parse(&src, opts), caret)
}

/// Insert in Markdown mode: edit the clean projection, re-emit, re-parse.
pub fn md_insert_text(tokens: &[Token], pos: usize, text: &str, opts: &ParserOptions) -> MdEdit {
    let mut range = TextRange::caret(pos);
    let clean = md_to_text(tokens, Some(&mut range));
    let edited = core_algebra::insert_text(&clean, range.from, text, opts);
    let caret = TextRange::caret(range.from + text.chars().count());
    reemit(edited, caret, opts)
}

pub fn md_remove_text(tokens: &[Token], from: usize, to: usize, opts: &ParserOptions) -> MdEdit {
    let mut range = TextRange::new(from, to);
    let clean = md_to_text(tokens, Some(&mut range));
    let edited = core_algebra::remove_text(&clean, range.from, range.to, opts);
    reemit(edited, TextRange::caret(range.from), opts)
}

pub fn md_replace_text(
    tokens: &[Token],
    from: usize,
    to: usize,
    text: &str,
    opts: &ParserOptions,
) -> MdEdit {
    let mut range = TextRange::new(from, to);
    let clean = md_to_text(tokens, Some(&mut range));
    let edited = core_algebra::replace_text(&clean, range.from, range.to, text, opts);
    let caret = TextRange::caret(range.from + text.chars().count());
    reemit(edited, caret, opts)
}

pub fn md_set_format(
    tokens: &[Token],
    update: FormatUpdate,
    pos: usize,
    len: usize,
    opts: &ParserOptions,
) -> MdEdit {
    let mut range = TextRange::at(pos, len);
    let clean = md_to_text(tokens, Some(&mut range));
    let edited = core_algebra::set_format(&clean, update, range.from, range.len());
    reemit(edited, range, opts)
}

pub fn md_set_link(
    tokens: &[Token],
    url: Option<&str>,
    pos: usize,
    len: usize,
    opts: &ParserOptions,
) -> MdEdit {
    let mut range = TextRange::at(pos, len);
    let clean = md_to_text(tokens, Some(&mut range));
    let edited = core_algebra::set_link(&clean, url, range.from, range.len());
    reemit(edited, range, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_tokens::concat_values;
    use pretty_assertions::assert_eq;

    fn md_opts() -> ParserOptions {
        ParserOptions {
            markdown: true,
            link: true,
            ..ParserOptions::default()
        }
    }

    fn clean_of(src: &str) -> Vec<Token> {
        md_to_text(&parse(src, &md_opts()), None)
    }

    #[test]
    fn strips_markers_and_keeps_formats() {
        let clean = clean_of("*foo* bar");
        assert_eq!(clean.len(), 2);
        assert_eq!(clean[0].value, "foo");
        assert_eq!(clean[0].format, Format::BOLD);
        assert_eq!(clean[1].value, " bar");
    }

    #[test]
    fn collapses_custom_links() {
        let clean = clean_of("see [label](http://x)!");
        assert_eq!(concat_values(&clean), "see label!");
        let link = clean.iter().find(|t| t.is_custom_link()).unwrap();
        assert_eq!(link.value, "label");
        assert_eq!(link.link_url(), Some("http://x"));
        assert!(!link.format.contains(Format::LINK_LABEL));
    }

    #[test]
    fn range_moves_into_clean_space() {
        let tokens = parse("*foo* bar", &md_opts());
        // Select "foo" in source space: [1, 4].
        let mut r = TextRange::new(1, 4);
        md_to_text(&tokens, Some(&mut r));
        assert_eq!(r, TextRange::new(0, 3));
        // An endpoint inside the trailing marker snaps to its position.
        let mut r = TextRange::new(2, 5);
        md_to_text(&tokens, Some(&mut r));
        assert_eq!(r, TextRange::new(1, 3));
    }

    #[test]
    fn reemits_canonical_markers() {
        let clean = vec![
            Token::text("foo bar", Format::BOLD),
            Token::text(" baz", Format::empty()),
        ];
        assert_eq!(text_to_md(&clean, None), "*foo bar* baz");
    }

    #[test]
    fn injects_space_for_illegal_opener() {
        let clean = vec![
            Token::text("ab", Format::empty()),
            Token::text("cd", Format::BOLD),
        ];
        assert_eq!(text_to_md(&clean, None), "ab *cd*");
    }

    #[test]
    fn format_switch_stays_parse_legal() {
        let clean = vec![
            Token::text("ab", Format::BOLD),
            Token::text("cd", Format::ITALIC),
        ];
        let src = text_to_md(&clean, None);
        assert_eq!(src, "*ab* _cd_");
        let md = md_opts();
        let reparsed = md_to_text(&parse(&src, &md), None);
        let runs: Vec<(&str, Format)> = reparsed
            .iter()
            .map(|t| (t.value.as_str(), t.format))
            .collect();
        assert_eq!(
            runs,
            vec![
                ("ab", Format::BOLD),
                (" ", Format::empty()),
                ("cd", Format::ITALIC),
            ]
        );
    }

    #[test]
    fn reemits_custom_link() {
        let clean = vec![
            Token::text("see ", Format::empty()),
            Token::link("label", "http://x", false, Format::empty()),
        ];
        assert_eq!(text_to_md(&clean, None), "see [label](http://x)");
    }

    #[test]
    fn overlapping_runs_round_trip() {
        for src in [
            "*foo* bar",
            "_a *b_ c*",
            "*bold _nested_ rest* tail",
            "plain text",
            "a ~s~ b `m` c",
            "see [label](http://x) end",
            "*multi\nline* tail",
        ] {
            let parsed = parse(src, &md_opts());
            let clean = md_to_text(&parsed, None);
            let reemitted = text_to_md(&clean, None);
            let reparsed = parse(&reemitted, &md_opts());
            assert_eq!(
                reparsed, parsed,
                "composition law failed for {src:?} via {reemitted:?}"
            );
        }
    }

    #[test]
    fn range_moves_back_to_source_space() {
        let clean = vec![
            Token::text("foo bar", Format::BOLD),
            Token::text(" baz", Format::empty()),
        ];
        // Select "foo bar" in clean space.
        let mut r = TextRange::new(0, 7);
        let src = text_to_md(&clean, Some(&mut r));
        assert_eq!(src, "*foo bar* baz");
        assert_eq!(r, TextRange::new(1, 8));
    }

    #[test]
    fn md_set_format_scenario() {
        let tokens = parse("foo bar baz", &md_opts());
        let (out, range) = md_set_format(
            &tokens,
            FormatUpdate::add(Format::BOLD),
            0,
            7,
            &md_opts(),
        );
        assert_eq!(concat_values(&out), "*foo bar* baz");
        assert_eq!(range, TextRange::new(1, 8));
    }

    #[test]
    fn md_insert_keeps_markers_coherent() {
        let tokens = parse("*ab* c", &md_opts());
        // Insert inside the bold run (source pos 2 → clean pos 1).
        let (out, caret) = md_insert_text(&tokens, 2, "X", &md_opts());
        assert_eq!(concat_values(&out), "*aXb* c");
        assert_eq!(caret, TextRange::caret(3));
        let bold: String = out
            .iter()
            .filter(|t| t.is_text() && t.format.contains(Format::BOLD))
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(bold, "aXb");
    }

    #[test]
    fn md_remove_drops_stale_markers() {
        let tokens = parse("*ab* c", &md_opts());
        // Remove the whole bold content: "ab" is clean [0, 2).
        let (out, caret) = md_remove_text(&tokens, 1, 3, &md_opts());
        assert_eq!(concat_values(&out), " c");
        assert_eq!(caret, TextRange::caret(0));
    }

    #[test]
    fn md_set_link_wraps_in_brackets() {
        let tokens = parse("pick me", &md_opts());
        let (out, _) = md_set_link(&tokens, Some("http://x"), 5, 2, &md_opts());
        assert_eq!(concat_values(&out), "pick [me](http://x)");
    }
}
