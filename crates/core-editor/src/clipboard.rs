//! Clipboard payloads.
//!
//! Three MIME flavors reach the editor: the internal fragment (token
//! sequence JSON, the preferred round-trip), HTML (delegated to an external
//! importer), and plain text (sanitized here). Fragment JSON is produced by
//! `cut`/`copy` and decoded on paste.

use anyhow::Context;

use core_tokens::{Token, tokens_from_json, tokens_to_json};

/// MIME type of the internal fragment payload.
pub const FRAGMENT_MIME: &str = "tamtam/fragment";

/// A decoded clipboard payload handed to [`crate::Editor::paste`].
#[derive(Debug, Clone)]
pub enum PastePayload {
    /// `tamtam/fragment`: a token sequence (internal round-trip).
    Fragment(Vec<Token>),
    /// `text/html`: delegated to the registered [`HtmlImporter`].
    Html(String),
    /// `text/plain`: raw text, sanitized before insertion.
    Plain(String),
}

impl PastePayload {
    /// Decode a `tamtam/fragment` JSON payload.
    pub fn from_fragment_json(json: &str) -> anyhow::Result<Self> {
        let tokens = tokens_from_json(json).context("malformed fragment payload")?;
        Ok(Self::Fragment(tokens))
    }
}

/// Encode a token sequence as the fragment payload for the clipboard.
pub fn fragment_json(tokens: &[Token]) -> anyhow::Result<String> {
    tokens_to_json(tokens).context("fragment payload encode")
}

/// External HTML ingest collaborator. The core never parses HTML itself;
/// a host that enables the `html` editor option registers an importer.
pub trait HtmlImporter {
    /// Convert pasted HTML into a token sequence. `links` mirrors the
    /// `htmlLinks` editor option: whether anchor hrefs survive as custom
    /// links.
    fn import(&self, html: &str, links: bool) -> Vec<Token>;
}

/// Plain-text sanitation: NUL bytes become spaces, CRLF/CR collapse to LF,
/// or to a space when the editor is in `nowrap` mode.
pub fn sanitize_plain(text: &str, nowrap: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\0' => out.push(' '),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(if nowrap { ' ' } else { '\n' });
            }
            '\n' => out.push(if nowrap { ' ' } else { '\n' }),
            c => out.push(c),
        }
    }
    out
}
