//! Editor-level configuration: the parser feature set plus coordinator
//! behaviors.
//!
//! Emoji rendering (glyph → image URL) is a renderer concern; the core only
//! carries the emoji annotations, so no render hook is stored here.

use core_parser::ParserOptions;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditorOptions {
    /// Feature switches forwarded to the scanner.
    pub parser: ParserOptions,
    /// Initial raw text.
    pub value: String,
    /// Inserting `\n` outside Markdown mode clears the inherited format at
    /// the start of the new line.
    pub reset_format_on_newline: bool,
    /// Collapse `\r?\n` in incoming text to a space (single-line fields).
    pub nowrap: bool,
    /// Accept `text/html` paste payloads (requires a registered importer).
    pub html: bool,
    /// Whether HTML anchors survive as custom links on paste.
    pub html_links: bool,
}
