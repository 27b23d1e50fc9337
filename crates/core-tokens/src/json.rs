//! Clipboard fragment codec: token-sequence JSON.
//!
//! The wire shape is one flat object per token with the §3 fields; absent
//! optionals are omitted on encode and defaulted on decode. Unknown fields
//! are accepted and ignored; unknown kinds decode as plain text so a newer
//! producer cannot break an older consumer. Order is preserved.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{EmojiSpan, EmojiSpans, Format, Token, TokenKind};

#[derive(Debug, Serialize, Deserialize)]
struct EmojiDto {
    from: usize,
    to: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenDto {
    kind: String,
    value: String,
    #[serde(default, skip_serializing_if = "format_is_empty")]
    format: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    emoji: Vec<EmojiDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auto: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hashtag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(default, rename = "stickerId", skip_serializing_if = "Option::is_none")]
    sticker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sticky: Option<bool>,
}

fn format_is_empty(bits: &u16) -> bool {
    *bits == 0
}

fn to_dto(token: &Token) -> TokenDto {
    let mut dto = TokenDto {
        kind: kind_name(&token.kind).to_owned(),
        value: token.value.clone(),
        format: token.format.bits(),
        emoji: token
            .emoji
            .iter()
            .map(|s| EmojiDto {
                from: s.from,
                to: s.to,
                alias: s.alias.clone(),
            })
            .collect(),
        link: None,
        auto: None,
        mention: None,
        hashtag: None,
        command: None,
        sticker_id: None,
        sticky: None,
    };
    match &token.kind {
        TokenKind::Text { sticky } => {
            if *sticky {
                dto.sticky = Some(true);
            }
        }
        TokenKind::Link { link, auto, sticky } => {
            dto.link = Some(link.clone());
            dto.auto = Some(*auto);
            if *sticky {
                dto.sticky = Some(true);
            }
        }
        TokenKind::Mention { mention } => dto.mention = Some(mention.clone()),
        TokenKind::Command { command } => dto.command = Some(command.clone()),
        TokenKind::HashTag { hashtag } => dto.hashtag = Some(hashtag.clone()),
        TokenKind::UserSticker { sticker_id } => dto.sticker_id = Some(sticker_id.clone()),
        TokenKind::Markdown | TokenKind::Newline => {}
    }
    dto
}

fn kind_name(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Text { .. } => "text",
        TokenKind::Link { .. } => "link",
        TokenKind::Mention { .. } => "mention",
        TokenKind::Command { .. } => "command",
        TokenKind::HashTag { .. } => "hashtag",
        TokenKind::UserSticker { .. } => "userSticker",
        TokenKind::Markdown => "markdown",
        TokenKind::Newline => "newline",
    }
}

fn from_dto(dto: TokenDto) -> Token {
    let format = Format::from_bits_truncate(dto.format);
    let emoji: EmojiSpans = dto
        .emoji
        .into_iter()
        .map(|e| EmojiSpan {
            from: e.from,
            to: e.to,
            alias: e.alias,
        })
        .collect();
    let kind = match dto.kind.as_str() {
        "text" => TokenKind::Text {
            sticky: dto.sticky.unwrap_or(false),
        },
        "link" => TokenKind::Link {
            link: dto.link.unwrap_or_else(|| dto.value.clone()),
            auto: dto.auto.unwrap_or(false),
            sticky: dto.sticky.unwrap_or(false),
        },
        "mention" => TokenKind::Mention {
            mention: dto.mention.unwrap_or_default(),
        },
        "command" => TokenKind::Command {
            command: dto.command.unwrap_or_default(),
        },
        "hashtag" => TokenKind::HashTag {
            hashtag: dto.hashtag.unwrap_or_default(),
        },
        "userSticker" => TokenKind::UserSticker {
            sticker_id: dto.sticker_id.unwrap_or_default(),
        },
        "markdown" => TokenKind::Markdown,
        "newline" => TokenKind::Newline,
        other => {
            warn!(target: "tokens.json", kind = other, "unknown token kind, decoding as text");
            TokenKind::Text { sticky: false }
        }
    };
    Token {
        kind,
        value: dto.value,
        format,
        emoji,
    }
}

/// Encode a token sequence as the clipboard fragment payload.
pub fn tokens_to_json(tokens: &[Token]) -> serde_json::Result<String> {
    let dtos: Vec<TokenDto> = tokens.iter().map(to_dto).collect();
    serde_json::to_string(&dtos)
}

/// Decode a clipboard fragment payload.
pub fn tokens_from_json(json: &str) -> serde_json::Result<Vec<Token>> {
    let dtos: Vec<TokenDto> = serde_json::from_str(json)?;
    Ok(dtos.into_iter().map(from_dto).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Format, Token};
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_preserves_order_and_fields() {
        let mut spans = EmojiSpans::new();
        spans.push(EmojiSpan::aliased(0, 1, ":)"));
        let seq = vec![
            Token::text("hello ", Format::BOLD),
            Token::mention("@who", "who", Format::empty()),
            Token::link("mail.ru", "http://mail.ru", true, Format::empty()),
            Token::link("label", "http://x", false, Format::ITALIC),
            Token {
                kind: TokenKind::Text { sticky: false },
                value: "🙂".into(),
                format: Format::empty(),
                emoji: spans,
            },
            Token::newline("\n", Format::empty()),
        ];
        let json = tokens_to_json(&seq).unwrap();
        let back = tokens_from_json(&json).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"[{"kind":"text","value":"x","format":1,"futureField":{"a":1}}]"#;
        let back = tokens_from_json(json).unwrap();
        assert_eq!(back, vec![Token::text("x", Format::BOLD)]);
    }

    #[test]
    fn unknown_kind_degrades_to_text() {
        let json = r#"[{"kind":"hologram","value":"x"}]"#;
        let back = tokens_from_json(json).unwrap();
        assert!(back[0].is_text());
        assert_eq!(back[0].value, "x");
    }

    #[test]
    fn sticky_flag_survives() {
        let seq = vec![Token::sticky(Format::BOLD | Format::ITALIC)];
        let back = tokens_from_json(&tokens_to_json(&seq).unwrap()).unwrap();
        assert!(back[0].is_sticky_text());
        assert_eq!(back[0].format, Format::BOLD | Format::ITALIC);
    }
}
