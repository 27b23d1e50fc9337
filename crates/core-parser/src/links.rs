//! Link recognition: scheme-prefixed URLs, bare hostnames, emails.
//!
//! Candidates are matched with anchored regexes and then post-validated in
//! code (label counts, trailing punctuation, bracket balance). The regexes
//! deliberately over-capture; stripping decides the final extent.

use once_cell::sync::Lazy;
use regex::Regex;

use core_chars::is_url_legal;

use crate::ParserOptions;

/// Pseudo-protocol entry enabling any `scheme:` form in the allow-list.
pub const ANY_SCHEME: &str = "scheme:";

/// Default protocol allow-list.
pub const DEFAULT_PROTOCOLS: &[&str] = &["http://", "https://", "ftp://", "//", ANY_SCHEME];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkMatch {
    /// Exclusive byte end of the matched text.
    pub end: usize,
    /// Absolute URL for the token payload.
    pub url: String,
}

/// Letter-led scheme of at least two characters, so `C:` and `12:30` stay
/// plain text while `tg:` and `mailto:` link. Dots are excluded from the
/// scheme alphabet so `host.com:8080` resolves as host + port.
static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+-]+:").expect("scheme regex"));

/// Host labels joined by dots; label alphabet per the hostname rule
/// (Unicode letters, digits, `_`, `-`), at least two labels.
static HOST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N}_-]+(?:\.[\p{L}\p{N}_-]+)+").expect("host regex"));

/// Email local part (max length checked in code) plus host.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9._%+!#$&'*/=?^`{|}~-]+)@([\p{L}\p{N}_-]+(?:\.[\p{L}\p{N}_-]+)+)")
        .expect("email regex")
});

/// Try every link shape at byte `pos`. The caller has already verified the
/// left word bound.
pub(crate) fn match_link(src: &str, pos: usize, opts: &ParserOptions) -> Option<LinkMatch> {
    let rest = &src[pos..];
    scheme_link(rest, opts)
        .or_else(|| email_link(rest))
        .or_else(|| hostname_link(rest))
        .map(|m| LinkMatch {
            end: pos + m.end,
            url: m.url,
        })
}

fn scheme_link(rest: &str, opts: &ParserOptions) -> Option<LinkMatch> {
    let mut prefix_len = 0usize;
    for proto in &opts.link_protocols {
        if proto == ANY_SCHEME {
            if let Some(m) = SCHEME_RE.find(rest) {
                prefix_len = prefix_len.max(m.end());
            }
        } else if let Some(prefix) = rest.get(..proto.len())
            && prefix.eq_ignore_ascii_case(proto)
        {
            prefix_len = prefix_len.max(proto.len());
        }
    }
    if prefix_len == 0 {
        return None;
    }
    let body_end = url_run(rest, prefix_len);
    let kept = strip_trailing(&rest[..body_end]);
    if kept.len() <= prefix_len {
        // Nothing but the prefix survived; `http://` alone is not a link.
        return None;
    }
    let url = if kept.starts_with("//") {
        format!("http:{kept}")
    } else {
        kept.to_owned()
    };
    Some(LinkMatch {
        end: kept.len(),
        url,
    })
}

fn email_link(rest: &str) -> Option<LinkMatch> {
    let caps = EMAIL_RE.captures(rest)?;
    let whole = caps.get(0).expect("whole match");
    let local = caps.get(1).expect("local part");
    if local.as_str().chars().count() > 64 {
        return None;
    }
    if !valid_host(caps.get(2).expect("host").as_str()) {
        return None;
    }
    // `A@b@c` and friends: a second `@` adjoining the match rejects it.
    if rest[whole.end()..].starts_with('@') {
        return None;
    }
    let kept = strip_trailing(&rest[..whole.end()]);
    if kept.len() < whole.end() && !kept.contains('@') {
        return None;
    }
    Some(LinkMatch {
        end: kept.len(),
        url: format!("mailto:{kept}"),
    })
}

fn hostname_link(rest: &str) -> Option<LinkMatch> {
    let host = HOST_RE.find(rest)?;
    if !valid_host(host.as_str()) {
        return None;
    }
    let mut end = host.end();
    // Optional port.
    if let Some(after) = rest[end..].strip_prefix(':') {
        let digits = after.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 && digits <= 5 {
            end += 1 + digits;
        }
    }
    // Optional path / query / fragment.
    if matches!(rest[end..].chars().next(), Some('/' | '?' | '#')) {
        end = url_run(rest, end);
    }
    let kept = strip_trailing(&rest[..end]);
    if kept.len() < host.end() {
        // Stripping must never eat into the host itself.
        return None;
    }
    Some(LinkMatch {
        end: kept.len(),
        url: format!("http://{kept}"),
    })
}

/// ≥ 2 labels, last label ≥ 2 chars, no empty labels. The label alphabet is
/// enforced by the regexes.
fn valid_host(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    if labels.iter().any(|l| l.is_empty()) {
        return false;
    }
    labels.last().expect("non-empty split").chars().count() >= 2
}

/// Greedy run of URL-legal characters starting at byte `from`.
fn url_run(s: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in s[from..].char_indices() {
        if !is_url_legal(c) {
            return from + i;
        }
        end = from + i + c.len_utf8();
    }
    end
}

/// Balanced trailing stripping: drop sentence punctuation and unpaired
/// closing brackets from the tail. `?`/`!`/`.` followed by more URL material
/// never reach here because they are not at the tail.
fn strip_trailing(body: &str) -> &str {
    let mut kept = body;
    loop {
        let Some(last) = kept.chars().next_back() else {
            return kept;
        };
        match last {
            '.' | ',' | '?' | '!' | ':' | ';' => {
                kept = &kept[..kept.len() - last.len_utf8()];
            }
            ')' | ']' | '}' => {
                let open = matching_open(last);
                let opens = kept.matches(open).count();
                let closes = kept.matches(last).count();
                if closes > opens {
                    kept = &kept[..kept.len() - last.len_utf8()];
                } else {
                    return kept;
                }
            }
            _ => return kept,
        }
    }
}

fn matching_open(close: char) -> char {
    match close {
        ')' => '(',
        ']' => '[',
        '}' => '{',
        _ => unreachable!("only closers reach here"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn opts() -> ParserOptions {
        ParserOptions {
            link: true,
            ..ParserOptions::default()
        }
    }

    fn hit(src: &str) -> Option<(String, String)> {
        match_link(src, 0, &opts()).map(|m| (src[..m.end].to_owned(), m.url))
    }

    #[test]
    fn bare_hostnames() {
        assert_eq!(
            hit("mail.ru"),
            Some(("mail.ru".into(), "http://mail.ru".into()))
        );
        assert_eq!(
            hit("mail.ru rest"),
            Some(("mail.ru".into(), "http://mail.ru".into()))
        );
        assert_eq!(hit("e.g"), None); // last label too short
        assert_eq!(hit("word"), None);
    }

    #[test]
    fn sentence_question_mark_is_excluded() {
        assert_eq!(
            hit("mail.ru?"),
            Some(("mail.ru".into(), "http://mail.ru".into()))
        );
        assert_eq!(
            hit("mail.ru?a"),
            Some(("mail.ru?a".into(), "http://mail.ru?a".into()))
        );
    }

    #[test]
    fn ports_and_paths() {
        assert_eq!(
            hit("host.com:8080/a/b?q=1#frag,"),
            Some((
                "host.com:8080/a/b?q=1#frag".into(),
                "http://host.com:8080/a/b?q=1#frag".into()
            ))
        );
    }

    #[test]
    fn balanced_brackets_survive() {
        assert_eq!(
            hit("en.wiki.org/wiki/Foo_(bar)"),
            Some((
                "en.wiki.org/wiki/Foo_(bar)".into(),
                "http://en.wiki.org/wiki/Foo_(bar)".into()
            ))
        );
        assert_eq!(
            hit("mail.ru/x)"),
            Some(("mail.ru/x".into(), "http://mail.ru/x".into()))
        );
    }

    #[test]
    fn scheme_links() {
        assert_eq!(
            hit("https://mail.ru/x."),
            Some(("https://mail.ru/x".into(), "https://mail.ru/x".into()))
        );
        assert_eq!(
            hit("//cdn.host/x"),
            Some(("//cdn.host/x".into(), "http://cdn.host/x".into()))
        );
        assert_eq!(
            hit("tg:resolve?domain=x"),
            Some(("tg:resolve?domain=x".into(), "tg:resolve?domain=x".into()))
        );
        assert_eq!(hit("http://"), None);
        assert_eq!(hit("12:30"), None);
    }

    #[test]
    fn emails() {
        assert_eq!(
            hit("user.name+tag@mail.ru!"),
            Some((
                "user.name+tag@mail.ru".into(),
                "mailto:user.name+tag@mail.ru".into()
            ))
        );
        assert_eq!(hit("A@b@c"), None);
        assert_eq!(hit("a@host"), None); // single-label host
    }

    #[test]
    fn idn_hosts() {
        assert_eq!(
            hit("почта.рф"),
            Some(("почта.рф".into(), "http://почта.рф".into()))
        );
        assert_eq!(
            hit("xn--80a1acny.xn--p1ai"),
            Some((
                "xn--80a1acny.xn--p1ai".into(),
                "http://xn--80a1acny.xn--p1ai".into()
            ))
        );
    }
}
