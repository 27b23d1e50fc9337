//! Shortcut parsing and resolution.
//!
//! Syntax: `"<mod>+<mod>+<key>"` with mods in `cmd|ctrl|alt|shift|meta|any`,
//! case-insensitive. `cmd` resolves to `meta` on Apple platforms and `ctrl`
//! elsewhere; `any` matches every modifier combination. The match key is the
//! lower-cased physical key name (`b`, `z`, `enter`).

use bitflags::bitflags;
use thiserror::Error;

use core_tokens::Format;

bitflags! {
    /// Modifier state of a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeyMods: u8 {
        const CTRL = 1;
        const ALT = 1 << 1;
        const SHIFT = 1 << 2;
        const META = 1 << 3;
    }
}

/// Platform flavor deciding what `cmd` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    Apple,
    #[default]
    Other,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") || cfg!(target_os = "ios") {
            Self::Apple
        } else {
            Self::Other
        }
    }

    fn cmd_mod(self) -> KeyMods {
        match self {
            Self::Apple => KeyMods::META,
            Self::Other => KeyMods::CTRL,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("empty shortcut spec")]
    Empty,
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("shortcut `{0}` has no key")]
    MissingKey(String),
}

/// A parsed shortcut pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    mods: KeyMods,
    any_mods: bool,
    key: String,
}

impl Shortcut {
    /// Parse a spec like `cmd+shift+z` for the given platform.
    pub fn parse(spec: &str, platform: Platform) -> Result<Self, ShortcutParseError> {
        if spec.is_empty() {
            return Err(ShortcutParseError::Empty);
        }
        let mut parts: Vec<&str> = spec.split('+').collect();
        // A trailing `+` means the key itself is `+`.
        let key = match parts.pop() {
            Some("") if parts.last() == Some(&"") => {
                parts.pop();
                "+".to_owned()
            }
            Some("") | None => return Err(ShortcutParseError::MissingKey(spec.to_owned())),
            Some(k) => k.to_ascii_lowercase(),
        };
        let mut mods = KeyMods::empty();
        let mut any_mods = false;
        for part in parts {
            match part.to_ascii_lowercase().as_str() {
                "cmd" => mods |= platform.cmd_mod(),
                "ctrl" => mods |= KeyMods::CTRL,
                "alt" => mods |= KeyMods::ALT,
                "shift" => mods |= KeyMods::SHIFT,
                "meta" => mods |= KeyMods::META,
                "any" => any_mods = true,
                other => return Err(ShortcutParseError::UnknownModifier(other.to_owned())),
            }
        }
        Ok(Self {
            mods,
            any_mods,
            key,
        })
    }

    pub fn matches(&self, key: &str, mods: KeyMods) -> bool {
        if !self.key.eq_ignore_ascii_case(key) {
            return false;
        }
        self.any_mods || mods == self.mods
    }
}

/// Commands a shortcut can trigger on the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    ToggleFormat(Format),
    Undo,
    Redo,
}

/// Ordered shortcut → command table; first match wins.
#[derive(Debug, Default)]
pub struct ShortcutRegistry {
    entries: Vec<(Shortcut, EditorCommand)>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard editing bindings.
    pub fn with_defaults(platform: Platform) -> Self {
        let mut reg = Self::new();
        let defaults: &[(&str, EditorCommand)] = &[
            ("cmd+b", EditorCommand::ToggleFormat(Format::BOLD)),
            ("cmd+i", EditorCommand::ToggleFormat(Format::ITALIC)),
            ("cmd+u", EditorCommand::ToggleFormat(Format::UNDERLINE)),
            ("cmd+shift+x", EditorCommand::ToggleFormat(Format::STRIKE)),
            ("cmd+shift+m", EditorCommand::ToggleFormat(Format::MONOSPACE)),
            ("cmd+z", EditorCommand::Undo),
            ("cmd+shift+z", EditorCommand::Redo),
            ("ctrl+y", EditorCommand::Redo),
        ];
        for (spec, cmd) in defaults {
            reg.register(spec, *cmd, platform)
                .expect("default bindings parse");
        }
        reg
    }

    pub fn register(
        &mut self,
        spec: &str,
        command: EditorCommand,
        platform: Platform,
    ) -> Result<(), ShortcutParseError> {
        let shortcut = Shortcut::parse(spec, platform)?;
        self.entries.push((shortcut, command));
        Ok(())
    }

    pub fn resolve(&self, key: &str, mods: KeyMods) -> Option<EditorCommand> {
        self.entries
            .iter()
            .find(|(s, _)| s.matches(key, mods))
            .map(|(_, c)| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mod_combinations() {
        let s = Shortcut::parse("Cmd+Shift+Z", Platform::Other).unwrap();
        assert!(s.matches("z", KeyMods::CTRL | KeyMods::SHIFT));
        assert!(!s.matches("z", KeyMods::CTRL));
        assert!(!s.matches("x", KeyMods::CTRL | KeyMods::SHIFT));
    }

    #[test]
    fn cmd_is_platform_dependent() {
        let apple = Shortcut::parse("cmd+b", Platform::Apple).unwrap();
        assert!(apple.matches("b", KeyMods::META));
        assert!(!apple.matches("b", KeyMods::CTRL));
        let other = Shortcut::parse("cmd+b", Platform::Other).unwrap();
        assert!(other.matches("b", KeyMods::CTRL));
    }

    #[test]
    fn any_matches_all_modifiers() {
        let s = Shortcut::parse("any+enter", Platform::Other).unwrap();
        assert!(s.matches("enter", KeyMods::empty()));
        assert!(s.matches("enter", KeyMods::META | KeyMods::SHIFT));
    }

    #[test]
    fn plus_key_and_errors() {
        let s = Shortcut::parse("ctrl++", Platform::Other).unwrap();
        assert!(s.matches("+", KeyMods::CTRL));
        assert_eq!(
            Shortcut::parse("boom+z", Platform::Other),
            Err(ShortcutParseError::UnknownModifier("boom".into()))
        );
        assert!(Shortcut::parse("", Platform::Other).is_err());
    }

    #[test]
    fn registry_resolves_defaults() {
        let reg = ShortcutRegistry::with_defaults(Platform::Other);
        assert_eq!(
            reg.resolve("b", KeyMods::CTRL),
            Some(EditorCommand::ToggleFormat(Format::BOLD))
        );
        assert_eq!(
            reg.resolve("z", KeyMods::CTRL | KeyMods::SHIFT),
            Some(EditorCommand::Redo)
        );
        assert_eq!(reg.resolve("q", KeyMods::CTRL), None);
    }
}
