//! # Key presses
//!
//! ## Overview
//!
//! This module contains [KeyEvent], the value type for a single key press, along with the
//! [Key] identities and [Modifiers] that make it up.
//!
//! Character events are normalized when they are created, so that case and the Shift modifier
//! always agree with each other. This keeps hashing and comparisons stable no matter where the
//! event came from (a configuration file, a terminal, or a test).
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time::Instant;

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyModifiers};

use crate::parse::parse_key;
use crate::KeyError;

bitflags! {
    /// Modifier keys held down while a key was pressed.
    #[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
    pub struct Modifiers: u8 {
        /// The Shift key.
        const SHIFT = 0b0001;
        /// The Control key.
        const CTRL = 0b0010;
        /// The Alt (or Option) key.
        const ALT = 0b0100;
        /// The Meta (Command, Super) key.
        const META = 0b1000;
    }
}

/// Special keys that don't produce a printable character.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum NamedKey {
    /// The Escape key.
    Esc,
    /// The Enter (Return) key.
    Enter,
    /// The Tab key.
    Tab,
    /// The Backspace key.
    Backspace,
    /// The Delete key.
    Delete,
    /// The Insert key.
    Insert,
    /// The Home key.
    Home,
    /// The End key.
    End,
    /// The Page Up key.
    PageUp,
    /// The Page Down key.
    PageDown,
    /// The up arrow key.
    Up,
    /// The down arrow key.
    Down,
    /// The left arrow key.
    Left,
    /// The right arrow key.
    Right,
    /// A function key, from F1 to F24.
    F(u8),
}

impl NamedKey {
    /// The name used when rendering this key in bracket notation (e.g., `<CR>`).
    pub fn vim_name(&self) -> Cow<'static, str> {
        let name = match self {
            NamedKey::Esc => "Esc",
            NamedKey::Enter => "CR",
            NamedKey::Tab => "Tab",
            NamedKey::Backspace => "BS",
            NamedKey::Delete => "Del",
            NamedKey::Insert => "Insert",
            NamedKey::Home => "Home",
            NamedKey::End => "End",
            NamedKey::PageUp => "PageUp",
            NamedKey::PageDown => "PageDown",
            NamedKey::Up => "Up",
            NamedKey::Down => "Down",
            NamedKey::Left => "Left",
            NamedKey::Right => "Right",
            NamedKey::F(n) => return Cow::Owned(format!("F{n}")),
        };

        Cow::Borrowed(name)
    }

    /// The name used when rendering this key for people (e.g., `Enter`).
    pub fn human_name(&self) -> Cow<'static, str> {
        let name = match self {
            NamedKey::Esc => "Escape",
            NamedKey::Enter => "Enter",
            NamedKey::Backspace => "Backspace",
            NamedKey::Delete => "Delete",
            _ => return self.vim_name(),
        };

        Cow::Borrowed(name)
    }
}

/// The identity of a pressed key.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Key {
    /// A key that produces a literal character.
    Char(char),
    /// A special key.
    Named(NamedKey),
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Key::Char(c)
    }
}

impl From<NamedKey> for Key {
    fn from(k: NamedKey) -> Self {
        Key::Named(k)
    }
}

/// Look up a key by one of its names, ignoring case.
///
/// This covers both special keys and the Vim names for awkward characters, like `Space` and
/// `lt`.
pub(crate) fn key_from_name(name: &str) -> Option<Key> {
    let mut chars = name.chars();

    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(Key::Char(c));
    }

    let lower = name.to_ascii_lowercase();

    let key = match lower.as_str() {
        "esc" | "escape" => NamedKey::Esc.into(),
        "cr" | "enter" | "return" => NamedKey::Enter.into(),
        "tab" => NamedKey::Tab.into(),
        "bs" | "backspace" => NamedKey::Backspace.into(),
        "del" | "delete" => NamedKey::Delete.into(),
        "ins" | "insert" => NamedKey::Insert.into(),
        "home" => NamedKey::Home.into(),
        "end" => NamedKey::End.into(),
        "pageup" | "pgup" => NamedKey::PageUp.into(),
        "pagedown" | "pgdn" => NamedKey::PageDown.into(),
        "up" => NamedKey::Up.into(),
        "down" => NamedKey::Down.into(),
        "left" => NamedKey::Left.into(),
        "right" => NamedKey::Right.into(),
        "space" => Key::Char(' '),
        "lt" => Key::Char('<'),
        "bar" => Key::Char('|'),
        "bslash" => Key::Char('\\'),
        fkey => {
            let n = fkey.strip_prefix('f')?.parse::<u8>().ok()?;

            if n == 0 || n > 24 {
                return None;
            }

            NamedKey::F(n).into()
        },
    };

    Some(key)
}

/// A single key press.
///
/// The timestamp is carried along for consumers that care about timing, but it is not part of
/// the key's identity: two events for the same key and modifiers are equal no matter when they
/// happened.
#[derive(Clone, Copy, Debug)]
pub struct KeyEvent {
    key: Key,
    modifiers: Modifiers,
    time: Option<Instant>,
}

impl KeyEvent {
    /// Create a new key event, normalizing the Shift modifier for characters.
    pub fn new(key: Key, mut modifiers: Modifiers) -> Self {
        let key = match key {
            Key::Char(mut c) => {
                if c.is_alphabetic() {
                    if modifiers.contains(Modifiers::SHIFT) && c.is_lowercase() {
                        let mut upper = c.to_uppercase();

                        if let (Some(u), None) = (upper.next(), upper.next()) {
                            c = u;
                        }
                    }

                    modifiers.set(Modifiers::SHIFT, c.is_uppercase());
                } else {
                    // Shift is already reflected in the character itself.
                    modifiers -= Modifiers::SHIFT;
                }

                Key::Char(c)
            },
            named @ Key::Named(_) => named,
        };

        KeyEvent { key, modifiers, time: None }
    }

    /// Create an event for an unmodified character.
    pub fn char(c: char) -> Self {
        KeyEvent::new(Key::Char(c), Modifiers::empty())
    }

    /// Create an event for a character typed while holding Control.
    pub fn ctrl(c: char) -> Self {
        KeyEvent::new(Key::Char(c), Modifiers::CTRL)
    }

    /// Create an event for an unmodified special key.
    pub fn named(key: NamedKey) -> Self {
        KeyEvent::new(Key::Named(key), Modifiers::empty())
    }

    /// Attach a timestamp to this event.
    pub fn at(mut self, time: Instant) -> Self {
        self.time = Some(time);
        self
    }

    /// The key that was pressed.
    pub fn key(&self) -> Key {
        self.key
    }

    /// The modifiers held while the key was pressed.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// When the key was pressed, if known.
    pub fn time(&self) -> Option<Instant> {
        self.time
    }

    /// Return the literal character this event types, if it is a character pressed without any
    /// modifiers other than Shift.
    pub fn get_char(&self) -> Option<char> {
        match self.key {
            Key::Char(c) if (self.modifiers - Modifiers::SHIFT).is_empty() => Some(c),
            _ => None,
        }
    }

    /// Return the value of an unmodified decimal digit.
    pub fn digit(&self) -> Option<u32> {
        self.get_char().and_then(|c| c.to_digit(10))
    }

    /// Whether this is the given special key, pressed without modifiers.
    pub fn is(&self, key: NamedKey) -> bool {
        self.key == Key::Named(key) && self.modifiers.is_empty()
    }

    /// Render this event using the human-readable notation, like `Ctrl+s` or `Shift+Tab`.
    pub fn to_human(&self) -> String {
        let mut res = String::new();

        if self.modifiers.contains(Modifiers::CTRL) {
            res.push_str("Ctrl+");
        }

        if self.modifiers.contains(Modifiers::SHIFT) && matches!(self.key, Key::Named(_)) {
            res.push_str("Shift+");
        }

        if self.modifiers.contains(Modifiers::ALT) {
            res.push_str("Alt+");
        }

        if self.modifiers.contains(Modifiers::META) {
            res.push_str("Meta+");
        }

        match self.key {
            Key::Char(' ') => res.push_str("Space"),
            Key::Char(c) => res.push(c),
            Key::Named(k) => res.push_str(&k.human_name()),
        }

        return res;
    }
}

impl PartialEq for KeyEvent {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.modifiers == other.modifiers
    }
}

impl Eq for KeyEvent {}

impl Hash for KeyEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.modifiers.hash(state);
    }
}

/// Renders the event in bracket notation, like `<C-s>`, `<CR>` or `a`.
impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mods = match self.key {
            Key::Char(_) => self.modifiers - Modifiers::SHIFT,
            Key::Named(_) => self.modifiers,
        };

        let name: Cow<'_, str> = match self.key {
            Key::Char(' ') => Cow::Borrowed("Space"),
            Key::Char('<') => Cow::Borrowed("lt"),
            Key::Char(c) if mods.is_empty() => return write!(f, "{c}"),
            Key::Char(c) => Cow::Owned(c.to_string()),
            Key::Named(k) => k.vim_name(),
        };

        f.write_str("<")?;

        if mods.contains(Modifiers::CTRL) {
            f.write_str("C-")?;
        }

        if mods.contains(Modifiers::SHIFT) {
            f.write_str("S-")?;
        }

        if mods.contains(Modifiers::ALT) {
            f.write_str("A-")?;
        }

        if mods.contains(Modifiers::META) {
            f.write_str("M-")?;
        }

        write!(f, "{name}>")
    }
}

impl FromStr for KeyEvent {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key(s)
    }
}

impl From<char> for KeyEvent {
    fn from(c: char) -> Self {
        KeyEvent::char(c)
    }
}

impl From<NamedKey> for KeyEvent {
    fn from(k: NamedKey) -> Self {
        KeyEvent::named(k)
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(km: KeyModifiers) -> Self {
        let mut mods = Modifiers::empty();

        mods.set(Modifiers::SHIFT, km.contains(KeyModifiers::SHIFT));
        mods.set(Modifiers::CTRL, km.contains(KeyModifiers::CONTROL));
        mods.set(Modifiers::ALT, km.contains(KeyModifiers::ALT));
        mods.set(Modifiers::META, km.intersects(KeyModifiers::SUPER | KeyModifiers::META));

        mods
    }
}

impl TryFrom<KeyCode> for KeyEvent {
    type Error = KeyError;

    fn try_from(code: KeyCode) -> Result<Self, KeyError> {
        KeyEvent::try_from(crossterm::event::KeyEvent::new(code, KeyModifiers::NONE))
    }
}

impl TryFrom<crossterm::event::KeyEvent> for KeyEvent {
    type Error = KeyError;

    fn try_from(ke: crossterm::event::KeyEvent) -> Result<Self, KeyError> {
        let mut mods = Modifiers::from(ke.modifiers);

        let key = match ke.code {
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Esc => NamedKey::Esc.into(),
            KeyCode::Enter => NamedKey::Enter.into(),
            KeyCode::Tab => NamedKey::Tab.into(),
            KeyCode::BackTab => {
                mods |= Modifiers::SHIFT;
                NamedKey::Tab.into()
            },
            KeyCode::Backspace => NamedKey::Backspace.into(),
            KeyCode::Delete => NamedKey::Delete.into(),
            KeyCode::Insert => NamedKey::Insert.into(),
            KeyCode::Home => NamedKey::Home.into(),
            KeyCode::End => NamedKey::End.into(),
            KeyCode::PageUp => NamedKey::PageUp.into(),
            KeyCode::PageDown => NamedKey::PageDown.into(),
            KeyCode::Up => NamedKey::Up.into(),
            KeyCode::Down => NamedKey::Down.into(),
            KeyCode::Left => NamedKey::Left.into(),
            KeyCode::Right => NamedKey::Right.into(),
            KeyCode::F(n) if (1..=24).contains(&n) => NamedKey::F(n).into(),
            code => return Err(KeyError::InvalidSpec(format!("{code:?}"))),
        };

        Ok(KeyEvent::new(key, mods))
    }
}

impl serde::Serialize for KeyEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for KeyEvent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_normalization() {
        let upper = KeyEvent::char('A');
        assert_eq!(upper.modifiers(), Modifiers::SHIFT);
        assert_eq!(upper.key(), Key::Char('A'));

        let shifted = KeyEvent::new(Key::Char('a'), Modifiers::SHIFT);
        assert_eq!(shifted, upper);

        let lower = KeyEvent::new(Key::Char('a'), Modifiers::empty());
        assert_eq!(lower.modifiers(), Modifiers::empty());

        // Shift doesn't stick to characters without case.
        let colon = KeyEvent::new(Key::Char(':'), Modifiers::SHIFT);
        assert_eq!(colon, KeyEvent::char(':'));

        // Named keys keep Shift.
        let backtab = KeyEvent::new(Key::Named(NamedKey::Tab), Modifiers::SHIFT);
        assert_eq!(backtab.modifiers(), Modifiers::SHIFT);
    }

    #[test]
    fn test_equality_ignores_time() {
        let a = KeyEvent::char('g').at(Instant::now());
        let b = KeyEvent::char('g');

        assert_eq!(a, b);
        assert!(a.time().is_some());
        assert!(b.time().is_none());
    }

    #[test]
    fn test_get_char() {
        assert_eq!(KeyEvent::char('x').get_char(), Some('x'));
        assert_eq!(KeyEvent::char('X').get_char(), Some('X'));
        assert_eq!(KeyEvent::ctrl('x').get_char(), None);
        assert_eq!(KeyEvent::named(NamedKey::Enter).get_char(), None);
        assert_eq!(KeyEvent::char('7').digit(), Some(7));
        assert_eq!(KeyEvent::char('x').digit(), None);
    }

    #[test]
    fn test_render_bracket() {
        assert_eq!(KeyEvent::char('a').to_string(), "a");
        assert_eq!(KeyEvent::char('A').to_string(), "A");
        assert_eq!(KeyEvent::char(' ').to_string(), "<Space>");
        assert_eq!(KeyEvent::char('<').to_string(), "<lt>");
        assert_eq!(KeyEvent::ctrl('s').to_string(), "<C-s>");
        assert_eq!(KeyEvent::ctrl('S').to_string(), "<C-S>");
        assert_eq!(KeyEvent::named(NamedKey::Enter).to_string(), "<CR>");
        assert_eq!(KeyEvent::named(NamedKey::F(5)).to_string(), "<F5>");

        let mods = Modifiers::SHIFT | Modifiers::CTRL;
        let ev = KeyEvent::new(Key::Named(NamedKey::Tab), mods);
        assert_eq!(ev.to_string(), "<C-S-Tab>");

        let ev = KeyEvent::new(Key::Char('x'), Modifiers::ALT | Modifiers::META);
        assert_eq!(ev.to_string(), "<A-M-x>");
    }

    #[test]
    fn test_render_human() {
        assert_eq!(KeyEvent::char('a').to_human(), "a");
        assert_eq!(KeyEvent::char(' ').to_human(), "Space");
        assert_eq!(KeyEvent::ctrl('s').to_human(), "Ctrl+s");
        assert_eq!(KeyEvent::ctrl('+').to_human(), "Ctrl++");
        assert_eq!(KeyEvent::named(NamedKey::Esc).to_human(), "Escape");

        let ev = KeyEvent::new(Key::Named(NamedKey::Tab), Modifiers::SHIFT);
        assert_eq!(ev.to_human(), "Shift+Tab");
    }

    #[test]
    fn test_crossterm_conversion() {
        let ke = crossterm::event::KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(KeyEvent::try_from(ke).unwrap(), KeyEvent::ctrl('s'));

        let ke = crossterm::event::KeyEvent::new(KeyCode::Char(':'), KeyModifiers::SHIFT);
        assert_eq!(KeyEvent::try_from(ke).unwrap(), KeyEvent::char(':'));

        let backtab = KeyEvent::try_from(KeyCode::BackTab).unwrap();
        assert_eq!(backtab.to_string(), "<S-Tab>");

        assert!(KeyEvent::try_from(KeyCode::CapsLock).is_err());
        assert!(KeyEvent::try_from(KeyCode::F(30)).is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(key_from_name("ESC"), Some(Key::Named(NamedKey::Esc)));
        assert_eq!(key_from_name("Return"), Some(Key::Named(NamedKey::Enter)));
        assert_eq!(key_from_name("f12"), Some(Key::Named(NamedKey::F(12))));
        assert_eq!(key_from_name("Bar"), Some(Key::Char('|')));
        assert_eq!(key_from_name("F0"), None);
        assert_eq!(key_from_name("F25"), None);
        assert_eq!(key_from_name("Hyper"), None);
    }
}
