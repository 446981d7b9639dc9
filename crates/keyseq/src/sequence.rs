//! # Key sequences
//!
//! A [KeySequence] is an ordered list of [KeyEvent] values, like the `g g` in Vim's "go to
//! first line" command. Sequences compare structurally: two sequences are equal only when they
//! contain equal events in the same order, no matter how they were written down.
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::str::FromStr;

use crate::key::KeyEvent;
use crate::parse::parse_sequence;
use crate::KeyError;

/// An ordered, possibly empty, series of key presses.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct KeySequence(Vec<KeyEvent>);

impl KeySequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        KeySequence(Vec::new())
    }

    /// Number of key presses in this sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this sequence contains no key presses.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The key presses in this sequence.
    pub fn events(&self) -> &[KeyEvent] {
        &self.0
    }

    /// Iterate over the key presses in this sequence.
    pub fn iter(&self) -> std::slice::Iter<'_, KeyEvent> {
        self.0.iter()
    }

    /// Whether this sequence begins with `prefix`.
    ///
    /// Every sequence begins with the empty sequence, and with itself.
    pub fn has_prefix(&self, prefix: &KeySequence) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Copy out the key presses within `range`. Bounds past the end of the sequence are clamped.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> KeySequence {
        let len = self.0.len();

        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.saturating_add(1),
            Bound::Unbounded => 0,
        };

        let end = match range.end_bound() {
            Bound::Included(&n) => n.saturating_add(1),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => len,
        };

        let end = end.min(len);
        let start = start.min(end);

        KeySequence(self.0[start..end].to_vec())
    }

    /// The first key press, if there is one.
    pub fn head(&self) -> Option<&KeyEvent> {
        self.0.first()
    }

    /// Everything after the first key press.
    pub fn tail(&self) -> KeySequence {
        self.slice(1..)
    }

    /// The most recent key press, if there is one.
    pub fn last(&self) -> Option<&KeyEvent> {
        self.0.last()
    }

    /// Return a new sequence with `key` added to the end.
    pub fn append(&self, key: KeyEvent) -> KeySequence {
        let mut events = self.0.clone();
        events.push(key);

        KeySequence(events)
    }

    /// Return a new sequence with the key presses of `other` added to the end.
    pub fn concat(&self, other: &KeySequence) -> KeySequence {
        let mut events = self.0.clone();
        events.extend_from_slice(&other.0);

        KeySequence(events)
    }

    /// Add a key press to the end of this sequence.
    pub fn push(&mut self, key: KeyEvent) {
        self.0.push(key);
    }

    /// Remove all key presses.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Reduce this sequence to the text it types, if every key press is a literal character
    /// without modifiers.
    pub fn to_text(&self) -> Option<String> {
        self.0.iter().map(KeyEvent::get_char).collect()
    }

    /// The canonical bracket rendering of each key press.
    pub fn tokens(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Render this sequence for people, with key presses separated by spaces (`Ctrl+w j`).
    pub fn to_human(&self) -> String {
        self.0.iter().map(KeyEvent::to_human).collect::<Vec<_>>().join(" ")
    }
}

/// Renders the sequence as a contiguous run of bracket notation (`<C-w>j`).
impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ev in self.0.iter() {
            write!(f, "{ev}")?;
        }

        Ok(())
    }
}

impl FromStr for KeySequence {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_sequence(s)
    }
}

impl From<Vec<KeyEvent>> for KeySequence {
    fn from(events: Vec<KeyEvent>) -> Self {
        KeySequence(events)
    }
}

impl From<KeyEvent> for KeySequence {
    fn from(event: KeyEvent) -> Self {
        KeySequence(vec![event])
    }
}

impl FromIterator<KeyEvent> for KeySequence {
    fn from_iter<I: IntoIterator<Item = KeyEvent>>(iter: I) -> Self {
        KeySequence(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a KeySequence {
    type Item = &'a KeyEvent;
    type IntoIter = std::slice::Iter<'a, KeyEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl serde::Serialize for KeySequence {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for KeySequence {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        s.parse().map_err(serde::de::Error::custom)
    }
}
