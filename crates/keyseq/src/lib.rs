//! # keyseq
//!
//! ## Overview
//!
//! This crate provides the value types used to describe keyboard input for modal applications:
//! a single [KeyEvent] and an ordered [KeySequence] of them.
//!
//! Keys can be written down in three notations, which can all be parsed:
//!
//! * A bare character or key name, like `a`, `G` or `Enter`
//! * Modifiers joined with `+`, like `Ctrl+s` or `Ctrl+Shift+Tab`
//! * Vim-style bracket notation, like `<C-s>`, `<CR>` or `<S-Tab>`
//!
//! Every [KeyEvent] has two canonical renderings, the bracket notation produced by its
//! [Display](std::fmt::Display) implementation and the human-readable notation produced by
//! [KeyEvent::to_human]. Both parse back into an equal event.
//!
//! ## Example
//!
//! ```
//! use keyseq::{KeyEvent, KeySequence};
//!
//! let save: KeyEvent = "Ctrl+s".parse().unwrap();
//! assert_eq!(save.to_string(), "<C-s>");
//! assert_eq!("<C-s>".parse::<KeyEvent>().unwrap(), save);
//!
//! let spaced: KeySequence = "g g".parse().unwrap();
//! let contiguous: KeySequence = "gg".parse().unwrap();
//! assert_eq!(spaced, contiguous);
//! assert!(spaced.has_prefix(&"g".parse().unwrap()));
//! ```

// Require docs for public APIs, and disable the more annoying clippy lints.
#![deny(missing_docs)]
#![allow(clippy::bool_to_int_with_if)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::needless_return)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod key;
mod parse;
pub mod sequence;

pub use self::key::{Key, KeyEvent, Modifiers, NamedKey};
pub use self::parse::{parse_key, parse_sequence};
pub use self::sequence::KeySequence;

/// Errors returned when parsing a key or a sequence of keys.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum KeyError {
    /// Empty key specification.
    #[error("Empty key specification")]
    EmptySpec,

    /// Failure to interpret a key specification.
    #[error("Invalid key specification: {0:?}")]
    InvalidSpec(String),
}
