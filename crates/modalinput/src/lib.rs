//! # modalinput
//!
//! ## Overview
//!
//! This crate resolves keyboard input for modal applications, such as the Vim text editor, into
//! named [actions](action::Action).
//!
//! The pieces fit together like this:
//!
//! - [registry::Registry] holds [keymaps](registry::Keymap), which bind [key
//!   sequences](keyseq::KeySequence) to actions, optionally restricted to a mode, a file type or
//!   a guard condition.
//! - [mode::ModeManager] owns the [modes](mode::Mode), tracks which one is current, and asks it
//!   what to do with keys that no binding matches.
//! - [handler::InputHandler] feeds keys through both of them, keeping track of counts, registers,
//!   operators and partially typed sequences, and sends the resulting actions through a bounded
//!   queue.
//!
//! ## Example
//!
//! ```
//! use modalinput::handler::{HandlerConfig, InputHandler};
//! use modalinput::registry::Keymap;
//!
//! let handler = InputHandler::vim(HandlerConfig::default()).unwrap();
//! let actions = handler.actions();
//!
//! let keymap = Keymap::new("files").mode("normal").bind("<C-p>", "picker.files");
//! handler.registry().register(keymap).unwrap();
//!
//! handler.feed(&"<C-p>".parse().unwrap());
//! assert_eq!(actions.try_recv().unwrap().name, "picker.files");
//!
//! handler.feed(&"i".parse().unwrap());
//! assert_eq!(handler.modes().current().as_deref(), Some("insert"));
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

#[macro_use]
mod util;

pub mod action;
pub mod context;
pub mod errors;
pub mod handler;
pub mod hooks;
pub mod mode;
pub mod registry;

pub use keyseq;

pub use self::action::{Action, ActionArgs, ActionSource};
pub use self::handler::{HandlerConfig, HandlerStats, InputHandler};
pub use self::mode::{Mode, ModeManager};
pub use self::registry::{Binding, Keymap, Registry};
