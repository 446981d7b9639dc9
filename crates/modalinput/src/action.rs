//! # Actions
//!
//! ## Overview
//!
//! An [Action] is what the input handler produces once a key sequence has been resolved. The
//! handler never interprets most actions itself: it only names them, attaches the count,
//! register and arguments gathered while the keys were typed, and hands them to whoever is
//! consuming the action queue.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Names of the actions that this crate produces or handles itself.
pub mod names {
    /// Insert literal text at the cursor. The text is in [ActionArgs::text](super::ActionArgs).
    pub const INSERT_TEXT: &str = "insert_text";

    /// Switch to the mode named by the `mode` argument.
    pub const MODE_SWITCH: &str = "mode.switch";

    /// Suspend the current mode and enter the mode named by the `mode` argument.
    pub const MODE_PUSH: &str = "mode.push";

    /// Return to the most recently suspended mode.
    pub const MODE_POP: &str = "mode.pop";

    /// Submit the contents of the command line.
    pub const COMMAND_SUBMIT: &str = "command_line.submit";

    /// Delete the character before the command line cursor.
    pub const COMMAND_BACKSPACE: &str = "command_line.backspace";
}

/// Where an action came from.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionSource {
    /// Typed on the keyboard.
    #[default]
    Keyboard,
    /// Produced by a mouse event.
    Mouse,
    /// Selected from a command palette.
    Palette,
    /// Replayed from a macro.
    Macro,
    /// Generated by a plugin.
    Plugin,
    /// Requested through a programmatic interface.
    Api,
}

/// Arguments attached to an [Action].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionArgs {
    /// The motion an operator applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<String>,

    /// The text object an operator applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_object: Option<String>,

    /// The register selected for this action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<char>,

    /// Literal text to insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Any other arguments.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ActionArgs {
    /// Build arguments from the fixed arguments of a binding.
    ///
    /// The well-known keys `motion`, `textObject`, `register` and `text` are moved into their
    /// own fields when they hold strings. Everything else ends up in [ActionArgs::extra].
    pub fn from_fixed(fixed: &Map<String, Value>) -> Self {
        let mut args = ActionArgs::default();

        for (k, v) in fixed.iter() {
            match (k.as_str(), v) {
                ("motion", Value::String(s)) => args.motion = Some(s.clone()),
                ("textObject", Value::String(s)) => args.text_object = Some(s.clone()),
                ("text", Value::String(s)) => args.text = Some(s.clone()),
                ("register", Value::String(s)) if s.chars().count() == 1 => {
                    args.register = s.chars().next();
                },
                _ => {
                    args.extra.insert(k.clone(), v.clone());
                },
            }
        }

        args
    }

    /// Fetch a string-valued extra argument.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// A resolved editor action, ready to be dispatched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// The action's name, like `cursor.down` or `yank`.
    pub name: String,

    /// What produced this action.
    pub source: ActionSource,

    /// How many times to repeat the action. Always at least 1.
    pub count: usize,

    /// Additional arguments.
    pub args: ActionArgs,
}

impl Action {
    /// Create a keyboard action with a count of 1 and no arguments.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Action {
            name: name.into(),
            source: ActionSource::Keyboard,
            count: 1,
            args: ActionArgs::default(),
        }
    }

    /// Whether this action has the given name.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Set the repeat count. A count of zero is treated as 1.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count.max(1);
        self
    }

    /// Set the source of this action.
    pub fn with_source(mut self, source: ActionSource) -> Self {
        self.source = source;
        self
    }

    /// Set the selected register.
    pub fn with_register(mut self, register: char) -> Self {
        self.args.register = Some(register);
        self
    }

    /// Set the literal text argument.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.args.text = Some(text.into());
        self
    }

    /// Set the motion argument.
    pub fn with_motion<S: Into<String>>(mut self, motion: S) -> Self {
        self.args.motion = Some(motion.into());
        self
    }

    /// Set a free-form argument.
    pub fn with_arg<S: Into<String>, V: Into<Value>>(mut self, key: S, value: V) -> Self {
        self.args.extra.insert(key.into(), value.into());
        self
    }
}
