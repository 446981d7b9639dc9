//! # Keymaps
//!
//! A [Keymap] is a named collection of [Bindings](Binding) that can be restricted to a mode or a
//! file type. Keymaps are plain data: they can be built in code or deserialized from JSON, and
//! are only checked once they are handed to the [Registry](super::Registry).
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a keymap came from.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeymapSource {
    /// Shipped with the editor.
    Default,

    /// Written by the user.
    #[default]
    User,

    /// Contributed by a plugin.
    Plugin,
}

/// A single mapping from a key sequence to an action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    /// The key sequence, in any notation that [keyseq::parse_sequence] accepts.
    pub keys: String,

    /// The name of the action to produce.
    pub action: String,

    /// Fixed arguments for the action.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,

    /// A guard condition that must hold for this binding to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,

    /// A description to show in help and which-key displays.
    #[serde(default)]
    pub description: String,

    /// Priority relative to other bindings in the same keymap.
    #[serde(default)]
    pub priority: i32,

    /// A category for grouping, like `motion` or `operator`.
    ///
    /// Bindings in the `operator` category wait for a motion in operator-pending mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Binding {
    /// Create a new binding.
    pub fn new<K: Into<String>, A: Into<String>>(keys: K, action: A) -> Self {
        Binding { keys: keys.into(), action: action.into(), ..Binding::default() }
    }

    /// Add a fixed argument.
    pub fn arg<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Set the guard condition.
    pub fn when<S: Into<String>>(mut self, when: S) -> Self {
        self.when = Some(when.into());
        self
    }

    /// Set the description.
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Set the priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the category.
    pub fn category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A named collection of bindings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keymap {
    /// The keymap's name. Registering a keymap replaces any other with the same name.
    pub name: String,

    /// The mode these bindings apply in. `None` or an empty string means every mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// The file type these bindings apply to. `None` or an empty string means every file type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,

    /// Priority relative to other keymaps.
    #[serde(default)]
    pub priority: i32,

    /// Where this keymap came from.
    #[serde(default)]
    pub source: KeymapSource,

    /// The bindings in this keymap.
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

impl Keymap {
    /// Create an empty keymap.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Keymap { name: name.into(), ..Keymap::default() }
    }

    /// Restrict this keymap to a mode.
    pub fn mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Restrict this keymap to a file type.
    pub fn file_type<S: Into<String>>(mut self, file_type: S) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    /// Set the priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set where this keymap came from.
    pub fn source(mut self, source: KeymapSource) -> Self {
        self.source = source;
        self
    }

    /// Add a binding.
    pub fn binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Add a binding from keys to an action, without arguments.
    pub fn bind<K: Into<String>, A: Into<String>>(self, keys: K, action: A) -> Self {
        self.binding(Binding::new(keys, action))
    }

    pub(crate) fn mode_scope(&self) -> Option<String> {
        self.mode.clone().filter(|m| !m.is_empty())
    }

    pub(crate) fn file_type_scope(&self) -> Option<String> {
        self.file_type.clone().filter(|ft| !ft.is_empty())
    }
}
