//! # Error Types
//!
//! ## Overview
//!
//! This module contains the error types returned by the components in this crate. All of them
//! describe local, recoverable conditions that are reported to the immediate caller.
//!
//! Hook vetoes are not errors: they are reported through [HookResult](crate::hooks::HookResult).
use keyseq::KeyError;

/// A failure reported by a mode while entering or exiting it.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[error("{0}")]
pub struct TransitionError(pub String);

impl TransitionError {
    /// Create a new error with the given message.
    pub fn new<S: Into<String>>(msg: S) -> Self {
        TransitionError(msg.into())
    }
}

/// Errors returned by the [ModeManager](crate::mode::ModeManager).
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ModeError {
    /// Attempted to enter a mode that hasn't been registered.
    #[error("Unknown mode: {0:?}")]
    UnknownMode(String),

    /// Attempted to register two modes with the same name.
    #[error("Mode already registered: {0:?}")]
    DuplicateMode(String),

    /// Attempted to pop a mode when none have been pushed.
    #[error("No suspended modes to return to")]
    EmptyStack,

    /// Attempted to suspend the current mode before any mode was entered.
    #[error("No mode is currently active")]
    NoCurrentMode,

    /// The current mode refused to exit.
    #[error("Failed to exit mode {mode:?}: {source}")]
    ExitFailed {
        /// The mode that failed to exit.
        mode: String,

        /// The reason given by the mode.
        #[source]
        source: TransitionError,
    },

    /// The target mode refused to be entered.
    #[error("Failed to enter mode {mode:?}: {source}")]
    EnterFailed {
        /// The mode that failed to be entered.
        mode: String,

        /// The reason given by the mode.
        #[source]
        source: TransitionError,
    },
}

/// Errors returned while registering keymaps with the [Registry](crate::registry::Registry).
///
/// A keymap that produces one of these errors is rejected as a whole, leaving the registry
/// unchanged.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum RegistryError {
    /// The keymap has no name.
    #[error("Keymap has no name")]
    UnnamedKeymap,

    /// A binding has an empty key sequence.
    #[error("Binding #{index} in keymap {keymap:?} has no keys")]
    EmptyKeys {
        /// The name of the keymap containing the binding.
        keymap: String,

        /// The position of the binding within the keymap.
        index: usize,
    },

    /// A binding has no action.
    #[error("Binding {keys:?} in keymap {keymap:?} has no action")]
    EmptyAction {
        /// The name of the keymap containing the binding.
        keymap: String,

        /// The keys of the offending binding.
        keys: String,
    },

    /// A binding's key sequence failed to parse.
    #[error("Binding {keys:?} in keymap {keymap:?} has invalid keys: {source}")]
    InvalidKeys {
        /// The name of the keymap containing the binding.
        keymap: String,

        /// The keys of the offending binding.
        keys: String,

        /// The parsing failure.
        #[source]
        source: KeyError,
    },

    /// A binding's guard condition is malformed.
    #[error("Binding {keys:?} in keymap {keymap:?} has an invalid condition {when:?}")]
    InvalidCondition {
        /// The name of the keymap containing the binding.
        keymap: String,

        /// The keys of the offending binding.
        keys: String,

        /// The condition text.
        when: String,
    },
}

/// Errors returned while loading configuration.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// Failure to read a configuration file.
    #[error("Input/Output Error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure to decode a keymap document.
    #[error("Invalid keymap document: {0}")]
    Json(#[from] serde_json::Error),

    /// A keymap in the document was rejected.
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// The idle timeout must be greater than zero.
    #[error("Sequence timeout must be greater than zero")]
    InvalidTimeout,

    /// The action queue needs room for at least one action.
    #[error("Action queue capacity must be greater than zero")]
    ZeroCapacity,

    /// The register selection key must type a character.
    #[error("Register key {0} does not type a character")]
    InvalidRegisterKey(String),
}
