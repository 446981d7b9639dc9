use std::fmt;
use std::time::Instant;

use keyseq::KeySequence;

use crate::action::Action;

/// Progress towards selecting a register.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RegisterStage {
    /// The register key was typed, and the next character names the register.
    Awaiting,
    /// A register has been selected.
    Selected(char),
}

/// An operator waiting for a motion or text object.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StagedOperator {
    /// The keys that were typed for the operator.
    pub keys: KeySequence,
    /// The operator's action, with the count and register typed before it.
    pub action: Action,
}

/// Everything typed towards the next command.
#[derive(Debug, Default)]
pub(crate) struct PendingState {
    pub keys: KeySequence,
    pub count: Option<usize>,
    pub register: Option<RegisterStage>,
    pub operator: Option<StagedOperator>,
    pub deadline: Option<Instant>,

    /// The registry generation that `keys` was typed against.
    pub generation: u64,
}

impl PendingState {
    /// Forget everything typed so far.
    pub fn reset(&mut self) {
        self.keys.clear();
        self.count = None;
        self.register = None;
        self.operator = None;
        self.deadline = None;
    }

    /// Add a digit to the staged count.
    pub fn push_digit(&mut self, digit: u32) {
        let count = self.count.unwrap_or(0);
        let count = count.saturating_mul(10).saturating_add(digit as usize);

        self.count = Some(count);
    }

    /// The register that has been selected, if any.
    pub fn selected_register(&self) -> Option<char> {
        match self.register {
            Some(RegisterStage::Selected(c)) => Some(c),
            _ => None,
        }
    }

    pub fn status(&self) -> PendingStatus {
        PendingStatus {
            keys: self.keys.clone(),
            count: self.count,
            register: self.selected_register(),
            awaiting_register: self.register == Some(RegisterStage::Awaiting),
            operator: self.operator.as_ref().map(|op| op.action.name.clone()),
            operator_keys: self.operator.as_ref().map(|op| op.keys.clone()).unwrap_or_default(),
        }
    }
}

/// A snapshot of what has been typed towards the next command, for status line display.
///
/// The [Display](fmt::Display) implementation renders it the way Vim's `showcmd` does, like
/// `2"ad` or `g`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PendingStatus {
    /// Keys typed towards a binding.
    pub keys: KeySequence,
    /// The staged count.
    pub count: Option<usize>,
    /// The staged register.
    pub register: Option<char>,
    /// Whether the register key was typed and the register's name is still expected.
    pub awaiting_register: bool,
    /// The name of the operator waiting for a motion.
    pub operator: Option<String>,
    /// The keys that were typed for the operator.
    pub operator_keys: KeySequence,
}

impl PendingStatus {
    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() &&
            self.count.is_none() &&
            self.register.is_none() &&
            !self.awaiting_register &&
            self.operator.is_none()
    }
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(count) = self.count {
            write!(f, "{count}")?;
        }

        if let Some(reg) = self.register {
            write!(f, "\"{reg}")?;
        } else if self.awaiting_register {
            write!(f, "\"")?;
        }

        write!(f, "{}{}", self.operator_keys, self.keys)
    }
}
