use keyseq::{KeyEvent, NamedKey};

use super::{CursorStyle, Fallback, Mode, ModeRequest};
use crate::action::names::{COMMAND_BACKSPACE, COMMAND_SUBMIT};
use crate::action::Action;
use crate::context::ModeContext;

/// Vim's input modes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum VimMode {
    /// Normal mode keypresses.
    #[default]
    Normal,

    /// Insert mode keypresses.
    Insert,

    /// Characterwise Visual mode keypresses.
    Visual,

    /// Linewise Visual mode keypresses.
    VisualLine,

    /// Blockwise Visual mode keypresses.
    VisualBlock,

    /// Command line keypresses.
    Command,

    /// Keypresses following an operator (e.g. "d" or "y").
    OperatorPending,

    /// Replace mode keypresses.
    Replace,
}

impl VimMode {
    /// Every Vim mode.
    pub const ALL: [VimMode; 8] = [
        VimMode::Normal,
        VimMode::Insert,
        VimMode::Visual,
        VimMode::VisualLine,
        VimMode::VisualBlock,
        VimMode::Command,
        VimMode::OperatorPending,
        VimMode::Replace,
    ];

    /// Find a mode by its name.
    pub fn from_name(name: &str) -> Option<Self> {
        VimMode::ALL.into_iter().find(|m| m.name() == name)
    }
}

fn to_normal() -> ModeRequest {
    ModeRequest::Switch(VimMode::Normal.name().to_string())
}

/// Characters typed as text, including Enter and Tab.
fn typed_text(key: &KeyEvent) -> Option<String> {
    if let Some(c) = key.get_char() {
        return Some(c.to_string());
    }

    if key.is(NamedKey::Enter) {
        return Some("\n".into());
    }

    if key.is(NamedKey::Tab) {
        return Some("\t".into());
    }

    return None;
}

impl Mode for VimMode {
    fn name(&self) -> &str {
        match self {
            VimMode::Normal => "normal",
            VimMode::Insert => "insert",
            VimMode::Visual => "visual",
            VimMode::VisualLine => "visual_line",
            VimMode::VisualBlock => "visual_block",
            VimMode::Command => "command",
            VimMode::OperatorPending => "operator_pending",
            VimMode::Replace => "replace",
        }
    }

    fn display_name(&self) -> Option<String> {
        let msg = match self {
            VimMode::Insert => "-- INSERT --",
            VimMode::Visual => "-- VISUAL --",
            VimMode::VisualLine => "-- VISUAL LINE --",
            VimMode::VisualBlock => "-- VISUAL BLOCK --",
            VimMode::Replace => "-- REPLACE --",
            VimMode::Normal => return None,
            VimMode::Command => return None,
            VimMode::OperatorPending => return None,
        };

        Some(msg.to_string())
    }

    fn cursor_style(&self) -> CursorStyle {
        match self {
            VimMode::Insert | VimMode::Command => CursorStyle::Bar,
            VimMode::Replace | VimMode::OperatorPending => CursorStyle::Underline,
            VimMode::Normal => CursorStyle::Block,
            VimMode::Visual | VimMode::VisualLine | VimMode::VisualBlock => CursorStyle::Block,
        }
    }

    fn accepts_count(&self) -> bool {
        match self {
            VimMode::Normal => true,
            VimMode::Visual | VimMode::VisualLine | VimMode::VisualBlock => true,
            VimMode::OperatorPending => true,
            VimMode::Insert | VimMode::Command | VimMode::Replace => false,
        }
    }

    fn handle_unmapped(&self, key: &KeyEvent, _: &ModeContext) -> Fallback {
        match self {
            VimMode::Normal => {
                return Fallback::refuse();
            },
            VimMode::Insert | VimMode::Replace => {
                if key.is(NamedKey::Esc) {
                    return Fallback::consume().with_request(to_normal());
                }

                match typed_text(key) {
                    Some(text) => Fallback::text(text),
                    None => Fallback::refuse(),
                }
            },
            VimMode::Visual | VimMode::VisualLine | VimMode::VisualBlock => {
                if key.is(NamedKey::Esc) {
                    return Fallback::consume().with_request(to_normal());
                }

                return Fallback::refuse();
            },
            VimMode::Command => {
                if key.is(NamedKey::Esc) {
                    return Fallback::consume().with_request(to_normal());
                }

                if key.is(NamedKey::Enter) {
                    return Fallback::action(Action::new(COMMAND_SUBMIT)).with_request(to_normal());
                }

                if key.is(NamedKey::Backspace) {
                    return Fallback::action(Action::new(COMMAND_BACKSPACE));
                }

                match key.get_char() {
                    Some(c) => Fallback::text(c),
                    None => Fallback::refuse(),
                }
            },
            VimMode::OperatorPending => {
                // Anything that isn't a motion cancels the operator.
                return Fallback::consume().with_request(ModeRequest::Pop);
            },
        }
    }
}
