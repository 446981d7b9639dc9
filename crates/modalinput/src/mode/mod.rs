//! # Modes
//!
//! ## Overview
//!
//! A [Mode] decides what happens when it is entered or exited, and what to do with keys that
//! no binding matched. The [ModeManager] owns every registered mode by name, tracks which one is
//! current, and keeps a stack of suspended modes for transient modes like Operator-Pending.
//!
//! ## Transitions
//!
//! Switching modes exits the current mode and then enters the new one:
//!
//! * If the current mode fails to exit, nothing changes.
//! * If the new mode fails to enter, the old mode is entered again and the failure is returned.
//! * The very first mode is entered without exiting anything.
//!
//! Observers registered with [ModeManager::on_change] are called after each successful
//! transition.
//!
//! ## Example
//!
//! ```
//! use modalinput::mode::ModeManager;
//!
//! let modes = ModeManager::vim();
//! assert_eq!(modes.current().as_deref(), Some("normal"));
//!
//! modes.push("operator_pending").unwrap();
//! assert_eq!(modes.stack(), vec!["normal".to_string()]);
//!
//! modes.pop().unwrap();
//! assert_eq!(modes.current().as_deref(), Some("normal"));
//! ```
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use keyseq::KeyEvent;

use crate::action::Action;
use crate::context::ModeContext;
use crate::errors::{ModeError, TransitionError};

mod vim;

pub use self::vim::VimMode;

/// The shape of the cursor to show in a mode.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub enum CursorStyle {
    /// A block covering the character under the cursor.
    #[default]
    Block,
    /// A vertical bar between characters.
    Bar,
    /// A line under the character.
    Underline,
}

/// A mode transition requested by a mode's fallback.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ModeRequest {
    /// Switch to the named mode.
    Switch(String),
    /// Suspend the current mode and enter the named one.
    Push(String),
    /// Return to the most recently suspended mode.
    Pop,
}

/// What a mode did with a key that no binding matched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fallback {
    /// Whether the mode handled the key.
    pub consumed: bool,
    /// An action to dispatch.
    pub action: Option<Action>,
    /// Literal text to insert.
    pub text: Option<String>,
    /// A mode transition to perform.
    pub request: Option<ModeRequest>,
}

impl Fallback {
    /// The mode doesn't handle this key.
    pub fn refuse() -> Self {
        Fallback::default()
    }

    /// The mode handled the key, and there's nothing else to do.
    pub fn consume() -> Self {
        Fallback { consumed: true, ..Fallback::default() }
    }

    /// Insert literal text.
    pub fn text<S: Into<String>>(text: S) -> Self {
        Fallback { consumed: true, text: Some(text.into()), ..Fallback::default() }
    }

    /// Dispatch an action.
    pub fn action(action: Action) -> Self {
        Fallback { consumed: true, action: Some(action), ..Fallback::default() }
    }

    /// Also perform a mode transition.
    pub fn with_request(mut self, request: ModeRequest) -> Self {
        self.consumed = true;
        self.request = Some(request);
        self
    }
}

/// A named unit of input behaviour.
///
/// Modes are shared between threads, and are only given shared access to themselves. A mode
/// that needs to keep state should use interior mutability.
///
/// Modes must not transition the [ModeManager] from within [Mode::enter] or [Mode::exit].
#[allow(unused_variables)]
pub trait Mode: Send + Sync {
    /// The name used to refer to this mode in keymaps and transitions.
    fn name(&self) -> &str;

    /// Text to show in a status line while this mode is active, like `-- INSERT --`.
    fn display_name(&self) -> Option<String> {
        None
    }

    /// The cursor shape to use while this mode is active.
    fn cursor_style(&self) -> CursorStyle {
        CursorStyle::Block
    }

    /// Whether a count can be typed before a command in this mode.
    fn accepts_count(&self) -> bool {
        false
    }

    /// Called when this mode becomes the current mode.
    fn enter(&self, ctx: &ModeContext) -> Result<(), TransitionError> {
        Ok(())
    }

    /// Called when this mode stops being the current mode.
    fn exit(&self, ctx: &ModeContext) -> Result<(), TransitionError> {
        Ok(())
    }

    /// Handle a key that no binding matched.
    fn handle_unmapped(&self, key: &KeyEvent, ctx: &ModeContext) -> Fallback {
        Fallback::refuse()
    }
}

/// The kind of transition that produced a [ModeChange].
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ModeChangeKind {
    /// A plain switch.
    Switch,
    /// The previous mode was suspended.
    Push,
    /// A suspended mode was restored.
    Pop,
}

/// Describes a successful transition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModeChange {
    /// The mode that was left, if any.
    pub previous: Option<String>,
    /// The mode that is now current.
    pub current: String,
    /// How the transition happened.
    pub kind: ModeChangeKind,
}

type Observer = Arc<dyn Fn(&ModeChange) + Send + Sync>;

#[derive(Default)]
struct ModeState {
    modes: HashMap<String, Arc<dyn Mode>>,
    current: Option<String>,
    stack: Vec<String>,
}

/// Owns the registered modes and performs transitions between them.
pub struct ModeManager {
    state: Mutex<ModeState>,
    transition: Mutex<()>,
    observers: RwLock<Vec<Observer>>,
}

impl ModeManager {
    /// Create a manager with no modes.
    pub fn new() -> Self {
        ModeManager {
            state: Mutex::new(ModeState::default()),
            transition: Mutex::new(()),
            observers: RwLock::new(vec![]),
        }
    }

    /// Create a manager with every [VimMode] registered, starting in Normal mode.
    pub fn vim() -> Self {
        let manager = ModeManager::new();

        {
            let mut state = manager.state.lock();

            for mode in VimMode::ALL {
                state.modes.insert(mode.name().to_string(), Arc::new(mode));
            }
        }

        if let Err(e) = manager.switch(VimMode::Normal.name()) {
            warn!(error = %e, "failed to enter normal mode");
        }

        manager
    }

    /// Register a mode.
    pub fn register<M: Mode + 'static>(&self, mode: M) -> Result<(), ModeError> {
        self.register_arc(Arc::new(mode))
    }

    /// Register a shared mode.
    pub fn register_arc(&self, mode: Arc<dyn Mode>) -> Result<(), ModeError> {
        let mut state = self.state.lock();
        let name = mode.name().to_string();

        if state.modes.contains_key(&name) {
            return Err(ModeError::DuplicateMode(name));
        }

        debug!(mode = name.as_str(), "registered mode");
        state.modes.insert(name, mode);

        Ok(())
    }

    /// The name of the current mode.
    pub fn current(&self) -> Option<String> {
        self.state.lock().current.clone()
    }

    /// The current mode.
    pub fn current_mode(&self) -> Option<Arc<dyn Mode>> {
        let state = self.state.lock();
        let name = state.current.as_ref()?;

        state.modes.get(name).cloned()
    }

    /// Look up a registered mode.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Mode>> {
        self.state.lock().modes.get(name).cloned()
    }

    /// The names of the suspended modes, oldest first.
    pub fn stack(&self) -> Vec<String> {
        self.state.lock().stack.clone()
    }

    /// The names of all registered modes, sorted.
    pub fn modes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().modes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Call `f` after every successful transition.
    pub fn on_change<F>(&self, f: F)
    where
        F: Fn(&ModeChange) + Send + Sync + 'static,
    {
        self.observers.write().push(Arc::new(f));
    }

    /// Switch to another mode.
    pub fn switch(&self, name: &str) -> Result<(), ModeError> {
        self.switch_with(name, ModeContext::default())
    }

    /// Switch to another mode, passing some context to the modes involved.
    pub fn switch_with(&self, name: &str, ctx: ModeContext) -> Result<(), ModeError> {
        self.transition(Some(name), ModeChangeKind::Switch, ctx)
    }

    /// Suspend the current mode and enter another one.
    pub fn push(&self, name: &str) -> Result<(), ModeError> {
        self.push_with(name, ModeContext::default())
    }

    /// Like [ModeManager::push], passing some context to the modes involved.
    pub fn push_with(&self, name: &str, ctx: ModeContext) -> Result<(), ModeError> {
        self.transition(Some(name), ModeChangeKind::Push, ctx)
    }

    /// Return to the most recently suspended mode.
    pub fn pop(&self) -> Result<(), ModeError> {
        self.pop_with(ModeContext::default())
    }

    /// Like [ModeManager::pop], passing some context to the modes involved.
    pub fn pop_with(&self, ctx: ModeContext) -> Result<(), ModeError> {
        self.transition(None, ModeChangeKind::Pop, ctx)
    }

    /// Perform a transition requested by a mode's fallback.
    pub fn apply(&self, request: &ModeRequest, ctx: ModeContext) -> Result<(), ModeError> {
        match request {
            ModeRequest::Switch(name) => self.switch_with(name, ctx),
            ModeRequest::Push(name) => self.push_with(name, ctx),
            ModeRequest::Pop => self.pop_with(ctx),
        }
    }

    /// Ask the current mode to handle a key that no binding matched.
    pub fn handle_unmapped(&self, key: &KeyEvent, ctx: &ModeContext) -> Fallback {
        match self.current_mode() {
            Some(mode) => mode.handle_unmapped(key, ctx),
            None => Fallback::refuse(),
        }
    }

    fn transition(
        &self,
        target: Option<&str>,
        kind: ModeChangeKind,
        mut ctx: ModeContext,
    ) -> Result<(), ModeError> {
        let serial = self.transition.lock();

        let (target, next, current, previous) = {
            let state = self.state.lock();

            let target = match target {
                Some(name) => name.to_string(),
                None => state.stack.last().cloned().ok_or(ModeError::EmptyStack)?,
            };

            let next = state
                .modes
                .get(&target)
                .cloned()
                .ok_or_else(|| ModeError::UnknownMode(target.clone()))?;

            let current = state.current.clone();
            let previous = current.as_ref().and_then(|name| state.modes.get(name).cloned());

            (target, next, current, previous)
        };

        match kind {
            ModeChangeKind::Push if current.is_none() => {
                return Err(ModeError::NoCurrentMode);
            },
            ModeChangeKind::Switch if current.as_deref() == Some(target.as_str()) => {
                return Ok(());
            },
            _ => {},
        }

        ctx.previous = current.clone();
        ctx.next = Some(target.clone());

        if let (Some(name), Some(mode)) = (&current, &previous) {
            mode.exit(&ctx)
                .map_err(|source| ModeError::ExitFailed { mode: name.clone(), source })?;
        }

        if let Err(source) = next.enter(&ctx) {
            if let Some(mode) = &previous {
                let rollback = ModeContext {
                    previous: Some(target.clone()),
                    next: current.clone(),
                    ..ctx.clone()
                };

                if let Err(e) = mode.enter(&rollback) {
                    warn!(mode = ?current, error = %e, "failed to re-enter mode after rollback");
                }
            }

            warn!(mode = target.as_str(), error = %source, "failed to enter mode");

            return Err(ModeError::EnterFailed { mode: target, source });
        }

        let change = {
            let mut state = self.state.lock();

            match kind {
                ModeChangeKind::Switch => {},
                ModeChangeKind::Push => {
                    if let Some(name) = &current {
                        state.stack.push(name.clone());
                    }
                },
                ModeChangeKind::Pop => {
                    state.stack.pop();
                },
            }

            state.current = Some(target.clone());

            ModeChange { previous: current, current: target, kind }
        };

        drop(serial);

        debug!(previous = ?change.previous, current = change.current.as_str(), kind = ?kind, "changed mode");

        let observers = self.observers.read().clone();

        for observer in observers.iter() {
            observer(&change);
        }

        Ok(())
    }
}

impl Default for ModeManager {
    fn default() -> Self {
        ModeManager::new()
    }
}
