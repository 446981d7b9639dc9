//! # Input handler
//!
//! ## Overview
//!
//! The [InputHandler] turns key presses into [Actions](Action). For every key it:
//!
//! 1. Runs the pre-key [hooks](crate::hooks), which may swallow the key.
//! 2. Stages a count or register, if the key is an unbound digit or the register key.
//! 3. Adds the key to the pending sequence, and looks the sequence up in the [Registry].
//! 4. If a binding matches, builds its action and dispatches it.
//! 5. If a longer binding could still match, waits for more keys until the idle timeout.
//! 6. Otherwise, gives the key to the current [Mode](crate::mode::Mode).
//!
//! Dispatched actions are sent through a bounded channel available from
//! [InputHandler::actions]. When the channel is full, actions are dropped and counted instead of
//! blocking the handler.
//!
//! ## Operators
//!
//! Bindings in the [operator category](crate::registry::OPERATOR_CATEGORY) don't produce
//! anything right away. Instead, the handler enters `operator_pending` mode and waits for a
//! motion or text object. The operator's action is then dispatched with the motion in its
//! arguments, and the counts typed before the operator and the motion multiplied together.
//!
//! ## Example
//!
//! ```
//! use keyseq::KeyEvent;
//! use modalinput::handler::{HandlerConfig, InputHandler};
//!
//! let handler = InputHandler::vim(HandlerConfig::default()).unwrap();
//! let actions = handler.actions();
//!
//! handler.feed(&"2d3w".parse().unwrap());
//!
//! let act = actions.try_recv().unwrap();
//! assert_eq!(act.name, "delete");
//! assert_eq!(act.count, 6);
//! assert_eq!(act.args.motion.as_deref(), Some("word_forward"));
//! ```
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, trace, warn};

use keyseq::{KeyEvent, KeySequence};

use crate::action::{names, Action, ActionArgs};
use crate::context::{EditorSnapshot, EditorState, LookupContext, ModeContext};
use crate::errors::ConfigError;
use crate::hooks::Hooks;
use crate::mode::ModeManager;
use crate::registry::{BindingEntry, Registry};

mod pending;
mod timer;

use self::pending::{PendingState, RegisterStage, StagedOperator};

pub use self::pending::PendingStatus;

/// The mode entered while an operator waits for a motion.
pub const OPERATOR_PENDING_MODE: &str = "operator_pending";

/// Settings for an [InputHandler].
#[derive(Clone, Debug, PartialEq)]
pub struct HandlerConfig {
    /// How long to wait for the next key of a partially typed sequence.
    pub timeout: Duration,

    /// How many actions can wait in the output queue.
    pub queue_capacity: usize,

    /// The key that selects a register for the next command.
    pub register_key: KeyEvent,
}

impl HandlerConfig {
    /// Set the idle timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the output queue's capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the register selection key.
    pub fn with_register_key(mut self, key: KeyEvent) -> Self {
        self.register_key = key;
        self
    }

    /// Check that these settings can be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        if self.register_key.get_char().is_none() {
            return Err(ConfigError::InvalidRegisterKey(self.register_key.to_string()));
        }

        Ok(())
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        HandlerConfig {
            timeout: Duration::from_millis(1000),
            queue_capacity: 64,
            register_key: KeyEvent::char('"'),
        }
    }
}

/// Counters describing what a handler has done.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HandlerStats {
    /// Actions sent to the output queue.
    pub emitted: u64,
    /// Actions dropped because the output queue was full or closed.
    pub dropped: u64,
    /// Actions suppressed by pre-action hooks.
    pub vetoed: u64,
    /// Pending sequences abandoned after the idle timeout.
    pub timeouts: u64,
    /// Keys that neither a binding nor the current mode handled.
    pub unmapped: u64,
}

#[derive(Default)]
struct Stats {
    emitted: AtomicU64,
    dropped: AtomicU64,
    vetoed: AtomicU64,
    timeouts: AtomicU64,
    unmapped: AtomicU64,
}

impl Stats {
    fn snapshot(&self) -> HandlerStats {
        HandlerStats {
            emitted: self.emitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            vetoed: self.vetoed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            unmapped: self.unmapped.load(Ordering::Relaxed),
        }
    }
}

/// State shared with the timer thread.
struct Shared {
    state: Mutex<PendingState>,
    timer: Condvar,
    closed: AtomicBool,
    stats: Stats,
    modes: Arc<ModeManager>,
}

impl Shared {
    /// Leave operator-pending mode after its operator was dropped.
    fn abandon_operator(&self) {
        if self.modes.current().as_deref() != Some(OPERATOR_PENDING_MODE) {
            return;
        }

        if let Err(e) = self.modes.pop() {
            warn!(error = %e, "failed to leave operator-pending mode");
        }
    }
}

/// What to do after a key has been resolved against the pending state.
enum Resolution {
    /// The key was staged, or more keys are needed.
    Waiting,

    /// The pending state was abandoned.
    Cancelled { operator: bool },

    /// A binding matched.
    Dispatch(Action),

    /// An operator binding matched, and now waits for a motion.
    Operator,

    /// A motion completed the staged operator.
    Complete(Action),

    /// A mode action dropped the staged operator.
    Interrupt(Action),

    /// Nothing can match, so the mode handles the key.
    Unmapped { operator: bool },
}

fn build_action(entry: &BindingEntry, count: Option<usize>, register: Option<char>) -> Action {
    let mut action = Action::new(entry.action.as_str()).with_count(count.unwrap_or(1));
    action.args = ActionArgs::from_fixed(&entry.args);

    if let Some(reg) = register {
        action.args.register = Some(reg);
    }

    action
}

/// Fill in an operator's action using the motion or text object that completed it.
fn compose(operator: StagedOperator, motion: Action) -> Action {
    let mut action = operator.action;
    action.count = action.count.saturating_mul(motion.count).max(1);

    if motion.args.motion.is_none() && motion.args.text_object.is_none() {
        action.args.motion = Some(motion.name);
    } else {
        if motion.args.motion.is_some() {
            action.args.motion = motion.args.motion;
        }

        if motion.args.text_object.is_some() {
            action.args.text_object = motion.args.text_object;
        }
    }

    if action.args.register.is_none() {
        action.args.register = motion.args.register;
    }

    for (k, v) in motion.args.extra {
        action.args.extra.entry(k).or_insert(v);
    }

    action
}

fn is_mode_action(action: &Action) -> bool {
    action.is(names::MODE_SWITCH) || action.is(names::MODE_PUSH) || action.is(names::MODE_POP)
}

/// Resolves key presses into actions.
///
/// Keys should be fed from a single thread, in the order they were typed. The handler's other
/// methods can be called from anywhere.
pub struct InputHandler {
    shared: Arc<Shared>,
    registry: Arc<Registry>,
    hooks: Hooks,
    config: HandlerConfig,

    context: RwLock<LookupContext>,
    editor: RwLock<Option<Arc<dyn EditorState>>>,

    sender: Mutex<Option<Sender<Action>>>,
    receiver: Receiver<Action>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl InputHandler {
    /// Create a handler that looks keys up in `registry` and hands unmapped keys to `modes`.
    ///
    /// The configuration is validated here, and the idle timer thread is started.
    pub fn new(
        registry: Arc<Registry>,
        modes: Arc<ModeManager>,
        config: HandlerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = PendingState { generation: registry.generation(), ..PendingState::default() };
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            timer: Condvar::new(),
            closed: AtomicBool::new(false),
            stats: Stats::default(),
            modes,
        });

        let (sender, receiver) = channel::bounded(config.queue_capacity);
        let timer = timer::spawn(shared.clone())?;

        debug!(
            timeout_ms = config.timeout.as_millis() as u64,
            queue_capacity = config.queue_capacity,
            "created input handler"
        );

        Ok(InputHandler {
            shared,
            registry,
            hooks: Hooks::new(),
            config,
            context: RwLock::new(LookupContext::new()),
            editor: RwLock::new(None),
            sender: Mutex::new(Some(sender)),
            receiver,
            timer: Mutex::new(Some(timer)),
        })
    }

    /// Create a handler with the default Vim keymaps and modes.
    pub fn vim(config: HandlerConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(Registry::vim()?);
        let modes = Arc::new(ModeManager::vim());

        InputHandler::new(registry, modes, config)
    }

    /// The registry used to look up keys.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The modes that handle unmapped keys.
    pub fn modes(&self) -> &Arc<ModeManager> {
        &self.shared.modes
    }

    /// The hooks run while processing keys.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// The handler's settings.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// The queue of dispatched actions.
    pub fn actions(&self) -> Receiver<Action> {
        self.receiver.clone()
    }

    /// Whether [InputHandler::close] has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Counters describing what this handler has done.
    pub fn stats(&self) -> HandlerStats {
        self.shared.stats.snapshot()
    }

    /// What has been typed towards the next command.
    pub fn pending_status(&self) -> PendingStatus {
        self.shared.state.lock().status()
    }

    /// Set a flag that guard conditions can refer to.
    pub fn set_flag<S: Into<String>>(&self, name: S, value: bool) {
        self.context.write().flags.insert(name.into(), value);
    }

    /// Set a variable that guard conditions can compare against.
    pub fn set_variable<S: Into<String>, V: Into<String>>(&self, name: S, value: V) {
        self.context.write().variables.insert(name.into(), value.into());
    }

    /// Set the file type used to filter bindings, when there is no [EditorState].
    pub fn set_file_type<S: Into<String>>(&self, file_type: Option<S>) {
        self.context.write().file_type = file_type.map(Into::into);
    }

    /// Set the editor state that is consulted before each lookup.
    pub fn set_editor_state(&self, editor: Arc<dyn EditorState>) {
        *self.editor.write() = Some(editor);
    }

    /// Stage a count for the next command, as if it had been typed.
    pub fn stage_count(&self, count: usize) {
        self.shared.state.lock().count = Some(count).filter(|c| *c > 0);
    }

    /// Stage a register for the next command, as if it had been typed.
    pub fn stage_register(&self, register: char) {
        self.shared.state.lock().register = Some(RegisterStage::Selected(register));
    }

    /// Forget everything typed towards the next command.
    pub fn cancel(&self) {
        let operator = {
            let mut st = self.shared.state.lock();
            let operator = st.operator.is_some();
            st.reset();
            operator
        };

        if operator {
            self.shared.abandon_operator();
        }
    }

    /// Process each key in a sequence.
    pub fn feed(&self, keys: &KeySequence) {
        for key in keys.iter() {
            self.handle(*key);
        }
    }

    /// Process a key press.
    pub fn handle(&self, key: KeyEvent) {
        if self.is_closed() {
            return;
        }

        if self.hooks.run_pre_key(&key).is_consumed() {
            trace!(key = %key, "key consumed by hook");
            return;
        }

        let mode = self.shared.modes.current_mode();
        let ctx = self.lookup_context(mode.as_ref().map(|m| m.name().to_string()));
        let accepts_count = mode.as_ref().map(|m| m.accepts_count()).unwrap_or(false);

        let resolution = {
            let mut st = self.shared.state.lock();
            self.resolve(&mut st, key, &ctx, accepts_count)
        };

        self.shared.timer.notify_one();

        let chosen = match resolution {
            Resolution::Waiting => None,
            Resolution::Cancelled { operator } => {
                if operator {
                    self.shared.abandon_operator();
                }

                None
            },
            Resolution::Dispatch(action) => self.dispatch(action),
            Resolution::Operator => self.begin_operator(),
            Resolution::Complete(action) => {
                self.shared.abandon_operator();
                self.dispatch(action)
            },
            Resolution::Interrupt(action) => {
                let chosen = self.dispatch(action);

                // The operator is gone even if a hook vetoed the mode change.
                self.shared.abandon_operator();
                chosen
            },
            Resolution::Unmapped { operator } => self.unmapped(&key, operator),
        };

        let _ = self.hooks.run_post_key(&key, chosen.as_ref());
    }

    /// Close the handler. Later keys are ignored, and the action queue is closed once the
    /// actions already in it have been received.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            let _st = self.shared.state.lock();
            self.shared.timer.notify_all();
        }

        self.sender.lock().take();

        if let Some(timer) = self.timer.lock().take() {
            if timer.join().is_err() {
                warn!("idle timer thread panicked");
            }
        }

        debug!("closed input handler");
    }

    fn lookup_context(&self, mode: Option<String>) -> LookupContext {
        let mut ctx = self.context.read().clone();
        ctx.mode = mode;

        match (self.editor.read().as_ref(), &ctx.mode) {
            (Some(editor), _) => ctx.refresh(editor.as_ref()),
            (None, Some(mode)) => {
                ctx.variables.insert("mode".into(), mode.clone());
            },
            (None, None) => {
                ctx.variables.remove("mode");
            },
        }

        ctx
    }

    fn mode_context(&self, action: Option<&Action>) -> ModeContext {
        let mut ctx = match self.editor.read().as_ref() {
            Some(editor) => ModeContext::from_editor(EditorSnapshot::capture(editor.as_ref())),
            None => ModeContext::default(),
        };

        if let Some(action) = action {
            ctx.count = Some(action.count);
            ctx.register = action.args.register;
        }

        ctx
    }

    fn resolve(
        &self,
        st: &mut PendingState,
        key: KeyEvent,
        ctx: &LookupContext,
        accepts_count: bool,
    ) -> Resolution {
        let generation = self.registry.generation();

        if st.generation != generation {
            if !st.keys.is_empty() {
                debug!(keys = %st.keys, "keymaps changed, discarding pending keys");
                st.keys.clear();
                st.deadline = None;
            }

            st.generation = generation;
        }

        if st.keys.is_empty() {
            if st.register == Some(RegisterStage::Awaiting) {
                match key.get_char() {
                    Some(c) => {
                        st.register = Some(RegisterStage::Selected(c));
                        return Resolution::Waiting;
                    },
                    None => {
                        let operator = st.operator.is_some();
                        st.reset();
                        return Resolution::Cancelled { operator };
                    },
                }
            }

            if accepts_count && self.stage(st, key, ctx) {
                return Resolution::Waiting;
            }
        }

        st.keys.push(key);

        if let Some(m) = self.registry.lookup(&st.keys, ctx) {
            let action = build_action(&m.entry, st.count.take(), st.selected_register());
            let operator = st.operator.take();

            trace!(keys = %st.keys, action = action.name.as_str(), "matched binding");

            let keys = std::mem::take(&mut st.keys);
            st.reset();

            if let Some(operator) = operator {
                if is_mode_action(&action) {
                    // Leaving the mode some other way drops the operator.
                    return Resolution::Interrupt(action);
                }

                return Resolution::Complete(compose(operator, action));
            }

            if m.entry.is_operator() && self.shared.modes.get(OPERATOR_PENDING_MODE).is_some() {
                st.operator = Some(StagedOperator { keys, action });
                return Resolution::Operator;
            }

            return Resolution::Dispatch(action);
        }

        if self.registry.has_prefix(&st.keys, ctx) {
            st.deadline = Some(Instant::now() + self.config.timeout);
            return Resolution::Waiting;
        }

        trace!(keys = %st.keys, "no binding can match");

        let operator = st.operator.is_some();
        st.reset();

        return Resolution::Unmapped { operator };
    }

    /// Stage a count digit or the register key. Returns whether the key was used.
    fn stage(&self, st: &mut PendingState, key: KeyEvent, ctx: &LookupContext) -> bool {
        let single = KeySequence::from(key);
        let bound = || {
            self.registry.lookup(&single, ctx).is_some() || self.registry.has_prefix(&single, ctx)
        };

        if let Some(digit) = key.digit() {
            // Zero only continues a count, since it's usually bound on its own. Other digits
            // are only counted while unbound.
            let stage = if digit == 0 { st.count.is_some() } else { !bound() };

            if stage {
                st.push_digit(digit);
            }

            return stage;
        }

        if key == self.config.register_key && st.register.is_none() && !bound() {
            st.register = Some(RegisterStage::Awaiting);
            return true;
        }

        return false;
    }

    fn begin_operator(&self) -> Option<Action> {
        let ctx = self.mode_context(None);

        match self.shared.modes.push_with(OPERATOR_PENDING_MODE, ctx) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "failed to enter operator-pending mode");

                // Without the mode, the operator runs on its own.
                let operator = self.shared.state.lock().operator.take();

                operator.and_then(|op| self.dispatch(op.action))
            },
        }
    }

    fn unmapped(&self, key: &KeyEvent, operator: bool) -> Option<Action> {
        let ctx = self.mode_context(None);
        let fallback = self.shared.modes.handle_unmapped(key, &ctx);
        let mut chosen = None;

        if !fallback.consumed {
            trace!(key = %key, "unmapped key");
            self.shared.stats.unmapped.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(text) = fallback.text {
            chosen = self.dispatch(Action::new(names::INSERT_TEXT).with_text(text)).or(chosen);
        }

        if let Some(action) = fallback.action {
            chosen = self.dispatch(action).or(chosen);
        }

        if let Some(request) = &fallback.request {
            if let Err(e) = self.shared.modes.apply(request, ctx) {
                warn!(error = %e, "failed to change mode");
            }
        } else if operator {
            self.shared.abandon_operator();
        }

        chosen
    }

    fn apply_mode_action(&self, action: &Action) {
        let ctx = self.mode_context(Some(action));
        let target = action.args.get_str("mode");

        let res = match (action.name.as_str(), target) {
            (names::MODE_SWITCH, Some(mode)) => self.shared.modes.switch_with(mode, ctx),
            (names::MODE_PUSH, Some(mode)) => self.shared.modes.push_with(mode, ctx),
            (names::MODE_POP, _) => self.shared.modes.pop_with(ctx),
            (name, None) => {
                warn!(action = name, "mode action has no mode argument");
                return;
            },
            _ => return,
        };

        if let Err(e) = res {
            warn!(action = action.name.as_str(), error = %e, "failed to change mode");
        }
    }

    /// Run the pre-action hooks and send the action. Returns the action for post-key hooks,
    /// whether or not it was sent.
    fn dispatch(&self, action: Action) -> Option<Action> {
        if self.hooks.run_pre_action(&action).is_consumed() {
            debug!(action = action.name.as_str(), "action vetoed by hook");
            self.shared.stats.vetoed.fetch_add(1, Ordering::Relaxed);
            return Some(action);
        }

        if is_mode_action(&action) {
            self.apply_mode_action(&action);
        }

        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            self.shared.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return Some(action);
        };

        match sender.try_send(action.clone()) {
            Ok(()) => {
                self.shared.stats.emitted.fetch_add(1, Ordering::Relaxed);
            },
            Err(TrySendError::Full(dropped)) => {
                warn!(action = dropped.name.as_str(), "action queue is full, dropping action");
                self.shared.stats.dropped.fetch_add(1, Ordering::Relaxed);
            },
            Err(TrySendError::Disconnected(_)) => {
                self.shared.stats.dropped.fetch_add(1, Ordering::Relaxed);
            },
        }

        Some(action)
    }
}

impl Drop for InputHandler {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookResult;
    use crate::registry::{Binding, Keymap};
    use keyseq::NamedKey;

    fn setup(config: HandlerConfig) -> (InputHandler, Receiver<Action>) {
        let handler = InputHandler::vim(config).unwrap();
        let actions = handler.actions();

        (handler, actions)
    }

    /// A handler with the Vim modes, and only the given bindings in Normal mode.
    fn bare(config: HandlerConfig, bindings: &[(&str, &str)]) -> (InputHandler, Receiver<Action>) {
        let keymap = bindings
            .iter()
            .fold(Keymap::new("test").mode("normal"), |km, (keys, act)| km.bind(*keys, *act));
        let registry = Arc::new(Registry::with_keymaps(vec![keymap]).unwrap());
        let modes = Arc::new(ModeManager::vim());
        let handler = InputHandler::new(registry, modes, config).unwrap();
        let actions = handler.actions();

        (handler, actions)
    }

    fn drain(actions: &Receiver<Action>) -> Vec<Action> {
        actions.try_iter().collect()
    }

    #[test]
    fn test_simple_binding() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, "j");
        assert_action!(actions, "cursor.move", 1);
        assert_no_action!(actions);

        feed!(handler, "10j");
        let act = assert_action!(actions, "cursor.move", 10);
        assert_eq!(act.args.motion.as_deref(), Some("down"));

        // A zero on its own is a motion.
        feed!(handler, "0");
        let act = assert_action!(actions, "cursor.move", 1);
        assert_eq!(act.args.motion.as_deref(), Some("line_start"));

        assert_eq!(handler.stats().emitted, 3);
    }

    #[test]
    fn test_prefix_waits() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, "g");
        assert_no_action!(actions);
        assert_eq!(handler.pending_status().to_string(), "g");

        feed!(handler, "g");
        let act = assert_action!(actions, "cursor.move", 1);
        assert_eq!(act.args.motion.as_deref(), Some("buffer_start"));
        assert!(handler.pending_status().is_empty());

        feed!(handler, "<C-w>l");
        let act = assert_action!(actions, "window.focus", 1);
        assert_eq!(act.args.get_str("direction"), Some("right"));
    }

    #[test]
    fn test_timeout() {
        let config = HandlerConfig::default().with_timeout(Duration::from_millis(50));
        let (handler, actions) = setup(config);

        feed!(handler, "g");
        assert_eq!(handler.pending_status().keys.len(), 1);

        std::thread::sleep(Duration::from_millis(500));

        assert!(handler.pending_status().is_empty());
        assert_eq!(handler.stats().timeouts, 1);
        assert_no_action!(actions);

        // The next key starts over.
        feed!(handler, "G");
        let act = assert_action!(actions, "cursor.move", 1);
        assert_eq!(act.args.motion.as_deref(), Some("buffer_end"));
    }

    #[test]
    fn test_timeout_restarts_sequence() {
        let config = HandlerConfig::default().with_timeout(Duration::from_millis(50));
        let (handler, actions) = bare(config, &[("g g", "top")]);

        feed!(handler, "g");
        std::thread::sleep(Duration::from_millis(500));
        assert!(handler.pending_status().is_empty());

        // The second "g" starts a new wait instead of completing the old one.
        feed!(handler, "g");
        assert_no_action!(actions);
        assert_eq!(handler.pending_status().to_string(), "g");

        feed!(handler, "g");
        assert_action!(actions, "top", 1);
        assert!(handler.pending_status().is_empty());
        assert_eq!(handler.stats().timeouts, 1);
    }

    #[test]
    fn test_count_and_register_plain_binding() {
        let (handler, actions) = bare(HandlerConfig::default(), &[("y", "yank")]);

        feed!(handler, "5\"ay");
        let act = assert_action!(actions, "yank", 5);
        assert_eq!(act.args.register, Some('a'));
        assert_eq!(act.args.motion, None);
        assert!(handler.pending_status().is_empty());
        assert_no_action!(actions);

        feed!(handler, "y");
        let act = assert_action!(actions, "yank", 1);
        assert_eq!(act.args.register, None);
    }

    #[test]
    fn test_bound_digits() {
        let (handler, actions) = bare(HandlerConfig::default(), &[("j", "down"), ("5", "mark.five")]);

        // A bound digit fires its binding, even after a count was started.
        feed!(handler, "25");
        assert_action!(actions, "mark.five", 2);
        assert!(handler.pending_status().is_empty());

        feed!(handler, "5");
        assert_action!(actions, "mark.five", 1);

        // Zero is unbound here, and only continues a count.
        feed!(handler, "20j");
        assert_action!(actions, "down", 20);

        feed!(handler, "0");
        assert_no_action!(actions);
        assert_eq!(handler.stats().unmapped, 1);
    }

    #[test]
    fn test_pre_key_hook_consumes_everything() {
        let (handler, actions) = setup(HandlerConfig::default());

        handler.hooks().add_pre_key(|_| HookResult::Consumed);

        feed!(handler, "2d<Esc>i:ggx\"a<CR>");
        assert_no_action!(actions);
        assert!(handler.pending_status().is_empty());
        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
        assert_eq!(handler.stats(), HandlerStats::default());
    }

    #[test]
    fn test_vetoed_mode_action_drops_operator() {
        let (handler, actions) = setup(HandlerConfig::default());

        handler.hooks().add_pre_action(|act| {
            if act.is(names::MODE_POP) {
                HookResult::Consumed
            } else {
                HookResult::Continue
            }
        });

        feed!(handler, "d<Esc>");
        assert_no_action!(actions);
        assert_eq!(handler.stats().vetoed, 1);
        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
        assert!(handler.modes().stack().is_empty());
        assert!(handler.pending_status().is_empty());

        // Motions are plain motions again.
        feed!(handler, "w");
        let act = assert_action!(actions, "cursor.move", 1);
        assert_eq!(act.args.motion.as_deref(), Some("word_forward"));
    }

    #[test]
    fn test_timeout_abandons_operator() {
        let config = HandlerConfig::default().with_timeout(Duration::from_millis(50));
        let (handler, actions) = setup(config);

        feed!(handler, "dg");
        assert_eq!(handler.modes().current().as_deref(), Some(OPERATOR_PENDING_MODE));

        std::thread::sleep(Duration::from_millis(500));

        assert!(handler.pending_status().is_empty());
        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
        assert!(handler.modes().stack().is_empty());
        assert_no_action!(actions);
    }

    #[test]
    fn test_count_and_register() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, "5\"a");
        assert_eq!(handler.pending_status().to_string(), "5\"a");

        feed!(handler, "yy");
        let act = assert_action!(actions, "yank", 5);
        assert_eq!(act.args.register, Some('a'));
        assert_eq!(act.args.motion.as_deref(), Some("line"));

        handler.stage_count(3);
        handler.stage_register('b');
        feed!(handler, "p");
        let act = assert_action!(actions, "paste", 3);
        assert_eq!(act.args.register, Some('b'));
        assert_eq!(act.args.get_str("position"), Some("after"));

        // A register key followed by a non-character cancels the register.
        feed!(handler, "\"<Esc>");
        assert!(handler.pending_status().is_empty());
        assert_no_action!(actions);
    }

    #[test]
    fn test_operator_motion() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, "2d");
        assert_no_action!(actions);
        assert_eq!(handler.modes().current().as_deref(), Some(OPERATOR_PENDING_MODE));
        assert_eq!(handler.pending_status().operator.as_deref(), Some("delete"));
        assert_eq!(handler.pending_status().to_string(), "d");

        feed!(handler, "3w");
        let act = assert_action!(actions, "delete", 6);
        assert_eq!(act.args.motion.as_deref(), Some("word_forward"));
        assert_no_action!(actions);

        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
        assert!(handler.modes().stack().is_empty());
        assert!(handler.pending_status().is_empty());
    }

    #[test]
    fn test_operator_text_object() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, "diw");
        let act = assert_action!(actions, "delete", 1);
        assert_eq!(act.args.text_object.as_deref(), Some("inner_word"));
        assert_eq!(act.args.motion, None);

        feed!(handler, "gUiW");
        let act = assert_action!(actions, "uppercase", 1);
        assert_eq!(act.args.text_object.as_deref(), Some("inner_bigword"));

        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
    }

    #[test]
    fn test_operator_cancel() {
        let (handler, actions) = setup(HandlerConfig::default());

        // Keys that aren't motions are swallowed by Operator-Pending mode.
        feed!(handler, "dq");
        assert_no_action!(actions);
        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
        assert_eq!(handler.stats().unmapped, 0);

        // Escape is bound to leave the mode, and drops the operator.
        feed!(handler, "c<Esc>");
        assert_action!(actions, names::MODE_POP, 1);
        assert_no_action!(actions);
        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
        assert!(handler.modes().stack().is_empty());

        // Cancelling from outside also leaves the mode.
        feed!(handler, "y");
        handler.cancel();
        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
        assert!(handler.pending_status().is_empty());

        feed!(handler, "w");
        let act = assert_action!(actions, "cursor.move", 1);
        assert_eq!(act.args.motion.as_deref(), Some("word_forward"));
    }

    #[test]
    fn test_insert_mode() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, "i");
        let act = assert_action!(actions, names::MODE_SWITCH, 1);
        assert_eq!(act.args.get_str("mode"), Some("insert"));
        assert_eq!(handler.modes().current().as_deref(), Some("insert"));

        // Counts aren't typed in Insert mode.
        feed!(handler, "h2<CR>");
        assert_eq!(
            drain(&actions)
                .into_iter()
                .map(|act| (act.name, act.args.text))
                .collect::<Vec<_>>(),
            vec![
                (names::INSERT_TEXT.to_string(), Some("h".to_string())),
                (names::INSERT_TEXT.to_string(), Some("2".to_string())),
                (names::INSERT_TEXT.to_string(), Some("\n".to_string())),
            ]
        );

        feed!(handler, "<BS>");
        let act = assert_action!(actions, "delete", 1);
        assert_eq!(act.args.motion.as_deref(), Some("left"));

        feed!(handler, "<Esc>");
        assert_action!(actions, names::MODE_SWITCH, 1);
        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
    }

    #[test]
    fn test_command_mode() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, ":w");
        assert_action!(actions, names::MODE_SWITCH, 1);
        let act = assert_action!(actions, names::INSERT_TEXT, 1);
        assert_eq!(act.args.text.as_deref(), Some("w"));
        assert_eq!(handler.modes().current().as_deref(), Some("command"));

        feed!(handler, "<CR>");
        assert_action!(actions, names::COMMAND_SUBMIT, 1);
        assert_no_action!(actions);
        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
    }

    #[test]
    fn test_unmapped() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, "q<F5>");
        assert_no_action!(actions);
        assert_eq!(handler.stats().unmapped, 2);
        assert!(handler.pending_status().is_empty());

        // A prefix followed by a key that can't continue it is discarded.
        feed!(handler, "gq");
        assert_no_action!(actions);
        assert_eq!(handler.stats().unmapped, 3);
        assert!(handler.pending_status().is_empty());
    }

    #[test]
    fn test_file_type_precedence() {
        let (handler, actions) = setup(HandlerConfig::default());
        let docs = Keymap::new("docs").mode("normal").bind("K", "hover");
        let rust = Keymap::new("rust-docs").mode("normal").file_type("rust").bind("K", "rust.hover");

        handler.registry().register_all(vec![docs, rust]).unwrap();

        feed!(handler, "K");
        assert_action!(actions, "hover", 1);

        handler.set_file_type(Some("rust"));
        feed!(handler, "K");
        assert_action!(actions, "rust.hover", 1);

        handler.set_file_type(None::<String>);
        feed!(handler, "K");
        assert_action!(actions, "hover", 1);

        // The editor's state takes over from the file type set by hand.
        let editor = EditorSnapshot { file_type: Some("rust".into()), ..EditorSnapshot::default() };
        handler.set_editor_state(Arc::new(editor));
        feed!(handler, "K");
        assert_action!(actions, "rust.hover", 1);
    }

    #[test]
    fn test_guard_conditions() {
        let (handler, actions) = setup(HandlerConfig::default());
        let keymap = Keymap::new("git")
            .mode("normal")
            .priority(1)
            .binding(Binding::new("n", "git.next_hunk").when("inDiff && mode == normal"));

        handler.registry().register(keymap).unwrap();

        feed!(handler, "n");
        assert_action!(actions, "search.next", 1);

        handler.set_flag("inDiff", true);
        feed!(handler, "n");
        assert_action!(actions, "git.next_hunk", 1);

        handler.set_flag("inDiff", false);
        handler.set_variable("unused", "value");
        feed!(handler, "n");
        assert_action!(actions, "search.next", 1);
    }

    #[test]
    fn test_keymap_change_discards_pending() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, "g");
        assert_eq!(handler.pending_status().to_string(), "g");

        handler.registry().register(Keymap::new("extra").bind("<F2>", "rename")).unwrap();

        // Without the change, this would have completed "gg".
        feed!(handler, "g");
        assert_no_action!(actions);
        assert_eq!(handler.pending_status().to_string(), "g");

        feed!(handler, "g");
        assert_action!(actions, "cursor.move", 1);

        feed!(handler, "<F2>");
        assert_action!(actions, "rename", 1);
    }

    #[test]
    fn test_pre_key_hook() {
        let (handler, actions) = setup(HandlerConfig::default());

        handler.hooks().add_pre_key(|key| {
            if *key == KeyEvent::char('j') {
                HookResult::Consumed
            } else {
                HookResult::Continue
            }
        });

        feed!(handler, "2j");
        assert_no_action!(actions);
        assert_eq!(handler.pending_status().count, Some(2));

        feed!(handler, "k");
        let act = assert_action!(actions, "cursor.move", 2);
        assert_eq!(act.args.motion.as_deref(), Some("up"));
    }

    #[test]
    fn test_pre_action_veto() {
        let (handler, actions) = setup(HandlerConfig::default());
        let seen = Arc::new(Mutex::new(vec![]));

        handler.hooks().add_pre_action(|act| {
            if act.is(names::MODE_SWITCH) || act.is("quit") {
                HookResult::Consumed
            } else {
                HookResult::Continue
            }
        });

        {
            let seen = seen.clone();
            handler.hooks().add_post_key(move |key, act| {
                seen.lock().push((key.to_string(), act.map(|a| a.name.clone())));
                HookResult::Continue
            });
        }

        feed!(handler, "iZQ");
        assert_no_action!(actions);

        // A vetoed mode change doesn't happen.
        assert_eq!(handler.modes().current().as_deref(), Some("normal"));
        assert_eq!(handler.stats().vetoed, 2);
        assert_eq!(handler.stats().emitted, 0);

        assert_eq!(*seen.lock(), vec![
            ("i".to_string(), Some(names::MODE_SWITCH.to_string())),
            ("Z".to_string(), None),
            ("Q".to_string(), Some("quit".to_string())),
        ]);
    }

    #[test]
    fn test_queue_full() {
        let config = HandlerConfig::default().with_queue_capacity(1);
        let (handler, actions) = setup(config);

        feed!(handler, "jkl");
        assert_action!(actions, "cursor.move", 1);
        assert_no_action!(actions);

        let stats = handler.stats();
        assert_eq!(stats.emitted, 1);
        assert_eq!(stats.dropped, 2);
    }

    #[test]
    fn test_close() {
        let (handler, actions) = setup(HandlerConfig::default());

        feed!(handler, "j");
        handler.close();
        handler.close();
        assert!(handler.is_closed());

        feed!(handler, "k");
        assert_action!(actions, "cursor.move", 1);
        assert!(actions.recv().is_err());
        assert_eq!(handler.stats().emitted, 1);
    }

    #[test]
    fn test_config() {
        let config = HandlerConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(1000));
        assert_eq!(config.queue_capacity, 64);
        assert!(config.validate().is_ok());

        let zero = HandlerConfig::default().with_timeout(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(ConfigError::InvalidTimeout)));

        let empty = HandlerConfig::default().with_queue_capacity(0);
        assert!(matches!(InputHandler::vim(empty), Err(ConfigError::ZeroCapacity)));

        let esc = HandlerConfig::default().with_register_key(KeyEvent::named(NamedKey::Esc));
        assert!(matches!(esc.validate(), Err(ConfigError::InvalidRegisterKey(_))));
    }

    #[test]
    fn test_custom_register_key() {
        let config = HandlerConfig::default().with_register_key(KeyEvent::char('\''));
        let (handler, actions) = setup(config);

        feed!(handler, "'bx");
        let act = assert_action!(actions, "delete", 1);
        assert_eq!(act.args.register, Some('b'));
    }
}
