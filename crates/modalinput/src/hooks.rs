//! # Hooks
//!
//! Hooks let other parts of an application watch or intercept input as it is resolved. There
//! are three phases:
//!
//! * Pre-key hooks see every key before anything else does, and can swallow it.
//! * Pre-action hooks see each action just before it is dispatched, and can suppress it.
//! * Post-key hooks see each key after it was processed, along with the action it produced.
//!
//! Within a phase, hooks run in the order they were added, and the first hook to return
//! [HookResult::Consumed] stops the rest of that phase.
use std::sync::Arc;

use parking_lot::RwLock;

use keyseq::KeyEvent;

use crate::action::Action;

/// What a hook decided.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub enum HookResult {
    /// Let processing continue.
    #[default]
    Continue,

    /// Stop processing here.
    Consumed,
}

impl HookResult {
    /// Whether this is [HookResult::Consumed].
    pub fn is_consumed(&self) -> bool {
        matches!(self, HookResult::Consumed)
    }
}

/// A hook called before a key is processed.
pub type PreKeyHook = Arc<dyn Fn(&KeyEvent) -> HookResult + Send + Sync>;

/// A hook called after a key is processed, with the action that was chosen for it, if any.
pub type PostKeyHook = Arc<dyn Fn(&KeyEvent, Option<&Action>) -> HookResult + Send + Sync>;

/// A hook called before an action is dispatched.
pub type PreActionHook = Arc<dyn Fn(&Action) -> HookResult + Send + Sync>;

/// The hooks registered with an input handler.
#[derive(Default)]
pub struct Hooks {
    pre_key: RwLock<Vec<PreKeyHook>>,
    post_key: RwLock<Vec<PostKeyHook>>,
    pre_action: RwLock<Vec<PreActionHook>>,
}

impl Hooks {
    /// Create an empty set of hooks.
    pub fn new() -> Self {
        Hooks::default()
    }

    /// Add a hook to run before each key.
    pub fn add_pre_key<F>(&self, f: F)
    where
        F: Fn(&KeyEvent) -> HookResult + Send + Sync + 'static,
    {
        self.pre_key.write().push(Arc::new(f));
    }

    /// Add a hook to run after each key.
    pub fn add_post_key<F>(&self, f: F)
    where
        F: Fn(&KeyEvent, Option<&Action>) -> HookResult + Send + Sync + 'static,
    {
        self.post_key.write().push(Arc::new(f));
    }

    /// Add a hook to run before each action is dispatched.
    pub fn add_pre_action<F>(&self, f: F)
    where
        F: Fn(&Action) -> HookResult + Send + Sync + 'static,
    {
        self.pre_action.write().push(Arc::new(f));
    }

    /// Remove every hook.
    pub fn clear(&self) {
        self.pre_key.write().clear();
        self.post_key.write().clear();
        self.pre_action.write().clear();
    }

    // Each phase copies the list first, so that hooks can add other hooks without deadlocking.

    pub(crate) fn run_pre_key(&self, key: &KeyEvent) -> HookResult {
        let hooks = self.pre_key.read().clone();

        for hook in hooks.iter() {
            if hook(key).is_consumed() {
                return HookResult::Consumed;
            }
        }

        return HookResult::Continue;
    }

    pub(crate) fn run_post_key(&self, key: &KeyEvent, action: Option<&Action>) -> HookResult {
        let hooks = self.post_key.read().clone();

        for hook in hooks.iter() {
            if hook(key, action).is_consumed() {
                return HookResult::Consumed;
            }
        }

        return HookResult::Continue;
    }

    pub(crate) fn run_pre_action(&self, action: &Action) -> HookResult {
        let hooks = self.pre_action.read().clone();

        for hook in hooks.iter() {
            if hook(action).is_consumed() {
                return HookResult::Consumed;
            }
        }

        return HookResult::Continue;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_order_and_short_circuit() {
        let hooks = Hooks::new();
        let calls = Arc::new(Mutex::new(vec![]));

        for (i, result) in [HookResult::Continue, HookResult::Consumed, HookResult::Continue]
            .into_iter()
            .enumerate()
        {
            let calls = calls.clone();
            hooks.add_pre_key(move |_| {
                calls.lock().push(i);
                result
            });
        }

        assert_eq!(hooks.run_pre_key(&KeyEvent::char('a')), HookResult::Consumed);
        assert_eq!(*calls.lock(), vec![0, 1]);

        hooks.clear();
        assert_eq!(hooks.run_pre_key(&KeyEvent::char('a')), HookResult::Continue);
    }

    #[test]
    fn test_post_key_sees_action() {
        let hooks = Hooks::new();
        let seen = Arc::new(Mutex::new(vec![]));

        {
            let seen = seen.clone();
            hooks.add_post_key(move |key, action| {
                seen.lock().push((key.to_string(), action.map(|a| a.name.clone())));
                HookResult::Continue
            });
        }

        let act = Action::new("yank");
        hooks.run_post_key(&KeyEvent::char('y'), Some(&act));
        hooks.run_post_key(&KeyEvent::char('g'), None);

        assert_eq!(*seen.lock(), vec![
            ("y".to_string(), Some("yank".to_string())),
            ("g".to_string(), None)
        ]);
    }

    #[test]
    fn test_pre_action_veto() {
        let hooks = Hooks::new();
        hooks.add_pre_action(|act| {
            if act.is("quit") {
                HookResult::Consumed
            } else {
                HookResult::Continue
            }
        });

        assert!(hooks.run_pre_action(&Action::new("quit")).is_consumed());
        assert!(!hooks.run_pre_action(&Action::new("yank")).is_consumed());
    }

    #[test]
    fn test_hook_adds_hook() {
        let hooks = Arc::new(Hooks::new());
        let inner = Arc::downgrade(&hooks);

        hooks.add_pre_key(move |_| {
            if let Some(hooks) = inner.upgrade() {
                hooks.add_pre_key(|_| HookResult::Consumed);
            }

            HookResult::Continue
        });

        assert_eq!(hooks.run_pre_key(&KeyEvent::char('a')), HookResult::Continue);
        assert_eq!(hooks.run_pre_key(&KeyEvent::char('a')), HookResult::Consumed);
    }
}
