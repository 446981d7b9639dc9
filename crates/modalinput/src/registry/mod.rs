//! # Keybinding registry
//!
//! ## Overview
//!
//! The [Registry] stores named [Keymaps](Keymap) and answers two questions about a key sequence
//! typed in some [LookupContext]:
//!
//! * Which bindings match it exactly? ([Registry::lookup_all])
//! * Could a longer binding still match it? ([Registry::has_prefix])
//!
//! Every binding is indexed in a prefix tree for its keymap's mode, or in a global tree if the
//! keymap applies to all modes. A lookup consults the current mode's tree first and then the
//! global one, drops bindings for other file types and bindings whose guard condition is false,
//! and ranks what is left by score:
//!
//! ```text
//! keymap priority * 100 + binding priority + 50 (if mode-specific) + 25 (if file-type-specific)
//! ```
//!
//! Ties prefer a mode-specific keymap, then a file-type-specific one, and otherwise keep the
//! order in which the bindings were found.
//!
//! ## Example
//!
//! ```
//! use modalinput::context::LookupContext;
//! use modalinput::registry::{Keymap, Registry};
//!
//! let registry = Registry::new();
//! registry.register(Keymap::new("global").bind("g f", "editor.format")).unwrap();
//! registry.register(Keymap::new("go").file_type("go").bind("g f", "go.format")).unwrap();
//!
//! let keys = "gf".parse().unwrap();
//! let go = LookupContext::new().with_file_type("go");
//! let py = LookupContext::new().with_file_type("python");
//!
//! assert_eq!(registry.lookup(&keys, &go).unwrap().entry.action, "go.format");
//! assert_eq!(registry.lookup(&keys, &py).unwrap().entry.action, "editor.format");
//! ```
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use keyseq::{KeyEvent, KeySequence};

use crate::context::LookupContext;
use crate::errors::RegistryError;

mod condition;
mod config;
mod defaults;
mod keymap;
mod trie;

pub use self::condition::Condition;
pub use self::config::{load_keymap_file, parse_keymaps};
pub use self::defaults::default_keymaps;
pub use self::keymap::{Binding, Keymap, KeymapSource};

use self::trie::{PrefixTree, Scope};

/// The category name that marks a binding as an operator.
pub const OPERATOR_CATEGORY: &str = "operator";

/// A binding that has been checked and indexed by the [Registry].
#[derive(Clone, Debug, PartialEq)]
pub struct BindingEntry {
    /// The name of the keymap that contributed this binding.
    pub keymap: String,
    /// The keymap's mode restriction.
    pub mode: Option<String>,
    /// The keymap's file type restriction.
    pub file_type: Option<String>,
    /// The keymap's priority.
    pub keymap_priority: i32,
    /// Where the keymap came from.
    pub source: KeymapSource,
    /// The parsed key sequence.
    pub keys: KeySequence,
    /// The action name.
    pub action: String,
    /// Fixed arguments for the action.
    pub args: Map<String, Value>,
    /// The guard condition, if any.
    pub when: Option<Condition>,
    /// The binding's description.
    pub description: String,
    /// The binding's priority within its keymap.
    pub priority: i32,
    /// The binding's category.
    pub category: Option<String>,
}

impl BindingEntry {
    /// The ranking score of this binding.
    pub fn score(&self) -> i64 {
        let mut score = i64::from(self.keymap_priority) * 100 + i64::from(self.priority);

        if self.mode.is_some() {
            score += 50;
        }

        if self.file_type.is_some() {
            score += 25;
        }

        return score;
    }

    /// Whether this binding starts an operator that waits for a motion.
    pub fn is_operator(&self) -> bool {
        self.category.as_deref() == Some(OPERATOR_CATEGORY)
    }

    fn applies(&self, ctx: &LookupContext) -> bool {
        if let Some(ft) = &self.file_type {
            if ctx.file_type.as_ref() != Some(ft) {
                return false;
            }
        }

        match &self.when {
            Some(cond) => cond.evaluate(ctx),
            None => true,
        }
    }
}

/// A binding that applies in some context, along with its score.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingMatch {
    /// The matching binding.
    pub entry: Arc<BindingEntry>,
    /// The binding's score.
    pub score: i64,
}

/// A key that can follow a prefix, for which-key style displays.
#[derive(Clone, Debug, PartialEq)]
pub struct Continuation {
    /// The next key.
    pub key: KeyEvent,
    /// The best binding completed by this key, if there is one.
    pub binding: Option<Arc<BindingEntry>>,
    /// Whether longer bindings continue past this key.
    pub has_more: bool,
}

struct CompiledKeymap {
    keymap: Keymap,
    scope: Scope,
    entries: Vec<Arc<BindingEntry>>,
}

fn compile(keymap: Keymap) -> Result<CompiledKeymap, RegistryError> {
    let name = keymap.name.trim();

    if name.is_empty() {
        return Err(RegistryError::UnnamedKeymap);
    }

    let scope = keymap.mode_scope();
    let file_type = keymap.file_type_scope();
    let mut entries = Vec::with_capacity(keymap.bindings.len());

    for (index, binding) in keymap.bindings.iter().enumerate() {
        if binding.keys.trim().is_empty() {
            return Err(RegistryError::EmptyKeys { keymap: name.to_string(), index });
        }

        if binding.action.trim().is_empty() {
            return Err(RegistryError::EmptyAction {
                keymap: name.to_string(),
                keys: binding.keys.clone(),
            });
        }

        let keys = keyseq::parse_sequence(&binding.keys).map_err(|source| {
            RegistryError::InvalidKeys {
                keymap: name.to_string(),
                keys: binding.keys.clone(),
                source,
            }
        })?;

        let when = match binding.when.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                let cond = Condition::parse(text).ok_or_else(|| {
                    RegistryError::InvalidCondition {
                        keymap: name.to_string(),
                        keys: binding.keys.clone(),
                        when: text.to_string(),
                    }
                })?;

                Some(cond)
            },
        };

        entries.push(Arc::new(BindingEntry {
            keymap: name.to_string(),
            mode: scope.clone(),
            file_type: file_type.clone(),
            keymap_priority: keymap.priority,
            source: keymap.source,
            keys,
            action: binding.action.trim().to_string(),
            args: binding.args.clone(),
            when,
            description: binding.description.clone(),
            priority: binding.priority,
            category: binding.category.clone(),
        }));
    }

    let keymap = Keymap { name: name.to_string(), ..keymap };

    Ok(CompiledKeymap { keymap, scope, entries })
}

/// Rank bindings, keeping their incoming order when everything else is equal.
fn rank<'a, I>(candidates: I, ctx: &LookupContext) -> Vec<BindingMatch>
where
    I: IntoIterator<Item = &'a Arc<BindingEntry>>,
{
    let mut matches: Vec<BindingMatch> = candidates
        .into_iter()
        .filter(|entry| entry.applies(ctx))
        .map(|entry| BindingMatch { score: entry.score(), entry: Arc::clone(entry) })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.entry.mode.is_some().cmp(&a.entry.mode.is_some()))
            .then_with(|| b.entry.file_type.is_some().cmp(&a.entry.file_type.is_some()))
    });

    return matches;
}

struct RegistryInner {
    keymaps: HashMap<String, CompiledKeymap>,
    tree: PrefixTree<Arc<BindingEntry>>,
    generation: u64,
}

impl RegistryInner {
    fn remove(&mut self, name: &str) -> bool {
        let Some(old) = self.keymaps.remove(name) else {
            return false;
        };

        for entry in old.entries.iter() {
            self.tree
                .remove(&old.scope, &entry.keys.tokens(), |e| e.keymap == old.keymap.name);
        }

        return true;
    }

    fn insert(&mut self, compiled: CompiledKeymap) {
        self.remove(&compiled.keymap.name);

        for entry in compiled.entries.iter() {
            self.tree.insert(&compiled.scope, &entry.keys.tokens(), Arc::clone(entry));
        }

        debug!(
            keymap = compiled.keymap.name.as_str(),
            mode = ?compiled.scope,
            bindings = compiled.entries.len(),
            "registered keymap"
        );

        self.keymaps.insert(compiled.keymap.name.clone(), compiled);
    }

    /// The scopes to search for a context: the mode's own scope first, then the global one.
    fn scopes(ctx: &LookupContext) -> Vec<Scope> {
        match &ctx.mode {
            Some(mode) => vec![Some(mode.clone()), None],
            None => vec![None],
        }
    }
}

/// A store of keymaps indexed for incremental lookup.
///
/// The registry can be shared between threads. Lookups take a read lock, and registering or
/// removing a keymap takes a write lock, so readers always see either all or none of a keymap.
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        let inner = RegistryInner {
            keymaps: HashMap::new(),
            tree: PrefixTree::new(),
            generation: 0,
        };

        Registry { inner: RwLock::new(inner) }
    }

    /// Create a registry containing the given keymaps.
    pub fn with_keymaps<I>(keymaps: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Keymap>,
    {
        let registry = Registry::new();
        registry.register_all(keymaps)?;
        Ok(registry)
    }

    /// Create a registry containing the default Vim keymaps.
    pub fn vim() -> Result<Self, RegistryError> {
        Registry::with_keymaps(default_keymaps())
    }

    /// Register a keymap, replacing any other keymap with the same name.
    ///
    /// Every binding is checked before anything is indexed, so an invalid binding leaves the
    /// registry unchanged.
    pub fn register(&self, keymap: Keymap) -> Result<(), RegistryError> {
        let compiled = compile(keymap)?;
        let mut inner = self.inner.write();

        inner.insert(compiled);
        inner.generation += 1;

        Ok(())
    }

    /// Register several keymaps at once. If any of them is invalid, none are registered.
    pub fn register_all<I>(&self, keymaps: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = Keymap>,
    {
        let compiled = keymaps.into_iter().map(compile).collect::<Result<Vec<_>, _>>()?;
        let mut inner = self.inner.write();

        for keymap in compiled {
            inner.insert(keymap);
        }

        inner.generation += 1;

        Ok(())
    }

    /// Remove a keymap and all of its bindings. Returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        let mut inner = self.inner.write();

        if inner.remove(name) {
            inner.generation += 1;
            debug!(keymap = name, "unregistered keymap");
            return true;
        }

        return false;
    }

    /// A counter that changes every time keymaps are registered or removed.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Get a copy of a registered keymap.
    pub fn keymap(&self, name: &str) -> Option<Keymap> {
        self.inner.read().keymaps.get(name).map(|c| c.keymap.clone())
    }

    /// The names of all registered keymaps, sorted.
    pub fn keymap_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().keymaps.keys().cloned().collect();
        names.sort();
        names
    }

    /// Find every binding for exactly this sequence that applies in the given context, best
    /// match first.
    pub fn lookup_all(&self, keys: &KeySequence, ctx: &LookupContext) -> Vec<BindingMatch> {
        if keys.is_empty() {
            return vec![];
        }

        let tokens = keys.tokens();
        let inner = self.inner.read();

        let candidates = RegistryInner::scopes(ctx)
            .into_iter()
            .filter_map(|scope| inner.tree.get(&scope, &tokens))
            .flat_map(|node| node.entries().iter());

        let matches = rank(candidates, ctx);

        trace!(keys = %keys, mode = ?ctx.mode, matches = matches.len(), "looked up keys");

        return matches;
    }

    /// Find the best binding for exactly this sequence in the given context.
    pub fn lookup(&self, keys: &KeySequence, ctx: &LookupContext) -> Option<BindingMatch> {
        self.lookup_all(keys, ctx).into_iter().next()
    }

    /// Whether a binding longer than `keys` starts with `keys` in the context's mode.
    ///
    /// Only the mode is considered here. File types and guard conditions are checked once the
    /// full sequence has been typed.
    pub fn has_prefix(&self, keys: &KeySequence, ctx: &LookupContext) -> bool {
        let tokens = keys.tokens();
        let inner = self.inner.read();

        RegistryInner::scopes(ctx)
            .iter()
            .any(|scope| inner.tree.has_longer(scope, &tokens))
    }

    /// The keys that can follow `keys` in the given context, sorted by their rendering.
    pub fn continuations(&self, keys: &KeySequence, ctx: &LookupContext) -> Vec<Continuation> {
        let tokens = keys.tokens();
        let inner = self.inner.read();
        let mut next: BTreeMap<String, (Vec<&Arc<BindingEntry>>, bool)> = BTreeMap::new();

        for scope in RegistryInner::scopes(ctx) {
            let Some(node) = inner.tree.get(&scope, &tokens) else {
                continue;
            };

            for (token, child) in node.children() {
                let slot = next.entry(token.to_string()).or_default();
                slot.0.extend(child.entries().iter());
                slot.1 |= child.has_children();
            }
        }

        next.into_iter()
            .filter_map(|(token, (entries, has_more))| {
                let key = token.parse::<KeyEvent>().ok()?;
                let binding = rank(entries, ctx).into_iter().next().map(|m| m.entry);

                if binding.is_none() && !has_more {
                    return None;
                }

                Some(Continuation { key, binding, has_more })
            })
            .collect()
    }

    /// Every binding registered for a mode, or the global bindings if `mode` is `None`.
    ///
    /// The bindings are sorted by their keys.
    pub fn bindings_for_mode(&self, mode: Option<&str>) -> Vec<Arc<BindingEntry>> {
        let scope = mode.map(str::to_string);
        let inner = self.inner.read();
        let mut entries: Vec<Arc<BindingEntry>> =
            inner.tree.entries(&scope).into_iter().map(Arc::clone).collect();

        entries.sort_by_cached_key(|e| e.keys.to_string());
        entries
    }

    /// Whether no bindings are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().tree.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
