//! # Prefix tree
//!
//! The registry indexes every bound sequence in a tree keyed by the canonical rendering of each
//! key press. There is one tree per mode scope, plus one for bindings that apply in every mode.
//!
//! Entries can live on any node. When entries are removed, nodes that no longer carry entries or
//! children are pruned, so a node with children always leads to at least one entry.
use std::collections::HashMap;

/// Identifies one tree within a [PrefixTree]: a mode name, or `None` for global bindings.
pub(crate) type Scope = Option<String>;

pub(crate) struct TrieNode<T> {
    children: HashMap<String, TrieNode<T>>,
    entries: Vec<T>,
}

impl<T> TrieNode<T> {
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.entries.is_empty()
    }

    /// The entries stored at this node, in insertion order.
    pub(crate) fn entries(&self) -> &[T] {
        self.entries.as_slice()
    }

    /// Whether a longer sequence continues from this node.
    pub(crate) fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// The tokens that continue from this node, and the nodes they lead to.
    pub(crate) fn children(&self) -> impl Iterator<Item = (&str, &TrieNode<T>)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a T>) {
        out.extend(self.entries.iter());

        for child in self.children.values() {
            child.walk(out);
        }
    }

    fn remove<F>(&mut self, path: &[String], pred: &F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        match path.split_first() {
            None => {
                let before = self.entries.len();
                self.entries.retain(|e| !pred(e));
                return before - self.entries.len();
            },
            Some((token, rest)) => {
                let Some(child) = self.children.get_mut(token) else {
                    return 0;
                };

                let removed = child.remove(rest, pred);

                if child.is_empty() {
                    self.children.remove(token);
                }

                return removed;
            },
        }
    }
}

impl<T> Default for TrieNode<T> {
    fn default() -> Self {
        TrieNode { children: HashMap::new(), entries: Vec::new() }
    }
}

/// A set of scoped prefix trees.
pub(crate) struct PrefixTree<T> {
    scopes: HashMap<Scope, TrieNode<T>>,
}

impl<T> PrefixTree<T> {
    pub(crate) fn new() -> Self {
        PrefixTree { scopes: HashMap::new() }
    }

    /// Add an entry at the end of `path` within `scope`.
    pub(crate) fn insert(&mut self, scope: &Scope, path: &[String], entry: T) {
        let mut node = self.scopes.entry(scope.clone()).or_default();

        for token in path {
            node = node.children.entry(token.clone()).or_default();
        }

        node.entries.push(entry);
    }

    /// Remove the entries at the end of `path` that match `pred`, pruning any nodes left empty.
    ///
    /// Returns how many entries were removed.
    pub(crate) fn remove<F>(&mut self, scope: &Scope, path: &[String], pred: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let Some(root) = self.scopes.get_mut(scope) else {
            return 0;
        };

        let removed = root.remove(path, &pred);

        if root.is_empty() {
            self.scopes.remove(scope);
        }

        return removed;
    }

    /// Find the node at the end of `path`.
    pub(crate) fn get(&self, scope: &Scope, path: &[String]) -> Option<&TrieNode<T>> {
        let mut node = self.scopes.get(scope)?;

        for token in path {
            node = node.children.get(token)?;
        }

        Some(node)
    }

    /// Whether some entry in `scope` sits strictly below `path`.
    pub(crate) fn has_longer(&self, scope: &Scope, path: &[String]) -> bool {
        self.get(scope, path).map(TrieNode::has_children).unwrap_or(false)
    }

    /// Every entry in `scope`.
    pub(crate) fn entries(&self, scope: &Scope) -> Vec<&T> {
        let mut out = vec![];

        if let Some(root) = self.scopes.get(scope) {
            root.walk(&mut out);
        }

        out
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}
