// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Arena of namespace nodes.
//!
//! The tree owns every [`Namespace`] of one program. Ids are generational so
//! that slots freed by rollback or unmerge can be reused safely.

use crate::name_scope::NAMESPACE_SEPARATOR;
use crate::symbol::{Symbol, SymbolKind};
use crate::types::{NamespaceId, SourceLocation};

use super::{Namespace, View};

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Namespace>,
}

/// Arena owning all namespaces of one program, rooted at an anonymous root.
#[derive(Debug)]
pub struct NamespaceTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NamespaceId,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTree {
    /// Create a tree holding only the root namespace.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Namespace::root()),
            }],
            free: Vec::new(),
            root: NamespaceId::new(0, 0),
        }
    }

    /// The root namespace id.
    #[must_use]
    pub const fn root(&self) -> NamespaceId {
        self.root
    }

    /// Look up a namespace. Returns `None` for stale ids.
    #[must_use]
    pub fn get(&self, id: NamespaceId) -> Option<&Namespace> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    /// Mutable lookup. Returns `None` for stale ids.
    pub fn get_mut(&mut self, id: NamespaceId) -> Option<&mut Namespace> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    /// True if `id` refers to a live namespace.
    #[must_use]
    pub fn contains(&self, id: NamespaceId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live namespaces, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Always false: the root is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn alloc(&mut self, ns: Namespace) -> NamespaceId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(ns);
            return NamespaceId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(ns),
        });
        NamespaceId::new(index, 0)
    }

    fn release(&mut self, id: NamespaceId) -> Option<Namespace> {
        if id == self.root {
            return None;
        }
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        Some(node)
    }

    /// Create a child namespace under `parent`.
    ///
    /// The child goes into the pending child map unless `committed` is set
    /// (merges and copies build committed state directly). Returns `None` if
    /// `parent` is stale; callers check for existing children first.
    pub(crate) fn create_child(
        &mut self,
        parent: NamespaceId,
        name: &str,
        flags: u32,
        location: SourceLocation,
        committed: bool,
    ) -> Option<NamespaceId> {
        let depth = self.get(parent)?.depth() + 1;
        let mut ns = Namespace::new(name.to_owned(), Some(parent), depth, flags, location);
        if committed {
            ns.set_committed();
        }
        let id = self.alloc(ns);
        let parent_ns = self.get_mut(parent)?;
        if committed {
            parent_ns.children.insert(name.to_owned(), id);
        } else {
            parent_ns.pending_children.insert(name.to_owned(), id);
        }
        Some(id)
    }

    /// Child of `parent` named `name` in `view`.
    #[must_use]
    pub fn child(&self, parent: NamespaceId, name: &str, view: View) -> Option<NamespaceId> {
        self.get(parent)?.child(name, view)
    }

    /// Walk `path` as child lookups starting at `from`.
    ///
    /// Returns the reached namespace, or the number of segments that matched
    /// before the walk failed.
    pub fn walk_path<S: AsRef<str>>(
        &self,
        from: NamespaceId,
        path: &[S],
        view: View,
    ) -> Result<NamespaceId, usize> {
        let mut current = from;
        for (matched, segment) in path.iter().enumerate() {
            current = self.child(current, segment.as_ref(), view).ok_or(matched)?;
        }
        Ok(current)
    }

    /// Iterate from `id` up to the root, `id` included.
    #[must_use]
    pub const fn ancestors(&self, id: NamespaceId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Fully qualified path of a namespace.
    ///
    /// With `anchored` the path starts with `::` (the root's empty segment);
    /// the root itself is then `::` and otherwise the empty string.
    #[must_use]
    pub fn get_path(&self, id: NamespaceId, anchored: bool) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .filter_map(|a| self.get(a))
            .filter(|ns| !ns.is_root())
            .map(Namespace::name)
            .collect();
        names.reverse();
        let joined = names.join(NAMESPACE_SEPARATOR);
        if anchored {
            format!("{NAMESPACE_SEPARATOR}{joined}")
        } else {
            joined
        }
    }

    /// Qualified name of `name` declared in `id`.
    #[must_use]
    pub fn qualify(&self, id: NamespaceId, name: &str) -> String {
        let path = self.get_path(id, false);
        if path.is_empty() {
            name.to_owned()
        } else {
            format!("{path}{NAMESPACE_SEPARATOR}{name}")
        }
    }

    /// Depth-first pre-order walk from the root over namespaces visible in `view`.
    ///
    /// Children are visited in name order so walks are deterministic.
    #[must_use]
    pub fn walk(&self, view: View) -> Vec<NamespaceId> {
        self.walk_from(self.root, view)
    }

    /// Depth-first pre-order walk of the subtree at `start`.
    #[must_use]
    pub fn walk_from(&self, start: NamespaceId, view: View) -> Vec<NamespaceId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(ns) = self.get(id) else {
                continue;
            };
            out.push(id);
            let mut kids: Vec<(&str, NamespaceId)> = ns.children(view).collect();
            kids.sort_unstable_by(|a, b| b.0.cmp(a.0));
            stack.extend(kids.into_iter().map(|(_, kid)| kid));
        }
        out
    }

    /// Recompute depths below `id` so that every child is one deeper than its
    /// parent. Also repairs parent links.
    pub fn fix_depths(&mut self, id: NamespaceId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(ns) = self.get(current) else {
                continue;
            };
            let depth = ns.depth();
            let kids: Vec<NamespaceId> = ns.children(View::Parse).map(|(_, k)| k).collect();
            for kid in kids {
                if let Some(child) = self.get_mut(kid) {
                    child.set_depth(depth + 1);
                    child.set_parent(Some(current));
                    stack.push(kid);
                }
            }
        }
    }

    /// Which type-like kind occupies `name` in `id`, with its location.
    ///
    /// Classes, hashdecls and child namespaces share one name space within a
    /// namespace.
    #[must_use]
    pub fn type_like_occupant(
        &self,
        id: NamespaceId,
        name: &str,
        view: View,
    ) -> Option<(SymbolKind, SourceLocation)> {
        let ns = self.get(id)?;
        let class = match view {
            View::Committed => ns.classes.find_committed(name),
            View::Parse => ns.classes.find(name),
        };
        if let Some(e) = class {
            return Some((SymbolKind::Class, e.symbol.location().clone()));
        }
        let hashdecl = match view {
            View::Committed => ns.hashdecls.find_committed(name),
            View::Parse => ns.hashdecls.find(name),
        };
        if let Some(e) = hashdecl {
            return Some((SymbolKind::HashDecl, e.symbol.location().clone()));
        }
        let child = ns.child(name, view)?;
        let location = self.get(child)?.location().clone();
        Some((SymbolKind::Namespace, location))
    }

    /// Mark every pending namespace as committed and move pending children
    /// into the committed child maps.
    ///
    /// Returns the namespaces that became committed.
    pub(crate) fn commit_namespaces(&mut self) -> Vec<NamespaceId> {
        let mut newly = Vec::new();
        for id in self.walk(View::Parse) {
            let Some(ns) = self.get_mut(id) else {
                continue;
            };
            if !ns.is_committed() {
                ns.set_committed();
                newly.push(id);
            }
            let pending: Vec<(String, NamespaceId)> = ns.pending_children.drain().collect();
            ns.children.extend(pending);
        }
        for &id in &newly {
            self.fix_depths(id);
        }
        newly
    }

    /// Free every pending namespace and clear pending child maps.
    ///
    /// Returns the number of namespaces discarded.
    pub(crate) fn rollback_namespaces(&mut self) -> usize {
        let mut doomed = Vec::new();
        for id in self.walk(View::Committed) {
            if let Some(ns) = self.get_mut(id) {
                doomed.extend(ns.pending_children.drain().map(|(_, kid)| kid));
            }
        }
        let mut discarded = 0;
        for top in doomed {
            for id in self.walk_from(top, View::Parse) {
                if self.release(id).is_some() {
                    discarded += 1;
                }
            }
        }
        discarded
    }

    /// Detach and free a committed child subtree.
    ///
    /// Returns the number of namespaces freed.
    pub(crate) fn remove_child(&mut self, parent: NamespaceId, name: &str) -> usize {
        let Some(kid) = self.get_mut(parent).and_then(|p| p.children.remove(name)) else {
            return 0;
        };
        let mut freed = 0;
        for id in self.walk_from(kid, View::Parse) {
            if self.release(id).is_some() {
                freed += 1;
            }
        }
        freed
    }

    /// Build a tree with the same ids as this one, keeping only the
    /// namespaces `keep` accepts (the root is always kept; a rejected
    /// namespace drops its whole subtree). Kept nodes start with empty
    /// tables; the caller copies symbols.
    pub(crate) fn filtered_shells(&self, mut keep: impl FnMut(&Namespace) -> bool) -> Self {
        let mut slots: Vec<Slot> = self
            .slots
            .iter()
            .map(|s| Slot {
                generation: s.generation,
                node: None,
            })
            .collect();

        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(ns) = self.get(id) else {
                continue;
            };
            if id != self.root && !keep(ns) {
                continue;
            }
            slots[id.index()].node = Some(ns.shell());
            stack.extend(ns.children.values().copied());
        }

        // Wire up committed child maps among the kept nodes.
        for id in self.walk(View::Committed) {
            let Some(ns) = self.get(id) else {
                continue;
            };
            if slots[id.index()].node.is_none() {
                continue;
            }
            let kept: Vec<(String, NamespaceId)> = ns
                .children
                .iter()
                .filter(|(_, kid)| slots[kid.index()].node.is_some())
                .map(|(name, kid)| (name.clone(), *kid))
                .collect();
            if let Some(node) = slots[id.index()].node.as_mut() {
                node.children.extend(kept);
            }
        }

        let free = slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.node.is_none())
            .map(|(i, _)| i as u32)
            .collect();
        Self {
            slots,
            free,
            root: self.root,
        }
    }

    /// Reset to a tree holding only an empty root.
    ///
    /// Root flags and class handler are kept; everything else is dropped.
    pub fn purge(&mut self) {
        for slot in self.slots.iter_mut().skip(1) {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free = (1..self.slots.len() as u32).rev().collect();
        if let Some(root) = self.get_mut(self.root) {
            root.purge();
        }
    }

    /// Tables of `id` for symbol kind `T`.
    #[must_use]
    pub fn table<T: Symbol>(&self, id: NamespaceId) -> Option<&crate::table::SymbolTable<T>> {
        self.get(id).map(T::table)
    }
}

/// Iterator over a namespace and its ancestors, innermost first.
pub struct Ancestors<'a> {
    tree: &'a NamespaceTree,
    next: Option<NamespaceId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NamespaceId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(Namespace::parent);
        Some(current)
    }
}
