// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Flattened name indexes for unqualified lookup.
//!
//! The root index maps a bare name straight to the namespace that owns the
//! winning declaration, one map per symbol kind, so unqualified lookup does
//! not walk the tree. Like the symbol tables it keeps committed and pending
//! maps apart.
//!
//! Winner rule: the shallower namespace wins; at equal depth the newer
//! declaration (higher serial) wins. Pending declarations carry higher
//! serials than committed ones, except overloads of a committed function,
//! which reuse its serial. So the same entry wins before and after a commit,
//! and [`RootIndex::rebuild_all`] reproduces incremental results.

use std::collections::HashMap;

use crate::namespace::{NamespaceTree, View};
use crate::symbol::{Class, Constant, Function, GlobalVar, HashDecl, Symbol};
use crate::types::NamespaceId;

/// Where the current winner for a name lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Owning namespace.
    pub namespace: NamespaceId,
    /// Depth of the owning namespace when the entry was recorded.
    pub depth: u32,
    /// Declaration serial of the symbol.
    pub serial: u64,
}

impl IndexEntry {
    /// Create an entry.
    #[must_use]
    pub const fn new(namespace: NamespaceId, depth: u32, serial: u64) -> Self {
        Self {
            namespace,
            depth,
            serial,
        }
    }

    /// True if `self` shadows `other`.
    #[must_use]
    pub const fn beats(&self, other: &Self) -> bool {
        self.depth < other.depth || (self.depth == other.depth && self.serial > other.serial)
    }
}

fn insert_winner(map: &mut HashMap<String, IndexEntry>, name: &str, entry: IndexEntry) {
    match map.get_mut(name) {
        Some(current) => {
            if entry.beats(current) {
                *current = entry;
            }
        }
        None => {
            map.insert(name.to_owned(), entry);
        }
    }
}

/// Committed and pending winners for one symbol kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KindIndex {
    committed: HashMap<String, IndexEntry>,
    pending: HashMap<String, IndexEntry>,
}

impl KindIndex {
    /// Record a committed declaration, keeping whichever entry wins.
    pub fn insert_committed(&mut self, name: &str, entry: IndexEntry) {
        insert_winner(&mut self.committed, name, entry);
    }

    /// Record a pending declaration, keeping whichever entry wins.
    pub fn insert_pending(&mut self, name: &str, entry: IndexEntry) {
        insert_winner(&mut self.pending, name, entry);
    }

    /// The winning entry for `name` in `view`.
    #[must_use]
    pub fn lookup(&self, name: &str, view: View) -> Option<IndexEntry> {
        let committed = self.committed.get(name).copied();
        if view == View::Committed {
            return committed;
        }
        match (committed, self.pending.get(name).copied()) {
            (Some(c), Some(p)) => Some(if p.beats(&c) { p } else { c }),
            (c, p) => c.or(p),
        }
    }

    /// Fold the pending map into the committed map.
    pub fn commit(&mut self) {
        for (name, entry) in self.pending.drain() {
            insert_winner(&mut self.committed, &name, entry);
        }
    }

    /// Discard the pending map.
    pub fn rollback(&mut self) {
        self.pending.clear();
    }

    /// Drop both maps.
    pub fn clear(&mut self) {
        self.committed.clear();
        self.pending.clear();
    }

    /// Number of committed names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    /// True if no committed name is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

/// Namespace name to every namespace carrying that name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceIndex {
    committed: HashMap<String, Vec<NamespaceId>>,
    pending: HashMap<String, Vec<NamespaceId>>,
}

impl NamespaceIndex {
    /// Record a committed namespace. Committed ids are kept sorted.
    pub fn insert_committed(&mut self, name: &str, id: NamespaceId) {
        let ids = self.committed.entry(name.to_owned()).or_default();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
    }

    /// Record a pending namespace.
    pub fn insert_pending(&mut self, name: &str, id: NamespaceId) {
        self.pending.entry(name.to_owned()).or_default().push(id);
    }

    /// Namespaces named `name` visible in `view`, committed ones first.
    #[must_use]
    pub fn lookup(&self, name: &str, view: View) -> Vec<NamespaceId> {
        let mut ids = self.committed.get(name).cloned().unwrap_or_default();
        if view == View::Parse {
            ids.extend(self.pending.get(name).into_iter().flatten().copied());
        }
        ids
    }

    fn commit(&mut self) {
        let pending: Vec<(String, Vec<NamespaceId>)> = self.pending.drain().collect();
        for (name, ids) in pending {
            for id in ids {
                self.insert_committed(&name, id);
            }
        }
    }

    fn rollback(&mut self) {
        self.pending.clear();
    }

    fn clear(&mut self) {
        self.committed.clear();
        self.pending.clear();
    }
}

/// The flattened indexes of one program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RootIndex {
    pub(crate) functions: KindIndex,
    pub(crate) classes: KindIndex,
    pub(crate) hashdecls: KindIndex,
    pub(crate) globals: KindIndex,
    pub(crate) constants: KindIndex,
    pub(crate) namespaces: NamespaceIndex,
}

impl RootIndex {
    /// Create empty indexes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of symbol kind `T`.
    #[must_use]
    pub fn kind<T: Symbol>(&self) -> &KindIndex {
        T::index(self)
    }

    /// The namespace-name index.
    #[must_use]
    pub const fn namespaces(&self) -> &NamespaceIndex {
        &self.namespaces
    }

    /// Fold every pending map into its committed map.
    pub fn commit(&mut self) {
        self.functions.commit();
        self.classes.commit();
        self.hashdecls.commit();
        self.globals.commit();
        self.constants.commit();
        self.namespaces.commit();
    }

    /// Discard every pending map.
    pub fn rollback(&mut self) {
        self.functions.rollback();
        self.classes.rollback();
        self.hashdecls.rollback();
        self.globals.rollback();
        self.constants.rollback();
        self.namespaces.rollback();
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.functions.clear();
        self.classes.clear();
        self.hashdecls.clear();
        self.globals.clear();
        self.constants.clear();
        self.namespaces.clear();
    }

    /// Recompute the committed maps from a walk of the committed tree.
    ///
    /// Needed after merges and unmerges, where spliced namespaces change
    /// depth and therefore shadowing outcomes.
    pub fn rebuild_all(&mut self, tree: &NamespaceTree) {
        self.clear();
        for id in tree.walk(View::Committed) {
            let Some(ns) = tree.get(id) else {
                continue;
            };
            if !ns.is_root() {
                self.namespaces.insert_committed(ns.name(), id);
            }
            self.index_table::<Function>(tree, id);
            self.index_table::<Class>(tree, id);
            self.index_table::<HashDecl>(tree, id);
            self.index_table::<GlobalVar>(tree, id);
            self.index_table::<Constant>(tree, id);
        }
        tracing::debug!(
            functions = self.functions.len(),
            classes = self.classes.len(),
            hashdecls = self.hashdecls.len(),
            globals = self.globals.len(),
            constants = self.constants.len(),
            "rebuilt root index"
        );
    }

    fn index_table<T: Symbol>(&mut self, tree: &NamespaceTree, id: NamespaceId) {
        let Some(ns) = tree.get(id) else {
            return;
        };
        let depth = ns.depth();
        let index = T::index_mut(self);
        for (name, entry) in T::table(ns).committed() {
            index.insert_committed(name, IndexEntry::new(id, depth, entry.serial));
        }
    }
}
