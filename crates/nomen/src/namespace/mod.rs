// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Namespace nodes.
//!
//! A namespace owns one two-phase [`SymbolTable`] per symbol kind and two
//! child maps (committed and pending). Nodes live in a [`NamespaceTree`]
//! arena; the parent link is an id used for lookups only, never ownership.


mod tree;

pub use tree::{Ancestors, NamespaceTree};

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::ClassHandler;
use crate::symbol::{Class, Constant, Function, GlobalVar, HashDecl, Symbol};
use crate::table::{Entry, SymbolTable};
use crate::types::{ModuleId, NamespaceId, SourceLocation, flags};

/// Which phase of the symbol table a lookup may see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// Committed state only. Runtime resolution always uses this view.
    Committed,
    /// Pending and committed state, pending first. Used inside a parse unit.
    Parse,
}

/// A node of the namespace tree.
pub struct Namespace {
    name: String,
    depth: u32,
    parent: Option<NamespaceId>,
    flags: u32,
    origin: Option<ModuleId>,
    committed: bool,
    location: SourceLocation,
    class_handler: Option<Arc<dyn ClassHandler>>,
    pub(crate) functions: SymbolTable<Function>,
    pub(crate) classes: SymbolTable<Class>,
    pub(crate) hashdecls: SymbolTable<HashDecl>,
    pub(crate) globals: SymbolTable<GlobalVar>,
    pub(crate) constants: SymbolTable<Constant>,
    pub(crate) children: HashMap<String, NamespaceId>,
    pub(crate) pending_children: HashMap<String, NamespaceId>,
}

impl Namespace {
    /// The anonymous root namespace.
    pub(crate) fn root() -> Self {
        let mut ns = Self::new(String::new(), None, 0, flags::PUBLIC, SourceLocation::builtin());
        ns.committed = true;
        ns
    }

    pub(crate) fn new(
        name: String,
        parent: Option<NamespaceId>,
        depth: u32,
        flags: u32,
        location: SourceLocation,
    ) -> Self {
        Self {
            name,
            depth,
            parent,
            flags,
            origin: None,
            committed: false,
            location,
            class_handler: None,
            functions: SymbolTable::new(),
            classes: SymbolTable::new(),
            hashdecls: SymbolTable::new(),
            globals: SymbolTable::new(),
            constants: SymbolTable::new(),
            children: HashMap::new(),
            pending_children: HashMap::new(),
        }
    }

    /// Copy of this node's own attributes with empty tables and no children.
    pub(crate) fn shell(&self) -> Self {
        let mut ns = Self::new(
            self.name.clone(),
            self.parent,
            self.depth,
            self.flags,
            self.location.clone(),
        );
        ns.origin = self.origin;
        ns.committed = self.committed;
        ns.class_handler.clone_from(&self.class_handler);
        ns
    }

    /// Namespace name; empty for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distance from the root (root is 0).
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Parent namespace, `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<NamespaceId> {
        self.parent
    }

    /// Flag bits.
    #[must_use]
    pub const fn flags(&self) -> u32 {
        self.flags
    }

    /// True for the root namespace.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Visible to programs merging this one.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        flags::has(self.flags, flags::PUBLIC)
    }

    /// Registered by the system.
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        flags::has(self.flags, flags::BUILTIN)
    }

    /// Created by a merge or import.
    #[must_use]
    pub const fn is_imported(&self) -> bool {
        flags::has(self.flags, flags::IMPORTED)
    }

    /// False while the namespace itself is still a pending declaration.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Module that created this namespace through a merge.
    #[must_use]
    pub const fn origin(&self) -> Option<ModuleId> {
        self.origin
    }

    /// Where the namespace was first declared.
    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// The registered class handler, if any.
    #[must_use]
    pub fn class_handler(&self) -> Option<&Arc<dyn ClassHandler>> {
        self.class_handler.as_ref()
    }

    /// Look up a symbol in this namespace only, without recursion.
    ///
    /// In [`View::Parse`] a pending entry is preferred since it is newer.
    #[must_use]
    pub fn find_local<T: Symbol>(&self, name: &str, view: View) -> Option<&Entry<T>> {
        let table = T::table(self);
        match view {
            View::Committed => table.find_committed(name),
            View::Parse => table.find(name),
        }
    }

    /// Child namespace id by name.
    #[must_use]
    pub fn child(&self, name: &str, view: View) -> Option<NamespaceId> {
        match view {
            View::Committed => self.children.get(name).copied(),
            View::Parse => self
                .pending_children
                .get(name)
                .or_else(|| self.children.get(name))
                .copied(),
        }
    }

    /// Child namespaces visible in `view`.
    pub fn children(&self, view: View) -> impl Iterator<Item = (&str, NamespaceId)> {
        let pending = match view {
            View::Committed => None,
            View::Parse => Some(self.pending_children.iter()),
        };
        self.children
            .iter()
            .chain(pending.into_iter().flatten())
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// True if any table or child map has pending state.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending_children.is_empty()
            || self.functions.pending_len() > 0
            || self.classes.pending_len() > 0
            || self.hashdecls.pending_len() > 0
            || self.globals.pending_len() > 0
            || self.constants.pending_len() > 0
    }

    /// True if the namespace holds no committed symbols and no committed children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
            && self.functions.committed_len() == 0
            && self.classes.committed_len() == 0
            && self.hashdecls.committed_len() == 0
            && self.globals.committed_len() == 0
            && self.constants.committed_len() == 0
    }

    /// Number of committed symbols over all kinds.
    #[must_use]
    pub fn committed_symbol_count(&self) -> usize {
        self.functions.committed_len()
            + self.classes.committed_len()
            + self.hashdecls.committed_len()
            + self.globals.committed_len()
            + self.constants.committed_len()
    }

    /// Discard pending entries of every table. Returns the number discarded.
    pub(crate) fn rollback_tables(&mut self) -> usize {
        self.functions.parse_rollback()
            + self.classes.parse_rollback()
            + self.hashdecls.parse_rollback()
            + self.globals.parse_rollback()
            + self.constants.parse_rollback()
    }

    /// Reset all tables and child maps.
    pub(crate) fn purge(&mut self) {
        self.functions.purge();
        self.classes.purge();
        self.hashdecls.purge();
        self.globals.purge();
        self.constants.purge();
        self.children.clear();
        self.pending_children.clear();
    }

    pub(crate) const fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }

    pub(crate) const fn set_parent(&mut self, parent: Option<NamespaceId>) {
        self.parent = parent;
    }

    pub(crate) const fn set_origin(&mut self, origin: Option<ModuleId>) {
        self.origin = origin;
    }

    pub(crate) const fn set_committed(&mut self) {
        self.committed = true;
    }

    pub(crate) const fn add_flags(&mut self, bits: u32) {
        self.flags |= bits;
    }

    pub(crate) const fn set_flags(&mut self, bits: u32) {
        self.flags = bits;
    }

    pub(crate) fn set_class_handler(&mut self, handler: Option<Arc<dyn ClassHandler>>) {
        self.class_handler = handler;
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("depth", &self.depth)
            .field("parent", &self.parent)
            .field("flags", &self.flags)
            .field("committed", &self.committed)
            .field("class_handler", &self.class_handler.is_some())
            .field("children", &self.children)
            .field("pending_children", &self.pending_children)
            .finish_non_exhaustive()
    }
}
