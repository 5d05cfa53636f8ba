// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The program: one namespace tree with its root index.
//!
//! A `Program` owns all name state of one interpreter instance. Parse units
//! are opened with [`Program::begin_parse`]; runtime lookups go through the
//! `resolve_*` methods, which only ever see committed state.

#[cfg(test)]
mod parse_test;
#[cfg(test)]
mod shared_test;

mod copy;
mod parse;
mod shared;

pub use parse::{CommitSummary, ParseUnit};
pub use shared::{SharedParseUnit, SharedProgram};

use std::sync::Arc;

use crate::config::ProgramConfig;
use crate::error::Error;
use crate::handler::ClassHandler;
use crate::index::RootIndex;
use crate::name_scope::NameScope;
use crate::namespace::{Namespace, NamespaceTree, View};
use crate::resolve::{ClassCache, Resolved, Resolver};
use crate::symbol::{
    Class, ConstExpr, Constant, Function, GlobalVar, HashDecl, Symbol, SymbolKind,
};
use crate::table::SymbolTable;
use crate::types::NamespaceId;

/// One line of a [`Program::snapshot`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotEntry {
    /// Fully qualified path.
    pub path: String,
    /// What the path denotes.
    pub kind: SymbolKind,
    /// Depth of the namespace (for symbols: of the owning namespace).
    pub depth: u32,
    /// Kind-specific detail (function signatures, constant values).
    pub detail: String,
}

/// Name state of one interpreter instance.
pub struct Program {
    pub(crate) tree: NamespaceTree,
    pub(crate) index: RootIndex,
    config: ProgramConfig,
    pub(crate) next_serial: u64,
    pub(crate) classes: ClassCache,
}

impl Default for Program {
    fn default() -> Self {
        Self::new(ProgramConfig::default())
    }
}

impl Program {
    /// Create an empty program.
    #[must_use]
    pub fn new(config: ProgramConfig) -> Self {
        Self {
            tree: NamespaceTree::new(),
            index: RootIndex::new(),
            config,
            next_serial: 0,
            classes: ClassCache::new(),
        }
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// The namespace tree.
    #[must_use]
    pub const fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    /// The root index.
    #[must_use]
    pub const fn index(&self) -> &RootIndex {
        &self.index
    }

    /// Id of the root namespace.
    #[must_use]
    pub const fn root(&self) -> NamespaceId {
        self.tree.root()
    }

    /// Look up a namespace node.
    #[must_use]
    pub fn namespace(&self, id: NamespaceId) -> Option<&Namespace> {
        self.tree.get(id)
    }

    /// Qualified path of a namespace.
    #[must_use]
    pub fn get_path(&self, id: NamespaceId, anchored: bool) -> String {
        self.tree.get_path(id, anchored)
    }

    /// Give up the program, keeping its tree for [`ParseUnit::assimilate`].
    #[must_use]
    pub fn into_tree(self) -> NamespaceTree {
        self.tree
    }

    pub(crate) const fn resolver(&self, view: View) -> Resolver<'_> {
        Resolver::new(&self.tree, &self.index, &self.config, &self.classes, view)
    }

    pub(crate) const fn take_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// Open a parse unit. The exclusive borrow serializes parse units.
    pub fn begin_parse(&mut self) -> ParseUnit<'_> {
        ParseUnit::new(self)
    }

    /// Resolve a committed namespace by (possibly qualified) name.
    pub fn find_namespace(&self, name: &str) -> Result<NamespaceId, Error> {
        let scope = NameScope::parse(name)?;
        self.resolver(View::Committed).namespace(&scope)
    }

    /// Resolve a committed symbol of kind `T`.
    ///
    /// Class handlers are not consulted; use [`Program::resolve_class`].
    pub fn resolve<T: Symbol>(&self, name: &str) -> Result<Resolved<T>, Error> {
        self.resolve_in(None, name)
    }

    /// Resolve a committed symbol of kind `T` as seen from `context`.
    pub fn resolve_in<T: Symbol>(
        &self,
        context: Option<NamespaceId>,
        name: &str,
    ) -> Result<Resolved<T>, Error> {
        let scope = NameScope::parse(name)?;
        self.resolver(View::Committed)
            .with_context(context)
            .resolve(&scope)
    }

    /// Resolve a function.
    pub fn resolve_function(&self, name: &str) -> Result<Resolved<Function>, Error> {
        self.resolve(name)
    }

    /// Resolve a class, falling back to class handlers.
    pub fn resolve_class(&self, name: &str) -> Result<Resolved<Class>, Error> {
        let scope = NameScope::parse(name)?;
        self.resolver(View::Committed).resolve_class(&scope)
    }

    /// Resolve a hashdecl.
    pub fn resolve_hashdecl(&self, name: &str) -> Result<Resolved<HashDecl>, Error> {
        self.resolve(name)
    }

    /// Resolve a global variable.
    pub fn resolve_global_var(&self, name: &str) -> Result<Resolved<GlobalVar>, Error> {
        self.resolve(name)
    }

    /// Resolve a constant.
    pub fn resolve_constant(&self, name: &str) -> Result<Resolved<Constant>, Error> {
        self.resolve(name)
    }

    /// Resolve a constant and return its expanded value.
    pub fn constant_value(&self, name: &str) -> Result<ConstExpr, Error> {
        let resolver = self.resolver(View::Committed);
        let constant = resolver.resolve::<Constant>(&NameScope::parse(name)?)?;
        resolver.constant_value(&constant)
    }

    /// Install a class handler on a namespace, replacing any previous one.
    ///
    /// Classes cached from the previous handler are dropped. Returns `false`
    /// if `ns` does not exist.
    pub fn register_class_handler(
        &mut self,
        ns: NamespaceId,
        handler: impl ClassHandler + 'static,
    ) -> bool {
        let Some(node) = self.tree.get_mut(ns) else {
            return false;
        };
        node.set_class_handler(Some(Arc::new(handler)));
        self.classes.retain(|(owner, _), _| *owner != ns);
        tracing::debug!(namespace = %self.tree.get_path(ns, true), "registered class handler");
        true
    }

    /// Remove the class handler of a namespace.
    pub fn clear_class_handler(&mut self, ns: NamespaceId) -> bool {
        let Some(node) = self.tree.get_mut(ns) else {
            return false;
        };
        node.set_class_handler(None);
        self.classes.retain(|(owner, _), _| *owner != ns);
        true
    }

    /// Tear down all name state. The program is empty afterwards.
    pub fn purge(&mut self) {
        self.tree.purge();
        self.index.clear();
        self.classes.clear();
        self.next_serial = 0;
        tracing::debug!("purged program");
    }

    /// Sorted listing of every committed namespace and symbol.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SnapshotEntry> {
        let mut entries = Vec::new();
        for id in self.tree.walk(View::Committed) {
            let Some(ns) = self.tree.get(id) else {
                continue;
            };
            if !ns.is_root() {
                entries.push(SnapshotEntry {
                    path: self.tree.get_path(id, false),
                    kind: SymbolKind::Namespace,
                    depth: ns.depth(),
                    detail: String::new(),
                });
            }
            self.snapshot_kind::<Function>(id, &mut entries, |f| {
                f.variants
                    .iter()
                    .map(|v| v.signature())
                    .collect::<Vec<_>>()
                    .join(" ")
            });
            self.snapshot_kind::<Class>(id, &mut entries, |_| String::new());
            self.snapshot_kind::<HashDecl>(id, &mut entries, |h| {
                h.fields
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            });
            self.snapshot_kind::<GlobalVar>(id, &mut entries, |_| String::new());
            self.snapshot_kind::<Constant>(id, &mut entries, |c| c.expr.to_string());
        }
        entries.sort();
        entries
    }

    fn snapshot_kind<T: Symbol>(
        &self,
        id: NamespaceId,
        out: &mut Vec<SnapshotEntry>,
        detail: impl Fn(&T) -> String,
    ) {
        let Some(ns) = self.tree.get(id) else {
            return;
        };
        for (name, entry) in T::table(ns).committed() {
            out.push(SnapshotEntry {
                path: self.tree.qualify(id, name),
                kind: T::KIND,
                depth: ns.depth(),
                detail: detail(entry.symbol.as_ref()),
            });
        }
    }

    /// Discard all pending state and restore the serial counter.
    pub(crate) fn rollback_pending(&mut self, serial_mark: u64) -> usize {
        let mut discarded = 0;
        for id in self.tree.walk(View::Committed) {
            if let Some(ns) = self.tree.get_mut(id) {
                discarded += ns.rollback_tables();
            }
        }
        let namespaces = self.tree.rollback_namespaces();
        self.index.rollback();
        self.next_serial = serial_mark;
        let tree = &self.tree;
        self.classes.retain(|(owner, _), _| tree.contains(*owner));
        tracing::debug!(symbols = discarded, namespaces, "rolled back parse unit");
        discarded
    }

    /// Move all pending state into committed state.
    ///
    /// Returns the number of symbols committed and the names that could not
    /// be folded into an existing committed symbol.
    pub(crate) fn commit_pending(&mut self) -> (CommitSummary, Vec<Error>) {
        let mut summary = CommitSummary::default();
        let mut failures = Vec::new();
        for id in self.tree.walk(View::Parse) {
            let path = self.tree.get_path(id, true);
            let Some(ns) = self.tree.get_mut(id) else {
                continue;
            };
            let failed = &mut failures;
            summary.symbols += commit_table(&mut ns.functions, &path, failed)
                + commit_table(&mut ns.classes, &path, failed)
                + commit_table(&mut ns.hashdecls, &path, failed)
                + commit_table(&mut ns.globals, &path, failed)
                + commit_table(&mut ns.constants, &path, failed);
        }
        summary.namespaces = self.tree.commit_namespaces().len();
        // Publish the index last so readers never see committed tables
        // without their index entries.
        self.index.commit();
        tracing::debug!(
            symbols = summary.symbols,
            namespaces = summary.namespaces,
            "committed parse unit"
        );
        (summary, failures)
    }
}

fn commit_table<T: Symbol>(
    table: &mut SymbolTable<T>,
    path: &str,
    failures: &mut Vec<Error>,
) -> usize {
    match table.parse_commit() {
        Ok(count) => count,
        Err(conflicts) => {
            let kind = T::KIND;
            for conflict in conflicts {
                tracing::error!(%kind, name = %conflict.name, namespace = path, "commit conflict");
                failures.push(Error::InternalConsistency {
                    detail: format!(
                        "{kind} '{}' in '{path}' was committed twice",
                        conflict.name
                    ),
                });
            }
            0
        }
    }
}

impl core::fmt::Debug for Program {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Program")
            .field("namespaces", &self.tree.len())
            .field("next_serial", &self.next_serial)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
