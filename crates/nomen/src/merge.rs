// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Module merge and unmerge.
//!
//! A module is a separately parsed program. Merging copies its public
//! namespaces and symbols into a target program in two passes:
//!
//! 1. [`ModuleMerger::scan`] walks the source and checks every would-be
//!    addition against the target without touching it.
//! 2. [`ModuleMerger::apply`] copies, and only runs when the scan found no
//!    collisions. Either the whole public surface lands or nothing does.
//!
//! After copying, depths are fixed up and the root index is rebuilt, since
//! spliced namespaces usually sit at a different depth than in the source.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Diagnostics, Error};
use crate::name_scope::NAMESPACE_SEPARATOR;
use crate::namespace::{Namespace, NamespaceTree, View};
use crate::program::Program;
use crate::symbol::{Class, Constant, Function, GlobalVar, HashDecl, Symbol, SymbolKind};
use crate::table::Entry;
use crate::types::{ModuleId, NamespaceId, flags};

/// A separately parsed program that can be merged into others.
#[derive(Debug)]
pub struct Module {
    id: ModuleId,
    name: String,
    program: Program,
}

impl Module {
    /// Wrap a program as a module.
    #[must_use]
    pub fn new(id: ModuleId, name: impl Into<String>, program: Program) -> Self {
        Self {
            id,
            name: name.into(),
            program,
        }
    }

    /// The module id recorded as origin of everything it contributes.
    #[must_use]
    pub const fn id(&self) -> ModuleId {
        self.id
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module's own program.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }
}

/// Which part of the source a merge takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeFilter {
    /// Public namespaces and public symbols.
    Public,
    /// Builtin symbols, with whatever namespaces lead to them.
    Builtin,
}

impl MergeFilter {
    const fn selects(self, symbol_flags: u32) -> bool {
        match self {
            Self::Public => flags::has(symbol_flags, flags::PUBLIC),
            Self::Builtin => flags::has(symbol_flags, flags::BUILTIN),
        }
    }
}

/// One namespace or symbol a merge would add.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Addition {
    /// What is added.
    pub kind: SymbolKind,
    /// Qualified path in the target.
    pub path: String,
}

/// Result of the dry-run pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergePlan {
    additions: Vec<Addition>,
    skipped: usize,
    collisions: Vec<Error>,
}

impl MergePlan {
    /// Everything the copy pass would add.
    #[must_use]
    pub fn additions(&self) -> &[Addition] {
        &self.additions
    }

    /// Symbols already present from the same module or the same builtin.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Collisions that block the merge.
    #[must_use]
    pub fn collisions(&self) -> &[Error] {
        &self.collisions
    }

    /// True if the copy pass may run.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.collisions.is_empty()
    }

    /// The plan if clean, otherwise its collisions.
    pub fn into_result(self) -> Result<Self, Diagnostics> {
        if self.is_clean() {
            return Ok(self);
        }
        let mut diagnostics = Diagnostics::new();
        for collision in self.collisions {
            diagnostics.push(collision);
        }
        Err(diagnostics)
    }
}

/// What the copy pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Namespaces created in the target.
    pub namespaces: usize,
    /// Symbols copied into the target.
    pub symbols: usize,
    /// Symbols skipped because the target already had them.
    pub skipped: usize,
}

/// Where a source namespace lands in the target.
#[derive(Clone, Debug)]
enum Place {
    /// An existing target namespace.
    Existing(NamespaceId),
    /// A namespace the merge would create, by qualified path.
    New(String),
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_owned()
    } else {
        format!("{path}{NAMESPACE_SEPARATOR}{name}")
    }
}

/// Merges one source program into targets.
#[derive(Debug)]
pub struct ModuleMerger<'a> {
    source: &'a Program,
    origin: Option<ModuleId>,
    filter: MergeFilter,
    included: HashSet<NamespaceId>,
}

impl<'a> ModuleMerger<'a> {
    /// Merge the public surface of `module`, recording it as origin.
    #[must_use]
    pub fn public(module: &'a Module) -> Self {
        Self::new(module.program(), Some(module.id()), MergeFilter::Public)
    }

    /// Merge the builtin symbols of `source`.
    #[must_use]
    pub fn builtins(source: &'a Program) -> Self {
        Self::new(source, None, MergeFilter::Builtin)
    }

    /// Create a merger with an explicit filter.
    #[must_use]
    pub fn new(source: &'a Program, origin: Option<ModuleId>, filter: MergeFilter) -> Self {
        let included = included_namespaces(source.tree(), filter);
        Self {
            source,
            origin,
            filter,
            included,
        }
    }

    /// Source namespaces in pre-order, restricted to the included ones.
    fn source_order(&self) -> Vec<NamespaceId> {
        self.source
            .tree()
            .walk(View::Committed)
            .into_iter()
            .filter(|id| self.included.contains(id))
            .collect()
    }

    /// True if a target entry makes copying `incoming` unnecessary.
    fn already_present<T: Symbol>(&self, existing: &Entry<T>, incoming: &Entry<T>) -> bool {
        let same_module = self.origin.is_some() && existing.origin == self.origin;
        let same_builtin = flags::has(existing.symbol.flags(), flags::BUILTIN)
            && flags::has(incoming.symbol.flags(), flags::BUILTIN);
        same_module || same_builtin || Arc::ptr_eq(&existing.symbol, &incoming.symbol)
    }

    // =========================================================================
    // Scan
    // =========================================================================

    /// Dry run: list additions and collisions without touching `target`.
    #[must_use]
    pub fn scan(&self, target: &Program, at: NamespaceId) -> MergePlan {
        let mut plan = MergePlan::default();
        let tree = target.tree();
        if !tree.contains(at) {
            plan.collisions.push(Error::NotFound {
                kind: SymbolKind::Namespace,
                name: at.to_string(),
            });
            return plan;
        }

        let source = self.source.tree();
        let mut places: Vec<(NamespaceId, Place)> = Vec::new();
        for src_id in self.source_order() {
            let Some(src) = source.get(src_id) else {
                continue;
            };
            let place = if src.is_root() {
                Place::Existing(at)
            } else {
                let parent = src
                    .parent()
                    .and_then(|p| places.iter().find(|(id, _)| *id == p))
                    .map(|(_, place)| place.clone());
                let Some(parent) = parent else {
                    continue;
                };
                match self.scan_namespace(tree, src, &parent, &mut plan) {
                    Some(place) => place,
                    None => continue,
                }
            };
            self.scan_kind::<Function>(tree, src, &place, &mut plan);
            self.scan_kind::<Class>(tree, src, &place, &mut plan);
            self.scan_kind::<HashDecl>(tree, src, &place, &mut plan);
            self.scan_kind::<GlobalVar>(tree, src, &place, &mut plan);
            self.scan_kind::<Constant>(tree, src, &place, &mut plan);
            places.push((src_id, place));
        }
        tracing::debug!(
            additions = plan.additions.len(),
            collisions = plan.collisions.len(),
            skipped = plan.skipped,
            "scanned merge"
        );
        plan
    }

    fn scan_namespace(
        &self,
        tree: &NamespaceTree,
        src: &Namespace,
        parent: &Place,
        plan: &mut MergePlan,
    ) -> Option<Place> {
        let name = src.name();
        match parent {
            Place::New(path) => {
                let path = join(path, name);
                plan.additions.push(Addition {
                    kind: SymbolKind::Namespace,
                    path: path.clone(),
                });
                Some(Place::New(path))
            }
            Place::Existing(parent) => {
                if let Some(child) = tree.child(*parent, name, View::Committed) {
                    return Some(Place::Existing(child));
                }
                if let Some((existing, _)) = tree.type_like_occupant(*parent, name, View::Committed) {
                    plan.collisions.push(Error::MergeCollision {
                        kind: SymbolKind::Namespace,
                        existing,
                        name: name.to_owned(),
                        namespace: tree.get_path(*parent, true),
                    });
                    return None;
                }
                let path = tree.qualify(*parent, name);
                plan.additions.push(Addition {
                    kind: SymbolKind::Namespace,
                    path: path.clone(),
                });
                Some(Place::New(path))
            }
        }
    }

    fn scan_kind<T: Symbol>(
        &self,
        tree: &NamespaceTree,
        src: &Namespace,
        place: &Place,
        plan: &mut MergePlan,
    ) {
        for (name, entry) in sorted_entries::<T>(src) {
            if !self.filter.selects(entry.symbol.flags()) {
                continue;
            }
            let ns = match place {
                Place::New(path) => {
                    plan.additions.push(Addition {
                        kind: T::KIND,
                        path: join(path, name),
                    });
                    continue;
                }
                Place::Existing(ns) => *ns,
            };
            let Some(target_ns) = tree.get(ns) else {
                continue;
            };
            if let Some(existing) = T::table(target_ns).find_committed(name) {
                if self.already_present(existing, entry) {
                    plan.skipped += 1;
                } else {
                    plan.collisions.push(Error::MergeCollision {
                        kind: T::KIND,
                        existing: T::KIND,
                        name: name.to_owned(),
                        namespace: tree.get_path(ns, true),
                    });
                }
                continue;
            }
            if T::KIND.is_type_like() {
                if let Some((existing, _)) = tree.type_like_occupant(ns, name, View::Committed) {
                    plan.collisions.push(Error::MergeCollision {
                        kind: T::KIND,
                        existing,
                        name: name.to_owned(),
                        namespace: tree.get_path(ns, true),
                    });
                    continue;
                }
            }
            plan.additions.push(Addition {
                kind: T::KIND,
                path: tree.qualify(ns, name),
            });
        }
    }

    // =========================================================================
    // Copy
    // =========================================================================

    /// Scan, then copy if the scan is clean.
    ///
    /// On collision the target is left untouched and the collisions are
    /// returned.
    pub fn apply(&self, target: &mut Program, at: NamespaceId) -> Result<MergeReport, Diagnostics> {
        let plan = self.scan(target, at).into_result()?;
        let mut report = MergeReport {
            skipped: plan.skipped(),
            ..MergeReport::default()
        };
        let mut failures = Diagnostics::new();

        let source = self.source.tree();
        let mut places: Vec<(NamespaceId, NamespaceId)> = Vec::new();
        for src_id in self.source_order() {
            let Some(src) = source.get(src_id) else {
                continue;
            };
            let to = if src.is_root() {
                at
            } else {
                let Some(&(_, parent)) = src
                    .parent()
                    .and_then(|p| places.iter().find(|(id, _)| *id == p))
                else {
                    continue;
                };
                match target.tree.child(parent, src.name(), View::Committed) {
                    Some(existing) => existing,
                    None => match self.create_namespace(target, parent, src) {
                        Some(created) => {
                            report.namespaces += 1;
                            created
                        }
                        None => continue,
                    },
                }
            };
            report.symbols += self.copy_kind::<Function>(target, src, to, &mut failures);
            report.symbols += self.copy_kind::<Class>(target, src, to, &mut failures);
            report.symbols += self.copy_kind::<HashDecl>(target, src, to, &mut failures);
            report.symbols += self.copy_kind::<GlobalVar>(target, src, to, &mut failures);
            report.symbols += self.copy_kind::<Constant>(target, src, to, &mut failures);
            places.push((src_id, to));
        }

        target.tree.fix_depths(at);
        target.index.rebuild_all(&target.tree);
        debug_assert!(
            failures.is_empty(),
            "copy pass hit collisions the scan did not report: {failures}"
        );
        tracing::debug!(
            origin = ?self.origin,
            namespaces = report.namespaces,
            symbols = report.symbols,
            skipped = report.skipped,
            "merged module"
        );
        failures.into_result(report)
    }

    fn create_namespace(
        &self,
        target: &mut Program,
        parent: NamespaceId,
        src: &Namespace,
    ) -> Option<NamespaceId> {
        let id = target.tree.create_child(
            parent,
            src.name(),
            src.flags() | flags::IMPORTED,
            src.location().clone(),
            true,
        )?;
        if let Some(ns) = target.tree.get_mut(id) {
            ns.set_origin(self.origin);
            if let Some(handler) = src.class_handler() {
                ns.set_class_handler(Some(Arc::clone(handler)));
            }
        }
        Some(id)
    }

    fn copy_kind<T: Symbol>(
        &self,
        target: &mut Program,
        src: &Namespace,
        to: NamespaceId,
        failures: &mut Diagnostics,
    ) -> usize {
        let mut copied = 0;
        for (name, entry) in sorted_entries::<T>(src) {
            if !self.filter.selects(entry.symbol.flags()) {
                continue;
            }
            let present = target
                .tree
                .get(to)
                .and_then(|ns| T::table(ns).find_committed(name))
                .is_some_and(|existing| self.already_present(existing, entry));
            if present {
                continue;
            }
            let serial = target.take_serial();
            let copy = Entry {
                symbol: Arc::clone(&entry.symbol),
                origin: self.origin.or(entry.origin),
                serial,
            };
            let path = target.tree.get_path(to, true);
            let Some(ns) = target.tree.get_mut(to) else {
                continue;
            };
            if T::table_mut(ns).add_committed(copy).is_ok() {
                copied += 1;
            } else {
                failures.push(Error::MergeCollision {
                    kind: T::KIND,
                    existing: T::KIND,
                    name: name.to_owned(),
                    namespace: path,
                });
            }
        }
        copied
    }
}

fn sorted_entries<T: Symbol>(ns: &Namespace) -> Vec<(&str, &Entry<T>)> {
    let mut entries: Vec<(&str, &Entry<T>)> = T::table(ns).committed().collect();
    entries.sort_unstable_by_key(|&(name, _)| name);
    entries
}

fn has_selected<T: Symbol>(ns: &Namespace, filter: MergeFilter) -> bool {
    T::table(ns)
        .committed()
        .any(|(_, entry)| filter.selects(entry.symbol.flags()))
}

/// Source namespaces a merge descends into.
///
/// Public merges follow public namespaces from the root. Builtin merges
/// take every namespace with a builtin symbol somewhere below it.
fn included_namespaces(tree: &NamespaceTree, filter: MergeFilter) -> HashSet<NamespaceId> {
    let order = tree.walk(View::Committed);
    let mut included = HashSet::new();
    match filter {
        MergeFilter::Public => {
            for id in order {
                let Some(ns) = tree.get(id) else {
                    continue;
                };
                let parent_in = ns.parent().is_none_or(|p| included.contains(&p));
                if ns.is_root() || (parent_in && ns.is_public()) {
                    included.insert(id);
                }
            }
        }
        MergeFilter::Builtin => {
            for &id in order.iter().rev() {
                let Some(ns) = tree.get(id) else {
                    continue;
                };
                let own = has_selected::<Function>(ns, filter)
                    || has_selected::<Class>(ns, filter)
                    || has_selected::<HashDecl>(ns, filter)
                    || has_selected::<GlobalVar>(ns, filter)
                    || has_selected::<Constant>(ns, filter);
                let below = ns
                    .children(View::Committed)
                    .any(|(_, child)| included.contains(&child));
                if ns.is_root() || own || below {
                    included.insert(id);
                }
            }
        }
    }
    included
}

impl Program {
    /// Merge the public surface of `module` into this program's root.
    ///
    /// Re-merging the same module skips what it already contributed.
    pub fn merge_public_from(&mut self, module: &Module) -> Result<MergeReport, Diagnostics> {
        let root = self.root();
        ModuleMerger::public(module).apply(self, root)
    }

    /// Copy the builtin symbols of `source` below `target_ns`.
    pub fn import_system_symbols(
        &mut self,
        source: &Self,
        target_ns: NamespaceId,
    ) -> Result<MergeReport, Diagnostics> {
        ModuleMerger::builtins(source).apply(self, target_ns)
    }

    /// Remove everything `module` contributed.
    ///
    /// Symbols whose origin is the module are dropped, then namespaces the
    /// module created that are left empty. Returns the number of symbols
    /// removed.
    pub fn unmerge_module(&mut self, module: ModuleId) -> usize {
        let order = self.tree.walk(View::Committed);
        let mut symbols = 0;
        for &id in &order {
            if let Some(ns) = self.tree.get_mut(id) {
                symbols += remove_origin::<Function>(ns, module)
                    + remove_origin::<Class>(ns, module)
                    + remove_origin::<HashDecl>(ns, module)
                    + remove_origin::<GlobalVar>(ns, module)
                    + remove_origin::<Constant>(ns, module);
            }
        }

        // Children come after their parent in pre-order, so walking
        // backwards empties subtrees bottom-up.
        let mut namespaces = 0;
        for &id in order.iter().rev() {
            let Some(ns) = self.tree.get(id) else {
                continue;
            };
            if ns.origin() != Some(module) || !ns.is_empty() {
                continue;
            }
            if let Some(parent) = ns.parent() {
                let name = ns.name().to_owned();
                namespaces += self.tree.remove_child(parent, &name);
            }
        }

        self.index.rebuild_all(&self.tree);
        let tree = &self.tree;
        self.classes.retain(|(owner, _), _| tree.contains(*owner));
        tracing::debug!(%module, symbols, namespaces, "unmerged module");
        symbols
    }
}

fn remove_origin<T: Symbol>(ns: &mut Namespace, module: ModuleId) -> usize {
    T::table_mut(ns).retain_committed(|entry| entry.origin != Some(module))
}
