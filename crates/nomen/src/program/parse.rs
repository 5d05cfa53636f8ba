// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Parse units: pending declarations with commit or rollback.
//!
//! Declarations go into the pending tables of their namespace and into the
//! pending maps of the root index. Errors are collected rather than returned
//! so one unit can report everything that is wrong with it. [`ParseUnit::finish`]
//! runs the second parse stage (type names, constant values) and then
//! commits, or rolls back if anything was reported.

use std::collections::HashMap;
use std::sync::Arc;

use super::Program;
use crate::error::{Diagnostics, Error};
use crate::index::IndexEntry;
use crate::name_scope::NameScope;
use crate::namespace::{Namespace, NamespaceTree, View};
use crate::resolve::{Resolved, Resolver};
use crate::symbol::{
    Class, Constant, Function, GlobalVar, HashDecl, ResolvedSignature, Symbol, SymbolKind,
};
use crate::table::Entry;
use crate::types::{ModuleId, NamespaceId, SourceLocation, flags};

/// What a successful commit published.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Symbols moved from pending to committed (absorbed overloads included).
    pub symbols: usize,
    /// Namespaces that became committed.
    pub namespaces: usize,
}

/// State of an open parse unit that survives releasing the program borrow.
#[derive(Debug, Default)]
pub(crate) struct ParseState {
    context: Vec<NamespaceId>,
    diagnostics: Diagnostics,
    serial_mark: u64,
    /// Committed namespaces made public by this unit, with their old flags.
    raised: Vec<(NamespaceId, u32)>,
}

impl ParseState {
    pub(crate) fn start(program: &Program) -> Self {
        Self {
            context: vec![program.root()],
            diagnostics: Diagnostics::new(),
            serial_mark: program.next_serial,
            raised: Vec::new(),
        }
    }

    pub(crate) const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// An open parse unit on a [`Program`].
///
/// Dropping an unfinished unit rolls it back.
pub struct ParseUnit<'p> {
    program: &'p mut Program,
    state: ParseState,
    open: bool,
}

impl<'p> ParseUnit<'p> {
    pub(crate) fn new(program: &'p mut Program) -> Self {
        let state = ParseState::start(program);
        tracing::trace!(serial = state.serial_mark, "opened parse unit");
        Self::resume(program, state)
    }

    pub(crate) fn resume(program: &'p mut Program, state: ParseState) -> Self {
        Self {
            program,
            state,
            open: true,
        }
    }

    /// Release the program borrow without committing or rolling back.
    pub(crate) fn suspend(mut self) -> ParseState {
        self.open = false;
        core::mem::take(&mut self.state)
    }

    /// The program being parsed into.
    #[must_use]
    pub fn program(&self) -> &Program {
        self.program
    }

    /// The current context namespace.
    #[must_use]
    pub fn context(&self) -> NamespaceId {
        self.state
            .context
            .last()
            .copied()
            .unwrap_or_else(|| self.program.root())
    }

    /// Errors reported so far.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.state.diagnostics
    }

    /// Record an error. The unit will roll back instead of committing.
    pub fn report(&mut self, error: Error) {
        tracing::debug!(%error, "parse unit error");
        self.state.diagnostics.push(error);
    }

    // =========================================================================
    // Namespaces
    // =========================================================================

    /// Walk `path` from `from`, creating missing namespaces as pending children.
    ///
    /// If `flags` carries PUBLIC, every namespace on the path ends up public,
    /// existing ones included. Fails if a segment names a class or hashdecl
    /// in its parent.
    pub fn find_create_namespace_path<S: AsRef<str>>(
        &mut self,
        from: NamespaceId,
        path: &[S],
        flags: u32,
        location: &SourceLocation,
    ) -> Result<NamespaceId, Error> {
        let mut current = from;
        for segment in path {
            let segment = segment.as_ref();
            if let Some(child) = self.program.tree.child(current, segment, View::Parse) {
                self.raise_public(child, flags);
                current = child;
                continue;
            }
            let tree = &self.program.tree;
            if let Some((existing, previous)) =
                tree.type_like_occupant(current, segment, View::Parse)
            {
                return Err(Error::DuplicateSymbol {
                    kind: SymbolKind::Namespace,
                    existing,
                    name: segment.to_owned(),
                    namespace: tree.get_path(current, true),
                    location: location.clone(),
                    previous,
                });
            }
            let child = self
                .program
                .tree
                .create_child(current, segment, flags, location.clone(), false)
                .ok_or_else(|| Error::InternalConsistency {
                    detail: format!("parent of namespace '{segment}' vanished"),
                })?;
            self.program.index.namespaces.insert_pending(segment, child);
            tracing::trace!(namespace = segment, id = %child, "declared pending namespace");
            current = child;
        }
        Ok(current)
    }

    /// Add PUBLIC to an existing namespace if `bits` carries it.
    ///
    /// Committed namespaces remember their old flags for rollback.
    fn raise_public(&mut self, id: NamespaceId, bits: u32) {
        if !flags::has(bits, flags::PUBLIC) {
            return;
        }
        let Some(ns) = self.program.tree.get_mut(id) else {
            return;
        };
        if ns.is_public() {
            return;
        }
        if ns.is_committed() {
            self.state.raised.push((id, ns.flags()));
        }
        ns.add_flags(flags::PUBLIC);
        tracing::trace!(namespace = ns.name(), id = %id, "raised namespace to public");
    }

    /// Declare a namespace (relative to the context unless anchored).
    ///
    /// Re-declaring an existing namespace is not an error.
    pub fn declare_namespace(
        &mut self,
        name: &str,
        flags: u32,
        location: SourceLocation,
    ) -> Option<NamespaceId> {
        let scope = match NameScope::parse(name) {
            Ok(scope) => scope,
            Err(e) => {
                self.report(e);
                return None;
            }
        };
        let base = if scope.is_anchored() {
            self.program.root()
        } else {
            self.context()
        };
        match self.find_create_namespace_path(base, scope.segments(), flags, &location) {
            Ok(ns) => Some(ns),
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    /// Declare a namespace and make it the context.
    pub fn enter_namespace(
        &mut self,
        name: &str,
        flags: u32,
        location: SourceLocation,
    ) -> Option<NamespaceId> {
        let ns = self.declare_namespace(name, flags, location)?;
        self.state.context.push(ns);
        Some(ns)
    }

    /// Leave the innermost entered namespace. The root is never left.
    pub fn leave_namespace(&mut self) -> Option<NamespaceId> {
        if self.state.context.len() <= 1 {
            return None;
        }
        self.state.context.pop()
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Declare a symbol.
    ///
    /// The symbol's name may be qualified (`A::B::f`); missing namespaces on
    /// the way are created. Errors are recorded in the unit's diagnostics.
    /// Returns the namespace the symbol landed in.
    pub fn declare<T: Symbol>(&mut self, mut symbol: T) -> Option<NamespaceId> {
        let scope = match NameScope::parse(symbol.name()) {
            Ok(scope) => scope,
            Err(e) => {
                self.report(e);
                return None;
            }
        };
        let base = if scope.is_anchored() {
            self.program.root()
        } else {
            self.context()
        };
        let location = symbol.location().clone();
        let ns_flags = symbol.flags() & flags::PUBLIC;
        let ns = match self.find_create_namespace_path(
            base,
            scope.namespace_path(),
            ns_flags,
            &location,
        ) {
            Ok(ns) => ns,
            Err(e) => {
                self.report(e);
                return None;
            }
        };
        symbol.set_name(scope.identifier().to_owned());
        match self.insert_pending(ns, symbol, None) {
            Ok(()) => Some(ns),
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    /// Declare a function or a further overload variant of it.
    pub fn declare_function(&mut self, function: Function) -> Option<NamespaceId> {
        self.declare(function)
    }

    /// Declare a class.
    pub fn declare_class(&mut self, class: Class) -> Option<NamespaceId> {
        self.declare(class)
    }

    /// Declare a hashdecl.
    pub fn declare_hashdecl(&mut self, hashdecl: HashDecl) -> Option<NamespaceId> {
        self.declare(hashdecl)
    }

    /// Declare a global variable.
    pub fn declare_global_var(&mut self, var: GlobalVar) -> Option<NamespaceId> {
        self.declare(var)
    }

    /// Declare a constant.
    pub fn declare_constant(&mut self, constant: Constant) -> Option<NamespaceId> {
        self.declare(constant)
    }

    fn insert_pending<T: Symbol>(
        &mut self,
        ns: NamespaceId,
        symbol: T,
        origin: Option<ModuleId>,
    ) -> Result<(), Error> {
        let tree = &self.program.tree;
        let node = tree.get(ns).ok_or_else(|| Error::InternalConsistency {
            detail: format!("namespace {ns} vanished during declaration"),
        })?;
        let name = symbol.name().to_owned();
        let location = symbol.location().clone();
        let namespace = tree.get_path(ns, true);
        let duplicate = |existing: SymbolKind, previous: &SourceLocation| Error::DuplicateSymbol {
            kind: T::KIND,
            existing,
            name: name.clone(),
            namespace: namespace.clone(),
            location: location.clone(),
            previous: previous.clone(),
        };

        if T::KIND.is_type_like() {
            if let Some((existing, previous)) = tree.type_like_occupant(ns, &name, View::Parse) {
                return Err(duplicate(existing, &previous));
            }
        }

        let table = T::table(node);
        let committed_serial = match table.find_committed(&name) {
            Some(committed) if committed.symbol.conflicts_with(&symbol) => {
                return Err(duplicate(T::KIND, committed.symbol.location()));
            }
            Some(committed) => Some(committed.serial),
            None => None,
        };
        if let Some(pending) = table.find_pending(&name) {
            if pending.symbol.conflicts_with(&symbol) {
                return Err(duplicate(T::KIND, pending.symbol.location()));
            }
            // Same unit, compatible overload: fold into the pending entry.
            let entry = self
                .program
                .tree
                .get_mut(ns)
                .and_then(|node| T::table_mut(node).pending_mut(&name))
                .ok_or_else(|| Error::InternalConsistency {
                    detail: format!("pending '{name}' vanished"),
                })?;
            return Arc::make_mut(&mut entry.symbol)
                .absorb(symbol)
                .map_err(|_| Error::InternalConsistency {
                    detail: format!("cannot fold overload of '{name}'"),
                });
        }

        let depth = node.depth();
        // An overload of a committed function keeps that function's age.
        let serial = committed_serial.unwrap_or_else(|| self.program.take_serial());
        let node = self
            .program
            .tree
            .get_mut(ns)
            .ok_or_else(|| Error::InternalConsistency {
                detail: format!("namespace {ns} vanished during declaration"),
            })?;
        T::table_mut(node)
            .add_pending(Entry::new(symbol, origin, serial))
            .map_err(|_| Error::InternalConsistency {
                detail: format!("'{name}' became pending twice"),
            })?;
        T::index_mut(&mut self.program.index)
            .insert_pending(&name, IndexEntry::new(ns, depth, serial));
        tracing::trace!(kind = %T::KIND, name = %name, namespace = %namespace, serial, "declared pending symbol");
        Ok(())
    }

    /// Move a detached tree into this unit below `at`.
    ///
    /// Every namespace and committed symbol of `source` becomes a pending
    /// declaration of this unit, checked for collisions like any other
    /// declaration. Returns the number of symbols taken over.
    pub fn assimilate(&mut self, at: NamespaceId, source: NamespaceTree) -> usize {
        let source = &source;
        let mut mapping: HashMap<NamespaceId, NamespaceId> = HashMap::new();
        let mut count = 0;
        for src_id in source.walk(View::Committed) {
            let Some(src) = source.get(src_id) else {
                continue;
            };
            let target = if src.is_root() {
                at
            } else {
                // Skip subtrees whose parent could not be placed.
                let Some(&parent) = src.parent().and_then(|p| mapping.get(&p)) else {
                    continue;
                };
                match self.find_create_namespace_path(
                    parent,
                    &[src.name()],
                    src.flags(),
                    src.location(),
                ) {
                    Ok(target) => target,
                    Err(e) => {
                        self.report(e);
                        continue;
                    }
                }
            };
            mapping.insert(src_id, target);

            if let Some(handler) = src.class_handler() {
                if let Some(node) = self.program.tree.get_mut(target) {
                    if !node.is_committed() && node.class_handler().is_none() {
                        node.set_class_handler(Some(Arc::clone(handler)));
                    }
                }
            }

            count += self.assimilate_kind::<Function>(src, target);
            count += self.assimilate_kind::<Class>(src, target);
            count += self.assimilate_kind::<HashDecl>(src, target);
            count += self.assimilate_kind::<GlobalVar>(src, target);
            count += self.assimilate_kind::<Constant>(src, target);
        }
        tracing::debug!(
            symbols = count,
            namespaces = mapping.len(),
            target = %self.program.tree.get_path(at, true),
            "assimilated detached tree"
        );
        count
    }

    fn assimilate_kind<T: Symbol>(&mut self, src: &Namespace, target: NamespaceId) -> usize {
        let mut entries: Vec<(&str, &Entry<T>)> = T::table(src).committed().collect();
        entries.sort_unstable_by_key(|&(name, _)| name);
        let mut count = 0;
        for (_, entry) in entries {
            match self.insert_pending(target, T::clone(&entry.symbol), entry.origin) {
                Ok(()) => count += 1,
                Err(e) => self.report(e),
            }
        }
        count
    }

    // =========================================================================
    // Lookups (pending and committed state, relative to the context)
    // =========================================================================

    fn resolver(&self) -> Resolver<'_> {
        self.program
            .resolver(View::Parse)
            .with_context(Some(self.context()))
    }

    /// Resolve a symbol of kind `T` as the unit currently sees it.
    pub fn find<T: Symbol>(&self, name: &str) -> Result<Resolved<T>, Error> {
        self.resolver().resolve(&NameScope::parse(name)?)
    }

    /// Resolve a function.
    pub fn find_function(&self, name: &str) -> Result<Resolved<Function>, Error> {
        self.find(name)
    }

    /// Resolve a class, falling back to class handlers.
    pub fn find_class(&self, name: &str) -> Result<Resolved<Class>, Error> {
        self.resolver().resolve_class(&NameScope::parse(name)?)
    }

    /// Resolve a hashdecl.
    pub fn find_hashdecl(&self, name: &str) -> Result<Resolved<HashDecl>, Error> {
        self.find(name)
    }

    /// Resolve a global variable.
    pub fn find_global_var(&self, name: &str) -> Result<Resolved<GlobalVar>, Error> {
        self.find(name)
    }

    /// Resolve a constant.
    pub fn find_constant(&self, name: &str) -> Result<Resolved<Constant>, Error> {
        self.find(name)
    }

    /// Resolve a namespace.
    pub fn find_namespace(&self, name: &str) -> Result<NamespaceId, Error> {
        self.resolver().namespace(&NameScope::parse(name)?)
    }

    // =========================================================================
    // Second stage, commit and rollback
    // =========================================================================

    /// Resolve type names and constant values of every pending symbol.
    fn parse_init(&mut self) {
        self.init_pending::<Function>(init_function);
        self.init_pending::<HashDecl>(init_hashdecl);
        self.init_pending::<GlobalVar>(init_global_var);
        self.init_pending::<Constant>(init_constant);
    }

    fn init_pending<T: Symbol>(&mut self, init: Initializer<T>) {
        let mut updates = Vec::new();
        let mut errors = Vec::new();
        {
            let resolver = self.program.resolver(View::Parse);
            let tree = &self.program.tree;
            for id in tree.walk(View::Parse) {
                let Some(ns) = tree.get(id) else {
                    continue;
                };
                let scoped = resolver.with_context(Some(id));
                for (name, entry) in T::table(ns).pending() {
                    if let Some(updated) = init(&scoped, id, &entry.symbol, &mut errors) {
                        updates.push((id, name.to_owned(), updated));
                    }
                }
            }
        }
        for (id, name, updated) in updates {
            let entry = self
                .program
                .tree
                .get_mut(id)
                .and_then(|ns| T::table_mut(ns).pending_mut(&name));
            if let Some(entry) = entry {
                entry.symbol = Arc::new(updated);
            }
        }
        for error in errors {
            self.report(error);
        }
    }

    /// Run the second stage, then commit, or roll back if anything failed.
    pub fn finish(mut self) -> Result<CommitSummary, Diagnostics> {
        self.open = false;
        if self.state.diagnostics.is_empty() {
            self.parse_init();
        }
        if !self.state.diagnostics.is_empty() {
            self.discard();
            return Err(core::mem::take(&mut self.state.diagnostics));
        }

        let (summary, failures) = self.program.commit_pending();
        debug_assert!(
            failures.is_empty(),
            "commit found symbols the declaration checks should have rejected: {failures:?}"
        );
        Ok(summary)
    }

    /// Undo raised flags, then drop all pending state.
    fn discard(&mut self) {
        for (id, old) in self.state.raised.drain(..).rev() {
            if let Some(ns) = self.program.tree.get_mut(id) {
                ns.set_flags(old);
            }
        }
        self.program.rollback_pending(self.state.serial_mark);
    }

    /// Discard every pending declaration. Returns what had been reported.
    pub fn rollback(mut self) -> Diagnostics {
        self.open = false;
        self.discard();
        core::mem::take(&mut self.state.diagnostics)
    }
}

impl Drop for ParseUnit<'_> {
    fn drop(&mut self) {
        if self.open {
            self.discard();
        }
    }
}

/// Second-stage initializer for one symbol kind: returns the updated symbol.
type Initializer<T> = fn(&Resolver<'_>, NamespaceId, &T, &mut Vec<Error>) -> Option<T>;

fn init_function(
    resolver: &Resolver<'_>,
    _ns: NamespaceId,
    function: &Function,
    errors: &mut Vec<Error>,
) -> Option<Function> {
    let mut updated = function.clone();
    for variant in &mut updated.variants {
        let owner = format!("{}{}", function.name, variant.signature());
        let mut params = Vec::with_capacity(variant.params.len());
        let mut failed = false;
        for param in &variant.params {
            match resolver.resolve_declared(param.type_name.as_ref(), &owner, &variant.location) {
                Ok(resolved) => params.push(resolved),
                Err(e) => {
                    errors.push(e);
                    failed = true;
                }
            }
        }
        let return_type = match resolver.resolve_declared(
            variant.return_type.as_ref(),
            &owner,
            &variant.location,
        ) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        if let (false, Some(return_type)) = (failed, return_type) {
            variant.resolved = Some(ResolvedSignature {
                params,
                return_type,
            });
        }
    }
    Some(updated)
}

fn init_hashdecl(
    resolver: &Resolver<'_>,
    _ns: NamespaceId,
    hashdecl: &HashDecl,
    errors: &mut Vec<Error>,
) -> Option<HashDecl> {
    let mut updated = hashdecl.clone();
    for field in &mut updated.fields {
        let owner = format!("{}.{}", hashdecl.name, field.name);
        match resolver.resolve_declared(field.type_name.as_ref(), &owner, &hashdecl.location) {
            Ok(resolved) => field.resolved = Some(resolved),
            Err(e) => errors.push(e),
        }
    }
    Some(updated)
}

fn init_global_var(
    resolver: &Resolver<'_>,
    _ns: NamespaceId,
    var: &GlobalVar,
    errors: &mut Vec<Error>,
) -> Option<GlobalVar> {
    match resolver.resolve_declared(var.type_name.as_ref(), &var.name, &var.location) {
        Ok(resolved) => {
            let mut updated = var.clone();
            updated.resolved = Some(resolved);
            Some(updated)
        }
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn init_constant(
    resolver: &Resolver<'_>,
    ns: NamespaceId,
    constant: &Constant,
    errors: &mut Vec<Error>,
) -> Option<Constant> {
    match resolver.expand(ns, &constant.name, &constant.expr, 0) {
        Ok(value) => {
            let mut updated = constant.clone();
            updated.value = Some(value);
            Some(updated)
        }
        Err(e) => {
            errors.push(e);
            None
        }
    }
}
