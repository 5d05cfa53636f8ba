// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! A program shared between one parser and many runtime readers.
//!
//! The parse lock serializes parse units. The program itself sits behind a
//! reader/writer lock: readers resolve against committed state while a parse
//! unit takes the write lock only for the duration of each declaration, and
//! once for the whole commit, so readers see a commit all at once.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::parse::{CommitSummary, ParseState, ParseUnit};
use super::Program;
use crate::error::{Diagnostics, Error};
use crate::namespace::NamespaceTree;
use crate::resolve::Resolved;
use crate::symbol::{Class, ConstExpr, Constant, Function, GlobalVar, HashDecl, Symbol};
use crate::types::{NamespaceId, SourceLocation};

/// A [`Program`] usable from several threads.
#[derive(Debug, Default)]
pub struct SharedProgram {
    parse_lock: Mutex<()>,
    program: RwLock<Program>,
}

impl SharedProgram {
    /// Wrap a program.
    #[must_use]
    pub fn new(program: Program) -> Self {
        Self {
            parse_lock: Mutex::new(()),
            program: RwLock::new(program),
        }
    }

    /// Shared access for runtime lookups.
    ///
    /// A poisoned lock is recovered: every mutation completes before the
    /// write lock is released, so the data is structurally intact.
    pub fn read(&self) -> RwLockReadGuard<'_, Program> {
        self.program.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Program> {
        self.program.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access outside of any parse unit (merges, handler setup).
    ///
    /// Waits for an open parse unit to finish first.
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut Program) -> R) -> R {
        let _parse = self.parse_lock.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut self.write())
    }

    /// Open a parse unit, waiting for any other unit to finish.
    pub fn begin_parse(&self) -> SharedParseUnit<'_> {
        let guard = self.parse_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let state = ParseState::start(&self.read());
        tracing::trace!("opened shared parse unit");
        SharedParseUnit {
            shared: self,
            _guard: guard,
            state: Some(state),
        }
    }

    /// Take the program back.
    #[must_use]
    pub fn into_inner(self) -> Program {
        self.program
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve a committed namespace.
    pub fn find_namespace(&self, name: &str) -> Result<NamespaceId, Error> {
        self.read().find_namespace(name)
    }

    /// Resolve a committed function.
    pub fn resolve_function(&self, name: &str) -> Result<Resolved<Function>, Error> {
        self.read().resolve_function(name)
    }

    /// Resolve a committed class, falling back to class handlers.
    pub fn resolve_class(&self, name: &str) -> Result<Resolved<Class>, Error> {
        self.read().resolve_class(name)
    }

    /// Resolve a committed hashdecl.
    pub fn resolve_hashdecl(&self, name: &str) -> Result<Resolved<HashDecl>, Error> {
        self.read().resolve_hashdecl(name)
    }

    /// Resolve a committed global variable.
    pub fn resolve_global_var(&self, name: &str) -> Result<Resolved<GlobalVar>, Error> {
        self.read().resolve_global_var(name)
    }

    /// Resolve a committed constant.
    pub fn resolve_constant(&self, name: &str) -> Result<Resolved<Constant>, Error> {
        self.read().resolve_constant(name)
    }

    /// Expanded value of a committed constant.
    pub fn constant_value(&self, name: &str) -> Result<ConstExpr, Error> {
        self.read().constant_value(name)
    }
}

/// A parse unit on a [`SharedProgram`].
///
/// Holds the parse lock for its whole life. Dropping an unfinished unit
/// rolls it back.
pub struct SharedParseUnit<'s> {
    shared: &'s SharedProgram,
    _guard: MutexGuard<'s, ()>,
    state: Option<ParseState>,
}

impl SharedParseUnit<'_> {
    /// Run `f` on the unit under the write lock.
    fn with<R>(&mut self, f: impl FnOnce(&mut ParseUnit<'_>) -> R) -> R {
        let mut program = self.shared.write();
        let state = self.state.take().unwrap_or_else(|| ParseState::start(&program));
        let mut unit = ParseUnit::resume(&mut program, state);
        let result = f(&mut unit);
        self.state = Some(unit.suspend());
        result
    }

    /// Read-only lookups through the unit's view.
    ///
    /// Takes the write lock as well: pending state is only consistent
    /// while no other declaration is half-applied.
    fn look<R>(&mut self, f: impl FnOnce(&ParseUnit<'_>) -> R) -> R {
        self.with(|unit| f(unit))
    }

    /// Errors reported so far.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        self.state
            .as_ref()
            .map(|s| s.diagnostics().clone())
            .unwrap_or_default()
    }

    /// Record an error. The unit will roll back instead of committing.
    pub fn report(&mut self, error: Error) {
        self.with(|unit| unit.report(error));
    }

    /// See [`ParseUnit::declare_namespace`].
    pub fn declare_namespace(
        &mut self,
        name: &str,
        flags: u32,
        location: SourceLocation,
    ) -> Option<NamespaceId> {
        self.with(|unit| unit.declare_namespace(name, flags, location))
    }

    /// See [`ParseUnit::enter_namespace`].
    pub fn enter_namespace(
        &mut self,
        name: &str,
        flags: u32,
        location: SourceLocation,
    ) -> Option<NamespaceId> {
        self.with(|unit| unit.enter_namespace(name, flags, location))
    }

    /// See [`ParseUnit::leave_namespace`].
    pub fn leave_namespace(&mut self) -> Option<NamespaceId> {
        self.with(|unit| unit.leave_namespace())
    }

    /// See [`ParseUnit::declare`].
    pub fn declare<T: Symbol>(&mut self, symbol: T) -> Option<NamespaceId> {
        self.with(|unit| unit.declare(symbol))
    }

    /// See [`ParseUnit::assimilate`].
    pub fn assimilate(&mut self, at: NamespaceId, source: NamespaceTree) -> usize {
        self.with(|unit| unit.assimilate(at, source))
    }

    /// See [`ParseUnit::find`].
    pub fn find<T: Symbol>(&mut self, name: &str) -> Result<Resolved<T>, Error> {
        self.look(|unit| unit.find(name))
    }

    /// See [`ParseUnit::find_class`].
    pub fn find_class(&mut self, name: &str) -> Result<Resolved<Class>, Error> {
        self.look(|unit| unit.find_class(name))
    }

    /// See [`ParseUnit::find_namespace`].
    pub fn find_namespace(&mut self, name: &str) -> Result<NamespaceId, Error> {
        self.look(|unit| unit.find_namespace(name))
    }

    /// Run the second stage and commit under a single write lock.
    pub fn finish(mut self) -> Result<CommitSummary, Diagnostics> {
        let mut program = self.shared.write();
        let state = self.state.take().unwrap_or_else(|| ParseState::start(&program));
        ParseUnit::resume(&mut program, state).finish()
    }

    /// Discard every pending declaration.
    pub fn rollback(mut self) -> Diagnostics {
        let mut program = self.shared.write();
        let state = self.state.take().unwrap_or_else(|| ParseState::start(&program));
        ParseUnit::resume(&mut program, state).rollback()
    }
}

impl Drop for SharedParseUnit<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            let mut program = self.shared.write();
            drop(ParseUnit::resume(&mut program, state));
        }
    }
}
