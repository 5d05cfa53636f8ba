// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Small shared types: ids, handles, source locations and flag bits.

use core::fmt;

/// Identifier of a namespace node in a [`NamespaceTree`](crate::NamespaceTree).
///
/// Ids are generational: a slot freed by rollback or unmerge is reused with a
/// bumped generation, so a stale id never aliases a newer namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId {
    index: u32,
    generation: u32,
}

impl NamespaceId {
    /// Create an id from its raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot of this namespace.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when this id was handed out.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns#{}v{}", self.index, self.generation)
    }
}

/// Identity of a module merged into a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Opaque embedder handle attached to classes and function variants.
///
/// The symbol table stores and returns it but never interprets it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Handle(pub u64);

/// Source position of a declaration, used in diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Source label (file name, `<repl>`, module name, ...).
    pub source: String,
    /// 1-based line, 0 if unknown.
    pub line: u32,
    /// 1-based column, 0 if unknown.
    pub column: u32,
}

impl SourceLocation {
    /// Create a location.
    #[must_use]
    pub fn new(source: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }

    /// Location used for symbols registered by the embedder rather than parsed.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new("<builtin>", 0, 0)
    }
}

static EMPTY_LOCATION: SourceLocation = SourceLocation {
    source: String::new(),
    line: 0,
    column: 0,
};

/// Location for symbols that have none (a function with no variants).
pub(crate) fn empty_location() -> &'static SourceLocation {
    &EMPTY_LOCATION
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

/// Flag bits shared by namespaces and symbols.
pub mod flags {
    /// Visible to programs that merge this one as a module.
    pub const PUBLIC: u32 = 0x1;
    /// Registered by the system rather than declared by user code.
    pub const BUILTIN: u32 = 0x2;
    /// Copied in from another program by a merge or import.
    pub const IMPORTED: u32 = 0x4;

    /// Check whether `bits` has every bit of `flag` set.
    #[must_use]
    pub const fn has(bits: u32, flag: u32) -> bool {
        bits & flag == flag
    }
}

/// Filter bits for [`Program::deep_copy`](crate::Program::deep_copy).
pub mod copy_mask {
    /// Copy everything.
    pub const ALL: u32 = 0;
    /// Only public namespaces and public symbols.
    pub const PUBLIC: u32 = 0x1;
    /// Only builtin (system) namespaces and symbols.
    pub const SYSTEM: u32 = 0x2;
}
