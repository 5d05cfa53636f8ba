// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Global variable declarations.

use super::{ResolvedType, Symbol, SymbolKind};
use crate::name_scope::NameScope;
use crate::types::SourceLocation;

/// A global variable declaration. Storage for the value lives in the
/// runtime; the symbol table resolves the name and the declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalVar {
    /// Bare name.
    pub name: String,
    /// Declaration site.
    pub location: SourceLocation,
    /// Flag bits.
    pub flags: u32,
    /// Declared type, `None` for untyped.
    pub type_name: Option<NameScope>,
    /// Filled in by the second parse stage.
    pub resolved: Option<ResolvedType>,
}

impl GlobalVar {
    /// Create a global variable declaration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        location: SourceLocation,
        type_name: Option<NameScope>,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            flags: 0,
            type_name,
            resolved: None,
        }
    }

    /// Set the flag bits.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

impl Symbol for GlobalVar {
    const KIND: SymbolKind = SymbolKind::GlobalVar;

    fn name(&self) -> &str {
        &self.name
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn location(&self) -> &SourceLocation {
        &self.location
    }

    symbol_slots!(globals, globals);
}
