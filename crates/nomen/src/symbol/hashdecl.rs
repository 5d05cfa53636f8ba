// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Hashdecl symbols: named record types with a fixed field set.

use super::{ResolvedType, Symbol, SymbolKind};
use crate::name_scope::NameScope;
use crate::types::SourceLocation;

/// One field of a hashdecl.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashField {
    /// Field name.
    pub name: String,
    /// Declared type, `None` for untyped.
    pub type_name: Option<NameScope>,
    /// Filled in by the second parse stage.
    pub resolved: Option<ResolvedType>,
}

impl HashField {
    /// Create a field.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: Option<NameScope>) -> Self {
        Self {
            name: name.into(),
            type_name,
            resolved: None,
        }
    }
}

/// A hashdecl.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashDecl {
    /// Bare name.
    pub name: String,
    /// Declaration site.
    pub location: SourceLocation,
    /// Flag bits.
    pub flags: u32,
    /// Fields in declaration order.
    pub fields: Vec<HashField>,
}

impl HashDecl {
    /// Create a hashdecl.
    #[must_use]
    pub fn new(name: impl Into<String>, location: SourceLocation, fields: Vec<HashField>) -> Self {
        Self {
            name: name.into(),
            location,
            flags: 0,
            fields,
        }
    }

    /// Set the flag bits.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&HashField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Symbol for HashDecl {
    const KIND: SymbolKind = SymbolKind::HashDecl;

    fn name(&self) -> &str {
        &self.name
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn location(&self) -> &SourceLocation {
        &self.location
    }

    symbol_slots!(hashdecls, hashdecls);
}
