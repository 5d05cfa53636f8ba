// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Class symbols.

use super::{Symbol, SymbolKind};
use crate::types::{Handle, SourceLocation};

/// A class known to the namespace tree.
///
/// Method tables and inheritance belong to the object layer; the symbol
/// table only keeps the name and the embedder's handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    /// Bare class name.
    pub name: String,
    /// Declaration site.
    pub location: SourceLocation,
    /// Flag bits.
    pub flags: u32,
    /// Embedder handle for the class object.
    pub handle: Handle,
}

impl Class {
    /// Create a class with no flags and a zero handle.
    #[must_use]
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            location,
            flags: 0,
            handle: Handle::default(),
        }
    }

    /// Set the flag bits.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Set the embedder handle.
    #[must_use]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = handle;
        self
    }
}

impl Symbol for Class {
    const KIND: SymbolKind = SymbolKind::Class;

    fn name(&self) -> &str {
        &self.name
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn location(&self) -> &SourceLocation {
        &self.location
    }

    symbol_slots!(classes, classes);
}
