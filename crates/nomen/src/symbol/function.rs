// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Function symbols and their overload variants.

use super::{ResolvedType, Symbol, SymbolKind};
use crate::name_scope::NameScope;
use crate::types::{Handle, SourceLocation};

/// A declared parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Declared type, `None` for untyped.
    pub type_name: Option<NameScope>,
}

impl Param {
    /// Create a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: Option<NameScope>) -> Self {
        Self {
            name: name.into(),
            type_name,
        }
    }
}

/// Parameter and return types after the second parse stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSignature {
    /// One entry per parameter.
    pub params: Vec<ResolvedType>,
    /// Return type (`any` when undeclared).
    pub return_type: ResolvedType,
}

/// One callable signature of a function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionVariant {
    /// Declared parameters.
    pub params: Vec<Param>,
    /// Declared return type.
    pub return_type: Option<NameScope>,
    /// Declaration site.
    pub location: SourceLocation,
    /// Embedder handle for the executable body.
    pub handle: Handle,
    /// Filled in by the second parse stage.
    pub resolved: Option<ResolvedSignature>,
}

impl FunctionVariant {
    /// Create a variant.
    #[must_use]
    pub fn new(params: Vec<Param>, return_type: Option<NameScope>, location: SourceLocation) -> Self {
        Self {
            params,
            return_type,
            location,
            handle: Handle::default(),
            resolved: None,
        }
    }

    /// Set the embedder handle.
    #[must_use]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = handle;
        self
    }

    /// Signature key: the parameter type names as written.
    ///
    /// Two variants with equal keys cannot coexist under one name.
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self
            .params
            .iter()
            .map(|p| p.type_name.as_ref().map_or("any", NameScope::raw))
            .collect();
        format!("({})", params.join(", "))
    }
}

/// A named function holding one or more overload variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    /// Bare function name.
    pub name: String,
    /// Flag bits, taken from the first declaration.
    pub flags: u32,
    /// Overload variants in declaration order.
    pub variants: Vec<FunctionVariant>,
}

impl Function {
    /// Create a function with a single variant.
    #[must_use]
    pub fn new(name: impl Into<String>, flags: u32, variant: FunctionVariant) -> Self {
        Self {
            name: name.into(),
            flags,
            variants: vec![variant],
        }
    }

    /// Find a variant with the same signature key.
    #[must_use]
    pub fn variant_with_signature(&self, signature: &str) -> Option<&FunctionVariant> {
        self.variants.iter().find(|v| v.signature() == signature)
    }
}

impl Symbol for Function {
    const KIND: SymbolKind = SymbolKind::Function;

    fn name(&self) -> &str {
        &self.name
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn location(&self) -> &SourceLocation {
        self.variants
            .first()
            .map_or(crate::types::empty_location(), |v| &v.location)
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        other
            .variants
            .iter()
            .any(|v| self.variant_with_signature(&v.signature()).is_some())
    }

    fn absorb(&mut self, pending: Self) -> Result<(), Self> {
        if self.conflicts_with(&pending) {
            return Err(pending);
        }
        self.variants.extend(pending.variants);
        Ok(())
    }

    symbol_slots!(functions, functions);
}
