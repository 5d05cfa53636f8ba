// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Symbol kinds stored in namespaces.
//!
//! Five kinds live in per-namespace tables: functions, classes, hashdecls,
//! global variables and constants. The [`Symbol`] trait ties each payload
//! type to its table in a [`Namespace`] and its slot in the [`RootIndex`],
//! so the table, index and resolver logic is written once and instantiated
//! per kind.


/// Implements the table and index accessors of [`Symbol`] for one kind.
macro_rules! symbol_slots {
    ($table:ident, $index:ident) => {
        fn set_name(&mut self, name: String) {
            self.name = name;
        }

        fn table(ns: &$crate::namespace::Namespace) -> &$crate::table::SymbolTable<Self> {
            &ns.$table
        }

        fn table_mut(
            ns: &mut $crate::namespace::Namespace,
        ) -> &mut $crate::table::SymbolTable<Self> {
            &mut ns.$table
        }

        fn index(index: &$crate::index::RootIndex) -> &$crate::index::KindIndex {
            &index.$index
        }

        fn index_mut(index: &mut $crate::index::RootIndex) -> &mut $crate::index::KindIndex {
            &mut index.$index
        }
    };
}

mod class;
mod constant;
mod function;
mod global;
mod hashdecl;
mod types;

pub use class::Class;
pub use constant::{BinaryOp, ConstExpr, Constant, UnaryOp};
pub use function::{Function, FunctionVariant, Param, ResolvedSignature};
pub use global::GlobalVar;
pub use hashdecl::{HashDecl, HashField};
pub use types::{Primitive, ResolvedType};

use core::fmt;

use crate::index::{KindIndex, RootIndex};
use crate::namespace::Namespace;
use crate::table::SymbolTable;
use crate::types::SourceLocation;

/// The kinds of names a namespace can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    /// A function (possibly with several overload variants).
    Function,
    /// A class.
    Class,
    /// A hashdecl (structural record type).
    HashDecl,
    /// A global variable.
    GlobalVar,
    /// A constant.
    Constant,
    /// A child namespace.
    Namespace,
}

impl SymbolKind {
    /// Human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::HashDecl => "hashdecl",
            Self::GlobalVar => "global variable",
            Self::Constant => "constant",
            Self::Namespace => "namespace",
        }
    }

    /// Kinds that share one name space inside a namespace: a bare name may
    /// denote at most one of them.
    #[must_use]
    pub const fn is_type_like(self) -> bool {
        matches!(self, Self::Class | Self::HashDecl | Self::Namespace)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol payload that can be stored in a namespace table.
pub trait Symbol: Clone + fmt::Debug + Send + Sync + 'static {
    /// The kind this payload represents.
    const KIND: SymbolKind;

    /// Bare name of the symbol.
    fn name(&self) -> &str;

    /// Flag bits (see [`crate::flags`]).
    fn flags(&self) -> u32;

    /// Where the symbol was declared.
    fn location(&self) -> &SourceLocation;

    /// Replace the bare name (declarations arrive with their qualified name).
    fn set_name(&mut self, name: String);

    /// True if `other` cannot live next to `self` under the same name.
    ///
    /// Only functions can share a name (distinct overload signatures).
    fn conflicts_with(&self, _other: &Self) -> bool {
        true
    }

    /// Fold a pending declaration into this committed one.
    ///
    /// Only functions support this (new overload variants join the existing
    /// function). Other kinds hand the pending value back.
    fn absorb(&mut self, pending: Self) -> Result<(), Self> {
        Err(pending)
    }

    /// The table holding this kind in `ns`.
    fn table(ns: &Namespace) -> &SymbolTable<Self>;

    /// The table holding this kind in `ns`, mutably.
    fn table_mut(ns: &mut Namespace) -> &mut SymbolTable<Self>;

    /// The flattened index for this kind.
    fn index(index: &RootIndex) -> &KindIndex;

    /// The flattened index for this kind, mutably.
    fn index_mut(index: &mut RootIndex) -> &mut KindIndex;
}
