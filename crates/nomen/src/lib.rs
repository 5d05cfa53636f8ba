// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Nomen
//!
//! Namespace tree and symbol resolution for an embeddable scripting runtime.
//!
//! This crate provides:
//! - Parsed qualified names (`A::B::c`)
//! - A namespace tree whose nodes hold two-phase (pending/committed) symbol
//!   tables for functions, classes, hashdecls, global variables and constants
//! - A flattened root index for unqualified lookup with depth-based shadowing
//! - Qualified and unqualified resolution with class handler fallback and
//!   constant expansion
//! - Parse units that commit atomically or roll back without a trace
//! - Module merge and unmerge, system symbol import and filtered deep copy
//!
//! Everything lives in a [`Program`]. Single-threaded embedders parse with
//! [`Program::begin_parse`]; threaded embedders wrap the program in a
//! [`SharedProgram`] so runtime readers keep resolving while a parse unit is
//! open.

pub mod config;
pub mod error;
pub mod handler;
pub mod index;
pub mod merge;
pub mod name_scope;
pub mod namespace;
pub mod program;
pub mod symbol;
pub mod table;
pub mod types;

mod resolve;

pub use config::{DEFAULT_MAX_CONSTANT_DEPTH, ProgramConfig};
pub use error::{Diagnostics, Error};
pub use handler::ClassHandler;
pub use index::{IndexEntry, KindIndex, NamespaceIndex, RootIndex};
pub use merge::{Addition, MergeFilter, MergePlan, MergeReport, Module, ModuleMerger};
pub use name_scope::{NAMESPACE_SEPARATOR, NameScope};
pub use namespace::{Ancestors, Namespace, NamespaceTree, View};
pub use program::{CommitSummary, ParseUnit, Program, SharedParseUnit, SharedProgram, SnapshotEntry};
pub use resolve::Resolved;
pub use symbol::{
    BinaryOp, Class, ConstExpr, Constant, Function, FunctionVariant, GlobalVar, HashDecl,
    HashField, Param, Primitive, ResolvedSignature, ResolvedType, Symbol, SymbolKind, UnaryOp,
};
pub use table::{Entry, SymbolTable};
pub use types::{Handle, ModuleId, NamespaceId, SourceLocation, copy_mask, flags};

#[cfg(test)]
mod name_scope_test;
#[cfg(test)]
mod table_test;
