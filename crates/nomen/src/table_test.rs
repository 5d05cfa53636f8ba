// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for two-phase symbol tables.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use crate::name_scope::NameScope;
use crate::symbol::{Class, Function, FunctionVariant, Param};
use crate::table::{Entry, SymbolTable};
use crate::types::{ModuleId, SourceLocation};

fn class(name: &str) -> Entry<Class> {
    Entry::new(Class::new(name, SourceLocation::new("t", 1, 1)), None, 0)
}

fn variant(types: &[&str]) -> FunctionVariant {
    let params = types
        .iter()
        .enumerate()
        .map(|(i, t)| Param::new(format!("p{i}"), Some(NameScope::parse(t).unwrap())))
        .collect();
    FunctionVariant::new(params, None, SourceLocation::new("t", 1, 1))
}

#[test]
fn pending_is_separate_from_committed() {
    let mut table = SymbolTable::new();
    table.add_pending(class("A")).unwrap();

    assert!(table.find("A").is_some());
    assert!(table.find_pending("A").is_some());
    assert!(table.find_committed("A").is_none());
    assert_eq!(table.pending_len(), 1);
    assert_eq!(table.committed_len(), 0);
}

#[test]
fn add_pending_rejects_duplicate() {
    let mut table = SymbolTable::new();
    table.add_pending(class("A")).unwrap();
    let back = table.add_pending(class("A")).unwrap_err();
    assert_eq!(back.symbol.name, "A");
}

#[test]
fn commit_moves_pending() {
    let mut table = SymbolTable::new();
    table.add_pending(class("A")).unwrap();
    table.add_pending(class("B")).unwrap();
    assert_eq!(table.parse_commit().unwrap(), 2);
    assert_eq!(table.pending_len(), 0);
    assert!(table.find_committed("A").is_some());
    assert!(table.find_committed("B").is_some());
}

#[test]
fn rollback_leaves_committed() {
    let mut table = SymbolTable::new();
    table.add_committed(class("A")).unwrap();
    table.add_pending(class("B")).unwrap();
    assert_eq!(table.parse_rollback(), 1);
    assert!(table.find("B").is_none());
    assert!(table.find_committed("A").is_some());
}

#[test]
fn commit_conflict_for_non_overloadable_kind() {
    let mut table = SymbolTable::new();
    table.add_committed(class("A")).unwrap();
    table.add_pending(class("A")).unwrap();
    let conflicts = table.parse_commit().unwrap_err();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].name, "A");
}

#[test]
fn commit_folds_overloads_copy_on_write() {
    let mut table = SymbolTable::new();
    table
        .add_committed(Entry::new(Function::new("f", 0, variant(&["int"])), None, 1))
        .unwrap();
    let before = Arc::clone(&table.find_committed("f").unwrap().symbol);

    table
        .add_pending(Entry::new(Function::new("f", 0, variant(&["string"])), None, 5))
        .unwrap();
    assert_eq!(table.parse_commit().unwrap(), 1);

    let after = table.find_committed("f").unwrap();
    assert_eq!(after.symbol.variants.len(), 2);
    assert_eq!(after.serial, 1);
    // A handle taken before the commit still sees the old variant list.
    assert_eq!(before.variants.len(), 1);
}

#[test]
fn retain_committed_by_origin() {
    let mut table = SymbolTable::new();
    table
        .add_committed(Entry::new(Class::new("A", SourceLocation::builtin()), Some(ModuleId(1)), 0))
        .unwrap();
    table
        .add_committed(Entry::new(Class::new("B", SourceLocation::builtin()), None, 1))
        .unwrap();
    let removed = table.retain_committed(|e| e.origin != Some(ModuleId(1)));
    assert_eq!(removed, 1);
    assert!(table.find_committed("A").is_none());
    assert!(table.find_committed("B").is_some());
}

#[test]
fn purge_empties_both_phases() {
    let mut table = SymbolTable::new();
    table.add_committed(class("A")).unwrap();
    table.add_pending(class("B")).unwrap();
    table.purge();
    assert!(table.is_empty());
}
