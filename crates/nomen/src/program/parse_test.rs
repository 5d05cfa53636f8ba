// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for parse units.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use super::Program;
use crate::error::Error;
use crate::index::RootIndex;
use crate::name_scope::NameScope;
use crate::namespace::View;
use crate::symbol::{
    Class, ConstExpr, Constant, Function, FunctionVariant, GlobalVar, HashDecl, Param, SymbolKind,
};
use crate::types::{SourceLocation, flags};

fn loc(line: u32) -> SourceLocation {
    SourceLocation::new("unit.q", line, 1)
}

fn function(name: &str, param_type: &str) -> Function {
    let params = vec![Param::new("a", Some(NameScope::parse(param_type).unwrap()))];
    Function::new(name, 0, FunctionVariant::new(params, None, loc(1)))
}

fn constant(name: &str, value: i64) -> Constant {
    Constant::new(name, loc(1), ConstExpr::int(value))
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn declare_creates_intermediate_namespaces() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    let ns = unit.declare_constant(constant("A::B::X", 1)).unwrap();
    assert_eq!(unit.program().get_path(ns, false), "A::B");
    assert!(!unit.program().namespace(ns).unwrap().is_committed());
    let summary = unit.finish().unwrap();
    assert_eq!(summary.symbols, 1);
    assert_eq!(summary.namespaces, 2);

    let resolved = program.resolve_constant("A::B::X").unwrap();
    assert_eq!(resolved.symbol.name, "X");
    assert!(program.namespace(ns).unwrap().is_committed());
}

#[test]
fn public_symbols_create_public_namespaces() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    let ns = unit
        .declare_class(Class::new("Pub::K", loc(1)).with_flags(flags::PUBLIC | flags::BUILTIN))
        .unwrap();
    let node = unit.program().namespace(ns).unwrap();
    assert!(node.is_public());
    assert!(!node.is_builtin());
}

#[test]
fn context_stack() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    let root = unit.context();
    assert_eq!(unit.leave_namespace(), None);

    let a = unit.enter_namespace("A", 0, loc(1)).unwrap();
    let b = unit.enter_namespace("B", 0, loc(2)).unwrap();
    assert_eq!(unit.context(), b);
    assert_eq!(unit.program().get_path(b, false), "A::B");

    let ns = unit.declare_global_var(GlobalVar::new("g", loc(3), None)).unwrap();
    assert_eq!(ns, b);
    let anchored = unit.declare_global_var(GlobalVar::new("::top", loc(4), None)).unwrap();
    assert_eq!(anchored, root);

    assert_eq!(unit.leave_namespace(), Some(b));
    assert_eq!(unit.context(), a);
    assert_eq!(unit.leave_namespace(), Some(a));
    assert_eq!(unit.context(), root);
    unit.finish().unwrap();

    assert!(program.resolve_global_var("A::B::g").is_ok());
    assert!(program.resolve_global_var("top").is_ok());
}

#[test]
fn redeclaring_namespace_is_fine() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    let first = unit.declare_namespace("A::B", 0, loc(1)).unwrap();
    let second = unit.declare_namespace("A::B", 0, loc(2)).unwrap();
    assert_eq!(first, second);
    unit.finish().unwrap();

    let mut unit = program.begin_parse();
    assert_eq!(unit.declare_namespace("A::B", 0, loc(3)), Some(first));
    assert!(unit.diagnostics().is_empty());
}

#[test]
fn public_declaration_raises_enclosing_namespaces() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    let inner = unit.declare_constant(constant("A::B::x", 1)).unwrap();
    assert!(!unit.program().namespace(inner).unwrap().is_public());
    unit.declare_constant(constant("A::B::y", 2).with_flags(flags::PUBLIC));
    unit.finish().unwrap();

    let outer = program.find_namespace("A").unwrap();
    assert!(program.namespace(outer).unwrap().is_public());
    assert!(program.namespace(inner).unwrap().is_public());
}

#[test]
fn public_redeclaration_raises_committed_namespace() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    let ns = unit.declare_namespace("A", 0, loc(1)).unwrap();
    unit.finish().unwrap();

    let mut unit = program.begin_parse();
    assert_eq!(unit.declare_namespace("A", flags::PUBLIC, loc(2)), Some(ns));
    assert!(unit.program().namespace(ns).unwrap().is_public());
    unit.finish().unwrap();
    assert!(program.namespace(ns).unwrap().is_public());

    // Private declarations never lower it again.
    let mut unit = program.begin_parse();
    unit.declare_namespace("A", 0, loc(3));
    unit.declare_constant(constant("A::z", 3));
    unit.finish().unwrap();
    assert!(program.namespace(ns).unwrap().is_public());
}

#[test]
fn malformed_names_are_reported() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    assert_eq!(unit.declare_constant(constant("A::", 1)), None);
    assert_eq!(unit.declare_namespace("::", 0, loc(1)), None);
    assert_eq!(unit.diagnostics().len(), 2);
    assert!(unit.finish().is_err());
}

// =============================================================================
// Duplicate detection
// =============================================================================

fn duplicate_kinds(error: &Error) -> (SymbolKind, SymbolKind) {
    match error {
        Error::DuplicateSymbol { kind, existing, .. } => (*kind, *existing),
        other => panic!("expected duplicate, got {other:?}"),
    }
}

#[test]
fn class_after_hashdecl_fails() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_hashdecl(HashDecl::new("N::X", loc(1), Vec::new()));
    assert_eq!(unit.declare_class(Class::new("N::X", loc(2))), None);
    let diagnostics = unit.finish().unwrap_err();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        duplicate_kinds(diagnostics.iter().next().unwrap()),
        (SymbolKind::Class, SymbolKind::HashDecl)
    );
}

#[test]
fn hashdecl_after_committed_class_fails() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_class(Class::new("N::X", loc(1)));
    unit.finish().unwrap();

    let mut unit = program.begin_parse();
    assert_eq!(unit.declare_hashdecl(HashDecl::new("N::X", loc(2), Vec::new())), None);
    let diagnostics = unit.finish().unwrap_err();
    match diagnostics.iter().next().unwrap() {
        Error::DuplicateSymbol {
            kind,
            existing,
            namespace,
            location,
            previous,
            ..
        } => {
            assert_eq!(*kind, SymbolKind::HashDecl);
            assert_eq!(*existing, SymbolKind::Class);
            assert_eq!(namespace, "::N");
            assert_eq!(location, &loc(2));
            assert_eq!(previous, &loc(1));
        }
        other => panic!("expected duplicate, got {other:?}"),
    }
}

#[test]
fn namespace_and_class_share_names() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_class(Class::new("K", loc(1)));
    assert_eq!(unit.declare_namespace("K", 0, loc(2)), None);
    assert_eq!(unit.declare_constant(constant("K::c", 1)), None);
    unit.declare_namespace("M", 0, loc(3));
    assert_eq!(unit.declare_class(Class::new("M", loc(4))), None);

    let kinds: Vec<(SymbolKind, SymbolKind)> =
        unit.diagnostics().iter().map(duplicate_kinds).collect();
    assert_eq!(
        kinds,
        vec![
            (SymbolKind::Namespace, SymbolKind::Class),
            (SymbolKind::Namespace, SymbolKind::Class),
            (SymbolKind::Class, SymbolKind::Namespace),
        ]
    );
}

#[test]
fn duplicate_non_type_symbols() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_constant(constant("c", 1));
    assert_eq!(unit.declare_constant(constant("c", 2)), None);
    unit.declare_global_var(GlobalVar::new("c", loc(3), None)).unwrap();
    assert_eq!(unit.diagnostics().len(), 1);
}

// =============================================================================
// Overloads
// =============================================================================

#[test]
fn overloads_fold_within_unit() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_function(function("f", "int")).unwrap();
    unit.declare_function(function("f", "string")).unwrap();
    assert_eq!(unit.declare_function(function("f", "int")), None);
    assert_eq!(unit.diagnostics().len(), 1);
    assert!(unit.rollback().len() == 1);
    assert!(program.resolve_function("f").is_err());
}

#[test]
fn overloads_fold_across_units() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_function(function("f", "int")).unwrap();
    unit.finish().unwrap();
    let before = program.resolve_function("f").unwrap();

    let mut unit = program.begin_parse();
    unit.declare_function(function("f", "string")).unwrap();
    assert_eq!(unit.declare_function(function("f", "int")), None);
    unit.finish().unwrap_err();
    assert_eq!(program.resolve_function("f").unwrap().symbol.variants.len(), 1);

    let mut unit = program.begin_parse();
    unit.declare_function(function("f", "string")).unwrap();
    unit.finish().unwrap();

    let after = program.resolve_function("f").unwrap();
    assert_eq!(after.symbol.variants.len(), 2);
    assert!(after.symbol.variants.iter().all(|v| v.resolved.is_some()));
    assert_eq!(before.symbol.variants.len(), 1);
}

#[test]
fn overload_keeps_equal_depth_shadowing() {
    let mut program = Program::default();
    for name in ["A::f", "B::f"] {
        let mut unit = program.begin_parse();
        unit.declare_function(function(name, "int")).unwrap();
        unit.finish().unwrap();
    }
    let winner = program.resolve_function("f").unwrap();
    assert_eq!(program.get_path(winner.namespace, false), "B");

    let mut unit = program.begin_parse();
    unit.declare_function(function("A::f", "string")).unwrap();
    let seen = unit.find_function("f").unwrap();
    assert_eq!(unit.program().get_path(seen.namespace, false), "B");
    unit.finish().unwrap();

    let winner = program.resolve_function("f").unwrap();
    assert_eq!(program.get_path(winner.namespace, false), "B");
    assert_eq!(program.resolve_function("A::f").unwrap().symbol.variants.len(), 2);

    let mut rebuilt = RootIndex::new();
    rebuilt.rebuild_all(program.tree());
    assert_eq!(&rebuilt, program.index());
}

// =============================================================================
// Lookups inside a unit
// =============================================================================

#[test]
fn unit_sees_pending_runtime_does_not() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_constant(constant("A::X", 1));
    assert!(unit.find_constant("A::X").is_ok());
    assert!(unit.find_constant("X").is_ok());
    assert!(unit.find_namespace("A").is_ok());
    assert!(unit.program().resolve_constant("A::X").is_err());
    assert!(unit.program().find_namespace("A").is_err());
}

#[test]
fn unit_lookup_uses_context() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_constant(constant("X", 0));
    unit.enter_namespace("A", 0, loc(1));
    unit.declare_constant(constant("X", 1));
    let inside = unit.find_constant("X").unwrap();
    assert_eq!(unit.program().get_path(inside.namespace, false), "A");
    unit.leave_namespace();
    let outside = unit.find_constant("X").unwrap();
    assert_eq!(outside.namespace, unit.program().root());
}

#[test]
fn committed_shallow_beats_pending_deep() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_constant(constant("N1::n", 1));
    unit.finish().unwrap();

    let mut unit = program.begin_parse();
    unit.declare_constant(constant("N2::Deep::n", 2));
    let found = unit.find_constant("n").unwrap();
    assert_eq!(unit.program().get_path(found.namespace, false), "N1");
}

#[test]
fn pending_wins_at_equal_depth() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_constant(constant("N1::n", 1));
    unit.finish().unwrap();

    let mut unit = program.begin_parse();
    unit.declare_constant(constant("N2::n", 2));
    let found = unit.find_constant("n").unwrap();
    assert_eq!(unit.program().get_path(found.namespace, false), "N2");
    unit.finish().unwrap();

    let found = program.resolve_constant("n").unwrap();
    assert_eq!(program.get_path(found.namespace, false), "N2");
}

// =============================================================================
// Rollback
// =============================================================================

#[test]
fn rollback_discards_namespaces_and_symbols() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_constant(constant("Kept::X", 1));
    unit.finish().unwrap();
    let snapshot = program.snapshot();
    let index = program.index().clone();
    let serial = program.next_serial;

    let mut unit = program.begin_parse();
    let ns = unit.declare_constant(constant("Gone::Y", 1)).unwrap();
    unit.declare_constant(constant("Kept::Z", 1));
    unit.report(Error::InternalConsistency {
        detail: "parser gave up".into(),
    });
    let diagnostics = unit.finish().unwrap_err();
    assert_eq!(diagnostics.len(), 1);

    assert_eq!(program.snapshot(), snapshot);
    assert_eq!(program.index(), &index);
    assert_eq!(program.next_serial, serial);
    assert!(program.namespace(ns).is_none());
}

#[test]
fn rollback_restores_raised_namespace_flags() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_constant(constant("A::B::x", 1));
    unit.finish().unwrap();
    let outer = program.find_namespace("A").unwrap();
    let inner = program.find_namespace("A::B").unwrap();

    let mut unit = program.begin_parse();
    unit.declare_constant(constant("A::B::y", 2).with_flags(flags::PUBLIC));
    assert!(unit.program().namespace(outer).unwrap().is_public());
    assert!(unit.program().namespace(inner).unwrap().is_public());
    assert!(unit.rollback().is_empty());

    assert_eq!(program.namespace(outer).unwrap().flags(), 0);
    assert_eq!(program.namespace(inner).unwrap().flags(), 0);

    {
        let mut unit = program.begin_parse();
        unit.declare_namespace("A", flags::PUBLIC, loc(2));
    }
    assert!(!program.namespace(outer).unwrap().is_public());
}

#[test]
fn dropping_unit_rolls_back() {
    let mut program = Program::default();
    {
        let mut unit = program.begin_parse();
        unit.declare_constant(constant("A::X", 1));
    }
    assert!(program.snapshot().is_empty());
    assert_eq!(program.tree().len(), 1);
}

// =============================================================================
// Assimilate
// =============================================================================

fn detached() -> crate::namespace::NamespaceTree {
    let mut nested = Program::default();
    let mut unit = nested.begin_parse();
    unit.declare_class(Class::new("Inner::K", loc(1)));
    unit.declare_constant(constant("Inner::C", 5));
    unit.declare_constant(constant("top", 6));
    unit.finish().unwrap();
    nested.into_tree()
}

#[test]
fn assimilate_moves_tree_into_pending() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    let at = unit.declare_namespace("Host", 0, loc(1)).unwrap();
    assert_eq!(unit.assimilate(at, detached()), 3);
    assert!(unit.find_class("Host::Inner::K").is_ok());
    assert!(unit.program().resolve_class("Host::Inner::K").is_err());
    unit.finish().unwrap();

    assert_eq!(program.constant_value("Host::Inner::C").unwrap(), ConstExpr::int(5));
    assert_eq!(program.constant_value("Host::top").unwrap(), ConstExpr::int(6));
}

#[test]
fn assimilate_reports_collisions() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_constant(constant("top", 0));
    let root = unit.context();
    assert_eq!(unit.assimilate(root, detached()), 2);
    assert_eq!(unit.diagnostics().len(), 1);
    unit.finish().unwrap_err();
    assert!(program.snapshot().is_empty());
}

#[test]
fn assimilate_copies_class_handler() {
    let mut nested = Program::default();
    let mut unit = nested.begin_parse();
    let inner = unit.declare_namespace("Inner", 0, loc(1)).unwrap();
    unit.finish().unwrap();
    nested.register_class_handler(inner, |_: &str, name: &str| {
        Some(Class::new(name, SourceLocation::builtin()))
    });

    let mut program = Program::default();
    let mut unit = program.begin_parse();
    let root = unit.context();
    unit.assimilate(root, nested.into_tree());
    unit.finish().unwrap();

    let class = program.resolve_class("Inner::Anything").unwrap();
    assert_eq!(class.symbol.name, "Anything");
    let handler_ns = program.find_namespace("Inner").unwrap();
    assert!(program.namespace(handler_ns).unwrap().class_handler().is_some());
}

#[test]
fn resolved_handles_survive_later_commits() {
    let mut program = Program::default();
    let mut unit = program.begin_parse();
    unit.declare_constant(constant("X", 1));
    unit.finish().unwrap();
    let handle = program.resolve_constant("X").unwrap();

    let mut unit = program.begin_parse();
    unit.declare_constant(constant("Other", 2));
    unit.finish().unwrap();

    let again = program.resolve_constant("X").unwrap();
    assert!(Arc::ptr_eq(&handle.symbol, &again.symbol));
    assert_eq!(program.tree().table::<Constant>(program.root()).unwrap().committed_len(), 2);
    assert!(program.tree().child(program.root(), "X", View::Committed).is_none());
}
