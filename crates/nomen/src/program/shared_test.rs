// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the thread-shared program.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::{Program, SharedProgram};
use crate::error::Error;
use crate::merge::Module;
use crate::symbol::{Class, ConstExpr, Constant, Function, FunctionVariant};
use crate::types::{ModuleId, SourceLocation, flags};

fn loc() -> SourceLocation {
    SourceLocation::new("s.q", 1, 1)
}

fn function(name: &str) -> Function {
    Function::new(name, flags::PUBLIC, FunctionVariant::new(Vec::new(), None, loc()))
}

#[test]
fn readers_do_not_see_pending_state() {
    let shared = SharedProgram::default();
    let mut unit = shared.begin_parse();
    unit.declare(function("A::f"));
    assert!(unit.find::<Function>("A::f").is_ok());
    assert!(unit.find_namespace("A").is_ok());

    assert!(matches!(
        shared.resolve_function("A::f"),
        Err(Error::NamespaceSegmentNotFound { .. })
    ));

    let summary = unit.finish().unwrap();
    assert_eq!(summary.symbols, 1);
    assert_eq!(summary.namespaces, 1);
    assert!(shared.resolve_function("A::f").is_ok());
}

#[test]
fn readers_resolve_while_unit_is_open() {
    let shared = SharedProgram::default();
    {
        let mut unit = shared.begin_parse();
        unit.declare(Constant::new("BASE", loc(), ConstExpr::int(40)));
        unit.finish().unwrap();
    }

    let reader = &shared;
    let mut unit = shared.begin_parse();
    std::thread::scope(|s| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(move || {
                    for _ in 0..50 {
                        assert_eq!(reader.constant_value("BASE").unwrap(), ConstExpr::int(40));
                        assert!(reader.resolve_function("late").is_err());
                    }
                })
            })
            .collect();
        for i in 0..20 {
            unit.declare(Constant::new(format!("C{i}"), loc(), ConstExpr::int(i)));
        }
        unit.declare(function("late"));
        for handle in readers {
            handle.join().unwrap();
        }
    });
    unit.finish().unwrap();

    assert!(shared.resolve_function("late").is_ok());
    assert_eq!(shared.constant_value("C19").unwrap(), ConstExpr::int(19));
}

#[test]
fn dropped_unit_rolls_back() {
    let shared = SharedProgram::default();
    {
        let mut unit = shared.begin_parse();
        let tmp = unit.enter_namespace("Tmp", 0, loc()).unwrap();
        unit.declare(Class::new("K", loc()));
        assert!(unit.find_class("Tmp::K").is_ok());
        assert_eq!(unit.leave_namespace(), Some(tmp));
        assert_eq!(unit.leave_namespace(), None);
    }
    assert!(shared.find_namespace("Tmp").is_err());
    assert!(shared.read().snapshot().is_empty());
    assert_eq!(shared.read().next_serial, 0);
}

#[test]
fn reported_errors_roll_back_on_finish() {
    let shared = SharedProgram::default();
    let mut unit = shared.begin_parse();
    unit.declare(function("f"));
    unit.report(Error::MalformedName {
        raw: "a::::b".into(),
    });
    assert_eq!(unit.diagnostics().len(), 1);

    let diagnostics = unit.finish().unwrap_err();
    assert_eq!(diagnostics.len(), 1);
    assert!(shared.resolve_function("f").is_err());
}

#[test]
fn explicit_rollback() {
    let shared = SharedProgram::default();
    let mut unit = shared.begin_parse();
    unit.declare(function("f"));
    let diagnostics = unit.rollback();
    assert!(diagnostics.is_empty());
    assert!(shared.resolve_function("f").is_err());

    // A new unit can be opened after the rollback.
    let mut unit = shared.begin_parse();
    unit.declare(function("g"));
    unit.finish().unwrap();
    assert!(shared.resolve_function("g").is_ok());
}

#[test]
fn exclusive_merge_and_into_inner() {
    let mut library = Program::default();
    let mut unit = library.begin_parse();
    unit.declare_namespace("Lib", flags::PUBLIC, loc());
    unit.declare_function(function("Lib::api"));
    unit.finish().unwrap();
    let module = Module::new(ModuleId(7), "lib", library);

    let shared = SharedProgram::new(Program::default());
    let report = shared
        .with_exclusive(|program| program.merge_public_from(&module))
        .unwrap();
    assert_eq!(report.symbols, 1);
    assert!(shared.resolve_function("Lib::api").is_ok());

    let program = shared.into_inner();
    let lib = program.find_namespace("Lib").unwrap();
    assert!(flags::has(program.namespace(lib).unwrap().flags(), flags::IMPORTED));
}
