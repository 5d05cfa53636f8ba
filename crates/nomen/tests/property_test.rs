// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Property tests for rollback, shadowing and merge depth invariants.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{at, commit, function, int_constant};
use nomen::{
    Class, Error, GlobalVar, HashDecl, Module, ModuleId, ModuleMerger, ParseUnit, Program, View,
    flags,
};
use proptest::prelude::*;

/// One declaration a parse unit can make.
#[derive(Clone, Debug)]
enum Decl {
    Namespace(String),
    Class(String),
    HashDecl(String),
    Function(String, &'static str),
    Constant(String, i64),
    Global(String),
}

fn qualified(path: Vec<&'static str>, ident: &'static str) -> String {
    let mut segments = path;
    segments.push(ident);
    segments.join("::")
}

fn name() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(prop::sample::select(vec!["A", "B", "C"]), 0..3),
        prop::sample::select(vec!["x", "y", "K", "B"]),
    )
        .prop_map(|(path, ident)| qualified(path, ident))
}

fn decl() -> impl Strategy<Value = Decl> {
    prop_oneof![
        name().prop_map(Decl::Namespace),
        name().prop_map(Decl::Class),
        name().prop_map(Decl::HashDecl),
        (name(), prop::sample::select(vec!["int", "string", "any"]))
            .prop_map(|(n, ty)| Decl::Function(n, ty)),
        (name(), -5i64..5).prop_map(|(n, v)| Decl::Constant(n, v)),
        name().prop_map(Decl::Global),
    ]
}

fn apply(unit: &mut ParseUnit<'_>, decls: &[Decl]) {
    for decl in decls {
        match decl {
            Decl::Namespace(n) => {
                unit.declare_namespace(n, 0, at(1));
            }
            Decl::Class(n) => {
                unit.declare_class(Class::new(n.as_str(), at(2)));
            }
            Decl::HashDecl(n) => {
                unit.declare_hashdecl(HashDecl::new(n.as_str(), at(3), Vec::new()));
            }
            Decl::Function(n, ty) => {
                unit.declare_function(function(n, 0, &[*ty]));
            }
            Decl::Constant(n, v) => {
                unit.declare_constant(int_constant(n, *v));
            }
            Decl::Global(n) => {
                unit.declare_global_var(GlobalVar::new(n.as_str(), at(4), None));
            }
        }
    }
}

fn chain(prefix: &str, depth: usize) -> Vec<String> {
    (0..depth).map(|i| format!("{prefix}{i}")).collect()
}

proptest! {
    #[test]
    fn rollback_restores_committed_state(
        base in prop::collection::vec(decl(), 0..12),
        attempt in prop::collection::vec(decl(), 1..12),
        fail in any::<bool>(),
    ) {
        let mut program = Program::default();
        drop(commit(&mut program, |unit| apply(unit, &base)));

        let snapshot = program.snapshot();
        let index = program.index().clone();
        let namespaces = program.tree().len();

        let mut unit = program.begin_parse();
        apply(&mut unit, &attempt);
        if fail {
            unit.report(Error::MalformedName { raw: "::".into() });
            prop_assert!(unit.finish().is_err());
        } else {
            drop(unit.rollback());
        }

        prop_assert_eq!(program.snapshot(), snapshot);
        prop_assert_eq!(program.index(), &index);
        prop_assert_eq!(program.tree().len(), namespaces);
    }

    #[test]
    fn shallower_committed_symbol_beats_deeper_pending(
        committed_depth in 0usize..3,
        extra in 1usize..3,
        as_function in any::<bool>(),
    ) {
        let near = chain("L", committed_depth);
        let far = chain("M", committed_depth + extra);
        let in_path = |path: &[String]| {
            path.iter()
                .map(String::as_str)
                .chain(["n"])
                .collect::<Vec<_>>()
                .join("::")
        };

        let mut program = Program::default();
        commit(&mut program, |unit| {
            if as_function {
                unit.declare_function(function(&in_path(&near), 0, &[]));
            } else {
                unit.declare_constant(int_constant(&in_path(&near), 1));
            }
        })
        .unwrap();
        let owner = if near.is_empty() {
            program.root()
        } else {
            program.find_namespace(&near.join("::")).unwrap()
        };

        let mut unit = program.begin_parse();
        if as_function {
            unit.declare_function(function(&in_path(&far), 0, &["int"]));
            prop_assert_eq!(unit.find_function("n").unwrap().namespace, owner);
        } else {
            unit.declare_constant(int_constant(&in_path(&far), 2));
            prop_assert_eq!(unit.find_constant("n").unwrap().namespace, owner);
        }
        unit.finish().unwrap();

        let winner = if as_function {
            program.resolve_function("n").unwrap().namespace
        } else {
            program.resolve_constant("n").unwrap().namespace
        };
        prop_assert_eq!(winner, owner);
    }

    #[test]
    fn merged_subtree_depths_follow_parents(
        source_depth in 1usize..4,
        target_depth in 0usize..3,
        overlap in any::<bool>(),
    ) {
        let mut library = Program::default();
        commit(&mut library, |unit| {
            for segment in chain("S", source_depth) {
                unit.enter_namespace(&segment, flags::PUBLIC, at(1));
                unit.declare_function(function("f", flags::PUBLIC, &[]));
            }
        })
        .unwrap();
        let module = Module::new(ModuleId(3), "lib", library);

        let target_path = chain("T", target_depth);
        let mut program = Program::default();
        commit(&mut program, |unit| {
            for segment in &target_path {
                unit.enter_namespace(segment, 0, at(2));
            }
            if overlap {
                unit.declare_namespace("S0", flags::PUBLIC, at(3));
            }
        })
        .unwrap();
        let mount = if target_path.is_empty() {
            program.root()
        } else {
            program.find_namespace(&target_path.join("::")).unwrap()
        };

        let report = ModuleMerger::public(&module).apply(&mut program, mount).unwrap();
        prop_assert_eq!(report.symbols, source_depth);

        let tree = program.tree();
        for id in tree.walk(View::Committed) {
            let ns = tree.get(id).unwrap();
            match ns.parent() {
                Some(parent) => prop_assert_eq!(ns.depth(), tree.get(parent).unwrap().depth() + 1),
                None => prop_assert_eq!(ns.depth(), 0),
            }
        }

        let deepest = target_path
            .iter()
            .cloned()
            .chain(chain("S", source_depth))
            .collect::<Vec<_>>()
            .join("::");
        let resolved = program.resolve_function(&format!("{deepest}::f")).unwrap();
        prop_assert_eq!(
            tree.get(resolved.namespace).unwrap().depth() as usize,
            target_depth + source_depth
        );
    }
}
