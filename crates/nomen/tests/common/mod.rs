// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared test infrastructure for integration tests.
//!
//! This module provides:
//! - [`init_tracing`] - Installs a `tracing` subscriber driven by `RUST_LOG`
//! - Small builders for declarations and committed programs
//!
//! # Design
//!
//! This module is **not** a test file, so it must comply with full clippy rules.
//! Test-specific allowances (like `unwrap_used`) are only permitted in `*_test.rs` files.

#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use nomen::{
    CommitSummary, ConstExpr, Constant, Diagnostics, Function, FunctionVariant, NameScope, Param,
    ParseUnit, Program, SourceLocation,
};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once per binary. Later calls are no-ops.
pub fn init_tracing() {
    let _already_installed = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A location in a fake script file.
pub fn at(line: u32) -> SourceLocation {
    SourceLocation::new("test.q", line, 1)
}

/// A function with one variant taking parameters of the given type names.
pub fn function(name: &str, flags: u32, param_types: &[&str]) -> Function {
    let params = param_types
        .iter()
        .enumerate()
        .map(|(i, ty)| Param::new(format!("p{i}"), NameScope::parse(ty).ok()))
        .collect();
    Function::new(name, flags, FunctionVariant::new(params, None, at(1)))
}

/// An integer constant.
pub fn int_constant(name: &str, value: i64) -> Constant {
    Constant::new(name, at(1), ConstExpr::int(value))
}

/// Run one parse unit on `program` and commit it.
pub fn commit(
    program: &mut Program,
    declare: impl FnOnce(&mut ParseUnit<'_>),
) -> Result<CommitSummary, Diagnostics> {
    let mut unit = program.begin_parse();
    declare(&mut unit);
    unit.finish()
}
