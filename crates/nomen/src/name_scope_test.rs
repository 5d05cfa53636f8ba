// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for qualified name parsing.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::error::Error;
use crate::name_scope::NameScope;

#[test]
fn parse_bare_name() {
    let scope = NameScope::parse("foo").unwrap();
    assert_eq!(scope.segment_count(), 1);
    assert_eq!(scope.identifier(), "foo");
    assert!(!scope.is_qualified());
    assert!(!scope.is_anchored());
    assert!(scope.namespace_path().is_empty());
}

#[test]
fn parse_qualified_name() {
    let scope = NameScope::parse("A::B::c").unwrap();
    assert_eq!(scope.segments(), &["A", "B", "c"]);
    assert_eq!(scope.segment(0), Some("A"));
    assert_eq!(scope.segment(2), Some("c"));
    assert_eq!(scope.segment(3), None);
    assert_eq!(scope.identifier(), "c");
    assert_eq!(scope.namespace_path(), &["A", "B"]);
    assert!(scope.is_qualified());
}

#[test]
fn parse_anchored_name() {
    let scope = NameScope::parse("::A::x").unwrap();
    assert!(scope.is_anchored());
    assert_eq!(scope.segments(), &["A", "x"]);
    assert_eq!(scope.raw(), "::A::x");
    assert_eq!(scope.to_string(), "::A::x");

    let top = NameScope::parse("::x").unwrap();
    assert!(top.is_anchored());
    assert!(!top.is_qualified());
}

#[test]
fn parse_rejects_malformed_names() {
    for raw in ["", "::", "A::::b", "A::", "::A::", "A:: ::b"] {
        let err = NameScope::parse(raw).unwrap_err();
        assert!(
            matches!(err, Error::MalformedName { raw: ref r } if r == raw),
            "{raw:?} gave {err:?}"
        );
    }
}

#[test]
fn from_str_matches_parse() {
    let scope: NameScope = "Qore::Thread::Mutex".parse().unwrap();
    assert_eq!(scope, NameScope::parse("Qore::Thread::Mutex").unwrap());
}

#[test]
fn from_segments_builds_raw_form() {
    let scope = NameScope::from_segments(&["A", "B", "c"], false).unwrap();
    assert_eq!(scope.raw(), "A::B::c");
    let anchored = NameScope::from_segments(&["A", "c"], true).unwrap();
    assert_eq!(anchored.raw(), "::A::c");
    assert_eq!(anchored, NameScope::parse("::A::c").unwrap());
}

#[test]
fn from_segments_rejects_bad_segments() {
    let empty: [&str; 0] = [];
    assert!(NameScope::from_segments(&empty, false).is_err());
    assert!(NameScope::from_segments(&["A", ""], false).is_err());
    assert!(NameScope::from_segments(&["A::B"], false).is_err());
}
