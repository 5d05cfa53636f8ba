// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Error taxonomy and the per-parse-unit diagnostic sink.

use core::fmt;

use crate::symbol::SymbolKind;
use crate::types::SourceLocation;

/// Every failure the namespace subsystem can report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A qualified name could not be split into segments.
    MalformedName {
        /// The name as written.
        raw: String,
    },
    /// A name is already taken in the target namespace.
    DuplicateSymbol {
        /// Kind of the rejected declaration.
        kind: SymbolKind,
        /// Kind of the declaration already holding the name.
        existing: SymbolKind,
        /// Bare name in conflict.
        name: String,
        /// Path of the namespace where the conflict happened.
        namespace: String,
        /// Where the rejected declaration was written.
        location: SourceLocation,
        /// Where the existing declaration was written.
        previous: SourceLocation,
    },
    /// A qualified lookup failed while walking the namespace path.
    NamespaceSegmentNotFound {
        /// The full name being resolved.
        name: String,
        /// The first segment that could not be found.
        segment: String,
        /// Number of leading path segments that did resolve.
        matched: usize,
    },
    /// The namespace path resolved but the final identifier is not in it.
    IdentifierNotFound {
        /// Kind that was looked up.
        kind: SymbolKind,
        /// The full name being resolved.
        name: String,
        /// Path of the namespace that was searched.
        namespace: String,
        /// Number of path segments that resolved (all of them).
        matched: usize,
    },
    /// An unqualified lookup found nothing.
    NotFound {
        /// Kind that was looked up.
        kind: SymbolKind,
        /// The bare name.
        name: String,
    },
    /// Constant expansion exceeded the recursion ceiling.
    RecursiveConstant {
        /// Constant whose expansion hit the ceiling.
        name: String,
        /// The configured ceiling.
        limit: usize,
    },
    /// A type name used by a declaration did not resolve.
    UnknownType {
        /// The type name as written.
        type_name: String,
        /// Declaration that used it.
        owner: String,
        /// Where the declaration was written.
        location: SourceLocation,
    },
    /// A constant expression could not be folded.
    InvalidConstant {
        /// Constant being evaluated.
        name: String,
        /// What went wrong.
        reason: String,
    },
    /// A module merge would overwrite an existing name.
    MergeCollision {
        /// Kind of the incoming symbol.
        kind: SymbolKind,
        /// Kind of the symbol already in the target.
        existing: SymbolKind,
        /// Bare name in conflict.
        name: String,
        /// Target namespace path.
        namespace: String,
    },
    /// An invariant the declaration checks should have guaranteed was broken.
    InternalConsistency {
        /// Description of the broken invariant.
        detail: String,
    },
}

impl Error {
    /// Number of matched segments for qualified lookup failures.
    #[must_use]
    pub const fn matched_segments(&self) -> Option<usize> {
        match self {
            Self::NamespaceSegmentNotFound { matched, .. }
            | Self::IdentifierNotFound { matched, .. } => Some(*matched),
            _ => None,
        }
    }

    /// True for lookup failures (as opposed to declaration errors).
    #[must_use]
    pub const fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::NamespaceSegmentNotFound { .. }
                | Self::IdentifierNotFound { .. }
                | Self::NotFound { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedName { raw } => write!(f, "malformed name '{raw}'"),
            Self::DuplicateSymbol {
                kind,
                existing,
                name,
                namespace,
                location,
                previous,
            } => write!(
                f,
                "{location}: {kind} '{name}' clashes with {existing} '{name}' in namespace '{namespace}' (declared at {previous})"
            ),
            Self::NamespaceSegmentNotFound {
                name,
                segment,
                matched,
            } => write!(
                f,
                "cannot resolve namespace '{segment}' in '{name}' ({matched} segment(s) matched)"
            ),
            Self::IdentifierNotFound {
                kind,
                name,
                namespace,
                ..
            } => write!(f, "no {kind} '{name}' in namespace '{namespace}'"),
            Self::NotFound { kind, name } => write!(f, "no {kind} '{name}' is defined"),
            Self::RecursiveConstant { name, limit } => write!(
                f,
                "recursive constant definition: expanding '{name}' exceeded depth {limit}"
            ),
            Self::UnknownType {
                type_name,
                owner,
                location,
            } => write!(f, "{location}: unknown type '{type_name}' used by '{owner}'"),
            Self::InvalidConstant { name, reason } => {
                write!(f, "cannot evaluate constant '{name}': {reason}")
            }
            Self::MergeCollision {
                kind,
                existing,
                name,
                namespace,
            } => write!(
                f,
                "cannot merge {kind} '{name}' into namespace '{namespace}': {existing} with that name already exists"
            ),
            Self::InternalConsistency { detail } => {
                write!(f, "internal consistency violation: {detail}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Ordered collection of errors reported by one parse unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Error>);

impl Diagnostics {
    /// Create an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record an error.
    pub fn push(&mut self, error: Error) {
        self.0.push(error);
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the recorded errors in order.
    pub fn iter(&self) -> core::slice::Iter<'_, Error> {
        self.0.iter()
    }

    /// Consume the sink, returning `ok` if nothing was recorded.
    pub fn into_result<T>(self, ok: T) -> Result<T, Self> {
        if self.is_empty() { Ok(ok) } else { Err(self) }
    }

    /// The recorded errors.
    #[must_use]
    pub fn into_inner(self) -> Vec<Error> {
        self.0
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl From<Error> for Diagnostics {
    fn from(error: Error) -> Self {
        Self(vec![error])
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Error;
    type IntoIter = core::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
