// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Parsed qualified names.
//!
//! A `NameScope` is the immutable segment list of a name such as `A::B::c`.
//! A leading `::` anchors the name at the root namespace.

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// Separator between namespace segments.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// A parsed, possibly qualified name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NameScope {
    raw: String,
    segments: Vec<String>,
    anchored: bool,
}

impl NameScope {
    /// Parse a raw name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedName`] if the name is empty or contains an
    /// empty segment (`A::::b`, trailing `::`, a bare `::`).
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedName {
            raw: raw.to_owned(),
        };

        let (anchored, body) = match raw.strip_prefix(NAMESPACE_SEPARATOR) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        if body.is_empty() {
            return Err(malformed());
        }

        let segments: Vec<String> = body
            .split(NAMESPACE_SEPARATOR)
            .map(str::trim)
            .map(str::to_owned)
            .collect();
        if segments.iter().any(String::is_empty) {
            return Err(malformed());
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
            anchored,
        })
    }

    /// Build a name from already-split segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedName`] if there are no segments or any
    /// segment is empty or contains the separator.
    pub fn from_segments<S: AsRef<str>>(segments: &[S], anchored: bool) -> Result<Self, Error> {
        let joined = segments
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(NAMESPACE_SEPARATOR);
        let bad = segments.is_empty()
            || segments
                .iter()
                .any(|s| s.as_ref().is_empty() || s.as_ref().contains(NAMESPACE_SEPARATOR));
        if bad {
            return Err(Error::MalformedName { raw: joined });
        }

        let raw = if anchored {
            format!("{NAMESPACE_SEPARATOR}{joined}")
        } else {
            joined
        };
        Ok(Self {
            raw,
            segments: segments.iter().map(|s| s.as_ref().to_owned()).collect(),
            anchored,
        })
    }

    /// Segment at position `i`, if any.
    #[must_use]
    pub fn segment(&self, i: usize) -> Option<&str> {
        self.segments.get(i).map(String::as_str)
    }

    /// Number of segments (always at least one).
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// All segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment: the bare identifier being named.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Segments naming the enclosing namespace path (all but the last).
    #[must_use]
    pub fn namespace_path(&self) -> &[String] {
        let len = self.segments.len().saturating_sub(1);
        &self.segments[..len]
    }

    /// True if the name has more than one segment.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }

    /// True if the name started with `::`.
    #[must_use]
    pub const fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// The name as originally written.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl FromStr for NameScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NameScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
