// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Resolved type references produced by the second parse stage.

use core::fmt;

/// Built-in type names that resolve without a namespace lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `int`
    Int,
    /// `float`
    Float,
    /// `number`
    Number,
    /// `bool`
    Bool,
    /// `string`
    String,
    /// `list`
    List,
    /// `hash`
    Hash,
    /// `binary`
    Binary,
    /// `date`
    Date,
    /// `object`
    Object,
    /// `nothing`
    Nothing,
    /// `any`, also used for untyped parameters.
    Any,
}

impl Primitive {
    /// Look up a primitive by its source name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let p = match name {
            "int" => Self::Int,
            "float" => Self::Float,
            "number" => Self::Number,
            "bool" => Self::Bool,
            "string" => Self::String,
            "list" => Self::List,
            "hash" => Self::Hash,
            "binary" => Self::Binary,
            "date" => Self::Date,
            "object" => Self::Object,
            "nothing" => Self::Nothing,
            "any" => Self::Any,
            _ => return None,
        };
        Some(p)
    }

    /// The source name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::String => "string",
            Self::List => "list",
            Self::Hash => "hash",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::Object => "object",
            Self::Nothing => "nothing",
            Self::Any => "any",
        }
    }
}

/// A type name after resolution.
///
/// Class and hashdecl references carry the declaration's fully qualified
/// path rather than a namespace id, so they stay meaningful when the symbol
/// is copied into another program by a merge.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    /// A built-in type.
    Primitive(Primitive),
    /// A class, by qualified path.
    Class(String),
    /// A hashdecl, by qualified path.
    HashDecl(String),
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.as_str()),
            Self::Class(path) => write!(f, "class {path}"),
            Self::HashDecl(path) => write!(f, "hash<{path}>"),
        }
    }
}
