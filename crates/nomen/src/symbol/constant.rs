// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Constant symbols and constant expressions.

use core::fmt;

use num_bigint::BigInt;

use super::{Symbol, SymbolKind};
use crate::error::Error;
use crate::name_scope::NameScope;
use crate::types::SourceLocation;

/// Unary operators allowed in constant expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical not.
    Not,
}

/// Binary operators allowed in constant expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+` (numbers, strings, lists).
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/` (floor division for integers).
    Div,
    /// `%` (floor modulo for integers).
    Mod,
}

impl BinaryOp {
    /// Operator token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

/// The value expression of a constant.
///
/// After resolution a constant's value contains no `Ref`, `Unary` or
/// `Binary` nodes.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstExpr {
    /// `NOTHING`
    Nil,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal (arbitrary precision).
    Int(BigInt),
    /// Float literal.
    Float(f64),
    /// String literal.
    Str(String),
    /// List of expressions.
    List(Vec<ConstExpr>),
    /// Hash of key/expression pairs, in source order.
    Hash(Vec<(String, ConstExpr)>),
    /// Reference to another constant.
    Ref(NameScope),
    /// Unary operation.
    Unary(UnaryOp, Box<ConstExpr>),
    /// Binary operation.
    Binary(BinaryOp, Box<ConstExpr>, Box<ConstExpr>),
}

impl ConstExpr {
    /// Integer literal from a machine integer.
    #[must_use]
    pub fn int(n: i64) -> Self {
        Self::Int(BigInt::from(n))
    }

    /// String literal.
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Reference to another constant by (possibly qualified) name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedName`] if `name` does not parse.
    pub fn reference(name: &str) -> Result<Self, Error> {
        Ok(Self::Ref(NameScope::parse(name)?))
    }

    /// Binary operation.
    #[must_use]
    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// True if the expression contains no references or operators.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        match self {
            Self::Nil | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_) => true,
            Self::List(items) => items.iter().all(Self::is_literal),
            Self::Hash(entries) => entries.iter().all(|(_, v)| v.is_literal()),
            Self::Ref(_) | Self::Unary(..) | Self::Binary(..) => false,
        }
    }
}

impl fmt::Display for ConstExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("NOTHING"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Hash(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Ref(name) => write!(f, "{name}"),
            Self::Unary(UnaryOp::Neg, e) => write!(f, "-{e}"),
            Self::Unary(UnaryOp::Not, e) => write!(f, "!{e}"),
            Self::Binary(op, l, r) => write!(f, "({l} {} {r})", op.as_str()),
        }
    }
}

/// A constant declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    /// Bare name.
    pub name: String,
    /// Declaration site.
    pub location: SourceLocation,
    /// Flag bits.
    pub flags: u32,
    /// The expression as declared.
    pub expr: ConstExpr,
    /// Fully expanded value, cached by the second parse stage.
    pub value: Option<ConstExpr>,
}

impl Constant {
    /// Create a constant.
    #[must_use]
    pub fn new(name: impl Into<String>, location: SourceLocation, expr: ConstExpr) -> Self {
        Self {
            name: name.into(),
            location,
            flags: 0,
            expr,
            value: None,
        }
    }

    /// Set the flag bits.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

impl Symbol for Constant {
    const KIND: SymbolKind = SymbolKind::Constant;

    fn name(&self) -> &str {
        &self.name
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn location(&self) -> &SourceLocation {
        &self.location
    }

    symbol_slots!(constants, constants);
}
