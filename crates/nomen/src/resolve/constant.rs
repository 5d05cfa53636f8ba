// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Constant expansion and folding.
//!
//! References are substituted depth-first relative to the namespace of the
//! constant that contains them. Every followed reference counts against the
//! configured ceiling, which is how cycles (`A = B`, `B = A`) are caught.
//! Operators are folded once both operands are literals.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use super::{Resolved, Resolver};
use crate::error::Error;
use crate::symbol::{BinaryOp, ConstExpr, Constant, UnaryOp};
use crate::types::NamespaceId;

impl Resolver<'_> {
    /// The fully expanded value of a resolved constant.
    ///
    /// Uses the cached value when the second parse stage already computed it.
    pub(crate) fn constant_value(&self, constant: &Resolved<Constant>) -> Result<ConstExpr, Error> {
        if let Some(value) = &constant.symbol.value {
            return Ok(value.clone());
        }
        self.expand(
            constant.namespace,
            &constant.symbol.name,
            &constant.symbol.expr,
            0,
        )
    }

    /// Expand `expr`, which belongs to constant `owner` declared in `ns`.
    pub(crate) fn expand(
        &self,
        ns: NamespaceId,
        owner: &str,
        expr: &ConstExpr,
        depth: usize,
    ) -> Result<ConstExpr, Error> {
        match expr {
            ConstExpr::Nil
            | ConstExpr::Bool(_)
            | ConstExpr::Int(_)
            | ConstExpr::Float(_)
            | ConstExpr::Str(_) => Ok(expr.clone()),
            ConstExpr::List(items) => items
                .iter()
                .map(|item| self.expand(ns, owner, item, depth))
                .collect::<Result<Vec<_>, _>>()
                .map(ConstExpr::List),
            ConstExpr::Hash(entries) => entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), self.expand(ns, owner, value, depth)?)))
                .collect::<Result<Vec<_>, Error>>()
                .map(ConstExpr::Hash),
            ConstExpr::Ref(name) => {
                let limit = self.config().max_constant_depth;
                if depth >= limit {
                    return Err(Error::RecursiveConstant {
                        name: owner.to_owned(),
                        limit,
                    });
                }
                let target = self.with_context(Some(ns)).resolve::<Constant>(name)?;
                match &target.symbol.value {
                    Some(value) => Ok(value.clone()),
                    None => self.expand(target.namespace, owner, &target.symbol.expr, depth + 1),
                }
            }
            ConstExpr::Unary(op, operand) => {
                let operand = self.expand(ns, owner, operand, depth)?;
                fold_unary(owner, *op, operand)
            }
            ConstExpr::Binary(op, lhs, rhs) => {
                let lhs = self.expand(ns, owner, lhs, depth)?;
                let rhs = self.expand(ns, owner, rhs, depth)?;
                fold_binary(owner, *op, lhs, rhs)
            }
        }
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> Error {
    Error::InvalidConstant {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

fn fold_unary(name: &str, op: UnaryOp, operand: ConstExpr) -> Result<ConstExpr, Error> {
    match (op, operand) {
        (UnaryOp::Neg, ConstExpr::Int(n)) => Ok(ConstExpr::Int(-n)),
        (UnaryOp::Neg, ConstExpr::Float(x)) => Ok(ConstExpr::Float(-x)),
        (UnaryOp::Not, ConstExpr::Bool(b)) => Ok(ConstExpr::Bool(!b)),
        (UnaryOp::Neg, other) => Err(invalid(name, format!("cannot negate {other}"))),
        (UnaryOp::Not, other) => Err(invalid(name, format!("cannot apply '!' to {other}"))),
    }
}

fn fold_binary(
    name: &str,
    op: BinaryOp,
    lhs: ConstExpr,
    rhs: ConstExpr,
) -> Result<ConstExpr, Error> {
    match (lhs, rhs) {
        (ConstExpr::Int(a), ConstExpr::Int(b)) => fold_int(name, op, &a, &b),
        (ConstExpr::Str(a), ConstExpr::Str(b)) if op == BinaryOp::Add => {
            Ok(ConstExpr::Str(a + &b))
        }
        (ConstExpr::List(mut a), ConstExpr::List(b)) if op == BinaryOp::Add => {
            a.extend(b);
            Ok(ConstExpr::List(a))
        }
        (lhs, rhs) => match (as_float(&lhs), as_float(&rhs)) {
            (Some(a), Some(b)) => fold_float(name, op, a, b),
            _ => Err(invalid(
                name,
                format!("unsupported operands for '{}': {lhs} and {rhs}", op.as_str()),
            )),
        },
    }
}

fn as_float(expr: &ConstExpr) -> Option<f64> {
    match expr {
        ConstExpr::Int(n) => n.to_f64(),
        ConstExpr::Float(x) => Some(*x),
        _ => None,
    }
}

fn fold_int(name: &str, op: BinaryOp, a: &BigInt, b: &BigInt) -> Result<ConstExpr, Error> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Mod if b.is_zero() => {
            return Err(invalid(name, "division by zero"));
        }
        BinaryOp::Div => a.div_floor(b),
        BinaryOp::Mod => a.mod_floor(b),
    };
    Ok(ConstExpr::Int(value))
}

fn fold_float(name: &str, op: BinaryOp, a: f64, b: f64) -> Result<ConstExpr, Error> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => {
            return Err(invalid(name, "division by zero"));
        }
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a - b * (a / b).floor(),
    };
    Ok(ConstExpr::Float(value))
}
