//! Pure-constant evaluation, shared by the parser (folding a `**`/`^`
//! exponent atom down to the constant the invariant requires) and the
//! simplifier (the "FixConstants" pass of spec §4.4, collapsing any subtree
//! whose variable leaves have all been fixed to constants).
//!
//! Every domain error the engine can raise while folding (log/sqrt of a
//! non-positive value, `0**0`, a negative base to a non-integer power,
//! division by zero) is reported from here, in one place.

use crate::error::{Result, UnitError};
use crate::sourcepos::Span;
use crate::tree::Node;

/// Evaluate a tree known to contain no `Var` leaves. Panics (via an
/// `InternalError`) if called on a tree that still has one — callers must
/// check [`Node::is_pure_constant`] first.
pub fn eval_const(node: &Node) -> Result<f64> {
    match node {
        Node::Const(v) => Ok(*v),
        Node::Pi => Ok(std::f64::consts::PI),
        Node::E => Ok(std::f64::consts::E),
        Node::Var(name) => Err(UnitError::internal(format!(
            "eval_const called on a tree with unresolved variable {:?}",
            name
        ))),
        Node::Log10(a) => {
            let v = eval_const(a)?;
            if v <= 0.0 {
                Err(UnitError::domain(Span::none(), "log10 of a non-positive value"))
            } else {
                Ok(v.log10())
            }
        }
        Node::Ln(a) => {
            let v = eval_const(a)?;
            if v <= 0.0 {
                Err(UnitError::domain(Span::none(), "ln of a non-positive value"))
            } else {
                Ok(v.ln())
            }
        }
        Node::Exp(a) => Ok(eval_const(a)?.exp()),
        Node::Sqrt(a) => {
            let v = eval_const(a)?;
            if v < 0.0 {
                Err(UnitError::domain(Span::none(), "square root of a negative value"))
            } else {
                Ok(v.sqrt())
            }
        }
        Node::Pow(a, b) => powf_checked(eval_const(a)?, eval_const(b)?),
        Node::Div(a, b) => {
            let x = eval_const(a)?;
            let y = eval_const(b)?;
            if y == 0.0 {
                Err(UnitError::domain(Span::none(), "division by zero"))
            } else {
                Ok(x / y)
            }
        }
        Node::Mul(a, b) => Ok(eval_const(a)? * eval_const(b)?),
    }
}

/// `base.powf(exp)`, with the domain checks spec §4.4/§7 require: `0**0` is
/// undefined, and a negative base raised to a non-integer power is not a
/// real number.
pub fn powf_checked(base: f64, exp: f64) -> Result<f64> {
    if base == 0.0 && exp == 0.0 {
        Err(UnitError::domain(Span::none(), "0 raised to the power 0 is undefined"))
    } else if base < 0.0 && exp.fract() != 0.0 {
        Err(UnitError::domain(
            Span::none(),
            "negative base raised to a non-integer power",
        ))
    } else {
        Ok(base.powf(exp))
    }
}

/// Collapse `node` to a single `Const` if every leaf under it is already a
/// constant; otherwise return it unchanged.
pub fn fold_if_constant(node: Node) -> Result<Node> {
    if node.is_pure_constant() {
        Ok(Node::Const(eval_const(&node)?))
    } else {
        Ok(node)
    }
}
