//! Single-variable tree evaluation, backing `Mapping::apply`/`unapply`
//! (an addition beyond the base algebra: SPEC_FULL.md §4.6 asks for a
//! convenience evaluator alongside the text a mapping hands to a host
//! expression engine, grounded on the teacher's `evaluate.rs` walker).
//!
//! A mapping's forward/inverse trees always carry exactly one free
//! variable by construction (`analyse::analyse` only ever substitutes a
//! single path through the tree), so this walker takes that variable's
//! name and numeric value directly rather than threading an environment.

use crate::error::{Result, UnitError};
use crate::fold::powf_checked;
use crate::sourcepos::Span;
use crate::tree::Node;

pub fn eval(node: &Node, var: &str, value: f64) -> Result<f64> {
    match node {
        Node::Const(v) => Ok(*v),
        Node::Pi => Ok(std::f64::consts::PI),
        Node::E => Ok(std::f64::consts::E),
        Node::Var(name) => {
            if name.as_ref() == var {
                Ok(value)
            } else {
                Err(UnitError::internal(format!(
                    "mapping tree referenced unexpected variable '{}'",
                    name
                )))
            }
        }
        Node::Log10(a) => {
            let x = eval(a, var, value)?;
            if x <= 0.0 {
                return Err(UnitError::domain(Span::none(), "log10 of a non-positive value"));
            }
            Ok(x.log10())
        }
        Node::Ln(a) => {
            let x = eval(a, var, value)?;
            if x <= 0.0 {
                return Err(UnitError::domain(Span::none(), "log of a non-positive value"));
            }
            Ok(x.ln())
        }
        Node::Exp(a) => Ok(eval(a, var, value)?.exp()),
        Node::Sqrt(a) => {
            let x = eval(a, var, value)?;
            if x < 0.0 {
                return Err(UnitError::domain(Span::none(), "sqrt of a negative value"));
            }
            Ok(x.sqrt())
        }
        Node::Pow(a, b) => {
            let base = eval(a, var, value)?;
            let exp = eval(b, var, value)?;
            powf_checked(base, exp)
        }
        Node::Div(a, b) => {
            let num = eval(a, var, value)?;
            let den = eval(b, var, value)?;
            if den == 0.0 {
                return Err(UnitError::domain(Span::none(), "division by zero"));
            }
            Ok(num / den)
        }
        Node::Mul(a, b) => Ok(eval(a, var, value)? * eval(b, var, value)?),
    }
}
