//! The two public entry points (spec §6): `unit_mapper`, which compiles a
//! numeric mapping and rewrites an axis label between a pair of unit
//! strings, and `unit_label`, which looks a single symbol's descriptive
//! text up in the catalogue.

use crate::analyse::{analyse, substitute_var, INPUT_UNITS};
use crate::algebra::invert;
use crate::catalogue::{expand_units, CATALOGUE};
use crate::complicate::complicate;
use crate::emit::{to_label_text, to_machine_text};
use crate::error::{Result, UnitError};
use crate::eval::eval;
use crate::fold::eval_const;
use crate::parser::parse_raw;
use crate::simplify::simplify;
use crate::sourcepos::Span;
use crate::tree::Node;

pub const OUTPUT_UNITS: &str = "output_units";

/// A compiled mapping from a value expressed in the input units to the
/// equivalent value in the output units.
#[derive(Debug, Clone, PartialEq)]
pub enum Mapping {
    /// The two unit systems measure the same quantity, no scaling needed.
    Identity,
    /// `out = k * in`, for some finite non-zero `k`.
    Scalar(f64),
    /// A mapping that is neither the identity nor a single scale factor:
    /// both directions are kept as trees (for `apply`/`unapply`) and as
    /// machine text (for a host expression evaluator, spec §4.6), each a
    /// function of a single free variable named `input_units` or
    /// `output_units` respectively.
    General {
        forward_text: String,
        inverse_text: String,
        forward: Node,
        inverse: Node,
    },
}

impl Mapping {
    /// Convert a value in the input units to the output units.
    pub fn apply(&self, x: f64) -> Result<f64> {
        match self {
            Mapping::Identity => Ok(x),
            Mapping::Scalar(k) => Ok(k * x),
            Mapping::General { forward, .. } => eval(forward, INPUT_UNITS, x),
        }
    }

    /// Convert a value in the output units back to the input units.
    pub fn unapply(&self, y: f64) -> Result<f64> {
        match self {
            Mapping::Identity => Ok(y),
            Mapping::Scalar(k) => Ok(y / k),
            Mapping::General { inverse, .. } => eval(inverse, OUTPUT_UNITS, y),
        }
    }
}

fn parse_units(text: &str) -> Result<Node> {
    if text.trim().is_empty() {
        return Ok(Node::constant(1.0));
    }
    let raw = parse_raw(text)?;
    let expanded = expand_units(&raw, Span::none())?;
    simplify(expanded)
}

fn compile_mapping(candidate: &Node) -> Result<Mapping> {
    if let Node::Var(name) = candidate {
        if name.as_ref() == INPUT_UNITS {
            return Ok(Mapping::Identity);
        }
    }
    if let Node::Mul(a, b) = candidate {
        if let (Some(k), Node::Var(name)) = (a.as_const(), b.as_ref()) {
            if name.as_ref() == INPUT_UNITS {
                return Ok(if (k - 1.0).abs() < 1e-12 {
                    Mapping::Identity
                } else {
                    Mapping::Scalar(k)
                });
            }
        }
    }

    let inverse = invert(candidate, Node::var(OUTPUT_UNITS)).ok_or_else(|| {
        UnitError::internal("dimensionally-agreeing mapping tree could not be inverted")
    })?;
    let forward = complicate(candidate.clone());
    let inverse = complicate(inverse);
    Ok(Mapping::General {
        forward_text: to_machine_text(&forward),
        inverse_text: to_machine_text(&inverse),
        forward,
        inverse,
    })
}

/// Replace every multiplicative constant directly adjacent to a `Var`,
/// `Pow` or `Sqrt` node with 1 (spec §4.6 "label mode specialisation"): a
/// label should read the same regardless of which scale the mapping
/// happens to apply, since the scale is carried by the numeric mapping,
/// not the axis caption.
fn neutralize_label_constants(node: Node) -> Node {
    fn is_unit_shaped(node: &Node) -> bool {
        matches!(node, Node::Var(_) | Node::Pow(_, _) | Node::Sqrt(_))
    }
    match node {
        Node::Mul(a, b) => {
            let a = neutralize_label_constants(*a);
            let b = neutralize_label_constants(*b);
            if a.is_const() && is_unit_shaped(&b) {
                Node::mul(Node::constant(1.0), b)
            } else if is_unit_shaped(&a) && b.is_const() {
                Node::mul(a, Node::constant(1.0))
            } else {
                Node::mul(a, b)
            }
        }
        Node::Div(a, b) => Node::div(neutralize_label_constants(*a), neutralize_label_constants(*b)),
        Node::Pow(a, b) => Node::pow(neutralize_label_constants(*a), *b),
        Node::Log10(a) => Node::log10(neutralize_label_constants(*a)),
        Node::Ln(a) => Node::ln(neutralize_label_constants(*a)),
        Node::Exp(a) => Node::exp(neutralize_label_constants(*a)),
        Node::Sqrt(a) => Node::sqrt(neutralize_label_constants(*a)),
        other => other,
    }
}

fn rewrite_label(candidate: &Node, in_label: &str) -> Result<String> {
    let substituted = substitute_var(candidate, INPUT_UNITS, &Node::var(in_label));
    let neutralized = simplify(neutralize_label_constants(substituted))?;
    let readable = complicate(neutralized);
    Ok(to_label_text(&readable))
}

/// Compile a numeric mapping between `in_units` and `out_units`, and, if
/// `in_label` is given, rewrite it into the corresponding output label.
///
/// Returns `(None, None)` when the two unit strings measure incompatible
/// quantities (spec §6): this is not an error, just "no mapping exists".
pub fn unit_mapper(
    in_units: &str,
    out_units: &str,
    in_label: Option<&str>,
) -> Result<(Option<Mapping>, Option<String>)> {
    let in_tree = parse_units(in_units)?;
    let out_tree = parse_units(out_units)?;

    let candidate = match analyse(&in_tree, &out_tree)? {
        Some(candidate) => candidate,
        None => return Ok((None, None)),
    };

    let mapping = compile_mapping(&candidate)?;
    let out_label = match in_label {
        Some(label) => Some(rewrite_label(&candidate, label)?),
        None => None,
    };
    Ok((Some(mapping), out_label))
}

/// Look up the descriptive text for a single unit symbol (spec §6), e.g.
/// `"m"` -> `"metres"`. Returns `None` for a symbol the catalogue does
/// not recognise, with or without a metric prefix.
pub fn unit_label(symbol: &str) -> Option<String> {
    CATALOGUE.label(symbol)
}
