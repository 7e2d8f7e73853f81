//! Tree algebra: structural comparison, factor extraction/recombination, and
//! function inversion (spec §4.3). These are the primitives the simplifier
//! (§4.4) and the dimensional analyser (§4.5) build on.

use std::cmp::Ordering;

use crate::error::{Result, UnitError};
use crate::fold::powf_checked;
use crate::sourcepos::Span;
use crate::tree::Node;

/// Structural comparison, suitable as a sort key. `exact = false` also
/// accepts a `Mul` node whose two children match the other tree's children
/// in swapped order — the "commutative compare" spec §4.3 rule 5 and §4.5's
/// candidate-tree comparison both rely on.
pub fn cmp(a: &Node, b: &Node, exact: bool) -> Ordering {
    let (oa, ob) = (a.opcode(), b.opcode());
    if oa != ob {
        return oa.cmp(&ob);
    }
    match (a, b) {
        (Node::Var(x), Node::Var(y)) => x.as_ref().cmp(y.as_ref()),
        (Node::Const(x), Node::Const(y)) => cmp_const(*x, *y),
        _ => {
            let ca = a.children();
            let cb = b.children();
            let natural = cmp_children(&ca, &cb, exact);
            if natural == Ordering::Equal {
                return Ordering::Equal;
            }
            if !exact && matches!(a, Node::Mul(_, _)) && ca.len() == 2 {
                let swapped = cmp(ca[0], cb[1], exact).then_with(|| cmp(ca[1], cb[0], exact));
                if swapped == Ordering::Equal {
                    return Ordering::Equal;
                }
            }
            natural
        }
    }
}

fn cmp_children(ca: &[&Node], cb: &[&Node], exact: bool) -> Ordering {
    for (x, y) in ca.iter().zip(cb.iter()) {
        let o = cmp(x, y, exact);
        if o != Ordering::Equal {
            return o;
        }
    }
    Ordering::Equal
}

fn cmp_const(a: f64, b: f64) -> Ordering {
    let tol = 1e5 * f64::max((a.abs() + b.abs()) * f64::EPSILON, f64::MIN_POSITIVE);
    if approx::abs_diff_eq!(a, b, epsilon = tol) {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// `coeff * product(factor_tree ** exponent)`, the decomposition
/// `FindFactors`/`CombineFactors` work over (spec §4.3).
#[derive(Debug, Clone)]
pub struct Factors {
    pub coeff: f64,
    pub factors: Vec<(Node, f64)>,
}

impl Factors {
    fn leaf(coeff: f64) -> Self {
        Factors {
            coeff,
            factors: Vec::new(),
        }
    }

    fn one_factor(node: Node) -> Self {
        Factors {
            coeff: 1.0,
            factors: vec![(node, 1.0)],
        }
    }

    fn add(&mut self, node: Node, exponent: f64) {
        if let Some(slot) = self.factors.iter_mut().find(|(f, _)| cmp(f, &node, false) == Ordering::Equal) {
            slot.1 += exponent;
        } else {
            self.factors.push((node, exponent));
        }
    }

    fn merge(mut self, other: Factors) -> Self {
        self.coeff *= other.coeff;
        for (f, e) in other.factors {
            self.add(f, e);
        }
        self
    }
}

/// Decompose `node` into a coefficient and a set of `(factor, exponent)`
/// pairs such that `node == coeff * product(factor ** exponent)`.
pub fn find_factors(node: &Node) -> Result<Factors> {
    match node {
        Node::Const(v) => Ok(Factors::leaf(*v)),
        Node::Mul(a, b) => Ok(find_factors(a)?.merge(find_factors(b)?)),
        Node::Div(a, b) => {
            let fa = find_factors(a)?;
            let fb = find_factors(b)?;
            if fb.coeff == 0.0 {
                return Err(UnitError::domain(Span::none(), "division by zero"));
            }
            let mut result = fa;
            result.coeff /= fb.coeff;
            for (f, e) in fb.factors {
                result.add(f, -e);
            }
            Ok(result)
        }
        Node::Pow(a, b) => {
            let k = b
                .as_const()
                .ok_or_else(|| UnitError::internal("find_factors: Pow exponent is not a constant"))?;
            let base = find_factors(a)?;
            let coeff = powf_checked(base.coeff, k)?;
            let factors = base.factors.into_iter().map(|(f, e)| (f, e * k)).collect();
            Ok(Factors { coeff, factors })
        }
        Node::Sqrt(a) => {
            let base = find_factors(a)?;
            if base.coeff < 0.0 {
                return Err(UnitError::domain(Span::none(), "square root of a negative value"));
            }
            let coeff = base.coeff.sqrt();
            let factors = base.factors.into_iter().map(|(f, e)| (f, e * 0.5)).collect();
            Ok(Factors { coeff, factors })
        }
        // Var, Log10, Ln, Exp: opaque unit factors of power 1. We do not
        // distribute a surrounding coefficient into a logarithm/exponential's
        // argument.
        _ => Ok(Factors::one_factor(node.clone())),
    }
}

/// Rebuild a tree from a factor decomposition: sorted canonical factor
/// order, zero-exponent factors dropped, the coefficient prefixed as a
/// leading `Mul` unless it is (within tolerance) exactly 1.
pub fn combine_factors(mut factors: Factors) -> Node {
    if factors.coeff == 0.0 {
        // `Mul(0, x) -> 0` (spec §4.4), regardless of what factors remain.
        return Node::constant(0.0);
    }
    factors.factors.retain(|(_, e)| *e != 0.0);
    factors.factors.sort_by(|(a, _), (b, _)| cmp(a, b, false));

    let mut terms = factors.factors.into_iter().map(|(f, e)| {
        if cmp_const(e, 1.0) == Ordering::Equal {
            f
        } else {
            Node::pow(f, Node::constant(e))
        }
    });

    let product = match terms.next() {
        None => None,
        Some(first) => Some(terms.fold(first, Node::mul)),
    };

    match product {
        None => Node::constant(factors.coeff),
        Some(p) => {
            if cmp_const(factors.coeff, 1.0) == Ordering::Equal {
                p
            } else {
                Node::mul(Node::constant(factors.coeff), p)
            }
        }
    }
}

/// Build the inverse of the single-variable function `node` applied to a
/// fresh variable `src`, recursing down `node`'s unique variable path.
/// Returns `None` if `node` is not invertible this way (spec §4.3: "fail;
/// caller must treat tree as non-invertible" — not an error, since an
/// unsupported shape here just means the two unit systems are
/// dimensionally incompatible).
pub fn invert(node: &Node, src: Node) -> Option<Node> {
    match node {
        Node::Var(_) => Some(src),
        Node::Exp(x) => invert(x, Node::ln(src)),
        Node::Ln(x) => invert(x, Node::exp(src)),
        Node::Pow(x, k) => {
            let k = k.as_const()?;
            if k == 0.0 {
                return None;
            }
            invert(x, Node::pow(src, Node::constant(1.0 / k)))
        }
        Node::Mul(a, b) => match (a.as_const(), b.as_const()) {
            (Some(k), None) if k != 0.0 => invert(b, Node::mul(Node::constant(1.0 / k), src)),
            (None, Some(k)) if k != 0.0 => invert(a, Node::mul(Node::constant(1.0 / k), src)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cmp_orders_by_opcode_first() {
        assert_eq!(cmp(&Node::constant(5.0), &Node::var("m"), true), Node::constant(5.0).opcode().cmp(&Node::var("m").opcode()));
    }

    #[test]
    fn cmp_const_is_ulp_tolerant() {
        assert_eq!(cmp(&Node::constant(1.0), &Node::constant(1.0 + 1e-14), true), Ordering::Equal);
    }

    #[test]
    fn cmp_mul_accepts_swapped_children_when_not_exact() {
        let a = Node::mul(Node::var("m"), Node::var("s"));
        let b = Node::mul(Node::var("s"), Node::var("m"));
        assert_eq!(cmp(&a, &b, false), Ordering::Equal);
        assert_ne!(cmp(&a, &b, true), Ordering::Equal);
    }

    #[test]
    fn find_factors_collects_mul_div_pow() {
        let tree = Node::div(Node::mul(Node::constant(2.0), Node::var("m")), Node::pow(Node::var("s"), Node::constant(2.0)));
        let f = find_factors(&tree).unwrap();
        assert_eq!(f.coeff, 2.0);
        let m_exp = f.factors.iter().find(|(n, _)| *n == Node::var("m")).unwrap().1;
        let s_exp = f.factors.iter().find(|(n, _)| *n == Node::var("s")).unwrap().1;
        assert_eq!(m_exp, 1.0);
        assert_eq!(s_exp, -2.0);
    }

    #[test]
    fn combine_factors_drops_zero_exponents_and_sorts() {
        let factors = Factors {
            coeff: 1.0,
            factors: vec![(Node::var("s"), 1.0), (Node::var("m"), 0.0), (Node::var("a"), 2.0)],
        };
        let tree = combine_factors(factors);
        // "a" < "m" < "s" by name; the zero-exponent "m" factor is gone.
        assert_eq!(tree, Node::mul(Node::pow(Node::var("a"), Node::constant(2.0)), Node::var("s")));
    }

    #[test]
    fn combine_factors_collapses_zero_coefficient() {
        let factors = Factors {
            coeff: 0.0,
            factors: vec![(Node::var("m"), -1.0)],
        };
        assert_eq!(combine_factors(factors), Node::constant(0.0));
    }

    #[test]
    fn combine_factors_omits_unit_coefficient() {
        let factors = Factors {
            coeff: 1.0,
            factors: vec![(Node::var("m"), 1.0)],
        };
        assert_eq!(combine_factors(factors), Node::var("m"));
    }

    #[test]
    fn invert_handles_exp_ln_pow_and_scalar_mul() {
        assert_eq!(invert(&Node::exp(Node::var("x")), Node::var("src")).unwrap(), Node::ln(Node::var("src")));
        assert_eq!(invert(&Node::ln(Node::var("x")), Node::var("src")).unwrap(), Node::exp(Node::var("src")));
        assert_eq!(
            invert(&Node::pow(Node::var("x"), Node::constant(2.0)), Node::var("src")).unwrap(),
            Node::pow(Node::var("src"), Node::constant(0.5))
        );
        assert_eq!(
            invert(&Node::mul(Node::constant(2.0), Node::var("x")), Node::var("src")).unwrap(),
            Node::mul(Node::constant(0.5), Node::var("src"))
        );
    }

    #[test]
    fn invert_fails_on_unsupported_shape() {
        assert!(invert(&Node::sqrt(Node::var("x")), Node::var("src")).is_none());
    }
}
