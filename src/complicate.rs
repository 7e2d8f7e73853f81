//! The complicator (spec §4.4): a best-effort inverse of selected
//! `simplify` canonicalisations, run only when a tree is about to be
//! emitted as text. Canonical form pulls everything into `Mul`/`Pow`
//! products with non-negative-looking exponents buried wherever the
//! algebra puts them; that form is compact to reason about but reads
//! badly and, worse, a bare negative exponent or a `Pow(x, 0.5)` cannot
//! be written back in the unit-string grammar at all (it has no `sqrt`
//! literal and no unary minus). The complicator restores `sqrt`, `/` and
//! a couple of other familiar shapes so emitted text stays within the
//! grammar and reads the way a human wrote it.
//!
//! Rewriting is bottom-up and single-pass: children are complicated
//! first, then the (already-complicated) pair is matched against the
//! rules below. Because children are done first, a `Pow(x, -1)` child
//! has already become `Div(1, x)` by the time its parent `Mul` looks at
//! it, so the "turn division-by-multiplication back into `/`" rule
//! matches on that `Div(1, _)` shape rather than on `Pow`.

use std::f64::consts::LN_10;

use crate::tree::Node;

const EPS: f64 = 1e-9;

pub fn complicate(node: Node) -> Node {
    match node {
        Node::Const(_) | Node::Pi | Node::E | Node::Var(_) => node,
        Node::Log10(a) => Node::log10(complicate(*a)),
        Node::Ln(a) => Node::ln(complicate(*a)),
        Node::Exp(a) => Node::exp(complicate(*a)),
        Node::Sqrt(a) => Node::sqrt(complicate(*a)),

        Node::Pow(a, b) => {
            let a = complicate(*a);
            match b.as_const() {
                Some(k) if (k - 0.5).abs() < EPS => Node::sqrt(a),
                Some(k) if k < 0.0 => {
                    let pos = -k;
                    let inner = if (pos - 1.0).abs() < EPS {
                        a
                    } else {
                        complicate(Node::pow(a, Node::constant(pos)))
                    };
                    Node::div(Node::constant(1.0), inner)
                }
                _ => Node::pow(a, *b),
            }
        }

        Node::Div(a, b) => Node::div(complicate(*a), complicate(*b)),

        Node::Mul(a, b) => {
            let a = complicate(*a);
            let b = complicate(*b);
            complicate_product(a, b)
        }
    }
}

fn complicate_product(a: Node, b: Node) -> Node {
    // k * ln(x) -> log10(x ** (n/10)) when k = n / (10 * ln 10), n integer.
    if let (Node::Const(k), Node::Ln(x)) = (&a, &b) {
        if let Some(n) = tenths_of_log10_exponent(*k) {
            return if n == 10 {
                Node::log10((**x).clone())
            } else {
                Node::log10(Node::pow((**x).clone(), Node::constant(n as f64 / 10.0)))
            };
        }
    }

    // k * sqrt(x) -> sqrt(k^2 * x), k > 0.
    if let (Node::Const(k), Node::Sqrt(x)) = (&a, &b) {
        if *k > 0.0 {
            return Node::sqrt(Node::mul(Node::constant(k * k), (**x).clone()));
        }
    }

    // a * (1/x) -> a/x, and symmetrically (1/x) * b -> b/x.
    if let Node::Div(num, denom) = &b {
        if matches!(num.as_ref(), Node::Const(c) if (*c - 1.0).abs() < EPS) {
            return Node::div(a, (**denom).clone());
        }
    }
    if let Node::Div(num, denom) = &a {
        if matches!(num.as_ref(), Node::Const(c) if (*c - 1.0).abs() < EPS) {
            return Node::div(b, (**denom).clone());
        }
    }

    // x**k * y**k -> (x*y)**k, same exponent.
    if let (Node::Pow(xb, xk), Node::Pow(yb, yk)) = (&a, &b) {
        if let (Some(xk), Some(yk)) = (xk.as_const(), yk.as_const()) {
            if (xk - yk).abs() < EPS {
                return Node::pow(Node::mul((**xb).clone(), (**yb).clone()), Node::constant(xk));
            }
        }
    }

    Node::mul(a, b)
}

fn tenths_of_log10_exponent(k: f64) -> Option<i64> {
    let n = k * 10.0 * LN_10;
    let rounded = n.round();
    if rounded != 0.0 && (n - rounded).abs() < 1e-6 {
        Some(rounded as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn restores_sqrt_from_half_power() {
        let tree = Node::pow(Node::var("m"), Node::constant(0.5));
        assert_eq!(complicate(tree), Node::sqrt(Node::var("m")));
    }

    #[test]
    fn restores_division_from_negative_unit_power() {
        let tree = Node::mul(Node::var("m"), Node::pow(Node::var("s"), Node::constant(-1.0)));
        assert_eq!(complicate(tree), Node::div(Node::var("m"), Node::var("s")));
    }

    #[test]
    fn restores_division_from_negative_power_other_than_one() {
        let tree = Node::pow(Node::var("s"), Node::constant(-2.0));
        assert_eq!(complicate(tree), Node::div(Node::constant(1.0), Node::pow(Node::var("s"), Node::constant(2.0))));
    }

    #[test]
    fn folds_scaled_sqrt_coefficient_under_the_radical() {
        let tree = Node::mul(Node::constant(4.0), Node::sqrt(Node::var("x")));
        assert_eq!(complicate(tree), Node::sqrt(Node::mul(Node::constant(16.0), Node::var("x"))));
    }

    #[test]
    fn merges_equal_exponent_powers_of_a_product() {
        let tree = Node::mul(
            Node::pow(Node::var("x"), Node::constant(2.0)),
            Node::pow(Node::var("y"), Node::constant(2.0)),
        );
        assert_eq!(
            complicate(tree),
            Node::pow(Node::mul(Node::var("x"), Node::var("y")), Node::constant(2.0))
        );
    }

    #[test]
    fn restores_log10_from_ln_scaled_by_inverse_ln_10() {
        let tree = Node::mul(Node::constant(1.0 / LN_10), Node::ln(Node::var("x")));
        assert_eq!(complicate(tree), Node::log10(Node::var("x")));
    }

    #[test]
    fn leaves_ordinary_products_untouched() {
        let tree = Node::mul(Node::var("m"), Node::var("s"));
        assert_eq!(complicate(tree.clone()), tree);
    }
}
