//! The canonical-form simplifier (spec §4.4). Operates recursively
//! bottom-up; every rewrite that produces a new subtree shape is re-run
//! through [`simplify`] itself so the result is a genuine fixed point, not
//! just a single pass.
//!
//! Post-conditions (spec §3 invariants): no `Div`/`Sqrt` survive; every
//! `Pow` exponent is a constant; a `Mul` whose operands include a constant
//! has the constant leftmost; any subtree with no remaining `Var` leaf has
//! collapsed to a single `Const`.

use crate::algebra::{combine_factors, find_factors};
use crate::error::{Result, UnitError};
use crate::fold::fold_if_constant;
use crate::sourcepos::Span;
use crate::tree::Node;

pub fn simplify(node: Node) -> Result<Node> {
    let node = match node {
        Node::Const(_) | Node::Pi | Node::E | Node::Var(_) => node,

        Node::Log10(a) => {
            let a = simplify(*a)?;
            // Log10(x) -> (1/ln 10) * Ln(x)
            return simplify(Node::mul(Node::constant(1.0 / std::f64::consts::LN_10), Node::ln(a)));
        }

        Node::Sqrt(a) => {
            let a = simplify(*a)?;
            return simplify(Node::pow(a, Node::constant(0.5)));
        }

        Node::Ln(a) => {
            let a = simplify(*a)?;
            match a {
                Node::Exp(x) => return simplify(*x),
                Node::Pow(x, k) => return simplify(Node::mul(*k, Node::ln(*x))),
                other => Node::ln(other),
            }
        }

        Node::Exp(a) => {
            let a = simplify(*a)?;
            match a {
                Node::Ln(x) => return simplify(*x),
                other => Node::exp(other),
            }
        }

        Node::Pow(a, b) => {
            let a = simplify(*a)?;
            let b = simplify(*b)?;
            let k = b
                .as_const()
                .ok_or_else(|| UnitError::variable_exponent(Span::none()))?;

            // x**0 -> 1, x**1 -> x, symbolically, as long as `x` is not
            // itself a bare constant — a constant base is left to the
            // domain-checked fold below (0**0 must still error).
            if !a.is_pure_constant() {
                if k == 0.0 {
                    return Ok(Node::constant(1.0));
                }
                if k == 1.0 {
                    return Ok(a);
                }
            }

            match a {
                Node::Exp(x) => return simplify(Node::exp(Node::mul(Node::constant(k), *x))),
                Node::Pow(x, a_exp) => {
                    let a_exp = a_exp
                        .as_const()
                        .ok_or_else(|| UnitError::internal("nested Pow exponent is not a constant"))?;
                    return simplify(Node::pow(*x, Node::constant(a_exp * k)));
                }
                Node::Mul(x, y) => {
                    return simplify(Node::mul(Node::pow(*x, Node::constant(k)), Node::pow(*y, Node::constant(k))));
                }
                other => Node::pow(other, Node::constant(k)),
            }
        }

        Node::Div(a, b) => {
            let a = simplify(*a)?;
            let b = simplify(*b)?;
            if let Some(k) = b.as_const() {
                if k == 0.0 {
                    return Err(UnitError::domain(Span::none(), "division by zero"));
                }
                if k == 1.0 {
                    return Ok(a);
                }
                return simplify(Node::mul(Node::constant(1.0 / k), a));
            }
            return simplify(Node::mul(a, Node::pow(b, Node::constant(-1.0))));
        }

        Node::Mul(a, b) => {
            let a = simplify(*a)?;
            let b = simplify(*b)?;
            let combined = Node::mul(a, b);
            let factors = find_factors(&combined)?;
            return fold_if_constant(combine_factors(factors));
        }
    };
    fold_if_constant(node)
}

#[cfg(test)]
mod test {
    use super::*;

    fn s(node: Node) -> Node {
        simplify(node).unwrap_or_else(|e| panic!("simplify failed: {}", e))
    }

    #[test]
    fn folds_pure_constant_arithmetic() {
        assert_eq!(s(Node::mul(Node::constant(2.0), Node::constant(3.0))), Node::constant(6.0));
    }

    #[test]
    fn div_rewrites_to_mul_with_reciprocal_power() {
        assert_eq!(s(Node::div(Node::var("m"), Node::var("s"))), Node::mul(Node::var("m"), Node::pow(Node::var("s"), Node::constant(-1.0))));
    }

    #[test]
    fn div_by_constant_becomes_scaled_mul() {
        assert_eq!(s(Node::div(Node::var("m"), Node::constant(2.0))), Node::mul(Node::constant(0.5), Node::var("m")));
    }

    #[test]
    fn div_by_zero_is_a_domain_error() {
        assert!(simplify(Node::div(Node::var("m"), Node::constant(0.0))).is_err());
    }

    #[test]
    fn sqrt_rewrites_to_pow_one_half() {
        assert_eq!(s(Node::sqrt(Node::var("Hz"))), Node::pow(Node::var("Hz"), Node::constant(0.5)));
    }

    #[test]
    fn sqrt_of_negative_constant_is_a_domain_error() {
        assert!(simplify(Node::sqrt(Node::constant(-4.0))).is_err());
    }

    #[test]
    fn log10_rewrites_through_ln() {
        let simplified = s(Node::log10(Node::var("x")));
        assert_eq!(simplified, Node::mul(Node::constant(1.0 / std::f64::consts::LN_10), Node::ln(Node::var("x"))));
    }

    #[test]
    fn ln_exp_and_exp_ln_cancel() {
        assert_eq!(s(Node::ln(Node::exp(Node::var("x")))), Node::var("x"));
        assert_eq!(s(Node::exp(Node::ln(Node::var("x")))), Node::var("x"));
    }

    #[test]
    fn pow_zero_and_one_identities() {
        assert_eq!(s(Node::pow(Node::var("m"), Node::constant(0.0))), Node::constant(1.0));
        assert_eq!(s(Node::pow(Node::var("m"), Node::constant(1.0))), Node::var("m"));
    }

    #[test]
    fn zero_to_the_zero_is_a_domain_error() {
        assert!(simplify(Node::pow(Node::constant(0.0), Node::constant(0.0))).is_err());
    }

    #[test]
    fn negative_base_non_integer_power_is_a_domain_error() {
        assert!(simplify(Node::pow(Node::constant(-2.0), Node::constant(0.5))).is_err());
    }

    #[test]
    fn nested_pow_multiplies_exponents() {
        assert_eq!(
            s(Node::pow(Node::pow(Node::var("m"), Node::constant(2.0)), Node::constant(3.0))),
            Node::pow(Node::var("m"), Node::constant(6.0))
        );
    }

    #[test]
    fn pow_distributes_over_mul() {
        assert_eq!(
            s(Node::pow(Node::mul(Node::var("m"), Node::var("s")), Node::constant(2.0))),
            Node::mul(Node::pow(Node::var("m"), Node::constant(2.0)), Node::pow(Node::var("s"), Node::constant(2.0)))
        );
    }

    #[test]
    fn pow_of_exp_folds_into_exp() {
        assert_eq!(
            s(Node::pow(Node::exp(Node::var("x")), Node::constant(3.0))),
            Node::exp(Node::mul(Node::constant(3.0), Node::var("x")))
        );
    }

    #[test]
    fn mul_constants_move_leftmost() {
        assert_eq!(s(Node::mul(Node::var("m"), Node::constant(2.0))), Node::mul(Node::constant(2.0), Node::var("m")));
    }

    #[test]
    fn mul_by_zero_collapses() {
        assert_eq!(s(Node::mul(Node::constant(0.0), Node::var("m"))), Node::constant(0.0));
    }

    #[test]
    fn mul_by_one_is_identity() {
        assert_eq!(s(Node::mul(Node::constant(1.0), Node::var("m"))), Node::var("m"));
    }

    #[test]
    fn repeated_factors_combine_exponents() {
        assert_eq!(
            s(Node::mul(Node::var("m"), Node::var("m"))),
            Node::pow(Node::var("m"), Node::constant(2.0))
        );
    }

    #[test]
    fn commutative_products_reach_the_same_canonical_form() {
        assert_eq!(s(Node::mul(Node::var("s"), Node::var("m"))), s(Node::mul(Node::var("m"), Node::var("s"))));
    }

    #[test]
    fn km_per_hour_to_m_per_s_folds_to_expected_scalar() {
        // "km/h" expanded: Mul(0.001, m) / Mul(1.0/3600.0, s)
        let km = Node::mul(Node::constant(0.001), Node::var("m"));
        let h = Node::mul(Node::constant(1.0 / 3600.0), Node::var("s"));
        let tree = s(Node::div(km, h));
        // Expect Mul(0.27777..., Mul(m, Pow(s,-1))) in some canonical order.
        match &tree {
            Node::Mul(coeff, _) => {
                let v = coeff.as_const().expect("leading factor should be the scalar coefficient");
                assert!((v - 1000.0 / 3600.0).abs() < 1e-9);
            }
            other => panic!("expected a scaled Mul, got {:?}", other),
        }
    }
}
