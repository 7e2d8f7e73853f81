//! Expression nodes and trees (spec §3).
//!
//! The node is a recursive sum type with one variant per opcode; arity is
//! fixed by the variant's shape rather than tracked at runtime (spec §9's
//! design note). `LoadPi`/`LoadE` are kept as their own variants, distinct
//! from `Const`, exactly as spec §3's closed opcode set requires: the
//! literal-constant reciprocation pass (`parser::invert_literal_constants`)
//! must be able to tell "a bare numeral the user wrote" apart from "the
//! named constant `pi`/`e`" and reciprocate only the former, so folding
//! `Pi`/`E` straight to `Const` at parse time — before reciprocation runs —
//! would erase that distinction. They collapse to `Const` only once
//! [`crate::fold::fold_if_constant`] folds them, which the parser and
//! simplifier both run *after* reciprocation. A bare `Null` opcode (used in
//! the source as an "absent child" placeholder) has no counterpart here:
//! absent children are simply not present in a variant that doesn't carry
//! them.

use std::fmt;

/// A node in a unit expression tree. Each child is owned exclusively by its
/// parent, so dropping a `Node` recursively frees its whole subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A numeric constant the user wrote as a literal numeral.
    Const(f64),
    /// The named constant `pi`, not yet folded to a `Const`.
    Pi,
    /// The named constant `e`, not yet folded to a `Const`.
    E,
    /// A named unit symbol: a basic catalogue unit, a user-introduced
    /// unknown symbol, or (before derived-unit expansion) a derived unit.
    Var(Box<str>),
    Log10(Box<Node>),
    Ln(Box<Node>),
    Exp(Box<Node>),
    Sqrt(Box<Node>),
    /// `Pow(base, exponent)`. After parsing, `exponent` always reduces to a
    /// constant (spec §4.2: "variable exponent is an error").
    Pow(Box<Node>, Box<Node>),
    Div(Box<Node>, Box<Node>),
    Mul(Box<Node>, Box<Node>),
}

/// Opcode identity, used only to give nodes of different kinds a stable
/// relative order for structural comparison (spec §4.3 rule 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Opcode {
    Const,
    Pi,
    E,
    Var,
    Log10,
    Ln,
    Exp,
    Sqrt,
    Pow,
    Div,
    Mul,
}

impl Node {
    pub fn constant(v: f64) -> Node {
        Node::Const(v)
    }

    pub fn pi() -> Node {
        Node::Pi
    }

    pub fn e() -> Node {
        Node::E
    }

    pub fn var(name: impl Into<Box<str>>) -> Node {
        Node::Var(name.into())
    }

    pub fn log10(a: Node) -> Node {
        Node::Log10(Box::new(a))
    }

    pub fn ln(a: Node) -> Node {
        Node::Ln(Box::new(a))
    }

    pub fn exp(a: Node) -> Node {
        Node::Exp(Box::new(a))
    }

    pub fn sqrt(a: Node) -> Node {
        Node::Sqrt(Box::new(a))
    }

    pub fn pow(a: Node, b: Node) -> Node {
        Node::Pow(Box::new(a), Box::new(b))
    }

    pub fn div(a: Node, b: Node) -> Node {
        Node::Div(Box::new(a), Box::new(b))
    }

    pub fn mul(a: Node, b: Node) -> Node {
        Node::Mul(Box::new(a), Box::new(b))
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Node::Const(_) => Opcode::Const,
            Node::Pi => Opcode::Pi,
            Node::E => Opcode::E,
            Node::Var(_) => Opcode::Var,
            Node::Log10(_) => Opcode::Log10,
            Node::Ln(_) => Opcode::Ln,
            Node::Exp(_) => Opcode::Exp,
            Node::Sqrt(_) => Opcode::Sqrt,
            Node::Pow(_, _) => Opcode::Pow,
            Node::Div(_, _) => Opcode::Div,
            Node::Mul(_, _) => Opcode::Mul,
        }
    }

    pub fn arity(&self) -> usize {
        self.children().len()
    }

    /// The node's immediate children, in argument order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Const(_) | Node::Pi | Node::E | Node::Var(_) => vec![],
            Node::Log10(a) | Node::Ln(a) | Node::Exp(a) | Node::Sqrt(a) => vec![a],
            Node::Pow(a, b) | Node::Div(a, b) | Node::Mul(a, b) => vec![a, b],
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match self {
            Node::Const(_) | Node::Pi | Node::E | Node::Var(_) => vec![],
            Node::Log10(a) | Node::Ln(a) | Node::Exp(a) | Node::Sqrt(a) => vec![a],
            Node::Pow(a, b) | Node::Div(a, b) | Node::Mul(a, b) => vec![a, b],
        }
    }

    /// This node's constant value, if it is a `Const` leaf. Does not match
    /// `Pi`/`E`: those are folded to `Const` explicitly, by
    /// [`crate::fold::fold_if_constant`], not read off as if already one.
    pub fn as_const(&self) -> Option<f64> {
        match *self {
            Node::Const(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Node::Const(_))
    }

    /// True if every leaf reachable from this node is a constant, i.e. the
    /// subtree has no variable dependency at all.
    pub fn is_pure_constant(&self) -> bool {
        match self {
            Node::Const(_) | Node::Pi | Node::E => true,
            Node::Var(_) => false,
            _ => self.children().iter().all(|c| c.is_pure_constant()),
        }
    }

    /// The distinct variable (`Var`) names appearing anywhere in this tree,
    /// in first-seen order, without duplicates.
    pub fn collect_vars(&self, out: &mut Vec<String>) {
        match self {
            Node::Var(name) => {
                let name = name.as_ref();
                if !out.iter().any(|n| n == name) {
                    out.push(name.to_owned());
                }
            }
            _ => {
                for c in self.children() {
                    c.collect_vars(out);
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::emit::to_machine_text(self))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arity_matches_variant_shape() {
        assert_eq!(Node::constant(1.0).arity(), 0);
        assert_eq!(Node::var("m").arity(), 0);
        assert_eq!(Node::sqrt(Node::var("m")).arity(), 1);
        assert_eq!(Node::div(Node::var("m"), Node::var("s")).arity(), 2);
    }

    #[test]
    fn collects_distinct_vars_in_order() {
        let tree = Node::mul(Node::var("m"), Node::div(Node::var("s"), Node::var("m")));
        let mut vars = Vec::new();
        tree.collect_vars(&mut vars);
        assert_eq!(vars, vec!["m".to_owned(), "s".to_owned()]);
    }
}
