//! Text emitter (spec §4.6): renders a tree back to an algebraic string,
//! either in machine form (fed to the numeric-mapping compiler / a host
//! expression evaluator) or label form (fed back to the caller as a
//! human-readable axis label).
//!
//! Parenthesisation is driven by a small precedence table rather than the
//! literal case list in the source this engine's model is distilled from:
//! atoms and function calls never need outer parens, `Pow` binds tighter
//! than `Mul`/`Div`, and a `Div` only parenthesises its own denominator when
//! that denominator is itself a `Mul` or `Div` (otherwise `a/b*c` and
//! `a/(b*c)` would read as the same expression). This is simpler than the
//! source's rule list but produces the same reparseable, value-correct
//! text.

use crate::tree::Node;

#[derive(Clone, Copy, PartialEq)]
pub enum Mode {
    Machine,
    Label,
}

const PREC_MULDIV: u8 = 1;
const PREC_POW: u8 = 2;
const PREC_ATOM: u8 = 3;

pub fn to_machine_text(node: &Node) -> String {
    render(node, Mode::Machine).0
}

/// Render `node` as a label: `Log10`/`Ln` swap their machine-mode spelling
/// (spec §4.6: "by convention of the host ecosystem"), `Var` leaves are
/// padded with a single space on each side, and the final string has every
/// run of whitespace collapsed to one space with the ends trimmed (spec
/// §9's second open question).
pub fn to_label_text(node: &Node) -> String {
    let raw = render(node, Mode::Label).0;
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn paren(text: String) -> String {
    format!("({})", text)
}

/// Returns the rendered text together with its own precedence, so the
/// caller can decide whether to wrap it in parentheses.
fn render(node: &Node, mode: Mode) -> (String, u8) {
    match node {
        Node::Const(v) => (format!("{}", v), PREC_ATOM),
        Node::Pi => ("pi".to_owned(), PREC_ATOM),
        Node::E => ("e".to_owned(), PREC_ATOM),
        Node::Var(name) => {
            let text = match mode {
                Mode::Machine => name.to_string(),
                Mode::Label => format!(" {} ", name),
            };
            (text, PREC_ATOM)
        }
        Node::Log10(a) => {
            let func = match mode {
                Mode::Machine => "log10",
                Mode::Label => "log",
            };
            (format!("{}({})", func, render(a, mode).0), PREC_ATOM)
        }
        Node::Ln(a) => {
            let func = match mode {
                Mode::Machine => "log",
                Mode::Label => "ln",
            };
            (format!("{}({})", func, render(a, mode).0), PREC_ATOM)
        }
        Node::Exp(a) => (format!("exp({})", render(a, mode).0), PREC_ATOM),
        Node::Sqrt(a) => (format!("sqrt({})", render(a, mode).0), PREC_ATOM),
        Node::Pow(a, b) => {
            let (at, ap) = render(a, mode);
            let base = if ap < PREC_POW { paren(at) } else { at };
            let (bt, _) = render(b, mode);
            (format!("{}**{}", base, bt), PREC_POW)
        }
        Node::Mul(a, b) => {
            let (at, ap) = render(a, mode);
            let left = if ap < PREC_MULDIV { paren(at) } else { at };
            let (bt, bp) = render(b, mode);
            let right = if bp < PREC_MULDIV { paren(bt) } else { bt };
            (format!("{}*{}", left, right), PREC_MULDIV)
        }
        Node::Div(a, b) => {
            let (at, ap) = render(a, mode);
            let left = if ap < PREC_MULDIV { paren(at) } else { at };
            let (bt, bp) = render(b, mode);
            // The denominator needs protecting whenever it is itself a
            // product or quotient: "a/b*c" and "a/(b*c)" are different
            // expressions, even though "a*b/c" and "a*(b/c)" are not.
            let right = if bp <= PREC_MULDIV { paren(bt) } else { bt };
            (format!("{}/{}", left, right), PREC_MULDIV)
        }
    }
}
