//! The unit-string lexer and recursive-descent parser (spec §4.2).
//!
//! Grammar:
//! ```text
//! expr    := mulexp
//! mulexp  := powexp (('*' | '/' | '.' | <adjacency>) powexp)*
//! powexp  := atom (('**' | '^') atom)*
//! atom    := number
//!          | 'pi' | 'e'
//!          | ('log' | 'ln' | 'exp' | 'sqrt') '(' expr ')'
//!          | '(' expr ')'
//!          | unit-symbol
//! ```
//!
//! Disambiguation:
//! - A `.` between two digits is a decimal point, consumed by the number
//!   scanner itself; it never reaches the grammar as a multiply operator.
//! - Whitespace between two operand groups, and two operand groups placed
//!   directly against each other with no operator at all (`"2m"`, `")("`),
//!   both mean multiplication: `mulexp` treats "no operator token, but
//!   another atom could start right here" the same as an explicit `.`.
//! - `pi`, `e`, `log`, `ln`, `exp`, `sqrt` are recognised case-insensitively;
//!   every other identifier is a unit symbol, kept exactly as written —
//!   unit symbols are case-sensitive (`"mas"` and `"MAS"` name different
//!   things).
//! - A `**`/`^` exponent is folded to a constant immediately: a `Var`
//!   anywhere inside it is a [`UnitError::VariableExponent`], not deferred
//!   to the simplifier.

use crate::error::{Result, UnitError};
use crate::fold::eval_const;
use crate::sourcepos::{Pos, Span};
use crate::tree::Node;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Number(f64),
    Ident(String),
    Star,
    Slash,
    Dot,
    Pow,
    LParen,
    RParen,
    End,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    span: Span,
}

impl Tok {
    /// True if a token of this kind can begin an `atom`, used to recognise
    /// implicit multiplication by adjacency.
    fn starts_atom(&self) -> bool {
        matches!(self, Tok::Number(_) | Tok::Ident(_) | Tok::LParen)
    }
}

struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn next_token(&mut self) -> Result<Token> {
        while matches!(self.peek_byte(), Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            self.pos += 1;
        }
        let start = self.pos;
        let tok = match self.peek_byte() {
            None => Tok::End,
            Some(c) if c.is_ascii_digit() => Tok::Number(self.scan_number()),
            Some(b'.') if self.byte_at(1).map_or(false, |c| c.is_ascii_digit()) => {
                Tok::Number(self.scan_number())
            }
            Some(c) if c.is_ascii_alphabetic() => Tok::Ident(self.scan_ident()),
            Some(b'.') => {
                self.pos += 1;
                Tok::Dot
            }
            Some(b'*') => {
                self.pos += 1;
                if self.peek_byte() == Some(b'*') {
                    self.pos += 1;
                    Tok::Pow
                } else {
                    Tok::Star
                }
            }
            Some(b'^') => {
                self.pos += 1;
                Tok::Pow
            }
            Some(b'/') => {
                self.pos += 1;
                Tok::Slash
            }
            Some(b'(') => {
                self.pos += 1;
                Tok::LParen
            }
            Some(b')') => {
                self.pos += 1;
                Tok::RParen
            }
            Some(c) => {
                return Err(UnitError::parse(
                    self.span_from(start),
                    format!("unexpected character {:?} in unit string", c as char),
                ));
            }
        };
        Ok(Token {
            tok,
            span: self.span_from(start),
        })
    }

    fn span_from(&self, start: usize) -> Span {
        Span {
            start: Pos(start as u32),
            end: Pos(self.pos as u32),
        }
    }

    /// Scans an (unsigned) numeric literal via [`crate::numeral::scan_number`].
    /// Only called when `next_token` has already peeked a digit, or a `.`
    /// followed by a digit, so a literal is guaranteed to be present.
    fn scan_number(&mut self) -> f64 {
        let (value, len) = crate::numeral::scan_number(&self.text[self.pos..])
            .expect("next_token only calls scan_number when a numeric literal is present");
        self.pos += len;
        value
    }

    fn scan_ident(&mut self) -> String {
        let start = self.pos;
        while self.peek_byte().map_or(false, |c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        self.text[start..self.pos].to_owned()
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(text);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: &Tok, what: &str) -> Result<Token> {
        if &self.current.tok == expected {
            self.advance()
        } else {
            Err(UnitError::parse(
                self.current.span,
                format!("expected {} but found {}", what, describe(&self.current.tok)),
            ))
        }
    }

    fn parse_expr(&mut self) -> Result<Node> {
        self.parse_mulexp()
    }

    fn parse_mulexp(&mut self) -> Result<Node> {
        let mut node = self.parse_powexp()?;
        loop {
            match &self.current.tok {
                Tok::Star | Tok::Dot => {
                    self.advance()?;
                    let rhs = self.parse_powexp()?;
                    node = Node::mul(node, rhs);
                }
                Tok::Slash => {
                    self.advance()?;
                    let rhs = self.parse_powexp()?;
                    node = Node::div(node, rhs);
                }
                tok if tok.starts_atom() => {
                    // No operator token at all: two operand groups placed
                    // directly next to each other, e.g. "2m" or ")(".
                    let rhs = self.parse_powexp()?;
                    node = Node::mul(node, rhs);
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_powexp(&mut self) -> Result<Node> {
        let mut node = self.parse_atom()?;
        while self.current.tok == Tok::Pow {
            self.advance()?;
            let exp_start = self.current.span;
            let exponent = self.parse_atom()?;
            let exp_span = Span {
                start: exp_start.start,
                end: self.current.span.start,
            };
            if !exponent.is_pure_constant() {
                return Err(UnitError::variable_exponent(exp_span));
            }
            let value = eval_const(&exponent)?;
            node = Node::pow(node, Node::constant(value));
        }
        Ok(node)
    }

    fn parse_atom(&mut self) -> Result<Node> {
        let token = self.current.clone();
        match token.tok {
            Tok::Number(v) => {
                self.advance()?;
                Ok(Node::constant(v))
            }
            Tok::LParen => {
                self.advance()?;
                let inner = self.parse_expr()?;
                self.expect(&Tok::RParen, "')'")?;
                Ok(inner)
            }
            Tok::Ident(name) => {
                self.advance()?;
                let lower = name.to_ascii_lowercase();
                match lower.as_str() {
                    "pi" => Ok(Node::pi()),
                    "e" => Ok(Node::e()),
                    "log" | "ln" | "exp" | "sqrt" => {
                        self.expect(&Tok::LParen, "'('")?;
                        if self.current.tok == Tok::RParen {
                            return Err(UnitError::parse(self.current.span, "empty function argument"));
                        }
                        let inner = self.parse_expr()?;
                        self.expect(&Tok::RParen, "')'")?;
                        Ok(match lower.as_str() {
                            "log" => Node::log10(inner),
                            "ln" => Node::ln(inner),
                            "exp" => Node::exp(inner),
                            "sqrt" => Node::sqrt(inner),
                            _ => unreachable!(),
                        })
                    }
                    // A unit symbol: case-sensitive, kept as originally written.
                    _ => Ok(Node::var(name)),
                }
            }
            _ => Err(UnitError::parse(
                token.span,
                format!("expected a number, unit symbol or '(' but found {}", describe(&token.tok)),
            )),
        }
    }
}

fn describe(tok: &Tok) -> &'static str {
    match tok {
        Tok::Number(_) => "a number",
        Tok::Ident(_) => "an identifier",
        Tok::Star => "'*'",
        Tok::Slash => "'/'",
        Tok::Dot => "'.'",
        Tok::Pow => "'**'",
        Tok::LParen => "'('",
        Tok::RParen => "')'",
        Tok::End => "end of input",
    }
}

/// Parse a unit string into a raw tree: recursive descent over the grammar
/// above, followed by the one-time [`invert_literal_constants`] pass. The
/// result still has derived-unit `Var` leaves unexpanded — callers that need
/// basic units only (e.g. dimensional analysis) must additionally call
/// [`crate::catalogue::expand_units`].
pub fn parse_raw(text: &str) -> Result<Node> {
    if text.trim().is_empty() {
        return Err(UnitError::parse(Span::none(), "empty unit string"));
    }
    let mut parser = Parser::new(text)?;
    let tree = parser.parse_expr()?;
    if parser.current.tok != Tok::End {
        return Err(UnitError::parse(
            parser.current.span,
            format!("unexpected trailing {} after unit expression", describe(&parser.current.tok)),
        ));
    }
    invert_literal_constants(tree)
}

/// Replaces a dimensionless coefficient by its reciprocal wherever one sits
/// next to a variable-bearing subtree: the string `"0.01 m"` means "a unit
/// equal to 0.01 of a metre", so converting a value in metres to this unit
/// divides by 0.01 rather than multiplying by it (spec §4.2/§4.3). The same
/// rule applies to a catalogue definition text such as `deg`'s
/// `"pi/180 rad"` — it is parsed through this exact function, via
/// [`parse_raw`], when the catalogue bootstraps itself.
///
/// The rule fires at the boundary between a dimensionless subtree (a literal
/// numeral, `pi`/`e`, or any arithmetic combination of those with no unit
/// leaf at all) and a variable-bearing subtree in a `Mul`/`Div`: the whole
/// dimensionless side is evaluated down to one number and replaced by its
/// reciprocal, not just a bare numeral leaf at the boundary. This matters
/// once the dimensionless side is itself compound, e.g. `pi/180` in
/// `"pi/180 rad"` or `1/3600` in `"1/3600 deg"` — both reciprocate as a
/// whole (to `180/pi` and `3600` respectively), the same as a bare `1000` in
/// `"1000 m"` reciprocates to `0.001`. A `Mul`/`Div` node whose operands are
/// *both* already dimensionless (e.g. the inner `Div(pi, 180)` while `rad`
/// hasn't entered the picture yet) is plain arithmetic and is left alone
/// here, to be folded by the simplifier later.
fn invert_literal_constants(node: Node) -> Result<Node> {
    match node {
        Node::Const(_) | Node::Pi | Node::E | Node::Var(_) => Ok(node),
        Node::Log10(a) => Ok(Node::log10(invert_literal_constants(*a)?)),
        Node::Ln(a) => Ok(Node::ln(invert_literal_constants(*a)?)),
        Node::Exp(a) => Ok(Node::exp(invert_literal_constants(*a)?)),
        Node::Sqrt(a) => Ok(Node::sqrt(invert_literal_constants(*a)?)),
        Node::Pow(a, b) => Ok(Node::pow(invert_literal_constants(*a)?, invert_literal_constants(*b)?)),
        Node::Mul(a, b) => {
            let a = invert_literal_constants(*a)?;
            let b = invert_literal_constants(*b)?;
            let a_pure = a.is_pure_constant();
            let b_pure = b.is_pure_constant();
            if a_pure && !b_pure {
                Ok(Node::mul(reciprocate_constant(a)?, b))
            } else if b_pure && !a_pure {
                Ok(Node::mul(a, reciprocate_constant(b)?))
            } else {
                Ok(Node::mul(a, b))
            }
        }
        Node::Div(a, b) => {
            let a = invert_literal_constants(*a)?;
            let b = invert_literal_constants(*b)?;
            if b.is_pure_constant() && !a.is_pure_constant() {
                Ok(Node::div(a, reciprocate_constant(b)?))
            } else {
                Ok(Node::div(a, b))
            }
        }
    }
}

/// Evaluates a dimensionless subtree down to one number and returns its
/// reciprocal as a `Const`. `node` may be a bare literal, `Pi`/`E`, or any
/// arithmetic combination of those (`node.is_pure_constant()` must already
/// hold — callers only reach for this at a confirmed dimensionless/unit
/// boundary).
fn reciprocate_constant(node: Node) -> Result<Node> {
    let value = eval_const(&node)?;
    if value == 0.0 {
        Err(UnitError::domain(Span::none(), "a literal zero coefficient cannot be inverted"))
    } else {
        Ok(Node::Const(1.0 / value))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(s: &str) -> Node {
        parse_raw(s).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", s, e))
    }

    #[test]
    fn parses_bare_unit_symbol() {
        assert_eq!(parse("m"), Node::var("m"));
    }

    #[test]
    fn reciprocates_leading_literal_coefficient() {
        assert_eq!(parse("1000 m"), Node::mul(Node::constant(0.001), Node::var("m")));
    }

    #[test]
    fn compound_constant_coefficient_reciprocates_as_a_whole() {
        // "pi/180 rad" means "a unit equal to pi/180 of a radian", so the
        // whole compound coefficient inverts together, to 180/pi, exactly
        // as the bare "1000" in "1000 m" inverts to 0.001.
        let expected_scale = 180.0 / std::f64::consts::PI;
        assert_eq!(
            parse("pi/180 rad"),
            Node::mul(Node::constant(expected_scale), Node::var("rad"))
        );
    }

    #[test]
    fn named_constant_coefficient_reciprocates_like_a_literal() {
        // "pi rad" means "a unit equal to pi radians", so converting a value
        // in radians to this unit divides by pi: the same rule "1000 m"
        // follows, with pi standing in for the literal numeral.
        assert_eq!(parse("pi rad"), Node::mul(Node::constant(1.0 / std::f64::consts::PI), Node::var("rad")));
    }

    #[test]
    fn division_is_left_associative() {
        assert_eq!(
            parse("m/s/s"),
            Node::div(Node::div(Node::var("m"), Node::var("s")), Node::var("s"))
        );
    }

    #[test]
    fn dot_between_digits_is_a_decimal_point() {
        assert_eq!(parse("0.5 m"), Node::mul(Node::constant(2.0), Node::var("m")));
    }

    #[test]
    fn dot_between_symbols_is_multiplication() {
        assert_eq!(parse("kg.m"), Node::mul(Node::var("kg"), Node::var("m")));
    }

    #[test]
    fn adjacency_without_whitespace_is_multiplication() {
        assert_eq!(parse("2m"), Node::mul(Node::constant(0.5), Node::var("m")));
    }

    #[test]
    fn parenthesised_adjacency_is_multiplication() {
        assert_eq!(parse("(m)(s)"), Node::mul(Node::var("m"), Node::var("s")));
    }

    #[test]
    fn power_exponent_is_folded_to_a_constant() {
        assert_eq!(parse("m**2"), Node::pow(Node::var("m"), Node::constant(2.0)));
        assert_eq!(parse("m^-1"), Node::pow(Node::var("m"), Node::constant(-1.0)));
    }

    #[test]
    fn power_accepts_compound_constant_exponent() {
        assert_eq!(parse("m**(2*3)"), Node::pow(Node::var("m"), Node::constant(6.0)));
    }

    #[test]
    fn power_rejects_variable_exponent() {
        let err = parse_raw("m**s").unwrap_err();
        assert!(matches!(err, UnitError::VariableExponent { .. }));
    }

    #[test]
    fn functions_are_case_insensitive_but_units_are_not() {
        assert_eq!(parse("LOG(m)"), Node::log10(Node::var("m")));
        assert_eq!(parse("Sqrt(m)"), Node::sqrt(Node::var("m")));
        assert_ne!(parse("mas"), parse("MAS"));
    }

    #[test]
    fn pi_and_e_are_case_insensitive_constants() {
        assert_eq!(parse("PI"), Node::pi());
        assert_eq!(parse("E"), Node::e());
    }

    #[test]
    fn unbalanced_parens_are_a_parse_error() {
        assert!(parse_raw("(m").is_err());
        assert!(parse_raw("m)").is_err());
    }

    #[test]
    fn empty_function_argument_is_a_parse_error() {
        assert!(parse_raw("sqrt()").is_err());
    }

    #[test]
    fn trailing_tokens_after_constant_are_a_parse_error() {
        assert!(parse_raw("2 3)").is_err());
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert!(parse_raw("").is_err());
        assert!(parse_raw("   ").is_err());
    }

    #[test]
    fn unknown_symbol_is_kept_as_a_var_leaf() {
        assert_eq!(parse("furlong"), Node::var("furlong"));
    }
}
