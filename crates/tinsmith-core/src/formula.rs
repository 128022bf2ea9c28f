//! # Formula Evaluator
//!
//! Evaluates the short algebraic strings product admins type into the
//! catalog (`W*L/1000000*COATING+5`) once every token has been replaced by
//! a number.
//!
//! ## Pipeline
//! ```text
//! "(300+20)*500 ?x"          raw text (admin-editable)
//!        │
//!        ▼  sanitize: keep only  - ( ) 0-9 / * + . < > & | ? ; :  whitespace
//! "(300+20)*500 ?"
//!        │
//!        ▼  lex + parse (recursive descent, no dynamic code execution)
//! Err(UnexpectedEnd)
//!        │
//!        ▼
//! Evaluated::Blank           never an error to the caller
//! ```
//!
//! ## Grammar (lowest to highest precedence)
//! ```text
//! conditional    := logical_or ( "?" conditional ":" conditional )?
//! logical_or     := logical_and ( "||" logical_and )*
//! logical_and    := bit_or ( "&&" bit_or )*
//! bit_or         := bit_and ( "|" bit_and )*
//! bit_and        := relational ( "&" relational )*
//! relational     := shift ( ( "<" | ">" ) shift )*
//! shift          := additive ( ( "<<" | ">>" | ">>>" ) additive )*
//! additive       := multiplicative ( ( "+" | "-" ) multiplicative )*
//! multiplicative := unary ( ( "*" | "/" ) unary )*
//! unary          := ( "+" | "-" ) ( unary | primary ) | power   -- no "**" after
//! power          := primary ( "**" unary )?
//! primary        := number | "(" conditional ")"
//! ```
//!
//! Numbers are IEEE-754 doubles: `1/0` is infinity, comparisons give `1`
//! or `0`, `&&`/`||` return one of their operands, bitwise and shift
//! operators work on 32-bit integers. These are the semantics the stored
//! formulas were written against.

use std::fmt;

use tracing::debug;

use crate::error::FormulaError;
use crate::types::CalcValue;
use crate::{MAX_FORMULA_NESTING, MAX_FORMULA_TOKENS};

// =============================================================================
// Result Type
// =============================================================================

/// Outcome of evaluating a formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluated {
    /// The formula evaluated to a number (possibly infinite or NaN).
    Number(f64),
    /// The formula could not be evaluated.
    Blank,
}

impl Evaluated {
    /// Returns the number, if any.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Evaluated::Number(n) => Some(*n),
            Evaluated::Blank => None,
        }
    }

    /// Numeric value for price arithmetic, where a blank counts as zero.
    #[inline]
    pub fn number_or_zero(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    /// Checks if the evaluation failed.
    #[inline]
    pub fn is_blank(&self) -> bool {
        matches!(self, Evaluated::Blank)
    }
}

impl From<Evaluated> for CalcValue {
    fn from(value: Evaluated) -> Self {
        match value {
            Evaluated::Number(n) => CalcValue::Number(n),
            Evaluated::Blank => CalcValue::Blank,
        }
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Returns true for characters that survive sanitization.
#[inline]
pub fn is_formula_char(ch: char) -> bool {
    ch.is_ascii_digit() || "-()/*+.<>&|?;:".contains(ch) || ch.is_whitespace()
}

/// Drops every character outside the formula alphabet.
///
/// ## Example
/// ```rust
/// use tinsmith_core::formula::sanitize;
///
/// assert_eq!(sanitize("alert(1)+2"), "(1)+2");
/// assert_eq!(sanitize("W*L/1000000"), "*/1000000");
/// ```
pub fn sanitize(expression: &str) -> String {
    expression.chars().filter(|&ch| is_formula_char(ch)).collect()
}

/// Evaluates a formula string.
///
/// - Empty input is `0`.
/// - Anything that fails to parse is [`Evaluated::Blank`].
/// - No rounding happens here.
///
/// ## Example
/// ```rust
/// use tinsmith_core::formula::{evaluate, Evaluated};
///
/// assert_eq!(evaluate(""), Evaluated::Number(0.0));
/// assert_eq!(evaluate("300*500/1000000"), Evaluated::Number(0.15));
/// assert_eq!(evaluate("2>1 ? 10 : 20"), Evaluated::Number(10.0));
/// assert_eq!(evaluate("1+*"), Evaluated::Blank);
/// ```
pub fn evaluate(expression: &str) -> Evaluated {
    if expression.is_empty() {
        return Evaluated::Number(0.0);
    }

    let sanitized = sanitize(expression);
    match parse_formula(&sanitized) {
        Ok(expr) => Evaluated::Number(expr.eval()),
        Err(err) => {
            debug!(formula = %sanitized, error = %err, "Formula did not evaluate");
            Evaluated::Blank
        }
    }
}

/// Parses formula text into an expression tree.
///
/// Unlike [`evaluate`], the text is NOT sanitized first: a stray letter is
/// reported as [`FormulaError::UnexpectedCharacter`]. Used by authoring-time
/// validation.
pub fn parse_formula(text: &str) -> Result<Expr, FormulaError> {
    let tokens = Lexer::new(text).tokenize()?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    if tokens.len() > MAX_FORMULA_TOKENS {
        return Err(FormulaError::TooLong {
            count: tokens.len(),
            limit: MAX_FORMULA_TOKENS,
        });
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.conditional()?;
    match parser.peek() {
        None => Ok(expr),
        Some((token, offset)) => Err(FormulaError::UnexpectedToken {
            token: token.to_string(),
            offset,
        }),
    }
}

// =============================================================================
// Expression Tree
// =============================================================================

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Gt,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
}

/// Short-circuiting operators. They return one of their operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// Evaluates the tree.
    pub fn eval(&self) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Unary { op, operand } => {
                let v = operand.eval();
                match op {
                    UnaryOp::Plus => v,
                    UnaryOp::Minus => -v,
                }
            }
            Expr::Logical { op, lhs, rhs } => {
                let l = lhs.eval();
                match (op, truthy(l)) {
                    (LogicalOp::And, true) | (LogicalOp::Or, false) => rhs.eval(),
                    _ => l,
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let l = lhs.eval();
                let r = rhs.eval();
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    BinaryOp::Pow => power(l, r),
                    BinaryOp::Lt => bool_value(l < r),
                    BinaryOp::Gt => bool_value(l > r),
                    BinaryOp::Shl => to_int32(l).wrapping_shl(to_uint32(r) & 31) as f64,
                    BinaryOp::Shr => to_int32(l).wrapping_shr(to_uint32(r) & 31) as f64,
                    BinaryOp::UShr => to_uint32(l).wrapping_shr(to_uint32(r) & 31) as f64,
                    BinaryOp::BitAnd => (to_int32(l) & to_int32(r)) as f64,
                    BinaryOp::BitOr => (to_int32(l) | to_int32(r)) as f64,
                }
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if truthy(condition.eval()) {
                    then.eval()
                } else {
                    otherwise.eval()
                }
            }
        }
    }
}

#[inline]
fn truthy(v: f64) -> bool {
    v != 0.0 && !v.is_nan()
}

#[inline]
fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// `**` differs from `powf` only where the exponent is NaN or `±1` is
/// raised to an infinite power: both give NaN.
fn power(base: f64, exp: f64) -> f64 {
    if exp.is_nan() || (base.abs() == 1.0 && exp.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exp)
    }
}

/// Wraps a double into a 32-bit unsigned integer (modulo 2³²).
fn to_uint32(v: f64) -> u32 {
    if !v.is_finite() {
        return 0;
    }
    v.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// Wraps a double into a 32-bit signed integer.
fn to_int32(v: f64) -> i32 {
    to_uint32(v) as i32
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    LParen,
    RParen,
    Lt,
    Gt,
    Shl,
    Shr,
    UShr,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Question,
    Colon,
    Semicolon,
    // `++` / `--` lex as increment/decrement and never parse, so `10--5`
    // is rejected while `10- -5` is fine.
    Increment,
    Decrement,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Number(n) => return write!(f, "{}", n),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::StarStar => "**",
            Token::Slash => "/",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::UShr => ">>>",
            Token::Amp => "&",
            Token::AmpAmp => "&&",
            Token::Pipe => "|",
            Token::PipePipe => "||",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Increment => "++",
            Token::Decrement => "--",
        };
        f.write_str(s)
    }
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer { text, pos: 0 }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, FormulaError> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
                continue;
            }

            let start = self.pos;
            let token = if ch.is_ascii_digit() || ch == '.' {
                self.number()?
            } else {
                self.operator(ch)?
            };
            tokens.push((token, start));
        }
        Ok(tokens)
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn number(&mut self) -> Result<Token, FormulaError> {
        let start = self.pos;
        let bytes = self.text.as_bytes();
        let mut end = start;

        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'.' {
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }

        let literal = &self.text[start..end];
        self.pos = end;
        match literal.parse::<f64>() {
            Ok(n) if literal != "." => Ok(Token::Number(n)),
            _ => Err(FormulaError::InvalidNumber {
                literal: literal.to_string(),
                offset: start,
            }),
        }
    }

    fn operator(&mut self, ch: char) -> Result<Token, FormulaError> {
        // Longest match first.
        const OPERATORS: &[(&str, Token)] = &[
            (">>>", Token::UShr),
            ("**", Token::StarStar),
            ("<<", Token::Shl),
            (">>", Token::Shr),
            ("&&", Token::AmpAmp),
            ("||", Token::PipePipe),
            ("++", Token::Increment),
            ("--", Token::Decrement),
            ("+", Token::Plus),
            ("-", Token::Minus),
            ("*", Token::Star),
            ("/", Token::Slash),
            ("(", Token::LParen),
            (")", Token::RParen),
            ("<", Token::Lt),
            (">", Token::Gt),
            ("&", Token::Amp),
            ("|", Token::Pipe),
            ("?", Token::Question),
            (":", Token::Colon),
            (";", Token::Semicolon),
        ];

        for (text, token) in OPERATORS {
            if self.rest().starts_with(text) {
                // `//` and `/*` would open a comment in the original script host;
                // a formula never means that, so refuse it.
                if *token == Token::Slash && matches!(self.rest().as_bytes().get(1), Some(b'/' | b'*')) {
                    return Err(FormulaError::UnexpectedToken {
                        token: self.rest()[..2].to_string(),
                        offset: self.pos,
                    });
                }
                self.pos += text.len();
                return Ok(*token);
            }
        }

        Err(FormulaError::UnexpectedCharacter {
            ch,
            offset: self.pos,
        })
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    /// Open parentheses, ternaries, signs and exponents above the cursor.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<(Token, usize)> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_token(&self) -> Option<Token> {
        self.peek().map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let current = self.peek();
        if current.is_some() {
            self.pos += 1;
        }
        current
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        match self.advance() {
            Some((token, _)) if token == expected => Ok(()),
            Some((token, offset)) => Err(FormulaError::UnexpectedToken {
                token: token.to_string(),
                offset,
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    /// Runs `parse` one nesting level down. Every recursive production goes
    /// through here.
    fn nested(
        &mut self,
        offset: usize,
        parse: fn(&mut Parser) -> Result<Expr, FormulaError>,
    ) -> Result<Expr, FormulaError> {
        if self.depth >= MAX_FORMULA_NESTING {
            return Err(FormulaError::TooDeep {
                limit: MAX_FORMULA_NESTING,
                offset,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn conditional(&mut self) -> Result<Expr, FormulaError> {
        let condition = self.logical_or()?;
        let Some((Token::Question, offset)) = self.peek() else {
            return Ok(condition);
        };
        self.advance();
        let then = self.nested(offset, Parser::conditional)?;
        self.expect(Token::Colon)?;
        let otherwise = self.nested(offset, Parser::conditional)?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Parses a left-associative chain of the given operators.
    fn binary_chain(
        &mut self,
        operators: &[(Token, BinaryOp)],
        next: fn(&mut Parser) -> Result<Expr, FormulaError>,
    ) -> Result<Expr, FormulaError> {
        let mut lhs = next(self)?;
        while let Some(token) = self.peek_token() {
            let Some((_, op)) = operators.iter().find(|(t, _)| *t == token) else {
                break;
            };
            self.advance();
            let rhs = next(self)?;
            lhs = Expr::Binary {
                op: *op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn logical_chain(
        &mut self,
        operator: Token,
        op: LogicalOp,
        next: fn(&mut Parser) -> Result<Expr, FormulaError>,
    ) -> Result<Expr, FormulaError> {
        let mut lhs = next(self)?;
        while self.peek_token() == Some(operator) {
            self.advance();
            let rhs = next(self)?;
            lhs = Expr::Logical {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn logical_or(&mut self) -> Result<Expr, FormulaError> {
        self.logical_chain(Token::PipePipe, LogicalOp::Or, Parser::logical_and)
    }

    fn logical_and(&mut self) -> Result<Expr, FormulaError> {
        self.logical_chain(Token::AmpAmp, LogicalOp::And, Parser::bit_or)
    }

    fn bit_or(&mut self) -> Result<Expr, FormulaError> {
        self.binary_chain(&[(Token::Pipe, BinaryOp::BitOr)], Parser::bit_and)
    }

    fn bit_and(&mut self) -> Result<Expr, FormulaError> {
        self.binary_chain(&[(Token::Amp, BinaryOp::BitAnd)], Parser::relational)
    }

    fn relational(&mut self) -> Result<Expr, FormulaError> {
        self.binary_chain(
            &[(Token::Lt, BinaryOp::Lt), (Token::Gt, BinaryOp::Gt)],
            Parser::shift,
        )
    }

    fn shift(&mut self) -> Result<Expr, FormulaError> {
        self.binary_chain(
            &[
                (Token::Shl, BinaryOp::Shl),
                (Token::Shr, BinaryOp::Shr),
                (Token::UShr, BinaryOp::UShr),
            ],
            Parser::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, FormulaError> {
        self.binary_chain(
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            Parser::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, FormulaError> {
        self.binary_chain(
            &[(Token::Star, BinaryOp::Mul), (Token::Slash, BinaryOp::Div)],
            Parser::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        let (op, offset) = match self.peek() {
            Some((Token::Plus, offset)) => (UnaryOp::Plus, offset),
            Some((Token::Minus, offset)) => (UnaryOp::Minus, offset),
            _ => return self.power(),
        };
        self.advance();
        let operand = match self.peek_token() {
            Some(Token::Plus | Token::Minus) => self.nested(offset, Parser::unary)?,
            _ => self.primary()?,
        };
        if let Some((Token::StarStar, offset)) = self.peek() {
            return Err(FormulaError::UnaryBeforeExponent { offset });
        }
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.primary()?;
        let Some((Token::StarStar, offset)) = self.peek() else {
            return Ok(base);
        };
        self.advance();
        // Right-associative: 2 ** 3 ** 2 = 2 ** 9
        let exponent = self.nested(offset, Parser::unary)?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(base),
            rhs: Box::new(exponent),
        })
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.advance() {
            Some((Token::Number(n), _)) => Ok(Expr::Number(n)),
            Some((Token::LParen, offset)) => {
                let inner = self.nested(offset, Parser::conditional)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some((token, offset)) => Err(FormulaError::UnexpectedToken {
                token: token.to_string(),
                offset,
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
