//! Recursive-descent parser for zman formulas.
//!
//! Grammar, by precedence:
//!
//! ```text
//! formula     := additive
//! additive    := primary (('+' | '-') primary)*     left-associative
//! primary     := NUMBER | MINUTES | IDENT | AT_REF | call
//!              | '(' additive ')' | conditional
//! call        := IDENT '(' argList ')'
//! conditional := 'if' '(' IDENT ')' '{' additive '}' 'else' '{' additive '}'
//! ```
//!
//! Function signatures are validated here, not at evaluation: arity,
//! per-position argument kinds, and the 0..=90 degree range all fail
//! with a structured [`ParseError`] carrying the offending offset.
//! Unary minus is not part of the language -- offsets are always written
//! as `+`/`-` between two operands.

use rust_decimal::Decimal;

use crate::ast::{BaseSystem, BinOp, Direction, Expr, ValueKind};
use crate::error::{ParseError, MAX_NESTING_DEPTH};
use crate::lexer::{tokenize, Spanned, Token};
use crate::symbols::{self, ArgKind, Signature};

/// Parse a formula into an AST. Returns the first error encountered.
pub fn parse_formula(text: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(text);
    let mut parser = Parser::new(&tokens);
    let (expr, _) = parser.parse_additive()?;

    match parser.peek() {
        Token::Eof => {}
        Token::RParen => {
            return Err(ParseError::UnbalancedParentheses {
                offset: parser.cur_offset(),
            })
        }
        other => {
            return Err(ParseError::UnexpectedToken {
                found: other.describe(),
                expected: "'+', '-' or end of formula".to_owned(),
                offset: parser.cur_offset(),
            })
        }
    }

    match expr.value_kind() {
        ValueKind::Time => Ok(expr),
        kind => Err(ParseError::UnexpectedToken {
            found: kind_label(kind).to_owned(),
            expected: "a time-valued formula".to_owned(),
            offset: 0,
        }),
    }
}

fn kind_label(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Time => "a time expression",
        ValueKind::Duration => "a duration",
        ValueKind::Number => "a number",
        ValueKind::Direction => "a direction",
        ValueKind::BaseSystem => "a base system",
        ValueKind::Flag => "a calendar predicate",
    }
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn cur_offset(&self) -> u32 {
        self.cur().offset
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::UnexpectedToken {
            found: self.peek().describe(),
            expected: expected.into(),
            offset: self.cur_offset(),
        }
    }

    fn expect_lparen(&mut self) -> Result<(), ParseError> {
        if self.peek() == &Token::LParen {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("'('"))
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        if self.peek() == &Token::RParen {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::UnbalancedParentheses {
                offset: self.cur_offset(),
            })
        }
    }

    fn expect_lbrace(&mut self) -> Result<(), ParseError> {
        if self.peek() == &Token::LBrace {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("'{'"))
        }
    }

    fn expect_rbrace(&mut self) -> Result<(), ParseError> {
        if self.peek() == &Token::RBrace {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("'}'"))
        }
    }

    fn take_ident(&mut self, expected: &str) -> Result<(String, u32), ParseError> {
        let off = self.cur_offset();
        if let Token::Ident(w) = self.peek().clone() {
            self.advance();
            Ok((w, off))
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn take_number(&mut self, expected: &str) -> Result<(Decimal, u32), ParseError> {
        let off = self.cur_offset();
        if let Token::Number(text) = self.peek().clone() {
            self.advance();
            let value: Decimal = text
                .parse()
                .map_err(|_| ParseError::UnexpectedToken {
                    found: format!("'{}'", text),
                    expected: "a representable number".to_owned(),
                    offset: off,
                })?;
            Ok((value, off))
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Source rendering of the current token without quoting, for the
    /// `token` field of InvalidDirection / InvalidBaseSystem.
    fn token_text(&self) -> String {
        match self.peek() {
            Token::Ident(w) => w.clone(),
            Token::Number(n) => n.clone(),
            Token::Minutes(n) => format!("{}min", n),
            Token::AtRef(k) => format!("@{}", k),
            other => other.describe().trim_matches('\'').to_owned(),
        }
    }

    // -- Expression parsing --------------------------------------

    fn parse_additive(&mut self) -> Result<(Expr, u32), ParseError> {
        let (mut left, left_off) = self.parse_primary()?;

        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };
            let op_off = self.cur_offset();
            self.advance();
            let (right, right_off) = self.parse_primary()?;

            self.check_operands(&left, &right, op_off, right_off)?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok((left, left_off))
    }

    /// Operand policy for `+`/`-`: the right operand must be a
    /// duration, except that two durations may also combine. Two
    /// absolute times never combine.
    fn check_operands(
        &self,
        left: &Expr,
        right: &Expr,
        op_off: u32,
        right_off: u32,
    ) -> Result<(), ParseError> {
        let lk = left.value_kind();
        let rk = right.value_kind();

        if lk == ValueKind::Time && rk == ValueKind::Time {
            return Err(ParseError::CannotCombineTwoTimes { offset: op_off });
        }
        if let Expr::Number { value } = right {
            return Err(ParseError::InvalidDurationFormat {
                text: value.to_string(),
                offset: right_off,
            });
        }
        if let Expr::Number { value } = left {
            return Err(ParseError::InvalidDurationFormat {
                text: value.to_string(),
                offset: op_off,
            });
        }
        if rk != ValueKind::Duration {
            return Err(ParseError::UnexpectedToken {
                found: kind_label(rk).to_owned(),
                expected: "a duration after '+' or '-'".to_owned(),
                offset: right_off,
            });
        }
        Ok(())
    }

    fn parse_primary(&mut self) -> Result<(Expr, u32), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeeplyNested {
                limit: MAX_NESTING_DEPTH,
            });
        }
        let result = self.parse_primary_inner();
        self.depth -= 1;
        result
    }

    fn parse_primary_inner(&mut self) -> Result<(Expr, u32), ParseError> {
        let off = self.cur_offset();
        match self.peek().clone() {
            Token::Number(text) => {
                self.advance();
                // A number glued to a non-`min` word is a malformed
                // duration, e.g. `30minutes`. Adjacency shows in offsets.
                if let Token::Ident(suffix) = self.peek() {
                    if self.cur_offset() == off + text.chars().count() as u32 {
                        return Err(ParseError::InvalidDurationFormat {
                            text: format!("{}{}", text, suffix),
                            offset: off,
                        });
                    }
                }
                let value: Decimal =
                    text.parse().map_err(|_| ParseError::UnexpectedToken {
                        found: format!("'{}'", text),
                        expected: "a representable number".to_owned(),
                        offset: off,
                    })?;
                Ok((Expr::Number { value }, off))
            }

            Token::Minutes(text) => {
                self.advance();
                let minutes: i64 =
                    text.parse().map_err(|_| ParseError::InvalidDurationFormat {
                        text: format!("{}min", text),
                        offset: off,
                    })?;
                Ok((Expr::Duration { minutes }, off))
            }

            Token::Ident(name) => {
                self.advance();
                if self.peek() == &Token::LParen {
                    return self.parse_call(name, off);
                }
                if symbols::is_primitive(&name) {
                    Ok((Expr::Primitive { name }, off))
                } else {
                    Err(ParseError::UnknownPrimitive { name, offset: off })
                }
            }

            Token::AtRef(key) => {
                self.advance();
                if key.is_empty() {
                    Err(ParseError::UnexpectedToken {
                        found: "'@'".to_owned(),
                        expected: "a zman key after '@'".to_owned(),
                        offset: off,
                    })
                } else {
                    Ok((Expr::Reference { key }, off))
                }
            }

            Token::LParen => {
                self.advance();
                let (inner, _) = self.parse_additive()?;
                self.expect_rparen()?;
                Ok((inner, off))
            }

            Token::If => self.parse_conditional(off),

            Token::Minus => Err(ParseError::UnexpectedToken {
                found: "'-'".to_owned(),
                expected: "an expression (unary minus is not supported)".to_owned(),
                offset: off,
            }),

            Token::RParen => Err(ParseError::UnbalancedParentheses { offset: off }),

            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                expected: "an expression".to_owned(),
                offset: off,
            }),
        }
    }

    // -- Function calls ------------------------------------------

    fn parse_call(&mut self, name: String, off: u32) -> Result<(Expr, u32), ParseError> {
        let Some(sig) = symbols::function_signature(&name) else {
            return Err(ParseError::UnknownFunction { name, offset: off });
        };
        self.advance(); // consume '('

        let mut args = Vec::new();
        if self.peek() != &Token::RParen {
            loop {
                let arg = self.parse_argument(sig, args.len())?;
                args.push(arg);
                if self.peek() == &Token::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect_rparen()?;

        if args.len() != sig.arity() {
            return Err(ParseError::WrongArgumentCount {
                function: name,
                expected: sig.arity(),
                got: args.len(),
                offset: off,
            });
        }

        Ok((
            Expr::Call {
                function: name,
                args,
            },
            off,
        ))
    }

    fn parse_argument(&mut self, sig: &Signature, index: usize) -> Result<Expr, ParseError> {
        let off = self.cur_offset();
        match sig.arg_kinds.get(index) {
            Some(ArgKind::Degrees) => {
                let (value, _) = self.take_number(ArgKind::Degrees.describe())?;
                if value < Decimal::ZERO || value > Decimal::from(90) {
                    return Err(ParseError::DegreesOutOfRange { value, offset: off });
                }
                Ok(Expr::Number { value })
            }

            Some(ArgKind::Hours) => {
                let (value, _) = self.take_number(ArgKind::Hours.describe())?;
                Ok(Expr::Number { value })
            }

            Some(ArgKind::Direction) => {
                let token = self.token_text();
                match self.peek().clone() {
                    Token::Ident(w) => {
                        self.advance();
                        match Direction::parse(&w) {
                            Some(value) => Ok(Expr::Direction { value }),
                            None => Err(ParseError::InvalidDirection {
                                token: w,
                                offset: off,
                            }),
                        }
                    }
                    _ => Err(ParseError::InvalidDirection { token, offset: off }),
                }
            }

            Some(ArgKind::BaseSystem) => {
                let token = self.token_text();
                match self.peek().clone() {
                    Token::Ident(w) => {
                        self.advance();
                        match BaseSystem::parse(&w) {
                            Some(value) => Ok(Expr::BaseSystem { value }),
                            None => Err(ParseError::InvalidBaseSystem {
                                token: w,
                                offset: off,
                            }),
                        }
                    }
                    _ => Err(ParseError::InvalidBaseSystem { token, offset: off }),
                }
            }

            Some(ArgKind::Time) => {
                let (expr, expr_off) = self.parse_additive()?;
                match expr.value_kind() {
                    ValueKind::Time => Ok(expr),
                    kind => Err(ParseError::UnexpectedToken {
                        found: kind_label(kind).to_owned(),
                        expected: "a time-valued expression".to_owned(),
                        offset: expr_off,
                    }),
                }
            }

            // Surplus argument: parse loosely so the arity check can
            // report the count instead of a misleading kind error.
            None => match self.peek().clone() {
                Token::Ident(w) if symbols::is_direction(&w) => {
                    self.advance();
                    // symbol table and AST enum are kept in sync (checked by tests)
                    let value = Direction::parse(&w).ok_or(ParseError::InvalidDirection {
                        token: w,
                        offset: off,
                    })?;
                    Ok(Expr::Direction { value })
                }
                Token::Ident(w) if symbols::is_base_system(&w) => {
                    self.advance();
                    let value = BaseSystem::parse(&w).ok_or(ParseError::InvalidBaseSystem {
                        token: w,
                        offset: off,
                    })?;
                    Ok(Expr::BaseSystem { value })
                }
                _ => {
                    let (expr, _) = self.parse_additive()?;
                    Ok(expr)
                }
            },
        }
    }

    // -- Conditionals --------------------------------------------

    fn parse_conditional(&mut self, off: u32) -> Result<(Expr, u32), ParseError> {
        self.advance(); // consume 'if'
        self.expect_lparen()?;
        let (name, _) = self.take_ident("a calendar predicate name")?;
        let condition = Expr::CalendarFlag { name };
        self.expect_rparen()?;

        self.expect_lbrace()?;
        let then_branch = self.parse_branch()?;
        self.expect_rbrace()?;

        if self.peek() != &Token::Else {
            return Err(self.unexpected("'else'"));
        }
        self.advance();

        self.expect_lbrace()?;
        let else_branch = self.parse_branch()?;
        self.expect_rbrace()?;

        Ok((
            Expr::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            off,
        ))
    }

    fn parse_branch(&mut self) -> Result<Expr, ParseError> {
        let (expr, expr_off) = self.parse_additive()?;
        match expr.value_kind() {
            ValueKind::Time => Ok(expr),
            kind => Err(ParseError::UnexpectedToken {
                found: kind_label(kind).to_owned(),
                expected: "a time-valued expression".to_owned(),
                offset: expr_off,
            }),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
