//! # Expression parser
//!
//! A hand-rolled recursive-descent (precedence-climbing) parser over the
//! token stream produced by [`super::lexer`]. Precedence, lowest to
//! highest, all binary operators left-associative: `<<`/`>>` < `+`/`-` <
//! `CAST` (§4.C, §4.D).

use crate::ast::{ArithOp, IntExp, LocationExp};
use crate::error::{Result, TcamError};
use crate::expr::lexer::{tokenize, Spanned, Token};
use crate::sizedint::SizedInt;

/// Parses integer expressions (and, incidentally, location expressions,
/// which are a production of the same grammar) into an [`IntExp`].
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    /// Parse `src` as an `intexp`, consuming the entire input. Every
    /// failure mode — illegal character, zero-width cast, unbalanced
    /// brackets, unexpected or trailing token — is fatal to this call and
    /// carries the offending lexeme.
    pub fn parse(src: &str) -> Result<IntExp> {
        let tokens = tokenize(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let exp = parser.parse_shift()?;
        if let Some(trailing) = parser.peek() {
            return Err(TcamError::parse(format!(
                "unexpected trailing token '{}'",
                trailing.lexeme
            )));
        }
        Ok(exp)
    }

    /// Parse `src` as a `locexp` specifically, failing if the expression
    /// does not reduce to a location.
    pub fn parse_location(src: &str) -> Result<LocationExp> {
        match Self::parse(src)? {
            IntExp::Location(loc) => Ok(loc),
            other => Err(TcamError::parse(format!(
                "expected a location expression, got {:?}",
                other
            ))),
        }
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<()> {
        match self.advance() {
            Some(span) if &span.token == expected => Ok(()),
            Some(span) => Err(TcamError::parse(format!(
                "expected {}, found '{}'",
                what, span.lexeme
            ))),
            None => Err(TcamError::parse(format!(
                "expected {}, but input ended",
                what
            ))),
        }
    }

    // Lowest precedence: left-associative `<<`/`>>`.
    fn parse_shift(&mut self) -> Result<IntExp> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::LShift) => ArithOp::LShift,
                Some(Token::RShift) => ArithOp::RShift,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = IntExp::arith(op, left, right);
        }
        Ok(left)
    }

    // Next precedence: left-associative `+`/`-`.
    fn parse_additive(&mut self) -> Result<IntExp> {
        let mut left = self.parse_cast_or_primary()?;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::Plus) => ArithOp::Plus,
                Some(Token::Minus) => ArithOp::Minus,
                _ => break,
            };
            self.advance();
            let right = self.parse_cast_or_primary()?;
            left = IntExp::arith(op, left, right);
        }
        Ok(left)
    }

    // Highest precedence: a unary width cast, or a primary expression.
    fn parse_cast_or_primary(&mut self) -> Result<IntExp> {
        if let Some(Token::Cast(width)) = self.peek().map(|s| &s.token) {
            let width = *width;
            self.advance();
            let right = self.parse_cast_or_primary()?;
            return Ok(IntExp::arith(
                ArithOp::Cast,
                IntExp::Const(SizedInt::new(width as u128, 32)),
                right,
            ));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<IntExp> {
        match self.advance() {
            Some(Spanned {
                token: Token::Number(n),
                ..
            }) => Ok(IntExp::Const(n)),
            Some(Spanned {
                token: Token::Id(name),
                ..
            }) => {
                self.expect(&Token::LBracket, "'['")?;
                let start = self.parse_shift()?;
                self.expect(&Token::Colon, "':'")?;
                let end = self.parse_shift()?;
                self.expect(&Token::RBracket, "']'")?;
                Ok(IntExp::Location(LocationExp::new(name, start, end)))
            }
            Some(Spanned {
                token: Token::LParen,
                ..
            }) => {
                let inner = self.parse_shift()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(other) => Err(TcamError::parse(format!(
                "unexpected token '{}'",
                other.lexeme
            ))),
            None => Err(TcamError::parse("unexpected end of expression".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ArithExp;

    fn const32(v: u128) -> IntExp {
        IntExp::Const(SizedInt::new(v, 32))
    }

    #[test]
    fn parses_plain_constant() {
        assert_eq!(Parser::parse("3").unwrap(), const32(3));
    }

    #[test]
    fn parses_sized_constant() {
        assert_eq!(Parser::parse("17w4").unwrap(), IntExp::Const(SizedInt::new(1, 4)));
    }

    #[test]
    fn shift_binds_looser_than_plus() {
        // "3+4>>5" == (3+4)>>5
        let parsed = Parser::parse("3+4>>5").unwrap();
        let expected = IntExp::arith(
            ArithOp::RShift,
            IntExp::arith(ArithOp::Plus, const32(3), const32(4)),
            const32(5),
        );
        assert_eq!(parsed, expected);
    }

    #[test]
    fn parens_override_precedence() {
        let parsed = Parser::parse("3+(4>>5)").unwrap();
        let expected = IntExp::arith(
            ArithOp::Plus,
            const32(3),
            IntExp::arith(ArithOp::RShift, const32(4), const32(5)),
        );
        assert_eq!(parsed, expected);
    }

    #[test]
    fn shift_chain_is_left_associative() {
        let parsed = Parser::parse("3+4>>5<<6").unwrap();
        let expected = IntExp::arith(
            ArithOp::LShift,
            IntExp::arith(
                ArithOp::RShift,
                IntExp::arith(ArithOp::Plus, const32(3), const32(4)),
                const32(5),
            ),
            const32(6),
        );
        assert_eq!(parsed, expected);
    }

    #[test]
    fn cast_binds_tighter_than_shift() {
        let parsed = Parser::parse("(w3)4>>5").unwrap();
        let expected = IntExp::arith(
            ArithOp::RShift,
            IntExp::arith(ArithOp::Cast, const32(3), const32(4)),
            const32(5),
        );
        assert_eq!(parsed, expected);
    }

    #[test]
    fn zero_width_cast_is_a_parse_error() {
        assert!(Parser::parse("(w0)3").is_err());
    }

    #[test]
    fn locexp_basic() {
        let parsed = Parser::parse("packet[0:3]").unwrap();
        match parsed {
            IntExp::Location(loc) => {
                assert_eq!(loc.name, "packet");
                assert_eq!(*loc.start, const32(0));
                assert_eq!(*loc.end, const32(3));
            }
            other => panic!("expected LocationExp, got {:?}", other),
        }
    }

    #[test]
    fn locexp_bounds_may_nest_arbitrary_intexps() {
        let parsed = Parser::parse("packet[16+17:reg0[5:25]]").unwrap();
        let expected = IntExp::Location(LocationExp::new(
            "packet",
            IntExp::arith(ArithOp::Plus, const32(16), const32(17)),
            IntExp::Location(LocationExp::new("reg0", const32(5), const32(25))),
        ));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn no_multiplication_operator() {
        assert!(Parser::parse("3*4").is_err());
    }

    #[test]
    fn unbalanced_brackets_fail() {
        assert!(Parser::parse("packet[0:3").is_err());
        assert!(Parser::parse("(3+4").is_err());
    }

    #[test]
    fn parse_location_rejects_non_location_expressions() {
        assert!(Parser::parse_location("3+4").is_err());
        assert!(Parser::parse_location("packet[0:3]").is_ok());
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(Parser::parse("3 4").is_err());
    }

    #[test]
    fn arith_exp_helper_is_used_for_cast() {
        // sanity-check that Cast nodes are plain ArithExp with op=Cast
        let parsed = Parser::parse("(w3)4").unwrap();
        match parsed {
            IntExp::Arith(ArithExp { op, .. }) => assert_eq!(op, ArithOp::Cast),
            other => panic!("expected ArithExp, got {:?}", other),
        }
    }
}
