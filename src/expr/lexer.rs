//! # Expression lexer
//!
//! Tokenizes the small integer-expression grammar (§4.C of the
//! specification). Whitespace (space and tab) between tokens is ignored.
//! Every token is paired with the raw lexeme that produced it, so parse
//! errors can name the offending text.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{Result, TcamError};
use crate::sizedint::SizedInt;

/// Default width for an integer literal with no explicit `wN` suffix.
pub const DEFAULT_WIDTH: u32 = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Number(SizedInt),
    Id(String),
    Plus,
    Minus,
    LShift,
    RShift,
    /// `(wN)`, already validated to have `N > 0`.
    Cast(u32),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
}

/// A token paired with the exact source text it was lexed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub lexeme: String,
}

/// Lex `src` into a flat token stream. Fails on an illegal character or a
/// zero-width cast.
pub fn tokenize(src: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<CharIndices> = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c == ' ' || c == '\t' {
            chars.next();
            continue;
        }
        match c {
            '+' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Plus,
                    lexeme: "+".to_string(),
                });
            }
            '-' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Minus,
                    lexeme: "-".to_string(),
                });
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '<')) => {
                        chars.next();
                        tokens.push(Spanned {
                            token: Token::LShift,
                            lexeme: "<<".to_string(),
                        });
                    }
                    _ => {
                        return Err(TcamError::parse(format!("illegal character '{}'", c)));
                    }
                }
            }
            '>' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '>')) => {
                        chars.next();
                        tokens.push(Spanned {
                            token: Token::RShift,
                            lexeme: ">>".to_string(),
                        });
                    }
                    _ => {
                        return Err(TcamError::parse(format!("illegal character '{}'", c)));
                    }
                }
            }
            '[' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::LBracket,
                    lexeme: "[".to_string(),
                });
            }
            ']' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::RBracket,
                    lexeme: "]".to_string(),
                });
            }
            ':' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Colon,
                    lexeme: ":".to_string(),
                });
            }
            '(' => {
                if let Some(span) = try_lex_cast(src, &mut chars, start)? {
                    tokens.push(span);
                } else {
                    chars.next();
                    tokens.push(Spanned {
                        token: Token::LParen,
                        lexeme: "(".to_string(),
                    });
                }
            }
            ')' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::RParen,
                    lexeme: ")".to_string(),
                });
            }
            '0'..='9' => {
                let span = lex_number(src, &mut chars, start);
                tokens.push(span);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let span = lex_id(src, &mut chars, start);
                tokens.push(span);
            }
            other => {
                return Err(TcamError::parse(format!("illegal character '{}'", other)));
            }
        }
    }
    Ok(tokens)
}

/// Attempt to lex a `(wN)` cast starting at `(`. Returns `Ok(None)` if the
/// text at this position isn't a well-formed cast (caller then falls back
/// to a plain `(` token), and `Err` if it looks like a cast but has a
/// zero width.
fn try_lex_cast(
    src: &str,
    chars: &mut Peekable<CharIndices>,
    start: usize,
) -> Result<Option<Spanned>> {
    let mut probe = chars.clone();
    probe.next(); // consume '('
    match probe.peek() {
        Some(&(_, 'w')) => {}
        _ => return Ok(None),
    }
    probe.next(); // consume 'w'

    let digits_start = match probe.peek() {
        Some(&(idx, c)) if c.is_ascii_digit() => idx,
        _ => return Ok(None),
    };
    let mut digits_end = digits_start;
    while let Some(&(idx, c)) = probe.peek() {
        if c.is_ascii_digit() {
            digits_end = idx + c.len_utf8();
            probe.next();
        } else {
            break;
        }
    }
    match probe.peek() {
        Some(&(_, ')')) => {
            let (close_idx, _) = probe.next().unwrap();
            let lexeme_end = close_idx + 1;
            let digits = &src[digits_start..digits_end];
            let width: u32 = digits.parse().map_err(|_| {
                TcamError::parse(format!("malformed cast width in '{}'", &src[start..lexeme_end]))
            })?;
            if width == 0 {
                return Err(TcamError::parse(
                    "casts are not allowed to have 0 width".to_string(),
                ));
            }
            *chars = probe;
            Ok(Some(Spanned {
                token: Token::Cast(width),
                lexeme: src[start..lexeme_end].to_string(),
            }))
        }
        _ => Ok(None),
    }
}

fn lex_number(src: &str, chars: &mut Peekable<CharIndices>, start: usize) -> Spanned {
    let mut end = start;
    while let Some(&(idx, c)) = chars.peek() {
        if c.is_ascii_digit() {
            end = idx + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }
    // Optional `wWIDTH` suffix.
    if let Some(&(w_idx, 'w')) = chars.peek() {
        let mut probe = chars.clone();
        probe.next();
        if let Some(&(d_idx, c)) = probe.peek() {
            if c.is_ascii_digit() {
                let mut w_end = d_idx;
                while let Some(&(idx, c)) = probe.peek() {
                    if c.is_ascii_digit() {
                        w_end = idx + c.len_utf8();
                        probe.next();
                    } else {
                        break;
                    }
                }
                *chars = probe;
                let value: u128 = src[start..end].parse().unwrap();
                let width: u32 = src[d_idx..w_end].parse().unwrap();
                let lexeme = src[start..w_end].to_string();
                return Spanned {
                    token: Token::Number(SizedInt::new(value, width)),
                    lexeme,
                };
            }
        }
        let _ = w_idx;
    }
    let value: u128 = src[start..end].parse().unwrap();
    Spanned {
        token: Token::Number(SizedInt::new(value, DEFAULT_WIDTH)),
        lexeme: src[start..end].to_string(),
    }
}

fn lex_id(src: &str, chars: &mut Peekable<CharIndices>, start: usize) -> Spanned {
    let mut end = start;
    while let Some(&(idx, c)) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            end = idx + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }
    let lexeme = src[start..end].to_string();
    Spanned {
        token: Token::Id(lexeme.clone()),
        lexeme,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn number_without_width_defaults_to_32() {
        assert_eq!(toks("3"), vec![Token::Number(SizedInt::new(3, 32))]);
    }

    #[test]
    fn number_with_explicit_width() {
        assert_eq!(toks("3w16"), vec![Token::Number(SizedInt::new(3, 16))]);
    }

    #[test]
    fn whitespace_between_tokens_is_ignored() {
        assert_eq!(toks("3 + 4"), vec![
            Token::Number(SizedInt::new(3, 32)),
            Token::Plus,
            Token::Number(SizedInt::new(4, 32)),
        ]);
    }

    #[test]
    fn cast_token_requires_nonzero_width() {
        assert!(tokenize("(w0)3").is_err());
        assert_eq!(
            toks("(w3)4"),
            vec![Token::Cast(3), Token::Number(SizedInt::new(4, 32))]
        );
    }

    #[test]
    fn bare_paren_is_not_mistaken_for_a_cast() {
        assert_eq!(
            toks("(3+4)"),
            vec![
                Token::LParen,
                Token::Number(SizedInt::new(3, 32)),
                Token::Plus,
                Token::Number(SizedInt::new(4, 32)),
                Token::RParen
            ]
        );
    }

    #[test]
    fn locexp_tokens() {
        assert_eq!(
            toks("packet[0:3]"),
            vec![
                Token::Id("packet".to_string()),
                Token::LBracket,
                Token::Number(SizedInt::new(0, 32)),
                Token::Colon,
                Token::Number(SizedInt::new(3, 32)),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn illegal_character_is_rejected() {
        assert!(tokenize("3*4").is_err());
        assert!(tokenize("3~4").is_err());
    }

    #[test]
    fn single_angle_bracket_is_illegal() {
        assert!(tokenize("3<4").is_err());
        assert!(tokenize("3>4").is_err());
    }
}
