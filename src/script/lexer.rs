//! Flat tokenizer for expression bodies
//!
//! Input is expected to be whitespace-free already. A leading `+`/`-` is
//! folded into a number literal only where an operand is expected, which is
//! what lets `a*-2` parse while `a-2` stays a subtraction.

use super::ast::BinaryOp;
use super::error::CompileError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    Number(f32),
    Ident(&'a str),
    Op(BinaryOp),
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub offset: usize,
}

pub fn tokenize(src: &str) -> Result<Vec<Spanned<'_>>, CompileError> {
    let bytes = src.as_bytes();
    let mut tokens: Vec<Spanned<'_>> = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let expects_operand = match tokens.last() {
            None => true,
            Some(prev) => matches!(prev.token, Token::Op(_) | Token::Open),
        };

        let (token, len) = match c {
            b'(' => (Token::Open, 1),
            b')' => (Token::Close, 1),
            b'+' | b'-' if expects_operand && starts_number(&bytes[pos + 1..]) => {
                let len = 1 + number_len(&bytes[pos + 1..]);
                (Token::Number(parse_number(&src[pos..pos + len])?), len)
            }
            b'0'..=b'9' | b'.' if starts_number(&bytes[pos..]) => {
                let len = number_len(&bytes[pos..]);
                (Token::Number(parse_number(&src[pos..pos + len])?), len)
            }
            b'a'..=b'z' | b'A'..=b'Z' => {
                let len = ident_len(&bytes[pos..]);
                (Token::Ident(&src[pos..pos + len]), len)
            }
            _ => match BinaryOp::from_char(c as char) {
                Some(op) => (Token::Op(op), 1),
                None => {
                    return Err(CompileError::UnknownToken {
                        offset: pos,
                        rest: src[pos..].to_string(),
                    })
                }
            },
        };

        tokens.push(Spanned { token, offset: pos });
        pos += len;
    }

    Ok(tokens)
}

/// Length of a leading identifier `[A-Za-z][A-Za-z0-9_]*`
pub fn ident_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .enumerate()
        .take_while(|(i, b)| b.is_ascii_alphabetic() || (*i > 0 && (b.is_ascii_digit() || **b == b'_')))
        .count()
}

fn starts_number(bytes: &[u8]) -> bool {
    match bytes {
        [d, ..] if d.is_ascii_digit() => true,
        [b'.', d, ..] => d.is_ascii_digit(),
        _ => false,
    }
}

// digits [. digits*] [exponent] | . digits+ [exponent]
fn number_len(bytes: &[u8]) -> usize {
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut len = digits(0);
    if bytes.get(len) == Some(&b'.') {
        len += 1 + digits(len + 1);
    }

    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exp = len + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            len = exp + exp_digits;
        }
    }

    len
}

fn parse_number(text: &str) -> Result<f32, CompileError> {
    text.parse::<f32>()
        .map_err(|_| CompileError::InvalidNumber(text.to_string()))
}
