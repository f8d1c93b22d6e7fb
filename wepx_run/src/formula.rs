/*
 * restricted per-pixel expression evaluator for a variable's optional `formula` (§9 design notes:
 * "re-express as a small restricted expression evaluator over a typed array with a whitelist of
 * arithmetic operators and a handful of named unary functions; do not allow arbitrary code
 * execution"). No crate in the teacher workspace provides this - it is intentionally hand-rolled
 * rather than delegated to a generic expression-eval dependency, per that same design note.
 */
use crate::errors::{Result, WepxRunError};

#[derive(Debug, Clone)]
enum Expr {
    X,
    Num(f64),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Call(&'static str, Box<Expr>),
}

const FUNCS: &[&str] = &["sqrt", "abs", "ln", "exp", "sin", "cos"];

pub struct Formula {
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Formula> {
        let tokens = tokenize(source)?;
        let mut pos = 0;
        let expr = parse_expr(&tokens, &mut pos)?;
        if pos != tokens.len() {
            return Err(WepxRunError::FormulaError(format!("unexpected trailing input in {source:?}")));
        }
        Ok(Formula { expr })
    }

    /// apply the formula to every pixel, leaving NaN pixels untouched.
    pub fn apply(&self, grid: &[f32]) -> Vec<f32> {
        grid.iter().map(|&v| if v.is_nan() { v } else { eval(&self.expr, v as f64) as f32 }).collect()
    }
}

fn eval(expr: &Expr, x: f64) -> f64 {
    match expr {
        Expr::X => x,
        Expr::Num(n) => *n,
        Expr::Neg(a) => -eval(a, x),
        Expr::Add(a, b) => eval(a, x) + eval(b, x),
        Expr::Sub(a, b) => eval(a, x) - eval(b, x),
        Expr::Mul(a, b) => eval(a, x) * eval(b, x),
        Expr::Div(a, b) => eval(a, x) / eval(b, x),
        Expr::Call(name, a) => {
            let v = eval(a, x);
            match *name {
                "sqrt" => v.sqrt(),
                "abs" => v.abs(),
                "ln" => v.ln(),
                "exp" => v.exp(),
                "sin" => v.sin(),
                "cos" => v.cos(),
                _ => unreachable!("unknown function survived parsing"),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n: f64 =
                    text.parse().map_err(|_| WepxRunError::FormulaError(format!("bad number {text:?}")))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(text));
            }
            other => return Err(WepxRunError::FormulaError(format!("unexpected character {other:?}"))),
        }
    }
    Ok(tokens)
}

fn parse_expr(tokens: &[Token], pos: &mut usize) -> Result<Expr> {
    let mut lhs = parse_term(tokens, pos)?;
    loop {
        match tokens.get(*pos) {
            Some(Token::Plus) => {
                *pos += 1;
                lhs = Expr::Add(Box::new(lhs), Box::new(parse_term(tokens, pos)?));
            }
            Some(Token::Minus) => {
                *pos += 1;
                lhs = Expr::Sub(Box::new(lhs), Box::new(parse_term(tokens, pos)?));
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn parse_term(tokens: &[Token], pos: &mut usize) -> Result<Expr> {
    let mut lhs = parse_factor(tokens, pos)?;
    loop {
        match tokens.get(*pos) {
            Some(Token::Star) => {
                *pos += 1;
                lhs = Expr::Mul(Box::new(lhs), Box::new(parse_factor(tokens, pos)?));
            }
            Some(Token::Slash) => {
                *pos += 1;
                lhs = Expr::Div(Box::new(lhs), Box::new(parse_factor(tokens, pos)?));
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn parse_factor(tokens: &[Token], pos: &mut usize) -> Result<Expr> {
    match tokens.get(*pos) {
        Some(Token::Minus) => {
            *pos += 1;
            Ok(Expr::Neg(Box::new(parse_factor(tokens, pos)?)))
        }
        _ => parse_primary(tokens, pos),
    }
}

fn parse_primary(tokens: &[Token], pos: &mut usize) -> Result<Expr> {
    match tokens.get(*pos) {
        Some(Token::Num(n)) => {
            *pos += 1;
            Ok(Expr::Num(*n))
        }
        Some(Token::Ident(name)) if name == "x" => {
            *pos += 1;
            Ok(Expr::X)
        }
        Some(Token::Ident(name)) => {
            let func = FUNCS
                .iter()
                .find(|f| **f == name.as_str())
                .ok_or_else(|| WepxRunError::FormulaError(format!("unknown identifier {name:?}")))?;
            *pos += 1;
            expect(tokens, pos, Token::LParen)?;
            let arg = parse_expr(tokens, pos)?;
            expect(tokens, pos, Token::RParen)?;
            Ok(Expr::Call(func, Box::new(arg)))
        }
        Some(Token::LParen) => {
            *pos += 1;
            let inner = parse_expr(tokens, pos)?;
            expect(tokens, pos, Token::RParen)?;
            Ok(inner)
        }
        other => Err(WepxRunError::FormulaError(format!("unexpected token {other:?}"))),
    }
}

fn expect(tokens: &[Token], pos: &mut usize, want: Token) -> Result<()> {
    if tokens.get(*pos) == Some(&want) {
        *pos += 1;
        Ok(())
    } else {
        Err(WepxRunError::FormulaError(format!("expected {want:?}, found {:?}", tokens.get(*pos))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_to_celsius_matches_direct_arithmetic() {
        let formula = Formula::parse("x - 273.15").unwrap();
        let out = formula.apply(&[300.0, 273.15]);
        assert!((out[0] - 26.85).abs() < 1e-4);
        assert!((out[1] - 0.0).abs() < 1e-4);
    }

    #[test]
    fn nan_pixels_pass_through_untouched() {
        let formula = Formula::parse("x * 2").unwrap();
        let out = formula.apply(&[f32::NAN, 1.0]);
        assert!(out[0].is_nan());
        assert_eq!(out[1], 2.0);
    }

    #[test]
    fn supports_named_functions_and_precedence() {
        let formula = Formula::parse("sqrt(x * x + 1) - 1").unwrap();
        let out = formula.apply(&[0.0]);
        assert!((out[0] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_unknown_identifiers() {
        assert!(Formula::parse("y + 1").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(Formula::parse("x + 1 )").is_err());
    }
}
