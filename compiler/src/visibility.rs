//! `visibleWhen` expressions: a small boolean language over the record being
//! edited, e.g. `values.kind == 'company' && !archived`.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::FormError;
use crate::tokenizer::{tokenize_expression, Token};
use crate::utils::{error, quote};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref SEGMENT:    Regex = Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]*|\d+)$").unwrap();
    static ref NUMBER:     Regex = Regex::new(r"^\d+(?:\.\d+)?$").unwrap();
    static ref STRING:     Regex = Regex::new(r#"^(?:"|')"#).unwrap();
    static ref OR:         Regex = Regex::new(r"^\|\|$").unwrap();
    static ref AND:        Regex = Regex::new(r"^&&$").unwrap();
    static ref NOT:        Regex = Regex::new(r"^!$").unwrap();
    static ref DOT:        Regex = Regex::new(r"^\.$").unwrap();
    static ref LEFT_PAREN: Regex = Regex::new(r"^\($").unwrap();
    static ref RIGHT_PAREN: Regex = Regex::new(r"^\)$").unwrap();
    static ref COMPARISON: Regex = Regex::new(r"^(?:==|!=|<=|>=|<|>)$").unwrap();
    static ref END_OF_INPUT: Regex = Regex::new(r"^$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            "<"  => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            ">"  => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            _    => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Path segments with any leading `values` already removed.
    Path(Vec<String>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
}

struct Parser<'t> {
    tokens: &'t [Token],
    index:  usize,
}

impl<'t> Parser<'t> {
    fn current(&self) -> &'t Token {
        // tokenize_expression always ends with the end-of-input token
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn eat(&mut self, test: &Regex) -> bool {
        if test.is_match(&self.current().text) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, test: &Regex, expected: &str) -> Result<(), FormError> {
        if self.eat(test) {
            Ok(())
        } else {
            Err(self.unexpected(Some(expected)))
        }
    }

    fn unexpected(&self, expected: Option<&str>) -> FormError {
        let token = self.current();
        let found = if token.text.is_empty() {
            "end of expression".to_string()
        } else {
            quote(&token.text)
        };
        let msg = match expected {
            Some(expected) => format!("Expected {} but found {}", expected, found),
            None           => format!("Unexpected token {}", found),
        };
        error(&msg, token.line, token.column)
    }

    fn or(&mut self) -> Result<Expr, FormError> {
        let mut left = self.and()?;
        while self.eat(&OR) {
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, FormError> {
        let mut left = self.unary()?;
        while self.eat(&AND) {
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, FormError> {
        if self.eat(&NOT) {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, FormError> {
        let left = self.primary()?;
        let token = self.current();
        if COMPARISON.is_match(&token.text) {
            let op = CompareOp::parse(&token.text).ok_or_else(|| self.unexpected(None))?;
            self.index += 1;
            let right = self.primary()?;
            return Ok(Expr::Compare(op, Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr, FormError> {
        let token = self.current();
        if self.eat(&LEFT_PAREN) {
            let inner = self.or()?;
            self.expect(&RIGHT_PAREN, "\")\"")?;
            return Ok(inner);
        }
        if self.eat(&NUMBER) {
            let number = token
                .text
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .ok_or_else(|| error(&format!("Invalid number {}", quote(&token.text)), token.line, token.column))?;
            return Ok(Expr::Literal(Value::Number(number)));
        }
        if self.eat(&STRING) {
            return Ok(Expr::Literal(Value::String(unescape(&token.text))));
        }
        if IDENTIFIER.is_match(&token.text) {
            return Ok(match token.text.as_str() {
                "true"  => { self.index += 1; Expr::Literal(Value::Bool(true)) }
                "false" => { self.index += 1; Expr::Literal(Value::Bool(false)) }
                "null"  => { self.index += 1; Expr::Literal(Value::Null) }
                _       => self.path()?,
            });
        }
        Err(self.unexpected(Some("a value")))
    }

    fn path(&mut self) -> Result<Expr, FormError> {
        let mut segments = vec![self.current().text.clone()];
        self.expect(&IDENTIFIER, "identifier")?;
        while self.eat(&DOT) {
            segments.push(self.current().text.clone());
            self.expect(&SEGMENT, "identifier or index")?;
        }
        if segments.len() > 1 && segments[0] == "values" {
            segments.remove(0);
        }
        Ok(Expr::Path(segments))
    }
}

/// Strips the surrounding quotes and resolves backslash escapes.
fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n')   => out.push('\n'),
            Some('t')   => out.push('\t'),
            Some(other) => out.push(other),
            None        => out.push('\\'),
        }
    }
    out
}

pub fn parse_expression(text: &str) -> Result<Expr, FormError> {
    let tokens = tokenize_expression(text)?;
    let mut parser = Parser { tokens: &tokens, index: 0 };
    let expr = parser.or()?;
    parser.expect(&END_OF_INPUT, "end of expression")?;
    Ok(expr)
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null      => false,
        Value::Bool(b)   => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(a)  => !a.is_empty(),
        Value::Object(_) => true,
    }
}

fn lookup(data: &Map<String, Value>, segments: &[String]) -> Value {
    let Some((first, rest)) = segments.split_first() else {
        return Value::Null;
    };
    let mut current = match data.get(first) {
        Some(value) => value,
        None        => return Value::Null,
    };
    for segment in rest {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(value) => value,
                None        => return Value::Null,
            },
            Value::Array(list) => match segment.parse::<usize>().ok().and_then(|i| list.get(i)) {
                Some(value) => value,
                None        => return Value::Null,
            },
            _ => return Value::Null,
        };
    }
    current.clone()
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    use std::cmp::Ordering;

    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::Ne => !values_equal(left, right),
        CompareOp::Lt => ordering == Some(Ordering::Less),
        CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    }
}

/// `1 == 1.0` holds; otherwise plain JSON equality.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

impl Expr {
    pub fn eval(&self, data: &Map<String, Value>) -> Value {
        match self {
            Expr::Literal(value)  => value.clone(),
            Expr::Path(segments)  => lookup(data, segments),
            Expr::Not(inner)      => Value::Bool(!is_truthy(&inner.eval(data))),
            Expr::And(a, b)       => Value::Bool(is_truthy(&a.eval(data)) && is_truthy(&b.eval(data))),
            Expr::Or(a, b)        => Value::Bool(is_truthy(&a.eval(data)) || is_truthy(&b.eval(data))),
            Expr::Compare(op, a, b) => Value::Bool(compare(*op, &a.eval(data), &b.eval(data))),
        }
    }
}

pub fn evaluate(expr: &str, data: &Map<String, Value>) -> Result<bool, FormError> {
    Ok(is_truthy(&parse_expression(expr)?.eval(data)))
}

/// A field with no rule, or an empty one, is always shown.
pub fn is_visible(visible_when: Option<&str>, data: &Map<String, Value>) -> Result<bool, FormError> {
    match visible_when.map(str::trim) {
        None | Some("") => Ok(true),
        Some(expr)      => evaluate(expr, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record() -> Map<String, Value> {
        json!({
            "kind": "company",
            "count": 3,
            "archived": false,
            "tags": [],
            "address": { "city": "Oslo", "zip": "" },
            "lines": [{ "sku": "A-1" }]
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_expression("a || b && !c").unwrap();
        let path = |name: &str| Box::new(Expr::Path(vec![name.to_string()]));
        assert_eq!(
            expr,
            Expr::Or(
                path("a"),
                Box::new(Expr::And(path("b"), Box::new(Expr::Not(path("c"))))),
            )
        );
    }

    #[test]
    fn test_values_prefix_is_optional() {
        assert_eq!(
            parse_expression("values.address.city").unwrap(),
            parse_expression("address.city").unwrap()
        );
        assert_eq!(parse_expression("values").unwrap(), Expr::Path(vec!["values".into()]));
    }

    #[test]
    fn test_evaluate() {
        let data = record();
        assert!(evaluate("kind == 'company'", &data).unwrap());
        assert!(evaluate("values.kind != \"person\"", &data).unwrap());
        assert!(evaluate("count >= 3 && count < 10", &data).unwrap());
        assert!(evaluate("count == 3.0", &data).unwrap());
        assert!(evaluate("!archived", &data).unwrap());
        assert!(evaluate("address.city == 'Oslo' && !address.zip", &data).unwrap());
        assert!(evaluate("lines.0.sku == 'A-1'", &data).unwrap());
        assert!(!evaluate("lines.4.sku", &data).unwrap());
        assert!(!evaluate("tags", &data).unwrap());
        assert!(!evaluate("missing.deeper", &data).unwrap());
        assert!(evaluate("missing == null", &data).unwrap());
        assert!(!evaluate("count == '3'", &data).unwrap());
        assert!(evaluate("(kind == 'x' || count > 2) && true", &data).unwrap());
    }

    #[test]
    fn test_parse_errors_carry_position() {
        match parse_expression("kind ==").unwrap_err() {
            FormError::ParseError { msg, line, column } => {
                assert_eq!(msg, "Expected a value but found end of expression");
                assert_eq!((line, column), (1, 8));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(matches!(
            parse_expression("(a && b").unwrap_err(),
            FormError::ParseError { .. }
        ));
        assert!(matches!(
            parse_expression("a b").unwrap_err(),
            FormError::ParseError { line: 1, column: 3, .. }
        ));
    }

    #[test]
    fn test_is_visible_defaults_to_shown() {
        let data = record();
        assert!(is_visible(None, &data).unwrap());
        assert!(is_visible(Some("  "), &data).unwrap());
        assert!(!is_visible(Some("archived"), &data).unwrap());
    }
}
