use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FormError;
use crate::utils::{error, quote};

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(
        r#"(\d+(?:\.\d+)?\b|"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|\|\||&&|[=!<>]=|[<>!()]|\.|\b[A-Za-z_][A-Za-z0-9_]*\b|\s+)"#
    ).unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^\s+$").unwrap();
}

#[derive(Debug, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Splits a visibility expression into tokens. The final token is always the
/// empty end-of-input marker.
pub fn tokenize_expression(text: &str) -> Result<Vec<Token>, FormError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let part = mat.as_str();

        if mat.start() > last_end {
            let unexpected = &text[last_end..mat.start()];
            return Err(error(&format!("Syntax error: {}", quote(unexpected)), line, column));
        }

        if !WHITESPACE_RX.is_match(part) {
            tokens.push(Token {
                text: part.to_string(),
                line,
                column,
            });
        }

        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.chars().count() + 1;
            }
        } else {
            column += part.chars().count();
        }

        last_end = mat.end();
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(error(&format!("Syntax error: {}", quote(unexpected)), line, column));
    }

    tokens.push(Token {
        text: String::new(),
        line,
        column,
    });
    Ok(tokens)
}
