//! Groups the lines of a block body into `;`-terminated statements and keeps
//! the comments that annotate each one.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DISCARDED_STATEMENT: Regex = Regex::new(r"^(reserved|oneof)\b").unwrap();
}

/// One logical declaration with the comments that belong to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement {
    /// Code up to and including the terminating `;`, lines joined by a space.
    pub text:     String,
    /// Comment-only lines seen before the statement's first code line.
    pub leading:  Vec<String>,
    /// Comments that share a line with the statement's code.
    pub trailing: Vec<String>,
}

/// Byte offset of the first `//` that is not inside a quoted string.
fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut escaping = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if escaping {
                    escaping = false;
                } else if b == b'\\' {
                    escaping = true;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'/' if bytes.get(i + 1) == Some(&b'/') => return Some(i),
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Byte offset of the first `;` that is not inside a quoted string.
fn terminator(statement: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaping = false;
    for (i, ch) in statement.char_indices() {
        match quote {
            Some(q) => {
                if escaping {
                    escaping = false;
                } else if ch == '\\' {
                    escaping = true;
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                ';' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// Splits a body (nested blocks already removed) into statements.
///
/// `reserved` and `oneof` statements are dropped together with any metadata
/// collected for them.
pub fn assemble_statements(body: &str) -> Vec<Statement> {
    let mut out = Vec::new();
    let mut statement = String::new();
    let mut leading: Vec<String> = Vec::new();
    let mut trailing: Vec<String> = Vec::new();

    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let (code, comment) = match comment_start(line) {
            Some(idx) => (line[..idx].trim(), Some(line[idx + 2..].trim())),
            None      => (line, None),
        };

        if code.is_empty() {
            if let Some(comment) = comment.filter(|c| !c.is_empty()) {
                if statement.is_empty() {
                    leading.push(comment.to_string());
                } else {
                    trailing.push(comment.to_string());
                }
            }
            continue;
        }

        if let Some(comment) = comment.filter(|c| !c.is_empty()) {
            trailing.push(comment.to_string());
        }

        if !statement.is_empty() {
            statement.push(' ');
        }
        statement.push_str(code);

        while let Some(idx) = terminator(&statement) {
            let text = statement[..=idx].trim().to_string();
            let rest = statement[idx + 1..].trim().to_string();

            if DISCARDED_STATEMENT.is_match(&text) {
                log::debug!("discarding statement {}", text);
                leading.clear();
                trailing.clear();
            } else {
                out.push(Statement {
                    text,
                    leading:  std::mem::take(&mut leading),
                    trailing: std::mem::take(&mut trailing),
                });
            }
            statement = rest;
        }
    }

    if !statement.is_empty() {
        log::debug!("unterminated statement {}", statement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_leading_and_trailing_comments() {
        let body = "
            // @label Name
            // @required
            string name = 1; // @list
            int32 age = 2;
        ";
        let statements = assemble_statements(body);
        assert_eq!(
            statements,
            vec![
                Statement {
                    text:     "string name = 1;".into(),
                    leading:  vec!["@label Name".into(), "@required".into()],
                    trailing: vec!["@list".into()],
                },
                Statement {
                    text:     "int32 age = 2;".into(),
                    leading:  vec![],
                    trailing: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_multi_line_statement() {
        let body = "
            string email = 3 [
              (ui_label) = \"Email\", // @unique
              (ui_required) = true
            ];
        ";
        let statements = assemble_statements(body);
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].text,
            "string email = 3 [ (ui_label) = \"Email\", (ui_required) = true ];"
        );
        assert_eq!(statements[0].trailing, vec!["@unique".to_string()]);
    }

    #[test]
    fn test_reserved_and_oneof_reset_metadata() {
        let body = "
            // @label Ignored
            reserved 2, 3;
            oneof choice ;
            string a = 1;
        ";
        let statements = assemble_statements(body);
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].text, "string a = 1;");
        assert!(statements[0].leading.is_empty());
    }

    #[test]
    fn test_comment_marker_inside_string_is_code() {
        let body = "string site = 1 [(ui_label) = \"http://x\"]; // @list\n";
        let statements = assemble_statements(body);
        assert_eq!(statements[0].text, "string site = 1 [(ui_label) = \"http://x\"];");
        assert_eq!(statements[0].trailing, vec!["@list".to_string()]);
    }

    #[test]
    fn test_several_statements_on_one_line() {
        let statements = assemble_statements("string a = 1; string b = 2; // @required\n");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].trailing, vec!["@required".to_string()]);
        assert_eq!(statements[1].text, "string b = 2;");
        assert!(statements[1].trailing.is_empty());
    }

    #[test]
    fn test_semicolon_inside_string_does_not_terminate() {
        let statements = assemble_statements("string a = 1 [(ui_label) = \"a;b\"];");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].text, "string a = 1 [(ui_label) = \"a;b\"];");
    }
}
