//! Splits IDL text into `message` / `enum` blocks.
//!
//! Block extraction counts braces literally. Comment and string awareness is
//! only needed later, when nested definitions are cut out of a block body.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BLOCK_COMMENT:  Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref MESSAGE_HEADER: Regex = Regex::new(r"\bmessage\s+([A-Za-z_]\w*)\s*\{").unwrap();
    static ref ENUM_HEADER:    Regex = Regex::new(r"\benum\s+([A-Za-z_]\w*)\s*\{").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Message,
    Enum,
}

impl BlockKind {
    fn header(&self) -> &'static Regex {
        match self {
            BlockKind::Message => &MESSAGE_HEADER,
            BlockKind::Enum    => &ENUM_HEADER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub name: &'a str,
    /// Text between the braces, nested blocks included.
    pub body: &'a str,
}

pub fn strip_block_comments(text: &str) -> String {
    BLOCK_COMMENT.replace_all(text, "").into_owned()
}

/// Returns every block of `kind` in source order. Nested blocks of the same
/// kind follow their parent. A header whose brace never closes is skipped.
pub fn extract_blocks(text: &str, kind: BlockKind) -> Vec<Block<'_>> {
    let header = kind.header();
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(caps) = header.captures_at(text, pos) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let open = whole.end() - 1;
        match find_matching_brace(text, open) {
            Some(close) => {
                blocks.push(Block {
                    name: name.as_str(),
                    body: &text[open + 1..close],
                });
                pos = open + 1;
            }
            None => {
                log::debug!("unterminated {:?} block {}", kind, name.as_str());
                pos = whole.end();
            }
        }
    }
    blocks
}

/// Byte offset of the `}` closing the `{` at `open`.
pub fn find_matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Cuts nested `{ ... }` regions out of a block body, leaving a `;` where each
/// one closed so its header reads as a statement of its own.
///
/// Braces inside quoted strings and `//` comments do not count.
pub fn remove_inner_blocks(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut depth = 0usize;
    let mut in_line_comment = false;
    let mut quote: Option<char> = None;
    let mut escaping = false;
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        let top = depth == 0;

        if in_line_comment {
            if top { out.push(ch); }
            if ch == '\n' { in_line_comment = false; }
            continue;
        }

        if let Some(q) = quote {
            if top { out.push(ch); }
            if escaping {
                escaping = false;
            } else if ch == '\\' {
                escaping = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                in_line_comment = true;
                if top { out.push_str("//"); }
            }
            '"' | '\'' => {
                quote = Some(ch);
                if top { out.push(ch); }
            }
            '{' => depth += 1,
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 { out.push(';'); }
                }
            }
            _ => {
                if top { out.push(ch); }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_top_level_and_nested_messages() {
        let text = "message A { string a = 1; message B { int32 b = 1; } } message C { }";
        let blocks = extract_blocks(text, BlockKind::Message);
        let names: Vec<_> = blocks.iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(blocks[1].body, " int32 b = 1; ");
    }

    #[test]
    fn test_unterminated_block_is_skipped() {
        let text = "message Ok { string a = 1; }\nmessage Broken { string b = 2;";
        let blocks = extract_blocks(text, BlockKind::Message);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "Ok");
    }

    #[test]
    fn test_enum_blocks_inside_messages_are_found() {
        let text = "message A { enum Kind { X = 0; } Kind k = 1; }";
        let blocks = extract_blocks(text, BlockKind::Enum);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "Kind");
        assert_eq!(blocks[0].body, " X = 0; ");
    }

    #[test]
    fn test_keyword_must_stand_alone() {
        let text = "submessage X { }";
        assert!(extract_blocks(text, BlockKind::Message).is_empty());
    }

    #[test]
    fn test_strip_block_comments() {
        let text = "a /* one\n two */ b /* three */";
        assert_eq!(strip_block_comments(text), "a  b ");
    }

    #[test]
    fn test_remove_inner_blocks_respects_strings_and_comments() {
        let body = "\n  string a = 1 [(ui_label) = \"{x\"]; // {\n  message Inner { string z = 1; }\n  int32 b = 2;\n";
        let out = remove_inner_blocks(body);
        assert_eq!(
            out,
            "\n  string a = 1 [(ui_label) = \"{x\"]; // {\n  message Inner ;\n  int32 b = 2;\n"
        );
    }

    #[test]
    fn test_remove_inner_blocks_ignores_stray_closing_brace() {
        assert_eq!(remove_inner_blocks("a } b"), "a  b");
    }
}
