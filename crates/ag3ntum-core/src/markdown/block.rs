//! Block scanner
//!
//! A single forward pass over the lines of a document with an explicit
//! cursor, so fenced code and tables can consume several lines at once.
//! Rules are tried in a fixed order: fenced code, resource tags, tables,
//! headings, horizontal rules, blockquotes, list items, blank lines, and
//! finally plain paragraphs.

use super::inline::{parse_inline, Inline};
use super::resource::{match_resource_line, parse_attached_files, AttachedFileEntry, ResourceTag};
use once_cell::sync::Lazy;
use regex::Regex;

static TABLE_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|?\s*:?-{3,}:?\s*(\|\s*:?-{3,}:?\s*)+\|?$").expect("valid table separator regex")
});

static HORIZONTAL_RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-—─*_]{3,}$").expect("valid rule regex"));

static UNORDERED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)([-*+]) (.*)$").expect("valid list regex"));

static ORDERED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(\d+)\. (.*)$").expect("valid ordered list regex"));

const FENCE: &str = "```";

const HEADING_PREFIXES: [(&str, u8); 4] = [("#### ", 4), ("### ", 3), ("## ", 2), ("# ", 1)];

/// Marker of a list item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Bullet(char),
    Ordered(u32),
}

/// Block node, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        children: Vec<Inline>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Lists stay flat; `indent` is the count of leading whitespace and is
    /// only a rendering hint.
    ListItem {
        marker: ListMarker,
        indent: usize,
        children: Vec<Inline>,
    },
    Blockquote(Vec<Inline>),
    HorizontalRule,
    Paragraph(Vec<Inline>),
    Spacer,
    ResourceFile {
        path: String,
    },
    ResourceImage {
        path: String,
    },
    ResourceAttachedFiles {
        entries: Vec<AttachedFileEntry>,
    },
}

/// Scan a document into blocks
pub fn parse_blocks(document: &str) -> Vec<Block> {
    let lines: Vec<&str> = document
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix(FENCE) {
            let language = Some(rest.trim().to_string()).filter(|l| !l.is_empty());
            let mut code_lines = Vec::new();
            i += 1;
            // An unterminated fence closes at end of document
            while i < lines.len() && !lines[i].trim().starts_with(FENCE) {
                code_lines.push(lines[i]);
                i += 1;
            }
            i += 1;
            blocks.push(Block::CodeBlock {
                language,
                code: code_lines.join("\n"),
            });
            continue;
        }

        if let Some(tag) = match_resource_line(trimmed) {
            i += 1;
            match tag {
                ResourceTag::File(path) => blocks.push(Block::ResourceFile {
                    path: path.to_string(),
                }),
                ResourceTag::Image(path) => blocks.push(Block::ResourceImage {
                    path: path.to_string(),
                }),
                ResourceTag::AttachedFile(payload) => {
                    let mut entries = parse_attached_files(payload);
                    while i < lines.len() {
                        match match_resource_line(lines[i].trim()) {
                            Some(ResourceTag::AttachedFile(next)) => {
                                entries.extend(parse_attached_files(next));
                                i += 1;
                            }
                            _ => break,
                        }
                    }
                    blocks.push(Block::ResourceAttachedFiles { entries });
                }
            }
            continue;
        }

        if line.contains('|')
            && i + 1 < lines.len()
            && TABLE_SEPARATOR_RE.is_match(lines[i + 1].trim())
        {
            let header = split_cells(line);
            let mut rows = Vec::new();
            i += 2;
            while i < lines.len() && lines[i].contains('|') {
                rows.push(split_cells(lines[i]));
                i += 1;
            }
            blocks.push(Block::Table { header, rows });
            continue;
        }

        blocks.push(parse_single_line(line, trimmed));
        i += 1;
    }

    blocks
}

fn parse_single_line(line: &str, trimmed: &str) -> Block {
    for (prefix, level) in HEADING_PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Block::Heading {
                level,
                children: parse_inline(rest),
            };
        }
    }

    if HORIZONTAL_RULE_RE.is_match(trimmed) {
        return Block::HorizontalRule;
    }

    if let Some(rest) = line.strip_prefix("> ") {
        return Block::Blockquote(parse_inline(rest));
    }

    if let Some(caps) = UNORDERED_ITEM_RE.captures(line) {
        let marker = caps[2].chars().next().unwrap_or('-');
        return Block::ListItem {
            marker: ListMarker::Bullet(marker),
            indent: caps[1].chars().count(),
            children: parse_inline(&caps[3]),
        };
    }

    if let Some(caps) = ORDERED_ITEM_RE.captures(line) {
        if let Ok(number) = caps[2].parse() {
            return Block::ListItem {
                marker: ListMarker::Ordered(number),
                indent: caps[1].chars().count(),
                children: parse_inline(&caps[3]),
            };
        }
    }

    if trimmed.is_empty() {
        return Block::Spacer;
    }

    Block::Paragraph(parse_inline(line))
}

/// Split a table row on unescaped pipes; `\|` is a literal pipe
fn split_cells(line: &str) -> Vec<String> {
    let row = line.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = match row.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => row,
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = row.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Vec<Inline> {
        vec![Inline::text(s)]
    }

    #[test]
    fn test_heading_list_code_scenario() {
        let blocks = parse_blocks("# Hi\n\n- a\n- b\n\n```js\nx=1\n```");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    children: text("Hi")
                },
                Block::Spacer,
                Block::ListItem {
                    marker: ListMarker::Bullet('-'),
                    indent: 0,
                    children: text("a")
                },
                Block::ListItem {
                    marker: ListMarker::Bullet('-'),
                    indent: 0,
                    children: text("b")
                },
                Block::Spacer,
                Block::CodeBlock {
                    language: Some("js".into()),
                    code: "x=1".into()
                },
            ]
        );
    }

    #[test]
    fn test_heading_levels_longest_prefix_first() {
        let levels: Vec<u8> = parse_blocks("# a\n## b\n### c\n#### d\n##### e")
            .into_iter()
            .filter_map(|b| match b {
                Block::Heading { level, .. } => Some(level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_code_block_preserves_whitespace_and_auto_closes() {
        let blocks = parse_blocks("```\n  indented\n\n\ttab\n# not a heading");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: None,
                code: "  indented\n\n\ttab\n# not a heading".into()
            }]
        );
    }

    #[test]
    fn test_table_scenario() {
        let blocks = parse_blocks("| A | B |\n|---|---|\n| 1 | 2 |");
        assert_eq!(
            blocks,
            vec![Block::Table {
                header: vec!["A".into(), "B".into()],
                rows: vec![vec!["1".into(), "2".into()]],
            }]
        );
    }

    #[test]
    fn test_table_ends_at_line_without_pipe_and_keeps_escapes() {
        let blocks = parse_blocks("a | b\n:---|---:\nx \\| y | z\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::Table {
                    header: vec!["a".into(), "b".into()],
                    rows: vec![vec!["x | y".into(), "z".into()]],
                },
                Block::Paragraph(text("after")),
            ]
        );
    }

    #[test]
    fn test_pipe_without_separator_is_paragraph() {
        assert_eq!(
            parse_blocks("a | b\nc | d"),
            vec![Block::Paragraph(text("a | b")), Block::Paragraph(text("c | d"))]
        );
    }

    #[test]
    fn test_rules_quotes_and_ordered_items() {
        let blocks = parse_blocks("---\n***\n> quoted\n  3. third\n    * deep");
        assert_eq!(
            blocks,
            vec![
                Block::HorizontalRule,
                Block::HorizontalRule,
                Block::Blockquote(text("quoted")),
                Block::ListItem {
                    marker: ListMarker::Ordered(3),
                    indent: 2,
                    children: text("third")
                },
                Block::ListItem {
                    marker: ListMarker::Bullet('*'),
                    indent: 4,
                    children: text("deep")
                },
            ]
        );
    }

    #[test]
    fn test_single_file_tag_is_resource_not_paragraph() {
        assert_eq!(
            parse_blocks("<ag3ntum-file>notes.txt</ag3ntum-file>"),
            vec![Block::ResourceFile {
                path: "notes.txt".into()
            }]
        );
    }

    #[test]
    fn test_resource_tag_inside_code_block_is_literal() {
        let blocks = parse_blocks("```\n<ag3ntum-file>a.txt</ag3ntum-file>\n```");
        assert!(matches!(blocks[0], Block::CodeBlock { .. }));
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_consecutive_attachments_group_into_one_node() {
        let doc = concat!(
            "Uploaded:\n",
            "<ag3ntum-attached-file>[{\"name\":\"a.txt\"},{\"name\":\"b.txt\"}]</ag3ntum-attached-file>\n",
            "  <ag3ntum-attached-file>c.png|3 KB</ag3ntum-attached-file>\n",
            "<ag3ntum-attached-file>d.md</ag3ntum-attached-file>\n",
            "<ag3ntum-image>c.png</ag3ntum-image>\n",
            "<ag3ntum-attached-file>e.md</ag3ntum-attached-file>",
        );
        let blocks = parse_blocks(doc);

        assert_eq!(blocks.len(), 4);
        match &blocks[1] {
            Block::ResourceAttachedFiles { entries } => {
                let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
                assert_eq!(names, vec!["a.txt", "b.txt", "c.png", "d.md"]);
            }
            other => panic!("expected attachments, got {:?}", other),
        }
        assert_eq!(
            blocks[2],
            Block::ResourceImage {
                path: "c.png".into()
            }
        );
        assert!(matches!(&blocks[3], Block::ResourceAttachedFiles { entries } if entries.len() == 1));
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let blocks = parse_blocks("one\r\n   \r\ntwo");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(text("one")),
                Block::Spacer,
                Block::Paragraph(text("two")),
            ]
        );
    }
}
