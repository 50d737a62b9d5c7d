//! Inline scanner
//!
//! One left-to-right regex scan per line. At each position the alternatives
//! are tried in priority order image > bold > italic > inline code > link;
//! everything between matches is literal text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static INLINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"!\[(?P<alt>[^\]]*)\]\((?P<src>[^)\s]+)\)",
        r"|\*\*(?P<bold>.+?)\*\*",
        r"|\*(?P<italic>[^*]+?)\*",
        r"|`(?P<code>[^`]+)`",
        r"|\[(?P<text>[^\]]+)\]\((?P<href>[^)\s]+)\)",
    ))
    .expect("valid inline regex")
});

/// Inline node of a rendered line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(String),
    Code(String),
    Link { text: String, url: String },
    Image { alt: String, url: String },
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    /// Text content with all markup removed
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text(s) | Inline::Italic(s) | Inline::Code(s) => s.clone(),
            Inline::Bold(children) => plain_text(children),
            Inline::Link { text, .. } => text.clone(),
            Inline::Image { alt, .. } => alt.clone(),
        }
    }
}

pub fn plain_text(nodes: &[Inline]) -> String {
    nodes.iter().map(Inline::plain_text).collect()
}

/// Scan one line into inline nodes
pub fn parse_inline(line: &str) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut last = 0;

    for caps in INLINE_RE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            nodes.push(Inline::text(&line[last..whole.start()]));
        }
        nodes.push(node_from_captures(&caps));
        last = whole.end();
    }

    if last < line.len() {
        nodes.push(Inline::text(&line[last..]));
    }
    nodes
}

fn node_from_captures(caps: &Captures<'_>) -> Inline {
    let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

    if let Some(url) = group("src") {
        Inline::Image {
            alt: group("alt").unwrap_or_default(),
            url,
        }
    } else if let Some(bold) = caps.name("bold") {
        Inline::Bold(parse_inline(bold.as_str()))
    } else if let Some(italic) = group("italic") {
        Inline::Italic(italic)
    } else if let Some(code) = group("code") {
        Inline::Code(code)
    } else if let (Some(text), Some(url)) = (group("text"), group("href")) {
        Inline::Link { text, url }
    } else {
        Inline::text(caps.get(0).map(|m| m.as_str()).unwrap_or_default())
    }
}
