//! Markdown-subset rendering for chat messages
//!
//! Tutor replies use a small slice of markdown: headings, bold, italic,
//! inline code, bullet items, dividers and line breaks. Text is turned into a
//! node tree whose leaves hold raw text, never markup, so webhook output
//! cannot inject HTML into the client.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Inline spans, leftmost match first; code is tried before emphasis
static INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`\n]+)`|\*\*(.+?)\*\*|\*(.+?)\*").expect("inline pattern is valid")
});

/// Block-level node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, children: Vec<Inline> },
    ListItem { children: Vec<Inline> },
    Divider,
    Line { children: Vec<Inline> },
    LineBreak,
}

/// Inline node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Strong { children: Vec<Inline> },
    Emphasis { children: Vec<Inline> },
    Code { text: String },
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text { text: s.into() }
    }
}

/// Render message text into blocks
pub fn render(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut lines = text.split('\n').peekable();

    while let Some(line) = lines.next() {
        let block = render_line(line);
        let is_list_item = matches!(block, Some(Block::ListItem { .. }));
        if let Some(block) = block {
            blocks.push(block);
        }
        // List items swallow their trailing break
        if lines.peek().is_some() && !is_list_item {
            blocks.push(Block::LineBreak);
        }
    }

    blocks
}

fn render_line(line: &str) -> Option<Block> {
    if line == "---" {
        return Some(Block::Divider);
    }

    for (prefix, level) in [("### ", 3), ("## ", 2), ("# ", 1)] {
        if let Some(rest) = line.strip_prefix(prefix).filter(|r| !r.is_empty()) {
            return Some(Block::Heading {
                level,
                children: render_inline(rest),
            });
        }
    }

    if let Some(rest) = line
        .strip_prefix("* ")
        .or_else(|| line.strip_prefix("- "))
        .filter(|r| !r.is_empty())
    {
        return Some(Block::ListItem {
            children: render_inline(rest),
        });
    }

    if line.is_empty() {
        None
    } else {
        Some(Block::Line {
            children: render_inline(line),
        })
    }
}

/// Split a run of text into inline nodes
pub fn render_inline(text: &str) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut last = 0;

    for caps in INLINE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(before) = text.get(last..whole.start()).filter(|s| !s.is_empty()) {
            nodes.push(Inline::text(before));
        }

        if let Some(code) = caps.get(1) {
            nodes.push(Inline::Code {
                text: code.as_str().to_string(),
            });
        } else if let Some(strong) = caps.get(2) {
            nodes.push(Inline::Strong {
                children: render_inline(strong.as_str()),
            });
        } else if let Some(em) = caps.get(3) {
            nodes.push(Inline::Emphasis {
                children: render_inline(em.as_str()),
            });
        }

        last = whole.end();
    }

    if let Some(rest) = text.get(last..).filter(|s| !s.is_empty()) {
        nodes.push(Inline::text(rest));
    }

    nodes
}
