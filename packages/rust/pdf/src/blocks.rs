//! Markdown → flat list of printable blocks.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Quote(String),
    ListItem {
        depth: usize,
        marker: Option<String>,
        text: String,
    },
    Code(Vec<String>),
    Rule,
}

#[derive(Default)]
struct Collector {
    blocks: Vec<Block>,
    text: String,
    heading: Option<u8>,
    quote_depth: usize,
    /// One entry per open list: `Some(next number)` for ordered lists.
    lists: Vec<Option<u64>>,
    pending_marker: Option<String>,
    code: Option<String>,
}

impl Collector {
    fn flush(&mut self) {
        let text = std::mem::take(&mut self.text).trim().to_string();

        if let Some(level) = self.heading {
            if !text.is_empty() {
                self.blocks.push(Block::Heading { level, text });
            }
            return;
        }

        if !self.lists.is_empty() {
            let marker = self.pending_marker.take();
            if !text.is_empty() || marker.is_some() {
                self.blocks.push(Block::ListItem {
                    depth: self.lists.len(),
                    marker,
                    text,
                });
            }
            return;
        }

        if text.is_empty() {
            return;
        }
        if self.quote_depth > 0 {
            self.blocks.push(Block::Quote(text));
        } else {
            self.blocks.push(Block::Paragraph(text));
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading(level, _, _) => {
                self.flush();
                self.heading = Some(heading_level(level));
            }
            Tag::Paragraph => {
                // Tight list items carry no paragraph; loose ones do.
                if self.lists.is_empty() {
                    self.flush();
                }
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}.");
                        *n += 1;
                        marker
                    }
                    _ => "-".to_string(),
                };
                self.pending_marker = Some(marker);
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code = Some(String::new());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading(..) => {
                self.flush();
                self.heading = None;
            }
            Tag::Paragraph | Tag::Item => self.flush(),
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            Tag::List(_) => {
                self.flush();
                self.lists.pop();
            }
            Tag::CodeBlock(_) => {
                if let Some(code) = self.code.take() {
                    let lines = code
                        .trim_end_matches('\n')
                        .lines()
                        .map(str::to_string)
                        .collect();
                    self.blocks.push(Block::Code(lines));
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        match self.code.as_mut() {
            Some(code) => code.push_str(text),
            None => self.text.push_str(text),
        }
    }
}

/// Parse Markdown into the blocks the layout engine understands.
///
/// Inline emphasis and links collapse to their text. Raw HTML is kept as
/// literal text.
pub(crate) fn parse(markup: &str) -> Vec<Block> {
    let mut collector = Collector::default();

    for event in Parser::new(markup) {
        match event {
            Event::Start(tag) => collector.start(tag),
            Event::End(tag) => collector.end(tag),
            Event::Text(text) | Event::Code(text) | Event::Html(text) => {
                collector.push_text(&text)
            }
            Event::SoftBreak => collector.push_text(" "),
            Event::HardBreak => collector.push_text("\n"),
            Event::Rule => {
                collector.flush();
                collector.blocks.push(Block::Rule);
            }
            _ => {}
        }
    }
    collector.flush();
    collector.blocks
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_paragraphs() {
        let blocks = parse("## https://example.com/\n\nFirst *para*\ncontinues.\n\nSecond.");
        assert_eq!(
            blocks,
            [
                Block::Heading {
                    level: 2,
                    text: "https://example.com/".into()
                },
                Block::Paragraph("First para continues.".into()),
                Block::Paragraph("Second.".into()),
            ]
        );
    }

    #[test]
    fn ordered_and_nested_lists() {
        let blocks = parse("1. one\n2. two\n   - inner\n");
        assert_eq!(
            blocks,
            [
                Block::ListItem {
                    depth: 1,
                    marker: Some("1.".into()),
                    text: "one".into()
                },
                Block::ListItem {
                    depth: 1,
                    marker: Some("2.".into()),
                    text: "two".into()
                },
                Block::ListItem {
                    depth: 2,
                    marker: Some("-".into()),
                    text: "inner".into()
                },
            ]
        );
    }

    #[test]
    fn code_block_keeps_lines_verbatim() {
        let blocks = parse("```rust\nfn main() {\n    run();\n}\n```\n");
        assert_eq!(
            blocks,
            [Block::Code(vec![
                "fn main() {".into(),
                "    run();".into(),
                "}".into()
            ])]
        );
    }

    #[test]
    fn quotes_and_rules() {
        let blocks = parse("> quoted text\n\n---\n\nafter");
        assert_eq!(
            blocks,
            [
                Block::Quote("quoted text".into()),
                Block::Rule,
                Block::Paragraph("after".into()),
            ]
        );
    }

    #[test]
    fn empty_markup_has_no_blocks() {
        assert!(parse("").is_empty());
        assert!(parse("   \n\n").is_empty());
    }
}
