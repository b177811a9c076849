//! Block layout: word wrapping and pagination.
//!
//! Widths are estimated from an average glyph advance per font family, so
//! wrapping is approximate for proportional fonts. Coordinates are in
//! millimetres from the bottom-left corner, matching PDF user space.

use webdigest_shared::PdfConfig;

use crate::blocks::Block;
use crate::glyphs;

const PT_TO_MM: f32 = 0.352_778;
const LINE_SPACING: f32 = 1.35;
const LIST_INDENT_MM: f32 = 6.0;
const QUOTE_INDENT_MM: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FontKind {
    Regular,
    Bold,
    Italic,
    Mono,
}

impl FontKind {
    /// Average glyph advance as a fraction of the font size.
    fn advance(self) -> f32 {
        match self {
            Self::Regular | Self::Italic => 0.50,
            Self::Bold => 0.55,
            Self::Mono => 0.60,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlacedLine {
    pub text: String,
    pub font: FontKind,
    pub size: f32,
    pub x_mm: f32,
    pub y_mm: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PageLayout {
    pub lines: Vec<PlacedLine>,
}

/// Lay out `blocks` onto pages. Always yields at least one page.
pub(crate) fn layout(
    blocks: &[Block],
    config: &PdfConfig,
    win_ansi_only: bool,
) -> Vec<PageLayout> {
    let mut cursor = Cursor::new(config, win_ansi_only);
    let body = config.font_size;

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = body * heading_scale(*level);
                cursor.gap(size * PT_TO_MM * 0.8);
                cursor.wrapped(text, FontKind::Bold, size, 0.0, 0.0);
                cursor.gap(size * PT_TO_MM * 0.3);
            }
            Block::Paragraph(text) => {
                for segment in text.split('\n') {
                    cursor.wrapped(segment, FontKind::Regular, body, 0.0, 0.0);
                }
                cursor.gap(body * PT_TO_MM * 0.6);
            }
            Block::Quote(text) => {
                for segment in text.split('\n') {
                    cursor.wrapped(segment, FontKind::Italic, body, QUOTE_INDENT_MM, 0.0);
                }
                cursor.gap(body * PT_TO_MM * 0.6);
            }
            Block::ListItem {
                depth,
                marker,
                text,
            } => {
                let indent = LIST_INDENT_MM * *depth as f32;
                let line = match marker {
                    Some(marker) => format!("{marker} {text}"),
                    None => text.clone(),
                };
                let hang = if marker.is_some() { LIST_INDENT_MM * 0.7 } else { 0.0 };
                cursor.wrapped(&line, FontKind::Regular, body, indent, hang);
                cursor.gap(body * PT_TO_MM * 0.2);
            }
            Block::Code(lines) => {
                let size = body * 0.9;
                for line in lines {
                    cursor.preformatted(line, size, LIST_INDENT_MM * 0.5);
                }
                cursor.gap(body * PT_TO_MM * 0.6);
            }
            Block::Rule => {
                let columns = cursor.columns(FontKind::Regular, body, 0.0);
                cursor.place("-".repeat(columns), FontKind::Regular, body, 0.0);
                cursor.gap(body * PT_TO_MM * 0.6);
            }
        }
    }

    cursor.finish()
}

fn heading_scale(level: u8) -> f32 {
    match level {
        1 => 1.8,
        2 => 1.5,
        3 => 1.25,
        _ => 1.1,
    }
}

struct Cursor<'a> {
    config: &'a PdfConfig,
    win_ansi_only: bool,
    pages: Vec<PageLayout>,
    y_mm: f32,
    at_top: bool,
}

impl<'a> Cursor<'a> {
    fn new(config: &'a PdfConfig, win_ansi_only: bool) -> Self {
        Self {
            config,
            win_ansi_only,
            pages: vec![PageLayout::default()],
            y_mm: config.page_height_mm - config.margin_mm,
            at_top: true,
        }
    }

    fn columns(&self, font: FontKind, size: f32, indent_mm: f32) -> usize {
        let usable = self.config.page_width_mm - 2.0 * self.config.margin_mm - indent_mm;
        let glyph = size * PT_TO_MM * font.advance();
        if glyph <= 0.0 || usable <= glyph {
            return 1;
        }
        (usable / glyph).floor() as usize
    }

    fn gap(&mut self, mm: f32) {
        if !self.at_top {
            self.y_mm -= mm;
        }
    }

    /// Word-wrap `text`; continuation lines are indented by a further `hang_mm`.
    fn wrapped(&mut self, text: &str, font: FontKind, size: f32, indent_mm: f32, hang_mm: f32) {
        let text = self.coverage(text);
        let first = self.columns(font, size, indent_mm);
        let rest = self.columns(font, size, indent_mm + hang_mm);

        for (i, line) in wrap_words(&text, first, rest).into_iter().enumerate() {
            let indent = if i == 0 { indent_mm } else { indent_mm + hang_mm };
            self.place(line, font, size, indent);
        }
    }

    /// Hard-wrap `line` at the column limit, keeping its whitespace.
    fn preformatted(&mut self, line: &str, size: f32, indent_mm: f32) {
        let line = self.coverage(line);
        let columns = self.columns(FontKind::Mono, size, indent_mm);
        let chars: Vec<char> = line.chars().collect();

        if chars.is_empty() {
            self.place(String::new(), FontKind::Mono, size, indent_mm);
            return;
        }
        for chunk in chars.chunks(columns) {
            self.place(chunk.iter().collect(), FontKind::Mono, size, indent_mm);
        }
    }

    fn coverage(&self, text: &str) -> String {
        if self.win_ansi_only {
            glyphs::to_win_ansi(text).into_owned()
        } else {
            text.to_string()
        }
    }

    fn place(&mut self, text: String, font: FontKind, size: f32, indent_mm: f32) {
        let line_height = size * PT_TO_MM * LINE_SPACING;
        if !self.at_top && self.y_mm - line_height < self.config.margin_mm {
            self.pages.push(PageLayout::default());
            self.y_mm = self.config.page_height_mm - self.config.margin_mm;
        }

        self.y_mm -= line_height;
        self.at_top = false;

        if let Some(page) = self.pages.last_mut() {
            page.lines.push(PlacedLine {
                text,
                font,
                size,
                x_mm: self.config.margin_mm + indent_mm,
                y_mm: self.y_mm,
            });
        }
    }

    fn finish(self) -> Vec<PageLayout> {
        self.pages
    }
}

/// Greedy word wrap. The first line holds up to `first` characters, the
/// rest up to `rest`. Words longer than a line are split across lines.
pub(crate) fn wrap_words(text: &str, first: usize, rest: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let limit = |lines: &Vec<String>| if lines.is_empty() { first.max(1) } else { rest.max(1) };

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        while current_len == 0 && chars.len() > limit(&lines) {
            let tail = chars.split_off(limit(&lines));
            lines.push(chars.into_iter().collect());
            chars = tail;
        }
        if chars.is_empty() {
            continue;
        }

        if current_len > 0 && current_len + 1 + chars.len() > limit(&lines) {
            lines.push(std::mem::take(&mut current));
            current_len = 0;

            while chars.len() > limit(&lines) {
                let tail = chars.split_off(limit(&lines));
                lines.push(chars.into_iter().collect());
                chars = tail;
            }
        }

        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += chars.len();
        current.extend(chars);
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::parse;

    fn a4() -> PdfConfig {
        PdfConfig::default()
    }

    fn all_lines(pages: &[PageLayout]) -> Vec<&PlacedLine> {
        pages.iter().flat_map(|p| p.lines.iter()).collect()
    }

    #[test]
    fn wrap_respects_width_and_keeps_words() {
        let text = "the quick brown fox jumps over the lazy dog again and again";
        let lines = wrap_words(text, 12, 12);
        assert!(lines.iter().all(|l| l.chars().count() <= 12), "{lines:?}");
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_hard_splits_long_words() {
        let lines = wrap_words("ab https://example.com/very/long/path cd", 10, 10);
        assert_eq!(
            lines,
            ["ab", "https://ex", "ample.com/", "very/long/", "path cd"]
        );
    }

    #[test]
    fn wrap_uses_narrower_continuation_width() {
        let lines = wrap_words("aaa bbb ccc ddd", 7, 3);
        assert_eq!(lines, ["aaa bbb", "ccc", "ddd"]);
    }

    #[test]
    fn empty_input_yields_one_blank_page() {
        let pages = layout(&parse(""), &a4(), true);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].lines.is_empty());
    }

    #[test]
    fn headings_are_bold_and_larger_than_body() {
        let pages = layout(&parse("## https://example.com/\n\nbody text"), &a4(), true);
        let lines = all_lines(&pages);
        assert_eq!(lines[0].font, FontKind::Bold);
        assert_eq!(lines[0].text, "https://example.com/");
        assert!(lines[0].size > lines[1].size);
        assert_eq!(lines[1].font, FontKind::Regular);
        assert!(lines[0].y_mm > lines[1].y_mm);
    }

    #[test]
    fn long_content_paginates_within_margins() {
        let config = a4();
        let markup = (0..300)
            .map(|i| format!("Paragraph number {i} with a little text."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let pages = layout(&parse(&markup), &config, true);

        assert!(pages.len() > 1);
        for line in all_lines(&pages) {
            assert!(line.y_mm >= config.margin_mm - 0.01, "below margin: {line:?}");
            assert!(line.y_mm <= config.page_height_mm - config.margin_mm);
        }
        assert_eq!(all_lines(&pages).len(), 300);
        assert!(pages.iter().all(|p| !p.lines.is_empty()));
    }

    #[test]
    fn lines_descend_within_a_page() {
        let pages = layout(&parse("one\n\ntwo\n\nthree"), &a4(), true);
        let ys: Vec<f32> = pages[0].lines.iter().map(|l| l.y_mm).collect();
        assert!(ys.windows(2).all(|w| w[0] > w[1]), "{ys:?}");
    }

    #[test]
    fn code_lines_use_mono_and_keep_indentation() {
        let pages = layout(&parse("```\nif x {\n    y();\n}\n```"), &a4(), true);
        let lines = all_lines(&pages);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.font == FontKind::Mono));
        assert_eq!(lines[1].text, "    y();");
    }

    #[test]
    fn list_items_are_indented_with_markers() {
        let pages = layout(&parse("- alpha\n- beta"), &a4(), true);
        let lines = all_lines(&pages);
        assert_eq!(lines[0].text, "- alpha");
        assert!(lines[0].x_mm > a4().margin_mm);
    }

    #[test]
    fn builtin_fonts_get_win_ansi_text() {
        let markup = "caf\u{E9} \u{2014} \u{2192} \u{6F22}";
        let covered = layout(&parse(markup), &a4(), true);
        assert_eq!(all_lines(&covered)[0].text, "caf\u{E9} \u{2014} -> ?");

        let embedded = layout(&parse(markup), &a4(), false);
        assert_eq!(all_lines(&embedded)[0].text, markup);
    }
}
