//! PDF rendering for webdigest documents.
//!
//! Markdown is parsed into blocks, laid out onto fixed-size pages, then
//! drawn with `printpdf`. The built-in Helvetica/Courier family is used
//! unless a TrueType font is configured, in which case that font is
//! embedded and used for every text style.

mod blocks;
mod glyphs;
mod layout;

use std::fs::{self, File};
use std::path::Path;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use tracing::{debug, info, instrument};

use webdigest_shared::{PdfConfig, Result, WebdigestError};

use crate::layout::{FontKind, PageLayout};

const DOCUMENT_TITLE: &str = "webdigest";
const LAYER_NAME: &str = "content";

/// Turns Markdown-flavoured text into a document on disk.
pub trait DocumentRenderer {
    fn render(&self, markup: &str, output: &Path) -> Result<()>;
}

/// Renders Markdown into a paginated PDF.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    config: PdfConfig,
}

impl PdfRenderer {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }

    fn draw(&self, pages: &[PageLayout]) -> Result<Vec<u8>> {
        let width = Mm(self.config.page_width_mm);
        let height = Mm(self.config.page_height_mm);
        let (doc, first_page, first_layer) =
            PdfDocument::new(DOCUMENT_TITLE, width, height, LAYER_NAME);
        let fonts = FontSet::load(&doc, self.config.font_path.as_deref())?;

        for (i, page) in pages.iter().enumerate() {
            let (page_idx, layer_idx) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(width, height, LAYER_NAME)
            };
            let layer = doc.get_page(page_idx).get_layer(layer_idx);

            for line in page.lines.iter().filter(|l| !l.text.is_empty()) {
                layer.use_text(
                    line.text.as_str(),
                    line.size,
                    Mm(line.x_mm),
                    Mm(line.y_mm),
                    fonts.get(line.font),
                );
            }
        }

        doc.save_to_bytes()
            .map_err(|e| WebdigestError::Render(format!("failed to serialize PDF: {e}")))
    }
}

impl DocumentRenderer for PdfRenderer {
    #[instrument(skip(self, markup), fields(output = %output.display(), markup_len = markup.len()))]
    fn render(&self, markup: &str, output: &Path) -> Result<()> {
        let blocks = blocks::parse(markup);
        let pages = layout::layout(&blocks, &self.config, self.config.font_path.is_none());
        debug!(blocks = blocks.len(), pages = pages.len(), "layout complete");

        let bytes = self.draw(&pages)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| WebdigestError::io(parent, e))?;
        }
        fs::write(output, &bytes).map_err(|e| WebdigestError::io(output, e))?;

        info!(pages = pages.len(), bytes = bytes.len(), "PDF written");
        Ok(())
    }
}

struct FontSet {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    mono: IndirectFontRef,
}

impl FontSet {
    fn load(doc: &PdfDocumentReference, font_path: Option<&Path>) -> Result<Self> {
        let font_err = |e: printpdf::Error| WebdigestError::Render(format!("font error: {e}"));

        if let Some(path) = font_path {
            let file = File::open(path).map_err(|e| WebdigestError::io(path, e))?;
            let font = doc.add_external_font(file).map_err(font_err)?;
            return Ok(Self {
                regular: font.clone(),
                bold: font.clone(),
                italic: font.clone(),
                mono: font,
            });
        }

        Ok(Self {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(font_err)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(font_err)?,
            italic: doc
                .add_builtin_font(BuiltinFont::HelveticaOblique)
                .map_err(font_err)?,
            mono: doc.add_builtin_font(BuiltinFont::Courier).map_err(font_err)?,
        })
    }

    fn get(&self, kind: FontKind) -> &IndirectFontRef {
        match kind {
            FontKind::Regular => &self.regular,
            FontKind::Bold => &self.bold,
            FontKind::Italic => &self.italic,
            FontKind::Mono => &self.mono,
        }
    }
}
