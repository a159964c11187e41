//! Converts a subset of HTML into editable word-processing documents (.docx).
//!
//! ```no_run
//! let doc = htmldocx::convert("<p style=\"text-align:center\"><b>Hi</b> there</p>");
//! doc.save("hello.docx")?;
//! # Ok::<(), htmldocx::Error>(())
//! ```

pub mod dispatch;
pub mod docx;
mod error;
pub mod events;
pub mod image;
pub mod normalize;
pub mod sink;
pub mod style;
pub mod table;

pub use dispatch::{Dispatcher, State};
pub use docx::{Cell, Document, Paragraph, Run, Table};
pub use error::{Error, Result};

use crate::events::Event;
use crate::image::{ImageResolver, DEFAULT_WIDTH_PX};
use crate::sink::Sink;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Options {
    /// Fetch `http(s)` image references; when off they become placeholders.
    pub fetch_remote_images: bool,
    /// Directory relative image paths are resolved against.
    pub image_root: Option<PathBuf>,
    pub default_image_width_px: f64,
    /// Run the markup through the html5ever tree builder before converting.
    pub repair: bool,
    /// Deepest table-in-table nesting that is still converted.
    pub max_table_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            fetch_remote_images: true,
            image_root: None,
            default_image_width_px: DEFAULT_WIDTH_PX,
            repair: false,
            max_table_depth: 16,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: Options,
    images: ImageResolver,
}

impl Converter {
    pub fn new(options: Options) -> Self {
        let images = ImageResolver {
            fetch_remote: options.fetch_remote_images,
            root: options.image_root.clone(),
            default_width_px: options.default_image_width_px,
        };
        Converter { options, images }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    fn prepare(&self, html: &str) -> Vec<Event> {
        let html = if self.options.repair {
            normalize::repair_markup(html)
        } else {
            html.to_string()
        };
        events::tokenize(&normalize::collapse_whitespace(&html))
    }

    fn run<S: Sink + ?Sized>(&self, html: &str, sink: &mut S) {
        let events = self.prepare(html);
        Dispatcher::new(sink, &self.images, self.options.max_table_depth).run(&events);
    }

    /// Converts `html` into a new document.
    pub fn convert(&self, html: &str) -> Document {
        let mut doc = Document::new();
        self.run(html, &mut doc);
        doc
    }

    /// Like [`Converter::convert`], for raw bytes that must be UTF-8.
    pub fn convert_bytes(&self, html: &[u8]) -> Result<Document> {
        let html = std::str::from_utf8(html)?;
        Ok(self.convert(html))
    }

    /// Appends the converted content after whatever `doc` already holds.
    pub fn add_html_to_document(&self, html: &str, doc: &mut Document) {
        self.run(html, doc);
    }

    /// Converts into a table cell. A cell's initial blank paragraph is replaced, and the
    /// cell always ends up with at least one paragraph.
    pub fn add_html_to_cell(&self, html: &str, cell: &mut Cell) {
        self.run(html, cell);
    }

    pub fn add_html_to_table_cell(
        &self,
        html: &str,
        table: &mut Table,
        row: usize,
        col: usize,
    ) -> Result<()> {
        let (rows, cols) = (table.row_count(), table.col_count());
        let cell = table.cell_mut(row, col).ok_or_else(|| {
            Error::InvalidTarget(format!("cell ({row}, {col}) outside a {rows}x{cols} table"))
        })?;
        self.add_html_to_cell(html, cell);
        Ok(())
    }

    /// Converts the file at `input` and saves the package to `output`, defaulting to the
    /// input path with a `.docx` extension. Relative images resolve against the input's
    /// directory unless an image root is configured.
    pub fn convert_file(&self, input: &Path, output: Option<&Path>) -> Result<PathBuf> {
        let bytes = std::fs::read(input).map_err(|e| Error::io(input, e))?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension("docx"));

        let doc = if self.images.root.is_none() {
            let mut scoped = self.clone();
            scoped.images.root = input.parent().map(Path::to_path_buf);
            scoped.convert_bytes(&bytes)?
        } else {
            self.convert_bytes(&bytes)?
        };
        doc.save(&output)?;
        log::debug!(
            "{} -> {} ({} blocks)",
            input.display(),
            output.display(),
            doc.body.blocks.len()
        );
        Ok(output)
    }
}

/// Converts `html` with default options.
pub fn convert(html: &str) -> Document {
    Converter::default().convert(html)
}
