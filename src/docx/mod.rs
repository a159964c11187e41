//! In-memory word-processing document: paragraphs, runs, tables and pictures.

mod package;

use crate::error::{Error, Result};
use std::path::Path;

pub use package::EMU_PER_INCH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStyle {
    pub kind: ListKind,
    /// Zero-based nesting level.
    pub level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub highlight: bool,
    pub color: Option<Rgb>,
    pub size_half_points: Option<u32>,
}

impl RunFormat {
    pub fn is_plain(&self) -> bool {
        *self == RunFormat::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    /// Extent in EMU.
    pub width: u64,
    pub height: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(String),
    Picture(Picture),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub content: RunContent,
    pub format: RunFormat,
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Run {
            content: RunContent::Text(text.into()),
            format: RunFormat::default(),
        }
    }

    pub fn picture(picture: Picture) -> Self {
        Run {
            content: RunContent::Picture(picture),
            format: RunFormat::default(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            RunContent::Text(t) => Some(t),
            RunContent::Picture(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub list: Option<ListStyle>,
    pub alignment: Alignment,
    /// Left indent in inches.
    pub left_indent: Option<f64>,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn with_text(text: impl Into<String>) -> Self {
        Paragraph {
            runs: vec![Run::text(text)],
            ..Default::default()
        }
    }

    /// Concatenated text of all text runs.
    pub fn text(&self) -> String {
        self.runs.iter().filter_map(Run::as_text).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.runs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Ordered block container shared by the document body and table cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub blocks: Vec<Block>,
}

impl Body {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) -> usize {
        self.blocks.push(Block::Paragraph(paragraph));
        self.blocks.len() - 1
    }

    pub fn push_table(&mut self, table: Table) -> usize {
        self.blocks.push(Block::Table(table));
        self.blocks.len() - 1
    }

    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        match self.blocks.get_mut(index) {
            Some(Block::Paragraph(p)) => Some(p),
            _ => None,
        }
    }

    pub fn table_mut(&mut self, index: usize) -> Option<&mut Table> {
        match self.blocks.get_mut(index) {
            Some(Block::Table(t)) => Some(t),
            _ => None,
        }
    }

    /// Index of the trailing paragraph, appending a blank one when the body is empty or
    /// ends with a table.
    pub fn last_paragraph_index(&mut self) -> usize {
        match self.blocks.last() {
            Some(Block::Paragraph(_)) => self.blocks.len() - 1,
            _ => self.push_paragraph(Paragraph::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub body: Body,
}

impl Default for Cell {
    /// A new cell holds one blank paragraph, as word processors create them.
    fn default() -> Self {
        let mut body = Body::default();
        body.push_paragraph(Paragraph::default());
        Cell { body }
    }
}

impl Cell {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.paragraphs()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.tables()
    }

    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub cols: usize,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(rows: usize, cols: usize) -> Self {
        Table {
            cols,
            rows: (0..rows).map(|_| vec![Cell::default(); cols]).collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row).and_then(|r| r.get_mut(col))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub body: Body,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.paragraphs()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.tables()
    }

    pub fn add_paragraph(&mut self, text: &str) -> &mut Paragraph {
        let index = self.body.push_paragraph(Paragraph::with_text(text));
        match &mut self.body.blocks[index] {
            Block::Paragraph(p) => p,
            Block::Table(_) => unreachable!("just pushed a paragraph"),
        }
    }

    pub fn add_table(&mut self, rows: usize, cols: usize) -> &mut Table {
        let index = self.body.push_table(Table::new(rows, cols));
        match &mut self.body.blocks[index] {
            Block::Table(t) => t,
            Block::Paragraph(_) => unreachable!("just pushed a table"),
        }
    }

    /// Serializes the document into a .docx package held in memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = std::io::Cursor::new(Vec::new());
        package::write_docx(self, &mut buf)?;
        Ok(buf.into_inner())
    }

    /// Writes the document to `path` as a .docx package, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
        package::write_docx(self, file)
    }
}
