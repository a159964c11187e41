//! The tag-driven state machine that turns parse events into document content.

use crate::docx::{Alignment, Cell, ListKind, ListStyle, Paragraph, Run};
use crate::events::{attr_get, Attrs, Event};
use crate::image::{ImageOutcome, ImageResolver};
use crate::sink::{CellAddr, ParaLoc, RunRef, Scope, Sink};
use crate::style::{is_font_tag, BlockStyle, RunStyle, StyleDeclaration, MAX_INDENT};
use crate::table;

// inches per list nesting level
pub const LIST_INDENT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    InBlock,
    InList(usize),
    InTable { row: Option<usize>, col: Option<usize> },
    /// Absorbing a delegated nested table until `remaining` closing tags are seen.
    InSkip { remaining: usize },
}

/// One open inline-formatting tag and the runs created while it was open.
#[derive(Debug)]
struct StyleFrame {
    tag: String,
    style: RunStyle,
    runs: Vec<RunRef>,
}

#[derive(Debug, Clone, Copy)]
enum BlockContext {
    Open(ParaLoc),
    /// Text after an image starts a new paragraph with the image paragraph's formatting.
    Resume {
        scope: Scope,
        alignment: Alignment,
        left_indent: Option<f64>,
    },
}

#[derive(Debug)]
struct TableContext {
    /// Root body index of the created table; `None` when the markup had no cells.
    grid: Option<usize>,
    rows: usize,
    cols: usize,
    row: Option<usize>,
    col: Option<usize>,
    in_cell: bool,
    /// The current cell still holds only the blank paragraph it was created with.
    fresh: bool,
    skip_closes: usize,
}

impl TableContext {
    fn current_cell(&self) -> Option<CellAddr> {
        let table = self.grid?;
        if !self.in_cell {
            return None;
        }
        let row = self.row.unwrap_or(0);
        let col = self.col?;
        (row < self.rows && col < self.cols).then_some(CellAddr { table, row, col })
    }
}

pub struct Dispatcher<'a, S: Sink + ?Sized> {
    sink: &'a mut S,
    images: &'a ImageResolver,
    depth: usize,
    max_depth: usize,
    block: Option<BlockContext>,
    lists: Vec<ListKind>,
    frames: Vec<StyleFrame>,
    table: Option<TableContext>,
}

impl<'a, S: Sink + ?Sized> Dispatcher<'a, S> {
    pub fn new(sink: &'a mut S, images: &'a ImageResolver, max_depth: usize) -> Self {
        Dispatcher {
            sink,
            images,
            depth: 0,
            max_depth,
            block: None,
            lists: Vec::new(),
            frames: Vec::new(),
            table: None,
        }
    }

    pub fn state(&self) -> State {
        if let Some(t) = &self.table {
            if t.skip_closes > 0 {
                return State::InSkip {
                    remaining: t.skip_closes,
                };
            }
            return State::InTable {
                row: t.row,
                col: t.col,
            };
        }
        if !self.lists.is_empty() {
            return State::InList(self.lists.len());
        }
        if self.block.is_some() {
            return State::InBlock;
        }
        State::Idle
    }

    /// Consumes the whole event stream. Frames still open at the end are flushed so a
    /// truncated stream keeps the formatting it already had.
    pub fn run(mut self, events: &[Event]) {
        self.sink.begin();
        for i in 0..events.len() {
            self.dispatch(events, i);
        }
        while !self.frames.is_empty() {
            self.pop_frame();
        }
        self.sink.finish();
    }

    pub fn dispatch(&mut self, events: &[Event], i: usize) {
        let event = &events[i];

        if let Some(t) = self.table.as_mut() {
            if t.skip_closes > 0 {
                if event.is_end("table") {
                    t.skip_closes -= 1;
                }
                return;
            }
        }

        match event {
            Event::Start { name, attrs } => self.start_tag(events, i, name, attrs),
            Event::End { name } => self.end_tag(name),
            Event::Empty { name, attrs } => self.empty_tag(name, attrs),
            Event::Text(text) => self.text(text),
        }
    }

    fn start_tag(&mut self, events: &[Event], i: usize, name: &str, attrs: &Attrs) {
        let decl = StyleDeclaration::from_attr(attr_get(attrs, "style"));
        match name {
            "p" | "div" => self.open_block(&decl),
            "ol" => self.lists.push(ListKind::Number),
            "ul" => self.lists.push(ListKind::Bullet),
            "li" => self.open_list_item(&decl),
            "table" => self.open_table(events, i),
            "tr" => self.next_row(),
            "td" => self.next_cell(),
            "th" => {
                self.next_cell();
                self.push_frame(name, &decl);
            }
            _ if is_font_tag(name) => self.push_frame(name, &decl),
            _ => {}
        }
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "table" => self.close_table(),
            "ol" | "ul" => {
                self.lists.pop();
            }
            "td" | "th" | "tr" => {
                if name == "th" {
                    self.close_frame(name);
                }
                if let Some(t) = self.table.as_mut() {
                    t.in_cell = false;
                }
            }
            _ if is_font_tag(name) => self.close_frame(name),
            _ => {}
        }
    }

    fn empty_tag(&mut self, name: &str, attrs: &Attrs) {
        match name {
            "br" => self.text("\n"),
            "img" => self.image(attrs),
            _ => {}
        }
    }

    /// Where new content goes: the root body, the current cell, or nowhere when inside a
    /// table but outside any planned cell.
    fn scope(&self) -> Option<Scope> {
        match &self.table {
            None => Some(Scope::Root),
            Some(t) => t.current_cell().map(Scope::Cell),
        }
    }

    fn new_paragraph(&mut self, scope: Scope) -> Option<ParaLoc> {
        let fresh = matches!(scope, Scope::Cell(_))
            && self
                .table
                .as_mut()
                .is_some_and(|t| std::mem::take(&mut t.fresh));
        if fresh {
            // The first block of a new cell takes the cell's own blank paragraph.
            let loc = self.sink.last_paragraph(scope)?;
            if self
                .sink
                .paragraph_mut(loc)
                .is_some_and(|p| *p == Paragraph::default())
            {
                return Some(loc);
            }
        }
        self.sink.append_paragraph(scope, Paragraph::default())
    }

    fn open_block(&mut self, decl: &StyleDeclaration) {
        let Some(scope) = self.scope() else {
            log::debug!("dropping block outside any table cell");
            return;
        };
        let Some(para) = self.new_paragraph(scope) else {
            return;
        };
        self.block = Some(BlockContext::Open(para));
        self.format_block(para, decl);
    }

    fn format_block(&mut self, para: ParaLoc, decl: &StyleDeclaration) {
        if decl.is_empty() {
            return;
        }
        let style = BlockStyle::from_declaration(decl);
        if let Some(p) = self.sink.paragraph_mut(para) {
            if let Some(alignment) = style.alignment {
                p.alignment = alignment;
            }
            if let Some(indent) = style.left_indent {
                p.left_indent = Some(indent);
            }
        }
    }

    fn open_list_item(&mut self, decl: &StyleDeclaration) {
        let Some(scope) = self.scope() else {
            return;
        };
        let Some(para) = self.new_paragraph(scope) else {
            return;
        };
        if let (Some(&kind), Some(p)) = (self.lists.last(), self.sink.paragraph_mut(para)) {
            let depth = self.lists.len();
            p.list = Some(ListStyle {
                kind,
                level: (depth - 1) as u32,
            });
            p.left_indent = Some((LIST_INDENT * depth as f64).min(MAX_INDENT));
        }
        self.block = Some(BlockContext::Open(para));
        self.format_block(para, decl);
    }

    fn push_frame(&mut self, tag: &str, decl: &StyleDeclaration) {
        self.frames.push(StyleFrame {
            tag: tag.to_string(),
            style: RunStyle::resolve(tag, decl),
            runs: Vec::new(),
        });
    }

    /// Closes the innermost open frame for `tag`, flushing any frames opened after it.
    fn close_frame(&mut self, tag: &str) {
        let Some(pos) = self.frames.iter().rposition(|f| f.tag == tag) else {
            log::debug!("ignoring </{tag}> without an open frame");
            return;
        };
        while self.frames.len() > pos {
            self.pop_frame();
        }
    }

    fn pop_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if frame.style.is_empty() {
            return;
        }
        for run in frame.runs {
            if let Some(r) = self.sink.run_mut(run) {
                frame.style.apply(&mut r.format);
            }
        }
    }

    fn text(&mut self, text: &str) {
        let Some(scope) = self.scope() else {
            log::debug!("dropping text outside any table cell: {text:?}");
            return;
        };
        let para = match self.block {
            Some(BlockContext::Open(para)) if para.scope == scope => para,
            block => {
                let loc = match (block, scope) {
                    (
                        Some(BlockContext::Resume {
                            scope: resumed,
                            alignment,
                            left_indent,
                        }),
                        _,
                    ) if resumed == scope => self.sink.append_paragraph(
                        scope,
                        Paragraph {
                            alignment,
                            left_indent,
                            ..Default::default()
                        },
                    ),
                    (_, Scope::Root) => self.sink.append_paragraph(scope, Paragraph::default()),
                    (_, Scope::Cell(_)) => self.sink.last_paragraph(scope),
                };
                let Some(loc) = loc else {
                    return;
                };
                self.block = Some(BlockContext::Open(loc));
                loc
            }
        };
        let Some(run) = self.sink.append_run(para, Run::text(text)) else {
            return;
        };
        for frame in &mut self.frames {
            frame.runs.push(run);
        }
    }

    fn image(&mut self, attrs: &Attrs) {
        let Some(src) = attr_get(attrs, "src").map(str::trim).filter(|s| !s.is_empty()) else {
            log::debug!("ignoring <img> without src");
            return;
        };
        let Some(scope) = self.scope() else {
            return;
        };
        let decl = StyleDeclaration::from_attr(attr_get(attrs, "style"));
        let outcome = self.images.resolve(src, &decl);

        // An empty enclosing block holds the image itself; otherwise the image gets its
        // own paragraph carrying the block's alignment and indent.
        let mut inherited = None;
        let mut target = None;
        if let Some(BlockContext::Open(para)) = self.block {
            if para.scope == scope {
                if let Some(p) = self.sink.paragraph_mut(para) {
                    inherited = Some((p.alignment, p.left_indent));
                    if p.is_blank() {
                        target = Some(para);
                    }
                }
            }
        }
        let para = match target {
            Some(para) => para,
            None => {
                let Some(para) = self.new_paragraph(scope) else {
                    return;
                };
                if let (Some((alignment, left_indent)), Some(p)) =
                    (inherited, self.sink.paragraph_mut(para))
                {
                    p.alignment = alignment;
                    p.left_indent = left_indent;
                }
                para
            }
        };

        match outcome {
            ImageOutcome::Picture(picture) => {
                self.sink.append_picture(para, picture);
            }
            ImageOutcome::Placeholder(text) => {
                self.sink.append_run(para, Run::text(text));
            }
        }
        let (alignment, left_indent) = inherited.unwrap_or_default();
        self.block = Some(BlockContext::Resume {
            scope,
            alignment,
            left_indent,
        });
    }

    fn open_table(&mut self, events: &[Event], i: usize) {
        if self.table.is_some() {
            self.nested_table(events, i);
            return;
        }

        let plan = table::plan(&events[i..]);
        let grid = if plan.is_empty() {
            log::debug!("table without cells, skipping its content");
            None
        } else {
            Some(self.sink.create_table(plan.rows, plan.cols))
        };
        self.table = Some(TableContext {
            grid,
            rows: plan.rows,
            cols: plan.cols,
            row: None,
            col: None,
            in_cell: false,
            fresh: false,
            skip_closes: 0,
        });
        self.block = None;
    }

    /// A table inside a table is converted by a fresh dispatcher writing into the current
    /// cell; this dispatcher then absorbs the nested events.
    fn nested_table(&mut self, events: &[Event], i: usize) {
        let span = table::span(&events[i..]);
        let nested = &events[i..i + span.end];

        let Some(t) = self.table.as_mut() else {
            return;
        };
        t.skip_closes = if span.closed { span.closes } else { usize::MAX };
        let cell = t.current_cell();
        self.block = None;

        let Some(addr) = cell else {
            log::debug!("dropping nested table outside any cell");
            return;
        };
        if self.depth + 1 > self.max_depth {
            log::warn!("nested table deeper than {} levels dropped", self.max_depth);
            return;
        }
        let Some(cell) = self.sink.cell_mut(addr) else {
            return;
        };
        let mut child: Dispatcher<'_, Cell> = Dispatcher::new(cell, self.images, self.max_depth);
        child.depth = self.depth + 1;
        child.run(nested);
    }

    fn next_row(&mut self) {
        let Some(t) = self.table.as_mut() else {
            return;
        };
        t.row = Some(t.row.map_or(0, |r| r + 1));
        t.col = None;
        t.in_cell = false;
        if t.row.is_some_and(|r| r >= t.rows) {
            log::debug!("dropping row beyond planned {} rows", t.rows);
        }
        self.block = None;
    }

    fn next_cell(&mut self) {
        let Some(t) = self.table.as_mut() else {
            return;
        };
        t.col = Some(t.col.map_or(0, |c| c + 1));
        t.in_cell = true;
        t.fresh = true;
        if t.col.is_some_and(|c| c >= t.cols) {
            log::debug!("dropping cell beyond planned {} columns", t.cols);
        }
        self.block = None;
    }

    fn close_table(&mut self) {
        if self.table.take().is_some() {
            self.block = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{Alignment, Block, Document, Rgb, Table};
    use crate::events::tokenize;
    use crate::normalize::collapse_whitespace;

    fn convert(html: &str) -> Document {
        let mut doc = Document::new();
        let images = ImageResolver {
            fetch_remote: false,
            ..Default::default()
        };
        let events = tokenize(&collapse_whitespace(html));
        Dispatcher::new(&mut doc, &images, 16).run(&events);
        doc
    }

    fn only_table(doc: &Document) -> &Table {
        let tables: Vec<_> = doc.tables().collect();
        assert_eq!(tables.len(), 1);
        tables[0]
    }

    #[test]
    fn test_centered_paragraph_with_bold_run() {
        let doc = convert("<p style=\"text-align:center\"><b>Hi</b> there</p>");
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 1);
        let p = paragraphs[0];
        assert_eq!(p.alignment, Alignment::Center);
        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.runs[0].as_text(), Some("Hi"));
        assert!(p.runs[0].format.bold);
        assert_eq!(p.runs[1].as_text(), Some(" there"));
        assert!(p.runs[1].format.is_plain());
    }

    #[test]
    fn test_nested_effects_union() {
        let doc = convert("<p><b><i><u><s><sup>x</sup></s></u></i></b>y</p>");
        let p = doc.paragraphs().next().unwrap();
        let f = &p.runs[0].format;
        assert!(f.bold && f.italic && f.underline && f.strike && f.superscript);
        assert!(p.runs[1].format.is_plain());
    }

    #[test]
    fn test_same_tag_overlapping_frames() {
        let doc = convert("<p><span style=\"color:rgb(255,0,0)\">a<span style=\"background-color:yellow\">b</span>c</span></p>");
        let p = doc.paragraphs().next().unwrap();
        assert_eq!(p.runs[0].format.color, Some(Rgb(255, 0, 0)));
        assert!(!p.runs[0].format.highlight);
        assert_eq!(p.runs[1].format.color, Some(Rgb(255, 0, 0)));
        assert!(p.runs[1].format.highlight);
        assert_eq!(p.runs[2].format.color, Some(Rgb(255, 0, 0)));
    }

    #[test]
    fn test_unknown_tags_are_inert() {
        let doc = convert("<p>a <custom>b</custom> and <a href=\"#\">c</a></p>");
        let p = doc.paragraphs().next().unwrap();
        assert_eq!(p.text(), "a b and c");
        assert!(p.runs.iter().all(|r| r.format.is_plain()));
    }

    #[test]
    fn test_block_supersedes_previous() {
        let doc = convert("<p>one</p><div style=\"margin-left:100px\">two</div>after");
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[1].left_indent, Some(2.5));
        assert_eq!(paragraphs[1].text(), "twoafter");
    }

    #[test]
    fn test_text_without_block_creates_paragraph() {
        let doc = convert("loose<br>text");
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].text(), "loose\ntext");
    }

    #[test]
    fn test_nested_lists() {
        let doc = convert("<ul><li>a</li><li>b<ol><li>c</li></ol></li></ul><ol><li>d</li></ol>");
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 4);
        assert_eq!(
            paragraphs[0].list,
            Some(ListStyle {
                kind: ListKind::Bullet,
                level: 0
            })
        );
        assert_eq!(paragraphs[0].left_indent, Some(0.5));
        assert_eq!(
            paragraphs[2].list,
            Some(ListStyle {
                kind: ListKind::Number,
                level: 1
            })
        );
        assert_eq!(paragraphs[2].left_indent, Some(1.0));
        assert_eq!(paragraphs[3].list.map(|l| l.kind), Some(ListKind::Number));
        assert_eq!(paragraphs[3].list.map(|l| l.level), Some(0));
    }

    #[test]
    fn test_list_indent_capped() {
        let html = format!("{}<li>deep</li>", "<ul>".repeat(20));
        let doc = convert(&html);
        let p = doc.paragraphs().next().unwrap();
        assert_eq!(p.left_indent, Some(MAX_INDENT));
    }

    #[test]
    fn test_table_geometry_and_ragged_rows() {
        let doc = convert(
            "<table><tr><th>h1</th><th>h2</th></tr><tr><td>a</td></tr><tr><td>b</td><td>c</td><td>extra</td></tr></table>",
        );
        let t = only_table(&doc);
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.col_count(), 2);
        assert_eq!(t.cell(0, 0).unwrap().text(), "h1");
        let header_run = &t.cell(0, 1).unwrap().paragraphs().next().unwrap().runs[0];
        assert!(header_run.format.bold);
        assert_eq!(t.cell(1, 0).unwrap().text(), "a");
        assert_eq!(t.cell(1, 1).unwrap().text(), "");
        assert_eq!(t.cell(2, 1).unwrap().text(), "c");
        assert!(!doc
            .paragraphs()
            .any(|p| p.text().contains("extra")));
    }

    #[test]
    fn test_formatting_inside_cells() {
        let doc = convert("<table><tr><td><p>x <i>y</i></p><p>z</p></td></tr></table>");
        let cell = only_table(&doc).cell(0, 0).unwrap();
        let paragraphs: Vec<_> = cell.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text(), "x y");
        assert!(paragraphs[0].runs[1].format.italic);
        assert_eq!(paragraphs[1].text(), "z");
    }

    #[test]
    fn test_nested_table_is_child_of_cell() {
        let doc = convert(
            "<table><tr><td>outer<table><tr><td>i1</td><td>i2</td><td>i3</td></tr></table>tail</td><td>b</td></tr></table><p>after</p>",
        );
        let t = only_table(&doc);
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.col_count(), 2);

        let cell = t.cell(0, 0).unwrap();
        let blocks = &cell.body.blocks;
        assert!(matches!(&blocks[0], Block::Paragraph(p) if p.text() == "outer"));
        let inner = match &blocks[1] {
            Block::Table(inner) => inner,
            other => panic!("expected nested table, got {other:?}"),
        };
        assert_eq!(inner.row_count(), 1);
        assert_eq!(inner.col_count(), 3);
        assert_eq!(inner.cell(0, 2).unwrap().text(), "i3");
        assert!(matches!(&blocks[2], Block::Paragraph(p) if p.text() == "tail"));

        assert_eq!(t.cell(0, 1).unwrap().text(), "b");
        assert_eq!(doc.paragraphs().last().unwrap().text(), "after");
    }

    #[test]
    fn test_doubly_nested_tables() {
        let doc = convert(
            "<table><tr><td><table><tr><td><table><tr><td>deep</td></tr></table></td></tr></table></td></tr></table>x",
        );
        let t = only_table(&doc);
        let level1 = t.cell(0, 0).unwrap().tables().next().unwrap();
        let level2 = level1.cell(0, 0).unwrap().tables().next().unwrap();
        assert_eq!(level2.cell(0, 0).unwrap().text(), "deep");
        assert_eq!(doc.paragraphs().last().unwrap().text(), "x");
    }

    #[test]
    fn test_nested_table_depth_limit() {
        let mut doc = Document::new();
        let images = ImageResolver::default();
        let events = tokenize(
            "<table><tr><td>a<table><tr><td>dropped</td></tr></table></td></tr></table>",
        );
        Dispatcher::new(&mut doc, &images, 0).run(&events);
        let cell = only_table(&doc).cell(0, 0).unwrap();
        assert_eq!(cell.tables().count(), 0);
        assert_eq!(cell.text(), "a");
    }

    #[test]
    fn test_skip_state_while_absorbing_nested_table() {
        let mut doc = Document::new();
        let images = ImageResolver::default();
        let events = tokenize(
            "<table><tr><td><table><tr><td>n</td></tr></table></td></tr></table>",
        );
        let mut dispatcher = Dispatcher::new(&mut doc, &images, 16);
        let nested_start = events.iter().rposition(|e| e.is_start("table")).unwrap();
        for i in 0..=nested_start {
            dispatcher.dispatch(&events, i);
        }
        assert_eq!(dispatcher.state(), State::InSkip { remaining: 1 });
        let nested_end = events.iter().position(|e| e.is_end("table")).unwrap();
        for i in nested_start + 1..=nested_end {
            dispatcher.dispatch(&events, i);
        }
        assert_eq!(
            dispatcher.state(),
            State::InTable {
                row: Some(0),
                col: Some(0)
            }
        );
    }

    #[test]
    fn test_image_placeholder_paragraph() {
        let doc = convert("<p>before</p><img src=\"/secret/path/missing.png\"><p>after</p>");
        let texts: Vec<_> = doc.paragraphs().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["before", "<image: missing.png>", "after"]);
    }

    fn cell_texts(cell: &Cell) -> Vec<String> {
        cell.paragraphs().map(Paragraph::text).collect()
    }

    #[test]
    fn test_empty_list_item_in_cell_keeps_its_own_paragraph() {
        let doc = convert("<table><tr><td><ul><li></li><li></li></ul><p>para</p></td></tr></table>");
        let cell = only_table(&doc).cell(0, 0).unwrap();
        let paragraphs: Vec<_> = cell.paragraphs().collect();
        assert_eq!(paragraphs.len(), 3);
        assert!(paragraphs[0].list.is_some());
        assert!(paragraphs[1].list.is_some());
        assert_eq!(paragraphs[2].text(), "para");
        assert_eq!(paragraphs[2].list, None);
        assert_eq!(paragraphs[2].left_indent, None);
    }

    #[test]
    fn test_empty_styled_block_in_cell_does_not_leak_alignment() {
        let doc = convert("<table><tr><td><p style=\"text-align:center\"></p><p>x</p></td></tr></table>");
        let cell = only_table(&doc).cell(0, 0).unwrap();
        let paragraphs: Vec<_> = cell.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].alignment, Alignment::Center);
        assert_eq!(paragraphs[1].text(), "x");
        assert_eq!(paragraphs[1].alignment, Alignment::Left);
    }

    #[test]
    fn test_image_only_cell_has_no_leading_blank_line() {
        let doc = convert("<table><tr><td><img src=\"/a/b.png\"></td><td><p>x</p><img src=\"c.png\"></td></tr></table>");
        let t = only_table(&doc);
        assert_eq!(cell_texts(t.cell(0, 0).unwrap()), vec!["<image: b.png>"]);
        assert_eq!(cell_texts(t.cell(0, 1).unwrap()), vec!["x", "<image: c.png>"]);
    }

    #[test]
    fn test_image_in_block_keeps_block_formatting() {
        let doc = convert(
            "<p style=\"text-align:center;margin-left:40px\"><img src=\"/a/chart.png\">caption</p><p>next</p>",
        );
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0].text(), "<image: chart.png>");
        assert_eq!(paragraphs[0].alignment, Alignment::Center);
        assert_eq!(paragraphs[1].text(), "caption");
        assert_eq!(paragraphs[1].alignment, Alignment::Center);
        assert_eq!(paragraphs[1].left_indent, Some(1.0));
        assert_eq!(paragraphs[2].alignment, Alignment::Left);

        let doc = convert("<p style=\"text-align:right\">see <img src=\"/a/b.png\"></p>");
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text(), "see ");
        assert_eq!(paragraphs[1].alignment, Alignment::Right);
    }

    #[test]
    fn test_unparsable_color_does_not_abort() {
        let doc = convert("<p><span style=\"color:#aé123\">x</span></p>");
        let run = &doc.paragraphs().next().unwrap().runs[0];
        assert_eq!(run.as_text(), Some("x"));
        assert_eq!(run.format.color, None);
    }

    #[test]
    fn test_empty_table_absorbed() {
        let doc = convert("<table></table><p>x</p>");
        assert_eq!(doc.tables().count(), 0);
        assert_eq!(doc.paragraphs().next().unwrap().text(), "x");
    }

    #[test]
    fn test_unclosed_frames_flushed_at_end() {
        let doc = convert("<p><b>bold");
        assert!(doc.paragraphs().next().unwrap().runs[0].format.bold);
    }
}
