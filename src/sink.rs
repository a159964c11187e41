//! Insertion targets for the dispatcher: a whole document, or a single table cell.

use crate::docx::{Block, Body, Cell, Document, Paragraph, Picture, Run};

/// A cell of a table sitting at `table` in the sink's root body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAddr {
    pub table: usize,
    pub row: usize,
    pub col: usize,
}

/// Which block list new content goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Root,
    Cell(CellAddr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParaLoc {
    pub scope: Scope,
    pub index: usize,
}

/// Stable reference to a run; blocks are only ever appended during a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRef {
    pub para: ParaLoc,
    pub index: usize,
}

pub trait Sink {
    fn body(&self) -> &Body;

    fn body_mut(&mut self) -> &mut Body;

    /// Runs before any event is dispatched.
    fn begin(&mut self) {}

    /// Runs after the last event.
    fn finish(&mut self) {}

    fn scope_mut(&mut self, scope: Scope) -> Option<&mut Body> {
        match scope {
            Scope::Root => Some(self.body_mut()),
            Scope::Cell(addr) => self.cell_mut(addr).map(|c| &mut c.body),
        }
    }

    fn cell_mut(&mut self, addr: CellAddr) -> Option<&mut Cell> {
        self.body_mut()
            .table_mut(addr.table)?
            .cell_mut(addr.row, addr.col)
    }

    fn append_paragraph(&mut self, scope: Scope, paragraph: Paragraph) -> Option<ParaLoc> {
        let index = self.scope_mut(scope)?.push_paragraph(paragraph);
        Some(ParaLoc { scope, index })
    }

    /// The scope's trailing paragraph, created when the scope is empty or ends in a table.
    fn last_paragraph(&mut self, scope: Scope) -> Option<ParaLoc> {
        let index = self.scope_mut(scope)?.last_paragraph_index();
        Some(ParaLoc { scope, index })
    }

    fn paragraph_mut(&mut self, loc: ParaLoc) -> Option<&mut Paragraph> {
        self.scope_mut(loc.scope)?.paragraph_mut(loc.index)
    }

    fn append_run(&mut self, loc: ParaLoc, run: Run) -> Option<RunRef> {
        let paragraph = self.paragraph_mut(loc)?;
        paragraph.runs.push(run);
        Some(RunRef {
            para: loc,
            index: paragraph.runs.len() - 1,
        })
    }

    fn run_mut(&mut self, run: RunRef) -> Option<&mut Run> {
        self.paragraph_mut(run.para)?.runs.get_mut(run.index)
    }

    /// Tables always land in the root body; nested ones belong to a cell's own sink.
    fn create_table(&mut self, rows: usize, cols: usize) -> usize {
        self.body_mut()
            .push_table(crate::docx::Table::new(rows, cols))
    }

    fn append_picture(&mut self, loc: ParaLoc, picture: Picture) -> Option<RunRef> {
        self.append_run(loc, Run::picture(picture))
    }
}

impl Sink for Document {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Sink for Cell {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// A fresh cell's lone blank paragraph is replaced by the converted content.
    fn begin(&mut self) {
        if let [Block::Paragraph(p)] = self.body.blocks.as_slice() {
            if p.is_blank() {
                self.body.blocks.clear();
            }
        }
    }

    /// Cells must hold at least one paragraph or the package is reported corrupt.
    fn finish(&mut self) {
        if self.body.paragraphs().next().is_none() {
            self.body.push_paragraph(Paragraph::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_refs_resolve_inside_cells() {
        let mut doc = Document::new();
        let table = doc.create_table(2, 2);
        let addr = CellAddr {
            table,
            row: 1,
            col: 0,
        };
        let loc = doc.last_paragraph(Scope::Cell(addr)).unwrap();
        assert_eq!(loc.index, 0);
        let run = doc.append_run(loc, Run::text("x")).unwrap();
        doc.run_mut(run).unwrap().format.bold = true;

        let cell = doc.body.tables().next().unwrap().cell(1, 0).unwrap();
        assert_eq!(cell.text(), "x");
        assert!(cell.paragraphs().next().unwrap().runs[0].format.bold);
    }

    #[test]
    fn test_out_of_range_cell_is_none() {
        let mut doc = Document::new();
        let table = doc.create_table(1, 1);
        let addr = CellAddr {
            table,
            row: 0,
            col: 3,
        };
        assert!(doc.append_paragraph(Scope::Cell(addr), Paragraph::default()).is_none());
    }

    #[test]
    fn test_cell_begin_and_finish() {
        let mut cell = Cell::default();
        cell.begin();
        assert!(cell.body.blocks.is_empty());
        cell.finish();
        assert_eq!(cell.paragraphs().count(), 1);

        let mut filled = Cell::default();
        filled.body.blocks[0] = Block::Paragraph(Paragraph::with_text("keep"));
        filled.begin();
        assert_eq!(filled.text(), "keep");
    }
}
