//! Table geometry from lookahead over the events of one table.

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TablePlan {
    pub rows: usize,
    pub cols: usize,
}

impl TablePlan {
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// Extent of one table (including everything nested in it) within an event slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpan {
    /// Index one past the table's closing tag (or the slice length when unclosed).
    pub end: usize,
    /// `</table>` tags inside the span, the table's own included.
    pub closes: usize,
    pub closed: bool,
}

/// Walks the table starting at `events[0]` and returns its span. Nested tables are
/// skipped over by depth.
pub fn span(events: &[Event]) -> TableSpan {
    let mut depth = 0usize;
    let mut closes = 0usize;
    for (i, event) in events.iter().enumerate() {
        if event.is_start("table") {
            depth += 1;
        } else if event.is_end("table") && depth > 0 {
            depth -= 1;
            closes += 1;
            if depth == 0 {
                return TableSpan {
                    end: i + 1,
                    closes,
                    closed: true,
                };
            }
        }
    }
    TableSpan {
        end: events.len(),
        closes,
        closed: false,
    }
}

/// Counts `tr` elements of the table starting at `events[0]` (not descending into nested
/// tables) and takes the column count from the first row. Later rows may be ragged.
pub fn plan(events: &[Event]) -> TablePlan {
    let span = span(events);
    let mut depth = 0usize;
    let mut rows = 0usize;
    let mut first_row_cells = 0usize;
    let mut total_cells = 0usize;

    for event in &events[..span.end] {
        match event {
            Event::Start { name, .. } if name == "table" => depth += 1,
            Event::End { name } if name == "table" => depth = depth.saturating_sub(1),
            Event::Start { name, .. } if depth == 1 && name == "tr" => rows += 1,
            Event::Start { name, .. } if depth == 1 && (name == "td" || name == "th") => {
                total_cells += 1;
                if rows <= 1 {
                    first_row_cells += 1;
                }
            }
            _ => {}
        }
    }

    // Cells without any <tr> still form one row.
    if rows == 0 && total_cells > 0 {
        rows = 1;
    }
    let mut cols = first_row_cells;
    if cols == 0 && total_cells > 0 {
        cols = total_cells.div_ceil(rows);
    }
    if rows > 0 && total_cells != rows * cols {
        log::debug!(
            "ragged table: {total_cells} cells over {rows} rows, planned {cols} columns"
        );
    }

    TablePlan { rows, cols }
}
