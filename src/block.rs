//! Column-aligned tables with persistent column widths.
//!
//! A [`Block`] is created once per logical table and fed fresh rows on every
//! refresh cycle. Column widths only grow, so the layout stays stable while
//! the data changes underneath it.

use std::io::Write;

use crate::cell::{Cell, ColorStr};
use crate::error::RenderError;
use crate::style::Styles;

/// A table that the console can lay out on screen.
pub trait Printable {
    /// Number of data rows currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prints the header and as many rows as fit into `height` lines,
    /// cutting every line at `width` characters.
    ///
    /// `height` must be greater than 1.
    fn print(
        &mut self,
        out: &mut dyn Write,
        height: usize,
        width: usize,
        styled: bool,
    ) -> Result<(), RenderError>;
}

/// One titled table.
#[derive(Debug)]
pub struct Block {
    headers: Vec<String>,
    column_widths: Vec<usize>,
    rows: Vec<Vec<Cell>>,
}

impl Block {
    /// Width every column starts with.
    pub const MIN_COLUMN_WIDTH: usize = 6;

    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let column_widths = vec![Self::MIN_COLUMN_WIDTH; headers.len()];
        Self {
            headers,
            column_widths,
            rows: Vec::new(),
        }
    }

    /// Replaces all rows for the next print. Column widths are kept.
    pub fn reset(&mut self, rows: Vec<Vec<Cell>>) {
        self.rows = rows;
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Remembered width of every column.
    pub fn column_widths(&self) -> &[usize] {
        &self.column_widths
    }

    /// Prints one line of cells, cutting it at `left_width` characters.
    ///
    /// Columns whose header does not fit into the remaining width are dropped
    /// with everything after them. Every cell but the last one in the line
    /// widens its column to fit the cell plus two spaces of separation.
    fn print_line(
        &mut self,
        out: &mut dyn Write,
        cells: &[ColorStr],
        mut left_width: usize,
        bold: bool,
        styled: bool,
    ) -> Result<(), RenderError> {
        for (index, cell) in cells.iter().enumerate() {
            if left_width < self.headers[index].chars().count() {
                break;
            }
            if index + 1 < cells.len() {
                self.column_widths[index] = self.column_widths[index].max(cell.len() + 2);
            }
            let column_width = self.column_widths[index];

            let opened = styled && Styles::begin(out, bold, cell.color())?;
            let text: String = cell.ljust(column_width).chars().take(left_width).collect();
            out.write_all(text.as_bytes())?;
            if opened {
                Styles::reset(out)?;
            }
            left_width = left_width.saturating_sub(column_width);
        }

        writeln!(out)?;
        Ok(())
    }
}

impl Printable for Block {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn print(
        &mut self,
        out: &mut dyn Write,
        height: usize,
        width: usize,
        styled: bool,
    ) -> Result<(), RenderError> {
        assert!(height > 1, "block needs room for a header and a row");

        let headers: Vec<ColorStr> = self
            .headers
            .iter()
            .map(|h| ColorStr::plain(h.as_str()))
            .collect();
        self.print_line(out, &headers, width, true, styled)?;
        let mut height = height - 1;

        let rows = std::mem::take(&mut self.rows);
        let mut result = Ok(());
        for row in &rows {
            if height <= 1 {
                break;
            }
            debug_assert!(row.len() <= self.headers.len(), "row is wider than the header");
            height -= 1;
            let cells = match row.iter().map(Cell::format).collect::<Result<Vec<_>, _>>() {
                Ok(cells) => cells,
                Err(e) => {
                    result = Err(e.into());
                    break;
                }
            };
            if let Err(e) = self.print_line(out, &cells, width, false, styled) {
                result = Err(e);
                break;
            }
        }
        self.rows = rows;
        result
    }
}
