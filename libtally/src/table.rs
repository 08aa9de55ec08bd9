//! Plain tabular report output.
//!
//! Columns belong to numbered groups; a consumer laying out the table is
//! expected to give all columns of a group the same width.

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Separator,
    Text {
        content: String,
        align: Align,
        indent: usize,
    },
    Number(Decimal),
    /// A fraction, `0.5` meaning 50%.
    Percent(f64),
}

impl Cell {
    pub fn text(content: impl Into<String>) -> Cell {
        Cell::Text {
            content: content.into(),
            align: Align::Left,
            indent: 0,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Cell::Separator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Separator,
    Empty,
    Data(Vec<Cell>),
}

impl Row {
    pub fn cells(&self) -> &[Cell] {
        match self {
            Row::Data(cells) => cells,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<usize>,
    rows: Vec<Row>,
}

impl Table {
    /// Creates a table with the given column group sizes, so `new(&[1, 3])`
    /// has one column in group 0 and three in group 1.
    pub fn new(groups: &[usize]) -> Table {
        let columns = groups
            .iter()
            .enumerate()
            .flat_map(|(group, size)| std::iter::repeat(group).take(*size))
            .collect();
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// The group of every column.
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn add_separator(&mut self) {
        self.rows.push(Row::Separator);
    }

    pub fn add_empty(&mut self) {
        self.rows.push(Row::Empty);
    }

    /// Starts a data row. Missing trailing cells are filled with
    /// [`Cell::Empty`] when the builder is dropped.
    pub fn add_row(&mut self) -> RowBuilder<'_> {
        let width = self.width();
        RowBuilder {
            width,
            cells: Vec::with_capacity(width),
            table: self,
        }
    }
}

pub struct RowBuilder<'a> {
    table: &'a mut Table,
    width: usize,
    cells: Vec<Cell>,
}

impl RowBuilder<'_> {
    pub fn empty(mut self) -> Self {
        self.cells.push(Cell::Empty);
        self
    }

    pub fn separator(mut self) -> Self {
        self.cells.push(Cell::Separator);
        self
    }

    pub fn text(mut self, content: impl Into<String>, align: Align) -> Self {
        self.cells.push(Cell::Text {
            content: content.into(),
            align,
            indent: 0,
        });
        self
    }

    pub fn indented(mut self, content: impl Into<String>, indent: usize) -> Self {
        self.cells.push(Cell::Text {
            content: content.into(),
            align: Align::Left,
            indent,
        });
        self
    }

    pub fn number(mut self, n: Decimal) -> Self {
        self.cells.push(Cell::Number(n));
        self
    }

    pub fn percent(mut self, f: f64) -> Self {
        self.cells.push(Cell::Percent(f));
        self
    }

    /// Adds `n`, or an empty cell when it is zero.
    pub fn number_or_empty(self, n: Decimal) -> Self {
        if n.is_zero() {
            self.empty()
        } else {
            self.number(n)
        }
    }
}

impl Drop for RowBuilder<'_> {
    fn drop(&mut self) {
        let mut cells = std::mem::take(&mut self.cells);
        cells.resize(self.width, Cell::Empty);
        self.table.rows.push(Row::Data(cells));
    }
}
