use crate::error::{Error, Result};

/// Headers plus rows; every row is exactly as wide as the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(Error::Format("table has no columns".into()));
        }
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find_map(|(i, r)| (r.len() != headers.len()).then_some((i, r.len())))
        {
            return Err(Error::RowWidth {
                row,
                expected: headers.len(),
                found,
            });
        }
        Ok(Self { headers, rows })
    }

    /// Append a parsed record; `line` is its 1-based line in the source text.
    pub(crate) fn push_row(&mut self, row: Vec<String>, line: usize) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(Error::FieldCount {
                line,
                expected: self.headers.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn header(&self, col: usize) -> Result<&str> {
        self.headers
            .get(col)
            .map(String::as_str)
            .ok_or_else(|| Error::column(col, self.headers.len()))
    }

    pub fn row(&self, row: usize) -> Result<&[String]> {
        self.rows
            .get(row)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::row(row, self.rows.len()))
    }

    pub fn get(&self, row: usize, col: usize) -> Result<&str> {
        let fields = self.row(row)?;
        fields
            .get(col)
            .map(String::as_str)
            .ok_or_else(|| Error::column(col, self.headers.len()))
    }

    /// Overwrite one field. Only bounds are checked.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) -> Result<()> {
        let width = self.headers.len();
        let len = self.rows.len();
        let fields = self.rows.get_mut(row).ok_or_else(|| Error::row(row, len))?;
        let field = fields.get_mut(col).ok_or_else(|| Error::column(col, width))?;
        *field = value.into();
        Ok(())
    }

    /// Widest of the header and every value in `col`, in characters.
    pub fn column_width(&self, col: usize) -> Result<usize> {
        let header = self.header(col)?.chars().count();
        Ok(self
            .rows
            .iter()
            .map(|r| r[col].chars().count())
            .fold(header, usize::max))
    }
}
