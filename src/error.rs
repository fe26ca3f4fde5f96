use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the table, codec and editor.
///
/// Every variant renders as a single line so the shell can put it straight
/// into the status bar.
#[derive(Error, Debug)]
pub enum Error {
    /// The text could not be turned into a table.
    #[error("format error: {0}")]
    Format(String),

    /// A data line has a different number of fields than the header.
    #[error("format error: line {line} has {found} fields, expected {expected}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A row built in code has a different number of fields than the header.
    #[error("format error: row {row} has {found} fields, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Row or column outside the current table.
    #[error("index error: {what} {index} out of bounds (len {len})")]
    Index {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("no record selected")]
    NoSelection,

    #[error("no file open")]
    NoDocument,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn row(index: usize, len: usize) -> Self {
        Self::Index {
            what: "row",
            index,
            len,
        }
    }

    pub(crate) fn column(index: usize, len: usize) -> Self {
        Self::Index {
            what: "column",
            index,
            len,
        }
    }

    /// True for the malformed-content family (`FormatError`).
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::FieldCount { .. } | Self::RowWidth { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
