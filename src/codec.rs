use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::table::Table;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Ending used by the first line of `text`.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(i) if text[..i].ends_with('\r') => Self::CrLf,
            _ => Self::Lf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Parse comma separated text. The first line holds the headers.
///
/// There is no quoting: every comma splits a field. A data line with the
/// wrong number of fields is rejected with its line number.
pub fn parse(text: &str) -> Result<Table> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut lines = text.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| Error::Format("missing header line".into()))?;
    let mut table = Table::new(split_fields(header_line), Vec::new())?;
    let single_column = table.column_count() == 1;

    for (i, line) in lines.enumerate() {
        // a blank line is a record only when it can hold exactly one field
        if line.is_empty() && !single_column {
            continue;
        }
        table.push_row(split_fields(line), i + 2)?;
    }
    Ok(table)
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(str::to_string).collect()
}

pub fn serialize(table: &Table) -> String {
    serialize_with(table, LineEnding::Lf)
}

pub fn serialize_with(table: &Table, ending: LineEnding) -> String {
    let eol = ending.as_str();
    let mut out = String::new();
    for cols in std::iter::once(table.headers()).chain(table.rows().iter().map(Vec::as_slice)) {
        out.push_str(&cols.join(","));
        out.push_str(eol);
    }
    out
}

fn write_table<W: Write>(w: &mut W, table: &Table, ending: LineEnding) -> std::io::Result<()> {
    write_csv_row(w, table.headers(), ending)?;
    for row in table.rows() {
        write_csv_row(w, row, ending)?;
    }
    Ok(())
}

fn write_csv_row<W: Write>(w: &mut W, cols: &[String], ending: LineEnding) -> std::io::Result<()> {
    let mut first = true;
    for col in cols {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        w.write_all(col.as_bytes())?;
    }
    w.write_all(ending.as_str().as_bytes())?;
    Ok(())
}

/// Read and parse a CSV file, remembering its line ending for the next save.
pub fn load_file(path: &Path) -> Result<(Table, LineEnding)> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        Error::Format(format!(
            "{} is not valid UTF-8 (byte {})",
            path.display(),
            e.utf8_error().valid_up_to()
        ))
    })?;
    let ending = LineEnding::detect(&text);
    let table = parse(&text)?;
    info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded csv"
    );
    Ok((table, ending))
}

/// Write `table` to `path`, replacing any existing file.
///
/// The data goes to a temporary file next to the destination which is then
/// renamed over it, so a failed write leaves the old contents in place. An
/// existing destination is resolved through symlinks first and keeps its
/// permissions.
pub fn save_file(path: &Path, table: &Table, ending: LineEnding) -> Result<()> {
    let (target, perms) = if path.exists() {
        let target = fs::canonicalize(path).map_err(|e| Error::io(path, e))?;
        let meta = fs::metadata(&target).map_err(|e| Error::io(&target, e))?;
        (target, meta.is_file().then(|| meta.permissions()))
    } else {
        (path.to_path_buf(), None)
    };
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    debug!(tmp = %tmp.path().display(), target = %target.display(), "writing temporary file");
    {
        let mut w = BufWriter::new(tmp.as_file());
        write_table(&mut w, table, ending).map_err(|e| Error::io(&target, e))?;
        w.flush().map_err(|e| Error::io(&target, e))?;
    }
    if let Some(perms) = perms {
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|e| Error::io(&target, e))?;
    }
    tmp.as_file().sync_all().map_err(|e| Error::io(&target, e))?;
    tmp.persist(&target).map_err(|e| Error::io(&target, e.error))?;
    info!(path = %path.display(), rows = table.row_count(), "saved csv");
    Ok(())
}
