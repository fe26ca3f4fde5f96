use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec::{self, LineEnding};
use crate::config::Config;
use crate::editor::Editor;
use crate::error::Error;
use crate::table::Table;

/// The open file: its table plus where it came from.
#[derive(Debug)]
pub struct Document {
    pub path: PathBuf,
    pub table: Table,
    pub line_ending: LineEnding,
}

impl Document {
    /// Last path component, shown in the info bar.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Grid,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Open,
    SaveAs,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
    /// `*.csv` files in the start directory.
    pub candidates: Vec<PathBuf>,
    pub selected: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum AppMode {
    Normal,
    Prompt(Prompt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Updated,
    Saved,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

pub struct App {
    pub should_quit: bool,

    // UI state
    pub mode: AppMode,
    pub focus: Focus,
    pub status: Status,
    pub show_help: bool,

    // Open file
    pub document: Option<Document>,
    pub editor: Editor,

    // Column widths for the grid, one per header
    pub column_widths: Vec<u16>,

    // Settings
    pub start_dir: PathBuf,
    pub auto_resize_columns: bool,
    pub max_column_width: u16,
}

const DEFAULT_COLUMN_WIDTH: u16 = 12;

impl App {
    pub fn new(start_dir: PathBuf) -> Self {
        Self {
            should_quit: false,
            mode: AppMode::Normal,
            focus: Focus::Grid,
            status: Status::new(
                StatusKind::Info,
                "Press o to open a CSV file, ? for help, q to quit",
            ),
            show_help: false,
            document: None,
            editor: Editor::default(),
            column_widths: Vec::new(),
            start_dir,
            auto_resize_columns: true,
            max_column_width: 40,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut app = Self::new(config.start_dir()?);
        app.auto_resize_columns = config.auto_resize_columns();
        app.max_column_width = config.max_column_width();
        Ok(app)
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Status::new(kind, text);
    }

    fn report(&mut self, err: &Error) {
        warn!(error = %err, "operation failed");
        self.set_status(StatusKind::Error, err.to_string());
    }

    pub fn table(&self) -> Option<&Table> {
        self.document.as_ref().map(|d| &d.table)
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.editor.selected_row()
    }

    pub fn row_count(&self) -> usize {
        self.table().map_or(0, Table::row_count)
    }

    /// Relative paths are taken from the start directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.start_dir.join(path)
        }
    }

    // ===== File operations =====

    /// Load `path`, replacing the open document. On failure the previous
    /// document stays open.
    pub fn open_path(&mut self, path: &Path) {
        let path = self.resolve(path);
        match codec::load_file(&path) {
            Ok((table, line_ending)) => {
                let doc = Document {
                    path,
                    table,
                    line_ending,
                };
                self.editor = Editor::default();
                self.editor.clear(&doc.table);
                self.focus = Focus::Grid;
                self.column_widths = self.initial_widths(&doc.table);
                self.set_status(
                    StatusKind::Info,
                    format!("Opened {} ({} rows)", doc.file_name(), doc.table.row_count()),
                );
                self.document = Some(doc);
            }
            Err(e) => self.report(&e),
        }
    }

    /// Write the document back to the file it was loaded from.
    pub fn save(&mut self) {
        let result = match &self.document {
            Some(doc) => codec::save_file(&doc.path, &doc.table, doc.line_ending),
            None => Err(Error::NoDocument),
        };
        match result {
            Ok(()) => self.set_status(StatusKind::Saved, "File saved."),
            Err(e) => self.report(&e),
        }
    }

    /// Write the document to another file. The document keeps its own path,
    /// so a later `save` still targets the file that was opened.
    pub fn save_as(&mut self, target: &str) {
        let target = target.trim();
        if target.is_empty() {
            self.set_status(StatusKind::Info, "Save cancelled");
            return;
        }
        let mut path = self.resolve(Path::new(target));
        if path.extension().is_none() {
            path.set_extension("csv");
        }
        let result = match &self.document {
            Some(doc) => codec::save_file(&path, &doc.table, doc.line_ending),
            None => Err(Error::NoDocument),
        };
        match result {
            Ok(()) => {
                info!(path = %path.display(), "saved copy");
                self.set_status(StatusKind::Saved, format!("File saved as {}.", path.display()));
            }
            Err(e) => self.report(&e),
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ===== Selection =====

    /// Mirror a row into the edit form. Any selection change clears the
    /// status line and drops uncommitted edits.
    pub fn select_row(&mut self, row: Option<usize>) {
        let Some(doc) = &self.document else {
            return;
        };
        match self.editor.on_select(&doc.table, row) {
            Ok(()) => {
                if row.is_none() {
                    self.focus = Focus::Grid;
                }
                self.set_status(StatusKind::Info, "");
            }
            Err(e) => self.report(&e),
        }
    }

    pub fn select_next(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        let next = match self.selected_row() {
            None => 0,
            Some(r) => (r + 1).min(count - 1),
        };
        if Some(next) != self.selected_row() {
            self.select_row(Some(next));
        }
    }

    pub fn select_prev(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        let prev = match self.selected_row() {
            None => count - 1,
            Some(r) => r.saturating_sub(1),
        };
        if Some(prev) != self.selected_row() {
            self.select_row(Some(prev));
        }
    }

    pub fn select_first(&mut self) {
        if self.row_count() > 0 {
            self.select_row(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        let count = self.row_count();
        if count > 0 {
            self.select_row(Some(count - 1));
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selected_row().is_some() {
            self.select_row(None);
        }
    }

    // ===== Edit form =====

    pub fn focus_form(&mut self) {
        if self.selected_row().is_some() {
            self.focus = Focus::Form;
        } else {
            self.set_status(StatusKind::Info, "Select a record to edit it");
        }
    }

    /// Leave the form, throwing away edits that were not committed.
    pub fn leave_form(&mut self) {
        if let Some(doc) = &self.document
            && let Err(e) = self.editor.revert(&doc.table)
        {
            self.report(&e);
        }
        self.focus = Focus::Grid;
    }

    /// Write the form into the selected row.
    pub fn commit_edits(&mut self) {
        let result = match self.document.as_mut() {
            Some(doc) => self.editor.commit(&mut doc.table),
            None => Err(Error::NoDocument),
        };
        match result {
            Ok(done) => {
                info!(row = done.row, changed = done.changed, "record updated");
                if self.auto_resize_columns
                    && let Some(doc) = &self.document
                {
                    self.column_widths = self.initial_widths(&doc.table);
                }
                let comma = self.editor.values().iter().any(|(_, v)| v.contains(','));
                if comma {
                    warn!(row = done.row, "committed value contains a comma");
                    self.set_status(
                        StatusKind::Updated,
                        "Record updated! (a comma will split that field when saved)",
                    );
                } else {
                    self.set_status(StatusKind::Updated, "Record updated!");
                }
            }
            Err(e) => self.report(&e),
        }
    }

    // ===== Column widths =====

    fn initial_widths(&self, table: &Table) -> Vec<u16> {
        (0..table.column_count())
            .map(|c| {
                if self.auto_resize_columns {
                    let w = table.column_width(c).unwrap_or(0);
                    (w.min(self.max_column_width as usize) as u16).max(1)
                } else {
                    DEFAULT_COLUMN_WIDTH
                }
            })
            .collect()
    }

    // ===== Prompts =====

    pub fn begin_prompt(&mut self, kind: PromptKind) {
        if kind == PromptKind::SaveAs && self.document.is_none() {
            self.report(&Error::NoDocument);
            return;
        }
        let candidates = list_csv_files(&self.start_dir);
        let input = match (&self.document, kind) {
            (Some(doc), PromptKind::SaveAs) => doc.file_name(),
            _ => String::new(),
        };
        self.mode = AppMode::Prompt(Prompt {
            kind,
            input,
            candidates,
            selected: None,
        });
    }

    pub fn prompt_mut(&mut self) -> Option<&mut Prompt> {
        match &mut self.mode {
            AppMode::Prompt(p) => Some(p),
            AppMode::Normal => None,
        }
    }

    pub fn cancel_prompt(&mut self) {
        if let AppMode::Prompt(p) = &self.mode {
            let what = match p.kind {
                PromptKind::Open => "Open cancelled",
                PromptKind::SaveAs => "Save cancelled",
            };
            self.set_status(StatusKind::Info, what);
        }
        self.mode = AppMode::Normal;
    }

    /// Run the prompt's action with the typed path, or with the highlighted
    /// candidate when nothing was typed.
    pub fn submit_prompt(&mut self) {
        let AppMode::Prompt(prompt) = std::mem::replace(&mut self.mode, AppMode::Normal) else {
            return;
        };
        let chosen = if prompt.input.trim().is_empty() {
            prompt
                .selected
                .and_then(|i| prompt.candidates.get(i))
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        } else {
            prompt.input.trim().to_string()
        };
        match prompt.kind {
            PromptKind::Open if chosen.is_empty() => {
                self.set_status(StatusKind::Info, "Open cancelled");
            }
            PromptKind::Open => self.open_path(Path::new(&chosen)),
            PromptKind::SaveAs => self.save_as(&chosen),
        }
    }
}

impl Prompt {
    pub fn push(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn select_next(&mut self) {
        if self.candidates.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            None => 0,
            Some(i) => (i + 1) % self.candidates.len(),
        });
    }

    pub fn select_prev(&mut self) {
        if self.candidates.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            None | Some(0) => self.candidates.len() - 1,
            Some(i) => i - 1,
        });
    }

    /// Copy the highlighted candidate's file name into the input.
    pub fn complete(&mut self) {
        if let Some(name) = self
            .selected
            .and_then(|i| self.candidates.get(i))
            .and_then(|p| p.file_name())
        {
            self.input = name.to_string_lossy().into_owned();
        }
    }
}

/// `*.csv` files directly inside `dir`, sorted by name.
pub fn list_csv_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        warn!(dir = %dir.display(), "cannot list directory");
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    files
}
