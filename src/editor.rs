//! Edit form bound to the grid selection.
//!
//! Selecting a row mirrors it into one text field per column; committing
//! writes the fields back into that row. Each field carries its column
//! index so the mapping never depends on field order.

use tracing::debug;

use crate::error::{Error, Result};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    NoSelection,
    Editing {
        row: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditField {
    pub column: usize,
    pub label: String,
    pub value: String,
    /// Byte offset into `value`, always on a char boundary.
    pub cursor: usize,
}

/// Result of a successful commit, shown by the shell as "updated".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    pub row: usize,
    pub changed: usize,
}

#[derive(Debug, Default)]
pub struct Editor {
    state: EditorState,
    fields: Vec<EditField>,
    focused: usize,
}

impl Editor {
    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn selected_row(&self) -> Option<usize> {
        match self.state {
            EditorState::NoSelection => None,
            EditorState::Editing { row } => Some(row),
        }
    }

    pub fn fields(&self) -> &[EditField] {
        &self.fields
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    /// Column index paired with the current text of its field.
    pub fn values(&self) -> Vec<(usize, &str)> {
        self.fields
            .iter()
            .map(|f| (f.column, f.value.as_str()))
            .collect()
    }

    /// Mirror `row` into the form, or clear the form when `None`.
    pub fn on_select(&mut self, table: &Table, row: Option<usize>) -> Result<()> {
        let Some(r) = row else {
            self.clear(table);
            return Ok(());
        };
        let fields = table.row(r)?;
        self.fields = table
            .headers()
            .iter()
            .zip(fields)
            .enumerate()
            .map(|(column, (label, value))| EditField {
                column,
                label: label.clone(),
                value: value.clone(),
                cursor: value.len(),
            })
            .collect();
        self.state = EditorState::Editing { row: r };
        self.focused = self.focused.min(self.fields.len().saturating_sub(1));
        debug!(state = ?self.state, "editor selection changed");
        Ok(())
    }

    /// Blank form labeled with `table`'s headers, no row selected.
    pub fn clear(&mut self, table: &Table) {
        self.fields = table
            .headers()
            .iter()
            .enumerate()
            .map(|(column, label)| EditField {
                column,
                label: label.clone(),
                value: String::new(),
                cursor: 0,
            })
            .collect();
        self.state = EditorState::NoSelection;
        self.focused = self.focused.min(self.fields.len().saturating_sub(1));
        debug!("editor cleared");
    }

    /// Drop uncommitted edits by re-reading the selected row.
    pub fn revert(&mut self, table: &Table) -> Result<()> {
        self.on_select(table, self.selected_row())
    }

    /// Write every field back into the selected row, column 0 first.
    pub fn commit(&self, table: &mut Table) -> Result<Committed> {
        let EditorState::Editing { row } = self.state else {
            return Err(Error::NoSelection);
        };
        table.row(row)?;

        let mut ordered: Vec<&EditField> = self.fields.iter().collect();
        ordered.sort_by_key(|f| f.column);
        for field in &ordered {
            table.header(field.column)?;
        }

        let mut changed = 0;
        for field in ordered {
            if table.get(row, field.column)? != field.value {
                changed += 1;
            }
            table.set(row, field.column, field.value.as_str())?;
        }
        debug!(row, changed, "committed edit form");
        Ok(Committed { row, changed })
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if self.fields.is_empty() {
            return;
        }
        if self.focused == 0 {
            self.focused = self.fields.len() - 1;
        } else {
            self.focused -= 1;
        }
    }

    fn field_mut(&mut self) -> Option<&mut EditField> {
        if self.state == EditorState::NoSelection {
            return None;
        }
        self.fields.get_mut(self.focused)
    }

    // Editing buffer ops on the focused field
    pub fn input_insert(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        if let Some(f) = self.field_mut() {
            f.value.insert(f.cursor, ch);
            f.cursor += ch.len_utf8();
        }
    }
    pub fn input_backspace(&mut self) {
        if let Some(f) = self.field_mut()
            && f.cursor > 0
        {
            let start = prev_boundary(&f.value, f.cursor);
            f.value.drain(start..f.cursor);
            f.cursor = start;
        }
    }
    pub fn input_delete(&mut self) {
        if let Some(f) = self.field_mut()
            && f.cursor < f.value.len()
        {
            let end = next_boundary(&f.value, f.cursor);
            f.value.drain(f.cursor..end);
        }
    }
    pub fn input_left(&mut self) {
        if let Some(f) = self.field_mut() {
            f.cursor = prev_boundary(&f.value, f.cursor);
        }
    }
    pub fn input_right(&mut self) {
        if let Some(f) = self.field_mut() {
            f.cursor = next_boundary(&f.value, f.cursor);
        }
    }
    pub fn input_home(&mut self) {
        if let Some(f) = self.field_mut() {
            f.cursor = 0;
        }
    }
    pub fn input_end(&mut self) {
        if let Some(f) = self.field_mut() {
            f.cursor = f.value.len();
        }
    }
}

fn prev_boundary(s: &str, idx: usize) -> usize {
    s[..idx].char_indices().next_back().map_or(0, |(i, _)| i)
}

fn next_boundary(s: &str, idx: usize) -> usize {
    s[idx..].chars().next().map_or(idx, |c| idx + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::{Committed, Editor, EditorState};
    use crate::codec::{parse, serialize};
    use crate::error::{Error, Result};
    use crate::table::Table;

    fn people() -> Result<Table> {
        parse("name,age,city\nAlice,30,Oslo\nBob,25,Rome\nCara,41,Lima\n")
    }

    fn type_text(editor: &mut Editor, text: &str) {
        for ch in text.chars() {
            editor.input_insert(ch);
        }
    }

    #[test]
    fn clear_blanks_the_form_and_drops_the_selection() -> Result<()> {
        let table = people()?;
        let mut editor = Editor::default();
        editor.on_select(&table, Some(2))?;
        editor.focus_prev();
        editor.clear(&table);

        assert_eq!(editor.state(), EditorState::NoSelection);
        assert_eq!(editor.values(), vec![(0, ""), (1, ""), (2, "")]);
        assert_eq!(editor.focused(), 2);
        let mut copy = table.clone();
        assert!(matches!(editor.commit(&mut copy), Err(Error::NoSelection)));
        assert_eq!(copy, table);
        Ok(())
    }

    #[test]
    fn selecting_a_row_mirrors_its_fields() -> Result<()> {
        let table = people()?;
        let mut editor = Editor::default();
        editor.on_select(&table, Some(1))?;

        assert_eq!(editor.state(), EditorState::Editing { row: 1 });
        assert_eq!(editor.values(), vec![(0, "Bob"), (1, "25"), (2, "Rome")]);
        let labels: Vec<&str> = editor.fields().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, ["name", "age", "city"]);
        Ok(())
    }

    #[test]
    fn clearing_selection_empties_every_value() -> Result<()> {
        let table = people()?;
        let mut editor = Editor::default();
        editor.on_select(&table, Some(0))?;
        editor.on_select(&table, None)?;

        assert_eq!(editor.state(), EditorState::NoSelection);
        assert_eq!(editor.fields().len(), 3);
        assert!(editor.values().iter().all(|(_, v)| v.is_empty()));
        Ok(())
    }

    #[test]
    fn typing_without_selection_does_nothing() -> Result<()> {
        let table = people()?;
        let mut editor = Editor::default();
        editor.on_select(&table, None)?;
        type_text(&mut editor, "abc");
        assert!(editor.values().iter().all(|(_, v)| v.is_empty()));
        Ok(())
    }

    #[test]
    fn selecting_past_the_end_is_an_index_error() -> Result<()> {
        let table = people()?;
        let mut editor = Editor::default();
        let err = editor
            .on_select(&table, Some(3))
            .expect_err("row 3 does not exist");
        assert!(matches!(err, Error::Index { what: "row", .. }));
        assert_eq!(editor.state(), EditorState::NoSelection);
        Ok(())
    }

    #[test]
    fn commit_writes_only_the_selected_row() -> Result<()> {
        let mut table = people()?;
        let before = table.clone();
        let mut editor = Editor::default();
        editor.on_select(&table, Some(1))?;
        editor.focus_next();
        editor.input_backspace();
        type_text(&mut editor, "6");

        let done = editor.commit(&mut table)?;
        assert_eq!(done, Committed { row: 1, changed: 1 });
        assert_eq!(table.row(1)?, ["Bob", "26", "Rome"]);
        assert_eq!(table.row(0)?, before.row(0)?);
        assert_eq!(table.row(2)?, before.row(2)?);
        // commit keeps the selection
        assert_eq!(editor.state(), EditorState::Editing { row: 1 });
        Ok(())
    }

    #[test]
    fn commit_without_selection_fails() -> Result<()> {
        let mut table = people()?;
        let editor = Editor::default();
        assert!(matches!(editor.commit(&mut table), Err(Error::NoSelection)));
        Ok(())
    }

    #[test]
    fn commit_checks_bounds_before_writing() -> Result<()> {
        let mut table = people()?;
        let mut editor = Editor::default();
        editor.on_select(&table, Some(0))?;
        type_text(&mut editor, "!");

        let narrower = parse("name\nAlice\n")?;
        let mut narrow_editor = Editor::default();
        narrow_editor.on_select(&table, Some(0))?;
        let mut target = narrower.clone();
        let err = narrow_editor
            .commit(&mut target)
            .expect_err("form is wider than the table");
        assert!(matches!(err, Error::Index { .. }));
        assert_eq!(target, narrower);

        editor.commit(&mut table)?;
        assert_eq!(table.get(0, 0)?, "Alice!");
        Ok(())
    }

    #[test]
    fn revert_discards_uncommitted_edits() -> Result<()> {
        let table = people()?;
        let mut editor = Editor::default();
        editor.on_select(&table, Some(2))?;
        type_text(&mut editor, "xyz");
        editor.revert(&table)?;
        assert_eq!(editor.values()[0], (0, "Cara"));
        Ok(())
    }

    #[test]
    fn cursor_moves_over_multibyte_chars() -> Result<()> {
        let table = parse("word\nnaïve\n")?;
        let mut editor = Editor::default();
        editor.on_select(&table, Some(0))?;

        editor.input_left();
        editor.input_left();
        editor.input_backspace();
        assert_eq!(editor.values()[0].1, "nave");
        editor.input_home();
        editor.input_delete();
        editor.input_end();
        editor.input_insert('é');
        editor.input_insert('\n');
        assert_eq!(editor.values()[0].1, "aveé");
        Ok(())
    }

    #[test]
    fn focus_wraps_in_both_directions() -> Result<()> {
        let table = people()?;
        let mut editor = Editor::default();
        editor.on_select(&table, Some(0))?;
        editor.focus_prev();
        assert_eq!(editor.focused(), 2);
        editor.focus_next();
        assert_eq!(editor.focused(), 0);
        Ok(())
    }

    #[test]
    fn example_edit_serializes_as_expected() -> Result<()> {
        let mut table = parse("name,age\nAlice,30\nBob,25\n")?;
        let mut editor = Editor::default();
        editor.on_select(&table, Some(1))?;
        editor.focus_next();
        editor.input_home();
        editor.input_delete();
        editor.input_delete();
        type_text(&mut editor, "26");
        editor.commit(&mut table)?;
        assert_eq!(serialize(&table), "name,age\nAlice,30\nBob,26\n");
        Ok(())
    }
}
