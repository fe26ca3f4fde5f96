use crate::app::{App, AppMode, Focus, Prompt, PromptKind, StatusKind};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState},
};

const FORM_WIDTH: u16 = 44;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(2)].as_ref())
        .split(f.size());

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(FORM_WIDTH)].as_ref())
        .split(chunks[1]);

    draw_file_info(f, chunks[0], app);
    draw_grid(f, body_chunks[0], app);
    draw_form(f, body_chunks[1], app);
    draw_status(f, chunks[2], app);

    if let AppMode::Prompt(prompt) = &app.mode {
        draw_prompt(f, prompt);
    }
    if app.show_help {
        draw_help(f);
    }
}

fn draw_file_info(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let (file, rows) = match &app.document {
        Some(doc) => (doc.file_name(), doc.table.row_count().to_string()),
        None => ("-".to_string(), "-".to_string()),
    };
    let line = Line::from(vec![
        Span::styled("File: ", label),
        Span::raw(file),
        Span::raw("   "),
        Span::styled("Rows: ", label),
        Span::raw(rows),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_grid(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Records");
    let Some(doc) = &app.document else {
        let p = Paragraph::new("Press o to open a CSV file").block(block);
        f.render_widget(p, area);
        return;
    };
    let table = &doc.table;

    let widths: Vec<Constraint> = app
        .column_widths
        .iter()
        .map(|w| Constraint::Length(*w))
        .collect();
    let header = Row::new(table.headers().iter().map(|c| Cell::from(c.as_str()))).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let rows = table
        .rows()
        .iter()
        .map(|row| Row::new(row.iter().map(|v| Cell::from(v.as_str()))));

    let highlight = if app.focus == Focus::Grid {
        Style::default().bg(Color::Blue).fg(Color::Black)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    };
    let grid = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1)
        .highlight_style(highlight);

    let mut state = TableState::default();
    state.select(app.selected_row());
    f.render_stateful_widget(grid, area, &mut state);
}

fn draw_form(f: &mut Frame, area: Rect, app: &App) {
    let title = match (app.selected_row(), app.row_count()) {
        (Some(r), n) => format!("Record {} of {}", r + 1, n),
        (None, _) => "No record selected".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let fields = app.editor.fields();
    if fields.is_empty() || inner.height == 0 {
        return;
    }
    let label_w = fields
        .iter()
        .map(|fl| fl.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(inner.width as usize / 2);
    let visible = inner.height as usize;
    let focused = app.editor.focused();
    let offset = focused.saturating_sub(visible.saturating_sub(1));
    let editing = app.focus == Focus::Form && app.selected_row().is_some();
    let prefix = |label: &str| {
        let label: String = label.chars().take(label_w).collect();
        format!("{label:>label_w$}: ")
    };

    let lines: Vec<Line> = fields
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, fl)| {
            let value_style = if editing && i == focused {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(prefix(&fl.label), Style::default().fg(Color::Cyan)),
                Span::styled(fl.value.as_str(), value_style),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);

    if editing && let Some(fl) = fields.get(focused) {
        // display columns, so wide characters count twice
        let before = Span::raw(&fl.value[..fl.cursor]).width();
        let x = inner.x as usize + Span::raw(prefix(&fl.label)).width() + before;
        let y = inner.y as usize + focused - offset;
        let max_x = (inner.x + inner.width).saturating_sub(1) as usize;
        f.set_cursor(x.min(max_x) as u16, y as u16);
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let mode = match (&app.mode, app.focus) {
        (AppMode::Prompt(_), _) => "PROMPT",
        (AppMode::Normal, Focus::Form) => "EDIT",
        (AppMode::Normal, Focus::Grid) => "GRID",
    };
    let color = match app.status.kind {
        StatusKind::Info => Color::Reset,
        StatusKind::Updated => Color::Green,
        StatusKind::Saved => Color::Red,
        StatusKind::Error => Color::LightRed,
    };
    let text = Line::from(vec![
        Span::styled(
            format!("[{mode}] "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.status.text.as_str(), Style::default().fg(color)),
    ]);
    let p = Paragraph::new(text).block(Block::default().borders(Borders::TOP));
    f.render_widget(p, area);
}

fn draw_prompt(f: &mut Frame, prompt: &Prompt) {
    let area = centered_rect(60, 50, f.size());
    let title = match prompt.kind {
        PromptKind::Open => "Open CSV (Enter open, Tab complete, Esc cancel)",
        PromptKind::SaveAs => "Save As (Enter save, Tab complete, Esc cancel)",
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)].as_ref())
        .split(inner);

    let input = Line::from(vec![
        Span::styled("Path: ", Style::default().fg(Color::Cyan)),
        Span::raw(format!("{}_", prompt.input)),
    ]);
    f.render_widget(Paragraph::new(input), parts[0]);

    let items: Vec<ListItem> = prompt
        .candidates
        .iter()
        .map(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ListItem::new(name)
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::TOP).title("*.csv"))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Yellow),
        );
    let mut st = ListState::default();
    st.select(prompt.selected);
    f.render_stateful_widget(list, parts[1], &mut st);
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(50, 60, f.size());
    let lines = vec![
        Line::from("Grid"),
        Line::from("  Up/Down, j/k   select record"),
        Line::from("  Home/End       first/last record"),
        Line::from("  Enter, Tab     edit selected record"),
        Line::from("  Esc            clear selection"),
        Line::from("  o              open file"),
        Line::from("  s / S          save / save as"),
        Line::from("  q              exit"),
        Line::from(""),
        Line::from("Form"),
        Line::from("  Tab/Shift-Tab  next/previous field"),
        Line::from("  Enter          update record"),
        Line::from("  Esc            discard edits"),
    ];
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Keys (? to close)"),
    );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::draw;
    use crate::app::{App, PromptKind};
    use anyhow::Result;
    use ratatui::{
        Terminal,
        backend::{Backend, TestBackend},
    };

    fn render(app: &mut App) -> Result<String> {
        let mut terminal = Terminal::new(TestBackend::new(100, 20))?;
        terminal.draw(|f| draw(f, app))?;
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let text: Vec<String> = buffer
            .content
            .chunks(width)
            .map(|line| line.iter().map(|c| c.symbol()).collect())
            .collect();
        Ok(text.join("\n"))
    }

    #[test]
    fn empty_app_prompts_to_open() -> Result<()> {
        let mut app = App::new(std::env::temp_dir());
        let screen = render(&mut app)?;
        assert!(screen.contains("Press o to open a CSV file"));
        assert!(screen.contains("No record selected"));
        Ok(())
    }

    #[test]
    fn form_cursor_counts_wide_characters_twice() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("cities.csv"), "id,city\n1,東京\n2,ab\n")?;
        let mut app = App::new(dir.path().to_path_buf());
        app.open_path(std::path::Path::new("cities.csv"));
        let mut terminal = Terminal::new(TestBackend::new(100, 20))?;
        // the city field stays focused across selections
        app.editor.focus_next();

        let mut cursor_for = |app: &mut App, row: usize| -> Result<(u16, u16)> {
            app.select_row(Some(row));
            app.focus_form();
            terminal.draw(|f| draw(f, app))?;
            let pos = terminal.backend_mut().get_cursor()?;
            app.leave_form();
            Ok(pos)
        };
        let (wide_x, wide_y) = cursor_for(&mut app, 0)?;
        let (narrow_x, narrow_y) = cursor_for(&mut app, 1)?;

        assert_eq!(wide_y, narrow_y);
        // "東京" spans four columns, "ab" two
        assert_eq!(wide_x, narrow_x + 2);
        Ok(())
    }

    #[test]
    fn grid_and_form_show_selected_record() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("people.csv"), "name,age\nAlice,30\nBob,25\n")?;
        let mut app = App::new(dir.path().to_path_buf());
        app.open_path(std::path::Path::new("people.csv"));
        app.select_last();

        let screen = render(&mut app)?;
        assert!(screen.contains("File: people.csv"));
        assert!(screen.contains("Rows: 2"));
        assert!(screen.contains("Alice"));
        assert!(screen.contains("Record 2 of 2"));
        assert!(screen.contains("name: Bob"));
        Ok(())
    }

    #[test]
    fn open_prompt_lists_candidates() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("inventory.csv"), "sku\n1\n")?;
        let mut app = App::new(dir.path().to_path_buf());
        app.begin_prompt(PromptKind::Open);

        let screen = render(&mut app)?;
        assert!(screen.contains("Open CSV"));
        assert!(screen.contains("inventory.csv"));
        Ok(())
    }
}
