use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{backend::CrosstermBackend, prelude::*};

use csv_form::app::{App, AppMode, Focus, PromptKind};
use csv_form::config::Config;
use csv_form::{logging, ui};

#[derive(Parser, Debug)]
#[command(author, version, about = "Edit CSV records in a terminal form")]
struct Args {
    /// CSV file to open at startup
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Use a specific config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the resolved config path and exit
    #[arg(long)]
    print_config_path: bool,

    /// Print an example config file and exit
    #[arg(long)]
    print_example_config: bool,
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    if args.print_config_path {
        println!("{}", config_path.display());
        return Ok(());
    }
    if args.print_example_config {
        print!("{}", Config::example_config(&config_path));
        return Ok(());
    }

    let config = Config::load(&config_path).with_context(|| {
        format!(
            "load config {}; run `csv-form --print-example-config` for a template",
            config_path.display()
        )
    })?;
    logging::init(&config)?;

    let mut app = App::from_config(&config)?;
    if let Some(file) = &args.file {
        let cwd = env::current_dir().context("read current directory")?;
        app.open_path(&startup_path(file, &cwd));
    }

    let mut terminal = setup_terminal()?;
    let res = run_app(&mut terminal, &mut app);
    restore_terminal(terminal)?;
    if let Err(e) = res {
        tracing::error!(error = %e, "event loop failed");
        eprintln!("Error: {e:?}");
    }
    tracing::info!("exit");
    Ok(())
}

/// The FILE argument is relative to the shell's directory, not `ui.start_dir`.
fn startup_path(file: &Path, cwd: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        cwd.join(file)
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let poll_rate = Duration::from_millis(250);
    // Redraw only when state changes
    let mut dirty = true;
    loop {
        if dirty {
            terminal.draw(|f| ui::draw(f, app))?;
            dirty = false;
        }

        if event::poll(poll_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(app, key);
                    dirty = true;
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
            app.show_help = false;
        }
        return;
    }
    match app.mode {
        AppMode::Prompt(_) => handle_key_prompt(app, key),
        AppMode::Normal => match app.focus {
            Focus::Grid => handle_key_grid(app, key.code),
            Focus::Form => handle_key_form(app, key),
        },
    }
}

fn handle_key_grid(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        KeyCode::Esc => app.clear_selection(),
        KeyCode::Enter | KeyCode::Tab => app.focus_form(),
        KeyCode::Char('o') => app.begin_prompt(PromptKind::Open),
        KeyCode::Char('s') => app.save(),
        KeyCode::Char('S') => app.begin_prompt(PromptKind::SaveAs),
        KeyCode::Char('?') => app.show_help = true,
        _ => {}
    }
}

fn handle_key_form(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.commit_edits(),
        KeyCode::Esc => app.leave_form(),
        KeyCode::Tab => app.editor.focus_next(),
        KeyCode::BackTab => app.editor.focus_prev(),
        KeyCode::Backspace => app.editor.input_backspace(),
        KeyCode::Delete => app.editor.input_delete(),
        KeyCode::Left => app.editor.input_left(),
        KeyCode::Right => app.editor.input_right(),
        KeyCode::Home => app.editor.input_home(),
        KeyCode::End => app.editor.input_end(),
        KeyCode::Char(c) => {
            // ignore control chars in insert
            if !key.modifiers.contains(KeyModifiers::CONTROL) {
                app.editor.input_insert(c);
            }
        }
        _ => {}
    }
}

fn handle_key_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Esc => app.cancel_prompt(),
        _ => {
            let Some(prompt) = app.prompt_mut() else {
                return;
            };
            match key.code {
                KeyCode::Up => prompt.select_prev(),
                KeyCode::Down => prompt.select_next(),
                KeyCode::Tab => prompt.complete(),
                KeyCode::Backspace => prompt.backspace(),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    prompt.push(c)
                }
                _ => {}
            }
        }
    }
}
