pub mod app;
pub mod codec;
pub mod config;
pub mod editor;
pub mod error;
pub mod logging;
pub mod table;
pub mod ui;

pub use codec::{LineEnding, parse, serialize};
pub use editor::{Committed, Editor, EditorState};
pub use error::{Error, Result};
pub use table::Table;
