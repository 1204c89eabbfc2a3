//! Interactive session shell: the display layer over a [`Session`].
//!
//! Reads one command per line and answers on the given writer. Run failures
//! and unknown commands are reported and the shell keeps going; only I/O
//! errors on the streams end it early.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use folder_context_core::contract::{Clipboard, Context, PipelineError};
use folder_context_core::local::{local_entries, picked_files};
use folder_context_core::pipeline::{ClipboardStatus, RunOutcome, Session};
use folder_context_core::store::ViewState;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

const HELP: &str = "\
Commands:
  drop <path>...       process folders/files like a drag-and-drop
  pick <file>...       process an explicit list of files
  filters [text]       set the extension filter (no text clears it)
  recursive on|off     descend into subfolders or not
  status               show the current options and view
  list                 list saved contexts, newest first
  select <id>          view a saved context
  delete <id>          delete a saved context
  new                  back to the empty view, filters cleared
  show                 print the viewed context's document
  copy                 copy the viewed context's document again
  export               print all contexts as JSON
  help                 this text
  quit                 leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Drop(Vec<PathBuf>),
    Pick(Vec<PathBuf>),
    Filters(String),
    Recursive(bool),
    Status,
    List,
    Select(u64),
    Delete(u64),
    New,
    Show,
    Copy,
    Export,
    Help,
    Quit,
}

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let paths = || -> Result<Vec<PathBuf>, String> {
        if rest.is_empty() {
            return Err(format!("`{word}` needs at least one path"));
        }
        Ok(rest.split_whitespace().map(PathBuf::from).collect())
    };
    let id = || -> Result<u64, String> {
        rest.parse::<u64>()
            .map_err(|_| format!("`{word}` needs a numeric context id"))
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "drop" => Command::Drop(paths()?),
        "pick" => Command::Pick(paths()?),
        "filters" | "filter" => Command::Filters(rest.to_string()),
        "recursive" => match rest {
            "on" => Command::Recursive(true),
            "off" => Command::Recursive(false),
            _ => return Err("usage: recursive on|off".to_string()),
        },
        "status" => Command::Status,
        "list" | "ls" => Command::List,
        "select" => Command::Select(id()?),
        "delete" | "rm" => Command::Delete(id()?),
        "new" => Command::New,
        "show" => Command::Show,
        "copy" => Command::Copy,
        "export" => Command::Export,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command `{other}`, try `help`")),
    };
    Ok(Some(command))
}

pub struct Shell<C> {
    session: Session<C>,
    page_size: usize,
    /// Picked files are shown relative to this directory.
    base: Option<PathBuf>,
}

impl<C: Clipboard> Shell<C> {
    pub fn new(session: Session<C>, page_size: usize, base: Option<PathBuf>) -> Self {
        Self {
            session,
            page_size,
            base,
        }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Read commands until `quit` or end of input.
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "folder-context session. Type `help` for commands.")?;
        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };
            match parse_command(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    debug!(?command, "Session command");
                    self.execute(command, out).await?;
                }
                Err(message) => writeln!(out, "error: {message}")?,
            }
        }
        out.flush()?;
        Ok(())
    }

    pub async fn execute<W: Write>(&self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Drop(paths) => {
                let entries = match local_entries(&paths, self.page_size).await {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!(error = %e, "Could not open dropped paths");
                        writeln!(out, "error: {e}")?;
                        return Ok(());
                    }
                };
                let outcome = self.session.run_drop(entries).await;
                self.print_outcome(outcome, out)?;
            }
            Command::Pick(paths) => {
                let files = picked_files(&paths, self.base.as_deref());
                let outcome = self.session.run_picked(files).await;
                self.print_outcome(outcome, out)?;
            }
            Command::Filters(filters) => {
                if filters.is_empty() {
                    writeln!(out, "Filters cleared")?;
                } else {
                    writeln!(out, "Filters set to \"{filters}\"")?;
                }
                self.session.set_filters(filters);
            }
            Command::Recursive(recursive) => {
                self.session.set_recursive(recursive);
                writeln!(out, "Recursive {}", on_off(recursive))?;
            }
            Command::Status => {
                let options = self.session.options();
                writeln!(out, "recursive: {}", on_off(options.recursive))?;
                writeln!(out, "filters: \"{}\"", options.filters)?;
                match self.session.view() {
                    ViewState::Empty => writeln!(out, "viewing: nothing")?,
                    ViewState::Viewing(id) => writeln!(out, "viewing: context {id}")?,
                }
                writeln!(out, "saved contexts: {}", self.session.contexts().len())?;
            }
            Command::List => {
                let contexts = self.session.contexts();
                if contexts.is_empty() {
                    writeln!(out, "No contexts yet")?;
                }
                let active = self.session.view().active_id();
                for context in &contexts {
                    let marker = if Some(context.id) == active { '*' } else { ' ' };
                    writeln!(out, "{marker} {}", list_line(context))?;
                }
            }
            Command::Select(id) => match self.session.select(id) {
                Some(context) => writeln!(out, "Viewing {}", list_line(&context))?,
                None => writeln!(out, "No context with id {id}")?,
            },
            Command::Delete(id) => match self.session.delete(id) {
                Some(context) => {
                    writeln!(out, "Deleted context {} \"{}\"", context.id, context.name)?;
                    if self.session.view() == ViewState::Empty {
                        writeln!(out, "Nothing is being viewed")?;
                    }
                }
                None => writeln!(out, "No context with id {id}")?,
            },
            Command::New => {
                self.session.start_new();
                writeln!(out, "Ready for a new run")?;
            }
            Command::Show => match self.session.active() {
                Some(context) => writeln!(out, "{}", context.content)?,
                None => writeln!(out, "No context selected")?,
            },
            Command::Copy => match self.session.copy_active().await {
                Ok(true) => writeln!(out, "Copied to clipboard")?,
                Ok(false) => writeln!(out, "Nothing to copy")?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::Export => writeln!(out, "{}", self.session.export_json()?)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => {}
        }
        Ok(())
    }

    fn print_outcome<W: Write>(
        &self,
        outcome: Result<RunOutcome, PipelineError>,
        out: &mut W,
    ) -> Result<()> {
        match outcome {
            Ok(RunOutcome::Completed(report)) => {
                writeln!(
                    out,
                    "Created context {} \"{}\" with {} file(s)",
                    report.context.id, report.context.name, report.context.file_count
                )?;
                match report.clipboard {
                    ClipboardStatus::Copied => writeln!(out, "Copied to clipboard")?,
                    ClipboardStatus::Skipped => {}
                    ClipboardStatus::Failed(message) => writeln!(
                        out,
                        "warning: could not copy to clipboard ({message}); use `show` or `copy`"
                    )?,
                }
            }
            Ok(RunOutcome::Empty) => writeln!(out, "No files to process")?,
            Ok(RunOutcome::Busy) => writeln!(out, "A run is already in progress")?,
            Err(e) => writeln!(out, "error: {e}")?,
        }
        Ok(())
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn list_line(context: &Context) -> String {
    let mut line = format!(
        "{}  {}  {} file(s)  {}",
        context.id,
        context.name,
        context.file_count,
        context.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    if !context.filters.is_empty() {
        line.push_str(&format!("  [{}]", context.filters));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            parse_command("drop ./a  b").unwrap(),
            Some(Command::Drop(vec![PathBuf::from("./a"), PathBuf::from("b")]))
        );
        assert_eq!(
            parse_command("  filters js, ts-md ").unwrap(),
            Some(Command::Filters("js, ts-md".to_string()))
        );
        assert_eq!(parse_command("filters").unwrap(), Some(Command::Filters(String::new())));
        assert_eq!(parse_command("recursive off").unwrap(), Some(Command::Recursive(false)));
        assert_eq!(parse_command("SELECT 42").unwrap(), Some(Command::Select(42)));
        assert_eq!(parse_command("exit").unwrap(), Some(Command::Quit));
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("drop").is_err());
        assert!(parse_command("select abc").is_err());
        assert!(parse_command("recursive maybe").is_err());
        let err = parse_command("frobnicate").unwrap_err();
        assert!(err.contains("unknown command `frobnicate`"));
    }
}
