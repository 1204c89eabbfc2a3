//! # folder-context CLI interface
//!
//! Command parsing, config/flag merging and the async entrypoint for the
//! `folder-context` binary.
//!
//! All pipeline logic (walking, classification, normalisation, assembly and
//! the context history) lives in [`folder_context_core`]. This module is CLI
//! glue: it turns paths into entries, builds a [`Session`] and prints what a
//! run produced.
//!
//! ## How To Use
//! - Command-line users: run `folder-context --help`.
//! - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! ## Output streams
//! stdout carries the document when `--print` is given, otherwise the run
//! summary (plain text, or JSON with `--json`). Logs and warnings go to stderr.
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use folder_context_core::config::{ClipboardPolicy, Config};
use folder_context_core::local::{local_entries, picked_files};
use folder_context_core::pipeline::{RunOutcome, Session};
use tokio::io::BufReader;

use crate::clipboard::SystemClipboard;
use crate::load_config::load_config;
use crate::report::emit_outcome;
use crate::shell::Shell;

/// CLI for folder-context: turn a folder into one prompt-ready text document.
#[derive(Parser, Debug)]
#[clap(
    name = "folder-context",
    version,
    about = "Concatenate the text files of a folder into one annotated document and copy it to the clipboard"
)]
pub struct Cli {
    /// Path to a YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Flags shared by the one-shot commands.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// Extension filter, e.g. "rs-toml" or "js, ts"
    #[clap(long)]
    pub filters: Option<String>,

    /// Do not write the document to the clipboard
    #[clap(long)]
    pub no_clipboard: bool,

    /// Print the document to stdout
    #[clap(long)]
    pub print: bool,

    /// Also write the document to this file
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Print the run summary as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process folders and files the way a drag-and-drop would
    Drop {
        /// Folders or files to process
        #[clap(required = true)]
        paths: Vec<PathBuf>,

        /// Only take the files directly inside each folder
        #[clap(long)]
        no_recursive: bool,

        #[clap(flatten)]
        run: RunArgs,
    },
    /// Process an explicit list of files, like a file-picker selection
    Pick {
        /// Files to process
        #[clap(required = true)]
        files: Vec<PathBuf>,

        /// Paths in the document are shown relative to this directory
        #[clap(long)]
        base: Option<PathBuf>,

        #[clap(flatten)]
        run: RunArgs,
    },
    /// Interactive session reading commands from stdin, with a context history
    Session {
        /// Do not write documents to the clipboard
        #[clap(long)]
        no_clipboard: bool,
    },
}

/// Merge command-line flags over the file (or default) config.
pub fn apply_overrides(
    mut config: Config,
    filters: Option<&str>,
    no_recursive: bool,
    no_clipboard: bool,
) -> Config {
    if let Some(filters) = filters {
        config.process.filters = filters.to_string();
    }
    if no_recursive {
        config.process.recursive = false;
    }
    if no_clipboard {
        config.clipboard = ClipboardPolicy::Disabled;
    }
    config
}

fn new_session(config: &Config) -> Session<SystemClipboard> {
    Session::new(SystemClipboard, config.process.clone(), config.clipboard)
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Drop {
            paths,
            no_recursive,
            run,
        } => {
            let config = apply_overrides(
                config,
                run.filters.as_deref(),
                no_recursive,
                run.no_clipboard,
            );
            config.trace_loaded();
            tracing::info!(command = "drop", paths = paths.len(), "Processing dropped paths");
            let entries = local_entries(&paths, config.walk.page_size)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to open dropped paths: {e}"))?;
            let outcome = new_session(&config).run_drop(entries).await.map_err(|e| {
                tracing::error!(command = "drop", error = %e, "Run failed");
                e
            })?;
            finish(outcome, &run)
        }
        Commands::Pick { files, base, run } => {
            let config = apply_overrides(config, run.filters.as_deref(), false, run.no_clipboard);
            config.trace_loaded();
            tracing::info!(command = "pick", files = files.len(), "Processing picked files");
            let resolved = picked_files(&files, base.as_deref());
            let outcome = new_session(&config).run_picked(resolved).await.map_err(|e| {
                tracing::error!(command = "pick", error = %e, "Run failed");
                e
            })?;
            finish(outcome, &run)
        }
        Commands::Session { no_clipboard } => {
            let config = apply_overrides(config, None, false, no_clipboard);
            config.trace_loaded();
            tracing::info!(command = "session", "Starting interactive session");
            let shell = Shell::new(
                new_session(&config),
                config.walk.page_size,
                std::env::current_dir().ok(),
            );
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            shell.run(stdin, &mut stdout).await
        }
    }
}

fn finish(outcome: RunOutcome, args: &RunArgs) -> Result<()> {
    if let (RunOutcome::Completed(report), Some(path)) = (&outcome, &args.output) {
        std::fs::write(path, &report.context.content)
            .with_context(|| format!("Failed to write document to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Document written");
    }
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();
    emit_outcome(&outcome, args, &mut stdout, &mut stderr)?;
    stdout.flush()?;
    Ok(())
}
