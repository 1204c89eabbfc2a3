//! High-level pipeline: one run from dropped entries (or picked files) to a stored context.
//!
//! A run walks the input, keeps the text files that match the active filter,
//! reads and cleans them, assembles the document, copies it to the clipboard
//! and records a [`Context`] in the session history.
//!
//! # Major Types
//! - [`Session`]: the state container a front end drives. It owns the
//!   [`ContextStore`], the [`ViewState`], the current [`ProcessOptions`] and
//!   the busy flag, and talks to the outside world through a [`Clipboard`].
//! - [`RunOutcome`] / [`RunReport`]: what a run produced.
//!
//! # Responsibilities
//! - Only one run at a time: a run started while another is in flight is
//!   ignored and reported as [`RunOutcome::Busy`]. The flag is released by a
//!   guard on every exit path.
//! - Zero input files is a no-op ([`RunOutcome::Empty`]), not an error.
//! - Traversal and read failures abort the run. Nothing is stored and the
//!   view is left as it was.
//! - The clipboard is best-effort: a failed write is logged and reported in
//!   [`RunReport::clipboard`], the context is still stored.
//!
//! Session state is only touched at the completion point of a run, never
//! across an await, so the lock is never contended by the run itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::assemble::{assemble, build_context};
use crate::classify::FilterSpec;
use crate::config::{ClipboardPolicy, ProcessOptions};
use crate::contract::{Clipboard, Context, Entry, PipelineError, ResolvedFile};
use crate::store::{ContextStore, ViewState};
use crate::walker::walk_entries;

/// Result of the clipboard write at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum ClipboardStatus {
    Copied,
    Skipped,
    Failed(String),
}

/// A completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub context: Context,
    /// Paths of the files that made it into the document, in document order.
    pub files: Vec<String>,
    pub clipboard: ClipboardStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// No input files. Nothing was stored.
    Empty,
    /// Another run was in flight. This trigger was ignored.
    Busy,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct SessionState {
    store: ContextStore,
    view: ViewState,
    options: ProcessOptions,
}

pub struct Session<C> {
    clipboard: C,
    policy: ClipboardPolicy,
    busy: AtomicBool,
    state: Mutex<SessionState>,
}

impl<C: Clipboard> Session<C> {
    pub fn new(clipboard: C, options: ProcessOptions, policy: ClipboardPolicy) -> Self {
        Self {
            clipboard,
            policy,
            busy: AtomicBool::new(false),
            state: Mutex::new(SessionState {
                options,
                ..SessionState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn options(&self) -> ProcessOptions {
        self.state().options.clone()
    }

    pub fn set_filters(&self, filters: impl Into<String>) {
        self.state().options.filters = filters.into();
    }

    pub fn set_recursive(&self, recursive: bool) {
        self.state().options.recursive = recursive;
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn view(&self) -> ViewState {
        self.state().view
    }

    /// The context currently being viewed.
    pub fn active(&self) -> Option<Context> {
        let state = self.state();
        let id = state.view.active_id()?;
        state.store.select(id).cloned()
    }

    /// Snapshot of the history, newest first.
    pub fn contexts(&self) -> Vec<Context> {
        self.state().store.iter().cloned().collect()
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        self.state().store.export_json()
    }

    /// Run the pipeline over dropped entries.
    pub async fn run_drop(&self, entries: Vec<Entry>) -> Result<RunOutcome, PipelineError> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            info!("Run already in progress, ignoring drop");
            return Ok(RunOutcome::Busy);
        };
        let options = self.options();
        let files = walk_entries(entries, options.recursive)
            .await
            .map_err(|e| {
                error!(error = %e, "Run failed during traversal");
                e
            })?;
        self.process(files, options).await
    }

    /// Run the pipeline over a flat picker selection. The walker is bypassed.
    pub async fn run_picked(&self, files: Vec<ResolvedFile>) -> Result<RunOutcome, PipelineError> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            info!("Run already in progress, ignoring selection");
            return Ok(RunOutcome::Busy);
        };
        let options = self.options();
        self.process(files, options).await
    }

    async fn process(
        &self,
        files: Vec<ResolvedFile>,
        options: ProcessOptions,
    ) -> Result<RunOutcome, PipelineError> {
        if files.is_empty() {
            info!("No input files, nothing to do");
            return Ok(RunOutcome::Empty);
        }
        info!(files = files.len(), filters = %options.filters, "Starting run");

        let filter = FilterSpec::parse(&options.filters);
        let assembly = assemble(&files, &filter).await.map_err(|e| {
            error!(error = %e, "Run failed while reading files");
            e
        })?;

        let clipboard = self.write_clipboard(&assembly.document).await;

        let context = {
            let mut state = self.state();
            let id = state.store.next_id();
            let store_len = state.store.len();
            let context = build_context(id, &assembly, &options.filters, store_len, Utc::now());
            state.store.create(context.clone())?;
            state.view = ViewState::Viewing(id);
            context
        };
        info!(
            context_id = context.id,
            name = %context.name,
            files = context.file_count,
            clipboard = ?clipboard,
            "Run completed"
        );

        Ok(RunOutcome::Completed(RunReport {
            context,
            files: assembly.files.into_iter().map(|f| f.path).collect(),
            clipboard,
        }))
    }

    async fn write_clipboard(&self, text: &str) -> ClipboardStatus {
        if self.policy == ClipboardPolicy::Disabled {
            return ClipboardStatus::Skipped;
        }
        match self.clipboard.write_text(text).await {
            Ok(()) => ClipboardStatus::Copied,
            Err(e) => {
                warn!(error = %e, "Clipboard write failed, document kept in history");
                ClipboardStatus::Failed(e.to_string())
            }
        }
    }

    /// View a stored context. Its filters become the session's filters.
    pub fn select(&self, id: u64) -> Option<Context> {
        let mut state = self.state();
        let context = state.store.select(id)?.clone();
        state.view = ViewState::Viewing(id);
        state.options.filters = context.filters.clone();
        Some(context)
    }

    /// Delete a context. Deleting the viewed one returns the session to the empty view.
    pub fn delete(&self, id: u64) -> Option<Context> {
        let mut state = self.state();
        let removed = state.store.delete(id)?;
        if state.view.on_deleted(id) {
            state.options.filters.clear();
        }
        Some(removed)
    }

    /// Back to the empty view with cleared filters.
    pub fn start_new(&self) {
        let mut state = self.state();
        state.view = ViewState::Empty;
        state.options.filters.clear();
    }

    /// Copy the viewed context's document again. `Ok(false)` when nothing is viewed.
    pub async fn copy_active(&self) -> Result<bool, PipelineError> {
        if self.is_busy() {
            return Ok(false);
        }
        let Some(context) = self.active() else {
            return Ok(false);
        };
        self.clipboard
            .write_text(&context.content)
            .await
            .map_err(|e| PipelineError::Clipboard(e.to_string()))?;
        Ok(true)
    }
}
