//! # contract: ports and shared data types for the folder-to-text pipeline
//!
//! The core never touches a real filesystem or clipboard directly. It talks to
//! the outside world through the traits in this module:
//!
//! - [`FileEntry`] / [`DirectoryEntry`] / [`DirectoryReader`]: the drop-style
//!   entry graph. A directory is listed by calling
//!   [`DirectoryReader::read_entries`] repeatedly until it returns an empty page.
//! - [`FileHandle`]: a resolved file whose text can be read once.
//! - [`Clipboard`]: where the assembled document is written at the end of a run.
//!
//! Implementations live in [`crate::local`] (tokio filesystem), in
//! `crate::memory` (hand-built trees for tests) and in the CLI crate (system
//! clipboard). `Clipboard` is annotated for `mockall` so tests can assert on
//! what was copied.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error type returned by port implementations (boxed, like any host error).
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// A node of the dropped entry graph: either a file or a directory.
#[derive(Clone)]
pub enum Entry {
    File(Arc<dyn FileEntry>),
    Directory(Arc<dyn DirectoryEntry>),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::File(f) => f.name(),
            Entry::Directory(d) => d.name(),
        }
    }

    pub fn full_path(&self) -> &str {
        match self {
            Entry::File(f) => f.full_path(),
            Entry::Directory(d) => d.full_path(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_file() { "File" } else { "Directory" };
        f.debug_struct(kind)
            .field("full_path", &self.full_path())
            .finish()
    }
}

/// A file node in the entry graph. Opening it yields a [`FileHandle`].
#[async_trait]
pub trait FileEntry: Send + Sync {
    fn name(&self) -> &str;

    /// Full path from the drop root, starting with `/` (e.g. `/proj/src/a.rs`).
    fn full_path(&self) -> &str;

    /// Open the file. Fails if the host can no longer resolve it.
    async fn file(&self) -> Result<Arc<dyn FileHandle>, PortError>;
}

/// A directory node in the entry graph.
pub trait DirectoryEntry: Send + Sync {
    fn name(&self) -> &str;

    fn full_path(&self) -> &str;

    /// Create a fresh paginated reader over the directory's children.
    fn create_reader(&self) -> Box<dyn DirectoryReader>;
}

/// Paginated directory listing.
///
/// A single call is not guaranteed to return every child: callers keep asking
/// until a call returns an empty page.
#[async_trait]
pub trait DirectoryReader: Send {
    async fn read_entries(&mut self) -> Result<Vec<Entry>, PortError>;
}

/// An opened file.
#[async_trait]
pub trait FileHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Read the full content as text.
    async fn text(&self) -> Result<String, PortError>;
}

/// Destination for the assembled document.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), PortError>;
}

/// A file handle paired with the relative path it was resolved under.
///
/// Built once when the walker (or the picker adapter) resolves a file and
/// never changed afterwards.
#[derive(Clone)]
pub struct ResolvedFile {
    handle: Arc<dyn FileHandle>,
    relative_path: String,
}

impl ResolvedFile {
    pub fn new(handle: Arc<dyn FileHandle>, relative_path: impl Into<String>) -> Self {
        Self {
            handle,
            relative_path: relative_path.into(),
        }
    }

    /// Resolve from an entry's full path, dropping the leading separator.
    pub fn from_full_path(handle: Arc<dyn FileHandle>, full_path: &str) -> Self {
        let relative = full_path.strip_prefix('/').unwrap_or(full_path);
        Self::new(handle, relative)
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn handle(&self) -> &Arc<dyn FileHandle> {
        &self.handle
    }
}

impl fmt::Debug for ResolvedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFile")
            .field("name", &self.name())
            .field("relative_path", &self.relative_path)
            .finish()
    }
}

/// One text file that survived classification and normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedFile {
    pub name: String,
    pub path: String,
    /// Normalised, never empty.
    pub content: String,
}

/// Record of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: u64,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub file_count: usize,
    pub content: String,
    pub filters: String,
}

/// Run-level failures. Any of these aborts the run without touching the store.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("could not read directory or open file '{path}': {source}")]
    Traversal {
        path: String,
        #[source]
        source: PortError,
    },

    #[error("could not read file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: PortError,
    },

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("context id {0} is already in the store")]
    DuplicateContext(u64),
}
