//! In-memory entry trees for tests.
//!
//! ```ignore
//! let root = MemoryNode::dir("proj", vec![
//!     MemoryNode::file("a.md", "# A"),
//!     MemoryNode::dir("src", vec![MemoryNode::file("lib.rs", "fn x() {}")]),
//! ])
//! .with_page_size(1);
//! let entry = root.into_entry();
//! ```
//!
//! Directories hand out children in pages of `page_size`, followed by an
//! empty page. Failures can be injected at open, read or listing time, and a
//! [`ListingCounter`] counts how many pages a directory was asked for.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::contract::{
    DirectoryEntry, DirectoryReader, Entry, FileEntry, FileHandle, PortError, ResolvedFile,
};

/// Counts `read_entries` calls on a directory.
#[derive(Debug, Clone, Default)]
pub struct ListingCounter(Arc<AtomicUsize>);

impl ListingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages_requested(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub enum MemoryNode {
    File {
        name: String,
        content: String,
        fail_open: bool,
        fail_read: bool,
    },
    Dir {
        name: String,
        children: Vec<MemoryNode>,
        page_size: usize,
        fail_listing: bool,
        counter: Option<ListingCounter>,
    },
}

impl MemoryNode {
    pub fn file(name: &str, content: &str) -> Self {
        MemoryNode::File {
            name: name.to_string(),
            content: content.to_string(),
            fail_open: false,
            fail_read: false,
        }
    }

    /// A file whose entry cannot be opened.
    pub fn unopenable_file(name: &str) -> Self {
        MemoryNode::File {
            name: name.to_string(),
            content: String::new(),
            fail_open: true,
            fail_read: false,
        }
    }

    /// A file that opens but whose content read fails.
    pub fn unreadable_file(name: &str) -> Self {
        MemoryNode::File {
            name: name.to_string(),
            content: String::new(),
            fail_open: false,
            fail_read: true,
        }
    }

    pub fn dir(name: &str, children: Vec<MemoryNode>) -> Self {
        MemoryNode::Dir {
            name: name.to_string(),
            children,
            page_size: 100,
            fail_listing: false,
            counter: None,
        }
    }

    /// A directory whose listing fails on the first page.
    pub fn broken_dir(name: &str) -> Self {
        MemoryNode::Dir {
            name: name.to_string(),
            children: Vec::new(),
            page_size: 100,
            fail_listing: true,
            counter: None,
        }
    }

    /// Page size for this directory only. Files are unaffected.
    pub fn with_page_size(mut self, size: usize) -> Self {
        if let MemoryNode::Dir { page_size, .. } = &mut self {
            *page_size = size.max(1);
        }
        self
    }

    pub fn with_counter(mut self, listing_counter: ListingCounter) -> Self {
        if let MemoryNode::Dir { counter, .. } = &mut self {
            *counter = Some(listing_counter);
        }
        self
    }

    fn name(&self) -> &str {
        match self {
            MemoryNode::File { name, .. } | MemoryNode::Dir { name, .. } => name,
        }
    }

    /// Turn this node into a top-level entry with full path `/<name>`.
    pub fn into_entry(self) -> Entry {
        let full_path = format!("/{}", self.name());
        self.into_entry_at(full_path)
    }

    fn into_entry_at(self, full_path: String) -> Entry {
        match self {
            MemoryNode::File {
                name,
                content,
                fail_open,
                fail_read,
            } => Entry::File(Arc::new(MemoryFileEntry {
                full_path,
                fail_open,
                file: Arc::new(MemoryFile {
                    name,
                    content,
                    fail_read,
                }),
            })),
            MemoryNode::Dir {
                name,
                children,
                page_size,
                fail_listing,
                counter,
            } => Entry::Directory(Arc::new(MemoryDirectory {
                name,
                full_path,
                children,
                page_size,
                fail_listing,
                counter,
            })),
        }
    }
}

/// Picker-style input: files with synthetic relative paths, no directories.
pub fn picked(files: &[(&str, &str)]) -> Vec<ResolvedFile> {
    files
        .iter()
        .map(|&(path, content)| {
            let name = path.rsplit('/').next().unwrap_or(path);
            let handle: Arc<dyn FileHandle> = Arc::new(MemoryFile {
                name: name.to_string(),
                content: content.to_string(),
                fail_read: false,
            });
            ResolvedFile::new(handle, path)
        })
        .collect()
}

#[derive(Debug)]
pub struct MemoryFile {
    name: String,
    content: String,
    fail_read: bool,
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn text(&self) -> Result<String, PortError> {
        if self.fail_read {
            return Err(format!("simulated read failure for {}", self.name).into());
        }
        Ok(self.content.clone())
    }
}

struct MemoryFileEntry {
    full_path: String,
    fail_open: bool,
    file: Arc<MemoryFile>,
}

#[async_trait]
impl FileEntry for MemoryFileEntry {
    fn name(&self) -> &str {
        &self.file.name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    async fn file(&self) -> Result<Arc<dyn FileHandle>, PortError> {
        if self.fail_open {
            return Err(format!("simulated open failure for {}", self.full_path).into());
        }
        let handle: Arc<dyn FileHandle> = self.file.clone();
        Ok(handle)
    }
}

struct MemoryDirectory {
    name: String,
    full_path: String,
    children: Vec<MemoryNode>,
    page_size: usize,
    fail_listing: bool,
    counter: Option<ListingCounter>,
}

impl DirectoryEntry for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    fn create_reader(&self) -> Box<dyn DirectoryReader> {
        let entries = self
            .children
            .iter()
            .cloned()
            .map(|child| {
                let path = format!("{}/{}", self.full_path, child.name());
                child.into_entry_at(path)
            })
            .collect();
        Box::new(MemoryReader {
            full_path: self.full_path.clone(),
            entries,
            page_size: self.page_size,
            fail_listing: self.fail_listing,
            counter: self.counter.clone(),
        })
    }
}

struct MemoryReader {
    full_path: String,
    entries: Vec<Entry>,
    page_size: usize,
    fail_listing: bool,
    counter: Option<ListingCounter>,
}

#[async_trait]
impl DirectoryReader for MemoryReader {
    async fn read_entries(&mut self) -> Result<Vec<Entry>, PortError> {
        if let Some(counter) = &self.counter {
            counter.0.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_listing {
            return Err(format!("simulated listing failure for {}", self.full_path).into());
        }
        let take = self.page_size.min(self.entries.len());
        Ok(self.entries.drain(..take).collect())
    }
}
