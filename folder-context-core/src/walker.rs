//! Asynchronous traversal of a dropped entry graph into a flat list of files.
//!
//! Every directory is listed page by page until the reader returns an empty
//! page. The children of a page are walked concurrently and joined before the
//! next page is requested, so one failing child fails the whole walk.
//!
//! In non-recursive mode the top-level entries are still walked, but a
//! directory only contributes the files of its first page: its subdirectories
//! are never opened and no further pages are requested.
//!
//! Output order follows completion of the concurrent reads, not listing order.
//! Callers sort afterwards.
//!
//! Fan-out is unbounded per page. A bounded pool could replace
//! `try_join_all` here without changing the result set.

use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::{debug, error, info};

use crate::contract::{DirectoryEntry, Entry, FileEntry, PipelineError, ResolvedFile};

/// Walk all top-level entries concurrently and flatten the result.
pub async fn walk_entries(
    entries: Vec<Entry>,
    recursive: bool,
) -> Result<Vec<ResolvedFile>, PipelineError> {
    info!(entries = entries.len(), recursive, "Walking dropped entries");
    let nested = try_join_all(entries.into_iter().map(|entry| walk_entry(entry, recursive))).await?;
    let files: Vec<ResolvedFile> = nested.into_iter().flatten().collect();
    info!(files = files.len(), "Walk completed");
    Ok(files)
}

/// Walk a single entry. Boxed because directories recurse into it.
pub fn walk_entry(
    entry: Entry,
    recursive: bool,
) -> BoxFuture<'static, Result<Vec<ResolvedFile>, PipelineError>> {
    async move {
        match entry {
            Entry::File(file) => resolve_file(file).await.map(|resolved| vec![resolved]),
            Entry::Directory(dir) => walk_directory(dir, recursive).await,
        }
    }
    .boxed()
}

async fn resolve_file(file: Arc<dyn FileEntry>) -> Result<ResolvedFile, PipelineError> {
    match file.file().await {
        Ok(handle) => {
            let resolved = ResolvedFile::from_full_path(handle, file.full_path());
            debug!(path = resolved.relative_path(), "Resolved file");
            Ok(resolved)
        }
        Err(source) => {
            error!(path = file.full_path(), error = ?source, "Failed to open file entry");
            Err(PipelineError::Traversal {
                path: file.full_path().to_string(),
                source,
            })
        }
    }
}

async fn walk_directory(
    dir: Arc<dyn DirectoryEntry>,
    recursive: bool,
) -> Result<Vec<ResolvedFile>, PipelineError> {
    let mut reader = dir.create_reader();
    let mut files = Vec::new();
    loop {
        let page = reader.read_entries().await.map_err(|source| {
            error!(path = dir.full_path(), error = ?source, "Failed to read directory page");
            PipelineError::Traversal {
                path: dir.full_path().to_string(),
                source,
            }
        })?;
        if page.is_empty() {
            break;
        }
        debug!(path = dir.full_path(), children = page.len(), "Read directory page");

        let children: Vec<Entry> = if recursive {
            page
        } else {
            page.into_iter().filter(Entry::is_file).collect()
        };
        let nested =
            try_join_all(children.into_iter().map(|child| walk_entry(child, recursive))).await?;
        files.extend(nested.into_iter().flatten());

        if !recursive {
            break;
        }
    }
    Ok(files)
}
