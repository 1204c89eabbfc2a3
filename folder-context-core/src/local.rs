//! Entry ports over the local filesystem (`tokio::fs`).
//!
//! A path handed to [`local_entry`] behaves like a folder dropped into a
//! browser: its full path is `/<final component>`, so files below it get
//! relative paths such as `proj/src/main.rs`. Directory readers list the whole
//! directory once, sort it by name and hand it out in pages of `page_size`
//! entries followed by an empty page.

use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::contract::{
    DirectoryEntry, DirectoryReader, Entry, FileEntry, FileHandle, PortError, ResolvedFile,
};

/// Build a top-level entry for `path`.
pub async fn local_entry(path: &Path, page_size: usize) -> Result<Entry, PortError> {
    let canonical = tokio::fs::canonicalize(path).await.map_err(|e| -> PortError {
        format!("cannot resolve {}: {e}", path.display()).into()
    })?;
    let name = canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| canonical.display().to_string());
    let full_path = format!("/{name}");
    let metadata = tokio::fs::metadata(&canonical).await?;
    if metadata.is_dir() {
        Ok(directory_entry(canonical, name, full_path, page_size))
    } else {
        Ok(file_entry(canonical, name, full_path))
    }
}

/// Build top-level entries for several paths, failing on the first unresolvable one.
pub async fn local_entries(paths: &[PathBuf], page_size: usize) -> Result<Vec<Entry>, PortError> {
    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        entries.push(local_entry(path, page_size).await?);
    }
    Ok(entries)
}

/// Picker-style input: each path becomes a file with a relative path.
///
/// With a `base`, the relative path is the path below `base`; otherwise (or
/// when the path is not below `base`) it is the file name.
pub fn picked_files(paths: &[PathBuf], base: Option<&Path>) -> Vec<ResolvedFile> {
    paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let relative = base
                .and_then(|b| path.strip_prefix(b).ok())
                .map(slash_path)
                .unwrap_or_else(|| name.clone());
            let handle: Arc<dyn FileHandle> = Arc::new(LocalFile {
                path: path.clone(),
                name,
            });
            ResolvedFile::new(handle, relative)
        })
        .collect()
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn file_entry(path: PathBuf, name: String, full_path: String) -> Entry {
    Entry::File(Arc::new(LocalFileEntry {
        path,
        name,
        full_path,
    }))
}

fn directory_entry(path: PathBuf, name: String, full_path: String, page_size: usize) -> Entry {
    Entry::Directory(Arc::new(LocalDirectory {
        path,
        name,
        full_path,
        page_size: page_size.max(1),
    }))
}

/// A file on disk, read lossily as UTF-8.
#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn text(&self) -> Result<String, PortError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let decoded = String::from_utf8_lossy(&bytes);
        let text: &str = &decoded;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
    }
}

struct LocalFileEntry {
    path: PathBuf,
    name: String,
    full_path: String,
}

#[async_trait]
impl FileEntry for LocalFileEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    async fn file(&self) -> Result<Arc<dyn FileHandle>, PortError> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        if !metadata.is_file() {
            return Err(format!("{} is not a regular file", self.path.display()).into());
        }
        let handle: Arc<dyn FileHandle> = Arc::new(LocalFile {
            path: self.path.clone(),
            name: self.name.clone(),
        });
        Ok(handle)
    }
}

struct LocalDirectory {
    path: PathBuf,
    name: String,
    full_path: String,
    page_size: usize,
}

impl DirectoryEntry for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_path(&self) -> &str {
        &self.full_path
    }

    fn create_reader(&self) -> Box<dyn DirectoryReader> {
        Box::new(LocalDirectoryReader {
            path: self.path.clone(),
            full_path: self.full_path.clone(),
            page_size: self.page_size,
            pending: None,
        })
    }
}

struct LocalDirectoryReader {
    path: PathBuf,
    full_path: String,
    page_size: usize,
    pending: Option<VecDeque<Entry>>,
}

impl LocalDirectoryReader {
    async fn list(&self) -> Result<VecDeque<Entry>, PortError> {
        let mut children = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.path).await?;
        while let Some(child) = dir.next_entry().await? {
            let path = child.path();
            let name = child.file_name().to_string_lossy().into_owned();
            // Follows symlinks; dangling links and special files are skipped.
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let full_path = format!("{}/{}", self.full_path, name);
            if metadata.is_dir() {
                children.push((name.clone(), directory_entry(path, name, full_path, self.page_size)));
            } else if metadata.is_file() {
                children.push((name.clone(), file_entry(path, name, full_path)));
            } else {
                debug!(path = %path.display(), "Skipping special file");
            }
        }
        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children.into_iter().map(|(_, entry)| entry).collect())
    }
}

#[async_trait]
impl DirectoryReader for LocalDirectoryReader {
    async fn read_entries(&mut self) -> Result<Vec<Entry>, PortError> {
        if self.pending.is_none() {
            let listed = self.list().await?;
            debug!(path = %self.path.display(), entries = listed.len(), "Listed directory");
            self.pending = Some(listed);
        }
        let page_size = self.page_size;
        let page = match self.pending.as_mut() {
            Some(pending) => {
                let take = page_size.min(pending.len());
                pending.drain(..take).collect()
            }
            None => Vec::new(),
        };
        Ok(page)
    }
}
