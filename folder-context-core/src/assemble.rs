//! Turns resolved files into one ordered document and the [`Context`] that records it.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::classify::{is_text_file, FilterSpec};
use crate::contract::{Context, PipelineError, ProcessedFile, ResolvedFile};
use crate::normalize::clean_content;

/// Separator placed between file blocks.
pub const FILE_SEPARATOR: &str = "\n\n---\n\n";

/// The processed files of one run, sorted, plus their serialised document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub files: Vec<ProcessedFile>,
    pub document: String,
}

/// Classify, read and normalise every file, then sort and serialise the survivors.
pub async fn assemble(
    files: &[ResolvedFile],
    filter: &FilterSpec,
) -> Result<Assembly, PipelineError> {
    let mut processed = process_files(files, filter).await?;
    sort_files(&mut processed);
    let document = render_document(&processed);
    info!(
        input = files.len(),
        kept = processed.len(),
        bytes = document.len(),
        "Assembled document"
    );
    Ok(Assembly {
        files: processed,
        document,
    })
}

/// Read and clean the text-eligible, filter-matching files. Order follows the input.
pub async fn process_files(
    files: &[ResolvedFile],
    filter: &FilterSpec,
) -> Result<Vec<ProcessedFile>, PipelineError> {
    let mut processed = Vec::new();
    for file in files {
        let name = file.name();
        if !is_text_file(name) || !filter.matches(name) {
            debug!(path = file.relative_path(), "Skipping file");
            continue;
        }
        let raw = file.handle().text().await.map_err(|source| {
            error!(path = file.relative_path(), error = ?source, "Failed to read file");
            PipelineError::Read {
                path: file.relative_path().to_string(),
                source,
            }
        })?;
        let content = clean_content(&raw);
        if content.is_empty() {
            debug!(path = file.relative_path(), "File is empty after cleaning");
            continue;
        }
        let path = if file.relative_path().is_empty() {
            name.to_string()
        } else {
            file.relative_path().to_string()
        };
        processed.push(ProcessedFile {
            name: name.to_string(),
            path,
            content,
        });
    }
    Ok(processed)
}

/// Punctuation in root-collation order. Symbols not listed sort after these.
const PUNCTUATION_ORDER: &str = "_-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Primary collation weight of one character: group first, then rank within it.
///
/// Groups: whitespace, punctuation, other symbols, digits, letters. Letters
/// are weighted case-insensitively.
fn primary_weight(c: char) -> (u8, u32) {
    if c.is_whitespace() {
        (0, c as u32)
    } else if let Some(rank) = PUNCTUATION_ORDER.find(c) {
        (1, rank as u32)
    } else if c.is_ascii_digit() {
        (3, c as u32)
    } else if c.is_alphabetic() {
        let folded = c.to_lowercase().next().unwrap_or(c);
        (4, folded as u32)
    } else if c.is_numeric() {
        (3, c as u32)
    } else {
        (2, c as u32)
    }
}

/// Lowercase sorts before uppercase when the primary weights tie.
fn case_weight(c: char) -> u8 {
    u8::from(c.is_uppercase())
}

/// Root-locale style comparison of two paths.
///
/// Compares primary weights (punctuation < digits < letters, case ignored),
/// then case with lowercase first, then the raw text.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(primary_weight)
        .cmp(b.chars().map(primary_weight))
        .then_with(|| a.chars().map(case_weight).cmp(b.chars().map(case_weight)))
        .then_with(|| a.cmp(b))
}

pub fn sort_files(files: &mut [ProcessedFile]) {
    files.sort_by(|a, b| locale_cmp(&a.path, &b.path));
}

/// Serialise files in the given order as `// File: <path>` blocks.
pub fn render_document(files: &[ProcessedFile]) -> String {
    files
        .iter()
        .map(|file| format!("// File: {}\n\n{}", file.path, file.content))
        .collect::<Vec<_>>()
        .join(FILE_SEPARATOR)
}

/// First path segment of the first file, or `Context <n>` with `n = store_len + 1`.
pub fn context_name(files: &[ProcessedFile], store_len: usize) -> String {
    files
        .first()
        .and_then(|file| file.path.split('/').next())
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("Context {}", store_len + 1))
}

pub fn build_context(
    id: u64,
    assembly: &Assembly,
    filters: &str,
    store_len: usize,
    timestamp: DateTime<Utc>,
) -> Context {
    Context {
        id,
        name: context_name(&assembly.files, store_len),
        timestamp,
        file_count: assembly.files.len(),
        content: assembly.document.clone(),
        filters: filters.to_string(),
    }
}
