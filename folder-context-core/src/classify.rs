//! Text-file eligibility and extension filters.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Extensions treated as text/code/config. Anything else, or no extension, is skipped.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "js", "jsx", "ts", "tsx", "py", "java", "c", "cpp", "cs", "h", "hpp", "html",
    "css", "scss", "json", "xml", "yml", "yaml", "sql", "sh", "bat", "php", "rb", "go", "rs",
    "swift", "kt", "scala", "r", "pl", "vue", "svelte", "dart", "elm", "clj", "hs", "lua", "nim",
    "zig", "toml", "ini", "env",
];

/// Lowercased text after the last `.` of `name`, if there is one.
pub fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

pub fn is_text_file(name: &str) -> bool {
    extension(name).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

fn separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[\s,\-]+").expect("separator pattern is valid"))
}

/// Parsed form of a free-text filter such as `"js-ts, md"`.
///
/// With no extensions it matches every name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    extensions: BTreeSet<String>,
}

impl FilterSpec {
    pub fn parse(filter: &str) -> Self {
        let cleaned = filter.trim().to_lowercase();
        let extensions = separators()
            .split(&cleaned)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .collect();
        Self { extensions }
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        extension(name).is_some_and(|ext| self.extensions.contains(&ext))
    }
}

pub fn matches_filter(name: &str, filter: &str) -> bool {
    FilterSpec::parse(filter).matches(name)
}
