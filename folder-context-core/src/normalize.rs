//! Whitespace normalisation for file content.

use std::sync::OnceLock;

use regex::Regex;

fn blank_runs() -> &'static Regex {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
    BLANK_RUNS.get_or_init(|| Regex::new(r"\n{2,}").expect("blank-run pattern is valid"))
}

/// Clean raw file content into its canonical form.
///
/// Trailing whitespace is stripped from every line (which also drops `\r`),
/// whitespace-only lines are removed, runs of newlines are capped at one blank
/// line and the whole result is trimmed. Leading indentation of every line but
/// the first is kept. An empty result means the file contributes nothing.
///
/// `clean_content(&clean_content(s)) == clean_content(s)` for every `s`.
pub fn clean_content(raw: &str) -> String {
    let joined = raw
        .split('\n')
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    blank_runs().replace_all(&joined, "\n\n").trim().to_string()
}
