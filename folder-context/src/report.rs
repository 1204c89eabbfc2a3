//! Run summaries as printed by the one-shot commands.

use std::io::Write;

use anyhow::Result;
use folder_context_core::pipeline::{ClipboardStatus, RunOutcome, RunReport};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cli::RunArgs;

/// What one run produced, minus the document itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub context_id: u64,
    pub name: String,
    /// RFC 3339.
    pub timestamp: String,
    pub file_count: usize,
    pub files: Vec<String>,
    pub filters: String,
    pub bytes: usize,
    pub sha256: String,
    pub clipboard: ClipboardStatus,
}

impl RunSummary {
    pub fn from_report(report: &RunReport) -> Self {
        let context = &report.context;
        Self {
            context_id: context.id,
            name: context.name.clone(),
            timestamp: context.timestamp.to_rfc3339(),
            file_count: context.file_count,
            files: report.files.clone(),
            filters: context.filters.clone(),
            bytes: context.content.len(),
            sha256: content_digest(&context.content),
            clipboard: report.clipboard.clone(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut text = format!(
            "Context {} \"{}\": {} file(s), {} bytes, sha256 {}\n",
            self.context_id, self.name, self.file_count, self.bytes, self.sha256
        );
        if !self.filters.is_empty() {
            text.push_str(&format!("Filters: {}\n", self.filters));
        }
        for file in &self.files {
            text.push_str(&format!("  {file}\n"));
        }
        text.push_str(match &self.clipboard {
            ClipboardStatus::Copied => "Copied to clipboard\n",
            ClipboardStatus::Skipped => "Clipboard skipped\n",
            ClipboardStatus::Failed(_) => "Clipboard write failed\n",
        });
        text
    }
}

/// Hex SHA-256 of the document.
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Print a run outcome.
///
/// `out` gets the document with `--print`, otherwise the summary. The summary
/// moves to `err` when `out` carries the document; warnings always go to `err`.
pub fn emit_outcome(
    outcome: &RunOutcome,
    args: &RunArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    let report = match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::Empty => {
            writeln!(err, "No files to process")?;
            return Ok(());
        }
        RunOutcome::Busy => {
            writeln!(err, "A run is already in progress")?;
            return Ok(());
        }
    };

    let summary = RunSummary::from_report(report);
    let rendered = if args.json {
        format!("{}\n", serde_json::to_string_pretty(&summary)?)
    } else {
        summary.render_text()
    };

    if args.print {
        write!(out, "{}", report.context.content)?;
        if !report.context.content.is_empty() {
            writeln!(out)?;
        }
        write!(err, "{rendered}")?;
    } else {
        write!(out, "{rendered}")?;
    }

    if let ClipboardStatus::Failed(message) = &report.clipboard {
        writeln!(
            err,
            "warning: could not copy to clipboard ({message}); the document is still available"
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use folder_context_core::contract::Context;

    fn report(content: &str, clipboard: ClipboardStatus) -> RunReport {
        RunReport {
            context: Context {
                id: 7,
                name: "proj".to_string(),
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                file_count: 1,
                content: content.to_string(),
                filters: "md".to_string(),
            },
            files: vec!["proj/a.md".to_string()],
            clipboard,
        }
    }

    fn emit(outcome: &RunOutcome, args: &RunArgs) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        emit_outcome(outcome, args, &mut out, &mut err).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn digest_is_hex_sha256() {
        assert_eq!(
            content_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn print_sends_the_document_to_stdout() {
        let outcome = RunOutcome::Completed(report("// File: proj/a.md\n\nA", ClipboardStatus::Skipped));
        let args = RunArgs {
            print: true,
            ..RunArgs::default()
        };
        let (out, err) = emit(&outcome, &args);
        assert_eq!(out, "// File: proj/a.md\n\nA\n");
        assert!(err.contains("Context 7 \"proj\""));
        assert!(err.contains("Clipboard skipped"));
    }

    #[test]
    fn json_summary_has_the_digest_and_status() {
        let outcome = RunOutcome::Completed(report("x", ClipboardStatus::Copied));
        let args = RunArgs {
            json: true,
            ..RunArgs::default()
        };
        let (out, err) = emit(&outcome, &args);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["context_id"], 7);
        assert_eq!(value["file_count"], 1);
        assert_eq!(value["bytes"], 1);
        assert_eq!(value["sha256"], content_digest("x"));
        assert_eq!(value["clipboard"]["status"], "copied");
        assert_eq!(value["timestamp"], "2024-05-01T12:00:00+00:00");
        assert!(err.is_empty());
    }

    #[test]
    fn clipboard_failure_is_a_warning() {
        let outcome = RunOutcome::Completed(report(
            "x",
            ClipboardStatus::Failed("no display".to_string()),
        ));
        let (out, err) = emit(&outcome, &RunArgs::default());
        assert!(out.contains("Clipboard write failed"));
        assert!(err.contains("warning: could not copy to clipboard (no display)"));
    }

    #[test]
    fn empty_outcome_prints_nothing_on_stdout() {
        let (out, err) = emit(&RunOutcome::Empty, &RunArgs::default());
        assert!(out.is_empty());
        assert_eq!(err, "No files to process\n");
    }
}
