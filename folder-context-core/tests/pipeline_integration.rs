use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use folder_context_core::config::{ClipboardPolicy, ProcessOptions};
use folder_context_core::contract::{FileHandle, MockClipboard, PipelineError, PortError, ResolvedFile};
use folder_context_core::memory::{picked, MemoryNode};
use folder_context_core::pipeline::{ClipboardStatus, RunOutcome, RunReport, Session};
use folder_context_core::store::ViewState;

/// Clipboard mock that records every write.
fn recording_clipboard() -> (MockClipboard, Arc<Mutex<Vec<String>>>) {
    let writes = Arc::new(Mutex::new(Vec::new()));
    let sink = writes.clone();
    let mut clipboard = MockClipboard::new();
    clipboard.expect_write_text().returning(move |text| {
        sink.lock().unwrap().push(text.to_string());
        Ok(())
    });
    (clipboard, writes)
}

fn completed(outcome: RunOutcome) -> RunReport {
    match outcome {
        RunOutcome::Completed(report) => report,
        other => panic!("expected a completed run, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dropped_folder_with_note_and_image() {
    let (clipboard, writes) = recording_clipboard();
    let session = Session::new(clipboard, ProcessOptions::default(), ClipboardPolicy::Enabled);

    let entries = vec![
        MemoryNode::file("notes.md", "Hello   \n\nWorld\n").into_entry(),
        MemoryNode::file("image.png", "\u{89}PNG\r\n\u{1a}\n").into_entry(),
    ];
    let report = completed(session.run_drop(entries).await.expect("run should succeed"));

    assert_eq!(report.files, vec!["notes.md".to_string()]);
    assert_eq!(report.context.file_count, 1);
    assert_eq!(report.context.content, "// File: notes.md\n\nHello\nWorld");
    assert_eq!(report.clipboard, ClipboardStatus::Copied);
    assert_eq!(writes.lock().unwrap().as_slice(), [report.context.content.clone()]);
    assert_eq!(session.contexts().len(), 1);
    assert_eq!(session.view(), ViewState::Viewing(report.context.id));
}

#[tokio::test]
async fn test_dropped_folder_names_the_context() {
    let (clipboard, _) = recording_clipboard();
    let session = Session::new(clipboard, ProcessOptions::default(), ClipboardPolicy::Enabled);
    let entry = MemoryNode::dir(
        "proj",
        vec![
            MemoryNode::file("b.rs", "fn b() {}"),
            MemoryNode::dir("docs", vec![MemoryNode::file("a.md", "# A")]),
        ],
    )
    .into_entry();

    let report = completed(session.run_drop(vec![entry]).await.unwrap());

    assert_eq!(report.context.name, "proj");
    assert_eq!(report.files, vec!["proj/b.rs".to_string(), "proj/docs/a.md".to_string()]);
    assert_eq!(
        report.context.content,
        "// File: proj/b.rs\n\nfn b() {}\n\n---\n\n// File: proj/docs/a.md\n\n# A"
    );
}

#[tokio::test]
async fn test_session_recursive_option_drives_the_walk() {
    let (clipboard, _) = recording_clipboard();
    let options = ProcessOptions {
        recursive: false,
        filters: String::new(),
    };
    let session = Session::new(clipboard, options, ClipboardPolicy::Enabled);
    let entry = MemoryNode::dir(
        "proj",
        vec![
            MemoryNode::file("top.md", "top"),
            MemoryNode::dir("nested", vec![MemoryNode::file("deep.md", "deep")]),
        ],
    )
    .into_entry();

    let report = completed(session.run_drop(vec![entry]).await.unwrap());
    assert_eq!(report.files, vec!["proj/top.md".to_string()]);
}

#[tokio::test]
async fn test_filters_apply_to_picked_files() {
    let (clipboard, _) = recording_clipboard();
    let session = Session::new(clipboard, ProcessOptions::default(), ClipboardPolicy::Enabled);
    session.set_filters("ts, md");

    let files = picked(&[
        ("app/main.ts", "export {}"),
        ("app/util.js", "module.exports = {}"),
        ("app/README.md", "# app"),
        ("app/Makefile", "all:"),
    ]);
    let report = completed(session.run_picked(files).await.unwrap());

    assert_eq!(report.files, vec!["app/main.ts".to_string(), "app/README.md".to_string()]);
    assert_eq!(report.context.filters, "ts, md");
    assert_eq!(report.context.name, "app");
}

#[tokio::test]
async fn test_same_input_twice_gives_new_ids_and_identical_content() {
    let (clipboard, _) = recording_clipboard();
    let session = Session::new(clipboard, ProcessOptions::default(), ClipboardPolicy::Enabled);
    let input = [("p/b.txt", "B"), ("p/a.txt", "A"), ("p/c.rs", "  fn c() {}  ")];

    let first = completed(session.run_picked(picked(&input)).await.unwrap());
    let mut reversed = input;
    reversed.reverse();
    let second = completed(session.run_picked(picked(&reversed)).await.unwrap());

    assert_ne!(first.context.id, second.context.id);
    assert!(second.context.id > first.context.id);
    assert_eq!(first.context.content.as_bytes(), second.context.content.as_bytes());
    let ids: Vec<u64> = session.contexts().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![second.context.id, first.context.id]);
}

#[tokio::test]
async fn test_deleting_active_context_returns_to_empty() {
    let (clipboard, _) = recording_clipboard();
    let session = Session::new(clipboard, ProcessOptions::default(), ClipboardPolicy::Enabled);
    let first = completed(session.run_picked(picked(&[("a.md", "a")])).await.unwrap());
    let second = completed(session.run_picked(picked(&[("b.md", "b")])).await.unwrap());

    // Deleting a context that is not being viewed leaves the view alone.
    assert!(session.delete(first.context.id).is_some());
    assert_eq!(session.view(), ViewState::Viewing(second.context.id));
    assert_eq!(session.active().map(|c| c.content), Some(second.context.content.clone()));

    assert!(session.delete(second.context.id).is_some());
    assert_eq!(session.view(), ViewState::Empty);
    assert!(session.active().is_none());
    assert!(session.contexts().is_empty());
    assert!(session.delete(second.context.id).is_none());
}

#[tokio::test]
async fn test_read_failure_stores_nothing() {
    let (clipboard, writes) = recording_clipboard();
    let session = Session::new(clipboard, ProcessOptions::default(), ClipboardPolicy::Enabled);
    let earlier = completed(session.run_picked(picked(&[("keep.md", "k")])).await.unwrap());

    let entry = MemoryNode::dir(
        "proj",
        vec![
            MemoryNode::file("ok.md", "fine"),
            MemoryNode::unreadable_file("broken.md"),
        ],
    )
    .into_entry();
    let err = session.run_drop(vec![entry]).await.unwrap_err();

    assert!(matches!(err, PipelineError::Read { ref path, .. } if path == "proj/broken.md"));
    assert!(err.to_string().contains("proj/broken.md"));
    assert_eq!(session.contexts().len(), 1);
    assert_eq!(session.view(), ViewState::Viewing(earlier.context.id));
    assert_eq!(writes.lock().unwrap().len(), 1);
    assert!(!session.is_busy());

    // The user can retry straight away.
    let retry = session
        .run_picked(picked(&[("proj/ok.md", "fine")]))
        .await
        .unwrap();
    assert!(matches!(retry, RunOutcome::Completed(_)));
}

#[tokio::test]
async fn test_traversal_failure_releases_busy_flag() {
    let (clipboard, _) = recording_clipboard();
    let session = Session::new(clipboard, ProcessOptions::default(), ClipboardPolicy::Enabled);
    let err = session
        .run_drop(vec![MemoryNode::broken_dir("locked").into_entry()])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Traversal { .. }));
    assert!(!session.is_busy());
    assert!(session.contexts().is_empty());
}

#[tokio::test]
async fn test_clipboard_failure_keeps_the_context() {
    let mut clipboard = MockClipboard::new();
    clipboard
        .expect_write_text()
        .returning(|_| Err::<(), PortError>("clipboard unavailable".into()));
    let session = Session::new(clipboard, ProcessOptions::default(), ClipboardPolicy::Enabled);

    let report = completed(session.run_picked(picked(&[("a.md", "a")])).await.unwrap());

    assert_eq!(
        report.clipboard,
        ClipboardStatus::Failed("clipboard unavailable".to_string())
    );
    assert_eq!(session.contexts().len(), 1);
    assert_eq!(session.view(), ViewState::Viewing(report.context.id));

    let err = session.copy_active().await.unwrap_err();
    assert!(matches!(err, PipelineError::Clipboard(_)));
}

/// A file whose read waits until the test opens the gate.
struct GatedFile {
    gate: Arc<Notify>,
}

#[async_trait]
impl FileHandle for GatedFile {
    fn name(&self) -> &str {
        "slow.md"
    }

    async fn text(&self) -> Result<String, PortError> {
        self.gate.notified().await;
        Ok("slow".to_string())
    }
}

#[tokio::test]
async fn test_second_run_while_busy_is_ignored() {
    let (clipboard, _) = recording_clipboard();
    let session = Session::new(clipboard, ProcessOptions::default(), ClipboardPolicy::Enabled);
    let gate = Arc::new(Notify::new());
    let slow: Arc<dyn FileHandle> = Arc::new(GatedFile { gate: gate.clone() });

    let (first, second, _) = tokio::join!(
        session.run_picked(vec![ResolvedFile::new(slow, "slow.md")]),
        session.run_picked(picked(&[("fast.md", "fast")])),
        async {
            tokio::task::yield_now().await;
            gate.notify_one();
        }
    );

    let first = completed(first.unwrap());
    assert_eq!(first.context.content, "// File: slow.md\n\nslow");
    assert_eq!(second.unwrap(), RunOutcome::Busy);
    assert_eq!(session.contexts().len(), 1);
    assert!(!session.is_busy());
}
