//! System clipboard adapter for the core's [`Clipboard`] port.

use async_trait::async_trait;
use folder_context_core::contract::{Clipboard, PortError};

/// Writes to the desktop clipboard through `cli-clipboard`.
///
/// The underlying call is blocking (X11/Wayland/macOS/Windows backends), so it
/// runs on tokio's blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), PortError> {
        let text = text.to_string();
        let bytes = text.len();
        tokio::task::spawn_blocking(move || {
            cli_clipboard::set_contents(text).map_err(|e| e.to_string())
        })
        .await??;
        tracing::debug!(bytes, "Copied document to clipboard");
        Ok(())
    }
}
