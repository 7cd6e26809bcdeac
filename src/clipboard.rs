//! System clipboard access
//!
//! Used to copy the improved prompt out of the terminal.

use arboard::Clipboard;
use tracing::{error, info};

/// Copy text to the clipboard; returns whether it worked
pub(crate) fn copy_to_clipboard(text: &str) -> bool {
    if text.trim().is_empty() {
        info!("Nothing to copy (empty)");
        return false;
    }

    match Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_text(text) {
            Ok(_) => {
                info!("Copied to clipboard ({} chars)", text.len());
                true
            }
            Err(e) => {
                error!("Failed to copy to clipboard: {}", e);
                false
            }
        },
        Err(e) => {
            error!("Failed to initialize clipboard: {}", e);
            false
        }
    }
}
