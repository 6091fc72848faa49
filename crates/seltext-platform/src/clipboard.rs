//! System clipboard port backed by `arboard`.

use arboard::ImageData;
use seltext_core::{Clipboard, ClipboardContents, ClipboardError, ClipboardImage};
use std::borrow::Cow;
use tracing::debug;

/// Opens a fresh `arboard` handle per call; handles are cheap and holding
/// one across threads is not supported everywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    pub fn new() -> Self {
        Self
    }

    fn open() -> Result<arboard::Clipboard, ClipboardError> {
        arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

/// `ContentNotAvailable` means "not in this format", not a failure.
fn present<T>(result: Result<T, arboard::Error>) -> Result<Option<T>, arboard::Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(arboard::Error::ContentNotAvailable) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Secondary formats are best effort; a failed read only loses that format.
fn secondary<T>(kind: &'static str, result: Result<T, arboard::Error>) -> Option<T> {
    present(result).unwrap_or_else(|e| {
        debug!(kind, error = %e, "Clipboard format unreadable");
        None
    })
}

impl Clipboard for ArboardClipboard {
    fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        present(Self::open()?.get_text())
            .map(|text| text.filter(|t| !t.is_empty()))
            .map_err(|e| ClipboardError::Read(e.to_string()))
    }

    fn save(&self) -> Result<ClipboardContents, ClipboardError> {
        let mut clipboard = Self::open()?;
        let text = present(clipboard.get_text())
            .map_err(|e| ClipboardError::Read(e.to_string()))?
            .filter(|t| !t.is_empty());
        let html = secondary("html", clipboard.get().html());
        let image = secondary("image", clipboard.get_image()).map(|image| ClipboardImage {
            width: image.width,
            height: image.height,
            bytes: image.bytes.into_owned(),
        });
        Ok(ClipboardContents { text, html, image })
    }

    fn restore(&self, contents: &ClipboardContents) -> Result<(), ClipboardError> {
        let mut clipboard = Self::open()?;
        // arboard writes one representation per call; html carries its text
        // as the plain-text alternative.
        let result = match contents {
            ClipboardContents {
                html: Some(html), text, ..
            } => clipboard.set_html(html.as_str(), text.as_deref()),
            ClipboardContents { text: Some(text), .. } => clipboard.set_text(text.as_str()),
            ClipboardContents {
                image: Some(image), ..
            } => clipboard.set_image(ImageData {
                width: image.width,
                height: image.height,
                bytes: Cow::Borrowed(&image.bytes),
            }),
            _ => clipboard.clear(),
        };
        if contents.image.is_some() && (contents.text.is_some() || contents.html.is_some()) {
            debug!("Clipboard image not restored alongside text");
        }
        result.map_err(|e| ClipboardError::Write(e.to_string()))
    }

    fn clear(&self) -> Result<(), ClipboardError> {
        Self::open()?
            .clear()
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}
