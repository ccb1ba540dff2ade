//! Font registration with iced's global font system.
//!
//! Labels are measured and drawn through the same font system, so fonts must
//! be registered before the first layout for widths to match what is drawn.

use std::borrow::Cow;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Font system lock poisoned")]
    Poisoned,
}

/// Registers font data with the global font system. Returns how many fonts
/// were handed over.
pub fn load_fonts(
    fonts: impl IntoIterator<Item = Cow<'static, [u8]>>,
) -> Result<usize, FontError> {
    let mut font_system = iced_wgpu::graphics::text::font_system()
        .write()
        .map_err(|_| FontError::Poisoned)?;
    let mut count = 0;
    for bytes in fonts {
        font_system.load_font(bytes);
        count += 1;
    }
    log::info!("load_fonts: registered {count} font(s)");
    Ok(count)
}

/// Reads every file first, so a bad path registers nothing.
pub fn load_font_files<P: AsRef<Path>>(paths: &[P]) -> Result<usize, FontError> {
    let mut fonts = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            log::error!("load_font_files: {}: {e}", path.display());
            e
        })?;
        fonts.push(Cow::Owned(bytes));
    }
    load_fonts(fonts)
}
