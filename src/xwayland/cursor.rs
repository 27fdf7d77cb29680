// SPDX-License-Identifier: GPL-3.0-only

//! Theme cursor loading for the X bridge.

use std::io::Read;

use tracing::warn;
use xcursor::CursorTheme;
use xcursor::parser::{Image, parse_xcursor};

use super::XCursorImage;

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("theme has no left_ptr cursor")]
    NoDefaultCursor,
    #[error("error opening xcursor file: {0}")]
    File(#[from] std::io::Error),
    #[error("failed to parse XCursor file")]
    Parse,
}

fn load_images(theme: &CursorTheme) -> Result<Vec<Image>, Error> {
    let icon_path = theme.load_icon("left_ptr").ok_or(Error::NoDefaultCursor)?;
    let mut cursor_file = std::fs::File::open(&icon_path)?;
    let mut cursor_data = Vec::new();
    cursor_file.read_to_end(&mut cursor_data)?;
    parse_xcursor(&cursor_data).ok_or(Error::Parse)
}

/// Load the default pointer from the configured theme, picking the frame
/// nearest the nominal size. Failure only costs the X cursor, so it is
/// logged and swallowed.
pub fn load_default_cursor(theme: Option<&str>, size: u32) -> Option<XCursorImage> {
    let theme = CursorTheme::load(theme.unwrap_or("default"));
    let images = match load_images(&theme) {
        Ok(images) => images,
        Err(err) => {
            warn!(?err, "Unable to load xcursor theme, X clients get no cursor");
            return None;
        }
    };
    let image = images
        .iter()
        .min_by_key(|image| u32::abs_diff(size, image.size))?;
    Some(XCursorImage {
        pixels: image.pixels_rgba.clone(),
        stride: image.width * 4,
        width: image.width,
        height: image.height,
        hotspot_x: image.xhot as i32,
        hotspot_y: image.yhot as i32,
    })
}
