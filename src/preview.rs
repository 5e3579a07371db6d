//! Preview rendering
//!
//! Turns a stored payload into the short, single-line text shown by `list`.
//! Images get a bracketed descriptor; everything else is treated as text.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

/// Ellipsis appended to truncated text previews
pub const ELLIPSIS: char = '…';

/// Basic facts about an image payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Renders payloads into previews no wider than `width` characters
#[derive(Debug, Clone, Copy)]
pub struct Preview {
    width: usize,
}

impl Preview {
    /// `width == 0` disables truncation
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn render(&self, payload: &[u8]) -> String {
        if let Some(info) = sniff_image(payload) {
            return format!(
                "[[ binary data {} {} {}x{} ]]",
                human_size(payload.len()),
                info.format,
                info.width,
                info.height
            );
        }
        collapse_text(payload, self.width)
    }
}

/// Recognize an image by its header and read its dimensions
///
/// Only the header is decoded; a payload whose magic bytes match but whose
/// header is malformed is not an image.
pub fn sniff_image(payload: &[u8]) -> Option<ImageInfo> {
    let reader = ImageReader::new(Cursor::new(payload))
        .with_guessed_format()
        .ok()?;
    let format = format_name(reader.format()?)?;
    let (width, height) = reader.into_dimensions().ok()?;

    Some(ImageInfo {
        format,
        width,
        height,
    })
}

fn format_name(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpeg"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::Bmp => Some("bmp"),
        ImageFormat::WebP => Some("webp"),
        _ => None,
    }
}

/// Size rounded to whole B, KiB or MiB
pub fn human_size(size: usize) -> String {
    const UNITS: [&str; 3] = ["B", "KiB", "MiB"];

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.0} {}", value, UNITS[unit])
}

/// Collapse whitespace runs to single spaces and cap at `width` chars
fn collapse_text(payload: &[u8], width: usize) -> String {
    let text = String::from_utf8_lossy(payload);
    let mut out = String::new();
    let mut chars = 0;

    for (i, word) in text.split_whitespace().enumerate() {
        if i > 0 {
            if width > 0 && chars == width {
                return truncated(out);
            }
            out.push(' ');
            chars += 1;
        }
        for c in word.chars() {
            if width > 0 && chars == width {
                return truncated(out);
            }
            out.push(c);
            chars += 1;
        }
    }
    out
}

fn truncated(mut out: String) -> String {
    out.truncate(out.trim_end().len());
    out.push(ELLIPSIS);
    out
}
