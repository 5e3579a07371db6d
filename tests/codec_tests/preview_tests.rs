//! Tests for list previews

use std::io::Cursor;

use clipstash::preview::{human_size, sniff_image, ImageInfo, Preview, ELLIPSIS};
use image::{ImageFormat, RgbaImage};

fn encode_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::<u8>::new());
    RgbaImage::new(width, height)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

// =============================================================================
// Text Preview Tests
// =============================================================================

#[test]
fn test_plain_text_unchanged() {
    assert_eq!(Preview::new(100).render(b"hello world"), "hello world");
}

#[test]
fn test_whitespace_collapsed() {
    let preview = Preview::new(100).render(b"  one\n\ntwo\t\tthree  \r\n");

    assert_eq!(preview, "one two three");
}

#[test]
fn test_truncation_adds_ellipsis() {
    let preview = Preview::new(4).render(b"abcdefgh");

    assert_eq!(preview, format!("abcd{}", ELLIPSIS));
}

#[test]
fn test_exact_width_not_truncated() {
    assert_eq!(Preview::new(4).render(b"abcd"), "abcd");
}

#[test]
fn test_truncation_at_word_boundary_drops_space() {
    assert_eq!(Preview::new(3).render(b"abc def"), format!("abc{}", ELLIPSIS));
    assert_eq!(Preview::new(4).render(b"abc def"), format!("abc{}", ELLIPSIS));
}

#[test]
fn test_truncation_counts_chars_not_bytes() {
    let preview = Preview::new(3).render("héllo".as_bytes());

    assert_eq!(preview, format!("hél{}", ELLIPSIS));
}

#[test]
fn test_zero_width_is_unlimited() {
    let text = "word ".repeat(100);

    assert_eq!(Preview::new(0).render(text.as_bytes()), text.trim_end());
}

#[test]
fn test_invalid_utf8_is_lossy() {
    let preview = Preview::new(100).render(&[b'o', b'k', 0xFF, b'!']);

    assert_eq!(preview, "ok\u{FFFD}!");
}

// =============================================================================
// Image Preview Tests
// =============================================================================

#[test]
fn test_png_preview() {
    let png = encode_image(20, 10, ImageFormat::Png);

    let preview = Preview::new(100).render(&png);

    assert_eq!(
        preview,
        format!("[[ binary data {} png 20x10 ]]", human_size(png.len()))
    );
}

#[test]
fn test_bmp_sniffed() {
    let bmp = encode_image(3, 7, ImageFormat::Bmp);

    assert_eq!(
        sniff_image(&bmp),
        Some(ImageInfo {
            format: "bmp",
            width: 3,
            height: 7,
        })
    );
}

#[test]
fn test_image_preview_ignores_width() {
    let png = encode_image(1, 1, ImageFormat::Png);

    assert!(Preview::new(5).render(&png).starts_with("[[ binary data"));
}

#[test]
fn test_truncated_image_header_is_text() {
    let png = encode_image(4, 4, ImageFormat::Png);

    // Magic bytes only; dimensions cannot be read
    assert_eq!(sniff_image(&png[..8]), None);
}

#[test]
fn test_text_is_not_image() {
    assert_eq!(sniff_image(b"just some text"), None);
}

// =============================================================================
// Size Formatting Tests
// =============================================================================

#[test]
fn test_human_size() {
    assert_eq!(human_size(0), "0 B");
    assert_eq!(human_size(1023), "1023 B");
    assert_eq!(human_size(1024), "1 KiB");
    assert_eq!(human_size(1536), "2 KiB");
    assert_eq!(human_size(5 * 1024 * 1024), "5 MiB");
    assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3072 MiB");
}
