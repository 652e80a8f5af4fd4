//! Raster helpers for the synthetic slide images: PNG encoding, panel
//! composition and a fixed 8x8 bitmap font for labels burnt into pixels.

use crate::utils::error::Result;
use font8x8::legacy::BASIC_LEGACY;
use image::{imageops, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::io::Cursor;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

const GLYPH: u32 = 8;
/// Horizontal advance; the legacy glyphs leave their eighth column blank.
const ADVANCE: u32 = 7;

pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * ADVANCE * scale
}

pub fn line_height(scale: u32) -> u32 {
    (GLYPH + 2) * scale
}

/// Draws `text` with its top-left corner at (`x`, `y`). Non-ASCII characters
/// render as `?`; pixels outside the image are clipped.
pub fn draw_text(img: &mut RgbImage, x: i32, y: i32, text: &str, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1) as i32;
    let (width, height) = (img.width() as i32, img.height() as i32);

    for (index, ch) in text.chars().enumerate() {
        let code = if ch.is_ascii() { ch as usize } else { '?' as usize };
        let glyph = BASIC_LEGACY[code];
        let origin_x = x + index as i32 * ADVANCE as i32 * scale;

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH as i32 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = origin_x + col * scale + dx;
                        let py = y + row as i32 * scale + dy;
                        if px >= 0 && py >= 0 && px < width && py < height {
                            img.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}

pub fn draw_text_centered(img: &mut RgbImage, center_x: i32, y: i32, text: &str, scale: u32, color: Rgb<u8>) {
    let x = center_x - text_width(text, scale) as i32 / 2;
    draw_text(img, x, y, text, scale, color);
}

/// Draws lines top to bottom and returns the y below the last line.
pub fn draw_lines(img: &mut RgbImage, x: i32, y: i32, lines: &[String], scale: u32, color: Rgb<u8>) -> i32 {
    let step = line_height(scale) as i32;
    for (i, line) in lines.iter().enumerate() {
        draw_text(img, x, y + i as i32 * step, line, scale, color);
    }
    y + lines.len() as i32 * step
}

/// Rectangle outline `thickness` pixels wide, growing inwards.
pub fn draw_outline(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, thickness: u32, color: Rgb<u8>) {
    for t in 0..thickness {
        let (tw, th) = (w.saturating_sub(2 * t), h.saturating_sub(2 * t));
        if tw == 0 || th == 0 {
            break;
        }
        draw_hollow_rect_mut(img, Rect::at(x + t as i32, y + t as i32).of_size(tw, th), color);
    }
}

pub fn fill_rect(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, color: Rgb<u8>) {
    if w > 0 && h > 0 {
        draw_filled_rect_mut(img, Rect::at(x, y).of_size(w, h), color);
    }
}

/// Scales `src` to fit inside `max_w` x `max_h`, keeping the aspect ratio.
pub fn fit_within(src: &RgbImage, max_w: u32, max_h: u32) -> RgbImage {
    let ratio = f64::min(
        max_w as f64 / src.width() as f64,
        max_h as f64 / src.height() as f64,
    );
    let w = ((src.width() as f64 * ratio).round() as u32).max(1);
    let h = ((src.height() as f64 * ratio).round() as u32).max(1);
    imageops::resize(src, w, h, imageops::FilterType::Triangle)
}

/// Pastes `src` centred inside the box at (`x`, `y`) of size `w` x `h`.
pub fn paste_centered(dst: &mut RgbImage, src: &RgbImage, x: i32, y: i32, w: u32, h: u32) {
    let fitted = fit_within(src, w, h);
    let offset_x = x as i64 + (w as i64 - fitted.width() as i64) / 2;
    let offset_y = y as i64 + (h as i64 - fitted.height() as i64) / 2;
    imageops::overlay(dst, &fitted, offset_x, offset_y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_pixels_stay_inside_glyph_box() {
        let mut img = RgbImage::from_pixel(40, 20, WHITE);
        draw_text(&mut img, 2, 2, "A", 2, BLACK);

        let dark: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == BLACK)
            .map(|(x, y, _)| (x, y))
            .collect();

        assert!(!dark.is_empty());
        assert!(dark.iter().all(|(x, y)| *x >= 2 && *x < 18 && *y >= 2 && *y < 18));
    }

    #[test]
    fn test_text_is_clipped() {
        let mut img = RgbImage::from_pixel(10, 10, WHITE);
        draw_text(&mut img, -4, 6, "WSI", 3, BLACK);
        assert_eq!(text_width("WSI", 3), 63);
    }

    #[test]
    fn test_encode_png_signature() {
        let img = RgbImage::from_pixel(4, 4, Rgb([220, 200, 180]));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        let img = RgbImage::new(1024, 768);
        let fitted = fit_within(&img, 512, 512);
        assert_eq!((fitted.width(), fitted.height()), (512, 384));
    }
}
