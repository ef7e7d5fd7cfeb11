//! Tiny 5x7 bitmap font to label the placeholder photos.
//!
//! Only the characters that appear in the labels are defined. Any other
//! character is rendered as a blank cell.

use image::{Rgb, RgbImage};

pub(crate) const GLYPH_WIDTH: u32 = 5;
pub(crate) const GLYPH_HEIGHT: u32 = 7;

/// Horizontal distance between the starts of two adjacent glyphs
pub(crate) const ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Each row is a bitmask where the most significant of the 5 bits is the
/// leftmost pixel.
type Glyph = [u8; GLYPH_HEIGHT as usize];

#[rustfmt::skip]
const GLYPHS: &[(char, Glyph)] = &[
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('a', [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111]),
    ('e', [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110]),
    ('h', [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001]),
    ('l', [0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('m', [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001]),
    ('o', [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('p', [0b00000, 0b00000, 0b11110, 0b10001, 0b11110, 0b10000, 0b10000]),
    ('t', [0b01000, 0b01000, 0b11100, 0b01000, 0b01000, 0b01001, 0b00110]),
];

fn glyph(ch: char) -> Option<&'static Glyph> {
    GLYPHS
        .iter()
        .find(|(glyph_ch, _)| *glyph_ch == ch)
        .map(|(_, glyph)| glyph)
}

/// Draws the text with its top left corner at `(x, y)`. Pixels that fall
/// outside of the image are clipped.
pub(crate) fn draw_text(image: &mut RgbImage, (x, y): (u32, u32), text: &str, color: Rgb<u8>) {
    let mut glyph_x = x;

    for ch in text.chars() {
        if let Some(glyph) = glyph(ch) {
            draw_glyph(image, (glyph_x, y), glyph, color);
        }
        glyph_x = glyph_x.saturating_add(ADVANCE);
    }
}

fn draw_glyph(image: &mut RgbImage, (x, y): (u32, u32), glyph: &Glyph, color: Rgb<u8>) {
    for (dy, row) in (0..).zip(glyph) {
        for dx in 0..GLYPH_WIDTH {
            let is_set = row & (1 << (GLYPH_WIDTH - 1 - dx)) != 0;
            let (px, py) = (x + dx, y + dy);

            if is_set && px < image.width() && py < image.height() {
                image.put_pixel(px, py, color);
            }
        }
    }
}

/// Number of pixels that [`draw_text`] paints for the given text if nothing
/// is clipped
#[cfg(test)]
pub(crate) fn count_set_pixels(text: &str) -> u32 {
    text.chars()
        .filter_map(glyph)
        .flatten()
        .map(|row| row.count_ones())
        .sum()
}
