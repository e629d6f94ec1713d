//! # Micro Font
//!
//! A 5x7 bitmap font sized for 8-pixel rows. Rows are stored as the low five
//! bits of a byte, bit 4 being the leftmost column. Lowercase letters without
//! their own glyph use the uppercase one; anything else draws the fallback box.

use super::frame::{Frame, Rgb};

/// Glyph width in pixels at scale 1.
pub const GLYPH_W: i32 = 5;
/// Glyph height in pixels at scale 1.
pub const GLYPH_H: i32 = 7;
/// Blank columns between glyphs at scale 1.
pub const SPACING: i32 = 1;

const FALLBACK: [u8; 7] = [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b00000, 0b00100];

static GLYPHS: &[(char, [u8; 7])] = &[
    ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('2', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
    ('3', [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    ('5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    ('6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
    ('A', [0b00100, 0b01010, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    ('D', [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
    ('E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
    ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110]),
    ('H', [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('J', [0b00001, 0b00001, 0b00001, 0b00001, 0b10001, 0b10001, 0b01110]),
    ('K', [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
    ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
    ('N', [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001]),
    ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('Q', [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
    ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b01010, 0b00100]),
    ('W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001]),
    ('X', [0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b01010, 0b10001]),
    ('Y', [0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('Z', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
    (' ', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    (':', [0b00000, 0b00100, 0b00100, 0b00000, 0b00100, 0b00100, 0b00000]),
    ('.', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00110]),
    (',', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00010]),
    ('-', [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
    ('+', [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000]),
    ('/', [0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000, 0b00000]),
    ('%', [0b11001, 0b11010, 0b00100, 0b01000, 0b00100, 0b01011, 0b10011]),
    ('$', [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100]),
    ('&', [0b01000, 0b10100, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101]),
    ('(', [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010]),
    (')', [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000]),
    ('>', [0b00000, 0b10000, 0b01000, 0b00100, 0b01000, 0b10000, 0b00000]),
    ('<', [0b00000, 0b00001, 0b00010, 0b00100, 0b00010, 0b00001, 0b00000]),
    ('=', [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000]),
    ('\'', [0b00100, 0b00100, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('*', [0b00100, 0b10101, 0b01110, 0b11111, 0b01110, 0b10101, 0b00100]),
    ('^', [0b00100, 0b01010, 0b10001, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('v', [0b00000, 0b00000, 0b00000, 0b10001, 0b01010, 0b01010, 0b00100]),
];

/// Bitmap for `ch`.
pub fn glyph(ch: char) -> [u8; 7] {
    let find = |c: char| GLYPHS.iter().find(|(g, _)| *g == c).map(|(_, rows)| *rows);
    find(ch).or_else(|| find(ch.to_ascii_uppercase())).unwrap_or(FALLBACK)
}

/// Replaces punctuation the font lacks with close equivalents.
pub fn sanitize(text: &str) -> String {
    text.replace(['\u{2013}', '\u{2014}'], "-")
        .replace('\u{2192}', ">")
        .replace('\u{2190}', "<")
        .replace('\u{2026}', "...")
}

/// Pixel width of `text` at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 {
        return 0;
    }
    (n * GLYPH_W + (n - 1) * SPACING) * scale
}

/// Pixel height of a line at `scale`.
pub fn text_height(scale: i32) -> i32 {
    GLYPH_H * scale
}

/// # Draw Text
///
/// Draws `text` with its top-left corner at `(x, y)`, each font pixel becoming a
/// `scale x scale` block. Returns the x just past the last glyph and its spacing.
/// Glyphs entirely outside the frame are skipped.
pub fn draw_text(frame: &mut Frame, x: i32, y: i32, text: &str, color: Rgb, scale: i32) -> i32 {
    let scale = scale.max(1);
    let advance = (GLYPH_W + SPACING) * scale;
    let mut cx = x;
    for ch in text.chars() {
        if cx + GLYPH_W * scale > 0 && cx < frame.width() as i32 {
            for (ry, bits) in glyph(ch).iter().enumerate() {
                for rx in 0..GLYPH_W {
                    if bits & (0b10000 >> rx) != 0 {
                        frame.fill_rect(cx + rx * scale, y + ry as i32 * scale, scale, scale, color);
                    }
                }
            }
        }
        cx += advance;
    }
    cx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_through_uppercase() {
        assert_eq!(glyph('a'), glyph('A'));
        assert_ne!(glyph('v'), glyph('V'));
        assert_eq!(glyph('~'), FALLBACK);
    }

    #[test]
    fn widths_include_inner_spacing_only() {
        assert_eq!(text_width("", 1), 0);
        assert_eq!(text_width("A", 1), 5);
        assert_eq!(text_width("12:00", 1), 29);
        assert_eq!(text_width("12:00", 2), 58);
    }

    #[test]
    fn draws_one_glyph_in_place() {
        let mut f = Frame::new(8, 8);
        let end = draw_text(&mut f, 0, 0, "1", Rgb::new(255, 0, 0), 1);
        assert_eq!(end, 6);
        // Second row of '1' is 01100.
        assert_eq!(f.lit_in(0, 1, 5, 1), 2);
        assert_eq!(f.lit_in(0, 7, 8, 1), 0);
        assert_eq!(sanitize("a\u{2014}b\u{2026}"), "a-b...");
    }
}
