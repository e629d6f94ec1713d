//! # Text Lines
//!
//! A line is a run of coloured pieces laid out left to right with one font
//! spacing between pieces. Lines are rebuilt every frame from the decision, so
//! they carry no state of their own.

use super::font::{self, SPACING};
use super::frame::{Frame, Rgb};

/// Width of the status dot.
const DOT_W: i32 = 2;
/// Gap after the status dot.
const DOT_GAP: i32 = 3;

/// One piece of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Text in one colour.
    Text {
        /// Characters to draw.
        text: String,
        /// Colour.
        color: Rgb,
    },
    /// A 2x2 status dot.
    Dot {
        /// Colour.
        color: Rgb,
    },
}

impl Piece {
    fn width(&self, scale: i32) -> i32 {
        match self {
            Piece::Text { text, .. } => font::text_width(text, scale),
            Piece::Dot { .. } => DOT_W * scale,
        }
    }

    fn gap(&self, scale: i32) -> i32 {
        match self {
            Piece::Text { .. } => SPACING * scale,
            Piece::Dot { .. } => DOT_GAP * scale,
        }
    }
}

/// A line of pieces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pieces: Vec<Piece>,
}

impl Line {
    /// Empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-piece line.
    pub fn plain(text: impl Into<String>, color: Rgb) -> Self {
        let mut line = Self::new();
        line.push_text(text, color);
        line
    }

    /// Appends text. Empty text is ignored.
    pub fn push_text(&mut self, text: impl Into<String>, color: Rgb) -> &mut Self {
        let text = font::sanitize(&text.into());
        if !text.is_empty() {
            self.pieces.push(Piece::Text { text, color });
        }
        self
    }

    /// Appends a status dot.
    pub fn push_dot(&mut self, color: Rgb) -> &mut Self {
        self.pieces.push(Piece::Dot { color });
        self
    }

    /// Pieces in order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// True when nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Concatenated text, dots rendered as `*`.
    pub fn to_text(&self) -> String {
        self.pieces
            .iter()
            .map(|p| match p {
                Piece::Text { text, .. } => text.as_str(),
                Piece::Dot { .. } => "*",
            })
            .collect()
    }

    /// Colour of the first text piece containing `needle`.
    pub fn color_of(&self, needle: &str) -> Option<Rgb> {
        self.pieces.iter().find_map(|p| match p {
            Piece::Text { text, color } if text.contains(needle) => Some(*color),
            _ => None,
        })
    }

    /// Pixel width at `scale`, including the gap after every piece.
    pub fn width(&self, scale: i32) -> i32 {
        self.pieces.iter().map(|p| p.width(scale) + p.gap(scale)).sum()
    }

    /// Width without the gap after the last piece.
    pub fn visible_width(&self, scale: i32) -> i32 {
        let trailing = self.pieces.last().map_or(0, |p| p.gap(scale));
        (self.width(scale) - trailing).max(0)
    }

    /// Draws the line with its left edge at `x`, vertically centered in the row
    /// `[top, top + row_h)`. Returns the x past the line.
    pub fn draw(&self, frame: &mut Frame, x: i32, top: i32, row_h: i32, scale: i32) -> i32 {
        let y = top + ((row_h - font::text_height(scale)) / 2).max(0);
        let mut cx = x;
        for piece in &self.pieces {
            match piece {
                Piece::Text { text, color } => {
                    font::draw_text(frame, cx, y, text, *color, scale);
                }
                Piece::Dot { color } => {
                    let dy = y + font::text_height(scale) / 2 - scale;
                    frame.fill_rect(cx, dy, DOT_W * scale, DOT_W * scale, *color);
                }
            }
            cx += piece.width(scale) + piece.gap(scale);
        }
        cx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_accounts_for_pieces_and_gaps() {
        let mut line = Line::new();
        line.push_dot(Rgb::new(0, 255, 0)).push_text("AB", Rgb::new(1, 1, 1)).push_text("", Rgb::BLACK);
        assert_eq!(line.pieces().len(), 2);
        assert_eq!(line.width(1), 2 + 3 + 11 + 1);
        assert_eq!(line.to_text(), "*AB");
    }

    #[test]
    fn draw_centers_vertically() {
        let mut f = Frame::new(20, 16);
        Line::plain("-", Rgb::new(9, 9, 9)).draw(&mut f, 0, 8, 8, 1);
        // '-' is the middle row of the glyph: row 3 of a 7-row cell placed at y 8.
        assert_eq!(f.lit_in(0, 11, 5, 1), 5);
        assert_eq!(f.lit_in(0, 0, 20, 8), 0);
    }
}
