//! # Scroll Phase
//!
//! Horizontal position of a scrolling line. Content enters from the right edge
//! and repeats back to back. Wrapping is modular on the content width, so the
//! position never jumps when a pass completes.

/// Position and pass count of one scrolling row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollPhase {
    lead: Option<f64>,
    wraps: u64,
}

impl ScrollPhase {
    /// Phase at its initial position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the initial position.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Completed passes since the last reset.
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    /// Left edge of the current copy, `None` before the first advance.
    pub fn lead(&self) -> Option<f64> {
        self.lead
    }

    /// Moves the content `dx` pixels left. The first call places it at
    /// `panel_w`. Returns true when at least one pass completed.
    pub fn advance(&mut self, dx: f64, content_w: i32, panel_w: i32) -> bool {
        let mut lead = self.lead.unwrap_or(f64::from(panel_w)) - dx.max(0.0);
        let before = self.wraps;
        if content_w > 0 {
            let w = f64::from(content_w);
            if lead + w <= 0.0 {
                let passes = ((-lead) / w).floor();
                lead += passes * w;
                self.wraps += passes as u64;
            }
        }
        self.lead = Some(lead);
        self.wraps != before
    }

    /// X positions of every copy that intersects `[0, panel_w)`.
    pub fn copies(&self, content_w: i32, panel_w: i32) -> Vec<i32> {
        let Some(lead) = self.lead else {
            return Vec::new();
        };
        let mut x = lead.floor() as i32;
        let mut out = Vec::new();
        if content_w <= 0 {
            return out;
        }
        while x < panel_w {
            if x + content_w > 0 {
                out.push(x);
            }
            x += content_w;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enters_from_the_right_and_moves_continuously() {
        let mut p = ScrollPhase::new();
        assert!(!p.advance(0.0, 50, 100));
        assert_eq!(p.copies(50, 100), Vec::<i32>::new());
        p.advance(10.0, 50, 100);
        assert_eq!(p.copies(50, 100), vec![90]);
        p.advance(40.0, 50, 100);
        assert_eq!(p.copies(50, 100), vec![50]);
    }

    #[test]
    fn wrap_is_modular_not_a_reset() {
        let mut p = ScrollPhase::new();
        p.advance(145.0, 50, 100);
        assert_eq!(p.copies(50, 100), vec![-45, 5, 55]);
        // Crossing the left edge completes a pass without moving the content.
        assert!(p.advance(10.0, 50, 100));
        assert_eq!(p.copies(50, 100), vec![-5, 45, 95]);
        assert_eq!(p.wraps(), 1);
        // Large steps count every pass.
        p.advance(120.0, 50, 100);
        assert_eq!(p.wraps(), 3);
        assert_eq!(p.copies(50, 100)[0], -25);
    }

    #[test]
    fn reset_returns_to_the_right_edge() {
        let mut p = ScrollPhase::new();
        p.advance(300.0, 40, 100);
        p.reset();
        assert_eq!(p.wraps(), 0);
        p.advance(1.0, 40, 100);
        assert_eq!(p.copies(40, 100), vec![99]);
    }
}
