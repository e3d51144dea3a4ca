//! Viewport: a window into the world.
//!
//! `(x, y)` is the world coordinate of the top-left terminal cell.
//! `(width, height)` is the terminal grid size in cells.
//! Renderer maps: `screen(col, row) = world(x + col, y + row)`.
//! No clamping anywhere: the world has no edges.

use crate::domain::art::AsciiArt;
use crate::domain::cell::Coord;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Viewport {
    pub x: i64,
    pub y: i64,
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    #[allow(dead_code)]
    pub fn new(x: i64, y: i64, width: u16, height: u16) -> Self {
        Viewport { x, y, width, height }
    }

    /// Viewport of the given size with the origin in the middle.
    pub fn centered(width: u16, height: u16) -> Self {
        Viewport {
            x: -i64::from(width / 2),
            y: -i64::from(height / 2),
            width,
            height,
        }
    }

    pub fn origin(&self) -> Coord {
        (self.x, self.y)
    }

    pub fn set_origin(&mut self, (x, y): Coord) {
        self.x = x;
        self.y = y;
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Screen cell for a world coordinate, or None when it is off screen.
    #[allow(dead_code)]
    pub fn world_to_screen(&self, (wx, wy): Coord) -> Option<(u16, u16)> {
        let col = wx.checked_sub(self.x)?;
        let row = wy.checked_sub(self.y)?;
        if (0..i64::from(self.width)).contains(&col) && (0..i64::from(self.height)).contains(&row) {
            Some((col as u16, row as u16))
        } else {
            None
        }
    }

    pub fn screen_to_world(&self, col: u16, row: u16) -> Coord {
        (
            self.x.wrapping_add(i64::from(col)),
            self.y.wrapping_add(i64::from(row)),
        )
    }

    pub fn pan(&mut self, dx: i64, dy: i64) {
        self.x = self.x.wrapping_add(dx);
        self.y = self.y.wrapping_add(dy);
    }

    /// Change size, keep origin.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// Put the center of `art`'s bounding box at the center of the screen.
    pub fn center_on(&mut self, art: &AsciiArt) {
        let (cx, cy) = art.center();
        self.x = cx - i64::from(self.width / 2);
        self.y = cy - i64::from(self.height / 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Rgb;

    #[test]
    fn centered_on_origin() {
        let v = Viewport::centered(80, 24);
        assert_eq!(v.origin(), (-40, -12));
        assert_eq!(v.world_to_screen((0, 0)), Some((40, 12)));
    }

    #[test]
    fn transform_inverse() {
        for &(x, y) in &[(0, 0), (-40, -12), (1_000_000, -7), (i64::MIN / 2, i64::MAX / 2)] {
            let v = Viewport::new(x, y, 17, 9);
            for col in 0..17 {
                for row in 0..9 {
                    let w = v.screen_to_world(col, row);
                    assert_eq!(v.world_to_screen(w), Some((col, row)));
                }
            }
        }
    }

    #[test]
    fn off_screen_is_none() {
        let v = Viewport::new(10, 10, 5, 5);
        assert_eq!(v.world_to_screen((9, 10)), None);
        assert_eq!(v.world_to_screen((15, 10)), None);
        assert_eq!(v.world_to_screen((10, 15)), None);
        assert_eq!(v.world_to_screen((14, 14)), Some((4, 4)));
        assert_eq!(Viewport::new(0, 0, 0, 0).world_to_screen((0, 0)), None);
    }

    #[test]
    fn pan_and_resize() {
        let mut v = Viewport::new(0, 0, 80, 24);
        v.pan(-5, 3);
        assert_eq!(v.origin(), (-5, 3));
        v.resize(120, 40);
        assert_eq!(v.origin(), (-5, 3));
        assert_eq!((v.width, v.height), (120, 40));
    }

    #[test]
    fn center_on_entity() {
        let art = AsciiArt::new("a", "12345\n12345\n12345", (100, 50), Rgb::WHITE);
        let mut v = Viewport::new(0, 0, 20, 10);
        v.center_on(&art);
        assert_eq!(v.world_to_screen(art.center()), Some((10, 5)));
    }
}
