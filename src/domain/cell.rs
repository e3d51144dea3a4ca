//! Cells: the unit of content at a world coordinate.
//! Glyph + color only; where a cell came from (sentinel, generated,
//! override) is decided by the store, not recorded here.

use rand::Rng;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

/// World coordinate on the unbounded plane.
pub type Coord = (i64, i64);

pub const ORIGIN: Coord = (0, 0);

/// Star glyphs used by both the generator and left-click placement.
pub const STAR_GLYPHS: [char; 7] = ['✦', '✧', '⋆', '✫', '✬', '✯', '✡'];

/// Glyph drawn at the origin sentinel (double-width).
pub const ORIGIN_GLYPH: char = '⭐';

/// Terminal columns taken by `ch`: 0 for combining and control characters,
/// 2 for East Asian wide glyphs and most emoji.
pub fn display_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// 24-bit foreground color. Serialized as `[r, g, b]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const YELLOW: Rgb = Rgb(255, 215, 0);
    pub const CYAN: Rgb = Rgb(0, 205, 205);
    pub const WHITE: Rgb = Rgb(229, 229, 229);

    /// Random bright color: every channel in 100..=255, one of them pinned to 255.
    pub fn bright<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
        let mut ch = [
            rng.gen_range(100..=255u8),
            rng.gen_range(100..=255u8),
            rng.gen_range(100..=255u8),
        ];
        ch[rng.gen_range(0..3usize)] = 255;
        Rgb(ch[0], ch[1], ch[2])
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Cell {
    pub glyph: char,
    pub color: Option<Rgb>,
}

impl Cell {
    pub const BLANK: Cell = Cell { glyph: ' ', color: None };

    pub const SENTINEL: Cell = Cell {
        glyph: ORIGIN_GLYPH,
        color: Some(Rgb::YELLOW),
    };

    pub fn new(glyph: char, color: Rgb) -> Self {
        Cell { glyph, color: Some(color) }
    }

    pub fn is_blank(&self) -> bool {
        self.glyph == ' '
    }

    /// A random star with a random bright color.
    pub fn random_star<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let glyph = STAR_GLYPHS[rng.gen_range(0..STAR_GLYPHS.len())];
        Cell::new(glyph, Rgb::bright(rng))
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::BLANK
    }
}
