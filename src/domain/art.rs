//! Ascii-art entities and the layer that holds them.
//!
//! An entity is a block of text pinned to a world position. Its grid is
//! parsed once from the source text into terminal columns; width and height
//! never change after construction, only the color does. A double-width
//! glyph takes two columns, the second one a continuation slot.
//!
//! The layer keeps entities in insertion order. Where two entities overlap,
//! the one created first is drawn.

use crate::domain::cell::{display_width, Cell, Coord, Rgb};

pub const EARTH_ID: &str = "earth";

pub const EARTH: &str = concat!(
    "             _____\n",
    "          .-'.  ':'-.\n",
    "        .''::: .:    '.\n",
    "       /   :::::'      \\\n",
    "      ;.    ':' `       ;\n",
    "      |       '..       |\n",
    "      ; '      ::::.    ;\n",
    "       \\       '::::   /\n",
    "        '.      :::  .'\n",
    "jgs        '-.___'_.-'",
);

/// One terminal column of an entity's grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Slot {
    Glyph(char),
    /// Right half of the double-width glyph to its left.
    Cont,
}

fn columns(line: &str) -> Vec<Slot> {
    let mut row = Vec::with_capacity(line.len());
    for ch in line.chars() {
        match display_width(ch) {
            0 => {}
            1 => row.push(Slot::Glyph(ch)),
            _ => row.extend([Slot::Glyph(ch), Slot::Cont]),
        }
    }
    row
}

/// Columns `text` takes on screen.
pub fn text_width(text: &str) -> usize {
    text.chars().map(display_width).sum()
}

#[derive(Clone, Debug, PartialEq)]
pub struct AsciiArt {
    pub id: String,
    pub position: Coord,
    pub color: Rgb,
    source: String,
    rows: Vec<Vec<Slot>>,
    width: usize,
}

impl AsciiArt {
    pub fn new(id: impl Into<String>, source: impl Into<String>, position: Coord, color: Rgb) -> Self {
        let source = source.into();
        let rows: Vec<Vec<Slot>> = source
            .split('\n')
            .map(|line| columns(line.trim_end_matches('\r')))
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        AsciiArt {
            id: id.into(),
            position,
            color,
            source,
            rows,
            width,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Offset of `pos` inside the bounding box, if any.
    fn local(&self, (x, y): Coord) -> Option<(usize, usize)> {
        let dx = x.checked_sub(self.position.0)?;
        let dy = y.checked_sub(self.position.1)?;
        if dx < 0 || dy < 0 {
            return None;
        }
        let (col, row) = (usize::try_from(dx).ok()?, usize::try_from(dy).ok()?);
        (col < self.width && row < self.height()).then_some((col, row))
    }

    /// Axis-aligned bounding box test.
    pub fn contains(&self, pos: Coord) -> bool {
        self.local(pos).is_some()
    }

    /// The colored character at `pos`. `None` outside the box and in the
    /// unpopulated tail of short lines. A populated space still counts, and
    /// so does the right half of a wide glyph, which reads as a space.
    pub fn glyph_at(&self, pos: Coord) -> Option<Cell> {
        let (col, row) = self.local(pos)?;
        self.rows[row].get(col).map(|slot| match *slot {
            Slot::Glyph(ch) => Cell::new(ch, self.color),
            Slot::Cont => Cell::new(' ', self.color),
        })
    }

    /// Bounding-box center in world coordinates.
    pub fn center(&self) -> Coord {
        (
            self.position.0 + (self.width / 2) as i64,
            self.position.1 + (self.height() / 2) as i64,
        )
    }
}

/// Wrap text in a rounded border with one column of padding. Lines are
/// padded to the widest line in terminal columns.
pub fn boxed_text(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let max = lines.iter().map(|l| text_width(l)).max().unwrap_or(0);
    let rule = "─".repeat(max + 2);

    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!("╭{rule}╮"));
    for line in lines {
        let pad = " ".repeat(max - text_width(line));
        out.push(format!("│ {line}{pad} │"));
    }
    out.push(format!("╰{rule}╯"));
    out.join("\n")
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityLayer {
    arts: Vec<AsciiArt>,
}

impl EntityLayer {
    pub fn new() -> Self {
        EntityLayer { arts: Vec::new() }
    }

    /// Add an entity. An existing entity with the same id is replaced in place,
    /// keeping its slot in the draw order.
    pub fn add(&mut self, art: AsciiArt) {
        match self.arts.iter_mut().find(|a| a.id == art.id) {
            Some(slot) => *slot = art,
            None => self.arts.push(art),
        }
    }

    #[allow(dead_code)]
    pub fn add_entity(&mut self, id: &str, source: &str, position: Coord, color: Rgb) {
        self.add(AsciiArt::new(id, source, position, color));
    }

    pub fn get(&self, id: &str) -> Option<&AsciiArt> {
        self.arts.iter().find(|a| a.id == id)
    }

    #[allow(dead_code)]
    pub fn is_within_bounds(&self, id: &str, pos: Coord) -> bool {
        self.get(id).is_some_and(|a| a.contains(pos))
    }

    /// First entity (in insertion order) whose bounding box holds `pos`.
    pub fn entity_at(&self, pos: Coord) -> Option<&AsciiArt> {
        self.arts.iter().find(|a| a.contains(pos))
    }

    pub fn glyph_at(&self, pos: Coord) -> Option<Cell> {
        self.arts.iter().find_map(|a| a.glyph_at(pos))
    }

    /// Returns false when no entity has this id.
    pub fn set_color(&mut self, id: &str, color: Rgb) -> bool {
        match self.arts.iter_mut().find(|a| a.id == id) {
            Some(art) => {
                art.color = color;
                true
            }
            None => false,
        }
    }

    /// Fresh `text_N` id not used by any entity.
    pub fn next_label_id(&self) -> String {
        let mut n = self.arts.len() + 1;
        loop {
            let id = format!("text_{n}");
            if self.get(&id).is_none() {
                return id;
            }
            n += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AsciiArt> {
        self.arts.iter()
    }

    pub fn len(&self) -> usize {
        self.arts.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.arts.is_empty()
    }
}

impl FromIterator<AsciiArt> for EntityLayer {
    fn from_iter<I: IntoIterator<Item = AsciiArt>>(iter: I) -> Self {
        let mut layer = EntityLayer::new();
        for art in iter {
            layer.add(art);
        }
        layer
    }
}
