//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Skip entirely unless the canvas is dirty (or the size changed)
//!   2. Compose the next frame into `front`: per visible cell,
//!      entity glyph > store cell (sentinel / override / generated)
//!   3. Compare each cell with `back` (previous frame)
//!   4. Only emit terminal commands for cells that changed,
//!      batched with `queue!` and flushed once
//!   5. Swap front/back

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::art::text_width;
use crate::domain::cell::{display_width, Cell, Coord, Rgb, ORIGIN};
use crate::sim::canvas::{Canvas, Mode, LABEL_PLACEHOLDER, LABEL_PROMPT};

const LEGEND: &str =
    "h = home ∙ e = earth ∙ s = save ∙ q = quit ∙ Mouse: left = star/cycle color, right = text, middle drag = move";

// ── ScreenCell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScreenCell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
    pub wide: bool, // occupies 2 terminal columns
    pub cont: bool, // right half of a wide char (never printed)
}

impl ScreenCell {
    /// Explicit background for every cell, so the canvas looks the same
    /// whatever the terminal's own default is.
    const BASE_BG: Color = Color::Rgb { r: 12, g: 12, b: 24 };

    const BLANK: ScreenCell = ScreenCell {
        ch: ' ',
        fg: Color::White,
        bg: ScreenCell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: ScreenCell = ScreenCell {
        ch: ' ',
        fg: Color::White,
        bg: ScreenCell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Differs from every real cell; forces a full repaint when diffed against.
    const INVALID: ScreenCell = ScreenCell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        ScreenCell { ch, fg, bg, ..Self::BLANK }
    }

    fn plain(ch: char, color: Option<Rgb>) -> Self {
        Self::new(ch, fg_of(color), Self::BASE_BG)
    }
}

fn fg_of(color: Option<Rgb>) -> Color {
    match color {
        Some(Rgb(r, g, b)) => Color::Rgb { r, g, b },
        None => Color::White,
    }
}

// ── FrameBuffer: a 2D grid of ScreenCells ──

pub struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<ScreenCell>,
}

impl FrameBuffer {
    pub fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![ScreenCell::BLANK; w * h],
        }
    }

    /// Returns true when the size actually changed.
    fn resize(&mut self, w: usize, h: usize) -> bool {
        if self.width == w && self.height == h {
            return false;
        }
        self.width = w;
        self.height = h;
        self.cells = vec![ScreenCell::BLANK; w * h];
        true
    }

    fn clear(&mut self) {
        self.cells.fill(ScreenCell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: ScreenCell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> ScreenCell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            ScreenCell::BLANK
        }
    }

    /// Write a string at (x, y), clipped at the edge. Wide chars take two
    /// columns; one that would straddle the edge is dropped.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            let w = display_width(ch);
            if w == 0 {
                continue;
            }
            if cx + w > self.width {
                break;
            }
            if w == 2 {
                self.set(cx, y, ScreenCell { wide: true, ..ScreenCell::new(ch, fg, bg) });
                self.set(cx + 1, y, ScreenCell { cont: true, ..ScreenCell::new(' ', fg, bg) });
            } else {
                self.set(cx, y, ScreenCell::new(ch, fg, bg));
            }
            cx += w;
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, ScreenCell::new(' ', Color::White, bg));
        }
    }

    /// Row `y` as plain text; continuation cells are skipped.
    #[cfg(test)]
    pub fn row_text(&self, y: usize) -> String {
        (0..self.width)
            .map(|x| self.get(x, y))
            .filter(|c| !c.cont)
            .map(|c| c.ch)
            .collect()
    }
}

// ── Compose ──

/// Build the frame for the canvas's current viewport into `buf`.
/// A zero-sized viewport yields an empty frame.
pub fn compose(canvas: &mut Canvas, buf: &mut FrameBuffer) {
    let vp = canvas.viewport;
    buf.resize(vp.width as usize, vp.height as usize);
    buf.clear();
    if vp.is_degenerate() {
        return;
    }

    for row in 0..vp.height {
        let mut col = 0u16;
        while col < vp.width {
            let pos = vp.screen_to_world(col, row);
            if compose_cell(canvas, buf, pos, col, row) {
                col = col.saturating_add(2);
            } else {
                col += 1;
            }
        }
    }

    compose_status(canvas, buf);
    if let Mode::AwaitingText(entry) = &canvas.mode {
        compose_prompt(buf, &entry.buffer, entry.error);
    }
}

/// Returns true when a wide cell was written (two columns consumed).
fn compose_cell(canvas: &mut Canvas, buf: &mut FrameBuffer, pos: Coord, col: u16, row: u16) -> bool {
    let (x, y) = (col as usize, row as usize);
    let right = (pos.0.wrapping_add(1), pos.1);

    if let Some(cell) = canvas.entities.glyph_at(pos) {
        // The right half is the entity's own continuation slot.
        if display_width(cell.glyph) == 2 {
            if x + 1 < buf.width {
                put_wide(buf, x, y, cell);
                return true;
            }
            buf.set(x, y, ScreenCell::plain(' ', cell.color));
            return false;
        }
        buf.set(x, y, ScreenCell::plain(cell.glyph, cell.color));
        return false;
    }

    let cell = canvas.store.get(pos);
    if pos == ORIGIN {
        // The sentinel only spreads over (1, 0) while nothing lives there.
        let room = x + 1 < buf.width
            && canvas.entities.glyph_at(right).is_none()
            && canvas.store.get(right).is_blank();
        if room {
            put_wide(buf, x, y, cell);
            return true;
        }
        buf.set(x, y, ScreenCell::plain('*', cell.color));
        return false;
    }

    buf.set(x, y, ScreenCell::plain(cell.glyph, cell.color));
    false
}

fn put_wide(buf: &mut FrameBuffer, x: usize, y: usize, cell: Cell) {
    buf.set(x, y, ScreenCell { wide: true, ..ScreenCell::plain(cell.glyph, cell.color) });
    buf.set(x + 1, y, ScreenCell::WIDE_CONT);
}

/// Bottom row: optional notice on the left, legend + coordinates on the right.
fn compose_status(canvas: &Canvas, buf: &mut FrameBuffer) {
    let y = buf.height - 1;
    let status = format!("{LEGEND} ∙ ({},{})", canvas.viewport.x, canvas.viewport.y);
    let len = status.chars().count();
    let x = buf.width.saturating_sub(len);

    // Keep the coordinates visible on narrow terminals.
    let shown: String = status.chars().skip(len.saturating_sub(buf.width)).collect();
    buf.put_str(x, y, &shown, Color::DarkGrey, ScreenCell::BASE_BG);

    if let Some(notice) = &canvas.notice {
        buf.put_str(0, y, notice, Color::Rgb { r: 255, g: 220, b: 50 }, ScreenCell::BASE_BG);
    }
}

/// Label prompt, drawn over the three rows above the status line.
fn compose_prompt(buf: &mut FrameBuffer, text: &str, error: Option<&str>) {
    let panel = Color::Rgb { r: 30, g: 30, b: 48 };
    let top = buf.height.saturating_sub(4);
    for y in top..buf.height.saturating_sub(1).max(top + 1) {
        buf.fill_row(y, panel);
    }

    buf.put_str(1, top, LABEL_PROMPT, Color::Rgb { r: 100, g: 200, b: 255 }, panel);

    let input_row = top + 1;
    buf.put_str(1, input_row, "› ", Color::Rgb { r: 100, g: 200, b: 255 }, panel);
    if text.is_empty() {
        buf.put_str(3, input_row, LABEL_PLACEHOLDER, Color::DarkGrey, panel);
    } else {
        // Tail of long input stays in view.
        let room = buf.width.saturating_sub(5);
        let mut shown = text;
        while text_width(shown) > room {
            let mut chars = shown.chars();
            chars.next();
            shown = chars.as_str();
        }
        buf.put_str(3, input_row, shown, Color::White, panel);
        buf.put_str(3 + text_width(shown), input_row, "▏", Color::White, panel);
    }

    match error {
        Some(err) => buf.put_str(1, top + 2, &format!("⚠ {err}"), Color::Rgb { r: 255, g: 90, b: 90 }, panel),
        None => buf.put_str(1, top + 2, "Enter to place ∙ Esc to cancel", Color::DarkGrey, panel),
    }
}

// ── Renderer ──

pub struct Renderer<W: Write> {
    writer: BufWriter<W>,
    front: FrameBuffer,
    back: FrameBuffer,
}

impl Renderer<io::Stdout> {
    pub fn stdout() -> Self {
        Renderer::new(io::stdout())
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, out),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
        }
    }

    /// Raw mode, alternate screen, mouse reporting on.
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            SetBackgroundColor(ScreenCell::BASE_BG),
            Clear(ClearType::All)
        )
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            DisableMouseCapture,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Draw the canvas if it changed. Returns whether anything was drawn.
    pub fn render(&mut self, canvas: &mut Canvas) -> io::Result<bool> {
        let (w, h) = (canvas.viewport.width as usize, canvas.viewport.height as usize);
        let resized = self.back.resize(w, h);
        if resized {
            // Force full repaint after resize.
            self.back.cells.fill(ScreenCell::INVALID);
            queue!(self.writer, SetBackgroundColor(ScreenCell::BASE_BG), Clear(ClearType::All))?;
        }
        if !canvas.dirty && !resized {
            return Ok(false);
        }

        compose(canvas, &mut self.front);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        canvas.dirty = false;
        Ok(true)
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = ScreenCell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(
            self.writer,
            MoveTo(0, 0),
            SetForegroundColor(last_fg),
            SetBackgroundColor(last_bg),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev {
                        need_move = true;
                    }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        self.writer.get_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::{Cell, STAR_GLYPHS};
    use crate::sim::canvas::CanvasSettings;
    use crate::sim::event::{CanvasEvent, MouseButton, MouseKind, TextKey};

    fn canvas(w: u16, h: u16) -> Canvas {
        Canvas::new(w, h, CanvasSettings::default()).with_seed(9)
    }

    fn frame(c: &mut Canvas) -> FrameBuffer {
        let mut buf = FrameBuffer::new(0, 0);
        compose(c, &mut buf);
        buf
    }

    #[test]
    fn clicked_star_shows_at_screen_origin() {
        let mut c = canvas(80, 24);
        c.handle(CanvasEvent::mouse(MouseKind::Press, MouseButton::Left, 0, 0));
        let placed = *c.store.override_at((-40, -12)).unwrap();
        let buf = frame(&mut c);
        let shown = buf.get(0, 0);
        assert_eq!(shown.ch, placed.glyph);
        assert!(STAR_GLYPHS.contains(&shown.ch));
        assert_eq!(shown.fg, fg_of(placed.color));
    }

    /// Terminal cells printed in `bytes`, CSI sequences stripped.
    fn printed_cells(bytes: &[u8]) -> usize {
        let text = String::from_utf8_lossy(bytes);
        let mut chars = text.chars();
        let mut n = 0;
        while let Some(ch) = chars.next() {
            if ch == '\x1b' {
                chars.next();
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            } else {
                n += 1;
            }
        }
        n
    }

    #[test]
    fn origin_is_a_wide_sentinel() {
        let mut c = canvas(80, 24);
        c.store.set((1, 0), Cell::BLANK);
        let buf = frame(&mut c);
        let cell = buf.get(40, 12);
        assert_eq!(cell.ch, Cell::SENTINEL.glyph);
        assert!(cell.wide);
        assert!(buf.get(41, 12).cont);
    }

    #[test]
    fn star_right_of_origin_stays_visible() {
        let mut c = canvas(80, 24);
        c.handle(CanvasEvent::mouse(MouseKind::Press, MouseButton::Left, 41, 12));
        let placed = *c.store.override_at((1, 0)).unwrap();
        let buf = frame(&mut c);

        let shown = buf.get(41, 12);
        assert!(!shown.cont);
        assert_eq!(shown.ch, placed.glyph);
        assert_eq!(shown.fg, fg_of(placed.color));

        let origin = buf.get(40, 12);
        assert_eq!(origin.ch, '*');
        assert!(!origin.wide);
    }

    #[test]
    fn entity_right_of_origin_stays_visible() {
        let mut c = canvas(80, 24);
        c.entities.add_entity("e", "x", (1, 0), Rgb::CYAN);
        let buf = frame(&mut c);
        assert_eq!(buf.get(41, 12).ch, 'x');
        assert!(!buf.get(40, 12).wide);
    }

    #[test]
    fn origin_in_last_column_is_narrow() {
        let mut c = canvas(10, 5);
        c.viewport.set_origin((-9, -2));
        let buf = frame(&mut c);
        let cell = buf.get(9, 2);
        assert_eq!(cell.ch, '*');
        assert!(!cell.wide);
    }

    #[test]
    fn entities_cover_the_store() {
        let mut c = canvas(20, 6);
        c.viewport.set_origin((0, 0));
        c.store.set((2, 1), Cell::new('✦', Rgb::WHITE));
        c.entities.add_entity("e", "a b", (1, 1), Rgb::CYAN);
        let buf = frame(&mut c);
        assert_eq!(buf.get(1, 1).ch, 'a');
        assert_eq!(buf.get(2, 1).ch, ' ');
        assert_eq!(buf.get(2, 1).fg, Color::Rgb { r: 0, g: 205, b: 205 });
    }

    #[test]
    fn hello_label_renders_with_border() {
        let mut c = canvas(80, 24);
        c.handle(CanvasEvent::mouse(MouseKind::Press, MouseButton::Right, 5, 3));
        for ch in "Hello".chars() {
            c.handle(CanvasEvent::text(TextKey::Char(ch)));
        }
        c.handle(CanvasEvent::text(TextKey::Enter));
        let buf = frame(&mut c);
        assert!(buf.row_text(3).contains("╭───────╮"));
        assert!(buf.row_text(4).contains("│ Hello │"));
        assert!(buf.row_text(5).contains("╰───────╯"));
    }

    #[test]
    fn wide_label_keeps_its_border_aligned() {
        let mut c = canvas(80, 24);
        c.handle(CanvasEvent::mouse(MouseKind::Press, MouseButton::Right, 5, 3));
        for ch in "日本".chars() {
            c.handle(CanvasEvent::text(TextKey::Char(ch)));
        }
        c.handle(CanvasEvent::text(TextKey::Enter));
        let buf = frame(&mut c);

        assert_eq!(buf.get(7, 4).ch, '日');
        assert!(buf.get(7, 4).wide);
        assert!(buf.get(8, 4).cont);
        assert_eq!(buf.get(9, 4).ch, '本');
        assert!(buf.get(10, 4).cont);
        assert_eq!(buf.get(12, 3).ch, '╮');
        assert_eq!(buf.get(12, 4).ch, '│');
        assert_eq!(buf.get(12, 5).ch, '╯');
        assert!(buf.row_text(4).contains("│ 日本 │"));
    }

    #[test]
    fn wide_glyph_cut_by_the_right_edge_is_blanked() {
        let mut c = canvas(10, 5);
        c.viewport.set_origin((0, 0));
        c.entities.add_entity("w", "日", (9, 1), Rgb::WHITE);
        let buf = frame(&mut c);
        assert_eq!(buf.get(9, 1).ch, ' ');
        assert!(!buf.get(9, 1).wide);
    }

    #[test]
    fn wide_input_in_prompt_takes_two_columns() {
        let mut c = canvas(80, 24);
        c.handle(CanvasEvent::mouse(MouseKind::Press, MouseButton::Right, 5, 3));
        c.handle(CanvasEvent::text(TextKey::Char('日')));
        let buf = frame(&mut c);
        assert_eq!(buf.get(3, 21).ch, '日');
        assert!(buf.get(4, 21).cont);
        assert_eq!(buf.get(5, 21).ch, '▏');
    }

    #[test]
    fn prompt_is_drawn_while_awaiting_text() {
        let mut c = canvas(80, 24);
        c.handle(CanvasEvent::mouse(MouseKind::Press, MouseButton::Right, 5, 3));
        assert!(frame(&mut c).row_text(20).contains(LABEL_PROMPT));
        c.handle(CanvasEvent::text(TextKey::Char('H')));
        assert!(frame(&mut c).row_text(21).contains("› H"));
        c.handle(CanvasEvent::text(TextKey::Backspace));
        c.handle(CanvasEvent::text(TextKey::Enter));
        assert!(frame(&mut c).row_text(22).contains("Text is required"));
    }

    #[test]
    fn status_line_shows_coordinates() {
        let mut c = canvas(200, 10);
        let buf = frame(&mut c);
        let status = buf.row_text(9);
        assert!(status.trim_end().ends_with("(-100,-5)"));
        assert!(status.contains("h = home"));

        let mut narrow = canvas(12, 4);
        assert!(frame(&mut narrow).row_text(3).ends_with("(-6,-2)"));
    }

    #[test]
    fn degenerate_viewport_is_an_empty_frame() {
        let mut c = canvas(0, 0);
        let buf = frame(&mut c);
        assert_eq!(buf.width, 0);
        assert!(buf.cells.is_empty());

        let mut r = Renderer::new(Vec::new());
        let mut c = canvas(80, 0);
        assert!(r.render(&mut c).is_ok());
    }

    #[test]
    fn clean_canvas_is_not_redrawn() {
        let mut r = Renderer::new(Vec::new());
        let mut c = canvas(30, 8);
        assert!(r.render(&mut c).unwrap());
        assert!(!c.dirty);
        let written = r.output().len();
        assert!(written > 0);

        assert!(!r.render(&mut c).unwrap());
        assert_eq!(r.output().len(), written);

        c.pan(1, 0);
        assert!(r.render(&mut c).unwrap());
        assert!(r.output().len() > written);
    }

    #[test]
    fn unchanged_frame_emits_only_the_header() {
        let mut r = Renderer::new(Vec::new());
        let mut c = canvas(30, 8);
        r.render(&mut c).unwrap();
        let first = r.output().len();
        c.dirty = true;
        r.render(&mut c).unwrap();
        let second = r.output().len() - first;
        assert!(second < 64, "second frame wrote {second} bytes");
    }

    #[test]
    fn resize_repaints_every_cell() {
        let mut r = Renderer::new(Vec::new());
        let mut c = canvas(30, 8);
        r.render(&mut c).unwrap();
        let first = r.output().len();

        c.handle(CanvasEvent::Resize { width: 20, height: 6 });
        assert!(r.render(&mut c).unwrap());
        let repaint = &r.output()[first..];

        assert!(String::from_utf8_lossy(repaint).contains("\x1b[2J"));
        let expected = r.back.cells.iter().filter(|cell| !cell.cont).count();
        assert_eq!(r.back.cells.len(), 20 * 6);
        assert_eq!(printed_cells(repaint), expected);
    }

    #[test]
    fn same_size_resize_is_not_a_full_repaint() {
        let mut r = Renderer::new(Vec::new());
        let mut c = canvas(30, 8);
        r.render(&mut c).unwrap();
        let first = r.output().len();

        c.handle(CanvasEvent::Resize { width: 30, height: 8 });
        r.render(&mut c).unwrap();
        assert!(printed_cells(&r.output()[first..]) < 30);
    }
}
