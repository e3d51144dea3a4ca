//! Canvas: the complete state of one running world, and the controller
//! that turns input events into changes to it.
//!
//! ## Modes
//!
//!   - `Normal` — mouse and key commands edit the world and move the viewport.
//!   - `AwaitingText` — entered by right click. Owns all input until the
//!     label is confirmed (Enter) or abandoned (Esc); only resize and
//!     interrupt get through.
//!
//! `handle()` reports what the caller must do next through `Effect`; the
//! canvas itself never touches the terminal or the disk.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::domain::art::{boxed_text, AsciiArt, EntityLayer, EARTH, EARTH_ID};
use crate::domain::cell::{Cell, Coord, Rgb, ORIGIN};
use crate::sim::event::{CanvasEvent, Command, MouseButton, MouseInput, MouseKind, TextKey};
use crate::sim::store::{WorldStore, DEFAULT_CACHE_LIMIT};
use crate::sim::viewport::Viewport;

pub const LABEL_PROMPT: &str = "What should this area say?";
pub const LABEL_PLACEHOLDER: &str = "Your text here...";
const ERR_REQUIRED: &str = "Text is required";
const ERR_TOO_LONG: &str = "Text is too long";

/// Offset of the earth from the home position on a fresh world.
const EARTH_OFFSET: i64 = 15;

#[derive(Clone, Copy, Debug)]
pub struct CanvasSettings {
    pub scroll_step: i64,
    pub label_max_len: usize,
    pub cache_limit: usize,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        CanvasSettings {
            scroll_step: 3,
            label_max_len: 60,
            cache_limit: DEFAULT_CACHE_LIMIT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEntry {
    /// World coordinate that was right-clicked; becomes the label's top-left.
    pub anchor: Coord,
    pub buffer: String,
    pub error: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    AwaitingText(TextEntry),
}

/// What the event loop must do after an event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    None,
    /// Persisted content changed, or a save was requested.
    Persist,
    /// Save, then leave.
    Quit,
}

#[derive(Clone, Copy, Debug)]
struct DragStart {
    pointer: (u16, u16),
    origin: Coord,
}

pub struct Canvas {
    pub store: WorldStore,
    pub entities: EntityLayer,
    pub viewport: Viewport,
    /// Viewport origin recorded at startup. Target of the `home` command.
    pub home: Coord,
    pub mode: Mode,
    /// Set by any visible change; cleared by the renderer.
    pub dirty: bool,
    /// One-line message shown in the status bar until the next event.
    pub notice: Option<String>,
    settings: CanvasSettings,
    drag: Option<DragStart>,
    rng: StdRng,
}

// ── Construction ──

impl Canvas {
    /// Empty world with the viewport centered on the origin.
    pub fn new(width: u16, height: u16, settings: CanvasSettings) -> Self {
        let viewport = Viewport::centered(width, height);
        Canvas {
            store: WorldStore::with_cache_limit(settings.cache_limit),
            entities: EntityLayer::new(),
            home: viewport.origin(),
            viewport,
            mode: Mode::Normal,
            dirty: true,
            notice: None,
            settings,
            drag: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Fix the click-color stream (tests).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Fresh-world decoration: the earth, up and to the left of home.
    pub fn add_earth(&mut self) {
        let position = (self.home.0 - EARTH_OFFSET, self.home.1 - EARTH_OFFSET);
        self.entities.add(AsciiArt::new(EARTH_ID, EARTH, position, Rgb::CYAN));
        self.dirty = true;
    }

    /// Install saved overrides and entities, replacing the current world content.
    pub fn restore(&mut self, overrides: Vec<(Coord, Cell)>, entities: EntityLayer) {
        let mut store = WorldStore::with_cache_limit(self.settings.cache_limit);
        for (pos, cell) in overrides {
            store.set(pos, cell);
        }
        self.store = store;
        self.entities = entities;
        self.dirty = true;
    }

    pub fn set_notice(&mut self, msg: impl Into<String>) {
        self.notice = Some(msg.into());
        self.dirty = true;
    }
}

// ── Event dispatch ──

impl Canvas {
    pub fn handle(&mut self, event: CanvasEvent) -> Effect {
        if self.notice.take().is_some() {
            self.dirty = true;
        }

        match event {
            CanvasEvent::Interrupt => return Effect::Quit,
            CanvasEvent::Resize { width, height } => {
                self.viewport.resize(width, height);
                self.dirty = true;
                return Effect::None;
            }
            _ => {}
        }

        match self.mode {
            Mode::Normal => self.handle_normal(event),
            Mode::AwaitingText(_) => self.handle_text(event),
        }
    }

    fn handle_normal(&mut self, event: CanvasEvent) -> Effect {
        match event {
            CanvasEvent::Mouse(m) => self.handle_mouse(m),
            CanvasEvent::Key { command: Some(cmd), .. } => self.handle_command(cmd),
            _ => Effect::None,
        }
    }

    fn handle_mouse(&mut self, m: MouseInput) -> Effect {
        match (m.kind, m.button) {
            (MouseKind::Press, MouseButton::Left) => self.left_click(m.x, m.y),
            (MouseKind::Press, MouseButton::Right) => {
                self.right_click(m.x, m.y);
                Effect::None
            }
            (MouseKind::Press, MouseButton::Middle) => {
                self.drag = Some(DragStart {
                    pointer: (m.x, m.y),
                    origin: self.viewport.origin(),
                });
                Effect::None
            }
            (MouseKind::Drag, MouseButton::Middle) => {
                self.drag_to(m.x, m.y);
                Effect::None
            }
            (MouseKind::Release, MouseButton::Middle) => {
                self.drag = None;
                Effect::None
            }
            (_, MouseButton::WheelUp) => {
                self.pan(0, -self.settings.scroll_step);
                Effect::None
            }
            (_, MouseButton::WheelDown) => {
                self.pan(0, self.settings.scroll_step);
                Effect::None
            }
            _ => Effect::None,
        }
    }

    fn handle_command(&mut self, cmd: Command) -> Effect {
        match cmd {
            Command::PanLeft => self.pan(-1, 0),
            Command::PanRight => self.pan(1, 0),
            Command::PanUp => self.pan(0, -1),
            Command::PanDown => self.pan(0, 1),
            Command::Home => self.go_home(),
            Command::CenterEarth => self.center_on(EARTH_ID),
            Command::Save => return Effect::Persist,
            Command::Quit => return Effect::Quit,
        }
        Effect::None
    }
}

// ── Normal-mode actions ──

impl Canvas {
    /// Recolor the entity under the pointer, or drop a star there.
    fn left_click(&mut self, sx: u16, sy: u16) -> Effect {
        let pos = self.viewport.screen_to_world(sx, sy);

        if let Some(id) = self.entities.entity_at(pos).map(|a| a.id.clone()) {
            let color = Rgb::bright(&mut self.rng);
            self.entities.set_color(&id, color);
            self.dirty = true;
            return Effect::Persist;
        }

        if pos == ORIGIN {
            return Effect::None;
        }

        let star = Cell::random_star(&mut self.rng);
        self.store.set(pos, star);
        self.dirty = true;
        Effect::Persist
    }

    fn right_click(&mut self, sx: u16, sy: u16) {
        let anchor = self.viewport.screen_to_world(sx, sy);
        if self.entities.entity_at(anchor).is_some() {
            return;
        }
        debug!(x = anchor.0, y = anchor.1, "awaiting label text");
        self.drag = None;
        self.mode = Mode::AwaitingText(TextEntry {
            anchor,
            buffer: String::new(),
            error: None,
        });
        self.dirty = true;
    }

    /// Viewport moves opposite to the pointer: content stays under it.
    fn drag_to(&mut self, px: u16, py: u16) {
        let Some(start) = self.drag else { return };
        let dx = i64::from(px) - i64::from(start.pointer.0);
        let dy = i64::from(py) - i64::from(start.pointer.1);
        let target = (start.origin.0.wrapping_sub(dx), start.origin.1.wrapping_sub(dy));
        if target != self.viewport.origin() {
            self.viewport.set_origin(target);
            self.dirty = true;
        }
    }

    pub fn pan(&mut self, dx: i64, dy: i64) {
        if dx != 0 || dy != 0 {
            self.viewport.pan(dx, dy);
            self.dirty = true;
        }
    }

    pub fn go_home(&mut self) {
        if self.viewport.origin() != self.home {
            self.viewport.set_origin(self.home);
            self.dirty = true;
        }
    }

    pub fn center_on(&mut self, id: &str) {
        if let Some(art) = self.entities.get(id) {
            self.viewport.center_on(art);
            self.dirty = true;
        }
    }
}

// ── Text entry ──

impl Canvas {
    fn handle_text(&mut self, event: CanvasEvent) -> Effect {
        let Mode::AwaitingText(entry) = &mut self.mode else {
            return Effect::None;
        };
        let Some(key) = (match event {
            CanvasEvent::Key { text, .. } => text,
            _ => None,
        }) else {
            return Effect::None;
        };

        match key {
            TextKey::Char(c) if !c.is_control() => {
                entry.buffer.push(c);
                entry.error = None;
            }
            TextKey::Char(_) => return Effect::None,
            TextKey::Backspace => {
                entry.buffer.pop();
                entry.error = None;
            }
            TextKey::Esc => {
                debug!("label entry cancelled");
                self.mode = Mode::Normal;
            }
            TextKey::Enter => {
                let len = entry.buffer.chars().count();
                if entry.buffer.trim().is_empty() {
                    entry.error = Some(ERR_REQUIRED);
                } else if len > self.settings.label_max_len {
                    entry.error = Some(ERR_TOO_LONG);
                } else {
                    let anchor = entry.anchor;
                    let text = std::mem::take(&mut entry.buffer);
                    self.mode = Mode::Normal;
                    self.add_label(&text, anchor);
                    return Effect::Persist;
                }
            }
        }
        self.dirty = true;
        Effect::None
    }

    fn add_label(&mut self, text: &str, anchor: Coord) {
        let id = self.entities.next_label_id();
        debug!(%id, x = anchor.0, y = anchor.1, "label placed");
        self.entities.add(AsciiArt::new(id, boxed_text(text), anchor, Rgb::WHITE));
        self.dirty = true;
    }
}
