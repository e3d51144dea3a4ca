//! Terminal input → canvas events.
//!
//! crossterm does the escape-sequence decoding (keys and SGR mouse reports);
//! this module only maps its events onto `CanvasEvent`. Every key press
//! carries both readings, its text-entry meaning and its normal-mode
//! binding, and the canvas picks whichever its current mode wants.

use std::io;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton as TermButton,
    MouseEvent, MouseEventKind,
};

use crate::sim::event::{CanvasEvent, Command, MouseButton, MouseKind, TextKey};
use crate::ui::signals::Shutdown;

/// How long to wait for input before looking at the shutdown flag again.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down];
const KEYS_HOME: &[KeyCode] = &[KeyCode::Char('h'), KeyCode::Char('H'), KeyCode::Home];
const KEYS_EARTH: &[KeyCode] = &[KeyCode::Char('e'), KeyCode::Char('E')];
const KEYS_SAVE: &[KeyCode] = &[KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// Wait up to `POLL_INTERVAL` for the next terminal event and translate it.
/// A pending shutdown reads as `Interrupt`. `Ok(None)` on timeout and for
/// events the canvas has no use for.
pub fn next_event(shutdown: &Shutdown) -> io::Result<Option<CanvasEvent>> {
    if shutdown.requested() {
        return Ok(Some(CanvasEvent::Interrupt));
    }
    if !event::poll(POLL_INTERVAL)? {
        return Ok(None);
    }
    Ok(translate(event::read()?))
}

pub fn translate(event: Event) -> Option<CanvasEvent> {
    match event {
        Event::Key(key) => translate_key(key),
        Event::Mouse(mouse) => translate_mouse(mouse),
        Event::Resize(width, height) => Some(CanvasEvent::Resize { width, height }),
        _ => None,
    }
}

fn translate_key(key: KeyEvent) -> Option<CanvasEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
        return Some(CanvasEvent::Interrupt);
    }

    let text = match key.code {
        KeyCode::Char(c) if !ctrl => Some(TextKey::Char(c)),
        KeyCode::Backspace => Some(TextKey::Backspace),
        KeyCode::Enter => Some(TextKey::Enter),
        KeyCode::Esc => Some(TextKey::Esc),
        _ => None,
    };
    let command = if ctrl { None } else { command_for(key.code) };

    if text.is_none() && command.is_none() {
        return None;
    }
    Some(CanvasEvent::Key { text, command })
}

fn command_for(code: KeyCode) -> Option<Command> {
    let bindings: [(&[KeyCode], Command); 8] = [
        (KEYS_LEFT, Command::PanLeft),
        (KEYS_RIGHT, Command::PanRight),
        (KEYS_UP, Command::PanUp),
        (KEYS_DOWN, Command::PanDown),
        (KEYS_HOME, Command::Home),
        (KEYS_EARTH, Command::CenterEarth),
        (KEYS_SAVE, Command::Save),
        (KEYS_QUIT, Command::Quit),
    ];
    bindings
        .iter()
        .find(|(keys, _)| keys.contains(&code))
        .map(|&(_, cmd)| cmd)
}

fn translate_mouse(m: MouseEvent) -> Option<CanvasEvent> {
    let (kind, button) = match m.kind {
        MouseEventKind::Down(b) => (MouseKind::Press, button(b)),
        MouseEventKind::Up(b) => (MouseKind::Release, button(b)),
        MouseEventKind::Drag(b) => (MouseKind::Drag, button(b)),
        MouseEventKind::ScrollUp => (MouseKind::Scroll, MouseButton::WheelUp),
        MouseEventKind::ScrollDown => (MouseKind::Scroll, MouseButton::WheelDown),
        _ => return None,
    };
    Some(CanvasEvent::mouse(kind, button, m.column, m.row))
}

fn button(b: TermButton) -> MouseButton {
    match b {
        TermButton::Left => MouseButton::Left,
        TermButton::Middle => MouseButton::Middle,
        TermButton::Right => MouseButton::Right,
    }
}
