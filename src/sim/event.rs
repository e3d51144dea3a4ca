//! Input events consumed by the canvas controller.
//! The terminal layer translates raw terminal input into these.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MouseKind {
    Press,
    Release,
    Drag,
    Scroll,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MouseInput {
    pub kind: MouseKind,
    pub button: MouseButton,
    pub x: u16,
    pub y: u16,
}

impl MouseInput {
    pub fn new(kind: MouseKind, button: MouseButton, x: u16, y: u16) -> Self {
        MouseInput { kind, button, x, y }
    }
}

/// Key commands understood in normal mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    Home,
    CenterEarth,
    Save,
    Quit,
}

/// Keys as seen by text entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextKey {
    Char(char),
    Backspace,
    Enter,
    Esc,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CanvasEvent {
    Mouse(MouseInput),
    /// A key press. `command` is its normal-mode binding, if any.
    Key { text: Option<TextKey>, command: Option<Command> },
    Resize { width: u16, height: u16 },
    /// Interrupt (Ctrl-C): honored in every mode.
    Interrupt,
}

#[allow(dead_code)]
impl CanvasEvent {
    pub fn command(command: Command) -> Self {
        CanvasEvent::Key { text: None, command: Some(command) }
    }

    pub fn text(key: TextKey) -> Self {
        CanvasEvent::Key { text: Some(key), command: None }
    }

    pub fn mouse(kind: MouseKind, button: MouseButton, x: u16, y: u16) -> Self {
        CanvasEvent::Mouse(MouseInput::new(kind, button, x, y))
    }
}
