//! Termination signals.
//!
//! SIGTERM and SIGHUP only raise a flag; the event loop polls input with a
//! timeout, sees the flag and leaves through the normal quit path, so the
//! terminal is restored and the final save still runs.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGHUP, SIGTERM};

const TERM_SIGNALS: [i32; 2] = [SIGTERM, SIGHUP];

#[derive(Clone, Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    /// Route SIGTERM and SIGHUP to this flag instead of the default
    /// action, which would kill the process with the terminal still raw.
    pub fn install() -> io::Result<Self> {
        let shutdown = Shutdown::default();
        for sig in TERM_SIGNALS {
            signal_hook::flag::register(sig, Arc::clone(&shutdown.0))?;
        }
        Ok(shutdown)
    }

    pub fn requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::CanvasEvent;
    use crate::ui::input;

    #[test]
    fn fresh_flag_is_clear() {
        assert!(!Shutdown::default().requested());
    }

    #[test]
    fn sigterm_sets_the_flag_and_ends_input() {
        let shutdown = Shutdown::install().unwrap();
        assert!(!shutdown.requested());
        signal_hook::low_level::raise(SIGTERM).unwrap();
        assert!(shutdown.requested());

        let event = input::next_event(&shutdown).unwrap();
        assert_eq!(event, Some(CanvasEvent::Interrupt));
    }
}
