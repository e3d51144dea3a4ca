//! Entry point and event loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::sync::Mutex;

use crossterm::terminal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use error::CanvasError;
use sim::canvas::{Canvas, Effect};
use sim::save::{self, WorldKey, WorldStorage};
use ui::input;
use ui::renderer::Renderer;
use ui::signals::Shutdown;

fn main() {
    let config = AppConfig::load();
    init_tracing(&config);

    let key = WorldKey::from_identity(&save::identity_token());
    let storage = WorldStorage::new(&config.storage_dir);

    let (width, height) = terminal::size().unwrap_or((80, 24));
    let mut canvas = Canvas::new(width, height, config.canvas);
    match storage.load(&key) {
        Some(saved) => canvas.restore(saved.overrides, saved.entities),
        None => canvas.add_earth(),
    }
    info!(
        storage = %storage.dir().display(),
        width,
        height,
        "canvas started"
    );

    let shutdown = Shutdown::install().unwrap_or_else(|e| {
        warn!(error = %e, "could not install signal handlers");
        Shutdown::default()
    });

    let mut renderer = Renderer::stdout();
    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = event_loop(&mut canvas, &mut renderer, &storage, &key, &shutdown);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    // Shutdown save, whatever ended the loop.
    if let Err(e) = storage.save(&key, &canvas.store, &canvas.entities) {
        error!(error = %e, "final save failed");
        eprintln!("Could not save your canvas: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "event loop failed");
        eprintln!("Canvas error: {e}");
    }
}

/// Poll input; render whenever the canvas is dirty.
/// Returns on quit, interrupt or a termination signal; the caller does the
/// final save.
fn event_loop(
    canvas: &mut Canvas,
    renderer: &mut Renderer<std::io::Stdout>,
    storage: &WorldStorage,
    key: &WorldKey,
    shutdown: &Shutdown,
) -> Result<(), CanvasError> {
    loop {
        renderer.render(canvas).map_err(CanvasError::Terminal)?;

        let Some(event) = input::next_event(shutdown).map_err(CanvasError::Terminal)? else {
            continue;
        };

        match canvas.handle(event) {
            Effect::None => {}
            Effect::Persist => persist(canvas, storage, key),
            Effect::Quit => {
                info!(signal = shutdown.requested(), "quit requested");
                return Ok(());
            }
        }
    }
}

fn persist(canvas: &mut Canvas, storage: &WorldStorage, key: &WorldKey) {
    if let Err(e) = storage.save(key, &canvas.store, &canvas.entities) {
        warn!(error = %e, "save failed");
        canvas.set_notice(" Save failed! ");
    }
}

/// Log to a file: the terminal belongs to the renderer.
/// `RUST_LOG` overrides the configured level.
fn init_tracing(config: &AppConfig) {
    if let Some(dir) = config.log_file.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let file = match OpenOptions::new().create(true).append(true).open(&config.log_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open {}: {e}", config.log_file.display());
            eprintln!("Logging disabled.");
            return;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
}
