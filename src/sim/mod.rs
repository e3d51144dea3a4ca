pub mod canvas;
pub mod event;
pub mod save;
pub mod store;
pub mod viewport;
