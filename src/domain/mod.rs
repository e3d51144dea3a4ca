pub mod art;
pub mod cell;
pub mod generator;
