//! Report output: exports and terminal rendering.

pub mod generator;
pub mod render;

pub use generator::*;
pub use render::*;
