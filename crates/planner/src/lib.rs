pub mod ast;
pub mod dialect;
pub mod renderer;

pub use dialect::{Dialect, Postgres};
pub use renderer::{Render, Renderer};
