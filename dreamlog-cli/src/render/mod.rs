mod palette;
mod renderer;

pub use renderer::{RenderOptions, Renderer};
