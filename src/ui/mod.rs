pub mod layout;
pub mod renderer;
pub mod terminal;

pub use layout::{ChartOptions, ChartStyle};
pub use renderer::{ChartRenderer, Render, RenderError};
