mod app;
pub mod demo;

pub use app::RunViz;
