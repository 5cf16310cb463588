pub mod chart;
pub mod egui_surface;
pub mod live;
pub mod render;
pub mod style;
