pub mod curve;
pub mod curve_manager;
pub mod statistics;
