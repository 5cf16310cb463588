//! Plotting, live updating and curve fitting for runs of a data catalog.
//!
//! [`plot::chart::ChartView`] is the entry point: it owns the curve and fit
//! registries and keeps a [`plot::render::RenderSurface`] in step with them.
//! [`RunViz`] wraps it in an `eframe` application.
#![warn(clippy::all, rust_2018_idioms)]

pub mod catalog;
pub mod cursors;
pub mod curves;
pub mod error;
pub mod events;
pub mod fitter;
pub mod plot;
pub mod settings;
pub mod ui;

pub use ui::RunViz;
