#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::Path;

use runviz::RunViz;
use runviz::settings::VizSettings;

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    // Optional YAML settings file as the only argument.
    let settings = std::env::args().nth(1).and_then(|path| match VizSettings::load(Path::new(&path)) {
        Ok(settings) => Some(settings),
        Err(e) => {
            log::error!("Could not read settings from '{path}': {e}");
            None
        }
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };
    eframe::run_native(
        "RunViz",
        native_options,
        Box::new(|cc| Ok(Box::new(RunViz::new(cc, settings)))),
    )
}
