use std::time::{Duration, Instant};

use crate::catalog::analysis::SignalAxesFields;
use crate::catalog::field_selection::{FieldRole, FieldSelection, PlotRequest};
use crate::catalog::memory::MemoryCatalog;
use crate::catalog::{Catalog, run_summary};
use crate::fitter::models::available_models;
use crate::plot::chart::ChartView;
use crate::plot::egui_surface::EguiSurface;
use crate::plot::live::{FieldPair, LivePlot, RefreshOutcome};
use crate::settings::VizSettings;

use super::demo::{DEMO_CATALOG, SimulatedScan, demo_catalog};

const ACQUISITION_STEP: Duration = Duration::from_millis(500);
const ACQUISITION_POINTS: usize = 61;

pub struct RunViz {
    settings: VizSettings,
    catalog: MemoryCatalog,
    chart: ChartView<EguiSurface>,

    selected_run: Option<String>,
    stream: String,
    analysis: Option<SignalAxesFields>,
    field_selection: FieldSelection,
    live_requested: bool,
    live: Option<LivePlot>,

    acquisition: Option<SimulatedScan>,
    last_acquired: Option<Instant>,
    next_scan_id: i64,

    side_panel_open: bool,
}

impl RunViz {
    /// `settings` from the command line take precedence over the stored ones.
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Option<VizSettings>) -> Self {
        // Note that you must enable the `persistence` feature for this to work.
        let settings = settings
            .or_else(|| cc.storage.and_then(|storage| eframe::get_value(storage, eframe::APP_KEY)))
            .unwrap_or_default();
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: VizSettings) -> Self {
        let catalog = demo_catalog().unwrap_or_else(|e| {
            log::error!("Could not build the demo catalog: {e}");
            MemoryCatalog::new(DEMO_CATALOG)
        });

        Self {
            chart: ChartView::new(EguiSurface::new(), &settings),
            stream: settings.default_stream.clone(),
            settings,
            catalog,
            selected_run: None,
            analysis: None,
            field_selection: FieldSelection::default(),
            live_requested: false,
            live: None,
            acquisition: None,
            last_acquired: None,
            next_scan_id: 200,
            side_panel_open: true,
        }
    }

    fn select_run(&mut self, uid: &str) {
        self.selected_run = Some(uid.to_owned());
        self.stream.clone_from(&self.settings.default_stream);

        self.analysis = match SignalAxesFields::new(&self.catalog, uid, &self.settings.default_stream) {
            Ok(analysis) => {
                self.stream.clone_from(&analysis.stream_name);
                Some(analysis)
            }
            Err(e) => {
                log::warn!("Could not analyse run '{uid}': {e}");
                None
            }
        };
        self.refresh_fields();
    }

    fn refresh_fields(&mut self) {
        let Some(run) = &self.selected_run else {
            return;
        };
        let fields = match self.catalog.stream_fields(run, &self.stream) {
            Ok(fields) => fields,
            Err(e) => {
                log::warn!("{e}");
                Vec::new()
            }
        };
        self.field_selection = match &self.analysis {
            Some(analysis) => FieldSelection::with_defaults(&fields, analysis),
            None => FieldSelection::new(&fields),
        };
    }

    fn plot_selection(&mut self, replace: bool) {
        let Some(run) = self.selected_run.clone() else {
            return;
        };
        let Some(request) = self.field_selection.plot_request() else {
            log::warn!("Select at least one Y field to plot");
            self.chart.controls.status = Some("Select at least one Y field".to_owned());
            return;
        };

        if replace {
            self.stop_live();
            self.chart.remove_all_curves();
        }
        if let Ok(metadata) = self.catalog.run_metadata(&run) {
            self.chart.set_title(&run_summary(&metadata));
        }

        let active = self.catalog.is_run_active(&run).unwrap_or(false);
        if self.live_requested && active {
            self.start_live(&run, &request);
            return;
        }

        match self.chart.plot_fields(
            &self.catalog,
            &run,
            &self.stream,
            &request,
            self.settings.label_uid_chars,
        ) {
            Ok(ids) => log::info!("Plotted {} curve(s) from run '{run}'", ids.len()),
            Err(e) => {
                log::warn!("Plot failed: {e}");
                self.chart.controls.status = Some(e.to_string());
            }
        }
    }

    fn start_live(&mut self, run: &str, request: &PlotRequest) {
        self.stop_live();
        let pairs = request
            .y
            .iter()
            .map(|y| FieldPair {
                x_field: request.x.clone(),
                y_field: y.clone(),
                mon_field: request.mon.clone(),
            })
            .collect();

        match LivePlot::enable(&self.catalog, &mut self.chart, run, &self.stream, pairs, &self.settings) {
            Ok(Some(mut live)) => {
                live.refresh(&mut self.chart, &self.catalog);
                self.live = Some(live);
            }
            Ok(None) => self.chart.controls.status = Some("Run has finished, plotted statically".to_owned()),
            Err(e) => {
                log::warn!("Could not start live mode: {e}");
                self.chart.controls.status = Some(e.to_string());
            }
        }
    }

    fn stop_live(&mut self) {
        if let Some(mut live) = self.live.take() {
            live.stop(&mut self.chart);
        }
    }

    fn start_acquisition(&mut self) {
        let uid = format!("sim-{}", self.next_scan_id);
        match SimulatedScan::start(&mut self.catalog, &uid, self.next_scan_id, ACQUISITION_POINTS) {
            Ok(mut scan) => {
                self.next_scan_id += 1;
                if let Err(e) = scan.advance(&mut self.catalog) {
                    log::error!("{e}");
                }
                self.last_acquired = Some(Instant::now());
                self.acquisition = Some(scan);
                self.live_requested = true;
                self.select_run(&uid);
            }
            Err(e) => log::error!("Could not start acquisition: {e}"),
        }
    }

    /// Advances the simulated acquisition and refreshes live curves that are due.
    fn background_work(&mut self, ctx: &egui::Context) {
        let now = Instant::now();

        if let Some(scan) = &mut self.acquisition {
            let due = self
                .last_acquired
                .is_none_or(|last| now.duration_since(last) >= ACQUISITION_STEP);
            if due {
                if let Err(e) = scan.advance(&mut self.catalog) {
                    log::error!("Acquisition failed: {e}");
                    self.acquisition = None;
                } else {
                    self.last_acquired = Some(now);
                }
            }
            if self.acquisition.as_ref().is_some_and(SimulatedScan::is_running) {
                ctx.request_repaint_after(ACQUISITION_STEP);
            } else {
                self.acquisition = None;
            }
        }

        if let Some(live) = &mut self.live {
            match live.tick(now, &mut self.chart, &self.catalog) {
                RefreshOutcome::Completed | RefreshOutcome::Stopped(_) => self.live = None,
                RefreshOutcome::Updated(_) | RefreshOutcome::Skipped | RefreshOutcome::Idle => {}
            }
        }
        if let Some(wait) = self.live.as_ref().and_then(|live| live.time_until_due(now)) {
            ctx.request_repaint_after(wait);
        }
    }

    fn catalog_panel_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading(format!("Catalog: {}", self.catalog.name()));
        ui.separator();

        let mut clicked_run = None;
        egui::ScrollArea::vertical()
            .id_salt("runviz_runs")
            .max_height(200.0)
            .show(ui, |ui| {
                for uid in self.catalog.run_uids() {
                    let summary = self
                        .catalog
                        .run_metadata(&uid)
                        .map(|metadata| run_summary(&metadata))
                        .unwrap_or_else(|_| uid.clone());
                    let active = self.catalog.is_run_active(&uid).unwrap_or(false);
                    let text = if active { format!("{summary} (acquiring)") } else { summary };
                    let selected = self.selected_run.as_deref() == Some(uid.as_str());
                    if ui.selectable_label(selected, text).on_hover_text(&uid).clicked() {
                        clicked_run = Some(uid);
                    }
                }
            });
        if let Some(uid) = clicked_run {
            self.select_run(&uid);
        }

        ui.separator();

        let Some(run) = self.selected_run.clone() else {
            ui.label("Select a run.");
            return;
        };

        let streams = self.catalog.list_streams(&run).unwrap_or_default();
        let mut stream_changed = false;
        ui.horizontal(|ui| {
            ui.label("Stream:");
            egui::ComboBox::from_id_salt("runviz_stream")
                .selected_text(self.stream.clone())
                .show_ui(ui, |ui| {
                    for stream in &streams {
                        stream_changed |= ui.selectable_value(&mut self.stream, stream.clone(), stream).changed();
                    }
                });
            if ui.button("⟳").on_hover_text("Reload fields").clicked() {
                stream_changed = true;
            }
        });
        if stream_changed {
            self.refresh_fields();
        }

        self.field_selection_ui(ui);

        ui.separator();
        ui.checkbox(&mut self.live_requested, "Live")
            .on_hover_text("Keep refreshing while the run is acquiring");
        ui.horizontal(|ui| {
            let can_plot = self.field_selection.plot_request().is_some();
            if ui
                .add_enabled(can_plot, egui::Button::new("Replace"))
                .on_disabled_hover_text("No Y field selected.")
                .clicked()
            {
                self.plot_selection(true);
            }
            if ui
                .add_enabled(can_plot, egui::Button::new("Add"))
                .on_disabled_hover_text("No Y field selected.")
                .clicked()
            {
                self.plot_selection(false);
            }
            if ui.button("Clear").clicked() {
                self.field_selection.clear();
            }
        });
    }

    fn field_selection_ui(&mut self, ui: &mut egui::Ui) {
        let rows: Vec<(String, Option<FieldRole>)> = self
            .field_selection
            .fields()
            .map(|(field, role)| (field.clone(), role))
            .collect();
        if rows.is_empty() {
            ui.label("No fields yet.");
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("runviz_fields")
            .max_height(300.0)
            .show(ui, |ui| {
                egui::Grid::new("runviz_field_grid").striped(true).show(ui, |ui| {
                    ui.label("Field");
                    ui.label("X");
                    ui.label("Y");
                    ui.label("Mon");
                    ui.end_row();

                    for (field, role) in rows {
                        ui.label(&field);
                        for option in [FieldRole::X, FieldRole::Y, FieldRole::Mon] {
                            let mut checked = role == Some(option);
                            if ui.checkbox(&mut checked, "").changed() {
                                self.field_selection.set_role(&field, checked.then_some(option));
                            }
                        }
                        ui.end_row();
                    }
                });
            });
    }

    fn curve_panel_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Curves");
        ui.separator();

        let ids: Vec<(String, String)> = self
            .chart
            .curves()
            .curves()
            .values()
            .map(|curve| (curve.id.clone(), curve.label.clone()))
            .collect();
        if ids.is_empty() {
            ui.label("Nothing plotted.");
            return;
        }

        let selected_label = self
            .chart
            .selected()
            .and_then(|id| self.chart.curves().get_curve_data(id))
            .map(|curve| curve.label.clone())
            .unwrap_or_default();
        let mut picked = None;
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("runviz_curve")
                .selected_text(selected_label)
                .show_ui(ui, |ui| {
                    for (id, label) in &ids {
                        let selected = self.chart.selected() == Some(id);
                        if ui.selectable_label(selected, label).clicked() {
                            picked = Some(id.clone());
                        }
                    }
                });
            if ui.button("Remove").clicked()
                && let Some(id) = self.chart.selected().cloned()
            {
                self.chart.remove_curve(&id);
            }
        });
        if let Some(id) = picked {
            self.chart.select_curve(&id);
        }

        ui.separator();
        self.transform_ui(ui);
        ui.separator();
        self.statistics_ui(ui);
        ui.separator();
        self.fit_ui(ui);
        ui.separator();
        self.cursor_ui(ui);

        if let Some(status) = &self.chart.controls.status {
            ui.separator();
            ui.label(status);
        }
    }

    fn transform_ui(&mut self, ui: &mut egui::Ui) {
        let mut apply = false;
        egui::Grid::new("runviz_transform_grid").show(ui, |ui| {
            ui.label("Offset");
            apply |= ui
                .add(egui::TextEdit::singleline(&mut self.chart.controls.offset_text).desired_width(80.0))
                .lost_focus();
            ui.end_row();
            ui.label("Factor");
            apply |= ui
                .add(egui::TextEdit::singleline(&mut self.chart.controls.factor_text).desired_width(80.0))
                .lost_focus();
            ui.end_row();
        });
        if apply {
            let offset = self.chart.controls.offset_text.clone();
            let factor = self.chart.controls.factor_text.clone();
            if let Err(e) = self.chart.apply_offset_factor(&offset, &factor) {
                log::error!("Could not apply offset/factor: {e}");
            }
        }

        let mut derivative = self.chart.controls.derivative;
        if ui.checkbox(&mut derivative, "Derivative").changed() {
            if let Err(e) = self.chart.set_derivative(derivative) {
                log::error!("Could not toggle the derivative: {e}");
            }
        }
    }

    fn statistics_ui(&self, ui: &mut egui::Ui) {
        let Some(statistics) = &self.chart.controls.statistics else {
            return;
        };
        ui.collapsing("Statistics", |ui| {
            egui::Grid::new("runviz_statistics_grid").striped(true).show(ui, |ui| {
                for (name, value) in statistics.entries() {
                    ui.label(name);
                    ui.label(value);
                    ui.end_row();
                }
            });
        });
    }

    fn fit_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let selected_text = self
                .chart
                .controls
                .model
                .map_or_else(|| "Model".to_owned(), |model| model.name());
            egui::ComboBox::from_id_salt("runviz_model")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for model in available_models().iter().copied() {
                        ui.selectable_value(&mut self.chart.controls.model, Some(model), model.name());
                    }
                });

            if ui.button("Fit").clicked() {
                if let Err(e) = self.chart.fit_selected() {
                    log::error!("Fit failed: {e}");
                }
            }
            if ui.button("Clear fit").clicked() {
                self.chart.clear_fit();
            }
        });
        ui.checkbox(&mut self.chart.controls.use_cursor_range, "Fit between cursors");

        if let Some(id) = self.chart.selected().cloned()
            && self.chart.fits().has_fit(&id)
        {
            self.chart.fits().fit_stats_grid_ui(ui, &id);
            if ui.button("Copy fits as JSON").clicked() {
                match self.chart.fits().to_json() {
                    Ok(json) => ui.ctx().copy_text(json),
                    Err(e) => log::error!("{e}"),
                }
            }
        }
    }

    fn cursor_ui(&mut self, ui: &mut egui::Ui) {
        ui.label("Cursors: middle click (or alt + right click) and right click");
        ui.checkbox(&mut self.chart.controls.snap_to_curve, "Snap to curve");
        egui::Grid::new("runviz_cursor_grid").striped(true).show(ui, |ui| {
            for (name, value) in self.chart.cursors().report() {
                ui.label(name);
                ui.label(value);
                ui.end_row();
            }
        });
        if ui.button("Clear cursors").clicked() {
            self.chart.clear_cursors();
        }
    }
}

impl eframe::App for RunViz {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.settings.snap_to_curve = self.chart.controls.snap_to_curve;
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }

    fn logic(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.background_work(ctx);
    }

    fn ui(&mut self, ui: &mut egui::Ui, _frame: &mut eframe::Frame) {
        egui::Panel::top("runviz_top_panel").show_inside(ui, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                egui::global_theme_preference_switch(ui);

                ui.heading("RunViz");

                ui.separator();

                if ui
                    .selectable_label(self.side_panel_open, "Catalog")
                    .clicked()
                {
                    self.side_panel_open = !self.side_panel_open;
                }

                if ui.button("Clear plot").clicked() {
                    self.stop_live();
                    self.chart.remove_all_curves();
                }

                ui.separator();

                if ui
                    .add_enabled(self.acquisition.is_none(), egui::Button::new("Simulate acquisition"))
                    .clicked()
                {
                    self.start_acquisition();
                }
                if self.acquisition.is_some() {
                    ui.add(egui::widgets::Spinner::default());
                }
                if self.live.is_some() && ui.button("Stop live").clicked() {
                    self.stop_live();
                }
            });
        });

        egui::Panel::left("runviz_catalog_panel").show_animated_inside(ui, self.side_panel_open, |ui| {
            self.catalog_panel_ui(ui);
        });

        egui::Panel::right("runviz_curve_panel")
            .min_size(220.0)
            .show_inside(ui, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.curve_panel_ui(ui);
                });
            });

        egui::CentralPanel::default().show_inside(ui, |ui| {
            if let Some(click) = self.chart.surface_mut().show(ui) {
                self.chart.handle_click(click.button, click.alt, click.point);
            }
        });
    }
}
