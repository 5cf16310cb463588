//! The interactive chart: turns user actions into registry operations and
//! keeps the render surface in step with the registries.
//!
//! Registry changes come back as events. After every operation the chart
//! drains both event channels and applies the matching surface updates, so
//! curve removal cascades to its fit overlay, the selection and the cursors
//! in one place.

use std::sync::mpsc::Receiver;

use indexmap::IndexMap;

use super::live::LiveStatus;
use super::render::{RenderHandle, RenderSurface};
use super::style::{CURSOR_COLORS, CurveStyle, StyleCycle};
use crate::catalog::field_selection::{PlotRequest, assemble_series};
use crate::catalog::{Catalog, CatalogError, curve_label};
use crate::cursors::{ClickButton, CursorId, CursorPair, cursor_for_click, snap_to_nearest};
use crate::curves::curve::{CurveId, Provenance, generate_id};
use crate::curves::curve_manager::{CurveError, CurveEvent, CurveManager};
use crate::curves::statistics::CurveStatistics;
use crate::error::{UserInputError, VizError};
use crate::fitter::fit::FitOptions;
use crate::fitter::fit_handler::{FitEvent, FitManager};
use crate::fitter::models::FitModel;
use crate::settings::VizSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartState {
    NoCurves,
    CurveSelected(CurveId),
    Fitted(CurveId),
}

/// Values shown in the side panel for the selected curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveControls {
    pub offset_text: String,
    pub factor_text: String,
    pub derivative: bool,
    pub model: Option<FitModel>,
    /// Fit only between the two cursors when both are placed.
    pub use_cursor_range: bool,
    pub snap_to_curve: bool,
    pub statistics: Option<CurveStatistics>,
    /// Last message for the user.
    pub status: Option<String>,
}

impl Default for CurveControls {
    fn default() -> Self {
        Self {
            offset_text: "0".to_owned(),
            factor_text: "1".to_owned(),
            derivative: false,
            model: None,
            use_cursor_range: false,
            snap_to_curve: false,
            statistics: None,
            status: None,
        }
    }
}

fn parse_number(field: &'static str, text: &str) -> Result<f64, UserInputError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| UserInputError::InvalidNumber {
            field,
            text: text.to_owned(),
        })
}

pub struct ChartView<S: RenderSurface> {
    surface: S,
    curves: CurveManager,
    fits: FitManager,
    curve_events: Receiver<CurveEvent>,
    fit_events: Receiver<FitEvent>,

    selected: Option<CurveId>,
    pub controls: CurveControls,

    cursors: CursorPair,
    cursor_handles: [Option<RenderHandle>; 2],
    fit_handles: IndexMap<CurveId, RenderHandle>,

    styles: StyleCycle,
    catalog_name: Option<String>,
    live_status: LiveStatus,
    title: String,
    x_label: String,
    y_label: String,
    max_iterations: usize,
}

impl<S: RenderSurface> ChartView<S> {
    pub fn new(surface: S, settings: &VizSettings) -> Self {
        let mut curves = CurveManager::new();
        let mut fits = FitManager::new();
        fits.curve_points = settings.fit_curve_points;
        let curve_events = curves.events.subscribe();
        let fit_events = fits.events.subscribe();

        Self {
            surface,
            curves,
            fits,
            curve_events,
            fit_events,
            selected: None,
            controls: CurveControls {
                snap_to_curve: settings.snap_to_curve,
                ..Default::default()
            },
            cursors: CursorPair::default(),
            cursor_handles: [None, None],
            fit_handles: IndexMap::new(),
            styles: StyleCycle::new(),
            catalog_name: None,
            live_status: LiveStatus::Static,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            max_iterations: settings.max_iterations,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn curves(&self) -> &CurveManager {
        &self.curves
    }

    pub fn fits(&self) -> &FitManager {
        &self.fits
    }

    pub fn cursors(&self) -> &CursorPair {
        &self.cursors
    }

    pub fn selected(&self) -> Option<&CurveId> {
        self.selected.as_ref()
    }

    pub fn live_status(&self) -> &LiveStatus {
        &self.live_status
    }

    pub fn state(&self) -> ChartState {
        match &self.selected {
            None => ChartState::NoCurves,
            Some(id) if self.fits.has_fit(id) => ChartState::Fitted(id.clone()),
            Some(id) => ChartState::CurveSelected(id.clone()),
        }
    }

    pub fn set_catalog_name(&mut self, name: &str) {
        self.catalog_name = Some(name.to_owned());
    }

    pub fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
        self.surface.set_title(title);
    }

    pub fn set_axis_labels(&mut self, x_label: &str, y_label: &str) {
        x_label.clone_into(&mut self.x_label);
        y_label.clone_into(&mut self.y_label);
        self.surface.set_axis_labels(x_label, y_label);
    }

    /// Plots a curve, or replaces its data when `id` is already plotted.
    pub fn plot_curve(
        &mut self,
        id: CurveId,
        x: Option<Vec<f64>>,
        y: Vec<f64>,
        label: String,
        provenance: Option<Provenance>,
    ) -> Result<CurveId, CurveError> {
        if self.curves.contains(&id) {
            self.update_curve_data(&id, x, y)?;
            return Ok(id);
        }
        if let Some(x) = &x
            && x.len() != y.len()
        {
            return Err(CurveError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }

        let style = self.styles.next_style();
        let handle = self.surface.plot(x.as_deref(), &y, &style, &label);
        self.curves
            .add_curve(id.clone(), handle, x, y, label, style, provenance)
            .inspect_err(|_| self.surface.remove(handle))?;

        log::info!("Plotted curve '{id}'");
        self.process_events();
        self.update_plot();
        Ok(id)
    }

    /// Plots every Y of `request` from one stream of a run.
    pub fn plot_fields(
        &mut self,
        catalog: &dyn Catalog,
        run: &str,
        stream: &str,
        request: &PlotRequest,
        uid_chars: usize,
    ) -> Result<Vec<CurveId>, VizError> {
        let fields = request.fields();
        let data = catalog.read_stream_data(run, stream, Some(&fields))?;
        let metadata = catalog.run_metadata(run)?;

        let mut ids = Vec::with_capacity(request.y.len());
        for y_field in &request.y {
            let (x, y) = assemble_series(&data, request.x.as_deref(), y_field, request.mon.as_deref())
                .map_err(|missing| CatalogError::FieldNotFound {
                    stream: stream.to_owned(),
                    field: missing.to_owned(),
                })?;
            let label = curve_label(&metadata, y_field, uid_chars);
            let provenance = Provenance {
                run_uid: run.to_owned(),
                stream_name: stream.to_owned(),
                y_field: y_field.clone(),
            };
            ids.push(self.plot_curve(generate_id(run, stream, y_field), x, y, label, Some(provenance))?);
        }

        self.set_catalog_name(catalog.name());
        let y_label = match &request.mon {
            Some(mon) => format!("{} / {mon}", request.y.join(", ")),
            None => request.y.join(", "),
        };
        self.set_axis_labels(request.x.as_deref().unwrap_or("index"), &y_label);
        self.update_plot();
        Ok(ids)
    }

    /// New raw data for an existing curve. Transform, style, fit and
    /// selection are kept.
    pub fn update_curve_data(&mut self, id: &str, x: Option<Vec<f64>>, y: Vec<f64>) -> Result<(), CurveError> {
        let handle = self
            .curves
            .get_curve_data(id)
            .map(|curve| curve.handle)
            .ok_or_else(|| CurveError::NotFound(id.to_owned()))?;
        self.curves.update_curve(id, handle, x, y)?;
        self.redraw_curve(id);
        self.process_events();
        self.update_plot();
        Ok(())
    }

    /// Unknown ids are ignored.
    pub fn remove_curve(&mut self, id: &str) {
        self.curves.remove_curve(id);
        self.process_events();
        self.update_plot();
    }

    pub fn remove_all_curves(&mut self) {
        self.curves.remove_all_curves();
        self.process_events();
        self.update_plot();
    }

    pub fn select_curve(&mut self, id: &str) -> bool {
        if !self.curves.contains(id) {
            return false;
        }
        self.selected = Some(id.to_owned());
        self.refresh_controls();
        true
    }

    /// Parses and applies the offset and factor of the selected curve. Any
    /// attached fit is left as it is.
    pub fn apply_offset_factor(&mut self, offset_text: &str, factor_text: &str) -> Result<(), UserInputError> {
        let result = self.try_apply_offset_factor(offset_text, factor_text);
        self.report(result)
    }

    fn try_apply_offset_factor(&mut self, offset_text: &str, factor_text: &str) -> Result<(), UserInputError> {
        let id = self.selected.clone().ok_or(UserInputError::NoCurveSelected)?;
        let offset = parse_number("offset", offset_text)?;
        let factor = parse_number("factor", factor_text)?;

        self.curves.update_offset_factor(&id, offset, factor);
        self.redraw_curve(&id);
        self.refresh_controls();
        self.update_plot();
        Ok(())
    }

    pub fn set_derivative(&mut self, derivative: bool) -> Result<(), UserInputError> {
        let result = match self.selected.clone() {
            Some(id) => {
                self.curves.update_derivative(&id, derivative);
                self.redraw_curve(&id);
                self.refresh_controls();
                self.update_plot();
                Ok(())
            }
            None => Err(UserInputError::NoCurveSelected),
        };
        self.report(result)
    }

    /// Fits the model chosen in the controls to the selected curve's
    /// displayed data.
    pub fn fit_selected(&mut self) -> Result<(), VizError> {
        let result = self.try_fit_selected();
        if let Err(e) = &result {
            self.controls.status = Some(e.to_string());
        }
        result
    }

    fn try_fit_selected(&mut self) -> Result<(), VizError> {
        let id = self.selected.clone().ok_or(UserInputError::NoCurveSelected)?;
        let model = self.controls.model.ok_or(UserInputError::NoModelSelected)?;

        let x_range = match (self.controls.use_cursor_range, self.cursors.p1, self.cursors.p2) {
            (true, Some(p1), Some(p2)) => Some((p1[0].min(p2[0]), p1[0].max(p2[0]))),
            _ => None,
        };
        let options = FitOptions {
            x_range,
            max_iterations: Some(self.max_iterations),
            ..Default::default()
        };
        self.fit_curve(&id, model, &options)
    }

    /// Fits `model` to a curve's transformed data. On success this becomes
    /// the only fit on the chart; on failure nothing changes.
    pub fn fit_curve(&mut self, id: &str, model: FitModel, options: &FitOptions) -> Result<(), VizError> {
        let (x, y) = self
            .curves
            .get_xy_data(id)
            .ok_or_else(|| CurveError::NotFound(id.to_owned()))?;

        if let Err(e) = self.fits.add_fit(id, &model.name(), &x, &y, options) {
            log::warn!("{model} fit of '{id}' failed: {e}");
            return Err(e.into());
        }

        for other in self.fits.fit_ids() {
            if other != id {
                self.fits.remove_fit(&other);
            }
        }

        self.controls.status = Some(format!("{model} fit done"));
        self.process_events();
        self.update_plot();
        Ok(())
    }

    pub fn clear_fit(&mut self) {
        if let Some(id) = self.selected.clone() {
            self.fits.remove_fit(&id);
            self.process_events();
            self.update_plot();
        }
    }

    /// Places a cursor for a plot click. Returns which one moved.
    pub fn handle_click(&mut self, button: ClickButton, alt: bool, point: [f64; 2]) -> Option<CursorId> {
        let cursor = cursor_for_click(button, alt)?;
        let point = if self.controls.snap_to_curve {
            self.snap(point).unwrap_or(point)
        } else {
            point
        };
        self.set_cursor(cursor, point);
        Some(cursor)
    }

    pub fn set_cursor(&mut self, cursor: CursorId, point: [f64; 2]) {
        self.cursors.set(cursor, point);

        let slot = cursor_slot(cursor);
        if let Some(handle) = self.cursor_handles[slot].take() {
            self.surface.remove(handle);
        }
        let style = CurveStyle::cursor(CURSOR_COLORS[slot]);
        let handle = self
            .surface
            .plot(Some(&[point[0]]), &[point[1]], &style, &cursor.to_string());
        self.cursor_handles[slot] = Some(handle);
        self.surface.redraw();
    }

    pub fn clear_cursor(&mut self, cursor: CursorId) {
        self.cursors.clear(cursor);
        if let Some(handle) = self.cursor_handles[cursor_slot(cursor)].take() {
            self.surface.remove(handle);
        }
        self.surface.redraw();
    }

    pub fn clear_cursors(&mut self) {
        self.clear_cursor(CursorId::Primary);
        self.clear_cursor(CursorId::Secondary);
    }

    pub fn set_live_status(&mut self, status: LiveStatus) {
        self.live_status = status;
        let subtitle = self.subtitle();
        self.surface.set_subtitle(&subtitle);
        self.surface.redraw();
    }

    pub fn subtitle(&self) -> String {
        let plotted = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let base = format!(
            "catalog='{}'  plotted: {plotted}",
            self.catalog_name.as_deref().unwrap_or_default()
        );
        match self.live_status.prefix() {
            Some(prefix) => format!("{prefix}  {base}"),
            None => base,
        }
    }

    /// Labels, limits and legend after the set of curves changed.
    pub fn update_plot(&mut self) {
        let subtitle = self.subtitle();
        self.surface.set_title(&self.title);
        self.surface.set_subtitle(&subtitle);
        self.surface.set_axis_labels(&self.x_label, &self.y_label);
        self.surface.rescale_axes();
        self.surface.rebuild_legend();
        self.surface.redraw();
    }

    fn snap(&self, point: [f64; 2]) -> Option<[f64; 2]> {
        let id = self.selected.as_ref()?;
        let (x, y) = self.curves.get_xy_data(id)?;
        let (x_span, y_span) = match self.surface.view_bounds() {
            Some(bounds) => (bounds.x_span(), bounds.y_span()),
            None => {
                let span = |v: &[f64]| {
                    let (min, max) = v
                        .iter()
                        .filter(|v| v.is_finite())
                        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
                    max - min
                };
                (span(&x), span(&y))
            }
        };
        snap_to_nearest(point, &x, &y, x_span, y_span)
    }

    fn redraw_curve(&mut self, id: &str) {
        if let Some(curve) = self.curves.get_curve_data(id) {
            let (x, y) = curve.transformed();
            self.surface.set_data(curve.handle, &x, &y);
        }
    }

    fn refresh_controls(&mut self) {
        let Some(id) = &self.selected else {
            self.controls.statistics = None;
            self.controls.offset_text = "0".to_owned();
            self.controls.factor_text = "1".to_owned();
            self.controls.derivative = false;
            return;
        };
        if let Some(curve) = self.curves.get_curve_data(id) {
            let (x, y) = curve.transformed();
            self.controls.statistics = Some(CurveStatistics::compute(&x, &y));
            self.controls.offset_text = curve.transform.offset.to_string();
            self.controls.factor_text = curve.transform.factor.to_string();
            self.controls.derivative = curve.transform.derivative;
        }
    }

    fn report<T>(&mut self, result: Result<T, UserInputError>) -> Result<T, UserInputError> {
        if let Err(e) = &result {
            log::warn!("{e}");
            self.controls.status = Some(e.to_string());
        }
        result
    }

    /// Applies queued registry events until both channels are empty.
    fn process_events(&mut self) {
        loop {
            let mut handled = false;
            while let Ok(event) = self.curve_events.try_recv() {
                handled = true;
                self.on_curve_event(event);
            }
            while let Ok(event) = self.fit_events.try_recv() {
                handled = true;
                self.on_fit_event(event);
            }
            if !handled {
                break;
            }
        }
    }

    fn on_curve_event(&mut self, event: CurveEvent) {
        match event {
            CurveEvent::Added(id) => {
                if self.selected.is_none() {
                    self.selected = Some(id);
                    self.refresh_controls();
                }
            }
            CurveEvent::Updated { id, recompute_y, x_changed } => {
                if (recompute_y || x_changed) && self.selected.as_deref() == Some(id.as_str()) {
                    self.refresh_controls();
                }
            }
            CurveEvent::Removed { curve, remaining } => {
                self.surface.remove(curve.handle);
                self.fits.remove_fit(&curve.id);
                if self.selected.as_deref() == Some(curve.id.as_str()) {
                    self.selected = self.curves.first_id().cloned();
                    self.refresh_controls();
                }
                if remaining == 0 {
                    self.clear_cursors();
                }
                log::debug!("Curve '{}' removed, {remaining} left", curve.id);
            }
            CurveEvent::AllRemoved(removed) => {
                for curve in &removed {
                    self.surface.remove(curve.handle);
                }
                self.fits.clear();
                self.selected = None;
                self.refresh_controls();
                self.clear_cursors();
                log::debug!("All {} curves removed", removed.len());
            }
        }
    }

    fn on_fit_event(&mut self, event: FitEvent) {
        match event {
            FitEvent::Added(id) | FitEvent::Updated(id) => {
                if let Some(handle) = self.fit_handles.shift_remove(&id) {
                    self.surface.remove(handle);
                }
                if let Some((x, y)) = self.fits.get_fit_curve_data(&id) {
                    let model = self
                        .fits
                        .get_fit_data(&id)
                        .map(|fit| fit.model.name())
                        .unwrap_or_default();
                    let handle = self
                        .surface
                        .plot(Some(&x), &y, &CurveStyle::fit_overlay(), &format!("{model} fit"));
                    self.fit_handles.insert(id, handle);
                }
            }
            FitEvent::Removed(id) => {
                if let Some(handle) = self.fit_handles.shift_remove(&id) {
                    self.surface.remove(handle);
                }
            }
        }
    }
}

fn cursor_slot(cursor: CursorId) -> usize {
    match cursor {
        CursorId::Primary => 0,
        CursorId::Secondary => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::render::RecordingSurface;
    use crate::plot::style::LineKind;

    fn chart() -> ChartView<RecordingSurface> {
        ChartView::new(RecordingSurface::new(), &VizSettings::default())
    }

    fn gaussian_points() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..61).map(|i| -1.0 + i as f64 * 0.1).collect();
        let y = x
            .iter()
            .map(|x| 5.0 * (-(x - 2.0) * (x - 2.0) / 2.0).exp())
            .collect();
        (x, y)
    }

    fn add(chart: &mut ChartView<RecordingSurface>, field: &str) -> CurveId {
        let (x, y) = gaussian_points();
        chart
            .plot_curve(generate_id("uid", "primary", field), Some(x), y, field.to_owned(), None)
            .unwrap()
    }

    #[test]
    fn first_curve_is_selected() {
        let mut chart = chart();
        assert_eq!(chart.state(), ChartState::NoCurves);

        let a = add(&mut chart, "I0");
        add(&mut chart, "I00");

        assert_eq!(chart.state(), ChartState::CurveSelected(a));
        assert!(chart.controls.statistics.is_some());
        assert_eq!(chart.surface().series.len(), 2);
    }

    #[test]
    fn removing_selected_selects_first_remaining() {
        let mut chart = chart();
        let a = add(&mut chart, "I0");
        let b = add(&mut chart, "I00");
        let c = add(&mut chart, "diode");

        chart.select_curve(&b);
        chart.remove_curve(&b);
        assert_eq!(chart.selected(), Some(&a));

        chart.remove_curve(&a);
        assert_eq!(chart.selected(), Some(&c));

        chart.remove_curve(&c);
        assert_eq!(chart.state(), ChartState::NoCurves);
        assert!(chart.surface().series.is_empty());
    }

    #[test]
    fn replotting_the_same_field_updates_in_place() {
        let mut chart = chart();
        let id = add(&mut chart, "I0");
        let handle = chart.curves().get_curve_data(&id).unwrap().handle;

        chart
            .plot_curve(id.clone(), Some(vec![0.0, 1.0]), vec![3.0, 4.0], "I0".to_owned(), None)
            .unwrap();

        assert_eq!(chart.curves().len(), 1);
        assert_eq!(chart.curves().get_curve_data(&id).unwrap().handle, handle);
        assert_eq!(chart.surface().get(handle).unwrap().y, vec![3.0, 4.0]);
    }

    #[test]
    fn offset_factor_input() {
        let mut chart = chart();
        let id = add(&mut chart, "I0");

        let err = chart.apply_offset_factor("abc", "2").unwrap_err();
        assert_eq!(
            err,
            UserInputError::InvalidNumber {
                field: "offset",
                text: "abc".to_owned()
            }
        );
        assert!(chart.curves().get_curve_data(&id).unwrap().transform.is_identity());
        assert!(chart.controls.status.is_some());

        chart.apply_offset_factor(" 1.5 ", "2").unwrap();
        let handle = chart.curves().get_curve_data(&id).unwrap().handle;
        let (_, raw) = gaussian_points();
        let shown = &chart.surface().get(handle).unwrap().y;
        assert!((shown[0] - (2.0 * raw[0] + 1.5)).abs() < 1e-12);
        assert_eq!(chart.controls.factor_text, "2");
    }

    #[test]
    fn transform_without_selection() {
        let mut chart = chart();
        assert_eq!(
            chart.set_derivative(true).unwrap_err(),
            UserInputError::NoCurveSelected
        );
    }

    #[test]
    fn fit_needs_a_model() {
        let mut chart = chart();
        add(&mut chart, "I0");
        let err = chart.fit_selected().unwrap_err();
        assert!(matches!(err, VizError::UserInput(UserInputError::NoModelSelected)));
        assert_eq!(chart.fits().len(), 0);
    }

    #[test]
    fn fit_draws_dashed_overlay_above_data() {
        let mut chart = chart();
        let id = add(&mut chart, "I0");
        chart.controls.model = Some(FitModel::Gaussian);

        chart.fit_selected().unwrap();

        assert_eq!(chart.state(), ChartState::Fitted(id.clone()));
        let overlay = chart
            .surface()
            .series
            .values()
            .find(|s| s.style.line == LineKind::Dashed)
            .unwrap();
        assert_eq!(overlay.x.len(), 500);
        let data_z = chart.curves().get_curve_data(&id).unwrap().style.z_order;
        assert!(overlay.style.z_order > data_z);

        chart.clear_fit();
        assert_eq!(chart.state(), ChartState::CurveSelected(id));
        assert_eq!(chart.surface().series.len(), 1);
    }

    #[test]
    fn transform_change_keeps_stale_fit() {
        let mut chart = chart();
        let id = add(&mut chart, "I0");
        chart.controls.model = Some(FitModel::Gaussian);
        chart.fit_selected().unwrap();
        let before = chart.fits().get_fit_data(&id).cloned();

        chart.apply_offset_factor("10", "1").unwrap();
        chart.set_derivative(true).unwrap();

        assert_eq!(chart.fits().get_fit_data(&id).cloned(), before);
    }

    #[test]
    fn failed_fit_keeps_state() {
        let mut chart = chart();
        let id = add(&mut chart, "I0");
        let options = FitOptions {
            x_range: Some((100.0, 200.0)),
            ..Default::default()
        };
        let err = chart.fit_curve(&id, FitModel::Gaussian, &options).unwrap_err();
        assert!(matches!(err, VizError::Fit(_)));
        assert_eq!(chart.state(), ChartState::CurveSelected(id));
    }

    #[test]
    fn removing_a_curve_removes_its_fit() {
        let mut chart = chart();
        let id = add(&mut chart, "I0");
        chart.controls.model = Some(FitModel::Gaussian);
        chart.fit_selected().unwrap();

        chart.remove_curve(&id);

        assert!(chart.fits().is_empty());
        assert!(chart.surface().series.is_empty());
    }

    #[test]
    fn cursors_from_clicks() {
        let mut chart = chart();
        add(&mut chart, "I0");

        assert_eq!(chart.handle_click(ClickButton::Primary, false, [0.0, 0.0]), None);
        assert_eq!(
            chart.handle_click(ClickButton::Middle, false, [1.0, 2.0]),
            Some(CursorId::Primary)
        );
        assert_eq!(
            chart.handle_click(ClickButton::Secondary, false, [3.0, 5.0]),
            Some(CursorId::Secondary)
        );
        assert_eq!(chart.cursors().difference(), Some([2.0, 3.0]));
        // data curve + two markers
        assert_eq!(chart.surface().series.len(), 3);

        chart.handle_click(ClickButton::Secondary, true, [0.5, 0.5]);
        assert_eq!(chart.cursors().p1, Some([0.5, 0.5]));
        assert_eq!(chart.surface().series.len(), 3);

        chart.remove_all_curves();
        assert_eq!(chart.cursors().p1, None);
        assert!(chart.surface().series.is_empty());
    }

    #[test]
    fn snapped_cursor_lands_on_data() {
        let mut chart = chart();
        add(&mut chart, "I0");
        chart.controls.snap_to_curve = true;

        chart.handle_click(ClickButton::Middle, false, [2.01, 5.3]);

        let [x, y] = chart.cursors().p1.unwrap();
        assert!((x - 2.0).abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn subtitle_follows_live_status() {
        let mut chart = chart();
        chart.set_catalog_name("training");
        assert!(chart.subtitle().starts_with("catalog='training'  plotted: "));

        chart.set_live_status(LiveStatus::Live);
        assert!(chart.surface().subtitle.starts_with("LIVE  catalog='training'"));

        chart.set_live_status(LiveStatus::Completed);
        assert!(chart.surface().subtitle.starts_with("completed  "));
    }
}
