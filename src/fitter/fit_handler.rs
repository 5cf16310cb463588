use indexmap::IndexMap;

use super::fit::{FitError, FitOptions, FitResult, fit, fit_curve_points};
use super::models::{FitModel, ParameterMap};
use crate::curves::curve::CurveId;
use crate::events::Signal;

/// The stored fit of one curve.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FitData {
    pub model: FitModel,
    pub result: FitResult,
    pub x_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct QualityMetrics {
    pub r_squared: f64,
    pub chi_squared: f64,
    pub reduced_chi_squared: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitEvent {
    Added(CurveId),
    Updated(CurveId),
    Removed(CurveId),
}

/// Fits keyed by curve, at most one per curve.
#[derive(Debug)]
pub struct FitManager {
    fits: IndexMap<CurveId, FitData>,
    pub events: Signal<FitEvent>,
    /// Samples in the smooth display curve.
    pub curve_points: usize,
}

impl Default for FitManager {
    fn default() -> Self {
        Self {
            fits: IndexMap::new(),
            events: Signal::new(),
            curve_points: 500,
        }
    }
}

impl FitManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fits `model_name` to the data and stores the result for `curve_id`,
    /// replacing any earlier fit. Nothing is stored when the fit fails.
    ///
    /// Data containing NaN is rejected. Every failure other than an unknown
    /// model comes back as [`FitError::FitFailed`] carrying the cause.
    pub fn add_fit(
        &mut self,
        curve_id: &str,
        model_name: &str,
        x: &[f64],
        y: &[f64],
        options: &FitOptions,
    ) -> Result<&FitData, FitError> {
        let model = FitModel::from_name(model_name)
            .ok_or_else(|| FitError::UnknownModel(model_name.to_owned()))?;
        if x.iter().chain(y).any(|v| v.is_nan()) {
            return Err(FitError::FitFailed("Input data contains NaN values".to_owned()));
        }
        let result = fit(x, y, model, options).map_err(|e| match e {
            FitError::FitFailed(_) | FitError::UnknownModel(_) => e,
            other => FitError::FitFailed(other.to_string()),
        })?;
        Ok(self.store(curve_id, model, result, options.x_range))
    }

    fn store(
        &mut self,
        curve_id: &str,
        model: FitModel,
        result: FitResult,
        x_range: Option<(f64, f64)>,
    ) -> &FitData {
        let data = FitData {
            model,
            result,
            x_range,
        };
        let (index, previous) = self.fits.insert_full(curve_id.to_owned(), data);

        let event = if previous.is_some() {
            FitEvent::Updated(curve_id.to_owned())
        } else {
            FitEvent::Added(curve_id.to_owned())
        };
        log::info!("{model} fit stored for '{curve_id}'");
        self.events.emit(&event);

        &self.fits[index]
    }

    pub fn remove_fit(&mut self, curve_id: &str) {
        if self.fits.shift_remove(curve_id).is_some() {
            log::debug!("Removed fit of '{curve_id}'");
            self.events.emit(&FitEvent::Removed(curve_id.to_owned()));
        }
    }

    /// Removes every fit, one notification per fit.
    pub fn clear(&mut self) {
        for curve_id in self.fit_ids() {
            self.remove_fit(&curve_id);
        }
    }

    pub fn has_fit(&self, curve_id: &str) -> bool {
        self.fits.contains_key(curve_id)
    }

    pub fn get_fit_data(&self, curve_id: &str) -> Option<&FitData> {
        self.fits.get(curve_id)
    }

    pub fn get_fit_parameters(&self, curve_id: &str) -> Option<&ParameterMap> {
        self.fits.get(curve_id).map(|fit| &fit.result.parameters)
    }

    pub fn get_fit_uncertainties(&self, curve_id: &str) -> Option<&ParameterMap> {
        self.fits.get(curve_id).map(|fit| &fit.result.uncertainties)
    }

    pub fn get_fit_quality_metrics(&self, curve_id: &str) -> Option<QualityMetrics> {
        self.fits.get(curve_id).map(|fit| QualityMetrics {
            r_squared: fit.result.r_squared,
            chi_squared: fit.result.chi_squared,
            reduced_chi_squared: fit.result.reduced_chi_squared,
        })
    }

    /// Smooth `(x, y)` of the stored model across the fitted x span.
    pub fn get_fit_curve_data(&self, curve_id: &str) -> Option<(Vec<f64>, Vec<f64>)> {
        self.fits.get(curve_id).map(|fit| {
            fit_curve_points(
                fit.model,
                &fit.result.parameters,
                &fit.result.x_fit,
                self.curve_points,
            )
        })
    }

    pub fn fit_ids(&self) -> Vec<CurveId> {
        self.fits.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.fits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.fits)
    }

    /// Parameter table of one fit.
    pub fn fit_stats_grid_ui(&self, ui: &mut egui::Ui, curve_id: &str) {
        let Some(fit) = self.fits.get(curve_id) else {
            return;
        };

        egui::Grid::new("fit_params_grid")
            .striped(true)
            .show(ui, |ui| {
                ui.label("Parameter");
                ui.label("Value");
                ui.label("Uncertainty");
                ui.end_row();

                for (name, value) in &fit.result.parameters {
                    let uncertainty = fit.result.uncertainties.get(name).copied().unwrap_or(0.0);
                    ui.label(name);
                    ui.label(format!("{value:.6}"));
                    ui.label(format!("± {uncertainty:.6}"));
                    ui.end_row();
                }

                ui.label("R²");
                ui.label(format!("{:.6}", fit.result.r_squared));
                ui.end_row();
                ui.label("χ²");
                ui.label(format!("{:.6}", fit.result.chi_squared));
                ui.end_row();
                ui.label("Reduced χ²");
                ui.label(format!("{:.6}", fit.result.reduced_chi_squared));
                ui.end_row();
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn line_data() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y = x.iter().map(|x| 2.0 * x + 1.0).collect();
        (x, y)
    }

    fn recorder(manager: &mut FitManager) -> Rc<RefCell<Vec<FitEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        manager.events.connect(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn add_then_replace() {
        let mut manager = FitManager::new();
        let events = recorder(&mut manager);
        let (x, y) = line_data();

        manager.add_fit("a", "Linear", &x, &y, &FitOptions::default()).unwrap();
        manager.add_fit("a", "Quadratic", &x, &y, &FitOptions::default()).unwrap();

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get_fit_data("a").unwrap().model, FitModel::Polynomial(2));
        assert_eq!(
            *events.borrow(),
            vec![FitEvent::Added("a".to_owned()), FitEvent::Updated("a".to_owned())]
        );
    }

    #[test]
    fn unknown_model() {
        let mut manager = FitManager::new();
        let (x, y) = line_data();
        let err = manager
            .add_fit("a", "Voigt", &x, &y, &FitOptions::default())
            .unwrap_err();
        assert_eq!(err, FitError::UnknownModel("Voigt".to_owned()));
        assert!(!manager.has_fit("a"));
    }

    #[test]
    fn failed_fit_leaves_existing_fit() {
        let mut manager = FitManager::new();
        let (x, y) = line_data();
        manager.add_fit("a", "Linear", &x, &y, &FitOptions::default()).unwrap();
        let before = manager.get_fit_data("a").cloned();

        let options = FitOptions {
            x_range: Some((5.0, 1.0)),
            ..Default::default()
        };
        let err = manager.add_fit("a", "Gaussian", &x, &y, &options).unwrap_err();

        match err {
            FitError::FitFailed(msg) => assert!(msg.starts_with("Invalid range"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(manager.get_fit_data("a").cloned(), before);
    }

    #[test]
    fn nan_input_is_rejected() {
        let mut manager = FitManager::new();
        let events = recorder(&mut manager);
        let (x, mut y) = line_data();
        y[4] = f64::NAN;

        let err = manager
            .add_fit("c", "Linear", &x, &y, &FitOptions::default())
            .unwrap_err();

        assert_eq!(err.to_string(), "Fit failed: Input data contains NaN values");
        assert!(!manager.has_fit("c"));
        assert!(events.borrow().is_empty());

        let (mut x, y) = line_data();
        x[0] = f64::NAN;
        assert!(manager.add_fit("c", "Linear", &x, &y, &FitOptions::default()).is_err());
    }

    #[test]
    fn engine_errors_are_reported_as_fit_failures() {
        let mut manager = FitManager::new();
        let (x, y) = line_data();

        let err = manager
            .add_fit("a", "Cubic", &x[..3], &y[..3], &FitOptions::default())
            .unwrap_err();
        assert!(matches!(err, FitError::FitFailed(_)), "{err}");
        assert!(err.to_string().starts_with("Fit failed: Not enough data points"), "{err}");
    }

    #[test]
    fn accessors() {
        let mut manager = FitManager::new();
        let (x, y) = line_data();
        manager.add_fit("a", "Linear", &x, &y, &FitOptions::default()).unwrap();

        let params = manager.get_fit_parameters("a").unwrap();
        assert!((params["slope"] - 2.0).abs() < 1e-6);
        assert_eq!(manager.get_fit_uncertainties("a").unwrap().len(), 2);
        let metrics = manager.get_fit_quality_metrics("a").unwrap();
        assert!((metrics.r_squared - 1.0).abs() < 1e-9);

        let (cx, cy) = manager.get_fit_curve_data("a").unwrap();
        assert_eq!(cx.len(), 500);
        assert!((cy[0] - 1.0).abs() < 1e-6);

        assert!(manager.get_fit_parameters("b").is_none());
        assert!(manager.get_fit_quality_metrics("b").is_none());
        assert!(manager.get_fit_curve_data("b").is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut manager = FitManager::new();
        let (x, y) = line_data();
        manager.add_fit("a", "Linear", &x, &y, &FitOptions::default()).unwrap();
        let events = recorder(&mut manager);

        manager.remove_fit("a");
        manager.remove_fit("a");

        assert_eq!(*events.borrow(), vec![FitEvent::Removed("a".to_owned())]);
        assert!(manager.is_empty());
    }

    #[test]
    fn json_export() {
        let mut manager = FitManager::new();
        let (x, y) = line_data();
        manager.add_fit("a", "Linear", &x, &y, &FitOptions::default()).unwrap();

        let json = manager.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["a"]["result"]["parameters"]["slope"].is_number());
        assert_eq!(value["a"]["model"], "Linear");
    }
}
