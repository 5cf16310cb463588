use std::fmt::Display;

use indexmap::IndexMap;

use super::least_squares::{DEFAULT_PATIENCE, least_squares};
use super::models::{FitModel, ParameterMap, min_max};

/// Parameter name → `(lower, upper)`.
pub type Bounds = IndexMap<String, (f64, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    InsufficientData { needed: usize, found: usize },
    InvalidRange { low: f64, high: f64 },
    EmptyRange { low: f64, high: f64 },
    InvalidInput(String),
    UnknownModel(String),
    LengthMismatch { x: usize, y: usize },
    FitFailed(String),
}

impl Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::InsufficientData { needed, found } => write!(
                f,
                "Not enough data points for {needed} parameters (found {found})"
            ),
            FitError::InvalidRange { low, high } => {
                write!(f, "Invalid range: {low} must be less than {high}")
            }
            FitError::EmptyRange { low, high } => {
                write!(f, "No data points found in range [{low}, {high}]")
            }
            FitError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            FitError::UnknownModel(name) => write!(f, "Unknown fit model: {name}"),
            FitError::LengthMismatch { x, y } => write!(
                f,
                "X and Y data must have the same length (x: {x}, y: {y})"
            ),
            FitError::FitFailed(msg) => write!(f, "Fit failed: {msg}"),
        }
    }
}

impl std::error::Error for FitError {}

#[derive(Debug, Clone, Default)]
pub struct FitOptions {
    /// Inclusive fitting window.
    pub x_range: Option<(f64, f64)>,
    pub initial_guess: Option<ParameterMap>,
    pub bounds: Option<Bounds>,
    /// Solver patience: the evaluation budget is this times one more than
    /// the parameter count.
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FitResult {
    pub parameters: ParameterMap,
    pub uncertainties: ParameterMap,
    pub r_squared: f64,
    pub chi_squared: f64,
    /// `+∞` when there are no degrees of freedom.
    pub reduced_chi_squared: f64,
    /// Model evaluated at `x_fit`.
    pub fit_curve: Vec<f64>,
    /// The finite x values the fit used.
    pub x_fit: Vec<f64>,
}

/// Least squares fit of `model` to the data.
///
/// Non-finite pairs are dropped before fitting. The inputs are only read, so
/// this may be called from any thread on a copy of the data.
pub fn fit(x: &[f64], y: &[f64], model: FitModel, options: &FitOptions) -> Result<FitResult, FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }

    let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();

    if let Some((low, high)) = options.x_range {
        if low.is_nan() || high.is_nan() || low >= high {
            return Err(FitError::InvalidRange { low, high });
        }
        pairs.retain(|(x, _)| *x >= low && *x <= high);
        if pairs.is_empty() {
            return Err(FitError::EmptyRange { low, high });
        }
    }

    pairs.retain(|(x, y)| x.is_finite() && y.is_finite());
    let (x_fit, y_fit): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

    let needed = model.parameter_count();
    if x_fit.len() < needed {
        return Err(FitError::InsufficientData {
            needed,
            found: x_fit.len(),
        });
    }

    let names = model.parameter_names();
    let initial = match &options.initial_guess {
        Some(guess) => model.parameter_values(guess),
        None => model.parameter_values(&model.default_initial_guess(&x_fit, &y_fit)),
    };
    if let Some((name, value)) = names.iter().zip(&initial).find(|(_, v)| !v.is_finite()) {
        return Err(FitError::InvalidInput(format!(
            "initial guess for '{name}' is {value}"
        )));
    }

    let mut lower = Vec::with_capacity(needed);
    let mut upper = Vec::with_capacity(needed);
    for name in &names {
        let (lo, hi) = options
            .bounds
            .as_ref()
            .and_then(|bounds| bounds.get(name).copied())
            .unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
        if lo.is_nan() || hi.is_nan() || lo >= hi {
            return Err(FitError::InvalidInput(format!(
                "bounds for '{name}' are [{lo}, {hi}]"
            )));
        }
        lower.push(lo);
        upper.push(hi);
    }

    let solution = least_squares(
        |x, p| model.evaluate(x, p),
        &x_fit,
        &y_fit,
        &initial,
        &lower,
        &upper,
        options.max_iterations.unwrap_or(DEFAULT_PATIENCE),
    )
    .map_err(|e| FitError::FitFailed(e.to_string()))?;

    let fit_curve = model.evaluate_all(&x_fit, &solution.parameters);
    if fit_curve.iter().any(|v| !v.is_finite()) {
        return Err(FitError::FitFailed(
            "fitted curve contains non-finite values".to_owned(),
        ));
    }

    let n = y_fit.len();
    let mean = y_fit.iter().sum::<f64>() / n as f64;
    let ss_res: f64 = y_fit
        .iter()
        .zip(&fit_curve)
        .map(|(y, f)| (y - f).powi(2))
        .sum();
    let ss_tot: f64 = y_fit.iter().map(|y| (y - mean).powi(2)).sum();

    let r_squared = if ss_tot != 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };
    let reduced_chi_squared = if n > needed {
        ss_res / (n - needed) as f64
    } else {
        f64::INFINITY
    };

    log::debug!(
        "{model} fit over {n} points: chi2 = {ss_res}, R2 = {r_squared}, {} evaluations",
        solution.evaluations
    );

    Ok(FitResult {
        parameters: names.iter().cloned().zip(solution.parameters).collect(),
        uncertainties: names.into_iter().zip(solution.uncertainties).collect(),
        r_squared,
        chi_squared: ss_res,
        reduced_chi_squared,
        fit_curve,
        x_fit,
    })
}

/// Smooth curve for display: `points` evenly spaced samples of the model
/// between the smallest and largest fitted x.
pub fn fit_curve_points(
    model: FitModel,
    parameters: &ParameterMap,
    x_fit: &[f64],
    points: usize,
) -> (Vec<f64>, Vec<f64>) {
    if x_fit.is_empty() || points == 0 {
        return (Vec::new(), Vec::new());
    }
    let (min, max) = min_max(x_fit);
    let values = model.parameter_values(parameters);

    let x: Vec<f64> = if points == 1 {
        vec![min]
    } else {
        let step = (max - min) / (points - 1) as f64;
        (0..points).map(|i| min + step * i as f64).collect()
    };
    let y = model.evaluate_all(&x, &values);
    (x, y)
}
