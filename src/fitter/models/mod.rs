pub mod erf;
pub mod exponential;
pub mod linear;
pub mod peak;
pub mod polynomial;

use std::fmt::Display;

use indexmap::IndexMap;

/// Parameter name → value, in the model's parameter order.
pub type ParameterMap = IndexMap<String, f64>;

/// The registered model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum FitModel {
    Gaussian,
    Lorentzian,
    NegativeGaussian,
    NegativeLorentzian,
    Linear,
    Exponential,
    Polynomial(usize),
    ErrorFunction,
    TopHat,
}

pub const AVAILABLE_MODELS: [FitModel; 10] = [
    FitModel::Gaussian,
    FitModel::Lorentzian,
    FitModel::NegativeGaussian,
    FitModel::NegativeLorentzian,
    FitModel::Linear,
    FitModel::Exponential,
    FitModel::Polynomial(2),
    FitModel::Polynomial(3),
    FitModel::ErrorFunction,
    FitModel::TopHat,
];

pub fn available_models() -> &'static [FitModel] {
    &AVAILABLE_MODELS
}

impl Display for FitModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gaussian => write!(f, "Gaussian"),
            Self::Lorentzian => write!(f, "Lorentzian"),
            Self::NegativeGaussian => write!(f, "Negative Gaussian"),
            Self::NegativeLorentzian => write!(f, "Negative Lorentzian"),
            Self::Linear => write!(f, "Linear"),
            Self::Exponential => write!(f, "Exponential"),
            Self::Polynomial(2) => write!(f, "Quadratic"),
            Self::Polynomial(3) => write!(f, "Cubic"),
            Self::Polynomial(degree) => write!(f, "Polynomial (deg={degree})"),
            Self::ErrorFunction => write!(f, "Error Function"),
            Self::TopHat => write!(f, "Top Hat"),
        }
    }
}

impl FitModel {
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Looks a model up by its display name.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(model) = AVAILABLE_MODELS.iter().find(|m| m.name() == name) {
            return Some(*model);
        }
        name.strip_prefix("Polynomial (deg=")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|degree| degree.parse().ok())
            .map(Self::Polynomial)
    }

    pub fn parameter_names(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::Gaussian | Self::NegativeGaussian | Self::ErrorFunction => {
                &["amplitude", "center", "sigma", "offset"]
            }
            Self::Lorentzian | Self::NegativeLorentzian => &["amplitude", "center", "gamma", "offset"],
            Self::Linear => &["slope", "intercept"],
            Self::Exponential => &["amplitude", "decay", "offset"],
            Self::TopHat => &["amplitude", "a", "b", "sigma", "offset"],
            Self::Polynomial(degree) => {
                return (0..=*degree).map(|i| format!("coeff_{i}")).collect();
            }
        };
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    pub fn parameter_count(&self) -> usize {
        match self {
            Self::Polynomial(degree) => degree + 1,
            Self::Linear => 2,
            Self::Exponential => 3,
            Self::TopHat => 5,
            _ => 4,
        }
    }

    /// Model value at `x`. `params` are in [`Self::parameter_names`] order;
    /// a wrong parameter count evaluates to NaN.
    pub fn evaluate(&self, x: f64, params: &[f64]) -> f64 {
        if params.len() != self.parameter_count() {
            return f64::NAN;
        }
        match self {
            Self::Gaussian | Self::NegativeGaussian => {
                peak::gaussian(x, params[0], params[1], params[2], params[3])
            }
            Self::Lorentzian | Self::NegativeLorentzian => {
                peak::lorentzian(x, params[0], params[1], params[2], params[3])
            }
            Self::Linear => linear::linear(x, params[0], params[1]),
            Self::Exponential => exponential::exponential(x, params[0], params[1], params[2]),
            Self::Polynomial(_) => polynomial::polynomial(x, params),
            Self::ErrorFunction => erf::error_function(x, params[0], params[1], params[2], params[3]),
            Self::TopHat => erf::top_hat(x, params[0], params[1], params[2], params[3], params[4]),
        }
    }

    pub fn evaluate_all(&self, x: &[f64], params: &[f64]) -> Vec<f64> {
        x.iter().map(|&x| self.evaluate(x, params)).collect()
    }

    /// Starting point for the solver, estimated from the data.
    ///
    /// Expects finite data of equal length. Empty data gives 1.0 for every
    /// parameter.
    pub fn default_initial_guess(&self, x: &[f64], y: &[f64]) -> ParameterMap {
        let names = self.parameter_names();
        if x.is_empty() || x.len() != y.len() {
            return names.into_iter().map(|name| (name, 1.0)).collect();
        }

        let values = match self {
            Self::Gaussian => peak::gaussian_guess(x, y, false),
            Self::NegativeGaussian => peak::gaussian_guess(x, y, true),
            Self::Lorentzian => peak::lorentzian_guess(x, y, false),
            Self::NegativeLorentzian => peak::lorentzian_guess(x, y, true),
            Self::Linear => linear::linear_guess(x, y),
            Self::Exponential => exponential::exponential_guess(x, y),
            Self::Polynomial(degree) => polynomial::polynomial_guess(x, y, *degree),
            Self::ErrorFunction => erf::error_function_guess(x, y),
            Self::TopHat => erf::top_hat_guess(x, y),
        };

        names.into_iter().zip(values).collect()
    }

    /// Parameter values in model order, taking 1.0 for any missing name.
    pub fn parameter_values(&self, params: &ParameterMap) -> Vec<f64> {
        self.parameter_names()
            .iter()
            .map(|name| params.get(name).copied().unwrap_or(1.0))
            .collect()
    }
}

pub(crate) fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        })
}

/// `x_last - x_first`, the span the guesses are scaled by.
pub(crate) fn x_span(x: &[f64]) -> f64 {
    match (x.first(), x.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for model in available_models() {
            assert_eq!(FitModel::from_name(&model.name()), Some(*model));
        }
        assert_eq!(FitModel::from_name("Polynomial (deg=5)"), Some(FitModel::Polynomial(5)));
        assert_eq!(FitModel::from_name("Voigt"), None);
    }

    #[test]
    fn registered_names() {
        let names: Vec<String> = available_models().iter().map(FitModel::name).collect();
        assert_eq!(
            names,
            vec![
                "Gaussian",
                "Lorentzian",
                "Negative Gaussian",
                "Negative Lorentzian",
                "Linear",
                "Exponential",
                "Quadratic",
                "Cubic",
                "Error Function",
                "Top Hat"
            ]
        );
    }

    #[test]
    fn parameter_counts_match_names() {
        for model in available_models() {
            assert_eq!(model.parameter_names().len(), model.parameter_count());
        }
        assert_eq!(
            FitModel::Polynomial(3).parameter_names(),
            vec!["coeff_0", "coeff_1", "coeff_2", "coeff_3"]
        );
    }

    #[test]
    fn wrong_parameter_count_is_nan() {
        assert!(FitModel::Gaussian.evaluate(0.0, &[1.0, 2.0]).is_nan());
    }

    #[test]
    fn guesses_cover_every_parameter() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|x| (-(x - 10.0) * (x - 10.0) / 8.0).exp()).collect();
        for model in available_models() {
            let guess = model.default_initial_guess(&x, &y);
            assert_eq!(guess.keys().cloned().collect::<Vec<_>>(), model.parameter_names());
            assert!(guess.values().all(|v| v.is_finite()), "{model}: {guess:?}");
        }
    }

    #[test]
    fn empty_data_guesses_ones() {
        let guess = FitModel::TopHat.default_initial_guess(&[], &[]);
        assert!(guess.values().all(|&v| v == 1.0));
        assert_eq!(guess.len(), 5);
    }
}
