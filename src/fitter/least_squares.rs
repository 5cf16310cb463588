use std::fmt::Display;

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn};

/// Evaluation budget per parameter when the caller gives none.
pub const DEFAULT_PATIENCE: usize = 10000;

#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    DimensionMismatch,
    /// The minimizer stopped without meeting a convergence criterion.
    NotConverged(String),
    SingularCovariance,
}

impl Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::DimensionMismatch => {
                write!(f, "Parameter and bound dimensions do not match")
            }
            SolverError::NotConverged(reason) => {
                write!(f, "Optimal parameters not found: {reason}")
            }
            SolverError::SingularCovariance => write!(
                f,
                "Covariance of the parameters could not be estimated (singular Jacobian)"
            ),
        }
    }
}

impl std::error::Error for SolverError {}

#[derive(Debug, Clone)]
pub struct Solution {
    pub parameters: Vec<f64>,
    /// 1σ, scaled by the residual variance. Zero without degrees of freedom.
    pub uncertainties: Vec<f64>,
    pub chi_squared: f64,
    pub evaluations: usize,
}

/// Box constraint of one parameter, mapped onto an unbounded internal
/// variable so the solver never steps outside it.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound {
    Free,
    Lower(f64),
    Upper(f64),
    Both(f64, f64),
}

impl Bound {
    fn new(lower: f64, upper: f64) -> Self {
        match (lower.is_finite(), upper.is_finite()) {
            (false, false) => Self::Free,
            (true, false) => Self::Lower(lower),
            (false, true) => Self::Upper(upper),
            (true, true) => Self::Both(lower, upper),
        }
    }

    fn to_internal(self, p: f64) -> f64 {
        match self {
            Self::Free => p,
            Self::Lower(lo) => {
                let t = p.max(lo) - lo + 1.0;
                (t * t - 1.0).sqrt()
            }
            Self::Upper(hi) => {
                let t = hi - p.min(hi) + 1.0;
                (t * t - 1.0).sqrt()
            }
            Self::Both(lo, hi) => (2.0 * (p - lo) / (hi - lo) - 1.0).clamp(-1.0, 1.0).asin(),
        }
    }

    fn to_external(self, u: f64) -> f64 {
        match self {
            Self::Free => u,
            Self::Lower(lo) => lo - 1.0 + u.hypot(1.0),
            Self::Upper(hi) => hi + 1.0 - u.hypot(1.0),
            Self::Both(lo, hi) => (lo + (hi - lo) * (u.sin() + 1.0) / 2.0).clamp(lo, hi),
        }
    }

    /// d(external)/d(internal) at `u`.
    fn derivative(self, u: f64) -> f64 {
        match self {
            Self::Free => 1.0,
            Self::Lower(_) => u / u.hypot(1.0),
            Self::Upper(_) => -u / u.hypot(1.0),
            Self::Both(lo, hi) => (hi - lo) * u.cos() / 2.0,
        }
    }
}

/// Residuals `model(x, p) - y` over the internal parameters.
struct CurveProblem<'a, F> {
    model: F,
    x: &'a [f64],
    y: &'a [f64],
    bounds: Vec<Bound>,
    internal: DVector<f64>,
    external: Vec<f64>,
}

impl<'a, F: Fn(f64, &[f64]) -> f64> CurveProblem<'a, F> {
    fn new(model: F, x: &'a [f64], y: &'a [f64], initial: &[f64], bounds: Vec<Bound>) -> Self {
        let internal = DVector::from_iterator(
            initial.len(),
            bounds.iter().zip(initial).map(|(bound, p)| bound.to_internal(*p)),
        );
        let mut problem = Self {
            model,
            x,
            y,
            bounds,
            internal: internal.clone(),
            external: Vec::new(),
        };
        problem.set_params(&internal);
        problem
    }

    fn sum_of_squares(&self) -> f64 {
        self.x
            .iter()
            .zip(self.y)
            .map(|(&x, &y)| ((self.model)(x, &self.external) - y).powi(2))
            .sum()
    }

    /// Forward differences of the model in the external parameters,
    /// stepping backwards at an upper bound.
    fn model_jacobian(&self) -> Option<DMatrix<f64>> {
        let params = &self.external;
        let base: Vec<f64> = self.x.iter().map(|&x| (self.model)(x, params)).collect();
        let mut jacobian = DMatrix::zeros(self.x.len(), params.len());

        let mut shifted = params.clone();
        for (j, bound) in self.bounds.iter().enumerate() {
            let mut h = f64::EPSILON.sqrt() * params[j].abs().max(1.0);
            if matches!(bound, Bound::Upper(hi) | Bound::Both(_, hi) if params[j] + h > *hi) {
                h = -h;
            }
            shifted[j] = params[j] + h;
            for (i, &x) in self.x.iter().enumerate() {
                let d = ((self.model)(x, &shifted) - base[i]) / h;
                if !d.is_finite() {
                    return None;
                }
                jacobian[(i, j)] = d;
            }
            shifted[j] = params[j];
        }
        Some(jacobian)
    }

    fn uncertainties(&self) -> Result<Vec<f64>, SolverError> {
        let n = self.x.len();
        let m = self.external.len();
        let jacobian = self.model_jacobian().ok_or(SolverError::SingularCovariance)?;
        let inverse = (jacobian.transpose() * &jacobian)
            .try_inverse()
            .ok_or(SolverError::SingularCovariance)?;
        let diagonal = inverse.diagonal();
        if diagonal.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SolverError::SingularCovariance);
        }

        if n <= m {
            return Ok(vec![0.0; m]);
        }
        let variance = self.sum_of_squares() / (n - m) as f64;
        Ok(diagonal.iter().map(|v| (v * variance).sqrt()).collect())
    }
}

impl<F: Fn(f64, &[f64]) -> f64> LeastSquaresProblem<f64, Dyn, Dyn> for CurveProblem<'_, F> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, internal: &DVector<f64>) {
        self.internal.clone_from(internal);
        self.external = self
            .bounds
            .iter()
            .zip(internal.iter())
            .map(|(bound, u)| bound.to_external(*u))
            .collect();
    }

    fn params(&self) -> DVector<f64> {
        self.internal.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let residuals = DVector::from_iterator(
            self.x.len(),
            self.x
                .iter()
                .zip(self.y)
                .map(|(&x, &y)| (self.model)(x, &self.external) - y),
        );
        residuals.iter().all(|r| r.is_finite()).then_some(residuals)
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let mut jacobian = self.model_jacobian()?;
        for (j, (bound, u)) in self.bounds.iter().zip(self.internal.iter()).enumerate() {
            let scale = bound.derivative(*u);
            for value in jacobian.column_mut(j).iter_mut() {
                *value *= scale;
            }
        }
        Some(jacobian)
    }
}

/// Minimises `Σ (model(x, p) - y)²` from `initial`, keeping each parameter
/// inside `[lower, upper]`. `patience` scales the evaluation budget by the
/// number of parameters.
pub fn least_squares<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    initial: &[f64],
    lower: &[f64],
    upper: &[f64],
    patience: usize,
) -> Result<Solution, SolverError>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let m = initial.len();
    if lower.len() != m || upper.len() != m || x.len() != y.len() {
        return Err(SolverError::DimensionMismatch);
    }

    let bounds = lower.iter().zip(upper).map(|(lo, hi)| Bound::new(*lo, *hi)).collect();
    let problem = CurveProblem::new(model, x, y, initial, bounds);

    let tolerance = f64::EPSILON.sqrt();
    let (problem, report) = LevenbergMarquardt::new()
        .with_ftol(tolerance)
        .with_xtol(tolerance)
        .with_patience(patience.max(1))
        .minimize(problem);

    if !report.termination.was_successful() {
        return Err(SolverError::NotConverged(format!(
            "{:?} after {} evaluations",
            report.termination, report.number_of_evaluations
        )));
    }
    log::debug!(
        "Levenberg-Marquardt stopped with {:?} after {} evaluations",
        report.termination,
        report.number_of_evaluations
    );

    let uncertainties = problem.uncertainties()?;
    Ok(Solution {
        chi_squared: problem.sum_of_squares(),
        parameters: problem.external,
        uncertainties,
        evaluations: report.number_of_evaluations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x: f64, p: &[f64]) -> f64 {
        p[0] * x + p[1]
    }

    fn unbounded(m: usize) -> (Vec<f64>, Vec<f64>) {
        (vec![f64::NEG_INFINITY; m], vec![f64::INFINITY; m])
    }

    #[test]
    fn fits_a_line() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|x| 3.0 * x - 2.0).collect();
        let (lower, upper) = unbounded(2);

        let solution =
            least_squares(line, &x, &y, &[1.0, 1.0], &lower, &upper, DEFAULT_PATIENCE).unwrap();

        assert!((solution.parameters[0] - 3.0).abs() < 1e-6);
        assert!((solution.parameters[1] + 2.0).abs() < 1e-6);
        assert!(solution.chi_squared < 1e-10);
    }

    #[test]
    fn bound_mappings_round_trip() {
        for bound in [
            Bound::Free,
            Bound::Lower(-1.0),
            Bound::Upper(4.0),
            Bound::Both(-1.0, 4.0),
        ] {
            let u = bound.to_internal(1.5);
            assert!((bound.to_external(u) - 1.5).abs() < 1e-12, "{bound:?}");
        }
        // Starting values outside the box are pulled onto it.
        assert_eq!(Bound::Both(0.0, 1.0).to_external(Bound::Both(0.0, 1.0).to_internal(5.0)), 1.0);
        assert_eq!(Bound::Lower(2.0).to_external(Bound::Lower(2.0).to_internal(-3.0)), 2.0);
    }

    #[test]
    fn respects_bounds() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|x| 3.0 * x - 2.0).collect();

        let solution = least_squares(
            line,
            &x,
            &y,
            &[1.0, 1.0],
            &[f64::NEG_INFINITY, 0.0],
            &[2.0, f64::INFINITY],
            DEFAULT_PATIENCE,
        )
        .unwrap();

        assert!(solution.parameters[0] <= 2.0);
        assert!(solution.parameters[1] >= 0.0);
    }

    #[test]
    fn uncertainties_for_noisy_data() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, x)| 2.0 * x + 1.0 + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let (lower, upper) = unbounded(2);

        let solution =
            least_squares(line, &x, &y, &[0.0, 0.0], &lower, &upper, DEFAULT_PATIENCE).unwrap();

        assert!(solution.uncertainties.iter().all(|s| *s > 0.0 && s.is_finite()));
    }

    #[test]
    fn no_uncertainties_without_degrees_of_freedom() {
        let (lower, upper) = unbounded(2);
        let solution = least_squares(
            line,
            &[0.0, 1.0],
            &[1.0, 2.0],
            &[0.0, 0.0],
            &lower,
            &upper,
            DEFAULT_PATIENCE,
        )
        .unwrap();
        assert_eq!(solution.uncertainties, vec![0.0, 0.0]);
    }

    #[test]
    fn parameter_without_effect_is_an_error() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|x| x + 1.0).collect();
        let (lower, upper) = unbounded(2);

        let result = least_squares(
            |x, p| x + p[0] + 0.0 * p[1],
            &x,
            &y,
            &[0.0, 0.0],
            &lower,
            &upper,
            DEFAULT_PATIENCE,
        );
        assert!(result.is_err(), "{result:?}");
    }

    #[test]
    fn non_finite_start_is_an_error() {
        let (lower, upper) = unbounded(1);
        let result = least_squares(
            |x, p| x / p[0],
            &[1.0, 2.0],
            &[1.0, 2.0],
            &[0.0],
            &lower,
            &upper,
            DEFAULT_PATIENCE,
        );
        assert!(matches!(result, Err(SolverError::NotConverged(_))), "{result:?}");
    }

    #[test]
    fn evaluation_cap() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|x| (0.3 * x).sin()).collect();
        let (lower, upper) = unbounded(1);
        let result = least_squares(|x, p| (p[0] * x).sin(), &x, &y, &[0.1], &lower, &upper, 1);
        assert!(matches!(result, Err(SolverError::NotConverged(_))), "{result:?}");
    }

    #[test]
    fn mismatched_bounds() {
        let result = least_squares(line, &[1.0], &[1.0], &[0.0, 0.0], &[0.0], &[1.0, 1.0], 10);
        assert_eq!(result.unwrap_err(), SolverError::DimensionMismatch);
    }
}
