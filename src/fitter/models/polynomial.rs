use compute::predict::PolynomialRegressor;

/// `coefficients` in ascending powers of x.
pub fn polynomial(x: f64, coefficients: &[f64]) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Coefficients of a least squares polynomial through the data.
///
/// Falls back to the mean as a constant term when there are not enough
/// distinct x values to determine every coefficient.
pub fn polynomial_guess(x: &[f64], y: &[f64], degree: usize) -> Vec<f64> {
    let mut distinct: Vec<f64> = x.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    let fallback = || {
        let mut coef = vec![0.0; degree + 1];
        coef[0] = y.iter().sum::<f64>() / y.len().max(1) as f64;
        coef
    };

    if distinct.len() < degree + 1 {
        log::debug!(
            "Not enough distinct x values to estimate a degree {degree} polynomial"
        );
        return fallback();
    }

    let mut regressor = PolynomialRegressor::new(degree);
    regressor.fit(x, y);

    if regressor.coef.len() != degree + 1 || regressor.coef.iter().any(|c| !c.is_finite()) {
        log::debug!("Polynomial regression gave unusable coefficients: {:?}", regressor.coef);
        return fallback();
    }

    regressor.coef.clone()
}
