pub fn linear(x: f64, slope: f64, intercept: f64) -> f64 {
    slope * x + intercept
}

/// Least squares slope and intercept, `None` when every x is the same.
pub fn simple_linear_regression(x_data: &[f64], y_data: &[f64]) -> Option<(f64, f64)> {
    if x_data.len() != y_data.len() || x_data.is_empty() {
        return None;
    }

    let n = x_data.len() as f64;
    let sum_x: f64 = x_data.iter().sum();
    let sum_y: f64 = y_data.iter().sum();
    let sum_xy: f64 = x_data.iter().zip(y_data.iter()).map(|(x, y)| x * y).sum();
    let sum_x_squared: f64 = x_data.iter().map(|x| x.powi(2)).sum();

    let denominator = n * sum_x_squared - sum_x.powi(2);
    if denominator == 0.0 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    Some((slope, intercept))
}

/// `[slope, intercept]`
pub fn linear_guess(x: &[f64], y: &[f64]) -> Vec<f64> {
    match simple_linear_regression(x, y) {
        Some((slope, intercept)) => vec![slope, intercept],
        None => {
            let mean = y.iter().sum::<f64>() / y.len().max(1) as f64;
            vec![0.0, mean]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regression_recovers_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let (slope, intercept) = simple_linear_regression(&x, &y).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn vertical_data_has_no_regression() {
        assert_eq!(simple_linear_regression(&[1.0, 1.0], &[0.0, 5.0]), None);
        assert_eq!(linear_guess(&[1.0, 1.0], &[0.0, 5.0]), vec![0.0, 2.5]);
    }
}
