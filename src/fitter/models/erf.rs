use std::f64::consts::SQRT_2;

use libm::erf;

use super::{min_max, x_span};

/// Step of height `2 * amplitude` centred on `center`.
pub fn error_function(x: f64, amplitude: f64, center: f64, sigma: f64, offset: f64) -> f64 {
    amplitude * erf((x - center) / (sigma * SQRT_2)) + offset
}

/// Difference of two error functions: a plateau between the edges `a` and
/// `b`, each edge blurred by `sigma`.
pub fn top_hat(x: f64, amplitude: f64, a: f64, b: f64, sigma: f64, offset: f64) -> f64 {
    let width = sigma * SQRT_2;
    amplitude / 2.0 * (erf((x - a) / width) - erf((x - b) / width)) + offset
}

/// `[amplitude, center, sigma, offset]`
pub fn error_function_guess(x: &[f64], y: &[f64]) -> Vec<f64> {
    let (y_min, y_max) = min_max(y);
    let span = x_span(x);
    let center = (x[0] + x[x.len() - 1]) / 2.0;
    let sigma = if span > 0.0 { span / 4.0 } else { 1.0 };
    vec![(y_max - y_min) / 2.0, center, sigma, (y_max + y_min) / 2.0]
}

/// `[amplitude, a, b, sigma, offset]`, edges at a quarter and three quarters
/// of the x span.
pub fn top_hat_guess(x: &[f64], y: &[f64]) -> Vec<f64> {
    let (y_min, y_max) = min_max(y);
    let span = x_span(x);
    let a = x[0] + span / 4.0;
    let b = x[0] + 3.0 * span / 4.0;
    let sigma = if span > 0.0 { span / 10.0 } else { 1.0 };
    vec![y_max - y_min, a, b, sigma, y_min]
}
