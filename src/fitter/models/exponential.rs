use super::{min_max, x_span};

pub fn exponential(x: f64, amplitude: f64, decay: f64, offset: f64) -> f64 {
    amplitude * (-decay * x).exp() + offset
}

/// `[amplitude, decay, offset]`, decay from the inverse of the x span.
pub fn exponential_guess(x: &[f64], y: &[f64]) -> Vec<f64> {
    let (y_min, y_max) = min_max(y);
    let span = x_span(x);
    let decay = if span > 0.0 { 1.0 / span } else { 1.0 };
    vec![y_max - y_min, decay, y_min]
}
