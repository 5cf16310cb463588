use super::{min_max, x_span};

pub fn gaussian(x: f64, amplitude: f64, center: f64, sigma: f64, offset: f64) -> f64 {
    amplitude * (-(x - center).powi(2) / (2.0 * sigma.powi(2))).exp() + offset
}

/// `gamma` is the half width at half maximum.
pub fn lorentzian(x: f64, amplitude: f64, center: f64, gamma: f64, offset: f64) -> f64 {
    amplitude * gamma.powi(2) / ((x - center).powi(2) + gamma.powi(2)) + offset
}

/// Shape estimate of a peak (or a dip when `inverted`).
struct PeakEstimate {
    amplitude: f64,
    center: f64,
    fwhm: Option<f64>,
    baseline: f64,
}

fn estimate_peak(x: &[f64], y: &[f64], inverted: bool) -> PeakEstimate {
    let (y_min, y_max) = min_max(y);
    let half = (y_max + y_min) / 2.0;

    let extreme = if inverted { y_min } else { y_max };
    let index = y.iter().position(|&v| v == extreme).unwrap_or(0);

    // A point is "outside" the peak once it has dropped past half maximum.
    let outside = |v: f64| if inverted { v >= half } else { v <= half };

    let left = (0..index).rev().find(|&i| outside(y[i])).map(|i| x[i]);
    let right = (index + 1..y.len()).find(|&i| outside(y[i])).map(|i| x[i]);

    let fwhm = match (left, right) {
        (Some(left), Some(right)) if right != left => Some((right - left).abs()),
        _ => None,
    };

    if inverted {
        PeakEstimate {
            amplitude: y_min - y_max,
            center: x[index],
            fwhm,
            baseline: y_max,
        }
    } else {
        PeakEstimate {
            amplitude: y_max - y_min,
            center: x[index],
            fwhm,
            baseline: y_min,
        }
    }
}

fn fallback_width(x: &[f64]) -> f64 {
    let width = x_span(x).abs() / 10.0;
    if width > 0.0 { width } else { 1.0 }
}

/// `[amplitude, center, sigma, offset]`
pub fn gaussian_guess(x: &[f64], y: &[f64], inverted: bool) -> Vec<f64> {
    let peak = estimate_peak(x, y, inverted);
    let sigma = peak
        .fwhm
        .map_or_else(|| fallback_width(x), |fwhm| fwhm / (2.0 * (2.0 * 2f64.ln()).sqrt()));
    vec![peak.amplitude, peak.center, sigma, peak.baseline]
}

/// `[amplitude, center, gamma, offset]`
pub fn lorentzian_guess(x: &[f64], y: &[f64], inverted: bool) -> Vec<f64> {
    let peak = estimate_peak(x, y, inverted);
    let gamma = peak.fwhm.map_or_else(|| fallback_width(x), |fwhm| fwhm / 2.0);
    vec![peak.amplitude, peak.center, gamma, peak.baseline]
}
