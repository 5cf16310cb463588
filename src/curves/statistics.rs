use std::fmt::Display;

/// Summary of the (transformed) data of the selected curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct CurveStatistics {
    pub n: usize,
    /// `(x, y)` of the smallest y value.
    pub min: Option<(f64, f64)>,
    /// `(x, y)` of the largest y value.
    pub max: Option<(f64, f64)>,
    pub mean: Option<f64>,
    /// Center of mass, `Σx·y / Σy`.
    pub com: Option<f64>,
    pub fwhm: Option<f64>,
}

impl CurveStatistics {
    /// Non-finite pairs are ignored.
    pub fn compute(x: &[f64], y: &[f64]) -> Self {
        let points: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| (x, y))
            .collect();

        if points.is_empty() {
            return Self::default();
        }

        let mut min = points[0];
        let mut max = points[0];
        let mut sum_y = 0.0;
        let mut sum_xy = 0.0;
        for &(x, y) in &points {
            if y < min.1 {
                min = (x, y);
            }
            if y > max.1 {
                max = (x, y);
            }
            sum_y += y;
            sum_xy += x * y;
        }

        let n = points.len();
        let com = if sum_y != 0.0 {
            Some(sum_xy / sum_y)
        } else {
            None
        };

        Self {
            n,
            min: Some(min),
            max: Some(max),
            mean: Some(sum_y / n as f64),
            com,
            fwhm: fwhm(&points, min.1, max),
        }
    }

    /// Rows for the statistics panel.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let point = |p: Option<(f64, f64)>| match p {
            Some((x, y)) => format!("{y:.6} at x = {x:.6}"),
            None => NOT_AVAILABLE.to_owned(),
        };
        let value = |v: Option<f64>| v.map_or_else(|| NOT_AVAILABLE.to_owned(), |v| format!("{v:.6}"));

        vec![
            ("n", self.n.to_string()),
            ("min", point(self.min)),
            ("max", point(self.max)),
            ("mean", value(self.mean)),
            ("COM", value(self.com)),
            ("FWHM", value(self.fwhm)),
        ]
    }
}

impl Display for CurveStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, value) in self.entries() {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

pub const NOT_AVAILABLE: &str = "n/a";

// Width at half height above the baseline, linearly interpolating the
// crossings on each side of the peak.
fn fwhm(points: &[(f64, f64)], baseline: f64, peak: (f64, f64)) -> Option<f64> {
    let half = baseline + (peak.1 - baseline) / 2.0;
    if peak.1 <= baseline {
        return None;
    }
    let peak_index = points.iter().position(|&p| p == peak)?;

    let crossing = |a: (f64, f64), b: (f64, f64)| {
        if b.1 == a.1 {
            a.0
        } else {
            a.0 + (half - a.1) * (b.0 - a.0) / (b.1 - a.1)
        }
    };

    let left = (1..=peak_index)
        .rev()
        .find(|&i| points[i - 1].1 <= half)
        .map(|i| crossing(points[i - 1], points[i]))?;
    let right = (peak_index..points.len() - 1)
        .find(|&i| points[i + 1].1 <= half)
        .map(|i| crossing(points[i], points[i + 1]))?;

    Some((right - left).abs())
}
