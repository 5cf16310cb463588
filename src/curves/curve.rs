use crate::plot::render::RenderHandle;
use crate::plot::style::CurveStyle;

pub type CurveId = String;

const ID_SEPARATOR: char = '|';

/// Deterministic key for the `(run, stream, field)` a curve was plotted from.
///
/// Separators and backslashes inside the parts are escaped, so distinct
/// triples never produce the same key.
pub fn generate_id(run_uid: &str, stream_name: &str, field_name: &str) -> CurveId {
    fn escape(part: &str, out: &mut String) {
        for c in part.chars() {
            if c == '\\' || c == ID_SEPARATOR {
                out.push('\\');
            }
            out.push(c);
        }
    }

    let mut id = String::with_capacity(run_uid.len() + stream_name.len() + field_name.len() + 2);
    escape(run_uid, &mut id);
    id.push(ID_SEPARATOR);
    escape(stream_name, &mut id);
    id.push(ID_SEPARATOR);
    escape(field_name, &mut id);
    id
}

/// Where a curve's data came from; used to match live updates.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Provenance {
    pub run_uid: String,
    pub stream_name: String,
    pub y_field: String,
}

/// User transform applied on top of the raw data.
///
/// Order is fixed: derivative first (when enabled), then `factor * y + offset`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Transform {
    pub offset: f64,
    pub factor: f64,
    pub derivative: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset: 0.0,
            factor: 1.0,
            derivative: false,
        }
    }
}

impl Transform {
    pub fn is_identity(&self) -> bool {
        self.offset == 0.0 && self.factor == 1.0 && !self.derivative
    }

    pub fn apply(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let base = if self.derivative {
            derivative(x, y)
        } else {
            y.to_vec()
        };
        base.into_iter()
            .map(|value| self.factor * value + self.offset)
            .collect()
    }
}

/// `0, 1, 2, ...` used when a curve has no x data.
pub fn index_x(len: usize) -> Vec<f64> {
    (0..len).map(|i| i as f64).collect()
}

/// Discrete dy/dx with the same length as the input.
///
/// Central differences inside, forward difference at the first point and
/// backward difference at the last. A single point has slope 0.
pub fn derivative(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len().min(y.len());
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| {
                let (lo, hi) = if i == 0 {
                    (0, 1)
                } else if i == n - 1 {
                    (n - 2, n - 1)
                } else {
                    (i - 1, i + 1)
                };
                (y[hi] - y[lo]) / (x[hi] - x[lo])
            })
            .collect(),
    }
}

/// One plotted dependent-variable series, as stored by the curve registry.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveData {
    pub id: CurveId,
    pub label: String,
    pub handle: RenderHandle,
    /// `None` means "plot against the sample index".
    pub x: Option<Vec<f64>>,
    pub y: Vec<f64>,
    pub style: CurveStyle,
    pub transform: Transform,
    pub provenance: Option<Provenance>,
}

impl CurveData {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Raw x values, falling back to the sample index.
    pub fn x_values(&self) -> Vec<f64> {
        self.x.clone().unwrap_or_else(|| index_x(self.y.len()))
    }

    pub fn transformed_y(&self) -> Vec<f64> {
        self.transform.apply(&self.x_values(), &self.y)
    }

    /// `(x, transformed y)`, ready to draw or fit.
    pub fn transformed(&self) -> (Vec<f64>, Vec<f64>) {
        let x = self.x_values();
        let y = self.transform.apply(&x, &self.y);
        (x, y)
    }
}
