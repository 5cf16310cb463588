use std::fmt::Display;

use indexmap::IndexMap;

use super::curve::{CurveData, CurveId, Provenance, Transform};
use crate::events::Signal;
use crate::plot::render::RenderHandle;
use crate::plot::style::CurveStyle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    DuplicateKey(CurveId),
    NotFound(CurveId),
    LengthMismatch { x: usize, y: usize },
}

impl Display for CurveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveError::DuplicateKey(id) => write!(f, "Curve '{id}' is already plotted"),
            CurveError::NotFound(id) => write!(f, "Curve '{id}' does not exist"),
            CurveError::LengthMismatch { x, y } => write!(
                f,
                "X and Y data must have the same length (x: {x}, y: {y})"
            ),
        }
    }
}

impl std::error::Error for CurveError {}

#[derive(Debug, Clone, PartialEq)]
pub enum CurveEvent {
    Added(CurveId),
    Updated {
        id: CurveId,
        /// The y values changed, derived statistics are stale.
        recompute_y: bool,
        x_changed: bool,
    },
    Removed {
        curve: Box<CurveData>,
        remaining: usize,
    },
    /// A single notification for a bulk clear.
    AllRemoved(Vec<CurveData>),
}

fn check_lengths(x: Option<&Vec<f64>>, y: &[f64]) -> Result<(), CurveError> {
    match x {
        Some(x) if x.len() != y.len() => Err(CurveError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        }),
        _ => Ok(()),
    }
}

/// The one store of every plotted curve, in insertion order.
#[derive(Debug, Default)]
pub struct CurveManager {
    curves: IndexMap<CurveId, CurveData>,
    pub events: Signal<CurveEvent>,
}

impl CurveManager {
    pub fn new() -> Self {
        Self::default()
    }

    #[expect(clippy::too_many_arguments)]
    pub fn add_curve(
        &mut self,
        id: CurveId,
        handle: RenderHandle,
        x: Option<Vec<f64>>,
        y: Vec<f64>,
        label: String,
        style: CurveStyle,
        provenance: Option<Provenance>,
    ) -> Result<(), CurveError> {
        if self.curves.contains_key(&id) {
            return Err(CurveError::DuplicateKey(id));
        }
        check_lengths(x.as_ref(), &y)?;

        log::debug!("Adding curve '{id}' ({} points)", y.len());
        self.curves.insert(
            id.clone(),
            CurveData {
                id: id.clone(),
                label,
                handle,
                x,
                y,
                style,
                transform: Transform::default(),
                provenance,
            },
        );
        self.events.emit(&CurveEvent::Added(id));
        Ok(())
    }

    /// Replace the data (and handle) of an existing curve, keeping its
    /// label, style and transform.
    pub fn update_curve(
        &mut self,
        id: &str,
        handle: RenderHandle,
        x: Option<Vec<f64>>,
        y: Vec<f64>,
    ) -> Result<(), CurveError> {
        check_lengths(x.as_ref(), &y)?;
        let Some(curve) = self.curves.get_mut(id) else {
            return Err(CurveError::NotFound(id.to_owned()));
        };

        let x_changed = curve.x != x;
        let recompute_y = curve.y != y;

        curve.handle = handle;
        curve.x = x;
        curve.y = y;

        self.events.emit(&CurveEvent::Updated {
            id: id.to_owned(),
            recompute_y,
            x_changed,
        });
        Ok(())
    }

    /// Unknown ids are ignored.
    pub fn remove_curve(&mut self, id: &str) {
        if let Some(curve) = self.curves.shift_remove(id) {
            log::debug!("Removed curve '{id}'");
            let remaining = self.curves.len();
            self.events.emit(&CurveEvent::Removed {
                curve: Box::new(curve),
                remaining,
            });
        }
    }

    pub fn remove_all_curves(&mut self) {
        let removed: Vec<CurveData> = self.curves.drain(..).map(|(_, curve)| curve).collect();
        log::debug!("Removed all {} curves", removed.len());
        self.events.emit(&CurveEvent::AllRemoved(removed));
    }

    /// Does not redraw; the caller recomputes the transformed data.
    pub fn update_offset_factor(&mut self, id: &str, offset: f64, factor: f64) -> bool {
        match self.curves.get_mut(id) {
            Some(curve) => {
                curve.transform.offset = offset;
                curve.transform.factor = factor;
                true
            }
            None => false,
        }
    }

    pub fn update_derivative(&mut self, id: &str, derivative: bool) -> bool {
        match self.curves.get_mut(id) {
            Some(curve) => {
                curve.transform.derivative = derivative;
                true
            }
            None => false,
        }
    }

    pub fn get_curve_data(&self, id: &str) -> Option<&CurveData> {
        self.curves.get(id)
    }

    /// Transformed `(x, y)` of a curve.
    pub fn get_xy_data(&self, id: &str) -> Option<(Vec<f64>, Vec<f64>)> {
        self.curves.get(id).map(CurveData::transformed)
    }

    pub fn curves(&self) -> &IndexMap<CurveId, CurveData> {
        &self.curves
    }

    pub fn ids(&self) -> Vec<CurveId> {
        self.curves.keys().cloned().collect()
    }

    pub fn first_id(&self) -> Option<&CurveId> {
        self.curves.keys().next()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.curves.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// The curve that was plotted from `(run, stream, field)`, if any.
    pub fn find_by_provenance(&self, run_uid: &str, stream_name: &str, y_field: &str) -> Option<&CurveData> {
        self.curves.values().find(|curve| {
            curve.provenance.as_ref().is_some_and(|p| {
                p.run_uid == run_uid && p.stream_name == stream_name && p.y_field == y_field
            })
        })
    }
}
