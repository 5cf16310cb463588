use std::fmt::Display;

use crate::curves::statistics::NOT_AVAILABLE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum CursorId {
    Primary,
    Secondary,
}

impl Display for CursorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CursorId::Primary => write!(f, "Cursor 1"),
            CursorId::Secondary => write!(f, "Cursor 2"),
        }
    }
}

/// Two independent measurement markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CursorPair {
    pub p1: Option<[f64; 2]>,
    pub p2: Option<[f64; 2]>,
}

impl CursorPair {
    pub fn set(&mut self, cursor: CursorId, point: [f64; 2]) {
        match cursor {
            CursorId::Primary => self.p1 = Some(point),
            CursorId::Secondary => self.p2 = Some(point),
        }
    }

    pub fn get(&self, cursor: CursorId) -> Option<[f64; 2]> {
        match cursor {
            CursorId::Primary => self.p1,
            CursorId::Secondary => self.p2,
        }
    }

    pub fn clear(&mut self, cursor: CursorId) {
        match cursor {
            CursorId::Primary => self.p1 = None,
            CursorId::Secondary => self.p2 = None,
        }
    }

    pub fn clear_all(&mut self) {
        self.p1 = None;
        self.p2 = None;
    }

    pub fn has_both_points(&self) -> bool {
        self.p1.is_some() && self.p2.is_some()
    }

    /// `(x2 - x1, y2 - y1)`
    pub fn difference(&self) -> Option<[f64; 2]> {
        let (p1, p2) = (self.p1?, self.p2?);
        Some([p2[0] - p1[0], p2[1] - p1[1]])
    }

    pub fn midpoint(&self) -> Option<[f64; 2]> {
        let (p1, p2) = (self.p1?, self.p2?);
        Some([(p1[0] + p2[0]) / 2.0, (p1[1] + p2[1]) / 2.0])
    }

    pub fn distance(&self) -> Option<f64> {
        self.difference().map(|[dx, dy]| dx.hypot(dy))
    }

    /// Display rows: both positions, then the derived values.
    pub fn report(&self) -> Vec<(&'static str, String)> {
        let point = |p: Option<[f64; 2]>| match p {
            Some([x, y]) => format!("({x:.6}, {y:.6})"),
            None => NOT_AVAILABLE.to_owned(),
        };
        vec![
            ("Cursor 1", point(self.p1)),
            ("Cursor 2", point(self.p2)),
            ("Δ", point(self.difference())),
            ("Midpoint", point(self.midpoint())),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickButton {
    Primary,
    Middle,
    Secondary,
}

/// Which cursor a plot click places, if any. Middle click or alt + secondary
/// click places the primary cursor, a plain secondary click the other one.
pub fn cursor_for_click(button: ClickButton, alt: bool) -> Option<CursorId> {
    match (button, alt) {
        (ClickButton::Middle, _) | (ClickButton::Secondary, true) => Some(CursorId::Primary),
        (ClickButton::Secondary, false) => Some(CursorId::Secondary),
        (ClickButton::Primary, _) => None,
    }
}

/// Nearest data point to `point`, measuring distance in units of the visible
/// span of each axis. Non-finite points are skipped.
pub fn snap_to_nearest(point: [f64; 2], x: &[f64], y: &[f64], x_span: f64, y_span: f64) -> Option<[f64; 2]> {
    let scale = |span: f64| if span.is_finite() && span > 0.0 { span } else { 1.0 };
    let (sx, sy) = (scale(x_span), scale(y_span));

    x.iter()
        .zip(y)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| {
            let dx = (x - point[0]) / sx;
            let dy = (y - point[1]) / sy;
            ([x, y], dx * dx + dy * dy)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_values_need_both_cursors() {
        let mut cursors = CursorPair::default();
        assert_eq!(cursors.difference(), None);
        assert_eq!(cursors.midpoint(), None);

        cursors.set(CursorId::Secondary, [3.0, 4.0]);
        assert_eq!(cursors.difference(), None);
        assert_eq!(cursors.report()[2].1, "n/a");

        cursors.set(CursorId::Primary, [1.0, 1.0]);
        assert_eq!(cursors.difference(), Some([2.0, 3.0]));
        assert_eq!(cursors.midpoint(), Some([2.0, 2.5]));
        assert!((cursors.distance().unwrap() - 13f64.sqrt()).abs() < 1e-12);

        cursors.clear(CursorId::Primary);
        assert_eq!(cursors.midpoint(), None);
    }

    #[test]
    fn placing_replaces_previous_marker() {
        let mut cursors = CursorPair::default();
        cursors.set(CursorId::Primary, [1.0, 1.0]);
        cursors.set(CursorId::Primary, [5.0, 5.0]);
        assert_eq!(cursors.p1, Some([5.0, 5.0]));
        assert_eq!(cursors.p2, None);
    }

    #[test]
    fn click_mapping() {
        assert_eq!(cursor_for_click(ClickButton::Middle, false), Some(CursorId::Primary));
        assert_eq!(cursor_for_click(ClickButton::Secondary, true), Some(CursorId::Primary));
        assert_eq!(cursor_for_click(ClickButton::Secondary, false), Some(CursorId::Secondary));
        assert_eq!(cursor_for_click(ClickButton::Primary, true), None);
    }

    #[test]
    fn snapping_is_scale_independent() {
        let x = [0.0, 1000.0];
        let y = [0.0, 1.0];

        let snapped = snap_to_nearest([400.0, 0.9], &x, &y, 1000.0, 1.0);
        assert_eq!(snapped, Some([1000.0, 1.0]));

        // Unscaled, x dominates the distance.
        let raw = snap_to_nearest([400.0, 0.9], &x, &y, 1.0, 1.0);
        assert_eq!(raw, Some([0.0, 0.0]));

        assert_eq!(snap_to_nearest([0.0, 0.0], &[], &[], 1.0, 1.0), None);
    }
}
