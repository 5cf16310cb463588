//! The drawing collaborator used by [`ChartView`](super::chart::ChartView).
//!
//! The chart creates and owns every handle; the curve registry only keeps a
//! copy so it can hand it back when the curve goes away.

use indexmap::IndexMap;

use super::style::CurveStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize, serde::Serialize)]
pub struct RenderHandle(pub u64);

/// Visible data bounds of the plot, `[min, max]` per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl ViewBounds {
    pub fn x_span(&self) -> f64 {
        self.x[1] - self.x[0]
    }

    pub fn y_span(&self) -> f64 {
        self.y[1] - self.y[0]
    }
}

pub trait RenderSurface {
    /// Draw a new series. `x == None` plots against the sample index.
    fn plot(&mut self, x: Option<&[f64]>, y: &[f64], style: &CurveStyle, label: &str) -> RenderHandle;

    fn set_data(&mut self, handle: RenderHandle, x: &[f64], y: &[f64]);

    fn remove(&mut self, handle: RenderHandle);

    fn rescale_axes(&mut self);

    fn rebuild_legend(&mut self);

    fn redraw(&mut self);

    fn set_title(&mut self, title: &str);

    fn set_subtitle(&mut self, subtitle: &str);

    fn set_axis_labels(&mut self, x_label: &str, y_label: &str);

    /// Currently visible region, if the surface knows it.
    fn view_bounds(&self) -> Option<ViewBounds>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub style: CurveStyle,
    pub label: String,
}

/// Headless surface that keeps every series in memory and counts calls.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub series: IndexMap<RenderHandle, RecordedSeries>,
    next_handle: u64,
    pub redraws: usize,
    pub legend_rebuilds: usize,
    pub rescales: usize,
    pub title: String,
    pub subtitle: String,
    pub axis_labels: (String, String),
    pub bounds: Option<ViewBounds>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: RenderHandle) -> Option<&RecordedSeries> {
        self.series.get(&handle)
    }
}

impl RenderSurface for RecordingSurface {
    fn plot(&mut self, x: Option<&[f64]>, y: &[f64], style: &CurveStyle, label: &str) -> RenderHandle {
        let handle = RenderHandle(self.next_handle);
        self.next_handle += 1;

        let x = x.map_or_else(|| (0..y.len()).map(|i| i as f64).collect(), <[f64]>::to_vec);
        self.series.insert(
            handle,
            RecordedSeries {
                x,
                y: y.to_vec(),
                style: style.clone(),
                label: label.to_owned(),
            },
        );
        handle
    }

    fn set_data(&mut self, handle: RenderHandle, x: &[f64], y: &[f64]) {
        if let Some(series) = self.series.get_mut(&handle) {
            series.x = x.to_vec();
            series.y = y.to_vec();
        }
    }

    fn remove(&mut self, handle: RenderHandle) {
        self.series.shift_remove(&handle);
    }

    fn rescale_axes(&mut self) {
        self.rescales += 1;
    }

    fn rebuild_legend(&mut self) {
        self.legend_rebuilds += 1;
    }

    fn redraw(&mut self) {
        self.redraws += 1;
    }

    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
    }

    fn set_subtitle(&mut self, subtitle: &str) {
        subtitle.clone_into(&mut self.subtitle);
    }

    fn set_axis_labels(&mut self, x_label: &str, y_label: &str) {
        self.axis_labels = (x_label.to_owned(), y_label.to_owned());
    }

    fn view_bounds(&self) -> Option<ViewBounds> {
        self.bounds
    }
}
