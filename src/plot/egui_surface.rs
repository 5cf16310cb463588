use egui::{Color32, PointerButton, Vec2b};
use egui_plot::{Legend, Line, LineStyle, MarkerShape, Plot, PlotPoint, PlotPoints, PlotUi, Points};
use fnv::FnvHashMap;

use super::render::{RenderHandle, RenderSurface, ViewBounds};
use super::style::{CurveStyle, LineKind};
use crate::cursors::ClickButton;

/// A click on the plot area, in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotClick {
    pub button: ClickButton,
    pub alt: bool,
    pub point: [f64; 2],
}

#[derive(Debug, Clone)]
struct EguiSeries {
    points: Vec<[f64; 2]>,
    style: CurveStyle,
    label: String,
}

impl EguiSeries {
    fn color(&self) -> Color32 {
        let rgb = self.style.rgb();
        Color32::from_rgb(rgb.r, rgb.g, rgb.b)
    }

    fn draw(&self, plot_ui: &mut PlotUi<'_>) {
        let color = self.color();

        let line_style = match self.style.line {
            LineKind::Solid => Some(LineStyle::Solid),
            LineKind::Dashed => Some(LineStyle::Dashed { length: 10.0 }),
            LineKind::None => None,
        };
        if let Some(line_style) = line_style {
            let plot_points: Vec<PlotPoint> = self.points.iter().map(|&[x, y]| PlotPoint::new(x, y)).collect();
            let line = Line::new(self.label.clone(), PlotPoints::Owned(plot_points))
                .color(color)
                .width(self.style.width)
                .style(line_style);
            plot_ui.line(line);
        }

        if let Some(shape) = self.style.marker.as_deref().and_then(marker_shape) {
            let points = Points::new(self.label.clone(), self.points.clone())
                .shape(shape)
                .color(color)
                .radius(3.0)
                .filled(true);
            plot_ui.points(points);
        }
    }
}

/// Maps the symbol names of the style cycle to egui markers.
pub fn marker_shape(symbol: &str) -> Option<MarkerShape> {
    match symbol {
        "o" => Some(MarkerShape::Circle),
        "+" => Some(MarkerShape::Plus),
        "x" => Some(MarkerShape::Cross),
        "*" => Some(MarkerShape::Asterisk),
        "s" => Some(MarkerShape::Square),
        "d" => Some(MarkerShape::Diamond),
        "^" => Some(MarkerShape::Up),
        "v" => Some(MarkerShape::Down),
        _ => None,
    }
}

/// Render surface drawn with `egui_plot`. Series are kept between frames and
/// painted in z order every time [`EguiSurface::show`] runs.
#[derive(Debug, Default)]
pub struct EguiSurface {
    series: FnvHashMap<RenderHandle, EguiSeries>,
    next_handle: u64,
    title: String,
    subtitle: String,
    x_label: String,
    y_label: String,
    legend: bool,
    reset_bounds: bool,
    bounds: Option<ViewBounds>,
}

impl EguiSurface {
    pub fn new() -> Self {
        Self {
            legend: true,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Draws the chart and reports a click on the plot area, if any.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<PlotClick> {
        if !self.title.is_empty() {
            ui.heading(&self.title);
        }
        if !self.subtitle.is_empty() {
            ui.small(&self.subtitle);
        }

        let mut plot = Plot::new("runviz_chart")
            .x_axis_label(self.x_label.clone())
            .y_axis_label(self.y_label.clone())
            .allow_double_click_reset(true)
            .allow_scroll(false);
        if self.legend {
            plot = plot.legend(Legend::default());
        }

        let mut ordered: Vec<&EguiSeries> = self.series.values().collect();
        ordered.sort_by_key(|series| series.style.z_order);
        let reset_bounds = std::mem::take(&mut self.reset_bounds);

        let response = plot.show(ui, |plot_ui| {
            if reset_bounds {
                plot_ui.set_auto_bounds(Vec2b::new(true, true));
            }
            for series in ordered {
                series.draw(plot_ui);
            }
        });

        let bounds = response.transform.bounds();
        self.bounds = Some(ViewBounds {
            x: [bounds.min()[0], bounds.max()[0]],
            y: [bounds.min()[1], bounds.max()[1]],
        });

        let button = if response.response.clicked_by(PointerButton::Middle) {
            ClickButton::Middle
        } else if response.response.clicked_by(PointerButton::Secondary) {
            ClickButton::Secondary
        } else if response.response.clicked() {
            ClickButton::Primary
        } else {
            return None;
        };
        let screen_pos = response.response.interact_pointer_pos()?;
        let position = response.transform.value_from_position(screen_pos);
        let alt = ui.input(|i| i.modifiers.alt);

        Some(PlotClick {
            button,
            alt,
            point: [position.x, position.y],
        })
    }
}

impl RenderSurface for EguiSurface {
    fn plot(&mut self, x: Option<&[f64]>, y: &[f64], style: &CurveStyle, label: &str) -> RenderHandle {
        let handle = RenderHandle(self.next_handle);
        self.next_handle += 1;
        self.series.insert(
            handle,
            EguiSeries {
                points: zip_points(x, y),
                style: style.clone(),
                label: label.to_owned(),
            },
        );
        handle
    }

    fn set_data(&mut self, handle: RenderHandle, x: &[f64], y: &[f64]) {
        match self.series.get_mut(&handle) {
            Some(series) => series.points = zip_points(Some(x), y),
            None => log::debug!("set_data on unknown handle {handle:?}"),
        }
    }

    fn remove(&mut self, handle: RenderHandle) {
        self.series.remove(&handle);
    }

    fn rescale_axes(&mut self) {
        self.reset_bounds = true;
    }

    fn rebuild_legend(&mut self) {
        // egui_plot rebuilds the legend from the drawn items each frame.
    }

    fn redraw(&mut self) {
        // Immediate mode: the next frame shows the current state.
    }

    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
    }

    fn set_subtitle(&mut self, subtitle: &str) {
        subtitle.clone_into(&mut self.subtitle);
    }

    fn set_axis_labels(&mut self, x_label: &str, y_label: &str) {
        x_label.clone_into(&mut self.x_label);
        y_label.clone_into(&mut self.y_label);
    }

    fn view_bounds(&self) -> Option<ViewBounds> {
        self.bounds
    }
}

fn zip_points(x: Option<&[f64]>, y: &[f64]) -> Vec<[f64; 2]> {
    match x {
        Some(x) => x.iter().zip(y).map(|(&x, &y)| [x, y]).collect(),
        None => y.iter().enumerate().map(|(i, &y)| [i as f64, y]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_bookkeeping() {
        let mut surface = EguiSurface::new();
        let style = CurveStyle::data("r", "o");

        let a = surface.plot(None, &[3.0, 4.0], &style, "a");
        let b = surface.plot(Some(&[1.0]), &[2.0], &CurveStyle::fit_overlay(), "b fit");
        assert_ne!(a, b);
        assert_eq!(surface.series[&a].points, vec![[0.0, 3.0], [1.0, 4.0]]);

        surface.set_data(a, &[5.0], &[6.0]);
        assert_eq!(surface.series[&a].points, vec![[5.0, 6.0]]);

        surface.remove(a);
        surface.remove(a);
        assert_eq!(surface.len(), 1);
        assert_eq!(surface.view_bounds(), None);
    }

    #[test]
    fn every_cycle_symbol_has_a_marker() {
        for symbol in crate::plot::style::PLOT_SYMBOLS {
            assert!(marker_shape(symbol).is_some(), "{symbol}");
        }
        assert_eq!(marker_shape("?"), None);
    }
}
