//! Periodic refresh of curves from a run that is still acquiring.
//!
//! The app calls [`LivePlot::tick`] from its frame loop, so a refresh runs on
//! the same thread as every other chart operation and never overlaps the
//! previous one. Stopping is just dropping out of the loop.

use std::time::{Duration, Instant};

use super::chart::ChartView;
use super::render::RenderSurface;
use crate::catalog::field_selection::assemble_series;
use crate::catalog::{Catalog, CatalogError, curve_label};
use crate::curves::curve::{Provenance, generate_id};
use crate::error::VizError;
use crate::settings::VizSettings;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LiveStatus {
    #[default]
    Static,
    Live,
    Completed,
    Stopped(String),
}

impl LiveStatus {
    /// Subtitle prefix.
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            LiveStatus::Static => None,
            LiveStatus::Live => Some("LIVE"),
            LiveStatus::Completed => Some("completed"),
            LiveStatus::Stopped(_) => Some("live stopped"),
        }
    }
}

/// One tracked curve: `y / mon` against `x`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct FieldPair {
    pub x_field: Option<String>,
    pub y_field: String,
    pub mon_field: Option<String>,
}

impl FieldPair {
    pub fn new(x_field: Option<&str>, y_field: &str) -> Self {
        Self {
            x_field: x_field.map(str::to_owned),
            y_field: y_field.to_owned(),
            mon_field: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Number of curves refreshed.
    Updated(usize),
    /// Nothing usable this cycle; the previous data stays on screen.
    Skipped,
    Completed,
    Stopped(String),
    /// Not due yet, or live mode is over.
    Idle,
}

#[derive(Debug)]
pub struct LivePlot {
    run: String,
    stream: String,
    pairs: Vec<FieldPair>,
    /// Curves this controller has put on the chart.
    plotted: Vec<String>,
    interval: Duration,
    last_refresh: Option<Instant>,
    active: bool,
    failures: usize,
    max_failures: usize,
    uid_chars: usize,
}

impl LivePlot {
    /// Starts live mode for `run`. Returns `None` (and changes nothing) when
    /// the run has already finished.
    pub fn enable<S: RenderSurface>(
        catalog: &dyn Catalog,
        chart: &mut ChartView<S>,
        run: &str,
        stream: &str,
        pairs: Vec<FieldPair>,
        settings: &VizSettings,
    ) -> Result<Option<Self>, CatalogError> {
        if !catalog.is_run_active(run)? {
            log::info!("Run '{run}' has finished, not enabling live mode");
            return Ok(None);
        }

        log::info!("Live mode enabled for run '{run}', stream '{stream}'");
        chart.set_live_status(LiveStatus::Live);

        Ok(Some(Self {
            run: run.to_owned(),
            stream: stream.to_owned(),
            pairs,
            plotted: Vec::new(),
            interval: settings.live_interval(),
            last_refresh: None,
            active: true,
            failures: 0,
            max_failures: settings.max_live_failures.max(1),
            uid_chars: settings.label_uid_chars,
        }))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn run(&self) -> &str {
        &self.run
    }

    pub fn pairs(&self) -> &[FieldPair] {
        &self.pairs
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.active
            && self
                .last_refresh
                .is_none_or(|last| now.duration_since(last) >= self.interval)
    }

    /// Time left until the next refresh, for scheduling a repaint.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if !self.active {
            return None;
        }
        Some(
            self.last_refresh
                .map_or(Duration::ZERO, |last| self.interval.saturating_sub(now.duration_since(last))),
        )
    }

    pub fn tick<S: RenderSurface>(&mut self, now: Instant, chart: &mut ChartView<S>, catalog: &dyn Catalog) -> RefreshOutcome {
        if !self.is_due(now) {
            return RefreshOutcome::Idle;
        }
        self.last_refresh = Some(now);
        self.refresh(chart, catalog)
    }

    /// One refresh cycle.
    pub fn refresh<S: RenderSurface>(&mut self, chart: &mut ChartView<S>, catalog: &dyn Catalog) -> RefreshOutcome {
        if !self.active {
            return RefreshOutcome::Idle;
        }

        let updated = match self.update_curves(chart, catalog) {
            Ok(updated) => {
                self.failures = 0;
                updated
            }
            Err(e) => {
                self.failures += 1;
                if self.failures >= self.max_failures {
                    let reason = format!("{e} ({} failed refreshes in a row)", self.failures);
                    log::error!("Stopping live mode for run '{}': {reason}", self.run);
                    self.active = false;
                    chart.set_live_status(LiveStatus::Stopped(reason.clone()));
                    return RefreshOutcome::Stopped(reason);
                }
                log::warn!("Live refresh of run '{}' failed, skipping: {e}", self.run);
                return RefreshOutcome::Skipped;
            }
        };

        match catalog.is_run_active(&self.run) {
            Ok(false) => {
                log::info!("Run '{}' completed, live mode finished", self.run);
                self.active = false;
                chart.set_live_status(LiveStatus::Completed);
                return RefreshOutcome::Completed;
            }
            Ok(true) => {}
            Err(e) => log::warn!("Could not check whether run '{}' is active: {e}", self.run),
        }

        if updated == 0 {
            RefreshOutcome::Skipped
        } else {
            RefreshOutcome::Updated(updated)
        }
    }

    /// Ends live mode at the user's request.
    pub fn stop<S: RenderSurface>(&mut self, chart: &mut ChartView<S>) {
        if self.active {
            log::info!("Live mode stopped for run '{}'", self.run);
            self.active = false;
            chart.set_live_status(LiveStatus::Stopped("stopped".to_owned()));
        }
    }

    /// Stops following curves the user removed from the chart.
    fn forget_removed<S: RenderSurface>(&mut self, chart: &ChartView<S>) {
        let run = &self.run;
        let stream = &self.stream;
        let plotted = &self.plotted;
        self.pairs.retain(|pair| {
            let id = generate_id(run, stream, &pair.y_field);
            let removed = plotted.contains(&id) && !chart.curves().contains(&id);
            if removed {
                log::info!("Curve '{id}' was removed, no longer following it");
            }
            !removed
        });
        self.plotted.retain(|id| chart.curves().contains(id));
    }

    fn update_curves<S: RenderSurface>(&mut self, chart: &mut ChartView<S>, catalog: &dyn Catalog) -> Result<usize, VizError> {
        self.forget_removed(chart);
        if self.pairs.is_empty() {
            return Ok(0);
        }

        let fields: Vec<String> = self
            .pairs
            .iter()
            .flat_map(|pair| {
                pair.x_field
                    .iter()
                    .chain(std::iter::once(&pair.y_field))
                    .chain(pair.mon_field.iter())
                    .cloned()
            })
            .collect();

        let data = catalog.read_stream_data(&self.run, &self.stream, Some(&fields))?;
        let metadata = catalog.run_metadata(&self.run)?;

        let mut updated = 0;
        for pair in &self.pairs {
            let series = assemble_series(
                &data,
                pair.x_field.as_deref(),
                &pair.y_field,
                pair.mon_field.as_deref(),
            );
            let (x, y) = match series {
                Ok(series) => series,
                Err(missing) => {
                    log::debug!("Field '{missing}' not available yet, keeping previous data");
                    continue;
                }
            };
            if y.is_empty() {
                log::debug!("No points for '{}' yet", pair.y_field);
                continue;
            }

            let id = generate_id(&self.run, &self.stream, &pair.y_field);
            if chart.curves().contains(&id) {
                chart.update_curve_data(&id, x, y)?;
            } else {
                let label = curve_label(&metadata, &pair.y_field, self.uid_chars);
                let provenance = Provenance {
                    run_uid: self.run.clone(),
                    stream_name: self.stream.clone(),
                    y_field: pair.y_field.clone(),
                };
                chart.plot_curve(id.clone(), x, y, label, Some(provenance))?;
            }
            if !self.plotted.contains(&id) {
                self.plotted.push(id);
            }
            updated += 1;
        }

        Ok(updated)
    }
}
