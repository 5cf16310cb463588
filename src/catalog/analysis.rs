use serde_json::Value;

use super::{Catalog, CatalogError, get_md, get_md_str};

/// Runs that ended with one of these probably recorded plottable data.
const STATUS_WITH_DATA: [&str; 2] = ["abort", "success"];

/// Never picked as the default signal.
const NOT_SIGNALS: [&str; 2] = ["timebase", "preset_time"];

/// Default axes and signal of a run, worked out from its metadata and the
/// descriptors of its stream.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SignalAxesFields {
    pub uid: String,
    pub scan_id: Option<i64>,
    pub plan_name: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub stream_name: String,
    /// One field per dimension, plotted against.
    pub plot_axes: Vec<String>,
    /// Every field of every dimension.
    pub positioners: Vec<String>,
    pub detectors: Vec<String>,
    pub fields: Vec<String>,
    pub plot_signal: Option<String>,
    pub chart_type: Option<String>,
}

impl SignalAxesFields {
    pub fn new(catalog: &dyn Catalog, run: &str, default_stream: &str) -> Result<Self, CatalogError> {
        let metadata = catalog.run_metadata(run)?;
        let text = |doc, key| get_md_str(&metadata, doc, key).map(str::to_owned);

        let mut analysis = Self {
            uid: text("start", "uid").unwrap_or_else(|| run.to_owned()),
            scan_id: get_md(&metadata, "start", "scan_id").and_then(Value::as_i64),
            plan_name: text("start", "plan_name"),
            title: text("start", "title"),
            status: text("stop", "exit_status"),
            stream_name: default_stream.to_owned(),
            ..Default::default()
        };

        let has_data = analysis
            .status
            .as_deref()
            .is_some_and(|status| STATUS_WITH_DATA.contains(&status));
        if has_data {
            analysis.identify_axes(&metadata);
            let descriptors = descriptors(catalog, run, &analysis.stream_name)?;
            analysis.identify_detectors(&metadata, &descriptors);
            analysis.identify_fields(&descriptors);
            analysis.identify_chart(&metadata, &descriptors);
        }

        log::debug!("Run analysis: {analysis:?}");
        Ok(analysis)
    }

    /// Axes from the hinted dimensions, else the motors, else `time`.
    fn identify_axes(&mut self, metadata: &Value) {
        let guess: Vec<(Vec<String>, String)> = match get_md(metadata, "start", "motors").and_then(Value::as_array) {
            Some(motors) => motors
                .iter()
                .filter_map(Value::as_str)
                .map(|motor| (vec![motor.to_owned()], self.stream_name.clone()))
                .collect(),
            None => vec![(vec!["time".to_owned()], self.stream_name.clone())],
        };

        let hinted = get_md(metadata, "start", "hints")
            .and_then(|hints| hints.get("dimensions"))
            .and_then(Value::as_array)
            .map(|dimensions| {
                dimensions
                    .iter()
                    .filter_map(|dimension| {
                        let fields = dimension.get(0)?.as_array()?;
                        let stream = dimension.get(1)?.as_str()?;
                        let fields = fields.iter().filter_map(Value::as_str).map(str::to_owned).collect();
                        Some((fields, stream.to_owned()))
                    })
                    .collect::<Vec<_>>()
            });

        let mut dimensions = match hinted {
            Some(dimensions) if !dimensions.is_empty() => dimensions,
            _ => guess.clone(),
        };

        // Dimensions spread over several streams cannot be combined.
        let first_stream = dimensions.first().map(|(_, stream)| stream.clone());
        if dimensions.iter().any(|(_, stream)| Some(stream) != first_stream.as_ref()) {
            log::warn!("Ignoring hinted dimensions that span more than one stream");
            dimensions = guess;
        }

        self.plot_axes = dimensions
            .iter()
            .filter_map(|(fields, _)| fields.first().cloned())
            .collect();
        self.positioners = dimensions
            .iter()
            .flat_map(|(fields, _)| fields.iter().cloned())
            .collect();
        if let Some((_, stream)) = dimensions.first() {
            self.stream_name = stream.clone();
        }
    }

    fn identify_detectors(&mut self, metadata: &Value, descriptors: &[Value]) {
        let names = get_md(metadata, "start", "detectors")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();

        self.detectors = names
            .into_iter()
            .flat_map(|name| object_name_to_fields(descriptors, name))
            .filter(|field| descriptors.iter().any(|d| is_numeric(d, field)))
            .collect();
    }

    /// Hinted fields of every object, or all of its fields when not hinted.
    fn identify_fields(&mut self, descriptors: &[Value]) {
        for object in object_names(descriptors) {
            let hinted: Option<Vec<String>> = descriptors
                .iter()
                .filter_map(|d| d.get("hints")?.get(&object)?.get("fields")?.as_array())
                .next()
                .map(|fields| fields.iter().filter_map(Value::as_str).map(str::to_owned).collect());

            match hinted {
                Some(fields) => self.fields.extend(fields),
                None => self.fields.extend(object_name_to_fields(descriptors, &object)),
            }
        }

        self.plot_signal = self
            .detectors
            .iter()
            .chain(&self.fields)
            .find(|field| !self.positioners.contains(field) && !NOT_SIGNALS.contains(&field.as_str()))
            .cloned();
    }

    fn identify_chart(&mut self, metadata: &Value, descriptors: &[Value]) {
        let Some(signal) = &self.plot_signal else {
            self.chart_type = None;
            return;
        };

        self.chart_type = match self.plot_axes.len() {
            1 => {
                let rank = descriptors
                    .first()
                    .and_then(|d| d.get("data_keys")?.get(signal)?.get("shape")?.as_array())
                    .map_or(0, Vec::len);
                match rank {
                    0 | 1 => {
                        let events = get_md(metadata, "stop", "num_events")
                            .and_then(|n| n.get(&self.stream_name))
                            .and_then(Value::as_u64)
                            .unwrap_or(0);
                        (events > 1).then(|| "line_1D".to_owned())
                    }
                    2 | 3 => Some(format!("unknown{rank}D")),
                    _ => None,
                }
            }
            2 => {
                let gridding = get_md(metadata, "start", "hints")
                    .and_then(|hints| hints.get("gridding"))
                    .and_then(Value::as_str);
                let chart = if gridding == Some("rectilinear") {
                    "grid_2D"
                } else {
                    "scatter_2D"
                };
                Some(chart.to_owned())
            }
            _ => None,
        };
    }
}

fn descriptors(catalog: &dyn Catalog, run: &str, stream: &str) -> Result<Vec<Value>, CatalogError> {
    match catalog.stream_metadata(run, stream) {
        Ok(metadata) => Ok(metadata
            .get("descriptors")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()),
        Err(CatalogError::StreamNotFound { .. }) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn object_names(descriptors: &[Value]) -> Vec<String> {
    descriptors
        .iter()
        .filter_map(|d| d.get("object_keys")?.as_object())
        .flat_map(|keys| keys.keys().cloned())
        .collect()
}

fn object_name_to_fields(descriptors: &[Value], object: &str) -> Vec<String> {
    descriptors
        .iter()
        .filter_map(|d| d.get("object_keys")?.get(object)?.as_array())
        .flat_map(|fields| fields.iter().filter_map(Value::as_str).map(str::to_owned))
        .collect()
}

fn is_numeric(descriptor: &Value, field: &str) -> bool {
    matches!(
        descriptor
            .get("data_keys")
            .and_then(|keys| keys.get(field))
            .and_then(|key| key.get("dtype"))
            .and_then(Value::as_str),
        Some("number" | "integer")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalog;
    use crate::catalog::StreamData;
    use serde_json::json;

    fn scan_catalog(hints: Value) -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new("test");
        catalog.insert_run(
            "0123456789",
            json!({
                "scan_id": 7,
                "plan_name": "scan",
                "motors": ["m1"],
                "detectors": ["scaler1"],
                "hints": hints,
            }),
        );

        let mut data = StreamData::new();
        data.insert("m1".to_owned(), vec![0.0, 1.0, 2.0]);
        data.insert("timebase".to_owned(), vec![1e7; 3]);
        data.insert("I0".to_owned(), vec![3.0, 4.0, 5.0]);
        let descriptors = json!({
            "descriptors": [{
                "object_keys": {
                    "m1": ["m1", "m1_user_setpoint"],
                    "scaler1": ["timebase", "I0"],
                },
                "data_keys": {
                    "m1": {"dtype": "number", "shape": []},
                    "timebase": {"dtype": "number", "shape": []},
                    "I0": {"dtype": "number", "shape": []},
                },
                "hints": {
                    "m1": {"fields": ["m1"]},
                },
            }]
        });
        catalog.insert_stream("0123456789", "primary", data, descriptors).unwrap();
        catalog.finish_run("0123456789", "success").unwrap();
        catalog
    }

    #[test]
    fn motors_are_the_default_axes() {
        let catalog = scan_catalog(Value::Null);
        let analysis = SignalAxesFields::new(&catalog, "0123456789", "primary").unwrap();

        assert_eq!(analysis.plot_axes, vec!["m1"]);
        assert_eq!(analysis.positioners, vec!["m1"]);
        assert_eq!(analysis.detectors, vec!["timebase", "I0"]);
        assert_eq!(analysis.plot_signal.as_deref(), Some("I0"));
        assert_eq!(analysis.chart_type.as_deref(), Some("line_1D"));
        assert_eq!(analysis.scan_id, Some(7));
    }

    #[test]
    fn hinted_dimensions_win() {
        let catalog = scan_catalog(json!({"dimensions": [[["I0"], "primary"]]}));
        let analysis = SignalAxesFields::new(&catalog, "0123456789", "primary").unwrap();

        assert_eq!(analysis.plot_axes, vec!["I0"]);
        // timebase is never a signal and I0 is now an axis; m1 is next.
        assert_eq!(analysis.plot_signal.as_deref(), Some("m1"));
    }

    #[test]
    fn active_runs_are_not_analysed() {
        let mut catalog = MemoryCatalog::new("test");
        catalog.insert_run("uid", json!({"motors": ["m1"]}));
        let analysis = SignalAxesFields::new(&catalog, "uid", "primary").unwrap();

        assert!(analysis.plot_axes.is_empty());
        assert_eq!(analysis.plot_signal, None);
        assert_eq!(analysis.status, None);
    }
}
