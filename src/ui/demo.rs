//! Built-in catalog with a few finished scans and a simulated acquisition
//! that can be plotted live.

use serde_json::{Value, json};

use crate::catalog::memory::MemoryCatalog;
use crate::catalog::{CatalogError, StreamData};

pub const DEMO_CATALOG: &str = "demo";
pub const DEMO_STREAM: &str = "primary";

/// Deterministic jitter so repeated demos look the same.
fn jitter(i: usize, scale: f64) -> f64 {
    let i = i as f64;
    scale * ((i * 12.9898).sin() * 43758.5453).fract()
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

fn peak_signal(x: f64, i: usize) -> f64 {
    1000.0 * (-(x - 0.3) * (x - 0.3) / (2.0 * 0.15 * 0.15)).exp() + 50.0 + jitter(i, 20.0)
}

fn monitor_signal(i: usize) -> f64 {
    1.0e5 + jitter(i + 1000, 500.0)
}

fn descriptors(motor: &str, detector: &str, signals: &[&str]) -> Value {
    let mut data_keys = serde_json::Map::new();
    for field in std::iter::once(&motor).chain(signals) {
        data_keys.insert((*field).to_owned(), json!({"dtype": "number", "shape": []}));
    }
    json!({
        "descriptors": [{
            "object_keys": {
                motor: [motor],
                detector: signals,
            },
            "data_keys": data_keys,
        }]
    })
}

fn start_document(scan_id: i64, plan_name: &str, title: &str, motor: &str, detector: &str) -> Value {
    json!({
        "scan_id": scan_id,
        "plan_name": plan_name,
        "title": title,
        "motors": [motor],
        "detectors": [detector],
        "hints": {"dimensions": [[[motor], DEMO_STREAM]]},
    })
}

fn insert_scan(
    catalog: &mut MemoryCatalog,
    uid: &str,
    start: Value,
    motor: (&str, Vec<f64>),
    detector: &str,
    signals: Vec<(&str, Vec<f64>)>,
) -> Result<(), CatalogError> {
    let names: Vec<&str> = signals.iter().map(|(name, _)| *name).collect();
    let metadata = descriptors(motor.0, detector, &names);

    let mut data = StreamData::new();
    data.insert(motor.0.to_owned(), motor.1);
    for (name, values) in signals {
        data.insert(name.to_owned(), values);
    }

    catalog.insert_run(uid, start);
    catalog.insert_stream(uid, DEMO_STREAM, data, metadata)?;
    catalog.finish_run(uid, "success")
}

/// A catalog with three finished scans: a peak, a decay and an edge.
pub fn demo_catalog() -> Result<MemoryCatalog, CatalogError> {
    let mut catalog = MemoryCatalog::new(DEMO_CATALOG);

    let x = linspace(-0.5, 1.0, 61);
    let peak = x.iter().enumerate().map(|(i, &x)| peak_signal(x, i)).collect();
    let monitor = (0..x.len()).map(monitor_signal).collect();
    insert_scan(
        &mut catalog,
        "5d2c8e7a-1f3b-4a8e-9b61-0c7e2a9f4d11",
        start_document(101, "scan", "peak scan", "m1", "scaler1"),
        ("m1", x),
        "scaler1",
        vec![("I00", peak), ("I0", monitor)],
    )?;

    let t = linspace(0.0, 10.0, 41);
    let decay = t
        .iter()
        .enumerate()
        .map(|(i, &t)| 800.0 * (-0.45 * t).exp() + 20.0 + jitter(i, 8.0))
        .collect();
    insert_scan(
        &mut catalog,
        "a94b1c63-77d0-4c52-8e3f-2b6d19e0c5a7",
        start_document(102, "count", "decay", "delay", "diode"),
        ("delay", t),
        "diode",
        vec![("diode_current", decay)],
    )?;

    let z = linspace(-2.0, 2.0, 81);
    let edge = z
        .iter()
        .enumerate()
        .map(|(i, &z)| 250.0 * (1.0 + libm::erf((z - 0.2) / (0.3 * std::f64::consts::SQRT_2))) + jitter(i, 5.0))
        .collect();
    insert_scan(
        &mut catalog,
        "e3f07b58-2d9a-4f16-a0c4-6b8e5d3f2a90",
        start_document(103, "rel_scan", "knife edge", "sample_z", "scaler1"),
        ("sample_z", z),
        "scaler1",
        vec![("I00", edge)],
    )?;

    Ok(catalog)
}

/// A scan that grows by one point per [`SimulatedScan::advance`] and
/// finishes after `total` points.
#[derive(Debug, Clone)]
pub struct SimulatedScan {
    uid: String,
    positions: Vec<f64>,
    acquired: usize,
}

impl SimulatedScan {
    pub const MOTOR: &'static str = "m1";
    pub const SIGNAL: &'static str = "I00";
    pub const MONITOR: &'static str = "I0";

    /// Creates the run with an empty stream.
    pub fn start(catalog: &mut MemoryCatalog, uid: &str, scan_id: i64, total: usize) -> Result<Self, CatalogError> {
        let signals = [Self::SIGNAL, Self::MONITOR];
        catalog.insert_run(
            uid,
            start_document(scan_id, "scan", "simulated acquisition", Self::MOTOR, "scaler1"),
        );
        catalog.insert_stream(
            uid,
            DEMO_STREAM,
            StreamData::new(),
            descriptors(Self::MOTOR, "scaler1", &signals),
        )?;
        log::info!("Simulated acquisition '{uid}' started ({total} points)");

        Ok(Self {
            uid: uid.to_owned(),
            positions: linspace(-0.5, 1.0, total),
            acquired: 0,
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn is_running(&self) -> bool {
        self.acquired < self.positions.len()
    }

    /// Records the next point. The run is closed after the last one.
    pub fn advance(&mut self, catalog: &mut MemoryCatalog) -> Result<(), CatalogError> {
        let Some(&x) = self.positions.get(self.acquired) else {
            return Ok(());
        };
        let i = self.acquired;

        catalog.append(&self.uid, DEMO_STREAM, Self::MOTOR, &[x])?;
        catalog.append(&self.uid, DEMO_STREAM, Self::SIGNAL, &[peak_signal(x, i)])?;
        catalog.append(&self.uid, DEMO_STREAM, Self::MONITOR, &[monitor_signal(i)])?;
        self.acquired += 1;

        if !self.is_running() {
            catalog.finish_run(&self.uid, "success")?;
            log::info!("Simulated acquisition '{}' finished", self.uid);
        }
        Ok(())
    }
}
