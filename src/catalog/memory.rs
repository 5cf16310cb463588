use indexmap::IndexMap;
use serde_json::{Value, json};

use super::{Catalog, CatalogError, StreamData};

#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    pub data: StreamData,
    /// Per-event shape of each field; absent means scalar.
    pub shapes: IndexMap<String, Vec<usize>>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRun {
    pub metadata: Value,
    pub streams: IndexMap<String, MemoryStream>,
    /// When set, every read of this run fails with this message.
    pub read_failure: Option<String>,
}

/// A catalog held entirely in memory. Data can be appended while a run is
/// "acquiring" to drive live plots.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    name: String,
    runs: IndexMap<String, MemoryRun>,
}

impl MemoryCatalog {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            runs: IndexMap::new(),
        }
    }

    /// Adds a run from its start document. `uid` is stored in it.
    pub fn insert_run(&mut self, uid: &str, mut start: Value) {
        if let Value::Object(doc) = &mut start {
            doc.insert("uid".to_owned(), json!(uid));
        }
        self.runs.insert(
            uid.to_owned(),
            MemoryRun {
                metadata: json!({ "start": start, "stop": null }),
                ..Default::default()
            },
        );
    }

    pub fn insert_stream(&mut self, uid: &str, stream: &str, data: StreamData, metadata: Value) -> Result<(), CatalogError> {
        let run = self.run_mut(uid)?;
        run.streams.insert(
            stream.to_owned(),
            MemoryStream {
                data,
                shapes: IndexMap::new(),
                metadata,
            },
        );
        Ok(())
    }

    /// Appends values to a field, creating it when needed.
    pub fn append(&mut self, uid: &str, stream: &str, field: &str, values: &[f64]) -> Result<(), CatalogError> {
        let stream = self.stream_mut(uid, stream)?;
        stream
            .data
            .entry(field.to_owned())
            .or_default()
            .extend_from_slice(values);
        Ok(())
    }

    pub fn set_shape(&mut self, uid: &str, stream: &str, field: &str, shape: Vec<usize>) -> Result<(), CatalogError> {
        self.stream_mut(uid, stream)?
            .shapes
            .insert(field.to_owned(), shape);
        Ok(())
    }

    /// Writes the stop document, ending acquisition.
    pub fn finish_run(&mut self, uid: &str, exit_status: &str) -> Result<(), CatalogError> {
        let run = self.run_mut(uid)?;
        let num_events: serde_json::Map<String, Value> = run
            .streams
            .iter()
            .map(|(name, stream)| {
                let events = stream.data.values().map(Vec::len).max().unwrap_or(0);
                (name.clone(), json!(events))
            })
            .collect();
        run.metadata["stop"] = json!({
            "exit_status": exit_status,
            "num_events": num_events,
        });
        Ok(())
    }

    pub fn set_read_failure(&mut self, uid: &str, failure: Option<String>) -> Result<(), CatalogError> {
        self.run_mut(uid)?.read_failure = failure;
        Ok(())
    }

    pub fn run_uids(&self) -> Vec<String> {
        self.runs.keys().cloned().collect()
    }

    fn run(&self, uid: &str) -> Result<&MemoryRun, CatalogError> {
        self.runs
            .get(uid)
            .ok_or_else(|| CatalogError::RunNotFound(uid.to_owned()))
    }

    fn run_mut(&mut self, uid: &str) -> Result<&mut MemoryRun, CatalogError> {
        self.runs
            .get_mut(uid)
            .ok_or_else(|| CatalogError::RunNotFound(uid.to_owned()))
    }

    fn stream(&self, uid: &str, stream: &str) -> Result<&MemoryStream, CatalogError> {
        let run = self.run(uid)?;
        if let Some(failure) = &run.read_failure {
            return Err(CatalogError::Backend(failure.clone()));
        }
        run.streams
            .get(stream)
            .ok_or_else(|| CatalogError::StreamNotFound {
                run: uid.to_owned(),
                stream: stream.to_owned(),
            })
    }

    fn stream_mut(&mut self, uid: &str, stream: &str) -> Result<&mut MemoryStream, CatalogError> {
        let run = self.run_mut(uid)?;
        Ok(run.streams.entry(stream.to_owned()).or_default())
    }
}

impl Catalog for MemoryCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_metadata(&self, run: &str) -> Result<Value, CatalogError> {
        Ok(self.run(run)?.metadata.clone())
    }

    fn list_streams(&self, run: &str) -> Result<Vec<String>, CatalogError> {
        Ok(self.run(run)?.streams.keys().cloned().collect())
    }

    fn stream_fields(&self, run: &str, stream: &str) -> Result<Vec<String>, CatalogError> {
        Ok(self.stream(run, stream)?.data.keys().cloned().collect())
    }

    fn field_shape(&self, run: &str, stream: &str, field: &str) -> Result<Vec<usize>, CatalogError> {
        let data = self.stream(run, stream)?;
        if !data.data.contains_key(field) {
            return Err(CatalogError::FieldNotFound {
                stream: stream.to_owned(),
                field: field.to_owned(),
            });
        }
        Ok(data.shapes.get(field).cloned().unwrap_or_default())
    }

    fn read_stream_data(
        &self,
        run: &str,
        stream: &str,
        fields: Option<&[String]>,
    ) -> Result<StreamData, CatalogError> {
        let data = &self.stream(run, stream)?.data;
        Ok(match fields {
            Some(fields) => fields
                .iter()
                .filter_map(|field| data.get(field).map(|values| (field.clone(), values.clone())))
                .collect(),
            None => data.clone(),
        })
    }

    fn is_run_active(&self, run: &str) -> Result<bool, CatalogError> {
        let metadata = &self.run(run)?.metadata;
        Ok(metadata.get("stop").is_none_or(Value::is_null))
    }

    fn stream_metadata(&self, run: &str, stream: &str) -> Result<Value, CatalogError> {
        Ok(self.stream(run, stream)?.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new("training");
        catalog.insert_run("abc", json!({"scan_id": 1, "plan_name": "scan"}));
        catalog.append("abc", "primary", "m1", &[0.0, 1.0]).unwrap();
        catalog.append("abc", "primary", "I0", &[5.0]).unwrap();
        catalog
    }

    #[test]
    fn reads_requested_fields_only() {
        let catalog = catalog();
        let fields = vec!["I0".to_owned(), "missing".to_owned()];
        let data = catalog.read_stream_data("abc", "primary", Some(&fields)).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data["I0"], vec![5.0]);
        assert_eq!(catalog.stream_fields("abc", "primary").unwrap(), vec!["m1", "I0"]);
    }

    #[test]
    fn finish_writes_stop_document() {
        let mut catalog = catalog();
        assert!(catalog.is_run_active("abc").unwrap());

        catalog.finish_run("abc", "success").unwrap();

        assert!(!catalog.is_run_active("abc").unwrap());
        let md = catalog.run_metadata("abc").unwrap();
        assert_eq!(md["stop"]["num_events"]["primary"], 2);
        assert_eq!(md["start"]["uid"], "abc");
    }

    #[test]
    fn errors() {
        let mut catalog = catalog();
        assert_eq!(
            catalog.list_streams("nope").unwrap_err(),
            CatalogError::RunNotFound("nope".to_owned())
        );
        assert!(matches!(
            catalog.read_stream_data("abc", "baseline", None),
            Err(CatalogError::StreamNotFound { .. })
        ));
        assert!(matches!(
            catalog.field_shape("abc", "primary", "nope"),
            Err(CatalogError::FieldNotFound { .. })
        ));

        catalog.set_read_failure("abc", Some("timeout".to_owned())).unwrap();
        assert_eq!(
            catalog.read_stream_data("abc", "primary", None).unwrap_err(),
            CatalogError::Backend("timeout".to_owned())
        );
    }
}
