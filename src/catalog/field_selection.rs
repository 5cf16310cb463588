//! Which fields of a stream go on which axis.
//!
//! A field is unselected, X, Y or Mon. At most one field is X and at most
//! one is Mon; any number are Y. The plot is `Y / Mon` against `X`, using the
//! point index when there is no X and no normalisation when there is no Mon.

use indexmap::IndexMap;

use super::StreamData;
use super::analysis::SignalAxesFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum FieldRole {
    X,
    Y,
    Mon,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
pub struct PlotRequest {
    pub x: Option<String>,
    pub y: Vec<String>,
    pub mon: Option<String>,
}

impl PlotRequest {
    /// Every field the request reads.
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.x.iter().cloned().collect();
        fields.extend(self.y.iter().cloned());
        fields.extend(self.mon.iter().cloned());
        fields
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct FieldSelection {
    roles: IndexMap<String, Option<FieldRole>>,
}

impl FieldSelection {
    pub fn new(fields: &[String]) -> Self {
        Self {
            roles: fields.iter().map(|field| (field.clone(), None)).collect(),
        }
    }

    /// Preselects the analysed axis as X and the signal as Y.
    pub fn with_defaults(fields: &[String], analysis: &SignalAxesFields) -> Self {
        let mut selection = Self::new(fields);
        if let Some(axis) = analysis.plot_axes.first() {
            selection.set_role(axis, Some(FieldRole::X));
        }
        if let Some(signal) = &analysis.plot_signal {
            selection.set_role(signal, Some(FieldRole::Y));
        }
        selection
    }

    /// Returns false for a field not in the selection.
    pub fn set_role(&mut self, field: &str, role: Option<FieldRole>) -> bool {
        if !self.roles.contains_key(field) {
            return false;
        }
        if let Some(unique @ (FieldRole::X | FieldRole::Mon)) = role {
            for (name, other) in self.roles.iter_mut() {
                if name != field && *other == Some(unique) {
                    *other = None;
                }
            }
        }
        self.roles.insert(field.to_owned(), role);
        log::debug!("Field '{field}' selected as {role:?}");
        true
    }

    pub fn role(&self, field: &str) -> Option<FieldRole> {
        self.roles.get(field).copied().flatten()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, Option<FieldRole>)> {
        self.roles.iter().map(|(field, role)| (field, *role))
    }

    fn with_role(&self, role: FieldRole) -> impl Iterator<Item = &String> {
        self.roles
            .iter()
            .filter(move |(_, r)| **r == Some(role))
            .map(|(field, _)| field)
    }

    pub fn x(&self) -> Option<&String> {
        self.with_role(FieldRole::X).next()
    }

    pub fn mon(&self) -> Option<&String> {
        self.with_role(FieldRole::Mon).next()
    }

    pub fn y(&self) -> Vec<&String> {
        self.with_role(FieldRole::Y).collect()
    }

    /// `None` until at least one Y is selected.
    pub fn plot_request(&self) -> Option<PlotRequest> {
        let y: Vec<String> = self.y().into_iter().cloned().collect();
        if y.is_empty() {
            return None;
        }
        Some(PlotRequest {
            x: self.x().cloned(),
            y,
            mon: self.mon().cloned(),
        })
    }

    pub fn clear(&mut self) {
        for role in self.roles.values_mut() {
            *role = None;
        }
    }
}

/// `y / mon` elementwise over the shorter length. Zero monitor counts give
/// non-finite values.
pub fn normalize(y: &[f64], mon: &[f64]) -> Vec<f64> {
    y.iter().zip(mon).map(|(y, m)| y / m).collect()
}

/// `(x, y / mon)` for one Y field, every array trimmed to the shortest.
///
/// Fails with the name of the first field missing from `data`.
pub fn assemble_series<'a>(
    data: &StreamData,
    x: Option<&'a str>,
    y: &'a str,
    mon: Option<&'a str>,
) -> Result<(Option<Vec<f64>>, Vec<f64>), &'a str> {
    let get = |field: &'a str| data.get(field).ok_or(field);

    let y_values = get(y)?;
    let x_values = x.map(get).transpose()?;
    let mon_values = mon.map(get).transpose()?;

    let len = [Some(y_values), x_values, mon_values]
        .into_iter()
        .flatten()
        .map(Vec::len)
        .min()
        .unwrap_or(0);

    let y = match mon_values {
        Some(mon) => normalize(&y_values[..len], &mon[..len]),
        None => y_values[..len].to_vec(),
    };
    Ok((x_values.map(|x| x[..len].to_vec()), y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<String> {
        ["m1", "I0", "I00", "diode"].iter().map(|f| (*f).to_owned()).collect()
    }

    #[test]
    fn x_and_mon_are_unique() {
        let mut selection = FieldSelection::new(&fields());
        selection.set_role("m1", Some(FieldRole::X));
        selection.set_role("I0", Some(FieldRole::X));
        selection.set_role("I00", Some(FieldRole::Mon));
        selection.set_role("diode", Some(FieldRole::Mon));

        assert_eq!(selection.x().map(String::as_str), Some("I0"));
        assert_eq!(selection.mon().map(String::as_str), Some("diode"));
        assert_eq!(selection.role("m1"), None);
        assert_eq!(selection.role("I00"), None);
    }

    #[test]
    fn many_y() {
        let mut selection = FieldSelection::new(&fields());
        assert_eq!(selection.plot_request(), None);

        selection.set_role("I0", Some(FieldRole::Y));
        selection.set_role("diode", Some(FieldRole::Y));
        selection.set_role("m1", Some(FieldRole::X));

        let request = selection.plot_request().unwrap();
        assert_eq!(request.x.as_deref(), Some("m1"));
        assert_eq!(request.y, vec!["I0", "diode"]);
        assert_eq!(request.mon, None);
        assert_eq!(request.fields(), vec!["m1", "I0", "diode"]);
    }

    #[test]
    fn one_role_per_field() {
        let mut selection = FieldSelection::new(&fields());
        selection.set_role("I0", Some(FieldRole::Y));
        selection.set_role("I0", Some(FieldRole::X));
        assert!(selection.y().is_empty());
        assert!(!selection.set_role("nope", Some(FieldRole::Y)));
    }

    #[test]
    fn defaults_from_analysis() {
        let analysis = SignalAxesFields {
            plot_axes: vec!["m1".to_owned()],
            plot_signal: Some("I0".to_owned()),
            ..Default::default()
        };
        let selection = FieldSelection::with_defaults(&fields(), &analysis);
        assert_eq!(selection.role("m1"), Some(FieldRole::X));
        assert_eq!(selection.role("I0"), Some(FieldRole::Y));
    }

    #[test]
    fn normalization() {
        let y = normalize(&[2.0, 4.0, 6.0], &[2.0, 0.0]);
        assert_eq!(y.len(), 2);
        assert_eq!(y[0], 1.0);
        assert!(y[1].is_infinite());
    }

    #[test]
    fn series_are_trimmed_to_the_shortest() {
        let mut data = StreamData::new();
        data.insert("m1".to_owned(), (0..10).map(f64::from).collect());
        data.insert("I0".to_owned(), vec![2.0; 8]);
        data.insert("mon".to_owned(), vec![2.0; 9]);

        let (x, y) = assemble_series(&data, Some("m1"), "I0", Some("mon")).unwrap();
        assert_eq!(x.unwrap().len(), 8);
        assert_eq!(y, vec![1.0; 8]);

        let (x, y) = assemble_series(&data, None, "I0", None).unwrap();
        assert!(x.is_none());
        assert_eq!(y.len(), 8);

        assert_eq!(assemble_series(&data, Some("m2"), "I0", None).unwrap_err(), "m2");
    }
}
