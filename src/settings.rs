use std::fmt::Display;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug)]
pub enum SettingsError {
    File(std::io::Error),
    Parse(serde_yaml::Error),
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::File(err)
    }
}

impl From<serde_yaml::Error> for SettingsError {
    fn from(err: serde_yaml::Error) -> Self {
        SettingsError::Parse(err)
    }
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::File(x) => write!(f, "Could not access the settings file: {x}"),
            SettingsError::Parse(x) => write!(f, "Could not parse the settings: {x}"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Tunables of the plotting and fitting workflow. Passed by value to the
/// chart, the live controller and the app; the registries never see it.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct VizSettings {
    pub live_interval_ms: u64,
    pub fit_curve_points: usize,
    pub max_iterations: usize,
    pub snap_to_curve: bool,
    pub default_stream: String,
    /// Consecutive failed refreshes before live mode gives up.
    pub max_live_failures: usize,
    pub label_uid_chars: usize,
}

impl Default for VizSettings {
    fn default() -> Self {
        Self {
            live_interval_ms: 2000,
            fit_curve_points: 500,
            max_iterations: 10000,
            snap_to_curve: false,
            default_stream: "primary".to_owned(),
            max_live_failures: 3,
            label_uid_chars: 7,
        }
    }
}

impl VizSettings {
    /// Reads YAML settings; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let yaml = serde_yaml::to_string(self)?;
        let mut file = File::create(path)?;
        file.write_all(yaml.as_bytes())?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn live_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.live_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let settings: VizSettings = serde_yaml::from_str("live_interval_ms: 500\nsnap_to_curve: true\n").unwrap();
        assert_eq!(settings.live_interval_ms, 500);
        assert!(settings.snap_to_curve);
        assert_eq!(settings.fit_curve_points, 500);
        assert_eq!(settings.default_stream, "primary");
    }

    #[test]
    fn ron_round_trip() {
        let settings = VizSettings {
            max_live_failures: 5,
            ..Default::default()
        };
        let text = ron::to_string(&settings).unwrap();
        let back: VizSettings = ron::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("runviz-settings-{}.yaml", std::process::id()));
        let settings = VizSettings {
            default_stream: "baseline".to_owned(),
            ..Default::default()
        };
        settings.save(&path).unwrap();
        let loaded = VizSettings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("runviz-settings-that-does-not-exist.yaml");
        assert_eq!(VizSettings::load(&path).unwrap(), VizSettings::default());
    }
}
