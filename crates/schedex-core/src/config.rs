use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::detect::DetectorConfig;
use crate::error::SchedexError;

/// Everything a run needs, passed explicitly to the components that use it.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub detector: DetectorConfig,
    pub model: ModelSettings,
    pub render: RenderSettings,
}

/// Filesystem locations. Nothing is created until an `ensure_*` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Where cropped regions are written for visual verification.
    pub debug_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            input_dir: PathBuf::from("drawings"),
            output_dir: PathBuf::from("output"),
            debug_dir: PathBuf::from("debug_images"),
        }
    }
}

impl Paths {
    pub fn ensure_output_dir(&self) -> Result<&Path, SchedexError> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(&self.output_dir)
    }

    pub fn ensure_debug_dir(&self) -> Result<&Path, SchedexError> {
        std::fs::create_dir_all(&self.debug_dir)?;
        Ok(&self.debug_dir)
    }
}

/// Generative model and request settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    /// Kept low for consistent, literal transcription.
    pub temperature: f32,
    /// Large schedules produce long replies; too low a cap truncates the JSON.
    pub max_output_tokens: u32,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// API base URL, without the `/models/...` suffix.
    pub endpoint: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            name: "gemini-3-pro-preview".into(),
            temperature: 0.1,
            max_output_tokens: 65536,
            api_key_env: "GOOGLE_API_KEY".into(),
            timeout_secs: 300,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Resolution for rendering PDF pages. The detector's row bucketing
    /// assumes pages rendered at roughly this density.
    pub dpi: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings { dpi: 200 }
    }
}

/// Load a config from a JSON file.
pub fn load_config(path: &Path) -> Result<Config, SchedexError> {
    let content = std::fs::read_to_string(path).map_err(|e| SchedexError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a config from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<Config, SchedexError> {
    let config: Config = serde_json::from_str(json).map_err(|e| SchedexError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a config is usable.
pub fn validate_config(config: &Config) -> Result<(), SchedexError> {
    config.detector.validate()?;

    if config.model.name.trim().is_empty() {
        return Err(SchedexError::ConfigInvalid(
            "model name must not be empty".into(),
        ));
    }
    if config.model.api_key_env.trim().is_empty() {
        return Err(SchedexError::ConfigInvalid(
            "api_key_env must not be empty".into(),
        ));
    }
    if !(0.0..=2.0).contains(&config.model.temperature) {
        return Err(SchedexError::ConfigInvalid(format!(
            "temperature must be between 0 and 2, got {}",
            config.model.temperature
        )));
    }
    if config.model.max_output_tokens == 0 {
        return Err(SchedexError::ConfigInvalid(
            "max_output_tokens must be positive".into(),
        ));
    }
    if config.render.dpi == 0 {
        return Err(SchedexError::ConfigInvalid("dpi must be positive".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.detector.min_width_percent, 10.0);
        assert_eq!(config.detector.max_height_percent, 95.0);
        assert_eq!(config.detector.padding, 20);
        assert_eq!(config.model.max_output_tokens, 65536);
        assert_eq!(config.paths.debug_dir, PathBuf::from("debug_images"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = parse_config(
            r#"{"detector":{"padding":5},"paths":{"output_dir":"/tmp/out"}}"#,
            Path::new("inline.json"),
        )
        .unwrap();
        assert_eq!(config.detector.padding, 5);
        assert_eq!(config.detector.min_height_percent, 10.0);
        assert_eq!(config.paths.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.paths.input_dir, PathBuf::from("drawings"));
        assert_eq!(config.model.name, "gemini-3-pro-preview");
    }

    #[test]
    fn contradictory_detector_window_is_rejected() {
        let err = parse_config(
            r#"{"detector":{"min_height_percent":60,"max_height_percent":50}}"#,
            Path::new("inline.json"),
        )
        .unwrap_err();
        assert!(matches!(err, SchedexError::ConfigInvalid(_)));
    }

    #[test]
    fn malformed_json_reports_source() {
        let err = parse_config("{not json", Path::new("bad.json")).unwrap_err();
        match err {
            SchedexError::ConfigLoad { path, .. } => assert_eq!(path, PathBuf::from("bad.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loading_does_not_create_directories() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            output_dir: dir.path().join("out"),
            debug_dir: dir.path().join("debug"),
            ..Default::default()
        };
        assert!(!paths.output_dir.exists());
        paths.ensure_output_dir().unwrap();
        assert!(paths.output_dir.exists());
        assert!(!paths.debug_dir.exists());
    }
}
