//! JSON run configuration.

use annotaug_pipeline::PipelineParams;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("in")
}

fn default_annotations() -> PathBuf {
    PathBuf::from("output_imglab.xml")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_seed() -> u64 {
    234
}

fn default_num_augment() -> u32 {
    1
}

fn default_extension() -> String {
    "jpg".to_string()
}

fn default_true() -> bool {
    true
}

/// Everything a batch run needs. Missing JSON fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    /// Directory the annotation `file` attributes are relative to.
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default = "default_annotations")]
    pub annotations: PathBuf,
    /// Augmented images are written below this directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Defaults to `<output_dir>/output.xml`.
    #[serde(default)]
    pub output_xml: Option<PathBuf>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Augmented copies per source record.
    #[serde(default = "default_num_augment")]
    pub num_augment: u32,
    #[serde(default)]
    pub parallel: bool,
    /// Also write a `_preview` copy with the annotation drawn on it.
    #[serde(default)]
    pub draw_annotations: bool,
    /// Used for source files without an extension.
    #[serde(default = "default_extension")]
    pub default_extension: String,
    #[serde(default = "default_true")]
    pub clip_boxes: bool,
    #[serde(default)]
    pub pipeline: PipelineParams,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            annotations: default_annotations(),
            output_dir: default_output_dir(),
            output_xml: None,
            seed: default_seed(),
            num_augment: default_num_augment(),
            parallel: false,
            draw_annotations: false,
            default_extension: default_extension(),
            clip_boxes: true,
            pipeline: PipelineParams::default(),
        }
    }
}

impl AugmentConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output annotation path.
    pub fn output_xml_path(&self) -> PathBuf {
        self.output_xml
            .clone()
            .unwrap_or_else(|| self.output_dir.join("output.xml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: AugmentConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, AugmentConfig::default());
        assert_eq!(cfg.seed, 234);
        assert_eq!(cfg.num_augment, 1);
        assert!(cfg.clip_boxes);
        assert_eq!(cfg.output_xml_path(), PathBuf::from("out").join("output.xml"));
    }

    #[test]
    fn json_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cfg.json");
        let cfg = AugmentConfig {
            seed: 7,
            num_augment: 3,
            output_xml: Some(PathBuf::from("elsewhere.xml")),
            parallel: true,
            ..AugmentConfig::default()
        };
        cfg.write_json(&path).expect("write");
        let back = AugmentConfig::load_json(&path).expect("load");
        assert_eq!(back, cfg);
        assert_eq!(back.output_xml_path(), PathBuf::from("elsewhere.xml"));
    }

    #[test]
    fn nested_pipeline_overrides_are_partial() {
        let raw = r#"{ "pipeline": { "geometric": { "flip_vertical_probability": 0.0 } } }"#;
        let cfg: AugmentConfig = serde_json::from_str(raw).expect("parse");
        assert_eq!(cfg.pipeline.geometric.flip_vertical_probability, 0.0);
        assert_eq!(
            cfg.pipeline.geometric.flip_horizontal_probability,
            PipelineParams::default().geometric.flip_horizontal_probability
        );
    }
}
