//! Pipeline configuration, stored as a JSON file:
//!
//! ```json
//! {
//!   "paths": {
//!     "project_root": ".",
//!     "unscheduled_all": "data/raw/unscheduled/all",
//!     "unscheduled_2021": "data/raw/unscheduled/2021",
//!     "utilization_dir": "data/raw/utilization",
//!     "data_processed": "data/processed",
//!     "dataset_weekly": "data/processed/dataset_semanal.csv"
//!   },
//!   "pipeline": { "ac_type_filter": "B737NG", "min_date": "2014-12-31" }
//! }
//! ```
//!
//! Every key is optional. Relative paths resolve against `project_root`,
//! which itself resolves against the directory holding the config file.

use crate::aggregate::hh::DEFAULT_AC_TYPE;
use crate::error::{PipelineError, Result};
use crate::source::TextEncoding;
use crate::validate::default_required_columns;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Env var naming the config file when `--config` is not given.
pub const CONFIG_ENV: &str = "HH_DATASET_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub project_root: PathBuf,
    pub unscheduled_all: PathBuf,
    pub unscheduled_2021: PathBuf,
    /// Pre-consolidated maintenance CSV; used instead of the spreadsheets when it exists.
    pub unscheduled_csv: Option<PathBuf>,
    pub utilization_dir: PathBuf,
    pub data_processed: PathBuf,
    pub dataset_weekly: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            project_root: PathBuf::from("."),
            unscheduled_all: PathBuf::from("data/raw/unscheduled/all"),
            unscheduled_2021: PathBuf::from("data/raw/unscheduled/2021"),
            unscheduled_csv: None,
            utilization_dir: PathBuf::from("data/raw/utilization"),
            data_processed: PathBuf::from("data/processed"),
            dataset_weekly: PathBuf::from("data/processed/dataset_semanal.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub encoding: TextEncoding,
    pub ac_type_filter: String,
    pub min_date: NaiveDate,
    pub required_columns: Option<Vec<String>>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            encoding: TextEncoding::Latin1,
            ac_type_filter: DEFAULT_AC_TYPE.to_string(),
            min_date: NaiveDate::from_ymd_opt(2014, 12, 31).unwrap_or(NaiveDate::MIN),
            required_columns: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub pipeline: DatasetConfig,
    /// Directory of the config file; relative roots resolve from here.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config: PipelineConfig = serde_json::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn project_root(&self) -> PathBuf {
        join_relative(&self.base_dir, &self.paths.project_root)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        join_relative(&self.project_root(), path)
    }

    pub fn legacy_dir(&self) -> PathBuf {
        self.resolve(&self.paths.unscheduled_all)
    }

    pub fn current_dir(&self) -> PathBuf {
        self.resolve(&self.paths.unscheduled_2021)
    }

    pub fn consolidated_csv(&self) -> Option<PathBuf> {
        self.paths.unscheduled_csv.as_deref().map(|p| self.resolve(p))
    }

    pub fn utilization_dir(&self) -> PathBuf {
        self.resolve(&self.paths.utilization_dir)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.resolve(&self.paths.data_processed)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.resolve(&self.paths.dataset_weekly)
    }

    pub fn required_columns(&self) -> Vec<String> {
        self.pipeline
            .required_columns
            .clone()
            .unwrap_or_else(default_required_columns)
    }
}

fn join_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.pipeline.ac_type_filter, "B737NG");
        assert_eq!(
            config.pipeline.min_date,
            NaiveDate::from_ymd_opt(2014, 12, 31).unwrap()
        );
        assert_eq!(config.pipeline.encoding, TextEncoding::Latin1);
        assert_eq!(config.required_columns().len(), 7);
        assert_eq!(config.consolidated_csv(), None);
    }

    #[test]
    fn test_load_resolves_paths_from_config_dir() {
        let dir = env::temp_dir().join("hh_dataset_test_config");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(
            &path,
            r#"{
                "paths": { "project_root": "proj", "utilization_dir": "/abs/util" },
                "pipeline": { "encoding": "utf-8", "min_date": "2020-01-01",
                              "required_columns": ["date", "HH"] }
            }"#,
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.project_root(), dir.join("proj"));
        assert_eq!(config.legacy_dir(), dir.join("proj/data/raw/unscheduled/all"));
        assert_eq!(config.utilization_dir(), PathBuf::from("/abs/util"));
        assert_eq!(config.pipeline.encoding, TextEncoding::Utf8);
        assert_eq!(config.required_columns(), vec!["date", "HH"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_bad_encoding_is_config_error() {
        let dir = env::temp_dir().join("hh_dataset_test_config_bad");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, r#"{ "pipeline": { "encoding": "ebcdic" } }"#).unwrap();

        let err = PipelineConfig::load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_config_is_error() {
        let path = env::temp_dir().join("hh_dataset_test_no_config.json");
        assert!(PipelineConfig::load(&path).is_err());
    }
}
