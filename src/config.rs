//! Configuration management for fuel_report
//!
//! An optional JSON file supplies operator defaults; command-line flags
//! override individual values.

use crate::error::{Error, Result};
use crate::metrics::FuelParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Fuel unit price (JPY per litre)
    #[serde(default = "default_fuel_price")]
    pub fuel_price: f64,

    /// Assumed fuel efficiency (km per litre)
    #[serde(default = "default_fuel_efficiency")]
    pub fuel_efficiency_km_per_l: f64,

    /// Input text encoding label, or "auto"
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Directory for generated CSV/JSON files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Rows shown per console preview table
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Headerless `id,password` CSV; login is skipped when unset
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
}

fn default_fuel_price() -> f64 {
    160.0
}

fn default_fuel_efficiency() -> f64 {
    3.5
}

fn default_encoding() -> String {
    "auto".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_preview_rows() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fuel_price: default_fuel_price(),
            fuel_efficiency_km_per_l: default_fuel_efficiency(),
            encoding: default_encoding(),
            output_dir: default_output_dir(),
            preview_rows: default_preview_rows(),
            credentials_file: None,
        }
    }
}

impl Config {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn fuel_params(&self) -> Result<FuelParams> {
        FuelParams::new(self.fuel_price, self.fuel_efficiency_km_per_l)
    }
}
