//! Service configuration.
//!
//! Resolution order: built-in defaults, then an optional YAML file, then
//! `WINDOW_*` environment variables (a `.env` file is loaded by `main`).

use anyhow::{Context, Result};
use grid_processor::{ClipOptions, CrsPolicy};
use renderer::{Colormap, EmptyPolicy, RenderOptions};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use window_common::{DatasetKind, WindowError, WindowResult};

/// Name of the data variable written by xarray for an unnamed DataArray.
pub const DEFAULT_VARIABLE: &str = "__xarray_dataarray_variable__";

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listen address
    pub listen: String,

    /// Directory the raster sources are resolved against
    pub data_dir: PathBuf,

    /// Burn-window (COUNT) source
    pub burn_window: SourceConfig,

    /// Temperature (CONTINUOUS) source
    pub temperature: SourceConfig,

    /// State boundary, GeoJSON
    pub boundary_path: PathBuf,

    /// Named county polygons for `/county`, GeoJSON FeatureCollection
    pub counties_path: Option<PathBuf>,

    /// Where rendered artifacts are published
    pub output_dir: PathBuf,

    pub render: RenderOptions,
    pub clip: ClipOptions,
}

/// One gridded raster source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// NetCDF file, relative to `data_dir` unless absolute
    pub file: PathBuf,
    /// Data variable holding the (time, lat, lon) values
    #[serde(default = "default_variable")]
    pub variable: String,
    /// Colormap the raster and its legend are drawn with
    pub colormap: String,
}

fn default_variable() -> String {
    DEFAULT_VARIABLE.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5000".to_string(),
            data_dir: PathBuf::from("."),
            burn_window: SourceConfig {
                file: PathBuf::from("window.nc"),
                variable: default_variable(),
                colormap: DatasetKind::Count.default_colormap().to_string(),
            },
            temperature: SourceConfig {
                file: PathBuf::from("temperature.nc"),
                variable: default_variable(),
                colormap: DatasetKind::Continuous.default_colormap().to_string(),
            },
            boundary_path: PathBuf::from("california_shp/CA_State_TIGER2016.shp"),
            counties_path: None,
            output_dir: PathBuf::from("."),
            render: RenderOptions::default(),
            clip: ClipOptions::default(),
        }
    }
}

impl ServiceConfig {
    /// Load defaults, the YAML file at `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                Self::from_yaml_str(&text)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML; absent fields keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Override fields from `WINDOW_*` variables looked up through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("WINDOW_LISTEN") {
            self.listen = v;
        }
        if let Some(v) = lookup("WINDOW_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("WINDOW_BURN_WINDOW_FILE") {
            self.burn_window.file = PathBuf::from(v);
        }
        if let Some(v) = lookup("WINDOW_TEMPERATURE_FILE") {
            self.temperature.file = PathBuf::from(v);
        }
        if let Some(v) = lookup("WINDOW_BOUNDARY_PATH") {
            self.boundary_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("WINDOW_COUNTIES_PATH") {
            self.counties_path = (!v.is_empty()).then(|| PathBuf::from(v));
        }
        if let Some(v) = lookup("WINDOW_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("WINDOW_RENDER_DENSITY") {
            self.render.density = parse_number("WINDOW_RENDER_DENSITY", &v)?;
        }
        if let Some(v) = lookup("WINDOW_LEGEND_DPI") {
            self.render.legend_dpi = parse_number("WINDOW_LEGEND_DPI", &v)?;
        }
        if let Some(v) = lookup("WINDOW_EMPTY_POLICY") {
            self.render.empty_policy = parse_variant::<EmptyPolicy>("WINDOW_EMPTY_POLICY", &v)?;
        }
        if let Some(v) = lookup("WINDOW_CRS_POLICY") {
            self.clip.crs_policy = parse_variant::<CrsPolicy>("WINDOW_CRS_POLICY", &v)?;
        }
        if let Some(v) = lookup("WINDOW_CLIP_DROP") {
            self.clip.drop = parse_flag("WINDOW_CLIP_DROP", &v)?;
        }
        Ok(())
    }

    /// Reject settings no query could succeed with.
    pub fn validate(&self) -> WindowResult<()> {
        if self.render.density == 0 {
            return Err(WindowError::Config("render.density must be positive".to_string()));
        }
        if self.render.legend_dpi == 0 {
            return Err(WindowError::Config("render.legend_dpi must be positive".to_string()));
        }
        for kind in DatasetKind::ALL {
            let source = self.source(kind);
            if source.variable.is_empty() {
                return Err(WindowError::Config(format!("{} source has no variable name", kind)));
            }
            Colormap::named(&source.colormap)
                .map_err(|e| WindowError::Config(format!("{} source: {}", kind, e)))?;
        }
        Ok(())
    }

    pub fn source(&self, kind: DatasetKind) -> &SourceConfig {
        match kind {
            DatasetKind::Count => &self.burn_window,
            DatasetKind::Continuous => &self.temperature,
        }
    }

    /// Path of the NetCDF file backing `kind`.
    pub fn source_path(&self, kind: DatasetKind) -> PathBuf {
        self.data_dir.join(&self.source(kind).file)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a positive integer, got '{}'", key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => anyhow::bail!("{} must be true or false, got '{}'", key, value),
    }
}

/// Parse a snake_case enum variant the way it is spelled in YAML.
fn parse_variant<T: DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    serde_yaml::from_str(value.trim())
        .with_context(|| format!("{} has unknown value '{}'", key, value))
}
