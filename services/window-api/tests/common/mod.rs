//! Shared fixtures for the window-api integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use grid_processor::BoundaryPolygon;
use renderer::{EmptyPolicy, RenderOptions, Renderer};
use test_utils::grid::{CA_NORTH, CA_SIZE, CA_STEP, CA_WEST, XARRAY_VARIABLE};
use test_utils::{boundary, constant_dataset, dataset_from_fn, north_up_grid};
use window_api::config::ServiceConfig;
use window_api::pipeline::{Pipeline, PipelineSettings, RasterSource};
use window_common::{DatasetKind, GeoGrid, GriddedDataset, WindowResult};

pub const DAYS: usize = 30;

/// Serves fixed in-memory datasets.
pub struct MemorySource {
    pub burn_window: GriddedDataset,
    pub temperature: GriddedDataset,
}

impl RasterSource for MemorySource {
    fn load(&self, kind: DatasetKind) -> WindowResult<GriddedDataset> {
        Ok(match kind {
            DatasetKind::Count => self.burn_window.clone(),
            DatasetKind::Continuous => self.temperature.clone(),
        })
    }
}

pub fn ca_grid() -> GeoGrid {
    north_up_grid(CA_NORTH, CA_WEST, CA_STEP, CA_SIZE, CA_SIZE)
}

/// Burn window met every day everywhere; temperature rising to the south-east.
pub fn default_source() -> MemorySource {
    let grid = ca_grid();
    MemorySource {
        burn_window: constant_dataset(&grid, DAYS, XARRAY_VARIABLE, 1.0),
        temperature: dataset_from_fn(&grid, DAYS, XARRAY_VARIABLE, |_, row, col| {
            40.0 + (row + col) as f32
        }),
    }
}

pub fn render_options(empty_policy: EmptyPolicy) -> RenderOptions {
    RenderOptions {
        density: 1100,
        legend_dpi: 72,
        empty_policy,
    }
}

pub fn config(output_dir: &Path, empty_policy: EmptyPolicy) -> ServiceConfig {
    ServiceConfig {
        output_dir: output_dir.to_path_buf(),
        render: render_options(empty_policy),
        ..ServiceConfig::default()
    }
}

pub fn california_boundary() -> Arc<BoundaryPolygon> {
    Arc::new(BoundaryPolygon::from_geojson_str(&boundary::california_box_geojson()).unwrap())
}

pub fn pipeline_with(
    source: impl RasterSource + 'static,
    boundary: Arc<BoundaryPolygon>,
    output_dir: &Path,
    empty_policy: EmptyPolicy,
) -> Arc<Pipeline> {
    let config = config(output_dir, empty_policy);
    Arc::new(Pipeline::new(
        Arc::new(source),
        boundary,
        Arc::new(Renderer::new(config.render)),
        PipelineSettings::from_config(&config).unwrap(),
    ))
}

pub fn pipeline(source: impl RasterSource + 'static, output_dir: &Path) -> Arc<Pipeline> {
    pipeline_with(source, california_boundary(), output_dir, EmptyPolicy::Error)
}

/// Values of every `fill="#xxxxxx"` attribute in an SVG.
pub fn fills(svg: &str) -> Vec<&str> {
    svg.match_indices("fill=\"")
        .map(|(i, m)| &svg[i + m.len()..i + m.len() + 7])
        .collect()
}

/// Names of files in `dir` starting with the intermediate-file prefix.
pub fn staged_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(String::from))
        .filter(|n| n.starts_with("burn-window-"))
        .collect()
}
