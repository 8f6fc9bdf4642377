//! Application state and shared resources.

use std::sync::Arc;

use anyhow::{Context, Result};
use grid_processor::{BoundaryPolygon, BoundarySet};
use metrics_exporter_prometheus::PrometheusHandle;
use renderer::Renderer;
use tracing::info;

use crate::config::ServiceConfig;
use crate::county::CountyService;
use crate::pipeline::{NetCdfSource, Pipeline, PipelineSettings, RasterSource};

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,
    pub pipeline: Arc<Pipeline>,
    pub county: Option<Arc<CountyService>>,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        pipeline: Arc<Pipeline>,
        county: Option<Arc<CountyService>>,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config,
            pipeline,
            county,
            prometheus,
        }
    }

    /// Build the production state: NetCDF sources, the state boundary loaded
    /// once, and the county polygons when configured.
    pub fn from_config(config: ServiceConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        netcdf_parser::silence_hdf5_errors();

        let boundary = BoundaryPolygon::load(&config.boundary_path).with_context(|| {
            format!("loading state boundary {}", config.boundary_path.display())
        })?;
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("creating output directory {}", config.output_dir.display())
        })?;

        let source: Arc<dyn RasterSource> = Arc::new(NetCdfSource::from_config(&config));
        let renderer = Arc::new(Renderer::new(config.render));
        let settings = PipelineSettings::from_config(&config)?;
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&source),
            Arc::new(boundary),
            renderer,
            settings,
        ));

        let county = match &config.counties_path {
            Some(path) => {
                let counties = BoundarySet::load(path)
                    .with_context(|| format!("loading county polygons {}", path.display()))?;
                Some(Arc::new(CountyService::new(
                    source,
                    counties,
                    config.burn_window.variable.clone(),
                )))
            }
            None => {
                info!("No county polygons configured; /county is disabled");
                None
            }
        };

        Ok(Self::new(config, pipeline, county, prometheus))
    }
}
