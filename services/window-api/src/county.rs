//! Per-county burn-window summaries for `/county`.

use std::collections::BTreeMap;
use std::sync::Arc;

use grid_processor::{reduce, zonal_stats, BoundarySet};
use serde::{Deserialize, Serialize};
use tracing::debug;
use window_common::{DatasetKind, DateWindow, WindowError, WindowResult};

use crate::pipeline::RasterSource;

/// Burn-window day counts over the cells of one county.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountySummary {
    pub mean: f64,
    pub max: f32,
    pub cells: usize,
}

/// Reduces the burn-window dataset and summarizes it per county.
pub struct CountyService {
    source: Arc<dyn RasterSource>,
    counties: BoundarySet,
    variable: String,
}

impl CountyService {
    pub fn new(source: Arc<dyn RasterSource>, counties: BoundarySet, variable: impl Into<String>) -> Self {
        Self {
            source,
            counties,
            variable: variable.into(),
        }
    }

    pub fn counties(&self) -> &BoundarySet {
        &self.counties
    }

    /// Summaries keyed by county name. Counties without a valid cell center
    /// inside them are left out.
    pub fn query(&self, start: i64, end: i64) -> WindowResult<BTreeMap<String, CountySummary>> {
        let kind = DatasetKind::Count;
        let dataset = self.source.load(kind)?;
        let window = DateWindow::new(start, end, dataset.time_len)?;
        let raster = reduce(&dataset, &self.variable, &window, kind)?;

        let mut summaries = BTreeMap::new();
        for (name, region) in self.counties.iter() {
            if let Some(crs) = raster.crs {
                if crs != region.crs() {
                    return Err(WindowError::crs_mismatch(crs, region.crs()));
                }
            }
            if let Some(stats) = zonal_stats(&raster, region) {
                summaries.insert(
                    name.to_string(),
                    CountySummary {
                        mean: stats.mean,
                        max: stats.max,
                        cells: stats.count,
                    },
                );
            }
        }

        debug!(
            %window,
            counties = self.counties.len(),
            covered = summaries.len(),
            "Summarized counties"
        );

        Ok(summaries)
    }
}
