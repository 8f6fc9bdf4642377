//! Query pipeline: load, reduce, clip, render and publish both dataset kinds.
//!
//! # Flow
//!
//! ```text
//! run(start, end)            (one at a time per process)
//!   ├─ cleanup_stale(output_dir)
//!   ├─ rayon::join ─┬─ COUNT:      load → reduce (sum)  → clip
//!   │               └─ CONTINUOUS: load → reduce (mean) → clip
//!   ├─ render session ── image + legend per kind, to burn-window-<uuid>-* names
//!   ├─ make_stretchable on both images
//!   └─ rename onto the fixed names once all four artifacts exist
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use grid_processor::{clip, reduce, BoundaryPolygon, ClipOptions};
use renderer::{make_stretchable, Colormap, Renderer, ValueRange};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;
use window_common::{DatasetKind, DateWindow, GriddedDataset, Raster2d, WindowError, WindowResult};

use crate::cleanup::{cleanup_stale, STALE_PREFIX};
use crate::config::ServiceConfig;
use crate::metrics::{record_pipeline_duration, Timer};

// ============================================================================
// Raster sources
// ============================================================================

/// Supplies the gridded dataset behind each dataset kind.
pub trait RasterSource: Send + Sync {
    fn load(&self, kind: DatasetKind) -> WindowResult<GriddedDataset>;
}

/// Reads each kind from its NetCDF file on every call.
#[derive(Debug, Clone)]
pub struct NetCdfSource {
    burn_window: PathBuf,
    temperature: PathBuf,
}

impl NetCdfSource {
    pub fn new(burn_window: impl Into<PathBuf>, temperature: impl Into<PathBuf>) -> Self {
        Self {
            burn_window: burn_window.into(),
            temperature: temperature.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.source_path(DatasetKind::Count),
            config.source_path(DatasetKind::Continuous),
        )
    }

    pub fn path(&self, kind: DatasetKind) -> &Path {
        match kind {
            DatasetKind::Count => &self.burn_window,
            DatasetKind::Continuous => &self.temperature,
        }
    }
}

impl RasterSource for NetCdfSource {
    fn load(&self, kind: DatasetKind) -> WindowResult<GriddedDataset> {
        netcdf_parser::load_dataset(self.path(kind))
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Per-kind variable and colormap.
#[derive(Debug, Clone)]
pub struct KindSettings {
    pub variable: String,
    pub colormap: Colormap,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub output_dir: PathBuf,
    pub clip: ClipOptions,
    pub burn_window: KindSettings,
    pub temperature: KindSettings,
}

impl PipelineSettings {
    pub fn from_config(config: &ServiceConfig) -> WindowResult<Self> {
        let kind = |kind: DatasetKind| -> WindowResult<KindSettings> {
            let source = config.source(kind);
            Ok(KindSettings {
                variable: source.variable.clone(),
                colormap: Colormap::named(&source.colormap)?,
            })
        };
        Ok(Self {
            output_dir: config.output_dir.clone(),
            clip: config.clip,
            burn_window: kind(DatasetKind::Count)?,
            temperature: kind(DatasetKind::Continuous)?,
        })
    }

    pub fn kind(&self, kind: DatasetKind) -> &KindSettings {
        match kind {
            DatasetKind::Count => &self.burn_window,
            DatasetKind::Continuous => &self.temperature,
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Result of a successful query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub window: DateWindow,
    /// Value range each kind's image and legend were drawn with.
    pub ranges: Vec<(DatasetKind, ValueRange)>,
    /// Published artifact paths.
    pub artifacts: Vec<PathBuf>,
    pub stale_removed: usize,
}

impl QueryOutcome {
    pub fn range(&self, kind: DatasetKind) -> Option<ValueRange> {
        self.ranges.iter().find(|(k, _)| *k == kind).map(|(_, r)| *r)
    }
}

struct Prepared {
    kind: DatasetKind,
    window: DateWindow,
    raster: Raster2d,
}

pub struct Pipeline {
    source: Arc<dyn RasterSource>,
    boundary: Arc<BoundaryPolygon>,
    renderer: Arc<Renderer>,
    settings: PipelineSettings,
    run_lock: Arc<Mutex<()>>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn RasterSource>,
        boundary: Arc<BoundaryPolygon>,
        renderer: Arc<Renderer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            boundary,
            renderer,
            settings,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Published path of the image of `kind`.
    pub fn image_path(&self, kind: DatasetKind) -> PathBuf {
        self.settings.output_dir.join(kind.image_file_name())
    }

    /// Published path of the legend of `kind`.
    pub fn legend_path(&self, kind: DatasetKind) -> PathBuf {
        self.settings.output_dir.join(kind.legend_file_name())
    }

    /// Run a query over the inclusive window `[start, end]`.
    ///
    /// Queries are serialized. Either all four artifacts are replaced or none
    /// is; the first error from either kind is returned. The lock is held by
    /// the blocking task, so a caller that drops this future does not release
    /// it before the work finishes.
    pub async fn run(self: &Arc<Self>, start: i64, end: i64) -> WindowResult<QueryOutcome> {
        let guard = Arc::clone(&self.run_lock).lock_owned().await;

        let pipeline = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            pipeline.run_blocking(start, end)
        })
            .await
            .map_err(|e| WindowError::Io(std::io::Error::other(format!("pipeline task failed: {}", e))))?
    }

    /// Synchronous body of [`Pipeline::run`]. Callers must not run two at once.
    pub fn run_blocking(&self, start: i64, end: i64) -> WindowResult<QueryOutcome> {
        let timer = Timer::start();
        let stale_removed = cleanup_stale(&self.settings.output_dir)?;

        let (count, continuous) = rayon::join(
            || self.prepare(DatasetKind::Count, start, end),
            || self.prepare(DatasetKind::Continuous, start, end),
        );
        let prepared = [count?, continuous?];

        let mut staging = Staging::new(&self.settings.output_dir);
        let mut ranges = Vec::with_capacity(prepared.len());
        {
            let session = self.renderer.session();
            for p in &prepared {
                let image = staging.stage(p.kind.image_file_name());
                let legend = staging.stage(p.kind.legend_file_name());
                let range = session.render_pair(
                    p.kind,
                    &p.window,
                    &p.raster,
                    &self.settings.kind(p.kind).colormap,
                    &image,
                    &legend,
                )?;
                ranges.push((p.kind, range));
            }
        }

        for p in &prepared {
            make_stretchable(staging.staged_path(p.kind.image_file_name()))?;
        }

        let artifacts = staging.publish()?;

        info!(
            start,
            end,
            stale_removed,
            elapsed_ms = timer.elapsed_ms(),
            "Query artifacts published"
        );

        Ok(QueryOutcome {
            window: prepared[0].window,
            ranges,
            artifacts,
            stale_removed,
        })
    }

    fn prepare(&self, kind: DatasetKind, start: i64, end: i64) -> WindowResult<Prepared> {
        let timer = Timer::start();
        let settings = self.settings.kind(kind);

        let dataset = self.source.load(kind)?;
        let window = DateWindow::new(start, end, dataset.time_len)?;
        let reduced = reduce(&dataset, &settings.variable, &window, kind)?;
        let raster = clip(&reduced, &self.boundary, &self.settings.clip)?;

        record_pipeline_duration(kind, timer.elapsed());
        debug!(
            %kind,
            %window,
            shape = ?raster.shape(),
            valid = raster.valid_count(),
            elapsed_ms = timer.elapsed_ms(),
            "Prepared raster"
        );

        Ok(Prepared { kind, window, raster })
    }
}

// ============================================================================
// Staging and publishing
// ============================================================================

/// Per-query temporary artifact names, renamed onto the fixed names on
/// publish. Anything not published is removed on drop.
///
/// Existing targets are linked aside before publishing so a failed rename
/// puts every fixed name back to its previous file.
struct Staging {
    dir: PathBuf,
    prefix: String,
    files: Vec<(PathBuf, PathBuf)>,
    published: bool,
}

impl Staging {
    fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: format!("{}{}-", STALE_PREFIX, Uuid::new_v4()),
            files: Vec::new(),
            published: false,
        }
    }

    fn staged_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, name))
    }

    /// Register `name` for publishing and return its temporary path.
    fn stage(&mut self, name: &str) -> PathBuf {
        let tmp = self.staged_path(name);
        self.files.push((tmp.clone(), self.dir.join(name)));
        tmp
    }

    fn backup_path(&self, target: &Path) -> PathBuf {
        let name = target.file_name().unwrap_or_default().to_string_lossy();
        self.dir.join(format!("{}prev-{}", self.prefix, name))
    }

    fn publish(mut self) -> WindowResult<Vec<PathBuf>> {
        let mut backups: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(self.files.len());
        for (_, target) in &self.files {
            let backup = if target.exists() {
                let backup = self.backup_path(target);
                if std::fs::hard_link(target, &backup).is_err() {
                    std::fs::copy(target, &backup)?;
                }
                Some(backup)
            } else {
                None
            };
            backups.push((target.clone(), backup));
        }

        let mut renamed = 0;
        let outcome = self.files.iter().try_for_each(|(tmp, target)| {
            std::fs::rename(tmp, target)?;
            renamed += 1;
            Ok::<_, std::io::Error>(())
        });

        if let Err(e) = outcome {
            warn!(renamed, error = %e, "Publish failed, restoring previous artifacts");
            for (target, backup) in backups.iter().take(renamed) {
                let restored = match backup {
                    Some(backup) => std::fs::rename(backup, target),
                    None => std::fs::remove_file(target),
                };
                if let Err(e) = restored {
                    warn!(path = %target.display(), error = %e, "Failed to restore artifact");
                }
            }
            for backup in backups.iter().skip(renamed).filter_map(|(_, b)| b.as_ref()) {
                remove_if_present(backup);
            }
            return Err(e.into());
        }

        for backup in backups.iter().filter_map(|(_, b)| b.as_ref()) {
            remove_if_present(backup);
        }
        self.published = true;
        Ok(self.files.iter().map(|(_, target)| target.clone()).collect())
    }
}

fn remove_if_present(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove staged file"),
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        for (tmp, _) in &self.files {
            remove_if_present(tmp);
        }
    }
}
