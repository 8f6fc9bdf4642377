//! Error types for the burn-window pipeline.

use thiserror::Error;

use crate::crs::CrsCode;

/// Result type alias using WindowError.
pub type WindowResult<T> = Result<T, WindowError>;

/// Primary error type for pipeline operations.
#[derive(Debug, Error)]
pub enum WindowError {
    // === Request Errors ===
    #[error("Invalid date window [{start}, {end}] for time axis of length {time_len}")]
    InvalidRange { start: i64, end: i64, time_len: usize },

    // === Data Errors ===
    #[error("Variable '{0}' not found in dataset")]
    MissingVariable(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("NetCDF error: {0}")]
    NetCdf(String),

    // === Geometry Errors ===
    #[error("Raster extent does not intersect the boundary")]
    DisjointGeometry,

    #[error("Raster CRS {raster} does not match boundary CRS {boundary}")]
    CrsMismatch { raster: String, boundary: String },

    #[error("Boundary error: {0}")]
    Boundary(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    RenderFailure(String),

    #[error("Malformed image: {0}")]
    MalformedImage(String),

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WindowError {
    /// Build a CRS mismatch error from the two codes involved.
    pub fn crs_mismatch(raster: CrsCode, boundary: CrsCode) -> Self {
        WindowError::CrsMismatch {
            raster: raster.to_string(),
            boundary: boundary.to_string(),
        }
    }

    /// Stable short name for logs and metrics labels.
    pub fn kind_name(&self) -> &'static str {
        match self {
            WindowError::InvalidRange { .. } => "invalid_range",
            WindowError::MissingVariable(_) => "missing_variable",
            WindowError::InvalidFormat(_) => "invalid_format",
            WindowError::NetCdf(_) => "netcdf",
            WindowError::DisjointGeometry => "disjoint_geometry",
            WindowError::CrsMismatch { .. } => "crs_mismatch",
            WindowError::Boundary(_) => "boundary",
            WindowError::RenderFailure(_) => "render_failure",
            WindowError::MalformedImage(_) => "malformed_image",
            WindowError::Config(_) => "config",
            WindowError::Io(_) => "io",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WindowError::InvalidRange { .. } => 400,
            WindowError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => 404,
            _ => 500,
        }
    }
}
