//! Error types for NetCDF parsing operations.

use thiserror::Error;
use window_common::WindowError;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Error reported by the netcdf library
    #[error("NetCDF library error: {0}")]
    Library(#[from] netcdf::Error),

    /// Axes or values failed grid validation
    #[error(transparent)]
    Grid(#[from] WindowError),
}

impl From<NetCdfError> for WindowError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::IoError(e) => WindowError::Io(e),
            NetCdfError::MissingData(msg) | NetCdfError::InvalidFormat(msg) => {
                WindowError::InvalidFormat(msg)
            }
            NetCdfError::Library(e) => WindowError::NetCdf(e.to_string()),
            NetCdfError::Grid(e) => e,
        }
    }
}
