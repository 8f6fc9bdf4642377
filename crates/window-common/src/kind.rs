//! Dataset kinds and the inclusive date window a query reduces over.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::{WindowError, WindowResult};

/// How the time axis is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
}

/// The two dataset kinds served per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Binary daily indicator (burn window met); summed into a day count.
    Count,
    /// Continuous measurement (temperature); averaged, zero means no data.
    Continuous,
}

impl DatasetKind {
    /// Both kinds, in the order a query processes them.
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Count, DatasetKind::Continuous];

    pub fn aggregation(&self) -> Aggregation {
        match self {
            DatasetKind::Count => Aggregation::Sum,
            DatasetKind::Continuous => Aggregation::Mean,
        }
    }

    /// Whether a reduced value of exactly zero is reinterpreted as missing.
    pub fn zero_is_missing(&self) -> bool {
        matches!(self, DatasetKind::Continuous)
    }

    /// Physical quantity and units shown next to the legend.
    pub fn legend_label(&self) -> &'static str {
        match self {
            DatasetKind::Count => "Days that burn windows are met",
            DatasetKind::Continuous => "Average Temperature (°F)",
        }
    }

    /// Colormap name used when none is configured.
    pub fn default_colormap(&self) -> &'static str {
        match self {
            DatasetKind::Count => "hot",
            DatasetKind::Continuous => "summer",
        }
    }

    /// Published file name of the rendered raster.
    pub fn image_file_name(&self) -> &'static str {
        match self {
            DatasetKind::Count => "burn_window.svg",
            DatasetKind::Continuous => "temperature_window.svg",
        }
    }

    /// Published file name of the legend.
    pub fn legend_file_name(&self) -> &'static str {
        match self {
            DatasetKind::Count => "burn_legend.png",
            DatasetKind::Continuous => "temperature_legend.png",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Count => "count",
            DatasetKind::Continuous => "continuous",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive index range `[start, end]` into a dataset's time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: usize,
    end: usize,
}

impl DateWindow {
    /// Validate a window against a time axis of `time_len` steps.
    ///
    /// Out-of-bounds, negative or inverted windows fail; nothing is clamped.
    pub fn new(start: i64, end: i64, time_len: usize) -> WindowResult<Self> {
        let invalid = || WindowError::InvalidRange {
            start,
            end,
            time_len,
        };
        if start < 0 || end < start {
            return Err(invalid());
        }
        let (start_idx, end_idx) = (start as usize, end as usize);
        if end_idx >= time_len {
            return Err(invalid());
        }
        Ok(Self {
            start: start_idx,
            end: end_idx,
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of time steps covered, `end - start + 1`.
    pub fn days(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
