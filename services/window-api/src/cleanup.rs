//! Removal of stale intermediate files left in the output directory.

use std::path::Path;

use tracing::{info, warn};
use window_common::WindowResult;

use crate::metrics::record_cleanup;

/// File name prefix of per-query intermediate files.
pub const STALE_PREFIX: &str = "burn-window-";

/// Delete every regular file in `dir` whose name starts with
/// [`STALE_PREFIX`]. Returns the number of files removed.
///
/// A file that cannot be removed is logged and skipped.
pub fn cleanup_stale(dir: &Path) -> WindowResult<usize> {
    let mut removed = 0;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(STALE_PREFIX) || !entry.file_type()?.is_file() {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to delete stale file"),
        }
    }

    if removed > 0 {
        info!(dir = %dir.display(), removed, "Removed stale intermediate files");
    }
    record_cleanup(removed);

    Ok(removed)
}
