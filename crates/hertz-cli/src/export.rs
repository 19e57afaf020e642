//! Output directory creation and flat-file export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use ndarray::ArrayView2;
use serde::Serialize;

/// Folder name for a run started at `now`: `YYYYMMDD-HHMMSS`.
pub fn timestamp_folder_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d-%H%M%S").to_string()
}

/// Create the run's output directory under `base`.
///
/// With `timestamped`, a `YYYYMMDD-HHMMSS` sub-directory named after the
/// current local time is created; otherwise `base` itself is used.
pub fn create_output_directory(base: &Path, timestamped: bool) -> Result<PathBuf> {
    let path = if timestamped {
        base.join(timestamp_folder_name(&Local::now()))
    } else {
        base.to_path_buf()
    };
    std::fs::create_dir_all(&path)
        .with_context(|| format!("Creating output directory {}", path.display()))?;
    Ok(path)
}

/// Write a 2D grid as comma-delimited text, one line per row.
///
/// Values use Rust's shortest round-trip representation (`{:?}`), so very
/// small or large values are written in exponent form.
pub fn write_grid_csv(path: &Path, grid: ArrayView2<'_, f64>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file =
        File::create(path).with_context(|| format!("Creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    for row in grid.rows() {
        let line = row
            .iter()
            .map(|v| format!("{:?}", v))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{}", line)?;
    }
    out.flush()
        .with_context(|| format!("Writing {}", path.display()))?;

    log::info!("Grid written to: {}", path.display());
    Ok(())
}

/// Write any serialisable value as pretty-printed JSON.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json).with_context(|| format!("Writing {}", path.display()))?;

    log::info!("Summary (JSON) written to: {}", path.display());
    Ok(())
}
