//! Compute backend trait and device abstraction.
//!
//! The [`ComputeBackend`] trait abstracts over execution strategies (Rayon
//! thread pool, plain serial loops) so that the sweep code in `hertz-core`
//! never has to know how grid cells are scheduled.

use ndarray::Array2;
use thiserror::Error;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("Device error: {0}")]
    DeviceError(String),

    /// A grid cell's kernel failed; the whole fill is abandoned.
    #[error("Cell ({row}, {col}) failed: {message}")]
    Kernel {
        row: usize,
        col: usize,
        message: String,
    },
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub compute_units: Option<usize>,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Cpu,
    Serial,
}

/// Two scalar samples produced by the kernel for a single grid cell.
pub type CellPair = (f64, f64);

/// Kernel evaluated once per `(row, col)` cell.
pub type CellKernel<'a> = dyn Fn(usize, usize) -> Result<CellPair, ComputeError> + Send + Sync + 'a;

/// Abstraction over compute backends.
///
/// The hot path of a radiation sweep is one independent field evaluation per
/// grid cell. Implementations decide how those cells are scheduled; the
/// result layout is always row-major `(rows, cols)`.
pub trait ComputeBackend: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// Evaluate `fill_fn` for every cell of a `rows × cols` grid.
    ///
    /// The first element of each returned pair lands in the first output
    /// array, the second in the second. Any kernel error aborts the fill and
    /// is returned unchanged.
    fn parallel_grid_fill(
        &self,
        rows: usize,
        cols: usize,
        fill_fn: &CellKernel<'_>,
    ) -> Result<(Array2<f64>, Array2<f64>), ComputeError>;
}

/// Split a row-major list of cell pairs into two `(rows, cols)` arrays.
pub(crate) fn unzip_cells(
    rows: usize,
    cols: usize,
    cells: Vec<CellPair>,
) -> Result<(Array2<f64>, Array2<f64>), ComputeError> {
    let (first, second): (Vec<f64>, Vec<f64>) = cells.into_iter().unzip();
    let first = Array2::from_shape_vec((rows, cols), first)
        .map_err(|e| ComputeError::DeviceError(e.to_string()))?;
    let second = Array2::from_shape_vec((rows, cols), second)
        .map_err(|e| ComputeError::DeviceError(e.to_string()))?;
    Ok((first, second))
}
