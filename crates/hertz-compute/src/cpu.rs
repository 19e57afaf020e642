//! CPU compute backend using Rayon for shared-memory parallelism.

use rayon::prelude::*;

use ndarray::Array2;

use crate::backend::{
    unzip_cells, BackendType, CellKernel, CellPair, ComputeBackend, ComputeError, DeviceInfo,
};

/// CPU backend that parallelises grid cells across threads via Rayon.
pub struct CpuBackend {
    num_threads: usize,
    /// Dedicated pool; `None` means the global Rayon pool.
    pool: Option<rayon::ThreadPool>,
}

impl CpuBackend {
    /// Create a new CPU backend using the global Rayon pool.
    pub fn new() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
            pool: None,
        }
    }

    /// Create a CPU backend with its own pool of `num_threads` workers.
    pub fn with_threads(num_threads: usize) -> Result<Self, ComputeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| ComputeError::Unavailable(e.to_string()))?;
        log::debug!("Rayon pool with {} threads", pool.current_num_threads());
        Ok(Self {
            num_threads: pool.current_num_threads(),
            pool: Some(pool),
        })
    }

    fn fill(
        rows: usize,
        cols: usize,
        fill_fn: &CellKernel<'_>,
    ) -> Result<Vec<CellPair>, ComputeError> {
        (0..rows * cols)
            .into_par_iter()
            .map(|idx| fill_fn(idx / cols, idx % cols))
            .collect()
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.num_threads),
            backend_type: BackendType::Cpu,
            compute_units: Some(self.num_threads),
        }
    }

    fn parallel_grid_fill(
        &self,
        rows: usize,
        cols: usize,
        fill_fn: &CellKernel<'_>,
    ) -> Result<(Array2<f64>, Array2<f64>), ComputeError> {
        let cells = match &self.pool {
            Some(pool) => pool.install(|| Self::fill(rows, cols, fill_fn))?,
            None => Self::fill(rows, cols, fill_fn)?,
        };
        unzip_cells(rows, cols, cells)
    }
}
