//! Single-threaded backend.
//!
//! Visits cells in row-major order and stops at the first failing cell.
//! Useful for debugging and as a reference for the parallel backend.

use ndarray::Array2;

use crate::backend::{
    unzip_cells, BackendType, CellKernel, ComputeBackend, ComputeError, DeviceInfo,
};

/// Backend that evaluates every cell on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialBackend;

impl SerialBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for SerialBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Serial (1 thread)".into(),
            backend_type: BackendType::Serial,
            compute_units: Some(1),
        }
    }

    fn parallel_grid_fill(
        &self,
        rows: usize,
        cols: usize,
        fill_fn: &CellKernel<'_>,
    ) -> Result<(Array2<f64>, Array2<f64>), ComputeError> {
        let mut cells = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                cells.push(fill_fn(i, j)?);
            }
        }
        unzip_cells(rows, cols, cells)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_serial_stops_at_first_error() {
        let visited = AtomicUsize::new(0);
        let result = SerialBackend::new().parallel_grid_fill(4, 4, &|i, j| {
            visited.fetch_add(1, Ordering::SeqCst);
            if i == 1 && j == 1 {
                Err(ComputeError::Kernel {
                    row: i,
                    col: j,
                    message: "stop".into(),
                })
            } else {
                Ok((1.0, 2.0))
            }
        });
        assert!(result.is_err());
        // (0,0)..(0,3), (1,0), (1,1)
        assert_eq!(visited.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_empty_grid() {
        let (a, b) = SerialBackend::new()
            .parallel_grid_fill(0, 7, &|_, _| Ok((1.0, 1.0)))
            .unwrap();
        assert_eq!(a.dim(), (0, 7));
        assert_eq!(b.len(), 0);
    }
}
