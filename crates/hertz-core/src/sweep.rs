//! Radiation maps on a planar grid of observation points.
//!
//! The observation plane is $y = h$, spanned by $x \in [-x_{max}, x_{max}]$
//! and $z \in [-z_{max}, z_{max}]$. Every grid cell is an independent call
//! to [`evaluate`](crate::fields::evaluate), so cells are handed to a
//! [`ComputeBackend`] and may be computed in any order.

use std::sync::Arc;

use hertz_compute::{ComputeBackend, ComputeError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fields::{evaluate, FieldError};
use crate::types::DipoleSet;

/// Errors that abort a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("Sweep aborted: {0}")]
    Compute(#[from] ComputeError),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid run mode: {0}")]
    InvalidMode(String),
}

/// Generate `n` evenly spaced samples over `[start, stop]`, endpoints included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Observation grid on the plane `y = height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepGrid {
    /// Half-extent along x (m).
    pub x_max: f64,
    /// Number of points along x.
    pub nx: usize,
    /// Half-extent along z (m).
    pub z_max: f64,
    /// Number of points along z.
    pub nz: usize,
    /// Fixed y coordinate of the plane (m).
    pub height: f64,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            x_max: 2.0,
            nx: 401,
            z_max: 1.0,
            nz: 201,
            height: 2.0,
        }
    }
}

impl SweepGrid {
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.nx == 0 || self.nz == 0 {
            return Err(SweepError::InvalidGrid(format!(
                "point counts must be positive (nx={}, nz={})",
                self.nx, self.nz
            )));
        }
        if !(self.x_max.is_finite() && self.x_max > 0.0)
            || !(self.z_max.is_finite() && self.z_max > 0.0)
        {
            return Err(SweepError::InvalidGrid(format!(
                "extents must be positive and finite (x_max={}, z_max={})",
                self.x_max, self.z_max
            )));
        }
        if !self.height.is_finite() {
            return Err(SweepError::InvalidGrid(format!(
                "plane height must be finite (height={})",
                self.height
            )));
        }
        Ok(())
    }

    pub fn x_axis(&self) -> Vec<f64> {
        linspace(-self.x_max, self.x_max, self.nx)
    }

    pub fn z_axis(&self) -> Vec<f64> {
        linspace(-self.z_max, self.z_max, self.nz)
    }
}

/// How many instants a run renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunMode {
    /// A single frame at `time` (s).
    Single { time: f64 },
    /// `samples` frames evenly spaced over `[start, end]` (s).
    TimeSeries { start: f64, end: f64, samples: usize },
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::Single { time: 1e-9 }
    }
}

impl RunMode {
    /// Time axis covering five periods of `frequency_hz`, starting a tenth
    /// of a period in, sampled every tenth of a period.
    pub fn time_series_for(frequency_hz: f64) -> Self {
        let start = 1.0 / frequency_hz / 10.0;
        let end = 5.0 / frequency_hz;
        let samples = (end / start) as usize;
        RunMode::TimeSeries {
            start,
            end,
            samples,
        }
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        match *self {
            RunMode::Single { time } if !time.is_finite() => Err(SweepError::InvalidMode(
                format!("observation time must be finite (time={})", time),
            )),
            RunMode::TimeSeries { samples: 0, .. } => Err(SweepError::InvalidMode(
                "time series needs at least one sample".into(),
            )),
            RunMode::TimeSeries { start, end, .. }
                if !(start.is_finite() && end.is_finite()) || end < start =>
            {
                Err(SweepError::InvalidMode(format!(
                    "time range must be finite and ordered (start={}, end={})",
                    start, end
                )))
            }
            _ => Ok(()),
        }
    }

    /// The instants to render, in order.
    pub fn sample_times(&self) -> Vec<f64> {
        match *self {
            RunMode::Single { time } => vec![time],
            RunMode::TimeSeries {
                start,
                end,
                samples,
            } => linspace(start, end, samples),
        }
    }

    pub fn is_time_series(&self) -> bool {
        matches!(self, RunMode::TimeSeries { .. })
    }
}

/// One rendered instant of a sweep.
#[derive(Debug, Clone)]
pub struct SweepFrame {
    /// Position of this frame in the run (0 for single-frame runs).
    pub index: usize,
    /// Observation time (s).
    pub time: f64,
    /// x coordinates along the first axis of `power` (m).
    pub x: Vec<f64>,
    /// z coordinates (m).
    pub z: Vec<f64>,
    /// Power proxy $\sum \operatorname{Re}(E)^2$, shape (nx, nz).
    pub power: Array2<f64>,
    /// Real part of the primary dipole's phase factor, shape (nx, nz).
    pub phase: Array2<f64>,
}

impl SweepFrame {
    /// Smallest and largest finite power values, or `None` if there are none.
    pub fn power_range(&self) -> Option<(f64, f64)> {
        self.power
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Everything needed to compute radiation maps for one configuration.
pub struct Sweep {
    pub grid: SweepGrid,
    pub dipoles: DipoleSet,
    pub frequencies: Vec<f64>,
    pub relative_permittivity: f64,
    pub backend: Arc<dyn ComputeBackend>,
}

impl Sweep {
    /// Compute the power and phase maps at `time`.
    ///
    /// A failing cell (e.g. a grid point sitting exactly on a dipole) aborts
    /// the whole frame: a coincident point means the setup is invalid, so
    /// nothing is skipped or retried.
    pub fn compute_frame(&self, index: usize, time: f64) -> Result<SweepFrame, SweepError> {
        self.grid.validate()?;
        if self.frequencies.is_empty() {
            return Err(FieldError::NoFrequencies.into());
        }

        let x = self.grid.x_axis();
        let z = self.grid.z_axis();
        let y = self.grid.height;

        log::debug!(
            "Frame {} at t={:.3e} s: {}x{} cells on {}",
            index,
            time,
            x.len(),
            z.len(),
            self.backend.device_info().name
        );

        let kernel = |i: usize, j: usize| {
            let obs = [x[i], y, z[j]];
            evaluate(
                &obs,
                &self.dipoles,
                &self.frequencies,
                time,
                self.relative_permittivity,
            )
            .map(|res| (res.power_proxy(), res.primary_phase()))
            .map_err(|e| ComputeError::Kernel {
                row: i,
                col: j,
                message: e.to_string(),
            })
        };

        let (power, phase) = self
            .backend
            .parallel_grid_fill(x.len(), z.len(), &kernel)?;

        Ok(SweepFrame {
            index,
            time,
            x,
            z,
            power,
            phase,
        })
    }
}
