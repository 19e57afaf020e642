//! # Hertz Compute
//!
//! Compute backend abstraction for the Hertz workspace. This crate provides
//! a [`ComputeBackend`](backend::ComputeBackend) trait that isolates the
//! physics code from how grid cells are scheduled.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Status |
//! |---------|-------------|--------|
//! | CPU (Rayon) | `cpu` (default) | Implemented |
//! | Serial | always | Implemented |

pub mod backend;
pub mod serial;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use backend::{BackendType, CellKernel, CellPair, ComputeBackend, ComputeError, DeviceInfo};
pub use serial::SerialBackend;

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;
