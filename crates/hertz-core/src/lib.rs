//! # Hertz Core
//!
//! The numerical backbone of the Hertz workspace. This crate evaluates the
//! far-field electric and magnetic fields radiated by one or more Hertzian
//! (point) dipoles, and sweeps that evaluation over planar grids of
//! observation points.
//!
//! ## Architecture
//!
//! [`fields::evaluate`] is a pure function of the observation point, the
//! dipole set, the frequency list, the time and the medium. It allocates
//! its outputs per call and shares no state, so it can be called from any
//! number of threads. [`sweep::Sweep`] maps it over a grid through a
//! [`hertz_compute::ComputeBackend`].
//!
//! ## Modules
//!
//! - [`constants`] : Physical constants and frequency helpers.
//! - [`types`] : Dipoles, dipole sets, field results.
//! - [`fields`] : The far-field evaluator.
//! - [`sweep`] : Grids, run modes, and frame computation.

pub mod constants;
pub mod fields;
pub mod sweep;
pub mod types;
