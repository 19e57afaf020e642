//! Core types shared across the Hertz workspace.
//!
//! Dipoles, dipole sets, and the result container returned by the field
//! evaluator.

use ndarray::{Array2, ArrayView1, ArrayView2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::fields::FieldError;

/// A single oscillating Hertzian dipole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dipole {
    /// Dipole moment vector (C·m).
    pub moment: [f64; 3],
    /// Position in 3D space (m).
    pub position: [f64; 3],
    /// Phase angle (rad), conventionally in [0, 2π).
    pub phase: f64,
}

impl Dipole {
    pub fn new(moment: [f64; 3], position: [f64; 3], phase: f64) -> Self {
        Self {
            moment,
            position,
            phase,
        }
    }

    /// A dipole whose moment has magnitude `magnitude` along `direction`.
    ///
    /// `direction` is normalised; a zero direction yields a zero moment.
    pub fn along(direction: [f64; 3], magnitude: f64, position: [f64; 3], phase: f64) -> Self {
        let len = (direction[0] * direction[0]
            + direction[1] * direction[1]
            + direction[2] * direction[2])
            .sqrt();
        let scale = if len > 0.0 { magnitude / len } else { 0.0 };
        Self::new(
            [
                direction[0] * scale,
                direction[1] * scale,
                direction[2] * scale,
            ],
            position,
            phase,
        )
    }
}

/// A non-empty, ordered set of dipoles radiating together.
///
/// A lone dipole is just a set of length one; there is no separate
/// single-dipole code path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Dipole>", into = "Vec<Dipole>")]
pub struct DipoleSet {
    dipoles: Vec<Dipole>,
}

impl DipoleSet {
    pub fn new(dipoles: Vec<Dipole>) -> Result<Self, FieldError> {
        if dipoles.is_empty() {
            return Err(FieldError::EmptyDipoleSet);
        }
        Ok(Self { dipoles })
    }

    pub fn single(moment: [f64; 3], position: [f64; 3], phase: f64) -> Self {
        Self {
            dipoles: vec![Dipole::new(moment, position, phase)],
        }
    }

    /// Build a set from `(N, 3)` moment and position arrays and `N` phases.
    pub fn from_arrays(
        moments: ArrayView2<'_, f64>,
        positions: ArrayView2<'_, f64>,
        phases: ArrayView1<'_, f64>,
    ) -> Result<Self, FieldError> {
        let mismatch = || FieldError::ShapeMismatch {
            moments: moments.dim(),
            positions: positions.dim(),
            phases: phases.len(),
        };

        let n = moments.nrows();
        if moments.ncols() != 3
            || positions.ncols() != 3
            || positions.nrows() != n
            || phases.len() != n
        {
            return Err(mismatch());
        }

        let dipoles = (0..n)
            .map(|i| {
                Dipole::new(
                    [moments[[i, 0]], moments[[i, 1]], moments[[i, 2]]],
                    [positions[[i, 0]], positions[[i, 1]], positions[[i, 2]]],
                    phases[i],
                )
            })
            .collect();
        Self::new(dipoles)
    }

    pub fn len(&self) -> usize {
        self.dipoles.len()
    }

    /// Whether the set holds no dipoles. Sets from `new`, `single`,
    /// `from_arrays` or deserialisation always hold at least one.
    pub fn is_empty(&self) -> bool {
        self.dipoles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dipole> {
        self.dipoles.iter()
    }

    /// The first dipole of the set.
    pub fn primary(&self) -> &Dipole {
        &self.dipoles[0]
    }

    pub fn as_slice(&self) -> &[Dipole] {
        &self.dipoles
    }
}

impl TryFrom<Vec<Dipole>> for DipoleSet {
    type Error = FieldError;

    fn try_from(dipoles: Vec<Dipole>) -> Result<Self, Self::Error> {
        Self::new(dipoles)
    }
}

impl From<DipoleSet> for Vec<Dipole> {
    fn from(set: DipoleSet) -> Self {
        set.dipoles
    }
}

impl<'a> IntoIterator for &'a DipoleSet {
    type Item = &'a Dipole;
    type IntoIter = std::slice::Iter<'a, Dipole>;

    fn into_iter(self) -> Self::IntoIter {
        self.dipoles.iter()
    }
}

/// Fields radiated by a dipole set at one observation point and one instant.
#[derive(Debug, Clone, Serialize)]
pub struct FieldResult {
    /// Electric field, shape (3, nf): Cartesian component × frequency (V/m).
    pub electric: Array2<Complex64>,
    /// Magnetic flux density, shape (3, nf) (T).
    pub magnetic: Array2<Complex64>,
    /// Raw propagation phasor $e^{i(\omega t - k|r'| + \phi)}$ per dipole,
    /// shape (N, nf). Diagnostic only: never summed across dipoles.
    pub phase_factor: Array2<Complex64>,
}

impl FieldResult {
    /// Number of frequencies on the second axis.
    pub fn num_frequencies(&self) -> usize {
        self.electric.ncols()
    }

    /// Scalar power-density proxy $\sum \operatorname{Re}(E)^2$ over all
    /// components and frequencies.
    ///
    /// This is not the Poynting vector magnitude, only a stand-in for it.
    pub fn power_proxy(&self) -> f64 {
        self.electric.iter().map(|e| e.re * e.re).sum()
    }

    /// Real part of the primary dipole's phase factor at the first frequency.
    pub fn primary_phase(&self) -> f64 {
        self.phase_factor[[0, 0]].re
    }
}
