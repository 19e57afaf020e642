//! Far-field radiation of Hertzian dipoles.
//!
//! For a dipole of moment $\mathbf{p}$ at $\mathbf{R}$ observed at
//! $\mathbf{r}$, with $\mathbf{r}' = \mathbf{r} - \mathbf{R}$, the radiation
//! zone fields are
//!
//! $$
//! \mathbf{E} = \frac{\omega^2}{c^2 |\mathbf{r}'|^3}
//!   \frac{e^{i(\omega t - k|\mathbf{r}'| + \phi)}}{4\pi\epsilon_0\epsilon_r}
//!   (\mathbf{r}' \times \mathbf{p}) \times \mathbf{r}'
//! \qquad
//! \mathbf{B} = \frac{\omega^2}{c^3 |\mathbf{r}'|^2}
//!   \frac{e^{i(\omega t - k|\mathbf{r}'| + \phi)}}{4\pi\epsilon_0\epsilon_r}
//!   (\mathbf{r}' \times \mathbf{p})
//! $$
//!
//! with $k = \omega / c$. Contributions of several dipoles are summed
//! linearly. The near-field $1/r^2$ and $1/r^3$ terms are not included.

use std::f64::consts::PI;

use ndarray::Array2;
use num_complex::Complex64;
use thiserror::Error;

use crate::constants::{angular_frequency, wavenumber, SPEED_OF_LIGHT, VACUUM_PERMITTIVITY};
use crate::types::{DipoleSet, FieldResult};

/// Errors raised while evaluating radiated fields.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("Observation point coincides with dipole {dipole} at {position:?}; the field is singular there")]
    CoincidentPoint { dipole: usize, position: [f64; 3] },

    #[error("Inconsistent dipole arrays: moments {moments:?}, positions {positions:?}, {phases} phases (expected (N, 3), (N, 3), N)")]
    ShapeMismatch {
        moments: (usize, usize),
        positions: (usize, usize),
        phases: usize,
    },

    #[error("A dipole set needs at least one dipole")]
    EmptyDipoleSet,

    #[error("At least one frequency is required")]
    NoFrequencies,
}

/// Evaluate the far-field E and B radiated by `dipoles` at `observation`.
///
/// # Arguments
/// * `observation`: Observation point (m).
/// * `dipoles`: Radiating dipoles; their fields are superposed.
/// * `frequencies`: Frequencies (Hz). Their order defines the second axis
///   of the returned arrays.
/// * `time`: Observation instant (s), shared by all dipoles and frequencies.
/// * `relative_permittivity`: $\epsilon_r$ of the medium (1 for vacuum).
///
/// # Errors
/// [`FieldError::CoincidentPoint`] if the observation point sits on any
/// dipole, [`FieldError::NoFrequencies`] for an empty frequency list.
pub fn evaluate(
    observation: &[f64; 3],
    dipoles: &DipoleSet,
    frequencies: &[f64],
    time: f64,
    relative_permittivity: f64,
) -> Result<FieldResult, FieldError> {
    if frequencies.is_empty() {
        return Err(FieldError::NoFrequencies);
    }

    let nf = frequencies.len();
    let c = SPEED_OF_LIGHT;
    let medium = 4.0 * PI * VACUUM_PERMITTIVITY * relative_permittivity;

    let mut electric = Array2::<Complex64>::zeros((3, nf));
    let mut magnetic = Array2::<Complex64>::zeros((3, nf));
    let mut phase_factor = Array2::<Complex64>::zeros((dipoles.len(), nf));

    for (i, dipole) in dipoles.iter().enumerate() {
        let r = sub(observation, &dipole.position);
        let r_mag = norm(&r);
        if r_mag < f64::MIN_POSITIVE {
            return Err(FieldError::CoincidentPoint {
                dipole: i,
                position: dipole.position,
            });
        }

        // Unit-vector form: only the 1/|r'| factor carries the distance
        let r_hat = [r[0] / r_mag, r[1] / r_mag, r[2] / r_mag];
        let rhat_cross_p = cross(&r_hat, &dipole.moment);
        let triple = cross(&rhat_cross_p, &r_hat);

        for (fi, &f) in frequencies.iter().enumerate() {
            let w = angular_frequency(f);
            let k = wavenumber(f);
            let phasor = Complex64::new(0.0, w * time - k * r_mag + dipole.phase).exp();
            let expfac = phasor / medium;

            let e_scale = expfac * (k * k / r_mag);
            let b_scale = expfac * (k * k / (c * r_mag));

            for a in 0..3 {
                electric[[a, fi]] += e_scale * triple[a];
                magnetic[[a, fi]] += b_scale * rhat_cross_p[a];
            }
            phase_factor[[i, fi]] = phasor;
        }
    }

    Ok(FieldResult {
        electric,
        magnetic,
        phase_factor,
    })
}

fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Euclidean length, scaled by the largest component so the squares
/// neither overflow nor underflow.
fn norm(v: &[f64; 3]) -> f64 {
    let m = v[0].abs().max(v[1].abs()).max(v[2].abs());
    if m == 0.0 || !m.is_finite() {
        return m;
    }
    let (x, y, z) = (v[0] / m, v[1] / m, v[2] / m);
    m * (x * x + y * y + z * z).sqrt()
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
