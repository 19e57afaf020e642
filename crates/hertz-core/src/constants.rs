//! Physical constants and frequency helpers.
//!
//! The permeability uses the classical definition $\mu_0 = 4\pi \times 10^{-7}$
//! H/m and the permittivity is derived from it, $\epsilon_0 = 1/(\mu_0 c^2)$,
//! so that $c = 1/\sqrt{\mu_0 \epsilon_0}$ holds to machine precision.

use std::f64::consts::PI;

/// Speed of light in vacuum (m/s), exact.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Vacuum permeability $\mu_0$ (H/m).
pub const VACUUM_PERMEABILITY: f64 = 4.0 * PI * 1e-7;

/// Vacuum permittivity $\epsilon_0 = 1/(\mu_0 c^2)$ (F/m).
pub const VACUUM_PERMITTIVITY: f64 =
    1.0 / (VACUUM_PERMEABILITY * SPEED_OF_LIGHT * SPEED_OF_LIGHT);

/// Angular frequency $\omega = 2\pi f$ (rad/s).
#[inline]
pub fn angular_frequency(frequency_hz: f64) -> f64 {
    2.0 * PI * frequency_hz
}

/// Vacuum wavenumber $k = \omega / c$ (rad/m).
#[inline]
pub fn wavenumber(frequency_hz: f64) -> f64 {
    angular_frequency(frequency_hz) / SPEED_OF_LIGHT
}

/// Dipole moment magnitude that radiates a time-averaged total power
/// `power_w` at `frequency_hz`.
///
/// Inverts the Larmor formula for a Hertzian dipole:
///
/// $$
/// |\mathbf{p}| = \sqrt{\frac{12 \pi c P}{\mu_0 \omega^4}}
/// $$
pub fn dipole_moment_for_power(power_w: f64, frequency_hz: f64) -> f64 {
    let w = angular_frequency(frequency_hz);
    (12.0 * PI * SPEED_OF_LIGHT * power_w / (VACUUM_PERMEABILITY * w.powi(4))).sqrt()
}

/// Time-averaged total power (W) radiated by a dipole of moment magnitude
/// `moment` (C·m) at `frequency_hz`.
///
/// $P = \mu_0 |\mathbf{p}|^2 \omega^4 / (12 \pi c)$
pub fn radiated_power(moment: f64, frequency_hz: f64) -> f64 {
    let w = angular_frequency(frequency_hz);
    VACUUM_PERMEABILITY * moment * moment * w.powi(4) / (12.0 * PI * SPEED_OF_LIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_permittivity_consistent_with_c() {
        let c = 1.0 / (VACUUM_PERMEABILITY * VACUUM_PERMITTIVITY).sqrt();
        assert_relative_eq!(c, SPEED_OF_LIGHT, max_relative = 1e-14);
        assert_relative_eq!(VACUUM_PERMITTIVITY, 8.854_187_817e-12, max_relative = 1e-9);
    }

    #[test]
    fn test_one_watt_at_one_gigahertz() {
        let p = dipole_moment_for_power(1.0, 1.0e9);
        assert_relative_eq!(p, 2.402_211_502_156_476e-12, max_relative = 1e-12);
        assert_relative_eq!(radiated_power(p, 1.0e9), 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_wavenumber() {
        // 1 GHz: λ ≈ 0.2998 m
        let k = wavenumber(1.0e9);
        assert_relative_eq!(2.0 * PI / k, 0.299_792_458, max_relative = 1e-12);
    }
}
