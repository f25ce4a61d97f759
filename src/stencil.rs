//! 4th-order in space, 2nd-order in time finite-difference update of the
//! scalar wave equation.

use ndarray::{Array2, Axis};
use rayon::prelude::*;

/// Halo width required by the 5-point stencil on each axis.
pub const HALO: usize = 2;

/// Finite-difference weights of the 4th-order Laplacian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilCoefficients {
    pub c0: f64,
    pub c11: f64, // z, first neighbour
    pub c12: f64, // z, second neighbour
    pub c21: f64, // x, first neighbour
    pub c22: f64, // x, second neighbour
}

impl StencilCoefficients {
    pub fn new(dz: f64, dx: f64) -> Self {
        let inv_dz2 = 1.0 / (dz * dz);
        let c11 = 4.0 * inv_dz2 / 3.0;
        let c12 = -inv_dz2 / 12.0;

        let inv_dx2 = 1.0 / (dx * dx);
        let c21 = 4.0 * inv_dx2 / 3.0;
        let c22 = -inv_dx2 / 12.0;

        let c0 = -2.0 * (c11 + c12 + c21 + c22);
        Self {
            c0,
            c11,
            c12,
            c21,
            c22,
        }
    }

    /// Laplacian times grid spacing squared, evaluated at `(ix, iz)` of `p`.
    #[inline]
    fn apply(&self, p: &Array2<f64>, ix: usize, iz: usize) -> f64 {
        self.c0 * p[[ix, iz]]
            + self.c11 * (p[[ix, iz - 1]] + p[[ix, iz + 1]])
            + self.c12 * (p[[ix, iz - 2]] + p[[ix, iz + 2]])
            + self.c21 * (p[[ix - 1, iz]] + p[[ix + 1, iz]])
            + self.c22 * (p[[ix - 2, iz]] + p[[ix + 2, iz]])
    }
}

/// Leapfrog update: `next` holds the field two steps back on entry and
/// the advanced field on exit. `prev` is the current field.
///
/// Only cells at least [`HALO`] away from every edge are written.
/// Columns (fixed `ix`) are processed in parallel.
pub fn step_forward(
    coeffs: &StencilCoefficients,
    slowness: &Array2<f64>,
    next: &mut Array2<f64>,
    prev: &Array2<f64>,
) {
    let (nxpad, nzpad) = prev.dim();
    debug_assert_eq!(next.dim(), prev.dim());
    debug_assert_eq!(slowness.dim(), prev.dim());
    if nxpad <= 2 * HALO || nzpad <= 2 * HALO {
        return;
    }

    next.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .skip(HALO)
        .take(nxpad - 2 * HALO)
        .for_each(|(ix, mut column)| {
            for iz in HALO..nzpad - HALO {
                let lap = coeffs.apply(prev, ix, iz);
                column[iz] = 2.0 * prev[[ix, iz]] - column[iz] + slowness[[ix, iz]] * lap;
            }
        });
}

/// Single-threaded [`step_forward`].
pub fn step_forward_serial(
    coeffs: &StencilCoefficients,
    slowness: &Array2<f64>,
    next: &mut Array2<f64>,
    prev: &Array2<f64>,
) {
    let (nxpad, nzpad) = prev.dim();
    if nxpad <= 2 * HALO || nzpad <= 2 * HALO {
        return;
    }

    for ix in HALO..nxpad - HALO {
        for iz in HALO..nzpad - HALO {
            let lap = coeffs.apply(prev, ix, iz);
            next[[ix, iz]] = 2.0 * prev[[ix, iz]] - next[[ix, iz]] + slowness[[ix, iz]] * lap;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn central_weight_balances_neighbours() {
        for &(dz, dx) in &[(1.0, 1.0), (10.0, 12.5), (0.5, 3.0), (7.3, 0.01)] {
            let c = StencilCoefficients::new(dz, dx);
            assert_relative_eq!(
                c.c0,
                -2.0 * (c.c11 + c.c12 + c.c21 + c.c22),
                max_relative = 1e-14
            );
            // Weights sum to zero: a constant field has no Laplacian.
            let sum = c.c0 + 2.0 * (c.c11 + c.c12 + c.c21 + c.c22);
            assert!(sum.abs() <= 1e-12 * c.c0.abs());
        }
    }

    #[test]
    fn coefficient_values() {
        let c = StencilCoefficients::new(2.0, 4.0);
        assert_relative_eq!(c.c11, 1.0 / 3.0, epsilon = 1e-15);
        assert_relative_eq!(c.c12, -1.0 / 48.0, epsilon = 1e-15);
        assert_relative_eq!(c.c21, 1.0 / 12.0, epsilon = 1e-15);
        assert_relative_eq!(c.c22, -1.0 / 192.0, epsilon = 1e-15);
    }

    #[test]
    fn laplacian_of_quadratic_is_exact() {
        // d2/dz2 + d2/dx2 of (x^2 + z^2) is 4
        let (dx, dz) = (0.5, 0.25);
        let c = StencilCoefficients::new(dz, dx);
        let p = Array2::from_shape_fn((9, 9), |(ix, iz)| {
            let x = ix as f64 * dx;
            let z = iz as f64 * dz;
            x * x + z * z
        });
        assert_relative_eq!(c.apply(&p, 4, 4), 4.0, epsilon = 1e-10);
    }

    #[test]
    fn halo_is_never_written() {
        let c = StencilCoefficients::new(1.0, 1.0);
        let slowness = Array2::from_elem((10, 8), 0.1);
        let prev = Array2::from_shape_fn((10, 8), |(ix, iz)| ((ix + 3 * iz) % 5) as f64);
        let mut next = Array2::from_elem((10, 8), -7.0);
        step_forward(&c, &slowness, &mut next, &prev);

        for ix in 0..10 {
            for iz in 0..8 {
                let interior = (HALO..10 - HALO).contains(&ix) && (HALO..8 - HALO).contains(&iz);
                if !interior {
                    assert_eq!(next[[ix, iz]], -7.0, "halo cell ({ix}, {iz}) was written");
                }
            }
        }
    }

    #[test]
    fn parallel_matches_serial() {
        let c = StencilCoefficients::new(10.0, 8.0);
        let slowness = Array2::from_shape_fn((24, 17), |(ix, iz)| {
            let v = 1500.0 + 10.0 * (ix + iz) as f64;
            (v * 0.001).powi(2)
        });
        let prev = Array2::from_shape_fn((24, 17), |(ix, iz)| ((ix * 7 + iz * 3) as f64).sin());
        let old = Array2::from_shape_fn((24, 17), |(ix, iz)| ((ix + iz * 5) as f64).cos());

        let mut par = old.clone();
        let mut ser = old;
        step_forward(&c, &slowness, &mut par, &prev);
        step_forward_serial(&c, &slowness, &mut ser, &prev);
        assert_eq!(par, ser);
    }

    #[test]
    fn zero_field_stays_zero() {
        let c = StencilCoefficients::new(10.0, 10.0);
        let slowness = Array2::from_elem((12, 12), 0.0225);
        let prev = Array2::zeros((12, 12));
        let mut next = Array2::zeros((12, 12));
        step_forward(&c, &slowness, &mut next, &prev);
        assert!(next.iter().all(|&v| v == 0.0));
    }
}
