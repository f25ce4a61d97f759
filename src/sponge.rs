use crate::grid::PaddedGrid;
use crate::wavelet::damping_profile;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

/// Exponential sponge applied over the `nb`-wide margins of a padded field.
#[derive(Clone, Debug)]
pub struct Sponge {
    profile: Array1<f64>,
    nxpad: usize,
    nzpad: usize,
}

impl Sponge {
    pub fn new(padded: &PaddedGrid) -> Self {
        Self {
            profile: damping_profile(padded.nb),
            nxpad: padded.nxpad,
            nzpad: padded.nzpad,
        }
    }

    pub fn profile(&self) -> &Array1<f64> {
        &self.profile
    }

    /// Damping factor of padded cell `(ix, iz)`; 1.0 in the physical interior.
    pub fn factor(&self, ix: usize, iz: usize) -> f64 {
        self.edge_factor(ix, self.nxpad) * self.edge_factor(iz, self.nzpad)
    }

    #[inline]
    fn edge_factor(&self, i: usize, n: usize) -> f64 {
        let nb = self.profile.len();
        if i < nb {
            self.profile[i]
        } else if i >= n - nb {
            self.profile[n - i - 1]
        } else {
            1.0
        }
    }

    /// Attenuate the margins of `field` in place.
    pub fn apply(&self, field: &mut Array2<f64>) {
        let nb = self.profile.len();
        if nb == 0 {
            return;
        }
        debug_assert_eq!(field.dim(), (self.nxpad, self.nzpad));

        let nzpad = self.nzpad;
        field
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(ix, mut column)| {
                for iz in 0..nb {
                    column[iz] *= self.profile[iz];
                    column[nzpad - iz - 1] *= self.profile[iz];
                }
                let x_factor = self.edge_factor(ix, self.nxpad);
                if x_factor != 1.0 {
                    column.mapv_inplace(|v| v * x_factor);
                }
            });
    }

    /// Attenuate both pressure buffers.
    pub fn apply_pair(&self, p0: &mut Array2<f64>, p1: &mut Array2<f64>) {
        self.apply(p0);
        self.apply(p1);
    }
}
