use ndarray::Array1;
use std::f64::consts::PI;

/// Ricker (second derivative of Gaussian) source pulse.
#[derive(Clone, Copy, Debug)]
pub struct Ricker {
    pub fm: f64, // Peak frequency (Hz)
}

impl Ricker {
    pub fn new(fm: f64) -> Self {
        Self { fm }
    }

    /// Time of the pulse maximum; the wavelet is delayed by one period.
    pub fn delay(&self) -> f64 {
        1.0 / self.fm
    }

    pub fn amplitude(&self, t: f64) -> f64 {
        let tau = PI * self.fm * (t - self.delay());
        let arg = tau * tau;
        (1.0 - 2.0 * arg) * (-arg).exp()
    }

    /// Sample the pulse at `it * dt` for `it` in `0..nt`.
    pub fn sample(&self, nt: usize, dt: f64) -> Array1<f64> {
        Array1::from_shape_fn(nt, |it| self.amplitude(it as f64 * dt))
    }
}

/// Damping factors for an `nb`-cell sponge.
///
/// Index 0 is the outermost cell (strongest attenuation), index `nb - 1`
/// touches the physical domain (factor close to one).
pub fn damping_profile(nb: usize) -> Array1<f64> {
    Array1::from_shape_fn(nb, |ib| {
        let tau = 0.015 * (nb - ib) as f64;
        (-tau * tau).exp()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn peak_is_exactly_one() {
        // it * dt == 1 / fm exactly in binary floating point
        let wavelet = Ricker::new(4.0).sample(5, 0.125);
        assert_eq!(wavelet[2], 1.0);
    }

    #[test]
    fn wavelet_is_symmetric_about_delay() {
        let ricker = Ricker::new(20.0);
        for k in 1..20 {
            let dt = k as f64 * 0.001;
            assert_relative_eq!(
                ricker.amplitude(ricker.delay() - dt),
                ricker.amplitude(ricker.delay() + dt),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn wavelet_sample_length_and_start() {
        let wavelet = Ricker::new(20.0).sample(300, 0.001);
        assert_eq!(wavelet.len(), 300);
        // tau = -pi at t = 0: small negative side lobe
        let expected = (1.0 - 2.0 * PI * PI) * (-PI * PI).exp();
        assert_relative_eq!(wavelet[0], expected, epsilon = 1e-15);
        assert!(wavelet[0].abs() < 1e-3);
    }

    #[test]
    fn damping_profile_edges() {
        let nb = 30;
        let profile = damping_profile(nb);
        assert_eq!(profile.len(), nb);
        assert_relative_eq!(profile[0], (-(0.015 * nb as f64).powi(2)).exp(), epsilon = 1e-15);
        assert_relative_eq!(profile[nb - 1], (-(0.015f64).powi(2)).exp(), epsilon = 1e-15);
        assert!(profile[nb - 1] > 0.9997);
    }

    #[test]
    fn damping_profile_increases_toward_interior() {
        let profile = damping_profile(40);
        for w in profile.as_slice().unwrap().windows(2) {
            assert!(w[0] < w[1]);
        }
        assert!(profile.iter().all(|&d| d > 0.0 && d < 1.0));
    }

    #[test]
    fn empty_margin_has_no_profile() {
        assert!(damping_profile(0).is_empty());
    }
}
