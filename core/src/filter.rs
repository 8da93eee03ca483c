use std::f64::consts::PI;

/// Second-order IIR section, coefficients normalized by a0
///
/// Runs sample by sample in Direct Form II Transposed so the state carries
/// over between audio blocks.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    /// Low-pass with quality factor `q` (RBJ cookbook)
    pub fn lowpass_with_q(cutoff_hz: f64, sample_rate: f64, q: f64) -> Self {
        let omega = 2.0 * PI * cutoff_hz / sample_rate;
        let cos_w = omega.cos();
        let alpha = omega.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 - cos_w) / 2.0) / a0,
            b1: (1.0 - cos_w) / a0,
            b2: ((1.0 - cos_w) / 2.0) / a0,
            a1: (-2.0 * cos_w) / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Butterworth low-pass (Q = 1/sqrt(2))
    pub fn lowpass(cutoff_hz: f64, sample_rate: f64) -> Self {
        Self::lowpass_with_q(cutoff_hz, sample_rate, std::f64::consts::FRAC_1_SQRT_2)
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f64 = 44100.0;

    /// Gain of `filter` at `frequency_hz`
    fn magnitude_at(filter: &Biquad, frequency_hz: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * frequency_hz / sample_rate;
        // H(e^jw) = (b0 + b1 e^-jw + b2 e^-2jw) / (1 + a1 e^-jw + a2 e^-2jw)
        let (c1, s1) = (w.cos(), -w.sin());
        let (c2, s2) = ((2.0 * w).cos(), -(2.0 * w).sin());
        let num_re = filter.b0 + filter.b1 * c1 + filter.b2 * c2;
        let num_im = filter.b1 * s1 + filter.b2 * s2;
        let den_re = 1.0 + filter.a1 * c1 + filter.a2 * c2;
        let den_im = filter.a1 * s1 + filter.a2 * s2;
        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }

    #[test]
    fn test_lowpass_dc_gain_is_unity() {
        let mut lp = Biquad::lowpass(100.0, RATE);
        let mut y = 0.0;
        for _ in 0..20000 {
            y = lp.process(1.0);
        }
        assert!((y - 1.0).abs() < 1e-6, "settled at {}", y);
        assert!((magnitude_at(&lp, 0.0, RATE) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_lowpass_cutoff_is_minus_3db() {
        let lp = Biquad::lowpass(100.0, RATE);
        let gain = magnitude_at(&lp, 100.0, RATE);
        assert!((gain - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.01, "gain {}", gain);
    }

    #[test]
    fn test_lowpass_attenuates_tone() {
        let mut lp = Biquad::lowpass(100.0, RATE);
        let omega = 2.0 * PI * 2000.0 / RATE;
        let mut peak: f64 = 0.0;
        for n in 0..20000 {
            let y = lp.process((omega * n as f64).sin());
            if n > 5000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.01, "peak {}", peak);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut lp = Biquad::lowpass(100.0, RATE);
        for _ in 0..100 {
            lp.process(1.0);
        }
        lp.reset();
        let mut fresh = Biquad::lowpass(100.0, RATE);
        assert_eq!(lp.process(0.5), fresh.process(0.5));
    }
}
