use crate::config::DetectionConfig;
use crate::error::Result;
use crate::filter::Biquad;
use log::debug;
use std::f64::consts::PI;

/// Mark and space magnitudes for one decoder step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToneMagnitudes {
    pub mark: f32,
    pub space: f32,
}

/// Quadrature mixer and I/Q low-pass filters for one tone
#[derive(Debug, Clone)]
struct ToneChannel {
    omega: f64,
    i_filter: Biquad,
    q_filter: Biquad,
    i: f64,
    q: f64,
}

impl ToneChannel {
    fn new(frequency: f32, cutoff: f32, sample_rate: f32) -> Self {
        let lowpass = Biquad::lowpass(cutoff as f64, sample_rate as f64);
        Self {
            omega: 2.0 * PI * frequency as f64 / sample_rate as f64,
            i_filter: lowpass.clone(),
            q_filter: lowpass,
            i: 0.0,
            q: 0.0,
        }
    }

    /// Mix one sample against sin/cos at sample index `n` and filter
    ///
    /// The mixer output is doubled so a unit-amplitude tone settles at
    /// magnitude 1.
    #[inline]
    fn mix(&mut self, x: f64, n: u64) {
        let phase = self.omega * n as f64;
        let (sin, cos) = phase.sin_cos();
        self.i = self.i_filter.process(2.0 * x * sin);
        self.q = self.q_filter.process(2.0 * x * cos);
    }

    #[inline]
    fn magnitude(&self) -> f32 {
        (self.i * self.i + self.q * self.q).sqrt() as f32
    }

    fn reset(&mut self) {
        self.i_filter.reset();
        self.q_filter.reset();
        self.i = 0.0;
        self.q = 0.0;
    }
}

/// Coherent (I/Q) detector for the mark and space tones
///
/// Every raw sample goes through both mixers and filters; one magnitude
/// pair is emitted per `subsample_factor` samples. Both oscillators are
/// driven by one free-running sample counter, so phase and subsampling stay
/// continuous however the input is split into blocks.
pub struct CoherentDetector {
    sample_rate: f32,
    subsample_factor: u64,
    mark: ToneChannel,
    space: ToneChannel,
    sample_index: u64,
}

impl CoherentDetector {
    pub fn new(config: &DetectionConfig, sample_rate: f32) -> Result<Self> {
        config.validate(sample_rate)?;
        debug!(
            "Coherent detector: mark {} Hz, space {} Hz, low-pass {} Hz, subsample 1/{}",
            config.mark_frequency,
            config.space_frequency,
            config.lowpass_cutoff,
            config.subsample_factor
        );
        Ok(Self {
            sample_rate,
            subsample_factor: config.subsample_factor as u64,
            mark: ToneChannel::new(config.mark_frequency, config.lowpass_cutoff, sample_rate),
            space: ToneChannel::new(config.space_frequency, config.lowpass_cutoff, sample_rate),
            sample_index: 0,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Raw samples consumed since construction or the last reset
    pub fn sample_index(&self) -> u64 {
        self.sample_index
    }

    /// Feed one raw sample; returns magnitudes on subsampling steps
    #[inline]
    pub fn push_sample(&mut self, sample: f32) -> Option<ToneMagnitudes> {
        let n = self.sample_index;
        let x = sample as f64;
        self.mark.mix(x, n);
        self.space.mix(x, n);
        self.sample_index += 1;

        if n % self.subsample_factor == 0 {
            Some(ToneMagnitudes {
                mark: self.mark.magnitude(),
                space: self.space.magnitude(),
            })
        } else {
            None
        }
    }

    /// Feed a block, appending every emitted magnitude pair to `out`
    pub fn process(&mut self, samples: &[f32], out: &mut Vec<ToneMagnitudes>) {
        out.reserve(samples.len() / self.subsample_factor as usize + 1);
        for &sample in samples {
            if let Some(magnitudes) = self.push_sample(sample) {
                out.push(magnitudes);
            }
        }
    }

    pub fn reset(&mut self) {
        self.mark.reset();
        self.space.reset();
        self.sample_index = 0;
    }
}
