use crate::error::{Result, RttyError};
use crate::{
    DEFAULT_BAUD_RATE, DEFAULT_LOWPASS_CUTOFF, DEFAULT_MARK_FREQ, DEFAULT_SHIFT,
    DEFAULT_SUBSAMPLE_FACTOR, DEFAULT_THRESHOLD,
};

/// Transmit-side parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ModulationConfig {
    /// Mark tone (binary 1) in Hz
    pub mark_frequency: f32,
    /// Distance between mark and space tones in Hz
    pub shift: f32,
    /// Symbols per second
    pub baud_rate: f64,
    /// Space tone above the mark tone instead of below it
    pub reverse: bool,
    /// Peak amplitude of the synthesized sine
    pub amplitude: f32,
}

impl Default for ModulationConfig {
    fn default() -> Self {
        Self {
            mark_frequency: DEFAULT_MARK_FREQ,
            shift: DEFAULT_SHIFT,
            baud_rate: DEFAULT_BAUD_RATE,
            reverse: false,
            amplitude: 1.0,
        }
    }
}

impl ModulationConfig {
    /// Space tone (binary 0) in Hz
    pub fn space_frequency(&self) -> f32 {
        if self.reverse {
            self.mark_frequency + self.shift
        } else {
            self.mark_frequency - self.shift
        }
    }

    pub fn validate(&self, sample_rate: f32) -> Result<()> {
        check_sample_rate(sample_rate)?;
        check_baud_rate(self.baud_rate, sample_rate as f64)?;
        check_tone("mark", self.mark_frequency, sample_rate)?;
        check_tone("space", self.space_frequency(), sample_rate)?;
        if !self.amplitude.is_finite() || self.amplitude < 0.0 {
            return Err(RttyError::InvalidConfig(format!(
                "amplitude must be a non-negative number, got {}",
                self.amplitude
            )));
        }
        Ok(())
    }
}

/// Receive-side parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub mark_frequency: f32,
    pub space_frequency: f32,
    pub baud_rate: f64,
    /// Minimum tone magnitude for a mark/space decision; tune to channel gain
    pub threshold: f32,
    /// Keep one magnitude pair out of this many raw samples
    pub subsample_factor: usize,
    /// Cutoff of the I/Q low-pass filters in Hz
    pub lowpass_cutoff: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            mark_frequency: DEFAULT_MARK_FREQ,
            space_frequency: DEFAULT_MARK_FREQ + DEFAULT_SHIFT,
            baud_rate: DEFAULT_BAUD_RATE,
            threshold: DEFAULT_THRESHOLD,
            subsample_factor: DEFAULT_SUBSAMPLE_FACTOR,
            lowpass_cutoff: DEFAULT_LOWPASS_CUTOFF,
        }
    }
}

impl From<&ModulationConfig> for DetectionConfig {
    /// Detection tuned to the tones a modulator with `config` produces
    fn from(config: &ModulationConfig) -> Self {
        Self {
            mark_frequency: config.mark_frequency,
            space_frequency: config.space_frequency(),
            baud_rate: config.baud_rate,
            ..Self::default()
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self, sample_rate: f32) -> Result<()> {
        check_sample_rate(sample_rate)?;
        if self.subsample_factor == 0 {
            return Err(RttyError::InvalidConfig(
                "subsample factor must be at least 1".to_string(),
            ));
        }
        check_baud_rate(self.baud_rate, sample_rate as f64 / self.subsample_factor as f64)?;
        check_tone("mark", self.mark_frequency, sample_rate)?;
        check_tone("space", self.space_frequency, sample_rate)?;
        check_tone("low-pass cutoff", self.lowpass_cutoff, sample_rate)?;
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(RttyError::InvalidConfig(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Decoder steps per symbol after subsampling, rounded, at least 1
    pub fn unit_steps(&self, sample_rate: f32) -> usize {
        let effective_rate = sample_rate as f64 / self.subsample_factor.max(1) as f64;
        let unit = (effective_rate / self.baud_rate).round();
        if unit.is_finite() && unit >= 1.0 {
            unit as usize
        } else {
            1
        }
    }
}

fn check_sample_rate(sample_rate: f32) -> Result<()> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(RttyError::InvalidConfig(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }
    Ok(())
}

/// Baud rate must be positive and leave at least one step per symbol
fn check_baud_rate(baud_rate: f64, step_rate: f64) -> Result<()> {
    if !baud_rate.is_finite() || baud_rate <= 0.0 {
        return Err(RttyError::InvalidConfig(format!(
            "baud rate must be positive, got {}",
            baud_rate
        )));
    }
    if baud_rate > step_rate {
        return Err(RttyError::InvalidConfig(format!(
            "baud rate {} exceeds step rate {}",
            baud_rate, step_rate
        )));
    }
    Ok(())
}

fn check_tone(name: &str, frequency: f32, sample_rate: f32) -> Result<()> {
    let nyquist = sample_rate / 2.0;
    if !frequency.is_finite() || frequency <= 0.0 || frequency >= nyquist {
        return Err(RttyError::InvalidConfig(format!(
            "{} frequency {} Hz outside (0, {}) Hz",
            name, frequency, nyquist
        )));
    }
    Ok(())
}
