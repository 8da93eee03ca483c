use crate::baudot;
use crate::config::ModulationConfig;
use crate::error::Result;
use log::debug;
use std::f64::consts::PI;

// Start-stop AFSK framing for 5-bit Baudot
//
// Per character (LSB first):
//   start bit  space  1.0 unit
//   data bits  5 x    1.0 unit  (mark = 1, space = 0)
//   stop bit   mark   1.5 units
//
// A transmission is framed by an all-mark idle period on both sides so the
// receiver can settle before the first start bit.

/// Units of idle mark tone before and after the characters
pub const IDLE_UNITS: f64 = 30.0;

/// Units taken by one character (start + 5 data + 1.5 stop)
pub const UNITS_PER_CHAR: f64 = 7.5;

const DATA_BITS: usize = 5;

/// AFSK modulator - synthesizes mark/space tone sequences
///
/// The sine phase is driven by the sample index within the output buffer,
/// so it runs on across bit boundaries instead of restarting per bit.
pub struct AfskModulator {
    sample_rate: f32,
    config: ModulationConfig,
}

impl AfskModulator {
    pub fn new(config: ModulationConfig) -> Result<Self> {
        Self::with_sample_rate(config, crate::SAMPLE_RATE as f32)
    }

    pub fn with_sample_rate(config: ModulationConfig, sample_rate: f32) -> Result<Self> {
        config.validate(sample_rate)?;
        debug!(
            "AFSK modulator: mark {} Hz, space {} Hz, {} baud, {} Hz sample rate",
            config.mark_frequency,
            config.space_frequency(),
            config.baud_rate,
            sample_rate
        );
        Ok(Self { sample_rate, config })
    }

    pub fn config(&self) -> &ModulationConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples per symbol (fractional)
    pub fn unit(&self) -> f64 {
        self.sample_rate as f64 / self.config.baud_rate
    }

    /// Exact output length for `num_codes` Baudot symbols
    pub fn output_len(&self, num_codes: usize) -> usize {
        (total_units(num_codes) * self.unit()).ceil() as usize
    }

    /// Encode text and synthesize it
    pub fn modulate(&self, text: &str) -> Result<Vec<f32>> {
        let codes = baudot::encode_text(text)?;
        debug!("Encoded {} characters to {} Baudot codes", text.chars().count(), codes.len());
        Ok(self.modulate_codes(&codes))
    }

    /// Synthesize an already encoded code sequence
    ///
    /// Codes are masked to 5 bits.
    pub fn modulate_codes(&self, codes: &[u8]) -> Vec<f32> {
        let mut synth = ToneWriter::new(self);
        synth.send_bit(true, IDLE_UNITS);
        for &code in codes {
            synth.send_code(code);
        }
        synth.send_bit(true, IDLE_UNITS);
        let samples = synth.finish();
        debug_assert_eq!(samples.len(), self.output_len(codes.len()));
        samples
    }
}

fn total_units(num_codes: usize) -> f64 {
    UNITS_PER_CHAR * num_codes as f64 + 2.0 * IDLE_UNITS
}

/// Output buffer plus the running position in symbol units
struct ToneWriter {
    samples: Vec<f32>,
    unit: f64,
    units_sent: f64,
    mark_omega: f64,
    space_omega: f64,
    amplitude: f64,
}

impl ToneWriter {
    fn new(modulator: &AfskModulator) -> Self {
        let sample_rate = modulator.sample_rate as f64;
        let config = &modulator.config;
        Self {
            samples: Vec::new(),
            unit: modulator.unit(),
            units_sent: 0.0,
            mark_omega: 2.0 * PI * config.mark_frequency as f64 / sample_rate,
            space_omega: 2.0 * PI * config.space_frequency() as f64 / sample_rate,
            amplitude: config.amplitude as f64,
        }
    }

    /// Append `units` symbol periods of the mark (true) or space (false) tone
    ///
    /// Bit edges land on `ceil(units_sent * unit)`, so rounding never
    /// accumulates over a long message.
    fn send_bit(&mut self, mark: bool, units: f64) {
        let omega = if mark { self.mark_omega } else { self.space_omega };
        self.units_sent += units;
        let end = (self.units_sent * self.unit).ceil() as usize;
        let mut n = self.samples.len();
        while n < end {
            self.samples.push((self.amplitude * (omega * n as f64).sin()) as f32);
            n += 1;
        }
    }

    fn send_code(&mut self, code: u8) {
        self.send_bit(false, 1.0);
        for bit in 0..DATA_BITS {
            self.send_bit(code & (1 << bit) != 0, 1.0);
        }
        self.send_bit(true, 1.5);
    }

    fn finish(self) -> Vec<f32> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baudot::{FIGURES_SHIFT_CODE, LETTERS_SHIFT_CODE};

    fn goertzel_power(samples: &[f32], freq: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq / sample_rate;
        let coeff = 2.0 * omega.cos();
        let (mut q1, mut q2) = (0.0f64, 0.0f64);
        for &s in samples {
            let q0 = coeff * q1 - q2 + s as f64;
            q2 = q1;
            q1 = q0;
        }
        q1 * q1 + q2 * q2 - coeff * q1 * q2
    }

    #[test]
    fn test_output_length_formula() {
        let modulator = AfskModulator::new(ModulationConfig::default()).unwrap();
        let unit = 44100.0 / 45.45;
        for text in ["", "E", "RYRY", "A1B", "CQ CQ DE JH1UMV"] {
            let codes = baudot::encode_text(text).unwrap();
            let samples = modulator.modulate(text).unwrap();
            let expected = ((7.5 * codes.len() as f64 + 2.0 * 30.0) * unit).ceil() as usize;
            assert_eq!(samples.len(), expected, "length mismatch for {:?}", text);
        }
    }

    #[test]
    fn test_shift_codes_counted_in_length() {
        let modulator = AfskModulator::new(ModulationConfig::default()).unwrap();
        let plain = modulator.modulate("AB").unwrap();
        let figures = modulator.modulate("A1").unwrap();
        // "A1" is A, FIGS, 1, LTRS: two more symbols than "AB"
        assert_eq!(figures.len(), modulator.output_len(4));
        assert!(figures.len() > plain.len());
    }

    #[test]
    fn test_idle_is_mark_tone() {
        let config = ModulationConfig::default();
        let modulator = AfskModulator::new(config.clone()).unwrap();
        let samples = modulator.modulate_codes(&[]);
        let rate = modulator.sample_rate() as f64;
        let window = &samples[1000..5000];
        let mark = goertzel_power(window, config.mark_frequency as f64, rate);
        let space = goertzel_power(window, config.space_frequency() as f64, rate);
        assert!(mark > space * 100.0, "mark {} space {}", mark, space);
    }

    #[test]
    fn test_start_bit_is_space_tone() {
        let config = ModulationConfig::default();
        let modulator = AfskModulator::new(config.clone()).unwrap();
        // LTRS is all ones: only the start bit carries space tone
        let samples = modulator.modulate_codes(&[LETTERS_SHIFT_CODE]);
        let unit = modulator.unit();
        let rate = modulator.sample_rate() as f64;
        let start = (30.0 * unit).ceil() as usize;
        let window = &samples[start + 50..start + unit as usize - 50];
        let mark = goertzel_power(window, config.mark_frequency as f64, rate);
        let space = goertzel_power(window, config.space_frequency() as f64, rate);
        assert!(space > mark * 10.0, "mark {} space {}", mark, space);
    }

    #[test]
    fn test_data_bits_lsb_first() {
        let config = ModulationConfig {
            reverse: true,
            ..ModulationConfig::default()
        };
        let modulator = AfskModulator::new(config.clone()).unwrap();
        // FIGS = 0b11011: bit 2 is the only zero data bit
        let samples = modulator.modulate_codes(&[FIGURES_SHIFT_CODE]);
        let unit = modulator.unit();
        let rate = modulator.sample_rate() as f64;
        let expected = [true, true, false, true, true];
        for (bit, &is_mark) in expected.iter().enumerate() {
            let begin = ((30.0 + 1.0 + bit as f64) * unit).ceil() as usize + 50;
            let end = ((30.0 + 2.0 + bit as f64) * unit) as usize - 50;
            let window = &samples[begin..end];
            let mark = goertzel_power(window, config.mark_frequency as f64, rate);
            let space = goertzel_power(window, config.space_frequency() as f64, rate);
            assert_eq!(mark > space, is_mark, "bit {}", bit);
        }
    }

    #[test]
    fn test_phase_runs_on_sample_index() {
        let config = ModulationConfig::default();
        let modulator = AfskModulator::new(config.clone()).unwrap();
        let samples = modulator.modulate_codes(&[0]);
        let omega_mark = 2.0 * PI * config.mark_frequency as f64 / 44100.0;
        let omega_space = 2.0 * PI * config.space_frequency() as f64 / 44100.0;
        let unit = modulator.unit();

        let n = 10;
        assert!((samples[n] as f64 - (omega_mark * n as f64).sin()).abs() < 1e-6);

        // first sample of the start bit keeps the global index
        let n = (30.0 * unit).ceil() as usize;
        assert!((samples[n] as f64 - (omega_space * n as f64).sin()).abs() < 1e-6);
    }

    #[test]
    fn test_amplitude_scales_output() {
        let config = ModulationConfig {
            amplitude: 0.25,
            ..ModulationConfig::default()
        };
        let modulator = AfskModulator::new(config).unwrap();
        let samples = modulator.modulate("RY").unwrap();
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= 0.25 + 1e-6);
        assert!(peak > 0.24);
    }

    #[test]
    fn test_unsupported_character_is_error() {
        let modulator = AfskModulator::new(ModulationConfig::default()).unwrap();
        assert!(modulator.modulate("HI @").is_err());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let config = ModulationConfig {
            baud_rate: -1.0,
            ..ModulationConfig::default()
        };
        assert!(AfskModulator::new(config).is_err());
    }
}
