use crate::config::DetectionConfig;
use crate::decoder::{BitSyncDecoder, DecoderState, Symbol, TextSink};
use crate::detector::{CoherentDetector, ToneMagnitudes};
use crate::error::Result;
use crate::ring_buffer::RingBuffer;
use log::debug;

/// Steps of history kept in the signal trace
pub const TRACE_LEN: usize = 2048;

/// Recent decoder input for an oscilloscope-style display
///
/// One entry per decoder step: the symbol decision (+1/-1/0) and both tone
/// magnitudes. Only the newest `TRACE_LEN` steps are kept.
pub struct SignalTrace {
    symbols: RingBuffer<i8>,
    mark: RingBuffer<f32>,
    space: RingBuffer<f32>,
}

impl SignalTrace {
    fn new() -> Result<Self> {
        Ok(Self {
            symbols: RingBuffer::new_masked(TRACE_LEN)?,
            mark: RingBuffer::new_masked(TRACE_LEN)?,
            space: RingBuffer::new_masked(TRACE_LEN)?,
        })
    }

    fn record(&mut self, symbol: Symbol, magnitudes: ToneMagnitudes) {
        self.symbols.put(symbol.as_i8());
        self.mark.put(magnitudes.mark);
        self.space.put(magnitudes.space);
    }

    pub fn symbols(&self) -> &RingBuffer<i8> {
        &self.symbols
    }

    pub fn mark(&self) -> &RingBuffer<f32> {
        &self.mark
    }

    pub fn space(&self) -> &RingBuffer<f32> {
        &self.space
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn clear(&mut self) {
        self.symbols.clear();
        self.mark.clear();
        self.space.clear();
    }
}

/// One receive stream: detector, bit synchronizer and signal trace
///
/// Feed captured audio in order with `process`; blocks may have any length.
/// Use one receiver per stream.
pub struct Receiver {
    config: DetectionConfig,
    detector: CoherentDetector,
    decoder: BitSyncDecoder,
    trace: SignalTrace,
    steps: Vec<ToneMagnitudes>,
}

impl Receiver {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        Self::with_sample_rate(config, crate::SAMPLE_RATE as f32)
    }

    pub fn with_sample_rate(config: DetectionConfig, sample_rate: f32) -> Result<Self> {
        let detector = CoherentDetector::new(&config, sample_rate)?;
        let unit = config.unit_steps(sample_rate);
        debug!(
            "Receiver at {} Hz: {} baud, {} steps per unit",
            sample_rate, config.baud_rate, unit
        );
        Ok(Self {
            decoder: BitSyncDecoder::new(unit, config.threshold),
            detector,
            trace: SignalTrace::new()?,
            steps: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.detector.sample_rate()
    }

    /// Decoder steps per symbol
    pub fn unit(&self) -> usize {
        self.decoder.unit()
    }

    pub fn state(&self) -> DecoderState {
        self.decoder.state()
    }

    pub fn trace(&self) -> &SignalTrace {
        &self.trace
    }

    /// Run one block of samples, appending decoded characters to `sink`
    ///
    /// Returns the number of characters appended.
    pub fn process<S: TextSink + ?Sized>(&mut self, samples: &[f32], sink: &mut S) -> usize {
        let mut steps = std::mem::take(&mut self.steps);
        steps.clear();
        self.detector.process(samples, &mut steps);

        let mut counter = CountingSink { inner: sink, count: 0 };
        for &magnitudes in &steps {
            let symbol = self.decoder.step(magnitudes, &mut counter);
            self.trace.record(symbol, magnitudes);
        }
        self.steps = steps;
        counter.count
    }

    /// Decode one block and return only the text it produced
    pub fn decode(&mut self, samples: &[f32]) -> String {
        let mut text = String::new();
        self.process(samples, &mut text);
        text
    }

    /// Back to the freshly constructed state: phase, filters, timing, shift
    pub fn reset(&mut self) {
        self.detector.reset();
        self.decoder.reset();
        self.trace.clear();
    }
}

struct CountingSink<'a, S: TextSink + ?Sized> {
    inner: &'a mut S,
    count: usize,
}

impl<S: TextSink + ?Sized> TextSink for CountingSink<'_, S> {
    fn push(&mut self, ch: char) {
        self.count += 1;
        self.inner.push(ch);
    }
}

/// Decode a complete recording in one call
pub fn decode_samples(samples: &[f32], sample_rate: f32, config: DetectionConfig) -> Result<String> {
    let mut receiver = Receiver::with_sample_rate(config, sample_rate)?;
    Ok(receiver.decode(samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::afsk::AfskModulator;
    use crate::config::ModulationConfig;

    fn modulate(text: &str, config: &ModulationConfig) -> Vec<f32> {
        AfskModulator::new(config.clone()).unwrap().modulate(text).unwrap()
    }

    #[test]
    fn test_receiver_decodes_modulator_output() {
        let modulation = ModulationConfig::default();
        let samples = modulate("RYRY", &modulation);
        let mut receiver = Receiver::new(DetectionConfig::from(&modulation)).unwrap();
        assert_eq!(receiver.unit(), 15);
        let mut text = String::new();
        let count = receiver.process(&samples, &mut text);
        assert_eq!(text, "RYRY");
        assert_eq!(count, 4);
        assert_eq!(receiver.state(), DecoderState::Waiting);
    }

    #[test]
    fn test_trace_keeps_latest_steps() {
        let modulation = ModulationConfig::default();
        let samples = modulate("RY", &modulation);
        let mut receiver = Receiver::new(DetectionConfig::from(&modulation)).unwrap();
        assert!(receiver.trace().is_empty());

        receiver.decode(&samples);
        let steps = samples.len().div_ceil(64);
        assert_eq!(receiver.trace().len(), steps.min(TRACE_LEN));

        // idle mark at the end of the transmission
        let last = receiver.trace().symbols().get(-1).unwrap();
        assert_eq!(last, 1);
        let mark = receiver.trace().mark().get(-1).unwrap();
        let space = receiver.trace().space().get(-1).unwrap();
        assert!(mark > space);

        for _ in 0..3 {
            receiver.decode(&samples);
        }
        assert_eq!(receiver.trace().len(), TRACE_LEN);
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let modulation = ModulationConfig::default();
        let samples = modulate("CQ", &modulation);
        let mut receiver = Receiver::new(DetectionConfig::from(&modulation)).unwrap();
        // stop halfway through a character
        let cut = samples.len() / 2;
        receiver.decode(&samples[..cut]);
        receiver.reset();
        assert!(receiver.trace().is_empty());
        assert_eq!(receiver.state(), DecoderState::Waiting);
        assert_eq!(receiver.decode(&samples), "CQ");
    }

    #[test]
    fn test_decode_samples_rejects_bad_config() {
        let config = DetectionConfig {
            subsample_factor: 0,
            ..DetectionConfig::default()
        };
        assert!(decode_samples(&[0.0; 16], 44100.0, config).is_err());
    }

    #[test]
    fn test_silence_decodes_nothing() {
        let mut receiver = Receiver::new(DetectionConfig::default()).unwrap();
        assert_eq!(receiver.decode(&vec![0.0; 44100]), "");
        assert!(receiver.trace().symbols().iter().all(|s| s == 0));
    }
}
