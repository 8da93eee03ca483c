use crate::baudot::{ShiftState, ShiftTracker, CODE_MASK};
use crate::detector::ToneMagnitudes;
use log::{debug, trace};

/// Append-only destination for decoded characters
pub trait TextSink {
    fn push(&mut self, ch: char);
}

impl TextSink for String {
    fn push(&mut self, ch: char) {
        String::push(self, ch);
    }
}

impl TextSink for Vec<char> {
    fn push(&mut self, ch: char) {
        Vec::push(self, ch);
    }
}

/// Tone decision for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Mark above threshold and stronger than space (+1)
    Mark,
    /// Space above threshold and stronger than mark (-1)
    Space,
    /// Neither tone usable (0)
    NoTone,
}

impl Symbol {
    pub fn classify(magnitudes: ToneMagnitudes, threshold: f32) -> Self {
        let ToneMagnitudes { mark, space } = magnitudes;
        if mark > space {
            if mark > threshold {
                Symbol::Mark
            } else {
                Symbol::NoTone
            }
        } else if space > threshold && space > mark {
            Symbol::Space
        } else {
            Symbol::NoTone
        }
    }

    /// +1 / -1 / 0, as drawn on a trace
    pub fn as_i8(self) -> i8 {
        match self {
            Symbol::Mark => 1,
            Symbol::Space => -1,
            Symbol::NoTone => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Idle, waiting for a space edge
    Waiting,
    /// Inside the start bit
    Start,
    /// Sampling the five data bits
    Data,
    /// Inside the stop bit
    Stop,
}

const DATA_BITS: u8 = 5;

/// Start-stop bit synchronizer and Baudot decoder
///
/// Timing is recovered from the falling edge into the start bit; every later
/// transition is one unit (`unit` steps) after the previous one. Each data
/// bit is decided by majority vote over its unit window.
///
/// The running state is carried across calls and is only cleared by
/// `reset`.
pub struct BitSyncDecoder {
    unit: usize,
    threshold: f32,
    state: DecoderState,
    total: usize,
    mark_votes: usize,
    space_votes: usize,
    bit: u8,
    byte: u8,
    shift: ShiftTracker,
}

impl BitSyncDecoder {
    /// `unit` is the number of steps per symbol; values below 1 are raised to 1
    pub fn new(unit: usize, threshold: f32) -> Self {
        let unit = unit.max(1);
        debug!("Bit sync decoder: {} steps per unit, threshold {}", unit, threshold);
        Self {
            unit,
            threshold,
            state: DecoderState::Waiting,
            total: 0,
            mark_votes: 0,
            space_votes: 0,
            bit: 0,
            byte: 0,
            shift: ShiftTracker::new(),
        }
    }

    pub fn unit(&self) -> usize {
        self.unit
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn shift(&self) -> ShiftState {
        self.shift.shift()
    }

    /// Classify a magnitude pair and advance one step
    pub fn step<S: TextSink + ?Sized>(&mut self, magnitudes: ToneMagnitudes, sink: &mut S) -> Symbol {
        let symbol = Symbol::classify(magnitudes, self.threshold);
        self.step_symbol(symbol, sink);
        symbol
    }

    /// Advance one step with an already classified symbol
    ///
    /// `total` counts the steps elapsed in the current bit including this
    /// one, so the edge step is the first step of the start bit and a frame
    /// of exactly `unit` steps per bit emits on its last step.
    pub fn step_symbol<S: TextSink + ?Sized>(&mut self, symbol: Symbol, sink: &mut S) {
        self.total += 1;
        match self.state {
            DecoderState::Waiting => {
                if symbol == Symbol::Space {
                    trace!("start edge");
                    self.state = DecoderState::Start;
                    self.end_start_bit();
                } else {
                    self.total = 0;
                }
            }
            DecoderState::Start => self.end_start_bit(),
            DecoderState::Data => {
                match symbol {
                    Symbol::Mark => self.mark_votes += 1,
                    Symbol::Space => self.space_votes += 1,
                    Symbol::NoTone => {}
                }
                if self.total >= self.unit {
                    let bit = u8::from(self.mark_votes > self.space_votes);
                    trace!(
                        "bit {} = {} (mark {} / space {})",
                        self.bit,
                        bit,
                        self.mark_votes,
                        self.space_votes
                    );
                    self.mark_votes = 0;
                    self.space_votes = 0;
                    self.byte |= bit << self.bit;
                    self.bit += 1;
                    self.total = 0;
                    if self.bit >= DATA_BITS {
                        self.bit = 0;
                        self.state = DecoderState::Stop;
                    }
                }
            }
            DecoderState::Stop => {
                if self.total >= self.unit {
                    let code = self.byte & CODE_MASK;
                    let emitted = self.shift.push(code);
                    debug!("Baudot code {:05b} -> {:?}", code, emitted);
                    if let Some(ch) = emitted {
                        sink.push(ch);
                    }
                    self.byte = 0;
                    self.total = 0;
                    self.state = DecoderState::Waiting;
                }
            }
        }
    }

    fn end_start_bit(&mut self) {
        if self.total >= self.unit {
            self.total = 0;
            self.state = DecoderState::Data;
        }
    }

    /// Run a sequence of magnitude pairs, returning the decoded text
    pub fn decode_magnitudes(&mut self, magnitudes: &[ToneMagnitudes]) -> String {
        let mut text = String::new();
        for &m in magnitudes {
            self.step(m, &mut text);
        }
        text
    }

    pub fn reset(&mut self) {
        self.state = DecoderState::Waiting;
        self.total = 0;
        self.mark_votes = 0;
        self.space_votes = 0;
        self.bit = 0;
        self.byte = 0;
        self.shift.reset();
    }
}
