//! RTTY software modem
//!
//! 5-bit Baudot (ITA2) start-stop telegraphy over audio frequency-shift
//! keying. Text is modulated into a continuous-phase two-tone waveform, and
//! captured audio is decoded back to text by a coherent I/Q detector feeding
//! a self-synchronizing bit decoder.

pub mod error;
pub mod ring_buffer;
pub mod baudot;
pub mod config;
pub mod filter;
pub mod afsk;
pub mod detector;
pub mod decoder;
pub mod receiver;
pub mod audio;

pub use afsk::AfskModulator;
pub use baudot::{ShiftState, ShiftTracker};
pub use config::{DetectionConfig, ModulationConfig};
pub use decoder::{BitSyncDecoder, DecoderState, Symbol, TextSink};
pub use detector::{CoherentDetector, ToneMagnitudes};
pub use error::{Result, RttyError};
pub use receiver::{decode_samples, Receiver, SignalTrace};
pub use ring_buffer::{FrameRingBuffer, Indexing, RingBuffer};

// Audio
pub const SAMPLE_RATE: u32 = 44100;

// Tones and keying (amateur RTTY: 170 Hz shift, 45.45 baud)
pub const DEFAULT_MARK_FREQ: f32 = 2125.0; // Hz
pub const DEFAULT_SHIFT: f32 = 170.0; // Hz
pub const DEFAULT_BAUD_RATE: f64 = 45.45;

// Detection
pub const DEFAULT_THRESHOLD: f32 = 0.02;
pub const DEFAULT_SUBSAMPLE_FACTOR: usize = 64;
pub const DEFAULT_LOWPASS_CUTOFF: f32 = 100.0; // Hz

/// Test transmission: the classic RYRY / CQ call
pub const TEST_MESSAGE: &str = "RYRY CQ CQ CQ DE JH1UMV JH1UMV JH1UMV PSE K\r\n";
