// ============================================================================
// ROUND-TRIP TESTS
// ============================================================================
// Text -> AFSK modulator -> coherent detector -> bit-sync decoder -> text.
// Each message carries roughly 1.5 s of audio per 10 characters, so these
// run noticeably faster in release mode:
//   cargo test -p rtty-core --test roundtrip_test --release
// ============================================================================

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rtty_core::{
    decode_samples, AfskModulator, DetectionConfig, ModulationConfig, Receiver, RttyError,
    SAMPLE_RATE, TEST_MESSAGE,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn modulate(text: &str, config: &ModulationConfig, sample_rate: f32) -> Vec<f32> {
    let modulator = AfskModulator::with_sample_rate(config.clone(), sample_rate)
        .expect("Failed to create modulator");
    modulator.modulate(text).expect("Failed to modulate")
}

fn demodulate(samples: &[f32], config: &ModulationConfig, sample_rate: f32) -> String {
    decode_samples(samples, sample_rate, DetectionConfig::from(config)).expect("Failed to decode")
}

fn add_noise(samples: &mut [f32], std_dev: f32, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, std_dev).expect("Invalid noise parameters");
    for sample in samples.iter_mut() {
        *sample += normal.sample(&mut rng);
    }
}

#[test]
fn test_round_trip_with_figures() {
    init_logging();
    let config = ModulationConfig::default();
    let samples = modulate("RYRY CQ DE JH1UMV", &config, SAMPLE_RATE as f32);

    let decoded = demodulate(&samples, &config, SAMPLE_RATE as f32);
    assert_eq!(decoded, "RYRY CQ DE JH1UMV", "Round trip mismatch");
}

#[test]
fn test_round_trip_test_message_reverse_shift() {
    init_logging();
    let config = ModulationConfig {
        reverse: true,
        ..ModulationConfig::default()
    };
    let samples = modulate(TEST_MESSAGE, &config, SAMPLE_RATE as f32);

    // carriage return is not echoed, line feed is
    let decoded = demodulate(&samples, &config, SAMPLE_RATE as f32);
    assert_eq!(decoded, "RYRY CQ CQ CQ DE JH1UMV JH1UMV JH1UMV PSE K\n");
}

#[test]
fn test_round_trip_default_detection_matches_reverse_modulation() {
    // Default detection listens for space above mark
    let config = ModulationConfig {
        reverse: true,
        ..ModulationConfig::default()
    };
    let samples = modulate("RYRY", &config, SAMPLE_RATE as f32);

    let mut receiver = Receiver::new(DetectionConfig::default()).expect("Failed to create receiver");
    assert_eq!(receiver.decode(&samples), "RYRY");
}

#[test]
fn test_round_trip_punctuation_and_digits() {
    let config = ModulationConfig::default();
    let text = "599 73, K? (QSL) 12:30/4-5";
    let samples = modulate(text, &config, SAMPLE_RATE as f32);
    assert_eq!(demodulate(&samples, &config, SAMPLE_RATE as f32), text);
}

#[test]
fn test_round_trip_lowercase_comes_back_uppercase() {
    let config = ModulationConfig::default();
    let samples = modulate("cq de jh1umv", &config, SAMPLE_RATE as f32);
    assert_eq!(demodulate(&samples, &config, SAMPLE_RATE as f32), "CQ DE JH1UMV");
}

#[test]
fn test_round_trip_at_48khz() {
    let config = ModulationConfig::default();
    let samples = modulate("THE QUICK BROWN FOX", &config, 48000.0);
    assert_eq!(demodulate(&samples, &config, 48000.0), "THE QUICK BROWN FOX");
}

#[test]
fn test_round_trip_75_baud_wide_shift() {
    let config = ModulationConfig {
        mark_frequency: 1275.0,
        shift: 850.0,
        baud_rate: 75.0,
        reverse: true,
        amplitude: 0.8,
    };
    let samples = modulate("RYRY 75 BAUD", &config, SAMPLE_RATE as f32);
    assert_eq!(demodulate(&samples, &config, SAMPLE_RATE as f32), "RYRY 75 BAUD");
}

#[test]
fn test_round_trip_with_silence_both_sides() {
    let config = ModulationConfig::default();
    let signal = modulate("CQ CQ", &config, SAMPLE_RATE as f32);

    let mut samples = vec![0.0; 20000];
    samples.extend_from_slice(&signal);
    samples.extend(vec![0.0; 20000]);

    assert_eq!(demodulate(&samples, &config, SAMPLE_RATE as f32), "CQ CQ");
}

#[test]
fn test_carrier_drop_into_silence_adds_nothing() {
    let config = ModulationConfig::default();
    for text in ["", "RY"] {
        let mut samples = modulate(text, &config, SAMPLE_RATE as f32);
        samples.extend(vec![0.0; 20000]);
        assert_eq!(demodulate(&samples, &config, SAMPLE_RATE as f32), text);
    }
}

#[test]
fn test_round_trip_with_light_leading_noise() {
    let config = ModulationConfig::default();
    let signal = modulate("DE JH1UMV", &config, SAMPLE_RATE as f32);

    // noise floor well below the detection threshold
    let mut samples = vec![0.0; 30000];
    add_noise(&mut samples, 0.005, 12345);
    samples.extend_from_slice(&signal);

    assert_eq!(demodulate(&samples, &config, SAMPLE_RATE as f32), "DE JH1UMV");
}

#[test]
fn test_round_trip_with_moderate_data_noise() {
    let config = ModulationConfig::default();
    let mut samples = modulate("RYRY CQ DE JH1UMV", &config, SAMPLE_RATE as f32);
    add_noise(&mut samples, 0.1, 22222);
    assert_eq!(
        demodulate(&samples, &config, SAMPLE_RATE as f32),
        "RYRY CQ DE JH1UMV",
        "Moderate noise round trip failed"
    );
}

#[test]
fn test_round_trip_with_heavy_data_noise() {
    let config = ModulationConfig::default();
    let mut samples = modulate("RYRY CQ DE JH1UMV", &config, SAMPLE_RATE as f32);
    add_noise(&mut samples, 0.3, 33333);
    assert_eq!(
        demodulate(&samples, &config, SAMPLE_RATE as f32),
        "RYRY CQ DE JH1UMV",
        "Heavy noise round trip failed"
    );
}

#[test]
fn test_quiet_signal_still_decodes() {
    let config = ModulationConfig {
        amplitude: 0.08,
        ..ModulationConfig::default()
    };
    let samples = modulate("RYRY", &config, SAMPLE_RATE as f32);
    assert_eq!(demodulate(&samples, &config, SAMPLE_RATE as f32), "RYRY");
}

#[test]
fn test_signal_below_threshold_is_ignored() {
    let config = ModulationConfig {
        amplitude: 0.01,
        ..ModulationConfig::default()
    };
    let samples = modulate("RYRY", &config, SAMPLE_RATE as f32);
    assert_eq!(demodulate(&samples, &config, SAMPLE_RATE as f32), "");
}

#[test]
fn test_wrong_tones_decode_nothing() {
    // 1275/2125 Hz listener against a 2125/1955 Hz transmission
    let config = ModulationConfig::default();
    let samples = modulate("RYRY", &config, SAMPLE_RATE as f32);
    let detection = DetectionConfig {
        mark_frequency: 1275.0,
        space_frequency: 425.0,
        ..DetectionConfig::default()
    };
    let decoded = decode_samples(&samples, SAMPLE_RATE as f32, detection).expect("Failed to decode");
    assert_ne!(decoded, "RYRY");
}

#[test]
fn test_unsupported_character_rejected() {
    let modulator = AfskModulator::new(ModulationConfig::default()).expect("Failed to create modulator");
    assert!(matches!(
        modulator.modulate("MAIL ME @ HOME"),
        Err(RttyError::UnsupportedCharacter('@'))
    ));
}

#[test]
fn test_empty_text_is_pure_idle() {
    let config = ModulationConfig::default();
    let samples = modulate("", &config, SAMPLE_RATE as f32);
    let unit = SAMPLE_RATE as f64 / config.baud_rate;
    assert_eq!(samples.len(), (60.0 * unit).ceil() as usize);
    assert_eq!(demodulate(&samples, &config, SAMPLE_RATE as f32), "");
}
