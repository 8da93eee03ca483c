use rtty_core::{
    AfskModulator, DetectionConfig, FrameRingBuffer, ModulationConfig, Receiver, RttyError,
};
use wasm_bindgen::prelude::*;
use web_sys::{AnalyserNode, AudioBufferSourceNode, AudioContext, BiquadFilterType};

/// Analyser bins per waterfall row (fftSize 512)
pub const WATERFALL_BINS: usize = 256;

/// Waterfall rows kept
pub const WATERFALL_HISTORY: usize = 50;

/// Q of the band-pass used on playback
const PLAYBACK_Q: f32 = 5.0;

fn to_js(e: RttyError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WasmModulator {
    inner: AfskModulator,
}

#[wasm_bindgen]
impl WasmModulator {
    #[wasm_bindgen(constructor)]
    pub fn new(
        mark_frequency: f32,
        shift: f32,
        baud_rate: f64,
        reverse: bool,
        amplitude: f32,
        sample_rate: f32,
    ) -> Result<WasmModulator, JsValue> {
        let config = ModulationConfig {
            mark_frequency,
            shift,
            baud_rate,
            reverse,
            amplitude,
        };
        AfskModulator::with_sample_rate(config, sample_rate)
            .map(|modulator| WasmModulator { inner: modulator })
            .map_err(to_js)
    }

    /// Synthesize text; returns a Float32Array at the modulator's sample rate
    #[wasm_bindgen]
    pub fn modulate(&self, text: &str) -> Result<Vec<f32>, JsValue> {
        self.inner.modulate(text).map_err(to_js)
    }

    #[wasm_bindgen(getter)]
    pub fn space_frequency(&self) -> f32 {
        self.inner.config().space_frequency()
    }
}

/// Receive session for one capture stream
#[wasm_bindgen]
pub struct WasmReceiver {
    inner: Receiver,
}

#[wasm_bindgen]
impl WasmReceiver {
    #[wasm_bindgen(constructor)]
    pub fn new(
        mark_frequency: f32,
        space_frequency: f32,
        baud_rate: f64,
        threshold: f32,
        sample_rate: f32,
    ) -> Result<WasmReceiver, JsValue> {
        let config = DetectionConfig {
            mark_frequency,
            space_frequency,
            baud_rate,
            threshold,
            ..DetectionConfig::default()
        };
        Receiver::with_sample_rate(config, sample_rate)
            .map(|receiver| WasmReceiver { inner: receiver })
            .map_err(to_js)
    }

    /// Feed one captured block (e.g. 4096 samples); returns the text it completed
    #[wasm_bindgen]
    pub fn process(&mut self, samples: &[f32]) -> String {
        self.inner.decode(samples)
    }

    /// Symbol trace (+1 mark, -1 space, 0 none), oldest first
    #[wasm_bindgen]
    pub fn trace_symbols(&self) -> Vec<i8> {
        self.inner.trace().symbols().to_vec()
    }

    #[wasm_bindgen]
    pub fn trace_mark(&self) -> Vec<f32> {
        self.inner.trace().mark().to_vec()
    }

    #[wasm_bindgen]
    pub fn trace_space(&self) -> Vec<f32> {
        self.inner.trace().space().to_vec()
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Rolling history of analyser spectra
#[wasm_bindgen]
pub struct WasmWaterfall {
    frames: FrameRingBuffer<u8>,
}

#[wasm_bindgen]
impl WasmWaterfall {
    #[wasm_bindgen(constructor)]
    pub fn new(bins: usize, history: usize) -> Result<WasmWaterfall, JsValue> {
        FrameRingBuffer::new(bins, history)
            .map(|frames| WasmWaterfall { frames })
            .map_err(to_js)
    }

    /// 256 bins x 50 rows
    #[wasm_bindgen]
    pub fn standard() -> Result<WasmWaterfall, JsValue> {
        Self::new(WATERFALL_BINS, WATERFALL_HISTORY)
    }

    /// Read the analyser's current byte spectrum straight into the next row
    #[wasm_bindgen]
    pub fn capture(&mut self, analyser: &AnalyserNode) {
        analyser.get_byte_frequency_data(self.frames.next_slot());
    }

    /// Append a row supplied by the caller
    #[wasm_bindgen]
    pub fn push(&mut self, row: &[u8]) {
        self.frames.put(row);
    }

    /// Row `index` from the oldest (negative counts back from the newest)
    #[wasm_bindgen]
    pub fn row(&self, index: isize) -> Option<Vec<u8>> {
        self.frames.get(index).map(<[u8]>::to_vec)
    }

    /// All rows, oldest first, concatenated
    #[wasm_bindgen]
    pub fn rows(&self) -> Vec<u8> {
        self.frames.frames().flatten().copied().collect()
    }

    #[wasm_bindgen(getter)]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[wasm_bindgen(getter)]
    pub fn bins(&self) -> usize {
        self.frames.unit()
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

/// Play synthesized samples through a band-pass centred on the mark tone
///
/// Returns the started source node so the caller can stop it or listen for
/// `ended`.
#[wasm_bindgen]
pub fn play(
    context: &AudioContext,
    samples: &[f32],
    sample_rate: f32,
    mark_frequency: f32,
) -> Result<AudioBufferSourceNode, JsValue> {
    let buffer = context.create_buffer(1, samples.len() as u32, sample_rate)?;
    let mut channel = samples.to_vec();
    buffer.copy_to_channel(&mut channel, 0)?;

    let source = context.create_buffer_source()?;
    source.set_buffer(Some(&buffer));

    let bandpass = context.create_biquad_filter()?;
    bandpass.set_type(BiquadFilterType::Bandpass);
    bandpass.frequency().set_value(mark_frequency);
    bandpass.q().set_value(PLAYBACK_Q);

    source.connect_with_audio_node(&bandpass)?;
    bandpass.connect_with_audio_node(&context.destination())?;
    source.start()?;
    Ok(source)
}

/// `play`, resolving once the source has finished
#[wasm_bindgen]
pub async fn play_to_end(
    context: AudioContext,
    samples: Vec<f32>,
    sample_rate: f32,
    mark_frequency: f32,
) -> Result<(), JsValue> {
    let source = play(&context, &samples, sample_rate, mark_frequency)?;
    let ended = js_sys::Promise::new(&mut |resolve, _reject| {
        source.set_onended(Some(&resolve));
    });
    wasm_bindgen_futures::JsFuture::from(ended).await?;
    Ok(())
}

#[wasm_bindgen(start)]
pub fn init() {
    // Optional panic hook setup
}
