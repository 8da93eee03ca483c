use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rtty_core::audio::{downmix, f32_to_pcm16, pcm16_to_f32};
use rtty_core::RttyError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("WAV error: {0}")]
    Hound(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Modem(#[from] RttyError),
}

/// Mono float samples read from a WAV stream
#[derive(Debug)]
pub struct Recording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count before downmixing
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Recording {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Write mono 16-bit PCM
pub fn write_pcm16<W: Write + Seek>(writer: W, samples: &[f32], sample_rate: u32) -> Result<(), WavError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut wav = WavWriter::new(writer, spec)?;
    for sample in f32_to_pcm16(samples) {
        wav.write_sample(sample)?;
    }
    wav.finalize()?;
    Ok(())
}

pub fn write_file(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), WavError> {
    let file = BufWriter::new(File::create(path)?);
    write_pcm16(file, samples, sample_rate)
}

/// Complete WAV file image in memory
pub fn to_bytes(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, WavError> {
    let mut cursor = Cursor::new(Vec::new());
    write_pcm16(&mut cursor, samples, sample_rate)?;
    Ok(cursor.into_inner())
}

/// Read integer PCM (8/16/24/32-bit) or 32-bit float, downmixed to mono
pub fn read<R: Read>(reader: R) -> Result<Recording, WavError> {
    let mut reader = WavReader::new(reader)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => {
            let ints = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
            pcm16_to_f32(&ints)
        }
        (SampleFormat::Int, bits @ (8 | 24 | 32)) => {
            let scale = 1.0 / (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
        _ => return Err(hound::Error::Unsupported.into()),
    };

    Ok(Recording {
        samples: downmix(&interleaved, spec.channels as usize)?,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
    })
}

pub fn read_file(path: &Path) -> Result<Recording, WavError> {
    read(BufReader::new(File::open(path)?))
}

pub fn from_bytes(bytes: &[u8]) -> Result<Recording, WavError> {
    read(Cursor::new(bytes))
}
