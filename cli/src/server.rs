use crate::wav::{self, WavError};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rtty_core::{AfskModulator, DetectionConfig, ModulationConfig, Receiver, RttyError, SAMPLE_RATE};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

/// Request bodies carry whole WAV files in base64
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Samples handed to the receiver per call, as a live capture would
const DECODE_BLOCK: usize = 4096;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Modem(#[from] RttyError),

    #[error("invalid base64 audio: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Wav(#[from] WavError),

    #[error("worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        tracing::warn!(%status, error = %self, "request failed");
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Tone parameters; anything left out takes the modem default
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToneParams {
    pub mark: Option<f32>,
    pub shift: Option<f32>,
    pub baud: Option<f64>,
    pub reverse: Option<bool>,
}

impl ToneParams {
    fn modulation(&self) -> ModulationConfig {
        let defaults = ModulationConfig::default();
        ModulationConfig {
            mark_frequency: self.mark.unwrap_or(defaults.mark_frequency),
            shift: self.shift.unwrap_or(defaults.shift),
            baud_rate: self.baud.unwrap_or(defaults.baud_rate),
            reverse: self.reverse.unwrap_or(defaults.reverse),
            amplitude: defaults.amplitude,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    pub text: String,
    #[serde(default)]
    pub tones: ToneParams,
    pub amplitude: Option<f32>,
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncodeResponse {
    pub id: Uuid,
    pub sample_rate: u32,
    pub samples: usize,
    /// 16-bit mono WAV, base64
    pub audio: String,
}

#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    /// WAV file, base64
    pub audio: String,
    #[serde(default)]
    pub tones: ToneParams,
    pub threshold: Option<f32>,
    pub subsample: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeResponse {
    pub id: Uuid,
    pub text: String,
    pub sample_rate: u32,
    pub duration_secs: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/encode", post(encode))
        .route("/api/decode", post(decode))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

pub async fn run(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn encode(Json(request): Json<EncodeRequest>) -> Result<Json<EncodeResponse>, ApiError> {
    let id = Uuid::new_v4();
    let sample_rate = request.sample_rate.unwrap_or(SAMPLE_RATE);
    let mut config = request.tones.modulation();
    if let Some(amplitude) = request.amplitude {
        config.amplitude = amplitude;
    }
    tracing::info!(%id, chars = request.text.chars().count(), sample_rate, "encode");

    let (samples, bytes) = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let modulator = AfskModulator::with_sample_rate(config, sample_rate as f32)?;
        let samples = modulator.modulate(&request.text)?;
        let bytes = wav::to_bytes(&samples, sample_rate)?;
        Ok((samples.len(), bytes))
    })
    .await??;

    Ok(Json(EncodeResponse {
        id,
        sample_rate,
        samples,
        audio: STANDARD.encode(bytes),
    }))
}

async fn decode(Json(request): Json<DecodeRequest>) -> Result<Json<DecodeResponse>, ApiError> {
    let id = Uuid::new_v4();
    let bytes = STANDARD.decode(request.audio.as_bytes())?;
    let defaults = DetectionConfig::default();
    let config = DetectionConfig {
        threshold: request.threshold.unwrap_or(defaults.threshold),
        subsample_factor: request.subsample.unwrap_or(defaults.subsample_factor),
        ..DetectionConfig::from(&request.tones.modulation())
    };

    let response = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let recording = wav::from_bytes(&bytes)?;
        let mut receiver = Receiver::with_sample_rate(config, recording.sample_rate as f32)?;
        let mut text = String::new();
        for block in recording.samples.chunks(DECODE_BLOCK) {
            receiver.process(block, &mut text);
        }
        Ok(DecodeResponse {
            id,
            text,
            sample_rate: recording.sample_rate,
            duration_secs: recording.duration_secs(),
        })
    })
    .await??;

    tracing::info!(%id, chars = response.text.chars().count(), "decode");
    Ok(Json(response))
}
