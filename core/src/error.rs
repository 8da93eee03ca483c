use thiserror::Error;

#[derive(Debug, Error)]
pub enum RttyError {
    #[error("Buffer capacity must be non-zero")]
    ZeroCapacity,

    #[error("Buffer capacity must be a power of 2, got {0}")]
    CapacityNotPowerOfTwo(usize),

    #[error("Frame width must be non-zero")]
    ZeroFrameWidth,

    #[error("Character {0:?} has no Baudot code")]
    UnsupportedCharacter(char),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RttyError>;
