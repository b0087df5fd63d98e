use thiserror::Error;

/// Library error type for particle-frame operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An RGBA8 buffer does not match its declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    InvalidBuffer { expected: usize, actual: usize },

    /// Two rasters handed to a blend do not share dimensions.
    #[error("blend rasters differ in size: {primary:?} vs {secondary:?}")]
    DimensionMismatch {
        primary: (u32, u32),
        secondary: (u32, u32),
    },

    /// The resampling backend rejected the request.
    #[error("resample failed: {0}")]
    Resize(String),

    /// The image could not be decoded into RGBA8 pixels.
    #[error("failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },

    /// Input paths that do not exist.
    #[error("no such file or directory: {0}")]
    BadPath(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}
