use std::io;
use std::path::PathBuf;

use crate::engine::EngineError;
use crate::store::MapFormatError;

/// Broad classification of an [`Error`], for callers that only care about what went wrong
/// rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad caller-supplied settings: theme names, capacities, scale factors.
    Configuration,
    /// The filesystem (or the engine reading from it) failed.
    Io,
    /// A map file is malformed.
    Format,
    /// The renderer has been closed.
    State,
    /// A rendered tile could not be encoded.
    Encoding,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown render theme '{0}'")]
    UnknownTheme(String),
    #[error("tile cache capacity must be at least 1")]
    InvalidCacheCapacity,
    #[error(
        "device scale factor must be positive with tiles at most {max}px, got {0}",
        max = crate::display::MAX_TILE_SIZE
    )]
    InvalidDeviceScale(f32),
    #[error("text scale must be positive and finite, got {0}")]
    InvalidTextScale(f32),
    #[error("render theme failed to compile: {0}")]
    ThemeCompilation(String),
    #[error("Invalid YAML in renderer config.")]
    Config(#[from] serde_yaml::Error),
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid map file {}: {reason}", .path.display())]
    MapFormat {
        path: PathBuf,
        #[source]
        reason: MapFormatError,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    PngEncode(#[from] png::EncodingError),
    #[error("tile renderer has been closed")]
    Closed,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTheme(_)
            | Self::InvalidCacheCapacity
            | Self::InvalidDeviceScale(_)
            | Self::InvalidTextScale(_)
            | Self::ThemeCompilation(_)
            | Self::Config(_) => ErrorKind::Configuration,
            Self::Io { .. } => ErrorKind::Io,
            Self::MapFormat { .. } => ErrorKind::Format,
            Self::Engine(EngineError::Io(_)) => ErrorKind::Io,
            Self::Engine(EngineError::Format(_)) => ErrorKind::Format,
            Self::PngEncode(_) => ErrorKind::Encoding,
            Self::Closed => ErrorKind::State,
        }
    }
}
