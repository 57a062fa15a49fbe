use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("track contains no fixes")]
    EmptyTrack,

    #[error("track has {actual} fixes but the flight type needs {required}")]
    InsufficientFixes { required: usize, actual: usize },

    #[error("flight expects a tuple of {expected} turnpoints, got {actual}")]
    InvalidTurnpointCount { expected: usize, actual: usize },

    #[error("malformed fix: {0}")]
    MalformedFix(String),

    #[error("cache record invalid: {0}")]
    CacheRecordInvalid(String),

    #[error("unknown league: {0}")]
    UnknownLeague(String),

    #[error("invalid IGC record: {0}")]
    Igc(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
