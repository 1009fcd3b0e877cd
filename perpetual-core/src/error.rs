/// Error types for curve generation, asset loading and the parameter store
use thiserror::Error;

/// Result alias carrying [`PerpetualError`].
pub type Result<T> = std::result::Result<T, PerpetualError>;

/// Rejected torus-knot parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("winding number p must be at least 1, got {0}")]
    InvalidWinding(i32),
    #[error("radius must be a positive finite number, got {0}")]
    InvalidRadius(f32),
    #[error("a closed curve needs at least 3 segments, got {0}")]
    TooFewSegments(usize),
    #[error("at most {} segments are supported, got {0}", crate::curve::MAX_SEGMENTS)]
    TooManySegments(usize),
}

/// Failure to read or decode the pencil model.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read model `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed STL: {0}")]
    Malformed(String),
    #[error("model loader stopped before delivering the asset")]
    Disconnected,
}

/// Errors raised by the parameter store.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("unknown parameter `{0}`")]
    Unknown(String),
    #[error("parameter `{path}` expects a {expected} value")]
    KindMismatch { path: String, expected: &'static str },
    #[error("invalid parameter snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Umbrella error for the crate.
#[derive(Debug, Error)]
pub enum PerpetualError {
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error("unknown lighting preset `{0}`")]
    UnknownPreset(String),
    #[error("failed to install logging: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_errors_name_the_offending_value() {
        let err = PerpetualError::from(CurveError::InvalidWinding(0));
        assert!(err.to_string().contains("got 0"));
    }

    #[test]
    fn oversized_segment_count_names_the_limit() {
        let err = CurveError::TooManySegments(5000);
        assert_eq!(err.to_string(), "at most 4096 segments are supported, got 5000");
    }

    #[test]
    fn kind_mismatch_mentions_path() {
        let err = ParamError::KindMismatch {
            path: "Pencil.debug".to_string(),
            expected: "boolean",
        };
        assert_eq!(err.to_string(), "parameter `Pencil.debug` expects a boolean value");
    }
}
