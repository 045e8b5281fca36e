use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("failed to open pose stream: {1:?}")]
    OpenSource(#[source] std::io::Error, PathBuf),

    #[error("failed to read from pose stream after line {1}")]
    ReadFrame(#[source] std::io::Error, usize),

    #[error("failed to parse pose frame at line {1}")]
    ParseFrame(#[source] serde_json::Error, usize),

    #[error("unknown keypoint name: {0}")]
    UnknownKeypointName(String),

    #[error("failed to convert keypoint variant to usize: {0:?}")]
    KeypointVariantToUsize(crate::pose::KeypointKind),

    #[error("failed to construct NotNan from f32: {1}")]
    ConstructNotNan(#[source] ordered_float::FloatIsNan, f32),

    #[error("a balance test is already running")]
    BalanceTestActive,

    #[error("a therapy session is already active")]
    TherapySessionActive,

    #[error("no therapy session is active")]
    NoTherapySession,

    #[error("no {0} assessments have been recorded yet")]
    EmptyHistory(&'static str),

    #[error("no training samples have been captured yet")]
    NoSamples,

    #[error("failed to write {1} to {2:?}")]
    WriteArtifact(#[source] std::io::Error, &'static str, PathBuf),

    #[error("failed to serialize session export")]
    SerializeExport(#[source] serde_json::Error),

    #[error("failed to serialize training sample")]
    SerializeSample(#[source] serde_json::Error),
}

/// Coarse classification of a fatal run failure, used to pick the
/// recovery hint shown to the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum FailureKind {
    Model,
    Camera,
    Other,
}

impl FailureKind {
    pub(crate) fn recovery_hint(self) -> &'static str {
        match self {
            Self::Model => {
                "estimator output looks malformed; reload the model and retry after a short delay"
            }
            Self::Camera => "check the capture device and the pose stream, then restart the run",
            Self::Other => "restart the run; see the error chain above for details",
        }
    }
}

impl Error {
    pub(crate) fn failure_kind(&self) -> FailureKind {
        match self {
            Self::OpenSource(..) | Self::ReadFrame(..) => FailureKind::Camera,
            Self::ParseFrame(..)
            | Self::UnknownKeypointName(..)
            | Self::KeypointVariantToUsize(..)
            | Self::ConstructNotNan(..) => FailureKind::Model,
            other => {
                // wrapped errors carry no variant signal, so fall back to
                // sniffing the rendered message
                let text = other.to_string();
                if text.contains("model") || text.contains("tensor") {
                    FailureKind::Model
                } else if text.contains("camera")
                    || text.contains("device")
                    || text.contains("stream")
                {
                    FailureKind::Camera
                } else {
                    FailureKind::Other
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, FailureKind};

    #[test]
    fn source_failures_classify_as_camera() {
        let err = Error::OpenSource(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "poses.jsonl".into(),
        );
        assert_eq!(err.failure_kind(), FailureKind::Camera);
    }

    #[test]
    fn parse_failures_classify_as_model() {
        let err = Error::UnknownKeypointName("left_flipper".into());
        assert_eq!(err.failure_kind(), FailureKind::Model);
    }

    #[test]
    fn action_failures_classify_as_other() {
        assert_eq!(Error::BalanceTestActive.failure_kind(), FailureKind::Other);
    }
}
