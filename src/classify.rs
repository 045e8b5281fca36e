//! Body-position classification. Each call looks at exactly one
//! frame; the label never depends on earlier frames.

use crate::{
    geometry::angle_between,
    pose::{Frame, KeypointKind::*},
};

/// Confidence floor for hips, knees and shoulders.
const PRIMARY_FLOOR: f32 = 0.4;
/// Ankles come through noisier, so they get a lower floor.
const ANKLE_FLOOR: f32 = 0.3;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Position {
    Standing,
    SittingUpright,
    SittingSlouched,
    Sitting,
    Squatting,
    PartialSquat,
    Leaning,
    Transitioning,
    Unknown,
}

impl Position {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Standing => "standing",
            Self::SittingUpright => "sitting upright",
            Self::SittingSlouched => "sitting slouched",
            Self::Sitting => "sitting",
            Self::Squatting => "squatting",
            Self::PartialSquat => "partial squat",
            Self::Leaning => "leaning/bending",
            Self::Transitioning => "transitioning",
            Self::Unknown => "unknown",
        }
    }

    pub(crate) fn is_sitting(self) -> bool {
        matches!(
            self,
            Self::Sitting | Self::SittingUpright | Self::SittingSlouched
        )
    }
}

/// A position label with its heuristic confidence (0-100, a constant
/// per decision branch rather than a probability).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Classification {
    pub(crate) position: Position,
    pub(crate) confidence: u8,
}

impl Classification {
    fn new(position: Position, confidence: u8) -> Self {
        Self {
            position,
            confidence,
        }
    }
}

/// Classify the body position of one frame.
///
/// Decision order matters: the sitting rule subsumes parts of the
/// squat range, so it is checked first when ankle and shoulder data
/// allow it. Without usable hips and knees no call can be made.
pub(crate) fn classify(frame: &Frame) -> Classification {
    let mid_hip = frame.mid(LeftHip, RightHip, PRIMARY_FLOOR);
    let mid_knee = frame.mid(LeftKnee, RightKnee, PRIMARY_FLOOR);
    let (mid_hip, mid_knee) = match (mid_hip, mid_knee) {
        (Some(hip), Some(knee)) => (hip, knee),
        _ => return Classification::new(Position::Unknown, 0),
    };

    let hip_knee = mid_knee.y() - mid_hip.y();
    let mid_ankle = frame.mid(LeftAnkle, RightAnkle, ANKLE_FLOOR);
    let mid_shoulder = frame.mid(LeftShoulder, RightShoulder, PRIMARY_FLOOR);

    match (mid_ankle, mid_shoulder) {
        (Some(mid_ankle), Some(mid_shoulder)) => {
            let knee_angle = angle_between(mid_hip, mid_knee, mid_ankle);
            let hip_shoulder = mid_shoulder.y() - mid_hip.y();
            let knee_ankle = mid_ankle.y() - mid_knee.y();

            if knee_angle > 60.0
                && knee_angle < 130.0
                && hip_knee > 30.0
                && hip_knee < 150.0
                && hip_shoulder < -10.0
                && knee_ankle > 10.0
            {
                if hip_shoulder < -60.0 {
                    Classification::new(Position::SittingUpright, 90)
                } else if hip_shoulder > -30.0 {
                    Classification::new(Position::SittingSlouched, 80)
                } else {
                    Classification::new(Position::Sitting, 85)
                }
            } else if hip_knee > 80.0 && knee_angle > 160.0 {
                Classification::new(Position::Standing, 90)
            } else if hip_knee < 30.0 && knee_angle < 90.0 {
                Classification::new(Position::Squatting, 85)
            } else if hip_knee < 60.0 && knee_angle < 130.0 {
                Classification::new(Position::PartialSquat, 75)
            } else if hip_shoulder > -10.0 && hip_knee > 60.0 {
                Classification::new(Position::Leaning, 70)
            } else {
                Classification::new(Position::Transitioning, 60)
            }
        }
        // hip/knee separation alone still separates the gross postures
        _ => {
            if hip_knee > 80.0 {
                Classification::new(Position::Standing, 90)
            } else if hip_knee < 30.0 {
                Classification::new(Position::Squatting, 85)
            } else if hip_knee < 60.0 {
                Classification::new(Position::PartialSquat, 75)
            } else {
                Classification::new(Position::Transitioning, 60)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, Position};
    use crate::pose::{frame_from, KeypointKind::*};

    #[test]
    fn standing_with_straight_knees() {
        // mid-hip (0, 0), mid-knee (0, 100), knee angle ~170, shoulders
        // well above the hips
        let frame = frame_from(&[
            (LeftShoulder, -10.0, -60.0),
            (RightShoulder, 10.0, -60.0),
            (LeftHip, -10.0, 0.0),
            (RightHip, 10.0, 0.0),
            (LeftKnee, -10.0, 100.0),
            (RightKnee, 10.0, 100.0),
            (LeftAnkle, 3.89, 178.78),
            (RightAnkle, 23.89, 178.78),
        ]);
        let result = classify(&frame);
        assert_eq!(result.position, Position::Standing);
        assert_eq!(result.confidence, 90);
    }

    #[test]
    fn squatting_with_folded_knees() {
        // mid-hip (0, 0), mid-knee (0, 20), knee angle ~80
        let frame = frame_from(&[
            (LeftShoulder, -10.0, -50.0),
            (RightShoulder, 10.0, -50.0),
            (LeftHip, -10.0, 0.0),
            (RightHip, 10.0, 0.0),
            (LeftKnee, -10.0, 20.0),
            (RightKnee, 10.0, 20.0),
            (LeftAnkle, 88.48, 2.64),
            (RightAnkle, 108.48, 2.64),
        ]);
        let result = classify(&frame);
        assert_eq!(result.position, Position::Squatting);
        assert_eq!(result.confidence, 85);
    }

    #[test]
    fn sitting_upright_when_torso_is_tall() {
        // knee angle ~110, hip-knee separation 60, shoulders 80 above
        // hips, ankles 20 below the knees
        let frame = frame_from(&[
            (LeftShoulder, -10.0, -80.0),
            (RightShoulder, 10.0, -80.0),
            (LeftHip, -10.0, 0.0),
            (RightHip, 10.0, 0.0),
            (LeftKnee, -10.0, 60.0),
            (RightKnee, 10.0, 60.0),
            (LeftAnkle, 45.0, 80.0),
            (RightAnkle, 65.0, 80.0),
        ]);
        let result = classify(&frame);
        assert_eq!(result.position, Position::SittingUpright);
        assert_eq!(result.confidence, 90);
    }

    #[test]
    fn fallback_without_ankles_uses_hip_knee_only() {
        let frame = frame_from(&[
            (LeftHip, -10.0, 0.0),
            (RightHip, 10.0, 0.0),
            (LeftKnee, -10.0, 100.0),
            (RightKnee, 10.0, 100.0),
        ]);
        let result = classify(&frame);
        assert_eq!(result.position, Position::Standing);
        assert_eq!(result.confidence, 90);
    }

    #[test]
    fn unknown_without_hips() {
        let frame = frame_from(&[(LeftKnee, 0.0, 50.0), (RightKnee, 10.0, 50.0)]);
        let result = classify(&frame);
        assert_eq!(result.position, Position::Unknown);
        assert_eq!(result.confidence, 0);
    }
}
