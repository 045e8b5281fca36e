//! Posture quality grading for standing and sitting, selected by the
//! position label of the same frame. Both assessors degrade to an
//! `Unknown` verdict when the landmarks they need are missing.

use crate::{
    geometry::{horizontal_offset, vertical_slope},
    point::Point,
    pose::{Frame, KeypointKind::*},
};

const FLOOR: f32 = 0.4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Level {
    Good,
    Warning,
    Bad,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Status {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown,
}

impl Status {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Verdict {
    pub(crate) status: Status,
    pub(crate) advice: String,
    pub(crate) level: Level,
}

impl Verdict {
    fn unknown() -> Self {
        Self {
            status: Status::Unknown,
            advice: "move fully into view of the camera".to_owned(),
            level: Level::Warning,
        }
    }
}

struct TorsoLandmarks {
    nose: Point,
    left_shoulder: Point,
    right_shoulder: Point,
    shoulder_center: Point,
    hip_center: Point,
}

fn torso_landmarks(frame: &Frame) -> Option<TorsoLandmarks> {
    let nose = frame.usable(Nose, FLOOR)?;
    let left_shoulder = frame.usable(LeftShoulder, FLOOR)?;
    let right_shoulder = frame.usable(RightShoulder, FLOOR)?;
    let hip_center = frame.mid(LeftHip, RightHip, FLOOR)?;
    Some(TorsoLandmarks {
        nose,
        left_shoulder,
        right_shoulder,
        shoulder_center: left_shoulder.midpoint(right_shoulder),
        hip_center,
    })
}

/// Grade standing posture from shoulder level, head position and
/// shoulder-over-hip alignment.
pub(crate) fn assess_standing(frame: &Frame) -> Verdict {
    let torso = match torso_landmarks(frame) {
        Some(torso) => torso,
        None => return Verdict::unknown(),
    };

    let shoulder_slope = vertical_slope(torso.left_shoulder, torso.right_shoulder);
    let head_forward = horizontal_offset(torso.nose, torso.shoulder_center) > 30.0;
    let spine_deviation = horizontal_offset(torso.shoulder_center, torso.hip_center);

    if shoulder_slope < 15.0 && !head_forward && spine_deviation < 25.0 {
        Verdict {
            status: Status::Excellent,
            advice: "excellent posture, keep it up".to_owned(),
            level: Level::Good,
        }
    } else if shoulder_slope < 25.0 && spine_deviation < 40.0 {
        Verdict {
            status: Status::Good,
            advice: "good posture with room to improve".to_owned(),
            level: Level::Warning,
        }
    } else {
        let mut issues = Vec::new();
        if shoulder_slope > 25.0 {
            issues.push("uneven shoulders");
        }
        if head_forward {
            issues.push("forward head");
        }
        if spine_deviation > 40.0 {
            issues.push("spine misalignment");
        }
        let advice = if issues.is_empty() {
            "posture needs attention".to_owned()
        } else {
            issues.join(", ")
        };
        Verdict {
            status: Status::Poor,
            advice,
            level: Level::Bad,
        }
    }
}

/// Grade sitting posture by accumulating issues, each with its own
/// remediation tip. More than two issues is a poor verdict.
pub(crate) fn assess_sitting(frame: &Frame) -> Verdict {
    let torso = match torso_landmarks(frame) {
        Some(torso) => torso,
        None => return Verdict::unknown(),
    };

    let head_forward_distance = torso.nose.x() - torso.shoulder_center.x();
    let shoulder_hip_alignment = horizontal_offset(torso.shoulder_center, torso.hip_center);
    let back_angle = (torso.shoulder_center.x() - torso.hip_center.x())
        .atan2(torso.hip_center.y() - torso.shoulder_center.y())
        .to_degrees();
    let shoulder_slope = vertical_slope(torso.left_shoulder, torso.right_shoulder);
    let shoulder_rounding = torso.shoulder_center.x() > torso.hip_center.x() + 20.0;

    let mut issues = Vec::new();
    let mut tips = Vec::new();
    if head_forward_distance.abs() > 50.0 {
        issues.push("forward head");
        tips.push("try chin tucks to bring your head back over your shoulders");
    }
    if shoulder_hip_alignment > 40.0 {
        issues.push("slouched back");
        tips.push("sit up straight with your back against the chair");
    }
    if shoulder_rounding {
        issues.push("rounded shoulders");
        tips.push("squeeze your shoulder blades together");
    }
    if back_angle.abs() > 20.0 {
        issues.push("leaning torso");
        tips.push("center your weight evenly over your hips");
    }
    if shoulder_slope > 20.0 {
        issues.push("uneven shoulders");
        tips.push("level your shoulders");
    }

    if issues.len() > 2 {
        Verdict {
            status: Status::Poor,
            advice: format!("{}; {}", issues.join(", "), tips.join("; ")),
            level: Level::Bad,
        }
    } else if !issues.is_empty() {
        Verdict {
            status: Status::Fair,
            advice: format!("{}; {}", issues.join(", "), tips.join("; ")),
            level: Level::Warning,
        }
    } else {
        Verdict {
            status: Status::Good,
            advice: "great sitting posture".to_owned(),
            level: Level::Good,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{assess_sitting, assess_standing, Level, Status};
    use crate::pose::{frame_from, Frame, KeypointKind::*};

    fn upright_torso() -> Frame {
        frame_from(&[
            (Nose, 0.0, -120.0),
            (LeftShoulder, -40.0, -80.0),
            (RightShoulder, 40.0, -80.0),
            (LeftHip, -30.0, 0.0),
            (RightHip, 30.0, 0.0),
        ])
    }

    #[test]
    fn aligned_standing_is_excellent() {
        let verdict = assess_standing(&upright_torso());
        assert_eq!(verdict.status, Status::Excellent);
        assert_eq!(verdict.level, Level::Good);
    }

    #[test]
    fn tilted_shoulders_and_offset_spine_are_poor() {
        let frame = frame_from(&[
            (Nose, 60.0, -120.0),
            (LeftShoulder, -40.0, -110.0),
            (RightShoulder, 40.0, -80.0),
            (LeftHip, -80.0, 0.0),
            (RightHip, -20.0, 0.0),
        ]);
        // slope 30, head offset 60, spine offset 50: every issue fires
        let verdict = assess_standing(&frame);
        assert_eq!(verdict.status, Status::Poor);
        assert_eq!(verdict.level, Level::Bad);
        assert!(verdict.advice.contains("uneven shoulders"));
        assert!(verdict.advice.contains("forward head"));
        assert!(verdict.advice.contains("spine misalignment"));
    }

    #[test]
    fn missing_nose_degrades_to_unknown() {
        let frame = frame_from(&[
            (LeftShoulder, -40.0, -80.0),
            (RightShoulder, 40.0, -80.0),
            (LeftHip, -30.0, 0.0),
            (RightHip, 30.0, 0.0),
        ]);
        let verdict = assess_standing(&frame);
        assert_eq!(verdict.status, Status::Unknown);
        assert_eq!(verdict.level, Level::Warning);
    }

    #[test]
    fn aligned_sitting_is_good() {
        let verdict = assess_sitting(&upright_torso());
        assert_eq!(verdict.status, Status::Good);
        assert_eq!(verdict.level, Level::Good);
    }

    #[test]
    fn one_issue_is_fair_with_a_tip() {
        // head 60 ahead of the shoulder line, everything else aligned
        let frame = frame_from(&[
            (Nose, 60.0, -120.0),
            (LeftShoulder, -40.0, -80.0),
            (RightShoulder, 40.0, -80.0),
            (LeftHip, -30.0, 0.0),
            (RightHip, 30.0, 0.0),
        ]);
        let verdict = assess_sitting(&frame);
        assert_eq!(verdict.status, Status::Fair);
        assert_eq!(verdict.level, Level::Warning);
        assert!(verdict.advice.contains("forward head"));
        assert!(verdict.advice.contains("chin tucks"));
    }

    #[test]
    fn three_issues_are_poor() {
        // shoulders shifted far right of the hips: slouched back,
        // rounded shoulders and a leaning torso all fire
        let frame = frame_from(&[
            (Nose, 50.0, -120.0),
            (LeftShoulder, 10.0, -80.0),
            (RightShoulder, 90.0, -80.0),
            (LeftHip, -30.0, 0.0),
            (RightHip, 30.0, 0.0),
        ]);
        let verdict = assess_sitting(&frame);
        assert_eq!(verdict.status, Status::Poor);
        assert_eq!(verdict.level, Level::Bad);
    }
}
