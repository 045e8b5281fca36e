//! Numeric posture scoring. Each deviation contributes a capped
//! penalty so a single wild measurement cannot zero the score alone.

use crate::{
    geometry::{horizontal_offset, vertical_slope},
    pose::{Frame, KeypointKind::*},
};
use chrono::{DateTime, Utc};

const FLOOR: f32 = 0.4;
const MAX_PENALTY: f32 = 25.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
pub(crate) enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Start at A and downgrade stepwise as the score falls through
    /// each band boundary.
    fn from_score(score: u32) -> Self {
        let mut grade = Self::A;
        if score < 90 {
            grade = Self::B;
        }
        if score <= 75 {
            grade = Self::C;
        }
        if score <= 60 {
            grade = Self::D;
        }
        if score <= 45 {
            grade = Self::F;
        }
        grade
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct PostureRecord {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) score: u32,
    pub(crate) grade: Grade,
    pub(crate) shoulder_slope: f32,
    pub(crate) head_deviation: f32,
    pub(crate) spine_deviation: f32,
}

/// Score one frame, or `None` when the torso landmarks are missing.
pub(crate) fn assess(frame: &Frame) -> Option<PostureRecord> {
    let nose = frame.usable(Nose, FLOOR)?;
    let left_shoulder = frame.usable(LeftShoulder, FLOOR)?;
    let right_shoulder = frame.usable(RightShoulder, FLOOR)?;
    let hip_center = frame.mid(LeftHip, RightHip, FLOOR)?;
    let shoulder_center = left_shoulder.midpoint(right_shoulder);

    let shoulder_slope = vertical_slope(left_shoulder, right_shoulder);
    let head_deviation = horizontal_offset(nose, shoulder_center);
    let spine_deviation = horizontal_offset(shoulder_center, hip_center);

    let score = compute_score(shoulder_slope, head_deviation, spine_deviation);
    Some(PostureRecord {
        timestamp: Utc::now(),
        score,
        grade: Grade::from_score(score),
        shoulder_slope,
        head_deviation,
        spine_deviation,
    })
}

pub(crate) fn compute_score(shoulder_slope: f32, head_deviation: f32, spine_deviation: f32) -> u32 {
    let score = 100.0
        - (shoulder_slope * 0.5).min(MAX_PENALTY)
        - (head_deviation * 0.3).min(MAX_PENALTY)
        - (spine_deviation * 0.4).min(MAX_PENALTY);
    score.max(0.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::{assess, compute_score, Grade};
    use crate::pose::{frame_from, KeypointKind::*};

    #[test]
    fn perfect_alignment_scores_one_hundred() {
        assert_eq!(compute_score(0.0, 0.0, 0.0), 100);
        assert_eq!(Grade::from_score(100), Grade::A);
    }

    #[test]
    fn shoulder_penalty_is_capped() {
        // slope 60 would be a 30 point penalty uncapped
        let score = compute_score(60.0, 0.0, 0.0);
        assert_eq!(score, 75);
        assert_eq!(Grade::from_score(score), Grade::C);
    }

    #[test]
    fn capped_penalties_bound_the_worst_score() {
        assert_eq!(compute_score(1000.0, 1000.0, 1000.0), 25);
        assert_eq!(compute_score(f32::MAX, f32::MAX, f32::MAX), 25);
    }

    #[test]
    fn grade_bands_downgrade_stepwise() {
        assert_eq!(Grade::from_score(90), Grade::A);
        assert_eq!(Grade::from_score(89), Grade::B);
        assert_eq!(Grade::from_score(76), Grade::B);
        assert_eq!(Grade::from_score(75), Grade::C);
        assert_eq!(Grade::from_score(61), Grade::C);
        assert_eq!(Grade::from_score(60), Grade::D);
        assert_eq!(Grade::from_score(45), Grade::F);
    }

    #[test]
    fn missing_torso_produces_no_record() {
        let frame = frame_from(&[(LeftHip, 0.0, 0.0), (RightHip, 10.0, 0.0)]);
        assert!(assess(&frame).is_none());
    }

    #[test]
    fn full_torso_produces_a_record() {
        let frame = frame_from(&[
            (Nose, 0.0, -120.0),
            (LeftShoulder, -40.0, -80.0),
            (RightShoulder, 40.0, -80.0),
            (LeftHip, -30.0, 0.0),
            (RightHip, 30.0, 0.0),
        ]);
        let record = assess(&frame).unwrap();
        assert_eq!(record.score, 100);
        assert_eq!(record.grade, Grade::A);
    }
}
