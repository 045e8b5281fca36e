//! Fall-risk scoring from center-of-mass sway over the base of
//! support. Pixel-space thresholds, like the rest of the pipeline.

use crate::{
    geometry::horizontal_offset,
    pose::{Frame, KeypointKind::*},
};
use chrono::{DateTime, Utc};

const HIP_FLOOR: f32 = 0.4;
const ANKLE_FLOOR: f32 = 0.3;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    fn from_risk(fall_risk: u32) -> Self {
        if fall_risk > 60 {
            Self::High
        } else if fall_risk > 30 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct FallRiskRecord {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) fall_risk: u32,
    pub(crate) balance_score: u32,
    pub(crate) lateral_sway: f32,
    pub(crate) stability: f32,
}

#[derive(Debug, Clone)]
pub(crate) struct FallRiskAssessment {
    pub(crate) record: FallRiskRecord,
    pub(crate) tier: RiskTier,
}

/// Score one frame, or `None` without usable hips and ankles.
pub(crate) fn assess(frame: &Frame) -> Option<FallRiskAssessment> {
    let center_of_mass = frame.mid(LeftHip, RightHip, HIP_FLOOR)?;
    let left_ankle = frame.usable(LeftAnkle, ANKLE_FLOOR)?;
    let right_ankle = frame.usable(RightAnkle, ANKLE_FLOOR)?;
    let base_center = left_ankle.midpoint(right_ankle);

    let lateral_sway = (center_of_mass.x() - base_center.x()).abs();
    let base_width = horizontal_offset(left_ankle, right_ankle);
    let (fall_risk, stability) = compute_risk(lateral_sway, base_width);

    Some(FallRiskAssessment {
        record: FallRiskRecord {
            timestamp: Utc::now(),
            fall_risk,
            balance_score: 100 - fall_risk,
            lateral_sway,
            stability,
        },
        tier: RiskTier::from_risk(fall_risk),
    })
}

pub(crate) fn compute_risk(lateral_sway: f32, base_width: f32) -> (u32, f32) {
    let stability = if base_width > 0.0 {
        (base_width / lateral_sway).min(2.0)
    } else {
        0.0
    };

    let mut fall_risk = 0;
    if lateral_sway > 20.0 {
        fall_risk += 30;
    }
    if stability < 1.0 {
        fall_risk += 25;
    }
    if base_width < 50.0 {
        fall_risk += 20;
    }
    (fall_risk.min(100), stability)
}

#[cfg(test)]
mod tests {
    use super::{assess, compute_risk, RiskTier};
    use crate::pose::{frame_from, KeypointKind::*};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn sway_over_narrow_base_is_medium_risk() {
        // sway 25 and width 40: the sway and narrow-base penalties
        // fire, the stability penalty does not (40/25 = 1.6)
        let (fall_risk, stability) = compute_risk(25.0, 40.0);
        assert_approx_eq!(stability, 1.6, 1e-4);
        assert_eq!(fall_risk, 50);
        assert_eq!(RiskTier::from_risk(fall_risk), RiskTier::Medium);
    }

    #[test]
    fn centered_wide_stance_is_low_risk() {
        let (fall_risk, stability) = compute_risk(5.0, 120.0);
        assert_eq!(stability, 2.0);
        assert_eq!(fall_risk, 0);
        assert_eq!(RiskTier::from_risk(fall_risk), RiskTier::Low);
    }

    #[test]
    fn everything_wrong_is_high_risk() {
        let (fall_risk, _) = compute_risk(40.0, 30.0);
        // 30/40 = 0.75 stability, so all three penalties fire
        assert_eq!(fall_risk, 75);
        assert_eq!(RiskTier::from_risk(fall_risk), RiskTier::High);
    }

    #[test]
    fn zero_base_width_means_zero_stability() {
        let (fall_risk, stability) = compute_risk(10.0, 0.0);
        assert_eq!(stability, 0.0);
        // stability < 1 and width < 50
        assert_eq!(fall_risk, 45);
    }

    #[test]
    fn zero_sway_saturates_stability() {
        let (_, stability) = compute_risk(0.0, 80.0);
        assert_eq!(stability, 2.0);
    }

    #[test]
    fn assessment_reads_hips_and_ankles() {
        let frame = frame_from(&[
            (LeftHip, 15.0, 0.0),
            (RightHip, 35.0, 0.0),
            (LeftAnkle, -20.0, 200.0),
            (RightAnkle, 20.0, 200.0),
        ]);
        let assessment = assess(&frame).unwrap();
        assert_approx_eq!(assessment.record.lateral_sway, 25.0, 1e-4);
        assert_eq!(assessment.record.fall_risk, 50);
        assert_eq!(assessment.record.balance_score, 50);
        assert_eq!(assessment.tier, RiskTier::Medium);
    }

    #[test]
    fn missing_ankles_produce_no_assessment() {
        let frame = frame_from(&[(LeftHip, 0.0, 0.0), (RightHip, 10.0, 0.0)]);
        assert!(assess(&frame).is_none());
    }
}
