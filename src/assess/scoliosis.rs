//! Scoliosis screening heuristics: shoulder/hip line-angle difference
//! as a Cobb-angle stand-in, trunk rotation, and shoulder level
//! asymmetry. Screening only; not a diagnosis.

use crate::{
    geometry::{line_angle, vertical_slope},
    pose::{Frame, KeypointKind::*},
};
use chrono::{DateTime, Utc};

const FLOOR: f32 = 0.4;

const DEFAULT_CAPTURE_EVERY: &str = "0";

#[derive(Debug, Copy, Clone, structopt::StructOpt)]
pub(crate) struct Options {
    /// Capture a reading into the log every N frames (0 disables)
    #[structopt(short, long, default_value = DEFAULT_CAPTURE_EVERY)]
    pub(crate) capture_every: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            capture_every: DEFAULT_CAPTURE_EVERY.parse().unwrap(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Finding {
    PotentialScoliosis,
    ShoulderAsymmetry,
    NoFinding,
}

impl Finding {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::PotentialScoliosis => "potential scoliosis indicators, consider a clinical screen",
            Self::ShoulderAsymmetry => "shoulder asymmetry detected",
            Self::NoFinding => "no asymmetry findings",
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct ScoliosisMetrics {
    pub(crate) shoulder_angle: f32,
    pub(crate) hip_angle: f32,
    pub(crate) cobb_angle: f32,
    pub(crate) trunk_rotation: f32,
    pub(crate) shoulder_level_diff: f32,
    pub(crate) finding: Finding,
}

/// A captured reading: the snapshot the explicit capture action
/// appends to the readings log.
#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct ScoliosisReading {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) cobb_angle: f32,
    pub(crate) trunk_rotation: f32,
    pub(crate) shoulder_level_diff: f32,
}

impl ScoliosisMetrics {
    pub(crate) fn reading(&self) -> ScoliosisReading {
        ScoliosisReading {
            timestamp: Utc::now(),
            cobb_angle: self.cobb_angle,
            trunk_rotation: self.trunk_rotation,
            shoulder_level_diff: self.shoulder_level_diff,
        }
    }
}

/// Measure one frame, or `None` without both shoulders and hips.
pub(crate) fn measure(frame: &Frame) -> Option<ScoliosisMetrics> {
    let left_shoulder = frame.usable(LeftShoulder, FLOOR)?;
    let right_shoulder = frame.usable(RightShoulder, FLOOR)?;
    let left_hip = frame.usable(LeftHip, FLOOR)?;
    let right_hip = frame.usable(RightHip, FLOOR)?;

    let shoulder_angle = line_angle(left_shoulder, right_shoulder);
    let hip_angle = line_angle(left_hip, right_hip);
    let cobb_angle = (shoulder_angle - hip_angle).abs();

    let shoulder_center = left_shoulder.midpoint(right_shoulder);
    let hip_center = left_hip.midpoint(right_hip);
    let trunk_rotation = (hip_center.x() - shoulder_center.x())
        .atan2(shoulder_center.y() - hip_center.y())
        .to_degrees();
    let shoulder_level_diff = vertical_slope(left_shoulder, right_shoulder);

    let finding = if cobb_angle > 10.0 {
        Finding::PotentialScoliosis
    } else if shoulder_level_diff > 20.0 {
        Finding::ShoulderAsymmetry
    } else {
        Finding::NoFinding
    };

    Some(ScoliosisMetrics {
        shoulder_angle,
        hip_angle,
        cobb_angle,
        trunk_rotation,
        shoulder_level_diff,
        finding,
    })
}
