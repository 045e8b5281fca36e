use crate::{error::Error, point::Point};
use num_traits::{FromPrimitive, ToPrimitive};
use std::str::FromStr;

/// The 17-point MoveNet/COCO landmark layout, in model output order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
pub(crate) enum KeypointKind {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointKind {
    pub(crate) fn idx(self) -> Result<usize, Error> {
        self.to_usize().ok_or(Error::KeypointVariantToUsize(self))
    }

    /// Wire name of this landmark, e.g. `"left_hip"`.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

impl FromStr for KeypointKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        (0..NUM_KEYPOINTS)
            .filter_map(Self::from_usize)
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::UnknownKeypointName(s.to_owned()))
    }
}

pub(crate) const NUM_KEYPOINTS: usize = 17;
pub(crate) type Keypoints = [Keypoint; NUM_KEYPOINTS];

#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct Keypoint {
    pub(crate) point: Point,
    pub(crate) score: f32,
}

/// One complete set of keypoint estimates for one time instant.
///
/// Landmarks the estimator did not report keep their default
/// score of zero and fail every usability gate.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Frame {
    pub(crate) keypoints: Keypoints,
    pub(crate) score: f32,
}

impl Frame {
    /// The landmark's position, if its confidence clears `floor`.
    pub(crate) fn usable(&self, kind: KeypointKind, floor: f32) -> Option<Point> {
        let keypoint = self.keypoints[kind.idx().ok()?];
        if keypoint.score >= floor {
            Some(keypoint.point)
        } else {
            None
        }
    }

    /// Midpoint of a left/right landmark pair; absent unless both
    /// sides clear `floor`.
    pub(crate) fn mid(&self, left: KeypointKind, right: KeypointKind, floor: f32) -> Option<Point> {
        Some(self.usable(left, floor)?.midpoint(self.usable(right, floor)?))
    }

    pub(crate) fn from_wire(wire: &WireFrame, scale: f32) -> Result<Self, Error> {
        let mut keypoints = Keypoints::default();
        for raw in &wire.keypoints {
            let kind: KeypointKind = raw.name.parse()?;
            keypoints[kind.idx()?] = Keypoint {
                point: Point::new(raw.x * scale, raw.y * scale)?,
                score: raw.score,
            };
        }
        Ok(Self {
            keypoints,
            score: wire.score,
        })
    }

    /// Named wire form of every landmark, for the training-sample export.
    pub(crate) fn to_wire(&self) -> Vec<WireKeypoint> {
        self.keypoints
            .iter()
            .enumerate()
            .filter_map(|(index, keypoint)| {
                let kind = KeypointKind::from_usize(index)?;
                Some(WireKeypoint {
                    name: kind.name().to_owned(),
                    x: keypoint.point.x(),
                    y: keypoint.point.y(),
                    score: keypoint.score,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct WireKeypoint {
    pub(crate) name: String,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) score: f32,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub(crate) struct WireFrame {
    #[serde(default)]
    pub(crate) score: f32,
    pub(crate) keypoints: Vec<WireKeypoint>,
}

/// Build a frame from `(kind, x, y)` triples, every listed landmark
/// fully confident, for use by the unit tests of the pipeline stages.
#[cfg(test)]
pub(crate) fn frame_from(points: &[(KeypointKind, f32, f32)]) -> Frame {
    let mut keypoints = Keypoints::default();
    for &(kind, x, y) in points {
        keypoints[kind.idx().unwrap()] = Keypoint {
            point: Point::new(x, y).unwrap(),
            score: 0.9,
        };
    }
    Frame {
        keypoints,
        score: 0.9,
    }
}
