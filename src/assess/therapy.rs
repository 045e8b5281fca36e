//! Per-frame therapy-session tracking: a base form accuracy penalized
//! for uneven shoulders, mirrored into the active session object
//! together with the current repetition count.

use crate::{
    geometry::vertical_slope,
    pose::{Frame, KeypointKind::*},
    session::TherapySession,
};

const FLOOR: f32 = 0.4;
const BASE_ACCURACY: f32 = 80.0;
const UNEVEN_SHOULDER_PENALTY: f32 = 15.0;
const SHOULDER_LEVEL_LIMIT: f32 = 30.0;

/// Update the active session from one frame. Returns the form
/// accuracy applied, or `None` when the shoulders are not usable
/// (the session is left untouched).
pub(crate) fn update(frame: &Frame, reps: u32, session: &mut TherapySession) -> Option<f32> {
    let left_shoulder = frame.usable(LeftShoulder, FLOOR)?;
    let right_shoulder = frame.usable(RightShoulder, FLOOR)?;

    let mut accuracy = BASE_ACCURACY;
    if vertical_slope(left_shoulder, right_shoulder) > SHOULDER_LEVEL_LIMIT {
        accuracy -= UNEVEN_SHOULDER_PENALTY;
    }

    session.exercises_completed = reps;
    session.form_accuracy = accuracy;
    Some(accuracy)
}

#[cfg(test)]
mod tests {
    use super::update;
    use crate::{
        pose::{frame_from, KeypointKind::*},
        session::TherapySession,
    };
    use std::time::Instant;

    #[test]
    fn level_shoulders_keep_base_accuracy() {
        let frame = frame_from(&[(LeftShoulder, -40.0, -80.0), (RightShoulder, 40.0, -80.0)]);
        let mut session = TherapySession::new(Instant::now());
        let accuracy = update(&frame, 7, &mut session).unwrap();
        assert_eq!(accuracy, 80.0);
        assert_eq!(session.exercises_completed, 7);
        assert_eq!(session.form_accuracy, 80.0);
    }

    #[test]
    fn uneven_shoulders_are_penalized() {
        let frame = frame_from(&[(LeftShoulder, -40.0, -120.0), (RightShoulder, 40.0, -80.0)]);
        let mut session = TherapySession::new(Instant::now());
        let accuracy = update(&frame, 2, &mut session).unwrap();
        assert_eq!(accuracy, 65.0);
    }

    #[test]
    fn missing_shoulders_leave_the_session_untouched() {
        let frame = frame_from(&[(LeftHip, 0.0, 0.0)]);
        let mut session = TherapySession::new(Instant::now());
        session.exercises_completed = 3;
        session.form_accuracy = 72.0;
        assert!(update(&frame, 9, &mut session).is_none());
        assert_eq!(session.exercises_completed, 3);
        assert_eq!(session.form_accuracy, 72.0);
    }
}
