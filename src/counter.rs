//! Debounced squat repetition counting over the hip-knee vertical
//! separation signal.
//!
//! Raw phase flips must hold for [`MIN_STATE_FRAMES`] frames before
//! they are confirmed, and a completed repetition within
//! [`REFRACTORY`] of the previous one is suppressed rather than
//! counted. The band between the two thresholds is a dead zone so a
//! signal hovering near either edge cannot chatter.

use crate::pose::{Frame, KeypointKind::*};
use std::time::{Duration, Instant};

const DOWN_THRESHOLD: f32 = 50.0;
const UP_THRESHOLD: f32 = 90.0;
const MIN_STATE_FRAMES: u32 = 3;
const REFRACTORY: Duration = Duration::from_millis(1500);
const CONFIDENCE_FLOOR: f32 = 0.4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Phase {
    Up,
    Down,
}

impl Phase {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// What one observed frame did to the counter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum RepUpdate {
    /// Hips or knees were not usable; nothing was mutated.
    Waiting,
    /// No confirmed completion this frame.
    Tracking { phase: Phase, reps: u32 },
    /// A `down -> up` transition was confirmed and counted.
    Counted { reps: u32 },
    /// A `down -> up` transition was confirmed inside the refractory
    /// window and therefore not counted.
    Suppressed { reps: u32 },
}

#[derive(Debug)]
pub(crate) struct RepCounter {
    phase: Phase,
    state_frames: u32,
    reps: u32,
    last_completion: Option<Instant>,
}

impl RepCounter {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Up,
            state_frames: 0,
            reps: 0,
            last_completion: None,
        }
    }

    pub(crate) fn reps(&self) -> u32 {
        self.reps
    }

    /// Observe one frame. Refuses to mutate any state unless both hip
    /// and knee midpoints clear the confidence floor.
    pub(crate) fn observe(&mut self, frame: &Frame, now: Instant) -> RepUpdate {
        let mid_hip = frame.mid(LeftHip, RightHip, CONFIDENCE_FLOOR);
        let mid_knee = frame.mid(LeftKnee, RightKnee, CONFIDENCE_FLOOR);
        match (mid_hip, mid_knee) {
            (Some(hip), Some(knee)) => self.advance(knee.y() - hip.y(), now),
            _ => RepUpdate::Waiting,
        }
    }

    /// Advance the machine by one frame of the raw separation signal.
    pub(crate) fn advance(&mut self, hip_knee_diff: f32, now: Instant) -> RepUpdate {
        let candidate = if hip_knee_diff < DOWN_THRESHOLD {
            Phase::Down
        } else if hip_knee_diff > UP_THRESHOLD {
            Phase::Up
        } else {
            // dead zone: keep the current phase
            self.phase
        };

        self.state_frames += 1;
        if candidate != self.phase && self.state_frames >= MIN_STATE_FRAMES {
            let previous = self.phase;
            self.phase = candidate;
            self.state_frames = 0;

            if previous == Phase::Down && candidate == Phase::Up {
                let refractory_clear = self
                    .last_completion
                    .map_or(true, |last| now.duration_since(last) > REFRACTORY);
                if refractory_clear {
                    self.reps += 1;
                    self.last_completion = Some(now);
                    return RepUpdate::Counted { reps: self.reps };
                }
                return RepUpdate::Suppressed { reps: self.reps };
            }
        }

        RepUpdate::Tracking {
            phase: self.phase,
            reps: self.reps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Phase, RepCounter, RepUpdate};
    use crate::pose::{frame_from, KeypointKind::*};
    use std::time::{Duration, Instant};

    const DOWN: f32 = 20.0;
    const UP: f32 = 100.0;

    /// Drive `frames` frames of one raw signal value, `step` apart.
    /// Returns the final clock value and the last update.
    fn drive(
        counter: &mut RepCounter,
        diff: f32,
        frames: u32,
        from: Instant,
        step: Duration,
    ) -> (Instant, RepUpdate) {
        let mut now = from;
        let mut update = RepUpdate::Waiting;
        for _ in 0..frames {
            now += step;
            update = counter.advance(diff, now);
        }
        (now, update)
    }

    #[test]
    fn one_clean_repetition_counts_once() {
        let mut counter = RepCounter::new();
        let start = Instant::now();
        let step = Duration::from_millis(400);

        let (now, update) = drive(&mut counter, DOWN, 3, start, step);
        assert_eq!(
            update,
            RepUpdate::Tracking {
                phase: Phase::Down,
                reps: 0
            }
        );

        let (_, update) = drive(&mut counter, UP, 3, now, step);
        assert_eq!(update, RepUpdate::Counted { reps: 1 });
        assert_eq!(counter.reps(), 1);
    }

    #[test]
    fn fewer_than_min_state_frames_never_transitions() {
        let mut counter = RepCounter::new();
        let start = Instant::now();
        counter.advance(DOWN, start);
        let update = counter.advance(DOWN, start + Duration::from_millis(30));
        assert_eq!(
            update,
            RepUpdate::Tracking {
                phase: Phase::Up,
                reps: 0
            }
        );
    }

    #[test]
    fn repetition_inside_refractory_window_is_suppressed() {
        let mut counter = RepCounter::new();
        let start = Instant::now();
        let step = Duration::from_millis(100);

        // first rep completes 600ms in
        let (now, _) = drive(&mut counter, DOWN, 3, start, step);
        let (now, update) = drive(&mut counter, UP, 3, now, step);
        assert_eq!(update, RepUpdate::Counted { reps: 1 });

        // second down/up bounce lands well inside 1500ms
        let (now, _) = drive(&mut counter, DOWN, 3, now, step);
        let mut now = now;
        for _ in 0..2 {
            now += step;
            counter.advance(UP, now);
        }
        now += step;
        let update = counter.advance(UP, now);
        assert_eq!(update, RepUpdate::Suppressed { reps: 1 });
        assert_eq!(counter.reps(), 1);
    }

    #[test]
    fn repetition_after_refractory_window_counts() {
        let mut counter = RepCounter::new();
        let start = Instant::now();
        let step = Duration::from_millis(600);

        let (now, _) = drive(&mut counter, DOWN, 3, start, step);
        let (now, update) = drive(&mut counter, UP, 3, now, step);
        assert_eq!(update, RepUpdate::Counted { reps: 1 });

        let (now, _) = drive(&mut counter, DOWN, 3, now, step);
        let (_, update) = drive(&mut counter, UP, 3, now, step);
        assert_eq!(update, RepUpdate::Counted { reps: 2 });
        assert_eq!(counter.reps(), 2);
    }

    #[test]
    fn dead_zone_keeps_the_current_phase() {
        let mut counter = RepCounter::new();
        let start = Instant::now();
        let (_, update) = drive(&mut counter, 70.0, 10, start, Duration::from_millis(50));
        assert_eq!(
            update,
            RepUpdate::Tracking {
                phase: Phase::Up,
                reps: 0
            }
        );
    }

    #[test]
    fn unusable_landmarks_leave_all_state_untouched() {
        let mut counter = RepCounter::new();
        let start = Instant::now();
        // first get one confirmed Down so there is state to protect
        let (now, update) = drive(&mut counter, DOWN, 3, start, Duration::from_millis(100));
        assert_eq!(
            update,
            RepUpdate::Tracking {
                phase: Phase::Down,
                reps: 0
            }
        );

        // knees absent entirely
        let blind = frame_from(&[(LeftHip, -10.0, 0.0), (RightHip, 10.0, 0.0)]);
        for i in 0..5 {
            let update = counter.observe(&blind, now + Duration::from_secs(1 + i));
            assert_eq!(update, RepUpdate::Waiting);
        }
        assert_eq!(counter.reps(), 0);

        // the confirmed Down phase survived the blind frames: three
        // usable up frames complete the repetition
        let (_, update) = drive(&mut counter, UP, 3, now + Duration::from_secs(10), Duration::from_millis(100));
        assert_eq!(update, RepUpdate::Counted { reps: 1 });
    }
}
