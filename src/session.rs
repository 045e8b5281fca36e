//! Per-run mutable state: append-only assessment histories, the
//! training-sample log, and the two exclusive session objects
//! (therapy session, balance test). All of it is owned by the
//! pipeline and mutated only from the frame step or explicit actions.

use crate::{
    assess::{fall_risk::FallRiskRecord, posture_score::PostureRecord, scoliosis::ScoliosisReading},
    error::Error,
    pose::{Frame, WireKeypoint},
};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

pub(crate) const BALANCE_TEST_DURATION: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct TherapySession {
    pub(crate) started_at: DateTime<Utc>,
    #[serde(skip)]
    started: Instant,
    pub(crate) exercises_completed: u32,
    pub(crate) form_accuracy: f32,
}

impl TherapySession {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            started_at: Utc::now(),
            started: now,
            exercises_completed: 0,
            form_accuracy: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TherapySummary {
    pub(crate) duration: Duration,
    pub(crate) exercises_completed: u32,
    pub(crate) form_accuracy: f32,
}

#[derive(Debug)]
pub(crate) struct BalanceTest {
    started: Instant,
    balance_scores: Vec<u32>,
}

impl BalanceTest {
    fn new(now: Instant) -> Self {
        Self {
            started: now,
            balance_scores: Vec::new(),
        }
    }

    pub(crate) fn remaining(&self, now: Instant) -> Duration {
        BALANCE_TEST_DURATION.saturating_sub(now.saturating_duration_since(self.started))
    }

    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= BALANCE_TEST_DURATION
    }

    pub(crate) fn record(&mut self, balance_score: u32) {
        self.balance_scores.push(balance_score);
    }
}

/// The completion summary of a finished balance test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BalanceSummary {
    pub(crate) frames: usize,
    pub(crate) average_balance: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct TrainingSample {
    pub(crate) label: String,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) keypoints: Vec<WireKeypoint>,
}

#[derive(Debug)]
pub(crate) struct SessionContext {
    started: Instant,
    pub(crate) posture_history: Vec<PostureRecord>,
    pub(crate) fall_risk_history: Vec<FallRiskRecord>,
    pub(crate) scoliosis_readings: Vec<ScoliosisReading>,
    pub(crate) samples: Vec<TrainingSample>,
    pose_count: usize,
    confidence_sum: f64,
    therapy: Option<TherapySession>,
    balance: Option<BalanceTest>,
}

impl SessionContext {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            started: now,
            posture_history: Vec::new(),
            fall_risk_history: Vec::new(),
            scoliosis_readings: Vec::new(),
            samples: Vec::new(),
            pose_count: 0,
            confidence_sum: 0.0,
            therapy: None,
            balance: None,
        }
    }

    pub(crate) fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub(crate) fn record_pose(&mut self, pose_score: f32) {
        self.pose_count += 1;
        self.confidence_sum += f64::from(pose_score);
    }

    pub(crate) fn pose_count(&self) -> usize {
        self.pose_count
    }

    pub(crate) fn average_confidence(&self) -> f64 {
        if self.pose_count == 0 {
            0.0
        } else {
            self.confidence_sum / self.pose_count as f64
        }
    }

    /// Start the 30 second balance test. Rejected while one is
    /// already running; the running test is left untouched.
    pub(crate) fn start_balance_test(&mut self, now: Instant) -> Result<(), Error> {
        if self.balance.is_some() {
            return Err(Error::BalanceTestActive);
        }
        self.balance = Some(BalanceTest::new(now));
        Ok(())
    }

    pub(crate) fn balance_test(&self) -> Option<&BalanceTest> {
        self.balance.as_ref()
    }

    pub(crate) fn balance_test_mut(&mut self) -> Option<&mut BalanceTest> {
        self.balance.as_mut()
    }

    /// Complete the balance test once its duration has elapsed,
    /// returning the summary. `None` while it is still running or
    /// when none is active.
    pub(crate) fn finish_balance_test(&mut self, now: Instant) -> Option<BalanceSummary> {
        if !self.balance.as_ref()?.expired(now) {
            return None;
        }
        let test = self.balance.take()?;
        let frames = test.balance_scores.len();
        let average_balance = if frames == 0 {
            0
        } else {
            (test.balance_scores.iter().map(|&s| u64::from(s)).sum::<u64>() / frames as u64) as u32
        };
        Some(BalanceSummary {
            frames,
            average_balance,
        })
    }

    /// Start a therapy session. At most one may be active.
    pub(crate) fn start_therapy_session(&mut self, now: Instant) -> Result<(), Error> {
        if self.therapy.is_some() {
            return Err(Error::TherapySessionActive);
        }
        self.therapy = Some(TherapySession::new(now));
        Ok(())
    }

    pub(crate) fn therapy_session(&self) -> Option<&TherapySession> {
        self.therapy.as_ref()
    }

    pub(crate) fn therapy_session_mut(&mut self) -> Option<&mut TherapySession> {
        self.therapy.as_mut()
    }

    /// End the active therapy session, resetting it to inactive and
    /// returning the accumulated summary.
    pub(crate) fn end_therapy_session(&mut self, now: Instant) -> Result<TherapySummary, Error> {
        let session = self.therapy.take().ok_or(Error::NoTherapySession)?;
        Ok(TherapySummary {
            duration: now.saturating_duration_since(session.started),
            exercises_completed: session.exercises_completed,
            form_accuracy: session.form_accuracy,
        })
    }

    /// Snapshot the raw frame into the labelled training-sample log.
    pub(crate) fn capture_sample(&mut self, label: &str, frame: &Frame) {
        self.samples.push(TrainingSample {
            label: label.to_owned(),
            timestamp: Utc::now(),
            keypoints: frame.to_wire(),
        });
    }
}
