//! The per-frame pipeline: feature extraction, classification,
//! posture grading, repetition counting and the selected medical
//! module, in that order. One frame is fully processed before the
//! next is accepted; all mutable state lives in the session context
//! owned here.

use crate::{
    assess::{
        fall_risk::{self, FallRiskAssessment},
        posture_score::{self, PostureRecord},
        scoliosis::{self, ScoliosisMetrics},
        therapy, Mode,
    },
    classify::{classify, Classification, Position},
    counter::{RepCounter, RepUpdate},
    error::Error,
    pose::Frame,
    posture::{assess_sitting, assess_standing, Verdict},
    session::{BalanceSummary, SessionContext, TherapySummary},
};
use std::time::{Duration, Instant};

#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct Timing {
    pub(crate) processing: Duration,
}

/// Everything the pipeline derived from one frame, for the
/// presentation layer to render.
#[derive(Debug)]
pub(crate) struct FrameOutput {
    pub(crate) classification: Classification,
    pub(crate) verdict: Option<Verdict>,
    pub(crate) rep: Option<RepUpdate>,
    pub(crate) metrics: Option<ModeMetrics>,
    pub(crate) balance_remaining: Option<Duration>,
    pub(crate) balance_summary: Option<BalanceSummary>,
}

#[derive(Debug)]
pub(crate) enum ModeMetrics {
    Posture(PostureRecord),
    FallRisk(FallRiskAssessment),
    Scoliosis(ScoliosisMetrics),
    Therapy { accuracy: f32, exercises: u32 },
}

pub(crate) struct Engine {
    mode: Mode,
    count_reps: bool,
    counter: RepCounter,
    ctx: SessionContext,
    sample_label: Option<String>,
    sample_every: usize,
    frame_num: usize,
    pub(crate) timing: Timing,
}

impl Engine {
    pub(crate) fn new(mode: Mode, count_reps: bool, now: Instant) -> Self {
        Self {
            mode,
            // therapy tracking mirrors the repetition count, so the
            // counter always runs in that mode
            count_reps: count_reps || matches!(mode, Mode::Therapy),
            counter: RepCounter::new(),
            ctx: SessionContext::new(now),
            sample_label: None,
            sample_every: 0,
            frame_num: 0,
            timing: Timing::default(),
        }
    }

    pub(crate) fn with_sample_capture(mut self, label: Option<String>, every: usize) -> Self {
        self.sample_label = label;
        self.sample_every = every;
        self
    }

    pub(crate) fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub(crate) fn frame_num(&self) -> usize {
        self.frame_num
    }

    pub(crate) fn reps(&self) -> u32 {
        self.counter.reps()
    }

    pub(crate) fn start_balance_test(&mut self, now: Instant) -> Result<(), Error> {
        self.ctx.start_balance_test(now)
    }

    pub(crate) fn start_therapy_session(&mut self, now: Instant) -> Result<(), Error> {
        self.ctx.start_therapy_session(now)
    }

    pub(crate) fn end_therapy_session(&mut self, now: Instant) -> Result<TherapySummary, Error> {
        self.ctx.end_therapy_session(now)
    }

    /// Run the full pipeline over one frame.
    pub(crate) fn process(&mut self, frame: &Frame, now: Instant) -> FrameOutput {
        let started = Instant::now();
        self.frame_num += 1;
        self.ctx.record_pose(frame.score);

        let classification = classify(frame);
        let verdict = if classification.position.is_sitting() {
            Some(assess_sitting(frame))
        } else if classification.position == Position::Standing {
            Some(assess_standing(frame))
        } else {
            None
        };

        let rep = if self.count_reps {
            Some(self.counter.observe(frame, now))
        } else {
            None
        };

        let metrics = self.run_mode(frame);
        let (balance_remaining, balance_summary) = self.run_balance_test(frame, now, &metrics);

        if let Some(label) = &self.sample_label {
            if self.sample_every > 0 && self.frame_num % self.sample_every == 0 {
                self.ctx.capture_sample(label, frame);
            }
        }

        self.timing.processing += started.elapsed();
        FrameOutput {
            classification,
            verdict,
            rep,
            metrics,
            balance_remaining,
            balance_summary,
        }
    }

    fn run_mode(&mut self, frame: &Frame) -> Option<ModeMetrics> {
        match self.mode {
            Mode::PostureScore => posture_score::assess(frame).map(|record| {
                self.ctx.posture_history.push(record.clone());
                ModeMetrics::Posture(record)
            }),
            Mode::FallRisk => fall_risk::assess(frame).map(|assessment| {
                self.ctx.fall_risk_history.push(assessment.record.clone());
                ModeMetrics::FallRisk(assessment)
            }),
            Mode::Scoliosis(options) => scoliosis::measure(frame).map(|metrics| {
                if options.capture_every > 0 && self.frame_num % options.capture_every == 0 {
                    self.ctx.scoliosis_readings.push(metrics.reading());
                }
                ModeMetrics::Scoliosis(metrics)
            }),
            Mode::Therapy => {
                let reps = self.counter.reps();
                let session = self.ctx.therapy_session_mut()?;
                therapy::update(frame, reps, session).map(|accuracy| ModeMetrics::Therapy {
                    accuracy,
                    exercises: reps,
                })
            }
            Mode::Monitor => None,
        }
    }

    /// While a balance test runs, the fall-risk module is forced each
    /// frame in addition to the selected mode.
    fn run_balance_test(
        &mut self,
        frame: &Frame,
        now: Instant,
        metrics: &Option<ModeMetrics>,
    ) -> (Option<Duration>, Option<BalanceSummary>) {
        if self.ctx.balance_test().is_none() {
            return (None, None);
        }

        // reuse this frame's assessment when the mode already ran it
        let balance_score = match metrics {
            Some(ModeMetrics::FallRisk(assessment)) => Some(assessment.record.balance_score),
            _ => fall_risk::assess(frame).map(|assessment| {
                let score = assessment.record.balance_score;
                self.ctx.fall_risk_history.push(assessment.record);
                score
            }),
        };
        if let (Some(score), Some(test)) = (balance_score, self.ctx.balance_test_mut()) {
            test.record(score);
        }

        let summary = self.ctx.finish_balance_test(now);
        if let Some(summary) = &summary {
            tracing::info!(
                message = "balance test complete",
                frames = summary.frames,
                average_balance = summary.average_balance,
            );
        }
        let remaining = self.ctx.balance_test().map(|test| test.remaining(now));
        (remaining, summary)
    }
}
