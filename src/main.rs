use anyhow::{Context, Result};
use engine::{Engine, FrameOutput, ModeMetrics};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use structopt::StructOpt;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::layer::SubscriberExt;

mod assess;
mod classify;
mod counter;
mod engine;
mod error;
mod geometry;
mod point;
mod pose;
mod posture;
mod report;
mod session;
mod source;

use counter::RepUpdate;
use source::PoseSource;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Path to a recorded pose stream: one JSON frame per line, each
    /// with the 17-keypoint schema of the upstream estimator.
    input: PathBuf,

    /// Minimum whole-pose score required to process a frame.
    #[structopt(short, long, default_value = "0.2")]
    threshold: f32,

    /// Multiplier applied to keypoint coordinates on ingest.
    /// Assessment thresholds assume display-resolution pixels at a
    /// fixed camera framing.
    #[structopt(short, long, default_value = "1.0")]
    coordinate_scale: f32,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short, long)]
    show_progress: bool,

    /// Count exercise repetitions from hip-knee separation.
    #[structopt(short = "-r", long)]
    count_reps: bool,

    /// Start a 30 second balance test when the stream opens.
    #[structopt(short = "-b", long)]
    balance_test: bool,

    /// Label applied to captured training samples.
    #[structopt(long)]
    capture_label: Option<String>,

    /// Capture a training sample every N frames (0 disables).
    #[structopt(long, default_value = "0")]
    sample_every: usize,

    /// Write the session export document here on exit.
    #[structopt(long)]
    export_session: Option<PathBuf>,

    /// Write captured training samples here on exit, one per line.
    #[structopt(long)]
    export_samples: Option<PathBuf>,

    /// Patient name for the session export header.
    #[structopt(long)]
    patient_name: Option<String>,

    /// Patient identifier for the session export header.
    #[structopt(long)]
    patient_id: Option<String>,

    #[structopt(subcommand)]
    mode: assess::Mode,
}

/// Renders structured pipeline output for the terminal. The pipeline
/// itself never prints.
struct Presenter {
    pb: Option<ProgressBar>,
    last_position: Option<classify::Position>,
    last_status: Option<posture::Status>,
}

impl Presenter {
    fn new(pb: Option<ProgressBar>) -> Self {
        Self {
            pb,
            last_position: None,
            last_status: None,
        }
    }

    fn render(
        &mut self,
        output: &FrameOutput,
        timing: engine::Timing,
        stream_elapsed: Duration,
        nframes: usize,
    ) {
        let position = output.classification.position;
        if self.last_position != Some(position) {
            info!(
                message = "position",
                label = position.label(),
                confidence = output.classification.confidence,
            );
            self.last_position = Some(position);
        }

        if let Some(verdict) = &output.verdict {
            if self.last_status != Some(verdict.status) {
                match verdict.level {
                    posture::Level::Bad => warn!(
                        message = "posture",
                        status = verdict.status.label(),
                        advice = %verdict.advice,
                    ),
                    posture::Level::Warning => info!(
                        message = "posture",
                        status = verdict.status.label(),
                        advice = %verdict.advice,
                    ),
                    posture::Level::Good => info!(
                        message = "posture",
                        status = verdict.status.label(),
                    ),
                }
                self.last_status = Some(verdict.status);
            }
        }

        match output.rep {
            Some(RepUpdate::Counted { reps }) => info!(message = "repetition counted", reps),
            Some(RepUpdate::Suppressed { reps }) => {
                debug!(
                    message = "repetition suppressed inside refractory window",
                    reps
                )
            }
            _ => {}
        }

        if let Some(summary) = &output.balance_summary {
            info!(
                message = "balance test finished",
                frames = summary.frames,
                average_balance = summary.average_balance,
            );
        }

        if let Some(pb) = &self.pb {
            let mut message = format!(
                "FPS => pipeline: {:.1}, stream: {:.1} | {} | {} ({}%)",
                nframes as f64 / timing.processing.as_secs_f64(),
                nframes as f64 / stream_elapsed.as_secs_f64(),
                report::format_duration(stream_elapsed),
                position.label(),
                output.classification.confidence,
            );
            if let Some(verdict) = &output.verdict {
                message.push_str(&format!(" | posture {}", verdict.status.label()));
            }
            if let Some(RepUpdate::Tracking { phase, reps }) = output.rep {
                message.push_str(&format!(" | {} ({} reps)", phase.label(), reps));
            }
            if let Some(metrics) = &output.metrics {
                message.push_str(&format!(" | {}", metrics_text(metrics)));
            }
            if let Some(remaining) = output.balance_remaining {
                message.push_str(&format!(" | balance test {}s left", remaining.as_secs()));
            }
            pb.set_message(message);
            pb.inc(1);
        }
    }
}

fn metrics_text(metrics: &ModeMetrics) -> String {
    match metrics {
        ModeMetrics::Posture(record) => {
            format!("score {} (grade {})", record.score, record.grade.label())
        }
        ModeMetrics::FallRisk(assessment) => format!(
            "fall risk {} ({}), balance {}",
            assessment.record.fall_risk,
            assessment.tier.label(),
            assessment.record.balance_score,
        ),
        ModeMetrics::Scoliosis(metrics) => format!(
            "cobb {:.1}, trunk rotation {:.1}, {}",
            metrics.cobb_angle,
            metrics.trunk_rotation,
            metrics.finding.label(),
        ),
        ModeMetrics::Therapy {
            accuracy,
            exercises,
        } => format!("{} exercises at {:.0}% form", exercises, accuracy),
    }
}

fn main() -> Result<()> {
    let Opt {
        input,
        threshold,
        coordinate_scale,
        log_level,
        show_progress,
        count_reps,
        balance_test,
        capture_label,
        sample_every,
        export_session,
        export_samples,
        patient_name,
        patient_id,
        mode,
    } = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(log_level),
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let running_ctrl_c = running.clone();

    ctrlc::set_handler(move || {
        running_ctrl_c.store(false, Ordering::SeqCst);
    })
    .context("failed setting Ctrl-C handler")?;

    let mut source =
        source::JsonlSource::open(&input, coordinate_scale).context("failed opening pose stream")?;

    let now = Instant::now();
    let mut engine =
        Engine::new(mode, count_reps, now).with_sample_capture(capture_label, sample_every);

    if let assess::Mode::Therapy = mode {
        engine
            .start_therapy_session(now)
            .context("failed starting therapy session")?;
        info!("therapy session started");
    }
    if balance_test {
        engine
            .start_balance_test(now)
            .context("failed starting balance test")?;
        info!("balance test started");
    }

    let pb = if show_progress {
        Some(
            ProgressBar::new_spinner().with_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                    .template("{prefix:.bold.dim} {spinner} {wide_msg}"),
            ),
        )
    } else {
        None
    };

    let started = Instant::now();
    let mut presenter = Presenter::new(pb);

    let run_error = loop {
        if !running.load(Ordering::SeqCst) {
            info!("stop requested; ending run");
            break None;
        }

        match source.next_pose() {
            Ok(Some(frame)) => {
                // a stop that arrived while the estimator call was
                // outstanding discards its result
                if !running.load(Ordering::SeqCst) {
                    trace!("discarding frame read after stop request");
                    info!("stop requested; ending run");
                    break None;
                }
                if frame.score < threshold {
                    trace!(message = "skipping low-score pose", score = frame.score);
                    continue;
                }
                let output = engine.process(&frame, Instant::now());
                presenter.render(&output, engine.timing, started.elapsed(), engine.frame_num());
            }
            Ok(None) => {
                info!("pose stream ended");
                break None;
            }
            Err(e) => {
                let kind = e.failure_kind();
                error!(
                    message = "pose estimation failed; stopping the run",
                    error = %e,
                    kind = ?kind,
                );
                info!(message = "recovery hint", hint = kind.recovery_hint());
                break Some(e);
            }
        }
    };

    finish(
        mode,
        &mut engine,
        export_session.as_deref(),
        export_samples.as_deref(),
        patient_name,
        patient_id,
    )?;

    info!(
        message = "run complete",
        frames = engine.frame_num(),
        reps = engine.reps(),
    );

    match run_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// End-of-run teardown: exports first (so a still-open therapy
/// session is included), then session close-out and reports.
fn finish(
    mode: assess::Mode,
    engine: &mut Engine,
    export_session: Option<&std::path::Path>,
    export_samples: Option<&std::path::Path>,
    patient_name: Option<String>,
    patient_id: Option<String>,
) -> Result<()> {
    let now = Instant::now();

    if let Some(path) = export_session {
        let patient = report::PatientInfo {
            name: patient_name,
            id: patient_id,
        };
        let elapsed = engine.context().elapsed(now);
        let export = report::session_export(engine.context(), patient, engine.reps(), elapsed);
        report::write_session_export(path, &export).context("failed writing session export")?;
        info!(message = "session export written", path = ?path);
    }

    if let Some(path) = export_samples {
        match report::write_training_samples(path, &engine.context().samples) {
            Ok(()) => info!(message = "training samples written", path = ?path),
            Err(error::Error::NoSamples) => {
                warn!("no training samples were captured; nothing to export")
            }
            Err(e) => return Err(e).context("failed writing training samples"),
        }
    }

    if engine.context().therapy_session().is_some() {
        let summary = engine
            .end_therapy_session(now)
            .context("failed ending therapy session")?;
        println!("{}", report::therapy_report(&summary));
    }

    if let assess::Mode::PostureScore = mode {
        match report::posture_report(engine.context()) {
            Ok(text) => println!("{}", text),
            Err(e) => warn!(message = "no posture report", reason = %e),
        }
    }

    Ok(())
}
