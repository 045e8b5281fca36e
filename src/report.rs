//! Report text and export documents. The pipeline produces these
//! verbatim; writing them anywhere is the caller's concern except for
//! the two file helpers at the bottom.

use crate::{
    assess::{fall_risk::FallRiskRecord, posture_score::PostureRecord, scoliosis::ScoliosisReading},
    error::Error,
    session::{SessionContext, TherapySession, TherapySummary, TrainingSample},
};
use chrono::{DateTime, Utc};
use std::{fs::File, io::Write, path::Path, time::Duration};

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m {:02}s", secs / 60, secs % 60)
}

/// Plain-text posture report from the latest posture-score record.
/// Rejected while the history is empty.
pub(crate) fn posture_report(ctx: &SessionContext) -> Result<String, Error> {
    let latest = ctx
        .posture_history
        .last()
        .ok_or(Error::EmptyHistory("posture"))?;

    let mut recommendations = Vec::new();
    if latest.shoulder_slope > 25.0 {
        recommendations.push("- Level your shoulders; check your desk and monitor height.");
    }
    if latest.head_deviation > 30.0 {
        recommendations.push("- Practice chin tucks to bring your head back over your shoulders.");
    }
    if latest.spine_deviation > 40.0 {
        recommendations.push("- Strengthen your core to keep your spine stacked over your hips.");
    }
    if recommendations.is_empty() {
        recommendations.push("- Posture is in good shape. Keep it up.");
    }

    Ok(format!(
        "POSTURE ASSESSMENT REPORT\n\
         Generated: {}\n\
         \n\
         MEASUREMENTS\n\
         Score: {} (grade {})\n\
         Shoulder slope: {:.1}\n\
         Head deviation: {:.1}\n\
         Spine deviation: {:.1}\n\
         \n\
         RECOMMENDATIONS\n\
         {}\n",
        latest.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        latest.score,
        latest.grade.label(),
        latest.shoulder_slope,
        latest.head_deviation,
        latest.spine_deviation,
        recommendations.join("\n"),
    ))
}

/// Plain-text summary of a finished therapy session.
pub(crate) fn therapy_report(summary: &TherapySummary) -> String {
    let mut lines = Vec::new();
    if summary.exercises_completed > 10 {
        lines.push("- Strong session volume. Consider progressing the difficulty.");
    }
    if summary.form_accuracy > 80.0 {
        lines.push("- Form accuracy is on target. Keep the current level.");
    }
    if summary.exercises_completed < 5 {
        lines.push("- Low repetition count. Aim for at least five next session.");
    }
    if lines.is_empty() {
        lines.push("- Solid session. Keep the routine going.");
    }

    format!(
        "PT SESSION REPORT\n\
         Duration: {}\n\
         Exercises completed: {}\n\
         Form accuracy: {:.0}%\n\
         \n\
         RECOMMENDATIONS\n\
         {}\n",
        format_duration(summary.duration),
        summary.exercises_completed,
        summary.form_accuracy,
        lines.join("\n"),
    )
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub(crate) struct PatientInfo {
    pub(crate) name: Option<String>,
    pub(crate) id: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub(crate) struct SummaryStats {
    pub(crate) pose_count: usize,
    pub(crate) exercise_count: u32,
    pub(crate) average_confidence: f64,
}

/// The structured end-of-run export: header, summary stats, the three
/// assessment histories and any open therapy session.
#[derive(Debug, serde::Serialize)]
pub(crate) struct SessionExport<'a> {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) duration: String,
    pub(crate) patient: PatientInfo,
    pub(crate) summary: SummaryStats,
    pub(crate) posture_history: &'a [PostureRecord],
    pub(crate) fall_risk_history: &'a [FallRiskRecord],
    pub(crate) scoliosis_readings: &'a [ScoliosisReading],
    pub(crate) therapy_session: Option<&'a TherapySession>,
}

pub(crate) fn session_export<'a>(
    ctx: &'a SessionContext,
    patient: PatientInfo,
    exercise_count: u32,
    elapsed: Duration,
) -> SessionExport<'a> {
    SessionExport {
        timestamp: Utc::now(),
        duration: format_duration(elapsed),
        patient,
        summary: SummaryStats {
            pose_count: ctx.pose_count(),
            exercise_count,
            average_confidence: ctx.average_confidence(),
        },
        posture_history: &ctx.posture_history,
        fall_risk_history: &ctx.fall_risk_history,
        scoliosis_readings: &ctx.scoliosis_readings,
        therapy_session: ctx.therapy_session(),
    }
}

pub(crate) fn write_session_export<P>(path: P, export: &SessionExport<'_>) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| Error::WriteArtifact(e, "session export", path.to_path_buf()))?;
    serde_json::to_writer_pretty(file, export).map_err(Error::SerializeExport)
}

/// Write captured training samples, one JSON record per line.
pub(crate) fn write_training_samples<P>(path: P, samples: &[TrainingSample]) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    if samples.is_empty() {
        return Err(Error::NoSamples);
    }
    let path = path.as_ref();
    let mut file = File::create(path)
        .map_err(|e| Error::WriteArtifact(e, "training samples", path.to_path_buf()))?;
    for sample in samples {
        let line = serde_json::to_string(sample).map_err(Error::SerializeSample)?;
        writeln!(file, "{}", line)
            .map_err(|e| Error::WriteArtifact(e, "training samples", path.to_path_buf()))?;
    }
    Ok(())
}
