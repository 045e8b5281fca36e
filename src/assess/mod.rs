//! Medical assessment modules. Exactly one runs per frame, selected
//! by the subcommand on the CLI; the balance test additionally forces
//! the fall-risk module while it is active.

pub(crate) mod fall_risk;
pub(crate) mod posture_score;
pub(crate) mod scoliosis;
pub(crate) mod therapy;

#[derive(Debug, Copy, Clone, structopt::StructOpt)]
pub(crate) enum Mode {
    /// Grade posture and log a scored assessment per frame
    PostureScore,
    /// Score standing balance and fall risk from sway and stance width
    FallRisk,
    /// Screen for lateral spine asymmetry
    Scoliosis(scoliosis::Options),
    /// Track a physical-therapy session with repetition counting
    Therapy,
    /// Classify position and grade posture without a medical module
    Monitor,
}
