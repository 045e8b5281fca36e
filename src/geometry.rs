//! Per-frame geometric features. Every function here is a pure
//! function of its arguments; callers gate on landmark availability
//! before computing, so nothing in this module can fail.

use crate::point::Point;

/// Angle in degrees at `vertex` between the arms `vertex -> p` and
/// `vertex -> q`. Returns 0 when either arm has zero length. The
/// cosine is clamped to [-1, 1] before the arc-cosine so collinear
/// arms cannot drift out of domain.
pub(crate) fn angle_between(p: Point, vertex: Point, q: Point) -> f32 {
    let a = p - vertex;
    let b = q - vertex;
    let norms = a.norm() * b.norm();
    if norms == 0.0 {
        return 0.0;
    }
    (a.dot(b) / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

pub(crate) fn vertical_slope(a: Point, b: Point) -> f32 {
    (a.y() - b.y()).abs()
}

pub(crate) fn horizontal_offset(a: Point, b: Point) -> f32 {
    (a.x() - b.x()).abs()
}

/// Angle in degrees of the line from `a` to `b`, via `atan2`.
pub(crate) fn line_angle(a: Point, b: Point) -> f32 {
    (b.y() - a.y()).atan2(b.x() - a.x()).to_degrees()
}
