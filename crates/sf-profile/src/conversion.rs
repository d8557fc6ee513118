//! Rotation between wind-axis (lift/drag) and body-axis (normal/chordwise)
//! force coefficients.
//!
//! Chordwise force is positive toward the leading edge, so a positive
//! chordwise coefficient reduces drag.

use sf_core::deg_to_rad;

/// Normal force coefficient from lift and drag.
pub fn to_normal(cl: f64, cd: f64, alpha_deg: f64) -> f64 {
    let alpha = deg_to_rad(alpha_deg);
    cl * alpha.cos() + cd * alpha.sin()
}

/// Chordwise force coefficient from lift and drag.
pub fn to_chordwise(cl: f64, cd: f64, alpha_deg: f64) -> f64 {
    let alpha = deg_to_rad(alpha_deg);
    cl * alpha.sin() - cd * alpha.cos()
}

/// Lift coefficient from normal and chordwise coefficients.
pub fn to_lift(cn: f64, cc: f64, alpha_deg: f64) -> f64 {
    let alpha = deg_to_rad(alpha_deg);
    cn * alpha.cos() + cc * alpha.sin()
}

/// Drag coefficient from normal and chordwise coefficients.
pub fn to_drag(cn: f64, cc: f64, alpha_deg: f64) -> f64 {
    let alpha = deg_to_rad(alpha_deg);
    cn * alpha.sin() - cc * alpha.cos()
}
