//! Small geometry helpers shared across the crate.

mod aabb;

pub use aabb::Aabb;

/// Wraps an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two angles in degrees, in `[0, 180]`.
#[cfg(test)]
pub(crate) fn angle_distance(a: f64, b: f64) -> f64 {
    let diff = normalize_degrees(a - b);
    diff.min(360.0 - diff)
}
