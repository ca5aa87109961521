//! Rotations in the `(x1, x2)` plane of a `dim`-dimensional space.

use nalgebra::{DMatrix, Rotation2, Vector2};
use sg_core::{Error, Result};

/// `dim × dim` matrix rotating the first two axes by `degrees`, identity elsewhere.
///
/// A zero angle is accepted for any `dim ≥ 1` and yields the identity.
pub fn plane_rotation(dim: usize, degrees: f64) -> Result<DMatrix<f64>> {
    if dim == 0 {
        return Err(Error::Validation("dimension must be > 0".into()));
    }
    if !degrees.is_finite() {
        return Err(Error::Validation(format!("rotation angle must be finite, got {}", degrees)));
    }
    let mut m = DMatrix::<f64>::identity(dim, dim);
    if degrees == 0.0 {
        return Ok(m);
    }
    if dim < 2 {
        return Err(Error::Validation(format!(
            "a rotation of {} degrees needs at least 2 dimensions, got {}",
            degrees, dim
        )));
    }
    let r = Rotation2::new(degrees.to_radians());
    m.view_mut((0, 0), (2, 2)).copy_from(r.matrix());
    Ok(m)
}

/// Rotate `(point[0], point[1])` in place.
///
/// # Panics
/// Panics if `point` has fewer than two coordinates.
#[inline]
pub fn rotate_in_plane(rotation: &Rotation2<f64>, point: &mut [f64]) {
    let v = rotation * Vector2::new(point[0], point[1]);
    point[0] = v.x;
    point[1] = v.y;
}
