//! Systematic operators.
//!
//! A systematic is a deterministic perturbation applied to the biased copy of
//! a dataset. Point transforms act on the `(x1, x2)` plane; the box filter
//! acts on the original and biased frames together so they keep the same
//! rows.
//!
//! Operators are assembled into a [`SystematicChain`] that always applies
//! them as Rotation → Translation → Scaling, with the box filter last.

use nalgebra::Rotation2;
use sg_core::{Error, PointSet, Result};
use sg_prob::geometry::rotate_in_plane;

use crate::frame::LabeledFrame;
use crate::settings::SystematicSpec;

/// A deterministic map from points to biased points.
pub trait PointTransform {
    /// Operator name as spelled in settings.
    fn name(&self) -> &'static str;

    /// Return the transformed copy of `points`.
    fn apply_systematics(&self, points: &PointSet) -> Result<PointSet>;
}

// ---------------------------------------------------------------------------
// Point transforms
// ---------------------------------------------------------------------------

/// Shift of the first two axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    shift: [f64; 2],
}

impl Translation {
    /// Shift by `magnitude` in direction `alpha_degrees`.
    pub fn from_polar(magnitude: f64, alpha_degrees: f64) -> Self {
        let a = alpha_degrees.to_radians();
        Self { shift: [magnitude * a.cos(), magnitude * a.sin()] }
    }

    /// Shift vector in the `(x1, x2)` plane.
    pub fn shift(&self) -> [f64; 2] {
        self.shift
    }
}

impl PointTransform for Translation {
    fn name(&self) -> &'static str {
        "Translation"
    }

    fn apply_systematics(&self, points: &PointSet) -> Result<PointSet> {
        let mut out = points.clone();
        for row in out.rows_mut() {
            for (x, dx) in row.iter_mut().zip(self.shift) {
                *x += dx;
            }
        }
        Ok(out)
    }
}

/// Stretch of the first two axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaling {
    factor: f64,
}

impl Scaling {
    /// `None` unless `factor > 1`.
    pub fn from_factor(factor: f64) -> Option<Self> {
        (factor > 1.0).then_some(Self { factor })
    }

    /// Scale factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl PointTransform for Scaling {
    fn name(&self) -> &'static str {
        "Scaling"
    }

    fn apply_systematics(&self, points: &PointSet) -> Result<PointSet> {
        let mut out = points.clone();
        for row in out.rows_mut() {
            for x in row.iter_mut().take(2) {
                *x *= self.factor;
            }
        }
        Ok(out)
    }
}

/// Rotation of the `(x1, x2)` plane about the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    degrees: f64,
    rotation: Rotation2<f64>,
}

impl Rotation {
    /// `None` for a zero angle.
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        (degrees != 0.0).then(|| Self { degrees, rotation: Rotation2::new(degrees.to_radians()) })
    }

    /// Angle in degrees.
    pub fn degrees(&self) -> f64 {
        self.degrees
    }
}

impl PointTransform for Rotation {
    fn name(&self) -> &'static str {
        "Rotation"
    }

    fn apply_systematics(&self, points: &PointSet) -> Result<PointSet> {
        if points.dim() < 2 {
            return Err(Error::Validation(format!(
                "Rotation needs at least 2 dimensions, got {}",
                points.dim()
            )));
        }
        let mut out = points.clone();
        for row in out.rows_mut() {
            rotate_in_plane(&self.rotation, row);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Box filter
// ---------------------------------------------------------------------------

/// Axis-aligned cube of side `length` centered on `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxFilter {
    center: Vec<f64>,
    half_length: f64,
}

impl BoxFilter {
    /// `None` unless `length > 1`.
    pub fn from_length(center: Vec<f64>, length: f64) -> Option<Self> {
        (length > 1.0).then_some(Self { center, half_length: length / 2.0 })
    }

    /// Cube center.
    pub fn center(&self) -> &[f64] {
        &self.center
    }

    /// Side length.
    pub fn length(&self) -> f64 {
        2.0 * self.half_length
    }

    /// `true` when every coordinate of `row` is within half a side of the center.
    pub fn contains(&self, row: &[f64]) -> bool {
        row.iter().zip(&self.center).all(|(x, c)| (x - c).abs() <= self.half_length)
    }

    /// Keep the rows inside the box in both frames.
    ///
    /// Row `i` survives only if it is inside the box in `original` and in
    /// `biased`, so the two outputs always have the same length.
    pub fn apply_systematics(
        &self,
        original: &LabeledFrame,
        biased: &LabeledFrame,
    ) -> Result<(LabeledFrame, LabeledFrame)> {
        if original.len() != biased.len() {
            return Err(Error::Validation(format!(
                "Box needs frames of equal length, got {} and {}",
                original.len(),
                biased.len()
            )));
        }
        for frame in [original, biased] {
            if frame.dim() != self.center.len() {
                return Err(Error::Validation(format!(
                    "Box center has {} coordinates, frame has {}",
                    self.center.len(),
                    frame.dim()
                )));
            }
        }
        let mask: Vec<bool> = original
            .points()
            .rows()
            .zip(biased.points().rows())
            .map(|(a, b)| self.contains(a) && self.contains(b))
            .collect();
        Ok((original.retain_mask(&mask)?, biased.retain_mask(&mask)?))
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// The configured systematics, at most one operator per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystematicChain {
    rotation: Option<Rotation>,
    translation: Option<Translation>,
    scaling: Option<Scaling>,
    box_filter: Option<BoxFilter>,
}

impl SystematicChain {
    /// Build the chain from settings descriptors.
    ///
    /// For repeated kinds the last enabling descriptor wins. Disabling
    /// descriptors (`scaling_factor <= 1`, `rotation_degree == 0`,
    /// `box_l <= 1`) are skipped.
    pub fn from_specs(specs: &[SystematicSpec], box_center: &[f64], dim: usize) -> Result<Self> {
        let mut chain = Self::default();
        for spec in specs {
            match *spec {
                SystematicSpec::Translation { z_magnitude, alpha } => {
                    check_finite("Translation z_magnitude", z_magnitude)?;
                    check_finite("Translation alpha", alpha)?;
                    chain.translation = Some(Translation::from_polar(z_magnitude, alpha));
                }
                SystematicSpec::Scaling { scaling_factor } => {
                    check_finite("Scaling scaling_factor", scaling_factor)?;
                    if let Some(s) = Scaling::from_factor(scaling_factor) {
                        chain.scaling = Some(s);
                    }
                }
                SystematicSpec::Rotation { rotation_degree } => {
                    check_finite("Rotation rotation_degree", rotation_degree)?;
                    if let Some(r) = Rotation::from_degrees(rotation_degree) {
                        if dim < 2 {
                            return Err(Error::Validation(format!(
                                "Rotation needs problem_dimension >= 2, got {dim}"
                            )));
                        }
                        chain.rotation = Some(r);
                    }
                }
                SystematicSpec::Box { box_l } => {
                    check_finite("Box box_l", box_l)?;
                    if let Some(b) = BoxFilter::from_length(box_center.to_vec(), box_l) {
                        chain.box_filter = Some(b);
                    }
                }
            }
        }
        Ok(chain)
    }

    /// Point transforms in application order.
    pub fn transforms(&self) -> Vec<&dyn PointTransform> {
        let mut out: Vec<&dyn PointTransform> = Vec::with_capacity(3);
        if let Some(r) = &self.rotation {
            out.push(r);
        }
        if let Some(t) = &self.translation {
            out.push(t);
        }
        if let Some(s) = &self.scaling {
            out.push(s);
        }
        out
    }

    /// Apply Rotation, Translation and Scaling (whichever are configured).
    pub fn apply(&self, points: &PointSet) -> Result<PointSet> {
        let mut out = points.clone();
        for t in self.transforms() {
            log::debug!("applying {} to {} points", t.name(), out.n_rows());
            out = t.apply_systematics(&out)?;
        }
        Ok(out)
    }

    /// The box filter, if configured.
    pub fn box_filter(&self) -> Option<&BoxFilter> {
        self.box_filter.as_ref()
    }

    /// Names of the configured operators in application order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.transforms().iter().map(|t| t.name()).collect();
        if self.box_filter.is_some() {
            names.push("Box");
        }
        names
    }

    /// `true` when no operator is configured.
    pub fn is_empty(&self) -> bool {
        self.rotation.is_none()
            && self.translation.is_none()
            && self.scaling.is_none()
            && self.box_filter.is_none()
    }
}

fn check_finite(what: &str, v: f64) -> Result<()> {
    if !v.is_finite() {
        return Err(Error::Validation(format!("{what} must be finite, got {v}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use sg_core::Label;

    fn points(rows: &[[f64; 3]]) -> PointSet {
        PointSet::from_rows(3, &rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_translation_shifts_first_two_axes() {
        let t = Translation::from_polar(1.0, 90.0);
        let out = t.apply_systematics(&points(&[[0.0, 0.0, 7.0]])).unwrap();
        assert_relative_eq!(out.row(0)[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.row(0)[1], 1.0, epsilon = 1e-12);
        assert_eq!(out.row(0)[2], 7.0);
    }

    #[test]
    fn test_translation_in_one_dimension() {
        let t = Translation::from_polar(2.0, 0.0);
        let p = PointSet::from_flat(1, vec![1.0, -1.0]).unwrap();
        assert_eq!(t.apply_systematics(&p).unwrap().as_slice(), &[3.0, 1.0]);
    }

    #[test]
    fn test_scaling_only_above_one() {
        assert!(Scaling::from_factor(1.0).is_none());
        assert!(Scaling::from_factor(0.5).is_none());
        let s = Scaling::from_factor(2.0).unwrap();
        let out = s.apply_systematics(&points(&[[1.0, -2.0, 3.0]])).unwrap();
        assert_eq!(out.row(0), &[2.0, -4.0, 3.0]);
    }

    #[test]
    fn test_rotation_quarter_turn_and_dim_check() {
        assert!(Rotation::from_degrees(0.0).is_none());
        let r = Rotation::from_degrees(90.0).unwrap();
        let out = r.apply_systematics(&points(&[[1.0, 0.0, 4.0]])).unwrap();
        assert_relative_eq!(out.row(0)[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.row(0)[1], 1.0, epsilon = 1e-12);
        assert_eq!(out.row(0)[2], 4.0);
        assert_eq!(r.name(), "Rotation");

        let one_d = PointSet::from_flat(1, vec![1.0]).unwrap();
        assert!(matches!(r.apply_systematics(&one_d), Err(Error::Validation(_))));
    }

    #[test]
    fn test_box_keeps_rows_inside_both_frames() {
        let b = BoxFilter::from_length(vec![0.0, 0.0], 2.0).unwrap();
        let orig = LabeledFrame::uniform(
            PointSet::from_flat(2, vec![0.0, 0.0, 0.5, 0.5, 3.0, 0.0, 1.0, 1.0]).unwrap(),
            Label::Signal,
            1.0,
        );
        let biased = LabeledFrame::uniform(
            PointSet::from_flat(2, vec![0.1, 0.1, 2.0, 0.5, 0.0, 0.0, -1.0, 1.0]).unwrap(),
            Label::Background,
            1.0,
        );
        let (o, bi) = b.apply_systematics(&orig, &biased).unwrap();
        // Row 1 leaves the box in the biased frame, row 2 in the original.
        assert_eq!(o.len(), 2);
        assert_eq!(bi.len(), 2);
        assert_eq!(o.points().as_slice(), &[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(bi.points().as_slice(), &[0.1, 0.1, -1.0, 1.0]);
    }

    #[test]
    fn test_box_disabled_at_or_below_one() {
        assert!(BoxFilter::from_length(vec![0.0], 1.0).is_none());
        assert!(BoxFilter::from_length(vec![0.0], 1.5).is_some());
    }

    #[test]
    fn test_chain_order_and_last_enabling_wins() {
        let specs = vec![
            SystematicSpec::Scaling { scaling_factor: 3.0 },
            SystematicSpec::Translation { z_magnitude: 1.0, alpha: 0.0 },
            SystematicSpec::Rotation { rotation_degree: 90.0 },
            SystematicSpec::Scaling { scaling_factor: 2.0 },
            SystematicSpec::Scaling { scaling_factor: 0.5 },
            SystematicSpec::Box { box_l: 0.5 },
        ];
        let chain = SystematicChain::from_specs(&specs, &[0.0, 0.0], 2).unwrap();
        assert_eq!(chain.names(), vec!["Rotation", "Translation", "Scaling"]);
        assert!(chain.box_filter().is_none());

        // (1, 0) -> rotate -> (0, 1) -> translate -> (1, 1) -> scale x2 -> (2, 2)
        let p = PointSet::from_flat(2, vec![1.0, 0.0]).unwrap();
        let out = chain.apply(&p).unwrap();
        assert_relative_eq!(out.row(0)[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(out.row(0)[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_chain_rejects_bad_parameters() {
        let nan = vec![SystematicSpec::Translation { z_magnitude: f64::NAN, alpha: 0.0 }];
        assert!(SystematicChain::from_specs(&nan, &[0.0], 1).is_err());
        let rot = vec![SystematicSpec::Rotation { rotation_degree: 10.0 }];
        assert!(SystematicChain::from_specs(&rot, &[0.0], 1).is_err());
        // A disabled rotation is fine in 1-D.
        let off = vec![SystematicSpec::Rotation { rotation_degree: 0.0 }];
        assert!(SystematicChain::from_specs(&off, &[0.0], 1).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_rotation_then_inverse_restores(
            deg in -360.0f64..360.0,
            x in -10.0f64..10.0,
            y in -10.0f64..10.0,
        ) {
            prop_assume!(deg != 0.0);
            let p = PointSet::from_flat(2, vec![x, y]).unwrap();
            let fwd = Rotation::from_degrees(deg).unwrap().apply_systematics(&p).unwrap();
            let back = Rotation::from_degrees(-deg).unwrap().apply_systematics(&fwd).unwrap();
            prop_assert!((back.row(0)[0] - x).abs() < 1e-9);
            prop_assert!((back.row(0)[1] - y).abs() < 1e-9);
        }

        #[test]
        fn prop_box_outputs_are_inside_and_aligned(
            l in 1.01f64..4.0,
            coords in proptest::collection::vec(-3.0f64..3.0, 2..80),
        ) {
            let n = coords.len() / 2;
            let a = PointSet::from_flat(2, coords[..2 * n].to_vec()).unwrap();
            let shifted: Vec<f64> = coords[..2 * n].iter().map(|v| v + 0.7).collect();
            let b = PointSet::from_flat(2, shifted).unwrap();
            let bf = BoxFilter::from_length(vec![0.0, 0.0], l).unwrap();
            let (o, bi) = bf
                .apply_systematics(
                    &LabeledFrame::uniform(a, Label::Signal, 1.0),
                    &LabeledFrame::uniform(b, Label::Signal, 1.0),
                )
                .unwrap();
            prop_assert_eq!(o.len(), bi.len());
            for (ra, rb) in o.points().rows().zip(bi.points().rows()) {
                prop_assert!(bf.contains(ra));
                prop_assert!(bf.contains(rb));
            }
        }
    }
}
