//! Absorbing boundary layer profile.
//!
//! The damping coefficient ramps up over `nbpml` points towards every face
//! of the padded grid following
//!
//! d(pos) = C · (pos − sin(2π·pos) / 2π),   C = 1.5 · ln(1/0.001) / 40
//!
//! where `pos` goes from `1/nbpml` on the innermost boundary row to 1 on the
//! outermost. The ramp has zero slope at both ends. Contributions from
//! different axes add up, so corners absorb more than edges.
//!
//! In mask mode the profile is subtracted from 1 instead of added to 0 and is
//! used to taper material properties toward the boundary.

use crate::error::Result;
use crate::function::Function;
use crate::grid::Grid;
use crate::padding::{initialize_function, pad, PadMode};
use ndarray::{ArrayD, Axis, IxDyn};
use std::f64::consts::PI;
use tracing::debug;

/// Reference reflection coefficient of the layer
const REFLECTION: f64 = 0.001;

/// Base damping coefficient C
pub fn damping_coefficient() -> f64 {
    1.5 * (1.0 / REFLECTION).ln() / 40.0
}

/// Profile increment for the boundary row at distance `d` (0 = outermost) from a face
pub fn profile_value(d: usize, nbpml: usize) -> f64 {
    let j = (d + 1) as f64;
    let pos = ((nbpml as f64 - j + 1.0) / nbpml as f64).abs();
    damping_coefficient() * (pos - (2.0 * PI * pos).sin() / (2.0 * PI))
}

/// Raw damping profile over the padded shape `interior + 2*nbpml`.
pub fn damping_profile(interior: &[usize], nbpml: usize, spacing: &[f64], mask: bool) -> ArrayD<f64> {
    debug_assert_eq!(spacing.len(), interior.len(), "one spacing per axis");
    let base = ArrayD::from_elem(IxDyn(interior), if mask { 1.0 } else { 0.0 });
    let widths = vec![(nbpml, nbpml); interior.len()];
    let mut damp = pad(base.view(), &widths, PadMode::Edge);

    for d in 0..nbpml {
        let mut val = profile_value(d, nbpml);
        if mask {
            val = -val;
        }
        for (axis, &h) in spacing.iter().enumerate() {
            let n = damp.len_of(Axis(axis));
            damp.index_axis_mut(Axis(axis), d)
                .mapv_inplace(|v| v + val / h);
            damp.index_axis_mut(Axis(axis), n - 1 - d)
                .mapv_inplace(|v| v + val / h);
        }
    }
    damp
}

/// Build the damping field for `grid`.
///
/// The profile already contains the boundary layer, so it is written with
/// no extra padding and no halo.
pub fn damp_boundary(grid: &Grid, nbpml: usize, spacing: &[f64], mask: bool) -> Result<Function> {
    let interior = grid.physical_domain.shape();
    debug!(nbpml, mask, ?interior, "synthesizing damping profile");

    let profile = damping_profile(&interior, nbpml, spacing, mask);
    let mut damp = Function::new("damp", grid, 0);
    initialize_function(&mut damp, profile.view(), 0, PadMode::Edge)?;
    Ok(damp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{DType, PhysicalDomain};
    use approx::assert_relative_eq;

    #[test]
    fn test_coefficient() {
        assert_relative_eq!(damping_coefficient(), 1.5 * 1000f64.ln() / 40.0);
    }

    #[test]
    fn test_outermost_row_is_full_ramp() {
        // pos = 1 on the outermost row, sin(2π) = 0
        assert_relative_eq!(profile_value(0, 10), damping_coefficient(), epsilon = 1e-12);
        assert!(profile_value(9, 10) < profile_value(0, 10));
    }

    #[test]
    fn test_profile_is_monotonic_toward_face() {
        let nbpml = 8;
        for d in 1..nbpml {
            assert!(profile_value(d, nbpml) < profile_value(d - 1, nbpml));
        }
    }

    #[test]
    fn test_1d_profile_values() {
        let damp = damping_profile(&[4], 3, &[2.0], false);
        assert_eq!(damp.len(), 10);
        for d in 0..3 {
            let expected = profile_value(d, 3) / 2.0;
            assert_relative_eq!(damp[[d]], expected, epsilon = 1e-12);
            assert_relative_eq!(damp[[9 - d]], expected, epsilon = 1e-12);
        }
        for i in 3..7 {
            assert_eq!(damp[[i]], 0.0);
        }
    }

    #[test]
    fn test_corners_accumulate() {
        let damp = damping_profile(&[3, 3], 2, &[1.0, 4.0], false);
        let edge_x = profile_value(0, 2);
        let edge_z = profile_value(0, 2) / 4.0;
        assert_relative_eq!(damp[[0, 3]], edge_x, epsilon = 1e-12);
        assert_relative_eq!(damp[[3, 0]], edge_z, epsilon = 1e-12);
        assert_relative_eq!(damp[[0, 0]], edge_x + edge_z, epsilon = 1e-12);
        assert_relative_eq!(damp[[6, 6]], edge_x + edge_z, epsilon = 1e-12);
    }

    #[test]
    fn test_mask_interior_is_one() {
        let damp = damping_profile(&[4, 5], 3, &[10.0, 10.0], true);
        assert_eq!(damp[[3, 3]], 1.0);
        assert_eq!(damp[[6, 7]], 1.0);
        assert!(damp[[0, 4]] < 1.0);
    }

    #[test]
    #[should_panic(expected = "one spacing per axis")]
    fn test_spacing_count_must_match_rank() {
        damping_profile(&[3, 3], 2, &[1.0], false);
    }

    #[test]
    fn test_zero_width_layer() {
        let damp = damping_profile(&[3, 2], 0, &[1.0, 1.0], false);
        assert_eq!(damp.shape(), &[3, 2]);
        assert!(damp.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_damp_boundary_has_no_halo() {
        let nbpml = 4;
        let grid = Grid::new(
            vec![110.0, 90.0],
            vec![12, 10],
            vec![-40.0, -40.0],
            DType::Float64,
            PhysicalDomain::new(&[4, 2], nbpml),
        )
        .unwrap();
        let damp = damp_boundary(&grid, nbpml, &[10.0, 10.0], false).unwrap();
        assert_eq!(damp.shape_with_halo(), &[12, 10]);
        assert!(damp.interior(&grid.physical_domain).iter().all(|&v| v == 0.0));
        assert_relative_eq!(damp.data()[[0, 5]], profile_value(0, nbpml) / 10.0, epsilon = 1e-12);
    }
}
