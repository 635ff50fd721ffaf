//! Embedding of interior-only data into padded field storage.
//!
//! Raw geophysical arrays only cover the physical domain. Before they can
//! drive a stencil they are extended outward across the absorbing layer and
//! the field's halo. The default policy replicates the nearest interior
//! value, so the medium looks laterally homogeneous inside the boundary.

use crate::error::{ModelError, Result};
use crate::function::Function;
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use tracing::debug;

/// How values outside the supplied data are filled
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PadMode {
    /// Repeat the nearest edge value outward
    #[default]
    Edge,
    /// Fill with a fixed value
    Constant(f64),
}

/// Pad `data` by per-axis (before, after) widths.
pub fn pad(data: ArrayViewD<'_, f64>, widths: &[(usize, usize)], mode: PadMode) -> ArrayD<f64> {
    debug_assert_eq!(widths.len(), data.ndim(), "one pad width per axis");
    let src_shape = data.shape().to_vec();
    let shape: Vec<usize> = src_shape
        .iter()
        .zip(widths)
        .map(|(&n, &(l, r))| n + l + r)
        .collect();

    let mut src_index = vec![0usize; src_shape.len()];
    ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
        let mut outside = false;
        for axis in 0..src_shape.len() {
            let (before, _) = widths[axis];
            let i = idx[axis];
            src_index[axis] = if i < before {
                outside = true;
                0
            } else if i - before >= src_shape[axis] {
                outside = true;
                src_shape[axis] - 1
            } else {
                i - before
            };
        }
        match mode {
            PadMode::Constant(value) if outside => value,
            _ => data[src_index.as_slice()],
        }
    })
}

/// Write interior-only `data` into the full storage of `function`.
///
/// Every axis is padded by `nbpml` plus that side's halo width, so after
/// the call the boundary layer and halo are populated as well.
pub fn initialize_function(
    function: &mut Function,
    data: ArrayViewD<'_, f64>,
    nbpml: usize,
    mode: PadMode,
) -> Result<()> {
    let expected: Vec<usize> = function.shape().iter().map(|&n| n.saturating_sub(2 * nbpml)).collect();
    if data.shape() != expected.as_slice() || data.is_empty() {
        return Err(ModelError::ShapeMismatch {
            field: function.name.clone(),
            expected,
            actual: data.shape().to_vec(),
        });
    }

    let widths: Vec<(usize, usize)> = function
        .halo
        .iter()
        .map(|&(l, r)| (nbpml + l, nbpml + r))
        .collect();
    debug!(field = %function.name, ?widths, ?mode, "initializing field storage");

    function.set_storage(pad(data, &widths, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{DType, Grid, PhysicalDomain};
    use ndarray::{array, Array1};

    #[test]
    #[should_panic(expected = "one pad width per axis")]
    fn test_pad_width_count_must_match_rank() {
        let data = ArrayD::<f64>::zeros(IxDyn(&[3, 3]));
        pad(data.view(), &[(1, 1)], PadMode::Edge);
    }

    #[test]
    fn test_edge_padding_repeats_boundary_values() {
        let data = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
        let padded = pad(data.view(), &[(1, 1), (2, 0)], PadMode::Edge);
        assert_eq!(padded.shape(), &[4, 4]);
        assert_eq!(padded[[0, 0]], 1.0);
        assert_eq!(padded[[0, 3]], 2.0);
        assert_eq!(padded[[1, 2]], 1.0);
        assert_eq!(padded[[2, 3]], 4.0);
        assert_eq!(padded[[3, 0]], 3.0);
    }

    #[test]
    fn test_constant_padding() {
        let data = Array1::from(vec![5.0, 6.0]).into_dyn();
        let padded = pad(data.view(), &[(2, 1)], PadMode::Constant(-1.0));
        assert_eq!(padded.as_slice().unwrap(), &[-1.0, -1.0, 5.0, 6.0, -1.0]);
    }

    #[test]
    fn test_initialize_function_pads_boundary_and_halo() {
        let nbpml = 2;
        let interior = [3, 2];
        let grid = Grid::new(
            vec![60.0, 50.0],
            vec![7, 6],
            vec![-20.0, -20.0],
            DType::Float64,
            PhysicalDomain::new(&interior, nbpml),
        )
        .unwrap();
        let mut f = Function::new("vp", &grid, 1);
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]].into_dyn();

        initialize_function(&mut f, data.view(), nbpml, PadMode::Edge).unwrap();

        assert_eq!(f.shape_with_halo(), &[9, 8]);
        // Corner of the storage holds the corner interior value
        assert_eq!(f.data_with_halo()[[0, 0]], 1.0);
        assert_eq!(f.data_with_halo()[[8, 7]], 6.0);
        assert_eq!(f.interior(&grid.physical_domain), data.view());
    }

    #[test]
    fn test_initialize_function_rejects_wrong_shape() {
        let grid = Grid::new(
            vec![40.0],
            vec![5],
            vec![0.0],
            DType::Float64,
            PhysicalDomain::new(&[3], 1),
        )
        .unwrap();
        let mut f = Function::new("vp", &grid, 2);
        let data = Array1::from(vec![1.0, 2.0]).into_dyn();
        let err = initialize_function(&mut f, data.view(), 1, PadMode::Edge).unwrap_err();
        assert_eq!(
            err,
            ModelError::ShapeMismatch {
                field: "vp".to_string(),
                expected: vec![3],
                actual: vec![2],
            }
        );
    }
}
