use crate::error::{ModelError, Result};
use ndarray::{ArrayViewD, ArrayViewMutD, Slice};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Floating precision of the model fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    #[default]
    Float32,
    Float64,
}

impl DType {
    /// Round a value through the storage precision
    pub fn cast(&self, value: f64) -> f64 {
        match self {
            DType::Float32 => value as f32 as f64,
            DType::Float64 => value,
        }
    }
}

/// Index ranges of the physical (non-boundary) region of a padded array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalDomain {
    pub ranges: Vec<Range<usize>>,
}

impl PhysicalDomain {
    /// Interior of a grid padded by `nbpml` points on every face
    pub fn new(shape: &[usize], nbpml: usize) -> Self {
        let ranges = shape.iter().map(|&n| nbpml..nbpml + n).collect();
        Self { ranges }
    }

    pub fn shape(&self) -> Vec<usize> {
        self.ranges.iter().map(|r| r.end - r.start).collect()
    }

    /// Restrict a padded-grid view to the physical domain
    pub fn slice<'a>(&self, mut data: ArrayViewD<'a, f64>) -> ArrayViewD<'a, f64> {
        data.slice_each_axis_inplace(|ax| self.axis_slice(ax.axis.index()));
        data
    }

    pub fn slice_mut<'a>(&self, mut data: ArrayViewMutD<'a, f64>) -> ArrayViewMutD<'a, f64> {
        data.slice_each_axis_inplace(|ax| self.axis_slice(ax.axis.index()));
        data
    }

    fn axis_slice(&self, axis: usize) -> Slice {
        let r = &self.ranges[axis];
        Slice::from(r.start..r.end)
    }
}

/// Structured storage grid covering the padded computational domain.
///
/// All extents, shapes and origins here include the boundary layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub shape: Vec<usize>,
    pub extent: Vec<f64>,
    pub origin: Vec<f64>,
    pub spacing: Vec<f64>,
    pub dtype: DType,
    pub physical_domain: PhysicalDomain,
}

impl Grid {
    pub fn new(
        extent: Vec<f64>,
        shape: Vec<usize>,
        origin: Vec<f64>,
        dtype: DType,
        physical_domain: PhysicalDomain,
    ) -> Result<Self> {
        if extent.len() != shape.len()
            || origin.len() != shape.len()
            || physical_domain.ranges.len() != shape.len()
        {
            return Err(ModelError::Configuration(format!(
                "grid dimensions disagree (extent={}, shape={}, origin={}, domain={})",
                extent.len(),
                shape.len(),
                origin.len(),
                physical_domain.ranges.len()
            )));
        }
        if shape.contains(&0) {
            return Err(ModelError::Configuration(format!(
                "grid shape must be positive, got {:?}",
                shape
            )));
        }
        for (r, &n) in physical_domain.ranges.iter().zip(&shape) {
            if r.end > n {
                return Err(ModelError::Configuration(format!(
                    "physical domain {:?} exceeds grid size {}",
                    r, n
                )));
            }
        }

        // A single-point axis has no meaningful spacing
        let spacing = extent
            .iter()
            .zip(&shape)
            .map(|(&e, &n)| if n > 1 { e / (n - 1) as f64 } else { 0.0 })
            .collect();

        Ok(Grid {
            shape,
            extent,
            origin,
            spacing,
            dtype,
            physical_domain,
        })
    }

    pub fn dim(&self) -> usize {
        self.shape.len()
    }

    /// Physical coordinate of grid index `i` along `axis`
    pub fn coord(&self, axis: usize, i: usize) -> f64 {
        self.origin[axis] + self.spacing[axis] * (i as f64)
    }

    pub fn in_bounds(&self, index: &[usize]) -> bool {
        index.len() == self.dim() && index.iter().zip(&self.shape).all(|(&i, &n)| i < n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_spacing_from_extent() {
        let grid = Grid::new(
            vec![100.0, 50.0],
            vec![11, 6],
            vec![0.0, 0.0],
            DType::Float64,
            PhysicalDomain::new(&[11, 6], 0),
        )
        .unwrap();
        assert_relative_eq!(grid.spacing[0], 10.0);
        assert_relative_eq!(grid.spacing[1], 10.0);
        assert_relative_eq!(grid.coord(1, 3), 30.0);
        assert!(grid.in_bounds(&[10, 5]));
        assert!(!grid.in_bounds(&[11, 0]));
    }

    #[test]
    fn test_dimension_disagreement_is_rejected() {
        let err = Grid::new(
            vec![100.0],
            vec![11, 6],
            vec![0.0, 0.0],
            DType::Float32,
            PhysicalDomain::new(&[11, 6], 0),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[test]
    fn test_physical_domain_slices_interior() {
        let domain = PhysicalDomain::new(&[2, 3], 2);
        assert_eq!(domain.shape(), vec![2, 3]);

        let data = ArrayD::from_shape_fn(IxDyn(&[6, 7]), |idx| (idx[0] * 10 + idx[1]) as f64);
        let interior = domain.slice(data.view());
        assert_eq!(interior.shape(), &[2, 3]);
        assert_eq!(interior[[0, 0]], 22.0);
        assert_eq!(interior[[1, 2]], 34.0);
    }

    #[test]
    fn test_float32_cast_rounds() {
        let v = 0.1_f64;
        assert_eq!(DType::Float64.cast(v), v);
        assert_eq!(DType::Float32.cast(v), 0.1_f32 as f64);
    }
}
