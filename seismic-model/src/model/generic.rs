use crate::damping::damp_boundary;
use crate::error::{ModelError, Result};
use crate::function::{Constant, Function, ParameterValue, PhysicalField};
use crate::grid::{DType, Grid, PhysicalDomain};
use crate::padding::{initialize_function, PadMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default absorbing layer thickness in grid points
pub const DEFAULT_NBPML: usize = 40;

/// Physical domain description before the boundary layer is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    pub origin: Vec<f64>,
    pub spacing: Vec<f64>,
    pub shape: Vec<usize>,
    pub nbpml: usize,
    pub dtype: DType,
}

impl GridParams {
    pub fn new(shape: Vec<usize>, spacing: Vec<f64>) -> Self {
        let origin = vec![0.0; shape.len()];
        Self {
            origin,
            spacing,
            shape,
            nbpml: DEFAULT_NBPML,
            dtype: DType::default(),
        }
    }

    pub fn with_origin(mut self, origin: Vec<f64>) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_nbpml(mut self, nbpml: usize) -> Self {
        self.nbpml = nbpml;
        self
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.origin.len() != self.spacing.len() || self.spacing.len() != self.shape.len() {
            return Err(ModelError::Configuration(format!(
                "origin, spacing and shape must have the same length (origin={}, spacing={}, shape={})",
                self.origin.len(),
                self.spacing.len(),
                self.shape.len()
            )));
        }
        if self.shape.is_empty() || self.shape.len() > 3 {
            return Err(ModelError::Configuration(format!(
                "models are 1, 2 or 3 dimensional, got {} axes",
                self.shape.len()
            )));
        }
        if self.shape.contains(&0) {
            return Err(ModelError::Configuration(format!(
                "grid shape must be positive, got {:?}",
                self.shape
            )));
        }
        if self.spacing.iter().any(|&h| h <= 0.0 || !h.is_finite()) {
            return Err(ModelError::Configuration(format!(
                "grid spacing must be positive, got {:?}",
                self.spacing
            )));
        }
        Ok(())
    }

    /// Per-axis point count including the boundary layer
    pub fn padded_shape(&self) -> Vec<usize> {
        self.shape.iter().map(|&n| n + 2 * self.nbpml).collect()
    }

    /// Physical coordinate of the first boundary-layer point
    pub fn padded_origin(&self) -> Vec<f64> {
        self.origin
            .iter()
            .zip(&self.spacing)
            .map(|(&o, &h)| o - h * self.nbpml as f64)
            .collect()
    }

    /// Physical size of the padded domain
    pub fn extent(&self) -> Vec<f64> {
        self.padded_shape()
            .iter()
            .zip(&self.spacing)
            .map(|(&n, &h)| h * (n - 1) as f64)
            .collect()
    }
}

/// Geometry shared by every model variant: the padded grid and its
/// physical-domain selector.
#[derive(Debug, Clone)]
pub struct GenericModel {
    pub shape: Vec<usize>,
    pub nbpml: usize,
    origin: Vec<f64>,
    spacing: Vec<f64>,
    pub grid: Grid,
}

impl GenericModel {
    /// Build the padded grid, or check `grid` against it when one is supplied.
    pub fn new(params: &GridParams, grid: Option<Grid>) -> Result<Self> {
        params.validate()?;

        let shape_pml = params.padded_shape();
        let origin_pml = params.padded_origin();
        let extent = params.extent();
        let physical_domain = PhysicalDomain::new(&params.shape, params.nbpml);

        let grid = match grid {
            Some(grid) => {
                if grid.shape != shape_pml {
                    return Err(ModelError::GridMismatch(format!(
                        "grid shape {:?} differs from padded model shape {:?}",
                        grid.shape, shape_pml
                    )));
                }
                let extent_matches = grid.extent.len() == extent.len()
                    && grid
                        .extent
                        .iter()
                        .zip(&extent)
                        .all(|(&a, &b)| close(a, b));
                if !extent_matches {
                    return Err(ModelError::GridMismatch(format!(
                        "grid extent {:?} differs from padded model extent {:?}",
                        grid.extent, extent
                    )));
                }
                if grid.physical_domain != physical_domain {
                    return Err(ModelError::GridMismatch(format!(
                        "grid interior {:?} differs from model interior {:?}",
                        grid.physical_domain.ranges, physical_domain.ranges
                    )));
                }
                let origin_matches = grid.origin.len() == origin_pml.len()
                    && grid
                        .origin
                        .iter()
                        .zip(&origin_pml)
                        .all(|(&a, &b)| close(a, b));
                if !origin_matches {
                    return Err(ModelError::GridMismatch(format!(
                        "grid origin {:?} differs from padded model origin {:?}",
                        grid.origin, origin_pml
                    )));
                }
                grid
            }
            None => Grid::new(extent, shape_pml, origin_pml, params.dtype, physical_domain)?,
        };
        debug!(shape = ?grid.shape, extent = ?grid.extent, nbpml = params.nbpml, "padded grid ready");

        Ok(Self {
            shape: params.shape.clone(),
            nbpml: params.nbpml,
            origin: params.origin.clone(),
            spacing: params.spacing.clone(),
            grid,
        })
    }

    pub fn dim(&self) -> usize {
        self.shape.len()
    }

    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// Origin of the physical domain (first interior point)
    pub fn origin(&self) -> &[f64] {
        &self.origin
    }

    /// Physical size of the domain, boundary layer excluded
    pub fn domain_size(&self) -> Vec<f64> {
        self.shape
            .iter()
            .zip(&self.spacing)
            .map(|(&n, &h)| h * (n - 1) as f64)
            .collect()
    }

    /// Shape of the padded computational domain
    pub fn shape_domain(&self) -> &[usize] {
        &self.grid.shape
    }

    pub fn physical_domain(&self) -> &PhysicalDomain {
        &self.grid.physical_domain
    }

    pub fn dtype(&self) -> DType {
        self.grid.dtype
    }

    pub(crate) fn damp(&self, mask: bool) -> Result<Function> {
        damp_boundary(&self.grid, self.nbpml, &self.spacing, mask)
    }

    /// Turn a constructor input into a field on this grid.
    ///
    /// Scalars become uniform constants, arrays are padded into a function
    /// with a `space_order` halo.
    pub(crate) fn field(
        &self,
        name: &str,
        value: &ParameterValue,
        space_order: usize,
    ) -> Result<PhysicalField> {
        match value {
            ParameterValue::Scalar(v) => Ok(PhysicalField::Uniform(Constant::new(name, *v, self.dtype()))),
            ParameterValue::Array(data) => {
                let mut function = Function::new(name, &self.grid, space_order);
                self.write_array(&mut function, data)?;
                Ok(PhysicalField::Varying(function))
            }
        }
    }

    pub(crate) fn write_array(&self, function: &mut Function, data: &ndarray::ArrayD<f64>) -> Result<()> {
        if data.shape() != self.shape.as_slice() {
            return Err(ModelError::ShapeMismatch {
                field: function.name.clone(),
                expected: self.shape.clone(),
                actual: data.shape().to_vec(),
            });
        }
        initialize_function(function, data.view(), self.nbpml, PadMode::Edge)
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{ArrayD, IxDyn};

    fn params() -> GridParams {
        GridParams::new(vec![101, 51], vec![10.0, 20.0])
            .with_origin(vec![0.0, 100.0])
            .with_nbpml(10)
            .with_dtype(DType::Float64)
    }

    #[test]
    fn test_padded_geometry() {
        let p = params();
        assert_eq!(p.padded_shape(), vec![121, 71]);
        assert_eq!(p.padded_origin(), vec![-100.0, -100.0]);
        assert_eq!(p.extent(), vec![1200.0, 1400.0]);

        let model = GenericModel::new(&p, None).unwrap();
        assert_eq!(model.shape_domain(), &[121, 71]);
        assert_eq!(model.domain_size(), vec![1000.0, 1000.0]);
        assert_relative_eq!(model.grid.spacing[0], 10.0, epsilon = 1e-12);
        assert_relative_eq!(model.grid.spacing[1], 20.0, epsilon = 1e-12);
        assert_eq!(model.physical_domain().ranges, vec![10..111, 10..61]);
    }

    #[test]
    fn test_length_mismatch_is_configuration_error() {
        let p = params().with_origin(vec![0.0]);
        assert!(matches!(p.validate(), Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_non_positive_spacing_rejected() {
        let p = GridParams::new(vec![10, 10], vec![10.0, 0.0]);
        assert!(matches!(
            GenericModel::new(&p, None),
            Err(ModelError::Configuration(_))
        ));
        let p = GridParams::new(vec![10, 0], vec![10.0, 10.0]);
        assert!(matches!(
            GenericModel::new(&p, None),
            Err(ModelError::Configuration(_))
        ));
    }

    #[test]
    fn test_external_grid_must_match() {
        let p = params();
        let local = GenericModel::new(&p, None).unwrap().grid;
        assert!(GenericModel::new(&p, Some(local.clone())).is_ok());

        let other = GenericModel::new(&p.clone().with_nbpml(5), None).unwrap().grid;
        assert!(matches!(
            GenericModel::new(&p, Some(other)),
            Err(ModelError::GridMismatch(_))
        ));

        let stretched = GenericModel::new(
            &GridParams::new(vec![101, 51], vec![11.0, 20.0])
                .with_nbpml(10)
                .with_dtype(DType::Float64),
            None,
        )
        .unwrap()
        .grid;
        assert!(matches!(
            GenericModel::new(&p, Some(stretched)),
            Err(ModelError::GridMismatch(_))
        ));
    }

    #[test]
    fn test_external_grid_interior_and_origin_must_match() {
        let p = params();
        let local = GenericModel::new(&p, None).unwrap().grid;

        let with_domain = |domain: PhysicalDomain| {
            Grid::new(
                local.extent.clone(),
                local.shape.clone(),
                local.origin.clone(),
                DType::Float64,
                domain,
            )
            .unwrap()
        };

        // Same padded shape, different interior / boundary split
        let resplit = with_domain(PhysicalDomain::new(&[103, 53], 9));
        assert!(matches!(
            GenericModel::new(&p, Some(resplit)),
            Err(ModelError::GridMismatch(_))
        ));

        // Right interior size, shifted to the corner
        let shifted = with_domain(PhysicalDomain::new(&[101, 51], 0));
        assert!(matches!(
            GenericModel::new(&p, Some(shifted)),
            Err(ModelError::GridMismatch(_))
        ));

        let moved = Grid::new(
            local.extent.clone(),
            local.shape.clone(),
            vec![0.0, 0.0],
            DType::Float64,
            local.physical_domain.clone(),
        )
        .unwrap();
        assert!(matches!(
            GenericModel::new(&p, Some(moved)),
            Err(ModelError::GridMismatch(_))
        ));
    }

    #[test]
    fn test_field_from_array_checks_shape() {
        let model = GenericModel::new(&params(), None).unwrap();
        let bad = ParameterValue::Array(ArrayD::zeros(IxDyn(&[100, 51])));
        assert!(matches!(
            model.field("vp", &bad, 2),
            Err(ModelError::ShapeMismatch { .. })
        ));

        let good = ParameterValue::Array(ArrayD::from_elem(IxDyn(&[101, 51]), 1.5));
        let field = model.field("vp", &good, 2).unwrap();
        let f = field.as_function().unwrap();
        assert_eq!(f.shape_with_halo(), &[125, 75]);
        assert!(f.data_with_halo().iter().all(|&v| v == 1.5));
    }
}
