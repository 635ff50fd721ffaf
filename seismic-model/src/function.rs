use crate::error::{ModelError, Result};
use crate::grid::{DType, Grid, PhysicalDomain};
use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, IxDyn, Slice, Zip};
use rayon::prelude::*;

/// Raw constructor input for a physical quantity.
///
/// Arrays cover the physical (interior) domain only; padding happens
/// when the value is written into a [`Function`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Scalar(f64),
    Array(ArrayD<f64>),
}

impl ParameterValue {
    pub fn is_array(&self) -> bool {
        matches!(self, ParameterValue::Array(_))
    }

    pub fn max(&self) -> f64 {
        match self {
            ParameterValue::Scalar(v) => *v,
            ParameterValue::Array(a) => parallel_max(a.view()),
        }
    }

    /// Apply `f` element-wise, keeping the representation
    pub fn map(&self, f: impl Fn(f64) -> f64) -> ParameterValue {
        match self {
            ParameterValue::Scalar(v) => ParameterValue::Scalar(f(*v)),
            ParameterValue::Array(a) => ParameterValue::Array(a.mapv(f)),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Scalar(_) => "uniform",
            ParameterValue::Array(_) => "spatially-varying",
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Scalar(v)
    }
}

impl From<ArrayD<f64>> for ParameterValue {
    fn from(a: ArrayD<f64>) -> Self {
        ParameterValue::Array(a)
    }
}

/// Named scalar valid over the whole domain
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    value: f64,
    dtype: DType,
}

impl Constant {
    pub fn new(name: &str, value: f64, dtype: DType) -> Self {
        Self {
            name: name.to_string(),
            value: dtype.cast(value),
            dtype,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set(&mut self, value: f64) {
        self.value = self.dtype.cast(value);
    }
}

/// Array-backed field on a grid, with stencil halo around the padded domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    /// Per-axis (left, right) halo widths
    pub halo: Vec<(usize, usize)>,
    pub space_order: usize,
    dtype: DType,
    data: ArrayD<f64>,
}

impl Function {
    /// Zeroed field with a symmetric halo of `space_order` points per side
    pub fn new(name: &str, grid: &Grid, space_order: usize) -> Self {
        let halo = vec![(space_order, space_order); grid.dim()];
        let mut f = Self::with_halo(name, grid, halo);
        f.space_order = space_order;
        f
    }

    /// Zeroed field with an arbitrary, possibly asymmetric halo
    pub fn with_halo(name: &str, grid: &Grid, halo: Vec<(usize, usize)>) -> Self {
        let shape: Vec<usize> = grid
            .shape
            .iter()
            .zip(&halo)
            .map(|(&n, &(l, r))| n + l + r)
            .collect();
        let space_order = halo.iter().map(|&(l, r)| l.max(r)).max().unwrap_or(0);

        Self {
            name: name.to_string(),
            halo,
            space_order,
            dtype: grid.dtype,
            data: ArrayD::zeros(IxDyn(&shape)),
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Shape of the full storage, halo included
    pub fn shape_with_halo(&self) -> &[usize] {
        self.data.shape()
    }

    /// Shape of the padded grid, halo excluded
    pub fn shape(&self) -> Vec<usize> {
        self.data
            .shape()
            .iter()
            .zip(&self.halo)
            .map(|(&n, &(l, r))| n - l - r)
            .collect()
    }

    pub fn data_with_halo(&self) -> ArrayViewD<'_, f64> {
        self.data.view()
    }

    pub fn data_with_halo_mut(&mut self) -> ArrayViewMutD<'_, f64> {
        self.data.view_mut()
    }

    /// Padded-grid view with the halo stripped
    pub fn data(&self) -> ArrayViewD<'_, f64> {
        let mut view = self.data.view();
        view.slice_each_axis_inplace(|ax| {
            let (l, r) = self.halo[ax.axis.index()];
            Slice::from(l..ax.len - r)
        });
        view
    }

    /// Physical-domain view (halo and boundary layer stripped)
    pub fn interior(&self, domain: &PhysicalDomain) -> ArrayViewD<'_, f64> {
        domain.slice(self.data())
    }

    /// Replace the whole storage; values are rounded through the field precision
    pub(crate) fn set_storage(&mut self, data: ArrayD<f64>) -> Result<()> {
        if data.shape() != self.data.shape() {
            return Err(ModelError::ShapeMismatch {
                field: self.name.clone(),
                expected: self.data.shape().to_vec(),
                actual: data.shape().to_vec(),
            });
        }
        let dtype = self.dtype;
        self.data = data.mapv_into(|v| dtype.cast(v));
        Ok(())
    }

    pub fn max(&self) -> f64 {
        parallel_max(self.data.view())
    }

    pub fn min(&self) -> f64 {
        self.data
            .par_iter()
            .copied()
            .reduce(|| f64::INFINITY, f64::min)
    }
}

/// A physical quantity that is either uniform or spatially varying.
///
/// The representation is chosen at construction and never changes.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalField {
    Uniform(Constant),
    Varying(Function),
}

impl PhysicalField {
    pub fn name(&self) -> &str {
        match self {
            PhysicalField::Uniform(c) => &c.name,
            PhysicalField::Varying(f) => &f.name,
        }
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self, PhysicalField::Uniform(_))
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            PhysicalField::Varying(f) => Some(f),
            PhysicalField::Uniform(_) => None,
        }
    }

    /// Uniform value, if the field is uniform
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PhysicalField::Uniform(c) => Some(c.value()),
            PhysicalField::Varying(_) => None,
        }
    }

    pub fn max(&self) -> f64 {
        match self {
            PhysicalField::Uniform(c) => c.value(),
            PhysicalField::Varying(f) => f.max(),
        }
    }

    pub fn min(&self) -> f64 {
        match self {
            PhysicalField::Uniform(c) => c.value(),
            PhysicalField::Varying(f) => f.min(),
        }
    }

    /// Value at a padded-grid index (halo excluded)
    pub fn value_at(&self, index: &[usize]) -> Option<f64> {
        match self {
            PhysicalField::Uniform(c) => Some(c.value()),
            PhysicalField::Varying(f) => f.data().get(index).copied(),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            PhysicalField::Uniform(_) => "uniform",
            PhysicalField::Varying(_) => "spatially-varying",
        }
    }

    /// Operand form used by derived-field arithmetic
    pub(crate) fn value(&self) -> FieldValue {
        match self {
            PhysicalField::Uniform(c) => FieldValue::Scalar(c.value()),
            PhysicalField::Varying(f) => FieldValue::Array(f.data.clone()),
        }
    }
}

/// Intermediate result of element-wise arithmetic over field storage.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldValue {
    Scalar(f64),
    Array(ArrayD<f64>),
}

impl FieldValue {
    /// Combine two operands element-wise, broadcasting scalars
    pub fn zip_with<F>(&self, other: &FieldValue, f: F) -> Result<FieldValue>
    where
        F: Fn(f64, f64) -> f64 + Sync + Send,
    {
        Ok(match (self, other) {
            (FieldValue::Scalar(a), FieldValue::Scalar(b)) => FieldValue::Scalar(f(*a, *b)),
            (FieldValue::Array(a), FieldValue::Scalar(b)) => {
                FieldValue::Array(a.mapv(|x| f(x, *b)))
            }
            (FieldValue::Scalar(a), FieldValue::Array(b)) => {
                FieldValue::Array(b.mapv(|y| f(*a, y)))
            }
            (FieldValue::Array(a), FieldValue::Array(b)) => {
                if a.shape() != b.shape() {
                    return Err(ModelError::ShapeMismatch {
                        field: "operand".to_string(),
                        expected: a.shape().to_vec(),
                        actual: b.shape().to_vec(),
                    });
                }
                FieldValue::Array(Zip::from(a).and(b).par_map_collect(|&x, &y| f(x, y)))
            }
        })
    }

    /// Wrap the result as a named field; arrays must already match the halo'd storage shape
    pub fn into_field(
        self,
        name: &str,
        grid: &Grid,
        halo: Vec<(usize, usize)>,
    ) -> Result<PhysicalField> {
        match self {
            FieldValue::Scalar(v) => Ok(PhysicalField::Uniform(Constant::new(name, v, grid.dtype))),
            FieldValue::Array(a) => {
                let mut function = Function::with_halo(name, grid, halo);
                function.set_storage(a)?;
                Ok(PhysicalField::Varying(function))
            }
        }
    }
}

pub(crate) fn parallel_max(data: ArrayViewD<'_, f64>) -> f64 {
    data.into_par_iter()
        .copied()
        .reduce(|| f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::IxDyn;

    fn grid_2d() -> Grid {
        Grid::new(
            vec![30.0, 20.0],
            vec![4, 3],
            vec![0.0, 0.0],
            DType::Float64,
            PhysicalDomain::new(&[2, 1], 1),
        )
        .unwrap()
    }

    #[test]
    fn test_function_storage_includes_halo() {
        let grid = grid_2d();
        let f = Function::new("f", &grid, 2);
        assert_eq!(f.shape_with_halo(), &[8, 7]);
        assert_eq!(f.shape(), vec![4, 3]);
        assert_eq!(f.data().shape(), &[4, 3]);
    }

    #[test]
    fn test_asymmetric_halo() {
        let grid = grid_2d();
        let f = Function::with_halo("f", &grid, vec![(1, 2), (0, 3)]);
        assert_eq!(f.shape_with_halo(), &[7, 6]);
        assert_eq!(f.shape(), vec![4, 3]);
        assert_eq!(f.space_order, 3);
    }

    #[test]
    fn test_set_storage_rejects_wrong_shape() {
        let grid = grid_2d();
        let mut f = Function::new("f", &grid, 0);
        let err = f.set_storage(ArrayD::zeros(IxDyn(&[3, 3]))).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_constant_rounds_to_dtype() {
        let mut c = Constant::new("c", 0.1, DType::Float32);
        assert_eq!(c.value(), 0.1_f32 as f64);
        c.set(2.5);
        assert_eq!(c.value(), 2.5);
    }

    #[test]
    fn test_zip_with_broadcasts_scalars() {
        let a = FieldValue::Array(ArrayD::from_elem(IxDyn(&[2, 2]), 3.0));
        let b = FieldValue::Scalar(2.0);
        match a.zip_with(&b, |x, y| x - y).unwrap() {
            FieldValue::Array(r) => assert!(r.iter().all(|&v| v == 1.0)),
            FieldValue::Scalar(_) => panic!("expected array"),
        }
        match b.zip_with(&FieldValue::Scalar(4.0), |x, y| x * y).unwrap() {
            FieldValue::Scalar(v) => assert_relative_eq!(v, 8.0),
            FieldValue::Array(_) => panic!("expected scalar"),
        }
    }

    #[test]
    fn test_zip_with_array_shape_mismatch() {
        let a = FieldValue::Array(ArrayD::zeros(IxDyn(&[2, 2])));
        let b = FieldValue::Array(ArrayD::zeros(IxDyn(&[3, 2])));
        assert!(a.zip_with(&b, |x, y| x + y).is_err());
    }

    #[test]
    fn test_physical_field_extrema() {
        let grid = grid_2d();
        let mut f = Function::new("vp", &grid, 0);
        let data = ArrayD::from_shape_fn(IxDyn(&[4, 3]), |idx| (idx[0] + idx[1]) as f64);
        f.set_storage(data).unwrap();
        let field = PhysicalField::Varying(f);
        assert_eq!(field.max(), 5.0);
        assert_eq!(field.min(), 0.0);
        assert_eq!(field.value_at(&[1, 2]), Some(3.0));
        assert!(!field.is_uniform());

        let uniform = PhysicalField::Uniform(Constant::new("vp", 1.5, DType::Float64));
        assert_eq!(uniform.max(), 1.5);
        assert_eq!(uniform.as_scalar(), Some(1.5));
    }
}
