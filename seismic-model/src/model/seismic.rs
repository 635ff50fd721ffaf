use super::generic::{GenericModel, GridParams};
use super::truncate_dt;
use crate::error::{ModelError, Result};
use crate::function::{Constant, Function, ParameterValue, PhysicalField};
use crate::grid::{Grid, PhysicalDomain};
use std::fmt;
use tracing::{debug, warn};

/// Default finite-difference order (sets the field halo)
pub const DEFAULT_SPACE_ORDER: usize = 8;

/// Non-fatal notes produced while building a model
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// An azimuth angle was supplied to a model with fewer than three axes
    AzimuthIgnored { dim: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::AzimuthIgnored { dim } => write!(
                f,
                "{}D TTI does not use an azimuth angle phi, ignoring input",
                dim
            ),
        }
    }
}

/// Builder for an isotropic or tilted transverse isotropic [`Model`].
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    params: GridParams,
    velocity: ParameterValue,
    epsilon: Option<ParameterValue>,
    delta: Option<ParameterValue>,
    theta: Option<ParameterValue>,
    phi: Option<ParameterValue>,
    space_order: usize,
    grid: Option<Grid>,
}

impl ModelBuilder {
    /// Thomsen epsilon
    pub fn epsilon(mut self, epsilon: impl Into<ParameterValue>) -> Self {
        self.epsilon = Some(epsilon.into());
        self
    }

    /// Thomsen delta
    pub fn delta(mut self, delta: impl Into<ParameterValue>) -> Self {
        self.delta = Some(delta.into());
        self
    }

    /// Tilt angle (radians)
    pub fn theta(mut self, theta: impl Into<ParameterValue>) -> Self {
        self.theta = Some(theta.into());
        self
    }

    /// Azimuth angle (radians), 3D only
    pub fn phi(mut self, phi: impl Into<ParameterValue>) -> Self {
        self.phi = Some(phi.into());
        self
    }

    pub fn space_order(mut self, space_order: usize) -> Self {
        self.space_order = space_order;
        self
    }

    /// Reuse an existing grid instead of building one
    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn build(self) -> Result<Model> {
        let generic = GenericModel::new(&self.params, self.grid)?;
        let so = self.space_order;
        let mut diagnostics = Vec::new();

        check_velocity(&self.velocity)?;
        let m = slowness_squared(&generic, &self.velocity, so)?;
        let damp = generic.damp(false)?;

        // Anisotropy is stored in the form the TTI stencils consume
        let epsilon = match &self.epsilon {
            Some(e) => generic.field("epsilon", &e.map(|e| 1.0 + 2.0 * e), so)?,
            None => uniform(&generic, "epsilon", 1.0),
        };
        let delta = match &self.delta {
            Some(d) => generic.field("delta", &d.map(|d| (1.0 + 2.0 * d).sqrt()), so)?,
            None => uniform(&generic, "delta", 1.0),
        };
        let theta = match &self.theta {
            Some(t) => generic.field("theta", t, so)?,
            None => uniform(&generic, "theta", 0.0),
        };
        let phi = match &self.phi {
            Some(p) if generic.dim() == 3 => generic.field("phi", p, so)?,
            Some(_) => {
                let diagnostic = Diagnostic::AzimuthIgnored { dim: generic.dim() };
                warn!("{}", diagnostic);
                diagnostics.push(diagnostic);
                uniform(&generic, "phi", 0.0)
            }
            None => uniform(&generic, "phi", 0.0),
        };

        // Anisotropy speeds waves up by sqrt(1 + 2*epsilon)
        let scale = match &epsilon {
            PhysicalField::Varying(f) if f.max() > 0.0 => f.max().sqrt(),
            _ => 1.0,
        };

        let model = Model {
            generic,
            damp,
            velocity: self.velocity,
            m,
            epsilon,
            delta,
            theta,
            phi,
            scale,
            space_order: so,
            diagnostics,
        };
        debug!(
            dim = model.dim(),
            scale = model.scale,
            critical_dt = model.critical_dt(),
            "seismic model built"
        );
        Ok(model)
    }
}

/// Acoustic / TTI earth model.
///
/// Owns the squared slowness `m`, the optional Thomsen parameters and
/// tilt angles, and the absorbing layer `damp`.
#[derive(Debug, Clone)]
pub struct Model {
    generic: GenericModel,
    damp: Function,
    velocity: ParameterValue,
    m: PhysicalField,
    epsilon: PhysicalField,
    delta: PhysicalField,
    theta: PhysicalField,
    phi: PhysicalField,
    scale: f64,
    space_order: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Model {
    /// Start building a model; `velocity` is in km/s over the physical domain
    pub fn builder(params: GridParams, velocity: impl Into<ParameterValue>) -> ModelBuilder {
        ModelBuilder {
            params,
            velocity: velocity.into(),
            epsilon: None,
            delta: None,
            theta: None,
            phi: None,
            space_order: DEFAULT_SPACE_ORDER,
            grid: None,
        }
    }

    /// Isotropic model
    pub fn new(params: GridParams, velocity: impl Into<ParameterValue>) -> Result<Self> {
        Self::builder(params, velocity).build()
    }

    /// Replace the velocity and recompute the squared slowness.
    ///
    /// The new value must use the same representation as the old one.
    pub fn set_velocity(&mut self, velocity: impl Into<ParameterValue>) -> Result<()> {
        let velocity = velocity.into();
        check_velocity(&velocity)?;

        match (&mut self.m, &velocity) {
            (PhysicalField::Uniform(c), ParameterValue::Scalar(v)) => c.set(1.0 / (v * v)),
            (PhysicalField::Varying(f), ParameterValue::Array(vp)) => {
                self.generic.write_array(f, &vp.mapv(|v| 1.0 / (v * v)))?
            }
            (m, requested) => {
                return Err(ModelError::RepresentationMismatch {
                    field: m.name().to_string(),
                    existing: m.kind(),
                    requested: requested.kind(),
                })
            }
        }
        self.velocity = velocity;
        debug!(critical_dt = self.critical_dt(), "velocity reassigned");
        Ok(())
    }

    /// Largest stable time step, truncated down to three decimals
    pub fn critical_dt(&self) -> f64 {
        let coeff = if self.dim() == 3 { 0.38 } else { 0.42 };
        let h_min = self.spacing().iter().copied().fold(f64::INFINITY, f64::min);
        truncate_dt(coeff * h_min / (self.scale * self.velocity.max()))
    }

    pub fn velocity(&self) -> &ParameterValue {
        &self.velocity
    }

    /// Squared slowness 1/vp²
    pub fn m(&self) -> &PhysicalField {
        &self.m
    }

    pub fn epsilon(&self) -> &PhysicalField {
        &self.epsilon
    }

    pub fn delta(&self) -> &PhysicalField {
        &self.delta
    }

    pub fn theta(&self) -> &PhysicalField {
        &self.theta
    }

    pub fn phi(&self) -> &PhysicalField {
        &self.phi
    }

    pub fn damp(&self) -> &Function {
        &self.damp
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn space_order(&self) -> usize {
        self.space_order
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Material fields in a fixed order
    pub fn fields(&self) -> [&PhysicalField; 5] {
        [&self.m, &self.epsilon, &self.delta, &self.theta, &self.phi]
    }

    pub fn field(&self, name: &str) -> Option<&PhysicalField> {
        self.fields().into_iter().find(|f| f.name() == name)
    }

    pub fn geometry(&self) -> &GenericModel {
        &self.generic
    }

    pub fn grid(&self) -> &Grid {
        &self.generic.grid
    }

    pub fn dim(&self) -> usize {
        self.generic.dim()
    }

    pub fn spacing(&self) -> &[f64] {
        self.generic.spacing()
    }

    pub fn domain_size(&self) -> Vec<f64> {
        self.generic.domain_size()
    }

    pub fn physical_domain(&self) -> &PhysicalDomain {
        self.generic.physical_domain()
    }
}

fn uniform(generic: &GenericModel, name: &str, value: f64) -> PhysicalField {
    PhysicalField::Uniform(Constant::new(name, value, generic.dtype()))
}

fn slowness_squared(
    generic: &GenericModel,
    velocity: &ParameterValue,
    space_order: usize,
) -> Result<PhysicalField> {
    generic.field("m", &velocity.map(|v| 1.0 / (v * v)), space_order)
}

fn check_velocity(velocity: &ParameterValue) -> Result<()> {
    let valid = match velocity {
        ParameterValue::Scalar(v) => *v > 0.0 && v.is_finite(),
        ParameterValue::Array(a) => !a.is_empty() && a.iter().all(|&v| v > 0.0 && v.is_finite()),
    };
    if valid {
        Ok(())
    } else {
        Err(ModelError::Configuration(
            "velocity must be positive and finite everywhere".to_string(),
        ))
    }
}
