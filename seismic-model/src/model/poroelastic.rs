//! Poroelastic (Biot) medium.
//!
//! Ten primary rock and fluid properties are supplied; seven secondary
//! quantities are derived from them by a fixed pipeline in which each step
//! may only read primaries and the outputs of earlier steps.

use super::generic::{GenericModel, GridParams};
use crate::error::{ModelError, Result};
use crate::function::{FieldValue, Function, ParameterValue, PhysicalField};
use crate::grid::{Grid, PhysicalDomain};
use std::collections::BTreeMap;
use std::f64::consts::SQRT_2;
use std::fmt;
use tracing::debug;

pub const DEFAULT_SPACE_ORDER: usize = 4;

/// Primary material properties of a fluid-saturated porous rock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PoroelasticParameter {
    SolidDensity,
    FluidDensity,
    DrainedBulkModulus,
    SolidBulkModulus,
    FluidBulkModulus,
    FluidViscosity,
    Porosity,
    Permeability,
    ShearModulus,
    Tortuosity,
}

impl PoroelasticParameter {
    pub const ALL: [PoroelasticParameter; 10] = [
        PoroelasticParameter::SolidDensity,
        PoroelasticParameter::FluidDensity,
        PoroelasticParameter::DrainedBulkModulus,
        PoroelasticParameter::SolidBulkModulus,
        PoroelasticParameter::FluidBulkModulus,
        PoroelasticParameter::FluidViscosity,
        PoroelasticParameter::Porosity,
        PoroelasticParameter::Permeability,
        PoroelasticParameter::ShearModulus,
        PoroelasticParameter::Tortuosity,
    ];

    /// Field name
    pub fn name(&self) -> &'static str {
        match self {
            PoroelasticParameter::SolidDensity => "rho_s",
            PoroelasticParameter::FluidDensity => "rho_f",
            PoroelasticParameter::DrainedBulkModulus => "K_dr",
            PoroelasticParameter::SolidBulkModulus => "K_s",
            PoroelasticParameter::FluidBulkModulus => "K_f",
            PoroelasticParameter::FluidViscosity => "eta",
            PoroelasticParameter::Porosity => "phi",
            PoroelasticParameter::Permeability => "kappa",
            PoroelasticParameter::ShearModulus => "G",
            PoroelasticParameter::Tortuosity => "T",
        }
    }
}

impl fmt::Display for PoroelasticParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Secondary quantities, in derivation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DerivedQuantity {
    BiotCoefficient,
    BiotModulus,
    UndrainedBulkModulus,
    BulkDensity,
    CompressionalVelocity,
    ShearVelocity,
    UndrainedLame,
}

impl DerivedQuantity {
    pub fn name(&self) -> &'static str {
        match self {
            DerivedQuantity::BiotCoefficient => "alpha",
            DerivedQuantity::BiotModulus => "M",
            DerivedQuantity::UndrainedBulkModulus => "K_u",
            DerivedQuantity::BulkDensity => "rho_b",
            DerivedQuantity::CompressionalVelocity => "vp",
            DerivedQuantity::ShearVelocity => "vs",
            DerivedQuantity::UndrainedLame => "lam_u",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DerivedQuantity::BiotCoefficient => "Biot coefficient",
            DerivedQuantity::BiotModulus => "Biot modulus",
            DerivedQuantity::UndrainedBulkModulus => "undrained bulk modulus",
            DerivedQuantity::BulkDensity => "bulk density",
            DerivedQuantity::CompressionalVelocity => "compressional velocity",
            DerivedQuantity::ShearVelocity => "shear velocity",
            DerivedQuantity::UndrainedLame => "undrained Lame parameter",
        }
    }
}

/// One stage of the derivation pipeline and the inputs it reads
#[derive(Debug, Clone, Copy)]
pub struct DerivationStep {
    pub output: DerivedQuantity,
    pub primaries: &'static [PoroelasticParameter],
    pub derived: &'static [DerivedQuantity],
}

use DerivedQuantity as D;
use PoroelasticParameter as P;

pub const DERIVATION_PIPELINE: [DerivationStep; 7] = [
    DerivationStep {
        output: D::BiotCoefficient,
        primaries: &[P::DrainedBulkModulus, P::SolidBulkModulus],
        derived: &[],
    },
    DerivationStep {
        output: D::BiotModulus,
        primaries: &[P::Porosity, P::SolidBulkModulus, P::FluidBulkModulus],
        derived: &[D::BiotCoefficient],
    },
    DerivationStep {
        output: D::UndrainedBulkModulus,
        primaries: &[P::DrainedBulkModulus],
        derived: &[D::BiotCoefficient, D::BiotModulus],
    },
    DerivationStep {
        output: D::BulkDensity,
        primaries: &[P::SolidDensity, P::FluidDensity, P::Porosity],
        derived: &[],
    },
    DerivationStep {
        output: D::CompressionalVelocity,
        primaries: &[P::ShearModulus],
        derived: &[D::UndrainedBulkModulus, D::BulkDensity],
    },
    DerivationStep {
        output: D::ShearVelocity,
        primaries: &[P::ShearModulus],
        derived: &[D::BulkDensity],
    },
    DerivationStep {
        output: D::UndrainedLame,
        primaries: &[P::ShearModulus],
        derived: &[D::UndrainedBulkModulus],
    },
];

/// Check that every step can run: its primaries are supplied and its
/// derived inputs come from earlier steps.
pub fn validate_pipeline(
    steps: &[DerivationStep],
    supplied: impl Fn(PoroelasticParameter) -> bool,
) -> Result<()> {
    let mut available: Vec<DerivedQuantity> = Vec::with_capacity(steps.len());
    for step in steps {
        if let Some(p) = step.primaries.iter().find(|&&p| !supplied(p)) {
            return Err(ModelError::MissingParameter {
                parameter: p.name().to_string(),
                required_by: step.output.description().to_string(),
            });
        }
        if let Some(d) = step.derived.iter().find(|&&d| !available.contains(&d)) {
            return Err(ModelError::Configuration(format!(
                "{} needs {} before it is derived",
                step.output.description(),
                d.description()
            )));
        }
        available.push(step.output);
    }
    Ok(())
}

fn derive(
    quantity: DerivedQuantity,
    primaries: &BTreeMap<PoroelasticParameter, FieldValue>,
    derived: &BTreeMap<DerivedQuantity, FieldValue>,
) -> Result<FieldValue> {
    let p = |k: PoroelasticParameter| {
        primaries.get(&k).ok_or_else(|| ModelError::MissingParameter {
            parameter: k.name().to_string(),
            required_by: quantity.description().to_string(),
        })
    };
    let d = |k: DerivedQuantity| {
        derived.get(&k).ok_or_else(|| {
            ModelError::Configuration(format!(
                "{} needs {} before it is derived",
                quantity.description(),
                k.description()
            ))
        })
    };

    match quantity {
        // alpha = 1 - K_dr / K_s
        D::BiotCoefficient => p(P::DrainedBulkModulus)?
            .zip_with(p(P::SolidBulkModulus)?, |k_dr, k_s| 1.0 - k_dr / k_s),
        // M = (alpha - phi) / K_s + phi / K_f
        D::BiotModulus => {
            let solid = d(D::BiotCoefficient)?
                .zip_with(p(P::Porosity)?, |alpha, phi| alpha - phi)?
                .zip_with(p(P::SolidBulkModulus)?, |x, k_s| x / k_s)?;
            let fluid = p(P::Porosity)?.zip_with(p(P::FluidBulkModulus)?, |phi, k_f| phi / k_f)?;
            solid.zip_with(&fluid, |a, b| a + b)
        }
        // K_u = K_dr + alpha^2 M
        D::UndrainedBulkModulus => {
            let coupling = d(D::BiotCoefficient)?.zip_with(d(D::BiotModulus)?, |alpha, m| alpha * alpha * m)?;
            p(P::DrainedBulkModulus)?.zip_with(&coupling, |k_dr, c| k_dr + c)
        }
        // rho_b = rho_s (1 - phi) + rho_f phi
        D::BulkDensity => {
            let solid = p(P::SolidDensity)?.zip_with(p(P::Porosity)?, |rho_s, phi| rho_s * (1.0 - phi))?;
            let fluid = p(P::FluidDensity)?.zip_with(p(P::Porosity)?, |rho_f, phi| rho_f * phi)?;
            solid.zip_with(&fluid, |a, b| a + b)
        }
        // vp = sqrt((K_u + 4G/3) / rho_b)
        D::CompressionalVelocity => d(D::UndrainedBulkModulus)?
            .zip_with(p(P::ShearModulus)?, |k_u, g| k_u + 4.0 * g / 3.0)?
            .zip_with(d(D::BulkDensity)?, |m, rho| (m / rho).sqrt()),
        // vs = sqrt(G / rho_b)
        D::ShearVelocity => p(P::ShearModulus)?.zip_with(d(D::BulkDensity)?, |g, rho| (g / rho).sqrt()),
        // lambda_u = K_u - 2G/3
        D::UndrainedLame => d(D::UndrainedBulkModulus)?
            .zip_with(p(P::ShearModulus)?, |k_u, g| k_u - 2.0 * g / 3.0),
    }
}

/// Builder for a [`PoroelasticModel`].
#[derive(Debug, Clone)]
pub struct PoroelasticModelBuilder {
    params: GridParams,
    values: BTreeMap<PoroelasticParameter, ParameterValue>,
    space_order: usize,
    grid: Option<Grid>,
}

impl PoroelasticModelBuilder {
    pub fn parameter(mut self, parameter: PoroelasticParameter, value: impl Into<ParameterValue>) -> Self {
        self.values.insert(parameter, value.into());
        self
    }

    pub fn solid_density(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::SolidDensity, value)
    }

    pub fn fluid_density(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::FluidDensity, value)
    }

    pub fn drained_bulk_modulus(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::DrainedBulkModulus, value)
    }

    pub fn solid_bulk_modulus(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::SolidBulkModulus, value)
    }

    pub fn fluid_bulk_modulus(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::FluidBulkModulus, value)
    }

    pub fn fluid_viscosity(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::FluidViscosity, value)
    }

    pub fn porosity(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::Porosity, value)
    }

    pub fn permeability(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::Permeability, value)
    }

    pub fn shear_modulus(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::ShearModulus, value)
    }

    pub fn tortuosity(self, value: impl Into<ParameterValue>) -> Self {
        self.parameter(P::Tortuosity, value)
    }

    pub fn space_order(mut self, space_order: usize) -> Self {
        self.space_order = space_order;
        self
    }

    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn build(self) -> Result<PoroelasticModel> {
        let generic = GenericModel::new(&self.params, self.grid)?;

        // Fail before any storage is allocated
        validate_pipeline(&DERIVATION_PIPELINE, |p| self.values.contains_key(&p))?;
        if let Some(p) = P::ALL.iter().find(|&p| !self.values.contains_key(p)) {
            return Err(ModelError::MissingParameter {
                parameter: p.name().to_string(),
                required_by: "poroelastic model".to_string(),
            });
        }

        let so = self.space_order;
        let mut primaries = BTreeMap::new();
        for (&parameter, value) in &self.values {
            primaries.insert(parameter, generic.field(parameter.name(), value, so)?);
        }

        let operands: BTreeMap<_, _> = primaries.iter().map(|(&k, f)| (k, f.value())).collect();
        let halo = vec![(so, so); generic.dim()];
        let mut values = BTreeMap::new();
        let mut derived = BTreeMap::new();
        for step in &DERIVATION_PIPELINE {
            let value = derive(step.output, &operands, &values)?;
            derived.insert(
                step.output,
                value.clone().into_field(step.output.name(), &generic.grid, halo.clone())?,
            );
            values.insert(step.output, value);
        }

        let damp = generic.damp(true)?;
        let model = PoroelasticModel {
            generic,
            damp,
            primaries,
            derived,
            space_order: so,
        };
        debug!(
            vp_max = model.vp().max(),
            critical_dt = model.critical_dt(),
            "poroelastic model built"
        );
        Ok(model)
    }
}

/// Biot poroelastic earth model with a masking boundary taper.
#[derive(Debug, Clone)]
pub struct PoroelasticModel {
    generic: GenericModel,
    damp: Function,
    primaries: BTreeMap<PoroelasticParameter, PhysicalField>,
    derived: BTreeMap<DerivedQuantity, PhysicalField>,
    space_order: usize,
}

impl PoroelasticModel {
    pub fn builder(params: GridParams) -> PoroelasticModelBuilder {
        PoroelasticModelBuilder {
            params,
            values: BTreeMap::new(),
            space_order: DEFAULT_SPACE_ORDER,
            grid: None,
        }
    }

    pub fn primary(&self, parameter: PoroelasticParameter) -> &PhysicalField {
        // Presence of every primary is checked in `build`
        &self.primaries[&parameter]
    }

    pub fn derived(&self, quantity: DerivedQuantity) -> &PhysicalField {
        &self.derived[&quantity]
    }

    pub fn biot_coefficient(&self) -> &PhysicalField {
        self.derived(D::BiotCoefficient)
    }

    pub fn biot_modulus(&self) -> &PhysicalField {
        self.derived(D::BiotModulus)
    }

    pub fn undrained_bulk_modulus(&self) -> &PhysicalField {
        self.derived(D::UndrainedBulkModulus)
    }

    pub fn bulk_density(&self) -> &PhysicalField {
        self.derived(D::BulkDensity)
    }

    pub fn vp(&self) -> &PhysicalField {
        self.derived(D::CompressionalVelocity)
    }

    pub fn vs(&self) -> &PhysicalField {
        self.derived(D::ShearVelocity)
    }

    pub fn undrained_lame(&self) -> &PhysicalField {
        self.derived(D::UndrainedLame)
    }

    /// Primary then derived fields, each group in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &PhysicalField> {
        self.primaries.values().chain(self.derived.values())
    }

    pub fn field(&self, name: &str) -> Option<&PhysicalField> {
        self.fields().find(|f| f.name() == name)
    }

    pub fn damp(&self) -> &Function {
        &self.damp
    }

    /// Stable time step of the staggered poroelastic scheme
    pub fn critical_dt(&self) -> f64 {
        let h_min = self.spacing().iter().copied().fold(f64::INFINITY, f64::min);
        0.5 * h_min / (SQRT_2 * self.vp().max())
    }

    pub fn space_order(&self) -> usize {
        self.space_order
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
