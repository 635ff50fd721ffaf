//! Named demo scenarios.
//!
//! Layered presets split the last axis (depth) into equal horizontal layers.

use crate::error::{ModelError, Result};
use crate::function::{Function, ParameterValue, PhysicalField};
use crate::grid::PhysicalDomain;
use crate::model::{GridParams, Model, PoroelasticModel, PoroelasticParameter};
use ndarray::{ArrayD, IxDyn};

pub const PRESETS: [&str; 6] = [
    "constant-isotropic",
    "layers-isotropic",
    "layers-tti",
    "layers-tti-noazimuth",
    "constant-poroelastic",
    "layers-poroelastic",
];

/// Either model variant, as produced by [`demo_model`]
#[derive(Debug, Clone)]
pub enum DemoModel {
    Seismic(Model),
    Poroelastic(PoroelasticModel),
}

impl DemoModel {
    pub fn critical_dt(&self) -> f64 {
        match self {
            DemoModel::Seismic(m) => m.critical_dt(),
            DemoModel::Poroelastic(m) => m.critical_dt(),
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            DemoModel::Seismic(m) => m.dim(),
            DemoModel::Poroelastic(m) => m.dim(),
        }
    }

    pub fn spacing(&self) -> &[f64] {
        match self {
            DemoModel::Seismic(m) => m.spacing(),
            DemoModel::Poroelastic(m) => m.spacing(),
        }
    }

    pub fn domain_size(&self) -> Vec<f64> {
        match self {
            DemoModel::Seismic(m) => m.domain_size(),
            DemoModel::Poroelastic(m) => m.domain_size(),
        }
    }

    pub fn shape_domain(&self) -> &[usize] {
        match self {
            DemoModel::Seismic(m) => m.geometry().shape_domain(),
            DemoModel::Poroelastic(m) => m.geometry().shape_domain(),
        }
    }

    pub fn physical_domain(&self) -> &PhysicalDomain {
        match self {
            DemoModel::Seismic(m) => m.physical_domain(),
            DemoModel::Poroelastic(m) => m.physical_domain(),
        }
    }

    pub fn damp(&self) -> &Function {
        match self {
            DemoModel::Seismic(m) => m.damp(),
            DemoModel::Poroelastic(m) => m.damp(),
        }
    }

    pub fn fields(&self) -> Vec<&PhysicalField> {
        match self {
            DemoModel::Seismic(m) => m.fields().to_vec(),
            DemoModel::Poroelastic(m) => m.fields().collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&PhysicalField> {
        match self {
            DemoModel::Seismic(m) => m.field(name),
            DemoModel::Poroelastic(m) => m.field(name),
        }
    }
}

/// Values for `values.len()` equal layers stacked along the last axis
pub fn layered(shape: &[usize], values: &[f64]) -> ArrayD<f64> {
    let depth = shape.last().copied().unwrap_or(1).max(1);
    let nlayers = values.len().max(1);
    ArrayD::from_shape_fn(IxDyn(shape), |idx| {
        let k = idx[shape.len() - 1];
        let layer = (k * nlayers / depth).min(nlayers - 1);
        values.get(layer).copied().unwrap_or(0.0)
    })
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Build the model named by `preset` on the grid described by `params`.
pub fn demo_model(preset: &str, params: GridParams, space_order: Option<usize>) -> Result<DemoModel> {
    let shape = params.shape.clone();
    let dim = shape.len();

    match preset {
        "constant-isotropic" => {
            let mut builder = Model::builder(params, 1.5);
            if let Some(so) = space_order {
                builder = builder.space_order(so);
            }
            Ok(DemoModel::Seismic(builder.build()?))
        }
        "layers-isotropic" => {
            let vp = layered(&shape, &linspace(1.5, 3.5, 2));
            let mut builder = Model::builder(params, vp);
            if let Some(so) = space_order {
                builder = builder.space_order(so);
            }
            Ok(DemoModel::Seismic(builder.build()?))
        }
        "layers-tti" | "layers-tti-noazimuth" => {
            let vp = layered(&shape, &[1.5, 2.5]);
            let mut builder = Model::builder(params, vp.clone())
                .epsilon(vp.mapv(|v| 0.3 * (v - 1.5)))
                .delta(vp.mapv(|v| 0.2 * (v - 1.5)))
                .theta(vp.mapv(|v| 0.5 * (v - 1.5)));
            if dim == 3 && preset == "layers-tti" {
                builder = builder.phi(vp.mapv(|v| 0.35 * (v - 1.5)));
            }
            if let Some(so) = space_order {
                builder = builder.space_order(so);
            }
            Ok(DemoModel::Seismic(builder.build()?))
        }
        "constant-poroelastic" | "layers-poroelastic" => {
            // Brine-saturated sandstone over a tighter, stiffer layer.
            // Densities in g/cm³ and moduli in GPa give velocities in km/s.
            let layers: [(PoroelasticParameter, [f64; 2]); 10] = [
                (PoroelasticParameter::SolidDensity, [2.65, 2.71]),
                (PoroelasticParameter::FluidDensity, [1.04, 1.04]),
                (PoroelasticParameter::DrainedBulkModulus, [9.6, 20.0]),
                (PoroelasticParameter::SolidBulkModulus, [36.0, 70.0]),
                (PoroelasticParameter::FluidBulkModulus, [2.25, 2.25]),
                (PoroelasticParameter::FluidViscosity, [1.0e-3, 1.0e-3]),
                (PoroelasticParameter::Porosity, [0.2, 0.1]),
                (PoroelasticParameter::Permeability, [6.0e-13, 1.0e-14]),
                (PoroelasticParameter::ShearModulus, [8.5, 15.0]),
                (PoroelasticParameter::Tortuosity, [2.0, 3.0]),
            ];
            let mut builder = PoroelasticModel::builder(params);
            for (parameter, values) in layers {
                let value = if preset == "constant-poroelastic" {
                    ParameterValue::Scalar(values[0])
                } else {
                    ParameterValue::Array(layered(&shape, &values))
                };
                builder = builder.parameter(parameter, value);
            }
            if let Some(so) = space_order {
                builder = builder.space_order(so);
            }
            Ok(DemoModel::Poroelastic(builder.build()?))
        }
        other => Err(ModelError::UnknownPreset(other.to_string())),
    }
}
