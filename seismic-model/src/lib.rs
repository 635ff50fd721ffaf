//! # seismic-model
//!
//! Physical-parameter fields for finite-difference seismic modelling.
//!
//! - Padded grids with an absorbing boundary layer on every face
//! - Uniform or spatially-varying fields with stencil halos
//! - Smoothed damping (or masking) profiles for the boundary layer
//! - Acoustic / TTI models and Biot poroelastic models with stable time steps

pub mod config;
pub mod damping;
pub mod error;
pub mod function;
pub mod grid;
pub mod model;
pub mod padding;
pub mod presets;
pub mod visualisation;

pub use damping::{damp_boundary, damping_profile};
pub use error::{ModelError, Result};
pub use function::{Constant, Function, ParameterValue, PhysicalField};
pub use grid::{DType, Grid, PhysicalDomain};
pub use model::{
    DerivationStep, DerivedQuantity, Diagnostic, GenericModel, GridParams, Model, ModelBuilder,
    PoroelasticModel, PoroelasticModelBuilder, PoroelasticParameter, DERIVATION_PIPELINE,
};
pub use padding::{initialize_function, pad, PadMode};
pub use presets::{demo_model, DemoModel, PRESETS};
