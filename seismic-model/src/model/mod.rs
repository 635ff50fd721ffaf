//! Physical models: the padded grid, the damping layer and the material
//! fields handed to a wave-propagation operator.

pub mod generic;
pub mod poroelastic;
pub mod seismic;

pub use generic::{GenericModel, GridParams};
pub use poroelastic::{
    DerivedQuantity, DerivationStep, PoroelasticModel, PoroelasticModelBuilder,
    PoroelasticParameter, DERIVATION_PIPELINE, validate_pipeline,
};
pub use seismic::{Diagnostic, Model, ModelBuilder};

/// Truncate `dt` down to three decimal places.
///
/// Quotients that land a few ULPs under an exact millisecond are snapped
/// up first, so 0.27999999999999997 truncates to 0.28 and not 0.279.
pub(crate) fn truncate_dt(dt: f64) -> f64 {
    let scaled = 1000.0 * dt;
    let nearest = scaled.round();
    let ms = if (scaled - nearest).abs() <= 1e-9 * nearest.abs().max(1.0) {
        nearest
    } else {
        scaled.floor()
    };
    ms / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_dt_floors() {
        assert_eq!(truncate_dt(2.5333333), 2.533);
        assert_eq!(truncate_dt(0.9999), 0.999);
    }

    #[test]
    fn test_truncate_dt_snaps_rounding_error() {
        let dt = 0.42 / 1.5;
        assert!(dt < 0.28);
        assert_eq!(truncate_dt(dt), 0.28);
    }
}
