//! Per-model crosstab and classification.

pub mod builder;
pub mod classifier;

pub use builder::build_crosstab;
pub use classifier::annotate;

use crosstab_models::{BomTable, ClassifiedSheet, ConsumptionTable};

use crate::error::CrosstabResult;

/// Pivot followed by classification for one model.
pub fn classify_model(bom: &BomTable, consumption: &ConsumptionTable, model: &str) -> CrosstabResult<ClassifiedSheet> {
    let pivot = build_crosstab(bom, consumption, model);
    annotate(&pivot, bom, model)
}
