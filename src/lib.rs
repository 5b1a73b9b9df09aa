pub mod allocator;
pub mod error;
pub mod geometry;
pub mod guillotine;
pub mod normalize;
pub mod optimizer;
pub mod plan;
pub mod render;
pub mod types;

pub use error::{OptimizeError, Result};
pub use plan::CuttingPlan;
pub use types::CutRequest;

use crate::optimizer::{Optimizer, OptimizerConfig};

/// Validates `request`, searches for the least wasteful layout and returns
/// the cutting plan. Validation errors are reported before any packing runs.
pub fn optimize(request: &CutRequest) -> Result<CuttingPlan> {
    let units = normalize::normalize(&request.pieces, &request.stock)?;
    let config = OptimizerConfig::from(&request.options);
    let outcome = Optimizer::new(&units, &request.stock, config).run();
    Ok(plan::assemble(&outcome, &request.pieces, &request.stock))
}
