use thiserror::Error;

/// Errors from fitting, evaluating and sampling clothoid segments.
///
/// Values are reported as `f64` regardless of which float module produced them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClothoidError {
    /// the root finder spent its iteration budget without meeting the tolerance
    #[error("G1 fit did not converge after {iterations} iterations, residual {residual:e}")]
    FitNonConvergence { iterations: usize, residual: f64 },

    #[error("arc length {s} is outside of the segment range [0, {length}]")]
    InvalidEvaluationRange { s: f64, length: f64 },

    /// start and end share a position but not a heading, no single segment connects them
    #[error("start and end positions coincide but heading changes by {heading_change} radians")]
    CoincidentEndpoints { heading_change: f64 },

    #[error("invalid {parameter}: {value}")]
    InvalidParameter { parameter: &'static str, value: f64 },
}
