use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Squared-error loss over matrices. The backward pass hard-codes this
/// loss (its error term is `target - output`); this helper exists for
/// diagnostics and evaluation.
pub struct MseLoss;

impl MseLoss {
    /// Mean of `(predicted - expected)^2` over every entry. Shapes must
    /// match exactly.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        if predicted.shape() != expected.shape() {
            return Err(Error::DimensionMismatch(format!(
                "cannot compare {:?} against {:?}",
                predicted.shape(),
                expected.shape()
            )));
        }
        let n = predicted.as_slice().len() as f64;
        let total: f64 = predicted
            .as_slice()
            .iter()
            .zip(expected.as_slice())
            .map(|(p, e)| (p - e) * (p - e))
            .sum();
        Ok(total / n)
    }
}
