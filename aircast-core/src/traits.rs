//! Trait seam between the forecast loop and the model
//!
//! The loop never sees model internals; it hands over a window of samples
//! and receives the next predicted sample. Keeping this seam a trait lets
//! the state machine be tested with scripted stand-in predictors.

use crate::sample::Sample;

/// A frozen sequence-to-vector regression model
///
/// `predict` must be a pure function of the model parameters and the input
/// window: the same window always yields the same sample, and calling it
/// has no side effects beyond diagnostics.
pub trait Predictor {
    /// Error produced when inference fails
    type Error;

    /// Predict the sample following `window`
    ///
    /// `window` is ordered oldest-first and its length is fixed by the
    /// model architecture (three samples for the shipped network).
    fn predict(&self, window: &[Sample]) -> Result<Sample, Self::Error>;
}
