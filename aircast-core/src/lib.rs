//! Core forecasting engine for Aircast
//!
//! Turns a historical humidity/temperature series into fixed-length training
//! windows and drives the rolling forecast loop that a bridge feeds with live
//! sensor readings.
//!
//! Key constraints:
//! - The live window buffer has a fixed compile-time size
//! - Model parameters are fit once at startup and frozen afterwards
//! - The steady-state loop feeds predictions back as model input
//!
//! ```no_run
//! use aircast_core::{RollingForecaster, Sample};
//! # use aircast_core::Predictor;
//! # struct Stub;
//! # impl Predictor for Stub {
//! #     type Error = core::convert::Infallible;
//! #     fn predict(&self, _: &[Sample]) -> Result<Sample, Self::Error> {
//! #         Ok(Sample::new(0.0, 0.0))
//! #     }
//! # }
//! # let model = Stub;
//! let mut forecaster = RollingForecaster::<_, 3>::new(model);
//!
//! // Priming readings produce no forecast
//! assert!(forecaster.observe(Sample::new(40.0, 20.0)).unwrap().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod dataset;
pub mod errors;
pub mod forecast;
pub mod sample;
pub mod traits;
pub mod window;

// Public API
pub use buffer::WindowBuffer;
pub use dataset::TrainingData;
pub use errors::{DatasetError, DatasetResult};
pub use forecast::{ForecastPhase, RollingForecaster};
pub use sample::{Sample, Telemetry};
pub use traits::Predictor;
pub use window::split_sequences;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
