//! Sequence-to-Vector Regression for Short-Horizon Sensor Forecasting
//!
//! ## Overview
//!
//! This crate implements the small convolutional network the bridge uses to
//! forecast the next (humidity, temperature) pair from the last three
//! observations. It is deliberately not a general ML framework: the
//! architecture is fixed, training happens exactly once at startup, and the
//! parameters are frozen for the life of the process.
//!
//! ## Architecture
//!
//! ```text
//! input (n_steps x 2 features)
//!   -> Conv1D(64 filters, kernel 2, ReLU)
//!   -> MaxPool1D(pool 2)
//!   -> Flatten
//!   -> Dense(50, ReLU)
//!   -> Dense(2)                   # humidity, temperature
//! ```
//!
//! Training is plain per-sample Adam on mean-squared error for a fixed
//! number of epochs over the full window set. No validation split, no early
//! stopping, no hyperparameter search, no checkpoints - training runs to
//! completion or the process does not start serving.
//!
//! ## Why hand-rolled?
//!
//! The whole network is a few thousand multiply-accumulates per inference.
//! Writing the forward and backward passes directly keeps the dependency
//! surface at `libm` and makes the arithmetic auditable against the shapes
//! above. Weight init draws from a seeded xorshift generator, so a fixed
//! seed gives bit-identical training runs.
//!
//! ## Usage
//!
//! ```no_run
//! use aircast_core::{split_sequences, Sample};
//! use aircast_ml::{SequenceCnn, TrainConfig};
//!
//! let series: Vec<Sample> = /* loaded from CSV */ vec![];
//! let pairs = split_sequences(&series, 3);
//!
//! let mut model = SequenceCnn::new(3, 42).unwrap();
//! model.fit(&pairs, &TrainConfig::default()).unwrap();
//!
//! let forecast = model.infer(&series[series.len() - 3..]).unwrap();
//! println!("next humidity: {:.2}", forecast.humidity);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod layers;
pub mod model;
pub mod optimizer;

pub use model::{SequenceCnn, TrainConfig, TrainReport};
pub use optimizer::Adam;

use thiserror::Error;

/// Number of convolution filters
pub const CONV_FILTERS: usize = 64;
/// Convolution kernel width in time steps
pub const KERNEL_SIZE: usize = 2;
/// Max-pool window in time steps
pub const POOL_SIZE: usize = 2;
/// Hidden dense layer width
pub const HIDDEN_UNITS: usize = 50;

/// Result type for model operations
pub type MlResult<T> = Result<T, MlError>;

/// Errors raised while building, training, or running the model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MlError {
    /// The window set was empty; there is nothing to fit
    #[error("no training windows: the series must be longer than the window")]
    InsufficientData,

    /// A window did not match the model's input length
    #[error("window of {found} samples does not match model input of {expected}")]
    WindowSize {
        /// Input length the model was built for
        expected: usize,
        /// Length of the offending window
        found: usize,
    },

    /// The requested architecture cannot be built
    #[error("invalid architecture: {0}")]
    InvalidConfig(&'static str),

    /// Training produced a non-finite loss
    #[error("training diverged at epoch {epoch}")]
    Diverged {
        /// Epoch the loss stopped being finite
        epoch: usize,
    },
}

/// Small xorshift32 generator for reproducible weight initialization
///
/// Not a statistical-quality RNG; it only needs to scatter initial weights
/// deterministically for a given seed.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u32,
}

impl Rng {
    /// Create a generator; a zero seed is bumped to keep the state nonzero
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    /// Next raw 32-bit value
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform float in (-limit, limit)
    pub fn uniform(&mut self, limit: f32) -> f32 {
        (self.next_f32() * 2.0 - 1.0) * limit
    }
}
