//! The sequence model: construction, training, and inference
//!
//! ## Data Flow
//!
//! A window of `n_steps` samples becomes a `[step][channel]` matrix of
//! (humidity, temperature) features. One forward pass runs it through the
//! convolution, pool, and the two dense layers; training repeats forward and
//! backward passes per window with Adam updates after each one, for a fixed
//! number of epochs over the whole window set.
//!
//! ## Determinism
//!
//! Everything here is plain sequential `f32` arithmetic seeded through the
//! crate's xorshift generator: two models built with the same seed and fit
//! on the same pairs end up with identical parameters, and `infer` is a pure
//! function of parameters and input. The serving loop depends on that - a
//! frozen model must give the same forecast for the same window every time.

use aircast_core::sample::N_FEATURES;
use aircast_core::{Predictor, Sample};
use log::{debug, info, trace};

use crate::layers::{relu, relu_prime, Conv1d, Dense, MaxPool1d};
use crate::optimizer::Adam;
use crate::{MlError, MlResult, Rng, CONV_FILTERS, HIDDEN_UNITS, KERNEL_SIZE, POOL_SIZE};

/// Training hyperparameters
///
/// Defaults mirror the offline training recipe: 100 full passes, Adam at
/// 1e-3, mean-squared-error loss. There is deliberately no validation
/// split or early-stopping knob.
#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    /// Full passes over the window set
    pub epochs: usize,
    /// Adam learning rate
    pub learning_rate: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 1e-3,
        }
    }
}

/// Summary of a completed training run
#[derive(Debug, Clone, Copy)]
pub struct TrainReport {
    /// Epochs actually run (always the configured count)
    pub epochs: usize,
    /// Number of (window, target) pairs fit on
    pub windows: usize,
    /// Mean loss over the first epoch
    pub initial_loss: f32,
    /// Mean loss over the last epoch
    pub final_loss: f32,
}

/// Intermediate values of one forward pass, kept for backpropagation
struct Cache {
    /// Flattened `[step][channel]` input
    input: Vec<f32>,
    /// Convolution pre-activations, `[position][filter]`
    conv_z: Vec<f32>,
    /// Source position of each pooled maximum
    argmax: Vec<usize>,
    /// Pooled activations, flattened
    flat: Vec<f32>,
    /// Hidden layer pre-activations
    hidden_z: Vec<f32>,
    /// Hidden layer activations after ReLU
    hidden_a: Vec<f32>,
    /// Linear output, `[humidity, temperature]`
    output: Vec<f32>,
}

/// The 1-D convolutional regression network
///
/// Fixed architecture: Conv1D(64, kernel 2, ReLU) -> MaxPool1D(2) ->
/// Flatten -> Dense(50, ReLU) -> Dense(2). Parameters are mutable only
/// through [`fit`](Self::fit); after startup the model is treated as
/// frozen.
#[derive(Debug)]
pub struct SequenceCnn {
    conv: Conv1d,
    pool: MaxPool1d,
    hidden: Dense,
    output: Dense,
    n_steps: usize,
    /// Convolution output positions for `n_steps` input steps
    positions: usize,
}

impl SequenceCnn {
    /// Build an untrained model for windows of `n_steps` samples
    ///
    /// Weight initialization is fully determined by `seed`.
    pub fn new(n_steps: usize, seed: u32) -> MlResult<Self> {
        if n_steps < KERNEL_SIZE {
            return Err(MlError::InvalidConfig("window shorter than conv kernel"));
        }
        let positions = n_steps - KERNEL_SIZE + 1;
        let pool = MaxPool1d::new(POOL_SIZE);
        let pooled = pool.out_positions(positions);
        if pooled == 0 {
            return Err(MlError::InvalidConfig("window too short to survive pooling"));
        }

        let mut rng = Rng::new(seed);
        let conv = Conv1d::new(CONV_FILTERS, KERNEL_SIZE, N_FEATURES, &mut rng);
        let hidden = Dense::new(pooled * CONV_FILTERS, HIDDEN_UNITS, &mut rng);
        let output = Dense::new(HIDDEN_UNITS, N_FEATURES, &mut rng);

        Ok(Self {
            conv,
            pool,
            hidden,
            output,
            n_steps,
            positions,
        })
    }

    /// Window length this model consumes
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Fit on (window, target) pairs from [`split_sequences`]
    ///
    /// Runs `config.epochs` full passes with a per-window Adam update.
    /// Fails up front on an empty window set and mid-run if the loss stops
    /// being finite; both are fatal to the caller, which cannot serve
    /// forecasts without a fitted model.
    ///
    /// [`split_sequences`]: aircast_core::split_sequences
    pub fn fit(&mut self, pairs: &[(&[Sample], Sample)], config: &TrainConfig) -> MlResult<TrainReport> {
        if pairs.is_empty() {
            return Err(MlError::InsufficientData);
        }
        for (window, _) in pairs {
            self.check_window(window)?;
        }

        let mut conv_w = Adam::new(self.conv.weights.len(), config.learning_rate);
        let mut conv_b = Adam::new(self.conv.bias.len(), config.learning_rate);
        let mut hidden_w = Adam::new(self.hidden.weights.len(), config.learning_rate);
        let mut hidden_b = Adam::new(self.hidden.bias.len(), config.learning_rate);
        let mut output_w = Adam::new(self.output.weights.len(), config.learning_rate);
        let mut output_b = Adam::new(self.output.bias.len(), config.learning_rate);

        let mut initial_loss = 0.0;
        let mut final_loss = 0.0;

        for epoch in 0..config.epochs {
            let mut epoch_loss = 0.0;

            for (window, target) in pairs {
                let cache = self.forward(window);
                let truth = target.features();

                // MSE and its gradient w.r.t. the linear outputs
                let mut delta_out = vec![0.0; N_FEATURES];
                let mut loss = 0.0;
                for o in 0..N_FEATURES {
                    let err = cache.output[o] - truth[o];
                    loss += err * err / N_FEATURES as f32;
                    delta_out[o] = 2.0 * err / N_FEATURES as f32;
                }
                epoch_loss += loss;

                // Output layer (linear)
                let (out_grad, d_hidden_a) = self.output.backward(&cache.hidden_a, &delta_out);

                // Hidden layer through ReLU
                let delta_hidden: Vec<f32> = d_hidden_a
                    .iter()
                    .zip(&cache.hidden_z)
                    .map(|(d, z)| d * relu_prime(*z))
                    .collect();
                let (hidden_grad, d_flat) = self.hidden.backward(&cache.flat, &delta_hidden);

                // Un-pool, then convolution through ReLU
                let d_conv_a =
                    self.pool
                        .backward(&d_flat, &cache.argmax, self.positions, CONV_FILTERS);
                let delta_conv: Vec<f32> = d_conv_a
                    .iter()
                    .zip(&cache.conv_z)
                    .map(|(d, z)| d * relu_prime(*z))
                    .collect();
                let conv_grad = self.conv.backward(&cache.input, self.n_steps, &delta_conv);

                conv_w.step(&mut self.conv.weights, &conv_grad.weights);
                conv_b.step(&mut self.conv.bias, &conv_grad.bias);
                hidden_w.step(&mut self.hidden.weights, &hidden_grad.weights);
                hidden_b.step(&mut self.hidden.bias, &hidden_grad.bias);
                output_w.step(&mut self.output.weights, &out_grad.weights);
                output_b.step(&mut self.output.bias, &out_grad.bias);
            }

            let mean_loss = epoch_loss / pairs.len() as f32;
            if !mean_loss.is_finite() {
                return Err(MlError::Diverged { epoch });
            }
            if epoch == 0 {
                initial_loss = mean_loss;
            }
            final_loss = mean_loss;

            if epoch % 10 == 0 {
                debug!("epoch {}: mse {:.6}", epoch, mean_loss);
            }
        }

        info!(
            "trained on {} windows for {} epochs: mse {:.6} -> {:.6}",
            pairs.len(),
            config.epochs,
            initial_loss,
            final_loss
        );

        Ok(TrainReport {
            epochs: config.epochs,
            windows: pairs.len(),
            initial_loss,
            final_loss,
        })
    }

    /// Predict the sample following `window`
    pub fn infer(&self, window: &[Sample]) -> MlResult<Sample> {
        self.check_window(window)?;
        let cache = self.forward(window);
        let prediction = Sample::from_features([cache.output[0], cache.output[1]]);
        trace!(
            "predicted humidity={:.4} temperature={:.4}",
            prediction.humidity,
            prediction.temperature
        );
        Ok(prediction)
    }

    fn check_window(&self, window: &[Sample]) -> MlResult<()> {
        if window.len() != self.n_steps {
            return Err(MlError::WindowSize {
                expected: self.n_steps,
                found: window.len(),
            });
        }
        Ok(())
    }

    fn forward(&self, window: &[Sample]) -> Cache {
        let mut input = Vec::with_capacity(self.n_steps * N_FEATURES);
        for sample in window {
            input.extend_from_slice(&sample.features());
        }

        let conv_z = self.conv.forward(&input, self.n_steps);
        let conv_a: Vec<f32> = conv_z.iter().map(|z| relu(*z)).collect();

        let (flat, argmax) = self.pool.forward(&conv_a, self.positions, CONV_FILTERS);

        let hidden_z = self.hidden.forward(&flat);
        let hidden_a: Vec<f32> = hidden_z.iter().map(|z| relu(*z)).collect();

        let output = self.output.forward(&hidden_a);

        Cache {
            input,
            conv_z,
            argmax,
            flat,
            hidden_z,
            hidden_a,
            output,
        }
    }
}

impl Predictor for SequenceCnn {
    type Error = MlError;

    fn predict(&self, window: &[Sample]) -> Result<Sample, MlError> {
        self.infer(window)
    }
}
