//! Network layers: 1-D convolution, max-pooling, and dense
//!
//! Layers own their parameters and expose explicit forward/backward passes
//! over flat `f32` slices. Layouts are row-major throughout:
//!
//! - convolution input: `[step][channel]`
//! - convolution output: `[position][filter]`
//! - dense weights: `[output][input]`
//!
//! Backward passes return freshly computed gradients rather than mutating
//! parameters; the optimizer applies them afterwards. The convolution sits
//! at the network input, so its backward pass does not produce an input
//! gradient.

use libm::sqrtf;

use crate::Rng;

/// Rectified linear activation
pub fn relu(z: f32) -> f32 {
    if z > 0.0 {
        z
    } else {
        0.0
    }
}

/// Derivative of ReLU with respect to its pre-activation
pub fn relu_prime(z: f32) -> f32 {
    if z > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Glorot-uniform bound for a layer with the given fan-in/fan-out
fn glorot_limit(fan_in: usize, fan_out: usize) -> f32 {
    sqrtf(6.0 / (fan_in + fan_out) as f32)
}

/// 1-D convolution over the time axis
///
/// Slides `filters` kernels of `kernel` steps across the input and produces
/// `steps - kernel + 1` output positions. Outputs are pre-activations; the
/// caller applies ReLU so the backward pass can see the raw values.
#[derive(Debug, Clone)]
pub struct Conv1d {
    /// Kernel weights, `[filter][kernel step][channel]`
    pub weights: Vec<f32>,
    /// One bias per filter
    pub bias: Vec<f32>,
    filters: usize,
    kernel: usize,
    channels: usize,
}

/// Gradients for a [`Conv1d`] layer, same layouts as the parameters
#[derive(Debug, Clone)]
pub struct Conv1dGrad {
    /// Weight gradients
    pub weights: Vec<f32>,
    /// Bias gradients
    pub bias: Vec<f32>,
}

impl Conv1d {
    /// Build a convolution with Glorot-uniform initial weights
    pub fn new(filters: usize, kernel: usize, channels: usize, rng: &mut Rng) -> Self {
        let fan_in = kernel * channels;
        let limit = glorot_limit(fan_in, filters);

        let weights = (0..filters * kernel * channels)
            .map(|_| rng.uniform(limit))
            .collect();

        Self {
            weights,
            bias: vec![0.0; filters],
            filters,
            kernel,
            channels,
        }
    }

    /// Number of output positions for an input of `steps` time steps
    pub fn out_positions(&self, steps: usize) -> usize {
        steps + 1 - self.kernel
    }

    /// Forward pass; returns pre-activations laid out `[position][filter]`
    ///
    /// `input` is `[step][channel]` with `steps * channels` elements.
    pub fn forward(&self, input: &[f32], steps: usize) -> Vec<f32> {
        let positions = self.out_positions(steps);
        let mut output = vec![0.0; positions * self.filters];

        for p in 0..positions {
            for f in 0..self.filters {
                let mut acc = self.bias[f];
                for k in 0..self.kernel {
                    for c in 0..self.channels {
                        let w = self.weights[(f * self.kernel + k) * self.channels + c];
                        acc += w * input[(p + k) * self.channels + c];
                    }
                }
                output[p * self.filters + f] = acc;
            }
        }

        output
    }

    /// Backward pass from output deltas (`[position][filter]`) to gradients
    pub fn backward(&self, input: &[f32], steps: usize, delta: &[f32]) -> Conv1dGrad {
        let positions = self.out_positions(steps);
        let mut grad = Conv1dGrad {
            weights: vec![0.0; self.weights.len()],
            bias: vec![0.0; self.bias.len()],
        };

        for p in 0..positions {
            for f in 0..self.filters {
                let d = delta[p * self.filters + f];
                if d == 0.0 {
                    continue;
                }
                grad.bias[f] += d;
                for k in 0..self.kernel {
                    for c in 0..self.channels {
                        grad.weights[(f * self.kernel + k) * self.channels + c] +=
                            d * input[(p + k) * self.channels + c];
                    }
                }
            }
        }

        grad
    }
}

/// Max-pool over the time axis, per filter
///
/// Pools non-overlapping windows of `pool` positions; a trailing partial
/// window is discarded. Stateless apart from the pool width.
#[derive(Debug, Clone, Copy)]
pub struct MaxPool1d {
    pool: usize,
}

impl MaxPool1d {
    /// Create a pool of the given window width
    pub fn new(pool: usize) -> Self {
        Self { pool }
    }

    /// Pooled positions for `positions` input positions
    pub fn out_positions(&self, positions: usize) -> usize {
        positions / self.pool
    }

    /// Forward pass over activations laid out `[position][filter]`
    ///
    /// Returns the pooled values and, for the backward pass, the input
    /// position each maximum came from.
    pub fn forward(&self, input: &[f32], positions: usize, filters: usize) -> (Vec<f32>, Vec<usize>) {
        let pooled = self.out_positions(positions);
        let mut output = vec![0.0; pooled * filters];
        let mut argmax = vec![0; pooled * filters];

        for q in 0..pooled {
            for f in 0..filters {
                let mut best_p = q * self.pool;
                let mut best = input[best_p * filters + f];
                for p in (q * self.pool)..((q + 1) * self.pool) {
                    let v = input[p * filters + f];
                    if v > best {
                        best = v;
                        best_p = p;
                    }
                }
                output[q * filters + f] = best;
                argmax[q * filters + f] = best_p;
            }
        }

        (output, argmax)
    }

    /// Route output deltas back to the positions the maxima came from
    pub fn backward(
        &self,
        delta: &[f32],
        argmax: &[usize],
        positions: usize,
        filters: usize,
    ) -> Vec<f32> {
        let mut input_delta = vec![0.0; positions * filters];
        let pooled = self.out_positions(positions);

        for q in 0..pooled {
            for f in 0..filters {
                let p = argmax[q * filters + f];
                input_delta[p * filters + f] += delta[q * filters + f];
            }
        }

        input_delta
    }
}

/// Fully connected layer
#[derive(Debug, Clone)]
pub struct Dense {
    /// Weights, `[output][input]`
    pub weights: Vec<f32>,
    /// One bias per output
    pub bias: Vec<f32>,
    in_dim: usize,
    out_dim: usize,
}

/// Gradients for a [`Dense`] layer
#[derive(Debug, Clone)]
pub struct DenseGrad {
    /// Weight gradients
    pub weights: Vec<f32>,
    /// Bias gradients
    pub bias: Vec<f32>,
}

impl Dense {
    /// Build a dense layer with Glorot-uniform initial weights
    pub fn new(in_dim: usize, out_dim: usize, rng: &mut Rng) -> Self {
        let limit = glorot_limit(in_dim, out_dim);
        let weights = (0..in_dim * out_dim).map(|_| rng.uniform(limit)).collect();

        Self {
            weights,
            bias: vec![0.0; out_dim],
            in_dim,
            out_dim,
        }
    }

    /// Input width
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    /// Output width
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Forward pass; returns pre-activations
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut output = self.bias.clone();
        for (o, out) in output.iter_mut().enumerate() {
            let row = &self.weights[o * self.in_dim..(o + 1) * self.in_dim];
            for (w, x) in row.iter().zip(input) {
                *out += w * x;
            }
        }
        output
    }

    /// Backward pass; returns this layer's gradients and the input delta
    pub fn backward(&self, input: &[f32], delta: &[f32]) -> (DenseGrad, Vec<f32>) {
        let mut grad = DenseGrad {
            weights: vec![0.0; self.weights.len()],
            bias: delta.to_vec(),
        };
        let mut input_delta = vec![0.0; self.in_dim];

        for o in 0..self.out_dim {
            let d = delta[o];
            for i in 0..self.in_dim {
                grad.weights[o * self.in_dim + i] = d * input[i];
                input_delta[i] += d * self.weights[o * self.in_dim + i];
            }
        }

        (grad, input_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conv_forward_known_values() {
        let mut rng = Rng::new(1);
        let mut conv = Conv1d::new(1, 2, 2, &mut rng);
        // One filter: w = [[1, 2], [3, 4]], b = 0.5
        conv.weights = vec![1.0, 2.0, 3.0, 4.0];
        conv.bias = vec![0.5];

        // Three steps of two channels
        let input = [1.0, 0.0, 0.0, 1.0, 2.0, 2.0];
        let out = conv.forward(&input, 3);

        // p0: 1*1 + 2*0 + 3*0 + 4*1 + 0.5 = 5.5
        // p1: 1*0 + 2*1 + 3*2 + 4*2 + 0.5 = 16.5
        assert_eq!(out, vec![5.5, 16.5]);
    }

    #[test]
    fn pool_picks_max_and_remembers_where() {
        let pool = MaxPool1d::new(2);
        // Two positions, two filters: [[1, 8], [5, 2]]
        let input = [1.0, 8.0, 5.0, 2.0];
        let (out, argmax) = pool.forward(&input, 2, 2);

        assert_eq!(out, vec![5.0, 8.0]);
        assert_eq!(argmax, vec![1, 0]);

        let back = pool.backward(&[0.3, 0.7], &argmax, 2, 2);
        assert_eq!(back, vec![0.0, 0.7, 0.3, 0.0]);
    }

    #[test]
    fn dense_forward_known_values() {
        let mut rng = Rng::new(1);
        let mut dense = Dense::new(2, 2, &mut rng);
        dense.weights = vec![1.0, -1.0, 0.5, 0.5];
        dense.bias = vec![0.0, 1.0];

        let out = dense.forward(&[3.0, 1.0]);
        assert_eq!(out, vec![2.0, 3.0]);
    }

    #[test]
    fn dense_backward_matches_finite_difference() {
        let mut rng = Rng::new(9);
        let dense = Dense::new(3, 2, &mut rng);
        let input = [0.5, -1.0, 2.0];
        let delta = [1.0, 0.0]; // dL/dz0 = 1

        let (grad, input_delta) = dense.backward(&input, &delta);

        // dL/dw[0][i] = input[i]
        assert_eq!(&grad.weights[0..3], &input);
        // dL/dw[1][i] = 0
        assert!(grad.weights[3..6].iter().all(|g| *g == 0.0));
        // dL/dx[i] = w[0][i]
        for i in 0..3 {
            assert_eq!(input_delta[i], dense.weights[i]);
        }
    }

    #[test]
    fn relu_clamps_negatives() {
        assert_eq!(relu(-1.5), 0.0);
        assert_eq!(relu(1.5), 1.5);
        assert_eq!(relu_prime(-0.1), 0.0);
        assert_eq!(relu_prime(0.1), 1.0);
    }
}
