//! Adam optimizer
//!
//! One [`Adam`] state per parameter tensor: the model keeps one for each
//! weight matrix and bias vector it trains. Hyperparameters are the usual
//! defaults; the learning rate comes from the training config.

use libm::sqrtf;

/// First-moment decay rate
const BETA1: f32 = 0.9;
/// Second-moment decay rate
const BETA2: f32 = 0.999;
/// Numerical floor for the denominator
const EPSILON: f32 = 1e-8;

/// Adam state for one parameter tensor
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    /// First-moment estimates
    m: Vec<f32>,
    /// Second-moment estimates
    v: Vec<f32>,
    /// Update count, used for bias correction
    t: u32,
}

impl Adam {
    /// Create optimizer state for a tensor of `len` parameters
    pub fn new(len: usize, lr: f32) -> Self {
        Self {
            lr,
            m: vec![0.0; len],
            v: vec![0.0; len],
            t: 0,
        }
    }

    /// Apply one gradient step in place
    ///
    /// `params` and `grads` must both match the length this state was
    /// created with.
    pub fn step(&mut self, params: &mut [f32], grads: &[f32]) {
        debug_assert_eq!(params.len(), self.m.len());
        debug_assert_eq!(grads.len(), self.m.len());

        self.t += 1;
        let correction1 = 1.0 - powi(BETA1, self.t);
        let correction2 = 1.0 - powi(BETA2, self.t);

        for i in 0..params.len() {
            let g = grads[i];
            self.m[i] = BETA1 * self.m[i] + (1.0 - BETA1) * g;
            self.v[i] = BETA2 * self.v[i] + (1.0 - BETA2) * g * g;

            let m_hat = self.m[i] / correction1;
            let v_hat = self.v[i] / correction2;
            params[i] -= self.lr * m_hat / (sqrtf(v_hat) + EPSILON);
        }
    }
}

/// `base^exp` by repeated squaring; avoids pulling in powf for an integer
/// exponent that grows with the update count
fn powi(base: f32, mut exp: u32) -> f32 {
    let mut acc = 1.0_f32;
    let mut base = base;
    while exp > 0 {
        if exp & 1 == 1 {
            acc *= base;
        }
        base *= base;
        exp >>= 1;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_descend_a_quadratic() {
        // Minimize f(x) = (x - 3)^2 from x = 0
        let mut x = vec![0.0_f32];
        let mut adam = Adam::new(1, 0.1);

        for _ in 0..500 {
            let grad = vec![2.0 * (x[0] - 3.0)];
            adam.step(&mut x, &grad);
        }

        assert!((x[0] - 3.0).abs() < 0.05, "converged to {}", x[0]);
    }

    #[test]
    fn first_step_is_learning_rate_sized() {
        // With bias correction, the first Adam step is ~lr * sign(grad)
        let mut x = vec![0.0_f32];
        let mut adam = Adam::new(1, 0.01);
        adam.step(&mut x, &[5.0]);
        assert!((x[0] + 0.01).abs() < 1e-4);
    }

    #[test]
    fn powi_matches_naive_product() {
        let mut naive = 1.0_f32;
        for t in 1..=10u32 {
            naive *= 0.9;
            assert!((powi(0.9, t) - naive).abs() < 1e-6);
        }
    }
}
