//! Fixed-Size Live Buffer for the Rolling Forecast Window
//!
//! ## Overview
//!
//! This module provides the live window buffer the forecast loop feeds the
//! model from. It always holds exactly `N` samples: it starts zero-filled,
//! is populated column-by-column while the loop primes, and is advanced by
//! a shift-left-and-append in steady state.
//!
//! ## Design Rationale
//!
//! ### Why not a circular buffer?
//!
//! A ring buffer would avoid the O(N) shift, but the window here is three
//! samples wide and the shift happens once per loop iteration (seconds
//! apart). A plain array with an explicit shift keeps the chronological
//! layout obvious - `window()[0]` is always the oldest sample - which
//! matters more than saving a handful of copies, because the forecast loop
//! asserts exact column contents in its tests.
//!
//! ### Why zero-filled?
//!
//! The loop begins predicting only after the buffer has been fully primed
//! with real readings, but the buffer itself exists from startup. Starting
//! from `Sample::zero()` rather than `Option<Sample>` slots matches how the
//! model consumes it: a window is always exactly N samples, never a partial
//! view.
//!
//! ## Usage Example
//!
//! ```rust
//! use aircast_core::{Sample, WindowBuffer};
//!
//! let mut buffer: WindowBuffer<3> = WindowBuffer::new();
//!
//! // Priming: indexed writes
//! buffer.set(0, Sample::new(40.0, 20.0));
//! buffer.set(1, Sample::new(41.0, 21.0));
//! buffer.set(2, Sample::new(42.0, 22.0));
//!
//! // Steady state: drop oldest, append newest
//! buffer.shift_push(Sample::new(43.0, 23.0));
//! assert_eq!(buffer.window()[0].humidity, 41.0);
//! ```

use crate::sample::Sample;

/// Fixed-size window of the most recent N samples
///
/// ## Internal Invariants
///
/// - The buffer always exposes exactly N samples
/// - Samples are stored oldest-first
/// - Until priming completes, unwritten slots hold `Sample::zero()`
///
/// ## Thread Safety
///
/// Not thread-safe. The forecast loop is the single writer; keep it that
/// way or wrap the buffer in a mutex.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBuffer<const N: usize> {
    /// Samples in chronological order, oldest at index 0
    samples: [Sample; N],
}

impl<const N: usize> WindowBuffer<N> {
    /// Creates a zero-filled buffer
    pub const fn new() -> Self {
        Self {
            samples: [Sample::zero(); N],
        }
    }

    /// Window length in samples
    pub const fn len(&self) -> usize {
        N
    }

    /// True only for the degenerate zero-length window
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Overwrite the sample at `index` (priming writes)
    ///
    /// ## Panics
    ///
    /// Panics if `index >= N`. Priming is driven by a counter that the
    /// forecast state machine keeps strictly below N, so an out-of-bounds
    /// write is a logic error, not a runtime condition.
    pub fn set(&mut self, index: usize, sample: Sample) {
        self.samples[index] = sample;
    }

    /// Drop the oldest sample and append `sample` as the newest
    pub fn shift_push(&mut self, sample: Sample) {
        self.samples.copy_within(1.., 0);
        self.samples[N - 1] = sample;
    }

    /// The current window, oldest sample first
    pub fn window(&self) -> &[Sample; N] {
        &self.samples
    }

    /// Most recent sample in the window
    pub fn newest(&self) -> &Sample {
        &self.samples[N - 1]
    }
}

impl<const N: usize> Default for WindowBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
