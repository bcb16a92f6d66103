//! Rolling Forecast State Machine
//!
//! ## Overview
//!
//! Drives the read-predict-publish loop's model side. The machine consumes
//! one confirmed sensor reading per step and moves through three phases:
//!
//! ```text
//! PRIMING --(N readings)--> FIRST_PREDICT --(1 reading)--> ROLLING (forever)
//! ```
//!
//! - **Priming**: the first N readings fill the live buffer column by
//!   column. No prediction is made.
//! - **First predict**: the reading after priming triggers the first
//!   inference, run on the primed buffer *as is* - the triggering reading
//!   itself is never inserted.
//! - **Rolling**: every further reading shifts the buffer left and appends
//!   the *previous prediction*, then predicts again. The live reading is
//!   only passed through to telemetry.
//!
//! ## Self-Feeding Forecasts
//!
//! In steady state the newest window column is always a prior model output,
//! never a real measurement, so forecasts compound on themselves. That is
//! the contract this module implements; callers wanting measurement-driven
//! windows need a different loop, not a patched one. The phase enum exists
//! precisely so this behavior is auditable: each transition is explicit and
//! tested in isolation rather than hidden behind a bare counter.
//!
//! ## Ownership
//!
//! The forecaster owns the buffer and the phase together. No other writer
//! may exist; if one is ever introduced, move the whole forecaster behind a
//! mutex rather than sharing its parts.

use log::debug;

use crate::buffer::WindowBuffer;
use crate::sample::Sample;
use crate::traits::Predictor;

/// Phase of the rolling forecast loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastPhase {
    /// Filling the live buffer with the first real readings
    Priming,
    /// Buffer primed, first inference not yet run
    Primed,
    /// Steady state: predictions feed the next window
    Rolling,
}

/// Forecast loop state: live buffer, phase, and the model handle
///
/// `N` is the window length the model was trained with. The forecaster is
/// constructed once at startup with a fitted model and mutated only from
/// the loop that feeds it readings.
pub struct RollingForecaster<P: Predictor, const N: usize> {
    model: P,
    buffer: WindowBuffer<N>,
    /// Readings absorbed while priming; meaningless after priming ends
    filled: usize,
    phase: ForecastPhase,
    /// Most recent model output, present from the first prediction on
    last_prediction: Option<Sample>,
}

impl<P: Predictor, const N: usize> RollingForecaster<P, N> {
    /// Wrap a fitted model in a fresh forecast loop
    pub fn new(model: P) -> Self {
        Self {
            model,
            buffer: WindowBuffer::new(),
            filled: 0,
            phase: ForecastPhase::Priming,
            last_prediction: None,
        }
    }

    /// Current phase, for logging and tests
    pub fn phase(&self) -> ForecastPhase {
        self.phase
    }

    /// The live window, oldest sample first
    pub fn window(&self) -> &[Sample; N] {
        self.buffer.window()
    }

    /// Absorb one confirmed reading and forecast the next sample
    ///
    /// Returns `Ok(None)` while priming. From the (N+1)-th reading on,
    /// every call returns a forecast. Inference errors propagate unchanged;
    /// the machine's state is not advanced past a failed prediction.
    pub fn observe(&mut self, reading: Sample) -> Result<Option<Sample>, P::Error> {
        match self.phase {
            ForecastPhase::Priming => {
                self.buffer.set(self.filled, reading);
                self.filled += 1;
                if self.filled == N {
                    self.phase = ForecastPhase::Primed;
                }
                Ok(None)
            }
            ForecastPhase::Primed => {
                // First inference runs on the primed buffer unshifted; the
                // reading that triggered it is telemetry pass-through only.
                let prediction = self.model.predict(self.buffer.window())?;
                debug!(
                    "first forecast: humidity={:.2} temperature={:.2}",
                    prediction.humidity, prediction.temperature
                );
                self.phase = ForecastPhase::Rolling;
                self.last_prediction = Some(prediction);
                Ok(Some(prediction))
            }
            ForecastPhase::Rolling => {
                // Steady state: the previous prediction becomes the newest
                // window column; the raw reading never enters the buffer.
                let previous = self
                    .last_prediction
                    .unwrap_or_else(|| *self.buffer.newest());
                self.buffer.shift_push(previous);

                let prediction = self.model.predict(self.buffer.window())?;
                debug!(
                    "rolling forecast: humidity={:.2} temperature={:.2}",
                    prediction.humidity, prediction.temperature
                );
                self.last_prediction = Some(prediction);
                Ok(Some(prediction))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    /// Predicts the elementwise mean of the window, offset so outputs are
    /// distinguishable from any real reading in the tests.
    struct MeanPredictor;

    impl Predictor for MeanPredictor {
        type Error = Infallible;

        fn predict(&self, window: &[Sample]) -> Result<Sample, Infallible> {
            let n = window.len() as f32;
            let humidity = window.iter().map(|s| s.humidity).sum::<f32>() / n;
            let temperature = window.iter().map(|s| s.temperature).sum::<f32>() / n;
            Ok(Sample::new(humidity + 100.0, temperature + 100.0))
        }
    }

    struct FailingPredictor;

    impl Predictor for FailingPredictor {
        type Error = &'static str;

        fn predict(&self, _: &[Sample]) -> Result<Sample, &'static str> {
            Err("inference failed")
        }
    }

    fn reading(i: usize) -> Sample {
        Sample::new(40.0 + i as f32, 20.0 + i as f32)
    }

    #[test]
    fn priming_fills_columns_without_predicting() {
        let mut fc = RollingForecaster::<_, 3>::new(MeanPredictor);

        for i in 0..3 {
            assert_eq!(fc.observe(reading(i)).unwrap(), None);
        }

        let humidities: Vec<f32> = fc.window().iter().map(|s| s.humidity).collect();
        let temperatures: Vec<f32> = fc.window().iter().map(|s| s.temperature).collect();
        assert_eq!(humidities, vec![40.0, 41.0, 42.0]);
        assert_eq!(temperatures, vec![20.0, 21.0, 22.0]);
        assert_eq!(fc.phase(), ForecastPhase::Primed);
    }

    #[test]
    fn fourth_reading_predicts_from_unshifted_buffer() {
        let mut fc = RollingForecaster::<_, 3>::new(MeanPredictor);
        for i in 0..3 {
            fc.observe(reading(i)).unwrap();
        }

        let forecast = fc.observe(reading(3)).unwrap().expect("first forecast");

        // Mean of the priming readings, untouched by reading 4
        assert_eq!(forecast.humidity, 141.0);
        assert_eq!(forecast.temperature, 121.0);
        assert_eq!(fc.phase(), ForecastPhase::Rolling);

        // Buffer still holds the priming readings
        let humidities: Vec<f32> = fc.window().iter().map(|s| s.humidity).collect();
        assert_eq!(humidities, vec![40.0, 41.0, 42.0]);
    }

    #[test]
    fn rolling_feeds_prior_prediction_not_raw_reading() {
        let mut fc = RollingForecaster::<_, 3>::new(MeanPredictor);
        for i in 0..3 {
            fc.observe(reading(i)).unwrap();
        }
        let first = fc.observe(reading(3)).unwrap().unwrap();

        let second = fc.observe(reading(4)).unwrap().expect("second forecast");

        // The window's newest column is the first prediction, not reading 5
        assert_eq!(fc.window()[2], first);
        assert_eq!(
            fc.window()
                .iter()
                .map(|s| s.humidity)
                .collect::<Vec<f32>>(),
            vec![41.0, 42.0, first.humidity]
        );

        // And the second forecast was computed from that window
        let expected_h = (41.0 + 42.0 + first.humidity) / 3.0 + 100.0;
        assert!((second.humidity - expected_h).abs() < 1e-4);
    }

    #[test]
    fn prediction_errors_do_not_advance_the_phase() {
        let mut fc = RollingForecaster::<_, 3>::new(FailingPredictor);
        for i in 0..3 {
            fc.observe(reading(i)).unwrap();
        }

        assert!(fc.observe(reading(3)).is_err());
        assert_eq!(fc.phase(), ForecastPhase::Primed);
    }
}
