//! Time-series samples and telemetry records
//!
//! A [`Sample`] is one (humidity, temperature) pair indexed by arrival
//! order; both the training dataset and the live window buffer are built
//! from them. [`Telemetry`] is the transient per-iteration record the
//! bridge publishes to the broker - it pairs the raw reading that just
//! arrived with the model's forecast, so feature order here must match
//! the broker-side dashboard keys exactly.

use serde::{Deserialize, Serialize};

/// Number of features carried by each sample (humidity, temperature)
pub const N_FEATURES: usize = 2;

/// One time-series point: relative humidity and indoor temperature
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    /// Relative humidity in percent
    pub humidity: f32,
    /// Temperature in degrees Celsius
    pub temperature: f32,
}

impl Sample {
    /// Create a sample from a (humidity, temperature) pair
    pub const fn new(humidity: f32, temperature: f32) -> Self {
        Self {
            humidity,
            temperature,
        }
    }

    /// Zero-valued sample used to pre-fill the live buffer
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Features as a fixed array in model input order (humidity first)
    pub fn features(&self) -> [f32; N_FEATURES] {
        [self.humidity, self.temperature]
    }

    /// Build a sample from model output in the same feature order
    pub fn from_features(features: [f32; N_FEATURES]) -> Self {
        Self::new(features[0], features[1])
    }
}

/// Telemetry record published once per loop iteration
///
/// Combines the newly arrived raw reading with the forecast computed in
/// the same iteration. Serialized as a flat JSON object; key names are
/// part of the broker contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Raw temperature from the device
    pub temperature: f32,
    /// Raw humidity from the device
    pub humidity: f32,
    /// Forecast temperature for the next step
    pub temperature_predict: f32,
    /// Forecast humidity for the next step
    pub humidity_predict: f32,
    /// Ambient light level, passed through unmodified
    pub light: f32,
}

impl Telemetry {
    /// Assemble a record from a raw reading and a forecast sample
    pub fn new(temperature: f32, humidity: f32, light: f32, forecast: Sample) -> Self {
        Self {
            temperature,
            humidity,
            temperature_predict: forecast.temperature,
            humidity_predict: forecast.humidity,
            light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_order_roundtrip() {
        let sample = Sample::new(45.0, 22.5);
        let features = sample.features();
        assert_eq!(features, [45.0, 22.5]);
        assert_eq!(Sample::from_features(features), sample);
    }

    #[test]
    fn telemetry_json_keys() {
        let record = Telemetry::new(23.0, 43.0, 310.0, Sample::new(43.5, 23.25));
        let json = serde_json::to_value(record).unwrap();

        assert_eq!(json["temperature"], 23.0);
        assert_eq!(json["humidity"], 43.0);
        assert_eq!(json["temperature_predict"], 23.25);
        assert_eq!(json["humidity_predict"], 43.5);
        assert_eq!(json["light"], 310.0);
    }
}
