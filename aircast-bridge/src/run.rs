//! Telemetry Relay Loop
//!
//! ## Overview
//!
//! The foreground loop owns the serial reader and the forecaster. Each
//! iteration reads one line from the device, and if it carries a sensor
//! frame, feeds it through the forecaster and publishes the combined
//! reading-plus-forecast record at QoS 1. The loop then sleeps for the
//! configured interval, so the publish cadence is driven by the bridge and
//! not by how fast the device emits lines.
//!
//! ## Failure Policy
//!
//! - Non-frame lines are skipped without delay.
//! - Transient serial read errors are logged and skipped.
//! - A disconnected device is fatal; the daemon exits and lets the
//!   supervisor restart it.
//! - A failed publish is logged and the loop keeps going; the broker
//!   connection heals in the background.
//!
//! During the priming phase nothing is published: the forecaster has no
//! prediction to attach yet, and a telemetry record without its forecast
//! fields would break downstream dashboards.

use std::thread;
use std::time::Duration;

use aircast_connectors::{DeviceLink, LinkError, Publish, SensorFrame};
use aircast_core::{Predictor, RollingForecaster, Sample, Telemetry};
use aircast_ml::MlError;
use log::{debug, error, warn};

use crate::errors::BridgeError;
use crate::rpc::TELEMETRY_TOPIC;

/// Window length fed to the forecaster, fixed by the trained model shape
pub const N_STEPS: usize = 3;

/// Feed one frame through the forecaster and publish the result
///
/// Returns `Ok(true)` when a telemetry record went out and `Ok(false)`
/// while the forecaster is still priming.
pub fn relay_frame<M, P>(
    frame: SensorFrame,
    forecaster: &mut RollingForecaster<M, N_STEPS>,
    publisher: &P,
) -> Result<bool, BridgeError>
where
    M: Predictor<Error = MlError>,
    P: Publish,
    P::Error: std::fmt::Display,
{
    let reading = Sample::from(frame);
    match forecaster.observe(reading)? {
        Some(forecast) => {
            let record = Telemetry::new(frame.temperature, frame.humidity, frame.light, forecast);
            let payload = serde_json::to_vec(&record)?;
            publisher
                .publish(TELEMETRY_TOPIC, &payload)
                .map_err(|e| BridgeError::Publish(e.to_string()))?;
            Ok(true)
        }
        None => {
            debug!("priming: holding reading, nothing to publish yet");
            Ok(false)
        }
    }
}

/// Run the relay loop until the device disconnects
pub fn run_loop<M, P>(
    link: &mut DeviceLink,
    forecaster: &mut RollingForecaster<M, N_STEPS>,
    publisher: &P,
    interval: Duration,
) -> Result<(), BridgeError>
where
    M: Predictor<Error = MlError>,
    P: Publish,
    P::Error: std::fmt::Display,
{
    loop {
        let frame = match link.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(LinkError::Disconnected) => return Err(BridgeError::Link(LinkError::Disconnected)),
            Err(e) => {
                warn!("serial read error: {}", e);
                continue;
            }
        };

        debug!(
            "frame: temperature {} humidity {} light {}",
            frame.temperature, frame.humidity, frame.light
        );
        if let Err(e) = relay_frame(frame, forecaster, publisher) {
            error!("relaying frame failed: {}", e);
        }

        thread::sleep(interval);
    }
}
