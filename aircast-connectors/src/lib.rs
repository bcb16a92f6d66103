//! Protocol Connectors for the Aircast Bridge
//!
//! ## Overview
//!
//! Two transports, two very different failure policies:
//!
//! - **Device link** ([`serial`]): a point-to-point, line-oriented text
//!   protocol. Inbound lines carry sensor frames; outbound lines carry JSON
//!   commands. Bad inbound lines are skipped silently - the device is noisy
//!   by nature and a dropped frame costs one loop iteration, nothing more.
//! - **MQTT** ([`mqtt`]): the telemetry broker connection. Publish failures
//!   are surfaced to the caller (and counted), because a lost telemetry
//!   record is worth a log line; inbound RPC dispatch runs on a background
//!   thread owned by the connector.
//!
//! ## Topic Conventions
//!
//! The connectors are deliberately broker-schema agnostic: topic names for
//! telemetry and RPC live in the bridge binary, not here. The MQTT
//! connector only needs to know which filters to subscribe to.
//!
//! ## Reconnection
//!
//! Neither transport implements its own reconnect/backoff. The device link
//! surfaces read errors and carries on; the MQTT event loop relies on the
//! client library's built-in reconnect cycle. See the bridge documentation
//! for the reasoning.

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "mqtt")]
pub mod mqtt;

pub mod serial;

// Re-export common types
#[cfg(feature = "mqtt")]
pub use mqtt::{InboundMessage, MqttConfig, MqttConnector, MqttError};
pub use serial::{parse_frame, CommandWriter, DeviceLink, LinkError, SensorFrame};

/// Trait for transports that can publish a payload to a named destination
///
/// Lets the RPC handler and the telemetry loop be tested against scripted
/// publishers instead of a live broker.
pub trait Publish {
    /// Error produced when publishing fails
    type Error;

    /// Publish `payload` to `topic` with at-least-once delivery
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
}
