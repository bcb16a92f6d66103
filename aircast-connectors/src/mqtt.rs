//! MQTT Connector for the Telemetry Broker
//!
//! ## Overview
//!
//! Wraps a synchronous `rumqttc` client. The connector splits into two
//! halves at construction time:
//!
//! - a cloneable publish handle used by the foreground loop, and
//! - a background event thread that drives the protocol state machine and
//!   dispatches inbound publishes (RPC requests) to a caller-supplied
//!   handler.
//!
//! ## Delivery and Authentication
//!
//! All publishes go out at QoS 1 (at least once) - telemetry consumers
//! dedupe by timestamp, and RPC replies are idempotent echoes. The device
//! bearer token is sent as the MQTT username with an empty password, which
//! is the token-auth convention of the target broker.
//!
//! ## Reconnection
//!
//! A ConnAck with a non-success code is logged and nothing else: no retry
//! scheduling lives here. Iterating the rumqttc connection re-runs its
//! internal connect cycle after errors, so transient broker outages heal on
//! their own; a misconfigured credential shows up as a repeating log line
//! rather than a crash.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};
use rumqttc::{Client, ConnectReturnCode, Event, MqttOptions, Packet, QoS};
use thiserror::Error;

use crate::{ConnectionStats, Publish};

/// MQTT-specific errors
#[derive(Debug, Error)]
pub enum MqttError {
    /// The client rejected a publish or subscribe request
    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Configuration was rejected before connecting
    #[error("mqtt configuration error: {0}")]
    Config(&'static str),
}

/// One inbound message delivered to the RPC handler
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Topic the message arrived on
    pub topic: String,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

/// Broker connection settings
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker hostname
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Client identifier
    pub client_id: String,
    /// Device bearer token, sent as the username
    pub token: String,
    /// Keep-alive interval
    pub keep_alive: Duration,
    /// Topic filters subscribed on every (re)connect
    pub subscriptions: Vec<String>,
    /// Request queue capacity between client and event loop
    pub capacity: usize,
}

impl MqttConfig {
    /// Create a configuration for the given broker
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: "aircast-bridge".into(),
            token: String::new(),
            keep_alive: Duration::from_secs(60),
            subscriptions: Vec::new(),
            capacity: 16,
        }
    }

    /// Set the device bearer token used as the connection username
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the client identifier
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Set the keep-alive interval in seconds
    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive = Duration::from_secs(secs);
        self
    }

    /// Add a topic filter to subscribe to on connect
    pub fn subscribe(mut self, filter: impl Into<String>) -> Self {
        self.subscriptions.push(filter.into());
        self
    }
}

/// Publish handle plus the background event thread
///
/// Cloning is cheap and every clone shares the same connection and
/// statistics. Dropping the connector does not stop the event thread; the
/// bridge runs until the process exits, so there is no graceful drain path.
#[derive(Clone)]
pub struct MqttConnector {
    client: Client,
    stats: Arc<Mutex<ConnectionStats>>,
}

impl MqttConnector {
    /// Connect and spawn the event thread
    ///
    /// `make_handler` receives a clone of the connector so inbound-message
    /// handling can publish replies over the same connection. The returned
    /// handler runs on the event thread for every inbound publish; it must
    /// never panic. Handler executions are serialized, so a slow handler
    /// delays subsequent RPCs but nothing else.
    pub fn connect<H, F>(config: MqttConfig, make_handler: H) -> Result<(Self, JoinHandle<()>), MqttError>
    where
        H: FnOnce(MqttConnector) -> F,
        F: FnMut(InboundMessage) + Send + 'static,
    {
        if config.host.is_empty() {
            return Err(MqttError::Config("broker host must not be empty"));
        }

        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(config.keep_alive);
        if !config.token.is_empty() {
            options.set_credentials(&config.token, "");
        }

        let (client, connection) = Client::new(options, config.capacity);
        let connector = Self {
            client: client.clone(),
            stats: Arc::new(Mutex::new(ConnectionStats::default())),
        };

        let handler = make_handler(connector.clone());
        let subscriptions = config.subscriptions.clone();
        let handle = thread::Builder::new()
            .name("mqtt-events".into())
            .spawn(move || {
                event_loop(connection, client, subscriptions, handler);
            })
            .map_err(|_| MqttError::Config("failed to spawn event thread"))?;

        Ok((connector, handle))
    }

    /// Publish `payload` to `topic` at QoS 1
    pub fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        match self
            .client
            .publish(topic, QoS::AtLeastOnce, false, payload.to_vec())
        {
            Ok(()) => {
                let mut stats = self.stats.lock().unwrap();
                stats.messages_sent += 1;
                stats.bytes_sent += payload.len() as u64;
                Ok(())
            }
            Err(e) => {
                self.stats.lock().unwrap().messages_failed += 1;
                Err(MqttError::Client(e))
            }
        }
    }

    /// Connection statistics so far
    pub fn stats(&self) -> ConnectionStats {
        self.stats.lock().unwrap().clone()
    }
}

impl Publish for MqttConnector {
    type Error = MqttError;

    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        MqttConnector::publish(self, topic, payload)
    }
}

/// Drive the protocol state machine and dispatch inbound publishes
fn event_loop<F>(
    mut connection: rumqttc::Connection,
    client: Client,
    subscriptions: Vec<String>,
    mut handler: F,
) where
    F: FnMut(InboundMessage) + Send + 'static,
{
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!("connected to broker");
                    // (Re)subscribe on every successful connect; the broker
                    // may have dropped session state in between.
                    for filter in &subscriptions {
                        if let Err(e) = client.subscribe(filter.as_str(), QoS::AtLeastOnce) {
                            error!("subscribe to {} failed: {}", filter, e);
                        }
                    }
                } else {
                    error!("broker refused connection: {:?}", ack.code);
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!("inbound message on {}", publish.topic);
                handler(InboundMessage {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                });
            }
            Ok(_) => {}
            Err(e) => {
                // rumqttc retries the connection as iteration continues;
                // rate-limit the log noise while the broker is away.
                warn!("mqtt connection error: {}", e);
                thread::sleep(Duration::from_secs(1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = MqttConfig::new("broker.local", 1883)
            .token("device-token")
            .client_id("bridge-01")
            .keep_alive_secs(30)
            .subscribe("v1/devices/me/rpc/request/+");

        assert_eq!(config.host, "broker.local");
        assert_eq!(config.port, 1883);
        assert_eq!(config.token, "device-token");
        assert_eq!(config.client_id, "bridge-01");
        assert_eq!(config.keep_alive, Duration::from_secs(30));
        assert_eq!(config.subscriptions, vec!["v1/devices/me/rpc/request/+"]);
    }

    #[test]
    fn empty_host_is_rejected() {
        let result =
            MqttConnector::connect(MqttConfig::new("", 1883), |_conn| |_msg: InboundMessage| {});
        assert!(matches!(result, Err(MqttError::Config(_))));
    }
}
