//! Broker-to-Device RPC Dispatch
//!
//! The broker delivers server-side RPC calls as JSON publishes on
//! `v1/devices/me/rpc/request/<id>`. Each request carries a `method` name
//! and free-form `params`. The only method the bridge implements is
//! `setSwitch`: it forwards the requested state to the device over serial
//! and acknowledges by publishing the applied state on the matching
//! `.../rpc/response/<id>` topic.
//!
//! Malformed requests and unknown methods are logged and dropped; an RPC
//! failure must never take the telemetry loop down with it.

use aircast_connectors::{CommandWriter, InboundMessage, Publish};
use log::{debug, error, info, warn};
use serde::Deserialize;

/// Topic telemetry readings are published on
pub const TELEMETRY_TOPIC: &str = "v1/devices/me/telemetry";

/// Wildcard filter matching all inbound RPC requests
pub const RPC_REQUEST_FILTER: &str = "v1/devices/me/rpc/request/+";

/// One server-side RPC call
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// Method name, e.g. `setSwitch`
    pub method: String,
    /// Method arguments; shape depends on the method
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Handle one inbound RPC message
///
/// Runs on the MQTT event thread, so every failure path logs and returns
/// instead of propagating.
pub fn handle_rpc<P: Publish>(message: &InboundMessage, switch: &CommandWriter, publisher: &P)
where
    P::Error: std::fmt::Display,
{
    let request: RpcRequest = match serde_json::from_slice(&message.payload) {
        Ok(request) => request,
        Err(e) => {
            warn!("ignoring malformed rpc on {}: {}", message.topic, e);
            return;
        }
    };

    match request.method.as_str() {
        "setSwitch" => {
            info!("rpc setSwitch({}) on {}", request.params, message.topic);
            if let Err(e) = switch.send_switch(&request.params) {
                error!("forwarding switch state to device failed: {}", e);
                return;
            }
            let response_topic = message.topic.replace("request", "response");
            let ack = serde_json::json!({ "switch": request.params });
            if let Err(e) = publisher.publish(&response_topic, ack.to_string().as_bytes()) {
                error!("rpc response on {} failed: {}", response_topic, e);
            }
        }
        other => {
            debug!("ignoring unsupported rpc method {:?}", other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aircast_connectors::DeviceLink;
    use std::io::{self, Cursor, Write};
    use std::sync::{Arc, Mutex};

    /// Write sink shared between the link under test and the assertions
    #[derive(Clone, Default)]
    struct SharedVec(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedVec {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Publisher that records every (topic, payload) pair
    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl Publish for RecordingPublisher {
        type Error = std::convert::Infallible;

        fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.to_vec()));
            Ok(())
        }
    }

    fn switch_writer(sink: SharedVec) -> CommandWriter {
        DeviceLink::from_parts(Cursor::new(Vec::new()), sink).writer()
    }

    #[test]
    fn set_switch_drives_serial_and_acknowledges() {
        let sink = SharedVec::default();
        let switch = switch_writer(sink.clone());
        let publisher = RecordingPublisher::default();

        let message = InboundMessage {
            topic: "v1/devices/me/rpc/request/7".into(),
            payload: br#"{"method": "setSwitch", "params": true}"#.to_vec(),
        };
        handle_rpc(&message, &switch, &publisher);

        assert_eq!(&*sink.0.lock().unwrap(), b"{\"switch\":true}\n");

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "v1/devices/me/rpc/response/7");
        let ack: serde_json::Value = serde_json::from_slice(&published[0].1).unwrap();
        assert_eq!(ack, serde_json::json!({ "switch": true }));
    }

    #[test]
    fn unknown_methods_are_dropped() {
        let sink = SharedVec::default();
        let switch = switch_writer(sink.clone());
        let publisher = RecordingPublisher::default();

        let message = InboundMessage {
            topic: "v1/devices/me/rpc/request/3".into(),
            payload: br#"{"method": "reboot", "params": null}"#.to_vec(),
        };
        handle_rpc(&message, &switch, &publisher);

        assert!(sink.0.lock().unwrap().is_empty());
        assert!(publisher.published.lock().unwrap().is_empty());
    }

    #[test]
    fn malformed_payloads_are_dropped() {
        let sink = SharedVec::default();
        let switch = switch_writer(sink.clone());
        let publisher = RecordingPublisher::default();

        let message = InboundMessage {
            topic: "v1/devices/me/rpc/request/9".into(),
            payload: b"not json at all".to_vec(),
        };
        handle_rpc(&message, &switch, &publisher);

        assert!(sink.0.lock().unwrap().is_empty());
        assert!(publisher.published.lock().unwrap().is_empty());
    }
}
