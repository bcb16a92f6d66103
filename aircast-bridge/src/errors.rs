//! Bridge-level error type
//!
//! Everything that can abort startup or the relay loop funnels into one
//! enum so `main` has a single fatal-error path.

use aircast_connectors::{LinkError, MqttError};
use aircast_core::DatasetError;
use aircast_ml::MlError;
use thiserror::Error;

/// Fatal bridge errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Training data could not be loaded
    #[error("training data: {0}")]
    Dataset(#[from] DatasetError),

    /// Model construction or training failed
    #[error("model: {0}")]
    Model(#[from] MlError),

    /// The serial device failed
    #[error("device link: {0}")]
    Link(#[from] LinkError),

    /// The broker connection failed
    #[error("broker: {0}")]
    Mqtt(#[from] MqttError),

    /// Telemetry could not be encoded
    #[error("telemetry encoding: {0}")]
    Encode(#[from] serde_json::Error),

    /// A publish was rejected by the transport
    #[error("publish: {0}")]
    Publish(String),

    /// Configuration was invalid in a way clap cannot catch
    #[error("configuration: {0}")]
    Config(&'static str),
}
