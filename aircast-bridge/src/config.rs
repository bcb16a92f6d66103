//! Command-line configuration for the bridge daemon

use std::path::PathBuf;

use clap::Parser;

/// Serial-to-MQTT bridge with on-device forecasting
///
/// Trains a small convolutional model on historical indoor-climate data at
/// startup, then relays live sensor readings to the broker together with a
/// one-step-ahead forecast.
#[derive(Parser, Debug)]
#[command(name = "aircast-bridge", version, about)]
pub struct Cli {
    /// CSV file with historical humidity/temperature readings
    #[arg(long, value_name = "FILE")]
    pub train_data: PathBuf,

    /// Serial device the sensor node is attached to
    #[arg(long, value_name = "PATH")]
    pub device: PathBuf,

    /// Serial baud rate
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,

    /// Broker hostname or IP address
    #[arg(long)]
    pub broker: String,

    /// Broker port
    #[arg(long, default_value_t = 1883)]
    pub port: u16,

    /// Device access token, sent as the MQTT username
    #[arg(long, env = "AIRCAST_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Seconds to wait between telemetry publishes
    #[arg(long, default_value_t = 10)]
    pub interval_secs: u64,

    /// Training epochs over the historical data
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Seed for weight initialization; fixed for reproducible training
    #[arg(long, default_value_t = 42)]
    pub seed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_common_deployment() {
        let cli = Cli::parse_from([
            "aircast-bridge",
            "--train-data",
            "history.csv",
            "--device",
            "/dev/ttyUSB0",
            "--broker",
            "broker.local",
            "--token",
            "t0k3n",
        ]);

        assert_eq!(cli.baud, 115_200);
        assert_eq!(cli.port, 1883);
        assert_eq!(cli.interval_secs, 10);
        assert_eq!(cli.epochs, 100);
        assert_eq!(cli.seed, 42);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "aircast-bridge",
            "--train-data",
            "history.csv",
            "--device",
            "/dev/ttyUSB1",
            "--baud",
            "9600",
            "--broker",
            "10.0.0.2",
            "--port",
            "8883",
            "--token",
            "t",
            "--interval-secs",
            "5",
            "--epochs",
            "20",
        ]);

        assert_eq!(cli.baud, 9600);
        assert_eq!(cli.port, 8883);
        assert_eq!(cli.interval_secs, 5);
        assert_eq!(cli.epochs, 20);
    }
}
