//! Aircast Bridge Daemon
//!
//! Reads indoor-climate frames from a serial-attached sensor node,
//! forecasts the next humidity/temperature pair with a small convolutional
//! model trained at startup, and publishes both to an MQTT broker. Also
//! answers `setSwitch` RPC calls from the broker by forwarding the
//! requested state to the device.
//!
//! Startup is strict: if the training data cannot be loaded, the model
//! fails to train, the serial device will not open, or the broker refuses
//! the connection, the daemon logs the error and exits non-zero. Once the
//! relay loop is running, only a device disconnect brings it down.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod errors;
mod rpc;
mod run;

use std::process;
use std::time::Duration;

use clap::Parser;
use log::info;

use aircast_connectors::{DeviceLink, MqttConfig, MqttConnector};
use aircast_core::{split_sequences, RollingForecaster, TrainingData};
use aircast_ml::{SequenceCnn, TrainConfig};

use crate::config::Cli;
use crate::errors::BridgeError;

/// Serial read timeout; longer than the device's emit period
const SERIAL_TIMEOUT: Duration = Duration::from_secs(2);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("fatal: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), BridgeError> {
    // Train before touching the network; a bridge without a model has
    // nothing useful to publish.
    let data = TrainingData::from_csv(&cli.train_data)?;
    let windows = split_sequences(data.samples(), run::N_STEPS);
    info!(
        "loaded {} samples ({} training windows)",
        data.samples().len(),
        windows.len()
    );

    let mut model = SequenceCnn::new(run::N_STEPS, cli.seed)?;
    let train_config = TrainConfig {
        epochs: cli.epochs,
        ..TrainConfig::default()
    };
    let report = model.fit(&windows, &train_config)?;
    info!(
        "trained {} epochs on {} windows, loss {:.6} -> {:.6}",
        report.epochs, report.windows, report.initial_loss, report.final_loss
    );

    let device = cli
        .device
        .to_str()
        .ok_or(BridgeError::Config("device path is not valid UTF-8"))?;
    let mut link = DeviceLink::open(device, cli.baud, SERIAL_TIMEOUT)?;
    info!("serial device {} open at {} baud", device, cli.baud);

    let switch = link.writer();
    let mqtt_config = MqttConfig::new(cli.broker.clone(), cli.port)
        .token(cli.token)
        .subscribe(rpc::RPC_REQUEST_FILTER);
    let (publisher, _events) = MqttConnector::connect(mqtt_config, move |responder| {
        move |message| rpc::handle_rpc(&message, &switch, &responder)
    })?;
    info!("broker {}:{} configured, relay loop starting", cli.broker, cli.port);

    let mut forecaster = RollingForecaster::new(model);
    let interval = Duration::from_secs(cli.interval_secs);
    run::run_loop(&mut link, &mut forecaster, &publisher, interval)
}
