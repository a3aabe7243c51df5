// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! envsim - Environmental Sensor Fleet Emulator
//!
//! Publishes BME688, SPS30 and differential-pressure telemetry for a fleet of
//! simulated devices to an MQTT broker until interrupted.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use envsim::config::{parse_channel_list, parse_name_list, parse_qos};
use envsim::{Config, MqttPublisher, PublishScheduler, Publisher, VERSION};

/// MQTT IoT emulator (subtopics per sensor)
#[derive(Parser, Debug)]
#[command(name = "envsim")]
#[command(version = VERSION)]
#[command(about = "Environmental sensor fleet emulator publishing over MQTT")]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Broker host
    #[arg(long)]
    host: Option<String>,

    /// Broker port
    #[arg(long)]
    port: Option<u16>,

    /// QoS for every publish (0 or 1)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    qos: Option<u8>,

    /// Keep-alive in seconds
    #[arg(long)]
    keepalive: Option<u64>,

    /// MQTT client identifier
    #[arg(long)]
    client_id: Option<String>,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    password: Option<String>,

    #[arg(long)]
    site: Option<String>,

    #[arg(long)]
    room: Option<String>,

    /// Comma-separated device names
    #[arg(long)]
    devices: Option<String>,

    /// Comma-separated differential-pressure channel numbers
    #[arg(long)]
    dp_channels: Option<String>,

    /// Seconds between publish rounds
    #[arg(long)]
    interval: Option<f64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,
}

impl Args {
    /// Command line values win over the file.
    fn apply(&self, config: &mut Config) -> Result<()> {
        let mqtt = &mut config.mqtt;
        if let Some(host) = &self.host {
            mqtt.host = host.clone();
        }
        if let Some(port) = self.port {
            mqtt.port = port;
        }
        if let Some(qos) = self.qos {
            mqtt.qos = parse_qos(qos)?;
        }
        if let Some(keepalive) = self.keepalive {
            mqtt.keep_alive_secs = keepalive;
        }
        if let Some(client_id) = &self.client_id {
            mqtt.client_id = client_id.clone();
        }
        if self.username.is_some() {
            mqtt.username = self.username.clone();
        }
        if self.password.is_some() {
            mqtt.password = self.password.clone();
        }

        let emulator = &mut config.emulator;
        if let Some(site) = &self.site {
            emulator.site = site.clone();
        }
        if let Some(room) = &self.room {
            emulator.room = room.clone();
        }
        if let Some(devices) = &self.devices {
            emulator.devices = parse_name_list(devices);
        }
        if let Some(channels) = &self.dp_channels {
            emulator.dp_channels = parse_channel_list(channels)?;
        }
        if let Some(interval) = self.interval {
            emulator.interval_secs = interval;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply(&mut config)?;
    config.validate()?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        return Ok(());
    }

    info!("envsim v{}", VERSION);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> Result<()> {
    let mqtt = MqttPublisher::connect(&config.mqtt);
    info!(
        "Publishing every {}s to {} for devices: {}",
        config.emulator.interval_secs,
        mqtt.endpoint(),
        config.emulator.devices.join(", ")
    );
    info!("Topics: .../telemetry/bme688, .../telemetry/sps30, .../telemetry/dp/<channel>; status retained. Ctrl+C to stop.");

    let publisher: Arc<dyn Publisher> = Arc::new(mqtt);
    let scheduler = PublishScheduler::from_config(&config, publisher);

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let stats = scheduler.run(shutdown).await;
    info!("envsim shutdown complete ({} rounds)", stats.rounds);
    Ok(())
}

/// Cancel `token` on SIGINT or SIGTERM.
async fn wait_for_signal(token: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("SIGINT received, shutting down gracefully...");
        }
        _ = terminate => {
            info!("SIGTERM received, shutting down gracefully...");
        }
    }

    token.cancel();
}
